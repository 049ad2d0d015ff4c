// User endpoints
//
// Users are keyed by `username`. Passwords never travel in the regular
// update body: `update()` routes a `password` field to
// `PUT /users/{username}/password`.

use std::sync::Arc;

use secrecy::{ExposeSecret, SecretString};
use serde_json::{Value, json};
use tracing::debug;

use crate::error::Error;
use crate::resource::{OutOfBand, Resource, ResourceKind};
use crate::session::{ApiPath, Session, StatusClass};

#[derive(Debug, Clone, Copy, Default)]
pub struct UserKind;

impl ResourceKind for UserKind {
    const NAME: &'static str = "user";
    const ID_FIELD: &'static str = "username";
    const REQUIRED_ON_CREATE: &'static [&'static str] =
        &["username", "full_name", "email", "password", "permissions"];
    const LIST_KEY: &'static str = "users";
    const CREATE_MODEL: Option<&'static str> = Some("CreateUserRequest");
    const READ_MODEL: Option<&'static str> = Some("User");

    fn collection(&self) -> Result<ApiPath, Error> {
        Ok(ApiPath::new("users"))
    }

    fn out_of_band_update(&self, id: &str, field: &str, value: &Value) -> Option<OutOfBand> {
        (field == "password").then(|| OutOfBand {
            method: reqwest::Method::PUT,
            path: ApiPath::new("users").segment(id).then("password"),
            body: json!({ "password": value }),
        })
    }
}

/// A Graylog user account.
pub type User = Resource<UserKind>;

impl Resource<UserKind> {
    /// Change the loaded user's password.
    ///
    /// `PUT /users/{username}/password`. Graylog requires the old password
    /// unless the caller is an admin changing someone else's.
    pub async fn update_password(
        &mut self,
        password: &SecretString,
        old_password: Option<&SecretString>,
    ) -> Result<bool, Error> {
        let username = self.require_id()?;
        let mut body = json!({ "password": password.expose_secret() });
        if let Some(old) = old_password {
            body["old_password"] = Value::String(old.expose_secret().to_owned());
        }

        debug!(%username, "updating password");
        let resp = self
            .session()
            .put(ApiPath::new("users").segment(&username).then("password"), &body)
            .await?;
        match resp.class() {
            StatusClass::Success => Ok(true),
            StatusClass::NotFound => {
                self.record(&resp);
                Ok(false)
            }
            StatusClass::ClientError | StatusClass::ServerError => Err(self.reject(&resp)),
        }
    }

    /// Replace the loaded user's permissions.
    ///
    /// `PUT /users/{username}/permissions`. The cached list is updated on
    /// success.
    pub async fn set_permissions(&mut self, permissions: &[String]) -> Result<bool, Error> {
        let username = self.require_id()?;
        let body = json!({ "permissions": permissions });

        debug!(%username, count = permissions.len(), "setting permissions");
        let resp = self
            .session()
            .put(ApiPath::new("users").segment(&username).then("permissions"), &body)
            .await?;
        match resp.class() {
            StatusClass::Success => {
                if let Some(data) = self.data_mut() {
                    data.insert("permissions".into(), json!(permissions));
                }
                Ok(true)
            }
            StatusClass::NotFound => {
                self.record(&resp);
                Ok(false)
            }
            StatusClass::ClientError | StatusClass::ServerError => Err(self.reject(&resp)),
        }
    }

    /// Remove every permission from the loaded user.
    ///
    /// `DELETE /users/{username}/permissions`; on 204 the cached list is
    /// emptied.
    pub async fn revoke_permissions(&mut self) -> Result<bool, Error> {
        let username = self.require_id()?;
        debug!(%username, "revoking permissions");
        let resp = self
            .session()
            .delete(ApiPath::new("users").segment(&username).then("permissions"))
            .await?;
        if resp.class() == StatusClass::ServerError {
            return Err(self.reject(&resp));
        }
        if resp.status == reqwest::StatusCode::NO_CONTENT {
            if let Some(data) = self.data_mut() {
                data.insert("permissions".into(), json!([]));
            }
            return Ok(true);
        }
        self.record(&resp);
        Ok(false)
    }

    /// Permissions from the loaded data.
    pub fn permissions(&mut self) -> Result<Vec<String>, Error> {
        if !self.is_loaded() {
            return Err(self.fail(Error::validation(
                "the user object is empty: use load_from_server first",
            )));
        }
        Ok(self
            .get("permissions")
            .and_then(Value::as_array)
            .map(|list| {
                list.iter()
                    .filter_map(Value::as_str)
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default())
    }
}

impl Session {
    /// List every user, hydrating one [`User`] per entry.
    ///
    /// `GET /users`. Aborts as a whole if any entry is rejected.
    pub async fn list_users(self: &Arc<Self>) -> Result<Vec<User>, Error> {
        debug!("listing users");
        User::list(self).await
    }
}
