// Dashboard endpoints

use crate::error::Error;
use crate::resource::{Resource, ResourceKind, Titled};
use crate::session::ApiPath;

#[derive(Debug, Clone, Copy, Default)]
pub struct DashboardKind;

impl ResourceKind for DashboardKind {
    const NAME: &'static str = "dashboard";
    const ID_FIELD: &'static str = "id";
    const REQUIRED_ON_CREATE: &'static [&'static str] = &["description", "title"];
    const LIST_KEY: &'static str = "dashboards";
    const CREATED_ID_KEY: Option<&'static str> = Some("dashboard_id");
    const CREATE_MODEL: Option<&'static str> = Some("CreateDashboardRequest");
    const UPDATE_MODEL: Option<&'static str> = Some("UpdateDashboardRequest");

    fn collection(&self) -> Result<ApiPath, Error> {
        Ok(ApiPath::new("dashboards"))
    }
}

impl Titled for DashboardKind {}

/// A Graylog dashboard. Everything it needs is the generic lifecycle plus
/// [`find_by_title`](Resource::find_by_title).
pub type Dashboard = Resource<DashboardKind>;
