// Schema discovery and client-side payload validation
//
// `GET /api-docs/{collection}` returns a swagger document whose `models`
// map describes request/response bodies. Documents are memoized per
// collection on the session for its whole lifetime.

use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use crate::error::Error;
use crate::resource::Document;
use crate::session::{ApiPath, Session};

impl Session {
    /// Fetch (or reuse) the schema document for a collection.
    pub async fn schema(&self, collection: &str) -> Result<Arc<Value>, Error> {
        let key = collection_root(collection);
        if let Some(doc) = self
            .schemas
            .read()
            .expect("schema cache lock poisoned")
            .get(key)
        {
            return Ok(Arc::clone(doc));
        }

        debug!(collection = key, "fetching schema");
        let resp = self.get(ApiPath::new("api-docs").segment(key)).await?;
        resp.check_success()?;
        let doc = Arc::new(resp.body_or_null());

        self.schemas
            .write()
            .expect("schema cache lock poisoned")
            .insert(key.to_owned(), Arc::clone(&doc));
        Ok(doc)
    }

    /// Extract one named model (e.g. `CreateDashboardRequest`) from a
    /// collection's schema document.
    pub async fn schema_model(&self, collection: &str, model: &str) -> Result<Value, Error> {
        let doc = self.schema(collection).await?;
        doc.get("models")
            .and_then(|models| models.get(model))
            .cloned()
            .ok_or_else(|| {
                Error::validation(format!(
                    "schema for '{}' has no model named '{model}'",
                    collection_root(collection)
                ))
            })
    }

    /// A model from an already-cached schema document, without any I/O.
    pub fn cached_schema_model(&self, collection: &str, model: &str) -> Option<Value> {
        self.schemas
            .read()
            .expect("schema cache lock poisoned")
            .get(collection_root(collection))
            .and_then(|doc| doc.get("models"))
            .and_then(|models| models.get(model))
            .cloned()
    }

    /// Drop every memoized schema document.
    pub fn clear_schema_cache(&self) {
        self.schemas
            .write()
            .expect("schema cache lock poisoned")
            .clear();
    }
}

/// Nested collections (`streams/{id}/rules`) share their root's docs.
fn collection_root(collection: &str) -> &str {
    collection.split('/').next().unwrap_or(collection)
}

/// Check a payload against a swagger model.
///
/// Every name in the model's `required` list must be present, and every
/// payload field the model declares must have the declared JSON type.
/// Undeclared fields are accepted.
pub fn validate(model_name: &str, model: &Value, doc: &Document) -> Result<(), Error> {
    let mut problems = Vec::new();

    if let Some(required) = model.get("required").and_then(Value::as_array) {
        for name in required.iter().filter_map(Value::as_str) {
            if !doc.contains_key(name) {
                problems.push(format!("'{name}' is required"));
            }
        }
    }

    if let Some(properties) = model.get("properties").and_then(Value::as_object) {
        for (name, value) in doc {
            if let Some(spec) = properties.get(name) {
                if let Err(expected) = check_type(spec, value) {
                    problems.push(format!("'{name}' should be {expected}"));
                }
            }
        }
    }

    if problems.is_empty() {
        Ok(())
    } else {
        Err(Error::Schema {
            model: model_name.to_owned(),
            problems,
        })
    }
}

fn check_type(spec: &Value, value: &Value) -> Result<(), String> {
    let Some(kind) = spec.get("type").and_then(Value::as_str) else {
        return Ok(());
    };
    let ok = match kind {
        "string" => value.is_string(),
        "integer" => value.is_i64() || value.is_u64(),
        "number" => value.is_number(),
        "boolean" => value.is_boolean(),
        "object" => value.is_object(),
        "array" => match value.as_array() {
            Some(items) => match spec.get("items") {
                Some(item_spec) => items.iter().all(|item| check_type(item_spec, item).is_ok()),
                None => true,
            },
            None => false,
        },
        // "any" and vendor-specific types
        _ => true,
    };
    if ok {
        Ok(())
    } else if kind == "array" {
        let item = spec
            .get("items")
            .and_then(|i| i.get("type"))
            .and_then(Value::as_str)
            .unwrap_or("any");
        Err(format!("an array of {item}"))
    } else {
        Err(format!("of type {kind}"))
    }
}
