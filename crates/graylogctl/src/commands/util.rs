//! Shared helpers for command handlers.

use std::sync::Arc;

use serde_json::Value;

use graylog_api::{Resource, ResourceKind, Session};

use crate::error::CliError;

/// Raw documents of hydrated resources, for JSON/YAML output.
pub fn documents<K: ResourceKind>(items: &[Resource<K>]) -> Vec<Value> {
    items
        .iter()
        .filter_map(|item| item.data().cloned().map(Value::Object))
        .collect()
}

/// A field rendered for a table cell; `-` when absent.
pub fn field(doc: &Value, name: &str) -> String {
    match doc.get(name) {
        None | Some(Value::Null) => "-".into(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Array(items)) => items
            .iter()
            .map(|v| v.as_str().map_or_else(|| v.to_string(), String::from))
            .collect::<Vec<_>>()
            .join(", "),
        Some(other) => other.to_string(),
    }
}

/// Aligned `Label: value` lines for a single-item view.
pub fn detail(doc: &Value, fields: &[(&str, &str)]) -> String {
    let width = fields.iter().map(|(label, _)| label.len()).max().unwrap_or(0) + 1;
    fields
        .iter()
        .map(|(label, name)| format!("{:<width$} {}", format!("{label}:"), field(doc, name)))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Load one entity or fail with a `NotFound` pointing at the list command.
pub async fn load<K: ResourceKind + Default>(
    session: Arc<Session>,
    id: &str,
    resource_type: &str,
    list_command: &str,
) -> Result<Resource<K>, CliError> {
    let mut resource = Resource::<K>::new(session);
    if resource.load_from_server(id).await? {
        Ok(resource)
    } else {
        Err(CliError::NotFound {
            resource_type: resource_type.into(),
            identifier: id.into(),
            list_command: list_command.into(),
        })
    }
}

/// Turn a business-rule `false` into an error carrying the resource's
/// message.
pub fn refused<K: ResourceKind>(resource: &Resource<K>, fallback: &str) -> CliError {
    let message = resource.error_message();
    CliError::Refused {
        message: if message.is_empty() {
            fallback.into()
        } else {
            message.into()
        },
    }
}
