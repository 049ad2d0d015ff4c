//! Export a collection (or one entity) to a timestamped JSON file.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;

use graylog_api::dashboards::DashboardKind;
use graylog_api::streams::StreamKind;
use graylog_api::users::UserKind;
use graylog_api::{Resource, ResourceKind, Session};

use crate::cli::{BackupArgs, BackupCollection, GlobalOpts};
use crate::error::CliError;

pub async fn handle(
    session: Arc<Session>,
    args: BackupArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let collection = args.collection.name();
    let id = args.id.as_deref();

    let exported = match args.collection {
        BackupCollection::Users => export::<UserKind>(session, collection, id).await?,
        BackupCollection::Streams => export::<StreamKind>(session, collection, id).await?,
        BackupCollection::Dashboards => export::<DashboardKind>(session, collection, id).await?,
    };

    let path = backup_path(&args.dir, collection, id);
    std::fs::create_dir_all(&args.dir)?;
    let body = serde_json::to_string_pretty(&exported)?;
    std::fs::write(&path, body)?;
    tracing::info!(path = %path.display(), "backup written");

    if !global.quiet {
        println!("{}", path.display());
    }
    Ok(())
}

async fn export<K: ResourceKind + Default>(
    session: Arc<Session>,
    collection: &str,
    id: Option<&str>,
) -> Result<Value, CliError> {
    let mut resource = Resource::<K>::new(session);
    match id {
        None => Ok(resource.backup_all().await?),
        Some(id) => resource.backup(id).await?.ok_or_else(|| CliError::NotFound {
            resource_type: collection.trim_end_matches('s').into(),
            identifier: id.into(),
            list_command: format!("{collection} list"),
        }),
    }
}

/// `DIR/{collection}[-{id}]-{UTC timestamp}.json`
fn backup_path(dir: &Path, collection: &str, id: Option<&str>) -> PathBuf {
    let stamp = Utc::now().format("%Y%m%dT%H%M%SZ");
    let name = match id {
        Some(id) => format!("{collection}-{}-{stamp}.json", sanitize(id)),
        None => format!("{collection}-{stamp}.json"),
    };
    dir.join(name)
}

fn sanitize(id: &str) -> String {
    id.chars()
        .map(|c| if c == '/' || c == '\\' { '_' } else { c })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_embeds_collection_and_id() {
        let path = backup_path(Path::new("/tmp/out"), "streams", Some("a/b"));
        let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
        assert!(name.starts_with("streams-a_b-"));
        assert!(name.ends_with("Z.json"));
        assert_eq!(path.parent(), Some(Path::new("/tmp/out")));
    }

    #[test]
    fn path_without_id() {
        let path = backup_path(Path::new("."), "users", None);
        let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
        assert!(name.starts_with("users-2"));
    }
}
