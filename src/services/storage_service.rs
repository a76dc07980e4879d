use crate::error::{Error, Result};
use bytes::Bytes;
use std::path::PathBuf;
use uuid::Uuid;

/// Writes uploaded files under the configured uploads directory and hands
/// back the relative path recorded on the submission row. The rest of the
/// system treats that path as an opaque reference.
#[derive(Clone)]
pub struct StorageService {
    uploads_dir: PathBuf,
}

impl StorageService {
    pub fn new(uploads_dir: impl Into<PathBuf>) -> Self {
        Self {
            uploads_dir: uploads_dir.into(),
        }
    }

    pub async fn store_submission_file(
        &self,
        original_name: &str,
        data: Bytes,
    ) -> Result<(String, i64)> {
        if data.is_empty() {
            return Err(Error::BadRequest("Uploaded file is empty".to_string()));
        }

        let safe_name = sanitize_filename(original_name);
        let stored_rel = format!("submissions/{}_{}", Uuid::new_v4(), safe_name);
        let abs_path = self.uploads_dir.join(&stored_rel);

        if let Some(parent) = abs_path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| Error::Storage(e.to_string()))?;
        }

        let size = data.len() as i64;
        tokio::fs::write(&abs_path, &data)
            .await
            .map_err(|e| Error::Storage(e.to_string()))?;

        Ok((stored_rel, size))
    }

    /// Best-effort removal, used when an admin deletes a submission.
    pub async fn remove(&self, stored_path: &str) {
        let abs_path = self.uploads_dir.join(stored_path);
        if let Err(e) = tokio::fs::remove_file(&abs_path).await {
            tracing::warn!(path = %abs_path.display(), error = %e, "could not remove stored file");
        }
    }
}

fn sanitize_filename(name: &str) -> String {
    let base = name
        .rsplit(|c| c == '/' || c == '\\')
        .next()
        .unwrap_or(name);
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.trim_matches(&['_', '.'][..]).is_empty() {
        "upload".to_string()
    } else {
        cleaned
    }
}
