use std::path::PathBuf;

use anyhow::{Context, Result};
use async_trait::async_trait;
use axum::body::Bytes;
use tracing::debug;

use super::{traits::FileStore, types::StoredFile};
use crate::models::new_id;

/// URL prefix the router serves stored files under
pub const UPLOADS_ROUTE: &str = "/uploads";

/// Keeps uploads on local disk
pub struct LocalFileStore {
    root: PathBuf,
    public_base_url: String,
}

impl LocalFileStore {
    pub fn new(root: impl Into<PathBuf>, public_base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

/// Keep names readable but safe to use as a path segment
fn sanitize(file_name: &str) -> String {
    let cleaned: String = file_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();

    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "file".to_string()
    } else {
        cleaned.to_string()
    }
}

#[async_trait]
impl FileStore for LocalFileStore {
    async fn store(&self, file_name: &str, content_type: &str, bytes: Bytes) -> Result<StoredFile> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .context("Failed to create upload directory")?;

        let stored_name = format!("{}-{}", new_id(), sanitize(file_name));
        let path = self.root.join(&stored_name);
        let size = bytes.len() as u64;

        tokio::fs::write(&path, &bytes)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;

        debug!("Stored upload at {}", path.display());

        Ok(StoredFile {
            url: format!("{}{UPLOADS_ROUTE}/{stored_name}", self.public_base_url),
            name: file_name.to_string(),
            content_type: content_type.to_string(),
            size,
        })
    }

    fn provider_name(&self) -> &'static str {
        "local"
    }
}
