//! Image upload storage.

use std::path::{Path, PathBuf};

use tracing::info;
use uuid::Uuid;

use crate::error::{ServerError, ServerResult};
use crate::server::KnowledgeServer;

/// Content types accepted by the upload endpoint.
const ALLOWED_TYPES: [&str; 4] = ["image/png", "image/jpeg", "image/gif", "image/webp"];

pub(crate) fn is_allowed_type(content_type: &str) -> bool {
    ALLOWED_TYPES.contains(&content_type)
}

impl KnowledgeServer {
    /// Writes an uploaded image under the uploads directory and returns
    /// the stored file name. Names are generated, never taken from the
    /// client; only the extension of the original name survives.
    pub async fn save_upload(
        &self,
        original_name: &str,
        content_type: &str,
        data: &[u8],
    ) -> ServerResult<String> {
        if !is_allowed_type(content_type) {
            return Err(ServerError::ValidationError(
                "Invalid file type. Only PNG, JPEG, WEBP and GIF are allowed.".to_string(),
            ));
        }

        let file_name = match extension_of(original_name) {
            Some(ext) => format!("{}.{}", Uuid::new_v4(), ext),
            None => Uuid::new_v4().to_string(),
        };

        let dir = PathBuf::from(&self.config.uploads_dir);
        tokio::fs::create_dir_all(&dir).await?;
        tokio::fs::write(dir.join(&file_name), data).await?;

        info!(file = %file_name, bytes = data.len(), "Stored upload");
        Ok(file_name)
    }
}

fn extension_of(name: &str) -> Option<String> {
    Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
}
