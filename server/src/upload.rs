use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use axum::extract::Multipart;
use maira_core::client::GeminiClient;
use maira_memory::{MemoryRecord, MemoryStore};
use tokio::fs;
use tracing::{info, warn};
use uuid::Uuid;

/// Multipart field carrying uploaded documents
pub const FILE_FIELD: &str = "pdf";

/// Multipart field carrying the user's message
pub const MESSAGE_FIELD: &str = "message";

/// Ceiling on files per request, enforced before any external call
pub const MAX_FILES_PER_REQUEST: usize = 10;

/// Uploads are presented to the provider as PDF regardless of the
/// actual content type
pub const PDF_MIME_TYPE: &str = "application/pdf";

/// One uploaded file spooled to the scratch directory
#[derive(Debug)]
pub struct SpooledFile {
    pub path: PathBuf,
    pub original_name: String,
}

/// The decoded fields of a chat request
#[derive(Debug, Default)]
pub struct ChatRequestParts {
    pub message: Option<String>,
    pub files: Vec<SpooledFile>,
}

/// Spool every part of the multipart request to disk.
///
/// File parts land in the uploads scratch directory under a fresh UUID
/// name, keeping the client's original filename alongside. A request
/// with more than [`MAX_FILES_PER_REQUEST`] files is rejected here,
/// after its temps are removed and before anything reaches the
/// provider or the store.
pub async fn spool_request(
    multipart: &mut Multipart,
    uploads_dir: &Path,
) -> Result<ChatRequestParts> {
    fs::create_dir_all(uploads_dir)
        .await
        .context("Failed to create uploads directory")?;

    let mut parts = ChatRequestParts::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .context("Malformed multipart request")?
    {
        // Field accessors consume the field, so detach the names first.
        let field_name = field.name().map(|n| n.to_string());
        match field_name.as_deref() {
            Some(MESSAGE_FIELD) => {
                let text = field
                    .text()
                    .await
                    .context("Failed to read message field")?;
                parts.message = Some(text);
            }
            Some(FILE_FIELD) => {
                let original_name = field
                    .file_name()
                    .unwrap_or("dokumen.pdf")
                    .to_string();
                let bytes = field
                    .bytes()
                    .await
                    .with_context(|| format!("Failed to read uploaded file {}", original_name))?;

                let path = uploads_dir.join(Uuid::new_v4().to_string());
                fs::write(&path, &bytes)
                    .await
                    .with_context(|| format!("Failed to spool {}", original_name))?;

                parts.files.push(SpooledFile {
                    path,
                    original_name,
                });
            }
            _ => {}
        }
    }

    if parts.files.len() > MAX_FILES_PER_REQUEST {
        let count = parts.files.len();
        discard_spooled(&parts.files).await;
        bail!(
            "Too many files: {} uploaded, at most {} per request",
            count,
            MAX_FILES_PER_REQUEST
        );
    }

    Ok(parts)
}

/// Remove spooled temp files, ignoring already-missing ones
pub async fn discard_spooled(files: &[SpooledFile]) {
    for file in files {
        if let Err(e) = fs::remove_file(&file.path).await {
            if e.kind() != ErrorKind::NotFound {
                warn!(error = %e, path = %file.path.display(), "Failed to remove spooled file");
            }
        }
    }
}

/// Push each spooled file through the Files API, append its record to
/// the store, and remove the temp copy.
///
/// The temp copy is removed only after its record is appended, and the
/// store is persisted once after the whole batch. A mid-batch upload
/// failure aborts the request: earlier records of the same batch stay
/// in memory unpersisted, and the remaining temps stay on disk.
pub async fn process_uploads(
    client: &GeminiClient,
    store: &mut MemoryStore,
    files: &[SpooledFile],
) -> Result<()> {
    for file in files {
        info!(file = %file.original_name, "Storing new document");

        let uploaded = client
            .upload_file(&file.path, PDF_MIME_TYPE, &file.original_name)
            .await
            .with_context(|| format!("Failed to upload {}", file.original_name))?;

        store.append(MemoryRecord::new(
            uploaded.mime_type,
            uploaded.uri,
            file.original_name.clone(),
        ));

        match fs::remove_file(&file.path).await {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => {
                warn!(error = %e, path = %file.path.display(), "Failed to remove temp upload");
            }
        }
    }

    store
        .persist()
        .await
        .context("Failed to persist memory store")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn discard_spooled_removes_temp_files() {
        let dir = tempfile::tempdir().unwrap();
        let path_a = dir.path().join("a");
        let path_b = dir.path().join("b");
        fs::write(&path_a, b"pdf bytes").await.unwrap();

        let files = vec![
            SpooledFile {
                path: path_a.clone(),
                original_name: "a.pdf".to_string(),
            },
            // Already missing, must not error.
            SpooledFile {
                path: path_b.clone(),
                original_name: "b.pdf".to_string(),
            },
        ];

        discard_spooled(&files).await;
        assert!(!path_a.exists());
        assert!(!path_b.exists());
    }
}
