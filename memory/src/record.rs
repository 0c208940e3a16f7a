use maira_core::types::FileData;
use serde::{Deserialize, Serialize};

/// Reference to one uploaded document known to the external provider.
///
/// Serialized exactly as the memory file stores it:
/// `{"fileData": {"mimeType": ..., "fileUri": ...}, "fileName": ...}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MemoryRecord {
    pub file_data: FileData,
    pub file_name: String,
}

impl MemoryRecord {
    pub fn new(
        mime_type: impl Into<String>,
        file_uri: impl Into<String>,
        file_name: impl Into<String>,
    ) -> Self {
        Self {
            file_data: FileData {
                mime_type: mime_type.into(),
                file_uri: file_uri.into(),
            },
            file_name: file_name.into(),
        }
    }
}
