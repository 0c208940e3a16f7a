use std::path::Path;

use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use tracing::debug;

use crate::config::GeminiConfig;
use crate::errors::{GeminiError, GeminiResult};
use crate::types::*;

/// Boundary separating the metadata and payload sections of a
/// multipart/related Files API upload body.
const UPLOAD_BOUNDARY: &str = "maira_file_upload_boundary";

/// Client for interacting with the Gemini API
#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl GeminiClient {
    /// Create a new Gemini API client
    pub fn new(config: &GeminiConfig) -> GeminiResult<Self> {
        let api_key = config.api_key.clone().ok_or_else(|| {
            GeminiError::ConfigError(
                "API key is required to initialize the Gemini client".to_string(),
            )
        })?;

        let base_url = config.base_url().trim_end_matches('/').to_string();
        let client = Client::new();

        Ok(Self {
            client,
            api_key,
            base_url,
        })
    }

    fn generate_url(&self, model: &str) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            self.base_url, model, self.api_key
        )
    }

    fn list_models_url(&self) -> String {
        format!("{}/v1beta/models?key={}", self.base_url, self.api_key)
    }

    fn upload_url(&self) -> String {
        format!("{}/upload/v1beta/files?key={}", self.base_url, self.api_key)
    }

    /// Generate content with the given model
    pub async fn generate_content(
        &self,
        model: &str,
        request: GenerateContentRequest,
    ) -> GeminiResult<GenerateContentResponse> {
        let url = self.generate_url(model);
        debug!(model = model, parts = request.contents.len(), "Sending generation request");

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| GeminiError::RequestError(format!("Failed to send request: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.map_err(|e| {
                GeminiError::ResponseError(format!("Failed to read error response: {}", e))
            })?;

            return Err(GeminiError::HttpError {
                status_code: status.as_u16(),
                message: format!("API request failed: {}", error_body),
            });
        }

        let response_body = response
            .json::<GenerateContentResponse>()
            .await
            .map_err(|e| GeminiError::ParsingError(format!("Failed to parse response: {}", e)))?;

        Ok(response_body)
    }

    /// Fetch the available models from the listing endpoint
    pub async fn list_models(&self) -> GeminiResult<Vec<ModelInfo>> {
        let response = self
            .client
            .get(self.list_models_url())
            .send()
            .await
            .map_err(|e| GeminiError::RequestError(format!("Failed to list models: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.map_err(|e| {
                GeminiError::ResponseError(format!("Failed to read error response: {}", e))
            })?;

            return Err(GeminiError::HttpError {
                status_code: status.as_u16(),
                message: format!("Model listing failed: {}", error_body),
            });
        }

        let listing = response
            .json::<ListModelsResponse>()
            .await
            .map_err(|e| GeminiError::ParsingError(format!("Failed to parse model list: {}", e)))?;

        Ok(listing.models)
    }

    /// Upload a local file to the Files API and return the durable
    /// reference the generation endpoint understands.
    ///
    /// The media-upload endpoint expects a multipart/related body: a JSON
    /// metadata section followed by the raw file bytes. reqwest's multipart
    /// support emits multipart/form-data, so the body is assembled by hand.
    pub async fn upload_file(
        &self,
        path: &Path,
        mime_type: &str,
        display_name: &str,
    ) -> GeminiResult<UploadedFile> {
        let bytes = tokio::fs::read(path).await?;

        let metadata = serde_json::json!({
            "file": { "displayName": display_name }
        });

        let mut body: Vec<u8> = Vec::with_capacity(bytes.len() + 512);
        body.extend_from_slice(
            format!(
                "--{UPLOAD_BOUNDARY}\r\nContent-Type: application/json; charset=utf-8\r\n\r\n{metadata}\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(
            format!("--{UPLOAD_BOUNDARY}\r\nContent-Type: {mime_type}\r\n\r\n").as_bytes(),
        );
        body.extend_from_slice(&bytes);
        body.extend_from_slice(format!("\r\n--{UPLOAD_BOUNDARY}--\r\n").as_bytes());

        let response = self
            .client
            .post(self.upload_url())
            .header(
                CONTENT_TYPE,
                format!("multipart/related; boundary={UPLOAD_BOUNDARY}"),
            )
            .header("X-Goog-Upload-Protocol", "multipart")
            .body(body)
            .send()
            .await
            .map_err(|e| GeminiError::RequestError(format!("Failed to upload file: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.map_err(|e| {
                GeminiError::ResponseError(format!("Failed to read error response: {}", e))
            })?;

            return Err(GeminiError::HttpError {
                status_code: status.as_u16(),
                message: format!("File upload failed: {}", error_body),
            });
        }

        let uploaded = response
            .json::<UploadFileResponse>()
            .await
            .map_err(|e| {
                GeminiError::ParsingError(format!("Failed to parse upload response: {}", e))
            })?;

        Ok(uploaded.file)
    }

    /// Helper method to extract text from a response
    pub fn extract_text(&self, response: &GenerateContentResponse) -> GeminiResult<String> {
        let candidate = response
            .candidates
            .first()
            .ok_or_else(|| GeminiError::ResponseError("No candidates in response".to_string()))?;

        let content = candidate
            .content
            .as_ref()
            .ok_or_else(|| GeminiError::ResponseError("No content in candidate".to_string()))?;

        let part = content
            .parts
            .first()
            .ok_or_else(|| GeminiError::ResponseError("No parts in content".to_string()))?;

        let text = part
            .text
            .as_ref()
            .ok_or_else(|| GeminiError::ResponseError("No text in part".to_string()))?;

        Ok(text.clone())
    }
}
