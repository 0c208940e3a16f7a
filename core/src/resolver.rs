use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use tracing::{info, warn};

use crate::client::GeminiClient;
use crate::errors::GeminiResult;
use crate::types::ModelInfo;

/// Generation method a model must advertise to be usable for chat
pub const GENERATE_CONTENT_METHOD: &str = "generateContent";

/// Seam over the model-listing endpoint so the resolver can be tested
/// without network access
#[async_trait]
pub trait ListModels: Send + Sync {
    async fn list_models(&self) -> GeminiResult<Vec<ModelInfo>>;
}

#[async_trait]
impl ListModels for GeminiClient {
    async fn list_models(&self) -> GeminiResult<Vec<ModelInfo>> {
        GeminiClient::list_models(self).await
    }
}

/// Selects which generation model identifier to use.
///
/// The outcome of the first successful listing is cached for the
/// lifetime of the resolver and never invalidated, even when that
/// outcome is the fallback because no listed model supports content
/// generation. A failed listing falls back without touching the
/// cache, so a later call retries resolution once the listing
/// endpoint recovers.
pub struct ModelResolver {
    lister: Arc<dyn ListModels>,
    fallback: String,
    cached: RwLock<Option<String>>,
}

impl ModelResolver {
    pub fn new(lister: Arc<dyn ListModels>, fallback: impl Into<String>) -> Self {
        Self {
            lister,
            fallback: fallback.into(),
            cached: RwLock::new(None),
        }
    }

    /// Resolve the model identifier to use for generation
    pub async fn resolve(&self) -> String {
        if let Some(name) = self.cached() {
            return name;
        }

        match self.lister.list_models().await {
            Ok(models) => {
                let found = models.iter().find(|m| {
                    m.supported_generation_methods
                        .iter()
                        .any(|method| method == GENERATE_CONTENT_METHOD)
                });

                match found {
                    Some(model) => {
                        let name = model.short_name().to_string();
                        if let Ok(mut cached) = self.cached.write() {
                            *cached = Some(name.clone());
                        }
                        info!(model = %name, "Resolved generation model");
                        name
                    }
                    None => {
                        // The listing itself succeeded, so the choice is
                        // final: remember the fallback like any other
                        // resolution.
                        if let Ok(mut cached) = self.cached.write() {
                            *cached = Some(self.fallback.clone());
                        }
                        warn!(
                            fallback = %self.fallback,
                            "No listed model supports content generation, using fallback"
                        );
                        self.fallback.clone()
                    }
                }
            }
            Err(e) => {
                warn!(error = %e, fallback = %self.fallback, "Model listing failed, using fallback");
                self.fallback.clone()
            }
        }
    }

    /// Currently cached model identifier, if resolution has succeeded
    pub fn cached(&self) -> Option<String> {
        self.cached.read().ok().and_then(|cached| cached.clone())
    }
}
