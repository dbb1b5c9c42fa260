//! Provider selection.

use std::sync::Arc;

use tracing::info;

use crate::config::{LlmConfig, LlmProvider};
use crate::error::LlmError;
use crate::{MockGenerator, OllamaGenerator, OpenAiGenerator, TextGenerator};

/// Instantiate the generator selected by the configuration.
///
/// Keeping provider selection here avoids provider-specific conditionals
/// in agent logic. The mock provider requires `allow_mock`.
pub fn build_generator(config: &LlmConfig) -> Result<Arc<dyn TextGenerator>, LlmError> {
    match config.provider {
        LlmProvider::Ollama => {
            info!(model = %config.ollama_model, "using ollama generator");
            Ok(Arc::new(OllamaGenerator::new(config)?))
        }
        LlmProvider::OpenAi => {
            info!(model = %config.openai_model, "using openai generator");
            Ok(Arc::new(OpenAiGenerator::new(config)?))
        }
        LlmProvider::Mock => {
            if !config.allow_mock {
                return Err(LlmError::MockDisabled);
            }
            info!("using mock generator");
            Ok(Arc::new(MockGenerator::new()))
        }
    }
}
