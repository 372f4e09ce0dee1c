//! Language-model contract.
//!
//! The generator is an external collaborator consumed through the
//! [`LanguageModel`] trait. Streaming completions yield text increments;
//! errors are surfaced to the orchestrator, which converts them into an
//! empty low-confidence answer rather than a failed request.

use crate::error::{CollaboratorError, Result};
use async_trait::async_trait;
use futures_util::stream::{self, BoxStream, StreamExt};

/// Default token budget for one completion.
pub const DEFAULT_MAX_TOKENS: u32 = 800;

/// Default sampling temperature.
pub const DEFAULT_TEMPERATURE: f32 = 0.3;

/// Contract for completion providers.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Produces one completion for the prompt.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider call fails.
    async fn complete(&self, prompt: &str, max_tokens: u32, temperature: f32) -> Result<String>;

    /// Produces a streaming completion: a sequence of text increments.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider call fails before streaming
    /// begins; mid-stream failures arrive as stream items.
    async fn complete_stream(
        &self,
        prompt: &str,
        max_tokens: u32,
        temperature: f32,
    ) -> Result<BoxStream<'static, Result<String>>>;
}

/// Deterministic in-process model used by tests and the standalone
/// runner. Returns a fixed answer (or a fixed error), streaming it in
/// small increments.
#[derive(Debug, Clone)]
pub struct ScriptedModel {
    answer: String,
    fail_with: Option<String>,
}

impl ScriptedModel {
    /// Creates a model that always answers with `answer`.
    #[must_use]
    pub fn new(answer: &str) -> Self {
        Self {
            answer: answer.to_string(),
            fail_with: None,
        }
    }

    /// Creates a model whose calls always fail with `message`.
    #[must_use]
    pub fn failing(message: &str) -> Self {
        Self {
            answer: String::new(),
            fail_with: Some(message.to_string()),
        }
    }
}

#[async_trait]
impl LanguageModel for ScriptedModel {
    async fn complete(&self, _prompt: &str, _max_tokens: u32, _temperature: f32) -> Result<String> {
        match &self.fail_with {
            Some(message) => Err(CollaboratorError::Completion(message.clone()).into()),
            None => Ok(self.answer.clone()),
        }
    }

    async fn complete_stream(
        &self,
        _prompt: &str,
        _max_tokens: u32,
        _temperature: f32,
    ) -> Result<BoxStream<'static, Result<String>>> {
        if let Some(message) = &self.fail_with {
            return Err(CollaboratorError::Completion(message.clone()).into());
        }
        let pieces: Vec<Result<String>> = self
            .answer
            .as_bytes()
            .chunks(8)
            .map(|chunk| Ok(String::from_utf8_lossy(chunk).into_owned()))
            .collect();
        Ok(stream::iter(pieces).boxed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::StreamExt;

    #[tokio::test]
    async fn test_scripted_complete() {
        let model = ScriptedModel::new("the answer");
        let out = model
            .complete("prompt", DEFAULT_MAX_TOKENS, DEFAULT_TEMPERATURE)
            .await
            .unwrap();
        assert_eq!(out, "the answer");
    }

    #[tokio::test]
    async fn test_scripted_stream_reassembles() {
        let model = ScriptedModel::new("a longer answer streamed in pieces");
        let mut stream = model
            .complete_stream("prompt", DEFAULT_MAX_TOKENS, DEFAULT_TEMPERATURE)
            .await
            .unwrap();

        let mut collected = String::new();
        while let Some(piece) = stream.next().await {
            collected.push_str(&piece.unwrap());
        }
        assert_eq!(collected, "a longer answer streamed in pieces");
    }

    #[tokio::test]
    async fn test_failing_model() {
        let model = ScriptedModel::failing("quota exhausted");
        let err = model
            .complete("prompt", DEFAULT_MAX_TOKENS, DEFAULT_TEMPERATURE)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("quota exhausted"));

        assert!(
            model
                .complete_stream("prompt", DEFAULT_MAX_TOKENS, DEFAULT_TEMPERATURE)
                .await
                .is_err()
        );
    }
}
