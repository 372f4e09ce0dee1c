//! Service configuration.
//!
//! Read once at startup from the environment. Provider credentials are
//! handed to whichever embedding/LLM clients the embedder wires in; the
//! core only checks for their presence when asked to validate a
//! production configuration.

use crate::error::{Error, Result};
use std::path::PathBuf;

/// Environment variable names.
const ENV_API_KEY: &str = "LEXRAG_API_KEY";
const ENV_INDEX_NAME: &str = "LEXRAG_INDEX_NAME";
const ENV_INDEX_REGION: &str = "LEXRAG_INDEX_REGION";
const ENV_UPLOAD_DIR: &str = "LEXRAG_UPLOAD_DIR";
const ENV_MAX_UPLOAD_BYTES: &str = "LEXRAG_MAX_UPLOAD_BYTES";
const ENV_GRAPH_PATH: &str = "LEXRAG_GRAPH_PATH";

/// Startup configuration for the service.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Credential for the embedding/LLM provider, when required.
    pub provider_api_key: Option<String>,
    /// Vector-index name.
    pub index_name: String,
    /// Vector-index region.
    pub index_region: String,
    /// Directory for upload temp files.
    pub upload_dir: PathBuf,
    /// Maximum accepted upload size in bytes.
    pub max_upload_bytes: u64,
    /// Target chunk size in characters.
    pub chunk_size: usize,
    /// Chunk overlap in characters.
    pub chunk_overlap: usize,
    /// Context-window budget in characters.
    pub max_context_chars: usize,
    /// Path of the persisted cross-reference graph.
    pub graph_path: PathBuf,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            provider_api_key: None,
            index_name: "legal-documents".to_string(),
            index_region: "us-east-1".to_string(),
            upload_dir: PathBuf::from("uploads"),
            max_upload_bytes: crate::ingest::DEFAULT_MAX_UPLOAD_BYTES,
            chunk_size: crate::chunking::DEFAULT_CHUNK_SIZE,
            chunk_overlap: crate::chunking::DEFAULT_OVERLAP,
            max_context_chars: crate::context::DEFAULT_MAX_CONTEXT,
            graph_path: PathBuf::from("cross_references.json"),
        }
    }
}

impl ServiceConfig {
    /// Builds the configuration from the environment, using defaults
    /// for anything unset.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when a numeric variable fails to
    /// parse.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(key) = std::env::var(ENV_API_KEY)
            && !key.is_empty()
        {
            config.provider_api_key = Some(key);
        }
        if let Ok(name) = std::env::var(ENV_INDEX_NAME)
            && !name.is_empty()
        {
            config.index_name = name;
        }
        if let Ok(region) = std::env::var(ENV_INDEX_REGION)
            && !region.is_empty()
        {
            config.index_region = region;
        }
        if let Ok(dir) = std::env::var(ENV_UPLOAD_DIR)
            && !dir.is_empty()
        {
            config.upload_dir = PathBuf::from(dir);
        }
        if let Ok(graph) = std::env::var(ENV_GRAPH_PATH)
            && !graph.is_empty()
        {
            config.graph_path = PathBuf::from(graph);
        }
        if let Ok(raw) = std::env::var(ENV_MAX_UPLOAD_BYTES) {
            config.max_upload_bytes = raw.parse().map_err(|_| Error::Config {
                message: format!("{ENV_MAX_UPLOAD_BYTES} must be an integer, got {raw:?}"),
            })?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Checks the internal consistency of the configuration.
    ///
    /// # Errors
    ///
    /// Returns a configuration error on inconsistent values.
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(Error::Config {
                message: "chunk_size must be greater than zero".to_string(),
            });
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(Error::Config {
                message: format!(
                    "chunk_overlap {} must be less than chunk_size {}",
                    self.chunk_overlap, self.chunk_size
                ),
            });
        }
        if self.max_upload_bytes == 0 {
            return Err(Error::Config {
                message: "max_upload_bytes must be greater than zero".to_string(),
            });
        }
        if self.index_name.is_empty() {
            return Err(Error::Config {
                message: "index_name must not be empty".to_string(),
            });
        }
        Ok(())
    }

    /// Requires provider credentials, for deployments that talk to real
    /// collaborators.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when the API key is missing.
    pub fn require_credentials(&self) -> Result<&str> {
        self.provider_api_key.as_deref().ok_or_else(|| Error::Config {
            message: format!("{ENV_API_KEY} is not set"),
        })
    }
}
