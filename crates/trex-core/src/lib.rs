//! TREX Core - Domain models, traits, and shared types
//!
//! This crate defines the core abstractions used throughout the TREX system:
//! - Annotated documents (tokens, POS tags, dependency heads)
//! - Triplets (subject, relation, object)
//! - Common error types
//! - Collaborator traits (validation, LLM clients)
//! - Configuration management

pub mod config;
pub mod document;

pub use config::{
    AppConfig, ConfigError, ExtractionConfig, ExtractionMethod, LlmConfig, LlmProvider,
    LoggingConfig, ValidationConfig,
};
pub use document::{dep, AnnotatedDocument, PosTag, Token};

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Core error types for TREX operations
#[derive(Error, Debug)]
pub enum TrexError {
    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    #[error("LLM error: {0}")]
    LlmError(String),

    /// Failure worth retrying (timeouts, rate limits, server errors)
    #[error("Transient failure: {0}")]
    Transient(String),

    /// The provider refuses further requests for this run
    #[error("Quota exhausted: {0}")]
    QuotaExhausted(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl TrexError {
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient(_))
    }
}

pub type Result<T> = std::result::Result<T, TrexError>;

// ============================================================================
// Triplets
// ============================================================================

/// A (subject, relation, object) fact candidate
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Triplet {
    pub subject: String,
    pub relation: String,
    pub object: String,
}

impl Triplet {
    /// Create a new triplet
    pub fn new(
        subject: impl Into<String>,
        relation: impl Into<String>,
        object: impl Into<String>,
    ) -> Self {
        Self {
            subject: subject.into(),
            relation: relation.into(),
            object: object.into(),
        }
    }
}

impl std::fmt::Display for Triplet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {}, {})", self.subject, self.relation, self.object)
    }
}

impl<S, R, O> From<(S, R, O)> for Triplet
where
    S: Into<String>,
    R: Into<String>,
    O: Into<String>,
{
    fn from((subject, relation, object): (S, R, O)) -> Self {
        Self::new(subject, relation, object)
    }
}

// ============================================================================
// Traits
// ============================================================================

/// External checker for extracted triplets
///
/// Implementations typically call a language model. The extractors never
/// depend on this trait; only the validation layer does.
#[async_trait::async_trait]
pub trait ValidationCollaborator: Send + Sync {
    /// One accept/reject decision per candidate, in input order
    async fn check_precision(&self, source_text: &str, candidates: &[Triplet])
        -> Result<Vec<bool>>;

    /// Triplets stated in the text but missing from `candidates`
    async fn check_recall(&self, source_text: &str, candidates: &[Triplet])
        -> Result<Vec<Triplet>>;
}

/// Trait for LLM clients
#[async_trait::async_trait]
pub trait LlmClient: Send + Sync {
    /// Generate a response
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Get client name for logging
    fn name(&self) -> &str;
}

// ============================================================================
// Tests
// ============================================================================
