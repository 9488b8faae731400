//! TREX Validate - LLM-backed triplet validation
//!
//! This crate sits outside the extraction core:
//! - LLM clients (OpenAI-compatible, Ollama)
//! - [`LlmValidator`], a [`trex_core::ValidationCollaborator`] built on them
//! - [`ValidationRunner`], which batches checks, retries transient failures
//!   and stops on an exhausted quota while keeping partial results
//! - Seeded sampling of triplets before validation
//!
//! Author: hephaex@gmail.com

pub mod llm;
pub mod runner;
pub mod sample;
pub mod validator;

pub use llm::{create_llm_client, OllamaClient, OpenAiClient};
pub use runner::{ValidatedTriplet, ValidationReport, ValidationRunner, Verdict};
pub use sample::sample_triplets;
pub use validator::{LlmValidator, LlmValidatorConfig};
