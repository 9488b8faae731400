//! LLM-backed validation collaborator
//!
//! Asks a language model whether candidate triplets are stated in the
//! source text (precision) and which stated facts are missing (recall).

use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use trex_core::{LlmClient, Result, Triplet, TrexError, ValidationCollaborator};

/// Configuration for the LLM validator
#[derive(Debug, Clone)]
pub struct LlmValidatorConfig {
    /// Instructions for the precision check
    pub precision_prompt: String,
    /// Instructions for the recall check
    pub recall_prompt: String,
    /// Source text is cut to this many characters
    pub max_source_chars: usize,
}

impl Default for LlmValidatorConfig {
    fn default() -> Self {
        Self {
            precision_prompt: include_str!("prompts/precision.txt").to_string(),
            recall_prompt: include_str!("prompts/recall.txt").to_string(),
            max_source_chars: 12_000,
        }
    }
}

/// Validation collaborator backed by an [`LlmClient`]
pub struct LlmValidator {
    client: Arc<dyn LlmClient>,
    config: LlmValidatorConfig,
}

impl LlmValidator {
    /// Create a validator with the default prompts
    pub fn new(client: Arc<dyn LlmClient>) -> Self {
        Self {
            client,
            config: LlmValidatorConfig::default(),
        }
    }

    /// Create with custom config
    pub fn with_config(client: Arc<dyn LlmClient>, config: LlmValidatorConfig) -> Self {
        Self { client, config }
    }

    /// Build the precision-check prompt
    pub fn build_precision_prompt(&self, source_text: &str, candidates: &[Triplet]) -> String {
        format!(
            "{}\n\nText:\n{}\n\nCandidates:\n{}\n\nAnswer:",
            self.config.precision_prompt,
            truncate_chars(source_text, self.config.max_source_chars),
            numbered_list(candidates),
        )
    }

    /// Build the recall-check prompt
    pub fn build_recall_prompt(&self, source_text: &str, candidates: &[Triplet]) -> String {
        let known = if candidates.is_empty() {
            "(none)".to_string()
        } else {
            numbered_list(candidates)
        };
        format!(
            "{}\n\nText:\n{}\n\nKnown triplets:\n{}\n\nAnswer:",
            self.config.recall_prompt,
            truncate_chars(source_text, self.config.max_source_chars),
            known,
        )
    }
}

#[async_trait]
impl ValidationCollaborator for LlmValidator {
    async fn check_precision(&self, source_text: &str, candidates: &[Triplet]) -> Result<Vec<bool>> {
        if candidates.is_empty() {
            return Ok(Vec::new());
        }

        let prompt = self.build_precision_prompt(source_text, candidates);
        tracing::debug!(
            client = self.client.name(),
            candidates = candidates.len(),
            "precision check"
        );
        let response = self.client.generate(&prompt).await?;

        let decisions = parse_decisions(&response)?;
        if decisions.len() != candidates.len() {
            return Err(TrexError::LlmError(format!(
                "expected {} decisions, got {}",
                candidates.len(),
                decisions.len()
            )));
        }
        Ok(decisions)
    }

    async fn check_recall(&self, source_text: &str, candidates: &[Triplet]) -> Result<Vec<Triplet>> {
        let prompt = self.build_recall_prompt(source_text, candidates);
        tracing::debug!(
            client = self.client.name(),
            known = candidates.len(),
            "recall check"
        );
        let response = self.client.generate(&prompt).await?;
        parse_triplets(&response)
    }
}

// ============================================================================
// Prompt helpers
// ============================================================================

fn numbered_list(triplets: &[Triplet]) -> String {
    triplets
        .iter()
        .enumerate()
        .map(|(i, t)| format!("{}. {}", i + 1, t))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Cut `text` to at most `max_chars` characters on a char boundary
fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

// ============================================================================
// Response parsing
// ============================================================================

/// First `[` to last `]`; models like to wrap answers in prose or fences.
fn json_array(response: &str) -> Result<&str> {
    static ARRAY: OnceLock<Regex> = OnceLock::new();
    let pattern = ARRAY.get_or_init(|| Regex::new(r"(?s)\[.*\]").expect("array pattern is valid"));

    pattern
        .find(response)
        .map(|m| m.as_str())
        .ok_or_else(|| TrexError::LlmError(format!("no JSON array in response: {response}")))
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Decision {
    Flag(bool),
    Word(String),
}

impl Decision {
    fn accepted(&self) -> Result<bool> {
        match self {
            Self::Flag(flag) => Ok(*flag),
            Self::Word(word) => match word.trim().to_lowercase().as_str() {
                "true" | "yes" | "correct" | "valid" => Ok(true),
                "false" | "no" | "incorrect" | "invalid" => Ok(false),
                other => Err(TrexError::LlmError(format!("unreadable decision: {other:?}"))),
            },
        }
    }
}

pub(crate) fn parse_decisions(response: &str) -> Result<Vec<bool>> {
    let array = json_array(response)?;
    let decisions: Vec<Decision> = serde_json::from_str(array)
        .map_err(|e| TrexError::LlmError(format!("Failed to parse decisions: {e}")))?;
    decisions.iter().map(Decision::accepted).collect()
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawTriplet {
    Tuple([String; 3]),
    Named(Triplet),
}

pub(crate) fn parse_triplets(response: &str) -> Result<Vec<Triplet>> {
    let array = json_array(response)?;
    let raw: Vec<RawTriplet> = serde_json::from_str(array)
        .map_err(|e| TrexError::LlmError(format!("Failed to parse triplets: {e}")))?;

    Ok(raw
        .into_iter()
        .map(|r| match r {
            RawTriplet::Tuple([subject, relation, object]) => {
                Triplet::new(subject, relation, object)
            }
            RawTriplet::Named(t) => t,
        })
        .collect())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Replays canned responses and records prompts
    struct ScriptedClient {
        responses: Mutex<Vec<String>>,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedClient {
        fn new(responses: &[&str]) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(responses.iter().rev().map(|s| s.to_string()).collect()),
                prompts: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl LlmClient for ScriptedClient {
        async fn generate(&self, prompt: &str) -> Result<String> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.responses
                .lock()
                .unwrap()
                .pop()
                .ok_or_else(|| TrexError::LlmError("script exhausted".into()))
        }

        fn name(&self) -> &str {
            "scripted"
        }
    }

    fn candidates() -> Vec<Triplet> {
        vec![
            Triplet::new("Ginsburg", "wrote", "opinion"),
            Triplet::new("Ginsburg", "born in", "Brooklyn"),
        ]
    }

    #[tokio::test]
    async fn test_check_precision() {
        let client = ScriptedClient::new(&["Sure!\n```json\n[true, false]\n```"]);
        let validator = LlmValidator::new(client.clone());

        let decisions = validator
            .check_precision("Ginsburg wrote the opinion.", &candidates())
            .await
            .unwrap();
        assert_eq!(decisions, vec![true, false]);

        let prompts = client.prompts.lock().unwrap();
        assert!(prompts[0].contains("1. (Ginsburg, wrote, opinion)"));
        assert!(prompts[0].contains("2. (Ginsburg, born in, Brooklyn)"));
    }

    #[tokio::test]
    async fn test_check_precision_count_mismatch() {
        let client = ScriptedClient::new(&["[true]"]);
        let validator = LlmValidator::new(client);

        let err = validator
            .check_precision("text", &candidates())
            .await
            .unwrap_err();
        assert!(matches!(err, TrexError::LlmError(_)));
    }

    #[tokio::test]
    async fn test_check_precision_empty_skips_call() {
        let client = ScriptedClient::new(&[]);
        let validator = LlmValidator::new(client.clone());

        assert!(validator.check_precision("text", &[]).await.unwrap().is_empty());
        assert!(client.prompts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_check_recall() {
        let client = ScriptedClient::new(&[
            r#"[["Ginsburg", "attended", "Cornell"], {"subject": "Ginsburg", "relation": "taught at", "object": "Rutgers"}]"#,
        ]);
        let validator = LlmValidator::new(client);

        let missed = validator
            .check_recall("Ginsburg attended Cornell.", &candidates())
            .await
            .unwrap();
        assert_eq!(
            missed,
            vec![
                Triplet::new("Ginsburg", "attended", "Cornell"),
                Triplet::new("Ginsburg", "taught at", "Rutgers"),
            ]
        );
    }

    #[test]
    fn test_parse_decisions_words() {
        assert_eq!(
            parse_decisions(r#"["yes", "no", true]"#).unwrap(),
            vec![true, false, true]
        );
        assert!(parse_decisions("I cannot tell").is_err());
    }

    #[test]
    fn test_parse_decisions_unknown_word_is_error() {
        let err = parse_decisions(r#"["unsure", "n/a", true]"#).unwrap_err();
        assert!(matches!(err, TrexError::LlmError(_)));
        assert_eq!(
            parse_decisions(r#"["Incorrect", " VALID "]"#).unwrap(),
            vec![false, true]
        );
    }

    #[test]
    fn test_truncate_chars_respects_boundaries() {
        assert_eq!(truncate_chars("Zürich", 2), "Zü");
        assert_eq!(truncate_chars("abc", 10), "abc");
    }

    #[test]
    fn test_recall_prompt_without_candidates() {
        let validator = LlmValidator::new(ScriptedClient::new(&[]));
        let prompt = validator.build_recall_prompt("text", &[]);
        assert!(prompt.contains("Known triplets:\n(none)"));
    }
}
