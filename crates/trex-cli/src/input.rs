//! Input loading for annotated documents

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use trex_core::AnnotatedDocument;
use trex_extractor::conllu;

/// Supported annotation formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum InputFormat {
    /// `{ "text": "...", "tokens": [...] }`
    Json,
    /// CoNLL-U dependency annotation
    Conllu,
}

impl InputFormat {
    /// Guess from the file extension, defaulting to JSON
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("conllu") | Some("conll") => Self::Conllu,
            _ => Self::Json,
        }
    }
}

#[derive(Debug, Deserialize)]
struct JsonInput {
    #[serde(default)]
    text: Option<String>,
    tokens: AnnotatedDocument,
}

/// An annotated document and the text it was annotated from
#[derive(Debug)]
pub struct LoadedInput {
    pub document: AnnotatedDocument,
    pub source_text: String,
}

/// Read and validate an input file
pub fn load(path: &Path, format: Option<InputFormat>) -> Result<LoadedInput> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    parse(&content, format.unwrap_or_else(|| InputFormat::from_path(path)))
        .with_context(|| format!("Invalid annotated document in {}", path.display()))
}

fn parse(content: &str, format: InputFormat) -> Result<LoadedInput> {
    let (document, text) = match format {
        InputFormat::Json => {
            let input: JsonInput = serde_json::from_str(content)?;
            (input.tokens, input.text)
        }
        InputFormat::Conllu => (conllu::parse_document(content)?, None),
    };

    let source_text = text.unwrap_or_else(|| document.text());
    Ok(LoadedInput {
        document,
        source_text,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const JSON: &str = r#"{
        "text": "Ginsburg wrote opinions.",
        "tokens": [
            {"index": 0, "text": "Ginsburg", "pos": "PROPN", "dep": "nsubj", "head": 1},
            {"index": 1, "text": "wrote", "pos": "VERB", "dep": "ROOT", "head": 1},
            {"index": 2, "text": "opinions", "pos": "NOUN", "dep": "dobj", "head": 1}
        ]
    }"#;

    #[test]
    fn test_format_from_path() {
        assert_eq!(
            InputFormat::from_path(Path::new("a.conllu")),
            InputFormat::Conllu
        );
        assert_eq!(InputFormat::from_path(Path::new("a.json")), InputFormat::Json);
        assert_eq!(InputFormat::from_path(Path::new("noext")), InputFormat::Json);
    }

    #[test]
    fn test_parse_json_with_text() {
        let input = parse(JSON, InputFormat::Json).unwrap();
        assert_eq!(input.document.len(), 3);
        assert_eq!(input.source_text, "Ginsburg wrote opinions.");
    }

    #[test]
    fn test_parse_json_without_text_joins_tokens() {
        let json = r#"{"tokens": [{"index": 0, "text": "Paris", "pos": "PROPN", "dep": "ROOT", "head": 0}]}"#;
        let input = parse(json, InputFormat::Json).unwrap();
        assert_eq!(input.source_text, "Paris");
    }

    #[test]
    fn test_load_rejects_malformed_document() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"tokens": [{{"index": 0, "text": "Paris", "pos": "PROPN", "dep": "ROOT", "head": 4}}]}}"#
        )
        .unwrap();

        assert!(load(file.path(), None).is_err());
    }

    #[test]
    fn test_load_conllu() {
        let mut file = tempfile::Builder::new().suffix(".conllu").tempfile().unwrap();
        writeln!(file, "1\tParis\tParis\tPROPN\t_\t_\t0\tROOT\t_\t_").unwrap();

        let input = load(file.path(), None).unwrap();
        assert_eq!(input.document.len(), 1);
        assert_eq!(input.source_text, "Paris");
    }
}
