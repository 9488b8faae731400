//! Annotated document model
//!
//! Tokens carry a part-of-speech tag, a dependency label and the index of
//! their governing token. A sentence root points at itself.

use std::ops::Index;

use serde::{Deserialize, Serialize};

use crate::{Result, TrexError};

// ============================================================================
// Part-of-speech tags
// ============================================================================

/// Universal part-of-speech tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PosTag {
    Adj,
    Adp,
    Adv,
    Aux,
    Cconj,
    Det,
    Intj,
    Noun,
    Num,
    Part,
    Pron,
    Propn,
    Punct,
    Sconj,
    Sym,
    Verb,
    Space,
    /// Anything the annotator could not (or did not) classify
    X,
}

impl PosTag {
    /// Get the string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Adj => "ADJ",
            Self::Adp => "ADP",
            Self::Adv => "ADV",
            Self::Aux => "AUX",
            Self::Cconj => "CCONJ",
            Self::Det => "DET",
            Self::Intj => "INTJ",
            Self::Noun => "NOUN",
            Self::Num => "NUM",
            Self::Part => "PART",
            Self::Pron => "PRON",
            Self::Propn => "PROPN",
            Self::Punct => "PUNCT",
            Self::Sconj => "SCONJ",
            Self::Sym => "SYM",
            Self::Verb => "VERB",
            Self::Space => "SPACE",
            Self::X => "X",
        }
    }

    /// Parse a tag, falling back to `X` for unknown tags
    pub fn parse(s: &str) -> Self {
        match s.to_uppercase().as_str() {
            "ADJ" => Self::Adj,
            "ADP" => Self::Adp,
            "ADV" => Self::Adv,
            "AUX" => Self::Aux,
            "CCONJ" | "CONJ" => Self::Cconj,
            "DET" => Self::Det,
            "INTJ" => Self::Intj,
            "NOUN" => Self::Noun,
            "NUM" => Self::Num,
            "PART" => Self::Part,
            "PRON" => Self::Pron,
            "PROPN" => Self::Propn,
            "PUNCT" => Self::Punct,
            "SCONJ" => Self::Sconj,
            "SYM" => Self::Sym,
            "VERB" => Self::Verb,
            "SPACE" => Self::Space,
            _ => Self::X,
        }
    }
}

impl From<String> for PosTag {
    fn from(s: String) -> Self {
        Self::parse(&s)
    }
}

impl From<PosTag> for String {
    fn from(tag: PosTag) -> Self {
        tag.as_str().to_string()
    }
}

impl std::fmt::Display for PosTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// Dependency labels
// ============================================================================

/// Dependency labels the extractors match on
pub mod dep {
    pub const NSUBJ: &str = "nsubj";
    pub const DOBJ: &str = "dobj";
    pub const PREP: &str = "prep";
    pub const POBJ: &str = "pobj";
    pub const COMPOUND: &str = "compound";
}

// ============================================================================
// Token
// ============================================================================

/// A single annotated token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    /// Position in the document (0-based)
    pub index: usize,

    /// Surface form
    pub text: String,

    /// Part-of-speech tag
    #[serde(alias = "pos")]
    pub pos_tag: PosTag,

    /// Dependency label relative to the head
    #[serde(alias = "dep")]
    pub dep_label: String,

    /// Index of the governing token (equal to `index` for a root)
    #[serde(alias = "head")]
    pub head_index: usize,
}

impl Token {
    /// Create a new token
    pub fn new(
        index: usize,
        text: impl Into<String>,
        pos_tag: PosTag,
        dep_label: impl Into<String>,
        head_index: usize,
    ) -> Self {
        Self {
            index,
            text: text.into(),
            pos_tag,
            dep_label: dep_label.into(),
            head_index,
        }
    }

    /// Whether this token is a sentence root
    pub fn is_root(&self) -> bool {
        self.head_index == self.index
    }

    pub fn is_proper_noun(&self) -> bool {
        self.pos_tag == PosTag::Propn
    }
}

// ============================================================================
// Annotated document
// ============================================================================

/// An immutable, validated sequence of annotated tokens
///
/// Construction checks that the document is non-empty, that every token sits
/// at its own index, that every head is in range and that every head chain
/// ends at a root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Token>", into = "Vec<Token>")]
pub struct AnnotatedDocument {
    tokens: Vec<Token>,
}

impl AnnotatedDocument {
    /// Validate tokens and build a document
    pub fn new(tokens: Vec<Token>) -> Result<Self> {
        if tokens.is_empty() {
            return Err(TrexError::InvalidDocument("document is empty".to_string()));
        }

        let len = tokens.len();
        for (position, token) in tokens.iter().enumerate() {
            if token.index != position {
                return Err(TrexError::InvalidDocument(format!(
                    "token '{}' at position {} has index {}",
                    token.text, position, token.index
                )));
            }
            if token.head_index >= len {
                return Err(TrexError::InvalidDocument(format!(
                    "token {} ('{}') has head {} outside 0..{}",
                    position, token.text, token.head_index, len
                )));
            }
        }

        check_acyclic(&tokens)?;

        Ok(Self { tokens })
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn get(&self, index: usize) -> Option<&Token> {
        self.tokens.get(index)
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Always false for a constructed document
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Token> {
        self.tokens.iter()
    }

    /// The governing token of `token`
    pub fn head_of(&self, token: &Token) -> &Token {
        &self.tokens[token.head_index]
    }

    /// Token texts joined with single spaces
    pub fn text(&self) -> String {
        self.tokens
            .iter()
            .map(|t| t.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl Index<usize> for AnnotatedDocument {
    type Output = Token;

    fn index(&self, index: usize) -> &Token {
        &self.tokens[index]
    }
}

impl<'a> IntoIterator for &'a AnnotatedDocument {
    type Item = &'a Token;
    type IntoIter = std::slice::Iter<'a, Token>;

    fn into_iter(self) -> Self::IntoIter {
        self.tokens.iter()
    }
}

impl TryFrom<Vec<Token>> for AnnotatedDocument {
    type Error = TrexError;

    fn try_from(tokens: Vec<Token>) -> Result<Self> {
        Self::new(tokens)
    }
}

impl From<AnnotatedDocument> for Vec<Token> {
    fn from(doc: AnnotatedDocument) -> Self {
        doc.tokens
    }
}

/// Every head chain must reach a self-referential root.
fn check_acyclic(tokens: &[Token]) -> Result<()> {
    #[derive(Clone, Copy, PartialEq)]
    enum Mark {
        Unvisited,
        InProgress,
        Done,
    }

    let mut marks = vec![Mark::Unvisited; tokens.len()];
    let mut path = Vec::new();

    for start in 0..tokens.len() {
        let mut current = start;
        loop {
            match marks[current] {
                Mark::Done => break,
                Mark::InProgress => {
                    return Err(TrexError::InvalidDocument(format!(
                        "head chain starting at token {} contains a cycle through token {}",
                        start, current
                    )));
                }
                Mark::Unvisited => {
                    marks[current] = Mark::InProgress;
                    path.push(current);
                    let token = &tokens[current];
                    if token.is_root() {
                        break;
                    }
                    current = token.head_index;
                }
            }
        }

        for idx in path.drain(..) {
            marks[idx] = Mark::Done;
        }
    }

    Ok(())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn tok(index: usize, text: &str, pos: PosTag, dep: &str, head: usize) -> Token {
        Token::new(index, text, pos, dep, head)
    }

    #[test]
    fn test_valid_document() {
        let doc = AnnotatedDocument::new(vec![
            tok(0, "Ginsburg", PosTag::Propn, "nsubj", 1),
            tok(1, "wrote", PosTag::Verb, "ROOT", 1),
        ])
        .unwrap();

        assert_eq!(doc.len(), 2);
        assert!(doc[1].is_root());
        assert_eq!(doc.head_of(&doc[0]).text, "wrote");
        assert_eq!(doc.text(), "Ginsburg wrote");
    }

    #[test]
    fn test_empty_document_rejected() {
        let err = AnnotatedDocument::new(vec![]).unwrap_err();
        assert!(matches!(err, TrexError::InvalidDocument(_)));
    }

    #[test]
    fn test_head_out_of_range_rejected() {
        let err = AnnotatedDocument::new(vec![
            tok(0, "Ginsburg", PosTag::Propn, "nsubj", 5),
            tok(1, "wrote", PosTag::Verb, "ROOT", 1),
        ])
        .unwrap_err();
        assert!(matches!(err, TrexError::InvalidDocument(_)));
    }

    #[test]
    fn test_misplaced_index_rejected() {
        let err = AnnotatedDocument::new(vec![
            tok(1, "Ginsburg", PosTag::Propn, "nsubj", 1),
            tok(0, "wrote", PosTag::Verb, "ROOT", 0),
        ])
        .unwrap_err();
        assert!(matches!(err, TrexError::InvalidDocument(_)));
    }

    #[test]
    fn test_cycle_rejected() {
        let err = AnnotatedDocument::new(vec![
            tok(0, "a", PosTag::Noun, "dep", 1),
            tok(1, "b", PosTag::Noun, "dep", 0),
            tok(2, "c", PosTag::Verb, "ROOT", 2),
        ])
        .unwrap_err();
        assert!(matches!(err, TrexError::InvalidDocument(_)));
    }

    #[test]
    fn test_multiple_roots_allowed() {
        let doc = AnnotatedDocument::new(vec![
            tok(0, "Hello", PosTag::Intj, "ROOT", 0),
            tok(1, "Bye", PosTag::Intj, "ROOT", 1),
        ]);
        assert!(doc.is_ok());
    }

    #[test]
    fn test_deserialize_validates() {
        let json = r#"[
            {"index": 0, "text": "Paris", "pos": "PROPN", "dep": "ROOT", "head": 0},
            {"index": 1, "text": "!", "pos_tag": "PUNCT", "dep_label": "punct", "head_index": 0}
        ]"#;
        let doc: AnnotatedDocument = serde_json::from_str(json).unwrap();
        assert_eq!(doc[1].pos_tag, PosTag::Punct);

        let bad = r#"[{"index": 0, "text": "Paris", "pos": "PROPN", "dep": "ROOT", "head": 3}]"#;
        assert!(serde_json::from_str::<AnnotatedDocument>(bad).is_err());
    }

    #[test]
    fn test_unknown_pos_tag() {
        let tag: PosTag = serde_json::from_str("\"FOO\"").unwrap();
        assert_eq!(tag, PosTag::X);
        assert_eq!(PosTag::parse("propn"), PosTag::Propn);
        assert_eq!(PosTag::Adp.to_string(), "ADP");
    }

    #[test]
    fn test_pos_tag_json_matches_parse() {
        for raw in ["propn", "Propn", "PROPN", "conj", "foo"] {
            let tag: PosTag = serde_json::from_str(&format!("\"{raw}\"")).unwrap();
            assert_eq!(tag, PosTag::parse(raw));
        }
        assert_eq!(serde_json::to_string(&PosTag::Propn).unwrap(), "\"PROPN\"");
    }
}
