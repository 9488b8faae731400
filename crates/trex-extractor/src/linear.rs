//! Linear pattern extraction
//!
//! Pairs each proper noun with the nearest proper noun to its right that is
//! reachable without crossing punctuation and with at least one verb in
//! between. The relation is the verbs and adpositions of that span.

use trex_core::{AnnotatedDocument, PosTag, Result, Triplet};

use crate::TripletExtractor;

/// Scan the token sequence left to right for PROPN .. VERB .. PROPN spans.
///
/// Emits at most one triplet per subject token. A proper noun without a verb
/// before it does not end the scan; punctuation does.
pub fn extract_linear(doc: &AnnotatedDocument) -> Vec<Triplet> {
    let tokens = doc.tokens();
    let mut triplets = Vec::new();

    for (i, subject) in tokens.iter().enumerate() {
        if !subject.is_proper_noun() {
            continue;
        }

        for (j, candidate) in tokens.iter().enumerate().skip(i + 1) {
            match candidate.pos_tag {
                PosTag::Punct => break,
                PosTag::Propn => {
                    let span = &tokens[i + 1..j];
                    let contains_verb = span.iter().any(|t| t.pos_tag == PosTag::Verb);
                    if !contains_verb {
                        continue;
                    }

                    let relation = span
                        .iter()
                        .filter(|t| matches!(t.pos_tag, PosTag::Verb | PosTag::Adp))
                        .map(|t| t.text.as_str())
                        .collect::<Vec<_>>()
                        .join(" ");

                    triplets.push(Triplet::new(&subject.text, relation, &candidate.text));
                    break;
                }
                _ => {}
            }
        }
    }

    tracing::debug!(
        tokens = tokens.len(),
        triplets = triplets.len(),
        "linear extraction finished"
    );

    triplets
}

/// POS-sequence extractor
#[derive(Debug, Clone, Copy, Default)]
pub struct LinearExtractor;

impl TripletExtractor for LinearExtractor {
    fn name(&self) -> &str {
        "linear"
    }

    fn extract(&self, doc: &AnnotatedDocument) -> Result<Vec<Triplet>> {
        Ok(extract_linear(doc))
    }
}
