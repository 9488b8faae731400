//! Dependency pattern extraction
//!
//! Finds proper-noun phrases and links pairs of them through a shared
//! governing verb:
//! - direct object: `subj -nsubj-> verb <-dobj- obj`
//! - prepositional object: `subj -nsubj-> verb <-prep- prep <-pobj- obj`

use std::collections::BTreeSet;

use trex_core::{dep, AnnotatedDocument, Result, Token, Triplet};

use crate::index::DependencyIndex;
use crate::TripletExtractor;

/// A proper-noun phrase anchored at a non-compound PROPN token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProperNounPhrase<'a> {
    /// Phrase head
    pub head: &'a Token,
    /// Head text plus compound modifiers, sorted and space-joined
    pub text: String,
}

/// Collect proper-noun phrases in token order.
pub fn find_phrases<'a>(index: &DependencyIndex<'a>) -> Vec<ProperNounPhrase<'a>> {
    index
        .document()
        .iter()
        .filter(|t| t.is_proper_noun() && t.dep_label != dep::COMPOUND)
        .map(|head| {
            let parts: BTreeSet<&str> = index
                .children_with_label(head.index, dep::COMPOUND)
                .map(|t| t.text.as_str())
                .chain(std::iter::once(head.text.as_str()))
                .collect();

            ProperNounPhrase {
                head,
                text: parts.into_iter().collect::<Vec<_>>().join(" "),
            }
        })
        .collect()
}

/// Match both patterns over every ordered pair of distinct phrases.
///
/// Duplicates are kept; a pair may fire both patterns.
pub fn extract_dependency_with_index(index: &DependencyIndex<'_>) -> Vec<Triplet> {
    let phrases = find_phrases(index);
    let mut triplets = Vec::new();

    for subject in &phrases {
        let h1 = subject.head;
        if h1.dep_label != dep::NSUBJ {
            continue;
        }
        let verb = index.head(h1.index);

        for object in &phrases {
            let h2 = object.head;
            if h1.index == h2.index {
                continue;
            }

            if h1.head_index == h2.head_index && h2.dep_label == dep::DOBJ {
                triplets.push(Triplet::new(&subject.text, &verb.text, &object.text));
            }

            let governor = index.head(h2.index);
            if h1.head_index == governor.head_index
                && governor.dep_label == dep::PREP
                && h2.dep_label == dep::POBJ
            {
                triplets.push(Triplet::new(
                    &subject.text,
                    format!("{} {}", verb.text, governor.text),
                    &object.text,
                ));
            }
        }
    }

    tracing::debug!(
        phrases = phrases.len(),
        triplets = triplets.len(),
        "dependency extraction finished"
    );

    triplets
}

/// Build a [`DependencyIndex`] and run the dependency patterns.
pub fn extract_dependency(doc: &AnnotatedDocument) -> Vec<Triplet> {
    let index = DependencyIndex::new(doc);
    extract_dependency_with_index(&index)
}

/// Dependency-graph extractor
#[derive(Debug, Clone, Copy, Default)]
pub struct DependencyExtractor;

impl TripletExtractor for DependencyExtractor {
    fn name(&self) -> &str {
        "dependency"
    }

    fn extract(&self, doc: &AnnotatedDocument) -> Result<Vec<Triplet>> {
        Ok(extract_dependency(doc))
    }
}
