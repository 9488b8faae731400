//! TREX Extractor - Triplet extraction over annotated text
//!
//! Two independent strategies share one read-only [`AnnotatedDocument`]:
//! - Linear: proper nouns joined by a verb/adposition span
//! - Dependency: proper-noun phrases linked through a governing verb
//!
//! Neither strategy deduplicates its output.

use trex_core::{AnnotatedDocument, ExtractionMethod, Result, Triplet};

pub mod conllu;
pub mod dependency;
pub mod index;
pub mod linear;
pub mod metrics;

pub use dependency::{
    extract_dependency, extract_dependency_with_index, find_phrases, DependencyExtractor,
    ProperNounPhrase,
};
pub use index::DependencyIndex;
pub use linear::{extract_linear, LinearExtractor};
pub use metrics::{Evaluator, TripletMetrics};

/// Trait for triplet extractors
pub trait TripletExtractor: Send + Sync {
    /// Extractor name for logging
    fn name(&self) -> &str;

    fn extract(&self, doc: &AnnotatedDocument) -> Result<Vec<Triplet>>;
}

/// Extractors selected by `method`, in output order
pub fn extractors_for(method: ExtractionMethod) -> Vec<Box<dyn TripletExtractor>> {
    match method {
        ExtractionMethod::Linear => vec![Box::new(LinearExtractor)],
        ExtractionMethod::Dependency => vec![Box::new(DependencyExtractor)],
        ExtractionMethod::Both => vec![Box::new(LinearExtractor), Box::new(DependencyExtractor)],
    }
}

/// Run the selected extractors and concatenate their output.
pub fn extract_all(doc: &AnnotatedDocument, method: ExtractionMethod) -> Result<Vec<Triplet>> {
    let mut triplets = Vec::new();
    for extractor in extractors_for(method) {
        let found = extractor.extract(doc)?;
        tracing::debug!(
            extractor = extractor.name(),
            count = found.len(),
            "extractor finished"
        );
        triplets.extend(found);
    }
    Ok(triplets)
}
