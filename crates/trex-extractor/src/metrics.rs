//! Quality Metrics module
//!
//! Scores extracted triplets against a gold standard with
//! precision, recall and F1.

use serde::{Deserialize, Serialize};
use trex_core::Triplet;

// ============================================================================
// Triplet Metrics
// ============================================================================

/// Metrics for triplet extraction evaluation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TripletMetrics {
    /// Predictions matching a gold triplet
    pub true_positives: usize,
    /// Predictions with no gold counterpart (duplicates included)
    pub false_positives: usize,
    /// Gold triplets no prediction matched
    pub false_negatives: usize,
    /// Total triplets in gold standard
    pub gold_total: usize,
    /// Total triplets predicted
    pub predicted_total: usize,
}

impl TripletMetrics {
    /// Calculate precision (TP / (TP + FP))
    pub fn precision(&self) -> f32 {
        if self.true_positives + self.false_positives == 0 {
            0.0
        } else {
            self.true_positives as f32 / (self.true_positives + self.false_positives) as f32
        }
    }

    /// Calculate recall (TP / (TP + FN))
    pub fn recall(&self) -> f32 {
        if self.true_positives + self.false_negatives == 0 {
            0.0
        } else {
            self.true_positives as f32 / (self.true_positives + self.false_negatives) as f32
        }
    }

    /// Calculate F1 score (2 * P * R / (P + R))
    pub fn f1_score(&self) -> f32 {
        let p = self.precision();
        let r = self.recall();
        if p + r == 0.0 {
            0.0
        } else {
            2.0 * p * r / (p + r)
        }
    }

    /// Accumulate another document's counts
    pub fn add(&mut self, other: &TripletMetrics) {
        self.true_positives += other.true_positives;
        self.false_positives += other.false_positives;
        self.false_negatives += other.false_negatives;
        self.gold_total += other.gold_total;
        self.predicted_total += other.predicted_total;
    }

    /// Human-readable summary
    pub fn report(&self) -> String {
        format!(
            "Precision: {:.1}%\n\
             Recall:    {:.1}%\n\
             F1 Score:  {:.1}%\n\
             Gold: {} | Predicted: {} | TP: {} | FP: {} | FN: {}\n",
            self.precision() * 100.0,
            self.recall() * 100.0,
            self.f1_score() * 100.0,
            self.gold_total,
            self.predicted_total,
            self.true_positives,
            self.false_positives,
            self.false_negatives,
        )
    }
}

// ============================================================================
// Evaluator
// ============================================================================

/// Evaluator for extraction quality
#[derive(Debug, Clone, Default)]
pub struct Evaluator {
    /// Compare subject/relation/object case-insensitively
    ignore_case: bool,
}

impl Evaluator {
    /// Create a new evaluator with exact matching
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable/disable case-insensitive matching
    pub fn with_ignore_case(mut self, ignore_case: bool) -> Self {
        self.ignore_case = ignore_case;
        self
    }

    fn triplets_match(&self, predicted: &Triplet, gold: &Triplet) -> bool {
        if self.ignore_case {
            predicted.subject.to_lowercase() == gold.subject.to_lowercase()
                && predicted.relation.to_lowercase() == gold.relation.to_lowercase()
                && predicted.object.to_lowercase() == gold.object.to_lowercase()
        } else {
            predicted == gold
        }
    }

    /// Evaluate predictions; each gold triplet matches at most one prediction
    pub fn evaluate(&self, predicted: &[Triplet], gold: &[Triplet]) -> TripletMetrics {
        let mut matched_gold = vec![false; gold.len()];
        let mut true_positives = 0;

        for pred in predicted {
            let hit = gold
                .iter()
                .enumerate()
                .find(|(idx, g)| !matched_gold[*idx] && self.triplets_match(pred, g));
            if let Some((idx, _)) = hit {
                matched_gold[idx] = true;
                true_positives += 1;
            }
        }

        TripletMetrics {
            true_positives,
            false_positives: predicted.len() - true_positives,
            false_negatives: gold.len() - true_positives,
            gold_total: gold.len(),
            predicted_total: predicted.len(),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
