//! Decision highlighter for LLM code completions.
//!
//! Given the ranked token alternatives a completion provider reports per
//! generation position, computes an importance-corrected entropy score per
//! position and selects the positions uncertain enough to surface to a
//! human reviewer.
//!
//! Everything here is a pure function of its inputs: no state, no I/O, no
//! panics on in-contract input (probabilities and importances in [0, 1]).
//! Degenerate inputs (no alternatives, zero probability mass) yield 0.0
//! rather than an error - a single deterministic token carries no decision
//! worth reviewing.

use serde::{Deserialize, Serialize};
use vigil_protocol::{PositionAlternatives, TokenAlternative};

/// Default entropy threshold above which a position is highlighted.
pub const DEFAULT_HIGHLIGHT_THRESHOLD: f64 = 0.3;

/// Entropy scores plus the positions selected for review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HighlightReport {
    pub entropy_scores: Vec<f64>,
    pub highlighted_positions: Vec<usize>,
}

/// Scores completion positions and picks the ones to show the user.
#[derive(Debug, Clone, Copy)]
pub struct Highlighter {
    threshold: f64,
}

impl Default for Highlighter {
    fn default() -> Self {
        Self::new()
    }
}

impl Highlighter {
    pub fn new() -> Self {
        Self {
            threshold: DEFAULT_HIGHLIGHT_THRESHOLD,
        }
    }

    /// Callers tune sensitivity through the threshold; it is configuration,
    /// not business logic.
    pub fn with_threshold(threshold: f64) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Importance-corrected Shannon entropy over one position's alternatives.
    ///
    /// Each alternative's weight is `probability * importance` (importance
    /// defaults to 0.5 when the semantic-analysis provider has not scored
    /// it). Weights are renormalized to a distribution and the entropy is
    /// `-sum(p * log2(p))` over the nonzero terms.
    ///
    /// Returns 0.0 for fewer than two alternatives and for zero total
    /// weight. Result is >= 0 and is 0 exactly when the renormalized
    /// distribution is a point mass. Order of alternatives does not matter.
    pub fn corrected_entropy(&self, alternatives: &[TokenAlternative]) -> f64 {
        corrected_entropy(alternatives)
    }

    /// Corrected entropy for every position, in input order.
    pub fn score_positions(&self, positions: &[PositionAlternatives]) -> Vec<f64> {
        positions
            .iter()
            .map(|position| corrected_entropy(&position.alternatives))
            .collect()
    }

    /// Indices (0-based, strictly increasing) of every score strictly above
    /// the threshold. Pure filter, no side effects.
    pub fn select_highlights(&self, entropy_scores: &[f64]) -> Vec<usize> {
        entropy_scores
            .iter()
            .enumerate()
            .filter(|(_, &score)| score > self.threshold)
            .map(|(i, _)| i)
            .collect()
    }

    /// Score all positions and select highlights in one pass.
    pub fn highlight(&self, positions: &[PositionAlternatives]) -> HighlightReport {
        let entropy_scores = self.score_positions(positions);
        let highlighted_positions = self.select_highlights(&entropy_scores);
        tracing::debug!(
            positions = positions.len(),
            highlighted = highlighted_positions.len(),
            "scored completion positions"
        );
        HighlightReport {
            entropy_scores,
            highlighted_positions,
        }
    }
}

/// Free-function form of [`Highlighter::corrected_entropy`].
pub fn corrected_entropy(alternatives: &[TokenAlternative]) -> f64 {
    if alternatives.len() < 2 {
        return 0.0;
    }

    let weights: Vec<f64> = alternatives
        .iter()
        .map(|alt| alt.probability * alt.importance_or_default())
        .collect();

    let total: f64 = weights.iter().sum();
    if total <= 0.0 {
        return 0.0;
    }

    weights
        .iter()
        .map(|weight| weight / total)
        .filter(|&p| p > 0.0)
        .map(|p| -p * p.log2())
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alt(probability: f64) -> TokenAlternative {
        TokenAlternative::new("tok", probability)
    }

    fn alt_with_importance(probability: f64, importance: f64) -> TokenAlternative {
        TokenAlternative {
            importance: Some(importance),
            ..TokenAlternative::new("tok", probability)
        }
    }

    #[test]
    fn test_fewer_than_two_alternatives_is_zero() {
        assert_eq!(corrected_entropy(&[]), 0.0);
        assert_eq!(corrected_entropy(&[alt(1.0)]), 0.0);
        assert_eq!(corrected_entropy(&[alt(0.0)]), 0.0);
    }

    #[test]
    fn test_uniform_two_way_split_is_one_bit() {
        let entropy = corrected_entropy(&[alt(0.5), alt(0.5)]);
        assert!((entropy - 1.0).abs() < 1e-12, "got {}", entropy);
    }

    #[test]
    fn test_point_mass_is_zero() {
        let entropy = corrected_entropy(&[alt(1.0), alt(0.0), alt(0.0)]);
        assert_eq!(entropy, 0.0);
    }

    #[test]
    fn test_zero_total_weight_is_zero() {
        // All probabilities zero: no mass to normalize, no divide-by-zero.
        assert_eq!(corrected_entropy(&[alt(0.0), alt(0.0)]), 0.0);
        // Nonzero probabilities but zero importance everywhere.
        let alternatives = [alt_with_importance(0.6, 0.0), alt_with_importance(0.4, 0.0)];
        assert_eq!(corrected_entropy(&alternatives), 0.0);
    }

    #[test]
    fn test_importance_reshapes_distribution() {
        // Raw probabilities are skewed; importance flips the skew so the
        // corrected distribution is uniform and entropy hits 1 bit.
        let alternatives = [alt_with_importance(0.8, 0.2), alt_with_importance(0.2, 0.8)];
        let entropy = corrected_entropy(&alternatives);
        assert!((entropy - 1.0).abs() < 1e-12, "got {}", entropy);

        // Importance that amplifies the skew lowers entropy below the
        // uncorrected value.
        let uncorrected = corrected_entropy(&[alt(0.8), alt(0.2)]);
        let amplified = [alt_with_importance(0.8, 0.9), alt_with_importance(0.2, 0.1)];
        assert!(corrected_entropy(&amplified) < uncorrected);
    }

    #[test]
    fn test_order_independent() {
        let forward = [
            alt_with_importance(0.7, 0.9),
            alt_with_importance(0.2, 0.4),
            alt_with_importance(0.1, 0.6),
        ];
        let mut reversed = forward.clone();
        reversed.reverse();
        assert!(
            (corrected_entropy(&forward) - corrected_entropy(&reversed)).abs() < 1e-12
        );
    }

    #[test]
    fn test_select_highlights_strictly_above_threshold() {
        let highlighter = Highlighter::with_threshold(0.3);
        let scores = [0.0, 0.31, 0.3, 1.5, 0.299];
        assert_eq!(highlighter.select_highlights(&scores), vec![1, 3]);
    }

    #[test]
    fn test_highlight_report_shape() {
        let highlighter = Highlighter::new();
        let positions = vec![
            PositionAlternatives::new(vec![alt(1.0)]),
            PositionAlternatives::new(vec![alt(0.5), alt(0.5)]),
        ];
        let report = highlighter.highlight(&positions);
        assert_eq!(report.entropy_scores.len(), 2);
        assert_eq!(report.entropy_scores[0], 0.0);
        assert_eq!(report.highlighted_positions, vec![1]);
    }
}
