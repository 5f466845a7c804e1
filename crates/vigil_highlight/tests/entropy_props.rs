//! Property tests for the corrected-entropy invariants.
//!
//! The highlighter promises never to produce a negative entropy for
//! in-contract input, to ignore alternative ordering, and to select exactly
//! the positions whose score exceeds the threshold.

use proptest::prelude::*;
use vigil_highlight::{corrected_entropy, Highlighter};
use vigil_protocol::TokenAlternative;

fn arb_alternative() -> impl Strategy<Value = TokenAlternative> {
    (0.0f64..=1.0, proptest::option::of(0.0f64..=1.0)).prop_map(|(probability, importance)| {
        TokenAlternative {
            importance,
            ..TokenAlternative::new("tok", probability)
        }
    })
}

proptest! {
    #[test]
    fn entropy_is_zero_below_two_alternatives(alternatives in prop::collection::vec(arb_alternative(), 0..2)) {
        prop_assert_eq!(corrected_entropy(&alternatives), 0.0);
    }

    #[test]
    fn entropy_is_never_negative(alternatives in prop::collection::vec(arb_alternative(), 0..12)) {
        let entropy = corrected_entropy(&alternatives);
        prop_assert!(entropy >= 0.0, "negative entropy {} for {:?}", entropy, alternatives);
        prop_assert!(entropy.is_finite());
    }

    #[test]
    fn entropy_ignores_alternative_order(
        alternatives in prop::collection::vec(arb_alternative(), 2..10),
        seed in any::<u64>(),
    ) {
        let forward = corrected_entropy(&alternatives);

        // Cheap deterministic shuffle: rotate by the seed.
        let mut rotated = alternatives.clone();
        rotated.rotate_left((seed as usize) % alternatives.len());
        let shuffled = corrected_entropy(&rotated);

        prop_assert!((forward - shuffled).abs() < 1e-9);
    }

    #[test]
    fn highlights_match_a_direct_refilter(
        scores in prop::collection::vec(0.0f64..4.0, 0..32),
        threshold in 0.0f64..2.0,
    ) {
        let highlighter = Highlighter::with_threshold(threshold);
        let selected = highlighter.select_highlights(&scores);

        // Strictly increasing indices.
        prop_assert!(selected.windows(2).all(|w| w[0] < w[1]));

        // Exactly the qualifying indices - no false positives or negatives.
        for (i, &score) in scores.iter().enumerate() {
            prop_assert_eq!(selected.contains(&i), score > threshold);
        }
    }
}
