//! Legality of appearance counts as a three-dart visit.

use std::sync::LazyLock;

/// Highest score a single visit can produce.
pub const MAX_VISIT_SCORE: u32 = 180;

/// Highest segment value on the simplified board (no bullseye).
const MAX_SEGMENT: u32 = 20;

static SHARED: LazyLock<DartScoreValidator> = LazyLock::new(DartScoreValidator::new);

/// Precomputed set of every total reachable with three darts.
///
/// Each dart scores a single, double or treble of `0..=20`; a miss counts as zero.
#[derive(Debug, Clone)]
pub struct DartScoreValidator {
    reachable: [bool; MAX_VISIT_SCORE as usize + 1],
}

impl Default for DartScoreValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl DartScoreValidator {
    pub fn new() -> Self {
        let mut dart_values = (0..=MAX_SEGMENT)
            .flat_map(|segment| [segment, segment * 2, segment * 3])
            .collect::<Vec<_>>();
        dart_values.sort_unstable();
        dart_values.dedup();

        let mut reachable = [false; MAX_VISIT_SCORE as usize + 1];
        for a in &dart_values {
            for b in &dart_values {
                for c in &dart_values {
                    let total = a + b + c;
                    if total <= MAX_VISIT_SCORE {
                        reachable[total as usize] = true;
                    }
                }
            }
        }

        Self { reachable }
    }

    /// Process-wide instance, built on first use.
    pub fn shared() -> &'static Self {
        &SHARED
    }

    /// Whether `score` is a legal three-dart total. Anything above 180 never is.
    pub fn is_valid_three_dart_score(&self, score: u32) -> bool {
        self.reachable
            .get(score as usize)
            .copied()
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maximum_and_small_totals_are_reachable() {
        let validator = DartScoreValidator::new();
        for score in [0, 1, 2, 38, 60, 100, 140, 171, 174, 177, 180] {
            assert!(validator.is_valid_three_dart_score(score), "{score}");
        }
    }

    #[test]
    fn known_gaps_below_180_are_rejected() {
        let validator = DartScoreValidator::new();
        let gaps = [161, 163, 164, 166, 167, 169, 170, 172, 173, 175, 176, 178, 179];
        for score in gaps {
            assert!(!validator.is_valid_three_dart_score(score), "{score}");
        }

        let reachable = (0..=MAX_VISIT_SCORE)
            .filter(|&score| validator.is_valid_three_dart_score(score))
            .count();
        assert_eq!(reachable, 181 - gaps.len());
    }

    #[test]
    fn totals_above_maximum_are_never_valid() {
        let validator = DartScoreValidator::shared();
        assert!(!validator.is_valid_three_dart_score(181));
        assert!(!validator.is_valid_three_dart_score(501));
        assert!(!validator.is_valid_three_dart_score(u32::MAX));
    }
}
