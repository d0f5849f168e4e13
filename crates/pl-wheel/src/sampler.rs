use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{WheelError, WheelResult};

/// How the wheel is weighted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpinMode {
    /// Everyone gets an equal slice.
    Fair,
    /// Slices are proportional to each participant's weight.
    #[default]
    Weighted,
}

impl fmt::Display for SpinMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fair => write!(f, "fair"),
            Self::Weighted => write!(f, "weighted"),
        }
    }
}

/// Pick one participant with probability proportional to its weight.
///
/// Draws `r` uniformly from `[0, total)` and returns the first participant
/// whose running total exceeds `r`. In fair mode every weight counts as 1.
/// Zero-weight participants are never picked.
pub fn draw_weighted_winner<T: Copy, R: Rng + ?Sized>(
    participants: &[(T, f64)],
    mode: SpinMode,
    rng: &mut R,
) -> WheelResult<T> {
    let weight = |w: f64| match mode {
        SpinMode::Fair => 1.0,
        SpinMode::Weighted => w,
    };

    if let Some((_, w)) = participants
        .iter()
        .find(|(_, w)| !w.is_finite() || *w < 0.0)
    {
        return Err(WheelError::InvalidWeights(format!(
            "weights must be finite and non-negative, got {w}"
        )));
    }
    let total: f64 = participants.iter().map(|(_, w)| weight(*w)).sum();
    if total <= 0.0 || !total.is_finite() {
        return Err(WheelError::InvalidWeights(
            "weights must sum to a positive number".to_string(),
        ));
    }

    let r = rng.random_range(0.0..total);
    let mut running = 0.0;
    let mut last_positive = None;
    for (id, w) in participants {
        let w = weight(*w);
        if w <= 0.0 {
            continue;
        }
        running += w;
        last_positive = Some(*id);
        if running > r {
            return Ok(*id);
        }
    }
    // Rounding can leave the running total a hair short of `total`.
    last_positive.ok_or_else(|| WheelError::InvalidWeights("no positive weight".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn weights_one_and_three() {
        let mut rng = StdRng::seed_from_u64(2024);
        let participants = [("a", 1.0), ("b", 3.0)];
        let mut b_wins = 0u32;
        for _ in 0..10_000 {
            if draw_weighted_winner(&participants, SpinMode::Weighted, &mut rng).unwrap() == "b" {
                b_wins += 1;
            }
        }
        let ratio = f64::from(b_wins) / f64::from(10_000 - b_wins);
        assert!((2.6..3.4).contains(&ratio), "ratio was {ratio}");
    }

    #[test]
    fn fair_mode_ignores_weights() {
        let mut rng = StdRng::seed_from_u64(9);
        let participants = [("a", 1.0), ("b", 99.0)];
        let mut a_wins = 0u32;
        for _ in 0..10_000 {
            if draw_weighted_winner(&participants, SpinMode::Fair, &mut rng).unwrap() == "a" {
                a_wins += 1;
            }
        }
        assert!((4_500..5_500).contains(&a_wins), "a won {a_wins} times");
    }

    #[test]
    fn zero_weight_never_wins() {
        let mut rng = StdRng::seed_from_u64(1);
        let participants = [("zero", 0.0), ("one", 1.0), ("also_zero", 0.0)];
        for _ in 0..1_000 {
            assert_eq!(
                draw_weighted_winner(&participants, SpinMode::Weighted, &mut rng).unwrap(),
                "one"
            );
        }
    }

    #[test]
    fn fair_mode_includes_zero_weights() {
        let mut rng = StdRng::seed_from_u64(3);
        let participants = [("zero", 0.0), ("one", 1.0)];
        let picked_zero = (0..200).any(|_| {
            draw_weighted_winner(&participants, SpinMode::Fair, &mut rng).unwrap() == "zero"
        });
        assert!(picked_zero);
    }

    #[test]
    fn invalid_weights() {
        let mut rng = StdRng::seed_from_u64(1);
        let empty: [(u8, f64); 0] = [];
        assert!(matches!(
            draw_weighted_winner(&empty, SpinMode::Fair, &mut rng),
            Err(WheelError::InvalidWeights(_))
        ));
        assert!(matches!(
            draw_weighted_winner(&[(1, 0.0), (2, 0.0)], SpinMode::Weighted, &mut rng),
            Err(WheelError::InvalidWeights(_))
        ));
        assert!(matches!(
            draw_weighted_winner(&[(1, -1.0), (2, 3.0)], SpinMode::Weighted, &mut rng),
            Err(WheelError::InvalidWeights(_))
        ));
        assert!(matches!(
            draw_weighted_winner(&[(1, f64::NAN)], SpinMode::Fair, &mut rng),
            Err(WheelError::InvalidWeights(_))
        ));
    }

    proptest! {
        #[test]
        fn winner_always_has_positive_weight(
            weights in prop::collection::vec(0.0f64..10.0, 1..12),
            seed in any::<u64>(),
        ) {
            prop_assume!(weights.iter().sum::<f64>() > 0.0);
            let participants: Vec<(usize, f64)> = weights.iter().copied().enumerate().collect();
            let mut rng = StdRng::seed_from_u64(seed);
            let winner = draw_weighted_winner(&participants, SpinMode::Weighted, &mut rng).unwrap();
            prop_assert!(weights[winner] > 0.0);
        }
    }
}
