//! Scoring engine
//!
//! Pure score computation for a single player and round: a flat base for a
//! correct answer, a speed bonus proportional to the time left on the
//! round clock, and a streak bonus for consecutive correct answers.
//!
//! The `time_remaining` input is the value the player's client reported
//! alongside its submission. It is trusted (the protocol has no
//! authoritative host-side elapsed time), but clamped to the question's
//! time limit so it can never exceed the maximum bonus.

use crate::constants::scoring::{BASE_POINTS, MAX_TIME_BONUS, STREAK_BONUS_STEP};

/// The outcome of scoring one player's round
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoundScore {
    /// Points earned this round; added to the player's total (never negative)
    pub delta: u64,
    /// The player's streak after this round
    pub streak: u32,
}

/// Scores a single player's round
///
/// An incorrect or absent answer earns nothing and resets the streak. A
/// correct answer earns `BASE_POINTS`, plus a time bonus scaled linearly by
/// the fraction of the round clock remaining (up to `MAX_TIME_BONUS`), plus
/// `STREAK_BONUS_STEP` per consecutive correct answer held *before* this
/// round; the streak then increments.
///
/// # Arguments
///
/// * `is_correct` - Verdict from the answer-correctness check
/// * `streak_before` - The player's streak entering this round
/// * `time_remaining` - Client-reported seconds left when the answer was sent
/// * `time_limit` - The question's full time limit in seconds
pub fn score_answer(
    is_correct: bool,
    streak_before: u32,
    time_remaining: u32,
    time_limit: u32,
) -> RoundScore {
    if !is_correct {
        return RoundScore {
            delta: 0,
            streak: 0,
        };
    }

    let time_bonus = if time_limit == 0 {
        0
    } else {
        let fraction = f64::from(time_remaining.min(time_limit)) / f64::from(time_limit);
        ((fraction * MAX_TIME_BONUS as f64).round() as u64).min(MAX_TIME_BONUS)
    };

    RoundScore {
        delta: BASE_POINTS + time_bonus + u64::from(streak_before) * STREAK_BONUS_STEP,
        streak: streak_before + 1,
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn test_incorrect_answer_scores_nothing_and_resets_streak() {
        let score = score_answer(false, 4, 15, 20);
        assert_eq!(score.delta, 0);
        assert_eq!(score.streak, 0);
    }

    #[test]
    fn test_worked_example_from_design() {
        // 20s limit, answered with 10s left, streak of 2 entering the round:
        // 500 base + 250 time bonus + 200 streak bonus = 950.
        let score = score_answer(true, 2, 10, 20);
        assert_eq!(score.delta, 950);
        assert_eq!(score.streak, 3);
    }

    #[test]
    fn test_instant_answer_earns_full_time_bonus() {
        let score = score_answer(true, 0, 20, 20);
        assert_eq!(score.delta, BASE_POINTS + MAX_TIME_BONUS);
        assert_eq!(score.streak, 1);
    }

    #[test]
    fn test_last_second_answer_earns_base_only() {
        let score = score_answer(true, 0, 0, 20);
        assert_eq!(score.delta, BASE_POINTS);
    }

    #[test]
    fn test_time_bonus_rounds_to_nearest() {
        // 7/30 of 500 = 116.67, rounds to 117
        let score = score_answer(true, 0, 7, 30);
        assert_eq!(score.delta, BASE_POINTS + 117);
    }

    #[test]
    fn test_overreported_time_is_clamped() {
        // A client reporting more time than the question allows cannot
        // exceed the maximum bonus.
        let score = score_answer(true, 0, 90, 20);
        assert_eq!(score.delta, BASE_POINTS + MAX_TIME_BONUS);
    }

    #[test]
    fn test_streak_bonus_grows_linearly() {
        for streak in 0..10_u32 {
            let score = score_answer(true, streak, 0, 20);
            assert_eq!(
                score.delta,
                BASE_POINTS + u64::from(streak) * STREAK_BONUS_STEP
            );
            assert_eq!(score.streak, streak + 1);
        }
    }

    #[test]
    fn test_zero_time_limit_earns_no_bonus() {
        let score = score_answer(true, 0, 10, 0);
        assert_eq!(score.delta, BASE_POINTS);
    }
}
