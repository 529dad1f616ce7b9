//! Round scheduler: target selection, card sequence generation and the
//! per-round card state machine.
//!
//! ```text
//! Idle ──show──▶ CardShown ──dwell──▶ CardHidden ──gap──▶ CardShown ...
//!                    │                    │
//!                    │ grab               └── no cards left ──▶ Exhausted
//!                    ▼
//!                Cooldown ──correct──▶ Won
//!                    └────incorrect──▶ CardHidden (next card)
//! ```
//!
//! This module only moves between states. Delays are owned by the session,
//! which schedules them on its [`crate::timeline::Timeline`].

use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;

use crate::catalog::Compound;
use crate::constants::MAX_DISTRACTOR_ATTEMPTS;
use crate::error::SessionError;
use crate::pool::FormulaPool;
use crate::scoring::{apply_grab, GrabOutcome, Player};

/// Compound for a 1-based round number, from the session's pre-shuffled picks.
pub fn select_round_compound(
    selected: &[Compound],
    round: usize,
) -> Result<&Compound, SessionError> {
    round
        .checked_sub(1)
        .and_then(|index| selected.get(index))
        .ok_or(SessionError::RoundOutOfRange {
            round,
            available: selected.len(),
        })
}

/// Build a shuffled sequence of `len` formulas with `correct` in it.
///
/// Distinct distractors are drawn uniformly from the pool minus `correct`,
/// with at most [`MAX_DISTRACTOR_ATTEMPTS`] draws. If that does not fill the
/// sequence, distractors may repeat. Only when the pool offers no distractor
/// at all is the sequence padded with further copies of `correct`.
pub fn generate_card_sequence<R: Rng + ?Sized>(
    correct: &str,
    pool: &FormulaPool,
    len: usize,
    rng: &mut R,
) -> Vec<String> {
    let mut sequence: Vec<String> = Vec::with_capacity(len);
    if len == 0 {
        return sequence;
    }
    sequence.push(correct.to_string());
    let distractors = pool.distractors_for(correct);

    let mut attempts = 0;
    while sequence.len() < len && attempts < MAX_DISTRACTOR_ATTEMPTS && !distractors.is_empty() {
        let pick = distractors[rng.random_range(0..distractors.len())];
        if !sequence.iter().any(|f| f == pick) {
            sequence.push(pick.to_string());
        }
        attempts += 1;
    }

    while sequence.len() < len && !distractors.is_empty() {
        let pick = distractors[rng.random_range(0..distractors.len())];
        sequence.push(pick.to_string());
    }

    if sequence.len() < len {
        log::warn!(
            "[ROUND] formula pool has no distractors for {correct}, padding with the answer"
        );
    }
    while sequence.len() < len {
        sequence.push(correct.to_string());
    }

    sequence.shuffle(rng);
    sequence
}

/// One round's target and its cards.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RoundPlan {
    pub target: Compound,
    pub cards: Vec<String>,
    /// Index of the current (or next) card.
    pub cursor: usize,
}

impl RoundPlan {
    pub fn new<R: Rng + ?Sized>(
        target: Compound,
        pool: &FormulaPool,
        len: usize,
        rng: &mut R,
    ) -> Self {
        let cards = generate_card_sequence(&target.formula, pool, len, rng);
        Self {
            target,
            cards,
            cursor: 0,
        }
    }

    pub fn current_card(&self) -> Option<&str> {
        self.cards.get(self.cursor).map(String::as_str)
    }

    pub fn is_exhausted(&self) -> bool {
        self.cursor >= self.cards.len()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CardPhase {
    /// Round created, no card shown yet.
    Idle,
    /// Between cards.
    CardHidden,
    /// A card is live and can be grabbed.
    CardShown,
    /// A grab is being settled; further grabs are ignored.
    Cooldown(GrabOutcome),
    /// Someone grabbed the right card.
    Won,
    /// All cards went by without a correct grab.
    Exhausted,
}

/// Result of trying to put the next card up.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ShowResult {
    Shown(String),
    Exhausted,
}

#[derive(Clone, Debug)]
pub struct Round {
    pub plan: RoundPlan,
    phase: CardPhase,
}

impl Round {
    pub fn new(plan: RoundPlan) -> Self {
        Self {
            plan,
            phase: CardPhase::Idle,
        }
    }

    pub fn phase(&self) -> CardPhase {
        self.phase
    }

    pub fn target(&self) -> &Compound {
        &self.plan.target
    }

    /// The card players can currently grab.
    pub fn live_card(&self) -> Option<&str> {
        match self.phase {
            CardPhase::CardShown => self.plan.current_card(),
            _ => None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self.phase, CardPhase::Won | CardPhase::Exhausted)
    }

    /// Put up the card at the cursor, or end the round if none is left.
    pub fn show_next(&mut self) -> ShowResult {
        match self.plan.current_card() {
            Some(formula) => {
                let formula = formula.to_string();
                self.phase = CardPhase::CardShown;
                ShowResult::Shown(formula)
            }
            None => {
                self.phase = CardPhase::Exhausted;
                ShowResult::Exhausted
            }
        }
    }

    /// Dwell time ran out: discard the live card. Returns `true` if another
    /// card follows. No-op unless a card is shown.
    pub fn hide(&mut self) -> bool {
        if self.phase == CardPhase::CardShown {
            self.plan.cursor += 1;
            self.phase = CardPhase::CardHidden;
        }
        !self.plan.is_exhausted()
    }

    /// Score `player`'s grab on the live card and start the cooldown.
    /// Returns `None`, leaving the score untouched, if no card is live
    /// (hidden, or another grab already claimed it).
    pub fn grab(&mut self, player: &mut Player) -> Option<(String, GrabOutcome)> {
        let card = self.live_card()?.to_string();
        let outcome = apply_grab(player, &card, &self.plan.target.formula);
        self.phase = CardPhase::Cooldown(outcome);
        Some((card, outcome))
    }

    /// End the grab cooldown. A correct grab wins the round; an incorrect
    /// one discards the card and the round continues with the next card.
    pub fn settle(&mut self) {
        match self.phase {
            CardPhase::Cooldown(GrabOutcome::Correct) => self.phase = CardPhase::Won,
            CardPhase::Cooldown(GrabOutcome::Incorrect) => {
                self.plan.cursor += 1;
                self.phase = CardPhase::CardHidden;
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn rng() -> SmallRng {
        SmallRng::seed_from_u64(42)
    }

    fn count(seq: &[String], formula: &str) -> usize {
        seq.iter().filter(|f| *f == formula).count()
    }

    #[test]
    fn test_select_round_compound() {
        let picks = vec![Compound::new("Wasser", "H₂O"), Compound::new("Ammoniak", "NH₃")];
        assert_eq!(select_round_compound(&picks, 2).unwrap().formula, "NH₃");
        assert_eq!(
            select_round_compound(&picks, 3),
            Err(SessionError::RoundOutOfRange { round: 3, available: 2 })
        );
        assert_eq!(
            select_round_compound(&picks, 0),
            Err(SessionError::RoundOutOfRange { round: 0, available: 2 })
        );
        assert_eq!(
            select_round_compound(&[], 1),
            Err(SessionError::RoundOutOfRange { round: 1, available: 0 })
        );
    }

    #[test]
    fn test_sequence_has_distinct_distractors() {
        let pool =
            FormulaPool::from_formulas(["NaCl", "KCl", "HCl", "CO₂", "SO₂", "NH₃", "H₂O"]);
        let mut rng = rng();
        for _ in 0..50 {
            let seq = generate_card_sequence("KCl", &pool, 5, &mut rng);
            assert_eq!(seq.len(), 5);
            assert_eq!(count(&seq, "KCl"), 1);
            let mut sorted = seq.clone();
            sorted.sort();
            sorted.dedup();
            assert_eq!(sorted.len(), 5);
        }
    }

    #[test]
    fn test_small_pool_repeats_distractors() {
        let pool = FormulaPool::from_formulas(["NaCl", "KCl", "HCl"]);
        let seq = generate_card_sequence("NaCl", &pool, 5, &mut rng());
        assert_eq!(seq.len(), 5);
        assert_eq!(count(&seq, "NaCl"), 1);
        assert_eq!(count(&seq, "KCl") + count(&seq, "HCl"), 4);
    }

    #[test]
    fn test_empty_pool_pads_with_answer() {
        let pool = FormulaPool::from_formulas(["NaCl"]);
        let seq = generate_card_sequence("NaCl", &pool, 5, &mut rng());
        assert_eq!(seq, vec!["NaCl".to_string(); 5]);
    }

    #[test]
    fn test_answer_position_varies() {
        let pool = FormulaPool::from_formulas(["A", "B", "C", "D", "E", "F", "G", "H"]);
        let mut rng = rng();
        let mut seen = [false; 5];
        for _ in 0..200 {
            let seq = generate_card_sequence("A", &pool, 5, &mut rng);
            let pos = seq.iter().position(|f| f == "A").unwrap();
            seen[pos] = true;
        }
        assert!(seen.iter().all(|&s| s));
    }

    fn round_with(cards: &[&str], target: &str) -> Round {
        Round::new(RoundPlan {
            target: Compound::new("Ziel", target),
            cards: cards.iter().map(|c| c.to_string()).collect(),
            cursor: 0,
        })
    }

    fn player() -> Player {
        Player::new(1, crate::scoring::PlayerSlot::Single)
    }

    #[test]
    fn test_cards_time_out_until_exhausted() {
        let mut round = round_with(&["KCl", "NaCl"], "NaCl");
        assert_eq!(round.phase(), CardPhase::Idle);
        assert_eq!(round.live_card(), None);

        assert_eq!(round.show_next(), ShowResult::Shown("KCl".into()));
        assert_eq!(round.live_card(), Some("KCl"));
        assert!(round.hide());
        assert_eq!(round.phase(), CardPhase::CardHidden);
        assert_eq!(round.live_card(), None);

        assert_eq!(round.show_next(), ShowResult::Shown("NaCl".into()));
        assert!(!round.hide());
        assert_eq!(round.show_next(), ShowResult::Exhausted);
        assert!(round.is_resolved());
    }

    #[test]
    fn test_only_first_grab_claims_card() {
        let mut round = round_with(&["NaCl", "KCl"], "NaCl");
        let (mut p1, mut p2) = (player(), player());
        round.show_next();
        let first = round.grab(&mut p1);
        assert_eq!(first, Some(("NaCl".to_string(), GrabOutcome::Correct)));
        assert_eq!(round.grab(&mut p2), None);
        assert_eq!((p1.score, p2.score), (1, 0));
        round.settle();
        assert_eq!(round.phase(), CardPhase::Won);
        assert_eq!(round.grab(&mut p2), None);
    }

    #[test]
    fn test_wrong_grab_moves_to_next_card() {
        let mut round = round_with(&["KCl", "NaCl"], "NaCl");
        let mut p = player();
        round.show_next();
        let (_, outcome) = round.grab(&mut p).unwrap();
        assert_eq!(outcome, GrabOutcome::Incorrect);
        assert_eq!(p.score, -1);
        // a stale dwell timeout during cooldown must not skip a second card
        round.hide();
        round.settle();
        assert_eq!(round.plan.cursor, 1);
        assert_eq!(round.show_next(), ShowResult::Shown("NaCl".into()));
    }
}
