//! Players, grab scoring and end-of-game ranking.
//!
//! A grab on the live card scores +1 if the card shows the round's formula and
//! -1 otherwise; scores may go negative. Final ranking uses standard
//! competition ranking ("1224"): tied players share a rank and the next
//! distinct score resumes at its 1-based position, so scores `[10, 10, 7]`
//! rank `[1, 1, 3]`.

use serde::Serialize;

use crate::constants::{MAX_PLAYERS, PODIUM_SIZE};

/// Fixed screen position of a player's hand.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayerSlot {
    Single,
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl PlayerSlot {
    /// Corner order used for multiplayer seating.
    pub const CORNERS: [PlayerSlot; MAX_PLAYERS] = [
        PlayerSlot::TopLeft,
        PlayerSlot::TopRight,
        PlayerSlot::BottomLeft,
        PlayerSlot::BottomRight,
    ];

    /// Short code used by the presentation layer (`single`, `tl`, `tr`, `bl`, `br`).
    pub fn code(self) -> &'static str {
        match self {
            PlayerSlot::Single => "single",
            PlayerSlot::TopLeft => "tl",
            PlayerSlot::TopRight => "tr",
            PlayerSlot::BottomLeft => "bl",
            PlayerSlot::BottomRight => "br",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Player {
    /// `p1` .. `p4`.
    pub id: String,
    pub score: i32,
    pub slot: PlayerSlot,
}

impl Player {
    pub fn new(number: usize, slot: PlayerSlot) -> Self {
        Self {
            id: format!("p{number}"),
            score: 0,
            slot,
        }
    }

    /// Seat `count` players: one `Single` slot for solo play, corners otherwise.
    /// `count` must already be validated to `1..=MAX_PLAYERS`.
    pub fn seat(count: usize) -> Vec<Player> {
        if count == 1 {
            return vec![Player::new(1, PlayerSlot::Single)];
        }
        PlayerSlot::CORNERS
            .iter()
            .take(count)
            .enumerate()
            .map(|(i, &slot)| Player::new(i + 1, slot))
            .collect()
    }

    /// 1-based seat number parsed back from the id.
    pub fn number(&self) -> usize {
        self.id.trim_start_matches('p').parse().unwrap_or(0)
    }

    /// Score label as shown next to the hand.
    pub fn score_label(&self, single_player: bool) -> String {
        if single_player {
            format!("Punkte: {}", self.score)
        } else {
            format!("P{}: {}", self.number(), self.score)
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GrabOutcome {
    Correct,
    Incorrect,
}

impl GrabOutcome {
    pub fn score_delta(self) -> i32 {
        match self {
            GrabOutcome::Correct => 1,
            GrabOutcome::Incorrect => -1,
        }
    }

    /// Feedback glyph shown after a grab.
    pub fn symbol(self) -> &'static str {
        match self {
            GrabOutcome::Correct => "✅",
            GrabOutcome::Incorrect => "❌",
        }
    }
}

/// Score one grab and return its outcome. Exact string comparison.
pub fn apply_grab(player: &mut Player, card_formula: &str, target_formula: &str) -> GrabOutcome {
    let outcome = if card_formula == target_formula {
        GrabOutcome::Correct
    } else {
        GrabOutcome::Incorrect
    };
    player.score += outcome.score_delta();
    outcome
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RankedPlayer {
    pub player: Player,
    pub rank: usize,
}

/// Sort by score descending (stable, so ties keep seat order) and assign
/// standard competition ranks.
pub fn rank_players(players: &[Player]) -> Vec<RankedPlayer> {
    let mut sorted: Vec<&Player> = players.iter().collect();
    sorted.sort_by(|a, b| b.score.cmp(&a.score));

    let mut ranked = Vec::with_capacity(sorted.len());
    let mut rank = 0;
    let mut last_score: Option<i32> = None;
    for (index, player) in sorted.into_iter().enumerate() {
        if last_score != Some(player.score) {
            rank = index + 1;
        }
        last_score = Some(player.score);
        ranked.push(RankedPlayer {
            player: player.clone(),
            rank,
        });
    }
    ranked
}

/// Top-3 places. A place can hold several tied players or none at all.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Podium {
    pub first: Vec<RankedPlayer>,
    pub second: Vec<RankedPlayer>,
    pub third: Vec<RankedPlayer>,
}

impl Podium {
    pub fn from_players(players: &[Player]) -> Self {
        let mut podium = Podium::default();
        for entry in rank_players(players) {
            match entry.rank {
                1 => podium.first.push(entry),
                2 => podium.second.push(entry),
                3 => podium.third.push(entry),
                _ => {}
            }
        }
        podium
    }

    pub fn place(&self, rank: usize) -> &[RankedPlayer] {
        match rank {
            1 => &self.first,
            2 => &self.second,
            3 => &self.third,
            _ => &[],
        }
    }

    /// Places left to right as drawn on screen: second, first, third.
    /// Empty places are still yielded so the podium keeps its shape.
    pub fn display_order(&self) -> [(usize, &[RankedPlayer]); PODIUM_SIZE] {
        [(2, self.place(2)), (1, self.place(1)), (3, self.place(3))]
    }

    pub fn winners(&self) -> impl Iterator<Item = &Player> {
        self.first.iter().map(|entry| &entry.player)
    }
}

/// What the end screen shows.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FinalResult {
    SinglePlayer { score: i32 },
    Podium(Podium),
}

impl FinalResult {
    pub fn from_players(players: &[Player], single_player: bool) -> Self {
        match players {
            [only] if single_player => FinalResult::SinglePlayer { score: only.score },
            _ => FinalResult::Podium(Podium::from_players(players)),
        }
    }

    /// End screen heading.
    pub fn headline(&self) -> &'static str {
        match self {
            FinalResult::SinglePlayer { .. } => "Spiel beendet!",
            FinalResult::Podium(_) => "And the winner is…",
        }
    }
}
