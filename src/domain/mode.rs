/// Game modes: difficulty presets with a starting balance, a goal and a
/// per-mode debt threshold.
///
/// The four canonical modes are rolled once per process: their debt
/// thresholds are drawn from fixed ranges, so two runs of the game may
/// allow different amounts of debt on the same difficulty.

use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameMode {
    pub name: String,
    /// Not persisted. A mode restored from a save has no initial balance.
    #[serde(skip)]
    pub initial_balance: Option<i64>,
    pub debt_threshold: i64,
    pub goal_money_amount: i64,
}

impl GameMode {
    pub fn new(name: &str, initial_balance: Option<i64>, debt_threshold: i64, goal_money_amount: i64) -> Self {
        GameMode {
            name: name.to_string(),
            initial_balance,
            debt_threshold,
            goal_money_amount,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ModeKey {
    Easy,
    Moderate,
    Hard,
    Intense,
}

impl ModeKey {
    pub const ALL: [ModeKey; 4] = [ModeKey::Easy, ModeKey::Moderate, ModeKey::Hard, ModeKey::Intense];

    /// Parse a player's answer (full name or first letter, any case).
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim().to_lowercase().as_str() {
            "easy" | "e" => Some(ModeKey::Easy),
            "moderate" | "m" => Some(ModeKey::Moderate),
            "hard" | "h" => Some(ModeKey::Hard),
            "intense" | "i" => Some(ModeKey::Intense),
            _ => None,
        }
    }

    fn preset(self) -> (&'static str, i64, RangeInclusive<i64>, i64) {
        match self {
            ModeKey::Easy => ("Easy", 1000, -5000..=-4000, 4000),
            ModeKey::Moderate => ("Moderate", 1000, -4000..=-3000, 7500),
            ModeKey::Hard => ("Hard", 1000, -3000..=-2000, 12500),
            ModeKey::Intense => ("Intense", 1000, -2000..=-1000, 15000),
        }
    }

    fn index(self) -> usize {
        match self {
            ModeKey::Easy => 0,
            ModeKey::Moderate => 1,
            ModeKey::Hard => 2,
            ModeKey::Intense => 3,
        }
    }
}

/// The four canonical modes, in menu order.
#[derive(Clone, Debug)]
pub struct ModeTable {
    modes: [GameMode; 4],
}

impl ModeTable {
    /// Roll debt thresholds for every mode.
    pub fn roll(rng: &mut fastrand::Rng) -> Self {
        let modes = ModeKey::ALL.map(|key| {
            let (name, initial, range, goal) = key.preset();
            GameMode::new(name, Some(initial), rng.i64(range), goal)
        });
        ModeTable { modes }
    }

    /// Build the table with explicit thresholds (easy, moderate, hard, intense).
    #[allow(dead_code)]
    pub fn with_thresholds(thresholds: [i64; 4]) -> Self {
        let modes = ModeKey::ALL.map(|key| {
            let (name, initial, _, goal) = key.preset();
            GameMode::new(name, Some(initial), thresholds[key.index()], goal)
        });
        ModeTable { modes }
    }

    pub fn get(&self, key: ModeKey) -> &GameMode {
        &self.modes[key.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = &GameMode> {
        self.modes.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rolled_thresholds_stay_in_range() {
        let mut rng = fastrand::Rng::with_seed(7);
        for _ in 0..50 {
            let table = ModeTable::roll(&mut rng);
            for key in ModeKey::ALL {
                let (_, _, range, _) = key.preset();
                assert!(range.contains(&table.get(key).debt_threshold));
            }
        }
    }

    #[test]
    fn parse_accepts_names_and_initials() {
        assert_eq!(ModeKey::parse("EASY"), Some(ModeKey::Easy));
        assert_eq!(ModeKey::parse("m"), Some(ModeKey::Moderate));
        assert_eq!(ModeKey::parse(" Hard "), Some(ModeKey::Hard));
        assert_eq!(ModeKey::parse("i"), Some(ModeKey::Intense));
        assert_eq!(ModeKey::parse("help"), None);
        assert_eq!(ModeKey::parse(""), None);
    }

    #[test]
    fn serialized_mode_omits_initial_balance() {
        let mode = GameMode::new("Hard", Some(1000), -2500, 12500);
        let json = serde_json::to_value(&mode).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"name": "Hard", "debtThreshold": -2500, "goalMoneyAmount": 12500})
        );

        let back: GameMode = serde_json::from_value(json).unwrap();
        assert_eq!(back.initial_balance, None);
        assert_eq!(back.debt_threshold, -2500);
    }
}
