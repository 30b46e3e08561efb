use serde::{Deserialize, Serialize};

use crate::{PlayerSide, Position, agent::RoundConfig};

/// Settings for one match, usually read from a JSON file.
///
/// Missing fields fall back to [`MatchConfig::default`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    /// Side length of generated boards. Loaded maps bring their own size.
    pub board_size: usize,
    pub max_inventory_size: usize,
    pub winning_score: u32,
    /// The round ends as soon as this many turns have been played.
    pub max_turns: usize,
    /// Seeds board generation and each player's random source.
    pub seed: u64,
    /// Chance that a generated tile is a resource.
    pub resource_density: f64,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            board_size: 16,
            max_inventory_size: 5,
            winning_score: 2000,
            max_turns: 1000,
            seed: 0,
            resource_density: 0.15,
        }
    }
}

impl MatchConfig {
    /// Builds the round settings handed to the strategy playing `side`.
    pub fn round_config(
        &self,
        board_size: usize,
        side: PlayerSide,
        start: Position,
    ) -> RoundConfig {
        RoundConfig {
            board_size,
            max_inventory_size: self.max_inventory_size,
            winning_score: self.winning_score,
            start_location: start,
            side,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_use_defaults() {
        let config: MatchConfig =
            serde_json::from_str(r#"{ "seed": 42, "board_size": 10 }"#).unwrap();
        assert_eq!(config.seed, 42);
        assert_eq!(config.board_size, 10);
        assert_eq!(config.max_inventory_size, MatchConfig::default().max_inventory_size);
        assert_eq!(config.max_turns, 1000);
    }

    #[test]
    fn round_config_carries_match_settings() {
        let config = MatchConfig::default();
        let round = config.round_config(12, PlayerSide::Blue, Position::new(11, 11));
        assert_eq!(round.board_size, 12);
        assert_eq!(round.max_inventory_size, 5);
        assert_eq!(round.winning_score, 2000);
        assert_eq!(round.side, PlayerSide::Blue);
        assert_eq!(round.start_location, Position::new(11, 11));
    }
}
