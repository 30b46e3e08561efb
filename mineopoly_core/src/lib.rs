use serde::{Deserialize, Serialize};

pub mod agent;
pub mod config;
pub mod economy;
pub mod environment;
pub mod map;
pub mod market;
pub mod navigation;

pub use agent::{GreedyMiner, MinerStrategy, RandomMiner, RandomSource, RoundConfig};
pub use config::MatchConfig;
pub use economy::Economy;
pub use environment::{MatchEngine, MatchError, PlayerBoardView, TileType, TurnAction};
pub use market::MarketPair;

/// Represents a 2D board coordinate. (0, 0) is the bottom left corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub x: usize,
    pub y: usize,
}

impl Position {
    pub const fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }

    /// Returns the manhattan distance between two positions.
    pub fn manhattan_distance(&self, other: &Position) -> usize {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }
}

/// The two competing players. Red is the primary side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlayerSide {
    Red,
    Blue,
}

impl PlayerSide {
    pub fn opponent(self) -> Self {
        match self {
            PlayerSide::Red => PlayerSide::Blue,
            PlayerSide::Blue => PlayerSide::Red,
        }
    }
}

/// Items dropped on the ground by mining a resource tile, carried until sold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemType {
    Ruby,
    Emerald,
    Diamond,
}

impl ItemType {
    pub const ALL: [ItemType; 3] = [ItemType::Ruby, ItemType::Emerald, ItemType::Diamond];
}
