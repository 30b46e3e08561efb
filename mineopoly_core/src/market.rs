use serde::{Deserialize, Serialize};

use crate::{PlayerSide, Position};

/// The two market tiles a player may sell at.
///
/// Both tiles touch the centre of the board. Red and Blue are given opposite
/// diagonals of the central 2x2 block so their markets never overlap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketPair {
    pub market0: Position,
    pub market1: Position,
}

impl MarketPair {
    /// Derives the market tiles for `side` on a `board_size` square board.
    ///
    /// Boards smaller than 2 have no central block; coordinates saturate at 0
    /// instead of underflowing.
    pub fn for_side(board_size: usize, side: PlayerSide) -> Self {
        let half = board_size / 2;
        let below = half.saturating_sub(1);
        match side {
            PlayerSide::Red => MarketPair {
                market0: Position::new(half, half),
                market1: Position::new(below, below),
            },
            PlayerSide::Blue => MarketPair {
                market0: Position::new(below, half),
                market1: Position::new(half, below),
            },
        }
    }

    pub fn tiles(&self) -> [Position; 2] {
        [self.market0, self.market1]
    }

    pub fn contains(&self, position: Position) -> bool {
        self.market0 == position || self.market1 == position
    }

    /// Returns the market closest to `from`. Equal distances go to `market0`.
    pub fn nearer_to(&self, from: Position) -> Position {
        if from.manhattan_distance(&self.market1) < from.manhattan_distance(&self.market0) {
            self.market1
        } else {
            self.market0
        }
    }
}
