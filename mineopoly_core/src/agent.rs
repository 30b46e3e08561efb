use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{
    ItemType, PlayerSide, Position,
    economy::Economy,
    environment::{PlayerBoardView, TurnAction},
    market::MarketPair,
    navigation::{nearest_mine, step_toward},
};

/// Per-round settings handed to a strategy when a round starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundConfig {
    /// Width and height of the square board.
    pub board_size: usize,
    /// Items a player can carry before it has to sell.
    pub max_inventory_size: usize,
    /// First score to reach this wins the round.
    pub winning_score: u32,
    pub start_location: Position,
    pub side: PlayerSide,
}

/// Source of randomness injected by the host at round start.
///
/// Seeding the underlying generator makes a strategy's choices reproducible.
pub trait RandomSource {
    /// Returns an index drawn uniformly from `0..bound`. `bound` must be non-zero.
    fn choose_index(&mut self, bound: usize) -> usize;
}

impl<R: rand::Rng> RandomSource for R {
    fn choose_index(&mut self, bound: usize) -> usize {
        self.random_range(0..bound)
    }
}

/// Callbacks a host invokes on a player's strategy over a round.
///
/// Object safe so hosts can hold `Box<dyn MinerStrategy>`.
pub trait MinerStrategy {
    /// Starts a round. Any state from a previous round is discarded.
    fn initialize(&mut self, config: RoundConfig, random: Box<dyn RandomSource>);

    /// Chooses this turn's action. `None` means do nothing this turn.
    ///
    /// `is_red_turn` tells which side wins contested moves this turn; the host
    /// applies it.
    fn turn_action(
        &mut self,
        view: &PlayerBoardView<'_>,
        economy: &Economy,
        is_red_turn: bool,
    ) -> Option<TurnAction>;

    /// Called after a pick up put `item` into this player's inventory.
    fn on_receive_item(&mut self, item: ItemType);

    /// Called after the whole inventory sold at a market for `total_sell_price`.
    fn on_sold_inventory(&mut self, total_sell_price: u32);

    /// Short display name for scoreboards.
    fn name(&self) -> &str;

    /// Called once the round is over with both players' final scores.
    fn end_round(&mut self, points_scored: u32, opponent_points_scored: u32);
}

struct GreedyRound {
    config: RoundConfig,
    markets: MarketPair,
    current_location: Position,
    carried_count: usize,
    random: Box<dyn RandomSource>,
}

/// Greedy mining strategy.
///
/// Each turn, in order: head for the nearer own market when the inventory is
/// full, pick up an item lying underfoot, mine the tile underfoot, otherwise
/// walk toward the nearest resource tile (or in a random direction when no
/// resource is in range). Only the carried item count survives between turns.
#[derive(Default)]
pub struct GreedyMiner {
    round: Option<GreedyRound>,
}

impl fmt::Debug for GreedyMiner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = f.debug_struct("GreedyMiner");
        if let Some(round) = &self.round {
            out.field("config", &round.config)
                .field("markets", &round.markets)
                .field("current_location", &round.current_location)
                .field("carried_count", &round.carried_count);
        }
        out.finish_non_exhaustive()
    }
}

impl GreedyMiner {
    pub const NAME: &'static str = "GreedyMiner";

    pub fn new() -> Self {
        Self::default()
    }

    /// Items carried since the last sale. Zero outside a round.
    pub fn carried_count(&self) -> usize {
        self.round.as_ref().map_or(0, |round| round.carried_count)
    }

    /// Markets assigned for the current round.
    pub fn markets(&self) -> Option<MarketPair> {
        self.round.as_ref().map(|round| round.markets)
    }

    /// Location reported by the most recent view.
    pub fn current_location(&self) -> Option<Position> {
        self.round.as_ref().map(|round| round.current_location)
    }
}

impl GreedyRound {
    fn go_to_market(&self) -> Option<TurnAction> {
        let market = self.markets.nearer_to(self.current_location);
        debug!(?market, carried = self.carried_count, "inventory full, heading to market");
        step_toward(self.current_location, market)
    }

    fn go_to_nearest_mine(&mut self, view: &PlayerBoardView<'_>) -> Option<TurnAction> {
        if let Some(mine) = nearest_mine(view, self.current_location, self.config.board_size) {
            debug!(?mine, from = ?self.current_location, "walking to nearest resource");
            return step_toward(self.current_location, mine);
        }
        let action = TurnAction::MOVES[self.random.choose_index(TurnAction::MOVES.len())];
        debug!(?action, "no resource in range, moving randomly");
        Some(action)
    }
}

impl MinerStrategy for GreedyMiner {
    fn initialize(&mut self, config: RoundConfig, random: Box<dyn RandomSource>) {
        let markets = MarketPair::for_side(config.board_size, config.side);
        debug!(?config, ?markets, "round initialized");
        self.round = Some(GreedyRound {
            config,
            markets,
            current_location: config.start_location,
            carried_count: 0,
            random,
        });
    }

    fn turn_action(
        &mut self,
        view: &PlayerBoardView<'_>,
        _economy: &Economy,
        _is_red_turn: bool,
    ) -> Option<TurnAction> {
        let Some(round) = self.round.as_mut() else {
            warn!("turn requested before the round was initialized");
            return None;
        };
        round.current_location = view.your_location();
        let here = round.current_location;

        if round.carried_count >= round.config.max_inventory_size {
            round.go_to_market()
        } else if view.has_items_at(here) {
            debug!(?here, "picking up item");
            Some(TurnAction::PickUp)
        } else if view.tile_at(here).is_some_and(|tile| tile.is_minable()) {
            debug!(?here, "mining");
            Some(TurnAction::Mine)
        } else {
            round.go_to_nearest_mine(view)
        }
    }

    fn on_receive_item(&mut self, item: ItemType) {
        if let Some(round) = self.round.as_mut() {
            round.carried_count += 1;
            debug!(?item, carried = round.carried_count, "item received");
        }
    }

    fn on_sold_inventory(&mut self, total_sell_price: u32) {
        if let Some(round) = self.round.as_mut() {
            debug!(total_sell_price, sold = round.carried_count, "inventory sold");
            round.carried_count = 0;
        }
    }

    fn name(&self) -> &str {
        Self::NAME
    }

    fn end_round(&mut self, points_scored: u32, opponent_points_scored: u32) {
        debug!(points_scored, opponent_points_scored, "round over");
        self.round = None;
    }
}

/// A baseline strategy that picks any of the six actions uniformly at random.
#[derive(Default)]
pub struct RandomMiner {
    random: Option<Box<dyn RandomSource>>,
}

impl fmt::Debug for RandomMiner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RandomMiner")
            .field("initialized", &self.random.is_some())
            .finish()
    }
}

impl RandomMiner {
    pub const NAME: &'static str = "RandomMiner";

    pub fn new() -> Self {
        Self::default()
    }
}

impl MinerStrategy for RandomMiner {
    fn initialize(&mut self, _config: RoundConfig, random: Box<dyn RandomSource>) {
        self.random = Some(random);
    }

    fn turn_action(
        &mut self,
        _view: &PlayerBoardView<'_>,
        _economy: &Economy,
        _is_red_turn: bool,
    ) -> Option<TurnAction> {
        let random = self.random.as_mut()?;
        Some(TurnAction::ALL[random.choose_index(TurnAction::ALL.len())])
    }

    fn on_receive_item(&mut self, _item: ItemType) {}

    fn on_sold_inventory(&mut self, _total_sell_price: u32) {}

    fn name(&self) -> &str {
        Self::NAME
    }

    fn end_round(&mut self, _points_scored: u32, _opponent_points_scored: u32) {
        self.random = None;
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use rand::{SeedableRng, rngs::StdRng};

    use super::*;
    use crate::{environment::TileType, map::Grid};

    fn config(board_size: usize, max_inventory_size: usize, side: PlayerSide) -> RoundConfig {
        RoundConfig {
            board_size,
            max_inventory_size,
            winning_score: 1000,
            start_location: Position::new(0, 0),
            side,
        }
    }

    fn initialized(board_size: usize, max_inventory_size: usize) -> GreedyMiner {
        let mut miner = GreedyMiner::new();
        miner.initialize(
            config(board_size, max_inventory_size, PlayerSide::Red),
            Box::new(StdRng::seed_from_u64(7)),
        );
        miner
    }

    fn decide(
        miner: &mut GreedyMiner,
        board: &Grid<TileType>,
        items: &HashMap<Position, Vec<ItemType>>,
        at: Position,
    ) -> Option<TurnAction> {
        let view = PlayerBoardView::new(board, items, at, Position::new(9, 9), 0, 0);
        miner.turn_action(&view, &Economy::default(), true)
    }

    #[test]
    fn full_inventory_beats_item_underfoot() {
        let mut miner = initialized(10, 1);
        miner.on_receive_item(ItemType::Ruby);

        let board = Grid::square(10);
        let mut items = HashMap::new();
        items.insert(Position::new(2, 2), vec![ItemType::Emerald]);

        // Markets are (5, 5) and (4, 4); (4, 4) is closer.
        assert_eq!(
            decide(&mut miner, &board, &items, Position::new(2, 2)),
            Some(TurnAction::MoveRight)
        );
    }

    #[test]
    fn item_underfoot_beats_mining() {
        let mut miner = initialized(10, 3);
        let mut board = Grid::square(10);
        board[Position::new(3, 3)] = TileType::ResourceDiamond;
        let mut items = HashMap::new();
        items.insert(Position::new(3, 3), vec![ItemType::Diamond]);

        assert_eq!(
            decide(&mut miner, &board, &items, Position::new(3, 3)),
            Some(TurnAction::PickUp)
        );
    }

    #[test]
    fn empty_item_list_is_not_an_item() {
        let mut miner = initialized(10, 3);
        let mut board = Grid::square(10);
        board[Position::new(3, 3)] = TileType::ResourceEmerald;
        let mut items = HashMap::new();
        items.insert(Position::new(3, 3), Vec::new());

        assert_eq!(
            decide(&mut miner, &board, &items, Position::new(3, 3)),
            Some(TurnAction::Mine)
        );
    }

    #[test]
    fn standing_on_own_market_does_not_mine() {
        let mut miner = initialized(10, 3);
        let mut board = Grid::square(10);
        board[Position::new(5, 5)] = TileType::RedMarket;
        board[Position::new(5, 7)] = TileType::ResourceRuby;

        assert_eq!(
            decide(&mut miner, &board, &HashMap::new(), Position::new(5, 5)),
            Some(TurnAction::MoveUp)
        );
    }

    #[test]
    fn tracks_location_from_view() {
        let mut miner = initialized(10, 3);
        let board = Grid::square(10);
        decide(&mut miner, &board, &HashMap::new(), Position::new(6, 1));
        assert_eq!(miner.current_location(), Some(Position::new(6, 1)));
    }

    #[test]
    fn sale_resets_count_and_round_end_clears_state() {
        let mut miner = initialized(10, 3);
        for _ in 0..3 {
            miner.on_receive_item(ItemType::Ruby);
        }
        assert_eq!(miner.carried_count(), 3);
        miner.on_sold_inventory(42);
        assert_eq!(miner.carried_count(), 0);

        miner.on_receive_item(ItemType::Ruby);
        miner.end_round(10, 20);
        assert_eq!(miner.carried_count(), 0);
        assert!(miner.markets().is_none());
        assert_eq!(miner.name(), "GreedyMiner");
    }

    #[test]
    fn reinitialize_starts_fresh() {
        let mut miner = initialized(10, 3);
        miner.on_receive_item(ItemType::Ruby);
        miner.initialize(
            config(8, 2, PlayerSide::Blue),
            Box::new(StdRng::seed_from_u64(1)),
        );
        assert_eq!(miner.carried_count(), 0);
        assert_eq!(miner.markets(), Some(MarketPair::for_side(8, PlayerSide::Blue)));
    }

    #[test]
    fn uninitialized_strategies_do_nothing() {
        let board = Grid::square(4);
        let items = HashMap::new();
        let (here, there) = (Position::new(0, 0), Position::new(3, 3));
        let view = PlayerBoardView::new(&board, &items, here, there, 0, 0);

        let mut greedy = GreedyMiner::new();
        assert_eq!(greedy.turn_action(&view, &Economy::default(), false), None);

        let mut random = RandomMiner::new();
        assert_eq!(random.turn_action(&view, &Economy::default(), false), None);
    }

    #[test]
    fn random_miner_covers_every_action() {
        let mut miner = RandomMiner::new();
        miner.initialize(config(4, 1, PlayerSide::Blue), Box::new(StdRng::seed_from_u64(3)));
        let board = Grid::square(4);
        let items = HashMap::new();
        let (here, there) = (Position::new(0, 0), Position::new(3, 3));
        let view = PlayerBoardView::new(&board, &items, here, there, 0, 0);

        let mut seen = Vec::new();
        for _ in 0..500 {
            if let Some(action) = miner.turn_action(&view, &Economy::default(), true) {
                if !seen.contains(&action) {
                    seen.push(action);
                }
            }
        }
        assert_eq!(seen.len(), TurnAction::ALL.len());
    }
}
