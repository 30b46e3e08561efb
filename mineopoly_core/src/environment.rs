use std::collections::HashMap;

use rand::{Rng, SeedableRng, rngs::StdRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{
    ItemType, PlayerSide, Position,
    agent::MinerStrategy,
    config::MatchConfig,
    economy::Economy,
    map::{Grid, GridError},
    market::MarketPair,
};

/// Kind of a board tile.
///
/// Variants are ordered: every kind ranking above [`TileType::MINE_THRESHOLD`]
/// is a resource that can be mined.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum TileType {
    #[default]
    Empty,
    RedMarket,
    BlueMarket,
    ResourceRuby,
    ResourceEmerald,
    ResourceDiamond,
}

impl TileType {
    /// Highest ranked kind that cannot be mined.
    pub const MINE_THRESHOLD: TileType = TileType::BlueMarket;

    pub fn is_minable(self) -> bool {
        self > Self::MINE_THRESHOLD
    }

    /// Item dropped once this tile is fully mined.
    pub fn resource_item(self) -> Option<ItemType> {
        match self {
            TileType::ResourceRuby => Some(ItemType::Ruby),
            TileType::ResourceEmerald => Some(ItemType::Emerald),
            TileType::ResourceDiamond => Some(ItemType::Diamond),
            _ => None,
        }
    }

    /// Mine actions needed before the tile yields its item.
    pub fn turns_to_mine(self) -> usize {
        match self {
            TileType::ResourceRuby => 1,
            TileType::ResourceEmerald => 2,
            TileType::ResourceDiamond => 3,
            _ => 0,
        }
    }

    pub fn market_for(side: PlayerSide) -> Self {
        match side {
            PlayerSide::Red => TileType::RedMarket,
            PlayerSide::Blue => TileType::BlueMarket,
        }
    }
}

/// Actions a strategy may request on its turn.
///
/// Moving up increases `y`; moving right increases `x`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TurnAction {
    MoveUp,
    MoveDown,
    MoveLeft,
    MoveRight,
    Mine,
    PickUp,
}

impl TurnAction {
    pub const MOVES: [TurnAction; 4] = [
        TurnAction::MoveUp,
        TurnAction::MoveDown,
        TurnAction::MoveLeft,
        TurnAction::MoveRight,
    ];

    pub const ALL: [TurnAction; 6] = [
        TurnAction::MoveUp,
        TurnAction::MoveDown,
        TurnAction::MoveLeft,
        TurnAction::MoveRight,
        TurnAction::Mine,
        TurnAction::PickUp,
    ];

    /// `(dx, dy)` for movement actions.
    pub fn offset(self) -> Option<(isize, isize)> {
        match self {
            TurnAction::MoveUp => Some((0, 1)),
            TurnAction::MoveDown => Some((0, -1)),
            TurnAction::MoveLeft => Some((-1, 0)),
            TurnAction::MoveRight => Some((1, 0)),
            TurnAction::Mine | TurnAction::PickUp => None,
        }
    }
}

/// Read-only snapshot of the board handed to a strategy each turn.
#[derive(Debug, Clone, Copy)]
pub struct PlayerBoardView<'a> {
    tiles: &'a Grid<TileType>,
    items_on_ground: &'a HashMap<Position, Vec<ItemType>>,
    your_location: Position,
    other_location: Position,
    your_score: u32,
    other_score: u32,
}

impl<'a> PlayerBoardView<'a> {
    pub fn new(
        tiles: &'a Grid<TileType>,
        items_on_ground: &'a HashMap<Position, Vec<ItemType>>,
        your_location: Position,
        other_location: Position,
        your_score: u32,
        other_score: u32,
    ) -> Self {
        Self {
            tiles,
            items_on_ground,
            your_location,
            other_location,
            your_score,
            other_score,
        }
    }

    /// Tile kind at `position`, or `None` off the board.
    pub fn tile_at(&self, position: Position) -> Option<TileType> {
        self.tiles.get(position).copied()
    }

    /// Whether at least one item lies on the ground at `position`.
    pub fn has_items_at(&self, position: Position) -> bool {
        self.items_on_ground
            .get(&position)
            .is_some_and(|items| !items.is_empty())
    }

    pub fn items_on_ground(&self) -> &'a HashMap<Position, Vec<ItemType>> {
        self.items_on_ground
    }

    pub fn board_size(&self) -> usize {
        self.tiles.width()
    }

    pub fn your_location(&self) -> Position {
        self.your_location
    }

    pub fn other_location(&self) -> Position {
        self.other_location
    }

    pub fn your_score(&self) -> u32 {
        self.your_score
    }

    pub fn other_score(&self) -> u32 {
        self.other_score
    }
}

/// Errors raised while building boards or starting a match.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MatchError {
    #[error("Map string is empty")]
    EmptyMap,
    #[error("Inconsistent width at row {row}: expected {expected}, found {found}")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("Board must be square, got {width}x{height}")]
    NotSquare { width: usize, height: usize },
    #[error("Board size {0} is too small, need at least 2")]
    BoardTooSmall(usize),
    #[error("Unknown map code '{token}' at ({x}, {y})")]
    UnknownToken { token: String, x: usize, y: usize },
    #[error("No start tile found for {0:?}")]
    MissingStart(PlayerSide),
    #[error("More than one start tile found for {0:?}")]
    DuplicateStart(PlayerSide),
    #[error("Start position {position:?} for {side:?} is off the board")]
    StartOutOfBounds { side: PlayerSide, position: Position },
    #[error("Market tile at {position:?} does not match the {side:?} market layout")]
    MarketMismatch { side: PlayerSide, position: Position },
    #[error(transparent)]
    Grid(#[from] GridError),
}

/// A square board plus both players' start tiles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    pub tiles: Grid<TileType>,
    pub red_start: Position,
    pub blue_start: Position,
}

impl Board {
    pub fn size(&self) -> usize {
        self.tiles.width()
    }

    pub fn start_for(&self, side: PlayerSide) -> Position {
        match side {
            PlayerSide::Red => self.red_start,
            PlayerSide::Blue => self.blue_start,
        }
    }
}

/// Loads a board from whitespace separated two letter codes.
///
/// The first line is the top row of the board. Codes: `..` empty, `RM`/`BM`
/// red and blue markets, `RU`/`EM`/`DI` resources, `R1`/`B1` start tiles
/// (empty underneath).
pub fn load_board_from_string(map_string: &str) -> Result<Board, MatchError> {
    let lines: Vec<&str> = map_string
        .trim()
        .lines()
        .filter(|line| !line.trim().is_empty())
        .collect();
    if lines.is_empty() {
        return Err(MatchError::EmptyMap);
    }

    let height = lines.len();
    let mut rows: Vec<Vec<&str>> = Vec::with_capacity(height);
    for (row, line) in lines.iter().enumerate() {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        if let Some(first) = rows.first() {
            if tokens.len() != first.len() {
                return Err(MatchError::RaggedRow {
                    row,
                    expected: first.len(),
                    found: tokens.len(),
                });
            }
        }
        rows.push(tokens);
    }
    let width = rows[0].len();
    if width != height {
        return Err(MatchError::NotSquare { width, height });
    }

    let mut tiles = Grid::square(width);
    let mut red_start = None;
    let mut blue_start = None;

    for (row, tokens) in rows.iter().enumerate() {
        let y = height - 1 - row;
        for (x, token) in tokens.iter().enumerate() {
            let position = Position { x, y };
            let tile = match *token {
                ".." => TileType::Empty,
                "RM" => TileType::RedMarket,
                "BM" => TileType::BlueMarket,
                "RU" => TileType::ResourceRuby,
                "EM" => TileType::ResourceEmerald,
                "DI" => TileType::ResourceDiamond,
                "R1" => {
                    if red_start.replace(position).is_some() {
                        return Err(MatchError::DuplicateStart(PlayerSide::Red));
                    }
                    TileType::Empty
                }
                "B1" => {
                    if blue_start.replace(position).is_some() {
                        return Err(MatchError::DuplicateStart(PlayerSide::Blue));
                    }
                    TileType::Empty
                }
                unknown => {
                    return Err(MatchError::UnknownToken {
                        token: unknown.to_string(),
                        x,
                        y,
                    });
                }
            };
            tiles.set(position, tile)?;
        }
    }

    Ok(Board {
        tiles,
        red_start: red_start.ok_or(MatchError::MissingStart(PlayerSide::Red))?,
        blue_start: blue_start.ok_or(MatchError::MissingStart(PlayerSide::Blue))?,
    })
}

/// Generates a random square board.
///
/// Market tiles sit where [`MarketPair::for_side`] puts them, Red starts in
/// the bottom left corner and Blue in the top right. Every other tile is a
/// resource with probability `resource_density`.
pub fn generate_board(
    size: usize,
    seed: u64,
    resource_density: f64,
) -> Result<Board, MatchError> {
    if size < 2 {
        return Err(MatchError::BoardTooSmall(size));
    }
    let mut rng = StdRng::seed_from_u64(seed);
    let density = resource_density.clamp(0.0, 1.0);
    let red_markets = MarketPair::for_side(size, PlayerSide::Red);
    let blue_markets = MarketPair::for_side(size, PlayerSide::Blue);
    let red_start = Position::new(0, 0);
    let blue_start = Position::new(size - 1, size - 1);

    let tiles = Grid::from_generator(size, size, |position| {
        if red_markets.contains(position) {
            TileType::RedMarket
        } else if blue_markets.contains(position) {
            TileType::BlueMarket
        } else if position == red_start || position == blue_start {
            TileType::Empty
        } else if rng.random_bool(density) {
            match rng.random_range(0..3) {
                0 => TileType::ResourceRuby,
                1 => TileType::ResourceEmerald,
                _ => TileType::ResourceDiamond,
            }
        } else {
            TileType::Empty
        }
    });

    Ok(Board {
        tiles,
        red_start,
        blue_start,
    })
}

/// Checks that each side's market tiles sit exactly where
/// [`MarketPair::for_side`] puts them, since strategies navigate by that layout.
fn check_market_layout(tiles: &Grid<TileType>) -> Result<(), MatchError> {
    let size = tiles.width();
    for side in [PlayerSide::Red, PlayerSide::Blue] {
        let markets = MarketPair::for_side(size, side);
        let market = TileType::market_for(side);
        for position in markets.tiles() {
            if tiles.get(position) != Some(&market) {
                return Err(MatchError::MarketMismatch { side, position });
            }
        }
        if let Some((position, _)) = tiles
            .enumerate()
            .find(|(position, tile)| **tile == market && !markets.contains(*position))
        {
            return Err(MatchError::MarketMismatch { side, position });
        }
    }
    Ok(())
}

/// Host-side state of one player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerState {
    pub side: PlayerSide,
    pub position: Position,
    pub inventory: Vec<ItemType>,
    pub score: u32,
    /// Mine actions spent on the current tile.
    pub mining_progress: usize,
}

struct Player {
    state: PlayerState,
    strategy: Box<dyn MinerStrategy>,
}

/// Result of advancing the match by one turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnOutcome {
    Continue,
    /// The round ended; `winner` is `None` on equal scores.
    RoundOver { winner: Option<PlayerSide> },
}

/// Runs a two player match, calling each strategy once per turn.
pub struct MatchEngine {
    board: Grid<TileType>,
    items: HashMap<Position, Vec<ItemType>>,
    economy: Economy,
    config: MatchConfig,
    players: [Player; 2],
    turn: usize,
    outcome: Option<TurnOutcome>,
}

const RED: usize = 0;
const BLUE: usize = 1;

fn side_index(side: PlayerSide) -> usize {
    match side {
        PlayerSide::Red => RED,
        PlayerSide::Blue => BLUE,
    }
}

impl MatchEngine {
    /// Places both players and starts the round on each strategy.
    pub fn new(
        board: Board,
        config: MatchConfig,
        red: Box<dyn MinerStrategy>,
        blue: Box<dyn MinerStrategy>,
    ) -> Result<Self, MatchError> {
        let size = board.tiles.width();
        if size != board.tiles.height() {
            return Err(MatchError::NotSquare {
                width: size,
                height: board.tiles.height(),
            });
        }
        for side in [PlayerSide::Red, PlayerSide::Blue] {
            let position = board.start_for(side);
            if !board.tiles.contains(position) {
                return Err(MatchError::StartOutOfBounds { side, position });
            }
        }
        check_market_layout(&board.tiles)?;

        let seats = [(PlayerSide::Red, red), (PlayerSide::Blue, blue)];
        let mut players = seats.map(|(side, strategy)| Player {
            state: PlayerState {
                side,
                position: board.start_for(side),
                inventory: Vec::new(),
                score: 0,
                mining_progress: 0,
            },
            strategy,
        });

        for (index, player) in players.iter_mut().enumerate() {
            let round = config.round_config(size, player.state.side, player.state.position);
            let seed = config.seed.wrapping_mul(31).wrapping_add(index as u64 + 1);
            let rng = StdRng::seed_from_u64(seed);
            player.strategy.initialize(round, Box::new(rng));
            info!(side = ?player.state.side, strategy = player.strategy.name(), "player joined");
        }

        Ok(Self {
            board: board.tiles,
            items: HashMap::new(),
            economy: Economy::default(),
            config,
            players,
            turn: 0,
            outcome: None,
        })
    }

    pub fn board(&self) -> &Grid<TileType> {
        &self.board
    }

    pub fn items(&self) -> &HashMap<Position, Vec<ItemType>> {
        &self.items
    }

    pub fn economy(&self) -> &Economy {
        &self.economy
    }

    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    pub fn turn(&self) -> usize {
        self.turn
    }

    pub fn player(&self, side: PlayerSide) -> &PlayerState {
        &self.players[side_index(side)].state
    }

    pub fn strategy_name(&self, side: PlayerSide) -> &str {
        self.players[side_index(side)].strategy.name()
    }

    /// `Some` once the round has ended.
    pub fn outcome(&self) -> Option<TurnOutcome> {
        self.outcome
    }

    /// Processes one turn for both players.
    ///
    /// Once the round is over this keeps returning the final outcome.
    pub fn process_turn(&mut self) -> TurnOutcome {
        if let Some(outcome) = self.outcome {
            return outcome;
        }

        let is_red_turn = self.turn % 2 == 0;
        let actions = [
            self.request_action(PlayerSide::Red, is_red_turn),
            self.request_action(PlayerSide::Blue, is_red_turn),
        ];
        debug!(turn = self.turn, ?actions, "actions requested");

        let current = [self.players[RED].state.position, self.players[BLUE].state.position];
        let mut target = current;
        for index in [RED, BLUE] {
            let destination =
                actions[index].and_then(|action| self.move_target(current[index], action));
            if let Some(destination) = destination {
                target[index] = destination;
            }
        }
        let resolved = resolve_moves(current, target, is_red_turn);
        for index in [RED, BLUE] {
            let state = &mut self.players[index].state;
            if resolved[index] != state.position {
                state.position = resolved[index];
                state.mining_progress = 0;
            }
        }

        for index in [RED, BLUE] {
            match actions[index] {
                Some(TurnAction::Mine) => self.mine(index),
                Some(TurnAction::PickUp) => self.pick_up(index),
                _ => {}
            }
        }
        for index in [RED, BLUE] {
            self.sell_if_on_market(index);
        }

        self.economy.recover();
        self.turn += 1;

        let outcome = self.check_round_over();
        if let TurnOutcome::RoundOver { winner } = outcome {
            let scores = [self.players[RED].state.score, self.players[BLUE].state.score];
            info!(turn = self.turn, ?winner, red = scores[RED], blue = scores[BLUE], "round over");
            for side in [PlayerSide::Red, PlayerSide::Blue] {
                self.players[side_index(side)]
                    .strategy
                    .end_round(scores[side_index(side)], scores[side_index(side.opponent())]);
            }
            self.outcome = Some(outcome);
        }
        outcome
    }

    /// Runs turns until the round ends and returns the winner.
    pub fn run_to_completion(&mut self) -> Option<PlayerSide> {
        loop {
            if let TurnOutcome::RoundOver { winner } = self.process_turn() {
                return winner;
            }
        }
    }

    fn request_action(&mut self, side: PlayerSide, is_red_turn: bool) -> Option<TurnAction> {
        let other = self.player(side.opponent());
        let (other_location, other_score) = (other.position, other.score);
        let player = &mut self.players[side_index(side)];
        let view = PlayerBoardView::new(
            &self.board,
            &self.items,
            player.state.position,
            other_location,
            player.state.score,
            other_score,
        );
        player.strategy.turn_action(&view, &self.economy, is_red_turn)
    }

    fn move_target(&self, from: Position, action: TurnAction) -> Option<Position> {
        let (dx, dy) = action.offset()?;
        let target = Position {
            x: from.x.checked_add_signed(dx)?,
            y: from.y.checked_add_signed(dy)?,
        };
        self.board.contains(target).then_some(target)
    }

    fn mine(&mut self, index: usize) {
        let state = &mut self.players[index].state;
        let position = state.position;
        let tile = self.board[position];
        let Some(item) = tile.resource_item() else {
            return;
        };
        state.mining_progress += 1;
        if state.mining_progress >= tile.turns_to_mine() {
            state.mining_progress = 0;
            self.board[position] = TileType::Empty;
            self.items.entry(position).or_default().push(item);
            debug!(side = ?state.side, ?position, ?item, "resource mined");
        }
    }

    fn pick_up(&mut self, index: usize) {
        let player = &mut self.players[index];
        let position = player.state.position;
        if player.state.inventory.len() >= self.config.max_inventory_size {
            return;
        }
        let Some(ground) = self.items.get_mut(&position) else {
            return;
        };
        let Some(item) = ground.pop() else {
            return;
        };
        if ground.is_empty() {
            self.items.remove(&position);
        }
        player.state.inventory.push(item);
        player.strategy.on_receive_item(item);
    }

    fn sell_if_on_market(&mut self, index: usize) {
        let player = &mut self.players[index];
        let market = TileType::market_for(player.state.side);
        let on_market = self.board[player.state.position] == market;
        if !on_market || player.state.inventory.is_empty() {
            return;
        }
        let total = self.economy.sell(&player.state.inventory);
        info!(
            side = ?player.state.side,
            items = player.state.inventory.len(),
            total,
            "inventory sold"
        );
        player.state.inventory.clear();
        player.state.score += total;
        player.strategy.on_sold_inventory(total);
    }

    fn check_round_over(&self) -> TurnOutcome {
        let red = self.players[RED].state.score;
        let blue = self.players[BLUE].state.score;
        let winning = self.config.winning_score;
        if red < winning && blue < winning && self.turn < self.config.max_turns {
            return TurnOutcome::Continue;
        }
        let winner = match red.cmp(&blue) {
            std::cmp::Ordering::Greater => Some(PlayerSide::Red),
            std::cmp::Ordering::Less => Some(PlayerSide::Blue),
            std::cmp::Ordering::Equal => None,
        };
        TurnOutcome::RoundOver { winner }
    }
}

/// Settles simultaneous moves.
///
/// Two players heading for the same tile: the side holding precedence this
/// turn moves and the other stays put. A player moving onto a tile the other
/// keeps occupying stays put. Swapping tiles is allowed.
pub fn resolve_moves(
    current: [Position; 2],
    mut target: [Position; 2],
    is_red_turn: bool,
) -> [Position; 2] {
    while target[RED] == target[BLUE] {
        let moved = [target[RED] != current[RED], target[BLUE] != current[BLUE]];
        let loser = match moved {
            [true, true] => {
                if is_red_turn {
                    BLUE
                } else {
                    RED
                }
            }
            [true, false] => RED,
            [false, true] => BLUE,
            [false, false] => break,
        };
        target[loser] = current[loser];
    }
    target
}
