//! Decision scenarios for the greedy strategy, driven through the public API.

use std::collections::HashMap;

use mineopoly_core::{
    Economy, GreedyMiner, ItemType, MinerStrategy, PlayerBoardView, PlayerSide, Position,
    RoundConfig, TileType, TurnAction, map::Grid,
};
use rand::{SeedableRng, rngs::StdRng};

fn start_round(board_size: usize, max_inventory_size: usize, seed: u64) -> GreedyMiner {
    let mut miner = GreedyMiner::new();
    miner.initialize(
        RoundConfig {
            board_size,
            max_inventory_size,
            winning_score: 1000,
            start_location: Position::new(0, 0),
            side: PlayerSide::Red,
        },
        Box::new(StdRng::seed_from_u64(seed)),
    );
    miner
}

fn act(
    miner: &mut GreedyMiner,
    board: &Grid<TileType>,
    items: &HashMap<Position, Vec<ItemType>>,
    at: Position,
) -> Option<TurnAction> {
    let view = PlayerBoardView::new(board, items, at, Position::new(9, 9), 0, 0);
    miner.turn_action(&view, &Economy::default(), true)
}

#[test]
fn full_inventory_walks_to_nearer_market() {
    let mut miner = start_round(10, 3, 1);
    for _ in 0..3 {
        miner.on_receive_item(ItemType::Ruby);
    }
    let markets = miner.markets().unwrap();
    assert_eq!(markets.market0, Position::new(5, 5));
    assert_eq!(markets.market1, Position::new(4, 4));

    let mut board = Grid::square(10);
    board[Position::new(2, 2)] = TileType::ResourceDiamond;
    let action = act(&mut miner, &board, &HashMap::new(), Position::new(2, 2));
    assert_eq!(action, Some(TurnAction::MoveRight));
}

#[test]
fn picks_up_item_underfoot() {
    let mut miner = start_round(10, 3, 1);
    let board = Grid::square(10);
    let mut items = HashMap::new();
    items.insert(Position::new(3, 3), vec![ItemType::Ruby]);
    assert_eq!(
        act(&mut miner, &board, &items, Position::new(3, 3)),
        Some(TurnAction::PickUp)
    );
}

#[test]
fn mines_resource_underfoot() {
    let mut miner = start_round(10, 3, 1);
    let mut board = Grid::square(10);
    board[Position::new(3, 3)] = TileType::ResourceEmerald;
    let mut items = HashMap::new();
    items.insert(Position::new(4, 3), vec![ItemType::Ruby]);
    assert_eq!(
        act(&mut miner, &board, &items, Position::new(3, 3)),
        Some(TurnAction::Mine)
    );
}

#[test]
fn walks_up_toward_resource_in_same_column() {
    let mut miner = start_round(10, 3, 1);
    let mut board = Grid::square(10);
    board[Position::new(0, 2)] = TileType::ResourceRuby;
    board[Position::new(5, 5)] = TileType::ResourceDiamond;
    assert_eq!(
        act(&mut miner, &board, &HashMap::new(), Position::new(0, 0)),
        Some(TurnAction::MoveUp)
    );
}

#[test]
fn carried_count_tracks_host_pickups_up_to_capacity() {
    let max_inventory_size = 3;
    let mut miner = start_round(10, max_inventory_size, 4);
    let board = Grid::square(10);
    let at = Position::new(2, 3);
    let mut items = HashMap::from([(at, vec![ItemType::Diamond; 6])]);
    let mut held = Vec::new();

    for _ in 0..8 {
        let action = act(&mut miner, &board, &items, at);
        if action == Some(TurnAction::PickUp) && held.len() < max_inventory_size {
            let item = items.get_mut(&at).and_then(Vec::pop).unwrap();
            held.push(item);
            miner.on_receive_item(item);
        }
        assert!(miner.carried_count() <= max_inventory_size);
        assert_eq!(miner.carried_count(), held.len());
    }
    assert_eq!(miner.carried_count(), max_inventory_size);
    assert_eq!(items[&at].len(), 3);

    miner.on_sold_inventory(300);
    assert_eq!(miner.carried_count(), 0);
    assert_eq!(act(&mut miner, &board, &items, at), Some(TurnAction::PickUp));
}

#[test]
fn sale_resets_carried_count_regardless_of_amount() {
    let mut miner = start_round(10, 3, 1);
    for _ in 0..3 {
        miner.on_receive_item(ItemType::Emerald);
    }
    assert_eq!(miner.carried_count(), 3);
    miner.on_sold_inventory(42);
    assert_eq!(miner.carried_count(), 0);
}

#[test]
fn no_resources_means_uniform_random_moves() {
    let mut miner = start_round(8, 3, 2024);
    let board = Grid::square(8);
    let items = HashMap::new();

    let mut counts: HashMap<TurnAction, usize> = HashMap::new();
    for _ in 0..4000 {
        let action = act(&mut miner, &board, &items, Position::new(4, 4)).unwrap();
        *counts.entry(action).or_default() += 1;
    }

    assert_eq!(counts.len(), 4);
    for action in TurnAction::MOVES {
        let seen = counts[&action];
        assert!(
            (800..=1200).contains(&seen),
            "{action:?} chosen {seen} times out of 4000"
        );
    }
}

#[test]
fn full_and_standing_on_item_still_heads_to_market() {
    let mut miner = start_round(10, 1, 1);
    miner.on_receive_item(ItemType::Ruby);
    let board = Grid::square(10);
    let mut items = HashMap::new();
    items.insert(Position::new(8, 8), vec![ItemType::Diamond]);
    assert_eq!(
        act(&mut miner, &board, &items, Position::new(8, 8)),
        Some(TurnAction::MoveLeft)
    );
}
