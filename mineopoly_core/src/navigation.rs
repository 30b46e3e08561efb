//! Single-step movement and the nearest-resource search.

use tracing::trace;

use crate::{
    Position,
    environment::{PlayerBoardView, TurnAction},
};

/// Returns one move that brings `current` closer to `target`.
///
/// The horizontal axis is closed first, then the vertical one. Returns `None`
/// when `current` already equals `target`.
pub fn step_toward(current: Position, target: Position) -> Option<TurnAction> {
    if current.x > target.x {
        Some(TurnAction::MoveLeft)
    } else if current.x < target.x {
        Some(TurnAction::MoveRight)
    } else if current.y > target.y {
        Some(TurnAction::MoveDown)
    } else if current.y < target.y {
        Some(TurnAction::MoveUp)
    } else {
        None
    }
}

/// Finds the closest minable tile to `origin` by manhattan distance.
///
/// Square boxes of growing radius are scanned around `origin`, each box in
/// full (`x` ascending, then `y` ascending). A cell replaces the current best
/// only when strictly closer, so the first cell met at the minimal distance
/// wins. The radius stops growing once it passes the best distance so far.
///
/// `search_limit` is both the largest radius tried and an exclusive bound on
/// the accepted distance; tiles that far away or farther are never returned.
pub fn nearest_mine(
    view: &PlayerBoardView<'_>,
    origin: Position,
    search_limit: usize,
) -> Option<Position> {
    let last_index = view.board_size().saturating_sub(1);
    let mut shortest = search_limit;
    let mut closest = None;

    let mut radius = 0;
    while radius <= shortest {
        let x_range = origin.x.saturating_sub(radius)..=(origin.x + radius).min(last_index);
        for x in x_range {
            let y_range = origin.y.saturating_sub(radius)..=(origin.y + radius).min(last_index);
            for y in y_range {
                let candidate = Position { x, y };
                let minable = view.tile_at(candidate).is_some_and(|tile| tile.is_minable());
                if !minable {
                    continue;
                }
                let distance = origin.manhattan_distance(&candidate);
                if distance < shortest {
                    trace!(radius, ?candidate, distance, "closer resource tile");
                    shortest = distance;
                    closest = Some(candidate);
                }
            }
        }
        radius += 1;
    }

    closest
}
