use crate::games::RandomSource;
use super::game_state::{is_out_of_bounds, is_self_collision, next_head, GameState};
use super::types::{Direction, GameMode, Position};

/// Greedy chaser used for spectator sessions.
pub struct BotController;

impl BotController {
    /// Picks the next direction for `state`.
    ///
    /// When every candidate is fatal the current direction is returned and
    /// the snake dies on the next tick instead of stalling.
    pub fn choose_direction<R: RandomSource>(state: &GameState, rng: &mut R) -> Direction {
        let head = state.head();
        let safe_directions: Vec<Direction> = Self::get_valid_directions(state.direction)
            .into_iter()
            .filter(|&dir| Self::is_safe_move(head, dir, state))
            .collect();

        if safe_directions.is_empty() {
            return state.direction;
        }

        let towards_food: Vec<Direction> = safe_directions
            .iter()
            .copied()
            .filter(|&dir| Self::approaches(head, state.food, dir))
            .collect();

        if towards_food.is_empty() {
            Self::pick(&safe_directions, rng)
        } else {
            Self::pick(&towards_food, rng)
        }
    }

    fn get_valid_directions(current: Direction) -> Vec<Direction> {
        Direction::ALL
            .into_iter()
            .filter(|d| !d.is_opposite(&current))
            .collect()
    }

    fn is_safe_move(head: Position, direction: Direction, state: &GameState) -> bool {
        let next = next_head(head, direction, state.mode);

        if state.mode == GameMode::Walls && is_out_of_bounds(next) {
            return false;
        }

        !is_self_collision(next, state.body_without_tail())
    }

    fn approaches(head: Position, food: Position, direction: Direction) -> bool {
        match direction {
            Direction::Up => food.y < head.y,
            Direction::Down => food.y > head.y,
            Direction::Left => food.x < head.x,
            Direction::Right => food.x > head.x,
        }
    }

    fn pick<R: RandomSource>(candidates: &[Direction], rng: &mut R) -> Direction {
        candidates[rng.next_index(candidates.len())]
    }
}
