use std::borrow::Cow;
use std::collections::{HashSet, VecDeque};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::games::RandomSource;
use super::types::{
    Direction, GameMode, Position, FOOD_SCORE, GRID_SIZE, INITIAL_SNAKE_LENGTH, INITIAL_SPEED_MS,
    MIN_SPEED_MS, SPEED_STEP_MS, SPEED_UP_EVERY,
};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameState {
    /// Head first, tail last.
    pub snake: VecDeque<Position>,
    pub food: Position,
    pub direction: Direction,
    pub score: u32,
    pub is_game_over: bool,
    pub is_paused: bool,
    pub mode: GameMode,
    /// Milliseconds between ticks.
    pub speed: u64,
}

impl GameState {
    /// Fresh game: three segments centred on the grid, heading right.
    pub fn new<R: RandomSource>(mode: GameMode, rng: &mut R) -> Self {
        let center_x = GRID_SIZE / 2;
        let center_y = GRID_SIZE / 2;

        let snake: VecDeque<Position> = (0..INITIAL_SNAKE_LENGTH as i32)
            .map(|offset| Position::new(center_x - offset, center_y))
            .collect();

        // 400 cells against 3 segments, a free cell always exists
        let food = place_food(&snake, rng).unwrap_or(Position::new(0, 0));

        Self {
            snake,
            food,
            direction: Direction::Right,
            score: 0,
            is_game_over: false,
            is_paused: false,
            mode,
            speed: INITIAL_SPEED_MS,
        }
    }

    pub fn head(&self) -> Position {
        *self.snake.front().expect("Snake body should never be empty")
    }

    /// Every segment except the tail, which vacates its cell on a
    /// non-growing move.
    pub fn body_without_tail(&self) -> impl Iterator<Item = &Position> {
        self.snake.iter().take(self.snake.len().saturating_sub(1))
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.speed)
    }

    pub fn toggle_pause(&mut self) {
        if !self.is_game_over {
            self.is_paused = !self.is_paused;
        }
    }

    /// Advances the game by one tick.
    ///
    /// Paused and finished games come back as `Cow::Borrowed(self)`, so a
    /// caller can tell a no-op tick apart from a real transition without
    /// comparing states.
    pub fn step<R: RandomSource>(&self, rng: &mut R) -> Cow<'_, GameState> {
        if self.is_paused || self.is_game_over {
            return Cow::Borrowed(self);
        }

        let new_head = next_head(self.head(), self.direction, self.mode);

        if self.mode == GameMode::Walls && is_out_of_bounds(new_head) {
            return Cow::Owned(self.finished());
        }

        if is_self_collision(new_head, self.body_without_tail()) {
            return Cow::Owned(self.finished());
        }

        let mut next = self.clone();
        next.snake.push_front(new_head);

        if new_head == self.food {
            next.score += FOOD_SCORE;
            if next.score % SPEED_UP_EVERY == 0 && next.speed > MIN_SPEED_MS {
                next.speed = next.speed.saturating_sub(SPEED_STEP_MS).max(MIN_SPEED_MS);
            }
            match place_food(&next.snake, rng) {
                Some(food) => next.food = food,
                // snake covers the whole grid, nothing left to eat
                None => next.is_game_over = true,
            }
        } else {
            next.snake.pop_back();
        }

        Cow::Owned(next)
    }

    fn finished(&self) -> GameState {
        GameState {
            is_game_over: true,
            ..self.clone()
        }
    }
}

pub fn next_head(head: Position, direction: Direction, mode: GameMode) -> Position {
    let (dx, dy) = direction.delta();
    let moved = Position::new(head.x + dx, head.y + dy);

    match mode {
        GameMode::Walls => moved,
        GameMode::PassThrough => Position::new(wrap(moved.x), wrap(moved.y)),
    }
}

fn wrap(value: i32) -> i32 {
    if value < 0 {
        GRID_SIZE - 1
    } else if value >= GRID_SIZE {
        0
    } else {
        value
    }
}

pub fn is_out_of_bounds(position: Position) -> bool {
    position.x < 0 || position.x >= GRID_SIZE || position.y < 0 || position.y >= GRID_SIZE
}

/// The caller decides which segments count; `step` passes the body
/// without its tail.
pub fn is_self_collision<'a>(
    position: Position,
    body: impl IntoIterator<Item = &'a Position>,
) -> bool {
    body.into_iter().any(|segment| *segment == position)
}

/// Uniform draw over the grid, redrawn while the cell is occupied.
/// Returns `None` only when the body covers every cell.
pub fn place_food<'a, R: RandomSource>(
    snake_body: impl IntoIterator<Item = &'a Position>,
    rng: &mut R,
) -> Option<Position> {
    let occupied: HashSet<Position> = snake_body
        .into_iter()
        .copied()
        .filter(|p| !is_out_of_bounds(*p))
        .collect();

    if occupied.len() >= (GRID_SIZE * GRID_SIZE) as usize {
        return None;
    }

    loop {
        let x = rng.next_index(GRID_SIZE as usize) as i32;
        let y = rng.next_index(GRID_SIZE as usize) as i32;
        let candidate = Position::new(x, y);

        if !occupied.contains(&candidate) {
            return Some(candidate);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::SessionRng;
    use crate::games::session_rng::ScriptedRng;

    fn snake_of(points: &[(i32, i32)]) -> VecDeque<Position> {
        points.iter().map(|&(x, y)| Position::new(x, y)).collect()
    }

    fn state_with(
        points: &[(i32, i32)],
        direction: Direction,
        mode: GameMode,
        food: (i32, i32),
    ) -> GameState {
        GameState {
            snake: snake_of(points),
            food: Position::new(food.0, food.1),
            direction,
            score: 0,
            is_game_over: false,
            is_paused: false,
            mode,
            speed: INITIAL_SPEED_MS,
        }
    }

    fn assert_food_off_snake(state: &GameState) {
        assert!(
            !state.snake.contains(&state.food),
            "food {:?} lies on snake {:?}",
            state.food,
            state.snake
        );
    }

    #[test]
    fn test_initial_state_layout() {
        let mut rng = SessionRng::new(1);
        let state = GameState::new(GameMode::Walls, &mut rng);

        assert_eq!(state.snake, snake_of(&[(10, 10), (9, 10), (8, 10)]));
        assert_eq!(state.direction, Direction::Right);
        assert_eq!(state.score, 0);
        assert_eq!(state.speed, 150);
        assert!(!state.is_game_over);
        assert!(!state.is_paused);
        assert_eq!(state.mode, GameMode::Walls);
        assert_food_off_snake(&state);
    }

    #[test]
    fn test_initial_state_keeps_requested_mode() {
        let mut rng = SessionRng::new(2);
        let state = GameState::new(GameMode::PassThrough, &mut rng);
        assert_eq!(state.mode, GameMode::PassThrough);
    }

    #[test]
    fn test_initial_food_never_on_snake_for_many_seeds() {
        for seed in 0..200 {
            let mut rng = SessionRng::new(seed);
            let state = GameState::new(GameMode::Walls, &mut rng);
            assert_food_off_snake(&state);
            assert!(!is_out_of_bounds(state.food));
        }
    }

    #[test]
    fn test_place_food_redraws_occupied_cells() {
        let body = snake_of(&[(0, 0), (1, 0)]);
        // first draw (0, 0) is taken, second draw (1, 0) is taken, third (2, 3) is free
        let mut rng = ScriptedRng::new(vec![0, 0, 1, 0, 2, 3]);
        assert_eq!(place_food(&body, &mut rng), Some(Position::new(2, 3)));
    }

    #[test]
    fn test_place_food_full_grid_returns_none() {
        let body: Vec<Position> = (0..GRID_SIZE)
            .flat_map(|y| (0..GRID_SIZE).map(move |x| Position::new(x, y)))
            .collect();
        let mut rng = SessionRng::new(3);
        assert_eq!(place_food(&body, &mut rng), None);
    }

    #[test]
    fn test_next_head_moves_one_cell() {
        let head = Position::new(5, 5);
        assert_eq!(next_head(head, Direction::Up, GameMode::Walls), Position::new(5, 4));
        assert_eq!(next_head(head, Direction::Down, GameMode::Walls), Position::new(5, 6));
        assert_eq!(next_head(head, Direction::Left, GameMode::Walls), Position::new(4, 5));
        assert_eq!(next_head(head, Direction::Right, GameMode::Walls), Position::new(6, 5));
    }

    #[test]
    fn test_next_head_walls_mode_is_unclamped() {
        let next = next_head(Position::new(19, 0), Direction::Right, GameMode::Walls);
        assert_eq!(next, Position::new(20, 0));
        assert!(is_out_of_bounds(next));

        let next = next_head(Position::new(0, 0), Direction::Up, GameMode::Walls);
        assert_eq!(next, Position::new(0, -1));
        assert!(is_out_of_bounds(next));
    }

    #[test]
    fn test_next_head_pass_through_wraps_every_edge() {
        let mode = GameMode::PassThrough;
        assert_eq!(next_head(Position::new(0, 7), Direction::Left, mode), Position::new(19, 7));
        assert_eq!(next_head(Position::new(19, 7), Direction::Right, mode), Position::new(0, 7));
        assert_eq!(next_head(Position::new(7, 0), Direction::Up, mode), Position::new(7, 19));
        assert_eq!(next_head(Position::new(7, 19), Direction::Down, mode), Position::new(7, 0));
    }

    #[test]
    fn test_is_out_of_bounds_edges() {
        assert!(!is_out_of_bounds(Position::new(0, 0)));
        assert!(!is_out_of_bounds(Position::new(19, 19)));
        assert!(is_out_of_bounds(Position::new(-1, 5)));
        assert!(is_out_of_bounds(Position::new(5, -1)));
        assert!(is_out_of_bounds(Position::new(20, 5)));
        assert!(is_out_of_bounds(Position::new(5, 20)));
    }

    #[test]
    fn test_is_self_collision() {
        let body = snake_of(&[(5, 5), (4, 5), (3, 5)]);
        assert!(is_self_collision(Position::new(4, 5), &body));
        assert!(!is_self_collision(Position::new(6, 5), &body));
    }

    #[test]
    fn test_step_paused_returns_same_reference() {
        let mut rng = SessionRng::new(4);
        let mut state = GameState::new(GameMode::Walls, &mut rng);
        state.is_paused = true;

        let next = state.step(&mut rng);
        assert!(matches!(next, Cow::Borrowed(_)));
        assert!(std::ptr::eq(&*next, &state));
    }

    #[test]
    fn test_step_game_over_returns_same_reference() {
        let mut rng = SessionRng::new(5);
        let mut state = GameState::new(GameMode::Walls, &mut rng);
        state.is_game_over = true;

        let next = state.step(&mut rng);
        assert!(std::ptr::eq(&*next, &state));
    }

    #[test]
    fn test_step_eats_food_and_grows() {
        let mut rng = SessionRng::new(6);
        let mut state = GameState::new(GameMode::Walls, &mut rng);
        state.food = Position::new(11, 10);

        let next = state.step(&mut rng).into_owned();

        assert_eq!(next.snake, snake_of(&[(11, 10), (10, 10), (9, 10), (8, 10)]));
        assert_eq!(next.score, 10);
        assert!(!next.is_game_over);
        assert_food_off_snake(&next);
    }

    #[test]
    fn test_step_without_food_keeps_length() {
        let state = state_with(
            &[(10, 10), (9, 10), (8, 10)],
            Direction::Right,
            GameMode::Walls,
            (0, 0),
        );
        let mut rng = SessionRng::new(7);

        let next = state.step(&mut rng).into_owned();

        assert_eq!(next.snake, snake_of(&[(11, 10), (10, 10), (9, 10)]));
        assert_eq!(next.score, 0);
        assert_eq!(next.food, state.food);
    }

    #[test]
    fn test_step_walls_edge_is_fatal_and_keeps_snake() {
        let state = state_with(
            &[(19, 5), (18, 5), (17, 5)],
            Direction::Right,
            GameMode::Walls,
            (0, 0),
        );
        let mut rng = SessionRng::new(8);

        let next = state.step(&mut rng).into_owned();

        assert!(next.is_game_over);
        assert_eq!(next.snake, state.snake);
        assert_eq!(next.score, state.score);
    }

    #[test]
    fn test_step_pass_through_edge_wraps() {
        let state = state_with(
            &[(19, 5), (18, 5), (17, 5)],
            Direction::Right,
            GameMode::PassThrough,
            (0, 0),
        );
        let mut rng = SessionRng::new(9);

        let next = state.step(&mut rng).into_owned();

        assert!(!next.is_game_over);
        assert_eq!(next.head(), Position::new(0, 5));
    }

    #[test]
    fn test_step_pass_through_left_from_zero() {
        let state = state_with(
            &[(0, 3), (1, 3), (2, 3)],
            Direction::Left,
            GameMode::PassThrough,
            (5, 5),
        );
        let mut rng = SessionRng::new(10);

        let next = state.step(&mut rng).into_owned();

        assert!(!next.is_game_over);
        assert_eq!(next.head(), Position::new(19, 3));
    }

    #[test]
    fn test_step_self_collision_ends_game() {
        // head at (5,5) moving down into (5,6), which is a middle segment
        let state = state_with(
            &[(5, 5), (6, 5), (6, 6), (5, 6), (4, 6)],
            Direction::Down,
            GameMode::Walls,
            (0, 0),
        );
        let mut rng = SessionRng::new(11);

        let next = state.step(&mut rng).into_owned();

        assert!(next.is_game_over);
        assert_eq!(next.snake, state.snake);
    }

    #[test]
    fn test_step_into_vacating_tail_is_allowed() {
        // square loop: the head follows the tail into its cell
        let state = state_with(
            &[(5, 5), (6, 5), (6, 6), (5, 6)],
            Direction::Down,
            GameMode::Walls,
            (0, 0),
        );
        let mut rng = SessionRng::new(12);

        let next = state.step(&mut rng).into_owned();

        assert!(!next.is_game_over);
        assert_eq!(next.head(), Position::new(5, 6));
        assert_eq!(next.snake.len(), 4);
    }

    #[test]
    fn test_speed_drops_every_fifty_points() {
        let mut state = state_with(
            &[(10, 10), (9, 10), (8, 10)],
            Direction::Right,
            GameMode::Walls,
            (11, 10),
        );
        state.score = 40;
        let mut rng = SessionRng::new(13);

        let next = state.step(&mut rng).into_owned();

        assert_eq!(next.score, 50);
        assert_eq!(next.speed, 140);
    }

    #[test]
    fn test_speed_unchanged_between_milestones() {
        let mut state = state_with(
            &[(10, 10), (9, 10), (8, 10)],
            Direction::Right,
            GameMode::Walls,
            (11, 10),
        );
        state.score = 20;
        let mut rng = SessionRng::new(14);

        let next = state.step(&mut rng).into_owned();

        assert_eq!(next.score, 30);
        assert_eq!(next.speed, 150);
    }

    #[test]
    fn test_speed_never_below_floor() {
        let mut state = state_with(
            &[(10, 10), (9, 10), (8, 10)],
            Direction::Right,
            GameMode::Walls,
            (11, 10),
        );
        state.score = 490;
        state.speed = MIN_SPEED_MS;
        let mut rng = SessionRng::new(15);

        let next = state.step(&mut rng).into_owned();

        assert_eq!(next.score, 500);
        assert_eq!(next.speed, MIN_SPEED_MS);
    }

    #[test]
    fn test_food_invariant_holds_over_long_run() {
        let mut rng = SessionRng::new(16);
        let mut state = GameState::new(GameMode::PassThrough, &mut rng);

        for tick in 0..2000 {
            // steer a lawnmower pattern so the snake keeps moving without turning back
            if tick % 20 == 19 {
                state.direction = if state.direction == Direction::Down {
                    Direction::Right
                } else {
                    Direction::Down
                };
            }
            state = state.step(&mut rng).into_owned();
            assert_food_off_snake(&state);
            if state.is_game_over {
                break;
            }
        }
    }

    #[test]
    fn test_toggle_pause_ignored_after_game_over() {
        let mut rng = SessionRng::new(17);
        let mut state = GameState::new(GameMode::Walls, &mut rng);

        state.toggle_pause();
        assert!(state.is_paused);
        state.toggle_pause();
        assert!(!state.is_paused);

        state.is_game_over = true;
        state.toggle_pause();
        assert!(!state.is_paused);
    }

    #[test]
    fn test_snapshot_serializes_mode_and_direction() {
        let state = state_with(&[(1, 1)], Direction::Up, GameMode::PassThrough, (2, 2));
        let yaml = serde_yaml_ng::to_string(&state).unwrap();
        assert!(yaml.contains("mode: pass-through"));
        assert!(yaml.contains("direction: UP"));

        let back: GameState = serde_yaml_ng::from_str(&yaml).unwrap();
        assert_eq!(back, state);
    }
}
