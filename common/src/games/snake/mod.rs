mod bot_controller;
mod broadcaster;
mod game_state;
mod input;
mod session;
mod types;

pub use bot_controller::BotController;
pub use broadcaster::SnakeBroadcaster;
pub use game_state::{is_out_of_bounds, is_self_collision, next_head, place_food, GameState};
pub use input::{change_direction, direction_from_input};
pub use session::{
    Controller, GameOverPolicy, GameOverReport, SessionOptions, SnakeCommand, SnakeSession,
    TickOutcome,
};
pub use types::{
    Direction, GameMode, Position, FOOD_SCORE, GRID_SIZE, INITIAL_SNAKE_LENGTH, INITIAL_SPEED_MS,
    MIN_SPEED_MS, SPEED_STEP_MS, SPEED_UP_EVERY,
};
