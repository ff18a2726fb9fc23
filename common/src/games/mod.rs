pub(crate) mod session_rng;

pub mod snake;

pub use session_rng::{RandomSource, SessionRng};
