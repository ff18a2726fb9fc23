use super::types::Direction;

/// Keeps `current` when `requested` would reverse the snake onto itself.
pub fn change_direction(current: Direction, requested: Direction) -> Direction {
    if requested.is_opposite(&current) {
        current
    } else {
        requested
    }
}

/// Arrow keys by their DOM names, WASD in either case.
pub fn direction_from_input(key: &str) -> Option<Direction> {
    match key {
        "ArrowUp" => return Some(Direction::Up),
        "ArrowDown" => return Some(Direction::Down),
        "ArrowLeft" => return Some(Direction::Left),
        "ArrowRight" => return Some(Direction::Right),
        _ => {}
    }

    let mut chars = key.chars();
    let (Some(c), None) = (chars.next(), chars.next()) else {
        return None;
    };

    match c.to_ascii_lowercase() {
        'w' => Some(Direction::Up),
        's' => Some(Direction::Down),
        'a' => Some(Direction::Left),
        'd' => Some(Direction::Right),
        _ => None,
    }
}
