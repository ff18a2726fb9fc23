use crate::games::RandomSource;

const ADJECTIVES: &[&str] = &[
    "Swift", "Brave", "Clever", "Mighty", "Silent", "Golden", "Wild", "Noble",
    "Fierce", "Gentle", "Quick", "Wise", "Bold", "Proud", "Cunning", "Sly",
];

const NOUNS: &[&str] = &[
    "Adder", "Python", "Cobra", "Viper", "Mamba", "Boa", "Krait", "Taipan",
    "Asp", "Racer", "Garter", "Anaconda", "Rattler", "Sidewinder", "Kingsnake", "Copperhead",
];

const HEX: &[u8] = b"0123456789abcdef";

/// Display name for a bot-driven spectator session, e.g. "Silent Mamba".
pub fn generate_player_name<R: RandomSource>(rng: &mut R) -> String {
    let adjective = ADJECTIVES[rng.next_index(ADJECTIVES.len())];
    let noun = NOUNS[rng.next_index(NOUNS.len())];
    format!("{} {}", adjective, noun)
}

/// 16 lowercase hex characters.
pub fn generate_hex_id<R: RandomSource>(rng: &mut R) -> String {
    (0..16)
        .map(|_| HEX[rng.next_index(HEX.len())] as char)
        .collect()
}
