use rand::seq::IndexedRandom;

/// Opening prompts a new story can start from
pub const OPENING_PROMPTS: [&str; 10] = [
    "One day at school...",
    "On a rainy afternoon...",
    "We went on a trip together, and...",
    "An old friend I hadn't seen in years...",
    "When I came back home...",
    "The letter I found by accident said...",
    "On my first trip abroad alone...",
    "Inside the old box was...",
    "I picked up a wallet on the street, and...",
    "Something strange happened at the festival...",
];

/// Picks a random opening prompt
pub fn random_prompt() -> &'static str {
    OPENING_PROMPTS
        .choose(&mut rand::rng())
        .copied()
        .unwrap_or(OPENING_PROMPTS[0])
}

/// Returns the prompt at `index`, or a random one when out of range
pub fn prompt_at(index: usize) -> &'static str {
    OPENING_PROMPTS.get(index).copied().unwrap_or_else(random_prompt)
}
