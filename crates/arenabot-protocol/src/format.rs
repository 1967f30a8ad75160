//! Format identifiers and the rules the bot derives from them.
//!
//! A format id looks like `gen9ou` or `gen8randombattle`: a generation
//! prefix followed by the metagame name.

/// Random-battle singles formats, added to the allow-list by `allow_random`.
pub const RANDOM_SINGLES_FORMATS: &[&str] = &[
    "gen9randombattle",
    "gen9unratedrandombattle",
    "gen8randombattle",
    "gen7randombattle",
    "gen6randombattle",
    "gen5randombattle",
    "gen4randombattle",
    "gen3randombattle",
    "gen2randombattle",
    "gen1randombattle",
];

/// Random-battle doubles formats, added to the allow-list by `allow_doubles`.
pub const RANDOM_DOUBLES_FORMATS: &[&str] = &[
    "gen9randomdoublesbattle",
    "gen8randomdoublesbattle",
    "gen7randomdoublesbattle",
];

/// Formats where the server hands out the roster even though they are
/// not random battles (and so still show a roster preview).
pub const SERVER_ROSTER_FORMATS: &[&str] = &[
    "gen9battlefactory",
    "gen9bssfactory",
    "gen9challengecup1v1",
    "gen9hackmonscup",
    "gen8battlefactory",
    "gen8bssfactory",
    "gen8challengecup1v1",
    "gen7battlefactory",
    "gen7bssfactory",
    "gen6battlefactory",
];

/// Generations that predate roster preview.
pub const NO_PREVIEW_GENERATIONS: &[&str] = &["gen1", "gen2", "gen3", "gen4"];

/// The generation tag of a format (`"gen9ou"` → `"gen9"`).
pub fn generation(format: &str) -> &str {
    format.get(..4).unwrap_or(format)
}

/// Returns `true` for random-battle formats.
///
/// These use the start path without roster preview.
pub fn is_random_battle(format: &str) -> bool {
    format.contains("random")
}

/// Returns `true` if the bot must submit its own roster for this format.
pub fn needs_roster(format: &str) -> bool {
    !is_random_battle(format) && !SERVER_ROSTER_FORMATS.contains(&format)
}

/// Returns `true` if matches in this format open with a roster preview.
pub fn has_roster_preview(format: &str) -> bool {
    !is_random_battle(format)
        && !NO_PREVIEW_GENERATIONS.contains(&generation(format))
}
