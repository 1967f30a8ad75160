//! Export-text parsing.
//!
//! Export text is the human-authored roster format:
//!
//! ```text
//! Sparky (Pikachu) (M) @ Light Ball
//! Ability: Static
//! EVs: 252 SpA / 4 SpD / 252 Spe
//! Timid Nature
//! - Thunderbolt
//! - Volt Switch / Grass Knot
//! ```
//!
//! Sets are separated by blank lines; lines starting with `#` are comments.
//! Where the author lists alternatives (`Item/Item`, `- Move / Move`) one is
//! picked uniformly at random, so parsing the same text twice may give two
//! different rosters.

use rand::Rng;
use rand::seq::IndexedRandom;

use crate::normalize::{base_species, normalize};
use crate::set::{MAX_MOVES, RosterSet, Stat, StatTable};

/// Parses export text into sets using the thread-local RNG.
pub fn parse_export(text: &str) -> Vec<RosterSet> {
    parse_export_with(text, &mut rand::rng())
}

/// Parses export text into sets, resolving alternatives with `rng`.
///
/// Blocks without a usable first line are skipped.
pub fn parse_export_with<R: Rng + ?Sized>(
    text: &str,
    rng: &mut R,
) -> Vec<RosterSet> {
    let mut sets = Vec::new();
    let mut block: Vec<&str> = Vec::new();

    let lines = text.lines().filter(|line| !line.starts_with('#'));
    for line in lines.chain(std::iter::once("")) {
        if line.trim().is_empty() {
            if !block.is_empty() {
                if let Some(set) = parse_block(&block, rng) {
                    sets.push(set);
                }
                block.clear();
            }
        } else {
            block.push(line);
        }
    }

    tracing::debug!(sets = sets.len(), "parsed roster export");
    sets
}

fn parse_block<R: Rng + ?Sized>(
    lines: &[&str],
    rng: &mut R,
) -> Option<RosterSet> {
    let (header, body) = lines.split_first()?;
    let mut set = parse_header(header, rng)?;

    for line in body.iter().map(|l| l.trim()) {
        if let Some(rest) = line.strip_prefix('-') {
            let choice = pick(rest, rng);
            if set.moves.len() < MAX_MOVES {
                set.moves.push(normalize(choice));
            } else {
                tracing::warn!(
                    species = %set.species,
                    extra = choice.trim(),
                    "set lists more than four moves, ignoring extra"
                );
            }
        } else if let Some(rest) = line.strip_prefix("Ability:") {
            set.ability = normalize(rest);
        } else if let Some(rest) = line.strip_prefix("Tera Type:") {
            set.tera_type = normalize(rest);
        } else if let Some(rest) = line.strip_prefix("Level:") {
            set.level = rest.trim().parse().ok();
        } else if let Some(rest) = line.strip_prefix("EVs:") {
            set.evs = parse_stats(rest);
        } else if let Some(rest) = line.strip_prefix("IVs:") {
            set.ivs = Some(parse_stats(rest));
        } else if let Some(rest) = line.strip_prefix("Shiny:") {
            set.shiny = is_yes(rest);
        } else if let Some(rest) = line.strip_prefix("Happiness:") {
            set.happiness = rest.trim().parse().ok();
        } else if let Some(rest) = line
            .strip_prefix("Pokeball:")
            .or_else(|| line.strip_prefix("Ball:"))
        {
            set.pokeball = normalize(rest);
        } else if let Some(rest) = line.strip_prefix("Hidden Power:") {
            set.hidden_power_type = normalize(rest);
        } else if let Some(rest) = line.strip_prefix("Gigantamax:") {
            set.gigantamax = is_yes(rest);
        } else if let Some(rest) = line.strip_prefix("Dynamax Level:") {
            set.dynamax_level = rest.trim().parse().ok();
        } else if let Some(rest) = line.strip_suffix("Nature") {
            set.nature = normalize(rest);
        }
    }

    Some(set)
}

/// `Nickname [(Species)] [(M)|(F)] [@ Item[/Item...]]`
fn parse_header<R: Rng + ?Sized>(
    header: &str,
    rng: &mut R,
) -> Option<RosterSet> {
    let (name_part, item_part) = match header.split_once('@') {
        Some((name, item)) => (name, Some(item)),
        None => (header, None),
    };

    let mut set = RosterSet::default();
    let mut name = name_part.to_string();
    for (marker, gender) in [("(M)", "M"), ("(F)", "F")] {
        if name.contains(marker) {
            set.gender = gender.to_string();
            name = name.replace(marker, "");
        }
    }

    let species_text = match (name.find('('), name.rfind(')')) {
        (Some(open), Some(close)) if open < close => {
            let species = name[open + 1..close].trim().to_string();
            let nickname = normalize(&name[..open]);
            set.species = normalize(&species);
            set.nickname = if nickname.is_empty() {
                set.species.clone()
            } else {
                nickname
            };
            species
        }
        _ => {
            let species = name.trim().to_string();
            set.species = normalize(&species);
            set.nickname = set.species.clone();
            species
        }
    };

    if set.species.is_empty() {
        return None;
    }
    set.base_species = base_species(&species_text);

    if let Some(items) = item_part {
        set.item = normalize(pick(items, rng));
    }

    Some(set)
}

/// Picks one of the `/`-separated alternatives uniformly at random.
fn pick<'a, R: Rng + ?Sized>(alternatives: &'a str, rng: &mut R) -> &'a str {
    let options: Vec<&str> = alternatives
        .split('/')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();
    options.choose(rng).copied().unwrap_or("")
}

/// `252 SpA / 4 SpD / 252 Spe`
fn parse_stats(spec: &str) -> StatTable {
    let mut table = StatTable::default();
    for chunk in spec.split('/') {
        let mut words = chunk.split_whitespace();
        let Some(amount) = words.next().and_then(|a| a.parse::<u16>().ok())
        else {
            continue;
        };
        let label = normalize(&words.collect::<String>());
        if let Some(stat) = Stat::from_label(&label) {
            table.set(stat, amount);
        }
    }
    table
}

fn is_yes(value: &str) -> bool {
    value.trim().eq_ignore_ascii_case("yes")
}
