//! The structured roster entry.

use serde::{Deserialize, Serialize};

/// The six stats, in the order the wire format lists them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stat {
    Hp,
    Atk,
    Def,
    Spa,
    Spd,
    Spe,
}

impl Stat {
    /// All stats in wire order.
    pub const ALL: [Stat; 6] = [
        Stat::Hp,
        Stat::Atk,
        Stat::Def,
        Stat::Spa,
        Stat::Spd,
        Stat::Spe,
    ];

    /// Parses a normalized stat label (`"spa"`, `"spatk"`, `"hp"`, ...).
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "hp" => Some(Self::Hp),
            "atk" | "attack" => Some(Self::Atk),
            "def" | "defense" => Some(Self::Def),
            "spa" | "spatk" | "specialattack" => Some(Self::Spa),
            "spd" | "spdef" | "specialdefense" => Some(Self::Spd),
            "spe" | "speed" => Some(Self::Spe),
            _ => None,
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// Per-stat values where any slot may be unset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatTable([Option<u16>; 6]);

impl StatTable {
    /// Returns the value for `stat`, if set.
    pub fn get(&self, stat: Stat) -> Option<u16> {
        self.0[stat.index()]
    }

    /// Sets the value for `stat`.
    pub fn set(&mut self, stat: Stat, value: u16) {
        self.0[stat.index()] = Some(value);
    }

    /// Returns `true` if no slot is set.
    pub fn is_empty(&self) -> bool {
        self.0.iter().all(Option::is_none)
    }

    /// Comma-joined values in wire order, unset slots left empty.
    pub fn to_wire(&self) -> String {
        self.0
            .iter()
            .map(|v| v.map(|n| n.to_string()).unwrap_or_default())
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// One combatant of a roster, as authored in export text.
///
/// Every free-text field is stored normalized. `nickname` and `species`
/// hold the same value unless the author gave an explicit nickname.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterSet {
    pub nickname: String,
    pub species: String,
    /// Normalized species without its forme, used by the species clause.
    pub base_species: String,
    pub item: String,
    pub ability: String,
    /// At most four move ids.
    pub moves: Vec<String>,
    pub nature: String,
    pub evs: StatTable,
    pub ivs: Option<StatTable>,
    /// `"M"`, `"F"`, or empty.
    pub gender: String,
    pub level: Option<u8>,
    pub shiny: bool,
    pub happiness: Option<u8>,
    pub pokeball: String,
    pub hidden_power_type: String,
    pub gigantamax: bool,
    pub dynamax_level: Option<u8>,
    pub tera_type: String,
}

/// Maximum moves a set may carry.
pub const MAX_MOVES: usize = 4;

impl RosterSet {
    /// Returns `true` if the held item is a mega stone.
    pub fn holds_mega_stone(&self) -> bool {
        let item = self.item.as_str();
        item != "eviolite"
            && (item.ends_with("ite") || item.ends_with("itex") || item.ends_with("itey"))
    }

    /// Returns `true` if the held item is a move crystal (`...iumz`).
    pub fn holds_crystal(&self) -> bool {
        self.item.ends_with("iumz")
    }

    /// The key the species clause compares.
    pub fn species_key(&self) -> &str {
        if !self.base_species.is_empty() {
            &self.base_species
        } else if !self.species.is_empty() {
            &self.species
        } else {
            &self.nickname
        }
    }
}
