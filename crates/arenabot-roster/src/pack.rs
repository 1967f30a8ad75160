//! Wire packing.
//!
//! A packed roster is one record per set, records joined with `]`. Each
//! record has exactly 17 `|`-separated fields:
//!
//! ```text
//! name|species|item|ability|moves|nature|evs|gender|ivs|shiny|level|
//! happiness|pokeball|hiddenpowertype|gigantamax|dynamaxlevel|teratype
//! ```
//!
//! Multi-valued fields (moves, EVs, IVs) are comma-joined; unset fields
//! are empty.

use crate::set::RosterSet;

/// Number of `|`-separated fields in one packed record.
pub const PACKED_FIELDS: usize = 17;

/// Packs sets into the wire roster string.
pub fn pack(sets: &[RosterSet]) -> String {
    sets.iter().map(pack_set).collect::<Vec<_>>().join("]")
}

fn pack_set(set: &RosterSet) -> String {
    let number = |n: Option<u8>| n.map(|n| n.to_string()).unwrap_or_default();
    let flag = |on: bool, mark: &str| if on { mark.to_string() } else { String::new() };

    let fields: [String; PACKED_FIELDS] = [
        set.nickname.clone(),
        set.species.clone(),
        set.item.clone(),
        set.ability.clone(),
        set.moves.join(","),
        set.nature.clone(),
        set.evs.to_wire(),
        set.gender.clone(),
        set.ivs.as_ref().map(|ivs| ivs.to_wire()).unwrap_or_default(),
        flag(set.shiny, "S"),
        number(set.level),
        number(set.happiness),
        set.pokeball.clone(),
        set.hidden_power_type.clone(),
        flag(set.gigantamax, "G"),
        number(set.dynamax_level),
        set.tera_type.clone(),
    ];
    fields.join("|")
}
