//! Pool drafting ("factory" rosters).
//!
//! A factory file holds many candidate sets. A roster is drafted by
//! shuffling the candidates and greedily accepting them one at a time,
//! skipping any candidate that would break an active clause or cap.
//!
//! No minimum size is enforced: a small or clashing pool yields a short
//! roster, and the caller decides what to do with it.

use std::collections::HashSet;

use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::set::RosterSet;

/// Roster size the draft stops at.
pub const ROSTER_SIZE: usize = 6;

/// Clauses and caps applied while drafting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftRules {
    /// No two sets may share a base species.
    pub species_clause: bool,
    /// No two sets may hold the same item.
    pub item_clause: bool,
    /// Maximum sets holding a mega stone.
    pub max_megas: usize,
    /// Maximum sets holding a move crystal.
    pub max_crystals: usize,
}

impl Default for DraftRules {
    fn default() -> Self {
        Self {
            species_clause: true,
            item_clause: true,
            max_megas: 1,
            max_crystals: 2,
        }
    }
}

/// Why a candidate was turned down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    Species,
    Item,
    MegaCap,
    CrystalCap,
}

/// Bookkeeping for one draft.
#[derive(Debug, Default)]
pub struct DraftState {
    accepted: Vec<RosterSet>,
    species: HashSet<String>,
    items: HashSet<String>,
    megas: usize,
    crystals: usize,
}

impl DraftState {
    /// Checks `set` against `rules` without accepting it.
    pub fn check(&self, set: &RosterSet, rules: &DraftRules) -> Result<(), Rejection> {
        if rules.species_clause && self.species.contains(set.species_key()) {
            return Err(Rejection::Species);
        }
        if rules.item_clause && !set.item.is_empty() && self.items.contains(&set.item) {
            return Err(Rejection::Item);
        }
        if set.holds_mega_stone() && self.megas >= rules.max_megas {
            return Err(Rejection::MegaCap);
        }
        if set.holds_crystal() && self.crystals >= rules.max_crystals {
            return Err(Rejection::CrystalCap);
        }
        Ok(())
    }

    /// Accepts `set` if it passes `rules`.
    pub fn offer(&mut self, set: RosterSet, rules: &DraftRules) -> Result<(), Rejection> {
        self.check(&set, rules)?;

        self.species.insert(set.species_key().to_string());
        if !set.item.is_empty() {
            self.items.insert(set.item.clone());
        }
        if set.holds_mega_stone() {
            self.megas += 1;
        }
        if set.holds_crystal() {
            self.crystals += 1;
        }
        self.accepted.push(set);
        Ok(())
    }

    /// Number of sets accepted so far.
    pub fn len(&self) -> usize {
        self.accepted.len()
    }

    /// Returns `true` if nothing has been accepted.
    pub fn is_empty(&self) -> bool {
        self.accepted.is_empty()
    }

    /// Finishes the draft.
    pub fn into_roster(self) -> Vec<RosterSet> {
        self.accepted
    }
}

/// Drafts up to six sets from `pool` using the thread-local RNG.
pub fn draft_factory(pool: Vec<RosterSet>, rules: &DraftRules) -> Vec<RosterSet> {
    draft_factory_with(pool, rules, &mut rand::rng())
}

/// Drafts up to six sets from `pool`, shuffling with `rng`.
pub fn draft_factory_with<R: Rng + ?Sized>(
    mut pool: Vec<RosterSet>,
    rules: &DraftRules,
    rng: &mut R,
) -> Vec<RosterSet> {
    pool.shuffle(rng);
    let pool_size = pool.len();

    let mut draft = DraftState::default();
    while draft.len() < ROSTER_SIZE {
        let Some(candidate) = pool.pop() else {
            break;
        };
        if let Err(reason) = draft.offer(candidate, rules) {
            tracing::trace!(?reason, "draft candidate rejected");
        }
    }

    if draft.len() < ROSTER_SIZE {
        tracing::warn!(
            drafted = draft.len(),
            pool = pool_size,
            "pool exhausted before a full roster was drafted"
        );
    }
    draft.into_roster()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(species: &str, item: &str) -> RosterSet {
        RosterSet {
            nickname: species.into(),
            species: species.into(),
            base_species: species.into(),
            item: item.into(),
            ..RosterSet::default()
        }
    }

    #[test]
    fn test_offer_rejects_repeated_species_when_clause_active() {
        let rules = DraftRules::default();
        let mut draft = DraftState::default();

        draft.offer(set("rotom", "leftovers"), &rules).unwrap();
        let result = draft.offer(set("rotom", "choicescarf"), &rules);

        assert_eq!(result, Err(Rejection::Species));
        assert_eq!(draft.len(), 1);
    }

    #[test]
    fn test_offer_allows_repeats_when_clauses_off() {
        let rules = DraftRules {
            species_clause: false,
            item_clause: false,
            ..DraftRules::default()
        };
        let mut draft = DraftState::default();

        draft.offer(set("rotom", "leftovers"), &rules).unwrap();
        draft.offer(set("rotom", "leftovers"), &rules).unwrap();

        assert_eq!(draft.len(), 2);
    }

    #[test]
    fn test_offer_rejects_repeated_item() {
        let rules = DraftRules::default();
        let mut draft = DraftState::default();

        draft.offer(set("mew", "leftovers"), &rules).unwrap();

        assert_eq!(
            draft.offer(set("snorlax", "leftovers"), &rules),
            Err(Rejection::Item)
        );
    }

    #[test]
    fn test_offer_itemless_sets_never_clash_on_item() {
        let rules = DraftRules::default();
        let mut draft = DraftState::default();

        draft.offer(set("mew", ""), &rules).unwrap();
        draft.offer(set("snorlax", ""), &rules).unwrap();

        assert_eq!(draft.len(), 2);
    }

    #[test]
    fn test_offer_enforces_mega_and_crystal_caps() {
        let rules = DraftRules {
            max_megas: 1,
            max_crystals: 1,
            ..DraftRules::default()
        };
        let mut draft = DraftState::default();

        draft.offer(set("gengar", "gengarite"), &rules).unwrap();
        assert_eq!(
            draft.offer(set("lopunny", "lopunnite"), &rules),
            Err(Rejection::MegaCap)
        );

        draft.offer(set("raichu", "aloraichiumz"), &rules).unwrap();
        assert_eq!(
            draft.offer(set("tapukoko", "electriumz"), &rules),
            Err(Rejection::CrystalCap)
        );
    }
}
