//! Built-in decision engines.
//!
//! Both engines read only the typed move request. They exist so the bot
//! can play out of the box; a real engine plugs in through the
//! [`EngineRegistry`](crate::EngineRegistry).

use arenabot_protocol::Request;
use rand::seq::SliceRandom;

use crate::{DecisionEngine, MatchState};

const DEFAULT_CHOICE: &str = "/choose default";

/// Always plays the first legal option.
#[derive(Debug, Default, Clone, Copy)]
pub struct FirstLegal;

impl DecisionEngine for FirstLegal {
    fn choose_move(&self, state: MatchState) -> Vec<String> {
        legal_options(&state)
    }
}

/// Plays a uniformly random legal option.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomLegal;

impl DecisionEngine for RandomLegal {
    fn choose_move(&self, state: MatchState) -> Vec<String> {
        let mut options = legal_options(&state);
        options.shuffle(&mut rand::rng());
        options
    }
}

/// Every legal choice for the pending request, moves before switches.
///
/// Falls back to `/choose default` when the request gives nothing to
/// choose from or controls more than one active slot.
pub fn legal_options(state: &MatchState) -> Vec<String> {
    let Some(request) = &state.request else {
        return vec![DEFAULT_CHOICE.to_string()];
    };

    let options = if request.team_preview || state.team_preview {
        (1..=request.side.pokemon.len())
            .map(|slot| format!("/choose switch {slot}"))
            .collect()
    } else if request.requires_switch() {
        switch_options(request)
    } else if request.active.len() == 1 {
        let slot = &request.active[0];
        let moves = slot
            .moves
            .iter()
            .enumerate()
            .filter(|(_, m)| !m.is_disabled())
            .map(|(i, _)| format!("/choose move {}", i + 1));
        let switches = if slot.trapped {
            Vec::new()
        } else {
            switch_options(request)
        };
        moves.chain(switches).collect()
    } else {
        Vec::new()
    };

    if options.is_empty() {
        vec![DEFAULT_CHOICE.to_string()]
    } else {
        options
    }
}

fn switch_options(request: &Request) -> Vec<String> {
    request
        .side
        .pokemon
        .iter()
        .enumerate()
        .filter(|(_, member)| !member.active && !member.is_fainted())
        .map(|(i, _)| format!("/choose switch {}", i + 1))
        .collect()
}
