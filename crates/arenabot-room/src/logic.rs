//! Extension points: the decision engine and the state updater.
//!
//! The match loop never decides moves itself. It keeps the
//! [`MatchState`] current through a [`StateUpdater`] and, whenever the
//! updater reports that an action is required, asks a [`DecisionEngine`]
//! for a choice.

use std::collections::BTreeMap;
use std::sync::Arc;

use arenabot_protocol::{Event, Request};
use tracing::warn;

use crate::engines::{FirstLegal, RandomLegal};
use crate::MatchState;

/// Picks moves.
///
/// Engines are pure with respect to the match: they get an owned
/// snapshot, may mutate it however they like while searching, and return
/// candidate commands best first. Only the first candidate is sent.
///
/// `choose_move` is called on a blocking worker thread, so it may take
/// as long as it needs.
pub trait DecisionEngine: Send + Sync + 'static {
    /// Returns candidate choices for the pending request, best first,
    /// e.g. `["/choose move 1", "/choose switch 3"]`.
    fn choose_move(&self, state: MatchState) -> Vec<String>;

    /// Adjusts the engine for a format's rule changes before a match.
    /// Default: no-op.
    fn apply_format_rules(&self, _format: &str) {}
}

/// Folds protocol events into the match state.
pub trait StateUpdater: Send + Sync + 'static {
    /// Applies the events of one frame. Returns `true` if the bot must
    /// now act.
    fn update(&self, state: &mut MatchState, events: &[Event]) -> bool;
}

// ---------------------------------------------------------------------------
// RequestTracker — the default updater
// ---------------------------------------------------------------------------

/// Tracks requests, turns, and the opponent's visible roster.
///
/// An action is required:
/// - on a `|turn|` line,
/// - on an `|upkeep|` line while the current request forces a switch,
/// - on a frame carrying nothing but a request that forces a switch.
///
/// Never twice for the same request: once a choice went out for an
/// rqid, later triggers are ignored until a new request arrives.
#[derive(Debug, Default, Clone, Copy)]
pub struct RequestTracker;

impl StateUpdater for RequestTracker {
    fn update(&self, state: &mut MatchState, events: &[Event]) -> bool {
        let mut required = false;
        state.observe_players(events);

        for event in events {
            match event {
                Event::Request {
                    payload: Some(payload),
                } => match Request::from_payload(payload) {
                    Ok(request) => state.apply_request(request),
                    Err(e) => warn!(tag = %state.tag, error = %e, "ignoring unreadable request"),
                },
                Event::Turn(turn) => {
                    state.turn = *turn;
                    required = true;
                }
                Event::Upkeep => {
                    if forces_switch(state) {
                        required = true;
                    }
                }
                Event::Switch { position, details } => {
                    state.observe_opponent_switch(position, details);
                }
                Event::Poke { side, details } if *side == state.opponent.id => {
                    state.add_opponent_preview(details);
                }
                Event::Start => state.started = true,
                _ => {}
            }
        }

        if let [Event::Request { payload: Some(_) }] = events {
            if forces_switch(state) {
                required = true;
            }
        }
        required && !state.is_answered()
    }
}

fn forces_switch(state: &MatchState) -> bool {
    state.request.as_ref().is_some_and(Request::requires_switch)
}

// ---------------------------------------------------------------------------
// EngineRegistry
// ---------------------------------------------------------------------------

/// Decision engines by id, resolved once at startup.
#[derive(Clone, Default)]
pub struct EngineRegistry {
    engines: BTreeMap<String, Arc<dyn DecisionEngine>>,
}

impl EngineRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the built-in `first` and `random` engines.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register("first", Arc::new(FirstLegal));
        registry.register("random", Arc::new(RandomLegal));
        registry
    }

    /// Registers `engine` under `id`, replacing any previous one.
    pub fn register(&mut self, id: impl Into<String>, engine: Arc<dyn DecisionEngine>) {
        self.engines.insert(id.into(), engine);
    }

    pub fn get(&self, id: &str) -> Option<Arc<dyn DecisionEngine>> {
        self.engines.get(id).cloned()
    }

    /// Registered ids, sorted.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.engines.keys().map(String::as_str)
    }
}

impl std::fmt::Debug for EngineRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineRegistry")
            .field("engines", &self.engines.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arenabot_protocol::parse_message;

    fn state() -> MatchState {
        let mut state = MatchState::new("battle-gen9ou-1", "gen9ou");
        state.apply_request(
            Request::from_payload(r#"{"side":{"name":"arenabot","id":"p1"},"rqid":1}"#).unwrap(),
        );
        state
    }

    fn update(state: &mut MatchState, frame: &str) -> bool {
        RequestTracker.update(state, &parse_message(frame).events)
    }

    #[test]
    fn test_update_turn_requires_action() {
        let mut state = state();

        let required = update(&mut state, ">battle-gen9ou-1\n|move|p2a: Mew|Psychic|p1a: Snorlax\n|upkeep\n|turn|2");

        assert!(required);
        assert_eq!(state.turn, 2);
    }

    #[test]
    fn test_update_narration_without_turn_needs_nothing() {
        let mut state = state();

        assert!(!update(&mut state, ">battle-gen9ou-1\n|move|p2a: Mew|Psychic|p1a: Snorlax\n|upkeep"));
    }

    #[test]
    fn test_update_forced_switch_on_upkeep() {
        let mut state = state();
        update(
            &mut state,
            ">battle-gen9ou-1\n|request|{\"forceSwitch\":[true],\"side\":{\"id\":\"p1\"},\"rqid\":4}\n|\n|faint|p1a: Snorlax",
        );

        let required = update(&mut state, ">battle-gen9ou-1\n|upkeep");

        assert!(required);
    }

    #[test]
    fn test_update_lone_forced_switch_request_requires_action() {
        let mut state = state();

        let required = update(
            &mut state,
            r#">battle-gen9ou-1
|request|{"forceSwitch":[true],"side":{"id":"p1"},"rqid":4}"#,
        );

        assert!(required);
        assert_eq!(state.rqid, Some(4));
    }

    #[test]
    fn test_update_lone_plain_request_does_not_require_action() {
        let mut state = state();

        let required = update(
            &mut state,
            r#">battle-gen9ou-1
|request|{"active":[{"moves":[]}],"side":{"id":"p1"},"rqid":5}"#,
        );

        assert!(!required);
        assert_eq!(state.rqid, Some(5));
    }

    #[test]
    fn test_update_answered_forced_switch_not_repeated_on_upkeep() {
        let mut state = state();
        let first = update(
            &mut state,
            r#">battle-gen9ou-1
|request|{"forceSwitch":[true],"side":{"id":"p1"},"rqid":4}"#,
        );
        state.mark_answered();

        let again = update(&mut state, ">battle-gen9ou-1\n|faint|p1a: Snorlax\n|upkeep");

        assert!(first);
        assert!(!again);
    }

    #[test]
    fn test_update_tracks_opponent_switches() {
        let mut state = state();

        update(&mut state, ">battle-gen9ou-1\n|switch|p2a: Pikachu|Pikachu, L50|100/100\n|switch|p1a: Mew|Mew|100/100");

        assert_eq!(
            state.opponent.active.as_ref().map(|c| c.species.as_str()),
            Some("Pikachu")
        );
    }

    #[test]
    fn test_update_bad_request_is_ignored() {
        let mut state = state();

        let required = update(&mut state, ">battle-gen9ou-1\n|request|{oops");

        assert!(!required);
        assert_eq!(state.rqid, Some(1));
    }

    #[test]
    fn test_registry_with_builtins() {
        let registry = EngineRegistry::with_builtins();

        assert_eq!(registry.ids().collect::<Vec<_>>(), vec!["first", "random"]);
        assert!(registry.get("first").is_some());
        assert!(registry.get("minimax").is_none());
    }
}
