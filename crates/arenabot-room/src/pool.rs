//! Bounded worker pool for decision engines.

use std::sync::Arc;

use tokio::sync::Semaphore;
use tracing::debug;

use crate::{DecisionEngine, MatchState, RoomError};

/// Runs engine computations on Tokio's blocking threads, at most
/// `workers` at a time.
///
/// The match loop awaits its one outstanding decision before reading the
/// next frame, so in practice a single permit is in use per match.
#[derive(Debug, Clone)]
pub struct EnginePool {
    permits: Arc<Semaphore>,
}

impl EnginePool {
    pub fn new(workers: usize) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(workers.max(1))),
        }
    }

    /// Hands `snapshot` to `engine` on a worker and waits for its choices.
    pub async fn decide(
        &self,
        engine: Arc<dyn DecisionEngine>,
        snapshot: MatchState,
    ) -> Result<Vec<String>, RoomError> {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|e| RoomError::Engine(e.to_string()))?;

        let turn = snapshot.turn;
        let choices = tokio::task::spawn_blocking(move || engine.choose_move(snapshot))
            .await
            .map_err(|e| RoomError::Engine(format!("engine task failed: {e}")))?;

        debug!(turn, candidates = choices.len(), "engine decided");
        Ok(choices)
    }
}

impl Default for EnginePool {
    fn default() -> Self {
        Self::new(2)
    }
}
