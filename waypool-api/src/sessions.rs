use std::collections::HashMap;

use tokio::sync::{mpsc, RwLock};
use tracing::debug;

use waypool_match::{MatchEngine, SearchCriteria, SearchOutcome};
use waypool_shared::{ActiveRide, ServerEvent};

pub type ConnId = u64;

struct Slot {
    criteria: SearchCriteria,
    tx: mpsc::UnboundedSender<ServerEvent>,
}

/// Live search criteria, one slot per connection. A new search replaces the
/// connection's slot wholesale; disconnect clears it.
pub struct SearchSessions {
    inner: RwLock<HashMap<ConnId, Slot>>,
}

pub fn outcome_event(outcome: SearchOutcome) -> ServerEvent {
    match outcome {
        SearchOutcome::Matches(matches) => ServerEvent::SearchResults { matches },
        SearchOutcome::NoneYet => ServerEvent::SearchNoneYet,
    }
}

impl SearchSessions {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(HashMap::new()),
        }
    }

    pub async fn set(
        &self,
        conn: ConnId,
        criteria: SearchCriteria,
        tx: mpsc::UnboundedSender<ServerEvent>,
    ) {
        self.inner.write().await.insert(conn, Slot { criteria, tx });
    }

    pub async fn clear(&self, conn: ConnId) {
        self.inner.write().await.remove(&conn);
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    /// Re-run matching for every live searcher against a fresh registry
    /// snapshot and push each connection its own result set.
    pub async fn rerun(&self, engine: &MatchEngine, snapshot: &[ActiveRide]) {
        let sessions = self.inner.read().await;
        if sessions.is_empty() {
            return;
        }
        debug!(searchers = sessions.len(), "re-running matches");
        for slot in sessions.values() {
            let outcome = engine.find_matches(&slot.criteria, snapshot);
            // A dropped receiver means the connection is gone; its slot is
            // cleared on disconnect.
            let _ = slot.tx.send(outcome_event(outcome));
        }
    }
}

impl Default for SearchSessions {
    fn default() -> Self {
        Self::new()
    }
}
