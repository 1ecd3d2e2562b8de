//! TTL-bounded in-memory store for in-progress auth flows.

use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use uuid::Uuid;

use super::Flow;

struct FlowEntry {
    flow: Flow,
    created_at: Instant,
}

/// Keeps flows between requests; abandoned flows age out on access so the map
/// cannot grow unbounded.
pub struct FlowStore {
    flows: Mutex<HashMap<Uuid, FlowEntry>>,
    ttl: Duration,
}

impl FlowStore {
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            flows: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    /// Store a flow and hand back its id.
    pub async fn insert(&self, flow: Flow) -> Uuid {
        let flow_id = Uuid::new_v4();
        let mut flows = self.flows.lock().await;
        flows.retain(|_, entry| entry.created_at.elapsed() < self.ttl);
        flows.insert(
            flow_id,
            FlowEntry {
                flow,
                created_at: Instant::now(),
            },
        );
        flow_id
    }

    /// Remove and return a flow; expired flows are treated as absent.
    pub async fn take(&self, flow_id: Uuid) -> Option<Flow> {
        let mut flows = self.flows.lock().await;
        let entry = flows.remove(&flow_id)?;
        if entry.created_at.elapsed() < self.ttl {
            Some(entry.flow)
        } else {
            None
        }
    }

    /// Put a flow back under its id; activity extends its lifetime.
    pub async fn put(&self, flow_id: Uuid, flow: Flow) {
        let mut flows = self.flows.lock().await;
        flows.insert(
            flow_id,
            FlowEntry {
                flow,
                created_at: Instant::now(),
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flow::FlowKind;

    #[tokio::test]
    async fn insert_then_take_returns_flow() {
        let store = FlowStore::new(Duration::from_secs(60));
        let flow_id = store.insert(Flow::new(FlowKind::Login)).await;

        let flow = store.take(flow_id).await;
        assert_eq!(flow.map(|f| f.kind()), Some(FlowKind::Login));

        // take removes the entry
        assert!(store.take(flow_id).await.is_none());
    }

    #[tokio::test]
    async fn expired_flows_are_absent() {
        let store = FlowStore::new(Duration::ZERO);
        let flow_id = store.insert(Flow::new(FlowKind::Signup)).await;
        assert!(store.take(flow_id).await.is_none());
    }

    #[tokio::test]
    async fn put_reinserts_under_same_id() {
        let store = FlowStore::new(Duration::from_secs(60));
        let flow_id = store.insert(Flow::new(FlowKind::PasswordReset)).await;

        let flow = store.take(flow_id).await.unwrap();
        store.put(flow_id, flow).await;

        assert!(store.take(flow_id).await.is_some());
    }
}
