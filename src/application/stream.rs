//! Change-event hub fanning admin mutations out to connected SSE clients.
//!
//! Fire-and-forget by design: there is no backlog and no delivery guarantee.
//! A client that is not connected at broadcast time never sees the event and
//! is expected to recover with a full re-fetch on reconnect.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use metrics::{counter, gauge};
use tokio::sync::mpsc;
use tracing::debug;

use alexpetro_api_types::{ChangeKind, ChangePayload};

const DEFAULT_CLIENT_CAPACITY: usize = 32;

/// One notification as delivered to a registered client.
#[derive(Debug, Clone)]
pub struct ChangeEvent {
    pub kind: ChangeKind,
    pub payload: ChangePayload,
}

impl ChangeEvent {
    /// SSE event name for this notification.
    pub fn event_name(&self) -> &'static str {
        self.kind.event_name()
    }
}

/// Opaque registry ticket; dropping it does not unregister.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientHandle(u64);

/// Registry of connected streaming clients.
///
/// Constructed once at the composition root and shared via `Arc`; never a
/// module-level static, so tests get fresh state per instance.
pub struct ChangeHub {
    clients: DashMap<u64, mpsc::Sender<ChangeEvent>>,
    next_id: AtomicU64,
    capacity: usize,
}

impl ChangeHub {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CLIENT_CAPACITY)
    }

    /// `capacity` bounds each client's in-flight event buffer. A client that
    /// falls further behind drops events instead of blocking the writer.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            clients: DashMap::new(),
            next_id: AtomicU64::new(1),
            capacity: capacity.max(1),
        }
    }

    /// Add a client and hand back its event receiver.
    pub fn register(&self) -> (ClientHandle, mpsc::Receiver<ChangeEvent>) {
        let (tx, rx) = mpsc::channel(self.capacity);
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.clients.insert(id, tx);
        gauge!("alexpetro_stream_clients").set(self.clients.len() as f64);
        (ClientHandle(id), rx)
    }

    /// Idempotent removal; unknown handles are a no-op.
    pub fn unregister(&self, handle: &ClientHandle) {
        self.clients.remove(&handle.0);
        gauge!("alexpetro_stream_clients").set(self.clients.len() as f64);
    }

    /// Deliver one event to every registered client, best-effort.
    ///
    /// A closed channel removes that client; a full channel skips it for this
    /// event only. Neither outcome surfaces to the caller, which has usually
    /// already committed the store write this event describes.
    pub fn broadcast(&self, kind: ChangeKind, payload: ChangePayload) {
        let event = ChangeEvent { kind, payload };
        counter!("alexpetro_stream_events_total", "kind" => kind.as_str()).increment(1);

        let mut closed = Vec::new();
        for entry in self.clients.iter() {
            match entry.value().try_send(event.clone()) {
                Ok(()) => {}
                Err(mpsc::error::TrySendError::Full(_)) => {
                    counter!("alexpetro_stream_send_failed_total", "reason" => "full")
                        .increment(1);
                    debug!(
                        target = "alexpetro::stream",
                        client = *entry.key(),
                        kind = kind.as_str(),
                        "client buffer full, event dropped for this client"
                    );
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    counter!("alexpetro_stream_send_failed_total", "reason" => "closed")
                        .increment(1);
                    closed.push(*entry.key());
                }
            }
        }

        for id in closed {
            self.clients.remove(&id);
        }
        gauge!("alexpetro_stream_clients").set(self.clients.len() as f64);
    }

    pub fn client_count(&self) -> usize {
        self.clients.len()
    }
}

impl Default for ChangeHub {
    fn default() -> Self {
        Self::new()
    }
}

/// Removes the client from the registry when the SSE response stream is
/// dropped, i.e. on the transport's close signal rather than by polling.
pub struct RegistrationGuard {
    hub: Arc<ChangeHub>,
    handle: ClientHandle,
}

impl RegistrationGuard {
    pub fn new(hub: Arc<ChangeHub>, handle: ClientHandle) -> Self {
        Self { hub, handle }
    }
}

impl Drop for RegistrationGuard {
    fn drop(&mut self) {
        self.hub.unregister(&self.handle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn created(id: i64) -> ChangePayload {
        ChangePayload::Created {
            item: json!({ "id": id }),
        }
    }

    #[tokio::test]
    async fn broadcast_reaches_all_registered_clients() {
        let hub = ChangeHub::new();
        let (_h1, mut rx1) = hub.register();
        let (_h2, mut rx2) = hub.register();

        hub.broadcast(ChangeKind::News, created(5));

        assert_eq!(rx1.recv().await.unwrap().event_name(), "news:update");
        assert_eq!(rx2.recv().await.unwrap().kind, ChangeKind::News);
    }

    #[tokio::test]
    async fn one_bad_client_does_not_affect_the_others() {
        let hub = ChangeHub::new();
        let (_h1, mut rx1) = hub.register();
        let (_h2, rx2) = hub.register();
        let (_h3, mut rx3) = hub.register();

        // Client 2's receive side is gone; its sends fail from now on.
        drop(rx2);

        hub.broadcast(ChangeKind::SharingRates, created(1));

        assert!(rx1.recv().await.is_some());
        assert!(rx3.recv().await.is_some());
        // The dead client was pruned during fan-out.
        assert_eq!(hub.client_count(), 2);
    }

    #[tokio::test]
    async fn slow_client_drops_events_without_blocking() {
        let hub = ChangeHub::with_capacity(1);
        let (_h1, mut rx1) = hub.register();
        let (_h2, mut rx2) = hub.register();

        hub.broadcast(ChangeKind::Projects, created(1));
        // rx2 never drains; its buffer is now full.
        hub.broadcast(ChangeKind::Projects, created(2));

        assert!(rx1.recv().await.is_some());
        // rx1 missed nothing beyond its capacity.
        assert!(rx2.recv().await.is_some());
        assert!(rx2.try_recv().is_err());
        // Both clients stay registered; a full buffer is not a disconnect.
        assert_eq!(hub.client_count(), 2);
    }

    #[tokio::test]
    async fn unregister_is_idempotent() {
        let hub = ChangeHub::new();
        let (handle, _rx) = hub.register();

        hub.unregister(&handle);
        hub.unregister(&handle);
        assert_eq!(hub.client_count(), 0);
    }

    #[tokio::test]
    async fn broadcast_without_subscribers_is_a_no_op() {
        let hub = ChangeHub::new();
        hub.broadcast(ChangeKind::Chairmen, ChangePayload::Deleted { id: 9 });
        assert_eq!(hub.client_count(), 0);
    }

    #[tokio::test]
    async fn guard_unregisters_on_drop() {
        let hub = Arc::new(ChangeHub::new());
        let (handle, _rx) = hub.register();
        let guard = RegistrationGuard::new(hub.clone(), handle);
        assert_eq!(hub.client_count(), 1);
        drop(guard);
        assert_eq!(hub.client_count(), 0);
    }
}
