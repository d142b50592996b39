//! Sequence-numbered tracker change events.
//!
//! Writers publish through [`TrackerFeed`]; each websocket subscriber receives a snapshot and
//! then applies events to a [`TrackerView`] instead of re-reading the table.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::constants::TRACKER_FEED_CAPACITY;
use crate::db::prelude::{PostingTracker, UserId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "tracker", rename_all = "lowercase")]
pub enum TrackerEvent {
    Inserted(PostingTracker),
    Updated(PostingTracker),
}

impl TrackerEvent {
    pub fn tracker(&self) -> &PostingTracker {
        match self {
            TrackerEvent::Inserted(t) | TrackerEvent::Updated(t) => t,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SequencedEvent {
    pub seq: u64,
    #[serde(flatten)]
    pub event: TrackerEvent,
}

impl SequencedEvent {
    pub fn belongs_to(&self, user_id: &UserId) -> bool {
        self.event.tracker().user_id.as_ref() == Some(user_id)
    }
}

/// Messages written to a feed socket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum FeedMessage {
    Snapshot {
        seq: u64,
        trackers: Vec<PostingTracker>,
    },
    Event(SequencedEvent),
}

#[derive(Debug, Clone)]
pub struct TrackerFeed {
    tx: broadcast::Sender<SequencedEvent>,
    seq: Arc<AtomicU64>,
}

impl Default for TrackerFeed {
    fn default() -> Self {
        Self::new(TRACKER_FEED_CAPACITY)
    }
}

impl TrackerFeed {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self {
            tx,
            seq: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Last sequence number handed out.
    pub fn current_seq(&self) -> u64 {
        self.seq.load(Ordering::SeqCst)
    }

    pub fn publish(&self, event: TrackerEvent) -> u64 {
        let seq = self.seq.fetch_add(1, Ordering::SeqCst) + 1;

        // no subscribers is not an error
        if self.tx.send(SequencedEvent { seq, event }).is_err() {
            tracing::trace!(seq, "tracker event dropped, no subscribers");
        }

        seq
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SequencedEvent> {
        self.tx.subscribe()
    }
}

/// Client-side mirror of a user's trackers, kept current from the feed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrackerView {
    last_seq: u64,
    trackers: Vec<PostingTracker>,
}

impl TrackerView {
    pub fn from_snapshot(seq: u64, trackers: Vec<PostingTracker>) -> Self {
        Self {
            last_seq: seq,
            trackers,
        }
    }

    pub fn last_seq(&self) -> u64 {
        self.last_seq
    }

    pub fn trackers(&self) -> &[PostingTracker] {
        &self.trackers
    }

    /// Applies `event` unless it is at or behind the view's sequence, or it would move a known
    /// tracker's status backwards. Returns whether the view changed.
    ///
    /// Sequence numbers are assigned after the write commits, so racing writers may publish out
    /// of write order.
    pub fn apply(&mut self, event: &SequencedEvent) -> bool {
        if event.seq <= self.last_seq {
            return false;
        }
        self.last_seq = event.seq;

        let incoming = event.event.tracker();
        match self.trackers.iter_mut().find(|t| t.id == incoming.id) {
            Some(existing) => {
                let forward = existing.status == incoming.status
                    || existing.status.can_transition_to(incoming.status);
                if !forward {
                    tracing::debug!(
                        tracker = %incoming.id,
                        from = ?existing.status,
                        to = ?incoming.status,
                        "dropping out-of-order tracker event"
                    );
                    return false;
                }
                *existing = incoming.clone();
            }
            None => self.trackers.push(incoming.clone()),
        }

        true
    }
}
