//! Change notification fanout.
//!
//! After every committed mutation the owning component publishes the *whole*
//! collection it changed. Subscribers (one per connected event-surface
//! client) receive every snapshot in publish order. Publishing never blocks
//! and never fails the mutation that triggered it: with nobody listening the
//! snapshot is simply dropped, and a subscriber that falls behind skips
//! ahead to newer snapshots.

use crate::locks::LockTable;
use crate::records::Record;
use tokio::sync::broadcast;
use tracing::trace;

/// Default number of snapshots buffered per subscriber.
pub const DEFAULT_CAPACITY: usize = 64;

/// A full snapshot of one collection.
#[derive(Debug, Clone, PartialEq)]
pub enum Broadcast {
    RecordsUpdated(Vec<Record>),
    LocksUpdated(LockTable),
}

/// Handle for publishing snapshots and registering subscribers.
///
/// Clones share the same channel.
#[derive(Debug, Clone)]
pub struct Fanout {
    sender: broadcast::Sender<Broadcast>,
}

impl Fanout {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Broadcast> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    pub fn publish_records(&self, records: &[Record]) {
        self.publish(Broadcast::RecordsUpdated(records.to_vec()));
    }

    pub fn publish_locks(&self, table: &LockTable) {
        self.publish(Broadcast::LocksUpdated(table.clone()));
    }

    fn publish(&self, snapshot: Broadcast) {
        if self.sender.send(snapshot).is_err() {
            trace!("no subscribers, snapshot dropped");
        }
    }
}

impl Default for Fanout {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locks::{Lock, Owner};
    use tokio::sync::broadcast::error::TryRecvError;

    #[test]
    fn publish_without_subscribers_is_silent() {
        let fanout = Fanout::default();

        fanout.publish_locks(&LockTable::default());

        assert_eq!(fanout.subscriber_count(), 0);
    }

    #[test]
    fn every_subscriber_gets_every_snapshot_in_order() {
        let fanout = Fanout::default();
        let mut first = fanout.subscribe();
        let mut second = fanout.subscribe();

        let mut table = LockTable::default();
        table.insert(Lock::new("1", Owner::new("a", "A"), 0, 60));
        fanout.publish_records(&[]);
        fanout.publish_locks(&table);

        for rx in [&mut first, &mut second] {
            assert_eq!(rx.try_recv().unwrap(), Broadcast::RecordsUpdated(vec![]));
            assert_eq!(rx.try_recv().unwrap(), Broadcast::LocksUpdated(table.clone()));
            assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
        }
    }

    #[test]
    fn lagging_subscriber_skips_to_newer_snapshots() {
        let fanout = Fanout::new(2);
        let mut rx = fanout.subscribe();

        for _ in 0..5 {
            fanout.publish_records(&[]);
        }

        assert!(matches!(rx.try_recv(), Err(TryRecvError::Lagged(3))));
        assert!(rx.try_recv().is_ok());
    }
}
