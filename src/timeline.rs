//! Append-only conversation timeline.
//!
//! The timeline is shared between the session (the only writer) and the
//! presentation layer. Appending is the only mutation primitive; insertion
//! order is display order.

use std::sync::{Arc, RwLock};
use std::time::{SystemTime, UNIX_EPOCH};

use tokio::sync::watch;

/// One immutable conversation record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// Label of the originating actor.
    pub sender: String,
    /// Display payload, already resolved to a string.
    pub text: String,
    /// Unix-epoch milliseconds of local creation.
    pub timestamp_ms: u64,
}

impl Entry {
    /// Creates an entry stamped with the current local time.
    pub fn new(sender: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            sender: sender.into(),
            text: text.into(),
            timestamp_ms: now_ms(),
        }
    }
}

/// Ordered conversation log with change notification.
///
/// The handle is cheap to clone; all clones observe the same entries. Each
/// append bumps a watch revision that subscribers await to re-render. There
/// is no removal, reordering, or in-place update.
#[derive(Debug, Clone)]
pub struct Timeline {
    inner: Arc<TimelineInner>,
}

#[derive(Debug)]
struct TimelineInner {
    entries: RwLock<Vec<Entry>>,
    revision: watch::Sender<u64>,
}

impl Timeline {
    /// Creates an empty timeline at revision zero.
    pub fn new() -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            inner: Arc::new(TimelineInner {
                entries: RwLock::new(Vec::new()),
                revision,
            }),
        }
    }

    /// Appends an entry at the end and notifies subscribers.
    pub fn append(&self, entry: Entry) {
        if let Ok(mut entries) = self.inner.entries.write() {
            entries.push(entry);
        }
        self.inner.revision.send_modify(|revision| *revision += 1);
    }

    /// Snapshot of all entries in display order.
    pub fn entries(&self) -> Vec<Entry> {
        self.inner
            .entries
            .read()
            .map(|entries| entries.clone())
            .unwrap_or_default()
    }

    /// Number of entries appended so far.
    pub fn len(&self) -> usize {
        self.inner
            .entries
            .read()
            .map(|entries| entries.len())
            .unwrap_or(0)
    }

    /// True when nothing has been appended yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Subscribes to append notifications.
    ///
    /// The watch value is a revision counter that increases with every
    /// append; read the current snapshot through [`Timeline::entries`].
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.inner.revision.subscribe()
    }
}

impl Default for Timeline {
    fn default() -> Self {
        Self::new()
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::{Entry, Timeline};

    #[test]
    fn appends_preserve_insertion_order() {
        let timeline = Timeline::new();
        timeline.append(Entry::new("user", "$ kubectl get pods"));
        timeline.append(Entry::new("agent", "3 pods running"));
        timeline.append(Entry::new("system", "done"));

        let entries = timeline.entries();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].sender, "user");
        assert_eq!(entries[1].sender, "agent");
        assert_eq!(entries[2].sender, "system");
    }

    #[test]
    fn cloned_handles_observe_the_same_entries() {
        let timeline = Timeline::new();
        let reader = timeline.clone();
        assert!(reader.is_empty());

        timeline.append(Entry::new("agent", "hello"));
        assert_eq!(reader.len(), 1);
        assert_eq!(reader.entries()[0].text, "hello");
    }

    #[test]
    fn each_append_bumps_the_revision() {
        let timeline = Timeline::new();
        let mut revision = timeline.subscribe();
        assert_eq!(*revision.borrow_and_update(), 0);

        timeline.append(Entry::new("agent", "one"));
        assert!(revision.has_changed().expect("timeline alive"));
        assert_eq!(*revision.borrow_and_update(), 1);

        timeline.append(Entry::new("agent", "two"));
        timeline.append(Entry::new("agent", "three"));
        assert_eq!(*revision.borrow_and_update(), 3);
    }

    #[test]
    fn entries_stamp_a_local_timestamp() {
        let entry = Entry::new("user", "$ uptime");
        assert!(entry.timestamp_ms > 0);
    }
}
