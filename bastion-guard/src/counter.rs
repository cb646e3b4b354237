//! Tumbling-window action counter shared by both detectors.
//!
//! A window opens on the first action for a key and closes a fixed duration
//! later; later actions increment the count without moving the deadline.
//! Expiry is checked lazily on every access, and [`WindowCounter::sweep`]
//! (or the task started by [`WindowCounter::spawn_sweeper`]) drops windows
//! nobody touched again, so an absent key and a zero count are the same state.

use std::fmt;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::debug;

use crate::category::Category;

/// Counter key for guild moderation: one window per actor and category.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ActionKey {
    pub guild_id: u64,
    pub actor_id: u64,
    pub category: Category,
}

impl ActionKey {
    pub fn new(guild_id: u64, actor_id: u64, category: Category) -> Self {
        Self {
            guild_id,
            actor_id,
            category,
        }
    }
}

#[derive(Debug)]
struct Window {
    count: u32,
    expires_at: Instant,
}

pub struct WindowCounter<K> {
    window: Duration,
    slots: DashMap<K, Window>,
}

impl<K> WindowCounter<K>
where
    K: Eq + Hash + Clone,
{
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            slots: DashMap::new(),
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Record one action and return the post-increment count.
    pub fn increment(&self, key: K) -> u32 {
        self.record(key, None).0
    }

    /// Record one action and report whether the count now exceeds `limit`.
    ///
    /// Increment and comparison run under the map's shard lock, and a
    /// breaching window is removed in the same step, so two concurrent
    /// handlers can never both observe the breach for one window.
    pub fn increment_past(&self, key: K, limit: u32) -> Breach {
        let (count, breached) = self.record(key, Some(limit));
        if breached {
            Breach::Exceeded(count)
        } else {
            Breach::Within(count)
        }
    }

    fn record(&self, key: K, limit: Option<u32>) -> (u32, bool) {
        let now = Instant::now();
        let exceeds = |count: u32| limit.is_some_and(|limit| count > limit);

        match self.slots.entry(key) {
            Entry::Occupied(mut occupied) => {
                let slot = occupied.get_mut();
                if slot.expires_at <= now {
                    *slot = Window {
                        count: 1,
                        expires_at: now + self.window,
                    };
                } else {
                    slot.count = slot.count.saturating_add(1);
                }

                let count = slot.count;
                if exceeds(count) {
                    occupied.remove();
                    return (count, true);
                }
                (count, false)
            }
            Entry::Vacant(vacant) => {
                if exceeds(1) {
                    return (1, true);
                }
                vacant.insert(Window {
                    count: 1,
                    expires_at: now + self.window,
                });
                (1, false)
            }
        }
    }

    /// Current count for `key`; zero once its window has closed.
    pub fn count(&self, key: &K) -> u32 {
        let now = Instant::now();
        self.slots
            .get(key)
            .filter(|slot| slot.expires_at > now)
            .map_or(0, |slot| slot.count)
    }

    /// Drop every closed window. Returns how many were removed.
    pub fn sweep(&self) -> usize {
        let now = Instant::now();
        let before = self.slots.len();
        self.slots.retain(|_, slot| slot.expires_at > now);
        before.saturating_sub(self.slots.len())
    }

    /// Number of stored windows, including closed ones not yet swept.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

impl<K> WindowCounter<K>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
{
    /// Periodically sweep closed windows until the counter is dropped.
    pub fn spawn_sweeper(self: &Arc<Self>, every: Duration) -> JoinHandle<()> {
        let counter = Arc::downgrade(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                let Some(counter) = counter.upgrade() else {
                    break;
                };

                let removed = counter.sweep();
                if removed > 0 {
                    debug!(removed, remaining = counter.len(), "swept closed counter windows");
                }
            }
        })
    }
}

impl<K> fmt::Debug for WindowCounter<K>
where
    K: Eq + Hash,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WindowCounter")
            .field("window", &self.window)
            .field("windows", &self.slots.len())
            .finish()
    }
}

/// Outcome of [`WindowCounter::increment_past`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Breach {
    Within(u32),
    Exceeded(u32),
}

impl Breach {
    pub fn count(self) -> u32 {
        match self {
            Breach::Within(count) | Breach::Exceeded(count) => count,
        }
    }

    pub fn is_exceeded(self) -> bool {
        matches!(self, Breach::Exceeded(_))
    }
}
