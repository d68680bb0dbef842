//! Latest-value store shared by every reader and the publisher.
//!
//! ```text
//!   reader tasks ──write_field / write / mark_unavailable──▶ ┌───────────────┐
//!                                                           │ SnapshotStore │
//!   publisher ────────stamp, then snapshot() (full copy)──▶ └───────────────┘
//! ```
//!
//! Each write holds the lock only for the duration of the field update, so a
//! copy taken by the publisher never observes a half-written channel. No
//! cross-field consistency is promised: two channels in one copy may come
//! from different reader cycles.

use core::cell::RefCell;

use chrono::NaiveDateTime;
use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;

use crate::channel::{Channel, Status};

/// One channel's value. Absence is explicit, never a sentinel number.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Reading {
    #[default]
    Unavailable,
    Value(f64),
}

impl Reading {
    pub fn value(self) -> Option<f64> {
        match self {
            Self::Value(v) => Some(v),
            Self::Unavailable => None,
        }
    }

    pub fn is_available(self) -> bool {
        matches!(self, Self::Value(_))
    }
}

impl From<Option<f64>> for Reading {
    fn from(v: Option<f64>) -> Self {
        v.map_or(Self::Unavailable, Self::Value)
    }
}

/// Reading plus the status label derived from it.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ChannelState {
    pub reading: Reading,
    pub status: Option<Status>,
}

/// Point-in-time copy of every channel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Snapshot {
    /// Set by the publisher just before the copy is taken.
    pub timestamp: Option<NaiveDateTime>,
    channels: [ChannelState; Channel::COUNT],
}

impl Default for Snapshot {
    fn default() -> Self {
        Self::new()
    }
}

impl Snapshot {
    /// All channels unavailable, no timestamp.
    pub const fn new() -> Self {
        Self {
            timestamp: None,
            channels: [ChannelState {
                reading: Reading::Unavailable,
                status: None,
            }; Channel::COUNT],
        }
    }

    pub fn get(&self, channel: Channel) -> ChannelState {
        self.channels[channel.index()]
    }

    pub fn reading(&self, channel: Channel) -> Reading {
        self.channels[channel.index()].reading
    }

    pub fn status(&self, channel: Channel) -> Option<Status> {
        self.channels[channel.index()].status
    }

    pub fn set(&mut self, channel: Channel, state: ChannelState) {
        self.channels[channel.index()] = state;
    }

    /// Iterate channels in snapshot order.
    pub fn iter(&self) -> impl Iterator<Item = (Channel, ChannelState)> + '_ {
        Channel::ALL.iter().map(|&ch| (ch, self.get(ch)))
    }

    pub fn available_count(&self) -> usize {
        self.channels
            .iter()
            .filter(|s| s.reading.is_available())
            .count()
    }
}

/// Thread-safe holder of the latest [`Snapshot`].
pub struct SnapshotStore {
    inner: Mutex<CriticalSectionRawMutex, RefCell<Snapshot>>,
}

impl Default for SnapshotStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SnapshotStore {
    pub const fn new() -> Self {
        Self {
            inner: Mutex::new(RefCell::new(Snapshot::new())),
        }
    }

    fn update(&self, f: impl FnOnce(&mut Snapshot)) {
        self.inner.lock(|cell| f(&mut cell.borrow_mut()));
    }

    /// Replace a channel's reading, leaving its status untouched.
    pub fn write_field(&self, channel: Channel, reading: Reading) {
        self.update(|s| s.channels[channel.index()].reading = reading);
    }

    /// Replace a channel's status, leaving its reading untouched.
    pub fn write_status(&self, channel: Channel, status: Option<Status>) {
        self.update(|s| s.channels[channel.index()].status = status);
    }

    /// Replace reading and status together so they never disagree.
    pub fn write(&self, channel: Channel, reading: Reading, status: Option<Status>) {
        self.update(|s| s.set(channel, ChannelState { reading, status }));
    }

    /// Mark channels unavailable and clear their status labels.
    pub fn mark_unavailable(&self, channels: &[Channel]) {
        self.update(|s| {
            for &ch in channels {
                s.set(ch, ChannelState::default());
            }
        });
    }

    pub fn stamp(&self, timestamp: NaiveDateTime) {
        self.update(|s| s.timestamp = Some(timestamp));
    }

    /// Consistent copy of every channel.
    pub fn snapshot(&self) -> Snapshot {
        self.inner.lock(|cell| *cell.borrow())
    }
}
