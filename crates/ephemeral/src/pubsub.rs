// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Channel-keyed pub/sub over [`Event`], best-effort and at-most-once to
//! live subscribers. Durable audit lives in the Notification rows, not here.

use crawl_core::Event;
use parking_lot::Mutex;
use std::collections::HashMap;
use tokio::sync::broadcast;

const CHANNEL_CAPACITY: usize = 256;

/// Reserved channel every event is additionally published to, alongside its
/// own per-entity channel, so a single subsystem-wide subscriber (the
/// Notification Router) can observe the full lifecycle event stream without
/// knowing every job/user id in advance.
pub const ALL_EVENTS_CHANNEL: &str = "lifecycle_events";

/// Channels are created lazily on first subscribe and reused by later
/// publishers; a publish to a channel with no subscribers is simply dropped
/// (broadcast's usual "no receivers" outcome), which is fine here since
/// delivery is best-effort.
#[derive(Default)]
pub struct PubSub {
    channels: Mutex<HashMap<String, broadcast::Sender<Event>>>,
}

impl PubSub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, channel: impl Into<String>) -> broadcast::Receiver<Event> {
        let mut channels = self.channels.lock();
        channels.entry(channel.into()).or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0).subscribe()
    }

    /// Publish to `event.channel()`. Returns the number of live subscribers
    /// that received it (0 if none — not an error).
    pub fn publish(&self, event: Event) -> usize {
        self.publish_to(event.channel(), event)
    }

    /// Publish to an explicit channel name rather than `event.channel()`.
    pub fn publish_to(&self, channel: impl Into<String>, event: Event) -> usize {
        let channel = channel.into();
        let channels = self.channels.lock();
        match channels.get(&channel) {
            Some(sender) => sender.send(event).unwrap_or(0),
            None => 0,
        }
    }
}

#[cfg(test)]
#[path = "pubsub_tests.rs"]
mod tests;
