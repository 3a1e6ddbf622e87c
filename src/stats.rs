//! Pipeline-wide event counters, surfaced by the `mesh stats` CLI command.

/// Saturating event counters accumulated by [`crate::pipeline::MeshCore`].
#[derive(Debug, Clone, Copy, Default)]
pub struct MeshStats {
    /// Frames dropped as already-seen `(sourceId, messageId)` pairs.
    pub duplicates_dropped: u32,
    /// Frames dropped for `ttl <= 1`.
    pub ttl_expired: u32,
    /// Forwarding decisions that wanted to enqueue into a full transmit queue.
    pub queue_overflows: u32,
    /// Frames forwarded via a known gradient route.
    pub unicast_forwards: u32,
    /// Frames forwarded with no valid route (flooding fallback).
    pub flooding_fallbacks: u32,
    /// Times a non-gateway's active route expired.
    pub route_expirations: u32,
    /// Beacons received.
    pub beacons_received: u32,
    /// Beacons sent (periodic gateway emission plus relays).
    pub beacons_sent: u32,
    /// Times the active route was established or refreshed.
    pub route_updates: u32,
    /// Frames whose message type was not one of the four known kinds.
    pub unknown_message_types: u32,
    /// Frames decoded from a header whose `version` didn't match ours.
    pub version_mismatches: u32,
    /// Times a neighbor was dropped because the neighbor table was full.
    pub neighbor_table_full: u32,
}

impl MeshStats {
    /// A zeroed counter block.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset every counter to zero.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
