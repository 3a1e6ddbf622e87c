//! Mesh node configuration
//!
//! Collects the compile-time constants `spec.md` §6 treats as inputs into a
//! single value constructed once by the embedding firmware, the way the
//! teacher crate's `DeviceConfig` bundles activation parameters.

/// Reserved broadcast destination address.
pub const BROADCAST_ID: u8 = 0xFF;

/// Reserved gateway logical address (distinct from a node's `deviceId`).
pub const GATEWAY_LOGICAL_ADDR: u8 = 0x00;

/// Wire protocol version implemented by this crate.
pub const WIRE_VERSION: u8 = 1;

/// Maximum number of nodes in a deployment.
pub const MESH_MAX_NODES: u8 = 5;

/// Maximum hop count before a route is considered unreachable.
pub const MESH_MAX_HOPS: u8 = 8;

/// Default TTL stamped on an originated `FULL_REPORT`.
pub const MESH_DEFAULT_TTL: u8 = 3;

/// Gateway beacon emission interval, in milliseconds.
pub const BEACON_INTERVAL_MS: u32 = 30_000;

/// Non-gateway route validity window since the last accepted beacon.
pub const ROUTE_TIMEOUT_MS: u32 = 60_000;

/// Minimum beacon-rebroadcast jitter, in milliseconds.
pub const BEACON_REBROADCAST_MIN_MS: u32 = 100;

/// Maximum beacon-rebroadcast jitter, in milliseconds.
pub const BEACON_REBROADCAST_MAX_MS: u32 = 500;

/// Duplicate-suppression retention window, in milliseconds.
pub const DUPLICATE_WINDOW_MS: u32 = 120_000;

/// Neighbor-table entry expiry, in milliseconds, since last heard.
pub const NEIGHBOR_TIMEOUT_MS: u32 = 180_000;

/// Transmit queue capacity (entries).
pub const TX_QUEUE_SIZE: usize = 8;

/// Maximum bytes in a single queued/transmitted frame.
pub const MAX_MESSAGE_SIZE: usize = 64;

/// Duplicate cache capacity (entries).
pub const SEEN_CACHE_SIZE: usize = 32;

/// Neighbor table capacity (entries).
pub const NEIGHBOR_TABLE_SIZE: usize = 10;

/// Network-time sample expiry, in milliseconds.
pub const NETWORK_TIME_MAX_AGE_MS: u32 = 120_000;

/// TDMA slot duration, in seconds.
pub const SLOT_DURATION_S: u8 = 12;

/// TDMA active transmit window within a slot, in seconds.
pub const TX_WINDOW_S: u8 = 10;

/// Default offset of the TX instant from slot start, in seconds.
pub const DEFAULT_TX_OFFSET_S: u8 = 6;

/// Per-slot transmit queue drain cap (frames).
pub const MAX_DRAIN_PER_SLOT: u8 = 5;

/// Seconds before slot end at which the drain loop must stop.
pub const SLOT_END_GUARD_S: u8 = 1;

/// Gap inserted between successive sends while draining the transmit queue,
/// in milliseconds.
pub const INTER_FRAME_DELAY_MS: u32 = 50;

/// Per-node mesh configuration, constructed once and handed to [`crate::pipeline::MeshCore`].
#[derive(Debug, Clone, Copy)]
pub struct MeshConfig {
    /// This node's 8-bit device id, in `[1,254]`.
    pub device_id: u8,
    /// The deployment's designated gateway device id.
    pub gateway_id: u8,
    /// UTC offset in hours, informational only (the core operates on UTC seconds).
    pub utc_offset_hours: i8,
    /// Whether gradient routing is enabled; `false` forces flooding fallback
    /// for all forwarding decisions on non-gateway nodes.
    pub use_gradient_routing: bool,
}

impl MeshConfig {
    /// Create a new configuration with gradient routing enabled.
    pub fn new(device_id: u8, gateway_id: u8) -> Self {
        Self {
            device_id,
            gateway_id,
            utc_offset_hours: 0,
            use_gradient_routing: true,
        }
    }

    /// Whether this node is the deployment's gateway.
    pub fn is_gateway(&self) -> bool {
        self.device_id == self.gateway_id
    }
}
