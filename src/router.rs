//! Gradient distance-vector router with flooding fallback.
//!
//! Route state is the `(distanceToGateway, nextHop)` pair established by
//! beacon reception, grounded on the teacher's `class_b` orchestration shape
//! (`lorawan/src/class/class_b/mod.rs`) with relay jitter modeled on
//! `US915::get_next_beacon_channel`'s pseudo-random hash.

use crate::config::{MeshConfig, BEACON_REBROADCAST_MAX_MS, BEACON_REBROADCAST_MIN_MS, ROUTE_TIMEOUT_MS};
use crate::wire::Beacon;

const NO_ROUTE_DISTANCE: u8 = 255;
const NO_ROUTE_RSSI: i16 = -127;

/// A beacon queued for relay, with its scheduled send time.
#[derive(Debug, Clone, Copy)]
pub struct PendingBeacon {
    /// The (already hop-adjusted) beacon to transmit.
    pub beacon: Beacon,
    /// The original beacon's source id, carried through unchanged.
    pub source_id: u8,
    /// The relayed frame's TTL (one less than the received frame's).
    pub ttl: u8,
    /// Absolute time, in ms, at which it should be sent.
    pub send_at_ms: u32,
}

/// Event counters intrinsic to routing, per spec.md §4.G.
#[derive(Debug, Clone, Copy, Default)]
pub struct RouterCounters {
    /// Beacons received (from any sender, including self-loopback).
    pub beacons_received: u32,
    /// Beacons sent (gateway periodic emission + relayed rebroadcasts).
    pub beacons_sent: u32,
    /// Times the active route was replaced or refreshed.
    pub route_updates: u32,
    /// Times the active route expired due to `ROUTE_TIMEOUT_MS`.
    pub route_expirations: u32,
}

/// xorshift32 PRNG, seeded per call from `(device_id, tick)` — avoids a
/// `rand` crate dependency for the one place this core needs jitter.
fn xorshift32_jitter(seed: u32) -> u32 {
    let mut x = if seed == 0 { 0x9E3779B9 } else { seed };
    x ^= x << 13;
    x ^= x >> 17;
    x ^= x << 5;
    let span = BEACON_REBROADCAST_MAX_MS - BEACON_REBROADCAST_MIN_MS + 1;
    BEACON_REBROADCAST_MIN_MS + (x % span)
}

/// Gradient distance-vector route state for one node.
pub struct GradientRouter {
    device_id: u8,
    is_gateway: bool,
    use_gradient_routing: bool,
    route_valid: bool,
    distance_to_gateway: u8,
    next_hop: u8,
    gateway_id: u8,
    best_rssi: i16,
    last_seq: u16,
    last_beacon_time_ms: u32,
    pending: Option<PendingBeacon>,
    jitter_tick: u32,
    counters: RouterCounters,
}

impl GradientRouter {
    /// Construct the router for `config`. Gateways start with a permanently
    /// valid zero-distance self-route.
    pub fn init(config: &MeshConfig) -> Self {
        let is_gateway = config.is_gateway();
        Self {
            device_id: config.device_id,
            is_gateway,
            use_gradient_routing: config.use_gradient_routing,
            route_valid: is_gateway,
            distance_to_gateway: if is_gateway { 0 } else { NO_ROUTE_DISTANCE },
            next_hop: if is_gateway { config.device_id } else { 0 },
            gateway_id: config.gateway_id,
            best_rssi: NO_ROUTE_RSSI,
            last_seq: 0,
            last_beacon_time_ms: 0,
            pending: None,
            jitter_tick: 0,
            counters: RouterCounters::default(),
        }
    }

    /// Whether a usable route exists. Also evaluates expiration as a side
    /// effect, per spec.md §4.G contract.
    pub fn has_valid_route(&mut self, now_ms: u32) -> bool {
        self.check_expiration(now_ms);
        if self.is_gateway {
            return true;
        }
        if !self.use_gradient_routing {
            return false;
        }
        self.route_valid
    }

    /// Evaluate whether the active route has timed out, invalidating it if
    /// so. Returns `true` exactly on the call that performs the invalidation.
    pub fn check_expiration(&mut self, now_ms: u32) -> bool {
        if self.is_gateway || !self.route_valid {
            return false;
        }
        if now_ms.wrapping_sub(self.last_beacon_time_ms) > ROUTE_TIMEOUT_MS {
            self.invalidate();
            self.counters.route_expirations += 1;
            true
        } else {
            false
        }
    }

    /// This node's current next hop toward the gateway (self, if gateway).
    pub fn next_hop(&self) -> u8 {
        self.next_hop
    }

    /// This node's current distance to the gateway in hops (255 if unknown).
    pub fn distance_to_gateway(&self) -> u8 {
        self.distance_to_gateway
    }

    /// Invalidate the active route (no-op on a gateway).
    pub fn invalidate(&mut self) {
        if self.is_gateway {
            return;
        }
        self.route_valid = false;
        self.distance_to_gateway = NO_ROUTE_DISTANCE;
        self.best_rssi = NO_ROUTE_RSSI;
    }

    /// Process a received beacon from `sender_id` (the frame's `senderId`,
    /// not necessarily the beacon's origin), heard at `rssi_dbm`. Returns
    /// whether the route was (re)established or refreshed.
    pub fn on_beacon_received(&mut self, beacon: &Beacon, sender_id: u8, rssi_dbm: i16, now_ms: u32) -> bool {
        self.counters.beacons_received += 1;
        if self.is_gateway || sender_id == self.device_id {
            return false;
        }
        let new_dist = beacon.distance_to_gateway.saturating_add(1);

        let should_update = !self.route_valid
            || new_dist < self.distance_to_gateway
            || (new_dist == self.distance_to_gateway && rssi_dbm > self.best_rssi)
            || sender_id == self.next_hop;

        if should_update {
            self.distance_to_gateway = new_dist;
            self.next_hop = sender_id;
            self.gateway_id = beacon.gateway_id;
            self.best_rssi = rssi_dbm;
            self.last_seq = beacon.sequence_number;
            self.last_beacon_time_ms = now_ms;
            self.route_valid = true;
            self.counters.route_updates += 1;
        }
        should_update
    }

    /// Queue a rebroadcast of `beacon` with collision jitter, unless this is
    /// a gateway (gateways never relay) or the beacon has no hops left.
    pub fn schedule_rebroadcast(&mut self, beacon: &Beacon, header_ttl: u8, source_id: u8, now_ms: u32) {
        if self.is_gateway || header_ttl <= 1 || source_id == self.device_id {
            return;
        }
        self.jitter_tick = self.jitter_tick.wrapping_add(1);
        let seed = (self.device_id as u32) ^ self.jitter_tick.wrapping_mul(2654435761);
        let jitter = xorshift32_jitter(seed);

        let mut relay = *beacon;
        relay.distance_to_gateway = self.distance_to_gateway;
        self.pending = Some(PendingBeacon {
            beacon: relay,
            source_id,
            ttl: header_ttl - 1,
            send_at_ms: now_ms + jitter,
        });
    }

    /// Whether a relayed beacon's jitter delay has elapsed as of `now_ms`.
    pub fn pending_beacon_ready(&self, now_ms: u32) -> bool {
        match self.pending {
            Some(p) => now_ms >= p.send_at_ms,
            None => false,
        }
    }

    /// Take the pending relayed beacon, if any, clearing the slot.
    pub fn take_pending_beacon(&mut self) -> Option<PendingBeacon> {
        let taken = self.pending.take();
        if taken.is_some() {
            self.counters.beacons_sent += 1;
        }
        taken
    }

    /// Current event counters.
    pub fn counters(&self) -> RouterCounters {
        self.counters
    }

    /// Record that this node (gateway) emitted a periodic beacon.
    pub fn record_beacon_sent(&mut self) {
        self.counters.beacons_sent += 1;
    }

    /// Reset route state, pending relay, and counters.
    pub fn reset(&mut self) {
        self.route_valid = self.is_gateway;
        self.distance_to_gateway = if self.is_gateway { 0 } else { NO_ROUTE_DISTANCE };
        self.next_hop = if self.is_gateway { self.device_id } else { 0 };
        self.best_rssi = NO_ROUTE_RSSI;
        self.pending = None;
        self.counters = RouterCounters::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GATEWAY_LOGICAL_ADDR;

    fn beacon(dist: u8, gw: u8, seq: u16) -> Beacon {
        Beacon {
            distance_to_gateway: dist,
            gateway_id: gw,
            sequence_number: seq,
            gps_hour: 0,
            gps_minute: 0,
            gps_second: 0,
            gps_valid: false,
        }
    }

    #[test]
    fn gateway_has_permanent_self_route() {
        let cfg = MeshConfig::new(1, 1);
        let mut r = GradientRouter::init(&cfg);
        assert!(r.has_valid_route(0));
        assert_eq!(r.next_hop(), 1);
        assert_eq!(r.distance_to_gateway(), 0);
    }

    #[test]
    fn non_gateway_starts_with_no_route() {
        let cfg = MeshConfig::new(2, 1);
        let mut r = GradientRouter::init(&cfg);
        assert!(!r.has_valid_route(0));
        assert_eq!(r.distance_to_gateway(), NO_ROUTE_DISTANCE);
    }

    #[test]
    fn first_beacon_establishes_route() {
        let cfg = MeshConfig::new(2, 1);
        let mut r = GradientRouter::init(&cfg);
        r.on_beacon_received(&beacon(0, 1, 1), 1, -50, 1_000);
        assert!(r.has_valid_route(1_000));
        assert_eq!(r.next_hop(), 1);
        assert_eq!(r.distance_to_gateway(), 1);
        assert_eq!(r.counters().route_updates, 1);
    }

    #[test]
    fn shorter_distance_replaces_route() {
        let cfg = MeshConfig::new(3, 1);
        let mut r = GradientRouter::init(&cfg);
        r.on_beacon_received(&beacon(2, 1, 1), 5, -40, 0); // dist 3 via 5
        r.on_beacon_received(&beacon(0, 1, 1), 9, -80, 10); // dist 1 via 9, worse RSSI
        assert_eq!(r.next_hop(), 9);
        assert_eq!(r.distance_to_gateway(), 1);
    }

    #[test]
    fn equal_distance_better_rssi_wins() {
        let cfg = MeshConfig::new(3, 1);
        let mut r = GradientRouter::init(&cfg);
        r.on_beacon_received(&beacon(0, 1, 1), 5, -70, 0);
        r.on_beacon_received(&beacon(0, 1, 1), 9, -40, 10);
        assert_eq!(r.next_hop(), 9);
    }

    #[test]
    fn equal_distance_equal_rssi_does_not_update() {
        let cfg = MeshConfig::new(3, 1);
        let mut r = GradientRouter::init(&cfg);
        r.on_beacon_received(&beacon(0, 1, 1), 5, -60, 0);
        r.on_beacon_received(&beacon(0, 1, 1), 9, -60, 10);
        assert_eq!(r.next_hop(), 5);
    }

    #[test]
    fn refresh_from_same_next_hop_always_updates() {
        let cfg = MeshConfig::new(3, 1);
        let mut r = GradientRouter::init(&cfg);
        r.on_beacon_received(&beacon(0, 1, 1), 5, -60, 0);
        // Worse distance and worse RSSI, but same next hop: still a refresh.
        r.on_beacon_received(&beacon(3, 1, 2), 5, -90, 1_000);
        assert_eq!(r.next_hop(), 5);
        assert_eq!(r.distance_to_gateway(), 4);
    }

    #[test]
    fn route_expires_after_timeout() {
        let cfg = MeshConfig::new(2, 1);
        let mut r = GradientRouter::init(&cfg);
        r.on_beacon_received(&beacon(0, 1, 1), 1, -50, 0);
        assert!(!r.has_valid_route(ROUTE_TIMEOUT_MS + 1));
        assert_eq!(r.distance_to_gateway(), NO_ROUTE_DISTANCE);
        assert_eq!(r.counters().route_expirations, 1);
    }

    #[test]
    fn gateway_route_never_expires() {
        let cfg = MeshConfig::new(GATEWAY_LOGICAL_ADDR, GATEWAY_LOGICAL_ADDR);
        let mut r = GradientRouter::init(&cfg);
        assert!(r.has_valid_route(u32::MAX));
    }

    #[test]
    fn gradient_routing_toggle_off_forces_flooding() {
        let mut cfg = MeshConfig::new(2, 1);
        cfg.use_gradient_routing = false;
        let mut r = GradientRouter::init(&cfg);
        r.on_beacon_received(&beacon(0, 1, 1), 1, -50, 0);
        assert!(!r.has_valid_route(0));
    }

    #[test]
    fn schedule_rebroadcast_decrements_ttl_and_stamps_self() {
        let cfg = MeshConfig::new(2, 1);
        let mut r = GradientRouter::init(&cfg);
        r.on_beacon_received(&beacon(0, 1, 1), 1, -50, 0);
        let b = beacon(1, 1, 7);
        r.schedule_rebroadcast(&b, 3, 1, 1_000);
        assert!(r.pending_beacon_ready(1_000 + BEACON_REBROADCAST_MAX_MS));
        let pending = r.take_pending_beacon().unwrap();
        assert_eq!(pending.beacon.distance_to_gateway, 1);
        assert!(pending.send_at_ms >= 1_000 + BEACON_REBROADCAST_MIN_MS);
        assert!(pending.send_at_ms <= 1_000 + BEACON_REBROADCAST_MAX_MS);
    }

    #[test]
    fn schedule_rebroadcast_with_ttl_one_is_ignored() {
        let cfg = MeshConfig::new(2, 1);
        let mut r = GradientRouter::init(&cfg);
        let b = beacon(1, 1, 7);
        r.schedule_rebroadcast(&b, 1, 1, 1_000);
        assert!(!r.pending_beacon_ready(u32::MAX));
    }

    #[test]
    fn gateway_never_schedules_rebroadcast() {
        let cfg = MeshConfig::new(1, 1);
        let mut r = GradientRouter::init(&cfg);
        let b = beacon(1, 1, 7);
        r.schedule_rebroadcast(&b, 5, 2, 0);
        assert!(!r.pending_beacon_ready(u32::MAX));
    }

    #[test]
    fn pending_beacon_is_coalesced_not_queued() {
        let cfg = MeshConfig::new(2, 1);
        let mut r = GradientRouter::init(&cfg);
        let b1 = beacon(1, 1, 1);
        let b2 = beacon(1, 1, 2);
        r.schedule_rebroadcast(&b1, 5, 1, 0);
        r.schedule_rebroadcast(&b2, 5, 1, 0);
        let pending = r.take_pending_beacon().unwrap();
        assert_eq!(pending.beacon.sequence_number, 2);
        assert!(r.take_pending_beacon().is_none());
    }
}
