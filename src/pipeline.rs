//! `MeshCore`: the packet-pipeline orchestrator bundling every owned
//! subsystem, grounded on the teacher's `LoRaWANDevice` (`lorawan/src/device.rs`)
//! which bundles its MAC state and device classes behind one value built once
//! in `main`.

use crate::config::{
    MeshConfig, BEACON_INTERVAL_MS, BROADCAST_ID, INTER_FRAME_DELAY_MS, MAX_DRAIN_PER_SLOT,
    MESH_DEFAULT_TTL, SLOT_END_GUARD_S, WIRE_VERSION,
};
use crate::dup_cache::DuplicateCache;
use crate::hal::{Gps, Radio, Sensors, Sink};
use crate::net_time::NetworkTimeStore;
use crate::neighbor::NeighborTable;
use crate::router::GradientRouter;
use crate::scheduler::TdmaScheduler;
use crate::stats::MeshStats;
use crate::txqueue::TransmitQueue;
use crate::wire::{
    self, decode_beacon, decode_full_report, encode_beacon, encode_full_report, Beacon, Flags,
    FullReport, MessageType, MeshHeader, STATUS_GPS_VALID, STATUS_LOW_BATTERY, STATUS_SENSORS_OK,
    TIME_SRC_GPS, TIME_SRC_NET, TIME_SRC_NONE,
};
use crate::{mesh_debug, mesh_warn};

/// Battery percentage at or below which `STATUS_LOW_BATTERY` is set.
const LOW_BATTERY_PCT: u8 = 15;

/// The orchestrator: owns every mesh subsystem and the four external
/// collaborators, and exposes the tick entrypoints spec.md §4.H names.
pub struct MeshCore<R, G, S, K> {
    config: MeshConfig,
    radio: R,
    gps: G,
    sensors: S,
    sink: K,

    scheduler: TdmaScheduler,
    router: GradientRouter,
    dup_cache: DuplicateCache,
    neighbor: NeighborTable,
    tx_queue: TransmitQueue,
    net_time: NetworkTimeStore,
    stats: MeshStats,

    tx_count: u16,
    rx_count: u16,
    next_data_seq: u8,
    next_beacon_seq: u16,
    last_beacon_sent_ms: u32,
    battery_pct: u8,
}

impl<R: Radio, G: Gps, S: Sensors, K: Sink> MeshCore<R, G, S, K> {
    /// Construct the core. Subsystems start in their fresh-boot state.
    pub fn new(config: MeshConfig, radio: R, gps: G, sensors: S, sink: K) -> Self {
        let scheduler = TdmaScheduler::init(config.device_id);
        let router = GradientRouter::init(&config);
        Self {
            config,
            radio,
            gps,
            sensors,
            sink,
            scheduler,
            router,
            dup_cache: DuplicateCache::new(),
            neighbor: NeighborTable::new(),
            tx_queue: TransmitQueue::new(),
            net_time: NetworkTimeStore::new(),
            stats: MeshStats::new(),
            tx_count: 0,
            rx_count: 0,
            next_data_seq: 0,
            next_beacon_seq: 0,
            last_beacon_sent_ms: 0,
            battery_pct: 100,
        }
    }

    /// Current counters, for `mesh stats`.
    pub fn stats(&self) -> MeshStats {
        self.stats
    }

    /// Current neighbor table, for `mesh status`.
    pub fn neighbors(&self) -> &NeighborTable {
        &self.neighbor
    }

    /// Current transmit queue depth, for `mesh status`.
    pub fn queue_depth(&self) -> u8 {
        self.tx_queue.depth()
    }

    /// Inject a battery-percentage reading used for own-report status flags.
    pub fn set_battery_pct(&mut self, pct: u8) {
        self.battery_pct = pct;
    }

    /// Record a manually set network time (the `SETTIME` CLI command).
    pub fn set_manual_time(&mut self, h: u8, m: u8, s: u8, now_ms: u32) {
        self.net_time.set_manual(h, m, s, now_ms);
    }

    /// Clear every cache, table, queue, and counter; preserve configuration
    /// and route/scheduler wiring (the `mesh reset` CLI command).
    pub fn reset(&mut self) {
        self.dup_cache.clear();
        self.neighbor.clear();
        self.tx_queue.clear();
        self.stats.reset();
        self.router.reset();
        self.net_time.invalidate();
    }

    /// Inject a synthetic `FULL_REPORT` as if locally originated (the
    /// `mesh test` CLI command): stamps source/sender as self, enqueues
    /// directly rather than transmitting immediately.
    pub fn inject_test_report(&mut self, dest_id: u8, ttl: u8, report: FullReport, now_ms: u32) {
        let header = MeshHeader {
            version: WIRE_VERSION,
            message_type: MessageType::FullReport,
            source_id: self.config.device_id,
            dest_id,
            sender_id: self.config.device_id,
            message_id: self.next_data_seq(),
            ttl,
            flags: Flags::default(),
        };
        let frame = encode_full_report(&header, &report);
        let _ = self.tx_queue.enqueue(&frame, now_ms);
    }

    fn next_data_seq(&mut self) -> u8 {
        let seq = self.next_data_seq;
        self.next_data_seq = self.next_data_seq.wrapping_add(1);
        seq
    }

    /// Drain every frame currently waiting at the radio.
    pub fn on_rx_tick(&mut self, now_ms: u32) {
        while self.radio.packet_available() {
            let Some(packet) = self.radio.poll_rx() else {
                break;
            };
            self.rx_count = self.rx_count.saturating_add(1);
            self.process_frame(packet.as_slice(), packet.rssi, packet.snr_x10, now_ms);
        }
        if self.router.pending_beacon_ready(now_ms) {
            self.transmit_pending_relay();
        }
    }

    fn process_frame(&mut self, bytes: &[u8], rssi: i16, snr: i16, now_ms: u32) {
        match wire::classify(bytes) {
            MessageType::Beacon => self.process_beacon(bytes, rssi, now_ms),
            MessageType::FullReport => self.process_full_report(bytes, rssi, snr, now_ms),
            MessageType::RoutedData | MessageType::Ack | MessageType::Unknown(_) => {
                self.stats.unknown_message_types += 1;
            }
        }
    }

    fn process_beacon(&mut self, bytes: &[u8], rssi: i16, now_ms: u32) {
        let Ok((header, beacon)) = decode_beacon(bytes) else {
            self.stats.unknown_message_types += 1;
            return;
        };
        if wire::check_version(&header).is_err() {
            self.stats.version_mismatches += 1;
            mesh_warn!("beacon from {} has wire version {}, expected {}", header.source_id, header.version, WIRE_VERSION);
        }
        if header.source_id == self.config.device_id {
            return;
        }
        self.stats.beacons_received += 1;
        if self.router.on_beacon_received(&beacon, header.sender_id, rssi, now_ms) {
            self.stats.route_updates += 1;
        }
        if beacon.gps_valid {
            let hop_count = beacon.distance_to_gateway.saturating_add(1);
            self.net_time
                .update(beacon.gps_hour, beacon.gps_minute, beacon.gps_second, header.sender_id, hop_count, now_ms);
        }
        self.router.schedule_rebroadcast(&beacon, header.ttl, header.source_id, now_ms);
        if self.neighbor.update(header.sender_id, rssi, now_ms) {
            self.stats.neighbor_table_full += 1;
        }
    }

    fn process_full_report(&mut self, bytes: &[u8], rssi: i16, snr: i16, now_ms: u32) {
        let Ok((header, report)) = decode_full_report(bytes) else {
            self.stats.unknown_message_types += 1;
            return;
        };
        if wire::check_version(&header).is_err() {
            self.stats.version_mismatches += 1;
            mesh_warn!("report from {} has wire version {}, expected {}", header.source_id, header.version, WIRE_VERSION);
        }
        if header.source_id == self.config.device_id {
            return;
        }
        if self.dup_cache.is_duplicate(header.source_id, header.message_id, now_ms) {
            self.stats.duplicates_dropped += 1;
            return;
        }
        self.dup_cache.mark_seen(header.source_id, header.message_id, now_ms);
        if self.neighbor.update(header.sender_id, rssi, now_ms) {
            self.stats.neighbor_table_full += 1;
        }

        if self.config.is_gateway() {
            self.sink.on_report(header.source_id, &report, rssi, snr);
        }

        if self.should_forward(&header, now_ms) {
            let mut fwd = header;
            fwd.ttl -= 1;
            fwd.sender_id = self.config.device_id;
            fwd.flags = fwd.flags.with_forwarded();
            let frame = encode_full_report(&fwd, &report);
            if !self.tx_queue.enqueue(&frame, now_ms) {
                self.stats.queue_overflows += 1;
                mesh_warn!("transmit queue full, dropping forward from source {}", header.source_id);
            }
        }
    }

    fn should_forward(&mut self, header: &MeshHeader, now_ms: u32) -> bool {
        if header.ttl <= 1 {
            self.stats.ttl_expired += 1;
            return false;
        }
        if header.source_id == self.config.device_id {
            return false;
        }
        if self.config.is_gateway() && header.dest_id == BROADCAST_ID {
            return false;
        }
        if self.router.check_expiration(now_ms) {
            self.stats.route_expirations += 1;
            mesh_debug!("route to gateway expired");
        }
        if self.router.has_valid_route(now_ms) {
            if self.config.is_gateway() {
                return true;
            }
            if header.sender_id == self.router.next_hop() {
                return false;
            }
            self.stats.unicast_forwards += 1;
            true
        } else {
            self.stats.flooding_fallbacks += 1;
            true
        }
    }

    fn transmit_pending_relay(&mut self) {
        let Some(pending) = self.router.take_pending_beacon() else {
            return;
        };
        let header = MeshHeader {
            version: WIRE_VERSION,
            message_type: MessageType::Beacon,
            source_id: pending.source_id,
            dest_id: BROADCAST_ID,
            sender_id: self.config.device_id,
            message_id: pending.beacon.sequence_number as u8,
            ttl: pending.ttl,
            flags: Flags::default(),
        };
        let frame = encode_beacon(&header, &pending.beacon);
        if self.radio.send_binary(&frame) {
            self.tx_count = self.tx_count.saturating_add(1);
            self.stats.beacons_sent += 1;
        }
    }

    /// Evaluate the TDMA scheduler for `now_ms`, transmitting this node's own
    /// report and draining the relay queue if it is this node's slot; emits
    /// a gateway beacon if the interval has elapsed.
    pub fn on_scheduler_tick(&mut self, now_ms: u32) {
        let gps_snap = self.gps.snapshot();
        let net_sample = self.net_time.get(now_ms);
        self.scheduler.update_with_fallback(
            gps_snap.hour,
            gps_snap.minute,
            gps_snap.second,
            gps_snap.datetime_valid,
            net_sample,
        );

        if self.scheduler.should_transmit_now() {
            self.transmit_own_report(now_ms);
            self.drain_queue(now_ms, gps_snap.second);
            self.scheduler.mark_transmission_complete();
        }

        if self.config.is_gateway() && now_ms.wrapping_sub(self.last_beacon_sent_ms) >= BEACON_INTERVAL_MS {
            self.send_gateway_beacon(now_ms);
        }
    }

    fn transmit_own_report(&mut self, _now_ms: u32) {
        let gps_snap = self.gps.snapshot();
        let sensor = self.sensors.read();

        let mut status_flags = 0u8;
        if gps_snap.location_valid {
            status_flags |= STATUS_GPS_VALID;
        }
        if sensor.sensors_ok {
            status_flags |= STATUS_SENSORS_OK;
        }
        if self.battery_pct <= LOW_BATTERY_PCT {
            status_flags |= STATUS_LOW_BATTERY;
        }
        status_flags |= match self.scheduler.status().time_source {
            crate::scheduler::TimeSource::Gps => TIME_SRC_GPS,
            crate::scheduler::TimeSource::Network => TIME_SRC_NET,
            crate::scheduler::TimeSource::None => TIME_SRC_NONE,
        };

        let report = FullReport {
            temp_f_x10: sensor.temp_f_x10,
            humidity_x10: sensor.humidity_x10,
            pressure_hpa: sensor.pressure_hpa,
            altitude_m: sensor.altitude_m,
            lat_x1e6: gps_snap.lat_x1e6,
            lon_x1e6: gps_snap.lon_x1e6,
            gps_alt_m: gps_snap.alt_m,
            satellites: gps_snap.satellites,
            hdop_x10: gps_snap.hdop_x10,
            uptime_sec: _now_ms / 1000,
            tx_count: self.tx_count,
            rx_count: self.rx_count,
            battery_pct: self.battery_pct,
            neighbor_count: self.neighbor.active_count(),
            status_flags,
        };
        let header = MeshHeader {
            version: WIRE_VERSION,
            message_type: MessageType::FullReport,
            source_id: self.config.device_id,
            dest_id: BROADCAST_ID,
            sender_id: self.config.device_id,
            message_id: self.next_data_seq(),
            ttl: MESH_DEFAULT_TTL,
            flags: Flags::default(),
        };
        let frame = encode_full_report(&header, &report);
        if self.radio.send_binary(&frame) {
            self.tx_count = self.tx_count.saturating_add(1);
        }
    }

    fn drain_queue(&mut self, _now_ms: u32, current_second: u8) {
        let slot_end = self.scheduler.slot_end();
        let deadline = slot_end.saturating_sub(SLOT_END_GUARD_S);
        let mut sent = 0u8;
        while sent < MAX_DRAIN_PER_SLOT && current_second <= deadline {
            let Some(frame) = self.tx_queue.peek() else {
                break;
            };
            if !self.radio.send_binary(frame.bytes) {
                break;
            }
            self.tx_queue.dequeue();
            self.tx_count = self.tx_count.saturating_add(1);
            sent += 1;
            if sent < MAX_DRAIN_PER_SLOT && current_second <= deadline && self.tx_queue.peek().is_some() {
                self.radio.delay_ms(INTER_FRAME_DELAY_MS);
            }
        }
    }

    fn send_gateway_beacon(&mut self, now_ms: u32) {
        let gps_snap = self.gps.snapshot();
        let beacon = Beacon {
            distance_to_gateway: 0,
            gateway_id: self.config.device_id,
            sequence_number: self.next_beacon_seq,
            gps_hour: gps_snap.hour,
            gps_minute: gps_snap.minute,
            gps_second: gps_snap.second,
            gps_valid: gps_snap.datetime_valid,
        };
        let header = MeshHeader {
            version: WIRE_VERSION,
            message_type: MessageType::Beacon,
            source_id: self.config.device_id,
            dest_id: BROADCAST_ID,
            sender_id: self.config.device_id,
            message_id: self.next_beacon_seq as u8,
            ttl: crate::config::MESH_MAX_HOPS,
            flags: Flags::default(),
        };
        let frame = encode_beacon(&header, &beacon);
        if self.radio.send_binary(&frame) {
            self.tx_count = self.tx_count.saturating_add(1);
            self.router.record_beacon_sent();
            self.stats.beacons_sent += 1;
        }
        self.next_beacon_seq = self.next_beacon_seq.wrapping_add(1);
        self.last_beacon_sent_ms = now_ms;
    }

    /// ~1 Hz (or slower) housekeeping: expire neighbors, prune the duplicate
    /// cache and transmit queue, and re-check route validity.
    pub fn on_maintenance_tick(&mut self, now_ms: u32) {
        self.neighbor.prune_expired_default(now_ms);
        self.dup_cache.prune(now_ms);
        self.tx_queue.prune_old(crate::config::ROUTE_TIMEOUT_MS, now_ms);
        if self.router.check_expiration(now_ms) {
            self.stats.route_expirations += 1;
            mesh_debug!("route to gateway expired");
        }
    }
}
