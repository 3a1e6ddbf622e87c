//! TDMA time-slot scheduler.
//!
//! Slot ownership is derived purely from `deviceId` and the UTC-second of
//! the minute; no per-node table is stored, grounded on the teacher's
//! `PingSlotScheduler` tick-driven state machine (`lorawan/src/class/class_b/ping_slot.rs`).

use crate::config::{DEFAULT_TX_OFFSET_S, MESH_MAX_NODES, SLOT_DURATION_S, TX_WINDOW_S};

/// Source of the wall-clock second feeding the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeSource {
    /// No valid time source; transmission is disabled.
    None,
    /// GPS-derived wall clock.
    Gps,
    /// Beacon-relayed network time.
    Network,
}

/// Scheduler operating mode for the current second.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// No valid time source.
    WaitTime,
    /// Outside this node's slot; listening.
    RxMode,
    /// Inside this node's slot, transmission not yet completed.
    TxMode,
    /// Inside this node's slot, the primary transmission already happened.
    TxDone,
}

/// Point-in-time snapshot of scheduler state.
#[derive(Debug, Clone, Copy)]
pub struct TdmaStatus {
    /// Current operating mode.
    pub mode: Mode,
    /// Source feeding the current wall-clock second.
    pub time_source: TimeSource,
    /// Whether the current second falls within this node's slot.
    pub is_my_slot: bool,
    /// Whether a transmission should happen right now.
    pub should_transmit: bool,
    /// This node's slot-start second.
    pub slot_start: u8,
    /// This node's slot-end second.
    pub slot_end: u8,
}

/// TDMA slot-ownership and transmit-gating state machine.
pub struct TdmaScheduler {
    device_id: u8,
    tx_offset_s: u8,
    last_processed_second: u8,
    transmissions_completed_this_slot: u8,
    slot_active_this_minute: bool,
    was_in_slot: bool,
    is_my_slot: bool,
    should_transmit: bool,
    time_source: TimeSource,
}

impl TdmaScheduler {
    /// Construct a scheduler for `device_id`, with the default TX offset.
    pub fn init(device_id: u8) -> Self {
        Self {
            device_id,
            tx_offset_s: DEFAULT_TX_OFFSET_S,
            last_processed_second: 255,
            transmissions_completed_this_slot: 0,
            slot_active_this_minute: false,
            was_in_slot: false,
            is_my_slot: false,
            should_transmit: false,
            time_source: TimeSource::None,
        }
    }

    /// Override the TX instant's offset from slot start; clamped to `[0, TX_WINDOW_S)`.
    pub fn set_tx_offset(&mut self, offset_s: u8) {
        self.tx_offset_s = offset_s.min(TX_WINDOW_S.saturating_sub(1));
    }

    /// This node's slot-start second: `(deviceId-1) * SLOT_DURATION_S`.
    pub fn slot_start(&self) -> u8 {
        slot_start_for(self.device_id)
    }

    /// This node's slot-end second: `slotStart + SLOT_DURATION_S - 1`, capped at 59.
    pub fn slot_end(&self) -> u8 {
        slot_end_for(self.device_id)
    }

    fn tx_instant(&self) -> u8 {
        self.slot_start() + self.tx_offset_s
    }

    /// Advance the state machine by one wall-clock second.
    pub fn update(&mut self, _h: u8, _m: u8, s: u8, time_valid: bool) {
        if !time_valid {
            self.is_my_slot = false;
            self.should_transmit = false;
            self.time_source = TimeSource::None;
            return;
        }
        let start = self.slot_start();
        let end = self.slot_end();
        let in_slot = s >= start && s <= end;

        if in_slot && !self.was_in_slot {
            self.transmissions_completed_this_slot = 0;
            self.last_processed_second = 255;
            self.slot_active_this_minute = true;
        } else if !in_slot && self.was_in_slot {
            self.slot_active_this_minute = false;
        }
        self.was_in_slot = in_slot;
        self.is_my_slot = in_slot;

        if in_slot {
            let at_instant = s == self.tx_instant();
            self.should_transmit = at_instant
                && s != self.last_processed_second
                && self.transmissions_completed_this_slot < 1;
            if self.should_transmit {
                self.last_processed_second = s;
            }
        } else {
            self.should_transmit = false;
        }
    }

    /// Advance the state machine, preferring GPS time and falling back to
    /// `network_time` (already-extrapolated `(h,m,s)`) when GPS has no fix.
    pub fn update_with_fallback(
        &mut self,
        gps_h: u8,
        gps_m: u8,
        gps_s: u8,
        gps_valid: bool,
        network_time: Option<(u8, u8, u8)>,
    ) -> TimeSource {
        if gps_valid {
            self.time_source = TimeSource::Gps;
            self.update(gps_h, gps_m, gps_s, true);
        } else if let Some((h, m, s)) = network_time {
            self.time_source = TimeSource::Network;
            self.update(h, m, s, true);
        } else {
            self.time_source = TimeSource::None;
            self.update(0, 0, 0, false);
        }
        self.time_source
    }

    /// Whether the current second falls within this node's slot.
    pub fn is_my_slot(&self) -> bool {
        self.is_my_slot
    }

    /// Whether a transmission should happen right now.
    pub fn should_transmit_now(&self) -> bool {
        self.should_transmit
    }

    /// Record that the primary transmission for this slot has completed.
    pub fn mark_transmission_complete(&mut self) {
        self.transmissions_completed_this_slot = self.transmissions_completed_this_slot.saturating_add(1);
        self.should_transmit = false;
    }

    /// Current operating mode.
    pub fn mode(&self) -> Mode {
        if self.time_source == TimeSource::None {
            return Mode::WaitTime;
        }
        if !self.is_my_slot {
            return Mode::RxMode;
        }
        if self.transmissions_completed_this_slot >= 1 {
            Mode::TxDone
        } else {
            Mode::TxMode
        }
    }

    /// Snapshot of current scheduler state.
    pub fn status(&self) -> TdmaStatus {
        TdmaStatus {
            mode: self.mode(),
            time_source: self.time_source,
            is_my_slot: self.is_my_slot,
            should_transmit: self.should_transmit,
            slot_start: self.slot_start(),
            slot_end: self.slot_end(),
        }
    }
}

/// Slot-start second for `device_id`, independent of any scheduler instance.
pub fn slot_start_for(device_id: u8) -> u8 {
    device_id.saturating_sub(1).saturating_mul(SLOT_DURATION_S)
}

/// Slot-end second for `device_id`, capped at 59.
pub fn slot_end_for(device_id: u8) -> u8 {
    (slot_start_for(device_id) + SLOT_DURATION_S - 1).min(59)
}

/// Whether `device_id` is within the deployment's node-id range.
pub fn is_valid_device_id(device_id: u8) -> bool {
    device_id >= 1 && device_id <= MESH_MAX_NODES
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slot_bounds_match_device_id() {
        assert_eq!(slot_start_for(1), 0);
        assert_eq!(slot_end_for(1), 11);
        assert_eq!(slot_start_for(3), 24);
        assert_eq!(slot_end_for(3), 35);
        assert_eq!(slot_start_for(5), 48);
        assert_eq!(slot_end_for(5), 59);
    }

    #[test]
    fn no_time_source_disables_transmission() {
        let mut sched = TdmaScheduler::init(3);
        sched.update(0, 0, 30, false);
        assert!(!sched.is_my_slot());
        assert!(!sched.should_transmit_now());
        assert_eq!(sched.mode(), Mode::WaitTime);
    }

    #[test]
    fn should_transmit_fires_once_at_tx_instant() {
        let mut sched = TdmaScheduler::init(3); // slot [24,35], instant 30
        sched.update(0, 0, 24, true); // rising edge
        assert!(sched.is_my_slot());
        assert!(!sched.should_transmit_now());
        sched.update(0, 0, 30, true);
        assert!(sched.should_transmit_now());
        sched.mark_transmission_complete();
        assert!(!sched.should_transmit_now());
        // Still second 30 on a later tick with the same second: no re-fire.
        sched.update(0, 0, 30, true);
        assert!(!sched.should_transmit_now());
    }

    #[test]
    fn leaving_slot_and_returning_next_minute_resets_completion_count() {
        let mut sched = TdmaScheduler::init(3);
        sched.update(0, 0, 30, true);
        assert!(sched.should_transmit_now());
        sched.mark_transmission_complete();
        sched.update(0, 0, 36, true); // falling edge, left the slot
        assert!(!sched.is_my_slot());
        sched.update(0, 0, 24, true); // back in slot, new minute
        sched.update(0, 0, 30, true);
        assert!(sched.should_transmit_now());
    }

    #[test]
    fn custom_tx_offset_shifts_instant() {
        let mut sched = TdmaScheduler::init(3);
        sched.set_tx_offset(0);
        sched.update(0, 0, 24, true);
        assert!(sched.should_transmit_now());
    }

    #[test]
    fn fallback_prefers_gps_over_network() {
        let mut sched = TdmaScheduler::init(3);
        let src = sched.update_with_fallback(0, 0, 30, true, Some((0, 0, 0)));
        assert_eq!(src, TimeSource::Gps);
        assert!(sched.should_transmit_now());
    }

    #[test]
    fn fallback_uses_network_time_when_gps_invalid() {
        let mut sched = TdmaScheduler::init(3);
        let src = sched.update_with_fallback(0, 0, 0, false, Some((0, 0, 30)));
        assert_eq!(src, TimeSource::Network);
        assert!(sched.should_transmit_now());
    }

    #[test]
    fn fallback_with_no_source_disables_transmission() {
        let mut sched = TdmaScheduler::init(3);
        let src = sched.update_with_fallback(0, 0, 0, false, None);
        assert_eq!(src, TimeSource::None);
        assert!(!sched.should_transmit_now());
        assert_eq!(sched.mode(), Mode::WaitTime);
    }

    #[test]
    fn mode_reports_tx_done_after_completion() {
        let mut sched = TdmaScheduler::init(3);
        sched.update(0, 0, 30, true);
        sched.mark_transmission_complete();
        assert_eq!(sched.mode(), Mode::TxDone);
    }
}
