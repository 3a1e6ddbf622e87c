//! Duplicate suppression ring buffer.
//!
//! Fixed-capacity table of `(sourceId, messageId)` pairs, grounded on the
//! teacher's fixed-capacity `heapless::Vec` tables (`lorawan::region::US915`
//! channel lists). Lookup opportunistically expires stale slots it visits,
//! so sequence-number wraparound at 256 never aliases a long-stale entry
//! against a fresh one: the stale entry will have already expired.

use heapless::Vec;

use crate::config::{DUPLICATE_WINDOW_MS, SEEN_CACHE_SIZE};

#[derive(Debug, Clone, Copy)]
struct Entry {
    source_id: u8,
    message_id: u8,
    timestamp_ms: u32,
    valid: bool,
}

impl Entry {
    const fn empty() -> Self {
        Self {
            source_id: 0,
            message_id: 0,
            timestamp_ms: 0,
            valid: false,
        }
    }
}

/// Ring buffer of recently seen `(sourceId, messageId)` pairs.
pub struct DuplicateCache {
    slots: Vec<Entry, SEEN_CACHE_SIZE>,
    write_index: usize,
}

impl DuplicateCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        let mut slots = Vec::new();
        for _ in 0..SEEN_CACHE_SIZE {
            let _ = slots.push(Entry::empty());
        }
        Self {
            slots,
            write_index: 0,
        }
    }

    /// Whether `(source_id, message_id)` is present and unexpired.
    ///
    /// Invariant (spec.md §4.B): callers must call this immediately before
    /// [`Self::mark_seen`] for the same pair, and proceed with processing
    /// iff it returned `false`.
    pub fn is_duplicate(&mut self, source_id: u8, message_id: u8, now_ms: u32) -> bool {
        let mut found = false;
        for slot in self.slots.iter_mut() {
            if !slot.valid {
                continue;
            }
            if now_ms.wrapping_sub(slot.timestamp_ms) > DUPLICATE_WINDOW_MS {
                slot.valid = false;
                continue;
            }
            if slot.source_id == source_id && slot.message_id == message_id {
                found = true;
            }
        }
        found
    }

    /// Record `(source_id, message_id)` as seen at `now_ms`, advancing the
    /// ring cursor.
    pub fn mark_seen(&mut self, source_id: u8, message_id: u8, now_ms: u32) {
        self.slots[self.write_index] = Entry {
            source_id,
            message_id,
            timestamp_ms: now_ms,
            valid: true,
        };
        self.write_index = (self.write_index + 1) % SEEN_CACHE_SIZE;
    }

    /// Invalidate every slot older than [`DUPLICATE_WINDOW_MS`]; returns the
    /// number of slots invalidated.
    pub fn prune(&mut self, now_ms: u32) -> usize {
        let mut pruned = 0;
        for slot in self.slots.iter_mut() {
            if slot.valid && now_ms.wrapping_sub(slot.timestamp_ms) > DUPLICATE_WINDOW_MS {
                slot.valid = false;
                pruned += 1;
            }
        }
        pruned
    }

    /// Invalidate every slot.
    pub fn clear(&mut self) {
        for slot in self.slots.iter_mut() {
            slot.valid = false;
        }
    }

    /// Number of currently valid (unexpired-as-of-last-visit) slots.
    pub fn count(&self) -> usize {
        self.slots.iter().filter(|s| s.valid).count()
    }
}

impl Default for DuplicateCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_pair_is_not_a_duplicate() {
        let mut cache = DuplicateCache::new();
        assert!(!cache.is_duplicate(3, 17, 1_000));
    }

    #[test]
    fn marked_pair_is_a_duplicate_within_window() {
        let mut cache = DuplicateCache::new();
        cache.mark_seen(3, 17, 1_000);
        assert!(cache.is_duplicate(3, 17, 1_000 + DUPLICATE_WINDOW_MS - 1));
    }

    #[test]
    fn marked_pair_expires_after_window() {
        let mut cache = DuplicateCache::new();
        cache.mark_seen(3, 17, 1_000);
        assert!(!cache.is_duplicate(3, 17, 1_000 + DUPLICATE_WINDOW_MS + 1));
    }

    #[test]
    fn message_id_wraparound_still_detects_duplicates_within_window() {
        let mut cache = DuplicateCache::new();
        let mut t = 0u32;
        // Burst through the full 0..=255 message id space from one source.
        for mid in 0..=255u8 {
            cache.mark_seen(9, mid, t);
            t += 10;
        }
        // Re-occurrence of an id seen very recently, still inside the window.
        assert!(cache.is_duplicate(9, 255, t));
    }

    #[test]
    fn ring_overwrites_oldest_slot_after_capacity() {
        let mut cache = DuplicateCache::new();
        for i in 0..SEEN_CACHE_SIZE as u8 {
            cache.mark_seen(1, i, 0);
        }
        // The very first entry (source 1, id 0) is now overwritten by the
        // wrap-around write at index 0 if one more is marked.
        cache.mark_seen(1, 250, 0);
        assert!(!cache.is_duplicate(1, 0, 0));
        assert!(cache.is_duplicate(1, 250, 0));
    }

    #[test]
    fn clear_invalidates_everything() {
        let mut cache = DuplicateCache::new();
        cache.mark_seen(1, 1, 0);
        cache.clear();
        assert!(!cache.is_duplicate(1, 1, 0));
        assert_eq!(cache.count(), 0);
    }

    #[test]
    fn prune_returns_count_of_expired_slots() {
        let mut cache = DuplicateCache::new();
        cache.mark_seen(1, 1, 0);
        cache.mark_seen(2, 2, 0);
        assert_eq!(cache.prune(DUPLICATE_WINDOW_MS + 1), 2);
        assert_eq!(cache.count(), 0);
    }
}
