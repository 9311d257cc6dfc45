//! Slot arithmetic and the deterministic mediator shuffle.

use ptn_types::{Address, DynamicGlobalProperty, GlobalProperty, MediatorSchedule, Timestamp};
use tracing::error;

/// Multiplier of the xorshift-multiply generator used by the shuffle.
///
/// Part of the wire contract: every node must derive the identical producer
/// order, so this constant can never change within a chain.
pub const SHUFFLE_MULTIPLIER: u64 = 2_685_821_657_736_338_717;

/// Reshuffle the producer order if the head unit closes a shuffle epoch.
///
/// Triggered only when `head_num` is a multiple of the active set size. The
/// permutation is a Fisher-Yates shuffle driven by an xorshift-multiply
/// generator seeded with the head timestamp shifted into the high word, so
/// all nodes that agree on the head agree on the order.
///
/// Returns `true` when the schedule was rewritten.
pub fn shuffle_mediators(
    ms: &mut MediatorSchedule,
    gp: &GlobalProperty,
    head_num: u64,
    head_time: Timestamp,
) -> bool {
    let size = gp.active_mediators.len() as u64;
    if size == 0 {
        error!("the current number of active mediators is 0");
        return false;
    }
    if head_num % size != 0 {
        return false;
    }

    ms.current_shuffled_mediators = gp.active_mediators.clone();

    let now_hi = head_time.as_secs().wrapping_shl(32);
    for i in 0..size {
        let mut k = now_hi.wrapping_add(i.wrapping_mul(SHUFFLE_MULTIPLIER));
        k ^= k >> 12;
        k ^= k << 25;
        k ^= k >> 27;
        k = k.wrapping_mul(SHUFFLE_MULTIPLIER);

        let jmax = size - i;
        let j = (i + k % jmax) as usize;
        ms.current_shuffled_mediators.swap(i as usize, j);
    }
    true
}

/// Start time of the slot `slot_num` slots past the head.
///
/// `slot_num == 0` is the epoch sentinel. For the genesis head the first
/// slot opens one interval after the genesis timestamp; afterwards slots are
/// aligned to interval boundaries at or before the head timestamp.
pub fn slot_time(
    interval: u64,
    head_num: u64,
    head_time: Timestamp,
    slot_num: u64,
) -> Timestamp {
    if slot_num == 0 {
        return Timestamp::EPOCH;
    }

    // The first unit is produced one interval after genesis.
    if head_num == 0 {
        return Timestamp::new(head_time.as_secs() + slot_num * interval);
    }

    let head_abs_slot = head_time.as_secs() / interval;
    Timestamp::new(head_abs_slot * interval + slot_num * interval)
}

/// The last slot that opens at or before `when`; 0 if none has.
pub fn slot_at_time(
    interval: u64,
    head_num: u64,
    head_time: Timestamp,
    when: Timestamp,
) -> u64 {
    if interval == 0 {
        return 0;
    }
    let first_slot_time = slot_time(interval, head_num, head_time, 1);
    if when < first_slot_time {
        return 0;
    }
    (when.as_secs() - first_slot_time.as_secs()) / interval + 1
}

/// The mediator scheduled `slot_offset` slots into the future.
///
/// Offset 1 is the next producer. The genesis unit has no producer, hence
/// the `- 1` when indexing into the shuffled order.
pub fn scheduled_mediator(
    ms: &MediatorSchedule,
    dgp: &DynamicGlobalProperty,
    slot_offset: u64,
) -> Option<Address> {
    let len = ms.current_shuffled_mediators.len() as u64;
    if len == 0 {
        error!("the current number of shuffled mediators is 0");
        return None;
    }
    let current = dgp.current_absolute_slot + slot_offset;
    let index = (current - 1) % len;
    Some(ms.current_shuffled_mediators[index as usize])
}

#[cfg(test)]
mod tests {
    use super::*;
    use ptn_types::ChainParameters;

    fn addr(b: u8) -> Address {
        Address::new([b; 20])
    }

    fn gp(n: u8) -> GlobalProperty {
        GlobalProperty::new((1..=n).map(addr).collect(), ChainParameters::default())
    }

    #[test]
    fn shuffle_only_at_epoch_boundary() {
        let gp = gp(5);
        let mut ms = MediatorSchedule::default();
        assert!(!shuffle_mediators(&mut ms, &gp, 7, Timestamp::new(1000)));
        assert!(ms.current_shuffled_mediators.is_empty());
        assert!(shuffle_mediators(&mut ms, &gp, 10, Timestamp::new(1000)));
        assert_eq!(ms.current_shuffled_mediators.len(), 5);
    }

    #[test]
    fn shuffle_is_deterministic_across_nodes() {
        let gp = gp(5);
        let head_time = Timestamp::new(1_537_000_000);

        let mut node_a = MediatorSchedule::default();
        let mut node_b = MediatorSchedule::default();
        assert!(shuffle_mediators(&mut node_a, &gp, 5, head_time));
        assert!(shuffle_mediators(&mut node_b, &gp, 5, head_time));

        assert_eq!(
            node_a.current_shuffled_mediators,
            node_b.current_shuffled_mediators
        );
    }

    #[test]
    fn shuffle_is_a_permutation() {
        let gp = gp(7);
        let mut ms = MediatorSchedule::default();
        assert!(shuffle_mediators(&mut ms, &gp, 0, Timestamp::new(42)));

        let mut sorted = ms.current_shuffled_mediators.clone();
        sorted.sort();
        let mut expected = gp.active_mediators.clone();
        expected.sort();
        assert_eq!(sorted, expected);
    }

    #[test]
    fn different_timestamps_usually_differ() {
        let gp = gp(7);
        let mut a = MediatorSchedule::default();
        let mut b = MediatorSchedule::default();
        shuffle_mediators(&mut a, &gp, 0, Timestamp::new(1_000_000));
        shuffle_mediators(&mut b, &gp, 0, Timestamp::new(2_000_000));
        assert_ne!(a.current_shuffled_mediators, b.current_shuffled_mediators);
    }

    #[test]
    fn empty_roster_never_shuffles() {
        let gp = GlobalProperty::default();
        let mut ms = MediatorSchedule::default();
        assert!(!shuffle_mediators(&mut ms, &gp, 0, Timestamp::new(1)));
    }

    #[test]
    fn slot_zero_is_epoch() {
        assert_eq!(slot_time(3, 9, Timestamp::new(1000), 0), Timestamp::EPOCH);
    }

    #[test]
    fn genesis_head_slots_start_one_interval_later() {
        let genesis = Timestamp::new(1_000_000);
        assert_eq!(slot_time(3, 0, genesis, 1), Timestamp::new(1_000_003));
        assert_eq!(slot_time(3, 0, genesis, 4), Timestamp::new(1_000_012));
    }

    #[test]
    fn later_heads_align_to_interval_boundaries() {
        // Head at 1001 with interval 3 → aligned base 999, slot 1 at 1002.
        assert_eq!(slot_time(3, 5, Timestamp::new(1001), 1), Timestamp::new(1002));
        assert_eq!(slot_time(3, 5, Timestamp::new(1001), 2), Timestamp::new(1005));
    }

    #[test]
    fn slot_at_time_inverts_slot_time() {
        let head = Timestamp::new(1001);
        for slot in 1u64..6 {
            let t = slot_time(3, 5, head, slot);
            assert_eq!(slot_at_time(3, 5, head, t), slot);
            // One second into the slot still maps to it.
            assert_eq!(slot_at_time(3, 5, head, Timestamp::new(t.as_secs() + 1)), slot);
        }
    }

    #[test]
    fn slot_at_time_before_first_slot_is_zero() {
        let head = Timestamp::new(1001);
        assert_eq!(slot_at_time(3, 5, head, Timestamp::new(1001)), 0);
        assert_eq!(slot_at_time(3, 5, head, Timestamp::EPOCH), 0);
    }

    #[test]
    fn scheduled_mediator_skips_genesis_slot() {
        let ms = MediatorSchedule {
            current_shuffled_mediators: vec![addr(1), addr(2), addr(3)],
        };
        let dgp = DynamicGlobalProperty {
            current_absolute_slot: 1,
            ..Default::default()
        };
        // current(1) + offset(1) - 1 = 1 → index 1.
        assert_eq!(scheduled_mediator(&ms, &dgp, 1), Some(addr(2)));
        assert_eq!(scheduled_mediator(&ms, &dgp, 2), Some(addr(3)));
        assert_eq!(scheduled_mediator(&ms, &dgp, 3), Some(addr(1)));
    }

    #[test]
    fn scheduled_mediator_empty_schedule() {
        let ms = MediatorSchedule::default();
        let dgp = DynamicGlobalProperty::default();
        assert_eq!(scheduled_mediator(&ms, &dgp, 1), None);
    }

    #[test]
    fn selection_is_pure() {
        let ms = MediatorSchedule {
            current_shuffled_mediators: vec![addr(1), addr(2), addr(3), addr(4)],
        };
        let dgp = DynamicGlobalProperty {
            current_absolute_slot: 9,
            ..Default::default()
        };
        for offset in 1..10 {
            assert_eq!(
                scheduled_mediator(&ms, &dgp, offset),
                scheduled_mediator(&ms, &dgp, offset)
            );
        }
    }
}
