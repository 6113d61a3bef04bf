//! Sequence-numbered emission.
//!
//! Every activation and every forwarded bracket reserves a slot when it
//! is accepted. Slots may be filled in any order; packets leave strictly
//! in slot order.

use rill_core::{Ip, PortName};
use std::collections::BTreeMap;

/// One packet to send.
#[derive(Debug, Clone, PartialEq)]
pub enum Emission {
    /// Send on a single out-port.
    To(PortName, Ip),
    /// Send on every out-port (forwarded brackets).
    Broadcast(Ip),
}

/// Reorder buffer keyed by sequence number.
#[derive(Debug, Default)]
pub struct OrderedEmitter {
    next_slot: u64,
    next_emit: u64,
    filled: BTreeMap<u64, Vec<Emission>>,
}

impl OrderedEmitter {
    /// Create an empty emitter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve the next slot.
    pub fn reserve(&mut self) -> u64 {
        let slot = self.next_slot;
        self.next_slot += 1;
        slot
    }

    /// Fill a reserved slot and return every packet that may now leave,
    /// in order.
    pub fn fill(&mut self, slot: u64, emissions: Vec<Emission>) -> Vec<Emission> {
        debug_assert!(slot < self.next_slot, "slot {slot} was never reserved");
        self.filled.insert(slot, emissions);
        let mut ready = Vec::new();
        while let Some(batch) = self.filled.remove(&self.next_emit) {
            ready.extend(batch);
            self.next_emit += 1;
        }
        ready
    }

    /// Slots reserved but not yet emitted.
    pub fn outstanding(&self) -> u64 {
        self.next_slot - self.next_emit
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn out(n: i64) -> Emission {
        Emission::To(PortName::new("out"), Ip::data(n))
    }

    #[test]
    fn in_order_fill_flushes_immediately() {
        let mut e = OrderedEmitter::new();
        let a = e.reserve();
        assert_eq!(e.fill(a, vec![out(0)]), vec![out(0)]);
        assert_eq!(e.outstanding(), 0);
    }

    #[test]
    fn later_slot_waits_for_earlier() {
        let mut e = OrderedEmitter::new();
        let slow = e.reserve();
        let bracket = e.reserve();
        let fast = e.reserve();
        assert!(e.fill(fast, vec![out(2)]).is_empty());
        assert!(e.fill(bracket, vec![Emission::Broadcast(Ip::close("g"))]).is_empty());
        assert_eq!(e.outstanding(), 3);
        assert_eq!(
            e.fill(slow, vec![out(0)]),
            vec![out(0), Emission::Broadcast(Ip::close("g")), out(2)]
        );
        assert_eq!(e.outstanding(), 0);
    }

    #[test]
    fn empty_slot_still_advances() {
        let mut e = OrderedEmitter::new();
        let a = e.reserve();
        let b = e.reserve();
        assert!(e.fill(b, vec![out(1)]).is_empty());
        assert_eq!(e.fill(a, vec![]), vec![out(1)]);
    }

    proptest! {
        /// Whatever order slots are filled in, output follows reservation order.
        #[test]
        fn output_follows_reservation_order(order in Just((0..16u64).collect::<Vec<_>>()).prop_shuffle()) {
            let mut e = OrderedEmitter::new();
            for _ in 0..16 {
                e.reserve();
            }
            let mut emitted = Vec::new();
            for slot in order {
                emitted.extend(e.fill(slot, vec![out(slot as i64)]));
            }
            let expected: Vec<Emission> = (0..16).map(out).collect();
            prop_assert_eq!(emitted, expected);
        }
    }
}
