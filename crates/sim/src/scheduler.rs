//! Virtual-clock event queue.
//!
//! The whole simulation is driven off one strictly time-ordered queue;
//! events are dispatched one at a time, so no simulation state ever needs
//! locking. Time is a [`Duration`] offset from the start of the run, never
//! the wall clock.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::time::Duration;

/// Something due to happen at a point in simulated time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// The device's generator is due to emit its next packet.
    DeviceSend { device: usize },
}

#[derive(Debug, PartialEq, Eq)]
pub struct ScheduledEvent {
    pub at: Duration,
    pub event: Event,
    seq: u64,
}

// Reversed so the BinaryHeap pops the earliest deadline first; the
// insertion sequence breaks ties, keeping same-time events FIFO.
impl Ord for ScheduledEvent {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .at
            .cmp(&self.at)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for ScheduledEvent {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// The single global event queue of a run.
#[derive(Debug, Default)]
pub struct EventQueue {
    heap: BinaryHeap<ScheduledEvent>,
    next_seq: u64,
}

impl EventQueue {
    pub fn new() -> Self {
        EventQueue::default()
    }

    pub fn schedule(&mut self, at: Duration, event: Event) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(ScheduledEvent { at, event, seq });
    }

    /// Remove and return the earliest pending event.
    pub fn pop(&mut self) -> Option<ScheduledEvent> {
        self.heap.pop()
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pops_in_time_order() {
        let mut queue = EventQueue::new();
        queue.schedule(Duration::from_secs(30), Event::DeviceSend { device: 2 });
        queue.schedule(Duration::from_secs(10), Event::DeviceSend { device: 0 });
        queue.schedule(Duration::from_secs(20), Event::DeviceSend { device: 1 });

        let order: Vec<_> = std::iter::from_fn(|| queue.pop()).map(|e| e.at).collect();
        assert_eq!(
            order,
            vec![
                Duration::from_secs(10),
                Duration::from_secs(20),
                Duration::from_secs(30)
            ]
        );
    }

    #[test]
    fn same_time_events_pop_in_insertion_order() {
        let mut queue = EventQueue::new();
        for device in 0..5 {
            queue.schedule(Duration::from_secs(60), Event::DeviceSend { device });
        }

        let order: Vec<_> = std::iter::from_fn(|| queue.pop())
            .map(|e| match e.event {
                Event::DeviceSend { device } => device,
            })
            .collect();
        assert_eq!(order, vec![0, 1, 2, 3, 4]);
    }
}
