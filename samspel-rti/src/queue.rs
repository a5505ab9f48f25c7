//! Deduplicating priority queue of time-advance requests.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashSet};

use parking_lot::Mutex;

use samspel_api::FederateEvent;

/// Ordered multiset of pending [`FederateEvent`]s.
///
/// Ordering follows `FederateEvent`'s scheduling order: earliest requested
/// time first, priority breaking ties. Inserting an event logically equal to
/// one already queued is a no-op, coalescing repeated identical requests
/// from the same federate. All operations take a single internal mutex, so
/// the queue can be shared between the scheduling thread and workers filing
/// new requests mid-advance.
#[derive(Default)]
pub struct EventQueue {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    heap: BinaryHeap<Reverse<FederateEvent>>,
    queued: HashSet<FederateEvent>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts an event unless an identical one is already queued.
    /// Returns whether the event was actually added.
    pub fn insert(&self, event: FederateEvent) -> bool {
        let mut inner = self.inner.lock();
        if inner.queued.contains(&event) {
            return false;
        }
        inner.queued.insert(event.clone());
        inner.heap.push(Reverse(event));
        true
    }

    /// Removes and returns the event with the smallest requested time.
    pub fn pop(&self) -> Option<FederateEvent> {
        let mut inner = self.inner.lock();
        let Reverse(event) = inner.heap.pop()?;
        inner.queued.remove(&event);
        Some(event)
    }

    /// Returns a copy of the event with the smallest requested time.
    pub fn peek(&self) -> Option<FederateEvent> {
        let inner = self.inner.lock();
        inner.heap.peek().map(|Reverse(event)| event.clone())
    }

    pub fn len(&self) -> usize {
        self.inner.lock().heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().heap.is_empty()
    }

    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.heap.clear();
        inner.queued.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(federate: &str, time: i64, lookahead: i64, priority: u8) -> FederateEvent {
        FederateEvent::new(federate.into(), time, lookahead, priority)
    }

    #[test]
    fn pops_in_time_order() {
        let queue = EventQueue::new();
        queue.insert(event("network", 30, 0, 50));
        queue.insert(event("traffic", 10, 0, 50));
        queue.insert(event("apps", 20, 0, 50));

        assert_eq!(queue.pop().unwrap().requested_time(), 10);
        assert_eq!(queue.pop().unwrap().requested_time(), 20);
        assert_eq!(queue.pop().unwrap().requested_time(), 30);
        assert!(queue.pop().is_none());
    }

    #[test]
    fn priority_breaks_time_ties_lower_value_first() {
        let queue = EventQueue::new();
        queue.insert(event("low", 10, 0, 100));
        queue.insert(event("high", 10, 0, 0));

        assert_eq!(queue.pop().unwrap().federate().as_str(), "high");
        assert_eq!(queue.pop().unwrap().federate().as_str(), "low");
    }

    #[test]
    fn identical_requests_coalesce() {
        let queue = EventQueue::new();
        assert!(queue.insert(event("traffic", 10, 5, 50)));
        assert!(!queue.insert(event("traffic", 10, 5, 50)));
        assert_eq!(queue.len(), 1);

        // Any field difference makes it a distinct request.
        assert!(queue.insert(event("traffic", 10, 6, 50)));
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn peek_does_not_remove() {
        let queue = EventQueue::new();
        queue.insert(event("traffic", 10, 0, 50));
        assert_eq!(queue.peek().unwrap().requested_time(), 10);
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn clear_empties_dedup_index_too() {
        let queue = EventQueue::new();
        queue.insert(event("traffic", 10, 5, 50));
        queue.clear();
        assert!(queue.is_empty());
        assert!(queue.insert(event("traffic", 10, 5, 50)));
    }

    proptest::proptest! {
        #[test]
        fn pop_order_is_non_decreasing(
            times in proptest::collection::vec(0i64..1_000, 1..64)
        ) {
            let queue = EventQueue::new();
            for (index, time) in times.iter().enumerate() {
                queue.insert(event(&format!("f{index}"), *time, 0, 50));
            }
            let mut last = i64::MIN;
            while let Some(popped) = queue.pop() {
                proptest::prop_assert!(popped.requested_time() >= last);
                last = popped.requested_time();
            }
        }
    }
}
