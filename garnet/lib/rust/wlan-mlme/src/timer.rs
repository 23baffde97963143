// Copyright 2019 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use std::{collections::HashMap, time::Duration};

#[derive(PartialEq, Eq, Hash, Debug, Copy, Clone)]
pub struct EventId(pub u64);

/// Schedules and cancels timeouts. Expired timeouts are fed back into the MLME through
/// `Mlme::handle_timeout` with the id returned by `schedule`.
pub trait Scheduler: Send {
    fn schedule(&mut self, after: Duration) -> EventId;
    fn cancel(&mut self, id: EventId);
}

/// A timer to schedule and cancel timeouts and retrieve triggered events.
pub struct Timer<E> {
    events: HashMap<EventId, E>,
    scheduler: Box<dyn Scheduler>,
}

impl<E> Timer<E> {
    pub fn new(scheduler: Box<dyn Scheduler>) -> Self {
        Self { events: HashMap::default(), scheduler }
    }

    pub fn triggered(&mut self, event_id: &EventId) -> Option<E> {
        self.events.remove(event_id)
    }

    pub fn schedule_event(&mut self, after: Duration, event: E) -> EventId {
        let event_id = self.scheduler.schedule(after);
        self.events.insert(event_id, event);
        event_id
    }

    pub fn cancel_event(&mut self, event_id: EventId) {
        if self.events.remove(&event_id).is_some() {
            self.scheduler.cancel(event_id);
        }
    }

    pub fn cancel_all(&mut self) {
        for event_id in self.events.keys() {
            self.scheduler.cancel(*event_id);
        }
        self.events.clear();
    }

    pub fn pending(&self) -> usize {
        self.events.len()
    }
}

#[cfg(test)]
pub use test_utils::FakeScheduler;

#[cfg(test)]
mod test_utils {
    use {super::*, parking_lot::Mutex, std::sync::Arc};

    #[derive(Default)]
    struct FakeSchedulerState {
        next_id: u64,
        scheduled: Vec<(EventId, Duration)>,
    }

    /// Records scheduled timeouts. Clones share state so a test can keep a handle after
    /// moving the scheduler into a `Timer`.
    #[derive(Clone, Default)]
    pub struct FakeScheduler {
        state: Arc<Mutex<FakeSchedulerState>>,
    }

    impl FakeScheduler {
        pub fn new() -> Self {
            Self::default()
        }

        /// Timeouts which were scheduled and not cancelled, oldest first.
        pub fn scheduled(&self) -> Vec<(EventId, Duration)> {
            self.state.lock().scheduled.clone()
        }

        pub fn scheduled_after(&self, after: Duration) -> Vec<EventId> {
            self.scheduled().into_iter().filter(|(_, d)| *d == after).map(|(id, _)| id).collect()
        }

        /// Forgets a timeout, as if it fired.
        pub fn fire(&self, id: EventId) {
            self.state.lock().scheduled.retain(|(scheduled, _)| *scheduled != id);
        }
    }

    impl Scheduler for FakeScheduler {
        fn schedule(&mut self, after: Duration) -> EventId {
            let mut state = self.state.lock();
            state.next_id += 1;
            let id = EventId(state.next_id);
            state.scheduled.push((id, after));
            id
        }

        fn cancel(&mut self, id: EventId) {
            self.state.lock().scheduled.retain(|(scheduled, _)| *scheduled != id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEADLINE: Duration = Duration::from_nanos(5);

    #[test]
    fn schedule_cancel_event() {
        #[derive(PartialEq, Eq, Debug, Hash)]
        struct FooEvent(u8);

        let fake_scheduler = FakeScheduler::new();
        let mut timer = Timer::<FooEvent>::new(Box::new(fake_scheduler.clone()));

        // An event triggers at most once.
        let event_id = timer.schedule_event(DEADLINE, FooEvent(8));
        assert_eq!(vec![(event_id, DEADLINE)], fake_scheduler.scheduled());
        assert_eq!(timer.triggered(&event_id), Some(FooEvent(8)));
        assert_eq!(timer.triggered(&event_id), None);

        // A cancelled event never triggers.
        let event_id = timer.schedule_event(DEADLINE, FooEvent(9));
        timer.cancel_event(event_id);
        assert_eq!(timer.triggered(&event_id), None);
        assert!(fake_scheduler.scheduled_after(DEADLINE).iter().all(|id| *id != event_id));

        let event_id_1 = timer.schedule_event(DEADLINE, FooEvent(8));
        let event_id_2 = timer.schedule_event(DEADLINE, FooEvent(9));
        let event_id_3 = timer.schedule_event(DEADLINE, FooEvent(10));
        timer.cancel_event(event_id_2);
        assert_eq!(2, timer.pending());
        assert_eq!(timer.triggered(&event_id_2), None);
        assert_eq!(timer.triggered(&event_id_3), Some(FooEvent(10)));
        assert_eq!(timer.triggered(&event_id_1), Some(FooEvent(8)));
    }

    #[test]
    fn cancel_all() {
        let fake_scheduler = FakeScheduler::new();
        let mut timer = Timer::<_>::new(Box::new(fake_scheduler.clone()));

        let event_id_1 = timer.schedule_event(DEADLINE, 8);
        let event_id_2 = timer.schedule_event(Duration::from_secs(1), 9);
        timer.cancel_all();
        assert_eq!(timer.triggered(&event_id_1), None);
        assert_eq!(timer.triggered(&event_id_2), None);
        assert!(fake_scheduler.scheduled().is_empty());
    }
}
