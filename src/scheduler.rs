//! A day-indexed queue of pending events backed by an object pool.
//!
//! Events are stored in an [`ObjectPool`] and referenced from one bucket per simulation day.
//! Within a day, events run in the order they were scheduled. Cancellation marks the pooled event
//! and leaves it in its bucket; it is skipped and released when its day arrives, so cancelling is
//! *O*(1) and never searches the timeline.
//!
//! Days are `u32` offsets from the starting date of the simulation.

use chrono::{Datelike, Days, NaiveDate};
use log::{debug, trace};

use crate::error::SimError;
use crate::event::Event;
use crate::pool::{ObjectPool, PoolKey};

pub type Day = u32;

/// A unique identifier for an event added to the [`Scheduler`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct EventId(PoolKey);

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
enum EventState {
    #[default]
    Scheduled,
    Canceled,
}

#[derive(Default)]
struct ScheduledEvent {
    day: Day,
    state: EventState,
    event: Option<Event>,
}

pub struct Scheduler {
    start_date: NaiveDate,
    current_day: Day,
    total_days: Day,
    /// Set once the current day's bucket has been taken for execution. From then on nothing
    /// may be scheduled for the current day.
    current_day_closed: bool,
    events: ObjectPool<ScheduledEvent>,
    timeline: Vec<Vec<EventId>>,
    pending: usize,
}

impl Scheduler {
    /// Creates a scheduler whose event pool holds at most `pool_capacity` pending events.
    #[must_use]
    pub fn new(start_date: NaiveDate, total_days: Day, pool_capacity: usize) -> Scheduler {
        Scheduler {
            start_date,
            current_day: 0,
            total_days,
            current_day_closed: false,
            events: ObjectPool::initialize_pool("events", pool_capacity),
            timeline: Vec::with_capacity(total_days as usize + 1),
            pending: 0,
        }
    }

    /// Adds an event to run on `day`.
    ///
    /// # Errors
    ///
    /// Returns `SimError::PoolExhausted` if the event pool is full.
    ///
    /// # Panics
    ///
    /// Panics if `day` is in the past, or is the current day once the current day's events have
    /// started executing.
    pub fn schedule(&mut self, day: Day, event: Event) -> Result<EventId, SimError> {
        if day < self.current_day || (day == self.current_day && self.current_day_closed) {
            panic!(
                "Invalid day {day} for {event}: current day is {}",
                self.current_day
            );
        }
        trace!("scheduling {event} for day {day}");
        let key = self.events.acquire_with(ScheduledEvent {
            day,
            state: EventState::Scheduled,
            event: Some(event),
        })?;
        let id = EventId(key);
        let bucket = day as usize;
        if bucket >= self.timeline.len() {
            self.timeline.resize_with(bucket + 1, Vec::new);
        }
        self.timeline[bucket].push(id);
        self.pending += 1;
        Ok(id)
    }

    /// Marks a pending event so that it is skipped when its day arrives.
    ///
    /// # Panics
    ///
    /// Panics if the event has already been executed or cancelled.
    pub fn cancel(&mut self, id: EventId) {
        let scheduled = self
            .events
            .get_mut(id.0)
            .filter(|scheduled| scheduled.state == EventState::Scheduled)
            .expect("Event does not exist");
        scheduled.state = EventState::Canceled;
        self.pending -= 1;
        if let Some(event) = &scheduled.event {
            debug!("cancelled {event} scheduled for day {}", scheduled.day);
        }
    }

    #[must_use]
    pub fn is_pending(&self, id: EventId) -> bool {
        self.events
            .get(id.0)
            .is_some_and(|scheduled| scheduled.state == EventState::Scheduled)
    }

    /// Takes every event scheduled for the current day, in scheduling order, and closes the
    /// current day to further scheduling.
    pub(crate) fn take_current_day(&mut self) -> Vec<EventId> {
        self.current_day_closed = true;
        self.timeline
            .get_mut(self.current_day as usize)
            .map(std::mem::take)
            .unwrap_or_default()
    }

    /// Removes an event taken with `take_current_day` from the pool and hands back its payload,
    /// or `None` if it was cancelled.
    pub(crate) fn pop_event(&mut self, id: EventId) -> Option<Event> {
        let scheduled = self.events.get_mut(id.0).expect("Event does not exist");
        assert_eq!(
            scheduled.day, self.current_day,
            "Event executed on a day other than the one it was scheduled for"
        );
        let state = scheduled.state;
        let event = scheduled.event.take();
        self.events.release(id.0);
        match state {
            EventState::Scheduled => {
                self.pending -= 1;
                event
            }
            EventState::Canceled => None,
        }
    }

    pub(crate) fn advance_day(&mut self) {
        self.current_day += 1;
        self.current_day_closed = false;
    }

    /// Drops every pooled event. Called once at teardown.
    pub fn release_pool(&mut self) {
        self.events.release_pool();
        self.timeline = Vec::new();
        self.pending = 0;
    }

    #[must_use]
    pub fn current_day(&self) -> Day {
        self.current_day
    }

    #[must_use]
    pub fn total_days(&self) -> Day {
        self.total_days
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.current_day >= self.total_days
    }

    #[must_use]
    pub fn start_date(&self) -> NaiveDate {
        self.start_date
    }

    #[must_use]
    pub fn date_of(&self, day: Day) -> NaiveDate {
        self.start_date + Days::new(u64::from(day))
    }

    #[must_use]
    pub fn current_date(&self) -> NaiveDate {
        self.date_of(self.current_day)
    }

    /// True if the day after the current one starts a new month.
    #[must_use]
    pub fn is_last_day_of_month(&self) -> bool {
        self.date_of(self.current_day + 1).day() == 1
    }

    /// True if the day after the current one starts a new year.
    #[must_use]
    pub fn is_last_day_of_year(&self) -> bool {
        self.date_of(self.current_day + 1).ordinal() == 1
    }

    /// Events scheduled and neither executed nor cancelled.
    #[must_use]
    pub fn number_of_pending_events(&self) -> usize {
        self.pending
    }

    /// Pool slots in use, which includes cancelled events whose day has not arrived yet.
    #[must_use]
    pub fn live_events(&self) -> usize {
        self.events.live()
    }

    #[must_use]
    pub fn pool_capacity(&self) -> usize {
        self.events.capacity()
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Scheduler::new(NaiveDate::default(), 0, 0)
    }
}
