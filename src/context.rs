//! The `Context` owns everything that belongs to one simulation run: the clock and its pending
//! events, and any number of data containers registered by feature modules.
//!
//! Feature modules attach their state through [`DataPlugin`]s and expose it with extension traits
//! on `Context` (`ContextRandomExt`, `ContextGenotypeExt`, ...). Nothing is stored in globals, so
//! two contexts in the same process are fully independent.
//!
//! A run is driven by [`Context::execute`], which steps the clock one day at a time and hands
//! control to a [`TimeStepHandler`] at fixed points of each day:
//!
//! 1. `begin_time_step`
//! 2. `execute_event` for each event scheduled for the day, in scheduling order
//! 3. `end_time_step`
//! 4. `monthly_update` if the next day starts a new month, then `yearly_update` if it starts a
//!    new year
use std::any::{Any, TypeId};

use chrono::NaiveDate;
use log::{info, trace};
use rustc_hash::FxHashMap as HashMap;

use crate::data_plugin::DataPlugin;
use crate::error::SimError;
use crate::event::Event;
use crate::scheduler::{Day, EventId, Scheduler};

/// Receives control from [`Context::execute`] at the fixed points of each simulated day.
///
/// Returning an error from any hook stops the run.
pub trait TimeStepHandler {
    #[allow(clippy::missing_errors_doc)]
    fn begin_time_step(&mut self, context: &mut Context) -> Result<(), SimError>;

    #[allow(clippy::missing_errors_doc)]
    fn execute_event(&mut self, context: &mut Context, event: Event) -> Result<(), SimError>;

    #[allow(clippy::missing_errors_doc)]
    fn end_time_step(&mut self, context: &mut Context) -> Result<(), SimError>;

    #[allow(clippy::missing_errors_doc)]
    fn monthly_update(&mut self, context: &mut Context) -> Result<(), SimError>;

    #[allow(clippy::missing_errors_doc)]
    fn yearly_update(&mut self, context: &mut Context) -> Result<(), SimError>;
}

pub struct Context {
    scheduler: Scheduler,
    data_plugins: HashMap<TypeId, Box<dyn Any>>,
}

impl Context {
    #[must_use]
    pub fn new() -> Context {
        Context {
            scheduler: Scheduler::default(),
            data_plugins: HashMap::default(),
        }
    }

    /// Replaces the scheduler with a fresh one starting at day 0 of `start_date`. Every pending
    /// event is dropped.
    pub fn init_scheduler(&mut self, start_date: NaiveDate, total_days: Day, pool_capacity: usize) {
        trace!(
            "initializing scheduler: {total_days} days from {start_date}, {pool_capacity} event slots"
        );
        self.scheduler = Scheduler::new(start_date, total_days, pool_capacity);
    }

    /// Releases the event pool. The context cannot schedule events afterwards.
    pub fn release_scheduler(&mut self) {
        self.scheduler.release_pool();
    }

    /// Add an event to run on `day`.
    ///
    /// Returns an `EventId` that can be used to cancel it.
    ///
    /// # Errors
    ///
    /// Returns `SimError::PoolExhausted` if the event pool is full.
    ///
    /// # Panics
    ///
    /// Panics if `day` is earlier than the current day, or is the current day after its events
    /// have started executing.
    pub fn schedule_event(&mut self, day: Day, event: Event) -> Result<EventId, SimError> {
        self.scheduler.schedule(day, event)
    }

    /// Cancel an event that has been scheduled but not executed.
    ///
    /// # Panics
    ///
    /// Panics if the event has already been executed or cancelled.
    pub fn cancel_event(&mut self, id: EventId) {
        self.scheduler.cancel(id);
    }

    #[must_use]
    pub fn is_event_pending(&self, id: EventId) -> bool {
        self.scheduler.is_pending(id)
    }

    #[must_use]
    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    #[must_use]
    pub fn get_current_day(&self) -> Day {
        self.scheduler.current_day()
    }

    #[must_use]
    pub fn get_current_date(&self) -> NaiveDate {
        self.scheduler.current_date()
    }

    #[must_use]
    pub fn get_total_days(&self) -> Day {
        self.scheduler.total_days()
    }

    fn add_plugin<T: DataPlugin>(&mut self) {
        self.data_plugins
            .insert(TypeId::of::<T>(), Box::new(T::create_data_container()));
    }

    /// Returns the data container of plugin `T`, creating it on first use.
    pub fn get_data_mut<T: DataPlugin>(&mut self, _plugin: T) -> &mut T::DataContainer {
        let type_id = TypeId::of::<T>();
        if !self.data_plugins.contains_key(&type_id) {
            self.add_plugin::<T>();
        }
        self.data_plugins
            .get_mut(&type_id)
            .and_then(|data| data.downcast_mut::<T::DataContainer>())
            .expect("Data plugin holds a container of the wrong type")
    }

    /// Returns the data container of plugin `T`, or `None` if nothing has created it yet.
    #[must_use]
    pub fn get_data<T: DataPlugin>(&self, _plugin: T) -> Option<&T::DataContainer> {
        self.data_plugins
            .get(&TypeId::of::<T>())
            .and_then(|data| data.downcast_ref::<T::DataContainer>())
    }

    /// Runs the simulation from the current day until the last day, calling `handler` at the
    /// fixed points of each day.
    ///
    /// # Errors
    ///
    /// Returns the first error produced by `handler` or by event scheduling. The clock is left on
    /// the day the error happened. Events of that day that had not run yet are dropped.
    pub fn execute<H: TimeStepHandler>(&mut self, handler: &mut H) -> Result<(), SimError> {
        info!(
            "running days {} to {} from {}",
            self.scheduler.current_day(),
            self.scheduler.total_days(),
            self.scheduler.start_date()
        );
        while !self.scheduler.is_finished() {
            handler.begin_time_step(self)?;

            let today = self.scheduler.take_current_day();
            for (index, id) in today.iter().enumerate() {
                if let Some(event) = self.scheduler.pop_event(*id) {
                    trace!("day {}: executing {event}", self.scheduler.current_day());
                    if let Err(error) = handler.execute_event(self, event) {
                        // the rest of the day is already off the timeline
                        for rest in &today[index + 1..] {
                            self.scheduler.pop_event(*rest);
                        }
                        return Err(error);
                    }
                }
            }

            handler.end_time_step(self)?;
            if self.scheduler.is_last_day_of_month() {
                handler.monthly_update(self)?;
            }
            if self.scheduler.is_last_day_of_year() {
                handler.yearly_update(self)?;
            }
            self.scheduler.advance_day();
        }
        info!("finished at day {}", self.scheduler.current_day());
        Ok(())
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::define_data_plugin;
    use crate::event::PersonId;

    define_data_plugin!(ComponentA, Vec<u32>, vec![]);

    fn birthday(id: usize) -> Event {
        Event::Birthday {
            person: PersonId(id),
        }
    }

    fn context(total_days: Day) -> Context {
        let mut context = Context::new();
        context.init_scheduler(NaiveDate::from_ymd_opt(2000, 1, 1).unwrap(), total_days, 16);
        context
    }

    /// Records what happened on which day.
    #[derive(Default)]
    struct Recorder {
        log: Vec<(Day, String)>,
        reschedule_in: Option<Day>,
        fail_on_day: Option<Day>,
        fail_on_person: Option<usize>,
    }

    impl TimeStepHandler for Recorder {
        fn begin_time_step(&mut self, context: &mut Context) -> Result<(), SimError> {
            if Some(context.get_current_day()) == self.fail_on_day {
                return Err("planned failure".into());
            }
            Ok(())
        }

        fn execute_event(&mut self, context: &mut Context, event: Event) -> Result<(), SimError> {
            let day = context.get_current_day();
            if let Event::Birthday { person } = event {
                if Some(person.0) == self.fail_on_person {
                    return Err("planned failure".into());
                }
                self.log.push((day, format!("birthday {}", person.0)));
                context.get_data_mut(ComponentA).push(person.0 as u32);
                if let Some(delay) = self.reschedule_in {
                    context.schedule_event(day + delay, birthday(person.0 + 1))?;
                }
            }
            Ok(())
        }

        fn end_time_step(&mut self, _context: &mut Context) -> Result<(), SimError> {
            Ok(())
        }

        fn monthly_update(&mut self, context: &mut Context) -> Result<(), SimError> {
            self.log
                .push((context.get_current_day(), "month".to_string()));
            Ok(())
        }

        fn yearly_update(&mut self, context: &mut Context) -> Result<(), SimError> {
            self.log.push((context.get_current_day(), "year".to_string()));
            Ok(())
        }
    }

    #[test]
    fn empty_context() {
        let mut context = context(0);
        context.execute(&mut Recorder::default()).unwrap();
        assert_eq!(context.get_current_day(), 0);
        assert!(context.get_data(ComponentA).is_none());
    }

    #[test]
    fn event_runs_once_on_its_day() {
        let mut context = context(10);
        context.schedule_event(3, birthday(1)).unwrap();
        let mut recorder = Recorder::default();
        context.execute(&mut recorder).unwrap();
        assert_eq!(recorder.log, vec![(3, "birthday 1".to_string())]);
        assert_eq!(context.get_current_day(), 10);
        assert_eq!(context.scheduler().live_events(), 0);
    }

    #[test]
    fn events_on_same_day_fire_in_order() {
        let mut context = context(5);
        context.schedule_event(1, birthday(1)).unwrap();
        context.schedule_event(1, birthday(2)).unwrap();
        context.execute(&mut Recorder::default()).unwrap();
        assert_eq!(*context.get_data_mut(ComponentA), vec![1, 2]);
    }

    #[test]
    fn event_chain_is_deferred_to_future_days() {
        let mut context = context(7);
        context.schedule_event(0, birthday(0)).unwrap();
        let mut recorder = Recorder {
            reschedule_in: Some(3),
            ..Recorder::default()
        };
        context.execute(&mut recorder).unwrap();
        assert_eq!(
            recorder.log,
            vec![
                (0, "birthday 0".to_string()),
                (3, "birthday 1".to_string()),
                (6, "birthday 2".to_string()),
            ]
        );
        // The fourth link was scheduled for day 9, after the end of the run.
        assert_eq!(context.scheduler().number_of_pending_events(), 1);
    }

    #[test]
    #[should_panic(expected = "Invalid day")]
    fn scheduling_for_today_while_executing() {
        let mut context = context(2);
        context.schedule_event(0, birthday(0)).unwrap();
        let mut recorder = Recorder {
            reschedule_in: Some(0),
            ..Recorder::default()
        };
        let _ = context.execute(&mut recorder);
    }

    #[test]
    fn cancelled_event_does_not_run() {
        let mut context = context(5);
        let to_cancel = context.schedule_event(2, birthday(1)).unwrap();
        context.schedule_event(2, birthday(2)).unwrap();
        context.cancel_event(to_cancel);
        assert!(!context.is_event_pending(to_cancel));
        context.execute(&mut Recorder::default()).unwrap();
        assert_eq!(*context.get_data_mut(ComponentA), vec![2]);
    }

    #[test]
    fn month_and_year_hooks() {
        let mut context = Context::new();
        context.init_scheduler(NaiveDate::from_ymd_opt(1999, 11, 30).unwrap(), 33, 1);
        let mut recorder = Recorder::default();
        context.execute(&mut recorder).unwrap();
        assert_eq!(
            recorder.log,
            vec![
                (0, "month".to_string()),
                (31, "month".to_string()),
                (31, "year".to_string()),
            ]
        );
    }

    #[test]
    fn handler_error_stops_the_run() {
        let mut context = context(10);
        context.schedule_event(6, birthday(1)).unwrap();
        let mut recorder = Recorder {
            fail_on_day: Some(4),
            ..Recorder::default()
        };
        assert!(context.execute(&mut recorder).is_err());
        assert_eq!(context.get_current_day(), 4);
        assert!(recorder.log.is_empty());
    }

    #[test]
    fn handler_error_drops_rest_of_day() {
        let mut context = context(10);
        context.schedule_event(2, birthday(1)).unwrap();
        context.schedule_event(2, birthday(2)).unwrap();
        context.schedule_event(2, birthday(3)).unwrap();
        context.schedule_event(5, birthday(4)).unwrap();
        let mut recorder = Recorder {
            fail_on_person: Some(2),
            ..Recorder::default()
        };
        assert!(context.execute(&mut recorder).is_err());
        assert_eq!(context.get_current_day(), 2);
        assert_eq!(recorder.log, vec![(2, "birthday 1".to_string())]);
        // only the day 5 event is still pending and holding a slot
        assert_eq!(context.scheduler().number_of_pending_events(), 1);
        assert_eq!(context.scheduler().live_events(), 1);
    }

    #[test]
    fn executed_event_slot_is_reused() {
        let mut context = Context::new();
        context.init_scheduler(NaiveDate::from_ymd_opt(2000, 1, 1).unwrap(), 10, 1);
        context.schedule_event(0, birthday(0)).unwrap();
        context.schedule_event(0, birthday(0)).unwrap_err();
        let mut recorder = Recorder {
            reschedule_in: Some(1),
            ..Recorder::default()
        };
        // The slot of the first event is released before it runs, so the chain can continue.
        context.execute(&mut recorder).unwrap();
        assert_eq!(recorder.log.len(), 10);
    }
}
