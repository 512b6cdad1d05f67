//! A day-stepped individual-based simulation core for malaria transmission, parasite genetics
//! and antimalarial drug resistance.
//!
//! The central object of a run is the [`Context`]. It keeps the simulation clock and the
//! day-indexed queue of pending events, and holds the per-run state of every feature module:
//! * the run's parameters, read once from JSON ([`parameters`])
//! * the drug database with each drug's PK/PD kernel ([`drug`])
//! * the interned parasite genotypes and the mutation and recombination operations on them
//!   ([`genotype`])
//! * the mosquito stage where parasites of different hosts recombine ([`mosquito`])
//! * the run's random number generator ([`random`]) and report files ([`report`])
//!
//! The host population is not part of this crate. A model implements the [`Population`] trait
//! and hands it to a [`Model`], which drives it through each simulated day:
//!
//! 1. reporters, then the population's infection step
//! 2. every event scheduled for the day, in the order it was scheduled
//! 3. births, deaths, circulation and the update of the force of infection, then the mosquito
//!    stage
//! 4. the monthly reports on the last day of each month
//!
//! [`runner::run_with_args`] wraps all of this behind a command line.
pub mod context;
pub mod data_plugin;
pub mod drug;
pub mod error;
pub mod event;
pub mod genotype;
pub mod global_properties;
pub mod log;
pub mod model;
pub mod mosquito;
pub mod parameters;
pub mod pool;
pub mod population;
pub mod prelude;
pub mod random;
pub mod report;
pub mod runner;
pub mod scheduler;

pub use crate::context::{Context, TimeStepHandler};
pub use crate::error::SimError;
pub use crate::event::{Event, LocationId, Owner, ParasiteId, PersonId, TherapyId};
pub use crate::model::Model;
pub use crate::population::Population;
pub use crate::scheduler::{Day, EventId};

// Re-exported for use in macros
pub use csv;
