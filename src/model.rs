//! Wires a [`Population`] and its reporters to the day loop of a [`Context`].
//!
//! The model owns the run's lifecycle: [`Model::initialize`] builds every per-run store from the
//! parameters and schedules the configured importations, [`Model::run`] steps through the days,
//! and [`Model::release`] frees the event pool. During the run the model is the context's
//! [`TimeStepHandler`]: it calls the population's day hooks and dispatches each event.
use log::{debug, info};

use crate::context::{Context, TimeStepHandler};
use crate::drug::ContextDrugExt;
use crate::error::SimError;
use crate::event::{Event, LocationId};
use crate::genotype::{ContextGenotypeExt, GenotypeId};
use crate::mosquito::ContextMosquitoExt;
use crate::parameters::ContextParametersExt;
use crate::population::Population;
use crate::random::ContextRandomExt;
use crate::report::Reporter;

pub struct Model<P: Population> {
    population: P,
    reporters: Vec<Box<dyn Reporter>>,
}

impl<P: Population> Model<P> {
    #[must_use]
    pub fn new(population: P) -> Model<P> {
        Model {
            population,
            reporters: Vec::new(),
        }
    }

    pub fn add_reporter(&mut self, reporter: Box<dyn Reporter>) {
        self.reporters.push(reporter);
    }

    #[must_use]
    pub fn population(&self) -> &P {
        &self.population
    }

    pub fn population_mut(&mut self) -> &mut P {
        &mut self.population
    }

    /// Prepares `context` for a run. Parameters must be set and the random generator seeded.
    ///
    /// # Errors
    ///
    /// Returns an error if a configured sequence is not a valid genotype, if the mosquito
    /// section does not fit the locations, if the event pool is too small for the initial
    /// events, or if a reporter or the population fails to initialize.
    pub fn initialize(&mut self, context: &mut Context) -> Result<(), SimError> {
        let parameters = context.get_parameters().clone();
        info!(
            "initializing model: {} days from {}, {} locations",
            parameters.total_time, parameters.starting_date, parameters.number_of_locations
        );
        context.init_scheduler(
            parameters.starting_date()?,
            parameters.total_time,
            parameters.object_pool_size,
        );
        context.init_drug_database()?;
        context.init_genotype_database();

        for info in &parameters.initial_parasite_info {
            context.genotype_id_for(&info.aa_sequence)?;
        }

        for reporter in &mut self.reporters {
            reporter.initialize(context)?;
        }
        self.population.initialize(context)?;
        self.population.introduce_initial_cases(context)?;

        if parameters.mosquito.is_some() {
            context.init_mosquito()?;
        }

        for info in &parameters.importation_parasite_periodically_info {
            let genotype = context.genotype_id_for(&info.aa_sequence)?;
            context.schedule_event(
                info.start_day,
                Event::ImportationPeriodically {
                    location: LocationId(info.location),
                    genotype,
                    number: info.number,
                    duration: info.duration,
                },
            )?;
        }
        for info in &parameters.importation_parasite_info {
            let genotype = context.genotype_id_for(&info.aa_sequence)?;
            context.schedule_event(
                info.day,
                Event::Importation {
                    location: LocationId(info.location),
                    genotype,
                    number: info.number,
                },
            )?;
        }
        info!(
            "model initialized with {} genotypes and {} pending events",
            context.number_of_genotypes(),
            context.scheduler().number_of_pending_events()
        );
        Ok(())
    }

    /// # Errors
    ///
    /// Returns the first error raised by a reporter, the population or the scheduler.
    pub fn run(&mut self, context: &mut Context) -> Result<(), SimError> {
        for reporter in &mut self.reporters {
            reporter.before_run(context)?;
        }
        context.execute(self)?;
        for reporter in &mut self.reporters {
            reporter.after_run(context)?;
        }
        Ok(())
    }

    pub fn release(&mut self, context: &mut Context) {
        context.release_scheduler();
    }

    fn introduce(
        &mut self,
        context: &mut Context,
        location: LocationId,
        genotype: GenotypeId,
        count: u32,
    ) -> Result<(), SimError> {
        debug!(
            "day {}: importing {count} cases of genotype {} into location {}",
            context.get_current_day(),
            genotype.0,
            location.0
        );
        self.population
            .introduce_parasite(context, location, genotype, count)
    }
}

impl<P: Population> TimeStepHandler for Model<P> {
    fn begin_time_step(&mut self, context: &mut Context) -> Result<(), SimError> {
        for reporter in &mut self.reporters {
            reporter.begin_time_step(context)?;
        }
        self.population.perform_infection_event(context)
    }

    fn execute_event(&mut self, context: &mut Context, event: Event) -> Result<(), SimError> {
        let population = &mut self.population;
        match event {
            Event::Birthday { person } => population.birthday(context, person),
            Event::ProgressToClinical { person, parasite } => {
                population.progress_to_clinical(context, person, parasite)
            }
            Event::EndClinical { person } => population.end_clinical(context, person),
            Event::EndClinicalByNoTreatment { person, parasite } => {
                population.end_clinical_by_no_treatment(context, person, parasite)
            }
            Event::EndClinicalDueToDrugResistance { person } => {
                population.end_clinical_due_to_drug_resistance(context, person)
            }
            Event::TestTreatmentFailure {
                person,
                parasite,
                therapy,
            } => population.test_treatment_failure(context, person, parasite, therapy),
            Event::UpdateWhenDrugIsPresent { person, parasite } => {
                population.update_when_drug_is_present(context, person, parasite)
            }
            Event::MatureGametocyte { person, parasite } => {
                population.mature_gametocyte(context, person, parasite)
            }
            Event::MoveParasiteToBlood { person, genotype } => {
                population.move_parasite_to_blood(context, person, genotype)
            }
            Event::UpdateEveryKDays { person } => {
                if population.update_person(context, person)? {
                    let day = context.get_current_day() + context.get_parameters().update_frequency;
                    context.schedule_event(day, Event::UpdateEveryKDays { person })?;
                }
                Ok(())
            }
            Event::CirculateToTargetLocationNextDay {
                person,
                target_location,
            } => population.circulate_to_target_location(context, person, target_location),
            Event::ReturnToResidence { person } => population.return_to_residence(context, person),
            Event::SwitchImmuneComponent { person } => {
                population.switch_immune_component(context, person)
            }
            Event::Importation {
                location,
                genotype,
                number,
            } => self.introduce(context, location, genotype, number),
            Event::ImportationPeriodically {
                location,
                genotype,
                number,
                duration,
            } => {
                context.schedule_event(context.get_current_day() + 1, event)?;
                let mean = f64::from(number) / f64::from(duration);
                let count = u32::try_from(context.random_poisson(mean)).unwrap_or(u32::MAX);
                if count > 0 {
                    self.introduce(context, location, genotype, count)?;
                }
                Ok(())
            }
        }
    }

    fn end_time_step(&mut self, context: &mut Context) -> Result<(), SimError> {
        self.population.perform_birth_event(context)?;
        self.population.perform_death_event(context)?;
        self.population.perform_circulation_event(context)?;
        let day = context.get_current_day();
        self.population.update_force_of_infection(context, day)?;

        if context.has_mosquito() {
            if let Some(source) = self.population.blood_meal_source() {
                let tracking_index = day as usize % context.number_of_tracking_days();
                context.infect_new_cohort_in_prmc(source, tracking_index)?;
            }
        }
        Ok(())
    }

    fn monthly_update(&mut self, context: &mut Context) -> Result<(), SimError> {
        for reporter in &mut self.reporters {
            reporter.monthly_report(context)?;
        }
        Ok(())
    }

    fn yearly_update(&mut self, context: &mut Context) -> Result<(), SimError> {
        info!(
            "end of year {}: {} genotypes, {} pending events",
            context.get_current_date().format("%Y"),
            context.number_of_genotypes(),
            context.scheduler().number_of_pending_events()
        );
        Ok(())
    }
}
