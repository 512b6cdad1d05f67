//! The host population the model drives.
//!
//! The population owns people, their parasites and immunity, and the force of infection of
//! each location. The model calls its day hooks at fixed points of every day and forwards each
//! person-bound event to the matching behavior method. Behavior methods do nothing by default,
//! so a population only implements the event kinds it actually schedules.
use crate::context::Context;
use crate::error::SimError;
use crate::event::{LocationId, ParasiteId, PersonId, TherapyId};
use crate::genotype::GenotypeId;
use crate::mosquito::BloodMealSource;
use crate::scheduler::Day;

#[allow(unused_variables, clippy::missing_errors_doc)]
pub trait Population {
    /// Builds the initial population. Called after the genotype and drug databases exist.
    fn initialize(&mut self, context: &mut Context) -> Result<(), SimError>;

    /// Infects the population according to the configured initial parasite info.
    fn introduce_initial_cases(&mut self, context: &mut Context) -> Result<(), SimError>;

    fn perform_infection_event(&mut self, context: &mut Context) -> Result<(), SimError>;

    fn perform_birth_event(&mut self, context: &mut Context) -> Result<(), SimError>;

    fn perform_death_event(&mut self, context: &mut Context) -> Result<(), SimError>;

    fn perform_circulation_event(&mut self, context: &mut Context) -> Result<(), SimError>;

    fn update_force_of_infection(&mut self, context: &mut Context, day: Day)
        -> Result<(), SimError>;

    /// Infects `count` people of `location` with `genotype`.
    fn introduce_parasite(
        &mut self,
        context: &mut Context,
        location: LocationId,
        genotype: GenotypeId,
        count: u32,
    ) -> Result<(), SimError>;

    /// Periodic update of one person. Returning `false` ends that person's update chain,
    /// for example because the person has died.
    fn update_person(&mut self, context: &mut Context, person: PersonId) -> Result<bool, SimError> {
        Ok(true)
    }

    /// Host data for the mosquito stage. Without it the stage is not run.
    fn blood_meal_source(&self) -> Option<&dyn BloodMealSource> {
        None
    }

    fn birthday(&mut self, context: &mut Context, person: PersonId) -> Result<(), SimError> {
        Ok(())
    }

    fn progress_to_clinical(
        &mut self,
        context: &mut Context,
        person: PersonId,
        parasite: ParasiteId,
    ) -> Result<(), SimError> {
        Ok(())
    }

    fn end_clinical(&mut self, context: &mut Context, person: PersonId) -> Result<(), SimError> {
        Ok(())
    }

    fn end_clinical_by_no_treatment(
        &mut self,
        context: &mut Context,
        person: PersonId,
        parasite: ParasiteId,
    ) -> Result<(), SimError> {
        Ok(())
    }

    fn end_clinical_due_to_drug_resistance(
        &mut self,
        context: &mut Context,
        person: PersonId,
    ) -> Result<(), SimError> {
        Ok(())
    }

    fn test_treatment_failure(
        &mut self,
        context: &mut Context,
        person: PersonId,
        parasite: ParasiteId,
        therapy: TherapyId,
    ) -> Result<(), SimError> {
        Ok(())
    }

    fn update_when_drug_is_present(
        &mut self,
        context: &mut Context,
        person: PersonId,
        parasite: ParasiteId,
    ) -> Result<(), SimError> {
        Ok(())
    }

    fn mature_gametocyte(
        &mut self,
        context: &mut Context,
        person: PersonId,
        parasite: ParasiteId,
    ) -> Result<(), SimError> {
        Ok(())
    }

    fn move_parasite_to_blood(
        &mut self,
        context: &mut Context,
        person: PersonId,
        genotype: GenotypeId,
    ) -> Result<(), SimError> {
        Ok(())
    }

    fn circulate_to_target_location(
        &mut self,
        context: &mut Context,
        person: PersonId,
        target_location: LocationId,
    ) -> Result<(), SimError> {
        Ok(())
    }

    fn return_to_residence(
        &mut self,
        context: &mut Context,
        person: PersonId,
    ) -> Result<(), SimError> {
        Ok(())
    }

    fn switch_immune_component(
        &mut self,
        context: &mut Context,
        person: PersonId,
    ) -> Result<(), SimError> {
        Ok(())
    }
}
