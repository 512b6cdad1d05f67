//! The mosquito stage, where parasites from different hosts meet and recombine.
//!
//! Each day the stage samples, for every location, `prmc_size` blood meals and stores the
//! genotype that each meal passes on. A meal is taken from a first host chosen by individual
//! force of infection; with an interrupted feeding the mosquito also bites a second, uniformly
//! chosen host. Two parents are drawn from the parasites of the bitten hosts, weighted by their
//! infectivity, and the stored genotype is their free recombinant (or the shared genotype when
//! both parents are the same).
//!
//! Cohorts are kept for `number_of_tracking_days` days so that infections can draw from the
//! cohort that has finished its development in the mosquito.
use std::cell::RefCell;

use log::trace;

use crate::context::Context;
use crate::define_data_plugin;
use crate::error::SimError;
use crate::event::{LocationId, PersonId};
use crate::genotype::{ContextGenotypeExt, GenotypeId};
use crate::parameters::{ContextParametersExt, MosquitoConfig};
use crate::random::ContextRandomExt;

/// What the mosquito stage needs to know about the hosts.
pub trait BloodMealSource {
    /// Total force of infection of `location`.
    fn force_of_infection(&self, location: LocationId) -> f64;

    /// Living hosts of `location`.
    fn hosts(&self, location: LocationId) -> &[PersonId];

    /// Force of infection of each host of `location`, in the order of `hosts`.
    fn individual_force_of_infection(&self, location: LocationId) -> &[f64];

    /// Each parasite population of `person` with its weight as a source of gametocytes
    /// (gametocyte level times relative infectivity).
    fn infectious_parasites(&self, person: PersonId) -> Vec<(GenotypeId, f64)>;
}

pub struct Mosquito {
    prmc_size: usize,
    interrupted_feeding_rate: Vec<f64>,
    /// `[tracking_index][location][slot]`
    genotypes_table: Vec<Vec<Vec<Option<GenotypeId>>>>,
}

impl Mosquito {
    /// Builds an empty table. A single interrupted feeding rate applies to every location.
    ///
    /// # Errors
    ///
    /// Returns `SimError::InvalidParameters` if the number of rates is neither 1 nor
    /// `number_of_locations`.
    pub fn new(config: &MosquitoConfig, number_of_locations: usize) -> Result<Mosquito, SimError> {
        let interrupted_feeding_rate = match config.interrupted_feeding_rate.as_slice() {
            [rate] => vec![*rate; number_of_locations],
            rates if rates.len() == number_of_locations => rates.to_vec(),
            _ => {
                return Err(SimError::InvalidParameters(format!(
                    "interrupted_feeding_rate must have 1 or {number_of_locations} values"
                )))
            }
        };
        trace!(
            "mosquito stage: {} tracking days, {number_of_locations} locations, {} slots",
            config.number_of_tracking_days,
            config.prmc_size
        );
        Ok(Mosquito {
            prmc_size: config.prmc_size,
            interrupted_feeding_rate,
            genotypes_table: vec![
                vec![vec![None; config.prmc_size]; number_of_locations];
                config.number_of_tracking_days
            ],
        })
    }

    #[must_use]
    pub fn number_of_tracking_days(&self) -> usize {
        self.genotypes_table.len()
    }

    #[must_use]
    pub fn interrupted_feeding_rate(&self, location: LocationId) -> f64 {
        self.interrupted_feeding_rate[location.0]
    }

    /// The stored cohort of `location` for `tracking_index`.
    #[must_use]
    pub fn genotypes(&self, tracking_index: usize, location: LocationId) -> &[Option<GenotypeId>] {
        &self.genotypes_table[tracking_index][location.0]
    }

    /// `prmc_size` flags, of which a Poisson(`rate * prmc_size`) number (at most all) are set,
    /// in random positions.
    fn build_interrupted_feeding_indices(&self, context: &Context, rate: f64) -> Vec<bool> {
        #[allow(clippy::cast_precision_loss)]
        let expected = rate * self.prmc_size as f64;
        let interrupted = usize::try_from(context.random_poisson(expected))
            .unwrap_or(usize::MAX)
            .min(self.prmc_size);
        let mut indices = vec![true; interrupted];
        indices.resize(self.prmc_size, false);
        context.shuffle(&mut indices);
        indices
    }

    /// Fills row `tracking_index` with a new cohort for every location. Locations without
    /// force of infection are cleared.
    ///
    /// # Errors
    ///
    /// Returns an error if a bitten host carries no parasite, or if a recombinant does not
    /// match the gene metadata.
    pub fn infect_new_cohort_in_prmc<S: BloodMealSource + ?Sized>(
        &mut self,
        context: &Context,
        source: &S,
        tracking_index: usize,
    ) -> Result<(), SimError> {
        for loc in 0..self.interrupted_feeding_rate.len() {
            let location = LocationId(loc);
            let hosts = source.hosts(location);
            if source.force_of_infection(location) <= 0.0 || hosts.is_empty() {
                self.genotypes_table[tracking_index][loc].fill(None);
                continue;
            }
            let weights = source.individual_force_of_infection(location);
            let interrupted =
                self.build_interrupted_feeding_indices(context, self.interrupted_feeding_rate[loc]);

            for (slot, is_interrupted) in interrupted.into_iter().enumerate() {
                let Some(first) = context.sample_weighted(weights) else {
                    self.genotypes_table[tracking_index][loc].fill(None);
                    break;
                };
                let second = context.random_uniform(hosts.len());

                let mut candidates = source.infectious_parasites(hosts[first]);
                if is_interrupted {
                    candidates.extend(source.infectious_parasites(hosts[second]));
                }
                if candidates.is_empty() {
                    return Err(SimError::SimError(format!(
                        "host {} was bitten at location {loc} but carries no parasite",
                        hosts[first].0
                    )));
                }

                let parent_weights: Vec<f64> =
                    candidates.iter().map(|(_, weight)| *weight).collect();
                let draw_parent = || {
                    context
                        .sample_weighted(&parent_weights)
                        .unwrap_or_else(|| context.random_uniform(candidates.len()))
                };
                let (first_parent, second_parent) = (draw_parent(), draw_parent());
                let (first_parent, second_parent) =
                    (candidates[first_parent].0, candidates[second_parent].0);

                let genotype = if first_parent == second_parent {
                    first_parent
                } else {
                    context.free_recombine(first_parent, second_parent)?
                };
                self.genotypes_table[tracking_index][loc][slot] = Some(genotype);
            }
        }
        Ok(())
    }

    /// A genotype drawn uniformly from the cohort of `location` at `tracking_index`, or `None`
    /// if the drawn slot is empty.
    #[must_use]
    pub fn random_genotype(
        &self,
        context: &Context,
        location: LocationId,
        tracking_index: usize,
    ) -> Option<GenotypeId> {
        if self.prmc_size == 0 {
            return None;
        }
        let slot = context.random_uniform(self.prmc_size);
        self.genotypes_table[tracking_index][location.0][slot]
    }
}

define_data_plugin!(MosquitoPlugin, Option<RefCell<Mosquito>>, None);

fn mosquito(context: &Context) -> &RefCell<Mosquito> {
    context
        .get_data(MosquitoPlugin)
        .and_then(Option::as_ref)
        .expect("Mosquito stage is not initialized")
}

pub trait ContextMosquitoExt {
    /// Builds the mosquito stage from the `mosquito` section of the parameters.
    ///
    /// # Errors
    ///
    /// Returns `SimError::InvalidParameters` if the parameters have no `mosquito` section or
    /// it does not fit the number of locations.
    fn init_mosquito(&mut self) -> Result<(), SimError>;

    fn has_mosquito(&self) -> bool;

    /// # Errors
    ///
    /// See [`Mosquito::infect_new_cohort_in_prmc`].
    ///
    /// # Panics
    ///
    /// Panics if the mosquito stage is not initialized.
    fn infect_new_cohort_in_prmc(
        &self,
        source: &dyn BloodMealSource,
        tracking_index: usize,
    ) -> Result<(), SimError>;

    /// # Panics
    ///
    /// Panics if the mosquito stage is not initialized.
    fn mosquito_random_genotype(&self, location: LocationId, tracking_index: usize)
        -> Option<GenotypeId>;

    /// # Panics
    ///
    /// Panics if the mosquito stage is not initialized.
    fn number_of_tracking_days(&self) -> usize;
}

impl ContextMosquitoExt for Context {
    fn init_mosquito(&mut self) -> Result<(), SimError> {
        let parameters = self.get_parameters();
        let config = parameters.mosquito.as_ref().ok_or_else(|| {
            SimError::InvalidParameters("no mosquito section in parameters".to_string())
        })?;
        let stage = Mosquito::new(config, parameters.number_of_locations)?;
        *self.get_data_mut(MosquitoPlugin) = Some(RefCell::new(stage));
        Ok(())
    }

    fn has_mosquito(&self) -> bool {
        self.get_data(MosquitoPlugin).is_some_and(Option::is_some)
    }

    fn infect_new_cohort_in_prmc(
        &self,
        source: &dyn BloodMealSource,
        tracking_index: usize,
    ) -> Result<(), SimError> {
        mosquito(self)
            .borrow_mut()
            .infect_new_cohort_in_prmc(self, source, tracking_index)
    }

    fn mosquito_random_genotype(
        &self,
        location: LocationId,
        tracking_index: usize,
    ) -> Option<GenotypeId> {
        mosquito(self)
            .borrow()
            .random_genotype(self, location, tracking_index)
    }

    fn number_of_tracking_days(&self) -> usize {
        mosquito(self).borrow().number_of_tracking_days()
    }
}
