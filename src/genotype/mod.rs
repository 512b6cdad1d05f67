//! Parasite genotypes.
//!
//! A genotype is identified by its amino-acid sequence string. The [`GenotypeDatabase`] held by
//! the context interns each distinct sequence once and hands out [`GenotypeId`]s, which is what
//! the rest of the model stores. The derived values of a genotype (daily fitness and the EC50 of
//! each drug raised to its Hill coefficient) are computed at interning time from the gene
//! metadata in the run's parameters.
mod database;
mod gene_info;
mod genotype;

use std::cell::{Ref, RefCell};

use log::trace;
use serde::{Deserialize, Serialize};

pub use database::GenotypeDatabase;
pub use gene_info::{
    AaPositionInfo, ChromosomeInfo, GeneInfo, PfGeneInfo, ResistantAaLocation,
    NUMBER_OF_CHROMOSOMES,
};
pub use genotype::Genotype;

#[cfg(test)]
pub(crate) use gene_info::sample_gene_info;

use crate::context::Context;
use crate::define_data_plugin;
use crate::drug::{ContextDrugExt, DrugId};
use crate::error::SimError;
use crate::parameters::ContextParametersExt;
use crate::random::ContextRandomExt;

/// Index of an interned genotype.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GenotypeId(pub usize);

define_data_plugin!(
    GenotypePlugin,
    Option<RefCell<GenotypeDatabase>>,
    None
);

fn database(context: &Context) -> &RefCell<GenotypeDatabase> {
    context
        .get_data(GenotypePlugin)
        .and_then(Option::as_ref)
        .expect("Genotype database is not initialized")
}

/// Genotype operations on the context. Interning needs the run's parameters and the drug
/// database to be initialized.
pub trait ContextGenotypeExt {
    /// Starts an empty genotype database, dropping any existing one.
    fn init_genotype_database(&mut self);

    /// Returns the id of `aa_sequence`, interning it if needed.
    ///
    /// # Errors
    ///
    /// Returns `SimError::InvalidGenotype` if the sequence does not match the gene metadata.
    fn genotype_id_for(&self, aa_sequence: &str) -> Result<GenotypeId, SimError>;

    fn find_genotype(&self, aa_sequence: &str) -> Option<GenotypeId>;

    /// # Panics
    ///
    /// Panics if `id` does not exist.
    fn get_genotype(&self, id: GenotypeId) -> Ref<Genotype>;

    fn number_of_genotypes(&self) -> usize;

    /// Mutates genotype `id` under pressure from drug `drug_id`, drawing from the context's
    /// generator.
    ///
    /// # Errors
    ///
    /// Returns `SimError::InvalidGenotype` if the mutant does not match the gene metadata.
    fn perform_mutation_by_drug(&self, id: GenotypeId, drug_id: DrugId)
        -> Result<GenotypeId, SimError>;

    /// Recombines two genotypes chromosome by chromosome.
    ///
    /// # Errors
    ///
    /// Returns `SimError::InvalidGenotype` if the recombinant does not match the gene metadata.
    fn free_recombine(&self, first: GenotypeId, second: GenotypeId)
        -> Result<GenotypeId, SimError>;

    /// Returns `id` unchanged until targeted mutation is defined.
    fn combine_mutation_to(&self, id: GenotypeId, _locus: usize, _value: usize) -> GenotypeId {
        id
    }
}

impl ContextGenotypeExt for Context {
    fn init_genotype_database(&mut self) {
        trace!("initializing genotype database");
        *self.get_data_mut(GenotypePlugin) = Some(RefCell::new(GenotypeDatabase::new()));
    }

    fn genotype_id_for(&self, aa_sequence: &str) -> Result<GenotypeId, SimError> {
        let gene_info = &self.get_parameters().pf_gene_info;
        database(self)
            .borrow_mut()
            .get_or_insert(aa_sequence, gene_info, self.get_drug_database())
    }

    fn find_genotype(&self, aa_sequence: &str) -> Option<GenotypeId> {
        database(self).borrow().get_id(aa_sequence)
    }

    fn get_genotype(&self, id: GenotypeId) -> Ref<Genotype> {
        Ref::map(database(self).borrow(), |database| {
            database
                .get(id)
                .unwrap_or_else(|| panic!("Genotype {} does not exist", id.0))
        })
    }

    fn number_of_genotypes(&self) -> usize {
        self.get_data(GenotypePlugin)
            .and_then(Option::as_ref)
            .map_or(0, |database| database.borrow().len())
    }

    fn perform_mutation_by_drug(
        &self,
        id: GenotypeId,
        drug_id: DrugId,
    ) -> Result<GenotypeId, SimError> {
        let gene_info = &self.get_parameters().pf_gene_info;
        let drug_db = self.get_drug_database();
        let drug = self.get_drug_type(drug_id);
        self.sample(|rng| {
            database(self)
                .borrow_mut()
                .perform_mutation_by_drug(id, drug, gene_info, drug_db, rng)
        })
    }

    fn free_recombine(
        &self,
        first: GenotypeId,
        second: GenotypeId,
    ) -> Result<GenotypeId, SimError> {
        let gene_info = &self.get_parameters().pf_gene_info;
        let drug_db = self.get_drug_database();
        self.sample(|rng| {
            database(self)
                .borrow_mut()
                .free_recombine(first, second, gene_info, drug_db, rng)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drug::sample_drug_parameters;
    use crate::parameters::sample_parameters;

    fn context() -> Context {
        let mut context = Context::new();
        context.init_random(42);
        context.set_parameters(sample_parameters()).unwrap();
        context.init_drug_database().unwrap();
        context.init_genotype_database();
        context
    }

    #[test]
    fn intern_through_context() {
        let context = context();
        let id = context.genotype_id_for("||||N1||K||||||CR|").unwrap();
        assert_eq!(context.genotype_id_for("||||N1||K||||||CR|").unwrap(), id);
        assert_eq!(context.find_genotype("||||N1||K||||||CR|"), Some(id));
        assert_eq!(context.find_genotype("||||Y1||K||||||CR|"), None);
        assert_eq!(context.number_of_genotypes(), 1);
        assert_eq!(context.get_genotype(id).aa_sequence(), "||||N1||K||||||CR|");
        assert_eq!(sample_drug_parameters().len(), 3);
    }

    #[test]
    fn invalid_seed_through_context() {
        let context = context();
        assert!(context.genotype_id_for("||||N1||K||||||CR").is_err());
        assert_eq!(context.number_of_genotypes(), 0);
    }

    #[test]
    fn mutation_is_reproducible() {
        let run = || {
            let context = context();
            let mut id = context.genotype_id_for("||||N1||K||||||CR|").unwrap();
            for step in 0..30 {
                id = context.perform_mutation_by_drug(id, step % 3).unwrap();
            }
            let sequence = context.get_genotype(id).aa_sequence().to_string();
            sequence
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn recombination_through_context() {
        let context = context();
        let first = context.genotype_id_for("||||N1||K||||||CR|").unwrap();
        let second = context.genotype_id_for("||||Y3||T||||||YT|").unwrap();
        let child = context.free_recombine(first, second).unwrap();
        assert!(context.get_genotype(child).is_valid(&context.get_parameters().pf_gene_info));
        assert_eq!(context.free_recombine(first, first).unwrap(), first);
    }

    #[test]
    fn combine_mutation_is_identity() {
        let context = context();
        let id = context.genotype_id_for("||||N1||K||||||CR|").unwrap();
        assert_eq!(context.combine_mutation_to(id, 4, 1), id);
    }

    #[test]
    #[should_panic(expected = "Genotype database is not initialized")]
    fn use_before_init() {
        let context = Context::new();
        context.find_genotype("|||||||||||||");
    }
}
