use log::debug;
use rustc_hash::FxHashMap as HashMap;

use crate::drug::{DrugDatabase, DrugType};
use crate::error::SimError;
use crate::genotype::{Genotype, GenotypeId, PfGeneInfo};
use crate::random::RandomSource;

/// Interns genotypes by sequence. Each distinct sequence is validated and its derived values
/// computed once, and every later lookup of the same sequence returns the same id.
///
/// Genotypes are never removed, so a `GenotypeId` stays valid for the whole run.
#[derive(Default)]
pub struct GenotypeDatabase {
    genotypes: Vec<Genotype>,
    ids: HashMap<String, GenotypeId>,
}

impl GenotypeDatabase {
    #[must_use]
    pub fn new() -> GenotypeDatabase {
        GenotypeDatabase::default()
    }

    /// Returns the id of `aa_sequence`, interning it first if it has not been seen.
    ///
    /// # Errors
    ///
    /// Returns `SimError::InvalidGenotype` if the sequence does not parse or does not match
    /// `gene_info`. Nothing is interned in that case.
    pub fn get_or_insert(
        &mut self,
        aa_sequence: &str,
        gene_info: &PfGeneInfo,
        drug_db: &DrugDatabase,
    ) -> Result<GenotypeId, SimError> {
        if let Some(id) = self.ids.get(aa_sequence) {
            return Ok(*id);
        }
        let mut genotype = Genotype::from_sequence(aa_sequence)?;
        genotype.validate(gene_info)?;
        genotype.calculate_daily_fitness(gene_info);
        genotype.calculate_ec50_power_n(gene_info, drug_db);

        let id = GenotypeId(self.genotypes.len());
        debug!(
            "new genotype {} {aa_sequence} (fitness {:.6})",
            id.0,
            genotype.daily_fitness()
        );
        self.genotypes.push(genotype);
        self.ids.insert(aa_sequence.to_string(), id);
        Ok(id)
    }

    #[must_use]
    pub fn get(&self, id: GenotypeId) -> Option<&Genotype> {
        self.genotypes.get(id.0)
    }

    /// The id of `aa_sequence` if it has been interned.
    #[must_use]
    pub fn get_id(&self, aa_sequence: &str) -> Option<GenotypeId> {
        self.ids.get(aa_sequence).copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.genotypes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.genotypes.is_empty()
    }

    /// Every interned genotype in the order it was first seen.
    pub fn iter(&self) -> impl Iterator<Item = (GenotypeId, &Genotype)> {
        self.genotypes
            .iter()
            .enumerate()
            .map(|(index, genotype)| (GenotypeId(index), genotype))
    }

    fn genotype(&self, id: GenotypeId) -> &Genotype {
        self.get(id)
            .unwrap_or_else(|| panic!("Genotype {} does not exist", id.0))
    }

    /// Mutates genotype `id` at one of the resistant locations of `drug` and interns the result.
    ///
    /// # Errors
    ///
    /// Returns `SimError::InvalidGenotype` if the mutated sequence does not match `gene_info`.
    ///
    /// # Panics
    ///
    /// Panics if `id` was not issued by this database.
    pub fn perform_mutation_by_drug<R: RandomSource + ?Sized>(
        &mut self,
        id: GenotypeId,
        drug: &DrugType,
        gene_info: &PfGeneInfo,
        drug_db: &DrugDatabase,
        rng: &mut R,
    ) -> Result<GenotypeId, SimError> {
        let sequence = self
            .genotype(id)
            .mutated_sequence_by_drug(gene_info, drug, rng);
        self.get_or_insert(&sequence, gene_info, drug_db)
    }

    /// Interns a free recombinant of `first` and `second`.
    ///
    /// # Errors
    ///
    /// Returns `SimError::InvalidGenotype` if the recombinant does not match `gene_info`.
    ///
    /// # Panics
    ///
    /// Panics if either id was not issued by this database.
    pub fn free_recombine<R: RandomSource + ?Sized>(
        &mut self,
        first: GenotypeId,
        second: GenotypeId,
        gene_info: &PfGeneInfo,
        drug_db: &DrugDatabase,
        rng: &mut R,
    ) -> Result<GenotypeId, SimError> {
        if first == second {
            return Ok(first);
        }
        let sequence =
            Genotype::recombined_sequence(self.genotype(first), self.genotype(second), rng);
        self.get_or_insert(&sequence, gene_info, drug_db)
    }
}
