use std::fmt::{self, Display};

use crate::drug::{DrugDatabase, DrugId, DrugType};
use crate::error::SimError;
use crate::event::TherapyId;
use crate::genotype::gene_info::{PfGeneInfo, NUMBER_OF_CHROMOSOMES};
use crate::random::RandomSource;

/// A parasite genotype: its sequence string, the same sequence split into chromosomes and
/// genes, and the values derived from it.
///
/// Genotypes are immutable once built. Mutation and recombination produce a new sequence,
/// which the [`GenotypeDatabase`](super::GenotypeDatabase) interns.
#[derive(Clone, Debug, PartialEq)]
pub struct Genotype {
    aa_sequence: String,
    pf_genotype_str: Vec<Vec<String>>,
    daily_fitness_multiple_infection: f64,
    ec50_power_n: Vec<f64>,
}

fn copy_number(gene_str: &str) -> Option<u32> {
    gene_str.chars().last().and_then(|c| c.to_digit(10))
}

impl Genotype {
    /// Splits `aa_sequence` into chromosomes on `|` and each chromosome into genes on `,`. An
    /// empty chromosome has no genes.
    ///
    /// # Errors
    ///
    /// Returns `SimError::InvalidGenotype` unless the sequence has exactly 14 chromosomes.
    pub fn from_sequence(aa_sequence: &str) -> Result<Genotype, SimError> {
        let pf_genotype_str: Vec<Vec<String>> = aa_sequence
            .split('|')
            .map(|chromosome| {
                if chromosome.is_empty() {
                    Vec::new()
                } else {
                    chromosome.split(',').map(str::to_string).collect()
                }
            })
            .collect();
        if pf_genotype_str.len() != NUMBER_OF_CHROMOSOMES {
            return Err(SimError::invalid_genotype(
                aa_sequence,
                format!(
                    "expected {NUMBER_OF_CHROMOSOMES} chromosomes, found {}",
                    pf_genotype_str.len()
                ),
            ));
        }
        Ok(Genotype {
            aa_sequence: aa_sequence.to_string(),
            pf_genotype_str,
            daily_fitness_multiple_infection: 1.0,
            ec50_power_n: Vec::new(),
        })
    }

    #[must_use]
    pub fn aa_sequence(&self) -> &str {
        &self.aa_sequence
    }

    /// Genes of chromosome `chromosome_id`, as written in the sequence.
    #[must_use]
    pub fn genes(&self, chromosome_id: usize) -> &[String] {
        &self.pf_genotype_str[chromosome_id]
    }

    #[must_use]
    pub fn daily_fitness(&self) -> f64 {
        self.daily_fitness_multiple_infection
    }

    /// EC50 of `drug_id` for this genotype, raised to the drug's Hill coefficient.
    ///
    /// # Panics
    ///
    /// Panics if the EC50 values were not computed for `drug_id`.
    #[must_use]
    pub fn get_ec50_power_n(&self, drug_id: DrugId) -> f64 {
        self.ec50_power_n[drug_id]
    }

    /// Checks the sequence against the gene metadata.
    ///
    /// # Errors
    ///
    /// Returns `SimError::InvalidGenotype` describing the first mismatch.
    pub fn validate(&self, gene_info: &PfGeneInfo) -> Result<(), SimError> {
        let invalid = |reason: String| Err(SimError::invalid_genotype(&self.aa_sequence, reason));
        for (chromosome_id, chromosome_info) in gene_info.chromosome_infos.iter().enumerate() {
            let genes = &self.pf_genotype_str[chromosome_id];
            if genes.len() != chromosome_info.gene_infos.len() {
                return invalid(format!(
                    "chromosome {} has {} genes, expected {}",
                    chromosome_id + 1,
                    genes.len(),
                    chromosome_info.gene_infos.len()
                ));
            }
            for (gene_str, gene) in genes.iter().zip(&chromosome_info.gene_infos) {
                if gene_str.len() != gene.encoded_len() {
                    return invalid(format!(
                        "gene {} is `{gene_str}`, expected {} characters",
                        gene.name,
                        gene.encoded_len()
                    ));
                }
                for (element, aa) in gene_str.chars().zip(&gene.aa_position_infos) {
                    if !aa.amino_acids.contains(&element) {
                        return invalid(format!(
                            "`{element}` is not a legal amino acid at {} {}",
                            gene.name, aa.position
                        ));
                    }
                }
                if gene.has_copy_number() {
                    match copy_number(gene_str) {
                        Some(copies) if copies <= gene.max_copies => {}
                        _ => {
                            return invalid(format!(
                                "gene {} must end with a copy number from 0 to {}",
                                gene.name, gene.max_copies
                            ))
                        }
                    }
                }
            }
        }
        Ok(())
    }

    #[must_use]
    pub fn is_valid(&self, gene_info: &PfGeneInfo) -> bool {
        self.validate(gene_info).is_ok()
    }

    /// Multiplies `(1 - cost)` over every allele carried, and over the copy-number cost for
    /// genes with more than one copy.
    pub fn calculate_daily_fitness(&mut self, gene_info: &PfGeneInfo) {
        let mut fitness = 1.0;
        for (genes, chromosome_info) in self.pf_genotype_str.iter().zip(&gene_info.chromosome_infos) {
            for (gene_str, gene) in genes.iter().zip(&chromosome_info.gene_infos) {
                for (element, aa) in gene_str.chars().zip(&gene.aa_position_infos) {
                    if let Some(element_id) = aa.amino_acids.iter().position(|c| *c == element) {
                        fitness *= 1.0 - aa.daily_crs[element_id];
                    }
                }
                if gene.has_copy_number() {
                    if let Some(copies @ 2..) = copy_number(gene_str) {
                        fitness *= 1.0 - gene.cnv_daily_crs[copies as usize - 1];
                    }
                }
            }
        }
        self.daily_fitness_multiple_infection = fitness;
    }

    /// Computes the EC50 of every drug for this genotype, raised to the drug's Hill coefficient.
    ///
    /// Each effective allele (factor above 1) multiplies the drug's base EC50 by its factor.
    /// From the second effective allele within the same gene on, the gene's combined factor is
    /// used instead when it defines one for the drug.
    pub fn calculate_ec50_power_n(&mut self, gene_info: &PfGeneInfo, drug_db: &DrugDatabase) {
        let mut ec50: Vec<f64> = drug_db.iter().map(DrugType::base_ec50).collect();

        for (genes, chromosome_info) in self.pf_genotype_str.iter().zip(&gene_info.chromosome_infos) {
            for (gene_str, gene) in genes.iter().zip(&chromosome_info.gene_infos) {
                let mut effective_mutations = vec![0_u32; drug_db.len()];

                for (element, aa) in gene_str.chars().zip(&gene.aa_position_infos) {
                    let Some(element_id) = aa.amino_acids.iter().position(|c| *c == element) else {
                        continue;
                    };
                    for (&drug_id, factors) in &aa.multiplicative_effect_on_ec50 {
                        if drug_id >= ec50.len() {
                            continue;
                        }
                        let mut factor = factors[element_id];
                        if factor > 1.0 {
                            effective_mutations[drug_id] += 1;
                            if effective_mutations[drug_id] > 1 {
                                if let Some(combined) = gene
                                    .multiplicative_effect_on_ec50_for_2_or_more_mutations
                                    .get(&drug_id)
                                {
                                    factor = *combined;
                                }
                            }
                        }
                        ec50[drug_id] *= factor;
                    }
                }

                if gene.has_copy_number() {
                    if let Some(copies @ 2..) = copy_number(gene_str) {
                        for (&drug_id, factors) in &gene.cnv_multiplicative_effect_on_ec50 {
                            if drug_id < ec50.len() {
                                ec50[drug_id] *= factors[copies as usize - 1];
                            }
                        }
                    }
                }
            }
        }

        self.ec50_power_n = ec50
            .into_iter()
            .zip(drug_db.iter())
            .map(|(value, drug)| value.powf(drug.n()))
            .collect();
    }

    /// The sequence after one mutation at a location chosen uniformly among the resistant
    /// locations of `drug`. A copy-number slot gets a uniform copy number in `[1, max_copies]`,
    /// an amino-acid position a uniform allele from its alphabet (possibly the current one).
    ///
    /// Returns the unchanged sequence if `drug` has no resistant location.
    #[must_use]
    pub fn mutated_sequence_by_drug<R: RandomSource + ?Sized>(
        &self,
        gene_info: &PfGeneInfo,
        drug: &DrugType,
        rng: &mut R,
    ) -> String {
        let locations = drug.resistant_aa_locations();
        if locations.is_empty() {
            return self.aa_sequence.clone();
        }
        let location = locations[rng.random_uniform(locations.len())];
        let Some(gene) = gene_info.gene(location.chromosome_id, location.gene_id) else {
            return self.aa_sequence.clone();
        };

        let new_char = if location.is_copy_number {
            let copies = rng.random_uniform(gene.max_copies as usize) + 1;
            char::from_digit(copies as u32, 10).unwrap_or('1')
        } else {
            let alleles = &gene.aa_position_infos[location.aa_id].amino_acids;
            alleles[rng.random_uniform(alleles.len())]
        };

        let mut new_sequence = self.aa_sequence.clone();
        let index = location.aa_index_in_aa_string;
        new_sequence.replace_range(index..=index, new_char.encode_utf8(&mut [0; 4]));
        new_sequence
    }

    /// The sequence of a free recombinant of `first` and `second`: each chromosome is inherited
    /// whole from either parent with probability one half.
    #[must_use]
    pub fn recombined_sequence<R: RandomSource + ?Sized>(
        first: &Genotype,
        second: &Genotype,
        rng: &mut R,
    ) -> String {
        let chromosomes: Vec<&str> = first
            .aa_sequence
            .split('|')
            .zip(second.aa_sequence.split('|'))
            .map(|(from_first, from_second)| {
                if rng.random_uniform(2) == 0 {
                    from_first
                } else {
                    from_second
                }
            })
            .collect();
        chromosomes.join("|")
    }

    /// Always `false` until drug-level resistance is defined.
    #[must_use]
    pub fn resist_to(&self, _drug: &DrugType) -> bool {
        false
    }

    /// Always `false` until therapy-level resistance is defined.
    #[must_use]
    pub fn resist_to_therapy(&self, _therapy: TherapyId) -> bool {
        false
    }
}

impl Display for Genotype {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.aa_sequence)
    }
}
