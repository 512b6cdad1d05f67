//! Gene metadata: for each chromosome, its genes, and for each gene, the amino-acid positions
//! that the model tracks.
//!
//! The metadata fixes the shape of every genotype sequence. A chromosome is written as its
//! genes joined by `,`, a gene as one character per tracked position followed, for genes with
//! copy-number variation, by a single copy-number digit. Chromosomes are joined by `|`.
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::drug::DrugId;
use crate::error::SimError;
use crate::parameters::check_num;

pub const NUMBER_OF_CHROMOSOMES: usize = 14;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AaPositionInfo {
    /// Position of the amino acid in the protein. Informational only.
    pub position: u32,
    /// Legal alleles at this position. The first one is the wild type.
    pub amino_acids: Vec<char>,
    /// Daily cost of resistance, one entry per allele.
    pub daily_crs: Vec<f64>,
    /// Per-allele factor applied to a drug's EC50.
    #[serde(default)]
    pub multiplicative_effect_on_ec50: BTreeMap<DrugId, Vec<f64>>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeneInfo {
    pub name: String,
    #[serde(default = "default_max_copies")]
    pub max_copies: u32,
    /// Daily cost of carrying `i + 1` copies of the gene.
    #[serde(default)]
    pub cnv_daily_crs: Vec<f64>,
    /// Factor applied to a drug's EC50 when the gene has `i + 1` copies.
    #[serde(default)]
    pub cnv_multiplicative_effect_on_ec50: BTreeMap<DrugId, Vec<f64>>,
    #[serde(default)]
    pub aa_position_infos: Vec<AaPositionInfo>,
    /// Replaces the per-allele factor from the second effective mutation in this gene onwards.
    #[serde(default)]
    pub multiplicative_effect_on_ec50_for_2_or_more_mutations: BTreeMap<DrugId, f64>,
}

fn default_max_copies() -> u32 {
    1
}

impl GeneInfo {
    #[must_use]
    pub fn has_copy_number(&self) -> bool {
        self.max_copies > 1
    }

    /// Length of this gene in a sequence string.
    #[must_use]
    pub fn encoded_len(&self) -> usize {
        self.aa_position_infos.len() + usize::from(self.has_copy_number())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ChromosomeInfo {
    #[serde(default)]
    pub gene_infos: Vec<GeneInfo>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PfGeneInfo {
    pub chromosome_infos: Vec<ChromosomeInfo>,
}

/// A sequence position whose change affects one drug.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ResistantAaLocation {
    pub chromosome_id: usize,
    pub gene_id: usize,
    /// Index into the gene's `aa_position_infos`. For a copy-number slot this is the number of
    /// positions, i.e. one past the last one.
    pub aa_id: usize,
    pub is_copy_number: bool,
    /// Byte index of the character in the sequence string.
    pub aa_index_in_aa_string: usize,
}

fn check_factors(factors: &[f64], expected_len: usize, what: &str) -> Result<(), SimError> {
    if factors.len() != expected_len {
        return Err(SimError::InvalidParameters(format!(
            "{what}: expected {expected_len} values, found {}",
            factors.len()
        )));
    }
    for factor in factors {
        if !(*factor > 0.0 && factor.is_finite()) {
            return Err(SimError::InvalidParameters(format!(
                "{what}: factors must be positive, found {factor}"
            )));
        }
    }
    Ok(())
}

fn check_drug(drug_id: DrugId, number_of_drugs: usize, what: &str) -> Result<(), SimError> {
    if drug_id >= number_of_drugs {
        return Err(SimError::InvalidParameters(format!(
            "{what}: unknown drug {drug_id}"
        )));
    }
    Ok(())
}

impl PfGeneInfo {
    /// Checks that the metadata describes well-formed sequences for `number_of_drugs` drugs.
    ///
    /// # Errors
    ///
    /// Returns `SimError::InvalidParameters` naming the first offending gene.
    pub fn validate(&self, number_of_drugs: usize) -> Result<(), SimError> {
        if self.chromosome_infos.len() != NUMBER_OF_CHROMOSOMES {
            return Err(SimError::InvalidParameters(format!(
                "expected {NUMBER_OF_CHROMOSOMES} chromosomes, found {}",
                self.chromosome_infos.len()
            )));
        }
        for (chromosome_id, chromosome) in self.chromosome_infos.iter().enumerate() {
            for gene in &chromosome.gene_infos {
                let context = format!("chromosome {} gene {}", chromosome_id + 1, gene.name);
                check_num(gene.max_copies, 1..=9, &format!("{context}: max_copies"))?;
                if gene.encoded_len() == 0 {
                    return Err(SimError::InvalidParameters(format!(
                        "{context}: gene tracks no position"
                    )));
                }
                for (index, aa) in gene.aa_position_infos.iter().enumerate() {
                    let what = format!("{context} position {index}");
                    if aa.amino_acids.is_empty() {
                        return Err(SimError::InvalidParameters(format!(
                            "{what}: no amino acids"
                        )));
                    }
                    if let Some(c) = aa
                        .amino_acids
                        .iter()
                        .find(|c| !c.is_ascii_alphabetic())
                    {
                        return Err(SimError::InvalidParameters(format!(
                            "{what}: amino acid `{c}` is not an ASCII letter"
                        )));
                    }
                    if aa.daily_crs.len() != aa.amino_acids.len() {
                        return Err(SimError::InvalidParameters(format!(
                            "{what}: expected {} daily costs, found {}",
                            aa.amino_acids.len(),
                            aa.daily_crs.len()
                        )));
                    }
                    for cr in &aa.daily_crs {
                        check_num(*cr, 0.0..1.0, &format!("{what}: daily cost of resistance"))?;
                    }
                    for (drug_id, factors) in &aa.multiplicative_effect_on_ec50 {
                        check_drug(*drug_id, number_of_drugs, &what)?;
                        check_factors(factors, aa.amino_acids.len(), &what)?;
                    }
                }
                if gene.has_copy_number() {
                    let copies = gene.max_copies as usize;
                    if gene.cnv_daily_crs.len() != copies {
                        return Err(SimError::InvalidParameters(format!(
                            "{context}: expected {copies} copy-number costs, found {}",
                            gene.cnv_daily_crs.len()
                        )));
                    }
                    for cr in &gene.cnv_daily_crs {
                        check_num(*cr, 0.0..1.0, &format!("{context}: copy-number cost"))?;
                    }
                    for (drug_id, factors) in &gene.cnv_multiplicative_effect_on_ec50 {
                        check_drug(*drug_id, number_of_drugs, &context)?;
                        check_factors(factors, copies, &context)?;
                    }
                }
                for (drug_id, factor) in &gene.multiplicative_effect_on_ec50_for_2_or_more_mutations {
                    check_drug(*drug_id, number_of_drugs, &context)?;
                    check_factors(&[*factor], 1, &context)?;
                }
            }
        }
        Ok(())
    }

    /// Every position and copy-number slot whose change has a defined effect on the EC50 of
    /// `drug_id`, in sequence order.
    #[must_use]
    pub fn resistant_aa_locations(&self, drug_id: DrugId) -> Vec<ResistantAaLocation> {
        let mut locations = Vec::new();
        let mut offset = 0;
        for (chromosome_id, chromosome) in self.chromosome_infos.iter().enumerate() {
            if chromosome_id > 0 {
                // `|`
                offset += 1;
            }
            for (gene_id, gene) in chromosome.gene_infos.iter().enumerate() {
                if gene_id > 0 {
                    // `,`
                    offset += 1;
                }
                for (aa_id, aa) in gene.aa_position_infos.iter().enumerate() {
                    if aa.multiplicative_effect_on_ec50.contains_key(&drug_id) {
                        locations.push(ResistantAaLocation {
                            chromosome_id,
                            gene_id,
                            aa_id,
                            is_copy_number: false,
                            aa_index_in_aa_string: offset + aa_id,
                        });
                    }
                }
                if gene.has_copy_number()
                    && gene.cnv_multiplicative_effect_on_ec50.contains_key(&drug_id)
                {
                    let aa_id = gene.aa_position_infos.len();
                    locations.push(ResistantAaLocation {
                        chromosome_id,
                        gene_id,
                        aa_id,
                        is_copy_number: true,
                        aa_index_in_aa_string: offset + aa_id,
                    });
                }
                offset += gene.encoded_len();
            }
        }
        locations
    }

    #[must_use]
    pub fn gene(&self, chromosome_id: usize, gene_id: usize) -> Option<&GeneInfo> {
        self.chromosome_infos
            .get(chromosome_id)?
            .gene_infos
            .get(gene_id)
    }
}

/// Three-drug metadata shared by the unit tests.
///
/// Wild type: `||||N1||K||||||CR|`.
///
/// * chromosome 5, pfmdr1: N86Y and up to 3 copies; affects drugs 1 and 2.
/// * chromosome 7, pfcrt: K76T; affects drug 2.
/// * chromosome 13, kelch13: C580Y and R539T; affects drug 0 with a combined effect.
#[cfg(test)]
pub(crate) fn sample_gene_info() -> PfGeneInfo {
    let position = |position, amino_acids: [char; 2], crs: [f64; 2], effects: &[(DrugId, [f64; 2])]| {
        AaPositionInfo {
            position,
            amino_acids: amino_acids.to_vec(),
            daily_crs: crs.to_vec(),
            multiplicative_effect_on_ec50: effects
                .iter()
                .map(|(drug_id, factors)| (*drug_id, factors.to_vec()))
                .collect(),
        }
    };
    let gene = |name: &str, positions: Vec<AaPositionInfo>| GeneInfo {
        name: name.to_string(),
        max_copies: 1,
        cnv_daily_crs: vec![],
        cnv_multiplicative_effect_on_ec50: BTreeMap::new(),
        aa_position_infos: positions,
        multiplicative_effect_on_ec50_for_2_or_more_mutations: BTreeMap::new(),
    };

    let mut pfmdr1 = gene(
        "pfmdr1",
        vec![position(
            86,
            ['N', 'Y'],
            [0.0, 0.0005],
            &[(1, [1.25, 1.0]), (2, [1.0, 1.25])],
        )],
    );
    pfmdr1.max_copies = 3;
    pfmdr1.cnv_daily_crs = vec![0.0, 0.0005, 0.001];
    pfmdr1
        .cnv_multiplicative_effect_on_ec50
        .insert(1, vec![1.0, 2.0, 2.5]);

    let pfcrt = gene(
        "pfcrt",
        vec![position(76, ['K', 'T'], [0.0, 0.0005], &[(2, [1.0, 1.6])])],
    );

    let mut kelch13 = gene(
        "kelch13",
        vec![
            position(580, ['C', 'Y'], [0.0, 0.0005], &[(0, [1.0, 1.6])]),
            position(539, ['R', 'T'], [0.0, 0.0005], &[(0, [1.0, 1.6])]),
        ],
    );
    kelch13
        .multiplicative_effect_on_ec50_for_2_or_more_mutations
        .insert(0, 1.3);

    let mut chromosome_infos = vec![ChromosomeInfo::default(); NUMBER_OF_CHROMOSOMES];
    chromosome_infos[4].gene_infos.push(pfmdr1);
    chromosome_infos[6].gene_infos.push(pfcrt);
    chromosome_infos[12].gene_infos.push(kelch13);
    PfGeneInfo { chromosome_infos }
}
