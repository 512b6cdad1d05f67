//! Drug types and the pharmacodynamic kernel.
//!
//! A [`DrugType`] holds the constant parameters of one antimalarial. Its killing rate follows a
//! Hill curve in the blood concentration, with the genotype's EC50 (already raised to the Hill
//! coefficient) in the denominator, so resistant genotypes are killed more slowly at the same
//! concentration.
use std::ops::Index;

use log::trace;
use serde::{Deserialize, Serialize};

use crate::context::Context;
use crate::define_data_plugin;
use crate::error::SimError;
use crate::genotype::{Genotype, PfGeneInfo, ResistantAaLocation};
use crate::parameters::{check_num, ContextParametersExt};

/// Index of a drug in the [`DrugDatabase`].
pub type DrugId = usize;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DrugParameters {
    pub name: String,
    /// Days.
    pub half_life: f64,
    pub maximum_parasite_killing_rate: f64,
    /// Hill coefficient.
    pub n: f64,
    #[serde(default = "default_k")]
    pub k: f64,
    /// Concentration, in percent of the peak, below which the drug is considered gone.
    #[serde(default = "default_cut_off_percent")]
    pub cut_off_percent: f64,
    #[serde(default)]
    pub mutation_probability: f64,
    pub base_ec50: f64,
}

fn default_k() -> f64 {
    4.0
}

fn default_cut_off_percent() -> f64 {
    10.0
}

impl DrugParameters {
    pub(crate) fn validate(&self) -> Result<(), SimError> {
        let what = |field: &str| format!("drug {}: {field}", self.name);
        check_num(self.half_life, 0.0.., &what("half_life"))?;
        check_num(
            self.maximum_parasite_killing_rate,
            0.0..=1.0,
            &what("maximum_parasite_killing_rate"),
        )?;
        check_num(self.n, f64::MIN_POSITIVE.., &what("n"))?;
        check_num(self.k, 0.0.., &what("k"))?;
        check_num(self.cut_off_percent, f64::MIN_POSITIVE..100.0, &what("cut_off_percent"))?;
        check_num(self.mutation_probability, 0.0..=1.0, &what("mutation_probability"))?;
        check_num(self.base_ec50, f64::MIN_POSITIVE.., &what("base_ec50"))?;
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct DrugType {
    id: DrugId,
    name: String,
    drug_half_life: f64,
    maximum_parasite_killing_rate: f64,
    n: f64,
    k: f64,
    cut_off_percent: f64,
    p_mutation: f64,
    base_ec50: f64,
    resistant_aa_locations: Vec<ResistantAaLocation>,
}

impl DrugType {
    #[must_use]
    pub fn new(
        id: DrugId,
        parameters: &DrugParameters,
        resistant_aa_locations: Vec<ResistantAaLocation>,
    ) -> DrugType {
        DrugType {
            id,
            name: parameters.name.clone(),
            drug_half_life: parameters.half_life,
            maximum_parasite_killing_rate: parameters.maximum_parasite_killing_rate,
            n: parameters.n,
            k: parameters.k,
            cut_off_percent: parameters.cut_off_percent,
            p_mutation: parameters.mutation_probability,
            base_ec50: parameters.base_ec50,
            resistant_aa_locations,
        }
    }

    #[must_use]
    pub fn id(&self) -> DrugId {
        self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn drug_half_life(&self) -> f64 {
        self.drug_half_life
    }

    #[must_use]
    pub fn maximum_parasite_killing_rate(&self) -> f64 {
        self.maximum_parasite_killing_rate
    }

    #[must_use]
    pub fn n(&self) -> f64 {
        self.n
    }

    #[must_use]
    pub fn k(&self) -> f64 {
        self.k
    }

    #[must_use]
    pub fn cut_off_percent(&self) -> f64 {
        self.cut_off_percent
    }

    #[must_use]
    pub fn p_mutation(&self) -> f64 {
        self.p_mutation
    }

    #[must_use]
    pub fn base_ec50(&self) -> f64 {
        self.base_ec50
    }

    #[must_use]
    pub fn resistant_aa_locations(&self) -> &[ResistantAaLocation] {
        &self.resistant_aa_locations
    }

    /// The parameters this drug was built from.
    #[must_use]
    pub fn parameters(&self) -> DrugParameters {
        DrugParameters {
            name: self.name.clone(),
            half_life: self.drug_half_life,
            maximum_parasite_killing_rate: self.maximum_parasite_killing_rate,
            n: self.n,
            k: self.k,
            cut_off_percent: self.cut_off_percent,
            mutation_probability: self.p_mutation,
            base_ec50: self.base_ec50,
        }
    }

    /// `max_rate * c^n / (c^n + ec50_power_n)`.
    #[must_use]
    pub fn get_parasite_killing_rate_by_concentration(
        &self,
        concentration: f64,
        ec50_power_n: f64,
    ) -> f64 {
        let con_power_n = concentration.powf(self.n);
        if con_power_n == 0.0 {
            return 0.0;
        }
        if con_power_n.is_infinite() {
            return self.maximum_parasite_killing_rate;
        }
        self.maximum_parasite_killing_rate * con_power_n / (con_power_n + ec50_power_n)
    }

    /// Dosing days plus the whole number of days needed for the concentration to decay to
    /// `cut_off_percent` of its peak.
    #[must_use]
    pub fn get_total_duration_of_drug_activity(&self, dosing_days: u32) -> u32 {
        let half_lives = (100.0 / self.cut_off_percent).log2();
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let decay_days = (self.drug_half_life * half_lives).ceil() as u32;
        dosing_days + decay_days
    }

    /// Constant until EC50 inference from the genotype is defined.
    #[must_use]
    pub fn infer_ec50(&self, _genotype: &Genotype) -> f64 {
        0.65
    }
}

/// All drugs of a run, indexed by contiguous [`DrugId`]s.
#[derive(Clone, Debug, Default)]
pub struct DrugDatabase {
    drugs: Vec<DrugType>,
}

impl DrugDatabase {
    /// Builds drug `i` from `drugs[i]`, with its resistant locations taken from `gene_info`.
    ///
    /// # Errors
    ///
    /// Returns `SimError::InvalidParameters` if a drug's parameters are out of range.
    pub fn from_parameters(
        drugs: &[DrugParameters],
        gene_info: &PfGeneInfo,
    ) -> Result<DrugDatabase, SimError> {
        let mut database = DrugDatabase::default();
        for (id, parameters) in drugs.iter().enumerate() {
            parameters.validate()?;
            let locations = gene_info.resistant_aa_locations(id);
            trace!(
                "drug {id} ({}): {} resistant locations",
                parameters.name,
                locations.len()
            );
            database.drugs.push(DrugType::new(id, parameters, locations));
        }
        Ok(database)
    }

    #[must_use]
    pub fn get(&self, id: DrugId) -> Option<&DrugType> {
        self.drugs.get(id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.drugs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.drugs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DrugType> {
        self.drugs.iter()
    }
}

impl Index<DrugId> for DrugDatabase {
    type Output = DrugType;

    fn index(&self, id: DrugId) -> &DrugType {
        &self.drugs[id]
    }
}

define_data_plugin!(DrugPlugin, Option<DrugDatabase>, None);

pub trait ContextDrugExt {
    /// Builds the drug database from the run's parameters.
    ///
    /// # Errors
    ///
    /// Returns `SimError::InvalidParameters` if a drug's parameters are out of range.
    fn init_drug_database(&mut self) -> Result<(), SimError>;

    /// # Panics
    ///
    /// Panics if the drug database has not been initialized.
    fn get_drug_database(&self) -> &DrugDatabase;

    /// # Panics
    ///
    /// Panics if the drug database has not been initialized or `id` is not a drug.
    fn get_drug_type(&self, id: DrugId) -> &DrugType {
        self.get_drug_database()
            .get(id)
            .unwrap_or_else(|| panic!("Drug {id} does not exist"))
    }
}

impl ContextDrugExt for Context {
    fn init_drug_database(&mut self) -> Result<(), SimError> {
        let parameters = self.get_parameters();
        let database = DrugDatabase::from_parameters(&parameters.drugs, &parameters.pf_gene_info)?;
        *self.get_data_mut(DrugPlugin) = Some(database);
        Ok(())
    }

    fn get_drug_database(&self) -> &DrugDatabase {
        self.get_data(DrugPlugin)
            .and_then(Option::as_ref)
            .expect("Drug database is not initialized")
    }
}

/// Parameters of the three drugs used by the unit tests, in id order: an artemisinin acting
/// through kelch13, lumefantrine through pfmdr1 and chloroquine through pfmdr1 and pfcrt.
#[cfg(test)]
pub(crate) fn sample_drug_parameters() -> Vec<DrugParameters> {
    let drug = |name: &str, half_life, n, base_ec50| DrugParameters {
        name: name.to_string(),
        half_life,
        maximum_parasite_killing_rate: 0.99,
        n,
        k: 4.0,
        cut_off_percent: 10.0,
        mutation_probability: 0.005,
        base_ec50,
    };
    vec![
        drug("artemisinin", 0.12, 2.0, 0.75),
        drug("lumefantrine", 4.5, 3.0, 0.6),
        drug("chloroquine", 10.0, 1.5, 0.4),
    ]
}

#[cfg(test)]
pub(crate) fn sample_drug_database(gene_info: &PfGeneInfo) -> DrugDatabase {
    DrugDatabase::from_parameters(&sample_drug_parameters(), gene_info).unwrap()
}
