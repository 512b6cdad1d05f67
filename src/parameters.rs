//! Simulation parameters, read from a JSON file and validated once at startup.
use std::fmt::Debug;
use std::ops::RangeBounds;
use std::path::Path;

use chrono::NaiveDate;
use log::info;
use serde::{Deserialize, Serialize};

use crate::context::Context;
use crate::define_global_property;
use crate::drug::DrugParameters;
use crate::error::SimError;
use crate::genotype::PfGeneInfo;
use crate::global_properties::ContextGlobalPropertiesExt;

const DATE_FORMAT: &str = "%Y/%m/%d";

/// Parasites present at the start of the run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InitialParasiteInfo {
    pub location: usize,
    pub aa_sequence: String,
    /// Fraction of the location's population infected.
    pub prevalence: f64,
}

/// A one-time importation of `number` cases on `day`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ImportationParasiteInfo {
    pub location: usize,
    pub day: u32,
    pub aa_sequence: String,
    pub number: u32,
}

/// On average `number` imported cases every `duration` days, from `start_day` on.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PeriodicImportationInfo {
    pub location: usize,
    pub duration: u32,
    pub aa_sequence: String,
    pub number: u32,
    #[serde(default)]
    pub start_day: u32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MosquitoConfig {
    /// Number of sampled genotypes per location and day.
    pub prmc_size: usize,
    /// One value for every location, or one per location.
    pub interrupted_feeding_rate: Vec<f64>,
    #[serde(default = "default_tracking_days")]
    pub number_of_tracking_days: usize,
}

fn default_tracking_days() -> usize {
    11
}

fn default_update_frequency() -> u32 {
    7
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ParametersValues {
    /// `YYYY/MM/DD`.
    pub starting_date: String,
    pub total_time: u32,
    /// Capacity of the event pool.
    pub object_pool_size: usize,
    /// Days between two `UpdateEveryKDays` events of a person.
    #[serde(default = "default_update_frequency")]
    pub update_frequency: u32,
    pub number_of_locations: usize,
    pub pf_gene_info: PfGeneInfo,
    pub drugs: Vec<DrugParameters>,
    #[serde(default)]
    pub initial_parasite_info: Vec<InitialParasiteInfo>,
    #[serde(default)]
    pub importation_parasite_info: Vec<ImportationParasiteInfo>,
    #[serde(default)]
    pub importation_parasite_periodically_info: Vec<PeriodicImportationInfo>,
    #[serde(default)]
    pub mosquito: Option<MosquitoConfig>,
}

pub(crate) fn check_num<T, R>(num: T, range: R, what: &str) -> Result<(), SimError>
where
    T: PartialOrd + Debug,
    R: RangeBounds<T> + Debug,
{
    if !range.contains(&num) {
        return Err(SimError::InvalidParameters(format!(
            "{what}: number must be in the range {range:?}, but is {num:?}"
        )));
    }
    Ok(())
}

impl ParametersValues {
    /// # Errors
    ///
    /// Returns `SimError::DateError` if `starting_date` is not `YYYY/MM/DD`.
    pub fn starting_date(&self) -> Result<NaiveDate, SimError> {
        Ok(NaiveDate::parse_from_str(&self.starting_date, DATE_FORMAT)?)
    }

    /// # Errors
    ///
    /// Returns the first problem found, as `SimError::InvalidParameters` or
    /// `SimError::DateError`.
    pub fn validate(&self) -> Result<(), SimError> {
        self.starting_date()?;
        check_num(self.total_time, 1.., "total_time")?;
        check_num(self.object_pool_size, 1.., "object_pool_size")?;
        check_num(self.update_frequency, 1.., "update_frequency")?;
        check_num(self.number_of_locations, 1.., "number_of_locations")?;

        self.pf_gene_info.validate(self.drugs.len())?;
        for drug in &self.drugs {
            drug.validate()?;
        }

        let locations = 0..self.number_of_locations;
        for info in &self.initial_parasite_info {
            check_num(info.location, locations.clone(), "initial parasite location")?;
            check_num(info.prevalence, 0.0..=1.0, "initial parasite prevalence")?;
        }
        for info in &self.importation_parasite_info {
            check_num(info.location, locations.clone(), "importation location")?;
            check_num(info.day, 0..self.total_time, "importation day")?;
        }
        for info in &self.importation_parasite_periodically_info {
            check_num(info.location, locations.clone(), "periodic importation location")?;
            check_num(info.duration, 1.., "periodic importation duration")?;
            check_num(info.start_day, 0..self.total_time, "periodic importation start_day")?;
        }

        if let Some(mosquito) = &self.mosquito {
            check_num(mosquito.prmc_size, 1.., "mosquito prmc_size")?;
            check_num(
                mosquito.number_of_tracking_days,
                1..,
                "mosquito number_of_tracking_days",
            )?;
            let rates = mosquito.interrupted_feeding_rate.len();
            if rates != 1 && rates != self.number_of_locations {
                return Err(SimError::InvalidParameters(format!(
                    "interrupted_feeding_rate must have 1 or {} values, found {rates}",
                    self.number_of_locations
                )));
            }
            for rate in &mosquito.interrupted_feeding_rate {
                check_num(*rate, 0.0..=1.0, "interrupted_feeding_rate")?;
            }
        }
        Ok(())
    }
}

define_global_property!(Parameters, ParametersValues);

pub trait ContextParametersExt {
    /// Loads, validates and stores the parameters in `file_path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or fails validation.
    fn init_parameters(&mut self, file_path: &Path) -> Result<(), SimError>;

    /// Validates and stores `parameters`.
    ///
    /// # Errors
    ///
    /// Returns an error if the parameters fail validation or were already set.
    fn set_parameters(&mut self, parameters: ParametersValues) -> Result<(), SimError>;

    /// # Panics
    ///
    /// Panics if the parameters have not been set.
    fn get_parameters(&self) -> &ParametersValues;
}

impl ContextParametersExt for Context {
    fn init_parameters(&mut self, file_path: &Path) -> Result<(), SimError> {
        info!("reading parameters from {}", file_path.display());
        let parameters = self.load_parameters_from_json::<ParametersValues>(file_path)?;
        self.set_parameters(parameters)
    }

    fn set_parameters(&mut self, parameters: ParametersValues) -> Result<(), SimError> {
        parameters.validate()?;
        self.set_global_property_value(Parameters, parameters)
    }

    fn get_parameters(&self) -> &ParametersValues {
        self.get_global_property_value(Parameters)
            .expect("Parameters are not initialized")
    }
}

/// A small valid parameter set built on the sample gene metadata and drugs.
#[cfg(test)]
pub(crate) fn sample_parameters() -> ParametersValues {
    ParametersValues {
        starting_date: "2000/01/01".to_string(),
        total_time: 365,
        object_pool_size: 1000,
        update_frequency: 7,
        number_of_locations: 2,
        pf_gene_info: crate::genotype::sample_gene_info(),
        drugs: crate::drug::sample_drug_parameters(),
        initial_parasite_info: vec![InitialParasiteInfo {
            location: 0,
            aa_sequence: "||||N1||K||||||CR|".to_string(),
            prevalence: 0.1,
        }],
        importation_parasite_info: vec![],
        importation_parasite_periodically_info: vec![],
        mosquito: None,
    }
}
