//! CSV reports and the reporter hooks of a run.
//!
//! A report is a serde row type registered with [`ContextReportExt::add_report`], which binds it
//! to a CSV file; [`ContextReportExt::send_report`] appends one row. A [`Reporter`] decides what
//! to write and when: the model calls its hooks at the start of the run, at the start of each
//! day, after each month and at the end of the run.
use std::any::TypeId;
use std::cell::RefCell;
use std::ffi::OsStr;
use std::fs::{create_dir_all, File};
use std::path::{Path, PathBuf};

use csv::Writer;
use log::info;
use rustc_hash::FxHashMap as HashMap;
use serde::{Deserialize, Serialize};

use crate::context::Context;
use crate::define_data_plugin;
use crate::error::SimError;
use crate::genotype::ContextGenotypeExt;

pub trait Report: 'static {
    // Returns report type
    fn type_id(&self) -> TypeId;
    // Serializes the data with the correct writer
    #[allow(clippy::missing_errors_doc)]
    fn serialize(&self, writer: &mut Writer<File>) -> Result<(), SimError>;
}

/// Use this macro to define a unique report type
#[macro_export]
macro_rules! create_report_trait {
    ($name:ident) => {
        impl $crate::report::Report for $name {
            fn type_id(&self) -> std::any::TypeId {
                std::any::TypeId::of::<$name>()
            }

            fn serialize(
                &self,
                writer: &mut $crate::csv::Writer<std::fs::File>,
            ) -> Result<(), $crate::error::SimError> {
                writer.serialize(self)?;
                Ok(())
            }
        }
    };
}

struct ReportData {
    file_writers: RefCell<HashMap<TypeId, Writer<File>>>,
}

define_data_plugin!(
    ReportPlugin,
    ReportData,
    ReportData {
        file_writers: RefCell::new(HashMap::default()),
    }
);

// Creates the file and its parent directories. Only `.csv` paths are accepted.
fn generate_validate_filepath(path: &Path) -> Result<File, SimError> {
    match path.extension().and_then(OsStr::to_str) {
        Some("csv") => {
            if let Some(parent) = path.parent() {
                create_dir_all(parent)?;
            }
            Ok(File::create(path)?)
        }
        _ => Err(SimError::SimError(
            "Report output files must be CSVs".to_string(),
        )),
    }
}

pub trait ContextReportExt {
    /// Binds report type `T` to a new CSV file at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if `path` is not a `.csv` path or the file cannot be created.
    fn add_report<T: Report>(&mut self, path: &Path) -> Result<(), SimError>;

    /// Appends `report` as a row of the file bound to its type.
    ///
    /// # Errors
    ///
    /// Returns an error if the row cannot be serialized or written.
    ///
    /// # Panics
    ///
    /// Panics if no file was bound to the report type.
    fn send_report<T: Report>(&self, report: T) -> Result<(), SimError>;
}

impl ContextReportExt for Context {
    fn add_report<T: Report>(&mut self, path: &Path) -> Result<(), SimError> {
        let file = generate_validate_filepath(path)?;
        let data_container = self.get_data_mut(ReportPlugin);
        data_container
            .file_writers
            .get_mut()
            .insert(TypeId::of::<T>(), Writer::from_writer(file));
        Ok(())
    }

    fn send_report<T: Report>(&self, report: T) -> Result<(), SimError> {
        // No data container will exist if no reports have been added
        let data_container = self
            .get_data(ReportPlugin)
            .expect("No writer found for the report type");
        let mut writers = data_container.file_writers.borrow_mut();
        let writer = writers
            .get_mut(&report.type_id())
            .expect("No writer found for the report type");
        report.serialize(writer)?;
        writer.flush()?;
        Ok(())
    }
}

/// Hooks through which a run reports on itself. Every hook does nothing by default.
#[allow(unused_variables, clippy::missing_errors_doc)]
pub trait Reporter {
    /// Called once while the model is initialized, before any event is scheduled.
    fn initialize(&mut self, context: &mut Context) -> Result<(), SimError> {
        Ok(())
    }

    fn before_run(&mut self, context: &Context) -> Result<(), SimError> {
        Ok(())
    }

    fn begin_time_step(&mut self, context: &Context) -> Result<(), SimError> {
        Ok(())
    }

    /// Called on the last day of each month, after the day's updates.
    fn monthly_report(&mut self, context: &Context) -> Result<(), SimError> {
        Ok(())
    }

    fn after_run(&mut self, context: &Context) -> Result<(), SimError> {
        Ok(())
    }
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
pub struct MonthlyStatus {
    pub date: String,
    pub day: u32,
    pub genotypes: usize,
    pub pending_events: usize,
}

create_report_trait!(MonthlyStatus);

/// Writes one [`MonthlyStatus`] row per simulated month.
pub struct MonthlyStatusReporter {
    path: PathBuf,
    months: u32,
}

impl MonthlyStatusReporter {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> MonthlyStatusReporter {
        MonthlyStatusReporter {
            path: path.into(),
            months: 0,
        }
    }
}

impl Reporter for MonthlyStatusReporter {
    fn initialize(&mut self, context: &mut Context) -> Result<(), SimError> {
        context.add_report::<MonthlyStatus>(&self.path)
    }

    fn monthly_report(&mut self, context: &Context) -> Result<(), SimError> {
        self.months += 1;
        context.send_report(MonthlyStatus {
            date: context.get_current_date().format("%Y/%m/%d").to_string(),
            day: context.get_current_day(),
            genotypes: context.number_of_genotypes(),
            pending_events: context.scheduler().number_of_pending_events(),
        })
    }

    fn after_run(&mut self, context: &Context) -> Result<(), SimError> {
        info!(
            "{} monthly rows written to {}, {} genotypes at day {}",
            self.months,
            self.path.display(),
            context.number_of_genotypes(),
            context.get_current_day()
        );
        Ok(())
    }
}
