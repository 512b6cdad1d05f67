//! Everything a model crate usually needs: `use masim::prelude::*;`
pub use crate::context::{Context, TimeStepHandler};
pub use crate::drug::{ContextDrugExt, DrugDatabase, DrugId, DrugType};
pub use crate::error::SimError;
pub use crate::event::{Event, LocationId, Owner, ParasiteId, PersonId, TherapyId};
pub use crate::genotype::{ContextGenotypeExt, Genotype, GenotypeId};
pub use crate::global_properties::ContextGlobalPropertiesExt;
pub use crate::log::{debug, error, info, trace, warn};
pub use crate::model::Model;
pub use crate::mosquito::{BloodMealSource, ContextMosquitoExt};
pub use crate::parameters::{ContextParametersExt, ParametersValues};
pub use crate::population::Population;
pub use crate::random::ContextRandomExt;
pub use crate::report::{ContextReportExt, MonthlyStatusReporter, Report, Reporter};
pub use crate::runner::{run_with_args, run_with_base_args, BaseArgs};
pub use crate::scheduler::{Day, EventId};
pub use crate::{create_report_trait, define_data_plugin, define_global_property};
