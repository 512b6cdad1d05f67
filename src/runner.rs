//! Command-line entry point for a simulation binary.
//!
//! A binary supplies only a setup function that builds its [`Model`]; everything else a run
//! needs (logging, seeding, reading the parameters, initializing, running and tearing down) is
//! done here:
//!
//! ```no_run
//! # use masim::prelude::*;
//! # fn build_population(_: &Context) -> Result<MyPopulation, SimError> { unimplemented!() }
//! # struct MyPopulation;
//! # impl Population for MyPopulation {
//! #     fn initialize(&mut self, _: &mut Context) -> Result<(), SimError> { Ok(()) }
//! #     fn introduce_initial_cases(&mut self, _: &mut Context) -> Result<(), SimError> { Ok(()) }
//! #     fn perform_infection_event(&mut self, _: &mut Context) -> Result<(), SimError> { Ok(()) }
//! #     fn perform_birth_event(&mut self, _: &mut Context) -> Result<(), SimError> { Ok(()) }
//! #     fn perform_death_event(&mut self, _: &mut Context) -> Result<(), SimError> { Ok(()) }
//! #     fn perform_circulation_event(&mut self, _: &mut Context) -> Result<(), SimError> { Ok(()) }
//! #     fn update_force_of_infection(&mut self, _: &mut Context, _: Day) -> Result<(), SimError> { Ok(()) }
//! #     fn introduce_parasite(&mut self, _: &mut Context, _: LocationId, _: GenotypeId, _: u32) -> Result<(), SimError> { Ok(()) }
//! # }
//! fn main() {
//!     run_with_args(|context, args| {
//!         let mut model = Model::new(build_population(context)?);
//!         model.add_reporter(Box::new(MonthlyStatusReporter::new(
//!             args.output_path("monthly_status.csv"),
//!         )));
//!         Ok(model)
//!     })
//!     .unwrap();
//! }
//! ```
use std::path::PathBuf;

use clap::{Args, Command, FromArgMatches as _};
use log::{info, LevelFilter};

use crate::context::Context;
use crate::error::SimError;
use crate::log::set_log_level;
use crate::model::Model;
use crate::parameters::ContextParametersExt;
use crate::population::Population;
use crate::random::ContextRandomExt;

/// Arguments every simulation binary accepts.
#[derive(Args, Debug, Clone)]
pub struct BaseArgs {
    /// Seed of the run's random number generator
    #[arg(short, long, default_value = "0")]
    pub random_seed: u64,

    /// Path of the JSON parameter file
    #[arg(short, long)]
    pub config: PathBuf,

    /// Directory for report files
    #[arg(short, long, default_value = ".")]
    pub output_dir: PathBuf,

    /// Console log level (off, error, warn, info, debug, trace)
    #[arg(short, long)]
    pub log_level: Option<LevelFilter>,
}

impl BaseArgs {
    /// `file_name` inside the output directory.
    #[must_use]
    pub fn output_path(&self, file_name: &str) -> PathBuf {
        self.output_dir.join(file_name)
    }
}

fn create_cli() -> Command {
    BaseArgs::augment_args(Command::new("masim"))
}

/// Parses the command line and runs the model built by `setup`. See [`run_with_base_args`].
///
/// # Errors
///
/// Returns an error if the arguments cannot be parsed or the run fails.
pub fn run_with_args<P, F>(setup: F) -> Result<(Context, Model<P>), Box<dyn std::error::Error>>
where
    P: Population,
    F: FnOnce(&mut Context, &BaseArgs) -> Result<Model<P>, SimError>,
{
    let matches = create_cli().get_matches();
    let args = BaseArgs::from_arg_matches(&matches)?;
    Ok(run_with_base_args(args, setup)?)
}

/// Sets up logging, seeds the generator and loads the parameters, then initializes, runs and
/// releases the model that `setup` builds. The context and model are handed back for
/// inspection.
///
/// # Errors
///
/// Returns the first error of loading the parameters, of `setup`, or of the run. The event pool
/// is released even when the run fails.
pub fn run_with_base_args<P, F>(args: BaseArgs, setup: F) -> Result<(Context, Model<P>), SimError>
where
    P: Population,
    F: FnOnce(&mut Context, &BaseArgs) -> Result<Model<P>, SimError>,
{
    if let Some(level) = args.log_level {
        set_log_level(level);
    }
    let mut context = Context::new();
    context.init_random(args.random_seed);
    context.init_parameters(&args.config)?;
    info!("random seed {}", args.random_seed);

    let mut model = setup(&mut context, &args)?;
    model.initialize(&mut context)?;
    let result = model.run(&mut context);
    model.release(&mut context);
    result?;
    Ok((context, model))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{LocationId, PersonId};
    use crate::genotype::GenotypeId;
    use crate::parameters::sample_parameters;
    use crate::report::MonthlyStatusReporter;
    use crate::scheduler::Day;
    use std::io::Write;
    use tempfile::{tempdir, NamedTempFile};

    #[derive(Default)]
    struct Idle {
        first_draw: Option<u64>,
        days: u32,
    }

    impl Population for Idle {
        fn initialize(&mut self, context: &mut Context) -> Result<(), SimError> {
            self.first_draw = Some(context.sample_range(0..1_000_000));
            Ok(())
        }

        fn introduce_initial_cases(&mut self, _context: &mut Context) -> Result<(), SimError> {
            Ok(())
        }

        fn perform_infection_event(&mut self, _context: &mut Context) -> Result<(), SimError> {
            self.days += 1;
            Ok(())
        }

        fn perform_birth_event(&mut self, _context: &mut Context) -> Result<(), SimError> {
            Ok(())
        }

        fn perform_death_event(&mut self, _context: &mut Context) -> Result<(), SimError> {
            Ok(())
        }

        fn perform_circulation_event(&mut self, _context: &mut Context) -> Result<(), SimError> {
            Ok(())
        }

        fn update_force_of_infection(
            &mut self,
            _context: &mut Context,
            _day: Day,
        ) -> Result<(), SimError> {
            Ok(())
        }

        fn introduce_parasite(
            &mut self,
            _context: &mut Context,
            _location: LocationId,
            _genotype: GenotypeId,
            _count: u32,
        ) -> Result<(), SimError> {
            Ok(())
        }

        fn update_person(
            &mut self,
            _context: &mut Context,
            _person: PersonId,
        ) -> Result<bool, SimError> {
            Ok(false)
        }
    }

    fn parameter_file() -> NamedTempFile {
        let mut parameters = sample_parameters();
        parameters.total_time = 60;
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(serde_json::to_string(&parameters).unwrap().as_bytes())
            .unwrap();
        file
    }

    fn args(config: PathBuf, output_dir: PathBuf) -> BaseArgs {
        BaseArgs {
            random_seed: 42,
            config,
            output_dir,
            log_level: None,
        }
    }

    #[test]
    fn parses_base_args() {
        let matches = create_cli()
            .try_get_matches_from([
                "masim", "--config", "run.json", "-r", "7", "--log-level", "debug",
            ])
            .unwrap();
        let args = BaseArgs::from_arg_matches(&matches).unwrap();
        assert_eq!(args.random_seed, 7);
        assert_eq!(args.config, PathBuf::from("run.json"));
        assert_eq!(args.output_dir, PathBuf::from("."));
        assert_eq!(args.log_level, Some(LevelFilter::Debug));
        assert_eq!(args.output_path("a.csv"), PathBuf::from("./a.csv"));
    }

    #[test]
    fn config_is_required() {
        assert!(create_cli().try_get_matches_from(["masim"]).is_err());
    }

    #[test]
    fn runs_the_model() {
        let file = parameter_file();
        let output = tempdir().unwrap();
        let args = args(file.path().to_path_buf(), output.path().to_path_buf());
        let (context, model) = run_with_base_args(args, |_, args| {
            let mut model = Model::new(Idle::default());
            model.add_reporter(Box::new(MonthlyStatusReporter::new(
                args.output_path("monthly_status.csv"),
            )));
            Ok(model)
        })
        .unwrap();

        assert_eq!(context.get_current_day(), 60);
        assert_eq!(context.get_random_seed(), 42);
        assert_eq!(model.population().days, 60);
        assert!(output.path().join("monthly_status.csv").exists());
    }

    #[test]
    fn seed_is_applied_before_setup() {
        let file = parameter_file();
        let output = tempdir().unwrap();
        let draw = || {
            let args = args(file.path().to_path_buf(), output.path().to_path_buf());
            let (_, model) =
                run_with_base_args(args, |_, _| Ok(Model::new(Idle::default()))).unwrap();
            model.population().first_draw
        };
        assert!(draw().is_some());
        assert_eq!(draw(), draw());
    }

    #[test]
    fn missing_parameter_file() {
        let output = tempdir().unwrap();
        let args = args(output.path().join("missing.json"), output.path().to_path_buf());
        let result = run_with_base_args(args, |_, _| Ok(Model::new(Idle::default())));
        assert!(matches!(result, Err(SimError::IoError(_))));
    }

    #[test]
    fn setup_error_is_returned() {
        let file = parameter_file();
        let output = tempdir().unwrap();
        let args = args(file.path().to_path_buf(), output.path().to_path_buf());
        let result = run_with_base_args(args, |_, _| -> Result<Model<Idle>, SimError> {
            Err(SimError::SimError("no population".to_string()))
        });
        assert!(matches!(result, Err(SimError::SimError(message)) if message == "no population"));
    }
}
