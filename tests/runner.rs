mod common;

use common::{parameter_file, Villages};
use masim::prelude::*;
use tempfile::tempdir;

fn args(seed: u64, output_dir: &std::path::Path) -> BaseArgs {
    BaseArgs {
        random_seed: seed,
        config: parameter_file(),
        output_dir: output_dir.to_path_buf(),
        log_level: None,
    }
}

#[test]
fn run_from_parameter_file() {
    let output = tempdir().unwrap();
    let (context, model) = run_with_base_args(args(4, output.path()), |context, args| {
        assert_eq!(context.get_parameters().number_of_locations, 2);
        let mut model = Model::new(Villages::new(100));
        model.add_reporter(Box::new(MonthlyStatusReporter::new(
            args.output_path("monthly_status.csv"),
        )));
        Ok(model)
    })
    .unwrap();

    assert_eq!(context.get_current_day(), 180);
    assert_eq!(context.get_random_seed(), 4);
    // released on the way out
    assert_eq!(context.scheduler().number_of_pending_events(), 0);
    assert_eq!(model.population().infected_by_day.len(), 180);
    assert!(output.path().join("monthly_status.csv").exists());
}

#[test]
fn population_error_stops_the_run() {
    struct Failing(Villages);

    impl Population for Failing {
        fn initialize(&mut self, context: &mut Context) -> Result<(), SimError> {
            self.0.initialize(context)
        }

        fn introduce_initial_cases(&mut self, context: &mut Context) -> Result<(), SimError> {
            self.0.introduce_initial_cases(context)
        }

        fn perform_infection_event(&mut self, context: &mut Context) -> Result<(), SimError> {
            if context.get_current_day() == 40 {
                return Err(SimError::from("infection step failed"));
            }
            self.0.perform_infection_event(context)
        }

        fn perform_birth_event(&mut self, context: &mut Context) -> Result<(), SimError> {
            self.0.perform_birth_event(context)
        }

        fn perform_death_event(&mut self, context: &mut Context) -> Result<(), SimError> {
            self.0.perform_death_event(context)
        }

        fn perform_circulation_event(&mut self, context: &mut Context) -> Result<(), SimError> {
            self.0.perform_circulation_event(context)
        }

        fn update_force_of_infection(
            &mut self,
            context: &mut Context,
            day: Day,
        ) -> Result<(), SimError> {
            self.0.update_force_of_infection(context, day)
        }

        fn introduce_parasite(
            &mut self,
            context: &mut Context,
            location: LocationId,
            genotype: GenotypeId,
            count: u32,
        ) -> Result<(), SimError> {
            self.0.introduce_parasite(context, location, genotype, count)
        }
    }

    let output = tempdir().unwrap();
    let result = run_with_base_args(args(4, output.path()), |_, _| {
        Ok(Model::new(Failing(Villages::new(50))))
    });
    assert!(matches!(result, Err(SimError::SimError(message)) if message == "infection step failed"));
}
