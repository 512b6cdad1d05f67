mod common;

use std::fs;

use common::{parameter_file, Villages, WILD_TYPE};
use masim::prelude::*;
use masim::report::MonthlyStatus;
use tempfile::tempdir;

fn run(seed: u64, output: &std::path::Path) -> (Context, Model<Villages>) {
    let mut context = Context::new();
    context.init_random(seed);
    context.init_parameters(&parameter_file()).unwrap();

    let mut model = Model::new(Villages::new(300));
    model.add_reporter(Box::new(MonthlyStatusReporter::new(
        output.join("monthly_status.csv"),
    )));
    model.initialize(&mut context).unwrap();
    model.run(&mut context).unwrap();
    (context, model)
}

#[test]
fn infection_spreads_and_imports_arrive() {
    let output = tempdir().unwrap();
    let (context, model) = run(11, output.path());
    let villages = model.population();

    assert_eq!(context.get_current_day(), 180);
    assert_eq!(villages.infected_by_day.len(), 180);
    // 20% of the first village at the start, nobody in the second until day 30
    assert!(villages.infected_by_day[0][0] >= 50);
    assert!(villages.infected_by_day[..30].iter().all(|day| day[1] == 0));
    assert!(villages.infected_by_day[30][1] > 0);
    // one-time importation plus at least part of the periodic one
    assert!(villages.imported >= 10);
}

#[test]
fn every_host_is_updated_weekly() {
    let output = tempdir().unwrap();
    let (context, model) = run(5, output.path());
    let updates = model.population().updates;
    // 600 hosts, first update in days 0 to 6, then every 7 days over 180 days
    assert!((600 * 25..=600 * 26).contains(&updates), "{updates} updates");
    // one pending update per host survives the run
    assert!(context.scheduler().number_of_pending_events() >= 600);
}

#[test]
fn new_genotypes_are_valid() {
    let output = tempdir().unwrap();
    let (context, model) = run(3, output.path());
    let gene_info = &context.get_parameters().pf_gene_info;

    assert!(context.number_of_genotypes() > 3);
    for id in 0..context.number_of_genotypes() {
        let genotype = context.get_genotype(GenotypeId(id));
        assert!(genotype.is_valid(gene_info), "{genotype}");
        assert!(genotype.daily_fitness() > 0.0 && genotype.daily_fitness() <= 1.0);
    }
    for genotype in model.population().infections() {
        assert!(genotype.0 < context.number_of_genotypes());
    }
    assert_eq!(context.find_genotype(WILD_TYPE), Some(GenotypeId(0)));
}

#[test]
fn monthly_rows_cover_the_run() {
    let output = tempdir().unwrap();
    run(2, output.path());
    let mut reader = csv::Reader::from_path(output.path().join("monthly_status.csv")).unwrap();
    let rows: Vec<MonthlyStatus> = reader.deserialize().map(Result::unwrap).collect();
    // January to May 2020; June 28 is the last day run
    let dates: Vec<&str> = rows.iter().map(|row| row.date.as_str()).collect();
    assert_eq!(
        dates,
        vec!["2020/01/31", "2020/02/29", "2020/03/31", "2020/04/30", "2020/05/31"]
    );
    assert!(rows.windows(2).all(|pair| pair[0].genotypes <= pair[1].genotypes));
}

#[test]
fn same_seed_same_run() {
    let first_output = tempdir().unwrap();
    let second_output = tempdir().unwrap();
    let (first, first_model) = run(21, first_output.path());
    let (second, second_model) = run(21, second_output.path());

    assert_eq!(
        first_model.population().infected_by_day,
        second_model.population().infected_by_day
    );
    assert_eq!(first.number_of_genotypes(), second.number_of_genotypes());
    for id in 0..first.number_of_genotypes() {
        assert_eq!(
            first.get_genotype(GenotypeId(id)).aa_sequence(),
            second.get_genotype(GenotypeId(id)).aa_sequence()
        );
    }
    assert_eq!(
        fs::read_to_string(first_output.path().join("monthly_status.csv")).unwrap(),
        fs::read_to_string(second_output.path().join("monthly_status.csv")).unwrap()
    );
}

#[test]
fn release_drops_pending_events() {
    let output = tempdir().unwrap();
    let (mut context, mut model) = run(1, output.path());
    model.release(&mut context);
    assert_eq!(context.scheduler().number_of_pending_events(), 0);
    assert_eq!(context.scheduler().live_events(), 0);
}
