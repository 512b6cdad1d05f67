#![allow(dead_code)]
use std::path::PathBuf;

use masim::prelude::*;

pub const WILD_TYPE: &str = "||||N1||K||||||CR|";

pub fn parameter_file() -> PathBuf {
    PathBuf::from(concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/tests/data/two_villages.json"
    ))
}

/// Chance per day that an infected host infects a given susceptible host of its location,
/// divided by the location's size.
const TRANSMISSION_RATE: f64 = 0.08;
const CLEARANCE_PROBABILITY: f64 = 0.15;
const MUTATION_PROBABILITY: f64 = 0.2;

/// Hosts that are either uninfected or carry exactly one genotype. Infection spreads inside a
/// location, and the genotype passed on comes from the mosquito stage once it has a cohort.
pub struct Villages {
    hosts_per_location: usize,
    residents: Vec<Vec<PersonId>>,
    location_of: Vec<LocationId>,
    infection: Vec<Option<GenotypeId>>,
    host_foi: Vec<Vec<f64>>,
    pub infected_by_day: Vec<[usize; 2]>,
    pub imported: u32,
    pub updates: usize,
}

impl Villages {
    pub fn new(hosts_per_location: usize) -> Villages {
        Villages {
            hosts_per_location,
            residents: Vec::new(),
            location_of: Vec::new(),
            infection: Vec::new(),
            host_foi: Vec::new(),
            infected_by_day: Vec::new(),
            imported: 0,
            updates: 0,
        }
    }

    pub fn infected(&self, location: LocationId) -> usize {
        self.residents[location.0]
            .iter()
            .filter(|person| self.infection[person.0].is_some())
            .count()
    }

    pub fn infections(&self) -> impl Iterator<Item = GenotypeId> + '_ {
        self.infection.iter().flatten().copied()
    }

    fn infect_random_hosts(
        &mut self,
        context: &Context,
        location: LocationId,
        genotype: GenotypeId,
        count: usize,
    ) {
        let mut residents = self.residents[location.0].clone();
        context.shuffle(&mut residents);
        for person in residents.into_iter().take(count) {
            self.infection[person.0] = Some(genotype);
        }
    }
}

impl Population for Villages {
    fn initialize(&mut self, context: &mut Context) -> Result<(), SimError> {
        let locations = context.get_parameters().number_of_locations;
        let update_frequency = context.get_parameters().update_frequency as usize;
        for location in 0..locations {
            let mut residents = Vec::new();
            for _ in 0..self.hosts_per_location {
                let person = PersonId(self.location_of.len());
                self.location_of.push(LocationId(location));
                self.infection.push(None);
                residents.push(person);
                let first_update = context.random_uniform(update_frequency) as Day;
                context.schedule_event(first_update, Event::UpdateEveryKDays { person })?;
            }
            self.residents.push(residents);
            self.host_foi.push(vec![0.0; self.hosts_per_location]);
        }
        Ok(())
    }

    fn introduce_initial_cases(&mut self, context: &mut Context) -> Result<(), SimError> {
        let initial = context.get_parameters().initial_parasite_info.clone();
        for info in initial {
            let genotype = context
                .find_genotype(&info.aa_sequence)
                .ok_or_else(|| SimError::from("initial genotype was not interned"))?;
            let count = (info.prevalence * self.hosts_per_location as f64).round() as usize;
            self.infect_random_hosts(context, LocationId(info.location), genotype, count);
        }
        Ok(())
    }

    fn perform_infection_event(&mut self, context: &mut Context) -> Result<(), SimError> {
        let day = context.get_current_day() as usize;
        for location in 0..self.residents.len() {
            let infected = self.infected(LocationId(location));
            if infected == 0 {
                continue;
            }
            let probability = TRANSMISSION_RATE * infected as f64 / self.hosts_per_location as f64;
            for index in 0..self.residents[location].len() {
                let person = self.residents[location][index];
                if self.infection[person.0].is_some() || !context.sample_bool(probability) {
                    continue;
                }
                let from_mosquito = if context.has_mosquito() {
                    context.mosquito_random_genotype(
                        LocationId(location),
                        (day + 1) % context.number_of_tracking_days(),
                    )
                } else {
                    None
                };
                let genotype = match from_mosquito {
                    Some(genotype) => genotype,
                    None => {
                        let carriers: Vec<GenotypeId> = self.residents[location]
                            .iter()
                            .filter_map(|person| self.infection[person.0])
                            .collect();
                        carriers[context.random_uniform(carriers.len())]
                    }
                };
                self.infection[person.0] = Some(genotype);
            }
        }
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
        for (location, residents) in self.residents.iter().enumerate() {
            for (index, person) in residents.iter().enumerate() {
                self.host_foi[location][index] = if self.infection[person.0].is_some() {
                    1.0
                } else {
                    0.0
                };
            }
        }
        self.infected_by_day
            .push([self.infected(LocationId(0)), self.infected(LocationId(1))]);
        Ok(())
    }

    fn introduce_parasite(
        &mut self,
        context: &mut Context,
        location: LocationId,
        genotype: GenotypeId,
        count: u32,
    ) -> Result<(), SimError> {
        self.imported += count;
        self.infect_random_hosts(context, location, genotype, count as usize);
        Ok(())
    }

    fn update_person(&mut self, context: &mut Context, person: PersonId) -> Result<bool, SimError> {
        self.updates += 1;
        if let Some(genotype) = self.infection[person.0] {
            if context.sample_bool(CLEARANCE_PROBABILITY) {
                self.infection[person.0] = None;
            } else if context.sample_bool(MUTATION_PROBABILITY) {
                let drug = context.random_uniform(context.get_drug_database().len());
                self.infection[person.0] = Some(context.perform_mutation_by_drug(genotype, drug)?);
            }
        }
        Ok(true)
    }

    fn blood_meal_source(&self) -> Option<&dyn BloodMealSource> {
        Some(self)
    }
}

impl BloodMealSource for Villages {
    fn force_of_infection(&self, location: LocationId) -> f64 {
        self.host_foi[location.0].iter().sum()
    }

    fn hosts(&self, location: LocationId) -> &[PersonId] {
        &self.residents[location.0]
    }

    fn individual_force_of_infection(&self, location: LocationId) -> &[f64] {
        &self.host_foi[location.0]
    }

    fn infectious_parasites(&self, person: PersonId) -> Vec<(GenotypeId, f64)> {
        self.infection[person.0]
            .map(|genotype| vec![(genotype, 1.0)])
            .unwrap_or_default()
    }
}
