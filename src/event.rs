//! The closed set of deferred actions the scheduler knows how to run.
//!
//! An [`Event`] is plain data: the kind of work to do and the ids of whatever it applies to. The
//! behavior lives in [`crate::model::Model::execute_event`], which matches on the variant. Ids are
//! weak references; an event never keeps a person or a location alive.

use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};

use crate::genotype::GenotypeId;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PersonId(pub usize);

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LocationId(pub usize);

/// Identifies one clonal parasite population inside a host.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParasiteId(pub usize);

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TherapyId(pub usize);

/// What an event applies to.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Owner {
    Person(PersonId),
    Location(LocationId),
}

#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    Birthday {
        person: PersonId,
    },
    ProgressToClinical {
        person: PersonId,
        parasite: ParasiteId,
    },
    EndClinical {
        person: PersonId,
    },
    EndClinicalByNoTreatment {
        person: PersonId,
        parasite: ParasiteId,
    },
    EndClinicalDueToDrugResistance {
        person: PersonId,
    },
    TestTreatmentFailure {
        person: PersonId,
        parasite: ParasiteId,
        therapy: TherapyId,
    },
    /// Recompute a host's parasite densities while drugs are in the blood.
    UpdateWhenDrugIsPresent {
        person: PersonId,
        parasite: ParasiteId,
    },
    MatureGametocyte {
        person: PersonId,
        parasite: ParasiteId,
    },
    /// Liver-stage parasites of `genotype` emerge into the blood.
    MoveParasiteToBlood {
        person: PersonId,
        genotype: GenotypeId,
    },
    /// Reschedules itself every `update_frequency` days.
    UpdateEveryKDays {
        person: PersonId,
    },
    CirculateToTargetLocationNextDay {
        person: PersonId,
        target_location: LocationId,
    },
    ReturnToResidence {
        person: PersonId,
    },
    SwitchImmuneComponent {
        person: PersonId,
    },
    Importation {
        location: LocationId,
        genotype: GenotypeId,
        number: u32,
    },
    /// Imports on average `number` cases every `duration` days. Reschedules itself daily.
    ImportationPeriodically {
        location: LocationId,
        genotype: GenotypeId,
        number: u32,
        duration: u32,
    },
}

impl Event {
    #[must_use]
    pub fn owner(&self) -> Owner {
        match *self {
            Event::Birthday { person }
            | Event::ProgressToClinical { person, .. }
            | Event::EndClinical { person }
            | Event::EndClinicalByNoTreatment { person, .. }
            | Event::EndClinicalDueToDrugResistance { person }
            | Event::TestTreatmentFailure { person, .. }
            | Event::UpdateWhenDrugIsPresent { person, .. }
            | Event::MatureGametocyte { person, .. }
            | Event::MoveParasiteToBlood { person, .. }
            | Event::UpdateEveryKDays { person }
            | Event::CirculateToTargetLocationNextDay { person, .. }
            | Event::ReturnToResidence { person }
            | Event::SwitchImmuneComponent { person } => Owner::Person(person),
            Event::Importation { location, .. } | Event::ImportationPeriodically { location, .. } => {
                Owner::Location(location)
            }
        }
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Event::Birthday { .. } => "Birthday",
            Event::ProgressToClinical { .. } => "ProgressToClinical",
            Event::EndClinical { .. } => "EndClinical",
            Event::EndClinicalByNoTreatment { .. } => "EndClinicalByNoTreatment",
            Event::EndClinicalDueToDrugResistance { .. } => "EndClinicalDueToDrugResistance",
            Event::TestTreatmentFailure { .. } => "TestTreatmentFailure",
            Event::UpdateWhenDrugIsPresent { .. } => "UpdateWhenDrugIsPresent",
            Event::MatureGametocyte { .. } => "MatureGametocyte",
            Event::MoveParasiteToBlood { .. } => "MoveParasiteToBlood",
            Event::UpdateEveryKDays { .. } => "UpdateEveryKDays",
            Event::CirculateToTargetLocationNextDay { .. } => "CirculateToTargetLocationNextDay",
            Event::ReturnToResidence { .. } => "ReturnToResidence",
            Event::SwitchImmuneComponent { .. } => "SwitchImmuneComponent",
            Event::Importation { .. } => "Importation",
            Event::ImportationPeriodically { .. } => "ImportationPeriodically",
        }
    }
}

impl Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.owner() {
            Owner::Person(PersonId(id)) => write!(f, "{} (person {id})", self.name()),
            Owner::Location(LocationId(id)) => write!(f, "{} (location {id})", self.name()),
        }
    }
}
