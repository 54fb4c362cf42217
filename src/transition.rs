//! Monthly state transition.
//!
//! Deaths are applied to every group before any births are computed, so the
//! birth step always reads post-death populations.

use std::collections::BTreeMap;

use crate::group::{Group, GroupId};

/// Population per group for a single month.
pub type PopulationState = BTreeMap<GroupId, f64>;

pub const CHILDBEARING_SPAN_YEARS: f64 = 15.0;
pub const MARRIAGEABLE_SPAN_YEARS: f64 = 15.0;
const MONTHS_PER_YEAR: f64 = 12.0;
const MIN_LIFE_EXPECTANCY_YEARS: f64 = 1.0;

/// Month-zero state: each group's configured initial population.
pub fn initial_state(groups: &[Group]) -> PopulationState {
    groups
        .iter()
        .map(|group| (group.id.clone(), group.initial_population))
        .collect()
}

/// Computes next month's populations from this month's.
///
/// Groups missing from `current` are read as empty; entries for ids that are
/// not in `groups` are dropped. Parameters are assumed to be validated.
pub fn transition(current: &PopulationState, groups: &[Group]) -> PopulationState {
    let mut next: PopulationState = groups
        .iter()
        .map(|group| {
            let population = current.get(&group.id).copied().unwrap_or(0.0);
            (group.id.clone(), population - monthly_deaths(group, population))
        })
        .collect();

    for group in groups {
        if let Some(population) = next.get_mut(&group.id) {
            *population += monthly_births(group, *population);
            *population = population.max(0.0);
        }
    }

    next
}

fn monthly_deaths(group: &Group, population: f64) -> f64 {
    if population <= 0.0 {
        return 0.0;
    }
    let life_expectancy = group.life_expectancy_years.max(MIN_LIFE_EXPECTANCY_YEARS);
    let monthly_death_rate = 1.0 / (life_expectancy * MONTHS_PER_YEAR);
    population * monthly_death_rate
}

fn monthly_births(group: &Group, population: f64) -> f64 {
    if population <= 0.0 {
        return 0.0;
    }
    let married_fraction = 1.0 - group.fraction_not_married;

    let in_childbearing_age = (CHILDBEARING_SPAN_YEARS
        / CHILDBEARING_SPAN_YEARS.max(group.life_expectancy_years * group.female_ratio))
    .min(1.0);
    let potential_mothers = population * group.female_ratio * in_childbearing_age * married_fraction;

    let in_marriageable_age = (MARRIAGEABLE_SPAN_YEARS
        / MARRIAGEABLE_SPAN_YEARS.max(group.life_expectancy_years * group.male_ratio))
    .min(1.0);
    let potential_fathers = population * group.male_ratio * in_marriageable_age * married_fraction;

    // Matching is capped by whichever side is scarcer; surplus is not reallocated.
    let slots = potential_fathers * f64::from(group.max_wives.max(1));
    let married_women = slots.min(potential_mothers);

    let monthly_rate_per_woman =
        group.avg_children_per_woman / (CHILDBEARING_SPAN_YEARS * MONTHS_PER_YEAR);
    (married_women * monthly_rate_per_woman).max(0.0)
}
