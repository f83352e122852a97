//! Copy forecast danger levels onto observed problems.
//!
//! An observed problem gets the level of the forecast for its region with
//! the latest date on or before the problem's date. Forecasts with level 0
//! (not assessed) are never used. When several forecasts share that date the
//! first one in input order wins.

use avy_varsom::{
    danger::{AvalancheDanger, SourceKind},
    problem::AvalancheProblem,
};
use log::debug;
use std::collections::HashMap;

fn usable(forecast: &AvalancheDanger) -> bool {
    forecast.source == SourceKind::Forecast && forecast.is_assessed()
}

fn copy_level(problem: &mut AvalancheProblem, forecast: &AvalancheDanger) {
    problem.danger_level = Some(forecast.danger_level);
    problem.danger_level_name = Some(forecast.danger_level_name.clone());
}

/// Backfill observation problems from `forecasts`, returning how many
/// problems received a level.
///
/// Forecasts are bucketed per region and sorted by date; the problems of a
/// region are then walked in date order with a cursor that only moves
/// forward.
pub fn backfill_danger_levels(
    problems: &mut [AvalancheProblem],
    forecasts: &[AvalancheDanger],
) -> usize {
    let mut by_region: HashMap<i32, Vec<&AvalancheDanger>> = HashMap::new();
    for forecast in forecasts.iter().filter(|f| usable(f)) {
        by_region.entry(forecast.region_id).or_default().push(forecast);
    }
    for list in by_region.values_mut() {
        list.sort_by_key(|f| f.date);
        list.dedup_by_key(|f| f.date);
    }

    let mut pending: Vec<usize> = problems
        .iter()
        .enumerate()
        .filter(|(_, p)| p.source == SourceKind::Observation)
        .map(|(index, _)| index)
        .collect();
    pending.sort_by_key(|&index| (problems[index].region_id, problems[index].date));

    let mut filled = 0;
    let mut region = None;
    let mut cursor = 0;
    for index in pending {
        let problem = &mut problems[index];
        if region != Some(problem.region_id) {
            region = Some(problem.region_id);
            cursor = 0;
        }
        let Some(list) = by_region.get(&problem.region_id) else {
            continue;
        };
        while cursor < list.len() && list[cursor].date <= problem.date {
            cursor += 1;
        }
        if cursor > 0 {
            copy_level(problem, list[cursor - 1]);
            filled += 1;
        }
    }
    debug!(
        "Backfilled danger level on {} of {} problems",
        filled,
        problems.len()
    );
    filled
}

/// Reference implementation scanning every forecast for every problem.
pub fn backfill_danger_levels_naive(
    problems: &mut [AvalancheProblem],
    forecasts: &[AvalancheDanger],
) -> usize {
    let mut filled = 0;
    for problem in problems
        .iter_mut()
        .filter(|p| p.source == SourceKind::Observation)
    {
        let mut best: Option<&AvalancheDanger> = None;
        for forecast in forecasts.iter().filter(|f| usable(f)) {
            if forecast.region_id != problem.region_id || forecast.date > problem.date {
                continue;
            }
            if best.map_or(true, |b| forecast.date > b.date) {
                best = Some(forecast);
            }
        }
        if let Some(forecast) = best {
            copy_level(problem, forecast);
            filled += 1;
        }
    }
    filled
}
