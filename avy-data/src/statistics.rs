//! Summaries over reconciled dangers.

use avy_varsom::{danger::AvalancheDanger, problem::EawsCategory};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

/// Number of dangers in a region whose main problem falls in a category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryCount {
    pub region_id: i32,
    pub region_name: String,
    /// `None` counts main problems no rule could classify
    pub category: Option<EawsCategory>,
    pub count: usize,
}

/// EAWS category of each danger's main problem, counted per region.
/// Dangers without problems are not counted.
pub fn main_problem_distribution(dangers: &[AvalancheDanger]) -> Vec<CategoryCount> {
    let mut counts: BTreeMap<(i32, Option<EawsCategory>), usize> = BTreeMap::new();
    let mut names: HashMap<i32, &str> = HashMap::new();
    for danger in dangers {
        if let Some(main) = danger.main_problem() {
            *counts
                .entry((danger.region_id, main.eaws_category))
                .or_default() += 1;
            names.entry(danger.region_id).or_insert(&danger.region_name);
        }
    }
    counts
        .into_iter()
        .map(|((region_id, category), count)| CategoryCount {
            region_id,
            region_name: names.get(&region_id).copied().unwrap_or_default().to_string(),
            category,
            count,
        })
        .collect()
}

/// Forecast and observed danger level for the same region and day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LevelComparison {
    pub region_id: i32,
    pub date: NaiveDate,
    pub forecast_level: u8,
    pub observed_level: u8,
}

impl LevelComparison {
    /// Positive when the observer judged the danger higher than forecast.
    pub fn difference(&self) -> i32 {
        i32::from(self.observed_level) - i32::from(self.forecast_level)
    }
}

/// Pair every assessed observation with the assessed forecast of its
/// region and date. The first forecast in input order is used when there
/// are several; observations without a forecast are left out.
pub fn compare_levels(
    forecasts: &[AvalancheDanger],
    observations: &[AvalancheDanger],
) -> Vec<LevelComparison> {
    let mut issued: HashMap<(i32, NaiveDate), u8> = HashMap::new();
    for forecast in forecasts.iter().filter(|f| f.is_assessed()) {
        issued
            .entry((forecast.region_id, forecast.date))
            .or_insert(forecast.danger_level);
    }
    let mut comparisons: Vec<LevelComparison> = observations
        .iter()
        .filter(|o| o.is_assessed())
        .filter_map(|o| {
            issued
                .get(&(o.region_id, o.date))
                .map(|&forecast_level| LevelComparison {
                    region_id: o.region_id,
                    date: o.date,
                    forecast_level,
                    observed_level: o.danger_level,
                })
        })
        .collect();
    comparisons.sort_by_key(|c| (c.date, c.region_id));
    comparisons
}

/// How often observers agreed with the forecast level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LevelSummary {
    pub compared: usize,
    pub agreed: usize,
    /// Observed level above the forecast
    pub forecast_too_low: usize,
    /// Observed level below the forecast
    pub forecast_too_high: usize,
}

pub fn summarize_levels(comparisons: &[LevelComparison]) -> LevelSummary {
    comparisons
        .iter()
        .fold(LevelSummary::default(), |mut summary, comparison| {
            summary.compared += 1;
            match comparison.difference() {
                0 => summary.agreed += 1,
                d if d > 0 => summary.forecast_too_low += 1,
                _ => summary.forecast_too_high += 1,
            }
            summary
        })
}
