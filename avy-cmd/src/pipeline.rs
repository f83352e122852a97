//! Map raw records, backfill, classify and reconcile them in one pass.

use anyhow::Context;
use avy_data::{
    backfill::backfill_danger_levels,
    eaws::annotate,
    reconcile::{reconcile, ReconcileOptions},
};
use avy_utils::dates::season_dates;
use avy_varsom::{
    codebook::Codebook,
    danger::{AvalancheDanger, SourceKind},
    problem::AvalancheProblem,
    record::{MapContext, RawRecord},
    spatial::{DirectoryPolygonSource, SpatialResolver},
};
use chrono::NaiveDate;
use log::{info, warn};
use std::path::Path;

#[derive(Debug, Clone, Default)]
pub struct PipelineOptions {
    /// Keep only records dated inside this season, e.g. "2016-17"
    pub season: Option<String>,
    pub reconcile: ReconcileOptions,
}

/// Reconciled dangers of both source kinds.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Reconciled {
    pub forecasts: Vec<AvalancheDanger>,
    pub observations: Vec<AvalancheDanger>,
    /// Records the mappers refused
    pub rejected: usize,
}

impl Reconciled {
    pub fn problem_count(&self) -> usize {
        self.forecasts
            .iter()
            .chain(self.observations.iter())
            .map(|d| d.problems.len())
            .sum()
    }
}

/// Read every JSON array of raw records in `paths`.
pub fn load_records<P: AsRef<Path>>(paths: &[P]) -> anyhow::Result<Vec<RawRecord>> {
    let mut records = Vec::new();
    for path in paths {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let mut parsed = RawRecord::parse_json(&json)
            .with_context(|| format!("Failed to parse records in {}", path.display()))?;
        info!("Loaded {} records from {}", parsed.len(), path.display());
        records.append(&mut parsed);
    }
    Ok(records)
}

/// The bundled codebook, or the one at `path`.
pub fn load_codebook(path: Option<&str>) -> anyhow::Result<Codebook> {
    let codebook = match path {
        Some(path) => {
            let csv = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read codebook {}", path))?;
            Codebook::parse_csv(&csv).with_context(|| format!("Invalid codebook {}", path))?
        }
        None => Codebook::bundled().context("Invalid bundled codebook")?,
    };
    info!("Codebook has {} codes", codebook.len());
    Ok(codebook)
}

/// A resolver over the polygon datasets in `dir`. Without a directory no
/// coordinates can be resolved.
pub fn load_resolver(dir: Option<&str>) -> anyhow::Result<SpatialResolver> {
    match dir {
        Some(dir) => SpatialResolver::load(&DirectoryPolygonSource::new(dir))
            .with_context(|| format!("Failed to load polygon datasets from {}", dir)),
        None => Ok(SpatialResolver::empty()),
    }
}

fn in_range(date: NaiveDate, range: Option<(NaiveDate, NaiveDate)>) -> bool {
    range.map_or(true, |(start, end)| start <= date && date <= end)
}

/// Run the full pipeline over `records`.
///
/// Records the mappers reject are logged and counted, not fatal. Reconcile
/// errors are.
pub fn run_pipeline(
    records: &[RawRecord],
    ctx: &MapContext,
    options: &PipelineOptions,
) -> anyhow::Result<Reconciled> {
    let range = options
        .season
        .as_deref()
        .map(season_dates)
        .transpose()
        .context("Invalid season")?;

    let mut forecast_dangers = Vec::new();
    let mut forecast_problems: Vec<AvalancheProblem> = Vec::new();
    let mut observed_dangers = Vec::new();
    let mut observed_problems: Vec<AvalancheProblem> = Vec::new();
    let mut rejected = 0;

    for (index, record) in records.iter().enumerate() {
        let mapped = match record.map(ctx) {
            Ok(mapped) => mapped,
            Err(e) => {
                warn!("Skipping {} record #{}: {}", record.schema(), index, e);
                rejected += 1;
                continue;
            }
        };
        let (dangers, problems) = match record.source() {
            SourceKind::Forecast => (&mut forecast_dangers, &mut forecast_problems),
            SourceKind::Observation => (&mut observed_dangers, &mut observed_problems),
        };
        dangers.extend(mapped.danger.filter(|d| in_range(d.date, range)));
        problems.extend(
            mapped
                .problems
                .into_iter()
                .filter(|p| in_range(p.date, range)),
        );
    }
    info!(
        "Mapped {} forecasts and {} observations ({} rejected)",
        forecast_dangers.len(),
        observed_dangers.len(),
        rejected
    );

    backfill_danger_levels(&mut observed_problems, &forecast_dangers);
    for problem in forecast_problems
        .iter_mut()
        .chain(observed_problems.iter_mut())
    {
        annotate(problem);
    }

    let forecasts = reconcile(
        forecast_dangers,
        forecast_problems,
        SourceKind::Forecast,
        &options.reconcile,
    )
    .context("Failed to reconcile forecasts")?;
    let observations = reconcile(
        observed_dangers,
        observed_problems,
        SourceKind::Observation,
        &options.reconcile,
    )
    .context("Failed to reconcile observations")?;

    Ok(Reconciled {
        forecasts,
        observations,
        rejected,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use avy_varsom::problem::EawsCategory;

    const RECORDS: &str = r#"[
        {"schema": "forecast_v2", "region_id": 3016, "region_name": "Lyngen",
         "valid_from": "2017-02-09T00:00:00", "danger_level": 2,
         "danger_level_name": "2 Moderate",
         "avalanche_problems": [
            {"avalanche_problem_id": 2, "avalanche_problem_type_id": 30, "aval_cause_id": 11},
            {"avalanche_problem_id": 1, "avalanche_problem_type_id": 10, "aval_cause_id": 15}
         ]},
        {"schema": "forecast_v2", "region_id": 3016, "region_name": "Lyngen",
         "valid_from": "2017-02-12T00:00:00", "danger_level": 3,
         "danger_level_name": "3 Considerable"},
        {"schema": "evaluation_v2", "reg_id": 11, "dt_obs_time": "2017-02-10T13:00:00",
         "nick_name": "guide", "forecast_region_tid": 3016,
         "forecast_region_name": "Lyngen", "avalanche_danger_tid": 3},
        {"schema": "eval_problem_v2", "reg_id": 11, "dt_obs_time": "2017-02-10T13:00:00",
         "nick_name": "guide", "forecast_region_tid": 3016,
         "forecast_region_name": "Lyngen", "avalanche_eval_problem_id": 0,
         "aval_cause_tid": 24, "avalanche_ext_tid": 15},
        {"schema": "eval_problem_v2", "dt_obs_time": "2017-02-10T13:00:00",
         "avalanche_eval_problem_id": 0, "aval_cause_tid": 24}
    ]"#;

    fn run(options: &PipelineOptions) -> Reconciled {
        let records = RawRecord::parse_json(RECORDS).unwrap();
        let codebook = Codebook::bundled().unwrap();
        let resolver = SpatialResolver::empty();
        let ctx = MapContext {
            codebook: &codebook,
            resolver: &resolver,
        };
        run_pipeline(&records, &ctx, options).unwrap()
    }

    #[test]
    fn test_pipeline_reconciles_both_sources() {
        let result = run(&PipelineOptions::default());
        assert_eq!(result.rejected, 1);
        assert_eq!(result.forecasts.len(), 2);
        assert_eq!(result.observations.len(), 1);
        assert_eq!(result.problem_count(), 3);

        let forecast = &result.forecasts[0];
        let orders: Vec<i32> = forecast.problems.iter().map(|p| p.order).collect();
        assert_eq!(orders, vec![1, 2]);
        assert_eq!(
            forecast.main_problem().unwrap().eaws_category,
            Some(EawsCategory::WindDriftedSnow)
        );

        let observation = &result.observations[0];
        assert_eq!(observation.reg_id, Some(11));
        let problem = &observation.problems[0];
        assert_eq!(problem.danger_level, Some(2));
        assert_eq!(problem.eaws_category, Some(EawsCategory::WetSnow));
    }

    #[test]
    fn test_pipeline_season_filter() {
        let options = PipelineOptions {
            season: Some("2015-16".to_string()),
            ..PipelineOptions::default()
        };
        let result = run(&options);
        assert!(result.forecasts.is_empty());
        assert!(result.observations.is_empty());
    }

    #[test]
    fn test_pipeline_rejects_bad_season() {
        let records = RawRecord::parse_json(RECORDS).unwrap();
        let codebook = Codebook::bundled().unwrap();
        let resolver = SpatialResolver::empty();
        let ctx = MapContext {
            codebook: &codebook,
            resolver: &resolver,
        };
        let options = PipelineOptions {
            season: Some("winter".to_string()),
            ..PipelineOptions::default()
        };
        assert!(run_pipeline(&records, &ctx, &options).is_err());
    }
}
