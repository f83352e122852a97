//! Flat CSV tables of reconciled dangers and their problems.

use avy_utils::dates::{format_date, season_for_date};
use avy_varsom::{
    danger::{AvalancheDanger, SourceKind},
    problem::EawsCategory,
    record::RecordSchema,
};
use serde::Serialize;
use std::io::Write;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DangerRow {
    pub season: String,
    pub date: String,
    pub region_id: i32,
    pub region_name: String,
    pub source: SourceKind,
    pub schema: RecordSchema,
    pub danger_level: u8,
    pub danger_level_name: String,
    pub main_problem: Option<String>,
    pub main_problem_eaws: Option<EawsCategory>,
    pub problem_count: usize,
    pub forecast_correct: Option<String>,
    /// Language code of the main message, 1 Norwegian, 2 English
    pub main_message_lang: Option<i32>,
    pub reg_id: Option<i64>,
    pub nick: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProblemRow {
    pub season: String,
    pub date: String,
    pub region_id: i32,
    pub region_name: String,
    pub source: SourceKind,
    pub schema: RecordSchema,
    pub order: i32,
    pub cause_id: Option<i32>,
    pub cause_name: String,
    pub problem_type: Option<String>,
    pub avalanche_type: Option<String>,
    pub destructive_size: Option<String>,
    pub trigger: Option<String>,
    pub probability: Option<String>,
    pub distribution: Option<String>,
    pub eaws_category: Option<EawsCategory>,
    pub danger_level: Option<u8>,
    pub reg_id: Option<i64>,
    pub nick: Option<String>,
}

pub fn danger_rows(dangers: &[AvalancheDanger]) -> Vec<DangerRow> {
    dangers
        .iter()
        .map(|d| {
            let main = d.main_problem();
            DangerRow {
                season: season_for_date(&d.date),
                date: format_date(&d.date),
                region_id: d.region_id,
                region_name: d.region_name.clone(),
                source: d.source,
                schema: d.schema,
                danger_level: d.danger_level,
                danger_level_name: d.danger_level_name.clone(),
                main_problem: main.map(|p| p.cause_name.clone()),
                main_problem_eaws: main.and_then(|p| p.eaws_category),
                problem_count: d.problems.len(),
                forecast_correct: d.forecast_correct.clone(),
                main_message_lang: d.main_message.as_ref().map(|m| m.lang.id()),
                reg_id: d.reg_id,
                nick: d.nick.clone(),
            }
        })
        .collect()
}

pub fn problem_rows(dangers: &[AvalancheDanger]) -> Vec<ProblemRow> {
    dangers
        .iter()
        .flat_map(|d| d.problems.iter())
        .map(|p| ProblemRow {
            season: season_for_date(&p.date),
            date: format_date(&p.date),
            region_id: p.region_id,
            region_name: p.region_name.clone(),
            source: p.source,
            schema: p.schema,
            order: p.order,
            cause_id: p.cause_id,
            cause_name: p.cause_name.clone(),
            problem_type: p.problem_type_name.clone(),
            avalanche_type: p.avalanche_type_name.clone(),
            destructive_size: p.destructive_size_name.clone(),
            trigger: p.trigger.clone(),
            probability: p.probability.clone(),
            distribution: p.distribution.clone(),
            eaws_category: p.eaws_category,
            danger_level: p.danger_level,
            reg_id: p.reg_id,
            nick: p.nick.clone(),
        })
        .collect()
}

/// Write `rows` as CSV with a header line.
pub fn write_csv<W: Write, T: Serialize>(writer: W, rows: &[T]) -> anyhow::Result<()> {
    let mut wtr = csv::WriterBuilder::new()
        .delimiter(b',')
        .has_headers(true)
        .from_writer(writer);
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use avy_varsom::{
        danger::{LangKey, LangText},
        problem::AvalancheProblem,
    };
    use chrono::NaiveDate;

    fn sample() -> AvalancheDanger {
        let date = NaiveDate::from_ymd_opt(2017, 2, 10).unwrap();
        let mut problem = AvalancheProblem::new(
            3016,
            "Lyngen",
            date,
            0,
            Some(15),
            "Poor bonding between layers in wind deposited snow",
            SourceKind::Observation,
            RecordSchema::EvalProblemV2,
        );
        problem.eaws_category = Some(EawsCategory::WindDriftedSnow);
        problem.danger_level = Some(2);
        AvalancheDanger {
            region_id: 3016,
            region_name: "Lyngen".to_string(),
            source: SourceKind::Observation,
            schema: RecordSchema::EvaluationV2,
            date,
            time: None,
            danger_level: 3,
            danger_level_name: "3 Considerable".to_string(),
            main_message: Some(LangText {
                lang: LangKey::English,
                text: "Wind slabs in lee".to_string(),
            }),
            nick: Some("guide".to_string()),
            reg_id: Some(11),
            forecast_correct: None,
            problems: vec![problem],
        }
    }

    #[test]
    fn test_danger_rows() {
        let rows = danger_rows(&[sample()]);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].season, "2016-17");
        assert_eq!(rows[0].date, "2017-02-10");
        assert_eq!(rows[0].problem_count, 1);
        assert_eq!(rows[0].main_problem_eaws, Some(EawsCategory::WindDriftedSnow));
        assert_eq!(rows[0].main_message_lang, Some(2));
    }

    #[test]
    fn test_write_problem_csv() {
        let mut out = Vec::new();
        write_csv(&mut out, &problem_rows(&[sample()])).unwrap();
        let text = String::from_utf8(out).unwrap();
        let mut lines = text.lines();
        let header = lines.next().unwrap();
        assert!(header.starts_with("season,date,region_id,region_name,source,schema,order"));
        let row = lines.next().unwrap();
        assert!(row.starts_with("2016-17,2017-02-10,3016,Lyngen,Observation,eval_problem_v2,0,15,"));
        assert!(row.contains("Wind-drifted snow"));
        assert!(lines.next().is_none());
    }
}
