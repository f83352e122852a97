use super::{code_name, danger_level, lang_key, parse_when, require, MapContext, RecordSchema};
use crate::{
    codebook::{Field, Vocabulary},
    danger::{AvalancheDanger, LangKey, LangText, SourceKind},
    error::RecordError,
    problem::AvalancheProblem,
    region::canonical_region_id,
};
use chrono::{NaiveDate, NaiveTime};
use serde::Deserialize;

/// An avalanche problem nested in a forecast warning.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct ForecastProblemRecord {
    /// Priority of the problem within the warning
    pub avalanche_problem_id: Option<i32>,
    pub avalanche_problem_type_id: Option<i32>,
    pub aval_cause_id: Option<i32>,
    pub avalanche_ext_id: Option<i32>,
    pub destructive_size_ext_id: Option<i32>,
    pub aval_trigger_simple_id: Option<i32>,
    pub aval_probability_id: Option<i32>,
    pub aval_propagation_id: Option<i32>,
}

/// Forecast warning as published before October 2016.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct ForecastV1 {
    pub region_id: Option<i32>,
    pub region_name: Option<String>,
    pub date: Option<String>,
    pub danger_level: Option<i32>,
    pub level_name: Option<String>,
    pub main_text: Option<String>,
    pub author: Option<String>,
    pub lang_key: Option<i32>,
    #[serde(default)]
    pub problems: Vec<ForecastProblemRecord>,
}

/// Forecast warning as published from October 2016.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct ForecastV2 {
    pub region_id: Option<i32>,
    pub region_name: Option<String>,
    pub valid_from: Option<String>,
    pub danger_level: Option<i32>,
    pub danger_level_name: Option<String>,
    pub main_text: Option<String>,
    pub author: Option<String>,
    pub lang_key: Option<i32>,
    #[serde(default)]
    pub avalanche_problems: Vec<ForecastProblemRecord>,
}

/// Warning fields common to both forecast shapes, validated.
struct Warning {
    schema: RecordSchema,
    region_id: i32,
    region_name: String,
    date: NaiveDate,
    time: Option<NaiveTime>,
    danger_level: u8,
    danger_level_name: String,
    main_text: Option<String>,
    author: Option<String>,
    lang: LangKey,
}

impl ForecastV1 {
    fn warning(&self) -> Result<Warning, RecordError> {
        let raw_date = require(&self.date, "date")?;
        let (date, time) = parse_when(&raw_date, "date")?;
        Ok(Warning {
            schema: RecordSchema::ForecastV1,
            region_id: canonical_region_id(require(&self.region_id, "region_id")?),
            region_name: require(&self.region_name, "region_name")?,
            date,
            time,
            danger_level: danger_level(require(&self.danger_level, "danger_level")?, "danger_level")?,
            danger_level_name: require(&self.level_name, "level_name")?,
            main_text: self.main_text.clone(),
            author: self.author.clone(),
            lang: lang_key(self.lang_key)?,
        })
    }

    pub fn to_danger(&self) -> Result<AvalancheDanger, RecordError> {
        Ok(self.warning()?.danger())
    }

    pub fn to_problems(&self, ctx: &MapContext) -> Result<Vec<AvalancheProblem>, RecordError> {
        let warning = self.warning()?;
        self.problems.iter().map(|p| warning.problem(p, ctx)).collect()
    }
}

impl ForecastV2 {
    fn warning(&self) -> Result<Warning, RecordError> {
        let valid_from = require(&self.valid_from, "valid_from")?;
        let (date, time) = parse_when(&valid_from, "valid_from")?;
        Ok(Warning {
            schema: RecordSchema::ForecastV2,
            region_id: canonical_region_id(require(&self.region_id, "region_id")?),
            region_name: require(&self.region_name, "region_name")?,
            date,
            time,
            danger_level: danger_level(require(&self.danger_level, "danger_level")?, "danger_level")?,
            danger_level_name: require(&self.danger_level_name, "danger_level_name")?,
            main_text: self.main_text.clone(),
            author: self.author.clone(),
            lang: lang_key(self.lang_key)?,
        })
    }

    pub fn to_danger(&self) -> Result<AvalancheDanger, RecordError> {
        Ok(self.warning()?.danger())
    }

    pub fn to_problems(&self, ctx: &MapContext) -> Result<Vec<AvalancheProblem>, RecordError> {
        let warning = self.warning()?;
        self.avalanche_problems
            .iter()
            .map(|p| warning.problem(p, ctx))
            .collect()
    }
}

impl Warning {
    fn danger(&self) -> AvalancheDanger {
        AvalancheDanger {
            region_id: self.region_id,
            region_name: self.region_name.clone(),
            source: SourceKind::Forecast,
            schema: self.schema,
            date: self.date,
            time: self.time,
            danger_level: self.danger_level,
            danger_level_name: self.danger_level_name.clone(),
            main_message: self.main_text.as_ref().map(|text| LangText {
                lang: self.lang,
                text: text.clone(),
            }),
            nick: self.author.clone(),
            reg_id: None,
            forecast_correct: None,
            problems: Vec::new(),
        }
    }

    /// Forecast problems carry the danger level of their warning.
    fn problem(
        &self,
        record: &ForecastProblemRecord,
        ctx: &MapContext,
    ) -> Result<AvalancheProblem, RecordError> {
        let codebook = ctx.codebook;
        let vocabulary = Vocabulary::Forecast;
        let order = require(&record.avalanche_problem_id, "avalanche_problem_id")?;
        let type_id = require(&record.avalanche_problem_type_id, "avalanche_problem_type_id")?;
        let cause_id = require(&record.aval_cause_id, "aval_cause_id")?;
        let cause_name = codebook.lookup(vocabulary, Field::AvalCause, cause_id)?;

        let mut problem = AvalancheProblem::new(
            self.region_id,
            &self.region_name,
            self.date,
            order,
            Some(cause_id),
            cause_name,
            SourceKind::Forecast,
            self.schema,
        );
        problem.problem_type_id = Some(type_id);
        problem.problem_type_name = Some(
            codebook
                .lookup(vocabulary, Field::AvalancheProblemType, type_id)?
                .to_string(),
        );
        problem.avalanche_type_id = record.avalanche_ext_id;
        problem.avalanche_type_name =
            code_name(codebook, vocabulary, Field::AvalancheType, record.avalanche_ext_id)?;
        problem.destructive_size_id = record.destructive_size_ext_id;
        problem.destructive_size_name = code_name(
            codebook,
            vocabulary,
            Field::DestructiveSize,
            record.destructive_size_ext_id,
        )?;
        problem.trigger =
            code_name(codebook, vocabulary, Field::Trigger, record.aval_trigger_simple_id)?;
        problem.probability =
            code_name(codebook, vocabulary, Field::Probability, record.aval_probability_id)?;
        problem.distribution =
            code_name(codebook, vocabulary, Field::Propagation, record.aval_propagation_id)?;
        problem.danger_level = Some(self.danger_level);
        problem.danger_level_name = Some(self.danger_level_name.clone());
        problem.nick = self.author.clone();
        Ok(problem)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{test_support, RawRecord};

    fn wind_slab() -> ForecastProblemRecord {
        ForecastProblemRecord {
            avalanche_problem_id: Some(1),
            avalanche_problem_type_id: Some(10),
            aval_cause_id: Some(15),
            avalanche_ext_id: Some(20),
            destructive_size_ext_id: Some(2),
            aval_trigger_simple_id: Some(21),
            aval_probability_id: Some(3),
            aval_propagation_id: Some(2),
        }
    }

    #[test]
    fn test_legacy_forecast_region_is_lifted() {
        let record = ForecastV1 {
            region_id: Some(14),
            region_name: Some("Indre Sogn".to_string()),
            date: Some("2015-01-10".to_string()),
            danger_level: Some(3),
            level_name: Some("3 Considerable".to_string()),
            ..ForecastV1::default()
        };
        let danger = record.to_danger().unwrap();
        assert_eq!(danger.region_id, 114);
        assert_eq!(danger.danger_level, 3);
        assert_eq!(danger.source, SourceKind::Forecast);
        assert_eq!(danger.schema, RecordSchema::ForecastV1);
        assert_eq!(danger.date, NaiveDate::from_ymd_opt(2015, 1, 10).unwrap());
        assert!(danger.main_message.is_none());
        assert!(danger.reg_id.is_none());
    }

    #[test]
    fn test_forecast_v2_problems_inherit_warning_level() {
        let codebook = test_support::codebook();
        let resolver = test_support::resolver();
        let ctx = MapContext {
            codebook: &codebook,
            resolver: &resolver,
        };
        let record = ForecastV2 {
            region_id: Some(3016),
            region_name: Some("Lyngen".to_string()),
            valid_from: Some("2017-02-09T00:00:00".to_string()),
            danger_level: Some(2),
            danger_level_name: Some("2 Moderate".to_string()),
            main_text: Some("Fresh wind slabs in lee.".to_string()),
            author: Some("forecaster".to_string()),
            lang_key: Some(2),
            avalanche_problems: vec![wind_slab()],
        };
        let danger = record.to_danger().unwrap();
        assert_eq!(danger.region_id, 3016);
        assert_eq!(danger.main_message.unwrap().lang, LangKey::English);
        assert_eq!(danger.time, NaiveTime::from_hms_opt(0, 0, 0));

        let problems = record.to_problems(&ctx).unwrap();
        assert_eq!(problems.len(), 1);
        let problem = &problems[0];
        assert_eq!(problem.order, 1);
        assert_eq!(problem.cause_id, Some(15));
        assert_eq!(problem.problem_type_id, Some(10));
        assert_eq!(problem.problem_type_name.as_deref(), Some("Wind slab (slab avalanches)"));
        assert_eq!(problem.avalanche_type_name.as_deref(), Some("Dry slab avalanche"));
        assert_eq!(problem.distribution.as_deref(), Some("Specific steep slopes"));
        assert_eq!(problem.danger_level, Some(2));
        assert_eq!(problem.nick.as_deref(), Some("forecaster"));
    }

    #[test]
    fn test_main_problem_is_lowest_order_when_orders_start_at_one() {
        let codebook = test_support::codebook();
        let resolver = test_support::resolver();
        let ctx = MapContext {
            codebook: &codebook,
            resolver: &resolver,
        };
        let secondary = ForecastProblemRecord {
            avalanche_problem_id: Some(2),
            avalanche_problem_type_id: Some(30),
            aval_cause_id: Some(11),
            ..ForecastProblemRecord::default()
        };
        let record = ForecastV2 {
            region_id: Some(3016),
            region_name: Some("Lyngen".to_string()),
            valid_from: Some("2017-02-09".to_string()),
            danger_level: Some(3),
            danger_level_name: Some("3 Considerable".to_string()),
            avalanche_problems: vec![secondary, wind_slab()],
            ..ForecastV2::default()
        };
        let mut danger = record.to_danger().unwrap();
        danger.problems = record.to_problems(&ctx).unwrap();
        assert_eq!(danger.problems.len(), 2);
        let main = danger.main_problem().unwrap();
        assert_eq!(main.order, 1);
        assert_eq!(main.cause_id, Some(15));
    }

    #[test]
    fn test_forecast_missing_level_is_malformed() {
        let record = ForecastV2 {
            region_id: Some(3016),
            region_name: Some("Lyngen".to_string()),
            valid_from: Some("2017-02-09".to_string()),
            danger_level_name: Some("2 Moderate".to_string()),
            ..ForecastV2::default()
        };
        assert!(matches!(
            record.to_danger(),
            Err(RecordError::MissingField("danger_level"))
        ));
    }

    #[test]
    fn test_forecast_level_out_of_range() {
        let record = ForecastV1 {
            region_id: Some(14),
            region_name: Some("Indre Sogn".to_string()),
            date: Some("2015-01-10".to_string()),
            danger_level: Some(7),
            level_name: Some("?".to_string()),
            ..ForecastV1::default()
        };
        assert!(matches!(
            record.to_danger(),
            Err(RecordError::OutOfRange { field: "danger_level", value: 7 })
        ));
    }

    #[test]
    fn test_forecast_problem_unknown_type_is_rejected() {
        let codebook = test_support::codebook();
        let resolver = test_support::resolver();
        let ctx = MapContext {
            codebook: &codebook,
            resolver: &resolver,
        };
        let record = ForecastV1 {
            region_id: Some(14),
            region_name: Some("Indre Sogn".to_string()),
            date: Some("2015-01-10".to_string()),
            danger_level: Some(3),
            level_name: Some("3 Considerable".to_string()),
            problems: vec![ForecastProblemRecord {
                avalanche_problem_type_id: Some(11),
                ..wind_slab()
            }],
            ..ForecastV1::default()
        };
        assert!(matches!(
            record.to_problems(&ctx),
            Err(RecordError::UnknownCode {
                field: Field::AvalancheProblemType,
                id: 11,
                ..
            })
        ));
    }

    #[test]
    fn test_forecast_from_json() {
        let codebook = test_support::codebook();
        let resolver = test_support::resolver();
        let ctx = MapContext {
            codebook: &codebook,
            resolver: &resolver,
        };
        let json = r#"[{
            "schema": "forecast_v1", "region_id": 14, "region_name": "Indre Sogn",
            "date": "2015-01-10", "danger_level": 3, "level_name": "3 Considerable",
            "problems": [{"avalanche_problem_id": 0, "avalanche_problem_type_id": 30,
                          "aval_cause_id": 11}]
        }]"#;
        let records = RawRecord::parse_json(json).unwrap();
        let mapped = records[0].map(&ctx).unwrap();
        let danger = mapped.danger.unwrap();
        assert_eq!(danger.region_id, 114);
        assert_eq!(mapped.problems.len(), 1);
        assert_eq!(mapped.problems[0].region_id, 114);
        assert_eq!(mapped.problems[0].order, 0);
        assert!(mapped.problems[0].trigger.is_none());
    }
}
