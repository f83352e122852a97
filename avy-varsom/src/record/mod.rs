//! Raw forecast and observation records and their schema mappers.
//!
//! Each wire shape used between 2012 and 2019 is one variant of
//! [`RawRecord`], tagged by a `schema` field. Mapping dispatches on the
//! variant; every shape has its own mapper and its own vocabulary.
//!
//! Fields are deserialized as optional so that an absent required field is
//! reported by name as [`RecordError::MissingField`] instead of a generic
//! deserialization failure.

pub mod eval_problem;
pub mod evaluation;
pub mod forecast;

use crate::{
    codebook::{Codebook, Field, Vocabulary},
    danger::{AvalancheDanger, LangKey, SourceKind, MAX_DANGER_LEVEL},
    error::RecordError,
    problem::AvalancheProblem,
    region::canonical_region_id,
    spatial::SpatialResolver,
};
use avy_utils::dates::parse_date_time;
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fmt;

pub use eval_problem::{EvalProblemV0, EvalProblemV2};
pub use evaluation::{EvaluationV1, EvaluationV2, EvaluationV3, EvaluationV3Problem};
pub use forecast::{ForecastProblemRecord, ForecastV1, ForecastV2};

/// The record shape an entity was mapped from.
#[derive(Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordSchema {
    /// Forecast warnings before October 2016, legacy region ids
    ForecastV1,
    /// Forecast warnings from October 2016
    ForecastV2,
    /// Observed danger and free-text problems, 2012-2014
    EvaluationV1,
    /// Observed danger, 2014-2017
    EvaluationV2,
    /// Observed danger with nested problems, 2017-2019
    EvaluationV3,
    /// Observed problems with a two-part cause, 2012-2014
    EvalProblemV0,
    /// Observed problems, 2014-2017
    EvalProblemV2,
}

impl RecordSchema {
    pub fn source(&self) -> SourceKind {
        match self {
            RecordSchema::ForecastV1 | RecordSchema::ForecastV2 => SourceKind::Forecast,
            _ => SourceKind::Observation,
        }
    }

    /// Vocabulary the schema's codes are drawn from.
    pub fn vocabulary(&self) -> Vocabulary {
        match self {
            RecordSchema::ForecastV1 | RecordSchema::ForecastV2 => Vocabulary::Forecast,
            RecordSchema::EvaluationV1 | RecordSchema::EvalProblemV0 => Vocabulary::Legacy,
            RecordSchema::EvaluationV2 | RecordSchema::EvalProblemV2 => Vocabulary::Eval2,
            RecordSchema::EvaluationV3 => Vocabulary::Eval3,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RecordSchema::ForecastV1 => "forecast_v1",
            RecordSchema::ForecastV2 => "forecast_v2",
            RecordSchema::EvaluationV1 => "evaluation_v1",
            RecordSchema::EvaluationV2 => "evaluation_v2",
            RecordSchema::EvaluationV3 => "evaluation_v3",
            RecordSchema::EvalProblemV0 => "eval_problem_v0",
            RecordSchema::EvalProblemV2 => "eval_problem_v2",
        }
    }
}

impl fmt::Display for RecordSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A raw record in one of the historical wire shapes.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "schema", rename_all = "snake_case")]
pub enum RawRecord {
    ForecastV1(ForecastV1),
    ForecastV2(ForecastV2),
    EvaluationV1(EvaluationV1),
    EvaluationV2(EvaluationV2),
    EvaluationV3(EvaluationV3),
    EvalProblemV0(EvalProblemV0),
    EvalProblemV2(EvalProblemV2),
}

/// Read-only lookups shared by every mapper during a run.
#[derive(Debug, Clone, Copy)]
pub struct MapContext<'a> {
    pub codebook: &'a Codebook,
    pub resolver: &'a SpatialResolver,
}

/// Canonical entities produced from one raw record.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MappedRecord {
    pub danger: Option<AvalancheDanger>,
    pub problems: Vec<AvalancheProblem>,
}

impl RawRecord {
    /// Parse a JSON array of tagged records.
    pub fn parse_json(json: &str) -> Result<Vec<RawRecord>, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn schema(&self) -> RecordSchema {
        match self {
            RawRecord::ForecastV1(_) => RecordSchema::ForecastV1,
            RawRecord::ForecastV2(_) => RecordSchema::ForecastV2,
            RawRecord::EvaluationV1(_) => RecordSchema::EvaluationV1,
            RawRecord::EvaluationV2(_) => RecordSchema::EvaluationV2,
            RawRecord::EvaluationV3(_) => RecordSchema::EvaluationV3,
            RawRecord::EvalProblemV0(_) => RecordSchema::EvalProblemV0,
            RawRecord::EvalProblemV2(_) => RecordSchema::EvalProblemV2,
        }
    }

    pub fn source(&self) -> SourceKind {
        self.schema().source()
    }

    /// Map the record through the mapper of its shape.
    pub fn map(&self, ctx: &MapContext) -> Result<MappedRecord, RecordError> {
        let mapped = match self {
            RawRecord::ForecastV1(r) => MappedRecord {
                danger: Some(r.to_danger()?),
                problems: r.to_problems(ctx)?,
            },
            RawRecord::ForecastV2(r) => MappedRecord {
                danger: Some(r.to_danger()?),
                problems: r.to_problems(ctx)?,
            },
            RawRecord::EvaluationV1(r) => MappedRecord {
                danger: Some(r.to_danger(ctx)?),
                problems: r.to_problems(ctx)?,
            },
            RawRecord::EvaluationV2(r) => MappedRecord {
                danger: Some(r.to_danger(ctx)?),
                problems: Vec::new(),
            },
            RawRecord::EvaluationV3(r) => MappedRecord {
                danger: Some(r.to_danger(ctx)?),
                problems: r.to_problems(ctx)?,
            },
            RawRecord::EvalProblemV0(r) => MappedRecord {
                danger: None,
                problems: vec![r.to_problem(ctx)?],
            },
            RawRecord::EvalProblemV2(r) => MappedRecord {
                danger: None,
                problems: vec![r.to_problem(ctx)?],
            },
        };
        Ok(mapped)
    }
}

/// Registration fields shared by every observation shape.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct Registration {
    pub reg_id: Option<i64>,
    pub dt_obs_time: Option<String>,
    pub nick_name: Option<String>,
    /// Forecast region id; 0 or absent when only coordinates were reported
    pub forecast_region_tid: Option<i32>,
    pub forecast_region_name: Option<String>,
    /// UTM33 easting in metres
    pub utm_east: Option<f64>,
    /// UTM33 northing in metres
    pub utm_north: Option<f64>,
    pub lang_key: Option<i32>,
}

/// Registration fields after validation and region resolution.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ObservationHeader {
    pub reg_id: i64,
    pub date: NaiveDate,
    pub time: Option<NaiveTime>,
    pub region_id: i32,
    pub region_name: String,
    pub nick: String,
    pub lang: LangKey,
}

impl Registration {
    /// Validate the registration and find its forecast region, falling back
    /// to the spatial resolver when only coordinates were reported.
    pub(crate) fn header(&self, ctx: &MapContext) -> Result<ObservationHeader, RecordError> {
        let reg_id = require(&self.reg_id, "reg_id")?;
        let obs_time = require(&self.dt_obs_time, "dt_obs_time")?;
        let (date, time) = parse_when(&obs_time, "dt_obs_time")?;
        let nick = require(&self.nick_name, "nick_name")?;
        let lang = lang_key(self.lang_key)?;

        let (region_id, region_name) = match self.forecast_region_tid.filter(|tid| *tid > 0) {
            Some(tid) => (
                canonical_region_id(tid),
                require(&self.forecast_region_name, "forecast_region_name")?,
            ),
            None => match (self.utm_east, self.utm_north) {
                (Some(x), Some(y)) => {
                    let resolution = ctx.resolver.resolve(x, y, date)?;
                    (resolution.region_id, resolution.region_name)
                }
                _ => return Err(RecordError::MissingField("forecast_region_tid")),
            },
        };

        Ok(ObservationHeader {
            reg_id,
            date,
            time,
            region_id,
            region_name,
            nick,
            lang,
        })
    }
}

impl ObservationHeader {
    /// An observation problem stamped with this registration.
    pub(crate) fn problem(
        &self,
        schema: RecordSchema,
        order: i32,
        cause_id: Option<i32>,
        cause_name: &str,
    ) -> AvalancheProblem {
        let mut problem = AvalancheProblem::new(
            self.region_id,
            &self.region_name,
            self.date,
            order,
            cause_id,
            cause_name,
            SourceKind::Observation,
            schema,
        );
        problem.nick = Some(self.nick.clone());
        problem.reg_id = Some(self.reg_id);
        problem
    }
}

pub(crate) fn require<T: Clone>(value: &Option<T>, field: &'static str) -> Result<T, RecordError> {
    value.clone().ok_or(RecordError::MissingField(field))
}

pub(crate) fn parse_when(
    value: &str,
    field: &'static str,
) -> Result<(NaiveDate, Option<NaiveTime>), RecordError> {
    parse_date_time(value).map_err(|_| RecordError::InvalidDate {
        field,
        value: value.to_string(),
    })
}

/// Validate a danger level on the 0-5 scale.
pub(crate) fn danger_level(value: i32, field: &'static str) -> Result<u8, RecordError> {
    u8::try_from(value)
        .ok()
        .filter(|level| *level <= MAX_DANGER_LEVEL)
        .ok_or(RecordError::OutOfRange {
            field,
            value: i64::from(value),
        })
}

/// Language of a record. The wire default is Norwegian.
pub(crate) fn lang_key(value: Option<i32>) -> Result<LangKey, RecordError> {
    match value {
        None => Ok(LangKey::Norwegian),
        Some(id) => LangKey::from_id(id).ok_or(RecordError::OutOfRange {
            field: "lang_key",
            value: i64::from(id),
        }),
    }
}

/// Display name of an optional code.
pub(crate) fn code_name(
    codebook: &Codebook,
    vocabulary: Vocabulary,
    field: Field,
    id: Option<i32>,
) -> Result<Option<String>, RecordError> {
    id.map(|id| codebook.lookup(vocabulary, field, id).map(str::to_string))
        .transpose()
}
