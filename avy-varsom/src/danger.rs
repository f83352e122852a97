use crate::{problem::AvalancheProblem, record::RecordSchema};
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Highest danger level on the European scale.
pub const MAX_DANGER_LEVEL: u8 = 5;

/// Whether a record was issued as a forecast or reported from the field.
#[derive(Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Clone, Copy, Serialize, Deserialize)]
pub enum SourceKind {
    Forecast,
    Observation,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceKind::Forecast => write!(f, "Forecast"),
            SourceKind::Observation => write!(f, "Observation"),
        }
    }
}

/// Language of a free-text field, using the wire ids (1 = Norwegian, 2 = English).
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy, Serialize, Deserialize)]
pub enum LangKey {
    Norwegian,
    English,
}

impl LangKey {
    pub fn from_id(id: i32) -> Option<LangKey> {
        match id {
            1 => Some(LangKey::Norwegian),
            2 => Some(LangKey::English),
            _ => None,
        }
    }

    pub fn id(&self) -> i32 {
        match self {
            LangKey::Norwegian => 1,
            LangKey::English => 2,
        }
    }
}

/// A free-text message tagged with its language.
#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub struct LangText {
    pub lang: LangKey,
    pub text: String,
}

/// One forecast or observed danger level for a region on a date.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct AvalancheDanger {
    /// Canonical region id
    pub region_id: i32,
    pub region_name: String,
    pub source: SourceKind,
    /// Record shape this danger was mapped from
    pub schema: RecordSchema,
    pub date: NaiveDate,
    /// Time of issue or observation. Not part of the identity.
    pub time: Option<NaiveTime>,
    /// 0-5, where 0 means not assessed
    pub danger_level: u8,
    pub danger_level_name: String,
    pub main_message: Option<LangText>,
    pub nick: Option<String>,
    /// Observation registration id; `None` for forecasts
    pub reg_id: Option<i64>,
    /// Observer's verdict on the day's forecast, reported since 2017
    pub forecast_correct: Option<String>,
    /// Sorted ascending by `order` once reconciled
    pub problems: Vec<AvalancheProblem>,
}

impl AvalancheDanger {
    /// The main avalanche problem, i.e. the one with the lowest order.
    pub fn main_problem(&self) -> Option<&AvalancheProblem> {
        self.problems.iter().min_by_key(|p| p.order)
    }

    pub fn is_assessed(&self) -> bool {
        self.danger_level > 0
    }
}
