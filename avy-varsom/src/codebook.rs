use crate::error::{CodebookError, RecordError};
use csv::ReaderBuilder;
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, fmt};

/// Embedded codebook covering every vocabulary epoch and coded field.
pub static CSV_CODEBOOK: &str = include_str!("../../fixtures/codebook.csv");

/// The vocabulary epoch a record's codes belong to.
///
/// Code tables were renumbered along with the observation schemas, so the
/// same id can mean different things in different epochs.
#[derive(Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Vocabulary {
    /// Forecast warnings, all years
    Forecast,
    /// Observations 2012-2014 (AvalancheEvaluation / AvalancheEvalProblem)
    Legacy,
    /// Observations 2014-2017 (AvalancheEvaluation2 / AvalancheEvalProblem2)
    Eval2,
    /// Observations 2017-2019 (AvalancheEvaluation3)
    Eval3,
}

impl Vocabulary {
    pub fn parse(s: &str) -> Option<Vocabulary> {
        match s.trim() {
            "forecast" => Some(Vocabulary::Forecast),
            "legacy" => Some(Vocabulary::Legacy),
            "eval2" => Some(Vocabulary::Eval2),
            "eval3" => Some(Vocabulary::Eval3),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Vocabulary::Forecast => "forecast",
            Vocabulary::Legacy => "legacy",
            Vocabulary::Eval2 => "eval2",
            Vocabulary::Eval3 => "eval3",
        }
    }
}

impl fmt::Display for Vocabulary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A coded field of a forecast or observation record.
#[derive(Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    DangerLevel,
    AvalancheProblemType,
    AvalCause,
    AvalCauseExt,
    AvalancheType,
    DestructiveSize,
    Trigger,
    Probability,
    Propagation,
    ForecastCorrect,
}

impl Field {
    pub fn parse(s: &str) -> Option<Field> {
        match s.trim() {
            "danger_level" => Some(Field::DangerLevel),
            "avalanche_problem_type" => Some(Field::AvalancheProblemType),
            "aval_cause" => Some(Field::AvalCause),
            "aval_cause_ext" => Some(Field::AvalCauseExt),
            "avalanche_type" => Some(Field::AvalancheType),
            "destructive_size" => Some(Field::DestructiveSize),
            "trigger" => Some(Field::Trigger),
            "probability" => Some(Field::Probability),
            "propagation" => Some(Field::Propagation),
            "forecast_correct" => Some(Field::ForecastCorrect),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Field::DangerLevel => "danger_level",
            Field::AvalancheProblemType => "avalanche_problem_type",
            Field::AvalCause => "aval_cause",
            Field::AvalCauseExt => "aval_cause_ext",
            Field::AvalancheType => "avalanche_type",
            Field::DestructiveSize => "destructive_size",
            Field::Trigger => "trigger",
            Field::Probability => "probability",
            Field::Propagation => "propagation",
            Field::ForecastCorrect => "forecast_correct",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Read-only `id -> display name` tables, one per (vocabulary, field).
///
/// Built once before mapping starts and only borrowed afterwards.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Codebook {
    tables: HashMap<(Vocabulary, Field), HashMap<i32, String>>,
}

impl Codebook {
    /// The codebook shipped with the crate.
    pub fn bundled() -> Result<Codebook, CodebookError> {
        Codebook::parse_csv(CSV_CODEBOOK)
    }

    /// Parse a codebook CSV string.
    ///
    /// Expected CSV columns (with headers): vocabulary, field, id, name
    pub fn parse_csv(csv_object: &str) -> Result<Codebook, CodebookError> {
        let mut codebook = Codebook::default();
        let mut rdr = ReaderBuilder::new()
            .delimiter(b',')
            .has_headers(true)
            .from_reader(csv_object.as_bytes());
        for row in rdr.records() {
            let record = row?;
            let vocabulary_str = record.get(0).unwrap_or("");
            let vocabulary = Vocabulary::parse(vocabulary_str)
                .ok_or_else(|| CodebookError::UnknownVocabulary(vocabulary_str.to_string()))?;
            let field_str = record.get(1).unwrap_or("");
            let field = Field::parse(field_str)
                .ok_or_else(|| CodebookError::UnknownField(field_str.to_string()))?;
            let id_str = record.get(2).unwrap_or("").trim();
            let id = id_str
                .parse::<i32>()
                .map_err(|_| CodebookError::InvalidId(id_str.to_string()))?;
            let name = record.get(3).unwrap_or("").trim();
            codebook.insert(vocabulary, field, id, name)?;
        }
        log::debug!("codebook: loaded {} codes", codebook.len());
        Ok(codebook)
    }

    /// Add a single code. Fails if the code is already present.
    pub fn insert(
        &mut self,
        vocabulary: Vocabulary,
        field: Field,
        id: i32,
        name: &str,
    ) -> Result<(), CodebookError> {
        let table = self.tables.entry((vocabulary, field)).or_default();
        if table.contains_key(&id) {
            return Err(CodebookError::Duplicate {
                vocabulary,
                field,
                id,
            });
        }
        table.insert(id, name.to_string());
        Ok(())
    }

    /// Display name for a code, if known.
    pub fn name(&self, vocabulary: Vocabulary, field: Field, id: i32) -> Option<&str> {
        self.tables
            .get(&(vocabulary, field))
            .and_then(|table| table.get(&id))
            .map(String::as_str)
    }

    /// Display name for a code, failing with `UnknownCode` when absent.
    pub fn lookup(&self, vocabulary: Vocabulary, field: Field, id: i32) -> Result<&str, RecordError> {
        self.name(vocabulary, field, id).ok_or(RecordError::UnknownCode {
            vocabulary,
            field,
            id,
        })
    }

    /// Total number of codes across all tables.
    pub fn len(&self) -> usize {
        self.tables.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
