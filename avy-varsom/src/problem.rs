use crate::{danger::SourceKind, record::RecordSchema};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The five avalanche problem categories of the European Avalanche Warning
/// Services, used to compare problems across schemas and years.
#[derive(Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Clone, Copy, Serialize, Deserialize)]
pub enum EawsCategory {
    #[serde(rename = "New snow")]
    NewSnow,
    #[serde(rename = "Wind-drifted snow")]
    WindDriftedSnow,
    #[serde(rename = "Persistent weak layers")]
    PersistentWeakLayers,
    #[serde(rename = "Wet snow")]
    WetSnow,
    #[serde(rename = "Gliding snow")]
    GlidingSnow,
}

impl EawsCategory {
    pub const ALL: [EawsCategory; 5] = [
        EawsCategory::NewSnow,
        EawsCategory::WindDriftedSnow,
        EawsCategory::PersistentWeakLayers,
        EawsCategory::WetSnow,
        EawsCategory::GlidingSnow,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            EawsCategory::NewSnow => "New snow",
            EawsCategory::WindDriftedSnow => "Wind-drifted snow",
            EawsCategory::PersistentWeakLayers => "Persistent weak layers",
            EawsCategory::WetSnow => "Wet snow",
            EawsCategory::GlidingSnow => "Gliding snow",
        }
    }
}

impl fmt::Display for EawsCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Weak-layer attribute flags reported with a cause since the 2017 schema.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy, Default, Serialize, Deserialize)]
pub struct CauseAttributes {
    /// Persistent crystals in the weak layer
    pub crystal: bool,
    /// Light overlying slab
    pub light: bool,
    /// Soft overlying layer
    pub soft: bool,
    /// Thin weak layer
    pub thin: bool,
}

/// One avalanche problem assessed for a region on a date.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct AvalancheProblem {
    /// Canonical region id
    pub region_id: i32,
    pub region_name: String,
    pub date: NaiveDate,
    /// Priority; lower is more important. Not necessarily contiguous.
    pub order: i32,
    /// Cause id in the record's vocabulary. For 2012-2014 observation
    /// problems this is the sum of the cause and cause extension codes.
    pub cause_id: Option<i32>,
    pub cause_name: String,
    pub source: SourceKind,
    /// Record shape this problem was mapped from
    pub schema: RecordSchema,
    pub problem_type_id: Option<i32>,
    pub problem_type_name: Option<String>,
    pub avalanche_type_id: Option<i32>,
    pub avalanche_type_name: Option<String>,
    pub destructive_size_id: Option<i32>,
    pub destructive_size_name: Option<String>,
    pub trigger: Option<String>,
    pub probability: Option<String>,
    pub distribution: Option<String>,
    pub cause_attributes: Option<CauseAttributes>,
    pub eaws_category: Option<EawsCategory>,
    /// Forecast danger level; inherited from the warning for forecast
    /// problems, joined in for observation problems
    pub danger_level: Option<u8>,
    pub danger_level_name: Option<String>,
    pub nick: Option<String>,
    pub reg_id: Option<i64>,
}

impl AvalancheProblem {
    /// A problem with every optional attribute unset.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        region_id: i32,
        region_name: &str,
        date: NaiveDate,
        order: i32,
        cause_id: Option<i32>,
        cause_name: &str,
        source: SourceKind,
        schema: RecordSchema,
    ) -> AvalancheProblem {
        AvalancheProblem {
            region_id,
            region_name: region_name.to_string(),
            date,
            order,
            cause_id,
            cause_name: cause_name.to_string(),
            source,
            schema,
            problem_type_id: None,
            problem_type_name: None,
            avalanche_type_id: None,
            avalanche_type_name: None,
            destructive_size_id: None,
            destructive_size_name: None,
            trigger: None,
            probability: None,
            distribution: None,
            cause_attributes: None,
            eaws_category: None,
            danger_level: None,
            danger_level_name: None,
            nick: None,
            reg_id: None,
        }
    }
}
