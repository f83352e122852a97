//! Forecast region ids and the historical boundary epochs.
//!
//! Forecast regions were redrawn four times since the first forecasts in
//! December 2012. Each epoch names the polygon dataset valid during it and
//! the offset that lifts the dataset's native ids onto the canonical
//! numbering.

use crate::error::RegionError;
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// Ids below this value belong to the pre-2016 numbering.
pub const LEGACY_REGION_ID_LIMIT: i32 = 100;

/// Offset added to pre-2016 ids to make them canonical.
pub const LEGACY_REGION_ID_OFFSET: i32 = 100;

/// Region id of the "no match" sentinel.
pub const NOT_GIVEN_REGION_ID: i32 = 0;

/// Region name of the "no match" sentinel.
pub const NOT_GIVEN: &str = "Not given";

/// Lift a raw region id onto the canonical numbering.
///
/// Older schemas number regions below 100; those ids are moved up by 100.
/// Everything else is already canonical.
pub fn canonical_region_id(raw_id: i32) -> i32 {
    if raw_id < LEGACY_REGION_ID_LIMIT {
        raw_id + LEGACY_REGION_ID_OFFSET
    } else {
        raw_id
    }
}

/// A period during which one boundary dataset defined the forecast regions.
#[derive(Debug, PartialEq, Eq)]
pub struct RegionEpoch {
    /// Short name, e.g. "2014-mars-2016"
    pub name: &'static str,
    /// First day of the epoch as (year, month, day), inclusive
    pub start: (i32, u32, u32),
    /// Name of the polygon dataset valid during the epoch
    pub dataset: &'static str,
    /// Added to the dataset's native ids to produce canonical ids
    pub id_offset: i32,
}

/// All boundary epochs in ascending order. Each epoch ends where the next
/// begins and the last one is open-ended.
pub static REGION_EPOCHS: &[RegionEpoch] = &[
    RegionEpoch {
        name: "2012-2013",
        start: (2012, 12, 1),
        dataset: "VarslingsOmrF_fra_2012_til_2013",
        id_offset: 100,
    },
    RegionEpoch {
        name: "2013-2014-mars",
        start: (2013, 12, 1),
        dataset: "VarslingsOmrF_fra_2013_til_mars2014",
        id_offset: 100,
    },
    RegionEpoch {
        name: "2014-mars-2016",
        start: (2014, 3, 15),
        dataset: "VarslingsOmrF_fra_mars2014_til_2016",
        id_offset: 100,
    },
    RegionEpoch {
        name: "2016-2017",
        start: (2016, 10, 1),
        dataset: "VarslingsOmrF_fra_2016_til_2017",
        id_offset: 0,
    },
    RegionEpoch {
        name: "2017-",
        start: (2017, 11, 15),
        dataset: "VarslingsOmrF_fra_2017",
        id_offset: 0,
    },
];

impl RegionEpoch {
    pub fn start_date(&self) -> Option<NaiveDate> {
        let (year, month, day) = self.start;
        NaiveDate::from_ymd_opt(year, month, day)
    }

    /// Canonical id for one of this epoch's native polygon ids.
    pub fn canonical_id(&self, native_id: i32) -> i32 {
        native_id + self.id_offset
    }
}

/// The epoch a date falls in.
///
/// Dates before the first epoch fail with `NoEpoch`. Dates after the last
/// boundary resolve to the most recent epoch, which stays open for the
/// current season.
pub fn epoch_for(date: NaiveDate) -> Result<&'static RegionEpoch, RegionError> {
    let key = (date.year(), date.month(), date.day());
    REGION_EPOCHS
        .iter()
        .rev()
        .find(|epoch| epoch.start <= key)
        .ok_or(RegionError::NoEpoch(date))
}

/// Outcome of resolving a coordinate to a forecast region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionResolution {
    pub region_id: i32,
    pub region_name: String,
}

impl RegionResolution {
    /// The "no match" sentinel for coordinates outside every region.
    pub fn not_given() -> RegionResolution {
        RegionResolution {
            region_id: NOT_GIVEN_REGION_ID,
            region_name: NOT_GIVEN.to_string(),
        }
    }

    pub fn is_not_given(&self) -> bool {
        self.region_id == NOT_GIVEN_REGION_ID
    }
}
