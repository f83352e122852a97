//! Point-in-polygon resolution of UTM33 coordinates to forecast regions.
//!
//! Every caller supplies coordinates in UTM zone 33N (metres). Polygon sets
//! hold a few dozen regions each, so lookups scan them linearly in dataset
//! order and the first polygon intersecting the point wins. Points on an
//! edge or vertex are inside.

use crate::{
    error::RegionError,
    region::{epoch_for, RegionResolution, REGION_EPOCHS},
};
use chrono::{NaiveDate, NaiveDateTime};
use csv::ReaderBuilder;
use geo::{Intersects, Point, Polygon};
use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};
use wkt::TryFromWkt;

/// Parse a WKT `POLYGON`. Inner rings are kept as holes.
pub fn parse_polygon(wkt: &str) -> Result<Polygon<f64>, String> {
    let polygon = Polygon::<f64>::try_from_wkt_str(wkt.trim()).map_err(|e| e.to_string())?;
    // a closed ring repeats its first vertex
    if polygon.exterior().0.len() < 4 {
        return Err("polygon needs at least three vertices".to_string());
    }
    Ok(polygon)
}

/// One forecast region polygon as it appears in a boundary dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionPolygon {
    /// Region id in the dataset's own numbering
    pub native_id: i32,
    pub name: String,
    pub polygon: Polygon<f64>,
}

/// All region polygons of one boundary dataset, in dataset order.
#[derive(Debug, Clone, PartialEq)]
pub struct PolygonSet {
    pub dataset: String,
    pub regions: Vec<RegionPolygon>,
}

impl PolygonSet {
    /// Parse a polygon dataset CSV string.
    ///
    /// Expected CSV columns (with headers): region_id, region_name, wkt
    pub fn parse_csv(dataset: &str, csv_object: &str) -> Result<PolygonSet, RegionError> {
        let parse_error = |message: String| RegionError::PolygonParse {
            dataset: dataset.to_string(),
            message,
        };
        let mut regions = Vec::new();
        let mut rdr = ReaderBuilder::new()
            .delimiter(b',')
            .has_headers(true)
            .from_reader(csv_object.as_bytes());
        for row in rdr.records() {
            let record = row?;
            let id_str = record.get(0).unwrap_or("").trim();
            let native_id = id_str
                .parse::<i32>()
                .map_err(|_| parse_error(format!("bad region id '{}'", id_str)))?;
            let name = record.get(1).unwrap_or("").trim().to_string();
            let polygon = parse_polygon(record.get(2).unwrap_or(""))
                .map_err(|e| parse_error(format!("region {}: {}", native_id, e)))?;
            regions.push(RegionPolygon {
                native_id,
                name,
                polygon,
            });
        }
        Ok(PolygonSet {
            dataset: dataset.to_string(),
            regions,
        })
    }

    /// First region, in dataset order, containing the point or touching it
    /// with its boundary.
    pub fn find(&self, x: f64, y: f64) -> Option<&RegionPolygon> {
        let point = Point::new(x, y);
        self.regions.iter().find(|r| r.polygon.intersects(&point))
    }
}

/// Supplies boundary datasets by name.
pub trait PolygonSource {
    fn load(&self, dataset: &str) -> Result<PolygonSet, RegionError>;
}

/// Reads `<dir>/<dataset>.csv` files.
#[derive(Debug, Clone)]
pub struct DirectoryPolygonSource {
    dir: PathBuf,
}

impl DirectoryPolygonSource {
    pub fn new(dir: impl AsRef<Path>) -> DirectoryPolygonSource {
        DirectoryPolygonSource {
            dir: dir.as_ref().to_path_buf(),
        }
    }
}

impl PolygonSource for DirectoryPolygonSource {
    fn load(&self, dataset: &str) -> Result<PolygonSet, RegionError> {
        let path = self.dir.join(format!("{}.csv", dataset));
        let csv_object = std::fs::read_to_string(&path)?;
        PolygonSet::parse_csv(dataset, &csv_object)
    }
}

/// Resolves a coordinate and date to the forecast region valid at that time.
///
/// Holds every loaded boundary dataset; nothing is loaded or changed after
/// construction.
#[derive(Debug, Clone, Default)]
pub struct SpatialResolver {
    sets: HashMap<String, PolygonSet>,
}

impl SpatialResolver {
    /// A resolver without datasets. Any resolution fails with
    /// `DatasetUnavailable`.
    pub fn empty() -> SpatialResolver {
        SpatialResolver::default()
    }

    pub fn from_sets(sets: Vec<PolygonSet>) -> SpatialResolver {
        SpatialResolver {
            sets: sets.into_iter().map(|s| (s.dataset.clone(), s)).collect(),
        }
    }

    /// Load the dataset of every epoch from `source`.
    pub fn load(source: &dyn PolygonSource) -> Result<SpatialResolver, RegionError> {
        let mut sets = HashMap::new();
        for epoch in REGION_EPOCHS {
            if !sets.contains_key(epoch.dataset) {
                let set = source.load(epoch.dataset)?;
                log::info!(
                    "spatial: loaded {} regions for epoch {} ({})",
                    set.regions.len(),
                    epoch.name,
                    epoch.dataset
                );
                sets.insert(epoch.dataset.to_string(), set);
            }
        }
        Ok(SpatialResolver { sets })
    }

    pub fn dataset(&self, name: &str) -> Option<&PolygonSet> {
        self.sets.get(name)
    }

    /// Region containing (`x`, `y`) on `date`, or the "Not given" sentinel
    /// when no region contains the point.
    pub fn resolve(&self, x: f64, y: f64, date: NaiveDate) -> Result<RegionResolution, RegionError> {
        let epoch = epoch_for(date)?;
        let set = self
            .sets
            .get(epoch.dataset)
            .ok_or_else(|| RegionError::DatasetUnavailable(epoch.dataset.to_string()))?;
        match set.find(x, y) {
            Some(region) => Ok(RegionResolution {
                region_id: epoch.canonical_id(region.native_id),
                region_name: region.name.clone(),
            }),
            None => {
                log::debug!(
                    "spatial: ({}, {}) on {} is outside every region of {}",
                    x,
                    y,
                    date,
                    epoch.dataset
                );
                Ok(RegionResolution::not_given())
            }
        }
    }

    /// Like `resolve`; the time of day is ignored.
    pub fn resolve_at(
        &self,
        x: f64,
        y: f64,
        date_time: NaiveDateTime,
    ) -> Result<RegionResolution, RegionError> {
        self.resolve(x, y, date_time.date())
    }
}
