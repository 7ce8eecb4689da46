//! # Near-Earth object records
//!
//! Input side of the engine: the close-approach observables of tracked objects, as
//! published by NASA's **NeoWs** service and as exported to tabular files.
//!
//! Modules
//! -----------------
//! * this module – serde models of the NeoWs payloads ([`NeoFeed`], [`NeoObject`]),
//!   the flattened [`NeoRecord`] and CSV reading/writing of records.
//! * [`neows_client`](crate::neo_feed::neows_client) – async HTTP client for the NeoWs API
//!   (feature `neows-download`).
//!
//! Data Model
//! -----------------
//! NeoWs encodes every number of a close approach as a **string**
//! (`"kilometers": "38012.1"`); [`NeoRecord::from_object`] parses them and keeps only the
//! **first** close approach of an object. Objects without close-approach data are skipped.
//!
//! The tabular export has the columns
//!
//! ```text
//! neo_id,miss_distance_km,velocity_km_s,orbit_uncertainty,is_potentially_hazardous
//! ```
//!
//! and an optional `name` column.
//!
//! Example
//! -----------------
//! ```rust
//! use impactor::neo_feed::read_neo_records;
//!
//! let data = "neo_id,miss_distance_km,velocity_km_s,orbit_uncertainty,is_potentially_hazardous\n\
//!             2099942,31600,7.4,4,True\n";
//! let records = read_neo_records(data.as_bytes()).unwrap();
//! let input = records[0].to_input(10_000).unwrap();
//! assert_eq!(input.velocity_km_s(), 7.4);
//! ```
#[cfg(feature = "neows-download")]
pub mod neows_client;

use std::{collections::BTreeMap, fs::File, io, path::Path};

use hifitime::Epoch;
use rayon::prelude::*;
use serde::{Deserialize, Deserializer, Serialize};
use tracing::warn;

use crate::{
    constants::{Kilometer, KmPerSec},
    impactor::Impactor,
    impactor_errors::ImpactorError,
    simulation::{SimulationInput, SimulationResult},
    uncertainty::OrbitUncertainty,
};

/// Date-range feed response (`/neo/rest/v1/feed`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NeoFeed {
    #[serde(default)]
    pub element_count: usize,
    /// Objects grouped by close-approach date (`YYYY-MM-DD`).
    pub near_earth_objects: BTreeMap<String, Vec<NeoObject>>,
}

impl NeoFeed {
    /// Object ids in date order, without duplicates.
    pub fn ids(&self) -> Vec<String> {
        let mut seen = std::collections::HashSet::new();
        self.near_earth_objects
            .values()
            .flatten()
            .filter(|o| seen.insert(o.id.clone()))
            .map(|o| o.id.clone())
            .collect()
    }

    /// All objects of the feed, in date order.
    pub fn objects(&self) -> impl Iterator<Item = &NeoObject> {
        self.near_earth_objects.values().flatten()
    }
}

/// One object, as returned by the feed or by the lookup endpoint (`/neo/rest/v1/neo/{id}`).
///
/// `orbital_data` is only present in lookup responses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NeoObject {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub is_potentially_hazardous_asteroid: Option<bool>,
    #[serde(default)]
    pub close_approach_data: Vec<CloseApproach>,
    #[serde(default)]
    pub orbital_data: Option<OrbitalData>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CloseApproach {
    #[serde(default)]
    pub close_approach_date: Option<String>,
    /// Unix epoch of the approach, in milliseconds.
    #[serde(default)]
    pub epoch_date_close_approach: Option<i64>,
    pub relative_velocity: RelativeVelocity,
    pub miss_distance: MissDistance,
    #[serde(default)]
    pub orbiting_body: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelativeVelocity {
    pub kilometers_per_second: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissDistance {
    pub kilometers: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrbitalData {
    #[serde(default)]
    pub orbit_uncertainty: Option<String>,
}

/// Flattened close-approach observables of one object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NeoRecord {
    pub neo_id: String,
    pub miss_distance_km: Kilometer,
    pub velocity_km_s: KmPerSec,
    #[serde(default)]
    pub orbit_uncertainty: Option<String>,
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub is_potentially_hazardous: Option<bool>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(skip)]
    pub close_approach_epoch: Option<Epoch>,
}

fn parse_number(field: &'static str, raw: &str) -> Result<f64, ImpactorError> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| ImpactorError::InvalidRecordField {
            field,
            value: raw.to_string(),
        })
}

/// Accepts `true`/`false` in any case, `1`/`0` and empty cells (pandas writes `True`).
fn deserialize_flag<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) if s.eq_ignore_ascii_case("true") || s == "1" => Ok(Some(true)),
        Some(s) if s.eq_ignore_ascii_case("false") || s == "0" => Ok(Some(false)),
        Some(s) => Err(serde::de::Error::custom(format!(
            "invalid boolean flag: {s:?}"
        ))),
    }
}

impl NeoRecord {
    /// Flatten a NeoWs object using its first close approach.
    ///
    /// Arguments
    /// -----------------
    /// * `object`: Feed or lookup object.
    ///
    /// Return
    /// ----------
    /// * `Ok(None)` if the object has no close-approach data (logged and skipped).
    /// * `Ok(Some(record))` otherwise.
    /// * `Err(ImpactorError::InvalidRecordField)` if a numeric string cannot be parsed.
    pub fn from_object(object: &NeoObject) -> Result<Option<Self>, ImpactorError> {
        let Some(approach) = object.close_approach_data.first() else {
            warn!(neo_id = %object.id, "no close approach data, skipping object");
            return Ok(None);
        };

        let miss_distance_km = parse_number(
            "miss_distance.kilometers",
            &approach.miss_distance.kilometers,
        )?;
        let velocity_km_s = parse_number(
            "relative_velocity.kilometers_per_second",
            &approach.relative_velocity.kilometers_per_second,
        )?;

        Ok(Some(NeoRecord {
            neo_id: object.id.clone(),
            miss_distance_km,
            velocity_km_s,
            orbit_uncertainty: object
                .orbital_data
                .as_ref()
                .and_then(|o| o.orbit_uncertainty.clone()),
            is_potentially_hazardous: object.is_potentially_hazardous_asteroid,
            name: object.name.clone(),
            close_approach_epoch: approach
                .epoch_date_close_approach
                .map(|ms| Epoch::from_unix_milliseconds(ms as f64)),
        }))
    }

    /// Orbit uncertainty as an engine input; a missing class resolves to the default.
    pub fn orbit_uncertainty(&self) -> OrbitUncertainty {
        match &self.orbit_uncertainty {
            Some(raw) => raw.parse().unwrap_or_else(|never| match never {}),
            None => OrbitUncertainty::Label(String::new()),
        }
    }

    /// Close-approach date as `YYYY-MM-DD` (UTC), when the epoch is known.
    pub fn close_approach_date(&self) -> Option<String> {
        self.close_approach_epoch.map(utc_date)
    }

    /// Display label: name when known, id otherwise.
    pub fn label(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.neo_id)
    }

    /// Build a validated simulation input for this object.
    pub fn to_input(&self, n_trials: usize) -> Result<SimulationInput, ImpactorError> {
        SimulationInput::builder()
            .miss_distance_km(self.miss_distance_km)
            .velocity_km_s(self.velocity_km_s)
            .orbit_uncertainty(self.orbit_uncertainty())
            .n_trials(n_trials)
            .build()
    }
}

/// `YYYY-MM-DD` of an epoch in UTC.
pub fn utc_date(epoch: Epoch) -> String {
    let (y, m, d, ..) = epoch.to_gregorian_utc();
    format!("{y:04}-{m:02}-{d:02}")
}

/// Flatten every object of a feed, skipping objects without close approaches.
pub fn records_from_objects<'a>(
    objects: impl IntoIterator<Item = &'a NeoObject>,
) -> Result<Vec<NeoRecord>, ImpactorError> {
    let mut records = Vec::new();
    for object in objects {
        if let Some(record) = NeoRecord::from_object(object)? {
            records.push(record);
        }
    }
    Ok(records)
}

/// Simulate every record on the `rayon` pool, in record order.
///
/// Arguments
/// -----------------
/// * `impactor`: Model and uncertainty table to simulate with.
/// * `records`: Records to score.
/// * `n_trials`: Trials per record.
/// * `seed`: Base seed; record `i` is seeded with `seed + i`. OS entropy when `None`.
///
/// Return
/// ----------
/// * One `(record, result)` pair per record that could be simulated. Records whose input is
///   invalid or whose simulation fails (e.g. a negative miss distance) are logged and
///   skipped.
pub fn score_records<'a>(
    impactor: &Impactor,
    records: &'a [NeoRecord],
    n_trials: usize,
    seed: Option<u64>,
) -> Vec<(&'a NeoRecord, SimulationResult)> {
    records
        .par_iter()
        .enumerate()
        .filter_map(|(idx, record)| {
            let run = record.to_input(n_trials).and_then(|input| {
                let seed = seed.map(|s| s.wrapping_add(idx as u64));
                impactor.simulate(&input.with_seed(seed))
            });
            match run {
                Ok(result) => Some((record, result)),
                Err(err) => {
                    warn!(neo_id = %record.neo_id, %err, "skipping record");
                    None
                }
            }
        })
        .collect()
}

/// Parse a lookup response body.
pub fn parse_lookup(json: &str) -> Result<NeoObject, ImpactorError> {
    Ok(serde_json::from_str(json)?)
}

/// Parse a feed response body.
pub fn parse_feed(json: &str) -> Result<NeoFeed, ImpactorError> {
    Ok(serde_json::from_str(json)?)
}

/// Read records from CSV data with a header row.
pub fn read_neo_records<R: io::Read>(reader: R) -> Result<Vec<NeoRecord>, ImpactorError> {
    let mut rdr = csv::Reader::from_reader(reader);
    let mut records = Vec::new();
    for row in rdr.deserialize() {
        records.push(row?);
    }
    Ok(records)
}

/// Read records from a CSV file.
pub fn read_neo_records_csv(path: impl AsRef<Path>) -> Result<Vec<NeoRecord>, ImpactorError> {
    read_neo_records(File::open(path)?)
}

/// Write records as CSV with a header row (the close-approach epoch is not exported).
pub fn write_neo_records<W: io::Write>(
    writer: W,
    records: &[NeoRecord],
) -> Result<(), ImpactorError> {
    let mut wtr = csv::Writer::from_writer(writer);
    for record in records {
        wtr.serialize(record)?;
    }
    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod neo_feed_test {
    use super::*;

    const LOOKUP: &str = r#"{
        "id": "2099942",
        "name": "99942 Apophis (2004 MN4)",
        "is_potentially_hazardous_asteroid": true,
        "close_approach_data": [
            {
                "close_approach_date": "2029-04-13",
                "epoch_date_close_approach": 1870808400000,
                "relative_velocity": {
                    "kilometers_per_second": "7.4225",
                    "kilometers_per_hour": "26721"
                },
                "miss_distance": { "kilometers": "38011.5", "lunar": "0.0989" },
                "orbiting_body": "Earth"
            },
            {
                "close_approach_date": "2036-03-27",
                "relative_velocity": { "kilometers_per_second": "5.1" },
                "miss_distance": { "kilometers": "46000000" }
            }
        ],
        "orbital_data": { "orbit_uncertainty": "0", "orbit_id": "220" }
    }"#;

    #[test]
    fn test_record_from_lookup_uses_first_approach() {
        let object = parse_lookup(LOOKUP).unwrap();
        let record = NeoRecord::from_object(&object).unwrap().unwrap();
        assert_eq!(record.neo_id, "2099942");
        assert_eq!(record.miss_distance_km, 38_011.5);
        assert_eq!(record.velocity_km_s, 7.4225);
        assert_eq!(record.orbit_uncertainty.as_deref(), Some("0"));
        assert_eq!(record.is_potentially_hazardous, Some(true));
        assert_eq!(record.label(), "99942 Apophis (2004 MN4)");
        assert_eq!(record.orbit_uncertainty(), OrbitUncertainty::Class(0));
        assert_eq!(record.close_approach_date().as_deref(), Some("2029-04-13"));
    }

    #[test]
    fn test_object_without_approach_is_skipped() {
        let object: NeoObject = serde_json::from_str(r#"{ "id": "3542519" }"#).unwrap();
        assert_eq!(NeoRecord::from_object(&object).unwrap(), None);
    }

    #[test]
    fn test_bad_number_is_reported() {
        let mut object = parse_lookup(LOOKUP).unwrap();
        object.close_approach_data[0].miss_distance.kilometers = "far".into();
        assert_eq!(
            NeoRecord::from_object(&object),
            Err(ImpactorError::InvalidRecordField {
                field: "miss_distance.kilometers",
                value: "far".into()
            })
        );
    }

    #[test]
    fn test_feed_ids_are_unique_and_ordered() {
        let feed = parse_feed(
            r#"{
            "element_count": 3,
            "near_earth_objects": {
                "2024-01-02": [ { "id": "b" }, { "id": "a" } ],
                "2024-01-01": [ { "id": "a" } ]
            }
        }"#,
        )
        .unwrap();
        assert_eq!(feed.ids(), vec!["a".to_string(), "b".to_string()]);
        assert_eq!(feed.objects().count(), 3);
        assert!(records_from_objects(feed.objects()).unwrap().is_empty());
    }

    #[test]
    fn test_csv_round_trip_with_pandas_flags() {
        let data = "neo_id,miss_distance_km,velocity_km_s,orbit_uncertainty,\
                    is_potentially_hazardous\n\
                    54016476,4521843.2,11.9,7,False\n\
                    3092269,1200000,21.5,,True\n\
                    2099942,31600,7.4,4,\n";
        let records = read_neo_records(data.as_bytes()).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].is_potentially_hazardous, Some(false));
        assert_eq!(records[1].is_potentially_hazardous, Some(true));
        assert_eq!(records[2].is_potentially_hazardous, None);
        assert_eq!(records[1].orbit_uncertainty, None);
        assert_eq!(records[0].name, None);

        let input = records[1].to_input(100).unwrap();
        assert_eq!(input.n_trials(), 100);

        let mut out = Vec::new();
        write_neo_records(&mut out, &records).unwrap();
        let back = read_neo_records(out.as_slice()).unwrap();
        assert_eq!(back, records);
    }

    #[test]
    fn test_failing_records_are_skipped_when_scoring() {
        let data = "neo_id,miss_distance_km,velocity_km_s,orbit_uncertainty\n\
                    a,20000,9.0,5\n\
                    b,-15000,12.0,3\n\
                    c,40000,0.0,2\n\
                    d,5000,10.0,9\n";
        let records = read_neo_records(data.as_bytes()).unwrap();
        let scored = score_records(&Impactor::new(), &records, 500, Some(1));

        let ids: Vec<&str> = scored.iter().map(|(r, _)| r.neo_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "d"]);
        assert!(scored.iter().all(|(_, result)| result.sigma >= 0.0));

        let again = score_records(&Impactor::new(), &records, 500, Some(1));
        assert_eq!(scored[1].1.probability, again[1].1.probability);
    }
}
