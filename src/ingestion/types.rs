//! Core data types for the ingestion pipeline
//! Raw inputs, typed raw records, and the two linked entities

use crate::ingestion::error::FormatError;
use crate::ingestion::utils::{
    format_approach_time, normalize_diameter, normalize_hazardous, normalize_measurement,
    normalize_name, parse_approach_time,
};
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};

/// Raw data from a source - tagged by where the bytes live
#[derive(Debug)]
pub enum RawData {
    File(PathBuf),
    Csv(String),
    Json(serde_json::Value),
}

impl RawData {
    pub fn kind(&self) -> &'static str {
        match self {
            RawData::File(_) => "File",
            RawData::Csv(_) => "Csv",
            RawData::Json(_) => "Json",
        }
    }

    pub fn as_json(&self) -> Result<&serde_json::Value, FormatError> {
        match self {
            RawData::Json(json) => Ok(json),
            other => Err(FormatError::UnexpectedSource {
                expected: "Json",
                found: other.kind(),
            }),
        }
    }
}

/// A single field as it came out of a source.
///
/// `Empty` covers blank text, `Absent` covers a JSON `null`. Each normalizer in
/// `utils` matches on all three.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawField {
    Present(String),
    Empty,
    Absent,
}

impl RawField {
    pub fn from_text(text: impl Into<String>) -> Self {
        let text = text.into();
        if text.trim().is_empty() {
            RawField::Empty
        } else {
            RawField::Present(text)
        }
    }

    pub fn from_json(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => RawField::Absent,
            serde_json::Value::String(s) => RawField::from_text(s.as_str()),
            other => RawField::Present(other.to_string()),
        }
    }
}

impl From<Option<String>> for RawField {
    fn from(value: Option<String>) -> Self {
        value.map_or(RawField::Absent, RawField::from_text)
    }
}

/// One row of the NEO catalogue (`pdes`, `name`, `diameter`, `pha`)
#[derive(Debug, Clone, PartialEq)]
pub struct NeoRecord {
    pub designation: String,
    pub name: RawField,
    pub diameter: RawField,
    pub hazardous: RawField,
}

/// One row of the close-approach data (`des`, `cd`, `dist`, `v_inf`)
#[derive(Debug, Clone, PartialEq)]
pub struct ApproachRecord {
    pub designation: String,
    pub time: RawField,
    pub distance: RawField,
    pub velocity: RawField,
}

/// Index of a NEO inside a `NeoDatabase`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NeoId(pub(crate) usize);

/// Index of a close approach inside a `NeoDatabase`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ApproachId(pub(crate) usize);

/// A near-Earth object.
///
/// `approaches` is empty until the database links it, and holds indices into
/// the database's approach arena afterwards.
#[derive(Debug, Clone)]
pub struct NearEarthObject {
    pub designation: String,
    pub name: Option<String>,
    /// Kilometers; `None` when the catalogue has no measurement
    pub diameter: Option<f64>,
    pub hazardous: bool,
    pub(crate) approaches: Vec<ApproachId>,
}

impl NearEarthObject {
    pub fn from_record(record: NeoRecord) -> Self {
        NearEarthObject {
            designation: record.designation,
            name: normalize_name(record.name),
            diameter: normalize_diameter(record.diameter),
            hazardous: normalize_hazardous(&record.hazardous),
            approaches: Vec::new(),
        }
    }

    /// Minimal NEO standing in for a designation with no catalogue entry
    pub fn placeholder(designation: &str) -> Self {
        NearEarthObject {
            designation: designation.to_string(),
            name: None,
            diameter: None,
            hazardous: false,
            approaches: Vec::new(),
        }
    }

    /// `designation` alone, or `designation (name)`
    pub fn fullname(&self) -> String {
        match &self.name {
            Some(name) => format!("{} ({})", self.designation, name),
            None => self.designation.clone(),
        }
    }

    /// Diameter with NaN standing in for an unknown measurement
    pub fn diameter_km(&self) -> f64 {
        self.diameter.unwrap_or(f64::NAN)
    }

    pub fn approach_ids(&self) -> &[ApproachId] {
        &self.approaches
    }
}

impl std::fmt::Display for NearEarthObject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let hazard = if self.hazardous { "" } else { " not" };
        match self.diameter {
            Some(d) => write!(
                f,
                "NEO {} has a diameter of {:.3} km and is{} potentially hazardous.",
                self.fullname(),
                d,
                hazard
            ),
            None => write!(
                f,
                "NEO {} has an unknown diameter and is{} potentially hazardous.",
                self.fullname(),
                hazard
            ),
        }
    }
}

/// A close approach to Earth by a NEO.
///
/// `designation` is only the lookup key for linking; once linked, `neo`
/// identifies the owning object.
#[derive(Debug, Clone)]
pub struct CloseApproach {
    pub(crate) designation: String,
    pub time: Option<DateTime<Utc>>,
    /// Astronomical units
    pub distance: f64,
    /// Kilometers per second
    pub velocity: f64,
    pub(crate) neo: Option<NeoId>,
}

impl CloseApproach {
    pub fn from_record(record: ApproachRecord) -> Self {
        CloseApproach {
            designation: record.designation,
            time: parse_approach_time(&record.time),
            distance: normalize_measurement(&record.distance),
            velocity: normalize_measurement(&record.velocity),
            neo: None,
        }
    }

    /// Approach time as `YYYY-MM-DD HH:MM`, or empty when unknown
    pub fn time_str(&self) -> String {
        self.time.as_ref().map(format_approach_time).unwrap_or_default()
    }

    pub fn neo_id(&self) -> Option<NeoId> {
        self.neo
    }

    pub fn is_linked(&self) -> bool {
        self.neo.is_some()
    }

    pub(crate) fn lookup_key(&self) -> &str {
        &self.designation
    }
}

impl std::fmt::Display for CloseApproach {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "At {}, '{}' approaches Earth at a distance of {:.2} au and a velocity of {:.2} km/s.",
            self.time_str(),
            self.designation,
            self.distance,
            self.velocity
        )
    }
}

/// Output formats, picked by destination extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Csv,
    Json,
}

impl OutputFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "csv" => Some(OutputFormat::Csv),
            "json" => Some(OutputFormat::Json),
            _ => None,
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Csv => write!(f, "csv"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

/// Write operation statistics
#[derive(Debug, Clone)]
pub struct WriteStats {
    pub format: OutputFormat,
    pub written: usize,
    pub path: PathBuf,
}

impl std::fmt::Display for WriteStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "wrote {} close approaches as {} to {:?}",
            self.written, self.format, self.path
        )
    }
}
