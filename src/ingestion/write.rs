//! Write functions - flatten linked close approaches to CSV or JSON
//!
//! Column order and key names are the compatibility contract for downstream
//! tools. Output goes to a temporary file next to the destination and is
//! renamed into place only after every row has been written, so a failed run
//! never leaves a complete-looking file behind.

use crate::ingestion::error::{IngestionError, Result};
use crate::ingestion::link::NeoDatabase;
use crate::ingestion::types::{CloseApproach, NearEarthObject, OutputFormat, WriteStats};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::{debug, info};

/// Header of the tabular output, in column order
pub const CSV_HEADER: [&str; 7] = [
    "datetime_utc",
    "distance_au",
    "velocity_km_s",
    "designation",
    "name",
    "diameter_km",
    "potentially_hazardous",
];

/// One tabular output row
#[derive(Debug, Serialize)]
struct CsvRow<'a> {
    datetime_utc: String,
    distance_au: f64,
    velocity_km_s: f64,
    designation: &'a str,
    name: &'a str,
    diameter_km: f64,
    potentially_hazardous: &'static str,
}

/// One structured output record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApproachOutput {
    pub datetime_utc: String,
    pub distance_au: f64,
    pub velocity_km_s: f64,
    pub neo: NeoOutput,
}

/// The NEO nested inside a structured output record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NeoOutput {
    pub designation: String,
    /// Empty when the NEO has no name; never `null`
    pub name: String,
    /// `null` in JSON when unknown
    pub diameter_km: Option<f64>,
    pub potentially_hazardous: bool,
}

impl NeoOutput {
    /// Diameter with NaN for an unknown measurement
    pub fn diameter(&self) -> f64 {
        self.diameter_km.unwrap_or(f64::NAN)
    }
}

impl ApproachOutput {
    fn new(approach: &CloseApproach, neo: &NearEarthObject) -> Self {
        ApproachOutput {
            datetime_utc: approach.time_str(),
            distance_au: approach.distance,
            velocity_km_s: approach.velocity,
            neo: NeoOutput {
                designation: neo.designation.clone(),
                name: neo.name.clone().unwrap_or_default(),
                diameter_km: neo.diameter,
                potentially_hazardous: neo.hazardous,
            },
        }
    }
}

/// Resolve an approach's NEO or fail; unlinked approaches are never written
fn linked_neo<'a>(db: &'a NeoDatabase, approach: &CloseApproach) -> Result<&'a NearEarthObject> {
    db.neo_of(approach).ok_or_else(|| IngestionError::Linkage {
        designation: approach.lookup_key().to_string(),
        time: approach.time_str(),
    })
}

fn hazardous_str(hazardous: bool) -> &'static str {
    if hazardous {
        "True"
    } else {
        "False"
    }
}

/// Temporary file in the destination's directory, so the final rename stays
/// on one filesystem
fn staging_file(path: &Path) -> Result<NamedTempFile> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    Ok(NamedTempFile::new_in(dir)?)
}

fn finalize(staged: NamedTempFile, path: &Path) -> Result<()> {
    staged.persist(path).map_err(|e| IngestionError::Persist {
        path: path.to_path_buf(),
        source: e.error,
    })?;
    Ok(())
}

/// Write close approaches as CSV rows with a fixed header
pub fn write_to_csv<'a, I>(db: &NeoDatabase, results: I, path: &Path) -> Result<WriteStats>
where
    I: IntoIterator<Item = &'a CloseApproach>,
{
    info!("Writing close approaches to CSV {:?}", path);

    let staged = staging_file(path)?;
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(BufWriter::new(staged.as_file()));

    writer.write_record(CSV_HEADER)?;

    let mut written = 0;
    for approach in results {
        let neo = linked_neo(db, approach)?;
        writer.serialize(CsvRow {
            datetime_utc: approach.time_str(),
            distance_au: approach.distance,
            velocity_km_s: approach.velocity,
            designation: &neo.designation,
            name: neo.name.as_deref().unwrap_or(""),
            diameter_km: neo.diameter_km(),
            potentially_hazardous: hazardous_str(neo.hazardous),
        })?;
        written += 1;
    }

    writer.flush()?;
    drop(writer);
    finalize(staged, path)?;

    let stats = WriteStats {
        format: OutputFormat::Csv,
        written,
        path: path.to_path_buf(),
    };
    info!("Write complete: {}", stats);

    Ok(stats)
}

/// Write close approaches as a JSON list of records
pub fn write_to_json<'a, I>(db: &NeoDatabase, results: I, path: &Path) -> Result<WriteStats>
where
    I: IntoIterator<Item = &'a CloseApproach>,
{
    info!("Writing close approaches to JSON {:?}", path);

    let records = results
        .into_iter()
        .map(|approach| -> Result<ApproachOutput> {
            Ok(ApproachOutput::new(approach, linked_neo(db, approach)?))
        })
        .collect::<Result<Vec<_>>>()?;
    debug!("Flattened {} records", records.len());

    let staged = staging_file(path)?;
    {
        let mut out = BufWriter::new(staged.as_file());
        serde_json::to_writer(&mut out, &records)?;
        out.flush()?;
    }
    finalize(staged, path)?;

    let stats = WriteStats {
        format: OutputFormat::Json,
        written: records.len(),
        path: path.to_path_buf(),
    };
    info!("Write complete: {}", stats);

    Ok(stats)
}

/// Write in the given format
pub fn write_results<'a, I>(
    db: &NeoDatabase,
    results: I,
    path: &Path,
    format: OutputFormat,
) -> Result<WriteStats>
where
    I: IntoIterator<Item = &'a CloseApproach>,
{
    match format {
        OutputFormat::Csv => write_to_csv(db, results, path),
        OutputFormat::Json => write_to_json(db, results, path),
    }
}

/// Read back a structured output file
pub fn read_json_output(path: &Path) -> Result<Vec<ApproachOutput>> {
    let text = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingestion::types::{ApproachRecord, NeoRecord, RawField};
    use tempfile::tempdir;

    fn mock_db() -> NeoDatabase {
        let neos = vec![
            NearEarthObject::from_record(NeoRecord {
                designation: "433".to_string(),
                name: RawField::from_text("Eros"),
                diameter: RawField::from_text("16.84"),
                hazardous: RawField::from_text("N"),
            }),
            NearEarthObject::from_record(NeoRecord {
                designation: "2020 AA".to_string(),
                name: RawField::Empty,
                diameter: RawField::Empty,
                hazardous: RawField::from_text("Y"),
            }),
        ];
        let approaches = vec![
            mock_approach("433", "2020-Jan-01 00:00", "0.15", "5.2"),
            mock_approach("2020 AA", "2021-Mar-15 08:45", "0.02", "12.5"),
        ];
        NeoDatabase::new(neos, approaches)
    }

    fn mock_approach(des: &str, cd: &str, dist: &str, v_inf: &str) -> CloseApproach {
        CloseApproach::from_record(ApproachRecord {
            designation: des.to_string(),
            time: RawField::from_text(cd),
            distance: RawField::from_text(dist),
            velocity: RawField::from_text(v_inf),
        })
    }

    #[test]
    fn test_write_to_csv() {
        let db = mock_db();
        let temp = tempdir().unwrap();
        let path = temp.path().join("out.csv");

        let stats = write_to_csv(&db, db.approaches(), &path).unwrap();
        assert_eq!(stats.written, 2);
        assert_eq!(stats.format, OutputFormat::Csv);

        let text = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines,
            vec![
                "datetime_utc,distance_au,velocity_km_s,designation,name,diameter_km,potentially_hazardous",
                "2020-01-01 00:00,0.15,5.2,433,Eros,16.84,False",
                "2021-03-15 08:45,0.02,12.5,2020 AA,,NaN,True",
            ]
        );
    }

    #[test]
    fn test_write_to_csv_empty_still_has_header() {
        let db = mock_db();
        let temp = tempdir().unwrap();
        let path = temp.path().join("out.csv");

        let stats = write_to_csv(&db, std::iter::empty(), &path).unwrap();
        assert_eq!(stats.written, 0);
        assert_eq!(
            fs::read_to_string(&path).unwrap().trim_end(),
            CSV_HEADER.join(",")
        );
    }

    #[test]
    fn test_write_to_json() {
        let db = mock_db();
        let temp = tempdir().unwrap();
        let path = temp.path().join("out.json");

        write_to_json(&db, db.approaches(), &path).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value[0]["datetime_utc"], "2020-01-01 00:00");
        assert_eq!(value[0]["distance_au"], 0.15);
        assert_eq!(value[0]["velocity_km_s"], 5.2);
        assert_eq!(value[0]["neo"]["designation"], "433");
        assert_eq!(value[0]["neo"]["name"], "Eros");
        assert_eq!(value[0]["neo"]["diameter_km"], 16.84);
        assert_eq!(value[0]["neo"]["potentially_hazardous"], false);

        // absent name is an empty string, unknown diameter is null
        assert_eq!(value[1]["neo"]["name"], "");
        assert!(value[1]["neo"]["diameter_km"].is_null());
        assert_eq!(value[1]["neo"]["potentially_hazardous"], true);
    }

    #[test]
    fn test_unknown_diameter_reads_back_as_nan() {
        let db = mock_db();
        let temp = tempdir().unwrap();
        let path = temp.path().join("out.json");

        write_to_json(&db, db.approaches(), &path).unwrap();
        let records = read_json_output(&path).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].neo.diameter(), 16.84);
        assert!(records[1].neo.diameter().is_nan());
    }

    #[test]
    fn test_unlinked_approach_is_rejected_without_output() {
        let db = mock_db();
        let unlinked = mock_approach("433", "2020-Jan-02 00:00", "0.1", "1.0");
        let temp = tempdir().unwrap();

        for format in [OutputFormat::Csv, OutputFormat::Json] {
            let path = temp.path().join(format!("out.{}", format));
            let results = db.approaches().iter().chain(std::iter::once(&unlinked));

            let err = write_results(&db, results, &path, format).unwrap_err();
            assert!(err.is_linkage(), "unexpected error: {:?}", err);
            assert!(!path.exists());
        }

        // no staging files left behind either
        assert_eq!(fs::read_dir(temp.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_failed_write_keeps_previous_file() {
        let db = mock_db();
        let unlinked = mock_approach("433", "", "", "");
        let temp = tempdir().unwrap();
        let path = temp.path().join("out.csv");
        fs::write(&path, "previous").unwrap();

        assert!(write_to_csv(&db, [&unlinked], &path).is_err());
        assert_eq!(fs::read_to_string(&path).unwrap(), "previous");
    }
}
