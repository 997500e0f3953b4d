//! Parse functions - transform raw data into typed records and entities

use crate::ingestion::error::{FormatError, Result};
use crate::ingestion::types::{
    ApproachRecord, CloseApproach, NearEarthObject, NeoRecord, RawData, RawField,
};
use serde::Deserialize;
use serde_json::Value;
use std::fs;
use std::io::{self, BufReader};
use tracing::info;

/// Columns the NEO catalogue must carry; any others are ignored
pub const NEO_COLUMNS: [&str; 4] = ["pdes", "name", "diameter", "pha"];

/// Fields the close-approach document must declare
pub const APPROACH_FIELDS: [&str; 4] = ["des", "cd", "dist", "v_inf"];

/// NEO catalogue CSV row structure
#[derive(Debug, Deserialize)]
struct NeoCsvRow {
    pdes: String,
    name: String,
    diameter: String,
    pha: String,
}

impl From<NeoCsvRow> for NeoRecord {
    fn from(row: NeoCsvRow) -> Self {
        NeoRecord {
            designation: row.pdes,
            name: RawField::from_text(row.name),
            diameter: RawField::from_text(row.diameter),
            hazardous: RawField::from_text(row.pha),
        }
    }
}

/// Parse the NEO catalogue into typed records, in file order
pub fn parse_neo_records(raw: RawData) -> Result<Vec<NeoRecord>> {
    let mut builder = csv::ReaderBuilder::new();
    builder.has_headers(true).trim(csv::Trim::Headers);

    match raw {
        RawData::Csv(text) => read_neo_rows(builder.from_reader(text.as_bytes())),
        RawData::File(path) => {
            info!("Parsing NEO CSV from {:?}", path);
            read_neo_rows(builder.from_path(&path)?)
        }
        other => Err(FormatError::UnexpectedSource {
            expected: "Csv",
            found: other.kind(),
        }
        .into()),
    }
}

fn read_neo_rows<R: io::Read>(mut reader: csv::Reader<R>) -> Result<Vec<NeoRecord>> {
    let headers = reader.headers()?.clone();
    for column in NEO_COLUMNS {
        if !headers.iter().any(|h| h == column) {
            return Err(FormatError::MissingColumn {
                column: column.to_string(),
            }
            .into());
        }
    }

    let mut records = Vec::new();
    for (idx, result) in reader.deserialize::<NeoCsvRow>().enumerate() {
        let row = result.map_err(|e| FormatError::MalformedRow {
            row: idx,
            detail: e.to_string(),
        })?;
        records.push(NeoRecord::from(row));
    }

    info!("Parsed {} NEO records", records.len());

    Ok(records)
}

/// Positions of the required fields inside each data row
#[derive(Debug, Clone, Copy)]
struct ApproachColumns {
    des: usize,
    cd: usize,
    dist: usize,
    v_inf: usize,
}

impl ApproachColumns {
    fn resolve(fields: &[String]) -> std::result::Result<Self, FormatError> {
        let position = |name: &str| {
            fields
                .iter()
                .position(|f| f == name)
                .ok_or_else(|| FormatError::MissingField {
                    field: name.to_string(),
                })
        };

        Ok(ApproachColumns {
            des: position(APPROACH_FIELDS[0])?,
            cd: position(APPROACH_FIELDS[1])?,
            dist: position(APPROACH_FIELDS[2])?,
            v_inf: position(APPROACH_FIELDS[3])?,
        })
    }

    fn record(&self, values: &[Value]) -> ApproachRecord {
        let designation = match &values[self.des] {
            Value::String(s) => s.clone(),
            Value::Null => String::new(),
            other => other.to_string(),
        };

        ApproachRecord {
            designation,
            time: RawField::from_json(&values[self.cd]),
            distance: RawField::from_json(&values[self.dist]),
            velocity: RawField::from_json(&values[self.v_inf]),
        }
    }
}

/// Parse close-approach data (`fields` + parallel `data` rows) into typed records
pub fn parse_approach_records(raw: RawData) -> Result<Vec<ApproachRecord>> {
    let document = match raw {
        RawData::Json(value) => value,
        RawData::File(path) => {
            info!("Parsing close-approach JSON from {:?}", path);
            let file = fs::File::open(&path)?;
            serde_json::from_reader(BufReader::new(file))?
        }
        other => {
            return Err(FormatError::UnexpectedSource {
                expected: "Json",
                found: other.kind(),
            }
            .into())
        }
    };

    let fields = declared_fields(&document)?;
    let columns = ApproachColumns::resolve(&fields)?;

    let rows = document
        .get("data")
        .ok_or_else(|| FormatError::MissingKey {
            key: "data".to_string(),
        })?
        .as_array()
        .ok_or_else(|| FormatError::InvalidKey {
            key: "data".to_string(),
            detail: "expected a list of rows".to_string(),
        })?;

    let mut records = Vec::with_capacity(rows.len());
    for (idx, row) in rows.iter().enumerate() {
        let values = row.as_array().ok_or_else(|| FormatError::MalformedRow {
            row: idx,
            detail: "expected a list of values".to_string(),
        })?;

        if values.len() != fields.len() {
            return Err(FormatError::FieldCountMismatch {
                row: idx,
                expected: fields.len(),
                found: values.len(),
            }
            .into());
        }

        records.push(columns.record(values));
    }

    info!("Parsed {} close-approach records", records.len());

    Ok(records)
}

fn declared_fields(document: &Value) -> std::result::Result<Vec<String>, FormatError> {
    let invalid = || FormatError::InvalidKey {
        key: "fields".to_string(),
        detail: "expected a list of field names".to_string(),
    };

    document
        .get("fields")
        .ok_or_else(|| FormatError::MissingKey {
            key: "fields".to_string(),
        })?
        .as_array()
        .ok_or_else(invalid)?
        .iter()
        .map(|f| f.as_str().map(str::to_string).ok_or_else(invalid))
        .collect()
}

/// Parse and construct every NEO in the catalogue
pub fn load_neos(raw: RawData) -> Result<Vec<NearEarthObject>> {
    let neos: Vec<NearEarthObject> = parse_neo_records(raw)?
        .into_iter()
        .map(NearEarthObject::from_record)
        .collect();

    info!("Constructed {} NEOs", neos.len());

    Ok(neos)
}

/// Parse and construct every close approach in the data file
pub fn load_approaches(raw: RawData) -> Result<Vec<CloseApproach>> {
    let approaches: Vec<CloseApproach> = parse_approach_records(raw)?
        .into_iter()
        .map(CloseApproach::from_record)
        .collect();

    info!("Constructed {} close approaches", approaches.len());

    Ok(approaches)
}
