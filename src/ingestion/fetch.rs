//! Fetch functions - read raw data for each source from disk
//!
//! Every handle opened here is closed before the function returns.

use crate::ingestion::error::Result;
use crate::ingestion::types::RawData;
use std::fs;
use std::io::BufReader;
use std::path::Path;
use tracing::info;

/// Fetch the NEO catalogue CSV as text
pub fn fetch_neos(csv_path: &Path) -> Result<RawData> {
    info!("Reading NEO catalogue from {:?}", csv_path);

    let text = fs::read_to_string(csv_path)?;
    info!("Read {} bytes of NEO CSV", text.len());

    Ok(RawData::Csv(text))
}

/// Fetch close-approach data and decode it as JSON
pub fn fetch_approaches(json_path: &Path) -> Result<RawData> {
    info!("Reading close-approach data from {:?}", json_path);

    let file = fs::File::open(json_path)?;
    let value: serde_json::Value = serde_json::from_reader(BufReader::new(file))?;

    Ok(RawData::Json(value))
}
