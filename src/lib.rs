// Library module for testable functions

pub mod ingestion;

use ingestion::error::Result;
use ingestion::{fetch, parse, NeoDatabase};
use std::path::Path;
use tracing::info;

/// Load both sources and link them into a database
/// Files are read and closed before linking starts
pub fn load_database(neo_csv_path: &Path, cad_json_path: &Path) -> Result<NeoDatabase> {
    let neos = parse::load_neos(fetch::fetch_neos(neo_csv_path)?)?;
    let approaches = parse::load_approaches(fetch::fetch_approaches(cad_json_path)?)?;

    info!(
        "Loaded {} NEOs and {} close approaches",
        neos.len(),
        approaches.len()
    );

    Ok(NeoDatabase::new(neos, approaches))
}
