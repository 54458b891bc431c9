//! Two-column (Currency, Value) CSV export

use crate::core::error::{RatesError, Result};
use std::path::{Path, PathBuf};
use tracing::debug;

pub const MAX_NAME_LEN: usize = 31;

/// Characters spreadsheet applications refuse in a sheet name.
const FORBIDDEN_NAME_CHARS: &[char] = &['\\', '!', '/', '?', ':', '*', '[', ']'];

/// Checks the destination directory and file name, returning the path the
/// export will be written to.
pub fn export_path(destination: &Path, name: &str) -> Result<PathBuf> {
    if !destination.is_dir() {
        return Err(RatesError::InvalidDestination(destination.to_path_buf()));
    }

    if name.chars().count() > MAX_NAME_LEN {
        return Err(RatesError::NameTooLong {
            name: name.to_string(),
            max: MAX_NAME_LEN,
        });
    }

    if name.trim().is_empty() || name.contains(FORBIDDEN_NAME_CHARS) {
        return Err(RatesError::InvalidName(name.to_string()));
    }

    Ok(destination.join(format!("{name}.csv")))
}

/// Writes `rows` to `<destination>/<name>.csv`.
pub fn export_csv<'a, I>(rows: I, destination: &Path, name: &str) -> Result<PathBuf>
where
    I: IntoIterator<Item = (&'a str, f64)>,
{
    let path = export_path(destination, name)?;
    let export_error = |source: csv::Error| RatesError::Export {
        path: path.clone(),
        source,
    };

    let mut writer = csv::Writer::from_path(&path).map_err(export_error)?;
    writer
        .write_record(["Currency", "Value"])
        .map_err(export_error)?;

    let mut count = 0;
    for (currency, value) in rows {
        writer
            .write_record([currency, format!("{value:.2}").as_str()])
            .map_err(export_error)?;
        count += 1;
    }
    writer
        .flush()
        .map_err(|e| export_error(csv::Error::from(e)))?;

    debug!(count, "Exported rates to {}", path.display());
    Ok(path)
}
