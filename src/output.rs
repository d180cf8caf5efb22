//! Certified-result files.
//!
//! One file per certified trial, `<dir>/<index + 1>.csv`, holding the parameter
//! vector as a single comma-separated line. Rejected and errored trials leave
//! nothing on disk.

use std::fs;
use std::path::{Path, PathBuf};

use crate::{Result, TrialReport};

/// `1.5,-2,0.25`: shortest round-tripping form of each value.
pub fn format_parameters(params: &[f64]) -> String {
    params
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

/// Write every certified report under `dir` (created if missing).
pub fn write_certified(dir: impl AsRef<Path>, reports: &[TrialReport]) -> Result<Vec<PathBuf>> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir)?;
    let mut written = Vec::new();
    for r in reports {
        if let Some(params) = r.certified_parameters() {
            let path = dir.join(format!("{}.csv", r.index + 1));
            fs::write(&path, format!("{}\n", format_parameters(params)))?;
            log::debug!("wrote {}", path.display());
            written.push(path);
        }
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parameters_round_trip_through_text() {
        assert_eq!(format_parameters(&[1.5, -2.0, 0.1]), "1.5,-2,0.1");
        let p = [0.1 + 0.2, -1e-300, 123456.789];
        let s = format_parameters(&p);
        let back: Vec<f64> = s.split(',').map(|f| f.parse().unwrap()).collect();
        assert_eq!(back, p);
        assert_eq!(format_parameters(&[]), "");
    }
}
