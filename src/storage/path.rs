//! Output file naming and collision handling.

use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};

const NAME_FORMAT: &str = "run-%Y-%m-%d-%H.%M.%S";

/// Timestamped default file name in the working directory.
pub fn default_output_path(now: DateTime<Local>) -> PathBuf {
    PathBuf::from(format!("{}.csv", now.format(NAME_FORMAT)))
}

/// Pick a path that does not overwrite an existing record.
///
/// Returns `requested` when it is free. Otherwise falls back to a timestamped
/// name next to it, appending `-1`, `-2`, ... until an unused name is found.
pub fn resolve_output_path(requested: &Path, now: DateTime<Local>) -> PathBuf {
    if !requested.exists() {
        return requested.to_path_buf();
    }

    let dir = requested.parent().unwrap_or_else(|| Path::new(""));
    let stem = now.format(NAME_FORMAT).to_string();

    let candidate = dir.join(format!("{stem}.csv"));
    if !candidate.exists() {
        return candidate;
    }

    (1u32..)
        .map(|n| dir.join(format!("{stem}-{n}.csv")))
        .find(|path| !path.exists())
        .unwrap_or(candidate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn noon() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 3, 9, 12, 0, 5).unwrap()
    }

    #[test]
    fn test_default_name() {
        assert_eq!(
            default_output_path(noon()),
            PathBuf::from("run-2024-03-09-12.00.05.csv")
        );
    }

    #[test]
    fn test_free_path_is_kept() {
        let dir = tempfile::tempdir().unwrap();
        let requested = dir.path().join("torch.csv");

        assert_eq!(resolve_output_path(&requested, noon()), requested);
    }

    #[test]
    fn test_existing_file_is_not_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        let requested = dir.path().join("torch.csv");
        std::fs::write(&requested, "keep me").unwrap();

        let resolved = resolve_output_path(&requested, noon());
        assert_eq!(resolved, dir.path().join("run-2024-03-09-12.00.05.csv"));

        std::fs::write(&resolved, "also taken").unwrap();
        let resolved = resolve_output_path(&requested, noon());
        assert_eq!(resolved, dir.path().join("run-2024-03-09-12.00.05-1.csv"));

        assert_eq!(std::fs::read_to_string(&requested).unwrap(), "keep me");
    }
}
