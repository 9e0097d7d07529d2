//! JSON output of dashboard reports.
//!
//! # Output Structure
//!
//! Files are grouped by the local date of the refresh:
//! ```text
//! json_output_dir/
//! └── 2025-05-06/
//!     ├── 081502_general.json
//!     └── 173010_business-technology-rates.json
//! ```

use crate::models::DashboardReport;
use crate::outputs::report_slug;
use chrono::Local;
use std::error::Error;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{error, info, instrument};

/// Write a [`DashboardReport`] as pretty-printed JSON.
///
/// The file is written to `{json_output_dir}/{date}/{time}_{slug}.json`.
#[instrument(level = "info", skip_all, fields(%json_output_dir))]
pub async fn write_report(
    report: &DashboardReport,
    json_output_dir: &str,
) -> Result<PathBuf, Box<dyn Error>> {
    let json = serde_json::to_string_pretty(report)?;

    let generated = report.generated_at.with_timezone(&Local);
    let full_json_dir = Path::new(json_output_dir).join(generated.date_naive().to_string());

    info!(full_json_dir = %full_json_dir.display(), "Ensuring JSON directory exists");
    if let Err(e) = fs::create_dir_all(&full_json_dir).await {
        error!(full_json_dir = %full_json_dir.display(), error = %e, "Failed to create JSON dir");
        return Err(e.into());
    }

    let path = full_json_dir.join(format!(
        "{}_{}.json",
        generated.format("%H%M%S"),
        report_slug(&report.request)
    ));
    fs::write(&path, json).await?;
    info!(path = %path.display(), "Wrote JSON report");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outputs::fixtures;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_write_report_layout_and_fields() {
        let dir = tempdir().unwrap();
        let report = fixtures::report();
        let path = write_report(&report, dir.path().to_str().unwrap())
            .await
            .unwrap();

        let date_dir = path.parent().unwrap();
        assert_eq!(date_dir.parent().unwrap(), dir.path());
        assert_eq!(
            date_dir.file_name().unwrap().to_str().unwrap(),
            report.generated_at.with_timezone(&Local).date_naive().to_string()
        );
        assert!(
            path.file_name()
                .unwrap()
                .to_str()
                .unwrap()
                .ends_with("_business-technology-rates.json")
        );

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        let first = &value["articles"][0];
        assert_eq!(first["source_name"], "Reuters");
        assert_eq!(first["publishedAt"], "2025-05-06T13:45:00Z");
        assert_eq!(first["clean_title"], "fed hold rate");
        assert_eq!(first["sentiment"], "NEUTRAL");
        assert!(value["articles"][1]["sentiment"].is_null());
        assert_eq!(value["dedup_key"], "url");
        assert_eq!(value["entities"][0]["entities"][0]["label"], "ORG");
        assert!(value["request"].get("api_key").is_none());
    }
}
