//! Replays archived resolve requests against a backend.
//!
//! For every `<stem>.request.json` in a directory the runner stores the
//! response as `<stem>.<backend>.response.json` and appends a row to
//! `<backend>-report-<timestamp>.csv`. Failed items are logged and skipped.

use crate::backend::logger::REQUEST_FILE_SUFFIX;
use crate::backend::Backend;
use crate::error::{GeoError, ProviderError, Result};
use crate::model::gateway::Location;
use crate::model::geo::{ResolveMultiFrameTdoaRequest, ResolveResponse, ResolveTdoaRequest};
use crate::util::geodesy::Point;
use chrono::{SecondsFormat, Utc};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReplayMode {
    #[default]
    Single,
    MultiFrame,
}

impl FromStr for ReplayMode {
    type Err = GeoError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "single" => Ok(ReplayMode::Single),
            "multi" | "multi-frame" => Ok(ReplayMode::MultiFrame),
            other => Err(GeoError::InvalidArgument(format!(
                "unknown replay mode: {}",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ReplayOptions {
    pub mode: ReplayMode,
    /// Backend whose stored responses are used as reference positions
    pub compare_with: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReplayOutcome {
    pub id: String,
    pub location: Location,
    /// Chord distance in meters to the reference position, altitude ignored
    pub distance_to_reference: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct ReplaySummary {
    pub report_path: PathBuf,
    pub outcomes: Vec<ReplayOutcome>,
    pub failed: usize,
}

impl ReplaySummary {
    pub fn mean_distance(&self) -> Option<f64> {
        let distances: Vec<f64> = self
            .outcomes
            .iter()
            .filter_map(|o| o.distance_to_reference)
            .collect();

        if distances.is_empty() {
            return None;
        }
        Some(distances.iter().sum::<f64>() / distances.len() as f64)
    }
}

pub struct ReplayRunner<'a> {
    backend: &'a dyn Backend,
    options: ReplayOptions,
}

impl<'a> ReplayRunner<'a> {
    pub fn new(backend: &'a dyn Backend, options: ReplayOptions) -> Self {
        Self { backend, options }
    }

    pub async fn run(&self, dir: &Path) -> Result<ReplaySummary> {
        let inputs = request_files(dir).await?;

        let report_path = dir.join(format!(
            "{}-report-{}.csv",
            self.backend.name(),
            Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
        ));
        let mut wtr = csv::Writer::from_path(&report_path)?;
        wtr.write_record(["id", "latitude", "longitude", "altitude", "accuracy"])?;

        let mut outcomes = Vec::with_capacity(inputs.len());
        let mut failed = 0;

        for (id, path) in inputs {
            match self.replay_file(dir, &id, &path).await {
                Ok(outcome) => {
                    let loc = &outcome.location;
                    wtr.write_record([
                        outcome.id.clone(),
                        format!("{:.6}", loc.latitude),
                        format!("{:.6}", loc.longitude),
                        format!("{:.6}", loc.altitude),
                        loc.accuracy.to_string(),
                    ])?;
                    outcomes.push(outcome);
                }
                Err(e) => {
                    error!(id = %id, path = %path.display(), error = %e, "replay request error");
                    failed += 1;
                }
            }
        }
        wtr.flush()?;

        let summary = ReplaySummary {
            report_path,
            outcomes,
            failed,
        };

        info!(
            backend = self.backend.name(),
            report = %summary.report_path.display(),
            resolved = summary.outcomes.len(),
            failed = summary.failed,
            mean_distance = ?summary.mean_distance(),
            "replay finished"
        );

        Ok(summary)
    }

    async fn replay_file(&self, dir: &Path, id: &str, path: &Path) -> Result<ReplayOutcome> {
        let bb = tokio::fs::read(path).await?;

        let resp = match self.options.mode {
            ReplayMode::Single => {
                let req: ResolveTdoaRequest = serde_json::from_slice(&bb)?;
                self.backend.resolve_tdoa(&req).await?
            }
            ReplayMode::MultiFrame => {
                let req: ResolveMultiFrameTdoaRequest = serde_json::from_slice(&bb)?;
                self.backend.resolve_multi_frame_tdoa(&req).await?
            }
        };

        let snapshot = response_path(dir, id, self.backend.name());
        tokio::fs::write(&snapshot, serde_json::to_vec_pretty(&resp)?).await?;

        let Some(location) = resp.location().cloned() else {
            warn!(id = %id, "response has no location");
            return Err(ProviderError::MissingResult.into());
        };

        let distance_to_reference = match &self.options.compare_with {
            Some(other) => reference_location(&response_path(dir, id, other))
                .await
                .map(|reference| surface_distance(&location, &reference)),
            None => None,
        };

        Ok(ReplayOutcome {
            id: id.to_string(),
            location,
            distance_to_reference,
        })
    }
}

/// Returns `(id, path)` of every archived request in `dir`, sorted by file name.
async fn request_files(dir: &Path) -> Result<Vec<(String, PathBuf)>> {
    let mut files = Vec::new();
    let mut entries = tokio::fs::read_dir(dir).await?;

    while let Some(entry) = entries.next_entry().await? {
        let name = entry.file_name().to_string_lossy().into_owned();
        if let Some(id) = name.strip_suffix(REQUEST_FILE_SUFFIX) {
            files.push((id.to_string(), entry.path()));
        }
    }

    files.sort();
    Ok(files)
}

fn response_path(dir: &Path, id: &str, backend: &str) -> PathBuf {
    dir.join(format!("{}.{}.response.json", id, backend))
}

async fn reference_location(path: &Path) -> Option<Location> {
    let bb = tokio::fs::read(path).await.ok()?;
    match serde_json::from_slice::<ResolveResponse>(&bb) {
        Ok(resp) => resp.location().cloned(),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "invalid reference response");
            None
        }
    }
}

fn surface_distance(a: &Location, b: &Location) -> f64 {
    let p1 = Point::from_lat_lng_alt(a.latitude, a.longitude, 0.0);
    let p2 = Point::from_lat_lng_alt(b.latitude, b.longitude, 0.0);
    p1.distance(&p2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::testutil::StubBackend;
    use crate::model::geo::FrameRxInfo;
    use crate::translate::tests::valid_plain_request;
    use std::fs;
    use tempfile::TempDir;

    fn write_json<T: serde::Serialize>(dir: &Path, name: &str, value: &T) {
        fs::write(dir.join(name), serde_json::to_vec_pretty(value).unwrap()).unwrap();
    }

    fn read_report(path: &Path) -> Vec<Vec<String>> {
        let mut rdr = csv::Reader::from_path(path).unwrap();
        rdr.records()
            .map(|r| r.unwrap().iter().map(String::from).collect())
            .collect()
    }

    #[tokio::test]
    async fn test_replay_single_frame() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path();
        write_json(dir, "2019-01-02T00:00:00Z.request.json", &valid_plain_request());
        write_json(dir, "2019-01-01T00:00:00Z.request.json", &valid_plain_request());
        fs::write(dir.join("broken.request.json"), b"{not json").unwrap();
        fs::write(dir.join("notes.txt"), b"ignored").unwrap();

        let backend = StubBackend::new();
        let summary = ReplayRunner::new(&backend, ReplayOptions::default())
            .run(dir)
            .await
            .unwrap();

        assert_eq!(backend.call_count(), 2);
        assert_eq!(summary.failed, 1);

        let ids: Vec<&str> = summary.outcomes.iter().map(|o| o.id.as_str()).collect();
        assert_eq!(ids, vec!["2019-01-01T00:00:00Z", "2019-01-02T00:00:00Z"]);

        let name = summary.report_path.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("stub-report-"));
        assert!(name.ends_with(".csv"));

        let rows = read_report(&summary.report_path);
        assert_eq!(
            rows[0],
            vec![
                "2019-01-01T00:00:00Z",
                "52.100000",
                "4.300000",
                "12.000000",
                "25"
            ]
        );
        assert_eq!(rows.len(), 2);

        let snapshot = dir.join("2019-01-01T00:00:00Z.stub.response.json");
        let resp: ResolveResponse = serde_json::from_slice(&fs::read(snapshot).unwrap()).unwrap();
        assert_eq!(resp.location(), Some(&StubBackend::location()));
    }

    #[tokio::test]
    async fn test_replay_multi_frame() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path();
        let req = ResolveMultiFrameTdoaRequest {
            dev_eui: vec![1, 2, 3, 4, 5, 6, 7, 8],
            frame_rx_info_set: vec![FrameRxInfo::default(), FrameRxInfo::default()],
        };
        write_json(dir, "a.request.json", &req);

        let backend = StubBackend::new();
        let options = ReplayOptions {
            mode: ReplayMode::MultiFrame,
            compare_with: None,
        };
        let summary = ReplayRunner::new(&backend, options).run(dir).await.unwrap();

        assert_eq!(summary.outcomes.len(), 1);
        assert_eq!(summary.failed, 0);
        assert!(summary.mean_distance().is_none());
    }

    #[tokio::test]
    async fn test_backend_failures_are_skipped() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path();
        write_json(dir, "a.request.json", &valid_plain_request());
        write_json(dir, "b.request.json", &valid_plain_request());

        let backend = StubBackend::failing();
        let summary = ReplayRunner::new(&backend, ReplayOptions::default())
            .run(dir)
            .await
            .unwrap();

        assert_eq!(backend.call_count(), 2);
        assert_eq!(summary.failed, 2);
        assert!(summary.outcomes.is_empty());
        assert!(read_report(&summary.report_path).is_empty());
        assert!(!dir.join("a.stub.response.json").exists());
    }

    #[tokio::test]
    async fn test_compare_with_reference() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path();
        write_json(dir, "a.request.json", &valid_plain_request());
        write_json(dir, "b.request.json", &valid_plain_request());

        let reference = StubBackend::location();
        write_json(
            dir,
            "a.collos.response.json",
            &ResolveResponse::from_location(Location::new(
                reference.latitude,
                reference.longitude,
                500.0,
            )),
        );

        let backend = StubBackend::new();
        let options = ReplayOptions {
            mode: ReplayMode::Single,
            compare_with: Some("collos".to_string()),
        };
        let summary = ReplayRunner::new(&backend, options).run(dir).await.unwrap();

        assert_eq!(summary.outcomes[0].distance_to_reference, Some(0.0));
        assert_eq!(summary.outcomes[1].distance_to_reference, None);
        assert_eq!(summary.mean_distance(), Some(0.0));
    }

    #[test]
    fn test_mode_from_str() {
        assert_eq!("single".parse::<ReplayMode>().unwrap(), ReplayMode::Single);
        assert_eq!("multi".parse::<ReplayMode>().unwrap(), ReplayMode::MultiFrame);
        assert!("both".parse::<ReplayMode>().is_err());
    }
}
