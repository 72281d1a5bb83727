// ============================================================
// Layer 6 - Experiment Tracker
// ============================================================
// Records run configuration, per-step metrics and the final
// summary of a training run.
//
// LocalTracker lays a run out on disk:
//
//   runs/<project>/<run-id>/
//     config.json       ← hyperparameters, written at init
//     metrics.jsonl     ← one LogEntry per line, append-only
//     media/images/     ← PNG files referenced from metrics.jsonl
//     summary.json      ← written by finish()
//
// RemoteTracker keeps the local copy and mirrors run creation,
// every entry and the summary to an HTTP endpoint:
//
//   POST {url}/runs                    {run_id, project, config}
//   POST {url}/runs/{run_id}/history   LogEntry
//   POST {url}/runs/{run_id}/summary   RunSummary
//
// Any non-success response aborts the run.

use std::{
    collections::BTreeMap,
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
    time::{SystemTime, UNIX_EPOCH},
};

use anyhow::{Context, Result};
use rand::Rng;
use reqwest::{
    blocking::Client,
    header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT},
};
use serde::Serialize;

use crate::domain::{
    record::{LogEntry, LoggedValue, RunSummary, StoredValue},
    traits::ExperimentTracker,
};
use crate::infra::media;

const RUN_ID_CHARS: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
const RUN_ID_LEN: usize = 8;

/// Random 8-character lowercase alphanumeric run id.
pub fn generate_run_id() -> String {
    let mut rng = rand::thread_rng();
    (0..RUN_ID_LEN)
        .map(|_| RUN_ID_CHARS[rng.gen_range(0..RUN_ID_CHARS.len())] as char)
        .collect()
}

fn now_secs() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or_default()
}

// ─── LocalTracker ─────────────────────────────────────────────────────────────
pub struct LocalTracker {
    run_id:       String,
    project:      String,
    run_dir:      PathBuf,
    metrics_path: PathBuf,
    next_step:    u64,
}

impl LocalTracker {
    /// Create the run directory and write `config.json`.
    pub fn init(root: impl AsRef<Path>, project: &str, config: &impl Serialize) -> Result<Self> {
        let run_id = generate_run_id();
        let run_dir = root.as_ref().join(project).join(&run_id);

        fs::create_dir_all(&run_dir)
            .with_context(|| format!("Cannot create run directory '{}'", run_dir.display()))?;

        let config_path = run_dir.join("config.json");
        fs::write(&config_path, serde_json::to_string_pretty(config)?)
            .with_context(|| format!("Cannot write '{}'", config_path.display()))?;

        tracing::info!("Tracking run {} in '{}'", run_id, run_dir.display());

        Ok(Self {
            run_id,
            project: project.to_string(),
            metrics_path: run_dir.join("metrics.jsonl"),
            run_dir,
            next_step: 0,
        })
    }

    pub fn run_dir(&self) -> &Path {
        &self.run_dir
    }

    pub fn project(&self) -> &str {
        &self.project
    }

    /// Persist media, append the entry to metrics.jsonl and return it.
    pub fn record(&mut self, values: Vec<(String, LoggedValue)>) -> Result<LogEntry> {
        let step = self.next_step;

        let mut stored = BTreeMap::new();
        for (key, value) in values {
            let value = self.store(step, &key, value)?;
            stored.insert(key, value);
        }

        let entry = LogEntry { step, timestamp: now_secs(), values: stored };

        let mut f = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.metrics_path)
            .with_context(|| format!("Cannot open '{}'", self.metrics_path.display()))?;
        writeln!(f, "{}", serde_json::to_string(&entry)?)?;

        self.next_step += 1;
        Ok(entry)
    }

    fn store(&self, step: u64, key: &str, value: LoggedValue) -> Result<StoredValue> {
        Ok(match value {
            LoggedValue::Scalar(value) => StoredValue::Scalar { value },
            LoggedValue::Image(panel) => {
                let rel = format!("media/images/{key}_{step}.png");
                media::write_png(&panel, &self.run_dir.join(&rel))?;
                StoredValue::ImageFile {
                    path:    rel,
                    caption: panel.caption,
                    width:   panel.width,
                    height:  panel.height,
                }
            }
            LoggedValue::Histogram(h) => StoredValue::Histogram {
                bin_edges: h.bin_edges,
                counts:    h.counts,
            },
            LoggedValue::Roc(curves) => StoredValue::RocCurves { curves },
        })
    }
}

impl ExperimentTracker for LocalTracker {
    fn run_id(&self) -> &str {
        &self.run_id
    }

    fn log(&mut self, values: Vec<(String, LoggedValue)>) -> Result<u64> {
        Ok(self.record(values)?.step)
    }

    fn finish(&mut self, summary: &RunSummary) -> Result<()> {
        let path = self.run_dir.join("summary.json");
        fs::write(&path, serde_json::to_string_pretty(summary)?)
            .with_context(|| format!("Cannot write '{}'", path.display()))?;
        tracing::info!("Run {} finished, summary in '{}'", self.run_id, path.display());
        Ok(())
    }
}

// ─── RemoteTracker ────────────────────────────────────────────────────────────
#[derive(Serialize)]
struct RunRegistration<'a, C: Serialize> {
    run_id:  &'a str,
    project: &'a str,
    config:  &'a C,
}

pub struct RemoteTracker {
    local:    LocalTracker,
    client:   Client,
    base_url: String,
}

impl RemoteTracker {
    /// Register the run with the endpoint at `base_url`.
    pub fn init(
        local:    LocalTracker,
        base_url: &str,
        token:    Option<&str>,
        config:   &impl Serialize,
    ) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static("cnn-mnist"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        if let Some(token) = token {
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&format!("Bearer {token}"))
                    .context("Tracker token is not a valid header value")?,
            );
        }

        let client = Client::builder().default_headers(headers).build()?;
        let tracker = Self {
            local,
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        };

        tracker.post(
            "runs",
            &RunRegistration {
                run_id:  tracker.local.run_id(),
                project: tracker.local.project(),
                config,
            },
        )?;
        tracing::info!("Mirroring run {} to {}", tracker.local.run_id(), tracker.base_url);

        Ok(tracker)
    }

    fn post(&self, path: &str, body: &impl Serialize) -> Result<()> {
        let url = format!("{}/{}", self.base_url, path);
        self.client
            .post(&url)
            .json(body)
            .send()
            .with_context(|| format!("Cannot reach tracker at '{url}'"))?
            .error_for_status()
            .with_context(|| format!("Tracker rejected request to '{url}'"))?;
        Ok(())
    }
}

impl ExperimentTracker for RemoteTracker {
    fn run_id(&self) -> &str {
        self.local.run_id()
    }

    fn log(&mut self, values: Vec<(String, LoggedValue)>) -> Result<u64> {
        let entry = self.local.record(values)?;
        self.post(&format!("runs/{}/history", self.local.run_id()), &entry)?;
        Ok(entry.step)
    }

    fn finish(&mut self, summary: &RunSummary) -> Result<()> {
        self.local.finish(summary)?;
        self.post(&format!("runs/{}/summary", self.local.run_id()), summary)
    }
}
