use std::fs::{OpenOptions, create_dir_all};
use std::path::{Path, PathBuf};
use std::process::Command;

use chrono::{DateTime, Utc};
use serde::Serialize;

use surveyforge_core::GeneratedTable;
use surveyforge_eval::MetricsReport;
use surveyforge_generate::{GenerationReport, write_table_csv_file};
use surveyforge_plan::{PLAN_VERSION, SurveyPlan};

use super::{RegistryError, RegistryResult};

/// Serializable options for runs.
#[derive(Debug, Clone, Serialize)]
pub struct RunOptions {
    pub command: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config: Option<PathBuf>,
    pub strict: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed_override: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rows_override: Option<usize>,
}

/// Metadata captured at run start.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    pub run_dir: PathBuf,
    pub out: Option<PathBuf>,
    pub options: RunOptions,
}

/// JSON config written to each run directory.
#[derive(Debug, Serialize)]
pub struct RunConfig {
    pub run_id: String,
    pub started_at: String,
    pub plan_version: String,
    pub options: RunOptions,
    pub git: GitInfo,
}

/// Git metadata for reproducibility.
#[derive(Debug, Serialize)]
pub struct GitInfo {
    pub commit: Option<String>,
    pub dirty: Option<bool>,
}

/// Paths for run artifacts.
#[derive(Debug, Clone)]
pub struct RunPaths {
    pub root: PathBuf,
    pub plan_path: PathBuf,
    pub data_path: PathBuf,
    pub generation_report_path: PathBuf,
    pub metrics_path: PathBuf,
    pub report_path: PathBuf,
    pub logs_path: PathBuf,
}

pub fn start_run(ctx: &RunContext) -> RegistryResult<RunPaths> {
    let timestamp = ctx.started_at.format("%Y-%m-%dT%H-%M-%SZ").to_string();
    let root = ctx.run_dir.join(format!("{timestamp}__run_{}", ctx.run_id));

    create_dir_all(&root)?;

    let config = RunConfig {
        run_id: ctx.run_id.clone(),
        started_at: ctx.started_at.to_rfc3339(),
        plan_version: PLAN_VERSION.to_string(),
        options: ctx.options.clone(),
        git: collect_git_info(),
    };
    write_json(&root.join("config.json"), &config)?;

    let logs_path = root.join("logs.ndjson");
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(&logs_path)?;

    Ok(RunPaths {
        plan_path: root.join("plan.json"),
        data_path: root.join("data.csv"),
        generation_report_path: root.join("generation_report.json"),
        metrics_path: root.join("metrics.json"),
        report_path: root.join("report.md"),
        logs_path,
        root,
    })
}

/// Store the plan as actually run, so the directory alone reproduces the table.
pub fn write_plan(paths: &RunPaths, plan: &SurveyPlan) -> RegistryResult<()> {
    write_json(&paths.plan_path, plan)
}

/// Write `data.csv` and, when requested, a copy at `out_path`.
pub fn write_dataset(
    paths: &RunPaths,
    table: &GeneratedTable,
    out_path: Option<&Path>,
) -> RegistryResult<u64> {
    let bytes = write_table_csv_file(&paths.data_path, table)?;

    if let Some(out_path) = out_path {
        ensure_parent(out_path)?;
        write_table_csv_file(out_path, table)?;
    }

    Ok(bytes)
}

pub fn write_generation_report(paths: &RunPaths, report: &GenerationReport) -> RegistryResult<()> {
    write_json(&paths.generation_report_path, report)
}

pub fn write_evaluation(
    paths: &RunPaths,
    metrics: &MetricsReport,
    report: &str,
) -> RegistryResult<()> {
    write_json(&paths.metrics_path, metrics)?;
    std::fs::write(&paths.report_path, report.as_bytes())?;
    Ok(())
}

pub fn collect_git_info() -> GitInfo {
    let commit = Command::new("git")
        .args(["rev-parse", "HEAD"])
        .output()
        .ok()
        .and_then(|output| {
            if output.status.success() {
                Some(String::from_utf8_lossy(&output.stdout).trim().to_string())
            } else {
                None
            }
        })
        .filter(|value| !value.is_empty());

    let dirty = Command::new("git")
        .args(["status", "--porcelain"])
        .output()
        .ok()
        .filter(|output| output.status.success())
        .map(|output| !output.stdout.is_empty());

    GitInfo { commit, dirty }
}

fn ensure_parent(path: &Path) -> RegistryResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            create_dir_all(parent)?;
        }
    }
    Ok(())
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> RegistryResult<()> {
    let file = OpenOptions::new()
        .create(true)
        .truncate(true)
        .write(true)
        .open(path)?;
    serde_json::to_writer_pretty(file, value).map_err(RegistryError::from)
}
