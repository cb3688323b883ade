mod config;
mod registry;

use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::{Args, Parser, Subcommand};
use surveyforge_core::Error as CoreError;
use surveyforge_eval::{EvalError, EvaluateOptions, EvaluationEngine, read_table_csv_file};
use surveyforge_generate::{GenerateOptions, GenerationEngine, GenerationError};
use surveyforge_plan::{
    LatentModel, LikertScale, PlanError, SurveyPlan, ValidationReport, VariableSpec,
    plan_json_schema,
};
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use config::{load_plan, print_report};
use registry::{
    RunContext, RunOptions, init_run_logging, init_stderr_logging, start_run, write_dataset,
    write_evaluation, write_generation_report, write_plan,
};

#[derive(Debug, Error)]
enum CliError {
    #[error("registry error: {0}")]
    Registry(#[from] registry::RegistryError),
    #[error("invalid parameter: {0}")]
    Core(#[from] CoreError),
    #[error("plan error: {0}")]
    Plan(#[from] PlanError),
    #[error("generation error: {0}")]
    Generation(#[from] GenerationError),
    #[error("evaluation error: {0}")]
    Eval(#[from] EvalError),
    #[error("invalid plan: {0}")]
    InvalidPlan(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),
}

#[derive(Parser, Debug)]
#[command(name = "surveyforge", version, about = "Synthetic survey data generator")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate a survey table from a plan file.
    Generate(GenerateArgs),
    /// Generate Likert items for one scale with a target Cronbach's alpha.
    Alpha(AlphaArgs),
    /// Validate a plan file and print every issue.
    Validate(ValidateArgs),
    /// Compare a CSV dataset against the plan that produced it.
    Evaluate(EvaluateArgs),
    /// Print the plan JSON Schema.
    Schema(SchemaArgs),
}

#[derive(Args, Debug)]
struct RunArgs {
    /// Override the plan seed.
    #[arg(long)]
    seed: Option<u64>,
    /// Refuse plans that validate with warnings.
    #[arg(long, default_value_t = false)]
    strict: bool,
    /// Output directory for runs.
    #[arg(long, default_value = "runs")]
    run_dir: PathBuf,
    /// Optional extra output path for the CSV.
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct GenerateArgs {
    /// Plan file (.json or .toml).
    #[arg(long, value_name = "FILE")]
    config: PathBuf,
    /// Override the number of rows.
    #[arg(long)]
    rows: Option<usize>,
    #[command(flatten)]
    run: RunArgs,
}

#[derive(Args, Debug)]
struct AlphaArgs {
    /// Number of items in the scale.
    #[arg(long)]
    items: u32,
    /// Target Cronbach's alpha in [0, 1).
    #[arg(long)]
    alpha: f64,
    /// Number of respondents.
    #[arg(long)]
    samples: usize,
    /// Likert points (5 or 7).
    #[arg(long, default_value_t = 5)]
    scale: u8,
    /// Variable name used for the item columns.
    #[arg(long, default_value = "item")]
    variable: String,
    #[command(flatten)]
    run: RunArgs,
}

#[derive(Args, Debug)]
struct ValidateArgs {
    /// Plan file (.json or .toml).
    #[arg(long, value_name = "FILE")]
    config: PathBuf,
}

#[derive(Args, Debug)]
struct EvaluateArgs {
    /// Plan file (.json or .toml).
    #[arg(long, value_name = "FILE")]
    config: PathBuf,
    /// CSV dataset to evaluate.
    #[arg(long, value_name = "CSV")]
    data: PathBuf,
    /// Fail when a statistic deviates beyond tolerance.
    #[arg(long, default_value_t = false)]
    strict: bool,
    /// Optional output path for the markdown report.
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct SchemaArgs {
    /// Optional output path; prints to stdout otherwise.
    #[arg(long)]
    out: Option<PathBuf>,
}

fn main() -> Result<(), CliError> {
    let cli = Cli::parse();

    match cli.command {
        Command::Generate(args) => run_generate(args),
        Command::Alpha(args) => run_alpha(args),
        Command::Validate(args) => run_validate(args),
        Command::Evaluate(args) => run_evaluate(args),
        Command::Schema(args) => run_schema(args),
    }
}

fn run_generate(args: GenerateArgs) -> Result<(), CliError> {
    let GenerateArgs { config, rows, run } = args;
    let mut plan = load_plan(&config)?.plan;
    if let Some(rows) = rows {
        plan.sample_count = rows;
    }

    let options = RunOptions {
        command: "generate".to_string(),
        config: Some(config),
        strict: run.strict,
        seed_override: run.seed,
        rows_override: rows,
    };
    run_generation(plan, run, options)
}

fn run_alpha(args: AlphaArgs) -> Result<(), CliError> {
    let AlphaArgs {
        items,
        alpha,
        samples,
        scale,
        variable,
        run,
    } = args;

    let mut plan = SurveyPlan::new(samples);
    plan.likert_scale = LikertScale::new(scale)?;
    plan.variables = vec![VariableSpec::new(variable, items)];
    plan.latent = Some(LatentModel::TargetAlpha {
        target_alpha: alpha,
    });

    let options = RunOptions {
        command: "alpha".to_string(),
        config: None,
        strict: run.strict,
        seed_override: run.seed,
        rows_override: None,
    };
    run_generation(plan, run, options)
}

fn run_generation(
    mut plan: SurveyPlan,
    run: RunArgs,
    options: RunOptions,
) -> Result<(), CliError> {
    if run.seed.is_some() {
        plan.seed = run.seed;
    }

    let engine = GenerationEngine::new(GenerateOptions { strict: run.strict });
    let prepared = engine.prepare(&plan)?;

    let run_id = Uuid::new_v4().to_string();
    let run_ctx = RunContext {
        run_id: run_id.clone(),
        started_at: chrono::Utc::now(),
        run_dir: run.run_dir,
        out: run.out,
        options,
    };

    let run_paths = start_run(&run_ctx)?;
    init_run_logging(&run_paths.logs_path)?;

    info!(event = "run_started", run_id = %run_id, command = %run_ctx.options.command);
    let timer = Instant::now();

    let result = match engine.generate_prepared(&prepared, run_id.clone()) {
        Ok(result) => result,
        Err(err) => {
            warn!(event = "run_finished", status = "failed", error = %err);
            return Err(err.into());
        }
    };

    let mut resolved = prepared.plan().clone();
    resolved.seed = Some(result.report.seed);
    write_plan(&run_paths, &resolved)?;

    let bytes = write_dataset(&run_paths, &result.table, run_ctx.out.as_deref())?;
    info!(event = "dataset_written", path = %run_paths.data_path.display(), bytes);

    write_generation_report(&run_paths, &result.report)?;

    let evaluation =
        EvaluationEngine::default().evaluate(&resolved, &result.table, Some(&result.report))?;
    write_evaluation(&run_paths, &evaluation.metrics, &evaluation.report)?;
    for deviation in &evaluation.deviations {
        warn!(
            event = "deviation",
            code = %deviation.code,
            path = %deviation.path,
            message = %deviation.message
        );
    }

    info!(
        event = "run_finished",
        status = "success",
        rows = result.table.row_count(),
        columns = result.table.column_count(),
        seed = result.report.seed,
        duration_ms = timer.elapsed().as_millis() as u64
    );

    println!("run_dir={}", run_paths.root.display());
    println!("seed={}", result.report.seed);
    Ok(())
}

fn run_validate(args: ValidateArgs) -> Result<(), CliError> {
    init_stderr_logging()?;
    let validated = load_plan(&args.config)?;

    if validated.warnings.is_empty() {
        println!("plan validated successfully");
    } else {
        eprintln!("plan validated with warnings:");
        print_report(&ValidationReport::with_warnings(validated.warnings));
    }
    Ok(())
}

fn run_evaluate(args: EvaluateArgs) -> Result<(), CliError> {
    init_stderr_logging()?;
    let plan = load_plan(&args.config)?.plan;
    let loaded = read_table_csv_file(&args.data, &plan)?;

    let engine = EvaluationEngine::new(EvaluateOptions {
        strict: args.strict,
        ..EvaluateOptions::default()
    });
    let result = engine.evaluate_loaded(&plan, &loaded, None)?;

    match args.out {
        Some(path) => {
            write_text(&path, &result.report)?;
            info!(event = "report_written", path = %path.display());
        }
        None => println!("{}", result.report),
    }
    Ok(())
}

fn run_schema(args: SchemaArgs) -> Result<(), CliError> {
    let json = serde_json::to_string_pretty(&plan_json_schema())?;
    match args.out {
        Some(path) => write_text(&path, &json)?,
        None => println!("{json}"),
    }
    Ok(())
}

fn write_text(path: &Path, contents: &str) -> Result<(), CliError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(path, contents)?;
    Ok(())
}
