use std::env;
use std::io;
use std::path::PathBuf;

use surveyforge_generate::{GenerateOptions, GenerationEngine, write_table_csv};
use surveyforge_plan::SurveyPlan;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let mut args = env::args().skip(1);
    let mut plan_path: Option<PathBuf> = None;
    let mut seed: Option<u64> = None;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--plan" => plan_path = args.next().map(PathBuf::from),
            "--seed" => seed = args.next().map(|value| value.parse()).transpose()?,
            _ => {
                if plan_path.is_none() {
                    plan_path = Some(PathBuf::from(arg));
                } else {
                    return Err("unexpected argument".into());
                }
            }
        }
    }

    let plan_path = plan_path.ok_or("missing --plan path")?;
    let plan_json = std::fs::read_to_string(&plan_path)?;
    let mut plan: SurveyPlan = serde_json::from_str(&plan_json)?;
    if seed.is_some() {
        plan.seed = seed;
    }

    let engine = GenerationEngine::new(GenerateOptions::default());
    let result = engine.generate(&plan)?;

    write_table_csv(io::stdout().lock(), &result.table)?;
    eprintln!("seed={}", result.report.seed);
    Ok(())
}
