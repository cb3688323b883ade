use std::env;
use std::path::PathBuf;

use surveyforge_eval::{EvaluateOptions, EvaluationEngine, read_table_csv_file};
use surveyforge_plan::SurveyPlan;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = env::args().skip(1);
    let mut plan_path: Option<PathBuf> = None;
    let mut data_path: Option<PathBuf> = None;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--plan" => plan_path = args.next().map(PathBuf::from),
            "--data" => data_path = args.next().map(PathBuf::from),
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
    let data_path = data_path.ok_or("missing --data path")?;

    let plan_json = std::fs::read_to_string(&plan_path)?;
    let plan: SurveyPlan = serde_json::from_str(&plan_json)?;
    let loaded = read_table_csv_file(&data_path, &plan)?;

    let engine = EvaluationEngine::new(EvaluateOptions::default());
    let result = engine.evaluate_loaded(&plan, &loaded, None)?;

    println!("{}", result.report);
    Ok(())
}
