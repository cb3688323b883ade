use std::env;
use std::path::{Path, PathBuf};

use serde_json::Value;
use surveyforge_plan::{ValidationReport, plan_json_schema, validate_plan_document};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = env::args().skip(1);
    let plan_path: PathBuf = args.next().map(PathBuf::from).ok_or("missing plan path")?;
    if args.next().is_some() {
        return Err("unexpected argument".into());
    }

    let plan_json = load_json(&plan_path)?;
    let plan_schema = serde_json::to_value(plan_json_schema())?;

    let validated = match validate_plan_document(&plan_json, &plan_schema) {
        Ok(validated) => validated,
        Err(report) => {
            eprintln!("plan validation failed");
            print_report(&report);
            std::process::exit(1);
        }
    };

    if !validated.warnings.is_empty() {
        eprintln!("plan validated with warnings:");
        print_report(&ValidationReport::with_warnings(validated.warnings));
    } else {
        println!("plan validated successfully");
    }

    Ok(())
}

fn load_json(path: &Path) -> Result<Value, Box<dyn std::error::Error>> {
    let contents = std::fs::read_to_string(path)?;
    let json = serde_json::from_str(&contents)?;
    Ok(json)
}

fn print_report(report: &ValidationReport) {
    for issue in report.issues() {
        eprintln!("{issue}");
    }
}
