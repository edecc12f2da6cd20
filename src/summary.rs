use anyhow::Result;

use crate::config::Config;
use crate::dataset::{load_dataset, SheetReport, SheetStatus};
use crate::normalize::SkipReason;

/// Prints how each sheet of the configured workbook was ingested.
pub fn run_summary(config: &Config) -> Result<()> {
    let dataset = load_dataset(&config.workbook.path);

    println!("workbook: {}", config.workbook.path.display());
    print_reports(&dataset.reports);
    println!();
    println!("  records:  {}", dataset.store.len());
    println!("  sections: {}", dataset.store.sections().len());
    println!("  sources:  {}", dataset.store.sources().len());

    Ok(())
}

fn print_reports(reports: &[SheetReport]) {
    println!("{:<28} {:<10} {:>6} {:>8}", "SHEET", "STATUS", "KEPT", "DROPPED");
    for report in reports {
        let (status, kept, dropped) = describe(&report.status);
        println!("{:<28} {:<10} {:>6} {:>8}", report.sheet, status, kept, dropped);
        if let SheetStatus::Failed(message) = &report.status {
            println!("  error: {}", message);
        }
    }
}

fn describe(status: &SheetStatus) -> (&'static str, String, String) {
    match status {
        SheetStatus::Loaded { kept, dropped } => ("loaded", kept.to_string(), dropped.to_string()),
        SheetStatus::Skipped(SkipReason::ExampleSheet) => ("example", "-".into(), "-".into()),
        SheetStatus::Skipped(SkipReason::NoRows) => ("empty", "-".into(), "-".into()),
        SheetStatus::Failed(_) => ("FAILED", "-".into(), "-".into()),
    }
}
