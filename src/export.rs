use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::Path;

use crate::harness::{ExperimentReport, ReportRow};
use crate::types::{ProblemInstance, VariantKind, VariantOutcome};

pub const CSV_HEADER: &str = "run,model,cuts,cuts_cost,waste,waste_cost,used_bars,total_cost,solve_time,bars,orders,bar_lengths,order_lengths";

const SEPARATOR_FIELD: &str = "----------";
const COLUMNS: usize = 13;

/// Instance columns are only written on baseline rows.
const BASELINE: VariantKind = VariantKind::ModelO;

pub fn write_csv<W: Write>(report: &ExperimentReport, mut out: W) -> io::Result<()> {
    writeln!(out, "{CSV_HEADER}")?;

    for row in &report.rows {
        match row {
            ReportRow::Separator => {
                writeln!(out, "{}", vec![SEPARATOR_FIELD; COLUMNS].join(","))?;
            }
            ReportRow::Outcome(outcome) => {
                let metrics = match outcome {
                    VariantOutcome::Solved(r) => format!(
                        "{},{:.2},{:.2},{:.2},{},{:.2},{:.4}",
                        r.cut_count,
                        r.cuts_cost,
                        r.waste_total,
                        r.waste_cost,
                        r.used_bar_count,
                        r.total_cost,
                        r.solve_seconds,
                    ),
                    other => vec![other.status(); 7].join(","),
                };
                let instance = match report.instance(outcome.run_id()) {
                    Some(inst) if outcome.variant() == BASELINE => instance_columns(inst),
                    _ => ",,,".to_string(),
                };
                writeln!(
                    out,
                    "{},{},{},{}",
                    outcome.run_id(),
                    outcome.variant(),
                    metrics,
                    instance
                )?;
            }
        }
    }

    out.flush()
}

fn instance_columns(instance: &ProblemInstance) -> String {
    format!(
        "{},{},{},{}",
        instance.bar_count(),
        instance.order_count(),
        bracketed(instance.bars()),
        bracketed(instance.orders()),
    )
}

/// `[200 150 120]`; space separated so the field needs no quoting.
fn bracketed(lengths: &[u32]) -> String {
    let items: Vec<String> = lengths.iter().map(|l| l.to_string()).collect();
    format!("[{}]", items.join(" "))
}

/// Saves the report rows to a CSV file.
pub fn save_csv(report: &ExperimentReport, path: impl AsRef<Path>) -> io::Result<()> {
    let file = File::create(path)?;
    write_csv(report, BufWriter::new(file))
}

/// Saves the full report, cutting plans included, as pretty JSON.
pub fn save_json(report: &ExperimentReport, path: impl AsRef<Path>) -> io::Result<()> {
    let json = serde_json::to_string_pretty(report)?;
    fs::write(path, json)
}
