//! Human-review table printed before anything is committed.

use std::fmt::Write as _;

use lta_algo::Strategy;
use lta_core::{PositionsSource, UnitPortion};
use lta_pipeline::{Plan, Severity};

pub fn render(plan: &Plan) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail.
    let _ = write_plan(&mut out, plan);
    out
}

fn write_plan(out: &mut String, plan: &Plan) -> std::fmt::Result {
    let t = &plan.totals;
    let strategy = match plan.strategy {
        Strategy::Sequential => "sequential",
        Strategy::Exception => "exception (airport-cleared partial)",
    };
    writeln!(
        out,
        "LTA {} kg / {} positions / {} units, {} partials, {strategy}",
        t.total_weight,
        t.total_positions,
        t.units.len(),
        plan.request.len()
    )?;
    if plan.draft {
        writeln!(out, "DRAFT: placeholder partials allowed, nothing will be written")?;
    }

    writeln!(out, "{:>3}  {:>10}  {:>5}  {:<5}  units", "#", "kg", "pos", "depot")?;
    for a in &plan.distribution.allocations {
        let units = if a.portions.is_empty() {
            "-".to_string()
        } else {
            a.portions.iter().map(portion_cell).collect::<Vec<_>>().join(", ")
        };
        writeln!(
            out,
            "{:>3}  {:>10.1}  {:>5}  {:<5}  {units}",
            a.partial_index,
            a.target_weight,
            a.computed_positions,
            if a.requires_customs_depot_statement { "yes" } else { "no" },
        )?;
    }

    if let Some(meta) = &plan.distribution.exception_metadata {
        let source = match meta.positions_source {
            PositionsSource::Supplied => "supplied",
            PositionsSource::Proportional => "PROVISIONAL estimate, confirm before commit",
        };
        write!(
            out,
            "airport-cleared partial {}: {} positions ({source})",
            meta.smallest_partial_index, meta.smallest_partial_positions
        )?;
        if let Some(r) = &meta.airport_reference {
            write!(out, ", ref {r}")?;
        }
        writeln!(out)?;
    }

    for f in &plan.report.findings {
        let level = match f.severity() {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        writeln!(out, "{level} [{}]: {f}", f.code())?;
    }
    Ok(())
}

fn portion_cell(p: &UnitPortion) -> String {
    let name = p.split_label.clone().unwrap_or_else(|| p.unit_number.to_string());
    format!("{name} ({} kg, {} pos)", p.weight, p.positions)
}
