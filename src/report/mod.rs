//! Report rendering for the CLI frontend.
//!
//! Turns evaluation logs, sweep comparisons, sensitivity reports and
//! posteriors into either aligned plain text or pretty-printed JSON.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use serde::Serialize;

use crate::analysis::SensitivityReport;
use crate::circuit::{Bit, Circuit};
use crate::diagnosis::PosteriorDistribution;
use crate::error::{GateDiagError, Result};
use crate::sim::{EvaluationLog, FaultSpec, InputAssignment, SweepComparison};

/// Output format of a rendered report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text
    #[default]
    Text,
    /// Pretty-printed JSON
    Json,
}

fn to_json<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).map_err(|e| GateDiagError::ReportError { message: e.to_string() })
}

fn describe_fault(circuit: &Circuit, fault: Option<FaultSpec>) -> Option<String> {
    fault.map(|f| format!("{} stuck-at-{}", circuit.node_name(f.node()), f.stuck()))
}

#[derive(Serialize)]
struct RunReport<'a> {
    inputs: &'a InputAssignment,
    fault: Option<String>,
    values: BTreeMap<String, Bit>,
    output: Bit,
}

/// Render a single run.
pub fn render_run(
    circuit: &Circuit,
    assignment: &InputAssignment,
    fault: Option<FaultSpec>,
    log: &EvaluationLog,
    format: OutputFormat,
) -> Result<String> {
    let report = RunReport {
        inputs: assignment,
        fault: describe_fault(circuit, fault),
        values: log.to_named(circuit),
        output: log.output_bit(),
    };
    if format == OutputFormat::Json {
        return to_json(&report);
    }

    let mut out = String::new();
    match &report.fault {
        Some(fault) => writeln!(out, "inputs {} with {}", assignment, fault)?,
        None => writeln!(out, "inputs {}", assignment)?,
    }
    for &id in circuit.topological_order() {
        if let Some(bit) = log.get(id) {
            writeln!(out, "  {:<12} {:<6} {}", circuit.node_name(id), circuit.node(id).kind.keyword(), bit)?;
        }
    }
    writeln!(out, "output {} = {}", circuit.node_name(circuit.output()), report.output)?;
    Ok(out)
}

#[derive(Serialize)]
struct DiffEntry {
    node: String,
    healthy: Option<Bit>,
    faulty: Option<Bit>,
}

#[derive(Serialize)]
struct ComparisonReport<'a> {
    inputs: &'a InputAssignment,
    healthy_output: Bit,
    faulty_output: Bit,
    output_mismatch: bool,
    diff: Vec<DiffEntry>,
}

/// Render a healthy-versus-faulty sweep.
pub fn render_comparisons(
    circuit: &Circuit,
    fault: FaultSpec,
    comparisons: &[SweepComparison],
    format: OutputFormat,
) -> Result<String> {
    let rows: Vec<ComparisonReport<'_>> = comparisons
        .iter()
        .map(|c| ComparisonReport {
            inputs: &c.assignment,
            healthy_output: c.healthy.output_bit(),
            faulty_output: c.faulty.output_bit(),
            output_mismatch: c.output_mismatch(),
            diff: c
                .diff
                .iter()
                .map(|d| DiffEntry {
                    node: circuit.node_name(d.node).to_string(),
                    healthy: d.healthy,
                    faulty: d.faulty,
                })
                .collect(),
        })
        .collect();

    if format == OutputFormat::Json {
        return to_json(&rows);
    }

    let show = |bit: Option<Bit>| bit.map_or_else(|| "-".to_string(), |b| b.to_string());
    let mut out = String::new();
    writeln!(out, "fault {}", describe_fault(circuit, Some(fault)).unwrap_or_default())?;
    for row in &rows {
        let marker = if row.output_mismatch { "MISMATCH" } else { "ok" };
        let diff: Vec<String> = row
            .diff
            .iter()
            .map(|d| format!("{}({}->{})", d.node, show(d.healthy), show(d.faulty)))
            .collect();
        writeln!(
            out,
            "  {:<24} healthy={} faulty={} {:<8} {}",
            row.inputs.to_string(),
            row.healthy_output,
            row.faulty_output,
            marker,
            diff.join(" ")
        )?;
    }
    let detected = rows.iter().filter(|r| r.output_mismatch).count();
    writeln!(out, "detected at output in {}/{} assignments", detected, rows.len())?;
    Ok(out)
}

/// Render a sensitivity report.
pub fn render_sensitivity(report: &SensitivityReport, format: OutputFormat) -> Result<String> {
    if format == OutputFormat::Json {
        return to_json(report);
    }

    let mut out = String::new();
    writeln!(out, "{:<12} {:>6} {:>6} {:>7}", "gate", "s-a-0", "s-a-1", "score")?;
    for gate in report.iter() {
        writeln!(
            out,
            "{:<12} {:>6} {:>6} {:>7.3}",
            gate.gate,
            gate.stuck_at_0,
            gate.stuck_at_1,
            gate.score
        )?;
    }
    writeln!(out, "({} assignments x 2 stuck values per gate)", report.assignments())?;
    Ok(out)
}

#[derive(Serialize)]
struct PosteriorReport<'a> {
    observations: usize,
    posterior: &'a PosteriorDistribution,
}

/// Render a posterior, most likely hypothesis first.
pub fn render_posterior(posterior: &PosteriorDistribution, observations: usize, format: OutputFormat) -> Result<String> {
    if format == OutputFormat::Json {
        return to_json(&PosteriorReport {
            observations,
            posterior,
        });
    }

    let mut out = String::new();
    writeln!(out, "posterior after {} observation(s):", observations)?;
    for (hypothesis, p) in posterior.ranked() {
        writeln!(out, "  {:<14} {:>9.4}%", hypothesis.to_string(), p * 100.0)?;
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::analyze_sensitivity;
    use crate::circuit::reference_circuit;
    use crate::diagnosis::{diagnose, Prior};
    use crate::dsl;
    use crate::sim::{simulate, FaultSimulator, InputSpace};

    #[test]
    fn test_render_run_text() {
        let circuit = reference_circuit();
        let assignment = dsl::parse_assignment("A=1,B=1").unwrap();
        let fault = FaultSpec::new(&circuit, "X", Bit::Zero).ok();
        let log = simulate(&circuit, &assignment, fault).unwrap();
        let text = render_run(&circuit, &assignment, fault, &log, OutputFormat::Text).unwrap();
        assert!(text.starts_with("inputs A=1,B=1 with X stuck-at-0"));
        assert!(text.ends_with("output Z = 0\n"));
    }

    #[test]
    fn test_render_comparisons_counts_detections() {
        let circuit = reference_circuit();
        let space = InputSpace::exhaustive(&circuit).unwrap();
        let fault = FaultSpec::new(&circuit, "Y", Bit::Zero).unwrap();
        let comparisons = FaultSimulator::new(&circuit).compare(&space, fault).unwrap();
        let text = render_comparisons(&circuit, fault, &comparisons, OutputFormat::Text).unwrap();
        assert!(text.contains("detected at output in 2/4 assignments"));
        assert!(text.contains("Y(1->0)"));
    }

    #[test]
    fn test_render_json() {
        let circuit = reference_circuit();
        let space = InputSpace::exhaustive(&circuit).unwrap();
        let report = analyze_sensitivity(&circuit, &space).unwrap();
        let json: serde_json::Value =
            serde_json::from_str(&render_sensitivity(&report, OutputFormat::Json).unwrap()).unwrap();
        assert_eq!(json["gates"][0]["gate"], "X");
        assert_eq!(json["assignments"], 4);

        let observation = dsl::parse_observation("A=1,B=1:0").unwrap();
        let posterior = diagnose(&circuit, Prior::uniform(&circuit).unwrap(), &[observation], Default::default()).unwrap();
        let json: serde_json::Value =
            serde_json::from_str(&render_posterior(&posterior, 1, OutputFormat::Json).unwrap()).unwrap();
        assert_eq!(json["observations"], 1);
        assert!(json["posterior"]["X_0"].as_f64().unwrap() > 0.4);
    }
}
