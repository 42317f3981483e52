//! Gatediag - stuck-at fault simulator and diagnoser
//!
//! Command-line front end over a netlist file.
//!
//! # Usage
//!
//! ```bash
//! gatediag circuit.gd simulate --inputs "A=1,B=1" --fault X_0
//! gatediag circuit.gd sweep --fault Y_0
//! gatediag circuit.gd sensitivity --format json
//! gatediag circuit.gd diagnose --observe "A=1,B=1:0" --observe "A=0,B=0:1"
//! ```

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use gatediag_core::{
    analysis::SensitivityAnalyzer,
    circuit::Circuit,
    diagnosis::{BayesianDiagnoser, FaultHypothesis, LikelihoodModel, Observation, Prior},
    dsl,
    error::Result,
    report::{self, OutputFormat},
    sim::{simulate, FaultSimulator, FaultSpec, InputAssignment, InputSpace},
    DEFAULT_MATCH_WEIGHT, DEFAULT_MISMATCH_WEIGHT,
};
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

/// Stuck-at fault simulation and Bayesian fault diagnosis for gate netlists
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the netlist file (.gd)
    #[arg(value_name = "CIRCUIT_FILE")]
    circuit_file: PathBuf,

    /// Report format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text, global = true)]
    format: OutputFormat,

    /// Log debug output to stderr (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Evaluate the circuit once
    Simulate {
        /// Input values, e.g. "A=1,B=0"
        #[arg(short, long, value_parser = parse_assignment)]
        inputs: InputAssignment,

        /// Inject a stuck-at fault, e.g. "X_0"
        #[arg(long)]
        fault: Option<FaultHypothesis>,
    },

    /// Compare healthy and faulty runs over every input assignment
    Sweep {
        /// Stuck-at fault to inject, e.g. "Y_0"
        #[arg(long)]
        fault: FaultHypothesis,

        /// Report only the first assignment where any node differs
        #[arg(long)]
        first: bool,
    },

    /// Score how observable faults on each gate are at the output
    Sensitivity,

    /// Infer the most likely stuck-at fault from observations
    Diagnose {
        /// Observation "inputs:output", e.g. "A=1,B=1:0" (repeatable)
        #[arg(short, long, value_parser = parse_observation)]
        observe: Vec<Observation>,

        /// Prior probability of a hypothesis, e.g. "X_0=0.25" (repeatable)
        #[arg(short, long, value_parser = parse_prior_entry)]
        prior: Vec<(FaultHypothesis, f64)>,

        /// Treat --prior values as raw weights and normalize them
        #[arg(long)]
        normalize_prior: bool,

        /// Likelihood of an observation the hypothesis predicts
        #[arg(long, default_value_t = DEFAULT_MATCH_WEIGHT)]
        match_weight: f64,

        /// Likelihood of an observation the hypothesis contradicts
        #[arg(long, default_value_t = DEFAULT_MISMATCH_WEIGHT)]
        mismatch_weight: f64,
    },
}

fn parse_assignment(s: &str) -> std::result::Result<InputAssignment, String> {
    dsl::parse_assignment(s).map_err(|e| e.to_string())
}

fn parse_observation(s: &str) -> std::result::Result<Observation, String> {
    dsl::parse_observation(s).map_err(|e| e.to_string())
}

fn parse_prior_entry(s: &str) -> std::result::Result<(FaultHypothesis, f64), String> {
    let (hypothesis, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected <gate>_<0|1>=<probability>, got '{}'", s))?;
    let hypothesis = hypothesis.parse::<FaultHypothesis>().map_err(|e| e.to_string())?;
    let value = value
        .trim()
        .parse::<f64>()
        .map_err(|e| format!("invalid probability '{}': {}", value, e))?;
    Ok((hypothesis, value))
}

fn init_logging(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "warn" }));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    // Parse and build the circuit
    let ast = dsl::parse_file(&args.circuit_file)?;
    let circuit = Circuit::from_ast(ast)?;
    debug!(
        nodes = circuit.len(),
        inputs = circuit.inputs().len(),
        output = circuit.node_name(circuit.output()),
        "circuit loaded"
    );

    let rendered = run(&circuit, args.command, args.format)?;
    print!("{}", rendered);

    Ok(())
}

fn run(circuit: &Circuit, command: Command, format: OutputFormat) -> Result<String> {
    match command {
        Command::Simulate { inputs, fault } => {
            inputs.check_against(circuit)?;
            let fault = fault.map(|h| h.to_fault(circuit)).transpose()?;
            let log = simulate(circuit, &inputs, fault)?;
            report::render_run(circuit, &inputs, fault, &log, format)
        }
        Command::Sweep { fault, first } => {
            let fault: FaultSpec = fault.to_fault(circuit)?;
            let space = InputSpace::exhaustive(circuit)?;
            let simulator = FaultSimulator::new(circuit);
            let comparisons = if first {
                simulator.first_mismatch(&space, fault)?.into_iter().collect()
            } else {
                simulator.compare(&space, fault)?
            };
            report::render_comparisons(circuit, fault, &comparisons, format)
        }
        Command::Sensitivity => {
            let space = InputSpace::exhaustive(circuit)?;
            let sensitivity = SensitivityAnalyzer::new(circuit).analyze(&space)?;
            report::render_sensitivity(&sensitivity, format)
        }
        Command::Diagnose {
            observe,
            prior,
            normalize_prior,
            match_weight,
            mismatch_weight,
        } => {
            let model = LikelihoodModel::new(match_weight, mismatch_weight)?;
            let prior = if prior.is_empty() {
                Prior::uniform(circuit)?
            } else if normalize_prior {
                Prior::from_weights(prior)?
            } else {
                Prior::new(prior)?
            };
            if observe.is_empty() {
                warn!("no observations given, the posterior equals the prior");
            }

            let mut diagnoser = BayesianDiagnoser::with_model(circuit, prior, model)?;
            diagnoser.update_all(&observe)?;
            report::render_posterior(diagnoser.posterior(), diagnoser.observations_seen(), format)
        }
    }
}
