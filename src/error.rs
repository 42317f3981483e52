//! Error types for the gatediag fault simulator and diagnoser.
//!
//! This module provides a unified error type [`GateDiagError`] that covers
//! all error conditions that can occur during netlist parsing, circuit
//! construction, evaluation and diagnosis. Every variant belongs to exactly
//! one [`ErrorKind`], so callers can react to the category (fatal
//! configuration problem, recoverable per-call value problem, or a
//! per-update diagnosis failure) without matching every variant.

use thiserror::Error;

/// Result type alias using [`GateDiagError`].
pub type Result<T> = std::result::Result<T, GateDiagError>;

/// Coarse classification of a [`GateDiagError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Netlist or observation text could not be parsed
    Parse,
    /// Malformed circuit, fault, prior or likelihood configuration
    Config,
    /// Missing or unknown value in an input assignment
    Value,
    /// Posterior update failed numerically
    Diagnosis,
    /// File could not be read
    Io,
    /// A sweep was cancelled through its token
    Cancelled,
}

/// Unified error type for all gatediag operations.
#[derive(Error, Debug)]
pub enum GateDiagError {
    // ============ DSL Parsing Errors ============
    /// Error during lexical analysis
    #[error("Lexer error at line {line}, column {column}: {message}")]
    LexerError {
        line: usize,
        column: usize,
        message: String,
    },

    /// Error during parsing
    #[error("Parse error at line {line}: {message}")]
    ParseError { line: usize, message: String },

    // ============ Circuit Configuration Errors ============
    /// Two nodes share an identifier
    #[error("Duplicate node '{name}'")]
    DuplicateNode { name: String },

    /// A node references an input that is not defined
    #[error("Node '{node}' references undefined node '{reference}'")]
    UndefinedNode { node: String, reference: String },

    /// Gate fan-in does not match its kind
    #[error("Node '{node}' is {kind} and needs {expected} input(s), got {actual}")]
    ArityMismatch {
        node: String,
        kind: String,
        expected: usize,
        actual: usize,
    },

    /// The node graph contains a cycle
    #[error("Cycle detected through node '{node}': {}", .path.join(" -> "))]
    CycleDetected { node: String, path: Vec<String> },

    /// No output could be determined
    #[error("No output node specified (use '.output <node>')")]
    MissingOutput,

    /// More than one sink and no explicit output
    #[error("Output node is ambiguous, candidates: {}", .candidates.join(", "))]
    AmbiguousOutput { candidates: Vec<String> },

    /// Fault targets a missing node or an input
    #[error("Invalid fault on '{node}': {message}")]
    InvalidFault { node: String, message: String },

    /// Too many inputs to enumerate exhaustively
    #[error("Circuit has {inputs} inputs, exhaustive enumeration supports at most {max}")]
    TooManyInputs { inputs: usize, max: usize },

    // ============ Diagnoser Configuration Errors ============
    /// Prior is empty
    #[error("Prior contains no fault hypotheses")]
    EmptyHypothesisSet,

    /// A prior entry is not a usable probability
    #[error("Invalid prior probability for '{hypothesis}': {value}")]
    InvalidPrior { hypothesis: String, value: f64 },

    /// Prior does not sum to one
    #[error("Prior probabilities sum to {sum}, expected 1")]
    PriorNotNormalized { sum: f64 },

    /// A hypothesis names something that cannot be faulted
    #[error("Unknown fault hypothesis '{hypothesis}': {message}")]
    UnknownHypothesis { hypothesis: String, message: String },

    /// Likelihood weights violate match > mismatch > 0
    #[error("Invalid likelihood model (match={match_weight}, mismatch={mismatch_weight}): {message}")]
    InvalidLikelihood {
        match_weight: f64,
        mismatch_weight: f64,
        message: String,
    },

    // ============ Evaluation Errors ============
    /// An input referenced by the output has no assigned value
    #[error("No value assigned to input node '{node}'")]
    MissingInputValue { node: String },

    /// An assignment names a node that is not an input
    #[error("'{node}' is not an input node of the circuit")]
    UnknownInput { node: String },

    // ============ Diagnosis Errors ============
    /// Likelihood mass underflowed during normalization
    #[error("Posterior mass underflowed after {observations} observation(s) (total {total:.3e})")]
    LikelihoodUnderflow { observations: usize, total: f64 },

    // ============ Control Errors ============
    /// Sweep was cancelled
    #[error("Sweep cancelled")]
    Cancelled,

    // ============ I/O Errors ============
    /// Error rendering a report
    #[error("Failed to render report: {message}")]
    ReportError { message: String },

    /// Error reading netlist file
    #[error("Failed to read netlist file '{path}': {source}")]
    FileReadError {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl GateDiagError {
    /// Create a lexer error
    pub fn lexer(line: usize, column: usize, message: impl Into<String>) -> Self {
        Self::LexerError {
            line,
            column,
            message: message.into(),
        }
    }

    /// Create a parse error
    pub fn parse(line: usize, message: impl Into<String>) -> Self {
        Self::ParseError {
            line,
            message: message.into(),
        }
    }

    /// Create an invalid fault error
    pub fn invalid_fault(node: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidFault {
            node: node.into(),
            message: message.into(),
        }
    }

    /// Create an unknown hypothesis error
    pub fn unknown_hypothesis(hypothesis: impl Into<String>, message: impl Into<String>) -> Self {
        Self::UnknownHypothesis {
            hypothesis: hypothesis.into(),
            message: message.into(),
        }
    }

    /// The taxonomy category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::LexerError { .. } | Self::ParseError { .. } => ErrorKind::Parse,
            Self::DuplicateNode { .. }
            | Self::UndefinedNode { .. }
            | Self::ArityMismatch { .. }
            | Self::CycleDetected { .. }
            | Self::MissingOutput
            | Self::AmbiguousOutput { .. }
            | Self::InvalidFault { .. }
            | Self::TooManyInputs { .. }
            | Self::EmptyHypothesisSet
            | Self::InvalidPrior { .. }
            | Self::PriorNotNormalized { .. }
            | Self::UnknownHypothesis { .. }
            | Self::InvalidLikelihood { .. } => ErrorKind::Config,
            Self::MissingInputValue { .. } | Self::UnknownInput { .. } => ErrorKind::Value,
            Self::LikelihoodUnderflow { .. } => ErrorKind::Diagnosis,
            Self::Cancelled => ErrorKind::Cancelled,
            Self::ReportError { .. } | Self::FileReadError { .. } => ErrorKind::Io,
        }
    }
}

impl From<std::fmt::Error> for GateDiagError {
    fn from(e: std::fmt::Error) -> Self {
        Self::ReportError { message: e.to_string() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_classification() {
        assert_eq!(GateDiagError::MissingOutput.kind(), ErrorKind::Config);
        assert_eq!(
            GateDiagError::MissingInputValue { node: "A".into() }.kind(),
            ErrorKind::Value
        );
        assert_eq!(
            GateDiagError::LikelihoodUnderflow {
                observations: 3,
                total: 0.0
            }
            .kind(),
            ErrorKind::Diagnosis
        );
        assert_eq!(GateDiagError::parse(1, "x").kind(), ErrorKind::Parse);
    }

    #[test]
    fn test_format_error_is_report_error() {
        let err = GateDiagError::from(std::fmt::Error);
        assert!(matches!(err, GateDiagError::ReportError { .. }));
        assert_eq!(err.kind(), ErrorKind::Io);
    }

    #[test]
    fn test_cycle_message_lists_path() {
        let err = GateDiagError::CycleDetected {
            node: "X".into(),
            path: vec!["X".into(), "Y".into(), "X".into()],
        };
        assert_eq!(err.to_string(), "Cycle detected through node 'X': X -> Y -> X");
    }
}
