//! Healthy-versus-faulty sweeps over an input space.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[cfg(feature = "parallel")]
use rayon::prelude::*;
use serde::Serialize;
use tracing::debug;

use super::evaluator::{EvaluationLog, Evaluator, FaultSpec, InputAssignment};
use crate::circuit::{Bit, Circuit, NodeId};
use crate::error::{GateDiagError, Result};
use crate::MAX_EXHAUSTIVE_INPUTS;

/// An ordered list of input assignments to simulate.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputSpace {
    assignments: Vec<InputAssignment>,
}

impl InputSpace {
    /// Every combination of the circuit's inputs.
    ///
    /// The first declared input is the most significant bit, so for inputs
    /// `A, B` the order is `00, 01, 10, 11`.
    pub fn exhaustive(circuit: &Circuit) -> Result<Self> {
        let inputs = circuit.inputs();
        let n = inputs.len();
        if n > MAX_EXHAUSTIVE_INPUTS {
            return Err(GateDiagError::TooManyInputs {
                inputs: n,
                max: MAX_EXHAUSTIVE_INPUTS,
            });
        }

        let assignments = (0..1usize << n)
            .map(|code| {
                inputs
                    .iter()
                    .enumerate()
                    .map(|(pos, &id)| {
                        let bit = Bit::from((code >> (n - 1 - pos)) & 1 == 1);
                        (circuit.node_name(id), bit)
                    })
                    .collect()
            })
            .collect();

        Ok(Self { assignments })
    }

    pub fn iter(&self) -> std::slice::Iter<'_, InputAssignment> {
        self.assignments.iter()
    }

    pub fn len(&self) -> usize {
        self.assignments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }

    /// Apply `f` to every assignment, in parallel when the `parallel`
    /// feature is enabled. Output order always matches input order.
    pub(crate) fn try_map<T, F>(&self, f: F) -> Result<Vec<T>>
    where
        T: Send,
        F: Fn(&InputAssignment) -> Result<T> + Sync + Send,
    {
        #[cfg(feature = "parallel")]
        {
            self.assignments.par_iter().map(f).collect()
        }
        #[cfg(not(feature = "parallel"))]
        {
            self.assignments.iter().map(f).collect()
        }
    }
}

impl From<Vec<InputAssignment>> for InputSpace {
    fn from(assignments: Vec<InputAssignment>) -> Self {
        Self { assignments }
    }
}

impl<'a> IntoIterator for &'a InputSpace {
    type Item = &'a InputAssignment;
    type IntoIter = std::slice::Iter<'a, InputAssignment>;

    fn into_iter(self) -> Self::IntoIter {
        self.assignments.iter()
    }
}

/// Shared flag used to stop a long sweep early.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Sweeps observe it before their next trial.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    pub(crate) fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(GateDiagError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Options shared by sweeps and sensitivity analysis.
#[derive(Debug, Clone, Default)]
pub struct SweepOptions {
    /// Cancellation token checked between trials
    pub cancel: Option<CancelToken>,
}

impl SweepOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a cancellation token.
    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub(crate) fn check(&self) -> Result<()> {
        match &self.cancel {
            Some(token) => token.check(),
            None => Ok(()),
        }
    }
}

/// One node whose value differs between a healthy and a faulty run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NodeDiff {
    pub node: NodeId,
    /// Healthy value, `None` if the healthy run never visited the node
    pub healthy: Option<Bit>,
    /// Faulty value, `None` if the faulty run never visited the node
    pub faulty: Option<Bit>,
}

/// The set of nodes whose values differ between two runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LogDiff {
    entries: Vec<NodeDiff>,
}

impl LogDiff {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, NodeDiff> {
        self.entries.iter()
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.entries.iter().any(|d| d.node == node)
    }
}

/// Compare two logs node by node.
///
/// A node visited by only one of the runs counts as differing.
pub fn diff_logs(healthy: &EvaluationLog, faulty: &EvaluationLog) -> LogDiff {
    let slots = healthy.slots().max(faulty.slots());
    let entries = (0..slots)
        .map(NodeId)
        .filter_map(|node| {
            let (h, f) = (healthy.get(node), faulty.get(node));
            (h != f).then_some(NodeDiff {
                node,
                healthy: h,
                faulty: f,
            })
        })
        .collect();
    LogDiff { entries }
}

/// Healthy and faulty runs of one input assignment.
#[derive(Debug, Clone)]
pub struct SweepComparison {
    pub assignment: InputAssignment,
    pub healthy: EvaluationLog,
    pub faulty: EvaluationLog,
    pub diff: LogDiff,
}

impl SweepComparison {
    /// Whether the fault is visible at the designated output.
    pub fn output_mismatch(&self) -> bool {
        self.healthy.output_bit() != self.faulty.output_bit()
    }
}

/// Drives an [`Evaluator`] across an input space.
#[derive(Debug, Clone)]
pub struct FaultSimulator<'c> {
    evaluator: Evaluator<'c>,
    options: SweepOptions,
}

impl<'c> FaultSimulator<'c> {
    pub fn new(circuit: &'c Circuit) -> Self {
        Self::with_options(circuit, SweepOptions::default())
    }

    pub fn with_options(circuit: &'c Circuit, options: SweepOptions) -> Self {
        Self {
            evaluator: Evaluator::new(circuit),
            options,
        }
    }

    /// Run every assignment once, with `fault` applied when given.
    pub fn sweep(&self, space: &InputSpace, fault: Option<FaultSpec>) -> Result<Vec<(InputAssignment, EvaluationLog)>> {
        debug!(assignments = space.len(), faulted = fault.is_some(), "sweep");
        space.try_map(|assignment| {
            self.options.check()?;
            let log = self.evaluator.evaluate(assignment, fault)?;
            Ok((assignment.clone(), log))
        })
    }

    /// Output bit of every assignment, with `fault` applied when given.
    ///
    /// Same order as [`sweep`](Self::sweep) without keeping assignments or
    /// logs.
    pub fn outputs(&self, space: &InputSpace, fault: Option<FaultSpec>) -> Result<Vec<Bit>> {
        space.try_map(|assignment| {
            self.options.check()?;
            self.evaluator.output(assignment, fault)
        })
    }

    /// Run every assignment healthy and faulty and diff the two logs.
    pub fn compare(&self, space: &InputSpace, fault: FaultSpec) -> Result<Vec<SweepComparison>> {
        debug!(
            assignments = space.len(),
            node = %self.evaluator.circuit().node_name(fault.node()),
            stuck = %fault.stuck(),
            "compare sweep"
        );
        space.try_map(|assignment| {
            self.options.check()?;
            self.compare_one(assignment, fault)
        })
    }

    /// The first assignment, in space order, whose faulty run differs from
    /// the healthy one anywhere in the log.
    pub fn first_mismatch(&self, space: &InputSpace, fault: FaultSpec) -> Result<Option<SweepComparison>> {
        for assignment in space {
            self.options.check()?;
            let comparison = self.compare_one(assignment, fault)?;
            if !comparison.diff.is_empty() {
                return Ok(Some(comparison));
            }
        }
        Ok(None)
    }

    fn compare_one(&self, assignment: &InputAssignment, fault: FaultSpec) -> Result<SweepComparison> {
        let healthy = self.evaluator.evaluate(assignment, None)?;
        let faulty = self.evaluator.evaluate(assignment, Some(fault))?;
        let diff = diff_logs(&healthy, &faulty);
        Ok(SweepComparison {
            assignment: assignment.clone(),
            healthy,
            faulty,
            diff,
        })
    }
}

/// Simulate every assignment of `space`, optionally under a stuck-at fault.
pub fn sweep_faults(
    circuit: &Circuit,
    space: &InputSpace,
    fault: Option<FaultSpec>,
) -> Result<Vec<(InputAssignment, EvaluationLog)>> {
    FaultSimulator::new(circuit).sweep(space, fault)
}
