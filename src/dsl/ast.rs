//! Abstract Syntax Tree types for the netlist DSL.

use crate::circuit::NodeDef;

/// Complete AST representation of a parsed netlist.
#[derive(Debug, Clone, Default)]
pub struct NetlistAst {
    /// Node definitions in source order (inputs from `.input` included)
    pub nodes: Vec<NodeDef>,
    /// Output node name from `.output`, if given
    pub output: Option<String>,
    /// Source line of each entry in `nodes`
    pub lines: Vec<usize>,
}

impl NetlistAst {
    /// Create a new empty netlist AST.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, def: NodeDef, line: usize) {
        self.nodes.push(def);
        self.lines.push(line);
    }

    /// Source line on which `name` was defined.
    pub fn line_of(&self, name: &str) -> Option<usize> {
        self.nodes
            .iter()
            .position(|n| n.name == name)
            .and_then(|idx| self.lines.get(idx).copied())
    }
}
