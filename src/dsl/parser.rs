//! Parser for the netlist DSL.

use super::ast::NetlistAst;
use super::lexer::{Lexer, Token, TokenKind};
use crate::circuit::{Bit, GateKind, NodeDef};
use crate::diagnosis::Observation;
use crate::error::{GateDiagError, Result};
use crate::sim::InputAssignment;

/// Parser for netlists, input assignments and observations.
pub struct Parser<'a> {
    lexer: Lexer<'a>,
    current: Token,
}

impl<'a> Parser<'a> {
    /// Create a new parser with the given lexer.
    pub fn new(mut lexer: Lexer<'a>) -> Result<Self> {
        let current = lexer.next_token()?;
        Ok(Self { lexer, current })
    }

    /// Parse the entire netlist.
    pub fn parse(&mut self) -> Result<NetlistAst> {
        let mut ast = NetlistAst::new();

        while self.current.kind != TokenKind::Eof {
            match self.current.kind {
                TokenKind::Newline => {
                    self.advance()?;
                    continue;
                }
                TokenKind::Directive => self.parse_directive(&mut ast)?,
                TokenKind::Identifier => self.parse_gate(&mut ast)?,
                _ => {
                    return Err(GateDiagError::parse(
                        self.current.line,
                        format!("unexpected token: {:?}", self.current.text),
                    ));
                }
            }
            self.end_of_statement()?;
        }

        Ok(ast)
    }

    /// Parse `name=bit[,name=bit...]` up to end of input.
    pub fn parse_assignment(&mut self) -> Result<InputAssignment> {
        let assignment = self.assignment_body()?;
        self.expect_end()?;
        Ok(assignment)
    }

    /// Parse `name=bit[,name=bit...]:bit` up to end of input.
    pub fn parse_observation(&mut self) -> Result<Observation> {
        let assignment = self.assignment_body()?;
        self.expect(TokenKind::Colon)?;
        let observed = self.bit()?;
        self.expect_end()?;
        Ok(Observation::new(assignment, observed))
    }

    fn advance(&mut self) -> Result<()> {
        self.current = self.lexer.next_token()?;
        Ok(())
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Token> {
        if self.current.kind == kind {
            let tok = self.current.clone();
            self.advance()?;
            Ok(tok)
        } else {
            Err(GateDiagError::parse(
                self.current.line,
                format!("expected {:?}, got {:?}", kind, self.current.kind),
            ))
        }
    }

    fn end_of_statement(&mut self) -> Result<()> {
        match self.current.kind {
            TokenKind::Newline => self.advance(),
            TokenKind::Eof => Ok(()),
            _ => Err(GateDiagError::parse(
                self.current.line,
                format!("unexpected trailing token: {:?}", self.current.text),
            )),
        }
    }

    fn expect_end(&mut self) -> Result<()> {
        while self.current.kind == TokenKind::Newline {
            self.advance()?;
        }
        self.expect(TokenKind::Eof).map(|_| ())
    }

    fn parse_directive(&mut self, ast: &mut NetlistAst) -> Result<()> {
        let directive = self.current.text.clone();
        let line = self.current.line;
        self.advance()?;

        match directive.to_lowercase().as_str() {
            ".input" | ".inputs" => {
                let first = self.expect(TokenKind::Identifier)?;
                ast.push(NodeDef::input(first.text), line);
                while self.current.kind == TokenKind::Identifier || self.current.kind == TokenKind::Comma {
                    if self.current.kind == TokenKind::Identifier {
                        ast.push(NodeDef::input(self.current.text.clone()), line);
                    }
                    self.advance()?;
                }
            }
            ".output" => {
                let node = self.expect(TokenKind::Identifier)?;
                if let Some(previous) = &ast.output {
                    return Err(GateDiagError::parse(
                        line,
                        format!("output already set to '{}'", previous),
                    ));
                }
                ast.output = Some(node.text);
            }
            _ => {
                return Err(GateDiagError::parse(
                    line,
                    format!("unknown directive: {}", directive),
                ));
            }
        }

        Ok(())
    }

    /// `NAME = KIND(IN1, IN2, ...)`
    fn parse_gate(&mut self, ast: &mut NetlistAst) -> Result<()> {
        let name = self.expect(TokenKind::Identifier)?;
        let line = name.line;
        self.expect(TokenKind::Equals)?;

        let keyword = self.expect(TokenKind::Identifier)?;
        let kind = GateKind::from_keyword(&keyword.text).ok_or_else(|| {
            GateDiagError::parse(line, format!("unknown gate kind '{}' for node '{}'", keyword.text, name.text))
        })?;

        self.expect(TokenKind::OpenParen)?;
        let mut inputs = Vec::new();
        while self.current.kind != TokenKind::CloseParen {
            inputs.push(self.expect(TokenKind::Identifier)?.text);
            if self.current.kind == TokenKind::Comma {
                self.advance()?;
            } else if self.current.kind != TokenKind::CloseParen {
                return Err(GateDiagError::parse(
                    line,
                    format!("expected ',' or ')' in fan-in of '{}'", name.text),
                ));
            }
        }
        self.expect(TokenKind::CloseParen)?;

        ast.push(
            NodeDef {
                name: name.text,
                kind,
                inputs,
            },
            line,
        );
        Ok(())
    }

    fn assignment_body(&mut self) -> Result<InputAssignment> {
        let mut assignment = InputAssignment::new();
        loop {
            let name = self.expect(TokenKind::Identifier)?;
            self.expect(TokenKind::Equals)?;
            let bit = self.bit()?;
            if assignment.set(name.text.clone(), bit).is_some() {
                return Err(GateDiagError::parse(
                    name.line,
                    format!("input '{}' assigned twice", name.text),
                ));
            }
            if self.current.kind == TokenKind::Comma {
                self.advance()?;
            } else {
                return Ok(assignment);
            }
        }
    }

    fn bit(&mut self) -> Result<Bit> {
        let tok = self.expect(TokenKind::Number)?;
        tok.text
            .parse::<Bit>()
            .map_err(|message| GateDiagError::parse(tok.line, message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsl;

    const REFERENCE: &str = "\
# reference circuit
.input A B
.output Z

X = AND(A, B)
Y = NOT(A)   ; inverter
Z = OR(X, Y)
";

    #[test]
    fn test_parse_reference() {
        let ast = dsl::parse(REFERENCE).unwrap();
        assert_eq!(ast.output.as_deref(), Some("Z"));
        let names: Vec<&str> = ast.nodes.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, vec!["A", "B", "X", "Y", "Z"]);
        assert_eq!(ast.nodes[2], NodeDef::gate("X", GateKind::And, ["A", "B"]));
        assert_eq!(ast.line_of("Y"), Some(6));
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            dsl::parse("X = XOR(A, B)"),
            Err(GateDiagError::ParseError { line: 1, .. })
        ));
        assert!(dsl::parse(".output Z\n.output Y").is_err());
        assert!(dsl::parse("X = AND(A B)").is_err());
        assert!(dsl::parse(".clock clk").is_err());
        assert!(dsl::parse("X = NOT(A) extra").is_err());
    }

    #[test]
    fn test_parse_assignment() {
        let assignment = dsl::parse_assignment("A=1, B=0").unwrap();
        assert_eq!(assignment.get("A"), Some(Bit::One));
        assert_eq!(assignment.get("B"), Some(Bit::Zero));
        assert!(dsl::parse_assignment("A=2").is_err());
        assert!(dsl::parse_assignment("A=1,A=0").is_err());
    }

    #[test]
    fn test_parse_observation() {
        let observation = dsl::parse_observation("A=1,B=1:0").unwrap();
        assert_eq!(observation.observed, Bit::Zero);
        assert_eq!(observation.assignment.len(), 2);
        assert!(dsl::parse_observation("A=1,B=1").is_err());
    }
}
