//! The AIGER format, binary (`aig`) and ASCII (`aag`).
//!
//! An AIGER circuit has inputs, latches (with reset values), two-input and
//! gates, and optional outputs, bad-state properties and invariant
//! constraints. Conversion to a [`BmcProblem`] allocates one variable per
//! node; and gates are Tseitin encoded into the sections that use them, with
//! fresh copies for the initial-state and target cones so auxiliary
//! variables never cross sections.
use std::io;

use thiserror::Error;

use itpmc_formula::{Assignment, BmcModel, BmcProblem, Certificate, Clause, Clauses, Lit};

/// An AIGER literal: two times the node index, low bit for inversion.
pub type AigEdge = usize;

/// Possible errors while reading or building an AIGER problem.
#[derive(Debug, Error)]
pub enum AigerError {
    #[error("io error in AIGER data: {0}")]
    Io(#[from] io::Error),
    #[error("invalid AIGER header \"{text}\"")]
    BadHeader { text: String },
    #[error("could not parse AIGER line \"{text}\"")]
    BadLine { text: String },
    #[error("unexpected end of AIGER data")]
    UnexpectedEof,
    #[error("justice and fairness properties are not supported")]
    Unsupported,
    #[error("node literal {edge} is out of range")]
    EdgeOutOfRange { edge: AigEdge },
    #[error("node {node} was defined twice")]
    DuplicateNode { node: AigEdge },
    #[error("node {node} is used but never defined")]
    UndefinedNode { node: AigEdge },
    #[error("expected at least one bad state property or output, got neither")]
    NoProperty,
}

/// Role of an AIGER node.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum AigNodeKind {
    Constant,
    Input,
    Latch,
    And,
}

/// A single AIGER node.
///
/// For latches `left` is the next-state edge and `right` the reset edge; for
/// and gates they are the operand edges.
#[derive(Copy, Clone, Debug)]
pub struct AigNode {
    pub kind: AigNodeKind,
    pub node: AigEdge,
    pub left: AigEdge,
    pub right: AigEdge,
}

/// A structurally checked AIGER problem with a dense node table.
#[derive(Clone, Debug)]
pub struct AigProblem {
    nodes: Vec<AigNode>,
    inputs: Vec<AigEdge>,
    latches: Vec<AigEdge>,
    outputs: Vec<AigEdge>,
    bads: Vec<AigEdge>,
    constraints: Vec<AigEdge>,
}

impl AigProblem {
    /// Nodes indexed by node id divided by two.
    pub fn nodes(&self) -> &[AigNode] {
        &self.nodes
    }

    pub fn inputs(&self) -> &[AigEdge] {
        &self.inputs
    }

    pub fn latches(&self) -> &[AigEdge] {
        &self.latches
    }

    pub fn outputs(&self) -> &[AigEdge] {
        &self.outputs
    }

    pub fn bads(&self) -> &[AigEdge] {
        &self.bads
    }

    pub fn constraints(&self) -> &[AigEdge] {
        &self.constraints
    }
}

/// Builder validating and assembling AIGER problems.
pub struct AigProblemBuilder {
    nodes: Vec<AigNode>,
    inputs: Vec<AigEdge>,
    latches: Vec<AigEdge>,
    outputs: Vec<AigEdge>,
    bads: Vec<AigEdge>,
    constraints: Vec<AigEdge>,
}

impl Default for AigProblemBuilder {
    fn default() -> AigProblemBuilder {
        AigProblemBuilder::new()
    }
}

impl AigProblemBuilder {
    pub fn new() -> AigProblemBuilder {
        AigProblemBuilder {
            nodes: vec![AigNode {
                kind: AigNodeKind::Constant,
                node: 0,
                left: 0,
                right: 0,
            }],
            inputs: vec![],
            latches: vec![],
            outputs: vec![],
            bads: vec![],
            constraints: vec![],
        }
    }

    pub fn add_input(&mut self, input: AigEdge) {
        self.nodes.push(AigNode {
            kind: AigNodeKind::Input,
            node: input,
            left: 0,
            right: 0,
        });
        self.inputs.push(input);
    }

    pub fn add_latch(&mut self, latch: AigEdge, next: AigEdge, reset: AigEdge) {
        self.nodes.push(AigNode {
            kind: AigNodeKind::Latch,
            node: latch,
            left: next,
            right: reset,
        });
        self.latches.push(latch);
    }

    pub fn add_and(&mut self, node: AigEdge, left: AigEdge, right: AigEdge) {
        self.nodes.push(AigNode {
            kind: AigNodeKind::And,
            node,
            left,
            right,
        });
    }

    pub fn add_output(&mut self, edge: AigEdge) {
        self.outputs.push(edge);
    }

    pub fn add_bad(&mut self, edge: AigEdge) {
        self.bads.push(edge);
    }

    pub fn add_constraint(&mut self, edge: AigEdge) {
        self.constraints.push(edge);
    }

    /// Validates node ids and edge ranges and produces the dense node table.
    fn checked_nodes(&self) -> Result<Vec<AigNode>, AigerError> {
        if self.bads.is_empty() && self.outputs.is_empty() {
            return Err(AigerError::NoProperty);
        }

        let count = self.nodes.len();
        let limit = 2 * count;
        let mut dense: Vec<Option<AigNode>> = vec![None; count];
        for &node in &self.nodes {
            if node.node % 2 != 0 || node.node >= limit {
                return Err(AigerError::EdgeOutOfRange { edge: node.node });
            }
            let index = node.node / 2;
            if dense[index].is_some() {
                return Err(AigerError::DuplicateNode { node: node.node });
            }
            if matches!(node.kind, AigNodeKind::Latch | AigNodeKind::And) {
                for &edge in &[node.left, node.right] {
                    if edge >= limit {
                        return Err(AigerError::EdgeOutOfRange { edge });
                    }
                }
            }
            dense[index] = Some(node);
        }

        for &edge in self
            .outputs
            .iter()
            .chain(self.bads.iter())
            .chain(self.constraints.iter())
        {
            if edge >= limit {
                return Err(AigerError::EdgeOutOfRange { edge });
            }
        }

        dense
            .into_iter()
            .enumerate()
            .map(|(index, node)| node.ok_or(AigerError::UndefinedNode { node: 2 * index }))
            .collect()
    }

    /// Builds the problem and its clause-level counterpart.
    pub fn build(self) -> Result<(AigProblem, BmcProblem), AigerError> {
        let nodes = self.checked_nodes()?;
        let mut var_count = nodes.len();

        // Bad states fall back to the old output-based property encoding.
        let bads = if self.bads.is_empty() {
            self.outputs.clone()
        } else {
            self.bads.clone()
        };

        let latch_indices: Vec<usize> = self.latches.iter().map(|&edge| edge / 2).collect();

        // The constant node is variable 0 and is forced false in every
        // section (the sections share it, which protects it from
        // preprocessing).
        let false_clause = vec![Lit::from_index(0, false)];

        let mut init_clauses: Clauses = vec![false_clause.clone()];
        {
            let starts: Vec<AigEdge> = latch_indices
                .iter()
                .map(|&index| nodes[index].right)
                .collect();
            let encoding = ConeEncoding::encode(&nodes, true, &mut var_count, &starts, &mut init_clauses);
            for &index in &latch_indices {
                let latch = Lit::from_index(index, true);
                let reset = encoding.edge_lit(nodes[index].right);
                init_clauses.push(vec![!reset, latch]);
                init_clauses.push(vec![reset, !latch]);
            }
        }

        let mut trans_clauses: Clauses = vec![false_clause.clone()];
        {
            let mut starts: Vec<AigEdge> = self.outputs.clone();
            starts.extend(latch_indices.iter().map(|&index| nodes[index].left));
            starts.extend(self.constraints.iter().copied());
            let encoding =
                ConeEncoding::encode(&nodes, false, &mut var_count, &starts, &mut trans_clauses);
            for &index in &latch_indices {
                let next = encoding.edge_lit(nodes[index].left);
                let latch_next = Lit::from_index(index, true).at(1);
                trans_clauses.push(vec![!next, latch_next]);
                trans_clauses.push(vec![next, !latch_next]);
            }
            for &constraint in &self.constraints {
                trans_clauses.push(vec![encoding.edge_lit(constraint)]);
            }
        }

        let mut target_clauses: Clauses = vec![false_clause];
        {
            let mut starts: Vec<AigEdge> = bads.clone();
            starts.extend(self.constraints.iter().copied());
            let encoding =
                ConeEncoding::encode(&nodes, true, &mut var_count, &starts, &mut target_clauses);
            let bad_clause: Clause = bads.iter().map(|&edge| encoding.edge_lit(edge)).collect();
            target_clauses.push(bad_clause);
            for &constraint in &self.constraints {
                target_clauses.push(vec![encoding.edge_lit(constraint)]);
            }
        }

        let problem = AigProblem {
            nodes,
            inputs: self.inputs,
            latches: self.latches,
            outputs: self.outputs,
            bads: self.bads,
            constraints: self.constraints,
        };
        let bmc = BmcProblem::new(var_count, init_clauses, trans_clauses, target_clauses);
        Ok((problem, bmc))
    }
}

/// Per-section variable assignment for the cone encoding.
struct ConeEncoding {
    var_of: Vec<usize>,
}

impl ConeEncoding {
    /// Tseitin encodes the and cones reachable from `starts`.
    ///
    /// With `fresh` set, and gates get new variables (initial and target
    /// cones); otherwise the gate's own node variable is used (transition
    /// cone). Inputs, latches and the constant always keep their node
    /// variable.
    fn encode(
        nodes: &[AigNode],
        fresh: bool,
        next_var: &mut usize,
        starts: &[AigEdge],
        clauses: &mut Clauses,
    ) -> ConeEncoding {
        let mut encoding = ConeEncoding {
            var_of: (0..nodes.len()).collect(),
        };
        let mut done: Vec<bool> = nodes
            .iter()
            .map(|node| node.kind != AigNodeKind::And)
            .collect();

        let mut stack: Vec<usize> = starts.iter().map(|&edge| edge / 2).collect();
        while let Some(&index) = stack.last() {
            if done[index] {
                stack.pop();
                continue;
            }
            let left = nodes[index].left;
            let right = nodes[index].right;
            if !done[left / 2] {
                stack.push(left / 2);
                continue;
            }
            if !done[right / 2] {
                stack.push(right / 2);
                continue;
            }
            stack.pop();

            if fresh {
                encoding.var_of[index] = *next_var;
                *next_var += 1;
            }
            let gate = Lit::from_index(encoding.var_of[index], true);
            let left_lit = encoding.edge_lit(left);
            let right_lit = encoding.edge_lit(right);
            clauses.push(vec![!gate, left_lit]);
            clauses.push(vec![!gate, right_lit]);
            clauses.push(vec![gate, !left_lit, !right_lit]);
            done[index] = true;
        }

        encoding
    }

    fn edge_lit(&self, edge: AigEdge) -> Lit {
        Lit::from_index(self.var_of[edge / 2], edge & 1 == 0)
    }
}

struct Scanner<'a> {
    data: &'a [u8],
}

impl<'a> Scanner<'a> {
    fn line(&mut self) -> Result<&'a str, AigerError> {
        if self.data.is_empty() {
            return Err(AigerError::UnexpectedEof);
        }
        let end = self
            .data
            .iter()
            .position(|&byte| byte == b'\n')
            .unwrap_or(self.data.len());
        let (line, rest) = self.data.split_at(end);
        self.data = if rest.is_empty() { rest } else { &rest[1..] };
        std::str::from_utf8(line)
            .map(|line| line.trim_end_matches('\r'))
            .map_err(|_| AigerError::BadHeader {
                text: String::from_utf8_lossy(line).into_owned(),
            })
    }
}

fn parse_numbers(line: &str) -> Result<Vec<usize>, AigerError> {
    line.split_whitespace()
        .map(|token| {
            token.parse().map_err(|_| AigerError::BadLine {
                text: line.to_owned(),
            })
        })
        .collect()
}

/// Reads an AIGER problem in binary or ASCII form.
pub fn parse_aiger_problem(mut input: impl io::Read) -> Result<(AigProblem, BmcProblem), AigerError> {
    let mut data = vec![];
    input.read_to_end(&mut data)?;
    let mut scanner = Scanner { data: &data };

    let header = scanner.line()?.to_owned();
    let mut tokens = header.split_whitespace();
    let magic = tokens.next().unwrap_or("");
    let binary = match magic {
        "aig" => true,
        "aag" => false,
        _ => return Err(AigerError::BadHeader { text: header }),
    };
    let counts: Vec<usize> = tokens
        .map(|token| {
            token
                .parse()
                .map_err(|_| AigerError::BadHeader { text: header.clone() })
        })
        .collect::<Result<_, _>>()?;
    if counts.len() < 5 || counts.len() > 9 {
        return Err(AigerError::BadHeader { text: header });
    }
    let (_max_var, input_count, latch_count, output_count, and_count) =
        (counts[0], counts[1], counts[2], counts[3], counts[4]);
    let bad_count = counts.get(5).copied().unwrap_or(0);
    let constraint_count = counts.get(6).copied().unwrap_or(0);
    if counts.get(7).copied().unwrap_or(0) != 0 || counts.get(8).copied().unwrap_or(0) != 0 {
        return Err(AigerError::Unsupported);
    }

    let mut builder = AigProblemBuilder::new();

    let bad_line = |line: &str| AigerError::BadLine {
        text: line.to_owned(),
    };

    if binary {
        for index in 0..input_count {
            builder.add_input(2 * (index + 1));
        }
        for index in 0..latch_count {
            let latch = 2 * (input_count + index + 1);
            let line = scanner.line()?;
            match parse_numbers(line)?[..] {
                [next] => builder.add_latch(latch, next, 0),
                [next, reset] => builder.add_latch(latch, next, reset),
                _ => return Err(bad_line(line)),
            }
        }
    } else {
        for _ in 0..input_count {
            let line = scanner.line()?;
            match parse_numbers(line)?[..] {
                [input] => builder.add_input(input),
                _ => return Err(bad_line(line)),
            }
        }
        for _ in 0..latch_count {
            let line = scanner.line()?;
            match parse_numbers(line)?[..] {
                [latch, next] => builder.add_latch(latch, next, 0),
                [latch, next, reset] => builder.add_latch(latch, next, reset),
                _ => return Err(bad_line(line)),
            }
        }
    }

    for _ in 0..output_count {
        let line = scanner.line()?;
        match parse_numbers(line)?[..] {
            [output] => builder.add_output(output),
            _ => return Err(bad_line(line)),
        }
    }
    for _ in 0..bad_count {
        let line = scanner.line()?;
        match parse_numbers(line)?[..] {
            [bad] => builder.add_bad(bad),
            _ => return Err(bad_line(line)),
        }
    }
    for _ in 0..constraint_count {
        let line = scanner.line()?;
        match parse_numbers(line)?[..] {
            [constraint] => builder.add_constraint(constraint),
            _ => return Err(bad_line(line)),
        }
    }

    if binary {
        let mut rest = scanner.data;
        for index in 0..and_count {
            let node = 2 * (input_count + latch_count + index + 1);
            let delta0 =
                leb128::read::unsigned(&mut rest).map_err(|_| AigerError::UnexpectedEof)? as usize;
            let delta1 =
                leb128::read::unsigned(&mut rest).map_err(|_| AigerError::UnexpectedEof)? as usize;
            let right = node
                .checked_sub(delta0)
                .ok_or(AigerError::EdgeOutOfRange { edge: node })?;
            let left = right
                .checked_sub(delta1)
                .ok_or(AigerError::EdgeOutOfRange { edge: right })?;
            builder.add_and(node, right, left);
        }
    } else {
        for _ in 0..and_count {
            let line = scanner.line()?;
            match parse_numbers(line)?[..] {
                [node, left, right] => builder.add_and(node, left, right),
                _ => return Err(bad_line(line)),
            }
        }
    }

    builder.build()
}

/// Writes an AIGER problem in ASCII form.
pub fn write_aiger_problem(target: &mut impl io::Write, problem: &AigProblem) -> io::Result<()> {
    let and_nodes: Vec<&AigNode> = problem
        .nodes
        .iter()
        .filter(|node| node.kind == AigNodeKind::And)
        .collect();

    write!(
        target,
        "aag {} {} {} {} {}",
        problem.nodes.len() - 1,
        problem.inputs.len(),
        problem.latches.len(),
        problem.outputs.len(),
        and_nodes.len(),
    )?;
    if !problem.bads.is_empty() || !problem.constraints.is_empty() {
        write!(
            target,
            " {} {}",
            problem.bads.len(),
            problem.constraints.len()
        )?;
    }
    writeln!(target)?;

    for &input in &problem.inputs {
        writeln!(target, "{}", input)?;
    }
    for &latch in &problem.latches {
        let node = problem.nodes[latch / 2];
        if node.right == 0 {
            writeln!(target, "{} {}", latch, node.left)?;
        } else {
            writeln!(target, "{} {} {}", latch, node.left, node.right)?;
        }
    }
    for &output in &problem.outputs {
        writeln!(target, "{}", output)?;
    }
    for &bad in &problem.bads {
        writeln!(target, "{}", bad)?;
    }
    for &constraint in &problem.constraints {
        writeln!(target, "{}", constraint)?;
    }
    for node in and_nodes {
        writeln!(target, "{} {} {}", node.node, node.left, node.right)?;
    }
    Ok(())
}

/// Writes an AIGER witness: the satisfied properties, latch values, then one
/// input line per frame.
pub fn write_aiger_model(
    target: &mut impl io::Write,
    problem: &AigProblem,
    model: &BmcModel,
) -> io::Result<()> {
    let symbol = |assignment: Assignment| match assignment {
        Assignment::Negative => '0',
        Assignment::Positive => '1',
        Assignment::DontCare => 'x',
    };

    writeln!(target, "1")?;
    // Old output-based property encodings fall back to the outputs, like the
    // problem conversion does.
    let bads = if problem.bads.is_empty() {
        &problem.outputs
    } else {
        &problem.bads
    };
    for (index, &bad) in bads.iter().enumerate() {
        let lit = Lit::from_index(bad / 2, true);
        let satisfied = (0..model.timeframes().len()).any(|frame| {
            model.assignment(lit.at(frame as i32)) ^ (bad & 1 == 1) == Assignment::Positive
        });
        if satisfied {
            writeln!(target, "b{}", index)?;
        }
    }
    for &latch in &problem.latches {
        let lit = Lit::from_index(latch / 2, true);
        write!(target, "{}", symbol(model.assignment(lit)))?;
    }
    writeln!(target)?;
    for frame in 0..model.timeframes().len() {
        for &input in &problem.inputs {
            let lit = Lit::from_index(input / 2, true).at(frame as i32);
            write!(target, "{}", symbol(model.assignment(lit)))?;
        }
        writeln!(target)?;
    }
    writeln!(target, ".")
}

/// Circuit under extension while splicing a certificate in.
struct CertCircuit {
    nodes: Vec<AigNode>,
}

impl CertCircuit {
    fn and(&mut self, left: AigEdge, right: AigEdge) -> AigEdge {
        if left == 0 || right == 0 || left == right ^ 1 {
            return 0;
        } else if left == 1 && right == 1 {
            return 1;
        } else if left == 1 || left == right {
            return right;
        } else if right == 1 {
            return left;
        }
        let node = 2 * self.nodes.len();
        self.nodes.push(AigNode {
            kind: AigNodeKind::And,
            node,
            left,
            right,
        });
        node
    }

    fn or(&mut self, left: AigEdge, right: AigEdge) -> AigEdge {
        self.and(left ^ 1, right ^ 1) ^ 1
    }
}

/// Re-emits the circuit with a single output encoding the negated invariant.
pub fn write_aiger_certificate(
    target: &mut impl io::Write,
    problem: &AigProblem,
    certificate: &Certificate,
) -> Result<(), AigerError> {
    use itpmc_formula::AigerNode;

    let mut circuit = CertCircuit {
        nodes: problem.nodes.clone(),
    };

    // Encode the initial state: each latch equals its reset value.
    let mut initial_state = 1;
    for &latch in &problem.latches {
        let reset = problem.nodes[latch / 2].right;
        let part = if reset <= 1 {
            // Constant reset: the latch itself or its negation.
            latch ^ (reset ^ 1)
        } else if reset == latch {
            // Uninitialised latch, no initial constraint.
            continue;
        } else {
            let both_set = circuit.and(latch, reset);
            let both_clear = circuit.and(latch ^ 1, reset ^ 1);
            circuit.or(both_set, both_clear)
        };
        initial_state = circuit.and(initial_state, part);
    }

    // Splice the certificate graph in, mapping its leaves to circuit nodes.
    let mut mapped: Vec<AigEdge> = vec![];
    let to_edge = |mapped: &[AigEdge], edge: isize| -> AigEdge {
        mapped[edge.abs() as usize - 1] ^ if edge < 0 { 1 } else { 0 }
    };
    for node in certificate.aiger().nodes() {
        let edge = match *node {
            AigerNode::Constant => 1,
            AigerNode::Literal(lit) => lit.index() * 2 + lit.is_negative() as usize,
            AigerNode::And(left, right) => {
                let left = to_edge(&mapped, left);
                let right = to_edge(&mapped, right);
                circuit.and(left, right)
            }
        };
        mapped.push(edge);
    }

    // The output is the negated invariant, i.e. neither inside the initial
    // states nor inside any interpolant.
    let mut output = initial_state ^ 1;
    for &root in certificate.roots() {
        let mapped_root = to_edge(&mapped, root);
        output = circuit.and(output, mapped_root ^ 1);
    }

    let result = AigProblem {
        nodes: circuit.nodes,
        inputs: problem.inputs.clone(),
        latches: problem.latches.clone(),
        outputs: vec![output],
        bads: vec![],
        constraints: problem.constraints.clone(),
    };
    write_aiger_problem(target, &result)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lit(index: usize, polarity: bool, frame: i32) -> Lit {
        Lit::from_index(index, polarity).at(frame)
    }

    // A toggling latch: node 2 is the latch, next state is its negation.
    const TOGGLE: &str = "aag 1 0 1 0 0 1\n2 3 0\n2\n";

    #[test]
    fn parses_toggle_latch() {
        let (problem, bmc) = parse_aiger_problem(TOGGLE.as_bytes()).unwrap();
        assert_eq!(problem.latches(), &[2]);
        assert_eq!(problem.bads(), &[2]);
        assert_eq!(bmc.var_count(), 2);

        // INIT: constant false, latch starts at its reset value 0.
        assert_eq!(
            bmc.init(),
            &vec![
                vec![lit(0, false, 0)],
                vec![lit(0, false, 0), lit(1, true, 0)],
                vec![lit(0, true, 0), lit(1, false, 0)],
            ]
        );
        // TRANS: latch' is the negation of latch.
        assert_eq!(
            bmc.trans(),
            &vec![
                vec![lit(0, false, 0)],
                vec![lit(1, true, 0), lit(1, true, 1)],
                vec![lit(1, false, 0), lit(1, false, 1)],
            ]
        );
        // TARGET: the latch is set.
        assert_eq!(
            bmc.target(),
            &vec![vec![lit(0, false, 0)], vec![lit(1, true, 0)]]
        );
    }

    #[test]
    fn parses_binary_and_gate() {
        // aig: 1 input, 1 latch, 1 output, 1 and. Latch 4 feeds back the and
        // of itself and input 2; and node 6 = 4 & 2 (deltas 2, 2).
        let mut data = b"aig 3 1 1 1 1\n6\n7\n".to_vec();
        data.extend_from_slice(&[2, 2]);
        let (problem, _) = parse_aiger_problem(&data[..]).unwrap();
        assert_eq!(problem.inputs(), &[2]);
        assert_eq!(problem.latches(), &[4]);
        assert_eq!(problem.outputs(), &[7]);
        let and = problem.nodes()[3];
        assert_eq!(and.kind, AigNodeKind::And);
        assert_eq!((and.node, and.left, and.right), (6, 4, 2));
    }

    #[test]
    fn ascii_roundtrip() {
        let text = "aag 3 1 1 0 1 1 0\n2\n4 6 1\n6\n6 4 2\n";
        let (problem, _) = parse_aiger_problem(text.as_bytes()).unwrap();
        let mut buffer = vec![];
        write_aiger_problem(&mut buffer, &problem).unwrap();
        let (reparsed, _) = parse_aiger_problem(&buffer[..]).unwrap();
        assert_eq!(reparsed.inputs(), problem.inputs());
        assert_eq!(reparsed.latches(), problem.latches());
        assert_eq!(reparsed.bads(), problem.bads());
        assert_eq!(reparsed.nodes().len(), problem.nodes().len());
    }

    #[test]
    fn rejects_undefined_node() {
        // The and gate references node 8 which does not exist.
        let text = "aag 4 1 0 1 1\n2\n4\n4 8 2\n";
        match parse_aiger_problem(text.as_bytes()) {
            Err(AigerError::UndefinedNode { .. }) | Err(AigerError::EdgeOutOfRange { .. }) => (),
            other => panic!("unexpected result {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn target_cone_uses_fresh_variables() {
        // Bad state is an and over the latch and an input; the gate variable
        // must be copied for the target section so it does not alias the
        // transition cone's variable.
        let text = "aag 3 1 1 0 1 1 0\n2\n4 4 0\n6\n6 4 2\n";
        let (_, bmc) = parse_aiger_problem(text.as_bytes()).unwrap();
        // Nodes 0..=3 are primary variables; the target copy is variable 4.
        assert_eq!(bmc.var_count(), 5);
        let uses_copy = bmc
            .target()
            .iter()
            .any(|clause| clause.iter().any(|lit| lit.index() == 4));
        assert!(uses_copy);
        let trans_uses_primary = bmc
            .trans()
            .iter()
            .any(|clause| clause.iter().any(|lit| lit.index() == 3));
        assert!(!trans_uses_primary);
    }

    #[test]
    fn witness_names_satisfied_properties() {
        // The toggling latch with two bad states: the latch and its
        // negation. Counting from the reset state satisfies both, in
        // different frames.
        let text = "aag 1 0 1 0 0 2\n2 3 0\n2\n3\n";
        let (problem, _) = parse_aiger_problem(text.as_bytes()).unwrap();
        let model = BmcModel::new(vec![
            vec![Assignment::Negative, Assignment::Negative],
            vec![Assignment::Negative, Assignment::Positive],
        ]);

        let mut buffer = vec![];
        write_aiger_model(&mut buffer, &problem, &model).unwrap();
        assert_eq!(
            String::from_utf8(buffer).unwrap(),
            "1\nb0\nb1\n0\n\n\n.\n"
        );
    }

    #[test]
    fn certificate_single_output() {
        let (problem, _) = parse_aiger_problem(TOGGLE.as_bytes()).unwrap();
        let certificate = Certificate::constant(itpmc_formula::CertificateKind::Craig, false);
        let mut buffer = vec![];
        write_aiger_certificate(&mut buffer, &problem, &certificate).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        let header: Vec<&str> = text.lines().next().unwrap().split_whitespace().collect();
        assert_eq!(header[0], "aag");
        // Exactly one output, no bads.
        assert_eq!(header[4], "1");
    }
}
