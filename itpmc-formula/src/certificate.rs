//! And-inverter graphs for inductive certificates.
//!
//! Certificates use a small signed-edge AIG: node `i` is addressed by the
//! edge `i + 1`, negation is the sign, and the constant node sits at index 0
//! so that `1` is constant true and `-1` constant false. Leaves reference
//! timed problem literals. This representation is shared by the engine (which
//! collects interpolant roots into it) and the format exporters (which either
//! splice it into a host AIG or expand it to clauses).
use rustc_hash::FxHashMap;

use crate::lit::Lit;
use crate::{Clause, Clauses};

/// Edge addressing constant true.
pub const TRUE_EDGE: isize = 1;
/// Edge addressing constant false.
pub const FALSE_EDGE: isize = -1;

/// A node of a certificate AIG.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum AigerNode {
    /// Constant true, always stored at index 0.
    Constant,
    /// A leaf referencing a timed problem literal.
    Literal(Lit),
    /// A two-input and gate over signed edges.
    And(isize, isize),
}

/// An immutable certificate AIG.
#[derive(Clone, Debug, Default)]
pub struct Aiger {
    nodes: Vec<AigerNode>,
}

impl Aiger {
    pub fn nodes(&self) -> &[AigerNode] {
        &self.nodes
    }

    /// Evaluates an edge under a total assignment of the leaf literals.
    pub fn evaluate(&self, root: isize, assign: &dyn Fn(Lit) -> bool) -> bool {
        let mut values: Vec<Option<bool>> = vec![None; self.nodes.len()];
        let mut pending = vec![root.abs() as usize - 1];
        while let Some(&index) = pending.last() {
            if values[index].is_some() {
                pending.pop();
                continue;
            }
            match self.nodes[index] {
                AigerNode::Constant => {
                    values[index] = Some(true);
                    pending.pop();
                }
                AigerNode::Literal(lit) => {
                    values[index] = Some(assign(lit.to_positive()) ^ lit.is_negative());
                    pending.pop();
                }
                AigerNode::And(left, right) => {
                    let left_index = left.abs() as usize - 1;
                    let right_index = right.abs() as usize - 1;
                    match (values[left_index], values[right_index]) {
                        (Some(l), Some(r)) => {
                            values[index] = Some((l ^ (left < 0)) && (r ^ (right < 0)));
                            pending.pop();
                        }
                        (None, _) => pending.push(left_index),
                        (_, None) => pending.push(right_index),
                    }
                }
            }
        }
        values[root.abs() as usize - 1].unwrap() ^ (root < 0)
    }

    /// Expands the cone of `root` into an equivalent clause set.
    ///
    /// Used by the textual certificate exporters; applies tautology removal
    /// and subsumption so the emitted clause lists stay reasonable.
    pub fn to_clauses(&self, root: isize) -> Clauses {
        edge_to_clauses(self, root, false)
    }
}

enum Subsumption {
    None,
    /// `clause` equals `other` up to exactly one flipped literal.
    SelfAt(usize),
    /// `clause` subsumes `other`.
    Other,
}

fn subsumes(clause: &Clause, other: &Clause) -> Subsumption {
    if other.len() < clause.len() {
        return Subsumption::None;
    }

    let mut flipped = clause.len();
    'lits: for (i, &lit) in clause.iter().enumerate() {
        for &other_lit in other.iter() {
            if lit == other_lit {
                continue 'lits;
            } else if flipped == clause.len() && lit == !other_lit {
                flipped = i;
                continue 'lits;
            }
        }
        return Subsumption::None;
    }

    if flipped == clause.len() {
        Subsumption::Other
    } else if clause.len() == other.len() {
        Subsumption::SelfAt(flipped)
    } else {
        Subsumption::None
    }
}

fn simplify_clauses(mut clauses: Clauses) -> Clauses {
    if clauses.is_empty() {
        return clauses;
    }
    if clauses.iter().any(|clause| clause.is_empty()) {
        return vec![vec![]];
    }

    clauses.sort_by_key(|clause| clause.len());

    let mut i = 0;
    while i < clauses.len() {
        let mut strengthened = false;
        let mut j = clauses.len() - 1;
        while j > i {
            match subsumes(&clauses[i], &clauses[j]) {
                Subsumption::Other => {
                    clauses.remove(j);
                }
                Subsumption::SelfAt(index) => {
                    clauses.remove(j);
                    clauses[i].remove(index);
                    if clauses[i].is_empty() {
                        return vec![vec![]];
                    }
                    while i > 0 && clauses[i - 1].len() > clauses[i].len() {
                        clauses.swap(i - 1, i);
                        i -= 1;
                    }
                    strengthened = true;
                    break;
                }
                Subsumption::None => {}
            }
            j -= 1;
        }
        if !strengthened {
            i += 1;
        }
    }

    clauses
}

enum SimplifiedClause {
    Normal(Clause),
    Tautology,
    Empty,
}

fn simplify_clause(mut clause: Clause) -> SimplifiedClause {
    clause.sort_by_key(|lit| (lit.frame(), lit.index(), lit.is_negative()));
    clause.dedup();
    if clause.is_empty() {
        return SimplifiedClause::Empty;
    }

    for window in clause.windows(2) {
        if window[0] == !window[1] {
            return SimplifiedClause::Tautology;
        }
    }

    SimplifiedClause::Normal(clause)
}

fn edge_to_clauses(graph: &Aiger, edge: isize, negated: bool) -> Clauses {
    debug_assert!((edge.abs() as usize) <= graph.nodes.len());
    let negated = negated ^ (edge < 0);
    match graph.nodes[edge.abs() as usize - 1] {
        AigerNode::Constant => {
            if negated {
                vec![vec![]]
            } else {
                vec![]
            }
        }
        AigerNode::Literal(lit) => vec![vec![lit ^ negated]],
        AigerNode::And(left_edge, right_edge) => {
            let mut left = simplify_clauses(edge_to_clauses(graph, left_edge, negated));
            let right = simplify_clauses(edge_to_clauses(graph, right_edge, negated));
            if !negated {
                left.extend(right);
                simplify_clauses(left)
            } else {
                // De Morgan: the negated and is an or, so distribute.
                let mut result = Clauses::new();
                for lclause in &left {
                    let mut local = Clauses::new();
                    for rclause in &right {
                        let mut source = Clause::with_capacity(lclause.len() + rclause.len());
                        source.extend_from_slice(lclause);
                        source.extend_from_slice(rclause);
                        match simplify_clause(source) {
                            SimplifiedClause::Tautology => continue,
                            SimplifiedClause::Empty => return vec![],
                            SimplifiedClause::Normal(clause) => local.push(clause),
                        }
                    }
                    result.extend(simplify_clauses(local));
                }
                simplify_clauses(result)
            }
        }
    }
}

/// Hash-consing builder for [`Aiger`] graphs.
pub struct AigerBuilder {
    nodes: Vec<AigerNode>,
    literal_nodes: FxHashMap<Lit, isize>,
    and_nodes: FxHashMap<(isize, isize), isize>,
}

impl Default for AigerBuilder {
    fn default() -> AigerBuilder {
        AigerBuilder::new()
    }
}

impl AigerBuilder {
    pub fn new() -> AigerBuilder {
        AigerBuilder {
            nodes: vec![AigerNode::Constant],
            literal_nodes: FxHashMap::default(),
            and_nodes: FxHashMap::default(),
        }
    }

    /// Continues building on top of an existing graph.
    pub fn from_aiger(graph: &Aiger) -> AigerBuilder {
        let mut builder = AigerBuilder {
            nodes: graph.nodes().to_vec(),
            literal_nodes: FxHashMap::default(),
            and_nodes: FxHashMap::default(),
        };
        for (index, node) in builder.nodes.iter().enumerate() {
            let edge = index as isize + 1;
            match *node {
                AigerNode::Constant => {}
                AigerNode::Literal(lit) => {
                    builder.literal_nodes.insert(lit, edge);
                }
                AigerNode::And(left, right) => {
                    let key = if left < right { (left, right) } else { (right, left) };
                    builder.and_nodes.insert(key, edge);
                }
            }
        }
        builder
    }

    pub fn add_literal(&mut self, lit: Lit) -> isize {
        if let Some(&edge) = self.literal_nodes.get(&lit) {
            return edge;
        }
        if let Some(&edge) = self.literal_nodes.get(&!lit) {
            return -edge;
        }

        self.nodes.push(AigerNode::Literal(lit));
        let edge = self.nodes.len() as isize;
        self.literal_nodes.insert(lit, edge);
        edge
    }

    pub fn add_literals(&mut self, lits: &[Lit]) -> Vec<isize> {
        lits.iter().map(|&lit| self.add_literal(lit)).collect()
    }

    pub fn add_and(&mut self, left: isize, right: isize) -> isize {
        if left == FALSE_EDGE || right == FALSE_EDGE || left == -right {
            return FALSE_EDGE;
        } else if left == TRUE_EDGE && right == TRUE_EDGE {
            return TRUE_EDGE;
        } else if left == TRUE_EDGE || left == right {
            return right;
        } else if right == TRUE_EDGE {
            return left;
        }

        let key = if left < right { (left, right) } else { (right, left) };
        if let Some(&edge) = self.and_nodes.get(&key) {
            return edge;
        }

        self.nodes.push(AigerNode::And(left, right));
        let edge = self.nodes.len() as isize;
        self.and_nodes.insert(key, edge);
        edge
    }

    /// Reduces a list of edges by pairwise ands, halving per round.
    pub fn add_and_all(&mut self, mut edges: Vec<isize>) -> isize {
        if edges.is_empty() {
            return TRUE_EDGE;
        }

        while edges.len() > 1 {
            let mut index = 0;
            while index < edges.len() {
                edges[index / 2] = if index + 1 < edges.len() {
                    self.add_and(edges[index], edges[index + 1])
                } else {
                    edges[index]
                };
                index += 2;
            }
            edges.truncate((edges.len() + 1) / 2);
        }
        edges[0]
    }

    pub fn add_or(&mut self, left: isize, right: isize) -> isize {
        -self.add_and(-left, -right)
    }

    pub fn add_or_all(&mut self, mut edges: Vec<isize>) -> isize {
        for edge in edges.iter_mut() {
            *edge = -*edge;
        }
        -self.add_and_all(edges)
    }

    pub fn build(self) -> Aiger {
        Aiger { nodes: self.nodes }
    }
}

/// Classification of an unreachability certificate.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum CertificateKind {
    /// `I` itself is unsatisfiable.
    Init,
    /// `T` is unsatisfiable.
    Trans,
    /// `P` itself is unsatisfiable.
    Target,
    /// Interpolation found an inductive invariant.
    Craig,
}

/// An inductive certificate: an AIG plus root edges whose disjunction (or-ed
/// with `I`) is an invariant that excludes the target.
#[derive(Clone, Debug)]
pub struct Certificate {
    kind: CertificateKind,
    aiger: Aiger,
    roots: Vec<isize>,
}

impl Certificate {
    pub fn new(kind: CertificateKind, aiger: Aiger, roots: Vec<isize>) -> Certificate {
        Certificate { kind, aiger, roots }
    }

    /// A certificate whose invariant is a constant.
    pub fn constant(kind: CertificateKind, value: bool) -> Certificate {
        Certificate {
            kind,
            aiger: AigerBuilder::new().build(),
            roots: vec![if value { TRUE_EDGE } else { FALSE_EDGE }],
        }
    }

    pub fn kind(&self) -> CertificateKind {
        self.kind
    }

    pub fn aiger(&self) -> &Aiger {
        &self.aiger
    }

    pub fn roots(&self) -> &[isize] {
        &self.roots
    }

    /// Evaluates the disjunction of the certificate roots.
    pub fn evaluate_roots(&self, assign: &dyn Fn(Lit) -> bool) -> bool {
        self.roots
            .iter()
            .any(|&root| self.aiger.evaluate(root, assign))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lit::Lit;

    fn lit(number: isize) -> Lit {
        Lit::from_dimacs(number)
    }

    #[test]
    fn and_folding() {
        let mut builder = AigerBuilder::new();
        let a = builder.add_literal(lit(1));
        let b = builder.add_literal(lit(2));

        assert_eq!(builder.add_and(a, FALSE_EDGE), FALSE_EDGE);
        assert_eq!(builder.add_and(a, -a), FALSE_EDGE);
        assert_eq!(builder.add_and(TRUE_EDGE, TRUE_EDGE), TRUE_EDGE);
        assert_eq!(builder.add_and(TRUE_EDGE, b), b);
        assert_eq!(builder.add_and(a, a), a);
        assert_eq!(builder.add_and(b, TRUE_EDGE), b);
        assert_eq!(builder.add_and(a, b), builder.add_and(b, a));
    }

    #[test]
    fn negated_literal_reuses_node() {
        let mut builder = AigerBuilder::new();
        let a = builder.add_literal(lit(1));
        assert_eq!(builder.add_literal(lit(-1)), -a);
        assert_eq!(builder.build().nodes().len(), 2);
    }

    #[test]
    fn empty_and_is_true() {
        let mut builder = AigerBuilder::new();
        assert_eq!(builder.add_and_all(vec![]), TRUE_EDGE);
        assert_eq!(builder.add_or_all(vec![]), FALSE_EDGE);
    }

    #[test]
    fn clause_expansion_of_or() {
        // (a & b) | c  expands to  (a | c) & (b | c)
        let mut builder = AigerBuilder::new();
        let a = builder.add_literal(lit(1));
        let b = builder.add_literal(lit(2));
        let c = builder.add_literal(lit(3));
        let conj = builder.add_and(a, b);
        let root = builder.add_or(conj, c);
        let graph = builder.build();

        let clauses = graph.to_clauses(root);
        assert_eq!(clauses.len(), 2);
        for clause in &clauses {
            assert_eq!(clause.len(), 2);
            assert!(clause.contains(&lit(3)));
        }
    }

    #[test]
    fn clause_expansion_matches_evaluation() {
        // root = (a & !b) | (b & c), checked against all 8 assignments.
        let mut builder = AigerBuilder::new();
        let a = builder.add_literal(lit(1));
        let b = builder.add_literal(lit(2));
        let c = builder.add_literal(lit(3));
        let left = builder.add_and(a, -b);
        let right = builder.add_and(b, c);
        let root = builder.add_or(left, right);
        let graph = builder.build();
        let clauses = graph.to_clauses(root);

        for bits in 0..8u32 {
            let assign = |l: Lit| bits & (1 << l.index()) != 0;
            let clauses_value = clauses.iter().all(|clause| {
                clause
                    .iter()
                    .any(|&l| assign(l.to_positive()) ^ l.is_negative())
            });
            assert_eq!(clauses_value, graph.evaluate(root, &assign));
        }
    }

    #[test]
    fn constant_certificates() {
        let always = Certificate::constant(CertificateKind::Craig, true);
        let never = Certificate::constant(CertificateKind::Init, false);
        assert!(always.evaluate_roots(&|_| false));
        assert!(!never.evaluate_roots(&|_| true));
        assert_eq!(always.aiger().to_clauses(TRUE_EDGE), Vec::<Vec<Lit>>::new());
        assert_eq!(never.aiger().to_clauses(FALSE_EDGE), vec![Vec::<Lit>::new()]);
    }
}
