//! Hash-consed and-inverter graph for interpolant construction.
//!
//! Nodes live in an index-addressable arena; an edge packs a node index with
//! an inversion bit. The zero edge is constant true and edge one constant
//! false, so node `i` is addressed by the edges `2 * (i + 1)` and
//! `2 * (i + 1) + 1`. Leaves reference solver variables: the interpolants
//! built here live in the solver's variable space until the adapter maps
//! them back to timed problem literals.
use std::fmt;
use std::ops;

use rustc_hash::FxHashMap;

use itpmc_sat::{Lit, Var};

/// An edge of the [`Aig`]: node index plus inversion bit.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AigEdge {
    index: usize,
}

impl AigEdge {
    /// Constant true.
    pub const TRUE: AigEdge = AigEdge { index: 0 };
    /// Constant false.
    pub const FALSE: AigEdge = AigEdge { index: 1 };

    pub fn is_negated(self) -> bool {
        self.index & 1 != 0
    }

    pub fn is_constant(self) -> bool {
        self.index >> 1 == 0
    }

    fn node_index(self) -> usize {
        (self.index >> 1) - 1
    }

    fn from_node_index(index: usize) -> AigEdge {
        AigEdge {
            index: (index + 1) << 1,
        }
    }
}

impl ops::Not for AigEdge {
    type Output = AigEdge;

    fn not(self) -> AigEdge {
        AigEdge {
            index: self.index ^ 1,
        }
    }
}

impl fmt::Debug for AigEdge {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if *self == AigEdge::TRUE {
            write!(f, "true")
        } else if *self == AigEdge::FALSE {
            write!(f, "false")
        } else {
            write!(
                f,
                "{}n{}",
                if self.is_negated() { "!" } else { "" },
                self.node_index()
            )
        }
    }
}

/// A node: a variable leaf or a two-input and gate.
#[derive(Copy, Clone, Debug)]
pub enum AigNode {
    Var(Var),
    And(AigEdge, AigEdge),
}

/// Classification of a CNF produced by [`Aig::to_cnf`].
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum CnfKind {
    /// No CNF was built at all.
    None,
    /// The formula is constant false; the CNF is a single empty clause.
    Constant0,
    /// The formula is constant true; the CNF is empty.
    Constant1,
    /// The CNF ends with a unit clause carrying the root Tseitin literal.
    Normal,
}

/// The arena with its two hash-consing tables.
#[derive(Default)]
pub struct Aig {
    nodes: Vec<AigNode>,
    var_nodes: FxHashMap<Var, AigEdge>,
    and_nodes: FxHashMap<(AigEdge, AigEdge), AigEdge>,
}

impl Aig {
    pub fn new() -> Aig {
        Aig::default()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn node(&self, edge: AigEdge) -> &AigNode {
        &self.nodes[edge.node_index()]
    }

    /// Returns the edge for a solver literal, creating the leaf on demand.
    pub fn literal(&mut self, lit: Lit) -> AigEdge {
        let edge = match self.var_nodes.get(&lit.var()) {
            Some(&edge) => edge,
            None => {
                self.nodes.push(AigNode::Var(lit.var()));
                let edge = AigEdge::from_node_index(self.nodes.len() - 1);
                self.var_nodes.insert(lit.var(), edge);
                edge
            }
        };
        if lit.is_negative() {
            !edge
        } else {
            edge
        }
    }

    pub fn and(&mut self, edge1: AigEdge, edge2: AigEdge) -> AigEdge {
        if edge1 == AigEdge::FALSE || edge2 == AigEdge::FALSE {
            return AigEdge::FALSE;
        }
        if edge1 == !edge2 {
            return AigEdge::FALSE;
        }
        if edge1 == AigEdge::TRUE && edge2 == AigEdge::TRUE {
            return AigEdge::TRUE;
        }
        if edge1 == AigEdge::TRUE || edge1 == edge2 {
            return edge2;
        }
        if edge2 == AigEdge::TRUE {
            return edge1;
        }

        // Order the operands to increase the hash hit rate.
        let key = if edge1 > edge2 {
            (edge2, edge1)
        } else {
            (edge1, edge2)
        };
        if let Some(&edge) = self.and_nodes.get(&key) {
            return edge;
        }

        self.nodes.push(AigNode::And(key.0, key.1));
        let edge = AigEdge::from_node_index(self.nodes.len() - 1);
        self.and_nodes.insert(key, edge);
        edge
    }

    /// Reduces a list of edges by pairwise ands, halving per round.
    pub fn and_all(&mut self, mut edges: Vec<AigEdge>) -> AigEdge {
        if edges.is_empty() {
            return AigEdge::TRUE;
        }

        while edges.len() > 1 {
            let mut index = 0;
            while index < edges.len() {
                edges[index / 2] = if index + 1 < edges.len() {
                    self.and(edges[index], edges[index + 1])
                } else {
                    edges[index]
                };
                index += 2;
            }
            edges.truncate((edges.len() + 1) / 2);
        }
        edges[0]
    }

    pub fn or(&mut self, edge1: AigEdge, edge2: AigEdge) -> AigEdge {
        !self.and(!edge1, !edge2)
    }

    pub fn or_all(&mut self, mut edges: Vec<AigEdge>) -> AigEdge {
        for edge in edges.iter_mut() {
            *edge = !*edge;
        }
        !self.and_all(edges)
    }

    /// Tseitin converts the cone of `root` into a CNF over solver literals.
    ///
    /// Fresh Tseitin variables are taken contiguously from `next_var`. For a
    /// `Normal` result the final clause is a unit carrying the (possibly
    /// negated) root literal.
    pub fn to_cnf(&self, root: AigEdge, next_var: &mut usize) -> (CnfKind, Vec<Vec<Lit>>) {
        if root.is_constant() {
            if root == AigEdge::FALSE {
                return (CnfKind::Constant0, vec![vec![]]);
            }
            return (CnfKind::Constant1, vec![]);
        }

        // A single leaf needs no Tseitin variables.
        if let AigNode::Var(var) = self.nodes[root.node_index()] {
            return (
                CnfKind::Normal,
                vec![vec![var.lit(!root.is_negated())]],
            );
        }

        let mut cnf = vec![];
        let mut node_var: Vec<Option<Var>> = self
            .nodes
            .iter()
            .map(|node| match node {
                AigNode::Var(var) => Some(*var),
                AigNode::And(..) => None,
            })
            .collect();

        let mut pending = vec![root.node_index()];
        while let Some(&index) = pending.last() {
            if node_var[index].is_some() {
                pending.pop();
                continue;
            }
            let (edge1, edge2) = match self.nodes[index] {
                AigNode::And(edge1, edge2) => (edge1, edge2),
                AigNode::Var(..) => unreachable!("leaves are seeded into the index"),
            };
            let index1 = edge1.node_index();
            let index2 = edge2.node_index();
            if node_var[index1].is_none() {
                pending.push(index1);
                continue;
            }
            if node_var[index2].is_none() {
                pending.push(index2);
                continue;
            }
            pending.pop();

            let gate = Var::from_index(*next_var);
            *next_var += 1;
            node_var[index] = Some(gate);

            let lit1 = node_var[index1].unwrap().lit(!edge1.is_negated());
            let lit2 = node_var[index2].unwrap().lit(!edge2.is_negated());
            // t = a & b  <->  (!t | a) & (!t | b) & (t | !a | !b)
            cnf.push(vec![gate.lit(false), lit1]);
            cnf.push(vec![gate.lit(false), lit2]);
            cnf.push(vec![gate.lit(true), !lit1, !lit2]);
        }

        let root_var = node_var[root.node_index()].unwrap();
        cnf.push(vec![root_var.lit(!root.is_negated())]);
        (CnfKind::Normal, cnf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lit(number: isize) -> Lit {
        Lit::from_index(number.abs() as usize - 1, number > 0)
    }

    #[test]
    fn constant_folding_rules() {
        let mut aig = Aig::new();
        let a = aig.literal(lit(1));
        let b = aig.literal(lit(2));

        assert_eq!(aig.and(a, AigEdge::FALSE), AigEdge::FALSE);
        assert_eq!(aig.and(a, !a), AigEdge::FALSE);
        assert_eq!(aig.and(AigEdge::TRUE, AigEdge::TRUE), AigEdge::TRUE);
        assert_eq!(aig.and(AigEdge::TRUE, b), b);
        assert_eq!(aig.and(a, a), a);
        assert_eq!(aig.and(b, AigEdge::TRUE), b);
    }

    #[test]
    fn and_is_commutative_by_identity() {
        let mut aig = Aig::new();
        let a = aig.literal(lit(1));
        let b = aig.literal(lit(2));
        assert_eq!(aig.and(a, b), aig.and(b, a));
        assert_eq!(aig.node_count(), 3);
    }

    #[test]
    fn negated_literal_shares_node() {
        let mut aig = Aig::new();
        let a = aig.literal(lit(1));
        assert_eq!(aig.literal(lit(-1)), !a);
        assert_eq!(aig.node_count(), 1);
    }

    #[test]
    fn empty_lists_are_constants() {
        let mut aig = Aig::new();
        assert_eq!(aig.and_all(vec![]), AigEdge::TRUE);
        assert_eq!(aig.or_all(vec![]), AigEdge::FALSE);
    }

    #[test]
    fn cnf_of_constants() {
        let aig = Aig::new();
        let mut next_var = 10;
        assert_eq!(
            aig.to_cnf(AigEdge::TRUE, &mut next_var),
            (CnfKind::Constant1, vec![])
        );
        assert_eq!(
            aig.to_cnf(AigEdge::FALSE, &mut next_var),
            (CnfKind::Constant0, vec![vec![]])
        );
        assert_eq!(next_var, 10);
    }

    #[test]
    fn cnf_of_single_literal() {
        let mut aig = Aig::new();
        let a = aig.literal(lit(-3));
        let mut next_var = 10;
        let (kind, cnf) = aig.to_cnf(a, &mut next_var);
        assert_eq!(kind, CnfKind::Normal);
        assert_eq!(cnf, vec![vec![lit(-3)]]);
        assert_eq!(next_var, 10);
    }

    fn eval_cnf(cnf: &[Vec<Lit>], bits: u32) -> bool {
        cnf.iter().all(|clause| {
            clause
                .iter()
                .any(|lit| (bits & (1 << lit.index()) != 0) ^ lit.is_negative())
        })
    }

    mod random {
        use super::*;

        use proptest::prelude::*;

        /// A random expression tree over three leaf variables.
        #[derive(Clone, Debug)]
        enum Expr {
            Leaf(isize),
            And(Box<Expr>, Box<Expr>),
            Or(Box<Expr>, Box<Expr>),
            Not(Box<Expr>),
        }

        fn expr() -> impl Strategy<Value = Expr> {
            let leaf = prop_oneof![
                (1isize..=3).prop_map(Expr::Leaf),
                (1isize..=3).prop_map(|n| Expr::Leaf(-n)),
            ];
            leaf.prop_recursive(4, 24, 2, |inner| {
                prop_oneof![
                    (inner.clone(), inner.clone())
                        .prop_map(|(a, b)| Expr::And(Box::new(a), Box::new(b))),
                    (inner.clone(), inner.clone())
                        .prop_map(|(a, b)| Expr::Or(Box::new(a), Box::new(b))),
                    inner.prop_map(|a| Expr::Not(Box::new(a))),
                ]
            })
        }

        fn build(aig: &mut Aig, expr: &Expr) -> AigEdge {
            match expr {
                Expr::Leaf(n) => aig.literal(lit(*n)),
                Expr::And(a, b) => {
                    let a = build(aig, a);
                    let b = build(aig, b);
                    aig.and(a, b)
                }
                Expr::Or(a, b) => {
                    let a = build(aig, a);
                    let b = build(aig, b);
                    aig.or(a, b)
                }
                Expr::Not(a) => !build(aig, a),
            }
        }

        fn eval(expr: &Expr, bits: u32) -> bool {
            match expr {
                Expr::Leaf(n) => {
                    (bits & (1 << (n.abs() as usize - 1)) != 0) ^ (*n < 0)
                }
                Expr::And(a, b) => eval(a, bits) && eval(b, bits),
                Expr::Or(a, b) => eval(a, bits) || eval(b, bits),
                Expr::Not(a) => !eval(a, bits),
            }
        }

        proptest! {
            #[test]
            fn cnf_is_equisatisfiable_with_expression(expr in expr()) {
                let mut aig = Aig::new();
                let root = build(&mut aig, &expr);

                let mut next_var = 3;
                let (_, cnf) = aig.to_cnf(root, &mut next_var);
                let tseitin_count = next_var - 3;
                prop_assume!(tseitin_count <= 12);

                for bits in 0..8u32 {
                    let satisfiable = (0..1u32 << tseitin_count)
                        .any(|extra| eval_cnf(&cnf, bits | (extra << 3)));
                    prop_assert_eq!(satisfiable, eval(&expr, bits));
                }
            }
        }
    }

    #[test]
    fn tseitin_is_equisatisfiable() {
        // root = (x1 & !x2) | x3, over variables 0..3 with Tseitin vars
        // starting at index 3.
        let mut aig = Aig::new();
        let x1 = aig.literal(lit(1));
        let x2 = aig.literal(lit(2));
        let x3 = aig.literal(lit(3));
        let gate = aig.and(x1, !x2);
        let root = aig.or(gate, x3);

        let mut next_var = 3;
        let (kind, cnf) = aig.to_cnf(root, &mut next_var);
        assert_eq!(kind, CnfKind::Normal);
        // The last clause is the root unit over a fresh variable.
        assert_eq!(cnf.last().unwrap().len(), 1);
        assert!(cnf.last().unwrap()[0].index() >= 3);

        let tseitin_count = next_var - 3;
        for bits in 0..8u32 {
            let expected = (bits & 1 != 0) && (bits & 2 == 0) || (bits & 4 != 0);
            let satisfiable = (0..1u32 << tseitin_count)
                .any(|extra| eval_cnf(&cnf, bits | (extra << 3)));
            assert_eq!(satisfiable, expected, "assignment {:03b}", bits);
        }
    }
}
