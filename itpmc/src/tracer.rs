//! Craig interpolant construction from resolution proofs.
//!
//! The tracer observes every clause the solver commits and maintains a
//! partial interpolant per clause in up to four and-inverter graphs, one per
//! construction base. When the solver concludes UNSAT the failed assumptions
//! are resolved into the partial interpolant of the final clause, and the
//! requested interpolant can then be emitted as CNF or exported into a
//! certificate graph.
use bitflags::bitflags;

use itpmc_formula::AigerBuilder;
use itpmc_sat::{ClauseId, Lit, ProofTracer, Var};

use crate::aig::{Aig, AigEdge, AigNode, CnfKind};
use crate::config::InterpolantKind;

bitflags! {
    /// Which interpolant bases are maintained during solving.
    pub struct Construction: u8 {
        const SYMMETRIC = 1;
        const ASYMMETRIC = 2;
        const DUAL_SYMMETRIC = 4;
        const DUAL_ASYMMETRIC = 8;
    }
}

impl Construction {
    /// The bases needed to later emit the given interpolant.
    pub fn for_interpolant(kind: InterpolantKind) -> Construction {
        match kind {
            InterpolantKind::Symmetric => Construction::SYMMETRIC,
            InterpolantKind::Asymmetric => Construction::ASYMMETRIC,
            InterpolantKind::DualSymmetric => Construction::DUAL_SYMMETRIC,
            InterpolantKind::DualAsymmetric => Construction::DUAL_ASYMMETRIC,
            InterpolantKind::Intersection
            | InterpolantKind::Union
            | InterpolantKind::Smallest
            | InterpolantKind::Largest => Construction::all(),
        }
    }
}

/// Side of a variable in the current A/B split.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum VarLabel {
    ALocal,
    BLocal,
    Global,
}

/// Side of an original clause.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum ClauseLabel {
    A,
    B,
}

/// Side of a clause including resolvents mixing both sides.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
enum ClauseSide {
    A,
    B,
    Learned,
}

/// Partial interpolant of one clause: one edge per construction base.
#[derive(Copy, Clone, Debug)]
struct CraigData {
    sym: AigEdge,
    asym: AigEdge,
    dual_sym: AigEdge,
    dual_asym: AigEdge,
    side: ClauseSide,
}

impl CraigData {
    fn trivial(side: ClauseSide) -> CraigData {
        CraigData {
            sym: AigEdge::TRUE,
            asym: AigEdge::TRUE,
            dual_sym: AigEdge::TRUE,
            dual_asym: AigEdge::TRUE,
            side,
        }
    }
}

/// Builds Craig interpolants while the solver runs.
pub struct CraigTracer {
    construction: Construction,

    var_labels: Vec<Option<VarLabel>>,
    clause_labels: Vec<Option<ClauseLabel>>,

    clauses: Vec<Vec<Lit>>,
    interpolants: Vec<CraigData>,
    final_interpolant: Option<CraigData>,

    marked: Vec<u8>,
    marked_history: Vec<usize>,

    aig_sym: Aig,
    aig_asym: Aig,
    aig_dual_sym: Aig,
    aig_dual_asym: Aig,

    /// CNF kind and clause count per base, from the last
    /// [`create_interpolant`](CraigTracer::create_interpolant) call.
    base_stats: [Option<(CnfKind, usize)>; 4],
}

impl CraigTracer {
    pub fn new(construction: Construction) -> CraigTracer {
        CraigTracer {
            construction,
            var_labels: vec![],
            clause_labels: vec![],
            clauses: vec![],
            interpolants: vec![],
            final_interpolant: None,
            marked: vec![],
            marked_history: vec![],
            aig_sym: Aig::new(),
            aig_asym: Aig::new(),
            aig_dual_sym: Aig::new(),
            aig_dual_asym: Aig::new(),
            base_stats: [None; 4],
        }
    }

    /// Labels a solver variable; must happen before the variable occurs in a
    /// committed clause.
    pub fn label_variable(&mut self, var: Var, label: VarLabel) {
        if self.var_labels.len() <= var.index() {
            self.var_labels.resize(var.index() + 1, None);
        }
        self.var_labels[var.index()] = Some(label);
    }

    /// Labels the clause with the given external number as A or B side.
    pub fn label_clause(&mut self, external: usize, label: ClauseLabel) {
        if self.clause_labels.len() <= external {
            self.clause_labels.resize(external + 1, None);
        }
        self.clause_labels[external] = Some(label);
    }

    pub fn has_interpolant(&self) -> bool {
        self.final_interpolant.is_some()
    }

    fn var_label(&self, var: Var) -> VarLabel {
        self.var_labels
            .get(var.index())
            .copied()
            .flatten()
            .expect("unlabeled variable in traced proof")
    }

    fn enabled(&self, base: Construction) -> bool {
        self.construction.contains(base)
    }

    /// Marks a literal, returning whether its complement was already marked.
    fn mark_literal(&mut self, lit: Lit) -> bool {
        let index = lit.index();
        if self.marked.len() <= index {
            self.marked.resize(index + 1, 0);
        }
        let mask = if lit.is_negative() { 2 } else { 1 };
        let was_marked = self.marked[index];
        if was_marked == 0 {
            self.marked_history.push(index);
        }
        self.marked[index] |= mask;
        was_marked & !mask != 0
    }

    fn unmark_all(&mut self) {
        for &index in &self.marked_history {
            self.marked[index] = 0;
        }
        self.marked_history.clear();
    }

    /// Base interpolants for an original clause.
    fn interpolant_for_clause(&mut self, lits: &[Lit], label: ClauseLabel) -> CraigData {
        let mut data = CraigData::trivial(match label {
            ClauseLabel::A => ClauseSide::A,
            ClauseLabel::B => ClauseSide::B,
        });

        if self.enabled(Construction::SYMMETRIC) {
            data.sym = match label {
                ClauseLabel::A => AigEdge::FALSE,
                ClauseLabel::B => AigEdge::TRUE,
            };
        }
        if self.enabled(Construction::ASYMMETRIC) {
            data.asym = match label {
                ClauseLabel::A => {
                    let filtered: Vec<Lit> = lits
                        .iter()
                        .filter(|lit| self.var_label(lit.var()) == VarLabel::Global)
                        .copied()
                        .collect();
                    let globals: Vec<AigEdge> = filtered
                        .into_iter()
                        .map(|lit| self.aig_asym.literal(lit))
                        .collect();
                    self.aig_asym.or_all(globals)
                }
                ClauseLabel::B => AigEdge::TRUE,
            };
        }
        if self.enabled(Construction::DUAL_SYMMETRIC) {
            data.dual_sym = match label {
                ClauseLabel::A => AigEdge::TRUE,
                ClauseLabel::B => AigEdge::FALSE,
            };
        }
        if self.enabled(Construction::DUAL_ASYMMETRIC) {
            data.dual_asym = match label {
                ClauseLabel::A => AigEdge::FALSE,
                ClauseLabel::B => {
                    let filtered: Vec<Lit> = lits
                        .iter()
                        .filter(|lit| self.var_label(lit.var()) == VarLabel::Global)
                        .copied()
                        .collect();
                    let globals: Vec<AigEdge> = filtered
                        .into_iter()
                        .map(|lit| self.aig_dual_asym.literal(!lit))
                        .collect();
                    self.aig_dual_asym.and_all(globals)
                }
            };
        }

        data
    }

    /// Synthetic interpolant used when resolving a failed assumption in.
    fn interpolant_for_assumption(&mut self, lit: Lit) -> CraigData {
        match self.var_label(lit.var()) {
            VarLabel::ALocal => CraigData {
                sym: AigEdge::FALSE,
                asym: AigEdge::FALSE,
                dual_sym: AigEdge::TRUE,
                dual_asym: AigEdge::FALSE,
                side: ClauseSide::A,
            },
            VarLabel::BLocal => CraigData {
                sym: AigEdge::TRUE,
                asym: AigEdge::TRUE,
                dual_sym: AigEdge::FALSE,
                dual_asym: AigEdge::TRUE,
                side: ClauseSide::B,
            },
            VarLabel::Global => CraigData {
                sym: AigEdge::TRUE,
                asym: AigEdge::TRUE,
                dual_sym: AigEdge::FALSE,
                dual_asym: AigEdge::FALSE,
                side: ClauseSide::Learned,
            },
        }
    }

    /// Resolution step on `pivot`, folding `other` into `result`.
    fn resolve(&mut self, result: &mut CraigData, pivot: Lit, other: &CraigData) {
        if result.side != other.side {
            result.side = ClauseSide::Learned;
        }
        let label = self.var_label(pivot.var());

        if self.enabled(Construction::SYMMETRIC) {
            result.sym = match label {
                VarLabel::ALocal => self.aig_sym.or(result.sym, other.sym),
                VarLabel::BLocal => self.aig_sym.and(result.sym, other.sym),
                VarLabel::Global => {
                    let positive = self.aig_sym.literal(pivot);
                    let negative = self.aig_sym.literal(!pivot);
                    let left = self.aig_sym.or(result.sym, positive);
                    let right = self.aig_sym.or(other.sym, negative);
                    self.aig_sym.and(left, right)
                }
            };
        }
        if self.enabled(Construction::ASYMMETRIC) {
            result.asym = match label {
                VarLabel::ALocal => self.aig_asym.or(result.asym, other.asym),
                _ => self.aig_asym.and(result.asym, other.asym),
            };
        }
        if self.enabled(Construction::DUAL_SYMMETRIC) {
            result.dual_sym = match label {
                VarLabel::ALocal => self.aig_dual_sym.and(result.dual_sym, other.dual_sym),
                VarLabel::BLocal => self.aig_dual_sym.or(result.dual_sym, other.dual_sym),
                VarLabel::Global => {
                    let positive = self.aig_dual_sym.literal(pivot);
                    let negative = self.aig_dual_sym.literal(!pivot);
                    let left = self.aig_dual_sym.and(result.dual_sym, negative);
                    let right = self.aig_dual_sym.and(other.dual_sym, positive);
                    self.aig_dual_sym.or(left, right)
                }
            };
        }
        if self.enabled(Construction::DUAL_ASYMMETRIC) {
            result.dual_asym = match label {
                VarLabel::BLocal => self.aig_dual_asym.and(result.dual_asym, other.dual_asym),
                _ => self.aig_dual_asym.or(result.dual_asym, other.dual_asym),
            };
        }
    }

    /// Emits the requested interpolant as CNF over solver literals.
    ///
    /// Fresh Tseitin variables start at `next_var`. For a `Normal` result the
    /// final clause is a unit carrying the interpolant root.
    pub fn create_interpolant(
        &mut self,
        kind: InterpolantKind,
        next_var: &mut usize,
    ) -> (CnfKind, Vec<Vec<Lit>>) {
        self.base_stats = [None; 4];
        let data = match self.final_interpolant {
            Some(data) => data,
            None => return (CnfKind::None, vec![]),
        };

        let wanted = Construction::for_interpolant(kind) & self.construction;

        let mut cnfs: [Option<(CnfKind, Vec<Vec<Lit>>)>; 4] = [None, None, None, None];
        if wanted.contains(Construction::SYMMETRIC) {
            cnfs[0] = Some(self.aig_sym.to_cnf(data.sym, next_var));
        }
        if wanted.contains(Construction::ASYMMETRIC) {
            cnfs[1] = Some(self.aig_asym.to_cnf(data.asym, next_var));
        }
        if wanted.contains(Construction::DUAL_SYMMETRIC) {
            cnfs[2] = Some(self.aig_dual_sym.to_cnf(data.dual_sym, next_var));
        }
        if wanted.contains(Construction::DUAL_ASYMMETRIC) {
            cnfs[3] = Some(self.aig_dual_asym.to_cnf(data.dual_asym, next_var));
        }

        // Dual interpolants represent the negation; the dual asymmetric
        // construction rules already incorporate it, so only the dual
        // symmetric CNF is flipped here.
        if let Some((kind, cnf)) = cnfs[2].take() {
            cnfs[2] = Some(match kind {
                CnfKind::Constant1 => (CnfKind::Constant0, vec![vec![]]),
                CnfKind::Constant0 => (CnfKind::Constant1, vec![]),
                CnfKind::Normal => {
                    let mut cnf = cnf;
                    let last = cnf.last_mut().unwrap();
                    last[0] = !last[0];
                    (CnfKind::Normal, cnf)
                }
                CnfKind::None => (CnfKind::None, cnf),
            });
        }

        for (index, entry) in cnfs.iter().enumerate() {
            if let Some((kind, cnf)) = entry {
                self.base_stats[index] = Some((*kind, cnf.len()));
            }
        }

        match kind {
            InterpolantKind::Symmetric => return take_base(&mut cnfs, 0),
            InterpolantKind::Asymmetric => return take_base(&mut cnfs, 1),
            InterpolantKind::DualSymmetric => return take_base(&mut cnfs, 2),
            InterpolantKind::DualAsymmetric => return take_base(&mut cnfs, 3),
            _ => {}
        }

        let mut present: Vec<(CnfKind, Vec<Vec<Lit>>)> = vec![];
        for entry in cnfs.iter_mut() {
            if let Some(part) = entry.take() {
                present.push(part);
            }
        }
        if present.is_empty() {
            return (CnfKind::None, vec![]);
        }
        if present.len() == 1 {
            return present.pop().unwrap();
        }

        match kind {
            InterpolantKind::Union => {
                // Asserted iff all parts are asserted.
                if let Some(position) = present
                    .iter()
                    .position(|(kind, _)| *kind == CnfKind::Constant0)
                {
                    return present.swap_remove(position);
                }
                if present.iter().all(|(kind, _)| *kind == CnfKind::Constant1) {
                    return (CnfKind::Constant1, vec![]);
                }

                let mut cnf = vec![];
                let mut roots = vec![];
                for (kind, part) in present {
                    if kind == CnfKind::Normal {
                        roots.push(part.last().unwrap()[0]);
                        let len = part.len();
                        cnf.extend(part.into_iter().take(len - 1));
                    }
                }
                let trigger = Var::from_index(*next_var);
                *next_var += 1;
                let mut trigger_clause = vec![trigger.lit(true)];
                for &root in &roots {
                    cnf.push(vec![trigger.lit(false), root]);
                    trigger_clause.push(!root);
                }
                cnf.push(trigger_clause);
                cnf.push(vec![trigger.lit(true)]);
                (CnfKind::Normal, cnf)
            }
            InterpolantKind::Intersection => {
                // Asserted iff any part is asserted.
                if let Some(position) = present
                    .iter()
                    .position(|(kind, _)| *kind == CnfKind::Constant1)
                {
                    return present.swap_remove(position);
                }
                if present.iter().all(|(kind, _)| *kind == CnfKind::Constant0) {
                    return (CnfKind::Constant0, vec![vec![]]);
                }

                let mut cnf = vec![];
                let mut roots = vec![];
                for (kind, part) in present {
                    if kind == CnfKind::Normal {
                        roots.push(part.last().unwrap()[0]);
                        let len = part.len();
                        cnf.extend(part.into_iter().take(len - 1));
                    }
                }
                let trigger = Var::from_index(*next_var);
                *next_var += 1;
                let mut trigger_clause = vec![trigger.lit(false)];
                for &root in &roots {
                    cnf.push(vec![trigger.lit(true), !root]);
                    trigger_clause.push(root);
                }
                cnf.push(trigger_clause);
                cnf.push(vec![trigger.lit(true)]);
                (CnfKind::Normal, cnf)
            }
            InterpolantKind::Smallest => {
                let mut best = 0;
                for index in 1..present.len() {
                    if present[index].1.len() < present[best].1.len() {
                        best = index;
                    }
                }
                present.swap_remove(best)
            }
            InterpolantKind::Largest => {
                let mut best = 0;
                for index in 1..present.len() {
                    if present[index].1.len() > present[best].1.len() {
                        best = index;
                    }
                }
                present.swap_remove(best)
            }
            _ => unreachable!(),
        }
    }

    /// Exports the interpolant selected by the last
    /// [`create_interpolant`](CraigTracer::create_interpolant) call as a
    /// certificate sub-graph, mapping leaf variables through `map`.
    pub fn export_root(
        &self,
        kind: InterpolantKind,
        builder: &mut AigerBuilder,
        map: &mut dyn FnMut(Var) -> itpmc_formula::Lit,
    ) -> isize {
        let data = self
            .final_interpolant
            .as_ref()
            .expect("no interpolant to export");

        let base_edge = |index: usize, builder: &mut AigerBuilder, map: &mut dyn FnMut(Var) -> itpmc_formula::Lit| -> isize {
            match index {
                0 => export_edge(&self.aig_sym, data.sym, builder, map),
                1 => export_edge(&self.aig_asym, data.asym, builder, map),
                2 => -export_edge(&self.aig_dual_sym, data.dual_sym, builder, map),
                3 => export_edge(&self.aig_dual_asym, data.dual_asym, builder, map),
                _ => unreachable!(),
            }
        };

        match kind {
            InterpolantKind::Symmetric => base_edge(0, &mut *builder, &mut *map),
            InterpolantKind::Asymmetric => base_edge(1, &mut *builder, &mut *map),
            InterpolantKind::DualSymmetric => base_edge(2, &mut *builder, &mut *map),
            InterpolantKind::DualAsymmetric => base_edge(3, &mut *builder, &mut *map),
            InterpolantKind::Intersection | InterpolantKind::Union => {
                let mut edges = vec![];
                for index in 0..4 {
                    if self.base_stats[index].is_some() {
                        edges.push(base_edge(index, &mut *builder, &mut *map));
                    }
                }
                if kind == InterpolantKind::Intersection {
                    builder.add_or_all(edges)
                } else {
                    builder.add_and_all(edges)
                }
            }
            InterpolantKind::Smallest | InterpolantKind::Largest => {
                let mut best: Option<(usize, usize)> = None;
                for index in 0..4 {
                    if let Some((_, len)) = self.base_stats[index] {
                        let better = match best {
                            None => true,
                            Some((_, best_len)) => {
                                if kind == InterpolantKind::Smallest {
                                    len < best_len
                                } else {
                                    len > best_len
                                }
                            }
                        };
                        if better {
                            best = Some((index, len));
                        }
                    }
                }
                let (index, _) = best.expect("export before interpolant creation");
                base_edge(index, &mut *builder, &mut *map)
            }
        }
    }
}

fn take_base(
    cnfs: &mut [Option<(CnfKind, Vec<Vec<Lit>>)>; 4],
    index: usize,
) -> (CnfKind, Vec<Vec<Lit>>) {
    cnfs[index].take().unwrap_or((CnfKind::None, vec![]))
}

/// Translates the cone of `edge` into the certificate builder.
fn export_edge(
    aig: &Aig,
    edge: AigEdge,
    builder: &mut AigerBuilder,
    map: &mut dyn FnMut(Var) -> itpmc_formula::Lit,
) -> isize {
    use itpmc_formula::certificate::{FALSE_EDGE, TRUE_EDGE};

    fn node_edge(
        aig: &Aig,
        edge: AigEdge,
        builder: &mut AigerBuilder,
        map: &mut dyn FnMut(Var) -> itpmc_formula::Lit,
        memo: &mut rustc_hash::FxHashMap<AigEdge, isize>,
    ) -> isize {
        if edge == AigEdge::TRUE {
            return TRUE_EDGE;
        }
        if edge == AigEdge::FALSE {
            return FALSE_EDGE;
        }
        let positive = if edge.is_negated() { !edge } else { edge };
        if let Some(&mapped) = memo.get(&positive) {
            return if edge.is_negated() { -mapped } else { mapped };
        }
        let mapped = match *aig.node(positive) {
            AigNode::Var(var) => builder.add_literal(map(var)),
            AigNode::And(left, right) => {
                let left = node_edge(aig, left, builder, map, memo);
                let right = node_edge(aig, right, builder, map, memo);
                builder.add_and(left, right)
            }
        };
        memo.insert(positive, mapped);
        if edge.is_negated() {
            -mapped
        } else {
            mapped
        }
    }

    let mut memo = rustc_hash::FxHashMap::default();
    node_edge(aig, edge, builder, map, &mut memo)
}

impl ProofTracer for CraigTracer {
    fn clause(&mut self, id: ClauseId, external: Option<usize>, lits: &[Lit], antecedents: &[ClauseId]) {
        debug_assert_eq!(id, self.clauses.len());

        if self.construction.is_empty() {
            self.clauses.push(vec![]);
            self.interpolants.push(CraigData::trivial(ClauseSide::A));
            return;
        }

        let data = if let Some(external) = external {
            let label = self
                .clause_labels
                .get(external)
                .copied()
                .flatten()
                .expect("unlabeled original clause in traced proof");
            self.interpolant_for_clause(lits, label)
        } else {
            assert!(!antecedents.is_empty(), "learned clause without antecedents");

            let first = antecedents[0];
            for position in 0..self.clauses[first].len() {
                let lit = self.clauses[first][position];
                self.mark_literal(lit);
            }

            let mut data = self.interpolants[first];
            for &antecedent in &antecedents[1..] {
                for position in 0..self.clauses[antecedent].len() {
                    let lit = self.clauses[antecedent][position];
                    if self.mark_literal(lit) {
                        let other = self.interpolants[antecedent];
                        self.resolve(&mut data, !lit, &other);
                    }
                }
            }
            self.unmark_all();
            data
        };

        self.clauses.push(lits.to_vec());
        self.interpolants.push(data);
    }

    fn conclude_unsat(&mut self, failed: &[Lit], final_clause: Option<ClauseId>) {
        if self.construction.is_empty() {
            return;
        }

        let data = match final_clause {
            Some(id) => {
                let mut data = self.interpolants[id];
                for &assumption in failed {
                    let other = self.interpolant_for_assumption(assumption);
                    self.resolve(&mut data, !assumption, &other);
                }
                data
            }
            None => {
                // Two directly contradictory assumptions; no clauses at all
                // were involved in the conflict.
                assert_eq!(failed.len(), 2, "assumption-only conflict needs two literals");
                let mut data = self.interpolant_for_assumption(!failed[0]);
                let other = self.interpolant_for_assumption(!failed[1]);
                self.resolve(&mut data, failed[1], &other);
                data
            }
        };

        self.final_interpolant = Some(data);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lit(number: isize) -> Lit {
        Lit::from_index(number.abs() as usize - 1, number > 0)
    }

    /// A = (a) ∧ (¬a ∨ g), B = (¬g): every base interpolant is `g`.
    fn traced_example() -> CraigTracer {
        let mut tracer = CraigTracer::new(Construction::all());
        tracer.label_variable(Var::from_index(0), VarLabel::ALocal); // a
        tracer.label_variable(Var::from_index(1), VarLabel::Global); // g
        tracer.label_clause(0, ClauseLabel::A);
        tracer.label_clause(1, ClauseLabel::A);
        tracer.label_clause(2, ClauseLabel::B);

        tracer.clause(0, Some(0), &[lit(1)], &[]);
        tracer.clause(1, Some(1), &[lit(-1), lit(2)], &[]);
        tracer.clause(2, Some(2), &[lit(-2)], &[]);
        // Resolve (¬g) with (¬a ∨ g) on g, then with (a) on a.
        tracer.clause(3, None, &[], &[2, 1, 0]);
        tracer.conclude_unsat(&[], Some(3));
        tracer
    }

    #[test]
    fn all_bases_yield_the_shared_variable() {
        for &kind in &[
            InterpolantKind::Symmetric,
            InterpolantKind::Asymmetric,
            InterpolantKind::DualSymmetric,
            InterpolantKind::DualAsymmetric,
            InterpolantKind::Smallest,
            InterpolantKind::Largest,
        ] {
            let mut tracer = traced_example();
            let mut next_var = 2;
            let (cnf_kind, cnf) = tracer.create_interpolant(kind, &mut next_var);
            assert_eq!(cnf_kind, CnfKind::Normal, "{:?}", kind);
            assert_eq!(cnf, vec![vec![lit(2)]], "{:?}", kind);
        }
    }

    #[test]
    fn composite_interpolants_are_gated() {
        for &kind in &[InterpolantKind::Union, InterpolantKind::Intersection] {
            let mut tracer = traced_example();
            let mut next_var = 2;
            let (cnf_kind, cnf) = tracer.create_interpolant(kind, &mut next_var);
            assert_eq!(cnf_kind, CnfKind::Normal);
            // Four gating clauses, the trigger definition and the final unit.
            assert_eq!(cnf.len(), 6);
            let root = cnf.last().unwrap()[0];
            assert_eq!(root.index(), 2);
            assert!(root.is_positive());
            assert_eq!(next_var, 3);
        }
    }

    #[test]
    fn export_matches_cnf_semantics() {
        let mut tracer = traced_example();
        let mut next_var = 2;
        tracer.create_interpolant(InterpolantKind::Smallest, &mut next_var);

        let mut builder = AigerBuilder::new();
        let mut map = |var: Var| itpmc_formula::Lit::from_index(var.index(), true);
        let root = tracer.export_root(InterpolantKind::Smallest, &mut builder, &mut map);
        let graph = builder.build();

        // The interpolant is exactly `g`.
        assert!(graph.evaluate(root, &|l| l.index() == 1));
        assert!(!graph.evaluate(root, &|_| false));
    }

    #[test]
    fn labels_propagate_to_resolvents() {
        let mut tracer = CraigTracer::new(Construction::SYMMETRIC);
        tracer.label_variable(Var::from_index(0), VarLabel::ALocal);
        tracer.label_variable(Var::from_index(1), VarLabel::BLocal);
        tracer.label_clause(0, ClauseLabel::A);
        tracer.label_clause(1, ClauseLabel::A);
        tracer.clause(0, Some(0), &[lit(1), lit(2)], &[]);
        tracer.clause(1, Some(1), &[lit(-1), lit(2)], &[]);
        // A + A resolvent stays on the A side.
        tracer.clause(2, None, &[lit(2)], &[0, 1]);
        assert_eq!(tracer.interpolants[2].side, ClauseSide::A);
    }

    #[test]
    fn assumption_only_conflict() {
        let mut tracer = CraigTracer::new(Construction::all());
        tracer.label_variable(Var::from_index(0), VarLabel::Global);
        tracer.conclude_unsat(&[lit(1), lit(-1)], None);
        assert!(tracer.has_interpolant());
        // Resolving two global assumption interpolants gives the tautology.
        let mut next_var = 1;
        let (kind, cnf) = tracer.create_interpolant(InterpolantKind::Symmetric, &mut next_var);
        assert_eq!(kind, CnfKind::Constant1);
        assert_eq!(cnf, Vec::<Vec<Lit>>::new());
    }
}
