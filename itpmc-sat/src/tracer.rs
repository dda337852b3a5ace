//! Proof delivery to interpolation engines.
use crate::lit::Lit;

/// Identifier of a clause committed to the solver.
///
/// Ids are indices into the solver's append-only clause store and are never
/// recycled; a learned clause always has a larger id than every antecedent it
/// was derived from.
pub type ClauseId = usize;

/// Observes every clause the solver commits.
///
/// For original clauses `antecedents` is empty and `external` carries the
/// 0-based position among the clauses added by the caller. For learned
/// clauses `antecedents` is a linear resolution chain: the conflicting clause
/// first, followed by reason clauses in resolution order. Resolving the chain
/// left to right, on every literal of an antecedent whose complement occurs
/// in the partial resolvent, yields exactly `lits`.
pub trait ProofTracer {
    fn clause(&mut self, id: ClauseId, external: Option<usize>, lits: &[Lit], antecedents: &[ClauseId]);

    /// Called once per UNSAT result, after the last [`clause`](Self::clause)
    /// delivery.
    ///
    /// `failed` is the subset of assumptions responsible for the conflict (in
    /// the polarity they were assumed). `final_clause` is the clause whose
    /// literals are exactly the negated failed assumptions — the empty clause
    /// when the formula is unsatisfiable without assumptions. It is `None`
    /// only when two directly contradictory assumptions were passed, in which
    /// case no resolution took place at all.
    fn conclude_unsat(&mut self, failed: &[Lit], final_clause: Option<ClauseId>);
}

/// A tracer that ignores everything, used when no proof is needed.
#[derive(Default)]
pub struct NoopTracer;

impl ProofTracer for NoopTracer {
    fn clause(&mut self, _id: ClauseId, _external: Option<usize>, _lits: &[Lit], _antecedents: &[ClauseId]) {}

    fn conclude_unsat(&mut self, _failed: &[Lit], _final_clause: Option<ClauseId>) {}
}
