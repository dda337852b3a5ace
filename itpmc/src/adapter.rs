//! Adapter between timed problem literals and the backend solver.
//!
//! Keeps the two-way variable mapping, labels variables and clauses for the
//! proof tracer, gates clause batches on trigger literals and converts
//! extracted interpolants back into timed clauses.
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use log::trace;
use rustc_hash::FxHashMap;

use itpmc_formula::{AigerBuilder, Assignment, Clause, Clauses, Frame, Lit as BmcLit};
use itpmc_sat::{Lit as SatLit, Solver, Var as SatVar};

use crate::aig::CnfKind;
use crate::config::InterpolantKind;
use crate::tracer::{ClauseLabel, Construction, CraigTracer, VarLabel};

/// A problem variable replicated at a timeframe.
///
/// Every distinct `(variable, timeframe)` pair maps to its own solver
/// variable.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct TimedVar {
    pub index: usize,
    pub frame: Frame,
}

impl TimedVar {
    pub fn from_lit(lit: BmcLit) -> TimedVar {
        TimedVar {
            index: lit.index(),
            frame: lit.frame(),
        }
    }

    pub fn lit(self, negated: bool) -> BmcLit {
        BmcLit::from_index(self.index, !negated).at(self.frame)
    }
}

/// Role of a solver variable against the current A/B split.
///
/// Protected roles mark variables that preprocessing must not eliminate;
/// for interpolation they label like their local counterparts.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum VarRole {
    Normal,
    Global,
    ALocal,
    BLocal,
    AProtected,
    BProtected,
}

impl VarRole {
    fn label(self) -> VarLabel {
        match self {
            VarRole::Global => VarLabel::Global,
            VarRole::BLocal | VarRole::BProtected => VarLabel::BLocal,
            VarRole::Normal | VarRole::ALocal | VarRole::AProtected => VarLabel::ALocal,
        }
    }
}

/// Side label attached to added clauses.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum SideLabel {
    /// Not part of an A/B split (fixed-point instances).
    Normal,
    A,
    B,
}

/// A backend solver instance together with its variable maps and tracer.
pub struct InterpolatingSolver {
    solver: Solver<CraigTracer>,
    forward: FxHashMap<TimedVar, SatVar>,
    backward: Vec<TimedVar>,
    clause_counter: usize,
}

impl InterpolatingSolver {
    /// Creates a solver; with `enable` unset no interpolants are built.
    pub fn new(kind: InterpolantKind, enable: bool) -> InterpolatingSolver {
        let construction = if enable {
            Construction::for_interpolant(kind)
        } else {
            Construction::empty()
        };
        InterpolatingSolver {
            solver: Solver::with_tracer(CraigTracer::new(construction)),
            forward: FxHashMap::default(),
            backward: vec![],
            clause_counter: 0,
        }
    }

    /// Shares the engine's interrupt flag with the backend solver.
    pub fn set_terminate(&mut self, flag: Arc<AtomicBool>) {
        self.solver.set_terminate_handle(flag);
    }

    /// Allocates and labels the solver variable for a timed variable.
    pub fn create_variable(&mut self, var: TimedVar, role: VarRole) -> SatVar {
        debug_assert!(!self.forward.contains_key(&var));
        let sat = self.solver.new_var();
        self.solver.tracer_mut().label_variable(sat, role.label());
        self.forward.insert(var, sat);
        debug_assert_eq!(self.backward.len(), sat.index());
        self.backward.push(var);
        trace!("variable {:?} <=> solver {:?} as {:?}", var, sat, role);
        sat
    }

    fn lit_forward(&mut self, lit: BmcLit, role: &mut dyn FnMut(TimedVar) -> VarRole) -> SatLit {
        let var = TimedVar::from_lit(lit);
        let sat = match self.forward.get(&var) {
            Some(&sat) => sat,
            None => {
                let role = role(var);
                self.create_variable(var, role)
            }
        };
        sat.lit(lit.is_positive())
    }

    fn lit_forward_existing(&self, lit: BmcLit) -> Option<SatLit> {
        self.forward
            .get(&TimedVar::from_lit(lit))
            .map(|&sat| sat.lit(lit.is_positive()))
    }

    fn lit_backward(&self, lit: SatLit) -> BmcLit {
        self.backward[lit.index()].lit(lit.is_negative())
    }

    fn label_next_clause(&mut self, side: SideLabel) {
        let external = self.clause_counter;
        self.clause_counter += 1;
        match side {
            SideLabel::A => self.solver.tracer_mut().label_clause(external, ClauseLabel::A),
            SideLabel::B => self.solver.tracer_mut().label_clause(external, ClauseLabel::B),
            SideLabel::Normal => {}
        }
    }

    /// Makes sure a trigger variable exists with the given role.
    pub fn add_trigger(&mut self, trigger: BmcLit, role: VarRole) {
        let var = TimedVar::from_lit(trigger);
        if !self.forward.contains_key(&var) {
            self.create_variable(var, role);
        }
    }

    /// Adds clauses, shifted by `shift` and optionally gated on a trigger.
    ///
    /// A gated clause becomes `(!trigger | lits...)`. The `role` callback
    /// decides the role of every newly met timed variable.
    pub fn add_clauses(
        &mut self,
        trigger: Option<BmcLit>,
        clauses: &[Clause],
        shift: Frame,
        side: SideLabel,
        role: &mut dyn FnMut(TimedVar) -> VarRole,
    ) {
        for clause in clauses {
            let mut solver_clause = Vec::with_capacity(clause.len() + trigger.is_some() as usize);
            if let Some(trigger) = trigger {
                solver_clause.push(self.lit_forward(!trigger, role));
            }
            for &lit in clause {
                solver_clause.push(self.lit_forward(lit.shift(shift), role));
            }
            self.label_next_clause(side);
            self.solver.add_clause(&solver_clause);
        }
    }

    /// Emits the unit `(!trigger)`, making the gated clauses inert for good.
    pub fn disable_trigger(&mut self, trigger: BmcLit, side: SideLabel) {
        let lit = self
            .lit_forward_existing(!trigger)
            .expect("disabling a trigger that was never added");
        self.label_next_clause(side);
        self.solver.add_clause(&[lit]);
    }

    /// Solves under assumptions; `None` means interrupted.
    ///
    /// Assumptions must be over already-mapped variables.
    pub fn solve(&mut self, assumptions: &[BmcLit]) -> Option<bool> {
        let mapped: Vec<SatLit> = assumptions
            .iter()
            .map(|&lit| {
                self.lit_forward_existing(lit)
                    .expect("assumption introduced a new variable")
            })
            .collect();
        self.solver.solve(&mapped)
    }

    /// Three-valued readout of a literal after a satisfiable solve.
    pub fn value(&self, lit: BmcLit, shift: Frame) -> Assignment {
        match self.lit_forward_existing(lit.shift(shift)) {
            None => Assignment::DontCare,
            Some(sat) => match self.solver.value(sat) {
                None => Assignment::DontCare,
                Some(true) => Assignment::Positive,
                Some(false) => Assignment::Negative,
            },
        }
    }

    /// Extracts the Craig interpolant of the last UNSAT solve as timed
    /// clauses plus its root literal.
    ///
    /// Tseitin variables of the conversion are materialised as fresh solver
    /// variables and mapped to fresh timed variables obtained from `alloc`.
    pub fn craig_interpolant(
        &mut self,
        kind: InterpolantKind,
        mut alloc: impl FnMut() -> TimedVar,
    ) -> (Clauses, BmcLit) {
        let mut next_var = self.solver.var_count();
        let (cnf_kind, mut cnf) = self
            .solver
            .tracer_mut()
            .create_interpolant(kind, &mut next_var);

        let root = match cnf_kind {
            CnfKind::Normal => {
                let unit = cnf.pop().unwrap();
                unit[0]
            }
            CnfKind::Constant0 | CnfKind::Constant1 => {
                let root = SatVar::from_index(next_var);
                next_var += 1;
                cnf = vec![vec![root.lit(cnf_kind == CnfKind::Constant1)]];
                root.lit(true)
            }
            CnfKind::None => panic!("no craig interpolant available"),
        };

        while self.solver.var_count() < next_var {
            let sat = self.solver.new_var();
            self.solver.tracer_mut().label_variable(sat, VarLabel::ALocal);
            let var = alloc();
            self.forward.insert(var, sat);
            self.backward.push(var);
        }

        let clauses: Clauses = cnf
            .iter()
            .map(|clause| clause.iter().map(|&lit| self.lit_backward(lit)).collect())
            .collect();
        (clauses, self.lit_backward(root))
    }

    /// Exports the last extracted interpolant into a certificate builder,
    /// with leaf variables shifted by `shift`.
    pub fn export_certificate(
        &self,
        kind: InterpolantKind,
        builder: &mut AigerBuilder,
        shift: Frame,
    ) -> isize {
        let backward = &self.backward;
        let mut map = |var: SatVar| backward[var.index()].lit(false).shift(shift);
        self.solver.tracer().export_root(kind, builder, &mut map)
    }
}
