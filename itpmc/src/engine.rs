//! The interpolation-based bounded model checking engine.
//!
//! Drives unrolling with trigger-gated clause batches, extracts Craig
//! interpolants from UNSAT unrollings, grows their union until a fixed point
//! proves unreachability, and reconstructs concrete traces from satisfiable
//! unrollings against the unsimplified problem.
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use log::{debug, info, trace};
use rustc_hash::FxHashMap;

use itpmc_formula::{
    AigerBuilder, Assignment, BmcModel, BmcProblem, Certificate, CertificateKind, Clauses, Frame,
    Lit,
};
use itpmc_sat::{preprocess, Lit as SatLit, SimpLevel, SimpResult};

use crate::adapter::{InterpolatingSolver, SideLabel, TimedVar, VarRole};
use crate::config::{BmcConfig, LogLevel, PreprocessLevel};
use crate::result::BmcResult;

/// Why a solver-side variable exists.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
enum VarKind {
    Original,
    InitTrigger,
    TransTrigger,
    TargetTrigger,
    CraigTrigger,
    InitTseitin,
    CraigTseitin,
    FpcTrigger,
    ATrigger,
    BTrigger,
}

/// Which clause family a batch belongs to.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
enum ClauseKind {
    Init,
    Trans,
    Target,
    Craig,
    ASide,
    BSide,
}

/// Outcome of preprocessing one clause set.
enum Simplified {
    Clauses(Clauses),
    Unsat,
}

/// Cloneable handle for interrupting a running [`BmcSolver::solve`].
#[derive(Clone)]
pub struct InterruptHandle {
    flag: Arc<AtomicBool>,
}

impl InterruptHandle {
    /// Idempotent and thread-safe; a running solve returns `Interrupted` at
    /// its next suspension point.
    pub fn interrupt(&self) {
        self.flag.store(true, Ordering::Release);
    }

    pub fn clear_interrupt(&self) {
        self.flag.store(false, Ordering::Release);
    }

    pub fn is_interrupted(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }
}

/// An interpolation-based bounded model checker for one problem instance.
pub struct BmcSolver {
    problem: BmcProblem,
    config: BmcConfig,
    global_vars: Vec<bool>,
    protected_vars: Vec<bool>,
    var_kinds: Vec<VarKind>,
    interrupted: Arc<AtomicBool>,
}

impl BmcSolver {
    pub fn new(problem: BmcProblem, config: BmcConfig) -> BmcSolver {
        let mut solver = BmcSolver {
            problem,
            config,
            global_vars: vec![],
            protected_vars: vec![],
            var_kinds: vec![],
            interrupted: Arc::new(AtomicBool::new(false)),
        };
        solver.compute_variable_roles();
        solver
    }

    pub fn problem(&self) -> &BmcProblem {
        &self.problem
    }

    pub fn config(&self) -> &BmcConfig {
        &self.config
    }

    pub fn interrupt_handle(&self) -> InterruptHandle {
        InterruptHandle {
            flag: self.interrupted.clone(),
        }
    }

    pub fn interrupt(&self) {
        self.interrupted.store(true, Ordering::Release);
    }

    pub fn clear_interrupt(&self) {
        self.interrupted.store(false, Ordering::Release);
    }

    pub fn is_interrupted(&self) -> bool {
        self.interrupted.load(Ordering::Acquire)
    }

    /// Decides reachability of the target.
    ///
    /// Solver status is always a return value; repeated calls start from a
    /// clean slate (after `clear_interrupt` a previously interrupted instance
    /// runs to completion).
    pub fn solve(&mut self) -> BmcResult {
        self.var_kinds.clear();
        self.compute_variable_roles();
        self.solve_impl()
    }

    /// Global variables are state latches (timeframe crossing in `T`);
    /// protected variables additionally cross sections and must survive
    /// preprocessing.
    fn compute_variable_roles(&mut self) {
        let count = self.problem.var_count();
        self.global_vars = vec![false; count];
        self.protected_vars = vec![false; count];

        let mut init_vars = vec![false; count];
        let mut trans_vars = vec![false; count];
        let mut target_vars = vec![false; count];
        for clause in self.problem.init() {
            for lit in clause {
                init_vars[lit.index()] = true;
            }
        }
        for clause in self.problem.trans() {
            for lit in clause {
                trans_vars[lit.index()] = true;
                if lit.frame() != 0 {
                    self.global_vars[lit.index()] = true;
                }
            }
        }
        for clause in self.problem.target() {
            for lit in clause {
                target_vars[lit.index()] = true;
            }
        }

        for var in 0..count {
            self.protected_vars[var] = (init_vars[var] && target_vars[var])
                || (trans_vars[var] && (init_vars[var] || target_vars[var]))
                || self.global_vars[var];
        }
    }

    fn is_global(&self, index: usize) -> bool {
        index < self.global_vars.len() && self.global_vars[index]
    }

    fn is_protected(&self, index: usize) -> bool {
        index < self.protected_vars.len() && self.protected_vars[index]
    }

    fn alloc_var(&mut self, kind: VarKind) -> Lit {
        let index = self.var_kinds.len();
        self.var_kinds.push(kind);
        trace!("creating {:?} variable {}", kind, index);
        Lit::from_index(index, true)
    }

    fn clause_side(kind: ClauseKind, shift: Frame) -> SideLabel {
        match kind {
            ClauseKind::Init | ClauseKind::Craig | ClauseKind::ASide => SideLabel::A,
            // The base-case target is an A clause so that variables shared
            // with the transition relation only need to be global in
            // timeframe 1.
            ClauseKind::Trans | ClauseKind::Target => {
                if shift < 1 {
                    SideLabel::A
                } else {
                    SideLabel::B
                }
            }
            ClauseKind::BSide => SideLabel::B,
        }
    }

    fn var_role(&self, side: SideLabel, var: TimedVar) -> VarRole {
        if self.is_global(var.index) && var.frame == 1 {
            return VarRole::Global;
        }
        match side {
            SideLabel::Normal => VarRole::Normal,
            SideLabel::A => {
                if self.is_protected(var.index) {
                    VarRole::AProtected
                } else {
                    VarRole::ALocal
                }
            }
            SideLabel::B => {
                if self.is_protected(var.index) {
                    VarRole::BProtected
                } else {
                    VarRole::BLocal
                }
            }
        }
    }

    fn new_solver(&self, enable_craig: bool) -> InterpolatingSolver {
        let mut solver = InterpolatingSolver::new(self.config.interpolant, enable_craig);
        solver.set_terminate(self.interrupted.clone());
        solver
    }

    fn add_trigger_to(&self, solver: &mut InterpolatingSolver, trigger: Lit, kind: ClauseKind) {
        trace!("adding {:?} trigger {:?}", kind, trigger);
        let side = Self::clause_side(kind, trigger.frame());
        let role = match side {
            SideLabel::A => VarRole::AProtected,
            SideLabel::B => VarRole::BProtected,
            SideLabel::Normal => VarRole::Normal,
        };
        solver.add_trigger(trigger, role);
    }

    fn add_clauses_to(
        &self,
        solver: &mut InterpolatingSolver,
        trigger: Option<Lit>,
        clauses: &Clauses,
        shift: Frame,
        kind: ClauseKind,
    ) {
        trace!("adding {} {:?} clauses with {} shift", clauses.len(), kind, shift);
        let side = Self::clause_side(kind, shift);
        let mut role = |var: TimedVar| self.var_role(side, var);
        solver.add_clauses(trigger, clauses, shift, side, &mut role);
    }

    fn disable_trigger_in(&self, solver: &mut InterpolatingSolver, trigger: Lit, kind: ClauseKind) {
        trace!("permanently disabling {:?} trigger {:?}", kind, trigger);
        let side = Self::clause_side(kind, trigger.frame());
        solver.disable_trigger(trigger, side);
    }

    fn add_fpc_trigger(&self, solver: &mut InterpolatingSolver, trigger: Lit) {
        let role = if self.is_protected(trigger.index()) {
            VarRole::Global
        } else {
            VarRole::Normal
        };
        solver.add_trigger(trigger, role);
    }

    fn add_fpc_clauses(
        &self,
        solver: &mut InterpolatingSolver,
        trigger: Option<Lit>,
        clauses: &Clauses,
        shift: Frame,
    ) {
        let mut role = |var: TimedVar| {
            if self.is_protected(var.index) {
                VarRole::Global
            } else {
                VarRole::Normal
            }
        };
        solver.add_clauses(trigger, clauses, shift, SideLabel::Normal, &mut role);
    }

    /// Simplifies a clause set with all protected variables (and the given
    /// root) frozen.
    fn preprocess_clauses(
        &self,
        clauses: &Clauses,
        root: Option<Lit>,
        level: PreprocessLevel,
    ) -> Simplified {
        let simp_level = match level {
            PreprocessLevel::None => {
                info!("preprocessing is disabled");
                return Simplified::Clauses(clauses.clone());
            }
            PreprocessLevel::Quick => SimpLevel::Quick,
            PreprocessLevel::Expensive => SimpLevel::Expensive,
        };

        let mut forward: FxHashMap<TimedVar, usize> = FxHashMap::default();
        let mut backward: Vec<TimedVar> = vec![];
        let mut frozen: Vec<bool> = vec![];
        let protected = &self.protected_vars;
        let mut map_lit = |lit: Lit| -> SatLit {
            let var = TimedVar::from_lit(lit);
            let index = *forward.entry(var).or_insert_with(|| {
                backward.push(var);
                frozen.push(var.index < protected.len() && protected[var.index]);
                backward.len() - 1
            });
            SatLit::from_index(index, lit.is_positive())
        };

        let mapped: Vec<Vec<SatLit>> = clauses
            .iter()
            .map(|clause| clause.iter().map(|&lit| map_lit(lit)).collect())
            .collect();
        if let Some(root) = root {
            let mapped_root = map_lit(root);
            frozen[mapped_root.index()] = true;
        }

        info!("preprocessing started with {} clauses", clauses.len());
        let result = match preprocess(backward.len(), mapped, &frozen, simp_level) {
            SimpResult::Unsat => return Simplified::Unsat,
            SimpResult::Clauses(result) => result,
        };
        info!("preprocessing finished with {} clauses", result.len());

        Simplified::Clauses(
            result
                .iter()
                .map(|clause| {
                    clause
                        .iter()
                        .map(|&lit| backward[lit.index()].lit(lit.is_negative()))
                        .collect()
                })
                .collect(),
        )
    }

    /// Re-encodes a clause set so a solver can assume its negation.
    ///
    /// For `C_1 ∧ … ∧ C_k` this yields a root `r` with `(¬r ∨ C_i)` for each
    /// clause and, through per-clause triggers, `(r ∨ t_1 ∨ … ∨ t_k)` plus
    /// `(¬t_j ∨ ¬ℓ)` for every literal of `C_j`.
    fn to_invertable(&mut self, clauses: &Clauses) -> (Clauses, Lit) {
        let mut result = Clauses::new();
        let root = self.alloc_var(VarKind::InitTseitin);

        for clause in clauses {
            let mut output = Vec::with_capacity(clause.len() + 1);
            output.push(!root);
            output.extend_from_slice(clause);
            result.push(output);
        }

        let mut triggers = Vec::with_capacity(clauses.len() + 1);
        triggers.push(root);
        let mut reverse = Clauses::new();
        for clause in clauses {
            let trigger = self.alloc_var(VarKind::InitTseitin);
            triggers.push(trigger);
            for &lit in clause {
                reverse.push(vec![!trigger, !lit]);
            }
        }
        result.push(triggers);
        result.extend(reverse);

        (result, root)
    }

    fn competition(&self, verdict: &str, depth: Frame, start: &Instant) {
        if self.config.log_level == LogLevel::Competition {
            eprintln!(
                "=> {} {} {:.6}",
                verdict,
                depth.max(0),
                start.elapsed().as_secs_f64()
            );
        }
    }

    fn solve_impl(&mut self) -> BmcResult {
        let start = Instant::now();

        info!("adding bmc problem to instance");
        for _ in 0..self.problem.var_count() {
            self.alloc_var(VarKind::Original);
        }

        info!("creating trigger variables");
        let init_trigger = self.alloc_var(VarKind::InitTrigger);
        let trans_trigger = self.alloc_var(VarKind::TransTrigger);
        let target_trigger = self.alloc_var(VarKind::TargetTrigger);
        let craig_trigger = self.alloc_var(VarKind::CraigTrigger);
        let a_normal = self.alloc_var(VarKind::ATrigger);
        let a_craig = self.alloc_var(VarKind::ATrigger);
        let b_normal = self.alloc_var(VarKind::BTrigger);
        let b_craig = self.alloc_var(VarKind::BTrigger);

        info!("preprocessing {} init clauses", self.problem.init().len());
        let init_clauses =
            match self.preprocess_clauses(self.problem.init(), None, self.config.preprocess_init) {
                Simplified::Unsat => {
                    info!("init unsat");
                    self.competition("UNREACHABLE", 0, &start);
                    return BmcResult::for_certificate(
                        0,
                        Certificate::constant(CertificateKind::Init, false),
                    );
                }
                Simplified::Clauses(clauses) => clauses,
            };
        if self.is_interrupted() {
            return BmcResult::for_interrupt(0);
        }

        info!("preprocessing {} trans clauses", self.problem.trans().len());
        let trans_clauses =
            match self.preprocess_clauses(self.problem.trans(), None, self.config.preprocess_trans)
            {
                // An unsatisfiable transition relation still allows the base
                // case, so it stays as an explicit contradiction.
                Simplified::Unsat => vec![vec![]],
                Simplified::Clauses(clauses) => clauses,
            };
        if self.is_interrupted() {
            return BmcResult::for_interrupt(0);
        }

        info!("preprocessing {} target clauses", self.problem.target().len());
        let target_clauses = match self.preprocess_clauses(
            self.problem.target(),
            None,
            self.config.preprocess_target,
        ) {
            Simplified::Unsat => {
                info!("target unsat");
                self.competition("UNREACHABLE", 0, &start);
                return BmcResult::for_certificate(
                    0,
                    Certificate::constant(CertificateKind::Target, true),
                );
            }
            Simplified::Clauses(clauses) => clauses,
        };
        if self.is_interrupted() {
            return BmcResult::for_interrupt(0);
        }

        info!("making {} init clauses invertable", init_clauses.len());
        let (invertable_init, invertable_root) = self.to_invertable(&init_clauses);

        // ------------------------------------------------------------------
        // Sanity gates: I, P and the I ∧ P base case in isolation.
        // ------------------------------------------------------------------
        if self.config.sanity_checks {
            let mut sanity = self.new_solver(false);
            self.add_trigger_to(&mut sanity, init_trigger, ClauseKind::Init);
            self.add_clauses_to(&mut sanity, Some(init_trigger), &init_clauses, 0, ClauseKind::Init);
            self.add_trigger_to(&mut sanity, trans_trigger, ClauseKind::Trans);
            self.add_clauses_to(
                &mut sanity,
                Some(trans_trigger),
                &trans_clauses,
                0,
                ClauseKind::Trans,
            );
            self.add_trigger_to(&mut sanity, target_trigger, ClauseKind::Target);
            self.add_clauses_to(
                &mut sanity,
                Some(target_trigger),
                &target_clauses,
                0,
                ClauseKind::Target,
            );
            self.add_trigger_to(&mut sanity, target_trigger.shift(1), ClauseKind::Target);
            self.add_clauses_to(
                &mut sanity,
                Some(target_trigger.shift(1)),
                &target_clauses,
                1,
                ClauseKind::Target,
            );

            match sanity.solve(&[init_trigger]) {
                None => return BmcResult::for_interrupt(0),
                Some(false) => {
                    info!("init unsat");
                    self.competition("UNREACHABLE", 0, &start);
                    return BmcResult::for_certificate(
                        0,
                        Certificate::constant(CertificateKind::Init, false),
                    );
                }
                Some(true) => {}
            }
            match sanity.solve(&[target_trigger]) {
                None => return BmcResult::for_interrupt(0),
                Some(false) => {
                    info!("target unsat");
                    self.competition("UNREACHABLE", 0, &start);
                    return BmcResult::for_certificate(
                        0,
                        Certificate::constant(CertificateKind::Target, true),
                    );
                }
                Some(true) => {}
            }
            match sanity.solve(&[init_trigger, target_trigger]) {
                None => return BmcResult::for_interrupt(0),
                Some(true) => {
                    info!("init + target sat");
                    self.competition("SAT", 0, &start);
                    return self.expand(
                        &mut sanity,
                        0,
                        &init_clauses,
                        &trans_clauses,
                        &target_clauses,
                    );
                }
                Some(false) => {}
            }
        }

        // ------------------------------------------------------------------
        // Main loop.
        // ------------------------------------------------------------------
        let mut bmc = self.new_solver(self.config.craig_interpolation);

        let max_depth = self.config.max_depth as Frame;
        let mut depth: Frame = 0;
        let mut encoded_trans: Frame = 0;
        let mut encoded_target: Frame = 0;

        while depth < max_depth {
            if self.is_interrupted() {
                return BmcResult::for_interrupt(depth);
            }
            info!("problem depth {} (bmc)", depth);

            // The Craig inner loop may have advanced the depth without this
            // loop encoding the frames in between, so catch up here.
            if depth == 0 {
                self.add_trigger_to(&mut bmc, init_trigger, ClauseKind::Init);
                self.add_clauses_to(
                    &mut bmc,
                    Some(init_trigger),
                    &init_clauses,
                    0,
                    ClauseKind::Init,
                );
            }
            while encoded_trans < depth {
                self.add_trigger_to(&mut bmc, trans_trigger.shift(encoded_trans), ClauseKind::Trans);
                self.add_clauses_to(
                    &mut bmc,
                    Some(trans_trigger.shift(encoded_trans)),
                    &trans_clauses,
                    encoded_trans,
                    ClauseKind::Trans,
                );
                encoded_trans += 1;
                if self.is_interrupted() {
                    return BmcResult::for_interrupt(depth);
                }
            }
            while encoded_target <= depth {
                self.add_trigger_to(
                    &mut bmc,
                    target_trigger.shift(encoded_target),
                    ClauseKind::Target,
                );
                self.add_clauses_to(
                    &mut bmc,
                    Some(target_trigger.shift(encoded_target)),
                    &target_clauses,
                    encoded_target,
                    ClauseKind::Target,
                );
                encoded_target += 1;
            }

            // A holds I and the first transition, B demands the target at
            // some frame with transitions forced up to it.
            let mut a_side = Clauses::new();
            let mut b_side = Clauses::new();
            if depth == 0 {
                a_side.push(vec![init_trigger]);
                a_side.push(vec![target_trigger]);
            } else {
                a_side.push(vec![init_trigger]);
                a_side.push(vec![trans_trigger]);
                a_side.push(vec![!target_trigger]);

                for index in 1..depth {
                    if self.config.total_transition_relation {
                        b_side.push(vec![trans_trigger.shift(index)]);
                    } else {
                        b_side.push(vec![target_trigger.shift(index), trans_trigger.shift(index)]);
                    }
                }
                let mut reached = Vec::with_capacity(depth as usize);
                for index in 1..=depth {
                    reached.push(target_trigger.shift(index));
                }
                b_side.push(reached);
            }

            self.add_trigger_to(&mut bmc, a_normal.shift(depth), ClauseKind::ASide);
            self.add_trigger_to(&mut bmc, b_normal.shift(depth), ClauseKind::BSide);
            self.add_clauses_to(
                &mut bmc,
                Some(a_normal.shift(depth)),
                &a_side,
                0,
                ClauseKind::ASide,
            );
            self.add_clauses_to(
                &mut bmc,
                Some(b_normal.shift(depth)),
                &b_side,
                0,
                ClauseKind::BSide,
            );

            debug!("solving plain bmc problem");
            let bmc_result = match bmc.solve(&[a_normal.shift(depth), b_normal.shift(depth)]) {
                None => return BmcResult::for_interrupt(depth),
                Some(result) => result,
            };
            info!(
                "plain bmc result is {}",
                if bmc_result { "SAT" } else { "UNSAT" }
            );
            self.competition(if bmc_result { "SAT" } else { "UNSAT" }, depth, &start);
            if bmc_result {
                return self.expand(&mut bmc, depth, &init_clauses, &trans_clauses, &target_clauses);
            }

            self.disable_trigger_in(&mut bmc, a_normal.shift(depth), ClauseKind::ASide);
            self.disable_trigger_in(&mut bmc, b_normal.shift(depth), ClauseKind::BSide);
            if self.is_interrupted() {
                return BmcResult::for_interrupt(depth);
            }

            // --------------------------------------------------------------
            // Craig inner loop: extend with interpolants at fixed depth.
            // --------------------------------------------------------------
            if self.config.craig_interpolation && depth > 0 {
                let fpc_positive = self.alloc_var(VarKind::FpcTrigger);
                let fpc_negative = self.alloc_var(VarKind::FpcTrigger);
                let fpc_progress = self.alloc_var(VarKind::FpcTrigger);

                let mut craig_roots: Vec<Lit> = vec![invertable_root];
                let mut craig_triggers: Vec<Lit> = vec![init_trigger];
                let mut cert_builder = AigerBuilder::new();
                let mut cert_roots: Vec<isize> = vec![];

                let mut fpc = if self.config.fixed_point_check {
                    let mut fpc = self.new_solver(false);
                    self.add_fpc_trigger(&mut fpc, invertable_root);
                    self.add_fpc_clauses(&mut fpc, None, &invertable_init, 0);
                    Some(fpc)
                } else {
                    None
                };
                if self.is_interrupted() {
                    return BmcResult::for_interrupt(depth);
                }

                let mut craig_iteration: Frame = 0;
                loop {
                    if depth + 1 >= max_depth {
                        break;
                    }
                    if self.is_interrupted() {
                        return BmcResult::for_interrupt(depth + 1);
                    }
                    info!("problem depth {} (with craig)", depth + 1);

                    // Constant fixed points: the union is a tautology, or
                    // every interpolant is false (only possible for an
                    // unsatisfiable initial predicate).
                    if let Some(fpc) = fpc.as_mut() {
                        debug!(
                            "fixed point check adding {} root clauses",
                            craig_roots.len()
                        );
                        let trigger = fpc_positive.shift(craig_iteration);
                        let clauses: Clauses =
                            craig_roots.iter().map(|&root| vec![!root]).collect();
                        self.add_fpc_trigger(fpc, trigger);
                        self.add_fpc_clauses(fpc, Some(trigger), &clauses, 0);
                        let constant_one = match fpc.solve(&[trigger]) {
                            None => return BmcResult::for_interrupt(depth + 1),
                            Some(result) => result,
                        };
                        info!(
                            "fixed point check result constant 1 is {}",
                            if constant_one { "SAT" } else { "UNSAT" }
                        );
                        fpc.disable_trigger(trigger, SideLabel::Normal);
                        if !constant_one {
                            info!("fixed point constant 1 reached at depth {}", depth + 1);
                            self.competition("UNREACHABLE", depth + 1, &start);
                            return BmcResult::for_certificate(
                                depth + 1,
                                Certificate::constant(CertificateKind::Craig, true),
                            );
                        }

                        let trigger = fpc_negative.shift(craig_iteration);
                        let clauses: Clauses = vec![craig_roots.clone()];
                        self.add_fpc_trigger(fpc, trigger);
                        self.add_fpc_clauses(fpc, Some(trigger), &clauses, 0);
                        let constant_zero = match fpc.solve(&[trigger]) {
                            None => return BmcResult::for_interrupt(depth + 1),
                            Some(result) => result,
                        };
                        info!(
                            "fixed point check result constant 0 is {}",
                            if constant_zero { "SAT" } else { "UNSAT" }
                        );
                        fpc.disable_trigger(trigger, SideLabel::Normal);
                        if !constant_zero {
                            info!("fixed point constant 0 reached at depth {}", depth + 1);
                            self.competition("UNREACHABLE", depth + 1, &start);
                            return BmcResult::for_certificate(
                                depth + 1,
                                Certificate::constant(CertificateKind::Craig, false),
                            );
                        }
                    }

                    trace!("converting craig interpolant to cnf");
                    let kind = self.config.interpolant;
                    let (craig_cnf, craig_root) =
                        bmc.craig_interpolant(kind, || {
                            TimedVar::from_lit(self.alloc_var(VarKind::CraigTseitin))
                        });
                    if self.is_interrupted() {
                        return BmcResult::for_interrupt(depth + 1);
                    }

                    if self.config.max_craig_size != 0
                        && craig_cnf.len() > self.config.max_craig_size
                    {
                        info!("craig interpolant exceeded size limit");
                        debug!(
                            "craig interpolant size is {} with limit {}",
                            craig_cnf.len(),
                            self.config.max_craig_size
                        );
                        return BmcResult::for_craig_limit(depth + 1);
                    }

                    trace!("preprocessing {} craig interpolant clauses", craig_cnf.len());
                    let craig_clauses = match self.preprocess_clauses(
                        &craig_cnf,
                        Some(craig_root),
                        self.config.preprocess_craig,
                    ) {
                        Simplified::Unsat => vec![vec![!craig_root]],
                        Simplified::Clauses(clauses) => clauses,
                    };
                    if self.is_interrupted() {
                        return BmcResult::for_interrupt(depth + 1);
                    }

                    // Progress fixed point: the new interpolant adds no state
                    // outside the union of the previous ones.
                    if let Some(fpc) = fpc.as_mut() {
                        debug!(
                            "fixed point check adding {} craig clauses",
                            craig_clauses.len()
                        );
                        self.add_fpc_trigger(fpc, craig_root.shift(-1));
                        self.add_fpc_clauses(fpc, None, &craig_clauses, -1);

                        let trigger = fpc_progress.shift(craig_iteration);
                        let mut progress: Clauses =
                            craig_roots.iter().map(|&root| vec![!root]).collect();
                        progress.push(vec![craig_root.shift(-1)]);
                        self.add_fpc_trigger(fpc, trigger);
                        self.add_fpc_clauses(fpc, Some(trigger), &progress, 0);

                        debug!("fixed point check solving");
                        let progress_result = match fpc.solve(&[trigger]) {
                            None => return BmcResult::for_interrupt(depth + 1),
                            Some(result) => result,
                        };
                        info!(
                            "fixed point check result {}",
                            if progress_result { "SAT" } else { "UNSAT" }
                        );
                        fpc.disable_trigger(trigger, SideLabel::Normal);

                        if !progress_result {
                            info!("fixed point reached at depth {}", depth + 1);
                            self.competition("UNREACHABLE", depth + 1, &start);
                            return BmcResult::for_certificate(
                                depth + 1,
                                Certificate::new(
                                    CertificateKind::Craig,
                                    cert_builder.build(),
                                    cert_roots,
                                ),
                            );
                        }

                        // Keep the interpolant for a later certificate, with
                        // its boundary variables moved to timeframe 0.
                        cert_roots.push(bmc.export_certificate(kind, &mut cert_builder, -1));
                    }

                    // ------------------------------------------------------
                    // Re-solve with the interpolant union replacing I.
                    // ------------------------------------------------------
                    craig_roots.push(craig_root.shift(-1));
                    craig_triggers.push(craig_trigger.shift(depth));

                    self.add_trigger_to(&mut bmc, craig_trigger.shift(depth), ClauseKind::Craig);
                    self.add_clauses_to(
                        &mut bmc,
                        Some(craig_trigger.shift(depth)),
                        &craig_clauses,
                        -1,
                        ClauseKind::Craig,
                    );
                    self.add_clauses_to(
                        &mut bmc,
                        Some(craig_trigger.shift(depth)),
                        &vec![vec![craig_root]],
                        -1,
                        ClauseKind::Craig,
                    );

                    let span = depth - craig_iteration;
                    let mut a_side = Clauses::new();
                    a_side.push(craig_triggers.clone());
                    a_side.push(vec![trans_trigger]);
                    a_side.push(vec![!target_trigger]);

                    let mut b_side = Clauses::new();
                    for index in 1..span {
                        if self.config.total_transition_relation {
                            b_side.push(vec![trans_trigger.shift(index)]);
                        } else {
                            let mut clause = vec![trans_trigger.shift(index)];
                            for target in 1..=index {
                                clause.push(target_trigger.shift(target));
                            }
                            b_side.push(clause);
                        }
                    }
                    let mut reached = Vec::with_capacity(span as usize);
                    for index in 1..=span {
                        reached.push(target_trigger.shift(index));
                    }
                    b_side.push(reached);

                    self.add_trigger_to(&mut bmc, a_craig.shift(depth), ClauseKind::ASide);
                    self.add_trigger_to(&mut bmc, b_craig.shift(depth), ClauseKind::BSide);
                    self.add_clauses_to(
                        &mut bmc,
                        Some(a_craig.shift(depth)),
                        &a_side,
                        0,
                        ClauseKind::ASide,
                    );
                    self.add_clauses_to(
                        &mut bmc,
                        Some(b_craig.shift(depth)),
                        &b_side,
                        0,
                        ClauseKind::BSide,
                    );

                    debug!("solving craig problem");
                    let craig_result =
                        match bmc.solve(&[a_craig.shift(depth), b_craig.shift(depth)]) {
                            None => return BmcResult::for_interrupt(depth + 1),
                            Some(result) => result,
                        };
                    info!(
                        "craig result is {}",
                        if craig_result { "SAT" } else { "UNSAT" }
                    );
                    if !craig_result {
                        self.competition("UNSAT", depth + 1, &start);
                    }

                    self.disable_trigger_in(&mut bmc, a_craig.shift(depth), ClauseKind::ASide);
                    self.disable_trigger_in(&mut bmc, b_craig.shift(depth), ClauseKind::BSide);
                    if self.is_interrupted() {
                        return BmcResult::for_interrupt(depth);
                    }

                    if craig_result {
                        // The interpolant was too weak at this depth; drop
                        // the accumulated interpolants (the initial state
                        // stays) and grow the unrolling instead.
                        for &trigger in &craig_triggers[1..] {
                            self.disable_trigger_in(&mut bmc, trigger, ClauseKind::Craig);
                        }
                        break;
                    }

                    depth += 1;
                    craig_iteration += 1;
                }
            }

            depth += 1;
        }

        BmcResult::for_depth_limit(depth)
    }

    /// Fixes the protected-variable values found by the simplified solve and
    /// re-solves the unsimplified unrolling to obtain a complete trace.
    fn expand(
        &self,
        bmc: &mut InterpolatingSolver,
        depth: Frame,
        init_clauses: &Clauses,
        trans_clauses: &Clauses,
        target_clauses: &Clauses,
    ) -> BmcResult {
        info!("problem depth {} (result expansion)", depth);

        debug!("fixing global variables");
        let mut assumptions: Vec<Lit> = vec![];
        self.collect_assumptions(bmc, init_clauses, 0, &mut assumptions);
        for index in 0..depth {
            self.collect_assumptions(bmc, trans_clauses, index, &mut assumptions);
        }
        self.collect_assumptions(bmc, target_clauses, depth, &mut assumptions);
        if self.is_interrupted() {
            return BmcResult::for_interrupt(depth);
        }

        let mut full = self.new_solver(false);
        self.add_clauses_to(&mut full, None, self.problem.init(), 0, ClauseKind::Init);
        for index in 0..depth {
            self.add_clauses_to(&mut full, None, self.problem.trans(), index, ClauseKind::Trans);
        }
        self.add_clauses_to(
            &mut full,
            None,
            self.problem.target(),
            depth,
            ClauseKind::Target,
        );
        if self.is_interrupted() {
            return BmcResult::for_interrupt(depth);
        }

        debug!("solving expanded problem");
        let expanded = match full.solve(&assumptions) {
            None => return BmcResult::for_interrupt(depth),
            Some(result) => result,
        };
        info!(
            "expanded result is {}",
            if expanded { "SAT" } else { "UNSAT" }
        );
        if !expanded {
            panic!("could not expand solution to full problem; a protected variable was lost");
        }

        let mut timeframes = Vec::with_capacity(depth as usize + 1);
        for index in 0..=depth {
            let mut values = Vec::with_capacity(self.problem.var_count());
            for var in 0..self.problem.var_count() {
                values.push(full.value(Lit::from_index(var, true), index));
            }
            timeframes.push(values);
        }

        BmcResult::for_model(depth, BmcModel::new(timeframes))
    }

    /// Reads one assumption per protected variable and timeframe occurring
    /// in the given clauses, skipping don't-cares.
    fn collect_assumptions(
        &self,
        bmc: &InterpolatingSolver,
        clauses: &Clauses,
        shift: Frame,
        assumptions: &mut Vec<Lit>,
    ) {
        let mut assumed = vec![[false; 2]; self.protected_vars.len()];
        for clause in clauses {
            for &lit in clause {
                let var = lit.index();
                let frame = lit.frame() as usize;
                if var >= self.protected_vars.len() || !self.protected_vars[var] {
                    continue;
                }
                if assumed[var][frame] {
                    continue;
                }
                assumed[var][frame] = true;

                let value = bmc.value(lit, shift);
                trace!("value {:?} = {:?}", lit.to_positive().shift(shift), value);
                if value != Assignment::DontCare {
                    assumptions.push(lit.shift(shift) ^ (value == Assignment::Negative));
                }
            }
        }
    }
}
