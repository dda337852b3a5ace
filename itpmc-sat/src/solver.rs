//! Conflict driven clause learning with antecedent tracking.
//!
//! The solver is deliberately plain: two watched literals, first-UIP
//! learning, activity based branching with phase saving and Luby restarts.
//! The clause store is append-only and ids are never recycled, so the proof
//! hook sees a stable id space. Learned clauses are *exact* resolvents of
//! their recorded antecedent chain: literals falsified at level 0 are
//! resolved away through their reason clauses instead of being dropped
//! silently, which is what makes the chains usable for interpolation.
use std::mem::take;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::debug;

use crate::heap::ActivityHeap;
use crate::lit::{Lit, Var};
use crate::tracer::{ClauseId, NoopTracer, ProofTracer};

/// Why a variable is assigned.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
enum Reason {
    /// Branching decision or assumption.
    Decision,
    /// Propagated by the clause with this id.
    Clause(ClauseId),
}

#[derive(Copy, Clone)]
struct Watch {
    clause: ClauseId,
    /// A literal of the clause; if it is true the clause needs no attention.
    blocker: Lit,
}

struct StoredClause {
    lits: Vec<Lit>,
}

const VALUE_UNASSIGNED: i8 = 0;
const VALUE_TRUE: i8 = 1;
const VALUE_FALSE: i8 = -1;

fn lit_value(values: &[i8], lit: Lit) -> Option<bool> {
    match values[lit.index()] {
        VALUE_UNASSIGNED => None,
        value => Some((value == VALUE_TRUE) ^ lit.is_negative()),
    }
}

/// Number of conflicts of the first Luby restart interval.
const RESTART_INTERVAL_SCALE: u64 = 128;

/// The i-th element of the Luby sequence 1, 1, 2, 1, 1, 2, 4, ...
fn luby(mut index: u64) -> u64 {
    let mut size = 1u64;
    let mut sequence = 0u32;
    while size < index + 1 {
        sequence += 1;
        size = 2 * size + 1;
    }
    while size - 1 != index {
        size = (size - 1) / 2;
        sequence -= 1;
        index %= size;
    }
    1u64 << sequence
}

/// A CDCL SAT solver delivering its resolution proof to a [`ProofTracer`].
pub struct Solver<T: ProofTracer = NoopTracer> {
    tracer: T,

    clauses: Vec<StoredClause>,
    original_count: usize,

    values: Vec<i8>,
    levels: Vec<u32>,
    reasons: Vec<Reason>,
    phase: Vec<bool>,
    trail: Vec<Lit>,
    queue_head: usize,
    /// Trail length at the start of each decision level.
    decisions: Vec<usize>,
    watches: Vec<Vec<Watch>>,

    activity: Vec<f64>,
    activity_inc: f64,
    heap: ActivityHeap,

    assumptions: Vec<Lit>,
    failed: Vec<Lit>,

    /// Set once the empty clause has been derived without assumptions.
    unsat: bool,
    final_clause: Option<ClauseId>,

    terminate: Arc<AtomicBool>,

    conflicts: u64,
    restarts: u64,

    /// Conflict analysis scratch, indexed by variable.
    seen: Vec<bool>,
}

impl Default for Solver<NoopTracer> {
    fn default() -> Solver<NoopTracer> {
        Solver::new()
    }
}

impl Solver<NoopTracer> {
    /// Create a solver without proof delivery.
    pub fn new() -> Solver<NoopTracer> {
        Solver::with_tracer(NoopTracer)
    }
}

impl<T: ProofTracer> Solver<T> {
    /// Create a solver delivering its proof to `tracer`.
    pub fn with_tracer(tracer: T) -> Solver<T> {
        Solver {
            tracer,
            clauses: vec![],
            original_count: 0,
            values: vec![],
            levels: vec![],
            reasons: vec![],
            phase: vec![],
            trail: vec![],
            queue_head: 0,
            decisions: vec![],
            watches: vec![],
            activity: vec![],
            activity_inc: 1.0,
            heap: ActivityHeap::default(),
            assumptions: vec![],
            failed: vec![],
            unsat: false,
            final_clause: None,
            terminate: Arc::new(AtomicBool::new(false)),
            conflicts: 0,
            restarts: 0,
            seen: vec![],
        }
    }

    pub fn tracer(&self) -> &T {
        &self.tracer
    }

    pub fn tracer_mut(&mut self) -> &mut T {
        &mut self.tracer
    }

    /// Shared flag that makes a running solve return `None` when set.
    pub fn terminate_handle(&self) -> Arc<AtomicBool> {
        self.terminate.clone()
    }

    /// Replaces the terminate flag, e.g. to share one flag across solvers.
    pub fn set_terminate_handle(&mut self, flag: Arc<AtomicBool>) {
        self.terminate = flag;
    }

    pub fn var_count(&self) -> usize {
        self.values.len()
    }

    /// Allocate the next solver variable.
    pub fn new_var(&mut self) -> Var {
        let var = Var::from_index(self.values.len());
        self.values.push(VALUE_UNASSIGNED);
        self.levels.push(0);
        self.reasons.push(Reason::Decision);
        self.phase.push(false);
        self.activity.push(0.0);
        self.seen.push(false);
        self.watches.push(vec![]);
        self.watches.push(vec![]);
        self.heap.grow_to(self.values.len());
        self.heap.insert(var, &self.activity);
        var
    }

    /// The value of a literal under the current (partial) assignment.
    ///
    /// After a satisfiable solve this is the model; adding clauses or solving
    /// again invalidates it.
    pub fn value(&self, lit: Lit) -> Option<bool> {
        lit_value(&self.values, lit)
    }

    /// Subset of the assumptions that made the last solve unsatisfiable.
    pub fn failed_core(&self) -> &[Lit] {
        &self.failed
    }

    /// Adds a clause and delivers it to the tracer.
    ///
    /// Literals are sorted and deduplicated; the returned id refers to the
    /// stored clause.
    pub fn add_clause(&mut self, lits: &[Lit]) -> ClauseId {
        self.backtrack(0);

        for &lit in lits {
            while lit.index() >= self.values.len() {
                self.new_var();
            }
        }

        let mut sorted = lits.to_vec();
        sorted.sort_by_key(|lit| lit.code());
        sorted.dedup();

        let tautology = sorted
            .windows(2)
            .any(|window| window[0] == !window[1]);

        let id = self.clauses.len();
        self.clauses.push(StoredClause { lits: sorted });
        let external = self.original_count;
        self.original_count += 1;
        {
            let lits = &self.clauses[id].lits;
            self.tracer.clause(id, Some(external), lits, &[]);
        }

        if self.unsat {
            return id;
        }

        if self.clauses[id].lits.is_empty() {
            self.unsat = true;
            self.final_clause = Some(id);
            return id;
        }

        if tautology {
            self.watch_clause(id);
            return id;
        }

        // Sort satisfied and unassigned literals to the front so the watched
        // positions stay sound under the current level-0 assignment.
        let mut front = 0;
        for index in 0..self.clauses[id].lits.len() {
            let lit = self.clauses[id].lits[index];
            if lit_value(&self.values, lit) != Some(false) {
                self.clauses[id].lits.swap(front, index);
                front += 1;
            }
        }

        match front {
            0 => {
                self.watch_clause(id);
                self.conflict_at_level_zero(id);
            }
            1 => {
                self.watch_clause(id);
                let unit = self.clauses[id].lits[0];
                if lit_value(&self.values, unit) == None {
                    self.enqueue(unit, Reason::Clause(id));
                    if let Err(conflict) = self.propagate() {
                        self.conflict_at_level_zero(conflict);
                    }
                }
            }
            _ => self.watch_clause(id),
        }

        id
    }

    /// Checks satisfiability under the given assumptions.
    ///
    /// Returns `None` when interrupted through the terminate flag.
    pub fn solve(&mut self, assumptions: &[Lit]) -> Option<bool> {
        self.backtrack(0);
        self.failed.clear();
        self.assumptions = assumptions.to_vec();
        for &lit in assumptions {
            while lit.index() >= self.values.len() {
                self.new_var();
            }
        }

        if self.unsat {
            self.tracer.conclude_unsat(&[], self.final_clause);
            return Some(false);
        }

        let mut conflicts_at_restart = self.conflicts;
        let mut restart_limit = luby(self.restarts) * RESTART_INTERVAL_SCALE;

        loop {
            if self.terminate.load(Ordering::Relaxed) {
                return None;
            }

            match self.propagate() {
                Err(conflict) => {
                    self.conflicts += 1;
                    if self.decisions.is_empty() {
                        self.conflict_at_level_zero(conflict);
                        self.tracer.conclude_unsat(&[], self.final_clause);
                        return Some(false);
                    }

                    self.learn_from_conflict(conflict);
                    if self.unsat {
                        self.tracer.conclude_unsat(&[], self.final_clause);
                        return Some(false);
                    }

                    if self.conflicts - conflicts_at_restart >= restart_limit {
                        self.restarts += 1;
                        conflicts_at_restart = self.conflicts;
                        restart_limit = luby(self.restarts) * RESTART_INTERVAL_SCALE;
                        debug!("restart {} after {} conflicts", self.restarts, self.conflicts);
                        self.backtrack(0);
                    }
                }
                Ok(()) => {
                    let level = self.decisions.len();
                    if level < self.assumptions.len() {
                        let assumption = self.assumptions[level];
                        match lit_value(&self.values, assumption) {
                            Some(true) => {
                                // Already implied; keep the level structure
                                // aligned with the assumption index.
                                self.decisions.push(self.trail.len());
                            }
                            Some(false) => {
                                let final_clause = self.analyze_failed(assumption);
                                self.tracer.conclude_unsat(&self.failed, final_clause);
                                return Some(false);
                            }
                            None => {
                                self.decisions.push(self.trail.len());
                                self.enqueue(assumption, Reason::Decision);
                            }
                        }
                    } else if let Some(var) = self.pick_branch_var() {
                        self.decisions.push(self.trail.len());
                        let lit = var.lit(self.phase[var.index()]);
                        self.enqueue(lit, Reason::Decision);
                    } else {
                        return Some(true);
                    }
                }
            }
        }
    }

    fn watch_clause(&mut self, id: ClauseId) {
        let lits = &self.clauses[id].lits;
        if lits.len() >= 2 {
            let (first, second) = (lits[0], lits[1]);
            self.watches[first.code()].push(Watch {
                clause: id,
                blocker: second,
            });
            self.watches[second.code()].push(Watch {
                clause: id,
                blocker: first,
            });
        }
    }

    fn enqueue(&mut self, lit: Lit, reason: Reason) {
        debug_assert_eq!(lit_value(&self.values, lit), None);
        self.values[lit.index()] = if lit.is_positive() {
            VALUE_TRUE
        } else {
            VALUE_FALSE
        };
        self.levels[lit.index()] = self.decisions.len() as u32;
        self.reasons[lit.index()] = reason;
        self.trail.push(lit);
    }

    fn backtrack(&mut self, level: usize) {
        if self.decisions.len() <= level {
            return;
        }
        let new_len = self.decisions[level];
        for &lit in &self.trail[new_len..] {
            self.values[lit.index()] = VALUE_UNASSIGNED;
            self.phase[lit.index()] = lit.is_positive();
            self.heap.insert(lit.var(), &self.activity);
        }
        self.trail.truncate(new_len);
        self.queue_head = self.queue_head.min(new_len);
        self.decisions.truncate(level);
    }

    fn pick_branch_var(&mut self) -> Option<Var> {
        while let Some(var) = self.heap.pop_max(&self.activity) {
            if self.values[var.index()] == VALUE_UNASSIGNED {
                return Some(var);
            }
        }
        None
    }

    fn bump_activity(&mut self, var: Var) {
        self.activity[var.index()] += self.activity_inc;
        if self.activity[var.index()] > 1e100 {
            for activity in self.activity.iter_mut() {
                *activity *= 1e-100;
            }
            self.activity_inc *= 1e-100;
        }
        self.heap.bumped(var, &self.activity);
    }

    fn decay_activities(&mut self) {
        self.activity_inc /= 0.95;
    }

    /// Unit propagation; returns the conflicting clause on failure.
    fn propagate(&mut self) -> Result<(), ClauseId> {
        while self.queue_head < self.trail.len() {
            let assigned = self.trail[self.queue_head];
            self.queue_head += 1;
            let false_lit = !assigned;

            let mut watch_list = take(&mut self.watches[false_lit.code()]);
            let mut kept = 0;
            let mut index = 0;

            while index < watch_list.len() {
                let watch = watch_list[index];
                if lit_value(&self.values, watch.blocker) == Some(true) {
                    watch_list[kept] = watch;
                    kept += 1;
                    index += 1;
                    continue;
                }

                enum Outcome {
                    Keep(Lit),
                    Moved(Lit, Lit),
                    Unit(Lit),
                    Conflict,
                }

                let outcome = {
                    let values = &self.values;
                    let lits = &mut self.clauses[watch.clause].lits;
                    if lits[0] == false_lit {
                        lits.swap(0, 1);
                    }
                    debug_assert_eq!(lits[1], false_lit);
                    let first = lits[0];

                    if first != watch.blocker && lit_value(values, first) == Some(true) {
                        Outcome::Keep(first)
                    } else {
                        let mut moved = None;
                        for position in 2..lits.len() {
                            if lit_value(values, lits[position]) != Some(false) {
                                lits.swap(1, position);
                                moved = Some(lits[1]);
                                break;
                            }
                        }
                        match moved {
                            Some(new_watch) => Outcome::Moved(new_watch, first),
                            None => match lit_value(values, first) {
                                Some(false) => Outcome::Conflict,
                                _ => Outcome::Unit(first),
                            },
                        }
                    }
                };

                match outcome {
                    Outcome::Keep(blocker) => {
                        watch_list[kept] = Watch {
                            clause: watch.clause,
                            blocker,
                        };
                        kept += 1;
                    }
                    Outcome::Moved(new_watch, blocker) => {
                        self.watches[new_watch.code()].push(Watch {
                            clause: watch.clause,
                            blocker,
                        });
                    }
                    Outcome::Unit(unit) => {
                        self.enqueue(unit, Reason::Clause(watch.clause));
                        watch_list[kept] = Watch {
                            clause: watch.clause,
                            blocker: unit,
                        };
                        kept += 1;
                    }
                    Outcome::Conflict => {
                        // Keep this and all unprocessed watches, then stop.
                        watch_list[kept] = watch;
                        kept += 1;
                        for rest in index + 1..watch_list.len() {
                            watch_list[kept] = watch_list[rest];
                            kept += 1;
                        }
                        watch_list.truncate(kept);
                        self.watches[false_lit.code()] = watch_list;
                        self.queue_head = self.trail.len();
                        return Err(watch.clause);
                    }
                }
                index += 1;
            }

            watch_list.truncate(kept);
            self.watches[false_lit.code()] = watch_list;
        }
        Ok(())
    }

    /// First-UIP conflict analysis, learning and backjumping.
    fn learn_from_conflict(&mut self, conflict: ClauseId) {
        let current = self.decisions.len();
        let mut chain = vec![conflict];
        let mut others: Vec<Lit> = vec![];
        let mut to_clear: Vec<Var> = vec![];
        let mut path = 0usize;

        let mut clause = conflict;
        let mut pivot: Option<Lit> = None;
        let mut index = self.trail.len();

        let asserting = loop {
            for position in 0..self.clauses[clause].lits.len() {
                let lit = self.clauses[clause].lits[position];
                if Some(lit) == pivot {
                    continue;
                }
                let var = lit.var();
                if self.seen[var.index()] {
                    continue;
                }
                self.seen[var.index()] = true;
                to_clear.push(var);
                self.bump_activity(var);
                let level = self.levels[var.index()] as usize;
                if level == current {
                    path += 1;
                } else if level > 0 {
                    others.push(lit);
                }
                // Level 0 literals stay marked and are resolved away below.
            }

            loop {
                index -= 1;
                let var = self.trail[index].var();
                if self.seen[var.index()] && self.levels[var.index()] as usize == current {
                    break;
                }
            }
            let uip_candidate = self.trail[index];
            self.seen[uip_candidate.index()] = false;
            path -= 1;
            if path == 0 {
                break !uip_candidate;
            }
            clause = match self.reasons[uip_candidate.index()] {
                Reason::Clause(id) => id,
                Reason::Decision => unreachable!("propagated literal without reason clause"),
            };
            chain.push(clause);
            pivot = Some(uip_candidate);
        };

        self.resolve_level_zero(&mut chain, &mut to_clear);

        let mut learned = Vec::with_capacity(others.len() + 1);
        learned.push(asserting);
        learned.extend(others);

        for var in to_clear {
            self.seen[var.index()] = false;
        }

        // Place a literal of the backjump level second so it can be watched.
        let mut backjump = 0;
        for position in 1..learned.len() {
            let level = self.levels[learned[position].index()] as usize;
            if level > backjump {
                backjump = level;
                learned.swap(1, position);
            }
        }

        self.decay_activities();

        let id = self.clauses.len();
        self.clauses.push(StoredClause {
            lits: learned.clone(),
        });
        {
            let lits = &self.clauses[id].lits;
            self.tracer.clause(id, None, lits, &chain);
        }

        self.backtrack(backjump);
        self.watch_clause(id);
        self.enqueue(learned[0], Reason::Clause(id));
    }

    /// Resolves away all still-marked level-0 literals via their reasons,
    /// extending the chain. Newly introduced level-0 literals are resolved
    /// recursively by walking the level-0 trail segment backwards.
    fn resolve_level_zero(&mut self, chain: &mut Vec<ClauseId>, to_clear: &mut Vec<Var>) {
        let zero_end = self.decisions.first().copied().unwrap_or(self.trail.len());
        let mut index = zero_end;
        while index > 0 {
            index -= 1;
            let trail_lit = self.trail[index];
            let var = trail_lit.var();
            if !self.seen[var.index()] || self.levels[var.index()] != 0 {
                continue;
            }
            self.seen[var.index()] = false;
            let reason = match self.reasons[var.index()] {
                Reason::Clause(id) => id,
                Reason::Decision => unreachable!("level 0 assignment without reason clause"),
            };
            chain.push(reason);
            for position in 0..self.clauses[reason].lits.len() {
                let lit = self.clauses[reason].lits[position];
                if lit == trail_lit {
                    continue;
                }
                let other = lit.var();
                if !self.seen[other.index()] {
                    self.seen[other.index()] = true;
                    to_clear.push(other);
                }
            }
        }
    }

    /// A conflict with no decisions on the trail: derive the empty clause.
    fn conflict_at_level_zero(&mut self, conflict: ClauseId) {
        debug_assert!(self.decisions.is_empty());
        let mut chain = vec![conflict];
        let mut to_clear: Vec<Var> = vec![];
        for position in 0..self.clauses[conflict].lits.len() {
            let var = self.clauses[conflict].lits[position].var();
            if !self.seen[var.index()] {
                self.seen[var.index()] = true;
                to_clear.push(var);
            }
        }
        self.resolve_level_zero(&mut chain, &mut to_clear);
        for var in to_clear {
            self.seen[var.index()] = false;
        }

        let id = self.clauses.len();
        self.clauses.push(StoredClause { lits: vec![] });
        self.tracer.clause(id, None, &[], &chain);
        self.unsat = true;
        self.final_clause = Some(id);
    }

    /// The next assumption is already false: compute the failed core and the
    /// final clause over negated failed assumptions.
    ///
    /// Returns `None` without any resolution when the complement of the
    /// assumption was itself assumed.
    fn analyze_failed(&mut self, assumption: Lit) -> Option<ClauseId> {
        let negated = !assumption;

        let reason = match self.reasons[assumption.index()] {
            Reason::Decision => {
                self.failed = vec![negated, assumption];
                return None;
            }
            Reason::Clause(id) => id,
        };

        let mut chain = vec![reason];
        let mut final_lits = vec![negated];
        let mut to_clear: Vec<Var> = vec![];
        self.failed = vec![assumption];

        for position in 0..self.clauses[reason].lits.len() {
            let lit = self.clauses[reason].lits[position];
            if lit == negated {
                continue;
            }
            let var = lit.var();
            if !self.seen[var.index()] {
                self.seen[var.index()] = true;
                to_clear.push(var);
            }
        }

        let mut index = self.trail.len();
        while index > 0 {
            index -= 1;
            let trail_lit = self.trail[index];
            let var = trail_lit.var();
            if !self.seen[var.index()] {
                continue;
            }
            self.seen[var.index()] = false;
            match self.reasons[var.index()] {
                Reason::Clause(id) => {
                    chain.push(id);
                    for position in 0..self.clauses[id].lits.len() {
                        let lit = self.clauses[id].lits[position];
                        if lit == trail_lit {
                            continue;
                        }
                        let other = lit.var();
                        if !self.seen[other.index()] {
                            self.seen[other.index()] = true;
                            to_clear.push(other);
                        }
                    }
                }
                Reason::Decision => {
                    final_lits.push(!trail_lit);
                    self.failed.push(trail_lit);
                }
            }
        }

        for var in to_clear {
            self.seen[var.index()] = false;
        }

        let id = self.clauses.len();
        self.clauses.push(StoredClause { lits: final_lits });
        {
            let lits = &self.clauses[id].lits;
            self.tracer.clause(id, None, lits, &chain);
        }
        Some(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lit(number: isize) -> Lit {
        Lit::from_index(number.abs() as usize - 1, number > 0)
    }

    fn clause(numbers: &[isize]) -> Vec<Lit> {
        numbers.iter().map(|&number| lit(number)).collect()
    }

    fn solver_with(clauses: &[&[isize]]) -> Solver {
        let mut solver = Solver::new();
        for numbers in clauses {
            solver.add_clause(&clause(numbers));
        }
        solver
    }

    #[test]
    fn trivial_sat() {
        let mut solver = solver_with(&[&[1, 2], &[-1, 2], &[1, -2]]);
        assert_eq!(solver.solve(&[]), Some(true));
        assert_eq!(solver.value(lit(1)), Some(true));
        assert_eq!(solver.value(lit(2)), Some(true));
    }

    #[test]
    fn trivial_unsat() {
        let mut solver = solver_with(&[&[1, 2], &[-1, 2], &[1, -2], &[-1, -2]]);
        assert_eq!(solver.solve(&[]), Some(false));
        // Further solves stay unsat.
        assert_eq!(solver.solve(&[]), Some(false));
    }

    #[test]
    fn unit_conflict_unsat() {
        let mut solver = solver_with(&[&[1], &[-1]]);
        assert_eq!(solver.solve(&[]), Some(false));
    }

    #[test]
    fn sat_under_assumptions_then_unsat() {
        let mut solver = solver_with(&[&[-1, 2], &[-2, 3]]);
        assert_eq!(solver.solve(&[lit(1)]), Some(true));
        assert_eq!(solver.value(lit(3)), Some(true));

        assert_eq!(solver.solve(&[lit(1), lit(-3)]), Some(false));
        let failed = solver.failed_core().to_vec();
        assert!(failed.contains(&lit(1)));
        assert!(failed.contains(&lit(-3)));

        // Without the contradicting assumption the formula stays satisfiable.
        assert_eq!(solver.solve(&[lit(-3)]), Some(true));
        assert_eq!(solver.value(lit(1)), Some(false));
    }

    #[test]
    fn contradictory_assumptions() {
        let mut solver = solver_with(&[&[1, 2]]);
        assert_eq!(solver.solve(&[lit(3), lit(-3)]), Some(false));
        let failed = solver.failed_core();
        assert!(failed.contains(&lit(3)));
        assert!(failed.contains(&lit(-3)));
    }

    #[test]
    fn pigeonhole_three_holes() {
        // Four pigeons in three holes: variable p*3+h+1 places pigeon p in
        // hole h.
        let mut solver = Solver::new();
        let var = |pigeon: usize, hole: usize| lit((pigeon * 3 + hole + 1) as isize);
        for pigeon in 0..4 {
            let lits: Vec<Lit> = (0..3).map(|hole| var(pigeon, hole)).collect();
            solver.add_clause(&lits);
        }
        for hole in 0..3 {
            for first in 0..4 {
                for second in first + 1..4 {
                    solver.add_clause(&[!var(first, hole), !var(second, hole)]);
                }
            }
        }
        assert_eq!(solver.solve(&[]), Some(false));
    }

    #[test]
    fn terminate_flag_interrupts() {
        let mut solver = solver_with(&[&[1, 2], &[-1, -2]]);
        solver.terminate_handle().store(true, Ordering::Relaxed);
        assert_eq!(solver.solve(&[]), None);
        solver.terminate_handle().store(false, Ordering::Relaxed);
        assert_eq!(solver.solve(&[]), Some(true));
    }

    /// Replays resolution chains and checks each learned clause is the exact
    /// resolvent of its antecedents.
    #[derive(Default)]
    struct CheckingTracer {
        clauses: Vec<Vec<Lit>>,
        concluded: bool,
    }

    impl CheckingTracer {
        fn resolve(&self, antecedents: &[ClauseId]) -> Vec<Lit> {
            let mut resolvent: Vec<Lit> = self.clauses[antecedents[0]].clone();
            for &antecedent in &antecedents[1..] {
                let mut pivots = vec![];
                for &lit in &self.clauses[antecedent] {
                    if resolvent.contains(&!lit) {
                        pivots.push(lit);
                    }
                }
                assert!(!pivots.is_empty(), "antecedent without pivot");
                resolvent.retain(|lit| !pivots.contains(&!*lit));
                for &lit in &self.clauses[antecedent] {
                    if !pivots.contains(&lit) && !resolvent.contains(&lit) {
                        resolvent.push(lit);
                    }
                }
            }
            resolvent
        }
    }

    impl ProofTracer for CheckingTracer {
        fn clause(
            &mut self,
            id: ClauseId,
            external: Option<usize>,
            lits: &[Lit],
            antecedents: &[ClauseId],
        ) {
            assert_eq!(id, self.clauses.len());
            if external.is_none() {
                let mut resolvent = self.resolve(antecedents);
                let mut learned = lits.to_vec();
                resolvent.sort_by_key(|lit| lit.code());
                learned.sort_by_key(|lit| lit.code());
                assert_eq!(resolvent, learned, "learned clause is not the chain resolvent");
            }
            self.clauses.push(lits.to_vec());
        }

        fn conclude_unsat(&mut self, failed: &[Lit], final_clause: Option<ClauseId>) {
            if let Some(id) = final_clause {
                let expected: Vec<Lit> = failed.iter().map(|&lit| !lit).collect();
                let mut lits = self.clauses[id].clone();
                lits.sort_by_key(|lit| lit.code());
                let mut expected = expected;
                expected.sort_by_key(|lit| lit.code());
                assert_eq!(lits, expected, "final clause is not the negated failed core");
            }
            self.concluded = true;
        }
    }

    #[test]
    fn chains_resolve_to_learned_clauses() {
        let mut solver = Solver::with_tracer(CheckingTracer::default());
        let clauses: &[&[isize]] = &[
            &[1, 2, 3],
            &[-1, 2],
            &[-2, 3, 4],
            &[-3, 4],
            &[-4, 5],
            &[-4, -5, 6],
            &[-6, -1],
            &[1, -6],
            &[6, 1],
        ];
        for numbers in clauses {
            solver.add_clause(&clause(numbers));
        }
        let result = solver.solve(&[]);
        assert!(result.is_some());
        if result == Some(false) {
            assert!(solver.tracer().concluded);
        }
    }

    #[test]
    fn chains_resolve_under_assumptions() {
        let mut solver = Solver::with_tracer(CheckingTracer::default());
        let clauses: &[&[isize]] = &[
            &[-1, 2],
            &[-2, 3],
            &[-3, -4],
            &[4, 5],
            &[4, -5],
        ];
        for numbers in clauses {
            solver.add_clause(&clause(numbers));
        }
        assert_eq!(solver.solve(&[lit(1)]), Some(false));
        assert!(solver.tracer().concluded);
        assert_eq!(solver.failed_core(), &[lit(1)]);
    }

    mod random {
        use super::*;

        use proptest::prelude::*;

        fn brute_force_sat(var_count: usize, clauses: &[Vec<Lit>]) -> bool {
            (0u32..1 << var_count).any(|bits| {
                clauses.iter().all(|clause| {
                    clause
                        .iter()
                        .any(|lit| (bits & (1 << lit.index()) != 0) ^ lit.is_negative())
                })
            })
        }

        fn small_formula() -> impl Strategy<Value = (usize, Vec<Vec<isize>>)> {
            (2usize..=8).prop_flat_map(|vars| {
                let clause = proptest::collection::vec(
                    (1..=vars as isize).prop_flat_map(|v| prop_oneof![Just(v), Just(-v)]),
                    1..=3,
                );
                (
                    Just(vars),
                    proptest::collection::vec(clause, 1..30),
                )
            })
        }

        proptest! {
            #[test]
            fn agrees_with_brute_force((vars, raw) in small_formula()) {
                let clauses: Vec<Vec<Lit>> = raw.iter().map(|numbers| {
                    numbers.iter().map(|&number| lit(number)).collect()
                }).collect();

                let mut solver = Solver::with_tracer(CheckingTracer::default());
                for clause in &clauses {
                    solver.add_clause(clause);
                }
                let result = solver.solve(&[]).unwrap();
                prop_assert_eq!(result, brute_force_sat(vars, &clauses));

                if result {
                    for clause in &clauses {
                        prop_assert!(clause.iter().any(|&lit| solver.value(lit) == Some(true)));
                    }
                }
            }
        }
    }
}
