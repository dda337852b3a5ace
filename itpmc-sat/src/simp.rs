//! Clause-level preprocessing.
//!
//! Simplifies a clause set while preserving equisatisfiability with respect
//! to a frozen variable set: frozen variables are never eliminated and any
//! value forced for them is kept as an explicit unit clause. Non-frozen
//! variables are fair game for pure-literal removal and bounded variable
//! elimination.
//!
//! The caller is responsible for re-deriving witnesses against the original
//! clauses; no reconstruction stack is kept.
use rustc_hash::FxHashSet;

use log::debug;

use crate::lit::Lit;

/// How much effort to spend.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum SimpLevel {
    /// Unit propagation, subsumption and self-subsumption.
    Quick,
    /// Additionally pure-literal removal and bounded variable elimination.
    Expensive,
}

/// Outcome of preprocessing.
pub enum SimpResult {
    Clauses(Vec<Vec<Lit>>),
    /// The clause set is unsatisfiable on its own.
    Unsat,
}

/// Resolution environments larger than this are never eliminated.
const ELIMINATION_OCCURRENCE_LIMIT: usize = 16;

pub fn preprocess(
    var_count: usize,
    clauses: Vec<Vec<Lit>>,
    frozen: &[bool],
    level: SimpLevel,
) -> SimpResult {
    let mut simp = Simplifier::new(var_count, clauses, frozen);
    let input_count = simp.live_count();

    if !simp.propagate_and_subsume() {
        return SimpResult::Unsat;
    }

    if level == SimpLevel::Expensive {
        loop {
            let eliminated = simp.eliminate_round();
            if !simp.propagate_and_subsume() {
                return SimpResult::Unsat;
            }
            if !eliminated {
                break;
            }
        }
    }

    let result = simp.into_clauses();
    debug!(
        "preprocessing reduced {} clauses to {}",
        input_count,
        result.len()
    );
    SimpResult::Clauses(result)
}

struct Simplifier<'a> {
    clauses: Vec<Vec<Lit>>,
    live: Vec<bool>,
    /// 0 unassigned, 1 true, -1 false; only units assign values.
    assignment: Vec<i8>,
    frozen: &'a [bool],
}

impl<'a> Simplifier<'a> {
    fn new(var_count: usize, raw: Vec<Vec<Lit>>, frozen: &'a [bool]) -> Simplifier<'a> {
        let mut clauses = Vec::with_capacity(raw.len());
        let mut known: FxHashSet<Vec<Lit>> = FxHashSet::default();
        'outer: for mut clause in raw {
            clause.sort_by_key(|lit| lit.code());
            clause.dedup();
            for window in clause.windows(2) {
                if window[0] == !window[1] {
                    continue 'outer;
                }
            }
            if known.insert(clause.clone()) {
                clauses.push(clause);
            }
        }

        let live = vec![true; clauses.len()];
        Simplifier {
            clauses,
            live,
            assignment: vec![0; var_count],
            frozen,
        }
    }

    fn live_count(&self) -> usize {
        self.live.iter().filter(|&&live| live).count()
    }

    fn lit_value(&self, lit: Lit) -> Option<bool> {
        match self.assignment[lit.index()] {
            0 => None,
            value => Some((value > 0) ^ lit.is_negative()),
        }
    }

    /// Returns false on a conflicting unit.
    fn assign(&mut self, lit: Lit) -> bool {
        match self.lit_value(lit) {
            Some(true) => true,
            Some(false) => false,
            None => {
                self.assignment[lit.index()] = if lit.is_positive() { 1 } else { -1 };
                true
            }
        }
    }

    /// Runs unit propagation and subsumption to a fixed point.
    ///
    /// Returns false when the clause set is unsatisfiable.
    fn propagate_and_subsume(&mut self) -> bool {
        loop {
            match self.propagate_units() {
                None => return false,
                Some(true) => continue,
                Some(false) => {}
            }
            if !self.subsume_round() {
                break;
            }
        }
        true
    }

    /// One pass applying the current assignment and collecting new units.
    ///
    /// Returns `None` on conflict, otherwise whether anything changed.
    fn propagate_units(&mut self) -> Option<bool> {
        let mut changed = false;
        loop {
            let mut progress = false;
            for index in 0..self.clauses.len() {
                if !self.live[index] {
                    continue;
                }
                if self.clauses[index]
                    .iter()
                    .any(|&lit| self.lit_value(lit) == Some(true))
                {
                    self.live[index] = false;
                    progress = true;
                    continue;
                }
                let before = self.clauses[index].len();
                // No literal is true here, so every assigned literal is false.
                let assignment = &self.assignment;
                self.clauses[index].retain(|&lit| assignment[lit.index()] == 0);
                if self.clauses[index].is_empty() {
                    return None;
                }
                if self.clauses[index].len() != before {
                    progress = true;
                }
                if self.clauses[index].len() == 1 {
                    let unit = self.clauses[index][0];
                    if !self.assign(unit) {
                        return None;
                    }
                    self.live[index] = false;
                    progress = true;
                }
            }
            if !progress {
                break;
            }
            changed = true;
        }
        Some(changed)
    }

    /// Occurrence-list based subsumption and self-subsumption.
    ///
    /// Returns whether anything changed.
    fn subsume_round(&mut self) -> bool {
        let occurrences = self.occurrence_lists();
        let occurrence_count = |lit: Lit| occurrences[lit.code()].len();

        let mut order: Vec<usize> = (0..self.clauses.len())
            .filter(|&index| self.live[index])
            .collect();
        order.sort_by_key(|&index| self.clauses[index].len());

        let mut changed = false;
        for &index in &order {
            if !self.live[index] {
                continue;
            }
            let clause = self.clauses[index].clone();
            if clause.is_empty() {
                continue;
            }

            // Subsumption: check candidates sharing the rarest literal.
            let rarest = *clause
                .iter()
                .min_by_key(|&&lit| occurrence_count(lit))
                .unwrap();
            for &other in &occurrences[rarest.code()] {
                if other == index || !self.live[other] {
                    continue;
                }
                if is_subset(&clause, &self.clauses[other]) {
                    self.live[other] = false;
                    changed = true;
                }
            }

            // Self-subsuming resolution: C with one literal flipped subsumes
            // D, so the flipped literal can be removed from D.
            for position in 0..clause.len() {
                let mut flipped = clause.clone();
                flipped[position] = !flipped[position];
                flipped.sort_by_key(|lit| lit.code());
                let pivot = !clause[position];
                for &other in &occurrences[pivot.code()] {
                    if other == index || !self.live[other] {
                        continue;
                    }
                    if is_subset(&flipped, &self.clauses[other]) {
                        let others = &mut self.clauses[other];
                        others.retain(|&lit| lit != pivot);
                        changed = true;
                    }
                }
            }
        }
        changed
    }

    /// One round of pure-literal removal and bounded variable elimination
    /// over non-frozen variables. Returns whether a variable was eliminated.
    fn eliminate_round(&mut self) -> bool {
        let mut eliminated = false;
        for var_index in 0..self.assignment.len() {
            if self.frozen.get(var_index).copied().unwrap_or(false)
                || self.assignment[var_index] != 0
            {
                continue;
            }

            let positive = Lit::from_index(var_index, true);
            let negative = Lit::from_index(var_index, false);
            let occurrences = self.occurrence_lists();
            let pos: Vec<usize> = occurrences[positive.code()]
                .iter()
                .copied()
                .filter(|&index| self.live[index])
                .collect();
            let neg: Vec<usize> = occurrences[negative.code()]
                .iter()
                .copied()
                .filter(|&index| self.live[index])
                .collect();

            if pos.is_empty() && neg.is_empty() {
                continue;
            }
            if pos.is_empty() || neg.is_empty() {
                // Pure literal: satisfying it drops every occurrence.
                for &index in pos.iter().chain(neg.iter()) {
                    self.live[index] = false;
                }
                eliminated = true;
                continue;
            }
            if pos.len() + neg.len() > ELIMINATION_OCCURRENCE_LIMIT {
                continue;
            }

            let mut resolvents = Vec::new();
            for &pos_index in &pos {
                'neg: for &neg_index in &neg {
                    let mut resolvent: Vec<Lit> = self.clauses[pos_index]
                        .iter()
                        .chain(self.clauses[neg_index].iter())
                        .copied()
                        .filter(|&lit| lit.index() != var_index)
                        .collect();
                    resolvent.sort_by_key(|lit| lit.code());
                    resolvent.dedup();
                    for window in resolvent.windows(2) {
                        if window[0] == !window[1] {
                            continue 'neg;
                        }
                    }
                    resolvents.push(resolvent);
                }
            }

            if resolvents.len() >= pos.len() + neg.len() {
                continue;
            }

            for &index in pos.iter().chain(neg.iter()) {
                self.live[index] = false;
            }
            for resolvent in resolvents {
                self.live.push(true);
                self.clauses.push(resolvent);
            }
            eliminated = true;
        }
        eliminated
    }

    fn occurrence_lists(&self) -> Vec<Vec<usize>> {
        let mut occurrences = vec![vec![]; self.assignment.len() * 2];
        for (index, clause) in self.clauses.iter().enumerate() {
            if !self.live[index] {
                continue;
            }
            for &lit in clause {
                occurrences[lit.code()].push(index);
            }
        }
        occurrences
    }

    fn into_clauses(self) -> Vec<Vec<Lit>> {
        let mut result: Vec<Vec<Lit>> = self
            .clauses
            .into_iter()
            .zip(self.live)
            .filter_map(|(clause, live)| if live { Some(clause) } else { None })
            .collect();

        // Values forced for frozen variables stay visible as units.
        for (var_index, &value) in self.assignment.iter().enumerate() {
            if value != 0 && self.frozen.get(var_index).copied().unwrap_or(false) {
                result.push(vec![Lit::from_index(var_index, value > 0)]);
            }
        }
        result
    }
}

fn is_subset(clause: &[Lit], other: &[Lit]) -> bool {
    if clause.len() > other.len() {
        return false;
    }
    clause.iter().all(|lit| other.contains(lit))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lit(number: isize) -> Lit {
        Lit::from_index(number.abs() as usize - 1, number > 0)
    }

    fn clauses(raw: &[&[isize]]) -> Vec<Vec<Lit>> {
        raw.iter()
            .map(|numbers| numbers.iter().map(|&number| lit(number)).collect())
            .collect()
    }

    fn run(var_count: usize, raw: &[&[isize]], frozen: &[bool], level: SimpLevel) -> SimpResult {
        preprocess(var_count, clauses(raw), frozen, level)
    }

    #[test]
    fn keeps_frozen_units() {
        let frozen = vec![true, false];
        match run(2, &[&[1], &[-1, 2], &[2, 2]], &frozen, SimpLevel::Quick) {
            SimpResult::Clauses(result) => {
                // 2 is forced but not frozen, 1 is forced and frozen.
                assert_eq!(result, vec![vec![lit(1)]]);
            }
            SimpResult::Unsat => panic!("unexpected unsat"),
        }
    }

    #[test]
    fn detects_unsat() {
        let frozen = vec![false; 2];
        match run(2, &[&[1], &[-1, 2], &[-2]], &frozen, SimpLevel::Quick) {
            SimpResult::Unsat => (),
            SimpResult::Clauses(result) => panic!("expected unsat, got {:?}", result),
        }
    }

    #[test]
    fn subsumption_drops_weaker_clause() {
        let frozen = vec![true; 3];
        match run(3, &[&[1, 2], &[1, 2, 3]], &frozen, SimpLevel::Quick) {
            SimpResult::Clauses(result) => {
                assert_eq!(result, vec![vec![lit(1), lit(2)]]);
            }
            SimpResult::Unsat => panic!("unexpected unsat"),
        }
    }

    #[test]
    fn self_subsumption_strengthens() {
        let frozen = vec![true; 3];
        match run(3, &[&[1, 2], &[-1, 2, 3]], &frozen, SimpLevel::Quick) {
            SimpResult::Clauses(result) => {
                assert!(result.contains(&vec![lit(1), lit(2)]));
                assert!(result.contains(&vec![lit(2), lit(3)]));
            }
            SimpResult::Unsat => panic!("unexpected unsat"),
        }
    }

    #[test]
    fn eliminates_unfrozen_variable() {
        // 3 links 1 and 2; eliminating it resolves to a single clause.
        let frozen = vec![true, true, false];
        match run(3, &[&[1, 3], &[-3, 2]], &frozen, SimpLevel::Expensive) {
            SimpResult::Clauses(result) => {
                assert_eq!(result, vec![vec![lit(1), lit(2)]]);
            }
            SimpResult::Unsat => panic!("unexpected unsat"),
        }
    }

    #[test]
    fn never_eliminates_frozen_variable() {
        let frozen = vec![true; 3];
        match run(3, &[&[1, 3], &[-3, 2]], &frozen, SimpLevel::Expensive) {
            SimpResult::Clauses(mut result) => {
                result.sort();
                assert_eq!(result.len(), 2);
                assert!(result
                    .iter()
                    .all(|clause| clause.iter().any(|l| l.index() == 2)));
            }
            SimpResult::Unsat => panic!("unexpected unsat"),
        }
    }

    #[test]
    fn pure_literal_removal() {
        let frozen = vec![true, false];
        match run(2, &[&[1, 2], &[-1, 2]], &frozen, SimpLevel::Expensive) {
            SimpResult::Clauses(result) => {
                // 2 occurs only positively and is not frozen.
                assert_eq!(result, Vec::<Vec<Lit>>::new());
            }
            SimpResult::Unsat => panic!("unexpected unsat"),
        }
    }

    mod random {
        use super::*;

        use proptest::prelude::*;

        fn eval(clauses: &[Vec<Lit>], bits: u32) -> bool {
            clauses.iter().all(|clause| {
                clause
                    .iter()
                    .any(|lit| (bits & (1 << lit.index()) != 0) ^ lit.is_negative())
            })
        }

        fn small_formula() -> impl Strategy<Value = (usize, Vec<Vec<isize>>)> {
            (2usize..=6).prop_flat_map(|vars| {
                let clause = proptest::collection::vec(
                    (1..=vars as isize).prop_flat_map(|v| prop_oneof![Just(v), Just(-v)]),
                    1..=3,
                );
                (Just(vars), proptest::collection::vec(clause, 0..20))
            })
        }

        proptest! {
            #[test]
            fn preserves_satisfiability((vars, raw) in small_formula()) {
                let input: Vec<Vec<Lit>> = raw.iter().map(|numbers| {
                    numbers.iter().map(|&number| lit(number)).collect()
                }).collect();
                let frozen = vec![false; vars];

                let input_sat = (0u32..1 << vars).any(|bits| eval(&input, bits));
                for &level in &[SimpLevel::Quick, SimpLevel::Expensive] {
                    match preprocess(vars, input.clone(), &frozen, level) {
                        SimpResult::Unsat => prop_assert!(!input_sat),
                        SimpResult::Clauses(output) => {
                            let output_sat = (0u32..1 << vars).any(|bits| eval(&output, bits));
                            prop_assert_eq!(output_sat, input_sat);
                        }
                    }
                }
            }
        }
    }
}
