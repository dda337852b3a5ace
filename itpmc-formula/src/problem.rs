//! Transition-system problems, assignments and models.
use std::ops;

use thiserror::Error;

use crate::lit::{Frame, Lit};
use crate::{Clause, Clauses};

/// Errors detected while checking a [`BmcProblem`] for consistency.
///
/// These are construction-time failures: a problem that passes
/// [`BmcProblem::check`] never produces them again during solving.
#[derive(Debug, Error)]
pub enum ProblemError {
    #[error("literal in {section} refers to non-existing variable {var}")]
    VarOutOfRange { section: &'static str, var: usize },
    #[error("literal in {section} is declared for timeframe {frame}")]
    FrameNotZero { section: &'static str, frame: Frame },
    #[error("literal in TRANS is declared for timeframe {frame}, which is < 0 or > 1")]
    TransFrameOutOfRange { frame: Frame },
}

/// A bounded model checking problem `(n_vars, I, T, P)`.
///
/// `I` and `P` are clause sets over timeframe 0, `T` is a clause set over
/// timeframes 0 and 1. Unrolling is expressed by shifting literals, never by
/// duplicating variables.
#[derive(Clone, Debug)]
pub struct BmcProblem {
    var_count: usize,
    init: Clauses,
    trans: Clauses,
    target: Clauses,
}

impl BmcProblem {
    pub fn new(var_count: usize, init: Clauses, trans: Clauses, target: Clauses) -> BmcProblem {
        BmcProblem {
            var_count,
            init,
            trans,
            target,
        }
    }

    /// Number of variables of the transition system.
    pub fn var_count(&self) -> usize {
        self.var_count
    }

    /// Clauses of the initial-state predicate `I`.
    pub fn init(&self) -> &Clauses {
        &self.init
    }

    /// Clauses of the transition relation `T`.
    pub fn trans(&self) -> &Clauses {
        &self.trans
    }

    /// Clauses of the target predicate `P`.
    pub fn target(&self) -> &Clauses {
        &self.target
    }

    /// Checks variable ranges and timeframe placement of all three sections.
    pub fn check(&self) -> Result<(), ProblemError> {
        let check_section =
            |section: &'static str, clauses: &Clauses, max_frame: Frame| -> Result<(), ProblemError> {
                for clause in clauses {
                    for &lit in clause {
                        if lit.index() >= self.var_count {
                            return Err(ProblemError::VarOutOfRange {
                                section,
                                var: lit.index(),
                            });
                        }
                        if lit.frame() < 0 || lit.frame() > max_frame {
                            if max_frame == 0 {
                                return Err(ProblemError::FrameNotZero {
                                    section,
                                    frame: lit.frame(),
                                });
                            } else {
                                return Err(ProblemError::TransFrameOutOfRange {
                                    frame: lit.frame(),
                                });
                            }
                        }
                    }
                }
                Ok(())
            };

        check_section("INIT", &self.init, 0)?;
        check_section("TRANS", &self.trans, 1)?;
        check_section("TARGET", &self.target, 0)?;
        Ok(())
    }
}

/// A three-valued assignment of a variable in one timeframe.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Assignment {
    Negative,
    Positive,
    DontCare,
}

impl ops::Not for Assignment {
    type Output = Assignment;

    fn not(self) -> Assignment {
        match self {
            Assignment::Negative => Assignment::Positive,
            Assignment::Positive => Assignment::Negative,
            Assignment::DontCare => Assignment::DontCare,
        }
    }
}

impl ops::BitXor<bool> for Assignment {
    type Output = Assignment;

    fn bitxor(self, invert: bool) -> Assignment {
        if invert {
            !self
        } else {
            self
        }
    }
}

impl Assignment {
    /// Single character display used by all witness writers.
    pub fn symbol(self) -> char {
        match self {
            Assignment::Negative => '0',
            Assignment::Positive => '1',
            Assignment::DontCare => 'X',
        }
    }
}

/// A witness trace: one assignment vector per timeframe, one entry per
/// original problem variable.
#[derive(Clone, Debug, Default)]
pub struct BmcModel {
    timeframes: Vec<Vec<Assignment>>,
}

impl BmcModel {
    pub fn new(timeframes: Vec<Vec<Assignment>>) -> BmcModel {
        BmcModel { timeframes }
    }

    pub fn timeframes(&self) -> &[Vec<Assignment>] {
        &self.timeframes
    }

    pub fn timeframe(&self, frame: usize) -> &[Assignment] {
        &self.timeframes[frame]
    }

    /// The value of a timed literal under this model.
    pub fn assignment(&self, lit: Lit) -> Assignment {
        self.timeframes[lit.frame() as usize][lit.index()] ^ lit.is_negative()
    }

    /// Whether the literal is satisfied; don't-cares satisfy nothing.
    pub fn satisfies(&self, lit: Lit) -> bool {
        self.assignment(lit) == Assignment::Positive
    }

    /// Whether every clause has a satisfied literal after shifting.
    pub fn satisfies_clauses(&self, clauses: &[Clause], shift: Frame) -> bool {
        clauses.iter().all(|clause| {
            clause
                .iter()
                .any(|&lit| self.satisfies(lit.shift(shift)))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lit(number: isize, frame: Frame) -> Lit {
        Lit::from_dimacs(number).at(frame)
    }

    #[test]
    fn accepts_valid_problem() {
        let problem = BmcProblem::new(
            2,
            vec![vec![lit(1, 0)]],
            vec![vec![lit(-1, 0), lit(2, 1)]],
            vec![vec![lit(2, 0)]],
        );
        assert!(problem.check().is_ok());
    }

    #[test]
    fn rejects_out_of_range_variable() {
        let problem = BmcProblem::new(1, vec![vec![lit(2, 0)]], vec![], vec![]);
        match problem.check() {
            Err(ProblemError::VarOutOfRange { section: "INIT", var: 1 }) => (),
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn rejects_shifted_init_and_target() {
        let problem = BmcProblem::new(1, vec![vec![lit(1, 1)]], vec![], vec![]);
        assert!(matches!(
            problem.check(),
            Err(ProblemError::FrameNotZero { section: "INIT", frame: 1 })
        ));

        let problem = BmcProblem::new(1, vec![], vec![], vec![vec![lit(1, -1)]]);
        assert!(matches!(
            problem.check(),
            Err(ProblemError::FrameNotZero { section: "TARGET", frame: -1 })
        ));
    }

    #[test]
    fn rejects_deep_trans_frame() {
        let problem = BmcProblem::new(1, vec![], vec![vec![lit(1, 2)]], vec![]);
        assert!(matches!(
            problem.check(),
            Err(ProblemError::TransFrameOutOfRange { frame: 2 })
        ));
    }

    #[test]
    fn model_lookup_applies_polarity() {
        let model = BmcModel::new(vec![
            vec![Assignment::Positive, Assignment::DontCare],
            vec![Assignment::Negative, Assignment::Negative],
        ]);
        assert_eq!(model.assignment(lit(1, 0)), Assignment::Positive);
        assert_eq!(model.assignment(lit(-1, 0)), Assignment::Negative);
        assert_eq!(model.assignment(lit(2, 0)), Assignment::DontCare);
        assert_eq!(model.assignment(lit(-2, 1)), Assignment::Positive);
        assert!(model.satisfies_clauses(&[vec![lit(1, 0)], vec![lit(-1, 1)]], 0));
        assert!(!model.satisfies_clauses(&[vec![lit(2, 0)]], 0));
    }
}
