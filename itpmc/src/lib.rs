//! Interpolation-based unbounded model checking.
//!
//! Given a transition system `(I, T, P)` in clause form this crate decides
//! whether a state satisfying `P` is reachable from `I`, returning either a
//! concrete trace or an inductive certificate. The core is bounded model
//! checking with Craig interpolation: UNSAT unrollings yield interpolants
//! that over-approximate the reachable states one step further, and a fixed
//! point of their union proves unreachability without a depth bound.
//!
//! ```no_run
//! use itpmc::{BmcConfig, BmcSolver, BmcStatus};
//! use itpmc_formula::{BmcProblem, Lit};
//!
//! // A single latch that can never leave its reset state.
//! let lit = |n: isize, frame: i32| Lit::from_dimacs(n).at(frame);
//! let problem = BmcProblem::new(
//!     1,
//!     vec![vec![lit(-1, 0)]],
//!     vec![vec![lit(1, 0), lit(-1, 1)], vec![lit(-1, 0), lit(1, 1)]],
//!     vec![vec![lit(1, 0)]],
//! );
//!
//! let mut solver = BmcSolver::new(problem, BmcConfig::default());
//! let result = solver.solve();
//! assert_eq!(result.status(), BmcStatus::Unsat);
//! ```

pub mod adapter;
pub mod aig;
pub mod config;
pub mod engine;
pub mod portfolio;
pub mod result;
pub mod tracer;

pub use config::{BmcConfig, InterpolantKind, LogLevel, PreprocessLevel};
pub use engine::{BmcSolver, InterruptHandle};
pub use portfolio::PortfolioBmcSolver;
pub use result::{BmcResult, BmcStatus};
