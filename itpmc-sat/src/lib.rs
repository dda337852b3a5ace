//! A CDCL based SAT solver with antecedent-tracking proof hooks.
//!
//! This crate is the solver backend of the itpmc model checker. It exposes
//! exactly the capabilities the checker consumes:
//!
//! * solving under assumptions with failed-assumption extraction,
//! * an observer ([`ProofTracer`]) that receives every committed clause
//!   together with its resolution antecedents, suitable for constructing
//!   Craig interpolants on the fly,
//! * a clause-level preprocessor ([`simp`]) that respects a frozen variable
//!   set,
//! * cooperative interruption through an atomic terminate flag.

pub mod heap;
pub mod lit;
pub mod simp;
pub mod solver;
pub mod tracer;

pub use lit::{Lit, Var};
pub use simp::{preprocess, SimpLevel, SimpResult};
pub use solver::Solver;
pub use tracer::{ClauseId, NoopTracer, ProofTracer};
