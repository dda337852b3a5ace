//! Basic formula data types used by the itpmc model checker.
//!
//! A transition system is handed to the checker as three clause sets over
//! *timed* literals: the initial-state predicate `I`, the transition relation
//! `T` and the target predicate `P`. This crate defines those literals, the
//! problem container with its construction-time checks, solver assignments
//! and models, and the and-inverter graph used for unreachability
//! certificates.

pub mod certificate;
pub mod lit;
pub mod problem;

pub use certificate::{Aiger, AigerBuilder, AigerNode, Certificate, CertificateKind};
pub use lit::{Frame, Lit, LitIdx, Var};
pub use problem::{Assignment, BmcModel, BmcProblem, ProblemError};

/// A clause over timed literals.
pub type Clause = Vec<Lit>;

/// An ordered sequence of clauses.
///
/// The order is irrelevant for satisfiability but clause positions are used
/// as identifiers by the proof tracer, so it is kept stable.
pub type Clauses = Vec<Clause>;
