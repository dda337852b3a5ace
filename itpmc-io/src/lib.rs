//! Transition-system format support for the itpmc model checker.
//!
//! Three parser/writer pairs map between host formats and the abstract
//! [`BmcProblem`](itpmc_formula::BmcProblem):
//!
//! * [`aiger`] — binary and ASCII and-inverter graphs with latches, bad
//!   states and invariant constraints,
//! * [`cip`] — the textual clause-indexed problem format with `DECL`,
//!   `INIT`, `TRANS` and `TARGET` sections,
//! * [`dimspec`] — four DIMACS-style sections for universal, initial, goal
//!   and transition clauses.
//!
//! Each module also writes witnesses for satisfiable results and re-emits
//! the problem with the target replaced by a proven invariant for
//! unsatisfiable ones. The [`Problem`] wrapper dispatches those operations
//! over whatever format the input happened to be in.
use std::io;

use anyhow::Error;

use itpmc_formula::{BmcModel, BmcProblem, Certificate};

pub mod aiger;
pub mod cip;
pub mod dimspec;

pub use aiger::{AigProblem, AigProblemBuilder, AigerError};
pub use cip::{CipError, CipProblem, CipProblemBuilder, CipVarKind};
pub use dimspec::{DimspecError, DimspecProblem, DimspecProblemBuilder};

/// Input format selector.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Format {
    Aiger,
    Cip,
    Dimspec,
}

/// A parsed problem in its host format, kept around for exporting results.
pub enum Problem {
    Aiger(AigProblem),
    Cip(CipProblem),
    Dimspec(DimspecProblem),
}

/// Parses a problem in the given format.
pub fn parse_problem(format: Format, input: impl io::Read) -> Result<(Problem, BmcProblem), Error> {
    match format {
        Format::Aiger => {
            let (problem, bmc) = aiger::parse_aiger_problem(input)?;
            Ok((Problem::Aiger(problem), bmc))
        }
        Format::Cip => {
            let (problem, bmc) = cip::parse_cip_problem(input)?;
            Ok((Problem::Cip(problem), bmc))
        }
        Format::Dimspec => {
            let (problem, bmc) = dimspec::parse_dimspec_problem(input)?;
            Ok((Problem::Dimspec(problem), bmc))
        }
    }
}

impl Problem {
    /// Re-emits the problem in its host format.
    pub fn write(&self, target: &mut impl io::Write) -> Result<(), Error> {
        match self {
            Problem::Aiger(problem) => aiger::write_aiger_problem(target, problem)?,
            Problem::Cip(problem) => cip::write_cip_problem(target, problem)?,
            Problem::Dimspec(problem) => dimspec::write_dimspec_problem(target, problem)?,
        }
        Ok(())
    }

    /// Writes a witness trace in the host format.
    pub fn write_model(&self, target: &mut impl io::Write, model: &BmcModel) -> Result<(), Error> {
        match self {
            Problem::Aiger(problem) => aiger::write_aiger_model(target, problem, model)?,
            Problem::Cip(problem) => cip::write_cip_model(target, problem, model)?,
            Problem::Dimspec(problem) => dimspec::write_dimspec_model(target, problem, model)?,
        }
        Ok(())
    }

    /// Writes an unreachability certificate in the host format.
    pub fn write_certificate(
        &self,
        target: &mut impl io::Write,
        certificate: &Certificate,
    ) -> Result<(), Error> {
        match self {
            Problem::Aiger(problem) => aiger::write_aiger_certificate(target, problem, certificate)?,
            Problem::Cip(problem) => cip::write_cip_certificate(target, problem, certificate)?,
            Problem::Dimspec(problem) => {
                dimspec::write_dimspec_certificate(target, problem, certificate)?
            }
        }
        Ok(())
    }
}
