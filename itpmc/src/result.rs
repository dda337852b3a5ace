//! Solver results.
use itpmc_formula::{BmcModel, Certificate};

/// How a solve ended.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum BmcStatus {
    /// The target is reachable; a model is attached.
    Sat,
    /// The target is unreachable; a certificate is attached.
    Unsat,
    DepthLimitReached,
    CraigLimitReached,
    MemoryLimitReached,
    Interrupted,
}

/// Outcome of a [`BmcSolver::solve`](crate::BmcSolver::solve) call.
///
/// Solver status is always returned as a value; only programmer errors
/// (broken proof-tracer invariants) panic.
#[derive(Debug)]
pub struct BmcResult {
    status: BmcStatus,
    model: Option<BmcModel>,
    certificate: Option<Certificate>,
    depth: usize,
}

impl BmcResult {
    pub fn for_model(depth: i32, model: BmcModel) -> BmcResult {
        BmcResult {
            status: BmcStatus::Sat,
            model: Some(model),
            certificate: None,
            depth: depth.max(0) as usize,
        }
    }

    pub fn for_certificate(depth: i32, certificate: Certificate) -> BmcResult {
        BmcResult {
            status: BmcStatus::Unsat,
            model: None,
            certificate: Some(certificate),
            depth: depth.max(0) as usize,
        }
    }

    pub fn for_depth_limit(depth: i32) -> BmcResult {
        BmcResult {
            status: BmcStatus::DepthLimitReached,
            model: None,
            certificate: None,
            depth: depth.max(0) as usize,
        }
    }

    pub fn for_craig_limit(depth: i32) -> BmcResult {
        BmcResult {
            status: BmcStatus::CraigLimitReached,
            model: None,
            certificate: None,
            depth: depth.max(0) as usize,
        }
    }

    pub fn for_interrupt(depth: i32) -> BmcResult {
        BmcResult {
            status: BmcStatus::Interrupted,
            model: None,
            certificate: None,
            depth: depth.max(0) as usize,
        }
    }

    pub fn for_memory_limit() -> BmcResult {
        BmcResult {
            status: BmcStatus::MemoryLimitReached,
            model: None,
            certificate: None,
            depth: 0,
        }
    }

    pub fn status(&self) -> BmcStatus {
        self.status
    }

    /// Depth the result was established at (best effort for limit results).
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn model(&self) -> Option<&BmcModel> {
        self.model.as_ref()
    }

    pub fn certificate(&self) -> Option<&Certificate> {
        self.certificate.as_ref()
    }
}
