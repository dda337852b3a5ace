//! Portfolio composition of differently configured engines.
use std::thread;

use log::info;

use crate::engine::{BmcSolver, InterruptHandle};
use crate::result::{BmcResult, BmcStatus};

/// Runs several [`BmcSolver`] instances in parallel on the same problem;
/// the first SAT or UNSAT finisher interrupts the rest.
pub struct PortfolioBmcSolver {
    solvers: Vec<BmcSolver>,
}

impl PortfolioBmcSolver {
    pub fn new(solvers: Vec<BmcSolver>) -> PortfolioBmcSolver {
        PortfolioBmcSolver { solvers }
    }

    /// Handles for interrupting the portfolio from outside.
    pub fn interrupt_handles(&self) -> Vec<InterruptHandle> {
        self.solvers
            .iter()
            .map(|solver| solver.interrupt_handle())
            .collect()
    }

    pub fn interrupt(&self) {
        for solver in &self.solvers {
            solver.interrupt();
        }
    }

    pub fn clear_interrupt(&self) {
        for solver in &self.solvers {
            solver.clear_interrupt();
        }
    }

    pub fn is_interrupted(&self) -> bool {
        self.solvers.iter().any(|solver| solver.is_interrupted())
    }

    /// Solves on one thread per configured engine.
    ///
    /// Decisive results win; limit results only replace the placeholder left
    /// by interrupted engines.
    pub fn solve(self) -> BmcResult {
        let handles = self.interrupt_handles();

        let workers: Vec<thread::JoinHandle<BmcResult>> = self
            .solvers
            .into_iter()
            .enumerate()
            .map(|(index, mut solver)| {
                let all_handles = handles.clone();
                thread::spawn(move || {
                    let result = solver.solve();
                    if matches!(result.status(), BmcStatus::Sat | BmcStatus::Unsat) {
                        info!("portfolio solver {} finished first", index);
                        for handle in &all_handles {
                            handle.interrupt();
                        }
                    }
                    result
                })
            })
            .collect();

        let mut merged = BmcResult::for_interrupt(0);
        for worker in workers {
            let result = worker.join().expect("portfolio worker panicked");
            match result.status() {
                BmcStatus::Sat => {
                    debug_assert!(merged.status() != BmcStatus::Unsat);
                    merged = result;
                }
                BmcStatus::Unsat => {
                    debug_assert!(merged.status() != BmcStatus::Sat);
                    merged = result;
                }
                BmcStatus::DepthLimitReached
                | BmcStatus::CraigLimitReached
                | BmcStatus::MemoryLimitReached => {
                    if merged.status() == BmcStatus::Interrupted {
                        merged = result;
                    }
                }
                BmcStatus::Interrupted => {}
            }
        }
        merged
    }
}
