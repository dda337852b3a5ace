//! End-to-end checks of the model checking engine on small transition
//! systems with brute-force verification of models and certificates.
use itpmc::{BmcConfig, BmcResult, BmcSolver, BmcStatus, InterpolantKind, LogLevel};
use itpmc_formula::{Assignment, BmcProblem, Certificate, Clauses, Lit};

fn lit(number: isize, frame: i32) -> Lit {
    Lit::from_dimacs(number).at(frame)
}

fn quiet_config() -> BmcConfig {
    let mut config = BmcConfig::default();
    config.log_level = LogLevel::None;
    config.max_depth = 20;
    config
}

fn eval_lit(lit: Lit, state: u32, next: u32) -> bool {
    let bits = if lit.frame() == 0 { state } else { next };
    (bits & (1 << lit.index()) != 0) ^ lit.is_negative()
}

fn eval_clauses(clauses: &Clauses, state: u32, next: u32) -> bool {
    clauses
        .iter()
        .all(|clause| clause.iter().any(|&lit| eval_lit(lit, state, next)))
}

/// Checks `I ⇒ R`, `R ∧ T ⇒ R'` and `R ⇒ ¬P` for `R = I ∨ certificate` by
/// enumerating all states.
fn check_certificate(problem: &BmcProblem, certificate: &Certificate) {
    let count = problem.var_count();
    assert!(count <= 8, "brute force check needs a small state space");

    let invariant = |state: u32| {
        eval_clauses(problem.init(), state, 0)
            || certificate.evaluate_roots(&|lit| state & (1 << lit.index()) != 0)
    };

    for state in 0..1u32 << count {
        if !invariant(state) {
            continue;
        }
        assert!(
            !eval_clauses(problem.target(), state, 0),
            "invariant contains target state {:b}",
            state
        );
        for next in 0..1u32 << count {
            if eval_clauses(problem.trans(), state, next) {
                assert!(
                    invariant(next),
                    "invariant not closed under transition {:b} -> {:b}",
                    state,
                    next
                );
            }
        }
    }
}

/// Checks that a model is a genuine trace ending in the target.
fn check_model(problem: &BmcProblem, result: &BmcResult) {
    let model = result.model().expect("sat result without model");
    let depth = result.depth();
    assert_eq!(model.timeframes().len(), depth + 1);
    assert!(model.satisfies_clauses(problem.init(), 0));
    for frame in 0..depth {
        assert!(
            model.satisfies_clauses(problem.trans(), frame as i32),
            "transition violated at frame {}",
            frame
        );
    }
    assert!(model.satisfies_clauses(problem.target(), depth as i32));
}

/// A single variable where the target equals the initial state.
fn trivial_reach() -> BmcProblem {
    BmcProblem::new(
        1,
        vec![vec![lit(1, 0)]],
        vec![vec![lit(-1, 0), lit(-1, 1)]],
        vec![vec![lit(1, 0)]],
    )
}

/// A latch that keeps its value and starts away from the target.
fn constant_latch() -> BmcProblem {
    BmcProblem::new(
        1,
        vec![vec![lit(-1, 0)]],
        vec![vec![lit(1, 0), lit(-1, 1)], vec![lit(-1, 0), lit(1, 1)]],
        vec![vec![lit(1, 0)]],
    )
}

/// Transition clauses of a three-bit counter over (a, b, c) = (1, 2, 3)
/// with a as the least significant bit.
fn counter_trans() -> Clauses {
    vec![
        // a' = !a
        vec![lit(1, 0), lit(1, 1)],
        vec![lit(-1, 0), lit(-1, 1)],
        // b' = a xor b
        vec![lit(-2, 1), lit(1, 0), lit(2, 0)],
        vec![lit(-2, 1), lit(-1, 0), lit(-2, 0)],
        vec![lit(2, 1), lit(1, 0), lit(-2, 0)],
        vec![lit(2, 1), lit(-1, 0), lit(2, 0)],
        // c' = (a and b) xor c
        vec![lit(-1, 0), lit(-2, 0), lit(-3, 0), lit(-3, 1)],
        vec![lit(-1, 0), lit(-2, 0), lit(3, 0), lit(3, 1)],
        vec![lit(1, 0), lit(-3, 0), lit(3, 1)],
        vec![lit(2, 0), lit(-3, 0), lit(3, 1)],
        vec![lit(1, 0), lit(3, 0), lit(-3, 1)],
        vec![lit(2, 0), lit(3, 0), lit(-3, 1)],
    ]
}

/// The full counter counting from zero towards all-ones.
fn counter_reachable() -> BmcProblem {
    BmcProblem::new(
        3,
        vec![vec![lit(-1, 0)], vec![lit(-2, 0)], vec![lit(-3, 0)]],
        counter_trans(),
        vec![vec![lit(1, 0)], vec![lit(2, 0)], vec![lit(3, 0)]],
    )
}

/// A counter whose high bit is stuck at zero, making the all-ones target
/// unreachable. The reachable set has four of the eight states.
fn counter_stuck_bit() -> BmcProblem {
    let mut trans = vec![
        // a' = !a
        vec![lit(1, 0), lit(1, 1)],
        vec![lit(-1, 0), lit(-1, 1)],
        // b' = a xor b
        vec![lit(-2, 1), lit(1, 0), lit(2, 0)],
        vec![lit(-2, 1), lit(-1, 0), lit(-2, 0)],
        vec![lit(2, 1), lit(1, 0), lit(-2, 0)],
        vec![lit(2, 1), lit(-1, 0), lit(2, 0)],
    ];
    // c' = c
    trans.push(vec![lit(-3, 0), lit(3, 1)]);
    trans.push(vec![lit(3, 0), lit(-3, 1)]);

    BmcProblem::new(
        3,
        vec![vec![lit(-1, 0)], vec![lit(-2, 0)], vec![lit(-3, 0)]],
        trans,
        vec![vec![lit(1, 0)], vec![lit(2, 0)], vec![lit(3, 0)]],
    )
}

const ALL_INTERPOLANTS: [InterpolantKind; 8] = [
    InterpolantKind::Symmetric,
    InterpolantKind::Asymmetric,
    InterpolantKind::DualSymmetric,
    InterpolantKind::DualAsymmetric,
    InterpolantKind::Intersection,
    InterpolantKind::Union,
    InterpolantKind::Smallest,
    InterpolantKind::Largest,
];

#[test]
fn target_in_initial_state() {
    let problem = trivial_reach();
    let mut solver = BmcSolver::new(problem.clone(), quiet_config());
    let result = solver.solve();
    assert_eq!(result.status(), BmcStatus::Sat);
    assert_eq!(result.depth(), 0);
    check_model(&problem, &result);
    assert_eq!(
        result.model().unwrap().timeframe(0),
        &[Assignment::Positive]
    );
}

#[test]
fn target_in_initial_state_without_sanity_checks() {
    // Without the base-case shortcut the depth-0 unrolling finds the trace.
    let problem = trivial_reach();
    let mut config = quiet_config();
    config.sanity_checks = false;
    let mut solver = BmcSolver::new(problem.clone(), config);
    let result = solver.solve();
    assert_eq!(result.status(), BmcStatus::Sat);
    assert_eq!(result.depth(), 0);
    check_model(&problem, &result);
}

#[test]
fn constant_latch_never_reaches_target() {
    let problem = constant_latch();
    let mut solver = BmcSolver::new(problem.clone(), quiet_config());
    let result = solver.solve();
    assert_eq!(result.status(), BmcStatus::Unsat);
    check_certificate(&problem, result.certificate().unwrap());
}

#[test]
fn counter_counts_to_all_ones() {
    let problem = counter_reachable();
    let mut solver = BmcSolver::new(problem.clone(), quiet_config());
    let result = solver.solve();
    assert_eq!(result.status(), BmcStatus::Sat);
    assert_eq!(result.depth(), 7);
    check_model(&problem, &result);

    // The trace is exactly the binary counting sequence.
    let model = result.model().unwrap();
    for step in 0..=7u32 {
        for var in 0..3 {
            let expected = if step & (1 << var) != 0 {
                Assignment::Positive
            } else {
                Assignment::Negative
            };
            assert_eq!(
                model.timeframe(step as usize)[var],
                expected,
                "step {} variable {}",
                step,
                var
            );
        }
    }
}

#[test]
fn counter_reachable_under_every_interpolant() {
    for &kind in &ALL_INTERPOLANTS {
        let problem = counter_reachable();
        let mut config = quiet_config();
        config.interpolant = kind;
        let mut solver = BmcSolver::new(problem.clone(), config);
        let result = solver.solve();
        assert_eq!(result.status(), BmcStatus::Sat, "{:?}", kind);
        assert_eq!(result.depth(), 7, "{:?}", kind);
        check_model(&problem, &result);
    }
}

#[test]
fn stuck_counter_unreachable_under_every_interpolant() {
    for &kind in &ALL_INTERPOLANTS {
        let problem = counter_stuck_bit();
        let mut config = quiet_config();
        config.interpolant = kind;
        let mut solver = BmcSolver::new(problem.clone(), config);
        let result = solver.solve();
        assert_eq!(result.status(), BmcStatus::Unsat, "{:?}", kind);
        check_certificate(&problem, result.certificate().unwrap());
    }
}

#[test]
fn stuck_counter_with_expensive_preprocessing() {
    use itpmc::PreprocessLevel;

    let problem = counter_stuck_bit();
    let mut config = quiet_config();
    config.preprocess_init = PreprocessLevel::Expensive;
    config.preprocess_trans = PreprocessLevel::Expensive;
    config.preprocess_target = PreprocessLevel::Expensive;
    config.preprocess_craig = PreprocessLevel::Expensive;
    let mut solver = BmcSolver::new(problem.clone(), config);
    let result = solver.solve();
    assert_eq!(result.status(), BmcStatus::Unsat);
    check_certificate(&problem, result.certificate().unwrap());
}

#[test]
fn plain_bmc_without_interpolation() {
    let mut config = quiet_config();
    config.craig_interpolation = false;
    config.fixed_point_check = false;

    let problem = counter_reachable();
    let mut solver = BmcSolver::new(problem.clone(), config.clone());
    let result = solver.solve();
    assert_eq!(result.status(), BmcStatus::Sat);
    assert_eq!(result.depth(), 7);
    check_model(&problem, &result);

    // Without interpolation an unreachable target runs into the depth cap.
    config.max_depth = 10;
    let mut solver = BmcSolver::new(counter_stuck_bit(), config);
    let result = solver.solve();
    assert_eq!(result.status(), BmcStatus::DepthLimitReached);
    assert_eq!(result.depth(), 10);
}

#[test]
fn fixed_point_with_total_transition_relation() {
    let mut config = quiet_config();
    config.total_transition_relation = true;
    let problem = counter_stuck_bit();
    let mut solver = BmcSolver::new(problem.clone(), config);
    let result = solver.solve();
    assert_eq!(result.status(), BmcStatus::Unsat);
    check_certificate(&problem, result.certificate().unwrap());
}

#[test]
fn interrupt_and_resume() {
    let problem = counter_stuck_bit();
    let mut solver = BmcSolver::new(problem.clone(), quiet_config());

    solver.interrupt();
    solver.interrupt(); // idempotent
    let result = solver.solve();
    assert_eq!(result.status(), BmcStatus::Interrupted);
    assert!(result.model().is_none());
    assert!(result.certificate().is_none());

    solver.clear_interrupt();
    let result = solver.solve();
    assert_eq!(result.status(), BmcStatus::Unsat);
    check_certificate(&problem, result.certificate().unwrap());
}

#[test]
fn interrupt_from_another_thread() {
    let problem = counter_stuck_bit();
    let mut solver = BmcSolver::new(problem, quiet_config());
    let handle = solver.interrupt_handle();

    let interrupter = std::thread::spawn(move || {
        handle.interrupt();
    });
    interrupter.join().unwrap();

    let result = solver.solve();
    assert_eq!(result.status(), BmcStatus::Interrupted);
}

#[test]
fn unsatisfiable_initial_predicate() {
    let problem = BmcProblem::new(
        1,
        vec![vec![lit(1, 0)], vec![lit(-1, 0)]],
        vec![],
        vec![vec![lit(1, 0)]],
    );
    let mut solver = BmcSolver::new(problem.clone(), quiet_config());
    let result = solver.solve();
    assert_eq!(result.status(), BmcStatus::Unsat);
    check_certificate(&problem, result.certificate().unwrap());
}

#[test]
fn unsatisfiable_target_predicate() {
    let problem = BmcProblem::new(
        1,
        vec![vec![lit(1, 0)]],
        vec![vec![lit(1, 0), lit(-1, 1)], vec![lit(-1, 0), lit(1, 1)]],
        vec![vec![lit(1, 0)], vec![lit(-1, 0)]],
    );
    let mut solver = BmcSolver::new(problem.clone(), quiet_config());
    let result = solver.solve();
    assert_eq!(result.status(), BmcStatus::Unsat);
    check_certificate(&problem, result.certificate().unwrap());
}

#[test]
fn depth_limit_of_zero() {
    let mut config = quiet_config();
    config.max_depth = 0;
    let mut solver = BmcSolver::new(counter_reachable(), config);
    let result = solver.solve();
    assert_eq!(result.status(), BmcStatus::DepthLimitReached);
    assert_eq!(result.depth(), 0);
}

#[test]
fn portfolio_returns_a_decisive_result() {
    use itpmc::PortfolioBmcSolver;

    let problem = counter_stuck_bit();
    let mut first = quiet_config();
    first.interpolant = InterpolantKind::Asymmetric;
    let mut second = quiet_config();
    second.interpolant = InterpolantKind::Smallest;

    let portfolio = PortfolioBmcSolver::new(vec![
        BmcSolver::new(problem.clone(), first),
        BmcSolver::new(problem.clone(), second),
    ]);
    let result = portfolio.solve();
    assert_eq!(result.status(), BmcStatus::Unsat);
    check_certificate(&problem, result.certificate().unwrap());
}
