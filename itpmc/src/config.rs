//! Solver configuration.

/// Which Craig interpolant the engine extracts after each UNSAT unrolling.
///
/// The first four are single construction bases; the remaining four combine
/// all bases that were built.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum InterpolantKind {
    Symmetric,
    Asymmetric,
    DualSymmetric,
    DualAsymmetric,
    Intersection,
    Union,
    Smallest,
    Largest,
}

/// Effort spent simplifying a clause set before it enters a solver.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub enum PreprocessLevel {
    None,
    Quick,
    Expensive,
}

/// Diagnostic verbosity of the engine.
///
/// `Competition` additionally prints one `=> <verdict> <depth> <time>` line
/// per depth on stderr. The remaining levels map onto `log` filter levels;
/// see [`LogLevel::filter`].
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub enum LogLevel {
    None,
    Competition,
    Minimal,
    Info,
    Debug,
    Trace,
    ExtendedTrace,
    FullTrace,
}

impl LogLevel {
    /// The `log` filter corresponding to this level.
    pub fn filter(self) -> log::LevelFilter {
        match self {
            LogLevel::None | LogLevel::Competition => log::LevelFilter::Off,
            LogLevel::Minimal => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace | LogLevel::ExtendedTrace | LogLevel::FullTrace => {
                log::LevelFilter::Trace
            }
        }
    }
}

/// Configurable parameters of a [`BmcSolver`](crate::BmcSolver).
#[derive(Clone, Debug)]
pub struct BmcConfig {
    /// Unrolling cap; reaching it yields `DepthLimitReached`. (Default: 100)
    pub max_depth: usize,

    /// Maximum interpolant clause count, 0 for unlimited. (Default: 0)
    pub max_craig_size: usize,

    /// Diagnostic verbosity. (Default: `Info`)
    pub log_level: LogLevel,

    /// Interpolant selector for the inner loop. (Default: `Smallest`)
    pub interpolant: InterpolantKind,

    /// Whether the Craig inner loop runs at all. (Default: true)
    pub craig_interpolation: bool,

    /// Whether interpolant unions are tested for a fixed point. (Default: true)
    pub fixed_point_check: bool,

    /// Whether `I`, `P` and `I ∧ P` are checked before unrolling. (Default: true)
    pub sanity_checks: bool,

    /// Assume a total transition relation in B-side step clauses. (Default: false)
    pub total_transition_relation: bool,

    /// Preprocessing levels per clause set. (Default: `Quick`)
    pub preprocess_init: PreprocessLevel,
    pub preprocess_trans: PreprocessLevel,
    pub preprocess_target: PreprocessLevel,
    pub preprocess_craig: PreprocessLevel,
}

impl Default for BmcConfig {
    fn default() -> BmcConfig {
        BmcConfig {
            max_depth: 100,
            max_craig_size: 0,
            log_level: LogLevel::Info,
            interpolant: InterpolantKind::Smallest,
            craig_interpolation: true,
            fixed_point_check: true,
            sanity_checks: true,
            total_transition_relation: false,
            preprocess_init: PreprocessLevel::Quick,
            preprocess_trans: PreprocessLevel::Quick,
            preprocess_target: PreprocessLevel::Quick,
            preprocess_craig: PreprocessLevel::Quick,
        }
    }
}
