//! The textual CIP (clause-indexed problem) format.
//!
//! A CIP file declares its variables in a `DECL` section followed by `INIT`,
//! `TRANS` and `TARGET` clause sections. A clause is written as
//! `([1:0], [-2:1])` where the first number is the 1-based signed variable
//! and the second the timeframe.
use std::io;

use thiserror::Error;

use itpmc_formula::{
    AigerBuilder, BmcModel, BmcProblem, Certificate, Clause, Clauses, Frame, Lit,
};

/// Possible errors while reading or building a CIP problem.
#[derive(Debug, Error)]
pub enum CipError {
    #[error("io error in CIP data: {0}")]
    Io(#[from] io::Error),
    #[error("line {line}: could not parse clause \"{text}\"")]
    BadClause { line: usize, text: String },
    #[error("line {line}: unknown variable type \"{kind}\"")]
    UnknownVarKind { line: usize, kind: String },
    #[error("line {line}: inconsistent variable index counter")]
    InconsistentIndex { line: usize },
    #[error("line {line}: unknown section \"{text}\"")]
    UnknownSection { line: usize, text: String },
    #[error("literal in {section} refers to non-existing variable {var}")]
    VarOutOfRange { section: &'static str, var: usize },
    #[error("auxiliary variable {var} occurs in {first} and {second}")]
    AuxAcrossSections {
        var: usize,
        first: &'static str,
        second: &'static str,
    },
    #[error("literal in {section} is declared for timeframe {frame}")]
    BadFrame { section: &'static str, frame: Frame },
    #[error("literal in TRANS has timeframe {frame} but {var} is not a latch")]
    NonLatchShifted { var: usize, frame: Frame },
}

/// The declared role of a CIP variable.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum CipVarKind {
    Input,
    Output,
    Latch,
    /// Auxiliary (Tseitin) variable; must stay inside one section.
    Tseitin,
}

/// A parsed CIP problem.
#[derive(Clone, Debug)]
pub struct CipProblem {
    variables: Vec<CipVarKind>,
    init: Clauses,
    trans: Clauses,
    target: Clauses,
}

impl CipProblem {
    pub fn variables(&self) -> &[CipVarKind] {
        &self.variables
    }

    pub fn init(&self) -> &Clauses {
        &self.init
    }

    pub fn trans(&self) -> &Clauses {
        &self.trans
    }

    pub fn target(&self) -> &Clauses {
        &self.target
    }
}

/// Which section a clause belongs to.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum CipSection {
    Init,
    Trans,
    Target,
}

/// Builder validating and assembling CIP problems.
#[derive(Default)]
pub struct CipProblemBuilder {
    variables: Vec<CipVarKind>,
    init: Clauses,
    trans: Clauses,
    target: Clauses,
}

impl CipProblemBuilder {
    pub fn new() -> CipProblemBuilder {
        CipProblemBuilder::default()
    }

    pub fn add_variable(&mut self, kind: CipVarKind) -> usize {
        self.variables.push(kind);
        self.variables.len() - 1
    }

    pub fn add_clause(&mut self, section: CipSection, clause: Clause) {
        match section {
            CipSection::Init => self.init.push(clause),
            CipSection::Trans => self.trans.push(clause),
            CipSection::Target => self.target.push(clause),
        }
    }

    /// Checks variable ranges, section-local auxiliaries and frame rules.
    pub fn check(&self) -> Result<(), CipError> {
        let sections: [(&'static str, &Clauses, Frame); 3] = [
            ("INIT", &self.init, 0),
            ("TRANS", &self.trans, 1),
            ("TARGET", &self.target, 0),
        ];

        let mut occurs = vec![[false; 3]; self.variables.len()];
        for (position, &(section, clauses, max_frame)) in sections.iter().enumerate() {
            for clause in clauses.iter() {
                for &lit in clause {
                    if lit.index() >= self.variables.len() {
                        return Err(CipError::VarOutOfRange {
                            section,
                            var: lit.index(),
                        });
                    }
                    occurs[lit.index()][position] = true;
                    if lit.frame() < 0 || lit.frame() > max_frame {
                        return Err(CipError::BadFrame {
                            section,
                            frame: lit.frame(),
                        });
                    }
                    if section == "TRANS"
                        && lit.frame() != 0
                        && self.variables[lit.index()] != CipVarKind::Latch
                    {
                        return Err(CipError::NonLatchShifted {
                            var: lit.index(),
                            frame: lit.frame(),
                        });
                    }
                }
            }
        }

        let names = ["INIT", "TRANS", "TARGET"];
        for (var, occurrence) in occurs.iter().enumerate() {
            if self.variables[var] != CipVarKind::Tseitin {
                continue;
            }
            for first in 0..3 {
                for second in first + 1..3 {
                    if occurrence[first] && occurrence[second] {
                        return Err(CipError::AuxAcrossSections {
                            var,
                            first: names[first],
                            second: names[second],
                        });
                    }
                }
            }
        }

        Ok(())
    }

    pub fn build(mut self) -> Result<(CipProblem, BmcProblem), CipError> {
        self.check()?;
        let cip = CipProblem {
            variables: std::mem::take(&mut self.variables),
            init: std::mem::take(&mut self.init),
            trans: std::mem::take(&mut self.trans),
            target: std::mem::take(&mut self.target),
        };
        let bmc = BmcProblem::new(
            cip.variables.len(),
            cip.init.clone(),
            cip.trans.clone(),
            cip.target.clone(),
        );
        Ok((cip, bmc))
    }
}

fn parse_clause(line: &str, line_number: usize) -> Result<Clause, CipError> {
    let bad = || CipError::BadClause {
        line: line_number,
        text: line.to_owned(),
    };

    let inner = line
        .trim()
        .strip_prefix('(')
        .and_then(|rest| rest.strip_suffix(')'))
        .ok_or_else(bad)?;

    let mut clause = Clause::new();
    for token in inner.split(',') {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }
        let body = token
            .strip_prefix('[')
            .and_then(|rest| rest.strip_suffix(']'))
            .ok_or_else(bad)?;
        let mut parts = body.splitn(2, ':');
        let literal: isize = parts
            .next()
            .and_then(|text| text.trim().parse().ok())
            .ok_or_else(bad)?;
        let frame: Frame = parts
            .next()
            .and_then(|text| text.trim().parse().ok())
            .ok_or_else(bad)?;
        if literal == 0 {
            return Err(bad());
        }
        clause.push(Lit::from_dimacs(literal).at(frame));
    }
    Ok(clause)
}

/// Reads a CIP problem.
pub fn parse_cip_problem(input: impl io::Read) -> Result<(CipProblem, BmcProblem), CipError> {
    use io::BufRead;

    let mut builder = CipProblemBuilder::new();
    let reader = io::BufReader::new(input);
    let mut lines = reader.lines().enumerate();

    let mut section: Option<&'static str> = None;
    while let Some((index, line)) = lines.next() {
        let line = line?;
        let line_number = index + 1;
        let trimmed = line.trim();

        if trimmed.is_empty() {
            section = None;
            continue;
        }
        if trimmed.starts_with("--") {
            continue;
        }
        if let Some(active) = section {
            match active {
                "DECL" => {
                    let mut parts = trimmed.split_whitespace();
                    let kind_text = parts.next().unwrap_or("");
                    let kind = match kind_text {
                        "INPUT_VAR" => CipVarKind::Input,
                        "OUTPUT_VAR" => CipVarKind::Output,
                        "LATCH_VAR" => CipVarKind::Latch,
                        "AND_VAR" | "AUX_VAR" => CipVarKind::Tseitin,
                        other => {
                            return Err(CipError::UnknownVarKind {
                                line: line_number,
                                kind: other.to_owned(),
                            })
                        }
                    };
                    let declared: usize = parts
                        .next()
                        .and_then(|text| text.parse().ok())
                        .ok_or(CipError::InconsistentIndex { line: line_number })?;
                    let allocated = builder.add_variable(kind);
                    if allocated + 1 != declared {
                        return Err(CipError::InconsistentIndex { line: line_number });
                    }
                }
                "INIT" => builder.add_clause(CipSection::Init, parse_clause(trimmed, line_number)?),
                "TRANS" => {
                    builder.add_clause(CipSection::Trans, parse_clause(trimmed, line_number)?)
                }
                "TARGET" => {
                    builder.add_clause(CipSection::Target, parse_clause(trimmed, line_number)?)
                }
                _ => unreachable!(),
            }
            continue;
        }

        match trimmed {
            "DECL" => section = Some("DECL"),
            "INIT" => section = Some("INIT"),
            "TRANS" => section = Some("TRANS"),
            "TARGET" => section = Some("TARGET"),
            _ if trimmed.starts_with("OFFSET:")
                || trimmed.starts_with("USE_PROPERTY:")
                || trimmed.starts_with("SIMPLIFY_INTERPOLANTS:")
                || trimmed.starts_with("TIMEOUT:")
                || trimmed.starts_with("MAXDEPTH:") => {}
            other => {
                return Err(CipError::UnknownSection {
                    line: line_number,
                    text: other.to_owned(),
                })
            }
        }
    }

    builder.build()
}

fn write_clause(target: &mut impl io::Write, clause: &Clause) -> io::Result<()> {
    target.write_all(b"(")?;
    for (index, lit) in clause.iter().enumerate() {
        if index != 0 {
            target.write_all(b", ")?;
        }
        target.write_all(b"[")?;
        itoa::write(&mut *target, lit.to_dimacs())?;
        target.write_all(b":")?;
        itoa::write(&mut *target, lit.frame())?;
        target.write_all(b"]")?;
    }
    target.write_all(b")\n")
}

/// Writes a CIP problem.
pub fn write_cip_problem(target: &mut impl io::Write, problem: &CipProblem) -> io::Result<()> {
    writeln!(target, "DECL")?;
    for (index, kind) in problem.variables.iter().enumerate() {
        let name = match kind {
            CipVarKind::Input => "INPUT_VAR",
            CipVarKind::Output => "OUTPUT_VAR",
            CipVarKind::Latch => "LATCH_VAR",
            CipVarKind::Tseitin => "AUX_VAR",
        };
        writeln!(target, "{} {}", name, index + 1)?;
    }
    writeln!(target)?;

    writeln!(target, "INIT")?;
    for clause in problem.init.iter() {
        write_clause(target, clause)?;
    }
    writeln!(target)?;

    writeln!(target, "TRANS")?;
    for clause in problem.trans.iter() {
        write_clause(target, clause)?;
    }
    writeln!(target)?;

    writeln!(target, "TARGET")?;
    for clause in problem.target.iter() {
        write_clause(target, clause)?;
    }
    writeln!(target)
}

/// Writes a witness trace, one line per timeframe.
pub fn write_cip_model(
    target: &mut impl io::Write,
    _problem: &CipProblem,
    model: &BmcModel,
) -> io::Result<()> {
    for (depth, timeframe) in model.timeframes().iter().enumerate() {
        write!(target, "{} = ", depth)?;
        for &assignment in timeframe {
            write!(target, "{}", assignment.symbol())?;
        }
        writeln!(target)?;
    }
    Ok(())
}

/// Re-emits the problem with `TARGET` replaced by the negated invariant.
///
/// All variables are re-declared as latches: the invariant mixes initial
/// state and interpolant cones, so the auxiliary-stays-local rule would
/// otherwise reject the copied `INIT` clauses.
pub fn write_cip_certificate(
    target: &mut impl io::Write,
    problem: &CipProblem,
    certificate: &Certificate,
) -> Result<(), CipError> {
    let mut builder = AigerBuilder::from_aiger(certificate.aiger());

    let mut initial = Vec::with_capacity(problem.init.len());
    for clause in problem.init.iter() {
        let edges = builder.add_literals(clause);
        initial.push(builder.add_or_all(edges));
    }
    let initial_state = builder.add_and_all(initial);

    let mut roots = vec![initial_state];
    roots.extend_from_slice(certificate.roots());
    let invariant = builder.add_or_all(roots);
    let graph = builder.build();

    let mut result = CipProblemBuilder::new();
    for _ in 0..problem.variables.len() {
        result.add_variable(CipVarKind::Latch);
    }
    for clause in problem.init.iter() {
        result.add_clause(CipSection::Init, clause.clone());
    }
    for clause in problem.trans.iter() {
        result.add_clause(CipSection::Trans, clause.clone());
    }
    for clause in graph.to_clauses(-invariant) {
        result.add_clause(CipSection::Target, clause);
    }

    let (certificate_problem, _) = result.build()?;
    write_cip_problem(target, &certificate_problem)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use itpmc_formula::CertificateKind;

    fn lit(number: isize, frame: Frame) -> Lit {
        Lit::from_dimacs(number).at(frame)
    }

    #[test]
    fn parses_simple_problem() {
        let text = "\
-- toggling latch
DECL
LATCH_VAR 1
INPUT_VAR 2

INIT
([-1:0])

TRANS
([1:0], [1:1])
([-1:0], [-1:1])

TARGET
([1:0])
";
        let (cip, bmc) = parse_cip_problem(text.as_bytes()).unwrap();
        assert_eq!(cip.variables(), &[CipVarKind::Latch, CipVarKind::Input]);
        assert_eq!(bmc.var_count(), 2);
        assert_eq!(bmc.init(), &vec![vec![lit(-1, 0)]]);
        assert_eq!(
            bmc.trans(),
            &vec![vec![lit(1, 0), lit(1, 1)], vec![lit(-1, 0), lit(-1, 1)]]
        );
        assert_eq!(bmc.target(), &vec![vec![lit(1, 0)]]);
    }

    #[test]
    fn rejects_aux_across_sections() {
        let text = "\
DECL
AUX_VAR 1

INIT
([1:0])

TRANS

TARGET
([1:0])
";
        match parse_cip_problem(text.as_bytes()) {
            Err(CipError::AuxAcrossSections { var: 0, .. }) => (),
            other => panic!("unexpected result {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn rejects_shifted_non_latch() {
        let text = "\
DECL
INPUT_VAR 1

INIT

TRANS
([1:1])

TARGET
";
        match parse_cip_problem(text.as_bytes()) {
            Err(CipError::NonLatchShifted { var: 0, frame: 1 }) => (),
            other => panic!("unexpected result {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn roundtrips_through_writer() {
        let text = "\
DECL
LATCH_VAR 1
LATCH_VAR 2

INIT
([-1:0])
([2:0])

TRANS
([1:0], [-2:1])

TARGET
([1:0], [2:0])
";
        let (cip, _) = parse_cip_problem(text.as_bytes()).unwrap();
        let mut buffer = vec![];
        write_cip_problem(&mut buffer, &cip).unwrap();
        let (reparsed, _) = parse_cip_problem(&buffer[..]).unwrap();
        assert_eq!(reparsed.variables(), cip.variables());
        assert_eq!(reparsed.init(), cip.init());
        assert_eq!(reparsed.trans(), cip.trans());
        assert_eq!(reparsed.target(), cip.target());
    }

    #[test]
    fn certificate_keeps_problem_sections() {
        let text = "\
DECL
LATCH_VAR 1

INIT
([-1:0])

TRANS
([-1:1])

TARGET
([1:0])
";
        let (cip, _) = parse_cip_problem(text.as_bytes()).unwrap();
        // Invariant: the latch stays low.
        let mut builder = AigerBuilder::new();
        let root = builder.add_literal(lit(-1, 0));
        let certificate = Certificate::new(CertificateKind::Craig, builder.build(), vec![root]);

        let mut buffer = vec![];
        write_cip_certificate(&mut buffer, &cip, &certificate).unwrap();
        let (emitted, _) = parse_cip_problem(&buffer[..]).unwrap();
        assert_eq!(emitted.init(), cip.init());
        assert_eq!(emitted.trans(), cip.trans());
        // Target is now the negated invariant: latch high.
        assert_eq!(emitted.target(), &vec![vec![lit(1, 0)]]);
    }
}
