//! The DIMSPEC format.
//!
//! Four DIMACS-style sections describe a transition system: `u` (universal
//! clauses holding in every state), `i` (initial), `g` (goal) and `t`
//! (transition). The transition section is numbered over `1..=2N` where
//! `N+1..=2N` are the next-state copies of the variables.
use std::io;

use thiserror::Error;

use itpmc_formula::{
    AigerBuilder, BmcModel, BmcProblem, Certificate, Clause, Clauses, Frame, Lit,
};

/// Possible errors while reading or building a DIMSPEC problem.
#[derive(Debug, Error)]
pub enum DimspecError {
    #[error("io error in DIMSPEC data: {0}")]
    Io(#[from] io::Error),
    #[error("line {line}: invalid section header \"{text}\"")]
    BadHeader { line: usize, text: String },
    #[error("line {line}: could not parse clause \"{text}\"")]
    BadClause { line: usize, text: String },
    #[error("line {line}: unknown line \"{text}\"")]
    UnknownLine { line: usize, text: String },
    #[error("variable count {count} doesn't match previously declared {declared} variables")]
    VarCountMismatch { count: usize, declared: usize },
    #[error("literal in {section} refers to non-existing variable {var}")]
    VarOutOfRange { section: &'static str, var: usize },
    #[error("literal in {section} is declared for timeframe {frame}")]
    BadFrame { section: &'static str, frame: Frame },
}

/// Which section a clause belongs to.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum DimspecSection {
    Universal,
    Init,
    Goal,
    Trans,
}

/// A parsed DIMSPEC problem, sections kept separate for re-emission.
#[derive(Clone, Debug)]
pub struct DimspecProblem {
    var_count: usize,
    universal: Clauses,
    init: Clauses,
    goal: Clauses,
    trans: Clauses,
}

impl DimspecProblem {
    pub fn var_count(&self) -> usize {
        self.var_count
    }

    pub fn universal(&self) -> &Clauses {
        &self.universal
    }

    pub fn init(&self) -> &Clauses {
        &self.init
    }

    pub fn goal(&self) -> &Clauses {
        &self.goal
    }

    pub fn trans(&self) -> &Clauses {
        &self.trans
    }
}

/// Builder validating and assembling DIMSPEC problems.
#[derive(Default)]
pub struct DimspecProblemBuilder {
    var_count: usize,
    declared: bool,
    universal: Clauses,
    init: Clauses,
    goal: Clauses,
    trans: Clauses,
}

impl DimspecProblemBuilder {
    pub fn new() -> DimspecProblemBuilder {
        DimspecProblemBuilder::default()
    }

    pub fn var_count(&self) -> usize {
        self.var_count
    }

    /// Declares the variable count; all sections must agree on it.
    pub fn set_var_count(&mut self, count: usize) -> Result<(), DimspecError> {
        if self.declared && self.var_count != count {
            return Err(DimspecError::VarCountMismatch {
                count,
                declared: self.var_count,
            });
        }
        self.declared = true;
        self.var_count = count;
        Ok(())
    }

    pub fn add_clause(&mut self, section: DimspecSection, clause: Clause) {
        match section {
            DimspecSection::Universal => self.universal.push(clause),
            DimspecSection::Init => self.init.push(clause),
            DimspecSection::Goal => self.goal.push(clause),
            DimspecSection::Trans => self.trans.push(clause),
        }
    }

    pub fn check(&self) -> Result<(), DimspecError> {
        let sections: [(&'static str, &Clauses, Frame); 4] = [
            ("UNIVERSAL", &self.universal, 0),
            ("INIT", &self.init, 0),
            ("GOAL", &self.goal, 0),
            ("TRANS", &self.trans, 1),
        ];
        for &(section, clauses, max_frame) in sections.iter() {
            for clause in clauses.iter() {
                for &lit in clause {
                    if lit.index() >= self.var_count {
                        return Err(DimspecError::VarOutOfRange {
                            section,
                            var: lit.index(),
                        });
                    }
                    if lit.frame() < 0 || lit.frame() > max_frame {
                        return Err(DimspecError::BadFrame {
                            section,
                            frame: lit.frame(),
                        });
                    }
                }
            }
        }
        Ok(())
    }

    /// Builds the problem; universal clauses are conjoined into the other
    /// three sections of the abstract problem.
    pub fn build(self) -> Result<(DimspecProblem, BmcProblem), DimspecError> {
        self.check()?;
        let dimspec = DimspecProblem {
            var_count: self.var_count,
            universal: self.universal,
            init: self.init,
            goal: self.goal,
            trans: self.trans,
        };

        let mut init = dimspec.init.clone();
        let mut trans = dimspec.trans.clone();
        let mut goal = dimspec.goal.clone();
        init.extend(dimspec.universal.iter().cloned());
        trans.extend(dimspec.universal.iter().cloned());
        goal.extend(dimspec.universal.iter().cloned());

        let bmc = BmcProblem::new(dimspec.var_count, init, trans, goal);
        Ok((dimspec, bmc))
    }
}

fn parse_clause(
    line: &str,
    line_number: usize,
    var_count: usize,
) -> Result<Clause, DimspecError> {
    let bad = || DimspecError::BadClause {
        line: line_number,
        text: line.to_owned(),
    };

    let mut clause = Clause::new();
    let mut terminated = false;
    for token in line.split_whitespace() {
        let number: isize = token.parse().map_err(|_| bad())?;
        if number == 0 {
            terminated = true;
            break;
        }
        let magnitude = number.abs() as usize - 1;
        let index = magnitude % var_count;
        let frame = (magnitude / var_count) as Frame;
        clause.push(Lit::from_index(index, number > 0).at(frame));
    }
    if !terminated {
        return Err(bad());
    }
    Ok(clause)
}

/// Reads a DIMSPEC problem.
pub fn parse_dimspec_problem(
    input: impl io::Read,
) -> Result<(DimspecProblem, BmcProblem), DimspecError> {
    use io::BufRead;

    let mut builder = DimspecProblemBuilder::new();
    let reader = io::BufReader::new(input);
    let mut lines = reader.lines().enumerate();

    while let Some((index, line)) = lines.next() {
        let line = line?;
        let line_number = index + 1;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('c') {
            continue;
        }

        let section = match trimmed.chars().next() {
            Some('u') => DimspecSection::Universal,
            Some('i') => DimspecSection::Init,
            Some('g') => DimspecSection::Goal,
            Some('t') => DimspecSection::Trans,
            _ => {
                return Err(DimspecError::UnknownLine {
                    line: line_number,
                    text: trimmed.to_owned(),
                })
            }
        };

        let bad_header = || DimspecError::BadHeader {
            line: line_number,
            text: trimmed.to_owned(),
        };
        let mut parts = trimmed.split_whitespace();
        parts.next();
        if parts.next() != Some("cnf") {
            return Err(bad_header());
        }
        let mut var_count: usize = parts
            .next()
            .and_then(|text| text.parse().ok())
            .ok_or_else(bad_header)?;
        let clause_count: usize = parts
            .next()
            .and_then(|text| text.parse().ok())
            .ok_or_else(bad_header)?;
        if section == DimspecSection::Trans {
            var_count /= 2;
        }
        builder.set_var_count(var_count)?;

        let mut parsed = 0;
        while parsed < clause_count {
            let (index, line) = match lines.next() {
                Some(entry) => entry,
                None => break,
            };
            let line = line?;
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('c') {
                continue;
            }
            let clause = parse_clause(trimmed, index + 1, var_count)?;
            builder.add_clause(section, clause);
            parsed += 1;
        }
    }

    builder.build()
}

fn write_clauses(
    target: &mut impl io::Write,
    clauses: &Clauses,
    var_count: usize,
) -> io::Result<()> {
    for clause in clauses {
        for &lit in clause {
            let number = (lit.index() + lit.frame() as usize * var_count + 1) as isize;
            itoa::write(&mut *target, if lit.is_negative() { -number } else { number })?;
            target.write_all(b" ")?;
        }
        target.write_all(b"0\n")?;
    }
    Ok(())
}

/// Writes a DIMSPEC problem.
pub fn write_dimspec_problem(
    target: &mut impl io::Write,
    problem: &DimspecProblem,
) -> io::Result<()> {
    let vars = problem.var_count;
    writeln!(target, "u cnf {} {}", vars, problem.universal.len())?;
    write_clauses(target, &problem.universal, vars)?;
    writeln!(target, "i cnf {} {}", vars, problem.init.len())?;
    write_clauses(target, &problem.init, vars)?;
    writeln!(target, "g cnf {} {}", vars, problem.goal.len())?;
    write_clauses(target, &problem.goal, vars)?;
    writeln!(target, "t cnf {} {}", 2 * vars, problem.trans.len())?;
    write_clauses(target, &problem.trans, vars)
}

/// Writes a witness trace as `v<frame>` value lines.
pub fn write_dimspec_model(
    target: &mut impl io::Write,
    _problem: &DimspecProblem,
    model: &BmcModel,
) -> io::Result<()> {
    use itpmc_formula::Assignment;

    for (depth, timeframe) in model.timeframes().iter().enumerate() {
        write!(target, "v{}", depth)?;
        for (var, &assignment) in timeframe.iter().enumerate() {
            match assignment {
                Assignment::DontCare => {}
                Assignment::Positive => write!(target, " {}", var + 1)?,
                Assignment::Negative => write!(target, " -{}", var + 1)?,
            }
        }
        writeln!(target, " 0")?;
    }
    Ok(())
}

/// Re-emits the problem with the goal replaced by the negated invariant.
pub fn write_dimspec_certificate(
    target: &mut impl io::Write,
    problem: &DimspecProblem,
    certificate: &Certificate,
) -> Result<(), DimspecError> {
    let mut builder = AigerBuilder::from_aiger(certificate.aiger());

    let mut initial = Vec::with_capacity(problem.init.len() + problem.universal.len());
    for clause in problem.init.iter().chain(problem.universal.iter()) {
        let edges = builder.add_literals(clause);
        initial.push(builder.add_or_all(edges));
    }
    let initial_state = builder.add_and_all(initial);

    let mut roots = vec![initial_state];
    roots.extend_from_slice(certificate.roots());
    let invariant = builder.add_or_all(roots);
    let graph = builder.build();

    let mut result = DimspecProblemBuilder::new();
    result.set_var_count(problem.var_count)?;
    for clause in problem.universal.iter() {
        result.add_clause(DimspecSection::Universal, clause.clone());
    }
    for clause in problem.init.iter() {
        result.add_clause(DimspecSection::Init, clause.clone());
    }
    for clause in problem.trans.iter() {
        result.add_clause(DimspecSection::Trans, clause.clone());
    }
    for clause in graph.to_clauses(-invariant) {
        result.add_clause(DimspecSection::Goal, clause);
    }

    let (certificate_problem, _) = result.build()?;
    write_dimspec_problem(target, &certificate_problem)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lit(number: isize, frame: Frame) -> Lit {
        Lit::from_dimacs(number).at(frame)
    }

    #[test]
    fn parses_and_conjoins_universal() {
        let text = "\
c a counter that never leaves zero
u cnf 2 1
2 0
i cnf 2 1
-1 0
g cnf 2 1
1 0
t cnf 4 1
-3 0
";
        let (dimspec, bmc) = parse_dimspec_problem(text.as_bytes()).unwrap();
        assert_eq!(dimspec.var_count(), 2);
        assert_eq!(dimspec.universal(), &vec![vec![lit(2, 0)]]);
        // Next-state variable 3 maps to variable 1 at frame 1.
        assert_eq!(dimspec.trans(), &vec![vec![lit(-1, 1)]]);

        assert_eq!(bmc.init(), &vec![vec![lit(-1, 0)], vec![lit(2, 0)]]);
        assert_eq!(bmc.trans(), &vec![vec![lit(-1, 1)], vec![lit(2, 0)]]);
        assert_eq!(bmc.target(), &vec![vec![lit(1, 0)], vec![lit(2, 0)]]);
    }

    #[test]
    fn rejects_mismatched_var_counts() {
        let text = "\
i cnf 2 0
g cnf 3 0
";
        match parse_dimspec_problem(text.as_bytes()) {
            Err(DimspecError::VarCountMismatch { count: 3, declared: 2 }) => (),
            other => panic!("unexpected result {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn roundtrips_through_writer() {
        let text = "\
u cnf 3 1
3 0
i cnf 3 2
-1 0
-2 0
g cnf 3 1
1 2 0
t cnf 6 2
-1 4 0
1 -4 0
";
        let (dimspec, _) = parse_dimspec_problem(text.as_bytes()).unwrap();
        let mut buffer = vec![];
        write_dimspec_problem(&mut buffer, &dimspec).unwrap();
        let (reparsed, _) = parse_dimspec_problem(&buffer[..]).unwrap();
        assert_eq!(reparsed.universal(), dimspec.universal());
        assert_eq!(reparsed.init(), dimspec.init());
        assert_eq!(reparsed.goal(), dimspec.goal());
        assert_eq!(reparsed.trans(), dimspec.trans());
    }

    #[test]
    fn model_lines_skip_dont_cares() {
        use itpmc_formula::Assignment;

        let (dimspec, _) = parse_dimspec_problem(&b"i cnf 2 0\n"[..]).unwrap();
        let model = BmcModel::new(vec![
            vec![Assignment::Positive, Assignment::DontCare],
            vec![Assignment::Negative, Assignment::Positive],
        ]);
        let mut buffer = vec![];
        write_dimspec_model(&mut buffer, &dimspec, &model).unwrap();
        assert_eq!(
            String::from_utf8(buffer).unwrap(),
            "v0 1 0\nv1 -1 2 0\n"
        );
    }
}
