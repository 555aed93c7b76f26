//! Reader for CNF formulas in the [DIMACS] format.
//!
//! The reader produces the generic [`Gate`] circuit consumed by
//! [`SddManager::compile_cnf`]; it never compiles anything itself.
//!
//! [DIMACS]: https://www21.in.tum.de/~lammich/2015_SS_Seminar_SAT/resources/dimacs-cnf.pdf

use std::collections::VecDeque;

use anyhow::{anyhow, bail, Result};

use crate::manager::cnf::{CnfStrategy, Gate};
use crate::manager::SddManager;
use crate::sdd::SddRef;

#[derive(Debug, PartialEq, Eq)]
pub struct Preamble {
    pub clauses: usize,
    pub variables: usize,
}

#[derive(PartialEq, Eq)]
enum DimacsReaderState {
    Initialized,
    ParsingClauses,
    Finished,
}

pub struct DimacsReader<'a> {
    reader: &'a mut dyn std::io::BufRead,
    // Tokens of the current line that have not been consumed yet.
    pending: VecDeque<i64>,
    state: DimacsReaderState,
}

impl<'a> DimacsReader<'a> {
    #[must_use]
    pub fn new(reader: &'a mut dyn std::io::BufRead) -> Self {
        DimacsReader {
            reader,
            pending: VecDeque::new(),
            state: DimacsReaderState::Initialized,
        }
    }

    /// Parse the problem line `p cnf VARIABLES CLAUSES`, skipping comments.
    ///
    /// # Errors
    ///
    /// Fails if the problem line is missing or malformed, or if the preamble
    /// was already parsed.
    pub fn parse_preamble(&mut self) -> Result<Preamble> {
        if self.state != DimacsReaderState::Initialized {
            bail!("preamble already parsed");
        }

        loop {
            let mut line = String::new();
            if self.reader.read_line(&mut line)? == 0 {
                bail!("preamble is missing a problem line");
            }

            if line.starts_with('c') || line.trim().is_empty() {
                continue;
            }

            self.state = DimacsReaderState::ParsingClauses;
            return DimacsReader::parse_problem_line(line.trim());
        }
    }

    /// Parse the next clause, [`Option::None`] once the input is exhausted.
    /// A final clause without the terminating `0` is accepted.
    ///
    /// # Errors
    ///
    /// Fails on tokens that are not integers.
    pub fn parse_next_clause(&mut self) -> Result<Option<Vec<i64>>> {
        assert!(
            self.state != DimacsReaderState::Initialized,
            "the preamble must be parsed first"
        );

        if self.state == DimacsReaderState::Finished {
            return Ok(None);
        }

        let mut clause = Vec::new();
        loop {
            match self.next_token()? {
                Some(0) => return Ok(Some(clause)),
                Some(literal) => clause.push(literal),
                None => {
                    self.state = DimacsReaderState::Finished;
                    if clause.is_empty() {
                        return Ok(None);
                    }
                    return Ok(Some(clause));
                }
            }
        }
    }

    fn next_token(&mut self) -> Result<Option<i64>> {
        loop {
            if let Some(token) = self.pending.pop_front() {
                return Ok(Some(token));
            }

            let mut line = String::new();
            if self.reader.read_line(&mut line)? == 0 {
                return Ok(None);
            }

            if line.starts_with('c') {
                continue;
            }

            for raw in line.split_whitespace() {
                let literal = raw
                    .parse::<i64>()
                    .map_err(|err| anyhow!("literal '{raw}' is invalid: {err}"))?;
                self.pending.push_back(literal);
            }
        }
    }

    fn parse_problem_line(line: &str) -> Result<Preamble> {
        let items: Vec<_> = line.split_whitespace().collect();
        if items.len() != 4 {
            bail!("problem line must contain exactly 4 fields: 'p cnf VARIABLES CLAUSES'");
        }

        if items[0] != "p" {
            bail!("first field of problem line must be 'p'");
        }

        if items[1] != "cnf" {
            bail!("second field of problem line must be 'cnf'");
        }

        let variables = items[2]
            .parse::<usize>()
            .map_err(|err| anyhow!("could not parse number of variables: {err}"))?;

        let clauses = items[3]
            .parse::<usize>()
            .map_err(|err| anyhow!("could not parse number of clauses: {err}"))?;

        Ok(Preamble { clauses, variables })
    }
}

impl SddManager {
    /// Parse a CNF in DIMACS format and compile it with the given strategy.
    /// The preamble must not declare more variables than the manager knows.
    ///
    /// # Errors
    ///
    /// Fails on malformed DIMACS input and on compilation errors such as
    /// literals outside the manager's variable range.
    pub fn from_dimacs(
        &self,
        reader: &mut dyn std::io::Read,
        strategy: CnfStrategy,
    ) -> Result<SddRef> {
        let mut buffered = std::io::BufReader::new(reader);
        let mut dimacs = DimacsReader::new(&mut buffered);

        let preamble = dimacs.parse_preamble()?;
        if preamble.variables > self.num_variables() as usize {
            bail!(
                "preamble declares {} variables but the manager only knows {}",
                preamble.variables,
                self.num_variables()
            );
        }

        let mut clauses = Vec::with_capacity(preamble.clauses);
        while let Some(clause) = dimacs.parse_next_clause()? {
            clauses.push(Gate::Disjunction(
                clause.into_iter().map(Gate::Literal).collect(),
            ));
        }

        Ok(self.compile_cnf(&Gate::Conjunction(clauses), strategy)?)
    }
}
