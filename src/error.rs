use std::error::Error;
use std::fmt::{self, Display};

/// Errors reported by the compiler. All of them are fatal to the call that
/// produced them and leave the manager untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SddError {
    /// A literal references a variable outside the manager's vtree.
    UnknownVariable(i64),
    /// A CNF compilation strategy name was not recognized.
    InvalidStrategy(String),
    /// A CNF input is not a conjunction of disjunctions of literals.
    StructuralPrecondition(String),
    /// The canonicalizer was handed a degenerate XY-partition.
    UntrimmedPartition,
}

impl Display for SddError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SddError::UnknownVariable(literal) => {
                write!(f, "literal {literal} references a variable outside the vtree")
            }
            SddError::InvalidStrategy(name) => {
                write!(f, "'{name}' is not a known CNF compilation strategy")
            }
            SddError::StructuralPrecondition(reason) => write!(f, "malformed CNF: {reason}"),
            SddError::UntrimmedPartition => {
                write!(f, "cannot canonicalize a degenerate XY-partition")
            }
        }
    }
}

impl Error for SddError {}
