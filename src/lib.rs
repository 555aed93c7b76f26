//! # Bottom-up compiler for Sentential Decision Diagrams.
//!
//! Build, combine, and query
//! [Sentential Decision Diagrams (SDD)](https://en.wikipedia.org/wiki/Sentential_decision_diagram):
//! a succinct, canonical representation of Boolean functions structured by a
//! binary tree over the variables (a *vtree*).
//!
//! The compiler maintains *trimmed*, *compressed*, and *canonical* SDDs under
//! every operation: logically equivalent functions are always represented by
//! the very same node, so equivalence checking is pointer comparison and
//! negation is constant time.
//!
//! The following snippet compiles the function `(x1 ∧ x2) ∨ x3`, counts its
//! models, and evaluates it:
//!
//! ```rust
//! use bitvec::prelude::*;
//! use sddc::manager::{options::SddOptions, SddManager};
//!
//! let options = SddOptions::builder().num_variables(3).build();
//! let manager = SddManager::new(&options);
//!
//! let x1 = manager.literal(1).unwrap();
//! let x2 = manager.literal(2).unwrap();
//! let x3 = manager.literal(3).unwrap();
//!
//! let conjunction = manager.conjoin(&x1, &x2);
//! let formula = manager.disjoin(&conjunction, &x3);
//!
//! assert_eq!(manager.model_count(&formula, 3), 5u32.into());
//! assert!(manager.evaluate(&formula, bits![1, 1, 0]));
//! assert!(!manager.evaluate(&formula, bits![0, 1, 0]));
//! ```
//!
//! Main methods to compile and combine SDDs:
//!
//! * [`crate::manager::SddManager::literal`] -- compile a literal
//! * [`crate::manager::SddManager::constant`] -- compile a constant
//! * [`crate::manager::SddManager::conjoin`] -- compute AND of two SDDs
//! * [`crate::manager::SddManager::disjoin`] -- compute OR of two SDDs
//! * [`crate::manager::SddManager::negate`] -- compute negation of an SDD
//! * [`crate::manager::SddManager::compile_cnf`] -- compile a whole CNF
//! * [`crate::manager::SddManager::from_dimacs`] -- compile a CNF in DIMACS
//!   format
//!
//! Main methods to query SDDs:
//!
//! * [`crate::manager::SddManager::model_count`] -- count satisfying
//!   assignments
//! * [`crate::manager::SddManager::sat_prob`] -- satisfaction probability
//!   under a uniform prior
//! * [`crate::manager::SddManager::evaluate`] -- evaluate under an assignment
//! * [`crate::sdd::SddRef::size`] -- number of elements of the SDD
//!
//! Additional resources:
//!
//! * [SDD: A New Canonical Representation of Propositional Knowledge Bases - Adnan Darwiche](http://reasoning.cs.ucla.edu/fetch.php?id=121&type=pdf):
//!   the paper introducing SDDs

pub(crate) mod dot;
pub mod error;
/// Variables, polarities, and literals.
pub mod literal;
pub mod manager;
pub mod sdd;
pub mod vtree;
