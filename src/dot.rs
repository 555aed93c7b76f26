//! Graphviz DOT rendering of SDDs and vtrees.

use std::collections::BTreeSet;
use std::fmt::{self, Write as _};

use crate::manager::SddManager;
use crate::sdd::{Element, SddRef};

impl SddManager {
    /// Render the decision DAG rooted at `sdd` to DOT. Decisions are drawn
    /// as circles labelled with their vtree index, elements as
    /// `prime | sub` records.
    ///
    /// # Errors
    ///
    /// Propagates formatting errors.
    pub fn sdd_to_dot(&self, sdd: &SddRef) -> Result<String, fmt::Error> {
        let mut dot = String::new();
        writeln!(dot, "digraph sdd {{")?;
        writeln!(dot, "  overlap=false;")?;

        let mut seen = BTreeSet::new();
        let mut queue = vec![sdd.clone()];
        while let Some(sdd) = queue.pop() {
            if !seen.insert(sdd.id()) {
                continue;
            }

            let Some(elements) = sdd.elements() else {
                continue;
            };

            writeln!(
                dot,
                "  d{} [shape=circle, label=\"{}\"];",
                sdd.id().0,
                sdd.vtree().expect("decisions have a vtree").index()
            )?;

            for (idx, element) in elements.iter().enumerate() {
                let Element { prime, sub } = element;
                writeln!(
                    dot,
                    "  e{}_{idx} [shape=record, label=\"<f0> {} | <f1> {}\"];",
                    sdd.id().0,
                    leaf_label(prime),
                    leaf_label(sub),
                )?;
                writeln!(dot, "  d{} -> e{}_{idx} [arrowsize=.50];", sdd.id().0, sdd.id().0)?;

                if prime.is_decision() {
                    writeln!(
                        dot,
                        "  e{}_{idx}:f0 -> d{} [arrowsize=.50];",
                        sdd.id().0,
                        prime.id().0
                    )?;
                }
                if sub.is_decision() {
                    writeln!(
                        dot,
                        "  e{}_{idx}:f1 -> d{} [arrowsize=.50];",
                        sdd.id().0,
                        sub.id().0
                    )?;
                }

                queue.push(prime.clone());
                queue.push(sub.clone());
            }
        }

        writeln!(dot, "}}")?;
        Ok(dot)
    }

    /// Render the manager's vtree to DOT.
    ///
    /// # Errors
    ///
    /// Propagates formatting errors.
    pub fn vtree_to_dot(&self) -> Result<String, fmt::Error> {
        let mut dot = String::new();
        writeln!(dot, "digraph vtree {{")?;
        writeln!(dot, "  overlap=false;")?;

        let mut queue = vec![self.root()];
        while let Some(vtree) = queue.pop() {
            if let Some(variable) = vtree.variable() {
                writeln!(
                    dot,
                    "  v{} [shape=none, label=\"{variable}\"];",
                    vtree.index()
                )?;
                continue;
            }

            writeln!(
                dot,
                "  v{} [shape=circle, label=\"{}\"];",
                vtree.index(),
                vtree.index()
            )?;
            for child in [vtree.left_child(), vtree.right_child()] {
                writeln!(
                    dot,
                    "  v{} -> v{} [arrowsize=.50];",
                    vtree.index(),
                    child.index()
                )?;
                queue.push(child);
            }
        }

        writeln!(dot, "}}")?;
        Ok(dot)
    }
}

/// Label for a record slot: constants and literals are printed inline,
/// decisions are referenced by an edge instead.
fn leaf_label(sdd: &SddRef) -> String {
    if sdd.is_true() {
        return String::from("⊤");
    }
    if sdd.is_false() {
        return String::from("⊥");
    }
    match sdd.literal() {
        Some(literal) => format!("{literal}"),
        None => String::new(),
    }
}
