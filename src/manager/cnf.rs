use std::str::FromStr;

use crate::error::SddError;
use crate::literal::Literal;
use crate::manager::SddManager;
use crate::sdd::SddRef;
use crate::vtree::{VTreeIdx, VTreeRef};

/// A node of the generic logic-circuit tree the CNF compiler consumes.
///
/// The compiler only accepts the CNF shape: a conjunction of disjunctions of
/// literals. Anything else is rejected with
/// [`SddError::StructuralPrecondition`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Gate {
    Conjunction(Vec<Gate>),
    Disjunction(Vec<Gate>),
    /// A signed variable number: `3` is the third variable, `-3` its
    /// negation.
    Literal(i64),
    Constant(bool),
}

impl Gate {
    /// Build a clause from signed literals.
    #[must_use]
    pub fn clause(literals: &[i64]) -> Gate {
        Gate::Disjunction(literals.iter().copied().map(Gate::Literal).collect())
    }

    /// Build a CNF from clauses of signed literals.
    #[must_use]
    pub fn cnf(clauses: &[&[i64]]) -> Gate {
        Gate::Conjunction(clauses.iter().map(|clause| Gate::clause(clause)).collect())
    }

    fn kind(&self) -> &'static str {
        match self {
            Gate::Conjunction(..) => "conjunction",
            Gate::Disjunction(..) => "disjunction",
            Gate::Literal(..) => "literal",
            Gate::Constant(..) => "constant",
        }
    }
}

/// How [`SddManager::compile_cnf`] schedules clause conjunctions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CnfStrategy {
    /// Fold the clauses in input order.
    #[default]
    Linear,
    /// Recurse along the vtree, compiling every clause at the lowest vtree
    /// node covering its variables.
    Tree,
}

impl FromStr for CnfStrategy {
    type Err = SddError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name {
            "linear" => Ok(CnfStrategy::Linear),
            "tree" => Ok(CnfStrategy::Tree),
            _ => Err(SddError::InvalidStrategy(name.to_owned())),
        }
    }
}

#[derive(Debug)]
pub(crate) struct Clause {
    literals: Vec<Literal>,
}

impl SddManager {
    /// Compile a CNF given as a logic-circuit tree.
    ///
    /// # Errors
    ///
    /// Returns [`SddError::StructuralPrecondition`] if the circuit is not a
    /// conjunction of disjunctions of literals, and
    /// [`SddError::UnknownVariable`] if a literal references a variable
    /// outside the vtree.
    pub fn compile_cnf(&self, cnf: &Gate, strategy: CnfStrategy) -> Result<SddRef, SddError> {
        let clauses = self.lower_cnf(cnf)?;
        tracing::info!(clauses = clauses.len(), ?strategy, "compiling CNF");

        // An empty clause makes the whole conjunction unsatisfiable.
        if clauses.iter().any(|clause| clause.literals.is_empty()) {
            return Ok(self.contradiction());
        }

        let sdd = match strategy {
            CnfStrategy::Linear => self.compile_cnf_linear(&clauses),
            CnfStrategy::Tree => self.compile_cnf_tree(clauses, &self.vtree_manager().root()),
        };

        tracing::info!(size = sdd.size(), "compiled CNF");
        Ok(sdd)
    }

    /// Compile a single clause given as a disjunction-of-literals gate.
    ///
    /// # Errors
    ///
    /// Same conditions as [`SddManager::compile_cnf`].
    pub fn compile_clause(&self, clause: &Gate) -> Result<SddRef, SddError> {
        let clause = self.lower_clause(clause)?;
        Ok(self.clause_sdd(&clause))
    }

    fn lower_cnf(&self, cnf: &Gate) -> Result<Vec<Clause>, SddError> {
        let Gate::Conjunction(clauses) = cnf else {
            return Err(SddError::StructuralPrecondition(format!(
                "the root must be a conjunction of clauses, found a {}",
                cnf.kind()
            )));
        };

        clauses
            .iter()
            .map(|clause| self.lower_clause(clause))
            .collect()
    }

    fn lower_clause(&self, clause: &Gate) -> Result<Clause, SddError> {
        let Gate::Disjunction(members) = clause else {
            return Err(SddError::StructuralPrecondition(format!(
                "every clause must be a disjunction of literals, found a {}",
                clause.kind()
            )));
        };

        let literals = members
            .iter()
            .map(|member| match member {
                Gate::Literal(literal) => Ok(self
                    .literal(*literal)?
                    .literal()
                    .expect("literal SDDs carry their literal")),
                other => Err(SddError::StructuralPrecondition(format!(
                    "clause members must be literals, found a {}",
                    other.kind()
                ))),
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Clause { literals })
    }

    /// Disjoin the literals of a clause, starting from the false constant.
    fn clause_sdd(&self, clause: &Clause) -> SddRef {
        let mut sdd = self.contradiction();

        for literal in &clause.literals {
            let lit = self.literal_from_idx(literal.variable(), literal.polarity());
            sdd = self.disjoin(&sdd, &lit);
        }

        sdd
    }

    fn compile_cnf_linear(&self, clauses: &[Clause]) -> SddRef {
        let mut sdd = self.tautology();

        for (idx, clause) in clauses.iter().enumerate() {
            sdd = self.conjoin(&sdd, &self.clause_sdd(clause));
            tracing::debug!(clause = idx, size = sdd.size(), "conjoined clause");
        }

        sdd
    }

    fn compile_cnf_tree(&self, clauses: Vec<Clause>, vtree: &VTreeRef) -> SddRef {
        if vtree.is_leaf() {
            let mut sdd = self.tautology();
            for clause in &clauses {
                sdd = self.conjoin(&sdd, &self.clause_sdd(clause));
            }
            return sdd;
        }

        let left = vtree.left_child();
        let right = vtree.right_child();

        let mut left_clauses = Vec::new();
        let mut right_clauses = Vec::new();
        let mut mixed = Vec::new();
        for clause in clauses {
            let (first, last) = self.clause_span(&clause);
            if first >= left.inorder_first() && last <= left.inorder_last() {
                left_clauses.push(clause);
            } else if first >= right.inorder_first() && last <= right.inorder_last() {
                right_clauses.push(clause);
            } else {
                mixed.push(clause);
            }
        }

        // Clauses straddling both halves are folded smallest-first; the sort
        // is stable, so equal arities keep their input order.
        mixed.sort_by_key(|clause| clause.literals.len());

        let left_sdd = self.compile_cnf_tree(left_clauses, &left);
        let right_sdd = self.compile_cnf_tree(right_clauses, &right);

        let mut sdd = self.conjoin(&left_sdd, &right_sdd);
        for clause in &mixed {
            sdd = self.conjoin(&sdd, &self.clause_sdd(clause));
        }

        sdd
    }

    /// The inorder interval spanned by the leaf vtrees of a clause.
    fn clause_span(&self, clause: &Clause) -> (VTreeIdx, VTreeIdx) {
        let leaves = clause.literals.iter().map(|literal| {
            self.vtree_manager()
                .leaf_of(literal.variable())
                .expect("clause literals are resolved against the vtree")
                .index()
        });

        let first = leaves
            .clone()
            .min()
            .expect("clauses dispatched by scope are never empty");
        let last = leaves
            .max()
            .expect("clauses dispatched by scope are never empty");

        (first, last)
    }
}

#[cfg(test)]
mod test {
    use super::{CnfStrategy, Gate};
    use crate::error::SddError;
    use crate::manager::{options::SddOptions, SddManager};
    use num_bigint::BigUint;
    use pretty_assertions::assert_eq;

    fn manager(num_variables: u32) -> SddManager {
        SddManager::new(&SddOptions::builder().num_variables(num_variables).build())
    }

    #[test]
    fn strategy_names() {
        assert_eq!("linear".parse(), Ok(CnfStrategy::Linear));
        assert_eq!("tree".parse(), Ok(CnfStrategy::Tree));
        assert_eq!(
            "dtree".parse::<CnfStrategy>(),
            Err(SddError::InvalidStrategy(String::from("dtree")))
        );
    }

    #[test]
    fn rejects_malformed_circuits() {
        let manager = manager(4);

        let not_a_conjunction = Gate::clause(&[1, 2]);
        assert!(matches!(
            manager.compile_cnf(&not_a_conjunction, CnfStrategy::Linear),
            Err(SddError::StructuralPrecondition(..))
        ));

        let nested_conjunction =
            Gate::Conjunction(vec![Gate::Conjunction(vec![Gate::clause(&[1])])]);
        assert!(matches!(
            manager.compile_cnf(&nested_conjunction, CnfStrategy::Linear),
            Err(SddError::StructuralPrecondition(..))
        ));

        let constant_in_clause =
            Gate::Conjunction(vec![Gate::Disjunction(vec![Gate::Constant(true)])]);
        assert!(matches!(
            manager.compile_cnf(&constant_in_clause, CnfStrategy::Linear),
            Err(SddError::StructuralPrecondition(..))
        ));

        let unknown_variable = Gate::cnf(&[&[1, -9]]);
        assert_eq!(
            manager.compile_cnf(&unknown_variable, CnfStrategy::Linear),
            Err(SddError::UnknownVariable(-9))
        );
    }

    #[test]
    fn empty_cnf_is_valid() {
        let manager = manager(4);

        let tautology = Gate::Conjunction(vec![]);
        assert_eq!(
            manager.compile_cnf(&tautology, CnfStrategy::Linear).unwrap(),
            manager.tautology()
        );

        let unsatisfiable = Gate::cnf(&[&[1, 2], &[]]);
        assert_eq!(
            manager
                .compile_cnf(&unsatisfiable, CnfStrategy::Tree)
                .unwrap(),
            manager.contradiction()
        );
    }

    #[test]
    fn single_clause() {
        let manager = manager(4);

        let clause = Gate::clause(&[1, -3]);
        let sdd = manager.compile_clause(&clause).unwrap();

        assert_eq!(
            sdd,
            manager.disjoin(
                &manager.literal(1).unwrap(),
                &manager.literal(-3).unwrap()
            )
        );
        assert_eq!(manager.model_count(&sdd, 4), BigUint::from(12u32));
    }

    #[test]
    fn strategies_agree() {
        let manager = manager(7);

        let cnf = Gate::cnf(&[
            &[1, 2, -4],
            &[-1, 5],
            &[3, -6],
            &[6, 7],
            &[-2, -7],
            &[4],
        ]);

        let linear = manager.compile_cnf(&cnf, CnfStrategy::Linear).unwrap();
        let tree = manager.compile_cnf(&cnf, CnfStrategy::Tree).unwrap();

        // The manager is canonical: both strategies produce the same node.
        assert_eq!(linear, tree);
        manager.validate(&linear).unwrap();
    }

    #[test]
    fn tree_strategy_compiles_scoped_clauses() {
        let manager = manager(8);

        // Clauses fully inside the left half, fully inside the right half,
        // and straddling both.
        let cnf = Gate::cnf(&[&[1, -2], &[3, 4], &[5, 6], &[-7, 8], &[2, -5], &[4, 7]]);

        let tree = manager.compile_cnf(&cnf, CnfStrategy::Tree).unwrap();
        let linear = manager.compile_cnf(&cnf, CnfStrategy::Linear).unwrap();

        assert_eq!(tree, linear);
        manager.validate(&tree).unwrap();

        let model_count = manager.model_count(&tree, 8);
        assert_eq!(model_count, manager.model_count(&linear, 8));
        assert!(model_count > BigUint::from(0u32));
    }

    #[test]
    fn repeated_compilation_is_pointer_identical() {
        let manager = manager(5);

        let cnf = Gate::cnf(&[&[1, -2], &[2, 3], &[-3, 4, 5]]);

        let fst = manager.compile_cnf(&cnf, CnfStrategy::Linear).unwrap();
        let snd = manager.compile_cnf(&cnf, CnfStrategy::Linear).unwrap();
        assert_eq!(fst, snd);
    }
}
