use std::cell::RefCell;

use crate::literal::{Polarity, VariableIdx};
use crate::sdd::SddRef;

/// Both pre-created SDDs of a single variable.
#[derive(Clone, Debug)]
pub(crate) struct LiteralVariants {
    positive_literal: SddRef,
    negative_literal: SddRef,
}

impl LiteralVariants {
    pub(crate) fn get(&self, polarity: Polarity) -> SddRef {
        match polarity {
            Polarity::Positive => self.positive_literal.clone(),
            Polarity::Negative => self.negative_literal.clone(),
        }
    }
}

/// Store for the literal singletons, indexed by variable.
///
/// Every variable gets exactly two literal SDDs when the manager is created;
/// compiling a literal afterwards only ever hands out these nodes.
#[derive(Debug)]
pub(crate) struct LiteralManager {
    variants: RefCell<Vec<LiteralVariants>>,
}

impl LiteralManager {
    pub(crate) fn new() -> Self {
        LiteralManager {
            variants: RefCell::new(Vec::new()),
        }
    }

    /// Keep track of a new variable. Variables must be added in index order.
    pub(crate) fn add_variable(&self, positive_literal: SddRef, negative_literal: SddRef) {
        self.variants.borrow_mut().push(LiteralVariants {
            positive_literal,
            negative_literal,
        });
    }

    /// Get the number of variables irrespective of polarities.
    pub(crate) fn len(&self) -> usize {
        self.variants.borrow().len()
    }

    /// Find a literal by variable index and polarity. Returns [`Option::None`]
    /// if no such variable exists.
    pub(crate) fn get(&self, variable: VariableIdx, polarity: Polarity) -> Option<SddRef> {
        self.variants
            .borrow()
            .get(variable.0 as usize)
            .map(|variants| variants.get(polarity))
    }
}

#[cfg(test)]
mod test {
    use crate::literal::Polarity;
    use crate::manager::{options::SddOptions, SddManager};

    #[test]
    fn create_literals() {
        let options = SddOptions::builder().num_variables(2).build();
        let manager = SddManager::new(&options);

        for literal in [1, -1, 2, -2] {
            let sdd = manager.literal(literal).unwrap();
            assert!(sdd.is_literal());
        }
    }

    #[test]
    fn literals_are_singletons() {
        let options = SddOptions::builder().num_variables(2).build();
        let manager = SddManager::new(&options);

        assert_eq!(manager.literal(1).unwrap(), manager.literal(1).unwrap());
        assert_eq!(manager.literal(-2).unwrap(), manager.literal(-2).unwrap());
        assert_ne!(manager.literal(1).unwrap(), manager.literal(2).unwrap());

        let positive = manager.literal(1).unwrap();
        let negative = manager.literal(-1).unwrap();
        assert_eq!(manager.negate(&positive), negative);
        assert_eq!(manager.negate(&negative), positive);
    }
}
