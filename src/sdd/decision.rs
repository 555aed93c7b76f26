use std::collections::BTreeSet;

use crate::sdd::element::Element;

/// Decision node (⋁): a set of elements whose primes partition the space of
/// assignments over the left part of the node's vtree.
#[derive(PartialEq, Eq, Clone, Hash, PartialOrd, Ord, Debug)]
pub(crate) struct Decision {
    pub(crate) elements: BTreeSet<Element>,
}
