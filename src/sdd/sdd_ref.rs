use std::cell::RefCell;
use std::collections::BTreeSet;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use crate::literal::Literal;
use crate::sdd::{Decision, Element, Sdd, SddId, SddType};
use crate::vtree::{VTreeIdx, VTreeRef};

/// A shared handle to an SDD node.
///
/// Handles compare by node id: the manager hash-conses all nodes, so id
/// equality coincides with pointer identity and with logical equivalence.
#[derive(Debug, Clone)]
pub struct SddRef(pub(crate) Rc<RefCell<Sdd>>);

impl PartialEq for SddRef {
    fn eq(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}

impl Eq for SddRef {}

impl Ord for SddRef {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.id().cmp(&other.id())
    }
}

impl PartialOrd for SddRef {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Hash for SddRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id().hash(state);
    }
}

impl SddRef {
    #[must_use]
    pub(crate) fn new(sdd: Sdd) -> Self {
        SddRef(Rc::new(RefCell::new(sdd)))
    }

    #[must_use]
    pub fn id(&self) -> SddId {
        self.0.borrow().id()
    }

    /// The vtree this SDD is normalized for, [`Option::None`] for constants.
    #[must_use]
    pub fn vtree(&self) -> Option<VTreeRef> {
        self.0.borrow().vtree.clone()
    }

    /// # Panics
    ///
    /// Panics if the SDD is a constant.
    pub(crate) fn vtree_idx(&self) -> VTreeIdx {
        self.vtree()
            .map(|vtree| vtree.index())
            .expect("constant SDDs are not normalized for any vtree")
    }

    /// Check whether the SDD represents the true constant.
    #[must_use]
    pub fn is_true(&self) -> bool {
        self.0.borrow().is_true()
    }

    /// Check whether the SDD represents the false constant.
    #[must_use]
    pub fn is_false(&self) -> bool {
        self.0.borrow().is_false()
    }

    /// Check whether the SDD represents either of the two constants.
    #[must_use]
    pub fn is_constant(&self) -> bool {
        self.0.borrow().is_constant()
    }

    /// Check whether the SDD represents a literal.
    #[must_use]
    pub fn is_literal(&self) -> bool {
        self.0.borrow().is_literal()
    }

    /// Check whether the SDD represents a decision node.
    #[must_use]
    pub fn is_decision(&self) -> bool {
        self.0.borrow().is_decision()
    }

    /// Check whether the SDD represents either a constant or a literal.
    #[must_use]
    pub fn is_constant_or_literal(&self) -> bool {
        self.0.borrow().is_constant_or_literal()
    }

    pub(crate) fn literal(&self) -> Option<Literal> {
        match self.0.borrow().sdd_type {
            SddType::Literal(literal) => Some(literal),
            _ => None,
        }
    }

    pub(crate) fn elements(&self) -> Option<BTreeSet<Element>> {
        self.0.borrow().sdd_type.elements()
    }

    /// # Panics
    ///
    /// Panics if the negation has not been linked yet; pairs are linked
    /// before nodes become reachable.
    pub(crate) fn negation_id(&self) -> SddId {
        self.0
            .borrow()
            .negation
            .expect("negation is linked when the node is created")
    }

    pub(crate) fn set_negation(&self, negation: SddId) {
        self.0.borrow_mut().negation = Some(negation);
    }

    /// The size of the SDD: the number of elements of all distinct decision
    /// nodes reachable from it.
    #[must_use]
    pub fn size(&self) -> u64 {
        let mut seen: BTreeSet<SddId> = BTreeSet::new();
        let mut queue = vec![self.clone()];

        let mut size: u64 = 0;
        while let Some(sdd) = queue.pop() {
            if !seen.insert(sdd.id()) {
                continue;
            }

            if let SddType::Decision(Decision { ref elements }) = sdd.0.borrow().sdd_type {
                size += elements.len() as u64;

                for Element { prime, sub } in elements {
                    queue.push(prime.clone());
                    queue.push(sub.clone());
                }
            }
        }

        size
    }

    /// The number of distinct decision nodes reachable from this SDD.
    #[must_use]
    pub fn num_nodes(&self) -> u64 {
        let mut seen: BTreeSet<SddId> = BTreeSet::new();
        let mut queue = vec![self.clone()];

        let mut count: u64 = 0;
        while let Some(sdd) = queue.pop() {
            if !seen.insert(sdd.id()) {
                continue;
            }

            if let SddType::Decision(Decision { ref elements }) = sdd.0.borrow().sdd_type {
                count += 1;

                for Element { prime, sub } in elements {
                    queue.push(prime.clone());
                    queue.push(sub.clone());
                }
            }
        }

        count
    }

    /// Enumerate all reachable nodes bottom-up: every prime and sub of a
    /// decision appears before the decision itself. The order is
    /// deterministic because elements are kept canonically sorted.
    #[must_use]
    pub fn linearize(&self) -> Vec<SddRef> {
        fn visit(sdd: &SddRef, seen: &mut BTreeSet<SddId>, ordered: &mut Vec<SddRef>) {
            if !seen.insert(sdd.id()) {
                return;
            }

            if let Some(elements) = sdd.elements() {
                for Element { prime, sub } in &elements {
                    visit(prime, seen, ordered);
                    visit(sub, seen, ordered);
                }
            }

            ordered.push(sdd.clone());
        }

        let mut ordered = Vec::new();
        visit(self, &mut BTreeSet::new(), &mut ordered);
        ordered
    }
}
