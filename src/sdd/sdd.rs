use core::fmt;
use derive_more::derive::Add;
use std::{collections::BTreeSet, fmt::Display};

use crate::{
    literal::Literal,
    sdd::{Decision, Element},
    vtree::VTreeRef,
};

#[derive(Eq, PartialEq, Hash, Debug, PartialOrd, Ord, Clone, Copy, Add)]
pub struct SddId(pub u32);

impl Display for SddId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SddId({})", self.0)
    }
}

#[derive(PartialEq, Eq, Clone, Debug)]
pub(crate) enum SddType {
    True,
    False,
    Literal(Literal),
    Decision(Decision),
}

impl SddType {
    pub(crate) fn name(&self) -> &str {
        match self {
            SddType::False => "false",
            SddType::True => "true",
            SddType::Literal(..) => "literal",
            SddType::Decision(..) => "decision",
        }
    }

    pub(crate) fn elements(&self) -> Option<BTreeSet<Element>> {
        match self {
            SddType::Decision(Decision { elements }) => Some(elements.clone()),
            _ => None,
        }
    }
}

/// A single node of the SDD DAG.
///
/// Nodes are immutable once created, except for the `negation` back-reference
/// which is linked right after the node and its partner are allocated. Keying
/// the partner by id instead of a reference keeps the ownership graph
/// acyclic; the manager's node table resolves ids back to nodes.
#[derive(PartialEq, Eq, Clone)]
pub struct Sdd {
    pub(crate) id: SddId,
    pub(crate) sdd_type: SddType,
    // Constants are not normalized for any vtree.
    pub(crate) vtree: Option<VTreeRef>,
    pub(crate) negation: Option<SddId>,
}

impl fmt::Debug for Sdd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sdd")
            .field("id", &self.id)
            .field("sdd_type", &self.sdd_type.name())
            .field("vtree_idx", &self.vtree.as_ref().map(VTreeRef::index))
            .finish()
    }
}

impl Sdd {
    #[must_use]
    pub(crate) fn new(sdd_type: SddType, id: SddId, vtree: Option<VTreeRef>) -> Sdd {
        Sdd {
            id,
            sdd_type,
            vtree,
            negation: None,
        }
    }

    #[must_use]
    pub fn id(&self) -> SddId {
        self.id
    }

    /// Check whether the SDD represents the true constant.
    pub fn is_true(&self) -> bool {
        matches!(self.sdd_type, SddType::True)
    }

    /// Check whether the SDD represents the false constant.
    pub fn is_false(&self) -> bool {
        matches!(self.sdd_type, SddType::False)
    }

    /// Check whether the SDD represents either of the two constants.
    pub fn is_constant(&self) -> bool {
        self.is_true() || self.is_false()
    }

    /// Check whether the SDD represents a literal.
    pub fn is_literal(&self) -> bool {
        matches!(self.sdd_type, SddType::Literal(..))
    }

    /// Check whether the SDD represents a decision node.
    pub fn is_decision(&self) -> bool {
        matches!(self.sdd_type, SddType::Decision(..))
    }

    /// Check whether the SDD represents either a constant or a literal.
    pub fn is_constant_or_literal(&self) -> bool {
        self.is_constant() || self.is_literal()
    }
}
