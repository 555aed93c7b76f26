use crate::{literal::VariableIdx, manager::options::VTreeStrategy};
use derive_more::derive::{Add, AddAssign, From, Sub};
use std::{
    cell::RefCell,
    collections::{BTreeSet, VecDeque},
    fmt::{Debug, Display},
    rc::Rc,
};

#[derive(Clone, PartialEq)]
pub(crate) enum Node {
    Leaf(VariableIdx),
    Internal(VTreeRef, VTreeRef),
}

#[derive(PartialEq, Eq, Clone, PartialOrd, Ord, Debug, Copy, Hash, Add, AddAssign, Sub, From)]
pub struct VTreeIdx(pub u32);

impl Display for VTreeIdx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A node of the variable tree the SDDs are normalized for.
///
/// The tree is built once when the manager is created and never changes
/// afterwards. Every node knows its index according to the inorder traversal
/// and the indices of the first and last node of its subtree, which makes
/// subtree containment an interval check.
#[derive(PartialEq, Clone)]
pub struct VTree {
    parent: Option<VTreeRef>,
    idx: VTreeIdx,

    pub(super) node: Node,

    inorder_first: VTreeIdx,
    inorder_last: VTreeIdx,
}

impl Debug for VTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.node.clone() {
            Node::Leaf(variable) => write!(f, "leaf {} for {}", self.idx, variable),
            Node::Internal(lc, rc) => write!(
                f,
                "internal {} ({}, {})",
                self.idx,
                lc.0.borrow().idx,
                rc.0.borrow().idx
            ),
        }
    }
}

impl VTree {
    #[must_use]
    fn new(parent: Option<VTreeRef>, idx: VTreeIdx, node: Node) -> VTree {
        VTree {
            parent,
            idx,
            node,
            inorder_first: idx,
            inorder_last: idx,
        }
    }

    fn set_pointers(&mut self, inorder_first: VTreeIdx, inorder_last: VTreeIdx, idx: VTreeIdx) {
        self.idx = idx;
        self.inorder_first = inorder_first;
        self.inorder_last = inorder_last;
    }

    /// Collect all the variables reachable from this vtree node.
    pub(crate) fn get_variables(&self) -> BTreeSet<VariableIdx> {
        match self.node.clone() {
            Node::Leaf(variable) => BTreeSet::from([variable]),
            Node::Internal(left, right) => left
                .0
                .borrow()
                .get_variables()
                .union(&right.0.borrow().get_variables())
                .copied()
                .collect::<BTreeSet<_>>(),
        }
    }
}

/// VTreeOrder describes the relation between two vtrees.
#[derive(Debug, PartialEq)]
pub(crate) enum VTreeOrder {
    // The two compared vtrees are one and the same.
    Equal,
    // The two compared vtrees are not subtrees of one another.
    Inequal,
    // Left vtree is a sub-vtree of the right vtree.
    LeftSubOfRight,
    // Right vtree is a sub-vtree of the left vtree.
    RightSubOfLeft,
}

#[derive(Debug, Clone)]
pub struct VTreeRef(pub(crate) Rc<RefCell<VTree>>);

impl PartialOrd for VTreeRef {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for VTreeRef {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.index().cmp(&other.index())
    }
}

impl PartialEq for VTreeRef {
    fn eq(&self, other: &Self) -> bool {
        self.index() == other.index()
    }
}

impl Eq for VTreeRef {}

impl VTreeRef {
    pub(crate) fn new(parent: Option<VTreeRef>, idx: VTreeIdx, node: Node) -> Self {
        VTreeRef(Rc::new(RefCell::new(VTree::new(parent, idx, node))))
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self.0.borrow().node, Node::Leaf(..))
    }

    pub fn is_internal(&self) -> bool {
        matches!(self.0.borrow().node, Node::Internal(..))
    }

    /// # Panics
    ///
    /// Panics if the vtree is a leaf.
    pub fn left_child(&self) -> VTreeRef {
        match self.0.borrow().node {
            Node::Leaf(_) => panic!("vtree node must be internal in order to have children"),
            Node::Internal(ref lc, _) => lc.clone(),
        }
    }

    /// # Panics
    ///
    /// Panics if the vtree is a leaf.
    pub fn right_child(&self) -> VTreeRef {
        match self.0.borrow().node {
            Node::Leaf(_) => panic!("vtree node must be internal in order to have children"),
            Node::Internal(_, ref rc) => rc.clone(),
        }
    }

    pub fn parent(&self) -> Option<VTreeRef> {
        self.0.borrow().parent.clone()
    }

    pub fn index(&self) -> VTreeIdx {
        self.0.borrow().idx
    }

    /// The variable of a leaf vtree, [`Option::None`] for internal nodes.
    pub fn variable(&self) -> Option<VariableIdx> {
        match self.0.borrow().node {
            Node::Leaf(variable) => Some(variable),
            Node::Internal(..) => None,
        }
    }

    /// All variables appearing in the subtree rooted at this node.
    pub fn variables(&self) -> BTreeSet<VariableIdx> {
        self.0.borrow().get_variables()
    }

    /// Check whether `other` lies in the subtree rooted at this node, i.e.
    /// whether the variables of `other` are a subset of the variables here.
    pub fn contains(&self, other: &VTreeRef) -> bool {
        self.inorder_first() <= other.inorder_first() && other.inorder_last() <= self.inorder_last()
    }

    pub(crate) fn inorder_first(&self) -> VTreeIdx {
        self.0.borrow().inorder_first
    }

    pub(crate) fn inorder_last(&self) -> VTreeIdx {
        self.0.borrow().inorder_last
    }

    fn set_parent(&self, parent: Option<&VTreeRef>) {
        self.0.borrow_mut().parent = parent.cloned();
    }
}

/// Blueprint for a caller-provided vtree shape. Leaves name variables by
/// their 1-based number, matching the signed-literal API of the manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VTreePlan {
    Leaf(u32),
    Internal(Box<VTreePlan>, Box<VTreePlan>),
}

impl VTreePlan {
    #[must_use]
    pub fn leaf(variable: u32) -> VTreePlan {
        VTreePlan::Leaf(variable)
    }

    #[must_use]
    pub fn internal(left: VTreePlan, right: VTreePlan) -> VTreePlan {
        VTreePlan::Internal(Box::new(left), Box::new(right))
    }
}

#[derive(Debug)]
pub(crate) struct VTreeManager {
    root: VTreeRef,
    // Leaf vtrees indexed by variable.
    leaves: Vec<VTreeRef>,
}

impl VTreeManager {
    /// # Panics
    ///
    /// Panics if there are no variables, or if a custom plan does not mention
    /// every variable exactly once.
    #[must_use]
    pub(crate) fn new(strategy: &VTreeStrategy, num_variables: u32) -> VTreeManager {
        assert!(num_variables > 0, "a vtree needs at least one variable");

        let variables: Vec<_> = (0..num_variables).map(VariableIdx).collect();
        let root = match strategy {
            VTreeStrategy::Balanced => VTreeManager::balanced(&variables),
            VTreeStrategy::RightLinear => VTreeManager::right_linear(&variables),
            VTreeStrategy::LeftLinear => VTreeManager::left_linear(&variables),
            VTreeStrategy::Custom(plan) => VTreeManager::from_plan(plan),
        };

        VTreeManager::set_inorder_indices(&root, VTreeIdx(0));

        let mut leaves: Vec<Option<VTreeRef>> = vec![None; num_variables as usize];
        VTreeManager::collect_leaves(&root, &mut leaves);
        let leaves = leaves
            .into_iter()
            .enumerate()
            .map(|(variable, leaf)| {
                leaf.unwrap_or_else(|| panic!("vtree is missing a leaf for x{}", variable + 1))
            })
            .collect();

        VTreeManager { root, leaves }
    }

    /// Construct a balanced vtree.
    fn balanced(variables: &[VariableIdx]) -> VTreeRef {
        let mut nodes: Vec<_> = variables
            .iter()
            .map(|variable| VTreeRef::new(None, VTreeIdx(0), Node::Leaf(*variable)))
            .collect();

        while nodes.len() > 1 {
            let mut parents = Vec::with_capacity(nodes.len() / 2);
            for i in (0..nodes.len()).step_by(2) {
                if i + 1 == nodes.len() {
                    continue;
                }
                let lc = nodes.get(i).unwrap();
                let rc = nodes.get(i + 1).unwrap();

                let parent =
                    VTreeRef::new(None, VTreeIdx(0), Node::Internal(lc.clone(), rc.clone()));

                lc.set_parent(Some(&parent));
                rc.set_parent(Some(&parent));

                parents.push(parent);
            }

            if nodes.len() % 2 == 1 {
                parents.push(nodes.last().unwrap().clone());
            }

            nodes = parents;
        }

        nodes.first().unwrap().clone()
    }

    /// Construct a right-linear vtree.
    fn right_linear(variables: &[VariableIdx]) -> VTreeRef {
        fn combine_rightmost(nodes: &mut VecDeque<VTreeRef>) {
            // Pop the last two nodes, create their parent and place
            // the parent back into the queue.
            assert!(nodes.len() >= 2);

            let rc = nodes.pop_back().unwrap();
            let lc = nodes.pop_back().unwrap();

            let parent = VTreeRef::new(None, VTreeIdx(0), Node::Internal(lc.clone(), rc.clone()));
            lc.set_parent(Some(&parent));
            rc.set_parent(Some(&parent));

            nodes.push_back(parent);
        }

        VTreeManager::linear(variables, combine_rightmost)
    }

    /// Construct a left-linear vtree.
    fn left_linear(variables: &[VariableIdx]) -> VTreeRef {
        fn combine_leftmost(nodes: &mut VecDeque<VTreeRef>) {
            assert!(nodes.len() >= 2);

            let lc = nodes.pop_front().unwrap();
            let rc = nodes.pop_front().unwrap();

            let parent = VTreeRef::new(None, VTreeIdx(0), Node::Internal(lc.clone(), rc.clone()));
            lc.set_parent(Some(&parent));
            rc.set_parent(Some(&parent));

            nodes.push_front(parent);
        }

        VTreeManager::linear(variables, combine_leftmost)
    }

    fn linear(
        variables: &[VariableIdx],
        combine_in_place: fn(&mut VecDeque<VTreeRef>),
    ) -> VTreeRef {
        let mut nodes: VecDeque<_> = variables
            .iter()
            .map(|variable| VTreeRef::new(None, VTreeIdx(0), Node::Leaf(*variable)))
            .collect();

        while nodes.len() >= 2 {
            combine_in_place(&mut nodes);
        }

        nodes.pop_front().unwrap()
    }

    /// Construct a vtree from a caller-provided plan.
    fn from_plan(plan: &VTreePlan) -> VTreeRef {
        match plan {
            VTreePlan::Leaf(variable) => {
                assert!(*variable >= 1, "plan variables are numbered from 1");
                VTreeRef::new(None, VTreeIdx(0), Node::Leaf(VariableIdx(variable - 1)))
            }
            VTreePlan::Internal(left, right) => {
                let lc = VTreeManager::from_plan(left);
                let rc = VTreeManager::from_plan(right);
                let parent =
                    VTreeRef::new(None, VTreeIdx(0), Node::Internal(lc.clone(), rc.clone()));
                lc.set_parent(Some(&parent));
                rc.set_parent(Some(&parent));
                parent
            }
        }
    }

    /// Assign inorder indices and subtree intervals. Returns the first index
    /// following the subtree.
    fn set_inorder_indices(node: &VTreeRef, first: VTreeIdx) -> VTreeIdx {
        let children = node.0.borrow().node.clone();
        match children {
            Node::Leaf(_) => {
                node.0.borrow_mut().set_pointers(first, first, first);
                first + VTreeIdx(1)
            }
            Node::Internal(lc, rc) => {
                let own = VTreeManager::set_inorder_indices(&lc, first);
                let next = VTreeManager::set_inorder_indices(&rc, own + VTreeIdx(1));
                node.0
                    .borrow_mut()
                    .set_pointers(first, next - VTreeIdx(1), own);
                next
            }
        }
    }

    fn collect_leaves(node: &VTreeRef, leaves: &mut [Option<VTreeRef>]) {
        match node.0.borrow().node.clone() {
            Node::Leaf(variable) => {
                let slot = leaves
                    .get_mut(variable.0 as usize)
                    .unwrap_or_else(|| panic!("{variable} is outside the variable order"));
                assert!(slot.is_none(), "{variable} appears twice in the vtree");
                *slot = Some(node.clone());
            }
            Node::Internal(lc, rc) => {
                VTreeManager::collect_leaves(&lc, leaves);
                VTreeManager::collect_leaves(&rc, leaves);
            }
        }
    }

    pub(crate) fn root(&self) -> VTreeRef {
        self.root.clone()
    }

    /// The leaf vtree of the given variable, [`Option::None`] if the variable
    /// is unknown.
    pub(crate) fn leaf_of(&self, variable: VariableIdx) -> Option<VTreeRef> {
        self.leaves.get(variable.0 as usize).cloned()
    }

    pub(crate) fn get_vtree(&self, index: VTreeIdx) -> Option<VTreeRef> {
        let mut current = self.root.clone();
        loop {
            let current_index = current.index();
            if current_index == index {
                return Some(current);
            }

            if let Node::Internal(ref lc, ref rc) = current.clone().0.borrow().node {
                if index < current_index {
                    current = lc.clone();
                } else {
                    current = rc.clone();
                }
            } else {
                return None;
            }
        }
    }

    pub(crate) fn least_common_ancestor(
        &self,
        fst_idx: VTreeIdx,
        snd_idx: VTreeIdx,
    ) -> (VTreeRef, VTreeOrder) {
        assert!(
            fst_idx <= snd_idx,
            "`fst` must have index smaller than or equal to `snd`"
        );

        let fst = self
            .get_vtree(fst_idx)
            .unwrap_or_else(|| panic!("vtree with index {fst_idx} does not exist"));
        let snd = self
            .get_vtree(snd_idx)
            .unwrap_or_else(|| panic!("vtree with index {snd_idx} does not exist"));

        if fst_idx == snd_idx {
            return (fst, VTreeOrder::Equal);
        }

        if fst_idx >= snd.inorder_first() {
            return (snd, VTreeOrder::LeftSubOfRight);
        }

        if snd_idx <= fst.inorder_last() {
            return (fst, VTreeOrder::RightSubOfLeft);
        }

        let mut lca = fst
            .parent()
            .expect("nodes in disjoint subtrees have a common ancestor");
        while snd_idx > lca.inorder_last() {
            lca = {
                let parent = lca.parent().expect("ran past the root looking for the lca");
                parent
            }
        }

        (lca, VTreeOrder::Inequal)
    }
}

#[cfg(test)]
pub(crate) mod test {
    use crate::{
        literal::VariableIdx,
        manager::options::VTreeStrategy,
        vtree::{Node, VTreeManager, VTreeOrder, VTreePlan},
    };
    use std::collections::BTreeSet;

    #[test]
    fn inorder_intervals() {
        //           3
        //         /   \
        //        1     5
        //      / |     | \
        //     0  2     4  6
        //     A  B     C  D
        let manager = VTreeManager::new(&VTreeStrategy::Balanced, 4);

        let root = manager.root();
        assert_eq!(root.index().0, 3);
        assert_eq!(root.inorder_first().0, 0);
        assert_eq!(root.inorder_last().0, 6);

        let lc = root.left_child();
        assert_eq!(lc.index().0, 1);
        assert_eq!(lc.inorder_first().0, 0);
        assert_eq!(lc.inorder_last().0, 2);

        let rc = root.right_child();
        assert_eq!(rc.index().0, 5);
        assert_eq!(rc.inorder_first().0, 4);
        assert_eq!(rc.inorder_last().0, 6);

        assert_eq!(lc.left_child().index().0, 0);
        assert_eq!(lc.right_child().index().0, 2);
        assert_eq!(rc.left_child().index().0, 4);
        assert_eq!(rc.right_child().index().0, 6);

        assert!(root.contains(&lc));
        assert!(root.contains(&rc));
        assert!(lc.contains(&lc.left_child()));
        assert!(!lc.contains(&rc));
        assert!(!rc.contains(&lc.right_child()));
    }

    #[test]
    fn right_linear_structure() {
        let manager = VTreeManager::new(&VTreeStrategy::RightLinear, 3);

        // Test that the vtree has the following structure:
        //    *
        //   / \
        //  A   *
        //     / \
        //    B  C
        let root = manager.root();
        let a = root.left_child().0.borrow().node.clone();
        assert!(matches!(a, Node::Leaf(variable) if variable == VariableIdx(0)));

        let inner = root.right_child();
        let b = inner.left_child().0.borrow().node.clone();
        let c = inner.right_child().0.borrow().node.clone();

        assert!(matches!(b, Node::Leaf(variable) if variable == VariableIdx(1)));
        assert!(matches!(c, Node::Leaf(variable) if variable == VariableIdx(2)));
    }

    #[test]
    fn left_linear_structure() {
        let manager = VTreeManager::new(&VTreeStrategy::LeftLinear, 3);

        //      *
        //     / \
        //    *   C
        //   / \
        //  A   B
        let root = manager.root();
        let c = root.right_child().0.borrow().node.clone();
        assert!(matches!(c, Node::Leaf(variable) if variable == VariableIdx(2)));

        let inner = root.left_child();
        let a = inner.left_child().0.borrow().node.clone();
        let b = inner.right_child().0.borrow().node.clone();

        assert!(matches!(a, Node::Leaf(variable) if variable == VariableIdx(0)));
        assert!(matches!(b, Node::Leaf(variable) if variable == VariableIdx(1)));
    }

    #[test]
    fn custom_plan() {
        // ((A, B), C) spelled out by hand.
        let plan = VTreePlan::internal(
            VTreePlan::internal(VTreePlan::leaf(1), VTreePlan::leaf(2)),
            VTreePlan::leaf(3),
        );
        let manager = VTreeManager::new(&VTreeStrategy::Custom(plan), 3);

        let root = manager.root();
        let c = root.right_child().0.borrow().node.clone();
        assert!(matches!(c, Node::Leaf(variable) if variable == VariableIdx(2)));

        let inner = root.left_child();
        assert_eq!(inner.left_child().variable(), Some(VariableIdx(0)));
        assert_eq!(inner.right_child().variable(), Some(VariableIdx(1)));
    }

    #[test]
    #[should_panic(expected = "appears twice")]
    fn custom_plan_duplicate_variable() {
        let plan = VTreePlan::internal(VTreePlan::leaf(1), VTreePlan::leaf(1));
        let _ = VTreeManager::new(&VTreeStrategy::Custom(plan), 2);
    }

    #[test]
    fn leaf_lookup() {
        let manager = VTreeManager::new(&VTreeStrategy::RightLinear, 4);
        //     1
        //   /   \
        //  0     3
        //  A   /   \
        //     2     5
        //     B   /   \
        //        4     6
        //        C     D

        let leaf_index = |variable: u32| {
            manager
                .leaf_of(VariableIdx(variable))
                .map(|leaf| leaf.index().0)
        };

        assert_eq!(leaf_index(0), Some(0));
        assert_eq!(leaf_index(1), Some(2));
        assert_eq!(leaf_index(2), Some(4));
        assert_eq!(leaf_index(3), Some(6));
        assert_eq!(leaf_index(4), None);
    }

    #[test]
    fn least_common_ancestor() {
        let manager = VTreeManager::new(&VTreeStrategy::Balanced, 4);
        //           3
        //         /   \
        //        1     5
        //      / |     | \
        //     0  2     4  6
        //     A  B     C  D

        let root_idx = manager.root().index();

        let (lca, ord) = manager.least_common_ancestor(root_idx, root_idx);
        assert_eq!(ord, VTreeOrder::Equal);
        assert_eq!(lca.index(), root_idx);

        let (lca, ord) = manager.least_common_ancestor(1_u32.into(), root_idx);
        assert_eq!(ord, VTreeOrder::LeftSubOfRight);
        assert_eq!(lca.index(), root_idx);

        let (lca, ord) = manager.least_common_ancestor(root_idx, 5_u32.into());
        assert_eq!(ord, VTreeOrder::RightSubOfLeft);
        assert_eq!(lca.index(), root_idx);

        let (lca, ord) = manager.least_common_ancestor(0_u32.into(), 6_u32.into());
        assert_eq!(ord, VTreeOrder::Inequal);
        assert_eq!(lca.index(), root_idx);

        let (lca, ord) = manager.least_common_ancestor(0_u32.into(), 2_u32.into());
        assert_eq!(ord, VTreeOrder::Inequal);
        assert_eq!(lca.index().0, 1);
    }

    #[test]
    fn variables() {
        let manager = VTreeManager::new(&VTreeStrategy::LeftLinear, 4);

        let variables = manager.root().variables();
        assert_eq!(
            variables,
            BTreeSet::from([
                VariableIdx(0),
                VariableIdx(1),
                VariableIdx(2),
                VariableIdx(3)
            ])
        );

        let left = manager.root().left_child();
        assert_eq!(
            left.variables(),
            BTreeSet::from([VariableIdx(0), VariableIdx(1), VariableIdx(2)])
        );
    }
}
