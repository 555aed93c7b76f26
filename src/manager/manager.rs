use std::cell::{Cell, RefCell};
use std::collections::BTreeSet;

use fxhash::FxHashMap;
use tracing::instrument;

use crate::{
    error::SddError,
    literal::{Literal, LiteralManager, Polarity, VariableIdx},
    manager::options::SddOptions,
    sdd::{Decision, Element, Sdd, SddId, SddRef, SddType},
    vtree::{VTreeIdx, VTreeManager, VTreeOrder, VTreeRef},
};

// The constants have indices 0 and 1 throughout the whole computation.
pub(crate) const FALSE_SDD_ID: SddId = SddId(0);
pub(crate) const TRUE_SDD_ID: SddId = SddId(1);

/// Bottom-up compiler of Boolean functions into trimmed, compressed, and
/// canonical SDDs.
///
/// The manager owns every node for its whole lifetime: the two constants, two
/// literals per variable, and all decision nodes ever built. Decisions are
/// hash-consed per inner vtree node, so logically equivalent SDDs are always
/// the same node. Every decision is created together with its negation and
/// the pair is linked both ways, which makes [`SddManager::negate`] constant
/// time.
///
/// The manager is single-threaded; all interior mutability is unsynchronized.
#[allow(clippy::module_name_repetitions)]
#[derive(Debug)]
pub struct SddManager {
    options: SddOptions,

    vtrees: VTreeManager,
    literals: LiteralManager,

    // Every node the manager ever created, by id.
    nodes: RefCell<FxHashMap<SddId, SddRef>>,

    // Unique table per inner vtree node, keyed by the canonically ordered
    // XY-partition.
    decisions: RefCell<FxHashMap<VTreeIdx, FxHashMap<BTreeSet<Element>, SddId>>>,

    // Conjunction cache. Keys are normalized by `apply` so that (a, b) and
    // (b, a) share an entry.
    conjunctions: RefCell<FxHashMap<(SddId, SddId), SddId>>,

    next_id: Cell<SddId>,
}

impl SddManager {
    /// # Panics
    ///
    /// Panics if the options request no variables, or if a custom vtree plan
    /// does not mention every variable exactly once.
    #[must_use]
    pub fn new(options: &SddOptions) -> SddManager {
        let manager = SddManager {
            options: options.clone(),
            vtrees: VTreeManager::new(&options.vtree_strategy, options.num_variables),
            literals: LiteralManager::new(),
            nodes: RefCell::new(FxHashMap::default()),
            decisions: RefCell::new(FxHashMap::default()),
            conjunctions: RefCell::new(FxHashMap::default()),
            next_id: Cell::new(SddId(0)),
        };

        let ff = manager.new_node(SddType::False, None);
        let tt = manager.new_node(SddType::True, None);
        assert_eq!(ff.id(), FALSE_SDD_ID);
        assert_eq!(tt.id(), TRUE_SDD_ID);
        ff.set_negation(tt.id());
        tt.set_negation(ff.id());

        for idx in 0..options.num_variables {
            let variable = VariableIdx(idx);
            let leaf = manager
                .vtrees
                .leaf_of(variable)
                .expect("every variable has a leaf vtree");

            let positive = manager.new_node(
                SddType::Literal(Literal::new(Polarity::Positive, variable)),
                Some(leaf.clone()),
            );
            let negative = manager.new_node(
                SddType::Literal(Literal::new(Polarity::Negative, variable)),
                Some(leaf),
            );

            positive.set_negation(negative.id());
            negative.set_negation(positive.id());
            manager.literals.add_variable(positive, negative);
        }

        manager
    }

    /// The SDD representing the true constant.
    ///
    /// # Panics
    ///
    /// Panics if the constant is missing from the node table, which cannot
    /// happen on a properly constructed manager.
    #[must_use]
    pub fn tautology(&self) -> SddRef {
        self.node(TRUE_SDD_ID)
    }

    /// The SDD representing the false constant.
    ///
    /// # Panics
    ///
    /// Panics if the constant is missing from the node table, which cannot
    /// happen on a properly constructed manager.
    #[must_use]
    pub fn contradiction(&self) -> SddRef {
        self.node(FALSE_SDD_ID)
    }

    /// Compile a constant.
    #[must_use]
    pub fn constant(&self, value: bool) -> SddRef {
        if value {
            self.tautology()
        } else {
            self.contradiction()
        }
    }

    /// Compile a literal given as a signed variable number: `3` is the
    /// positive literal of the third variable, `-3` its negation.
    ///
    /// # Errors
    ///
    /// Returns [`SddError::UnknownVariable`] if the number is zero or
    /// references a variable outside the vtree.
    pub fn literal(&self, literal: i64) -> Result<SddRef, SddError> {
        let magnitude = literal.unsigned_abs();
        if literal == 0 || magnitude > u64::from(self.options.num_variables) {
            return Err(SddError::UnknownVariable(literal));
        }

        let variable =
            VariableIdx(u32::try_from(magnitude).expect("checked against the variable count") - 1);
        Ok(self.literal_from_idx(variable, Polarity::from(literal > 0)))
    }

    /// Compile a variable, i.e. its positive literal.
    ///
    /// # Errors
    ///
    /// Returns [`SddError::UnknownVariable`] if the variable is outside the
    /// vtree.
    pub fn variable(&self, variable: u32) -> Result<SddRef, SddError> {
        self.literal(i64::from(variable))
    }

    /// # Panics
    ///
    /// Panics if the literal singletons for the variable were never created,
    /// which cannot happen for variables of this manager.
    pub(crate) fn literal_from_idx(&self, variable: VariableIdx, polarity: Polarity) -> SddRef {
        self.literals
            .get(variable, polarity)
            .unwrap_or_else(|| panic!("literals for {variable} have not been created"))
    }

    /// Negate the SDD in constant time via its paired negation.
    #[must_use]
    #[instrument(skip_all, ret, level = tracing::Level::DEBUG)]
    pub fn negate(&self, sdd: &SddRef) -> SddRef {
        tracing::debug!(id = sdd.id().0);
        self.node(sdd.negation_id())
    }

    /// Conjoin two SDDs.
    #[must_use]
    #[instrument(skip_all, ret, level = tracing::Level::DEBUG)]
    pub fn conjoin(&self, fst: &SddRef, snd: &SddRef) -> SddRef {
        tracing::debug!(fst_id = fst.id().0, snd_id = snd.id().0);
        if fst == snd {
            return fst.clone();
        }

        if fst.is_false() {
            return fst.clone();
        }

        if snd.is_false() {
            return snd.clone();
        }

        if fst.is_true() {
            return snd.clone();
        }

        if snd.is_true() {
            return fst.clone();
        }

        if self.eq_negated(fst, snd) {
            return self.contradiction();
        }

        self.apply(fst, snd)
    }

    /// Disjoin two SDDs. De Morgan over the conjunction engine: negation is
    /// constant time, so this costs one conjunction.
    #[must_use]
    #[instrument(skip_all, ret, level = tracing::Level::DEBUG)]
    pub fn disjoin(&self, fst: &SddRef, snd: &SddRef) -> SddRef {
        tracing::debug!(fst_id = fst.id().0, snd_id = snd.id().0);
        if fst == snd {
            return fst.clone();
        }

        if fst.is_true() {
            return fst.clone();
        }

        if snd.is_true() {
            return snd.clone();
        }

        if fst.is_false() {
            return snd.clone();
        }

        if snd.is_false() {
            return fst.clone();
        }

        if self.eq_negated(fst, snd) {
            return self.tautology();
        }

        self.negate(&self.apply(&self.negate(fst), &self.negate(snd)))
    }

    /// Compile the implication `fst => snd`.
    #[must_use]
    #[instrument(skip_all, ret, level = tracing::Level::DEBUG)]
    pub fn imply(&self, fst: &SddRef, snd: &SddRef) -> SddRef {
        tracing::debug!(fst_id = fst.id().0, snd_id = snd.id().0);
        if fst == snd {
            return self.tautology();
        }

        if fst.is_false() {
            return self.tautology();
        }

        if fst.is_true() {
            return snd.clone();
        }

        if self.eq_negated(fst, snd) {
            return snd.clone();
        }

        // A => B is equivalent to !A || B.
        self.disjoin(&self.negate(fst), snd)
    }

    /// Compile the equivalence `fst <=> snd`.
    #[must_use]
    #[instrument(skip_all, ret, level = tracing::Level::DEBUG)]
    pub fn equiv(&self, fst: &SddRef, snd: &SddRef) -> SddRef {
        tracing::debug!(fst_id = fst.id().0, snd_id = snd.id().0);
        if fst == snd {
            return self.tautology();
        }

        if self.eq_negated(fst, snd) {
            return self.contradiction();
        }

        // A <=> B is equivalent to (!A && !B) || (A && B).
        let neither = self.conjoin(&self.negate(fst), &self.negate(snd));
        let both = self.conjoin(fst, snd);
        self.disjoin(&neither, &both)
    }

    /// The root of the vtree all SDDs are normalized for.
    #[must_use]
    pub fn root(&self) -> VTreeRef {
        self.vtrees.root()
    }

    /// Number of variables of this manager.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn num_variables(&self) -> u32 {
        self.literals.len() as u32
    }

    /// Total number of nodes tracked by the manager.
    #[must_use]
    pub fn total_sdds(&self) -> u64 {
        self.nodes.borrow().len() as u64
    }

    pub(crate) fn vtree_manager(&self) -> &VTreeManager {
        &self.vtrees
    }

    /// # Panics
    ///
    /// Panics if no node with the given id exists.
    #[must_use]
    pub(crate) fn node(&self, id: SddId) -> SddRef {
        self.nodes
            .borrow()
            .get(&id)
            .unwrap_or_else(|| panic!("{id} is not tracked by this manager"))
            .clone()
    }

    pub(crate) fn lookup_decision(
        &self,
        vtree: VTreeIdx,
        elements: &BTreeSet<Element>,
    ) -> Option<SddId> {
        self.decisions
            .borrow()
            .get(&vtree)
            .and_then(|table| table.get(elements))
            .copied()
    }

    /// Check whether `fst` is the negation of `snd`. Constant time since
    /// negations are paired.
    fn eq_negated(&self, fst: &SddRef, snd: &SddRef) -> bool {
        fst.negation_id() == snd.id()
    }

    /// Conjoin two SDDs which survived all short-circuits: both are
    /// non-constant, distinct, and not each other's negation.
    #[instrument(skip_all, ret, level = tracing::Level::DEBUG)]
    fn apply(&self, fst: &SddRef, snd: &SddRef) -> SddRef {
        tracing::debug!(fst_id = fst.id().0, snd_id = snd.id().0, "apply");

        // Normalize the operand order: the vtree inorder decides which
        // operand supplies primes, and the id breaks ties so that (a, b) and
        // (b, a) hit the same cache entry.
        let (fst, snd) = if (fst.vtree_idx(), fst.id()) <= (snd.vtree_idx(), snd.id()) {
            (fst, snd)
        } else {
            (snd, fst)
        };

        if let Some(cached) = self
            .conjunctions
            .borrow()
            .get(&(fst.id(), snd.id()))
            .copied()
        {
            tracing::debug!(fst_id = fst.id().0, snd_id = snd.id().0, "cached");
            return self.node(cached);
        }

        let (lca, order) = self
            .vtrees
            .least_common_ancestor(fst.vtree_idx(), snd.vtree_idx());

        let elements = match order {
            VTreeOrder::Equal => self.apply_equal(fst, snd),
            VTreeOrder::Inequal => self.apply_independent(fst, snd),
            VTreeOrder::LeftSubOfRight => self.apply_into_primes(fst, snd),
            VTreeOrder::RightSubOfLeft => self.apply_into_subs(fst, snd),
        };

        let sdd = self
            .canonicalize(elements, &lca)
            .expect("apply never produces a degenerate partition");

        self.conjunctions
            .borrow_mut()
            .insert((fst.id(), snd.id()), sdd.id());

        sdd
    }

    /// Both operands are decisions normalized for the same inner vtree node:
    /// conjoin element-wise over the cartesian product.
    fn apply_equal(&self, fst: &SddRef, snd: &SddRef) -> BTreeSet<Element> {
        assert_eq!(fst.vtree_idx(), snd.vtree_idx());

        let fst_elements = fst
            .elements()
            .expect("non-constant operands at an inner vtree are decisions");
        let snd_elements = snd
            .elements()
            .expect("non-constant operands at an inner vtree are decisions");

        let mut elements = BTreeSet::new();
        for Element {
            prime: fst_prime,
            sub: fst_sub,
        } in &fst_elements
        {
            for Element {
                prime: snd_prime,
                sub: snd_sub,
            } in &snd_elements
            {
                let prime = self.conjoin(fst_prime, snd_prime);
                if prime.is_false() {
                    continue;
                }

                let sub = self.conjoin(fst_sub, snd_sub);
                elements.insert(Element { prime, sub });
            }
        }

        elements
    }

    /// The operands live in disjoint subtrees: `fst` under the left child of
    /// the lca, `snd` under the right. `fst` becomes the prime of `snd`.
    fn apply_independent(&self, fst: &SddRef, snd: &SddRef) -> BTreeSet<Element> {
        BTreeSet::from([
            Element {
                prime: fst.clone(),
                sub: snd.clone(),
            },
            Element {
                prime: self.negate(fst),
                sub: self.contradiction(),
            },
        ])
    }

    /// `fst` lives in the left part of `snd`'s vtree: push it into the
    /// primes of `snd`.
    fn apply_into_primes(&self, fst: &SddRef, snd: &SddRef) -> BTreeSet<Element> {
        let snd_elements = snd.elements().unwrap_or_else(|| {
            panic!(
                "{} is normalized for an inner vtree and must be a decision, not a {}",
                snd.id(),
                snd.0.borrow().sdd_type.name()
            )
        });

        let mut elements = BTreeSet::from([Element {
            prime: self.negate(fst),
            sub: self.contradiction(),
        }]);

        for Element { prime, sub } in &snd_elements {
            let prime = self.conjoin(prime, fst);
            if !prime.is_false() {
                elements.insert(Element {
                    prime,
                    sub: sub.clone(),
                });
            }
        }

        elements
    }

    /// `snd` lives in the right part of `fst`'s vtree: push it into the subs
    /// of `fst`.
    fn apply_into_subs(&self, fst: &SddRef, snd: &SddRef) -> BTreeSet<Element> {
        let fst_elements = fst.elements().unwrap_or_else(|| {
            panic!(
                "{} is normalized for an inner vtree and must be a decision, not a {}",
                fst.id(),
                fst.0.borrow().sdd_type.name()
            )
        });

        fst_elements
            .iter()
            .map(|Element { prime, sub }| Element {
                prime: prime.clone(),
                sub: self.conjoin(sub, snd),
            })
            .collect()
    }

    /// Turn an XY-partition into a canonical SDD normalized for `vtree` (or
    /// a node further down, if trimming applies): remove false primes,
    /// compress, trim, and look the partition up in the unique table.
    ///
    /// # Errors
    ///
    /// Returns [`SddError::UntrimmedPartition`] if the partition degenerates
    /// to nothing or to a single element whose prime is not the true
    /// constant. The apply engine never constructs such partitions.
    pub(crate) fn canonicalize(
        &self,
        elements: BTreeSet<Element>,
        vtree: &VTreeRef,
    ) -> Result<SddRef, SddError> {
        let elements: BTreeSet<Element> = elements
            .into_iter()
            .filter(|element| !element.prime.is_false())
            .collect();

        if elements.is_empty() {
            return Err(SddError::UntrimmedPartition);
        }

        let elements = self.compress(elements);

        if elements.len() == 1 {
            let element = elements.first().expect("the partition has one element");
            if element.prime.is_true() {
                return Ok(element.sub.clone());
            }
            return Err(SddError::UntrimmedPartition);
        }

        if let Some(trimmed) = self.trim(&elements) {
            return Ok(trimmed);
        }

        Ok(self.unique_decision(elements, vtree))
    }

    /// Compress the partition by merging elements sharing a sub: `(p, s)`
    /// and `(q, s)` become `(p || q, s)`.
    fn compress(&self, elements: BTreeSet<Element>) -> BTreeSet<Element> {
        let mut groups: Vec<(SddRef, SddRef)> = Vec::new();

        for Element { prime, sub } in elements {
            match groups.iter().position(|(candidate, _)| *candidate == sub) {
                Some(position) => {
                    let merged = self.disjoin(&groups[position].1, &prime);
                    groups[position].1 = merged;
                }
                None => groups.push((sub, prime)),
            }
        }

        groups
            .into_iter()
            .map(|(sub, prime)| Element { prime, sub })
            .collect()
    }

    /// Detect the trimmable decomposition `{(a, T), (!a, F)}` (in either
    /// order) and collapse it to `a`.
    fn trim(&self, elements: &BTreeSet<Element>) -> Option<SddRef> {
        if elements.len() != 2 {
            return None;
        }

        let mut true_prime = None;
        let mut false_prime = None;
        for Element { prime, sub } in elements {
            if sub.is_true() {
                true_prime = Some(prime.clone());
            }
            if sub.is_false() {
                false_prime = Some(prime.clone());
            }
        }

        match (true_prime, false_prime) {
            (Some(alpha), Some(beta)) if self.eq_negated(&alpha, &beta) => Some(alpha),
            _ => None,
        }
    }

    /// Look the partition up in the unique table of `vtree`; on a miss,
    /// allocate the decision together with its negation, link the pair, and
    /// insert both.
    fn unique_decision(&self, elements: BTreeSet<Element>, vtree: &VTreeRef) -> SddRef {
        assert!(
            vtree.is_internal(),
            "decisions are only normalized for inner vtree nodes"
        );

        if let Some(id) = self.lookup_decision(vtree.index(), &elements) {
            return self.node(id);
        }

        // The negated partition keeps the primes and negates every sub; it
        // is itself compressed, trimmed, and deterministic.
        let negated: BTreeSet<Element> = elements
            .iter()
            .map(|Element { prime, sub }| Element {
                prime: prime.clone(),
                sub: self.negate(sub),
            })
            .collect();

        let sdd = self.new_node(
            SddType::Decision(Decision {
                elements: elements.clone(),
            }),
            Some(vtree.clone()),
        );
        let negation = self.new_node(
            SddType::Decision(Decision {
                elements: negated.clone(),
            }),
            Some(vtree.clone()),
        );
        sdd.set_negation(negation.id());
        negation.set_negation(sdd.id());

        let mut tables = self.decisions.borrow_mut();
        let table = tables.entry(vtree.index()).or_default();
        debug_assert!(
            !table.contains_key(&negated),
            "a decision and its negation are always inserted together"
        );
        table.insert(elements, sdd.id());
        table.insert(negated, negation.id());

        sdd
    }

    fn new_node(&self, sdd_type: SddType, vtree: Option<VTreeRef>) -> SddRef {
        let id = self.next_id.get();
        self.next_id.set(id + SddId(1));

        let sdd = SddRef::new(Sdd::new(sdd_type, id, vtree));
        self.nodes.borrow_mut().insert(id, sdd.clone());
        sdd
    }
}
