use fxhash::FxHashSet;

use crate::manager::SddManager;
use crate::sdd::{Element, SddId, SddRef};

impl SddManager {
    /// Check the structural invariants of every node reachable from `sdd`:
    /// structured decomposability, determinism, compression, exhaustiveness,
    /// trimming, hash-consing, minimum decision size, and negation pairing.
    ///
    /// The check walks the DAG once and reports the first violation found.
    /// Tests use this as the oracle after sequences of public operations.
    ///
    /// # Errors
    ///
    /// Returns a description of the violated invariant.
    pub fn validate(&self, sdd: &SddRef) -> Result<(), String> {
        let mut seen: FxHashSet<SddId> = FxHashSet::default();
        let mut queue = vec![sdd.clone()];

        while let Some(sdd) = queue.pop() {
            if !seen.insert(sdd.id()) {
                continue;
            }

            if sdd.is_constant() {
                if sdd.vtree().is_some() {
                    return Err(format!("constant {} is normalized for a vtree", sdd.id()));
                }
                continue;
            }

            if sdd.is_literal() {
                self.validate_literal(&sdd)?;
                continue;
            }

            self.validate_decision(&sdd, &mut queue)?;
        }

        Ok(())
    }

    fn validate_literal(&self, sdd: &SddRef) -> Result<(), String> {
        let literal = sdd.literal().expect("the node is a literal");
        let Some(vtree) = sdd.vtree() else {
            return Err(format!("literal {literal} has no vtree"));
        };

        if !vtree.is_leaf() {
            return Err(format!(
                "literal {literal} is normalized for an inner vtree"
            ));
        }

        if vtree.variable() != Some(literal.variable()) {
            return Err(format!(
                "literal {literal} does not sit at the leaf of its variable"
            ));
        }

        Ok(())
    }

    fn validate_decision(&self, sdd: &SddRef, queue: &mut Vec<SddRef>) -> Result<(), String> {
        let id = sdd.id();
        let Some(vtree) = sdd.vtree() else {
            return Err(format!("decision {id} has no vtree"));
        };

        if !vtree.is_internal() {
            return Err(format!("decision {id} is normalized for a leaf vtree"));
        }

        let elements = sdd.elements().expect("the node is a decision");

        if elements.len() < 2 {
            return Err(format!(
                "decision {id} has only {} element(s)",
                elements.len()
            ));
        }

        let left = vtree.left_child();
        let right = vtree.right_child();

        for Element { prime, sub } in &elements {
            if prime.is_false() {
                return Err(format!("decision {id} has a false prime"));
            }

            if !prime.is_constant() {
                let prime_vtree = prime.vtree().expect("non-constant SDDs have a vtree");
                if !left.contains(&prime_vtree) {
                    return Err(format!(
                        "prime {} of decision {id} does not live in the left part of the vtree",
                        prime.id()
                    ));
                }
            }

            if !sub.is_constant() {
                let sub_vtree = sub.vtree().expect("non-constant SDDs have a vtree");
                if !right.contains(&sub_vtree) {
                    return Err(format!(
                        "sub {} of decision {id} does not live in the right part of the vtree",
                        sub.id()
                    ));
                }
            }

            queue.push(prime.clone());
            queue.push(sub.clone());
        }

        // Compression: subs are pairwise distinct nodes.
        let subs: FxHashSet<SddId> = elements.iter().map(|element| element.sub.id()).collect();
        if subs.len() != elements.len() {
            return Err(format!("decision {id} is not compressed"));
        }

        // Determinism: primes are pairwise contradictory.
        let primes: Vec<SddRef> = elements.iter().map(|element| element.prime.clone()).collect();
        for (i, fst) in primes.iter().enumerate() {
            for snd in primes.iter().skip(i + 1) {
                if !self.conjoin(fst, snd).is_false() {
                    return Err(format!(
                        "primes {} and {} of decision {id} overlap",
                        fst.id(),
                        snd.id()
                    ));
                }
            }
        }

        // Exhaustiveness: the primes cover the whole space.
        let mut cover = self.contradiction();
        for prime in &primes {
            cover = self.disjoin(&cover, prime);
        }
        if !cover.is_true() {
            return Err(format!("primes of decision {id} are not exhaustive"));
        }

        // Trimming: a two-element decision with constant subs would have
        // collapsed to its true-sub prime.
        if elements.len() == 2 {
            let has_true_sub = elements.iter().any(|element| element.sub.is_true());
            let has_false_sub = elements.iter().any(|element| element.sub.is_false());
            if has_true_sub && has_false_sub {
                return Err(format!("decision {id} is not trimmed"));
            }
        }

        // Uniqueness: the unique table must map this partition back here.
        if self.lookup_decision(vtree.index(), &elements) != Some(id) {
            return Err(format!("decision {id} is not hash-consed"));
        }

        // The paired negation forms a 2-cycle.
        let negation = self.negate(sdd);
        if self.negate(&negation).id() != id {
            return Err(format!("negation of decision {id} is not paired"));
        }

        Ok(())
    }
}
