use bitvec::slice::BitSlice;
use fxhash::FxHashMap;
use num_bigint::{BigInt, BigUint};
use num_rational::BigRational;
use num_traits::{One, Zero};

use crate::literal::Polarity;
use crate::manager::SddManager;
use crate::sdd::{Element, SddId, SddRef};

impl SddManager {
    /// The probability that a uniformly random assignment satisfies the SDD.
    ///
    /// Decisions are deterministic and exhaustive, so the probability of a
    /// decision is the sum over its elements of `P(prime) * P(sub)`, with
    /// `P(literal) = 1/2`. The result does not depend on how many variables
    /// the manager knows beyond those in the SDD.
    #[must_use]
    pub fn sat_prob(&self, sdd: &SddRef) -> BigRational {
        let mut cache = FxHashMap::default();
        self.prob(sdd, &mut cache)
    }

    fn prob(&self, sdd: &SddRef, cache: &mut FxHashMap<SddId, BigRational>) -> BigRational {
        if sdd.is_true() {
            return BigRational::one();
        }

        if sdd.is_false() {
            return BigRational::zero();
        }

        if sdd.is_literal() {
            return BigRational::new(BigInt::one(), BigInt::from(2));
        }

        if let Some(cached) = cache.get(&sdd.id()) {
            return cached.clone();
        }

        let elements = sdd
            .elements()
            .expect("non-constant, non-literal SDDs are decisions");

        let mut total = BigRational::zero();
        for Element { prime, sub } in &elements {
            total += self.prob(prime, cache) * self.prob(sub, cache);
        }

        cache.insert(sdd.id(), total.clone());
        total
    }

    /// Count the assignments of `num_variables` variables satisfying the SDD.
    ///
    /// # Panics
    ///
    /// Panics if `num_variables` does not cover every variable the SDD
    /// depends on.
    #[must_use]
    pub fn model_count(&self, sdd: &SddRef, num_variables: u32) -> BigUint {
        let assignments = BigInt::one() << (num_variables as usize);
        let count = self.sat_prob(sdd) * BigRational::from_integer(assignments);

        assert!(
            count.is_integer(),
            "{num_variables} variables do not cover the SDD"
        );
        count
            .to_integer()
            .to_biguint()
            .expect("a model count is never negative")
    }

    /// Evaluate the SDD under the given assignment; bit `i` is the value of
    /// variable `i + 1`.
    ///
    /// # Panics
    ///
    /// Panics if the assignment does not cover all variables of the manager.
    #[must_use]
    pub fn evaluate(&self, sdd: &SddRef, assignment: &BitSlice) -> bool {
        assert!(
            assignment.len() >= self.num_variables() as usize,
            "assignment must cover all {} variables",
            self.num_variables()
        );

        self.eval(sdd, assignment)
    }

    fn eval(&self, sdd: &SddRef, assignment: &BitSlice) -> bool {
        if sdd.is_true() {
            return true;
        }

        if sdd.is_false() {
            return false;
        }

        if let Some(literal) = sdd.literal() {
            let value = assignment[literal.variable().0 as usize];
            return value == (literal.polarity() == Polarity::Positive);
        }

        let elements = sdd.elements().expect("remaining SDDs are decisions");
        for Element { prime, sub } in &elements {
            if self.eval(prime, assignment) {
                return self.eval(sub, assignment);
            }
        }

        unreachable!("decision primes are exhaustive, one of them must hold")
    }
}

#[cfg(test)]
mod test {
    use crate::manager::{options::SddOptions, SddManager};
    use bitvec::prelude::*;
    use num_bigint::BigUint;
    use num_rational::BigRational;
    use pretty_assertions::assert_eq;

    fn manager(num_variables: u32) -> SddManager {
        SddManager::new(&SddOptions::builder().num_variables(num_variables).build())
    }

    fn ratio(numer: i32, denom: i32) -> BigRational {
        BigRational::new(numer.into(), denom.into())
    }

    #[test]
    fn constants() {
        let manager = manager(7);

        assert_eq!(
            manager.model_count(&manager.tautology(), 7),
            BigUint::from(128u32)
        );
        assert_eq!(
            manager.model_count(&manager.contradiction(), 7),
            BigUint::from(0u32)
        );

        assert_eq!(manager.sat_prob(&manager.tautology()), ratio(1, 1));
        assert_eq!(manager.sat_prob(&manager.contradiction()), ratio(0, 1));
    }

    #[test]
    fn literals() {
        let manager = manager(7);
        let lit_a = manager.literal(1).unwrap();

        assert_eq!(manager.sat_prob(&lit_a), ratio(1, 2));
        assert_eq!(manager.model_count(&lit_a, 7), BigUint::from(64u32));
    }

    #[test]
    fn conjunctions_and_disjunctions() {
        let manager = manager(4);

        let lit_a = manager.literal(1).unwrap();
        let lit_b = manager.literal(2).unwrap();
        let lit_c = manager.literal(3).unwrap();
        let lit_d = manager.literal(4).unwrap();

        let a_and_d = manager.conjoin(&lit_a, &lit_d);
        assert_eq!(manager.model_count(&a_and_d, 4), BigUint::from(4u32));

        let a_or_d = manager.disjoin(&a_and_d, &lit_a);
        assert_eq!(
            manager.model_count(&a_or_d, 4),
            manager.model_count(&lit_a, 4)
        );

        let a_and_b = manager.conjoin(&lit_a, &lit_b);
        assert_eq!(manager.model_count(&a_and_b, 4), BigUint::from(4u32));

        // A && B && B == A && B
        let a_and_b_and_b = manager.conjoin(&a_and_b, &lit_b);
        assert_eq!(
            manager.model_count(&a_and_b_and_b, 4),
            manager.model_count(&a_and_b, 4)
        );

        let a_and_b_and_c = manager.conjoin(&a_and_b, &lit_c);
        assert_eq!(manager.model_count(&a_and_b_and_c, 4), BigUint::from(2u32));

        let a_and_b_and_c_or_d = manager.disjoin(&a_and_b_and_c, &lit_d);
        assert_eq!(
            manager.model_count(&a_and_b_and_c_or_d, 4),
            BigUint::from(9u32)
        );
        assert_eq!(manager.sat_prob(&a_and_b_and_c_or_d), ratio(9, 16));
    }

    #[test]
    fn xor_has_half_the_models() {
        let manager = manager(7);

        let lit_a = manager.literal(1).unwrap();
        let lit_b = manager.literal(2).unwrap();
        let xor = manager.disjoin(
            &manager.conjoin(&lit_a, &manager.negate(&lit_b)),
            &manager.conjoin(&manager.negate(&lit_a), &lit_b),
        );

        assert_eq!(manager.sat_prob(&xor), ratio(1, 2));
        assert_eq!(manager.model_count(&xor, 7), BigUint::from(64u32));
        assert_eq!(manager.model_count(&xor, 2), BigUint::from(2u32));
    }

    #[test]
    fn count_scales_with_the_variable_universe() {
        let manager = manager(3);
        let lit_a = manager.literal(1).unwrap();

        assert_eq!(manager.model_count(&lit_a, 3), BigUint::from(4u32));
        assert_eq!(manager.model_count(&lit_a, 10), BigUint::from(512u32));
        assert_eq!(
            manager.model_count(&lit_a, 100),
            BigUint::from(2u32).pow(99)
        );
    }

    #[test]
    fn evaluation() {
        let manager = manager(4);

        let lit_a = manager.literal(1).unwrap();
        let lit_c = manager.literal(3).unwrap();
        let formula = manager.conjoin(&lit_a, &manager.negate(&lit_c));

        assert!(manager.evaluate(&formula, bits![1, 0, 0, 0]));
        assert!(manager.evaluate(&formula, bits![1, 1, 0, 1]));
        assert!(!manager.evaluate(&formula, bits![1, 0, 1, 0]));
        assert!(!manager.evaluate(&formula, bits![0, 0, 0, 0]));

        assert!(manager.evaluate(&manager.tautology(), bits![0, 0, 0, 0]));
        assert!(!manager.evaluate(&manager.contradiction(), bits![1, 1, 1, 1]));
        assert!(!manager.evaluate(&manager.negate(&lit_a), bits![1, 0, 0, 0]));
    }
}
