use crate::sdd::SddRef;

/// Element node (a paired box): the conjunction of a prime and a sub.
///
/// Primes and subs are canonical, so identity of the pair is identity of the
/// referenced node ids. The derived ordering keeps partitions canonically
/// sorted for hashing and equality.
#[derive(PartialEq, Eq, Clone, Hash, PartialOrd, Ord, Debug)]
pub(crate) struct Element {
    pub(crate) prime: SddRef,
    pub(crate) sub: SddRef,
}
