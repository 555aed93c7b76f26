use bon::Builder;

use crate::vtree::VTreePlan;

/// Shape of the vtree the manager is built over.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum VTreeStrategy {
    #[default]
    Balanced,
    RightLinear,
    LeftLinear,
    /// A caller-provided shape; must mention every variable exactly once.
    Custom(VTreePlan),
}

/// Configuration of a [`crate::manager::SddManager`].
///
/// ```
/// use sddc::manager::options::{SddOptions, VTreeStrategy};
///
/// let options = SddOptions::builder()
///     .num_variables(7)
///     .vtree_strategy(VTreeStrategy::RightLinear)
///     .build();
/// ```
#[allow(clippy::module_name_repetitions)]
#[derive(Builder, Debug, Clone)]
pub struct SddOptions {
    /// Number of variables of the compiled functions. Literals address them
    /// as signed integers `1..=num_variables`.
    pub(crate) num_variables: u32,

    /// Shape of the vtree all SDDs are normalized for.
    #[builder(default)]
    pub(crate) vtree_strategy: VTreeStrategy,
}
