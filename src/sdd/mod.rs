#![allow(clippy::module_inception)]

mod decision;
mod element;
mod sdd;
mod sdd_ref;

pub(crate) use crate::sdd::decision::Decision;
pub(crate) use crate::sdd::element::Element;
pub use crate::sdd::sdd::*;
pub use crate::sdd::sdd_ref::*;
