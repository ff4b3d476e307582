//! Turns use sites of value-parameterized generic items into concrete
//! instantiations.
//!
//! The [`Compilation`] context owns every declaration and runs the whole
//! pipeline for a use site: inference, associated-constant lookup,
//! where-clause checking, and deduplication through the
//! [`InstantiationTable`].

pub mod compilation;
pub mod table;

pub use compilation::{Compilation, Config};
pub use table::{InstantiationEntry, InstantiationKey, InstantiationTable};
