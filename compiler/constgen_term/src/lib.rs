//! Contains the definition of basic terms for the type system: types,
//! lifetimes, constant values, constant expressions, generic parameters and
//! generic arguments.

use std::fmt;

pub mod adt;
pub mod constant;
pub mod expression;
pub mod generic_arguments;
pub mod generic_parameter;
pub mod instantiation;
pub mod lifetime;
pub mod matching;
pub mod r#type;

/// Writes the items separated by `, `.
pub(crate) fn write_separated<T: fmt::Display>(
    f: &mut fmt::Formatter<'_>,
    items: impl IntoIterator<Item = T>,
) -> fmt::Result {
    for (index, item) in items.into_iter().enumerate() {
        if index != 0 {
            write!(f, ", ")?;
        }

        write!(f, "{item}")?;
    }

    Ok(())
}
