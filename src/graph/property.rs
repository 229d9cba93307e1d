//! Property value types for graph nodes
//!
//! Node properties hold the same values the source produces, so a row's
//! cells are stored without conversion.

use std::collections::HashMap;

pub use crate::value::Value as PropertyValue;

/// Property map for storing node properties
pub type PropertyMap = HashMap<String, PropertyValue>;
