//! The editable surface: an element tree with a selection host, and the
//! reconciler that keeps it in step with a [`Value`](crate::value::Value).

mod dom;
mod reconcile;

pub use dom::{Dom, DomPoint, DomRange, ElementData, NodeData, NodeId};
pub use reconcile::{Rendered, SelectionPaths, apply, patch, render, restore_selection};
