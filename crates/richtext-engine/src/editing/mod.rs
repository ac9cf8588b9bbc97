//! Pure edits on [`Value`](crate::value::Value).
//!
//! Each operation returns a new value and leaves its input alone; the one
//! exception is [`update_formats`], which the input path runs in place.
//! Offsets are clamped to the value, and an edit that does not apply returns
//! the value unchanged.

mod formats;
mod lists;
mod structure;

pub use formats::{
    Toggle, apply_format, get_active_format, get_active_formats, remove_format, toggle_format,
    update_formats,
};
pub use lists::{
    can_indent_list_items, can_outdent_list_items, change_list_type, get_last_child_index,
    get_line_index, get_parent_line_index, indent_list_items, is_active_list_type,
    outdent_list_items,
};
pub use structure::{
    Substitution, concat, insert, insert_line_separator, insert_object, join, remove,
    remove_line_separator, replace, slice, split_at, split_by_separator,
};
