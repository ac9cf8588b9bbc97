//! Rich-text value model with a minimal-diff editable surface.
//!
//! Text is held as a [`Value`]: a string with a format list and an optional
//! replacement per character. Values come from markup or a live surface
//! ([`create`]), are edited with the pure functions in [`editing`], and go
//! back out as markup ([`to_html_string`]) or onto the surface through the
//! reconciler ([`surface::apply`]), which only touches nodes that changed.
//!
//! ```rust
//! use richtext_engine::{CreateOptions, Format, FormatRegistry, apply_format, create_from_markup, to_html_string};
//!
//! let registry = FormatRegistry::new();
//! let value = create_from_markup("one two", &CreateOptions::default(), &registry);
//! let value = apply_format(&value, &Format::new("strong"), 4, 7);
//! assert_eq!(to_html_string(&value, None, &registry), "one <strong>two</strong>");
//! ```

pub mod editing;
pub mod registry;
pub mod session;
pub mod surface;
pub mod tree;
pub mod value;

pub use editing::*;
pub use registry::{FormatRegistry, FormatType, RegistryError};
pub use session::{ClipboardPayload, EditorSettings, Session, SessionHost};
pub use tree::{TreeOptions, build_tree, to_html_string};
pub use value::{
    CreateOptions, Format, LINE_SEPARATOR, OBJECT_REPLACEMENT, Replacement, Source, Value, ZWNBSP,
    create, create_from_markup,
};
