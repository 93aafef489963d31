//! Adapter onto the host site's embedded playlist state
//!
//! The state layout is an undocumented third-party structure. Every structural
//! assumption about it (item paths, field names, script snippets, the inline
//! assignment pattern) is confined to this module.

pub mod extractors;
pub mod inline_script;
pub mod js_scripts;
pub mod page_info;

pub use extractors::{extract_records, has_populated_marker, locate_items, normalize_item};
pub use inline_script::find_initial_data;
pub use page_info::StateProbe;
