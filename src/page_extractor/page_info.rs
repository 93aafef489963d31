//! Result of probing the source page for its embedded state

use serde::{Deserialize, Serialize};

/// Readiness of the embedded state root
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateProbe {
    /// The root object has been attached to the page
    pub root: bool,
    /// The root carries its populated marker
    pub populated: bool,
}

impl StateProbe {
    pub fn is_ready(&self) -> bool {
        self.root && self.populated
    }
}
