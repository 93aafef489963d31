//! Keyboard focus over the rendered shelf items

/// Navigation keys the shelf reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavKey {
    Left,
    Right,
    Home,
    End,
}

impl NavKey {
    /// Map a DOM `KeyboardEvent.key` value
    pub fn from_key_name(name: &str) -> Option<Self> {
        match name {
            "ArrowLeft" => Some(NavKey::Left),
            "ArrowRight" => Some(NavKey::Right),
            "Home" => Some(NavKey::Home),
            "End" => Some(NavKey::End),
            _ => None,
        }
    }
}

/// Focus index with wraparound at both ends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FocusRing {
    len: usize,
    index: usize,
}

impl FocusRing {
    /// `None` for an empty list
    pub fn new(len: usize) -> Option<Self> {
        (len > 0).then_some(Self { len, index: 0 })
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn apply(&mut self, key: NavKey) -> usize {
        self.index = match key {
            NavKey::Left => (self.index + self.len - 1) % self.len,
            NavKey::Right => (self.index + 1) % self.len,
            NavKey::Home => 0,
            NavKey::End => self.len - 1,
        };
        self.index
    }
}

/// A horizontal extent in scroll-content coordinates
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Span {
    pub start: f64,
    pub end: f64,
}

impl Span {
    pub fn width(&self) -> f64 {
        self.end - self.start
    }
}

/// New scroll offset that brings `item` into `viewport`, edge-aligned
///
/// `None` when the item is already fully visible. An item clipped on the left
/// aligns to the left edge; one clipped on the right aligns to the right edge
/// (or the left edge if it is wider than the viewport).
pub fn scroll_target(item: Span, viewport: Span) -> Option<f64> {
    if item.start < viewport.start {
        Some(item.start)
    } else if item.end > viewport.end {
        if item.width() >= viewport.width() {
            Some(item.start)
        } else {
            Some(item.end - viewport.width())
        }
    } else {
        None
    }
}
