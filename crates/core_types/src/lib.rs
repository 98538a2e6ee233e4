/// Identity of a window or iframe browsing context.
///
/// Selections are cached per context; the host hands these out and the core
/// only compares them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContextId(pub u64);

impl ContextId {
    /// The top-level context of a single-window host.
    pub const MAIN: ContextId = ContextId(0);
}

/// Direction in which a selection was made.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Anchor precedes focus.
    #[default]
    Forward,
    /// Focus precedes anchor.
    Backward,
}

impl Direction {
    pub fn is_backward(self) -> bool {
        matches!(self, Direction::Backward)
    }
}

impl From<bool> for Direction {
    fn from(backward: bool) -> Self {
        if backward {
            Direction::Backward
        } else {
            Direction::Forward
        }
    }
}
