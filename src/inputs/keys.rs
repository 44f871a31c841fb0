use crossterm::event::{KeyCode, KeyEvent, KeyEventKind};

/// Whether a key event was handled
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyDisposition {
    /// Handled; the host must not process it further
    Consumed,
    Ignored,
}

impl KeyDisposition {
    pub fn is_consumed(self) -> bool {
        matches!(self, Self::Consumed)
    }
}

/// Page navigation bound to the viewer's keyboard surface
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NavKey {
    Prev,
    Next,
}

impl NavKey {
    pub fn from_event(key: &KeyEvent) -> Option<Self> {
        if !is_press(key) {
            return None;
        }
        match key.code {
            KeyCode::Left => Some(Self::Prev),
            KeyCode::Right => Some(Self::Next),
            _ => None,
        }
    }
}

/// Press or auto-repeat; releases are never acted on
pub fn is_press(key: &KeyEvent) -> bool {
    key.kind != KeyEventKind::Release
}
