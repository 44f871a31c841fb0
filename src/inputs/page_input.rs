use crossterm::event::{KeyCode, KeyEvent};

/// Longest page number the input accepts
const MAX_DIGITS: usize = 6;

/// Result of feeding a key to [`PageNumberInput`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputOutcome {
    /// Key is not meant for the input
    Ignored,
    /// Text changed (or the key was swallowed)
    Edited,
    /// Enter pressed with a parsable page number
    Submit(usize),
    /// Edit abandoned, text reverted
    Cancelled,
}

/// Page-number text field.
///
/// Mirrors the current page while not being edited. Typing digits starts an
/// edit; Enter submits, Esc reverts.
#[derive(Debug, Clone)]
pub struct PageNumberInput {
    text: String,
    editing: bool,
    shown_page: usize,
}

impl PageNumberInput {
    pub fn new(page: usize) -> Self {
        Self {
            text: page.to_string(),
            editing: false,
            shown_page: page,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_editing(&self) -> bool {
        self.editing
    }

    /// Show `page` unless the user is mid-edit
    pub fn sync(&mut self, page: usize) {
        self.shown_page = page;
        if !self.editing {
            self.text = page.to_string();
        }
    }

    fn revert(&mut self) {
        self.editing = false;
        self.text = self.shown_page.to_string();
    }

    pub fn handle_key(&mut self, key: &KeyEvent) -> InputOutcome {
        match key.code {
            KeyCode::Char(c) if c.is_ascii_digit() => {
                if !self.editing {
                    self.editing = true;
                    self.text.clear();
                }
                if self.text.len() < MAX_DIGITS {
                    self.text.push(c);
                }
                InputOutcome::Edited
            }
            KeyCode::Backspace if self.editing => {
                self.text.pop();
                InputOutcome::Edited
            }
            KeyCode::Enter => match self.text.parse::<usize>() {
                Ok(page) => {
                    self.editing = false;
                    InputOutcome::Submit(page)
                }
                Err(_) => {
                    self.revert();
                    InputOutcome::Cancelled
                }
            },
            KeyCode::Esc if self.editing => {
                self.revert();
                InputOutcome::Cancelled
            }
            _ => InputOutcome::Ignored,
        }
    }
}
