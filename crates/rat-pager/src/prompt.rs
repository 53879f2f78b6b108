//! The two one-line widgets drawn at the bottom of the terminal: a yes/no
//! confirmation and a single-line text edit. Both only consume events while
//! they have something pending; otherwise dispatch falls through to the
//! active pager underneath them.

use rat_events::{KeyCode, KeyEvent};

/// A pending yes/no question. `y`/`S-y` confirms, anything else cancels.
#[derive(Default)]
pub struct ConfirmPrompt {
    pending: Option<String>,
}

/// What a [`ConfirmPrompt`] did with an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmOutcome {
    /// No prompt was pending; the event wasn't ours.
    Idle,
    Confirmed,
    Cancelled,
}

impl ConfirmPrompt {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ask(&mut self, message: impl Into<String>) {
        self.pending = Some(message.into());
    }

    pub fn is_active(&self) -> bool {
        self.pending.is_some()
    }

    pub fn message(&self) -> Option<&str> {
        self.pending.as_deref()
    }

    /// Consumes `event` if a question is pending, clearing it either way.
    pub fn handle_event(&mut self, event: &KeyEvent) -> ConfirmOutcome {
        if self.pending.take().is_none() {
            return ConfirmOutcome::Idle;
        }

        match event.code {
            KeyCode::Char(c) if c.eq_ignore_ascii_case(&'y') => ConfirmOutcome::Confirmed,
            _ => ConfirmOutcome::Cancelled,
        }
    }
}

/// A pending single-line text entry, editable left-to-right with
/// backspace, submitted on Enter and abandoned on Esc.
#[derive(Default)]
pub struct TextPrompt {
    pending: Option<String>,
    buf: String,
}

/// What a [`TextPrompt`] did with an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextOutcome {
    Idle,
    StillEditing,
    Submitted(String),
    Cancelled,
}

impl TextPrompt {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ask(&mut self, prompt: impl Into<String>) {
        self.pending = Some(prompt.into());
        self.buf.clear();
    }

    pub fn is_active(&self) -> bool {
        self.pending.is_some()
    }

    pub fn prompt(&self) -> Option<&str> {
        self.pending.as_deref()
    }

    pub fn text(&self) -> &str {
        &self.buf
    }

    pub fn handle_event(&mut self, event: &KeyEvent) -> TextOutcome {
        if self.pending.is_none() {
            return TextOutcome::Idle;
        }

        match event.code {
            KeyCode::Named(rat_events::NamedKey::Enter) => {
                self.pending = None;
                TextOutcome::Submitted(std::mem::take(&mut self.buf))
            }
            KeyCode::Named(rat_events::NamedKey::Esc) => {
                self.pending = None;
                self.buf.clear();
                TextOutcome::Cancelled
            }
            KeyCode::Named(rat_events::NamedKey::Backspace) => {
                self.buf.pop();
                TextOutcome::StillEditing
            }
            KeyCode::Named(rat_events::NamedKey::Space) => {
                self.buf.push(' ');
                TextOutcome::StillEditing
            }
            KeyCode::Char(c) if !event.ctrl && !event.meta => {
                self.buf.push(c);
                TextOutcome::StillEditing
            }
            _ => TextOutcome::StillEditing,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rat_events::NamedKey;

    #[test]
    fn idle_confirm_prompt_ignores_events() {
        let mut p = ConfirmPrompt::new();
        assert_eq!(p.handle_event(&KeyEvent::plain('y')), ConfirmOutcome::Idle);
    }

    #[test]
    fn confirm_prompt_accepts_y_and_rejects_everything_else() {
        let mut p = ConfirmPrompt::new();
        p.ask("delete?");
        assert_eq!(p.handle_event(&KeyEvent::plain('y')), ConfirmOutcome::Confirmed);
        assert!(!p.is_active());

        p.ask("delete?");
        assert_eq!(p.handle_event(&KeyEvent::plain('n')), ConfirmOutcome::Cancelled);
        assert!(!p.is_active());
    }

    #[test]
    fn text_prompt_edits_and_submits() {
        let mut p = TextPrompt::new();
        p.ask("search:");
        p.handle_event(&KeyEvent::plain('a'));
        p.handle_event(&KeyEvent::plain('b'));
        assert_eq!(p.text(), "ab");

        p.handle_event(&KeyEvent::named(NamedKey::Backspace));
        assert_eq!(p.text(), "a");

        let outcome = p.handle_event(&KeyEvent::named(NamedKey::Enter));
        assert_eq!(outcome, TextOutcome::Submitted("a".to_string()));
        assert!(!p.is_active());
    }

    #[test]
    fn text_prompt_cancels_on_esc() {
        let mut p = TextPrompt::new();
        p.ask("search:");
        p.handle_event(&KeyEvent::plain('x'));
        let outcome = p.handle_event(&KeyEvent::named(NamedKey::Esc));
        assert_eq!(outcome, TextOutcome::Cancelled);
        assert_eq!(p.text(), "");
    }
}
