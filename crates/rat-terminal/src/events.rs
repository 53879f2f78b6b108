//! Translates raw crossterm input into the canonical [`TerminalEvent`]s the
//! rest of the workspace consumes, and wraps crossterm's `EventStream` for
//! async polling from the UI loop.

use crossterm::event::{Event as CEvent, EventStream, KeyCode as CKeyCode, KeyEvent as CKeyEvent, KeyModifiers};
use rat_events::{KeyCode, KeyEvent, NamedKey, TerminalEvent};
use tokio_stream::StreamExt;

/// An async source of [`TerminalEvent`]s backed by crossterm's `EventStream`.
pub struct TerminalEvents {
    inner: EventStream,
}

impl Default for TerminalEvents {
    fn default() -> Self {
        Self::new()
    }
}

impl TerminalEvents {
    pub fn new() -> Self {
        Self {
            inner: EventStream::new(),
        }
    }

    /// Awaits the next terminal event, translating crossterm's key reporting
    /// into our own `KeyEvent` shape. Returns `None` once the underlying
    /// input stream is exhausted (stdin closed).
    pub async fn next_event(&mut self) -> Option<TerminalEvent> {
        loop {
            match self.inner.next().await? {
                Ok(CEvent::Key(key)) => {
                    if let Some(ev) = translate_key(key) {
                        return Some(TerminalEvent::Key(ev));
                    }
                }
                Ok(CEvent::Resize(w, h)) => return Some(TerminalEvent::Resize(w, h)),
                Ok(_) => continue,
                Err(_) => return None,
            }
        }
    }
}

/// Maps a crossterm key event to our canonical form: a reported named key
/// wins; otherwise a control rune sets `ctrl` plus the letter; otherwise the
/// printable rune becomes `ch` with `shift = isUpper(ch)` after case-folding.
fn translate_key(key: CKeyEvent) -> Option<KeyEvent> {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    let meta = key.modifiers.contains(KeyModifiers::ALT) || key.modifiers.contains(KeyModifiers::SUPER);
    let shift = key.modifiers.contains(KeyModifiers::SHIFT);

    let named = match key.code {
        CKeyCode::Enter => Some(NamedKey::Enter),
        CKeyCode::Esc => Some(NamedKey::Esc),
        CKeyCode::Backspace => Some(NamedKey::Backspace),
        CKeyCode::Tab => Some(NamedKey::Tab),
        CKeyCode::Up => Some(NamedKey::Up),
        CKeyCode::Down => Some(NamedKey::Down),
        CKeyCode::Left => Some(NamedKey::Left),
        CKeyCode::Right => Some(NamedKey::Right),
        CKeyCode::Home => Some(NamedKey::Home),
        CKeyCode::End => Some(NamedKey::End),
        CKeyCode::PageUp => Some(NamedKey::PgUp),
        CKeyCode::PageDown => Some(NamedKey::PgDn),
        CKeyCode::Insert => Some(NamedKey::Insert),
        CKeyCode::Delete => Some(NamedKey::Delete),
        CKeyCode::F(n) if (1..=12).contains(&n) => Some(NamedKey::F(n)),
        _ => None,
    };

    if let Some(named) = named {
        return Some(KeyEvent::new(KeyCode::Named(named), ctrl, meta, shift));
    }

    match key.code {
        CKeyCode::Char(' ') => Some(KeyEvent::new(KeyCode::Named(NamedKey::Space), ctrl, meta, shift)),
        CKeyCode::Char(c) => {
            let mut ev = KeyEvent::from_rune(c, ctrl, meta);
            ev.shift = ev.shift || shift;
            Some(ev)
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyCode as CKeyCode, KeyEventKind};

    fn key(code: CKeyCode, mods: KeyModifiers) -> CKeyEvent {
        CKeyEvent::new_with_kind(code, mods, KeyEventKind::Press)
    }

    #[test]
    fn named_key_reported_directly() {
        let ev = translate_key(key(CKeyCode::Enter, KeyModifiers::NONE)).unwrap();
        assert_eq!(ev.code, KeyCode::Named(NamedKey::Enter));
    }

    #[test]
    fn control_rune_sets_ctrl_and_letter() {
        let ev = translate_key(key(CKeyCode::Char('d'), KeyModifiers::CONTROL)).unwrap();
        assert!(ev.ctrl);
        assert_eq!(ev.code, KeyCode::Char('d'));
    }

    #[test]
    fn uppercase_rune_folds_with_shift() {
        let ev = translate_key(key(CKeyCode::Char('J'), KeyModifiers::NONE)).unwrap();
        assert!(ev.shift);
        assert_eq!(ev.code, KeyCode::Char('j'));
    }

    #[test]
    fn space_maps_to_named_key() {
        let ev = translate_key(key(CKeyCode::Char(' '), KeyModifiers::NONE)).unwrap();
        assert_eq!(ev.code, KeyCode::Named(NamedKey::Space));
    }
}
