//! The envelope a terminal backend emits on its input stream.

use crate::key::KeyEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TerminalEvent {
    Key(KeyEvent),
    Resize(u16, u16),
}
