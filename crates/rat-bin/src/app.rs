//! Top-level application state: the pager stack plus the widgets that
//! intercept key dispatch ahead of it, wired together the way
//! [`rat_input::dispatch_key`] expects.

use std::collections::HashMap;

use rat_config::{Config, ModeBlock};
use rat_events::{parse_key_sequence, KeyEvent};
use rat_input::{dispatch_key, KeySource, KeyStack};
use rat_layout::Rect;
use rat_pager::{ConfirmOutcome, ConfirmPrompt, Pager, ResolvedAction, Source};
use rat_stack::{Layout, PagerId, PagerStack, StackOutcome};
use tracing::warn;

/// What the run loop must do after a keypress, beyond redrawing.
pub enum Outcome {
    Idle,
    Quit,
    /// A foreground `!<cmd>` fired; the caller owns the terminal backend and
    /// must suspend it, run `cmd` with `ctx` merged into its environment, and
    /// resume before the next frame.
    Foreground(String, HashMap<String, String>),
}

/// Describes the pager the binary pushes at startup, from the CLI's
/// positional command (or stdin) and `--mode` flags.
pub struct InitialPager {
    pub source: Source,
    pub modes: Vec<String>,
}

pub struct App {
    config: Config,
    stack: PagerStack,
    confirm: ConfirmPrompt,
    keys: KeyStack,
    pending_confirm: Option<(String, HashMap<String, String>)>,
}

impl App {
    pub fn new(config: Config, num_to_show: usize) -> Self {
        let mut stack = PagerStack::new();
        stack.set_num_to_show(num_to_show);
        Self {
            config,
            stack,
            confirm: ConfirmPrompt::new(),
            keys: KeyStack::new(),
            pending_confirm: None,
        }
    }

    /// Pushes the CLI-specified root pager.
    pub fn push_initial(&mut self, initial: InitialPager) {
        let title = match &initial.source {
            Source::Cmd(cmd) => cmd.clone(),
            Source::Stdin => "<stdin>".to_string(),
        };
        let modes = self.resolve_modes(&initial.modes);
        let pager = Pager::new(title, initial.source, modes, self.config.global_bindings.clone(), HashMap::new());
        self.stack.push(pager);
    }

    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    pub fn confirm_message(&self) -> Option<&str> {
        self.confirm.message()
    }

    pub fn render(&self, area: Rect) -> Layout {
        self.stack.render(area)
    }

    fn resolve_modes(&self, names: &[String]) -> Vec<ModeBlock> {
        names
            .iter()
            .filter_map(|name| match self.config.modes.get(name) {
                Some(mode) => Some(mode.clone()),
                None => {
                    warn!(mode = %name, "requested mode is not defined in the config");
                    None
                }
            })
            .collect()
    }

    /// Feeds one key event through the dispatch chain (confirm prompt, then
    /// the pager stack), applying whatever action comes out of it.
    pub fn handle_key(&mut self, key: KeyEvent) -> Outcome {
        let mut confirm_outcome = None;
        let mut stack_outcome = None;
        let mut quit = false;

        {
            let mut confirm_source = ConfirmSource {
                confirm: &mut self.confirm,
                outcome: &mut confirm_outcome,
            };
            let mut stack_source = StackSource {
                stack: &mut self.stack,
                outcome: &mut stack_outcome,
                quit: &mut quit,
            };
            let mut sources: [&mut dyn KeySource; 2] = [&mut confirm_source, &mut stack_source];
            dispatch_key(&mut self.keys, key, &mut sources);
        }

        if quit {
            return Outcome::Quit;
        }
        if let Some(outcome) = confirm_outcome {
            return self.apply_confirm_outcome(outcome);
        }
        if let Some((source, action)) = stack_outcome {
            return self.apply_action(source, action);
        }
        Outcome::Idle
    }

    fn apply_confirm_outcome(&mut self, outcome: ConfirmOutcome) -> Outcome {
        match outcome {
            ConfirmOutcome::Idle => {}
            ConfirmOutcome::Cancelled => self.pending_confirm = None,
            ConfirmOutcome::Confirmed => {
                if let Some((cmd, ctx)) = self.pending_confirm.take() {
                    match rat_proc::exec(&cmd, &ctx) {
                        Ok((_handle, mut reader)) => {
                            tokio::task::spawn_blocking(move || {
                                let mut discard = Vec::new();
                                let _ = std::io::Read::read_to_end(&mut reader, &mut discard);
                            });
                        }
                        Err(err) => warn!(%err, cmd = %cmd, "confirmed command failed to start"),
                    }
                }
            }
        }
        Outcome::Idle
    }

    fn apply_action(&mut self, source: PagerId, action: ResolvedAction) -> Outcome {
        match action {
            ResolvedAction::Push { modes, cmd } => {
                let ctx = self.stack.context_of(source);
                let resolved_modes = self.resolve_modes(&modes);
                let pager = Pager::new(cmd.clone(), Source::Cmd(cmd), resolved_modes, self.config.global_bindings.clone(), ctx);
                self.stack.push(pager);
                Outcome::Idle
            }
            ResolvedAction::Confirm { cmd } => {
                let ctx = self.stack.context_of(source);
                self.confirm.ask(format!("run `{cmd}`?"));
                self.pending_confirm = Some((cmd, ctx));
                Outcome::Idle
            }
            ResolvedAction::Exec { cmd } => {
                let ctx = self.stack.context_of(source);
                Outcome::Foreground(cmd, ctx)
            }
            ResolvedAction::AddChildPager { cmd, creating_keys } => {
                let ctx = self.stack.context_of(source);
                let pager = Pager::new(cmd.clone(), Source::Cmd(cmd), Vec::new(), self.config.global_bindings.clone(), ctx);
                let keys = parse_key_sequence(&creating_keys).unwrap_or_default();
                self.stack.add_child(source, pager, keys);
                Outcome::Idle
            }
        }
    }
}

/// Tries the confirm prompt first, exactly as the dispatch loop in
/// `rat_input`'s own doc comment describes ("active prompt" before "active
/// widget").
struct ConfirmSource<'a> {
    confirm: &'a mut ConfirmPrompt,
    outcome: &'a mut Option<ConfirmOutcome>,
}

impl KeySource for ConfirmSource<'_> {
    fn try_handle(&mut self, seq: &[KeyEvent]) -> bool {
        if !self.confirm.is_active() {
            return false;
        }
        let Some(last) = seq.last() else {
            return false;
        };
        *self.outcome = Some(self.confirm.handle_event(last));
        true
    }
}

/// Delivers a sequence to the pager stack; if the stack doesn't have a
/// binding for it, falls back to the one key the binary reserves for itself:
/// `q` pops the topmost pager, quitting once the stack empties.
struct StackSource<'a> {
    stack: &'a mut PagerStack,
    outcome: &'a mut Option<(PagerId, ResolvedAction)>,
    quit: &'a mut bool,
}

impl KeySource for StackSource<'_> {
    fn try_handle(&mut self, seq: &[KeyEvent]) -> bool {
        match self.stack.handle_event(seq) {
            StackOutcome::NotHandled => {
                if seq == [KeyEvent::plain('q')].as_slice() {
                    if !self.stack.pop() || self.stack.is_empty() {
                        *self.quit = true;
                    }
                    return true;
                }
                false
            }
            StackOutcome::Handled => true,
            StackOutcome::Action { source, action } => {
                *self.outcome = Some((source, action));
                true
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rat_config::Config;

    fn initial(cmd: &str) -> InitialPager {
        InitialPager {
            source: Source::Cmd(cmd.to_string()),
            modes: Vec::new(),
        }
    }

    #[tokio::test]
    async fn push_initial_populates_the_stack() {
        let mut app = App::new(Config::default(), 3);
        assert!(app.is_empty());
        app.push_initial(initial("true"));
        assert!(!app.is_empty());
    }

    #[tokio::test]
    async fn unknown_mode_name_is_skipped_not_an_error() {
        let app = App::new(Config::default(), 3);
        let modes = app.resolve_modes(&["does-not-exist".to_string()]);
        assert!(modes.is_empty());
    }

    #[tokio::test]
    async fn q_pops_down_to_empty_then_quits() {
        let mut app = App::new(Config::default(), 1);
        app.push_initial(initial("true"));
        app.push_initial(initial("true"));

        let q = KeyEvent::plain('q');
        assert!(matches!(app.handle_key(q), Outcome::Idle));
        assert!(!app.is_empty());
        assert!(matches!(app.handle_key(q), Outcome::Quit));
    }

    #[tokio::test]
    async fn confirm_action_asks_before_running() {
        let mut app = App::new(Config::default(), 1);
        app.push_initial(initial("true"));
        app.apply_action(
            app.stack.top_id().unwrap(),
            ResolvedAction::Confirm {
                cmd: "true".to_string(),
            },
        );
        assert!(app.confirm_message().is_some());
        assert!(app.pending_confirm.is_some());
    }
}
