//! A single scrollable view over one subprocess's (or stdin's) output: owns
//! the buffer, the ingest and annotator tasks feeding it, the key-binding
//! registry built from its modes, and the [`Window`] tracking cursor/scroll.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;
use std::sync::Arc;

use rat_annotate::CompiledAnnotator;
use rat_buffer::Buffer;
use rat_config::{BindKey, ModeBlock};
use rat_events::KeyEvent;
use rat_keymap::HandlerRegistry;
use rat_proc::ProcessHandle;
use rat_text::rune::StyledRune;
use rat_window::Window;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::handler::{self, substitute, Effect, ResolvedAction};
use crate::mode;

/// Where a pager's bytes come from.
#[derive(Debug, Clone)]
pub enum Source {
    /// Run `cmd` via `$SHELL -c` each time the pager (re)starts.
    Cmd(String),
    /// Read once from the process's own stdin. Reloading a stdin-sourced
    /// pager is a no-op: there is no second stdin to read.
    Stdin,
}

/// What handling a key sequence does to a pager, from the owning stack's
/// point of view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandleOutcome {
    /// No binding matched; the event should be offered elsewhere (or dropped).
    NotHandled,
    /// The pager applied the effect to itself; nothing further to do.
    Handled,
    /// Replay the binding that created this pager against its parent, one
    /// row up/down. Only meaningful to the owning stack.
    ParentCursorUp,
    ParentCursorDown,
    /// A config-driven action, substituted against the context under the
    /// cursor, for the stack to execute.
    Action(ResolvedAction),
}

/// The rendered content of a pager at its current scroll position.
pub struct Rendered {
    pub header: String,
    pub lines: Vec<Vec<StyledRune>>,
}

/// A single pager: one buffer, one set of modes, one key-binding registry.
pub struct Pager {
    title: String,
    source: Source,
    ctx: HashMap<String, String>,
    modes: Vec<ModeBlock>,
    global_bindings: Vec<BindKey>,
    registry: HandlerRegistry<Effect>,
    buffer: Rc<RefCell<Arc<Buffer>>>,
    window: Window,
    height: Rc<Cell<i64>>,
    process: Option<ProcessHandle>,
    tasks: Vec<JoinHandle<()>>,
    started: bool,
}

impl Pager {
    pub fn new(
        title: impl Into<String>,
        source: Source,
        modes: Vec<ModeBlock>,
        global_bindings: Vec<BindKey>,
        ctx: HashMap<String, String>,
    ) -> Self {
        let mut registry = HandlerRegistry::new();
        handler::register_builtin_navigation(&mut registry);
        for m in &modes {
            handler::register_mode_bindings(&mut registry, m);
        }
        handler::register_global_bindings(&mut registry, &global_bindings);

        let buffer = Rc::new(RefCell::new(Arc::new(Buffer::new())));
        let height = Rc::new(Cell::new(1i64));
        let window = {
            let height = height.clone();
            let buffer = buffer.clone();
            Window::new(move || height.get(), move || buffer.borrow().num_lines() as i64)
        };

        let mut pager = Self {
            title: title.into(),
            source,
            ctx,
            modes,
            global_bindings,
            registry,
            buffer,
            window,
            height,
            process: None,
            tasks: Vec::new(),
            started: false,
        };
        pager.start();
        pager
    }

    /// The terminal rows this pager has to draw into, set by the owning
    /// stack's layout pass.
    pub fn set_height(&self, rows: i64) {
        self.height.set(rows.max(1));
    }

    fn buffer(&self) -> Arc<Buffer> {
        self.buffer.borrow().clone()
    }

    fn start(&mut self) {
        let buffer = Arc::new(Buffer::new());
        *self.buffer.borrow_mut() = buffer.clone();

        match &self.source {
            Source::Cmd(cmd) => match rat_proc::exec(cmd, &self.ctx) {
                Ok((handle, reader)) => {
                    self.process = Some(handle);
                    let ingest_buf = buffer.clone();
                    self.tasks.push(tokio::task::spawn_blocking(move || {
                        ingest_buf.ingest_from(reader);
                    }));
                }
                Err(err) => {
                    warn!(%err, cmd = %cmd, "failed to start pager source");
                    buffer.ingest_from(format!("failed to run `{cmd}`: {err}\n").as_bytes());
                }
            },
            Source::Stdin => {
                if self.started {
                    debug!("reload requested on a stdin pager; stdin cannot be re-read");
                } else {
                    let ingest_buf = buffer.clone();
                    self.tasks.push(tokio::task::spawn_blocking(move || {
                        ingest_buf.ingest_from(std::io::stdin().lock());
                    }));
                }
            }
        }

        for m in &self.modes {
            let specs = mode::resolve_annotators(m, &self.ctx);
            for spec in specs {
                match CompiledAnnotator::compile(&spec) {
                    Ok(compiled) => self.tasks.push(rat_annotate::spawn(compiled, buffer.clone())),
                    Err(err) => warn!(%err, mode = %m.name, "failed to compile annotator"),
                }
            }
        }

        self.started = true;
    }

    /// Tears down the running source and annotators, keeping the window's
    /// cursor/scroll as-is, and starts the source over from scratch.
    pub fn reload(&mut self) {
        if let Some(process) = self.process.take() {
            let _ = process.kill();
        }
        self.buffer().destroy();
        for task in self.tasks.drain(..) {
            task.abort();
        }
        self.start();
    }

    /// Tears down everything this pager owns. Idempotent with `reload` aside
    /// from not restarting.
    pub fn destroy(&mut self) {
        if let Some(process) = self.process.take() {
            let _ = process.kill();
        }
        self.buffer().destroy();
        for task in self.tasks.drain(..) {
            task.abort();
        }
    }

    /// The annotation context at the cursor's current line: each class's
    /// value, later annotations in insertion order winning on collision.
    pub fn context(&self) -> HashMap<String, String> {
        let buffer = self.buffer();
        let guard = buffer.lock();
        let line = self.window.cursor().max(0) as u32;
        let mut ctx = HashMap::new();
        for ann in guard.annotations_for_line(line) {
            ctx.insert(ann.class, ann.value);
        }
        ctx
    }

    pub fn handle_event(&mut self, seq: &[KeyEvent]) -> HandleOutcome {
        let ctx = self.context();
        let Some(effect) = self.registry.find(seq, &ctx).cloned() else {
            return HandleOutcome::NotHandled;
        };

        match effect {
            Effect::MoveCursorTo(n) => {
                self.window.move_cursor_to(n);
                HandleOutcome::Handled
            }
            Effect::MoveCursor(delta) => {
                self.window.move_cursor(delta);
                HandleOutcome::Handled
            }
            Effect::ScrollBy(delta) => {
                self.window.scroll_by(delta);
                HandleOutcome::Handled
            }
            Effect::PageUp => {
                self.window.page_up();
                HandleOutcome::Handled
            }
            Effect::PageDown => {
                self.window.page_down();
                HandleOutcome::Handled
            }
            Effect::MoveCursorNext(class) => {
                self.move_cursor_adjacent(&class, true);
                HandleOutcome::Handled
            }
            Effect::MoveCursorPrevious(class) => {
                self.move_cursor_adjacent(&class, false);
                HandleOutcome::Handled
            }
            Effect::Reload => {
                self.reload();
                HandleOutcome::Handled
            }
            Effect::ParentCursorUp => HandleOutcome::ParentCursorUp,
            Effect::ParentCursorDown => HandleOutcome::ParentCursorDown,
            Effect::Run(action) => HandleOutcome::Action(substitute_action(action, &ctx)),
        }
    }

    fn move_cursor_adjacent(&mut self, class: &str, forward: bool) {
        let buffer = self.buffer();
        let mut anns = buffer.annotations_by_class(class);
        anns.sort_by_key(|a| a.start);
        let cursor = self.window.cursor();

        let target = if forward {
            anns.iter().find(|a| a.start.line as i64 > cursor).map(|a| a.start.line)
        } else {
            anns.iter().rev().find(|a| (a.start.line as i64) < cursor).map(|a| a.start.line)
        };

        if let Some(line) = target {
            self.window.move_cursor_to(line as i64);
        }
    }

    pub fn render(&self) -> Rendered {
        let buffer = self.buffer();
        let guard = buffer.lock();
        let height = self.height.get().max(1) as usize;
        let scroll = self.window.scroll().max(0) as usize;
        let lines = guard.line_range(scroll, height);
        let header = format!(
            "{} {} {}/{}",
            self.title,
            guard.num_annotations(),
            self.window.cursor() + 1,
            guard.num_lines().max(1),
        );
        Rendered { header, lines }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// Moves this pager's cursor directly by `delta`, with the same clamping
    /// as the `j`/`k` bindings. Used by the owning stack to replay a parent
    /// row change (`S-j`/`S-k`) without going through the key dispatcher.
    pub fn move_cursor(&mut self, delta: i64) {
        self.window.move_cursor(delta);
    }
}

fn substitute_action(action: ResolvedAction, ctx: &HashMap<String, String>) -> ResolvedAction {
    match action {
        ResolvedAction::Push { modes, cmd } => ResolvedAction::Push {
            modes,
            cmd: substitute(&cmd, ctx),
        },
        ResolvedAction::Confirm { cmd } => ResolvedAction::Confirm {
            cmd: substitute(&cmd, ctx),
        },
        ResolvedAction::Exec { cmd } => ResolvedAction::Exec {
            cmd: substitute(&cmd, ctx),
        },
        ResolvedAction::AddChildPager { cmd, creating_keys } => ResolvedAction::AddChildPager {
            cmd: substitute(&cmd, ctx),
            creating_keys,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rat_events::parse_key_sequence;

    fn wait_for<F: Fn() -> bool>(cond: F) {
        for _ in 0..200 {
            if cond() {
                return;
            }
            std::thread::sleep(std::time::Duration::from_millis(10));
        }
        panic!("condition never became true");
    }

    #[tokio::test]
    async fn cmd_source_ingests_and_renders() {
        let mut pager = Pager::new(
            "test",
            Source::Cmd("printf 'a\\nb\\nc\\n'".to_string()),
            Vec::new(),
            Vec::new(),
            HashMap::new(),
        );
        pager.set_height(10);
        wait_for(|| pager.buffer().num_lines() >= 4);

        let rendered = pager.render();
        assert!(rendered.header.starts_with("test"));
        assert_eq!(rendered.lines.len(), 4);
    }

    #[tokio::test]
    async fn builtin_j_moves_cursor_down() {
        let mut pager = Pager::new(
            "test",
            Source::Cmd("printf 'a\\nb\\nc\\n'".to_string()),
            Vec::new(),
            Vec::new(),
            HashMap::new(),
        );
        pager.set_height(10);
        wait_for(|| pager.buffer().num_lines() >= 4);

        let seq = parse_key_sequence("j").unwrap();
        assert_eq!(pager.handle_event(&seq), HandleOutcome::Handled);
        assert_eq!(pager.window.cursor(), 1);
    }

    #[tokio::test]
    async fn unbound_key_is_not_handled() {
        let mut pager = Pager::new(
            "test",
            Source::Cmd("true".to_string()),
            Vec::new(),
            Vec::new(),
            HashMap::new(),
        );
        let seq = parse_key_sequence("z").unwrap();
        assert_eq!(pager.handle_event(&seq), HandleOutcome::NotHandled);
    }
}
