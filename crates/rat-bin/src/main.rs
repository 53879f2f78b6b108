//! `rat` entrypoint.

mod app;
mod cli;
mod logging;
mod render;

use std::io::Write;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use rat_config::Config;
use rat_events::TerminalEvent;
use rat_layout::Rect;
use rat_pager::Source;
use rat_terminal::{events::TerminalEvents, CrosstermBackend, TerminalBackend};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;

use app::{App, InitialPager, Outcome};
use cli::Args;

struct Startup {
    log_guard: Option<WorkerGuard>,
}

struct Bootstrap {
    backend: CrosstermBackend,
    config: Config,
    initial: InitialPager,
    num_to_show: usize,
}

impl Startup {
    fn new() -> Self {
        Self { log_guard: None }
    }

    fn run(&mut self) -> Result<Bootstrap> {
        self.log_guard = logging::configure_logging();
        logging::install_panic_hook();

        info!(target: "runtime", "startup");

        let args = Args::parse();
        let (config, config_errors) = rat_config::load(args.config.as_deref());
        for err in &config_errors {
            warn!(target: "config", %err, "config diagnostic");
        }

        let source = match args.cmd {
            Some(cmd) => Source::Cmd(cmd),
            None => Source::Stdin,
        };

        let mut backend = CrosstermBackend::new();
        backend.set_title("rat")?;

        Ok(Bootstrap {
            backend,
            config,
            initial: InitialPager { source, modes: args.modes },
            num_to_show: args.num_to_show,
        })
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let mut startup = Startup::new();
    let mut bootstrap = startup.run()?;

    let mut app = App::new(bootstrap.config, bootstrap.num_to_show);
    app.push_initial(bootstrap.initial);

    // `CrosstermBackend`'s own `Drop` impl is the safety net for an early
    // return or panic; the scoped `TerminalGuard` doesn't fit here since its
    // borrow of `bootstrap.backend` would have to outlive the `size()`/
    // `enter()` calls this loop makes on the same value across iterations.
    bootstrap.backend.enter()?;
    let mut events = TerminalEvents::new();
    let mut tick = tokio::time::interval(Duration::from_millis(100));

    let result = loop {
        tokio::select! {
            event = events.next_event() => {
                match event {
                    Some(TerminalEvent::Key(key)) => match app.handle_key(key) {
                        Outcome::Idle => {}
                        Outcome::Quit => break Ok(()),
                        Outcome::Foreground(cmd, ctx) => {
                            bootstrap.backend.leave()?;
                            let status = tokio::task::spawn_blocking(move || rat_proc::run_foreground(&cmd, &ctx)).await?;
                            if let Err(err) = status {
                                warn!(%err, "foreground command failed to run");
                            }
                            bootstrap.backend.enter()?;
                        }
                    },
                    Some(TerminalEvent::Resize(_, _)) => {}
                    None => break Ok(()),
                }
            }
            _ = tick.tick() => {}
        }

        if app.is_empty() {
            break Ok(());
        }

        let (cols, rows) = bootstrap.backend.size()?;
        let prompt_message = app.confirm_message().map(|m| format!("{m} [y/N]"));
        let body_rows = if prompt_message.is_some() { rows.saturating_sub(1) } else { rows };
        let area = Rect::full(cols as i64, body_rows as i64);
        let layout = app.render(area);

        let mut stdout = std::io::stdout();
        render::draw(&mut stdout, &layout)?;
        if let Some(message) = &prompt_message {
            render::draw_prompt(&mut stdout, body_rows, cols, message)?;
        }
        stdout.flush()?;
    };

    bootstrap.backend.leave()?;
    result
}
