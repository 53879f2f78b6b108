//! Command-line surface.

use std::path::PathBuf;

use clap::Parser;

/// `rat`: an interactive pager with a streaming, annotated buffer.
#[derive(Parser, Debug)]
#[command(name = "rat", disable_version_flag = true, about = "A pageable, annotated view over a command's output")]
pub struct Args {
    /// Command the root pager runs via `$SHELL -c`. Reads stdin instead when omitted.
    #[arg(short = 'c', long = "cmd")]
    pub cmd: Option<String>,

    /// Config file path, overriding discovery of `$RATRC` / `~/.ratrc`.
    #[arg(long = "config")]
    pub config: Option<PathBuf>,

    /// Mode to attach to the root pager (repeatable).
    #[arg(short = 'm', long = "mode")]
    pub modes: Vec<String>,

    /// Number of pagers the stack shows at once.
    #[arg(long = "show", default_value_t = 3)]
    pub num_to_show: usize,

    /// Print the version and exit, before anything touches the terminal.
    #[arg(short = 'v', long = "version", action = clap::ArgAction::Version)]
    pub version: (),
}
