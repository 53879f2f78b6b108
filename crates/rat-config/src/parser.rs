//! Parses a line-oriented directive file into a [`Config`], collecting
//! diagnostics rather than aborting on the first malformed line.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::directive::{Action, AnnotatorDirective, BindKey, Config, ModeBlock};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{path}:{line}: unknown directive `{directive}`")]
    UnknownDirective { path: String, line: usize, directive: String },
    #[error("{path}:{line}: wrong number of arguments for `{directive}`")]
    Arity { path: String, line: usize, directive: String },
    #[error("{path}:{line}: `mode {name}` block is missing its `end`")]
    UnterminatedMode { path: String, line: usize, name: String },
    #[error("include cycle detected at `{path}`")]
    Cycle { path: String },
    #[error("failed to read `{path}`: {message}")]
    Io { path: String, message: String },
}

impl ConfigError {
    fn unknown(path: &str, line: usize, directive: impl Into<String>) -> Self {
        ConfigError::UnknownDirective {
            path: path.to_string(),
            line,
            directive: directive.into(),
        }
    }

    fn arity(path: &str, line: usize, directive: impl Into<String>) -> Self {
        ConfigError::Arity {
            path: path.to_string(),
            line,
            directive: directive.into(),
        }
    }
}

/// Reads and parses `path`, recursively resolving `source` directives
/// relative to each including file's directory. Include cycles are reported
/// as a [`ConfigError::Cycle`] instead of recursing forever.
pub fn load_file(path: &Path) -> (Config, Vec<ConfigError>) {
    let mut config = Config::default();
    let mut errors = Vec::new();
    let mut stack = Vec::new();
    load_into(path, &mut config, &mut errors, &mut stack);
    (config, errors)
}

/// Parses in-memory text as if it were the contents of `source_name`, with no
/// filesystem access — `source` lines are reported as unresolvable rather
/// than followed. Used for default/built-in configuration and tests.
pub fn parse_str(text: &str, source_name: &str) -> (Config, Vec<ConfigError>) {
    let mut config = Config::default();
    let mut errors = Vec::new();
    let mut stack = Vec::new();
    parse_into(text, Path::new(source_name), &mut config, &mut errors, &mut stack);
    (config, errors)
}

fn load_into(path: &Path, config: &mut Config, errors: &mut Vec<ConfigError>, stack: &mut Vec<PathBuf>) {
    let canonical = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
    if stack.contains(&canonical) {
        errors.push(ConfigError::Cycle {
            path: path.display().to_string(),
        });
        return;
    }

    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) => {
            errors.push(ConfigError::Io {
                path: path.display().to_string(),
                message: err.to_string(),
            });
            return;
        }
    };

    stack.push(canonical);
    parse_into(&text, path, config, errors, stack);
    stack.pop();
}

fn parse_into(text: &str, path: &Path, config: &mut Config, errors: &mut Vec<ConfigError>, stack: &mut Vec<PathBuf>) {
    let dir = path.parent().map(Path::to_path_buf).unwrap_or_else(|| PathBuf::from("."));
    let path_str = path.display().to_string();
    let mut lines = text.lines().enumerate().peekable();

    while let Some((idx, raw_line)) = lines.next() {
        let line_no = idx + 1;
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let (keyword, rest) = split_keyword(line);

        match keyword {
            "source" => {
                if rest.is_empty() {
                    errors.push(ConfigError::arity(&path_str, line_no, "source"));
                    continue;
                }
                let included = resolve_path(&dir, rest);
                load_into(&included, config, errors, stack);
            }
            "bindkey" => match take_tokens(rest, 2) {
                Some((tokens, action_str)) if !action_str.is_empty() => {
                    let requirement = if tokens[1] == "default" { None } else { Some(tokens[1].clone()) };
                    let action = parse_action(&action_str, &config.modes);
                    config.global_bindings.push(BindKey {
                        keys: tokens[0].clone(),
                        requirement,
                        action,
                    });
                }
                _ => errors.push(ConfigError::arity(&path_str, line_no, "bindkey")),
            },
            "mode" => {
                let name = rest.trim().to_string();
                if name.is_empty() {
                    errors.push(ConfigError::arity(&path_str, line_no, "mode"));
                    continue;
                }
                match parse_mode_block(&mut lines, &name, &path_str, &*config, errors) {
                    Some(block) => {
                        config.modes.insert(name, block);
                    }
                    None => errors.push(ConfigError::UnterminatedMode {
                        path: path_str.clone(),
                        line: line_no,
                        name,
                    }),
                }
            }
            other => errors.push(ConfigError::unknown(&path_str, line_no, other)),
        }
    }
}

fn parse_mode_block(
    lines: &mut std::iter::Peekable<std::iter::Enumerate<std::str::Lines<'_>>>,
    name: &str,
    path_str: &str,
    config: &Config,
    errors: &mut Vec<ConfigError>,
) -> Option<ModeBlock> {
    let mut block = ModeBlock {
        name: name.to_string(),
        ..Default::default()
    };

    for (idx, raw_line) in lines.by_ref() {
        let line_no = idx + 1;
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if line == "end" {
            return Some(block);
        }

        let (keyword, rest) = split_keyword(line);

        match keyword {
            "annotate" => match take_tokens(rest, 2) {
                Some((tokens, cmd_or_pattern)) if !cmd_or_pattern.is_empty() => {
                    let class = tokens[1].clone();
                    match tokens[0].as_str() {
                        "match" => block.annotators.push(AnnotatorDirective::Match {
                            class,
                            cmd: cmd_or_pattern,
                        }),
                        "regex" => block.annotators.push(AnnotatorDirective::Regex {
                            class,
                            pattern: cmd_or_pattern,
                        }),
                        "external" => block.annotators.push(AnnotatorDirective::External {
                            class,
                            cmd: cmd_or_pattern,
                        }),
                        other => errors.push(ConfigError::unknown(path_str, line_no, format!("annotate {other}"))),
                    }
                }
                _ => errors.push(ConfigError::arity(path_str, line_no, "annotate")),
            },
            "bindkey" => match take_tokens(rest, 1) {
                Some((tokens, action_str)) if !action_str.is_empty() => {
                    let action = parse_action(&action_str, &config.modes);
                    block.bindings.push(BindKey {
                        keys: tokens[0].clone(),
                        requirement: None,
                        action,
                    });
                }
                _ => errors.push(ConfigError::arity(path_str, line_no, "bindkey")),
            },
            other => errors.push(ConfigError::unknown(path_str, line_no, other)),
        }
    }

    None
}

fn split_keyword(line: &str) -> (&str, &str) {
    let mut parts = line.splitn(2, char::is_whitespace);
    let keyword = parts.next().unwrap_or("");
    let rest = parts.next().unwrap_or("").trim_start();
    (keyword, rest)
}

/// Splits the first `n` whitespace-delimited tokens off `line`, returning
/// them plus whatever's left (trimmed), so a trailing shell command keeps its
/// own internal spacing intact. `None` if fewer than `n` tokens are present.
fn take_tokens(line: &str, n: usize) -> Option<(Vec<String>, String)> {
    let mut tokens = Vec::with_capacity(n);
    let mut rest = line;
    for _ in 0..n {
        let trimmed = rest.trim_start();
        let end = trimmed.find(char::is_whitespace).unwrap_or(trimmed.len());
        if end == 0 {
            return None;
        }
        tokens.push(trimmed[..end].to_string());
        rest = &trimmed[end..];
    }
    Some((tokens, rest.trim_start().to_string()))
}

/// `<action>` grammar: a `?`/`!`/`>` prefix selects `Confirm`/`Exec`/
/// `AddChildPager`; otherwise, leading words that name an already-registered
/// mode are peeled off into `Action::Push`'s mode list and the remainder is
/// the command.
fn parse_action(raw: &str, known_modes: &HashMap<String, ModeBlock>) -> Action {
    let trimmed = raw.trim();
    if let Some(cmd) = trimmed.strip_prefix('?') {
        return Action::Confirm { cmd: cmd.trim().to_string() };
    }
    if let Some(cmd) = trimmed.strip_prefix('!') {
        return Action::Exec { cmd: cmd.trim().to_string() };
    }
    if let Some(cmd) = trimmed.strip_prefix('>') {
        return Action::AddChildPager { cmd: cmd.trim().to_string() };
    }

    let mut modes = Vec::new();
    let mut rest = trimmed;
    loop {
        let word_end = rest.find(char::is_whitespace).unwrap_or(rest.len());
        let word = &rest[..word_end];
        if word.is_empty() || !known_modes.contains_key(word) {
            break;
        }
        modes.push(word.to_string());
        rest = rest[word_end..].trim_start();
    }
    Action::Push {
        modes,
        cmd: rest.to_string(),
    }
}

fn resolve_path(dir: &Path, raw: &str) -> PathBuf {
    let p = Path::new(raw);
    if p.is_absolute() {
        p.to_path_buf()
    } else {
        dir.join(p)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_mode_block_with_annotators_and_bindings() {
        let (config, errors) = parse_str(
            "mode ls\n    annotate match file cat dirents\n    annotate regex num \\d+\n    bindkey l >cat %(file)\nend\n",
            "inline",
        );
        assert!(errors.is_empty());
        let mode = config.modes.get("ls").unwrap();
        assert_eq!(mode.annotators.len(), 2);
        assert_eq!(mode.bindings.len(), 1);
        assert_eq!(
            mode.bindings[0].action,
            Action::AddChildPager {
                cmd: "cat %(file)".to_string()
            }
        );
    }

    #[test]
    fn top_level_bindkey_with_default_has_no_requirement() {
        let (config, errors) = parse_str("bindkey gg default echo hi\n", "inline");
        assert_eq!(errors.len(), 0);
        assert_eq!(config.global_bindings.len(), 1);
        assert_eq!(config.global_bindings[0].requirement, None);
    }

    #[test]
    fn unknown_directive_is_collected_not_fatal() {
        let (config, errors) = parse_str("bindkey gg default echo hi\nbogus line here\n", "inline");
        assert_eq!(config.global_bindings.len(), 1);
        assert_eq!(errors.len(), 1);
        assert!(matches!(errors[0], ConfigError::UnknownDirective { .. }));
    }

    #[test]
    fn unterminated_mode_block_is_reported() {
        let (_, errors) = parse_str("mode ls\n    bindkey l echo hi\n", "inline");
        assert_eq!(errors.len(), 1);
        assert!(matches!(errors[0], ConfigError::UnterminatedMode { .. }));
    }

    #[test]
    fn arity_mismatch_is_collected() {
        let (_, errors) = parse_str("bindkey gg\n", "inline");
        assert_eq!(errors.len(), 1);
        assert!(matches!(errors[0], ConfigError::Arity { .. }));
    }

    #[test]
    fn source_cycle_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.rc");
        let b = dir.path().join("b.rc");
        std::fs::write(&a, format!("source {}\n", b.display())).unwrap();
        std::fs::write(&b, format!("source {}\n", a.display())).unwrap();

        let (_, errors) = load_file(&a);
        assert!(errors.iter().any(|e| matches!(e, ConfigError::Cycle { .. })));
    }

    #[test]
    fn source_includes_another_file_relative_to_the_including_file() {
        let dir = tempfile::tempdir().unwrap();
        let included = dir.path().join("included.rc");
        std::fs::write(&included, "bindkey q default echo quit\n").unwrap();
        let root = dir.path().join("root.rc");
        std::fs::write(&root, "source included.rc\n").unwrap();

        let (config, errors) = load_file(&root);
        assert!(errors.is_empty());
        assert_eq!(config.global_bindings.len(), 1);
    }

    #[test]
    fn mode_list_before_cmd_becomes_push_modes() {
        let (config, errors) = parse_str("mode ls\nend\nbindkey o default ls cat file\n", "inline");
        assert!(errors.is_empty());
        assert_eq!(
            config.global_bindings[0].action,
            Action::Push {
                modes: vec!["ls".to_string()],
                cmd: "cat file".to_string()
            }
        );
    }
}
