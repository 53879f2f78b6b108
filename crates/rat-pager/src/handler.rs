//! What a key binding does once matched: either a navigation effect a pager
//! applies to itself, or a resolved command that bubbles up to whatever owns
//! the pager stack (push a new pager, exec in the foreground, ask for
//! confirmation).

use std::collections::HashMap;

use rat_config::{Action, BindKey, ModeBlock};
use rat_events::parse_key_sequence;
use rat_keymap::HandlerRegistry;

/// The effect a matched binding produces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    MoveCursorTo(i64),
    MoveCursor(i64),
    ScrollBy(i64),
    PageUp,
    PageDown,
    MoveCursorNext(String),
    MoveCursorPrevious(String),
    Reload,
    ParentCursorUp,
    ParentCursorDown,
    Run(ResolvedAction),
}

/// A config-file action with its `%(class)` placeholders already substituted
/// from the context under the cursor, ready for the pager stack to execute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedAction {
    Push { modes: Vec<String>, cmd: String },
    Confirm { cmd: String },
    Exec { cmd: String },
    AddChildPager { cmd: String, creating_keys: String },
}

/// Replaces every `%(name)` in `cmd` with `ctx["name"]`, or the literal
/// `%(name)` if that class isn't present in the context.
pub fn substitute(cmd: &str, ctx: &HashMap<String, String>) -> String {
    let mut out = String::with_capacity(cmd.len());
    let mut rest = cmd;
    while let Some(start) = rest.find("%(") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find(')') {
            Some(end) => {
                let name = &after[..end];
                match ctx.get(name) {
                    Some(value) => out.push_str(value),
                    None => {
                        out.push_str("%(");
                        out.push_str(name);
                        out.push(')');
                    }
                }
                rest = &after[end + 1..];
            }
            None => {
                out.push_str("%(");
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

fn action_to_effect(action: &Action) -> Effect {
    match action {
        Action::Push { modes, cmd } => Effect::Run(ResolvedAction::Push {
            modes: modes.clone(),
            cmd: cmd.clone(),
        }),
        Action::Confirm { cmd } => Effect::Run(ResolvedAction::Confirm { cmd: cmd.clone() }),
        Action::Exec { cmd } => Effect::Run(ResolvedAction::Exec { cmd: cmd.clone() }),
        Action::AddChildPager { cmd } => Effect::Run(ResolvedAction::AddChildPager {
            cmd: cmd.clone(),
            creating_keys: String::new(), // filled in by the caller once the key sequence is known
        }),
    }
}

/// Registers the fixed navigation bindings every pager understands
/// regardless of config: `j`/`k`/`C-f`/`C-b`/`gg`/`G` for cursor and paging,
/// `r` to reload, `S-j`/`S-k` to replay the creating keys against the parent
/// pager one row down/up.
pub fn register_builtin_navigation(registry: &mut HandlerRegistry<Effect>) {
    let mut bind = |keys: &str, effect: Effect| {
        if let Ok(seq) = parse_key_sequence(keys) {
            registry.register(&seq, Vec::<String>::new(), effect);
        }
    };

    bind("j", Effect::MoveCursor(1));
    bind("k", Effect::MoveCursor(-1));
    bind("down", Effect::MoveCursor(1));
    bind("up", Effect::MoveCursor(-1));
    bind("g,g", Effect::MoveCursorTo(0));
    bind("S-g", Effect::MoveCursorTo(-1));
    bind("C-f", Effect::PageDown);
    bind("pgdn", Effect::PageDown);
    bind("C-b", Effect::PageUp);
    bind("pgup", Effect::PageUp);
    bind("r", Effect::Reload);
    bind("S-j", Effect::ParentCursorDown);
    bind("S-k", Effect::ParentCursorUp);
}

/// Adds a mode's own bindings (unconditional within that mode: they carry no
/// context requirement) to `registry`.
pub fn register_mode_bindings(registry: &mut HandlerRegistry<Effect>, mode: &ModeBlock) {
    for binding in &mode.bindings {
        register_one(registry, binding);
    }
}

/// Adds the config file's top-level bindings, each scoped by its
/// `requirement` (an annotation class that must be present at the cursor, or
/// no requirement for `default`).
pub fn register_global_bindings(registry: &mut HandlerRegistry<Effect>, bindings: &[BindKey]) {
    for binding in bindings {
        register_one(registry, binding);
    }
}

fn register_one(registry: &mut HandlerRegistry<Effect>, binding: &BindKey) {
    let Ok(seq) = parse_key_sequence(&binding.keys) else {
        return;
    };
    let requirements: Vec<String> = binding.requirement.iter().cloned().collect();
    let mut effect = action_to_effect(&binding.action);
    if let Effect::Run(ResolvedAction::AddChildPager { creating_keys, .. }) = &mut effect {
        *creating_keys = binding.keys.clone();
    }
    registry.register(&seq, requirements, effect);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn substitutes_known_class_and_leaves_unknown_untouched() {
        let mut ctx = HashMap::new();
        ctx.insert("file".to_string(), "a.txt".to_string());
        assert_eq!(substitute("cat %(file)", &ctx), "cat a.txt");
        assert_eq!(substitute("cat %(missing)", &ctx), "cat %(missing)");
    }

    #[test]
    fn builtin_navigation_resolves_j_and_k() {
        let mut registry = HandlerRegistry::new();
        register_builtin_navigation(&mut registry);
        let ctx = HashMap::new();
        let seq = parse_key_sequence("j").unwrap();
        assert_eq!(registry.find(&seq, &ctx), Some(&Effect::MoveCursor(1)));
    }

    #[test]
    fn add_child_pager_binding_carries_its_own_keys() {
        let mut registry = HandlerRegistry::new();
        let binding = BindKey {
            keys: "l".to_string(),
            requirement: Some("file".to_string()),
            action: Action::AddChildPager {
                cmd: "cat %(file)".to_string(),
            },
        };
        register_one(&mut registry, &binding);

        let mut ctx = HashMap::new();
        ctx.insert("file".to_string(), "a.txt".to_string());
        let seq = parse_key_sequence("l").unwrap();
        let found = registry.find(&seq, &ctx).unwrap();
        assert_eq!(
            found,
            &Effect::Run(ResolvedAction::AddChildPager {
                cmd: "cat %(file)".to_string(),
                creating_keys: "l".to_string(),
            })
        );
    }
}
