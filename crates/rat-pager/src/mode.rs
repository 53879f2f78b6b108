//! Resolves a [`rat_config::ModeBlock`]'s `annotate` directives into
//! [`rat_annotate::AnnotatorSpec`]s a pager can compile and run against its
//! buffer, with `%(class)` placeholders substituted from the pager's
//! construction-time context.

use std::collections::HashMap;

use rat_annotate::AnnotatorSpec;
use rat_config::{AnnotatorDirective, ModeBlock};

use crate::handler::substitute;

/// Builds one [`AnnotatorSpec`] per `annotate` line in `mode`, substituting
/// `ctx` into any command or pattern that carries a `%(class)` placeholder.
pub fn resolve_annotators(mode: &ModeBlock, ctx: &HashMap<String, String>) -> Vec<AnnotatorSpec> {
    mode.annotators
        .iter()
        .map(|directive| match directive {
            AnnotatorDirective::Match { class, cmd } => AnnotatorSpec::Literal {
                dictionary_cmd: substitute(cmd, ctx),
                class: class.clone(),
            },
            AnnotatorDirective::Regex { class, pattern } => AnnotatorSpec::Regex {
                pattern: substitute(pattern, ctx),
                class: class.clone(),
            },
            AnnotatorDirective::External { class, cmd } => AnnotatorSpec::External {
                cmd: substitute(cmd, ctx),
                annotators_dir: None,
                ctx: ctx.clone(),
                class: class.clone(),
            },
        })
        .collect()
}
