//! `amp-ssr list`: built-in transformers in default order.

use owo_colors::OwoColorize;

use crate::pipeline::BuiltinTransformer;

pub fn list_transformers() {
    let width = BuiltinTransformer::ALL
        .iter()
        .map(|builtin| builtin.name().len())
        .max()
        .unwrap_or(0);

    for builtin in BuiltinTransformer::ALL {
        println!(
            "{:<width$}  {}",
            builtin.name().bold(),
            builtin.summary().dimmed(),
            width = width
        );
    }
}
