//! Custom Askama template filters.

use std::fmt::Display;

/// Capitalizes the first letter of every word.
///
/// Category labels come from the catalog in lower case.
///
/// Usage in templates: `{{ category|title_case }}`
#[allow(clippy::unnecessary_wraps)]
#[askama::filter_fn]
pub fn title_case(value: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    Ok(capitalize_words(&value.to_string()))
}

fn capitalize_words(value: &str) -> String {
    value
        .split(' ')
        .map(|word| {
            let mut chars = word.chars();
            chars.next().map_or_else(String::new, |first| {
                first.to_uppercase().chain(chars).collect()
            })
        })
        .collect::<Vec<_>>()
        .join(" ")
}
