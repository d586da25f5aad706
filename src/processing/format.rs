//! Reshaping of free-text answers into paragraph or bullet layout.

use super::types::AnswerFormat;

/// Normalize a raw answer into one line per sentence.
///
/// Asterisks (markdown emphasis) are removed, the text is split on `.`, and blank fragments are
/// dropped. [`AnswerFormat::Points`] prefixes each line with `- `.
pub fn format_answer(raw: &str, format: AnswerFormat) -> String {
    let cleaned = raw.replace('*', "");
    let sentences = cleaned
        .split('.')
        .map(str::trim)
        .filter(|sentence| !sentence.is_empty());

    match format {
        AnswerFormat::Points => sentences
            .map(|sentence| format!("- {sentence}"))
            .collect::<Vec<_>>()
            .join("\n"),
        AnswerFormat::Paragraph => sentences.collect::<Vec<_>>().join("\n"),
    }
}
