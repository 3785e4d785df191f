//! Pulls a single GraphQL operation out of raw model output.
//!
//! Models wrap their answer inconsistently: labelled fences, bare fences,
//! prose around fences, or no fences at all. Preference order:
//! 1. first fenced block whose first line is a `graphql` label (label stripped)
//! 2. first non-empty fenced block
//! 3. the whole text
//! Every candidate is trimmed.

use crate::nl2gql::prompts::REJECTION_SENTINEL;

const FENCE: &str = "```";
const LANGUAGE_LABELS: [&str; 2] = ["graphql", "gql"];

pub fn extract_graphql(text: &str) -> String {
    if !text.contains(FENCE) {
        return text.trim().to_string();
    }

    // Odd-indexed segments sit between a pair of fences.
    let fenced: Vec<&str> = text.split(FENCE).skip(1).step_by(2).collect();

    if let Some(body) = fenced.iter().find_map(|block| strip_language_label(block)) {
        return body.trim().to_string();
    }

    fenced
        .iter()
        .map(|block| block.trim())
        .find(|block| !block.is_empty())
        .unwrap_or_default()
        .to_string()
}

/// Returns the block minus its first line when that line is a query-language label.
fn strip_language_label(block: &str) -> Option<&str> {
    let block = block.trim_start();
    let (label, rest) = block.split_once('\n').unwrap_or((block, ""));
    let label = label.trim().to_lowercase();
    LANGUAGE_LABELS
        .contains(&label.as_str())
        .then_some(rest)
}

/// True when the extracted text means "no operation applies": empty, or the
/// sentinel in any casing.
pub fn is_rejection(query: &str) -> bool {
    let query = query.trim();
    query.is_empty() || query.eq_ignore_ascii_case(REJECTION_SENTINEL)
}
