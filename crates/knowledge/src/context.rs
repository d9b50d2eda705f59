//! Context rendering for grounded prompts.

use crate::types::Passage;

/// Render passages as numbered citations.
///
/// Each passage becomes `Citation N: <text>` followed by a blank line. `N`
/// is 1-based and follows passage order, not any backend identifier. No
/// passages yields an empty string.
pub fn build_context(passages: &[Passage]) -> String {
    passages
        .iter()
        .enumerate()
        .map(|(i, passage)| format!("Citation {}: {}\n\n", i + 1, passage.text))
        .collect()
}
