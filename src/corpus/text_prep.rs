// text_prep.rs — Text preparation for embedding training.
//
// Builds the descriptive text fed to the embedder from structured recipe fields.
// Instructions are cut to a fixed character budget so long directions do not
// crowd the title and ingredients out of the model's 256 token window.

use crate::config;

/// Prepare the descriptive text for a recipe.
///
/// Layout (stable, other components compare these strings):
/// `{title}\nIngredients: {ingredients}\nInstructions: {instructions[..500 chars]}`
/// with surrounding whitespace trimmed.
pub fn prepare_recipe_text(title: &str, ingredients: &str, instructions: &str) -> String {
    let instructions = truncate_chars(instructions, config::corpus::INSTRUCTIONS_CHAR_BUDGET);
    let text = format!("{title}\nIngredients: {ingredients}\nInstructions: {instructions}");
    text.trim().to_string()
}

/// Truncate text to at most `max_chars` characters (not bytes).
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}
