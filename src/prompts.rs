//! Instruction templates sent to the models, and the recipe title heuristic.

/// Language recipes are written in unless configured otherwise.
pub const DEFAULT_RECIPE_LANGUAGE: &str = "Korean";

/// Builds the text-model instruction for a set of ingredients.
pub fn recipe_prompt(ingredients: &str, language: &str) -> String {
    format!(
        "Act as a world-class chef. Recommend a delicious recipe using these ingredients: {ingredients}.\n\
         Provide the output in {language}. Format the response as a clear title, an ingredient list, \
         and numbered step-by-step instructions.\n\
         Keep it professional but encouraging."
    )
}

/// Builds the image-model instruction for a dish title.
pub fn food_photo_prompt(title: &str) -> String {
    format!(
        "A professional, high-quality food photography of {title}. \
         Realistic, cinematic lighting, 8k resolution, appetizing presentation."
    )
}

/// Derives the dish title from free-form recipe text.
///
/// Takes the first line, drops markdown `#` and `*`, and trims it. Falls back
/// to `ingredients` when that leaves nothing.
pub fn derive_title(recipe: &str, ingredients: &str) -> String {
    let title: String = recipe
        .lines()
        .next()
        .unwrap_or_default()
        .chars()
        .filter(|c| !matches!(c, '#' | '*'))
        .collect();

    match title.trim() {
        "" => ingredients.to_string(),
        trimmed => trimmed.to_string(),
    }
}
