//! Full session example - recipe, photo, one edit, then save.
//!
//! Run with: `cargo run --example fridge_to_plate -- "tomato, egg, onion"`
//!
//! Requires `GEMINI_API_KEY` (or `VITE_API_KEY` / `API_KEY`) environment variable.

use recipe_chef::{GeminiClient, KitchenSession};

#[tokio::main]
async fn main() -> recipe_chef::Result<()> {
    let ingredients = std::env::args()
        .nth(1)
        .expect("Usage: fridge_to_plate <ingredients>");

    let client = GeminiClient::builder().recipe_language("English").build()?;
    let mut session = KitchenSession::new(client);

    session.set_ingredients(ingredients);
    if let Err(alert) = session.recommend_with(|recipe| println!("{recipe}\n")).await {
        eprintln!("{alert}");
        return Ok(());
    }

    session.set_edit_prompt("Add a sprig of fresh parsley on top");
    if let Err(alert) = session.apply_edit().await {
        eprintln!("{alert}");
    }

    match session.download_image(".")? {
        Some(path) => println!("Photo saved to {}", path.display()),
        None => println!("No photo was produced."),
    }

    Ok(())
}
