//! CLI for Recipe Chef - recipes and food photos from your ingredients.

use anyhow::Context;
use clap::{Args, Parser, Subcommand, ValueEnum};
use recipe_chef::prompts::derive_title;
use recipe_chef::{
    AspectRatio, DataUri, EditOutcome, GeminiClient, ImageModel, KitchenBackend, KitchenSession,
    RetryPolicy, TextModel,
};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "recipe-chef")]
#[command(about = "Turn a list of ingredients into a recipe and a food photo (Gemini)")]
#[command(version)]
struct Cli {
    /// Defaults to an interactive session
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    options: GlobalOptions,
}

#[derive(Args)]
struct GlobalOptions {
    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Model that writes the recipe
    #[arg(long, global = true, value_enum, env = "RECIPE_CHEF_TEXT_MODEL")]
    text_model: Option<TextModelArg>,

    /// Model that draws and edits the photo
    #[arg(long, global = true, value_enum, env = "RECIPE_CHEF_IMAGE_MODEL")]
    image_model: Option<ImageModelArg>,

    /// Language the recipe is written in
    #[arg(long, global = true, env = "RECIPE_CHEF_LANGUAGE")]
    language: Option<String>,

    /// Aspect ratio of generated photos
    #[arg(long, global = true, value_enum)]
    aspect_ratio: Option<AspectRatioArg>,

    /// Extra attempts after a failed model call
    #[arg(long, global = true)]
    retries: Option<u32>,

    /// Fixed wait between attempts, in milliseconds
    #[arg(long, global = true)]
    retry_delay_ms: Option<u64>,

    /// API root (for proxies and local testing)
    #[arg(long, global = true, env = "RECIPE_CHEF_BASE_URL")]
    base_url: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Recommend a recipe and generate a photo of it
    Recommend(RecommendArgs),

    /// Edit a saved food photo with an instruction
    Edit(EditArgs),

    /// Interactive session: type ingredients, then refine the photo
    Session,

    /// Check the API key and model access
    Check,
}

#[derive(Args)]
struct RecommendArgs {
    /// Ingredients, e.g. "tomato, egg, onion"
    ingredients: String,

    /// Directory to save the photo in
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Args)]
struct EditArgs {
    /// What to change, e.g. "add parsley"
    instruction: String,

    /// Photo to edit
    #[arg(short, long)]
    input: PathBuf,

    /// Output file path
    #[arg(short, long)]
    output: PathBuf,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum TextModelArg {
    #[value(name = "gemini-3-flash-preview")]
    Gemini3Flash,
    #[value(name = "gemini-2.5-flash")]
    Gemini25Flash,
    #[value(name = "gemini-2.5-pro")]
    Gemini25Pro,
}

impl From<TextModelArg> for TextModel {
    fn from(arg: TextModelArg) -> Self {
        match arg {
            TextModelArg::Gemini3Flash => TextModel::Gemini3Flash,
            TextModelArg::Gemini25Flash => TextModel::Gemini25Flash,
            TextModelArg::Gemini25Pro => TextModel::Gemini25Pro,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ImageModelArg {
    #[value(name = "gemini-2.5-flash-image", alias = "nano-banana")]
    NanoBanana,
    #[value(name = "gemini-3-pro-image-preview", alias = "nano-banana-pro")]
    NanoBananaPro,
}

impl From<ImageModelArg> for ImageModel {
    fn from(arg: ImageModelArg) -> Self {
        match arg {
            ImageModelArg::NanoBanana => ImageModel::NanoBanana,
            ImageModelArg::NanoBananaPro => ImageModel::NanoBananaPro,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum AspectRatioArg {
    #[value(name = "1:1")]
    Square,
    #[value(name = "16:9")]
    Landscape,
    #[value(name = "9:16")]
    Portrait,
    #[value(name = "4:3")]
    Standard,
    #[value(name = "3:4")]
    StandardPortrait,
}

impl From<AspectRatioArg> for AspectRatio {
    fn from(arg: AspectRatioArg) -> Self {
        match arg {
            AspectRatioArg::Square => AspectRatio::Square,
            AspectRatioArg::Landscape => AspectRatio::Landscape,
            AspectRatioArg::Portrait => AspectRatio::Portrait,
            AspectRatioArg::Standard => AspectRatio::Standard,
            AspectRatioArg::StandardPortrait => AspectRatio::StandardPortrait,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let json = cli.options.json;
    let client = build_client(&cli.options)?;

    match cli.command.unwrap_or(Commands::Session) {
        Commands::Recommend(args) => recommend(client, args, json).await?,
        Commands::Edit(args) => edit(client, args, json).await?,
        Commands::Session => run_session(client, json).await?,
        Commands::Check => check(client, json).await?,
    }

    Ok(())
}

fn build_client(options: &GlobalOptions) -> anyhow::Result<GeminiClient> {
    let mut builder = GeminiClient::builder();

    if let Some(model) = options.text_model {
        builder = builder.text_model(model.into());
    }
    if let Some(model) = options.image_model {
        builder = builder.image_model(model.into());
    }
    if let Some(language) = &options.language {
        builder = builder.recipe_language(language);
    }
    if let Some(ratio) = options.aspect_ratio {
        builder = builder.aspect_ratio(ratio.into());
    }
    if let Some(url) = &options.base_url {
        builder = builder.base_url(url);
    }
    if options.retries.is_some() || options.retry_delay_ms.is_some() {
        let default = RetryPolicy::default();
        builder = builder.retry_policy(RetryPolicy::new(
            options.retries.unwrap_or(default.max_retries),
            options
                .retry_delay_ms
                .map(Duration::from_millis)
                .unwrap_or(default.delay),
        ));
    }

    Ok(builder.build()?)
}

async fn recommend(client: GeminiClient, args: RecommendArgs, json: bool) -> anyhow::Result<()> {
    let mut session = KitchenSession::new(client);
    session.set_ingredients(&args.ingredients);

    let result = session
        .recommend_with(|recipe| {
            if !json {
                println!("{recipe}\n");
            }
        })
        .await;

    let state = session.state();
    if let Err(alert) = result {
        if json {
            let failure = serde_json::json!({
                "type": "recipe",
                "success": false,
                "error": alert.to_string(),
                "recipe": state.recipe(),
            });
            println!("{}", serde_json::to_string_pretty(&failure)?);
        }
        anyhow::bail!(alert);
    }

    let saved = match &args.output {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("creating {}", dir.display()))?;
            session.download_image(dir)?
        }
        None => None,
    };

    if json {
        let result = serde_json::json!({
            "type": "recipe",
            "success": true,
            "title": derive_title(state.recipe(), state.ingredients()),
            "recipe": state.recipe(),
            "has_image": state.image().is_some(),
            "mime_type": state.image().map(|image| image.mime_type()),
            "output": saved.as_ref().map(|path| path.display().to_string()),
            "share_folder_url": session.backend().config().share_folder_url,
        });
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        match (state.image(), &saved) {
            (None, _) => println!("No photo was produced for this recipe."),
            (Some(_), Some(path)) => println!("Saved photo: {}", path.display()),
            (Some(_), None) => println!("Photo ready (use --output to save it)."),
        }
    }

    Ok(())
}

async fn edit(client: GeminiClient, args: EditArgs, json: bool) -> anyhow::Result<()> {
    let bytes = std::fs::read(&args.input)
        .with_context(|| format!("reading {}", args.input.display()))?;
    let source = DataUri::from_image_bytes(&bytes);

    let edited = client
        .edit_image(&source, &args.instruction)
        .await?
        .context("The image could not be edited.")?;
    edited.save(&args.output)?;

    if json {
        let result = serde_json::json!({
            "type": "edit",
            "success": true,
            "output": args.output.display().to_string(),
            "mime_type": edited.mime_type(),
            "model": client.config().image_model.as_str(),
        });
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!(
            "Edited image: {} via {}",
            args.output.display(),
            client.name()
        );
    }

    Ok(())
}

async fn check(client: GeminiClient, json: bool) -> anyhow::Result<()> {
    client.resolve_api_key()?;
    client.health_check().await?;

    if json {
        let result = serde_json::json!({
            "type": "check",
            "success": true,
            "provider": client.name(),
            "text_model": client.config().text_model.as_str(),
            "image_model": client.config().image_model.as_str(),
        });
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!("✓ {} is reachable", client.name());
        println!("  Text model:  {}", client.config().text_model.as_str());
        println!("  Image model: {}", client.config().image_model.as_str());
    }

    Ok(())
}

/// A line typed at the session prompt.
#[derive(Debug, PartialEq, Eq)]
enum SessionCommand<'a> {
    Ingredients(&'a str),
    Edit(&'a str),
    Save(Option<&'a str>),
    Drive,
    State,
    Help,
    Quit,
    Unknown(&'a str),
}

fn parse_session_line(line: &str) -> Option<SessionCommand<'_>> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    let Some(command) = line.strip_prefix('/') else {
        return Some(SessionCommand::Ingredients(line));
    };

    let (name, rest) = command
        .split_once(char::is_whitespace)
        .map(|(name, rest)| (name, rest.trim()))
        .unwrap_or((command, ""));

    Some(match name {
        "edit" => SessionCommand::Edit(rest),
        "save" => SessionCommand::Save((!rest.is_empty()).then_some(rest)),
        "drive" => SessionCommand::Drive,
        "state" => SessionCommand::State,
        "help" => SessionCommand::Help,
        "quit" | "exit" => SessionCommand::Quit,
        other => SessionCommand::Unknown(other),
    })
}

const SESSION_HELP: &str = "\
Type your ingredients (e.g. \"tomato, egg, onion\") and press enter.
  /edit <instruction>  change the photo, e.g. /edit add parsley
  /save [DIR]          save the photo (default: current directory)
  /drive               show the shared folder for your dishes
  /state               print the session as JSON
  /quit                leave";

/// Whether the session loop keeps reading input.
#[derive(Debug, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

async fn run_session(client: GeminiClient, json: bool) -> anyhow::Result<()> {
    let share_folder_url = client.config().share_folder_url.clone();
    let session = KitchenSession::new(client);

    if !json {
        println!("Recipe Chef - what's in your fridge?\n{SESSION_HELP}\n");
    }

    drive_session(
        session,
        BufReader::new(tokio::io::stdin()),
        &share_folder_url,
        json,
    )
    .await?;
    Ok(())
}

/// Reads commands from `input` until it ends or `/quit`.
///
/// A failed command or a non-UTF-8 line is reported and the loop goes on.
async fn drive_session<B, R>(
    mut session: KitchenSession<B>,
    input: R,
    share_folder_url: &str,
    json: bool,
) -> anyhow::Result<KitchenSession<B>>
where
    B: KitchenBackend,
    R: AsyncBufRead + Unpin,
{
    let mut lines = input.split(b'\n');

    loop {
        if !json {
            print!("> ");
            std::io::stdout().flush().ok();
        }

        let bytes = match lines.next_segment().await {
            Ok(Some(bytes)) => bytes,
            Ok(None) => break,
            Err(e) => {
                tracing::error!(error = %e, "failed to read session input");
                report("Could not read input, ending the session.", json);
                break;
            }
        };
        let line = match String::from_utf8(bytes) {
            Ok(line) => line,
            Err(e) => {
                tracing::error!(error = %e, "session input is not valid UTF-8");
                report("Could not read that line (invalid UTF-8).", json);
                continue;
            }
        };
        let Some(command) = parse_session_line(&line) else {
            continue;
        };

        match handle_command(&mut session, command, share_folder_url, json).await {
            Ok(Flow::Continue) => {}
            Ok(Flow::Quit) => break,
            Err(e) => {
                tracing::error!(error = %e, "session command failed");
                report(&format!("{e:#}"), json);
            }
        }
    }

    Ok(session)
}

async fn handle_command<B: KitchenBackend>(
    session: &mut KitchenSession<B>,
    command: SessionCommand<'_>,
    share_folder_url: &str,
    json: bool,
) -> anyhow::Result<Flow> {
    match command {
        SessionCommand::Ingredients(ingredients) => {
            session.set_ingredients(ingredients);
            if !json {
                println!("Cooking up a recipe...");
            }
            let result = session
                .recommend_with(|recipe| {
                    if !json {
                        println!("\n{recipe}\n\nPlating the dish for a photo...");
                    }
                })
                .await;
            match result {
                Ok(()) if json => print_state(session)?,
                Ok(()) if session.state().image().is_some() => {
                    println!("Photo ready. /save to keep it, /edit to change it.");
                }
                Ok(()) => println!("No photo was produced for this recipe."),
                Err(alert) => report_alert(alert, json),
            }
        }
        SessionCommand::Edit(instruction) => {
            session.set_edit_prompt(instruction);
            if !json && session.can_edit() {
                println!("Editing the photo...");
            }
            match session.apply_edit().await {
                Ok(EditOutcome::Applied) if json => print_state(session)?,
                Ok(EditOutcome::Applied) => println!("Photo updated."),
                Ok(EditOutcome::Skipped) => {
                    let reason = if session.state().image().is_none() {
                        "There is no photo to edit yet."
                    } else {
                        "Usage: /edit <instruction>"
                    };
                    report(reason, json);
                }
                Err(alert) => report_alert(alert, json),
            }
        }
        SessionCommand::Save(dir) => {
            let dir = Path::new(dir.unwrap_or("."));
            let saved = session
                .download_image(dir)
                .with_context(|| format!("saving the photo to {}", dir.display()))?;
            match saved {
                Some(path) if json => {
                    println!("{}", serde_json::json!({ "saved": path.display().to_string() }));
                }
                Some(path) => println!("Saved photo: {}", path.display()),
                None => report("There is no photo to save yet.", json),
            }
        }
        SessionCommand::Drive => {
            if json {
                println!("{}", serde_json::json!({ "share_folder_url": share_folder_url }));
            } else {
                println!("Share your dish: {share_folder_url}");
            }
        }
        SessionCommand::State => print_state(session)?,
        SessionCommand::Help => println!("{SESSION_HELP}"),
        SessionCommand::Quit => return Ok(Flow::Quit),
        SessionCommand::Unknown(name) => {
            report(&format!("Unknown command /{name}. Try /help."), json)
        }
    }

    Ok(Flow::Continue)
}

fn print_state<B: KitchenBackend>(session: &KitchenSession<B>) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string(session.state())?);
    Ok(())
}

fn report_alert(alert: recipe_chef::Alert, json: bool) {
    report(&alert.to_string(), json)
}

fn report(message: &str, json: bool) {
    if json {
        println!("{}", serde_json::json!({ "alert": message }));
    } else {
        eprintln!("{message}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_session_line() {
        assert_eq!(parse_session_line("   "), None);
        assert_eq!(
            parse_session_line(" tomato, egg "),
            Some(SessionCommand::Ingredients("tomato, egg"))
        );
        assert_eq!(
            parse_session_line("/edit  add parsley "),
            Some(SessionCommand::Edit("add parsley"))
        );
        assert_eq!(parse_session_line("/edit"), Some(SessionCommand::Edit("")));
        assert_eq!(parse_session_line("/save"), Some(SessionCommand::Save(None)));
        assert_eq!(
            parse_session_line("/save out/photos"),
            Some(SessionCommand::Save(Some("out/photos")))
        );
        assert_eq!(parse_session_line("/quit"), Some(SessionCommand::Quit));
        assert_eq!(
            parse_session_line("/bake"),
            Some(SessionCommand::Unknown("bake"))
        );
    }

    #[test]
    fn test_cli_parses_global_flags() {
        let cli = Cli::try_parse_from([
            "recipe-chef",
            "recommend",
            "tomato, egg",
            "--json",
            "--image-model",
            "nano-banana-pro",
            "--aspect-ratio",
            "16:9",
            "--retries",
            "0",
        ])
        .unwrap();

        assert!(cli.options.json);
        assert!(matches!(
            cli.options.image_model,
            Some(ImageModelArg::NanoBananaPro)
        ));
        assert!(matches!(
            cli.options.aspect_ratio,
            Some(AspectRatioArg::Landscape)
        ));
        let client = build_client(&cli.options).unwrap();
        assert_eq!(client.config().retry.max_retries, 0);
        assert_eq!(client.config().retry.delay, RetryPolicy::default().delay);
        assert!(matches!(cli.command, Some(Commands::Recommend(_))));
    }

    #[test]
    fn test_cli_defaults_to_session() {
        let cli = Cli::try_parse_from(["recipe-chef"]).unwrap();
        assert!(cli.command.is_none());
    }

    /// Always answers with the same recipe and photo; edits echo the photo.
    struct FixedKitchen;

    #[async_trait::async_trait]
    impl KitchenBackend for FixedKitchen {
        async fn generate_recipe(&self, _ingredients: &str) -> recipe_chef::Result<String> {
            Ok("# Tomato Soup\n1. Simmer".to_string())
        }

        async fn generate_image(&self, _title: &str) -> recipe_chef::Result<Option<DataUri>> {
            Ok(Some(DataUri::from_bytes("image/png", b"soup")))
        }

        async fn edit_image(
            &self,
            image: &DataUri,
            _instruction: &str,
        ) -> recipe_chef::Result<Option<DataUri>> {
            Ok(Some(image.clone()))
        }

        fn name(&self) -> &str {
            "fixed"
        }

        async fn health_check(&self) -> recipe_chef::Result<()> {
            Ok(())
        }
    }

    const SHARE_URL: &str = "https://example.com/shared";

    #[tokio::test]
    async fn test_failed_save_is_reported_not_fatal() {
        let mut session = KitchenSession::new(FixedKitchen);
        session.set_ingredients("tomato");
        session.recommend().await.unwrap();

        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing");
        let command = SessionCommand::Save(missing.to_str());

        let err = handle_command(&mut session, command, SHARE_URL, true)
            .await
            .unwrap_err();
        assert!(format!("{err:#}").contains("saving the photo"));
        assert!(session.state().image().is_some());
    }

    #[tokio::test]
    async fn test_session_survives_failed_save() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing");
        let input = format!(
            "tomato\n/save {}\n/drive\n/save {}\n",
            missing.display(),
            dir.path().display()
        );

        let session = drive_session(
            KitchenSession::new(FixedKitchen),
            input.as_bytes(),
            SHARE_URL,
            true,
        )
        .await
        .unwrap();

        assert_eq!(session.state().recipe(), "# Tomato Soup\n1. Simmer");
        assert!(!missing.exists());
        let saved: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(saved.len(), 1);
        assert!(saved[0].starts_with("recipe-image-"));
    }

    #[tokio::test]
    async fn test_session_skips_invalid_utf8_line() {
        let input: &[u8] = b"\xff\xfe\ntomato\r\n/quit\n/edit never read\n";

        let session = drive_session(KitchenSession::new(FixedKitchen), input, SHARE_URL, true)
            .await
            .unwrap();

        assert_eq!(session.state().ingredients(), "tomato");
        assert!(session.state().image().is_some());
        assert_eq!(session.state().edit_prompt(), "");
    }

    #[tokio::test]
    async fn test_quit_stops_the_loop() {
        let flow = handle_command(
            &mut KitchenSession::new(FixedKitchen),
            SessionCommand::Quit,
            SHARE_URL,
            true,
        )
        .await
        .unwrap();
        assert_eq!(flow, Flow::Quit);
    }
}
