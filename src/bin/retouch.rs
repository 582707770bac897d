//! CLI for Retouch - prompt-driven image editing and generation.

use clap::{Args, Parser, Subcommand, ValueEnum};
use retouch::{
    EditModel, EditSession, GeminiService, GenerateSession, ImageArtifact, ImagenModel, Phase,
    SelectedFile,
};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "retouch")]
#[command(about = "Edit and generate images with natural-language prompts (Gemini, Imagen)")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Edit an existing image with a text instruction
    Edit(EditArgs),

    /// Generate a new image from a text prompt
    Generate(GenerateArgs),

    /// Check that the service is reachable and authenticated
    Health,
}

#[derive(Args)]
struct EditArgs {
    /// Path to the source image (PNG, JPG, WEBP)
    input: PathBuf,

    /// The edit instruction
    prompt: String,

    /// Output file path
    #[arg(short, long)]
    output: PathBuf,

    /// Model to use for the edit
    #[arg(long, value_enum, default_value = "flash")]
    model: EditModelArg,
}

#[derive(Args)]
struct GenerateArgs {
    /// The text prompt describing the image
    prompt: String,

    /// Output file path
    #[arg(short, long)]
    output: PathBuf,

    /// Model to use for generation
    #[arg(long, value_enum, default_value = "imagen-4")]
    model: ImagenModelArg,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum EditModelArg {
    Flash,
    Pro,
}

impl From<EditModelArg> for EditModel {
    fn from(arg: EditModelArg) -> Self {
        match arg {
            EditModelArg::Flash => EditModel::FlashImage,
            EditModelArg::Pro => EditModel::ProImage,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ImagenModelArg {
    #[value(name = "imagen-4")]
    Imagen4,
    #[value(name = "imagen-3")]
    Imagen3,
}

impl From<ImagenModelArg> for ImagenModel {
    fn from(arg: ImagenModelArg) -> Self {
        match arg {
            ImagenModelArg::Imagen4 => ImagenModel::Imagen4,
            ImagenModelArg::Imagen3 => ImagenModel::Imagen3,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("retouch=info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Edit(args) => edit_image(args, cli.json).await,
        Commands::Generate(args) => generate_image(args, cli.json).await,
        Commands::Health => health_check(cli.json).await,
    }
}

async fn edit_image(args: EditArgs, json_output: bool) -> anyhow::Result<()> {
    let service = GeminiService::builder()
        .edit_model(args.model.into())
        .build()?;

    let mut session = EditSession::new();
    session.select_file(SelectedFile::from_path(&args.input)?);
    session.set_prompt(&args.prompt);

    match session.run(&service).await {
        Phase::Success(image) => report_image(image, &args.output, "edit", json_output),
        Phase::Failure(message) => anyhow::bail!("{message}"),
        other => anyhow::bail!("session ended in unexpected phase: {other:?}"),
    }
}

async fn generate_image(args: GenerateArgs, json_output: bool) -> anyhow::Result<()> {
    let service = GeminiService::builder()
        .imagen_model(args.model.into())
        .build()?;

    let mut session = GenerateSession::new();
    session.set_prompt(&args.prompt);

    match session.run(&service).await {
        Phase::Success(image) => report_image(image, &args.output, "generate", json_output),
        Phase::Failure(message) => anyhow::bail!("{message}"),
        other => anyhow::bail!("session ended in unexpected phase: {other:?}"),
    }
}

fn report_image(
    image: &ImageArtifact,
    output: &Path,
    operation: &str,
    json_output: bool,
) -> anyhow::Result<()> {
    image.save(output)?;

    if json_output {
        let result = serde_json::json!({
            "operation": operation,
            "success": true,
            "output": output.display().to_string(),
            "size_bytes": image.size(),
            "format": image.format.extension(),
            "model": image.metadata.model,
            "duration_ms": image.metadata.duration_ms,
        });
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!(
            "Saved image: {} ({} bytes)",
            output.display(),
            image.size()
        );
        if let Some(duration) = image.metadata.duration_ms {
            println!("Duration: {}ms", duration);
        }
    }

    Ok(())
}

async fn health_check(json_output: bool) -> anyhow::Result<()> {
    let service = GeminiService::builder().build()?;
    retouch::ImageService::health_check(&service).await?;

    if json_output {
        println!("{}", serde_json::json!({ "healthy": true }));
    } else {
        println!("Service is reachable and authenticated.");
    }

    Ok(())
}
