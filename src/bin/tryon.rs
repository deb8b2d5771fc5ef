//! CLI for tryon - identity-preserving outfit edits.

use anyhow::Context;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use tryon::session::{find_preset, STYLE_PRESETS};
use tryon::{DataUri, ImageEditor, ImageLocator, TryOnSession};

#[derive(Parser)]
#[command(name = "tryon")]
#[command(about = "Restyle the outfit in a portrait while keeping the person unchanged")]
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
    /// Edit the outfit in a portrait
    Edit(EditArgs),

    /// List built-in style presets
    Presets,

    /// List available providers
    Providers,
}

#[derive(Args)]
struct EditArgs {
    /// Portrait to edit (PNG, JPEG, WebP or GIF)
    source: PathBuf,

    /// Description of the desired outfit
    #[arg(short = 'p', long, required_unless_present = "preset", conflicts_with = "preset")]
    prompt: Option<String>,

    /// Use a built-in style preset instead of --prompt
    #[arg(long)]
    preset: Option<String>,

    /// Reference garment image
    #[arg(short, long)]
    reference: Option<PathBuf>,

    /// Provider to use
    #[arg(long, value_enum, default_value = "gemini")]
    provider: ProviderArg,

    /// Model identifier (provider specific)
    #[arg(short, long)]
    model: Option<String>,

    /// Write the edited image here instead of printing its locator
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ProviderArg {
    Gemini,
    Rest,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Edit(args) => edit(args, cli.json).await?,
        Commands::Presets => list_presets(cli.json)?,
        Commands::Providers => list_providers(cli.json)?,
    }

    Ok(())
}

fn build_editor(provider: ProviderArg, model: Option<&str>) -> anyhow::Result<Box<dyn ImageEditor>> {
    match provider {
        ProviderArg::Gemini => {
            #[cfg(feature = "gemini")]
            {
                let mut builder = tryon::GeminiEditorBuilder::from_env();
                match model {
                    None | Some("gemini-2.5-flash-image") => {}
                    Some("gemini-3-pro-image-preview") => {
                        builder = builder.model(tryon::GeminiModel::ProImage)
                    }
                    Some(other) => anyhow::bail!("unknown Gemini model: {other}"),
                }
                Ok(Box::new(builder.build()?))
            }
            #[cfg(not(feature = "gemini"))]
            {
                let _ = model;
                anyhow::bail!("Gemini provider not enabled");
            }
        }
        ProviderArg::Rest => {
            #[cfg(feature = "rest")]
            {
                let mut builder = tryon::RestEditorBuilder::from_env();
                if let Some(model) = model {
                    builder = builder.model(model);
                }
                Ok(Box::new(builder.build()?))
            }
            #[cfg(not(feature = "rest"))]
            {
                let _ = model;
                anyhow::bail!("REST provider not enabled");
            }
        }
    }
}

async fn edit(args: EditArgs, json_output: bool) -> anyhow::Result<()> {
    let prompt = match (&args.prompt, &args.preset) {
        (Some(prompt), _) => prompt.clone(),
        (None, Some(label)) => find_preset(label)
            .map(|p| p.prompt.to_string())
            .with_context(|| format!("unknown preset: {label} (see `tryon presets`)"))?,
        (None, None) => anyhow::bail!("either --prompt or --preset is required"),
    };

    let editor = build_editor(args.provider, args.model.as_deref())?;
    let mut session = TryOnSession::new(editor);

    session.set_source_image(
        DataUri::from_path(&args.source)
            .with_context(|| format!("reading {}", args.source.display()))?,
    );
    if let Some(ref path) = args.reference {
        session.set_reference_image(
            DataUri::from_path(path).with_context(|| format!("reading {}", path.display()))?,
        );
    }
    session.set_prompt(prompt);

    let result = session.generate().await?;
    let provider = session.editor().kind().to_string();
    let provider_name = session.editor().name().to_string();

    let size_bytes = match args.output {
        Some(ref path) => Some(save_result(&result, path).await?),
        None => None,
    };

    if json_output {
        let shown = args.output.is_none().then(|| result.as_str());
        let output = serde_json::json!({
            "success": true,
            "provider": provider,
            "prompt": session.prompt(),
            "reference": args.reference.is_some(),
            "output": args.output.as_ref().map(|p| p.display().to_string()),
            "size_bytes": size_bytes,
            "result": shown,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else if let (Some(path), Some(size)) = (&args.output, size_bytes) {
        println!(
            "Edited image: {} ({} bytes) via {}",
            path.display(),
            size,
            provider_name
        );
    } else {
        println!("{result}");
    }

    Ok(())
}

async fn save_result(result: &ImageLocator, path: &Path) -> anyhow::Result<usize> {
    let data = match result {
        ImageLocator::DataUri(uri) => uri.decode()?,
        ImageLocator::Remote(url) => {
            let response = reqwest::get(url).await?.error_for_status()?;
            response.bytes().await?.to_vec()
        }
    };
    std::fs::write(path, &data).with_context(|| format!("writing {}", path.display()))?;
    Ok(data.len())
}

fn list_presets(json_output: bool) -> anyhow::Result<()> {
    if json_output {
        println!("{}", serde_json::to_string_pretty(STYLE_PRESETS)?);
    } else {
        for preset in STYLE_PRESETS {
            println!("  {:<16} {}", preset.label, preset.prompt);
        }
    }
    Ok(())
}

fn list_providers(json_output: bool) -> anyhow::Result<()> {
    #[derive(serde::Serialize)]
    struct ProviderInfo {
        name: &'static str,
        kind: &'static str,
        env_var: &'static str,
        sends_reference_image: bool,
        enabled: bool,
    }

    let providers = [
        ProviderInfo {
            name: "Gemini (Google)",
            kind: "gemini",
            env_var: "GOOGLE_API_KEY",
            sends_reference_image: true,
            enabled: cfg!(feature = "gemini"),
        },
        ProviderInfo {
            name: "Image generation REST API",
            kind: "rest",
            env_var: "TOGETHER_API_KEY",
            sends_reference_image: false,
            enabled: cfg!(feature = "rest"),
        },
    ];

    if json_output {
        println!("{}", serde_json::to_string_pretty(&providers)?);
    } else {
        println!("Available providers:\n");
        for p in &providers {
            let status = if p.enabled { "✓" } else { "✗" };
            println!("  {} {} ({})", status, p.name, p.kind);
            println!("    API key: {}", p.env_var);
            if !p.sends_reference_image {
                println!("    reference image: described in the prompt only");
            }
        }
    }

    Ok(())
}
