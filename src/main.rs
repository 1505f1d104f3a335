use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use promocast_audio::{ResourceHandle, ResourceRegistry};
use promocast_core::prompts::{self, PriceTag, SpeakingStyle};
use promocast_core::{AppConfig, Credentials, EnvProvider, FileStore};
use promocast_engine::{BackendRegistry, CancelSignal, PollPolicy};
use promocast_studio::Studio;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "promocast", about = "Voice-over and short video generator for product promos")]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "promocast.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Synthesize speech and save it as a WAV file
    Speak {
        #[arg(short, long)]
        text: String,
        #[arg(short, long)]
        voice: Option<String>,
        /// Delivery style key, e.g. "cheerful" or "natural"
        #[arg(short, long)]
        style: Option<String>,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Animate a still image into a short vertical video
    Animate {
        #[arg(short, long)]
        image: PathBuf,
        #[arg(short, long, default_value = "")]
        prompt: String,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Write an affiliate promo script for a product category or photo
    Script {
        /// Product category; only a hint when --image is given
        #[arg(long, default_value = "")]
        category: String,
        /// "49k" style shorthand, free text, or "none"
        #[arg(long, default_value = "")]
        price: String,
        /// Write the script from a product photo instead
        #[arg(long)]
        image: Option<PathBuf>,
    },
    /// Rewrite a script so it reads better aloud
    Optimize {
        #[arg(short, long)]
        text: String,
    },
    /// Write a TikTok caption with hashtags
    Caption {
        #[arg(long)]
        product: String,
    },
    /// List the prebuilt voices and speaking styles
    Voices,
    /// Manage the stored API key
    Key {
        #[command(subcommand)]
        action: KeyAction,
    },
}

#[derive(Subcommand)]
enum KeyAction {
    /// Save a key. Reads one line from stdin when no value is given
    Set { value: Option<String> },
    Clear,
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = AppConfig::load_or_default(&cli.config)
        .with_context(|| format!("failed to load config from {:?}", cli.config))?;

    let env_filter = EnvFilter::try_new(&config.general.log_level)
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let subscriber = tracing_subscriber::Registry::default()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(false),
        );

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    let credentials = Arc::new(build_credentials(&config));

    match cli.command {
        Command::Voices => {
            print_catalog();
            Ok(())
        }
        Command::Key { action } => run_key(action, &credentials),
        Command::Speak {
            text,
            voice,
            style,
            output,
        } => {
            let style_key = style.unwrap_or_else(|| config.speech.default_style.clone());
            let Some(style) = SpeakingStyle::from_key(&style_key) else {
                bail!("unknown speaking style '{style_key}', see `promocast voices`");
            };
            let voice = voice.unwrap_or_else(|| config.speech.default_voice.clone());

            let studio = build_studio(&config, credentials).await?;
            let handle = studio
                .synthesize_with_style(&text, &voice, style)
                .await
                .context("speech generation failed")?;
            let path = output.unwrap_or_else(|| default_output(&config, "speech", "wav"));
            save(handle, &path)
        }
        Command::Animate {
            image,
            prompt,
            output,
        } => {
            let mime_type = image_mime_type(&image)?;
            let bytes = std::fs::read(&image)
                .with_context(|| format!("failed to read image {:?}", image))?;

            let studio = build_studio(&config, credentials).await?;

            let (cancel_handle, cancel) = CancelSignal::pair();
            let interrupt = tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    tracing::warn!("interrupt received, cancelling video job");
                    cancel_handle.cancel();
                }
            });

            tracing::info!(image = %image.display(), mime_type, "submitting video job");
            let result = studio
                .animate_image_to_video_with_cancel(&bytes, mime_type, &prompt, &cancel)
                .await;
            interrupt.abort();

            let handle = result.context("video generation failed")?;
            let path = output.unwrap_or_else(|| default_output(&config, "video", "mp4"));
            save(handle, &path)
        }
        Command::Script {
            category,
            price,
            image,
        } => {
            let studio = build_studio(&config, credentials).await?;
            let script = match image {
                Some(image) => {
                    let mime_type = image_mime_type(&image)?;
                    let bytes = std::fs::read(&image)
                        .with_context(|| format!("failed to read image {:?}", image))?;
                    studio
                        .script_from_image(&bytes, mime_type, &category)
                        .await
                }
                None => {
                    studio
                        .affiliate_script(&category, &PriceTag::parse(&price))
                        .await
                }
            }
            .context("script generation failed")?;
            println!("{script}");
            Ok(())
        }
        Command::Optimize { text } => {
            let studio = build_studio(&config, credentials).await?;
            let optimized = studio
                .optimize_script(&text)
                .await
                .context("script optimization failed")?;
            println!("{optimized}");
            Ok(())
        }
        Command::Caption { product } => {
            let studio = build_studio(&config, credentials).await?;
            let caption = studio
                .tiktok_caption(&product)
                .await
                .context("caption generation failed")?;
            println!("{caption}");
            Ok(())
        }
    }
}

fn build_credentials(config: &AppConfig) -> Credentials {
    let env = config
        .credentials
        .env_var
        .as_deref()
        .map(str::trim)
        .filter(|var| !var.is_empty())
        .map(EnvProvider::new);
    Credentials::new(FileStore::new(&config.credentials.store_path), env)
}

async fn build_studio(config: &AppConfig, credentials: Arc<Credentials>) -> Result<Studio> {
    let registry = BackendRegistry::new();
    let name = config.general.backend.as_str();
    let backend = registry
        .build(name, config.backend_table(name))
        .await
        .with_context(|| {
            format!(
                "failed to initialize backend '{}' (available: {})",
                name,
                registry.list_backends().join(", ")
            )
        })?;
    tracing::info!(backend = name, "backend ready");

    Ok(Studio::new(backend, credentials, ResourceRegistry::new())
        .with_poll_policy(PollPolicy::from(&config.video))
        .with_default_video_prompt(&config.video.default_prompt))
}

fn run_key(action: KeyAction, credentials: &Credentials) -> Result<()> {
    match action {
        KeyAction::Set { value } => {
            let raw = match value {
                Some(v) => v,
                None => {
                    let mut line = String::new();
                    std::io::stdin()
                        .read_line(&mut line)
                        .context("failed to read key from stdin")?;
                    line
                }
            };
            if !credentials.set(&raw)? {
                bail!("refusing to store an empty API key");
            }
            println!("API key saved");
        }
        KeyAction::Clear => {
            credentials.clear()?;
            println!("API key cleared");
        }
        KeyAction::Status => {
            if credentials.has() {
                println!("API key: configured");
            } else {
                println!("API key: not configured");
            }
        }
    }
    Ok(())
}

fn print_catalog() {
    println!("Voices:");
    for voice in prompts::VOICES {
        println!("  {:<10} {}", voice.id, voice.description);
    }
    println!("Styles:");
    for style in SpeakingStyle::ALL {
        let marker = if style == SpeakingStyle::default() { " (default)" } else { "" };
        println!("  {}{}", style.key(), marker);
    }
}

fn image_mime_type(path: &Path) -> Result<&'static str> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "png" => Ok("image/png"),
        "jpg" | "jpeg" => Ok("image/jpeg"),
        "gif" => Ok("image/gif"),
        _ => bail!("unsupported image type {:?}, expected png, jpeg or gif", path),
    }
}

fn default_output(config: &AppConfig, kind: &str, ext: &str) -> PathBuf {
    let stamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default();
    Path::new(&config.output.dir).join(format!("promocast-{kind}-{stamp}.{ext}"))
}

fn save(handle: ResourceHandle, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory {:?}", parent))?;
    }
    handle
        .write_to(path)
        .with_context(|| format!("failed to write {:?}", path))?;
    tracing::info!(path = %path.display(), content_type = handle.content_type(), "saved");
    handle.release();
    println!("{}", path.display());
    Ok(())
}
