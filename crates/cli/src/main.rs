//! CLI for generating, rendering and inspecting slide decks.

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use slidegen_core::{fallback_outline, ChatRequest, GenerateRequest, Outline, PreviewFormatter, DEFAULT_SLIDE_COUNT};
use slidegen_pptx::{PptxReader, PptxRenderer};
use slidegen_service::config::{DEFAULT_LINK_TTL_SECS, DEFAULT_MODEL_ID};
use slidegen_service::{handle, Delivery, Generator, ServiceConfig, GENERATE_PATH};
use std::fs::File;
use std::path::{Path, PathBuf};

/// Generate PowerPoint decks from a topic, reference pages and an outline model.
#[derive(Parser, Debug)]
#[command(name = "slidegen")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render an outline JSON file to a .pptx file
    Render {
        /// Outline file ({"slides": [{"title": ..., "content": [...]}]})
        outline: PathBuf,

        /// Output file (default: outline name with .pptx)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print the visible text of a .pptx file
    Inspect {
        /// Input .pptx file
        deck: PathBuf,

        /// Print as JSON instead of a slide preview
        #[arg(long)]
        json: bool,
    },

    /// Print the fallback outline for a topic
    Fallback {
        #[arg(short, long)]
        topic: String,

        #[arg(short, long, default_value_t = DEFAULT_SLIDE_COUNT)]
        slides: u32,
    },

    /// Generate a deck end to end
    Generate {
        /// Chat-style prompt: topic on the first line, URLs and "N slides" anywhere
        #[arg(long, conflicts_with_all = ["topic", "urls", "slides"])]
        prompt: Option<String>,

        #[arg(short, long, required_unless_present = "prompt")]
        topic: Option<String>,

        /// Reference page (repeatable)
        #[arg(short = 'u', long = "url")]
        urls: Vec<String>,

        #[arg(short, long)]
        slides: Option<u32>,

        /// Output file for inline delivery (default: generated file name)
        #[arg(short, long, conflicts_with = "store")]
        output: Option<PathBuf>,

        /// Store the deck in the object store and print its link
        #[arg(long)]
        store: bool,

        #[command(flatten)]
        service: ServiceArgs,
    },

    /// Run the generate-ppt handler on a JSON request body and print the response
    Handle {
        /// Request body file ({"description": ..., "urls": [...], "slide_count": N})
        request: PathBuf,

        #[command(flatten)]
        service: ServiceArgs,
    },
}

#[derive(Args, Debug)]
struct ServiceArgs {
    /// Inference endpoint base URL; without one the fallback outline is used
    #[arg(long, env = "SLIDEGEN_ENDPOINT")]
    endpoint: Option<String>,

    #[arg(long, env = "SLIDEGEN_MODEL_ID", default_value = DEFAULT_MODEL_ID)]
    model_id: String,

    #[arg(long, env = "SLIDEGEN_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Per-URL fetch timeout in seconds
    #[arg(long, env = "SLIDEGEN_FETCH_TIMEOUT_SECS", default_value_t = 15)]
    fetch_timeout: u64,

    /// Outline source timeout in seconds
    #[arg(long, env = "SLIDEGEN_SOURCE_TIMEOUT_SECS", default_value_t = 60)]
    source_timeout: u64,

    /// Directory the object store writes to
    #[arg(long, env = "SLIDEGEN_STORE_DIR")]
    store_dir: Option<PathBuf>,

    /// Public base URL the store directory is served from
    #[arg(long, env = "SLIDEGEN_PUBLIC_URL", default_value = "http://localhost:8080/files")]
    public_url: String,

    #[arg(long, env = "SLIDEGEN_SIGNING_KEY", hide_env_values = true)]
    signing_key: Option<String>,

    /// Retrieval link lifetime in seconds
    #[arg(long, env = "SLIDEGEN_LINK_TTL_SECS", default_value_t = DEFAULT_LINK_TTL_SECS)]
    link_ttl: u64,
}

impl ServiceArgs {
    fn to_config(&self, use_store: bool) -> Result<ServiceConfig> {
        let config = ServiceConfig {
            endpoint: self.endpoint.clone(),
            model_id: self.model_id.clone(),
            api_key: self.api_key.clone(),
            fetch_timeout_secs: self.fetch_timeout,
            source_timeout_secs: self.source_timeout,
            store_dir: if use_store { self.store_dir.clone() } else { None },
            public_url: self.public_url.clone(),
            signing_key: self.signing_key.clone(),
            link_ttl_secs: self.link_ttl,
        };
        config.validate().context("Invalid service configuration")?;
        config.log_loaded();
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    if cli.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    }

    match cli.command {
        Command::Render { outline, output } => render(&outline, output.as_deref(), cli.verbose),
        Command::Inspect { deck, json } => inspect(&deck, json),
        Command::Fallback { topic, slides } => {
            println!("{}", fallback_outline(&topic, slides).to_json_pretty());
            Ok(())
        }
        Command::Generate {
            prompt,
            topic,
            urls,
            slides,
            output,
            store,
            service,
        } => {
            let request = match prompt {
                Some(prompt) => ChatRequest::parse(&prompt).into_request(),
                None => GenerateRequest::new(topic.unwrap_or_default())
                    .with_urls(urls)
                    .with_slide_count(slides.unwrap_or(DEFAULT_SLIDE_COUNT)),
            };
            let config = service.to_config(store)?;
            if store && config.store_dir.is_none() {
                bail!("--store needs a store directory (--store-dir or SLIDEGEN_STORE_DIR)");
            }
            generate(&config, &request, output.as_deref(), cli.verbose).await
        }
        Command::Handle { request, service } => {
            let body = std::fs::read_to_string(&request)
                .with_context(|| format!("Failed to read {}", request.display()))?;
            let config = service.to_config(true)?;
            let generator = Generator::from_config(&config)?;
            let response = handle(&generator, "POST", GENERATE_PATH, &body).await;
            println!(
                "{}",
                serde_json::to_string_pretty(&serde_json::json!({
                    "status": response.status,
                    "body": response.body,
                }))?
            );
            if !response.is_success() {
                std::process::exit(1);
            }
            Ok(())
        }
    }
}

/// Render an outline file to a deck.
fn render(input: &Path, output: Option<&Path>, verbose: bool) -> Result<()> {
    let text = std::fs::read_to_string(input)
        .with_context(|| format!("Failed to read {}", input.display()))?;
    let outline = Outline::parse(&text).with_context(|| format!("Invalid outline in {}", input.display()))?;
    log::debug!("Parsed {} slides from {}", outline.len(), input.display());

    let output_path = match output {
        Some(path) => path.to_path_buf(),
        None => input.with_extension("pptx"),
    };
    let document = PptxRenderer::new()
        .render_to_path(&outline, &output_path)
        .with_context(|| format!("Failed to render {}", output_path.display()))?;

    if verbose {
        eprintln!(
            "Written {} slides ({} bytes) to: {}",
            document.slide_count(),
            document.size(),
            output_path.display()
        );
    }
    Ok(())
}

/// Print a deck's visible text.
fn inspect(path: &Path, json: bool) -> Result<()> {
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let deck = PptxReader::new()
        .read(file)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&deck)?);
    } else {
        println!("{}", PreviewFormatter::new().format(&deck.to_outline()));
    }
    Ok(())
}

async fn generate(config: &ServiceConfig, request: &GenerateRequest, output: Option<&Path>, verbose: bool) -> Result<()> {
    let generator = Generator::from_config(config)?;
    let generated = generator.generate(request).await?;

    for page in generated.pages.iter().filter(|p| !p.is_ok()) {
        eprintln!(
            "Warning: could not read {}: {}",
            page.url,
            page.error.as_deref().unwrap_or("unknown error")
        );
    }
    if verbose {
        eprintln!("Outline: {}", generated.origin.label());
    }

    match &generated.delivery {
        Delivery::Inline { filename, bytes, .. } => {
            let path = output.map(Path::to_path_buf).unwrap_or_else(|| PathBuf::from(filename));
            std::fs::write(&path, bytes).with_context(|| format!("Failed to write {}", path.display()))?;
            println!("{}", path.display());
        }
        Delivery::Stored { url, expires_at, .. } => {
            println!("{}", url);
            if verbose {
                eprintln!("Link expires at {}", expires_at);
            }
        }
    }

    if verbose {
        eprintln!("\n{}", PreviewFormatter::new().format(&generated.outline));
    }
    Ok(())
}
