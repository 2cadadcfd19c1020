//! # adforge CLI
//!
//! Command-line interface for product ad export.
//!
//! ## Usage
//!
//! ```bash
//! # Run the HTTP API
//! adforge serve --listen 0.0.0.0:8080 --templates ./templates.json
//!
//! # Export a single ad from JSON content
//! adforge export --content product.json --format pdf --size 1080x1350 -o ad.pdf
//!
//! # Knock out a photo's white background
//! adforge remove-bg photo.jpg -o photo.png
//!
//! # One ad per CSV row, zipped
//! adforge batch products.csv --format png --prefix spring
//!
//! # List or delete saved templates
//! adforge templates list --store ./templates.json
//! ```

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use adforge::{
    AdComposer, AdForgeError,
    batch::{BatchOrchestrator, csv_template, parse_batch_csv},
    error::Result,
    export::{ExportGate, export, write_output},
    layout::{AdRenderer, TextFont},
    model::{
        ExportFormat, ExportSettings, Layout, ProductContent, TargetSize, TemplateSettings,
        list_presets, preset_by_name,
    },
    preprocess::{HttpImageFetcher, remove_background, resolve_product_image},
    server::{self, ServerConfig},
    templates::{FileTemplateStore, TemplateStore},
};

/// adforge - Product ad composition and export
#[derive(Parser, Debug)]
#[command(name = "adforge")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP API
    Serve {
        /// Address to listen on
        #[arg(long, env = "ADFORGE_LISTEN", default_value = "127.0.0.1:8080")]
        listen: String,

        /// Saved template file (in-memory when omitted)
        #[arg(long, env = "ADFORGE_TEMPLATES")]
        templates: Option<PathBuf>,

        /// Template file size limit in bytes
        #[arg(long, default_value_t = adforge::templates::DEFAULT_QUOTA_BYTES)]
        template_quota: usize,

        /// TTF/OTF font for ad text
        #[arg(long, env = "ADFORGE_FONT")]
        font: Option<PathBuf>,

        /// Remote image fetch timeout in seconds
        #[arg(long, default_value = "15")]
        fetch_timeout: u64,

        /// Upload size limit in megabytes
        #[arg(long, default_value = "50")]
        max_upload_mb: usize,
    },

    /// Export a single ad
    Export {
        /// Product content as JSON (camelCase fields)
        #[arg(long, value_name = "FILE", conflicts_with = "preset")]
        content: Option<PathBuf>,

        /// Use a built-in preset instead of a content file
        #[arg(long)]
        preset: Option<String>,

        /// Template settings as JSON
        #[arg(long, value_name = "FILE")]
        settings: Option<PathBuf>,

        /// Layout override (portrait, landscape, square)
        #[arg(long)]
        layout: Option<String>,

        /// Output format (png, jpg, pdf)
        #[arg(long, default_value = "png")]
        format: String,

        /// JPEG quality in percent
        #[arg(long, default_value = "92")]
        quality: u8,

        /// Target size as WIDTHxHEIGHT (defaults to the layout size)
        #[arg(long)]
        size: Option<String>,

        /// Output file (defaults to the generated name)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// TTF/OTF font for ad text
        #[arg(long, env = "ADFORGE_FONT")]
        font: Option<PathBuf>,
    },

    /// Remove the near-white background from a photo
    RemoveBg {
        /// Input image
        input: PathBuf,

        /// Output PNG
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Export one ad per CSV row into a zip archive
    Batch {
        /// Product CSV (name,price,specifications,brand,imageUrl[,description])
        csv: PathBuf,

        /// Template settings as JSON
        #[arg(long, value_name = "FILE")]
        settings: Option<PathBuf>,

        /// Output format (png, jpg, pdf)
        #[arg(long, default_value = "png")]
        format: String,

        /// JPEG quality in percent
        #[arg(long, default_value = "92")]
        quality: u8,

        /// Target size as WIDTHxHEIGHT (defaults to the layout size)
        #[arg(long)]
        size: Option<String>,

        /// Filename prefix for entries and the archive
        #[arg(long, default_value = "product-ad")]
        prefix: String,

        /// Add manifest.json to the archive
        #[arg(long)]
        manifest: bool,

        /// Directory for the archive
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,

        /// TTF/OTF font for ad text
        #[arg(long, env = "ADFORGE_FONT")]
        font: Option<PathBuf>,

        /// Remote image fetch timeout in seconds
        #[arg(long, default_value = "15")]
        fetch_timeout: u64,
    },

    /// Write the batch CSV template
    CsvTemplate {
        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Manage saved templates
    Templates {
        #[command(subcommand)]
        action: TemplateAction,
    },

    /// List built-in product presets
    Presets,
}

#[derive(Subcommand, Debug)]
enum TemplateAction {
    /// List saved templates
    List {
        #[arg(long, env = "ADFORGE_TEMPLATES")]
        store: PathBuf,
    },
    /// Delete a saved template by id
    Delete {
        id: String,

        #[arg(long, env = "ADFORGE_TEMPLATES")]
        store: PathBuf,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "adforge=info,tower_http=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve {
            listen,
            templates,
            template_quota,
            font,
            fetch_timeout,
            max_upload_mb,
        } => {
            let config = ServerConfig {
                listen_addr: listen,
                template_store_path: templates,
                template_quota_bytes: template_quota,
                font_path: font,
                fetch_timeout_secs: fetch_timeout,
                max_upload_bytes: max_upload_mb * 1024 * 1024,
            };
            server::serve(config).await
        }

        Commands::Export {
            content,
            preset,
            settings,
            layout,
            format,
            quality,
            size,
            output,
            font,
        } => {
            let mut template = load_settings(settings.as_deref())?;
            if let Some(layout) = layout {
                template.layout = parse_layout(&layout)?;
            }

            let mut product = match (content, preset) {
                (Some(path), _) => read_json::<ProductContent>(&path)?,
                (None, Some(name)) => preset_by_name(&name)
                    .ok_or_else(|| AdForgeError::NotFound(format!("preset {}", name)))?
                    .content,
                (None, None) => {
                    return Err(AdForgeError::NotFound(
                        "pass --content FILE or --preset NAME".to_string(),
                    ));
                }
            };
            let fetcher = HttpImageFetcher::new(Duration::from_secs(15))?;
            product.image = resolve_product_image(&fetcher, product.image.take()).await;

            let export_settings = export_settings(&format, quality, size.as_deref(), &template, "product-ad")?;
            let font = load_font(font.as_deref())?;

            let file = tokio::task::spawn_blocking(move || {
                let renderer = AdRenderer::new(&product, &template, &font);
                export(&renderer, &export_settings, template.background_color)
            })
            .await
            .map_err(|e| AdForgeError::Encode(format!("render task failed: {}", e)))??;

            let path = output.unwrap_or_else(|| PathBuf::from(&file.filename));
            write_output(&path, &file.bytes)?;
            println!("Saved {} ({} bytes)", path.display(), file.bytes.len());
            Ok(())
        }

        Commands::RemoveBg { input, output } => {
            let bytes = std::fs::read(&input)?;
            let name = input.file_name().and_then(|n| n.to_str());
            let processed = remove_background(&bytes, name);
            if !processed.removed {
                return Err(AdForgeError::Image(format!(
                    "{} could not be decoded",
                    input.display()
                )));
            }
            write_output(&output, &processed.bytes)?;
            println!(
                "Saved {} ({} pixels cleared)",
                output.display(),
                processed.cleared_pixels
            );
            Ok(())
        }

        Commands::Batch {
            csv,
            settings,
            format,
            quality,
            size,
            prefix,
            manifest,
            out_dir,
            font,
            fetch_timeout,
        } => {
            let template = load_settings(settings.as_deref())?;
            let rows = parse_batch_csv(&std::fs::read_to_string(&csv)?)?;
            let mut export_settings = export_settings(&format, quality, size.as_deref(), &template, &prefix)?;
            export_settings.include_metadata = manifest;

            let composer = AdComposer::new(ProductContent::default(), template, load_font(font.as_deref())?);
            let fetcher = Arc::new(HttpImageFetcher::new(Duration::from_secs(fetch_timeout))?);
            let orchestrator = BatchOrchestrator::new(fetcher, ExportGate::new());

            match orchestrator.run(composer, &rows, &export_settings).await? {
                Some(archive) => {
                    let path = out_dir.join(&archive.filename);
                    write_output(&path, &archive.bytes)?;
                    println!("Saved {} ({} entries)", path.display(), archive.entries.len());
                }
                None => println!("No rows in {}; nothing exported", csv.display()),
            }
            Ok(())
        }

        Commands::CsvTemplate { output } => {
            match output {
                Some(path) => write_output(&path, csv_template().as_bytes())?,
                None => print!("{}", csv_template()),
            }
            Ok(())
        }

        Commands::Templates { action } => match action {
            TemplateAction::List { store } => {
                let templates = FileTemplateStore::new(store).list()?;
                if templates.is_empty() {
                    println!("No saved templates");
                }
                for t in templates {
                    println!(
                        "{}  {}  {}",
                        t.id,
                        t.created_at.format("%Y-%m-%d %H:%M"),
                        t.name
                    );
                }
                Ok(())
            }
            TemplateAction::Delete { id, store } => {
                let id = uuid::Uuid::parse_str(&id)
                    .map_err(|_| AdForgeError::NotFound(format!("template {}", id)))?;
                if FileTemplateStore::new(store).remove(id)? {
                    println!("Deleted {}", id);
                } else {
                    println!("No template with id {}", id);
                }
                Ok(())
            }
        },

        Commands::Presets => {
            println!("Available presets:");
            for preset in list_presets() {
                println!("  {:<16} {}", preset.name, preset.content.price);
            }
            Ok(())
        }
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let text = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}

fn load_settings(path: Option<&Path>) -> Result<TemplateSettings> {
    match path {
        Some(path) => read_json(path),
        None => Ok(TemplateSettings::default()),
    }
}

fn load_font(path: Option<&Path>) -> Result<TextFont> {
    match path {
        Some(path) => {
            info!(path = %path.display(), "loading ad font");
            TextFont::from_file(path)
        }
        None => Ok(TextFont::Bitmap),
    }
}

fn parse_layout(name: &str) -> Result<Layout> {
    serde_json::from_value(serde_json::Value::String(name.to_ascii_lowercase()))
        .map_err(|_| AdForgeError::NotFound(format!("layout {}", name)))
}

fn export_settings(
    format: &str,
    quality: u8,
    size: Option<&str>,
    template: &TemplateSettings,
    prefix: &str,
) -> Result<ExportSettings> {
    let format = ExportFormat::parse(format)
        .ok_or_else(|| AdForgeError::NotFound(format!("export format {}", format)))?;
    let target_size = match size {
        Some(s) => TargetSize::parse(s).map_err(AdForgeError::Image)?,
        None => {
            let (w, h) = template.layout.dimensions();
            TargetSize::new(w, h, "Layout")
        }
    };
    Ok(ExportSettings {
        format,
        quality,
        target_size,
        filename: prefix.to_string(),
        include_metadata: false,
    })
}
