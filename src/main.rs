use clap::{Parser, Subcommand};
use opengraph::config;
use opengraph::context::PageContext;
use opengraph::emit::{self, OutputMode};
use opengraph::host::MemoryHost;
use opengraph::output;
use opengraph::pipeline::Pipeline;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "opengraph")]
#[command(about = "Open Graph, Twitter Card and Fediverse metadata for site pages")]
#[command(long_about = "\
Open Graph, Twitter Card and Fediverse metadata for site pages

Resolves the metadata of one page of a site described by a fixture file and
prints it as <meta> tags, as a property listing, or as JSON.

Pages are addressed as:

  home              blog index
  front             static front page
  post:12           content item 12 (post, page or custom type)
  attachment:40     attachment page of item 40
  author:3          author archive of user 3
  category:7        category archive of term 7
  tag:9             tag archive of term 9
  archive           other archives (dates, custom taxonomies)
  archive:gallery   post-format archive
  404               not found

Images are picked in this order, up to images.max (default 3):
  avatar (author pages only) → featured image → image/cover blocks →
  <img> tags in the uploads directory → attached images →
  site icon / logo / header image when nothing else was found

Run 'opengraph gen-config' to generate a documented config.toml.")]
#[command(version)]
struct Cli {
    /// Site fixture (.toml or .json)
    #[arg(long, default_value = "site.toml", global = true)]
    site: PathBuf,

    /// Directory holding config.toml
    #[arg(long, default_value = ".", global = true)]
    config: PathBuf,

    /// Log resolver decisions to stderr (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the <meta> tags of a page
    Tags {
        /// Page address, e.g. post:12
        page: PageContext,
        /// Use property= for Open Graph and name= for card keys only
        #[arg(long)]
        strict: bool,
    },
    /// List the resolved metadata of a page
    Show {
        /// Page address, e.g. post:12
        page: PageContext,
        /// Print JSON instead of a listing
        #[arg(long)]
        json: bool,
    },
    /// Print the <html> attributes with the namespace prefix declaration
    Prefix {
        /// Page address, e.g. author:1
        page: PageContext,
        /// Attributes already on the <html> element
        #[arg(long, default_value = "")]
        existing: String,
    },
    /// Print a stock config.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Tags { page, strict } => {
            let (pipeline, host) = load(&cli.config, &cli.site)?;
            let metadata = pipeline.resolve_metadata(&host, page);
            let mode = if strict {
                OutputMode::Strict
            } else {
                pipeline.output_mode()
            };
            print!("{}", emit::meta_tags(&metadata, mode).into_string());
        }
        Command::Show { page, json } => {
            let (pipeline, host) = load(&cli.config, &cli.site)?;
            let metadata = pipeline.resolve_metadata(&host, page);
            if json {
                println!("{}", serde_json::to_string_pretty(&metadata)?);
            } else {
                output::print_metadata(page, &metadata);
            }
        }
        Command::Prefix { page, existing } => {
            let (pipeline, host) = load(&cli.config, &cli.site)?;
            let prefixes = pipeline.prefixes(&host, page);
            output::print_prefixes(&prefixes);
            println!();
            println!("{}", emit::prefix_attribute(&existing, &prefixes));
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Send logs to stderr so stdout stays clean markup or JSON.
///
/// `RUST_LOG` wins over `-v` when set.
fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "opengraph=debug",
        _ => "opengraph=trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Load config and site fixture, and build the default pipeline.
fn load(
    config_dir: &Path,
    site: &Path,
) -> Result<(Pipeline, MemoryHost), Box<dyn std::error::Error>> {
    let config = config::load_config(config_dir)?;
    let pipeline = Pipeline::new(config)?;
    let host = MemoryHost::load(site)?;
    Ok((pipeline, host))
}
