use std::path::PathBuf;

use clap::Parser;
use eyre::Context;
use loadfavicon::{
    DownloadOptions, FaviconLoader, FaviconLoaderConfig, SizeRequest, TracingObserver,
};
use logging::{LoggingFormat, init_logging};
use tracing::level_filters::LevelFilter;

mod logging;

#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Args {
    /// URL of the website to download the favicons of
    #[arg(short, long)]
    url: String,

    /// Directory to save the favicon files to, created when missing
    #[arg(short, long, required_unless_present = "list")]
    to: Option<PathBuf>,

    /// Download a single favicon: `{width}x{height}` for the closest
    /// resolution, `maxres` or `svg` for the highest. All favicons are
    /// downloaded when omitted
    #[arg(short, long)]
    size: Option<SizeRequest>,

    /// Only download favicons whose file does not already exist
    #[arg(long)]
    only_missing: bool,

    /// Suffix the written file names with the icon file name
    #[arg(long)]
    suffix: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Output debugging information
    #[arg(long)]
    debug: bool,

    /// List the favicon links declared by the website without downloading
    #[arg(long)]
    list: bool,
}

impl Args {
    fn log_level(&self) -> LevelFilter {
        if self.debug {
            LevelFilter::DEBUG
        } else if self.verbose {
            LevelFilter::INFO
        } else {
            LevelFilter::WARN
        }
    }
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    // Load environment variables
    _ = dotenvy::dotenv();

    // Setup colorful error logging
    color_eyre::install()?;

    let args = Args::parse();

    let format = LoggingFormat::from_env()?;
    init_logging(format, args.log_level());

    let config = FaviconLoaderConfig::from_env().context("failed to load configuration")?;
    let loader = FaviconLoader::from_config(config)
        .context("failed to create http client")?
        .with_observer(TracingObserver);

    if args.list {
        let favicons = loader.get_favicon_links(&args.url).await?;
        for favicon in favicons {
            println!("{favicon}");
        }
        return Ok(());
    }

    let Some(to) = args.to else {
        return Err(eyre::eyre!("please specify a destination directory"));
    };

    let options = DownloadOptions {
        size: args.size.unwrap_or_default(),
        skip_existing: args.only_missing,
        suffix: args.suffix,
    };

    let favicons = loader.download(&args.url, &to, options).await?;
    println!("{} favicons downloaded", favicons.len());

    Ok(())
}
