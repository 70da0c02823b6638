use std::path::PathBuf;

use clap::Parser;
use piral_debug::KeyMap;
use tracing_subscriber::EnvFilter;

/// piral-debug - interactive shell for a Piral host instance
#[derive(Parser, Debug)]
#[command(name = "piral-debug")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Instance configuration (JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Force vi editing mode
    #[arg(long)]
    vi: bool,

    /// Force emacs editing mode
    #[arg(long, conflicts_with = "vi")]
    emacs: bool,
}

fn main() {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let keys = if args.vi {
        KeyMap::Vi
    } else if args.emacs {
        KeyMap::Emacs
    } else {
        KeyMap::from_env()
    };

    let result = piral_debug::load_config(args.config.as_deref())
        .and_then(|config| piral_debug::run(config, keys));
    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
