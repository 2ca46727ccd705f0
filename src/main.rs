//! Lockscreen Widgets - headless overlay driver
//!
//! This is the binary entry point. All logic lives in the library.

use std::path::PathBuf;

use clap::Parser;
use color_eyre::eyre::Result;

/// Lockscreen Widgets - drive the lock screen overlay from a script
#[derive(Parser, Debug)]
#[command(name = "lsw")]
#[command(about = "Drive the lock screen widget overlay and report what it does", long_about = None)]
struct Args {
    /// Project directory holding `.lsw/`
    #[arg(long, value_name = "PATH")]
    project: Option<PathBuf>,

    /// Read commands from this file instead of stdin
    #[arg(long, value_name = "FILE")]
    script: Option<PathBuf>,

    /// Create `.lsw/config.toml` with defaults and exit
    #[arg(long)]
    init: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let args = Args::parse();

    lsw_core::logging::init()?;

    let project = args
        .project
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));

    if args.init {
        lsw_app::config::init_config_dir(&project)?;
        eprintln!("Initialized {}", project.join(lsw_app::config::LSW_DIR).display());
        return Ok(());
    }

    lockscreen_widgets::run_headless(&project, args.script.as_deref()).await?;
    Ok(())
}
