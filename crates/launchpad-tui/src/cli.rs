use std::path::PathBuf;

use clap::Parser;
use launchpad_core::SortMode;

/// Browse, search and launch the games of a launcher site.
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "launchpad", author, version, about, long_about = None)]
pub struct Args {
    /// Directory or URL hosting the launcher site (defaults to the current directory)
    #[arg(long, env = "LAUNCHPAD_BASE")]
    pub base: Option<String>,

    /// Manifest file used as the inline manifest instead of the hosting page
    #[arg(long, value_name = "FILE")]
    pub manifest: Option<PathBuf>,

    /// Initial sort order: recent, alpha or plays
    #[arg(long)]
    pub sort: Option<SortMode>,

    /// Initial search text
    #[arg(long, default_value = "")]
    pub query: String,

    /// Talk to the site directly instead of through the offline asset cache
    #[arg(long)]
    pub no_offline_cache: bool,

    /// Install the core assets into the offline cache and exit
    #[arg(long)]
    pub install_cache: bool,
}
