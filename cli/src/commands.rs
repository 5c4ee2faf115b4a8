pub mod check;
pub mod fetch;

use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use egress_common::config::{FetchConfig, GuardConfig};
use egress_common::network::range::{DenyList, IpNetwork};

#[derive(Parser)]
#[command(name = "egress")]
#[command(about = "Checks and fetches user-supplied URLs without letting them reach internal networks.")]
pub struct CommandLine {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub policy: PolicyArgs,

    /// Only print warnings, errors and results
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Show debug output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Decide whether a URL may be fetched
    #[command(alias = "c")]
    Check { url: String },
    /// Check a URL, fetch it through the checked address and summarize the page
    #[command(alias = "f")]
    Fetch {
        url: String,
        /// Print the page summary as JSON on stdout
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args)]
pub struct PolicyArgs {
    /// Deny an additional range (CIDR), may be repeated
    #[arg(long = "deny", value_name = "CIDR", global = true)]
    pub deny: Vec<IpNetwork>,

    /// Remove a listed range (CIDR), may be repeated
    #[arg(long = "allow", value_name = "CIDR", global = true)]
    pub allow: Vec<IpNetwork>,

    /// Start from the six core private ranges instead of the full reserved set
    #[arg(long, global = true)]
    pub minimal: bool,

    /// DNS lookup budget in milliseconds
    #[arg(long, value_name = "MS", default_value_t = 3000, global = true)]
    pub resolve_timeout: u64,

    /// Total request budget in seconds
    #[arg(long, value_name = "SECS", default_value_t = 8, global = true)]
    pub timeout: u64,

    /// Redirect hops to follow
    #[arg(long, default_value_t = egress_common::config::DEFAULT_MAX_REDIRECTS, global = true)]
    pub max_redirects: usize,
}

impl CommandLine {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

impl PolicyArgs {
    pub fn guard_config(&self) -> GuardConfig {
        let base: DenyList = if self.minimal {
            DenyList::minimal()
        } else {
            DenyList::default()
        };
        let deny_list: DenyList = self.deny.iter().copied().fold(base, DenyList::with);
        let deny_list: DenyList = self.allow.iter().copied().fold(deny_list, DenyList::without);

        GuardConfig {
            deny_list,
            resolve_timeout: Duration::from_millis(self.resolve_timeout),
        }
    }

    pub fn fetch_config(&self) -> FetchConfig {
        FetchConfig {
            timeout: Duration::from_secs(self.timeout),
            max_redirects: self.max_redirects,
            ..FetchConfig::default()
        }
    }
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
