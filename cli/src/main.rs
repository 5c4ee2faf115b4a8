mod commands;
mod terminal;

use std::process::ExitCode;

use commands::{CommandLine, Commands, check, fetch};
use egress_core::fetch::PinnedFetcher;
use egress_core::guard::OutboundGuard;
use terminal::logging;
use tracing::debug;

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let commands = CommandLine::parse_args();

    logging::init(commands.verbose, commands.quiet);

    let guard = OutboundGuard::with_system_resolver(commands.policy.guard_config());
    debug!("deny-list: {}", guard.deny_list());

    let ok: bool = match commands.command {
        Commands::Check { url } => check::check(&url, &guard).await.is_some(),
        Commands::Fetch { url, json } => {
            let fetcher = PinnedFetcher::new(guard.clone(), commands.policy.fetch_config());
            fetch::fetch(&url, &guard, &fetcher, json).await?
        }
    };

    Ok(if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}
