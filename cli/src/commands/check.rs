use colored::*;
use egress_common::error::Rejection;
use egress_common::success;
use egress_core::guard::{OutboundGuard, ValidatedTarget};
use tracing::warn;

use crate::terminal::{colors, print};

/// Runs the guard and prints the verdict. Returns the target when it was accepted.
pub async fn check(url: &str, guard: &OutboundGuard) -> Option<ValidatedTarget> {
    print::header("outbound guard");
    print::aligned_line("Input", url.to_string());

    match guard.check(url).await {
        Ok(validated) => {
            print_accepted(&validated);
            success!("{} may be fetched", validated.url());
            Some(validated)
        }
        Err(rejection) => {
            report_rejection(&rejection);
            None
        }
    }
}

fn print_accepted(validated: &ValidatedTarget) {
    let target = validated.target();
    print::aligned_line("Scheme", target.scheme().to_string());
    print::aligned_line("Host", target.host().to_string());
    print::aligned_line("Port", target.port().to_string());
    print::aligned_line("Verdict", "accepted".color(colors::PRIMARY).bold());
    print::as_tree_one_level(validated.addrs().iter().map(print::addr_to_detail).collect());
}

/// Logs the operator detail and shows what the end user would be told.
fn report_rejection(rejection: &Rejection) {
    warn!(kind = %rejection.kind(), "{rejection}");
    print::aligned_line(
        "Verdict",
        rejection.kind().to_string().color(colors::DENIED).bold(),
    );
    print::aligned_line("User sees", rejection.user_message());
}
