use std::time::Instant;

use colored::*;
use egress_common::success;
use egress_core::extract::PageSummary;
use egress_core::fetch::{FetchedPage, PinnedFetcher};
use egress_core::guard::OutboundGuard;
use tracing::{error, info};

use crate::commands::check;
use crate::terminal::{colors, print};

type Detail = (String, ColoredString);

/// Guards, fetches and summarizes `url`. Returns whether a page was summarized.
pub async fn fetch(
    url: &str,
    guard: &OutboundGuard,
    fetcher: &PinnedFetcher,
    json: bool,
) -> anyhow::Result<bool> {
    let Some(validated) = check::check(url, guard).await else {
        return Ok(false);
    };

    info!("Fetching {} via {}", validated.url(), validated.addr());
    let start_time: Instant = Instant::now();

    let page: FetchedPage = match fetcher.fetch(validated).await {
        Ok(page) => page,
        Err(e) => {
            let message: &str = e.user_message();
            error!("{:#}", anyhow::Error::from(e));
            print::aligned_line("User sees", message);
            return Ok(false);
        }
    };

    success!(
        "{} answered {} in {:.2}s",
        page.url,
        page.status,
        start_time.elapsed().as_secs_f64()
    );

    let summary: PageSummary = PageSummary::extract(&page.body);

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_page(&page, &summary);
    }
    Ok(true)
}

fn print_page(page: &FetchedPage, summary: &PageSummary) {
    print::header("fetched page");
    print::aligned_line("URL", page.url.to_string());
    if let Some(addr) = page.remote_addr {
        print::aligned_line("Peer", addr.to_string());
    }
    print::aligned_line("Redirects", page.redirects.to_string());
    if page.truncated {
        print::aligned_line("Body", "truncated".color(colors::ACCENT));
    }

    print::header("page summary");
    print::aligned_line("Title", summary.title.clone());
    print::aligned_line("Meta", summary.meta_description.clone());
    print::aligned_line("CTA", if summary.has_cta { "yes" } else { "no" });

    let headings: Vec<Detail> = summary
        .h1
        .iter()
        .map(|h| ("h1".to_string(), h.as_str().normal()))
        .chain(summary.h2.iter().map(|h| ("h2".to_string(), h.as_str().normal())))
        .collect();
    if !headings.is_empty() {
        print::as_tree_one_level(headings);
    }

    print::fat_separator();
    print::print(&summary.body_text);
}
