//! Library listing commands

use std::time::Duration;

use anyhow::Result;
use clap::Subcommand;

use crate::cli::Context;
use crate::cli::output::{print_error, print_output, print_success};
use shelf::poller::FetchSource;
use shelf::state::StateEvent;

/// How long `show` waits for the first fetch of each source
const FIRST_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Subcommand, Debug)]
pub enum LibraryCommands {
    /// Show the library once
    Show {
        /// Page of the library grid to show
        #[arg(long, default_value_t = 1)]
        page: usize,
    },

    /// Print the library every time it changes
    Watch {
        /// Stop after this many changes
        #[arg(long)]
        changes: Option<usize>,
    },
}

pub async fn run(command: LibraryCommands, ctx: &Context) -> Result<()> {
    match command {
        LibraryCommands::Show { page } => show(page, ctx).await,
        LibraryCommands::Watch { changes } => watch(changes, ctx).await,
    }
}

async fn show(page: usize, ctx: &Context) -> Result<()> {
    let mut view = ctx.view()?;
    report(&view.activate().await);

    let first_fetches = async {
        while !FetchSource::ALL
            .iter()
            .all(|source| view.library().has_reported(*source))
        {
            match view.next_update().await {
                Some(events) => report(&events),
                None => break,
            }
        }
    };
    let timed_out = tokio::time::timeout(FIRST_FETCH_TIMEOUT, first_fetches)
        .await
        .is_err();
    if timed_out {
        print_error("Timed out waiting for the library; showing what has arrived");
    }

    let shown = view.go_to_page(page);
    if shown != page {
        tracing::warn!("Page {} is out of range, showing page {}", page, shown);
    }

    print_output(&view.snapshot(), ctx.format);
    view.deactivate();
    Ok(())
}

async fn watch(changes: Option<usize>, ctx: &Context) -> Result<()> {
    let mut view = ctx.view()?;
    report(&view.activate().await);
    print_success("Watching library (Ctrl+C to stop)", ctx.quiet);

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let mut printed = 0usize;

    loop {
        tokio::select! {
            update = view.next_update() => {
                let Some(events) = update else {
                    break;
                };
                report(&events);
                if events.contains(&StateEvent::LibraryChanged) {
                    print_output(&view.snapshot(), ctx.format);
                    printed += 1;
                    if changes.is_some_and(|limit| printed >= limit) {
                        break;
                    }
                }
            }
            _ = &mut ctrl_c => {
                tracing::info!("Interrupted");
                break;
            }
        }
    }

    view.deactivate();
    Ok(())
}

/// Surface reported errors on stderr
fn report(events: &[StateEvent]) {
    for event in events {
        if let StateEvent::LogError(msg) = event {
            print_error(msg);
        }
    }
}
