//! `commentary`: print the merged feed, once or following it.

use std::time::Duration;

use tracing::warn;

use matchday_core::{CommentaryView, FeedItem, FeedState, LiveConfig, LiveService, MergedCommentaryFeed};

use crate::cli::{CommentaryArgs, InningsArg};
use crate::error::CliError;
use crate::output::{self, Printer};

pub async fn handle(args: CommentaryArgs, config: LiveConfig, printer: Printer) -> Result<(), CliError> {
    let interval = args
        .interval
        .map_or(config.commentary_poll_interval, Duration::from_secs);
    let service = LiveService::from_config(config)?;
    let view = service.commentary_view(args.match_id.clone());

    if args.follow {
        follow(&view, &args, interval, printer).await
    } else {
        let state = view.refresh().await;
        print_state(&state, &args, printer)?;
        Ok(())
    }
}

async fn follow(
    view: &CommentaryView,
    args: &CommentaryArgs,
    interval: Duration,
    printer: Printer,
) -> Result<(), CliError> {
    let mut state = view.state();
    view.start_polling(interval);
    let mut last_printed: Option<Vec<FeedItem>> = None;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => return Ok(()),
            changed = state.changed() => {
                if changed.is_err() {
                    return Ok(());
                }
                let current = state.borrow_and_update().clone();
                if let FeedState::Ready(ref feed) = current {
                    let items = select(feed, args);
                    if last_printed.as_deref() == Some(items.as_slice()) {
                        continue;
                    }
                    last_printed = Some(items);
                }
                print_state(&current, args, printer)?;
            }
        }
    }
}

/// Print a ready feed; turn terminal states into errors.
fn print_state(state: &FeedState, args: &CommentaryArgs, printer: Printer) -> Result<(), CliError> {
    match state {
        FeedState::Ready(feed) => {
            let items = select(feed, args);
            printer.print(&printer.render(items.as_slice(), |items| output::feed_text(items, printer.color))?);
            Ok(())
        }
        FeedState::NotFound => Err(CliError::NotFound {
            match_id: args.match_id.clone(),
        }),
        FeedState::Failed { message, retryable, .. } => {
            if args.follow && *retryable {
                warn!(%message, "Commentary refresh failed, retrying");
                Ok(())
            } else {
                Err(CliError::ApiError {
                    message: message.clone(),
                })
            }
        }
        FeedState::Loading => Ok(()),
    }
}

fn select(feed: &MergedCommentaryFeed, args: &CommentaryArgs) -> Vec<FeedItem> {
    let items = match args.innings {
        InningsArg::All => &feed.items,
        InningsArg::First => &feed.first_innings,
        InningsArg::Second => &feed.second_innings,
    };
    let limit = args.limit.unwrap_or(items.len());
    items.iter().take(limit).cloned().collect()
}
