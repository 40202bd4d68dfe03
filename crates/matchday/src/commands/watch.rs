//! `watch`: follow one match's snapshot over the push channel.

use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, warn};

use matchday_core::{CoreError, LiveConfig, LiveService, SubscriptionKey};

use crate::cli::{OutputFormat, WatchArgs};
use crate::error::CliError;
use crate::output::{self, Printer};

pub async fn handle(args: WatchArgs, config: LiveConfig, printer: Printer) -> Result<(), CliError> {
    let service = LiveService::from_config(config)?;
    let key = SubscriptionKey::new(args.match_id.clone(), args.sport.into());
    service.connect().await?;

    let result = follow(&service, key, &args, printer).await;
    service.shutdown().await;
    result
}

async fn follow(
    service: &LiveService,
    key: SubscriptionKey,
    args: &WatchArgs,
    printer: Printer,
) -> Result<(), CliError> {
    // Initial render from REST; pushes take over from here.
    match service.load_match(&key).await {
        Ok(snapshot) => {
            printer.print(&printer.render(snapshot.as_ref(), |s| output::snapshot_text(s, printer.color))?);
        }
        Err(CoreError::MatchNotFound { match_id }) => return Err(CliError::NotFound { match_id }),
        Err(e) => warn!(error = %e, "Initial load failed, waiting for live updates"),
    }

    let mut subscription = service.watch_match(key);
    let mut state = service.state();
    let mut events = service.events();
    let show_state = printer.format == OutputFormat::Text;
    let mut updates = 0usize;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => return Ok(()),
            changed = subscription.changed() => match changed {
                Some(Some(snapshot)) => {
                    printer.print(&printer.render(snapshot.as_ref(), |s| output::snapshot_text(s, printer.color))?);
                    updates += 1;
                    if args.count.is_some_and(|n| updates >= n) {
                        return Ok(());
                    }
                }
                Some(None) => debug!("Snapshot evicted"),
                None => return Ok(()),
            },
            changed = state.changed(), if show_state => {
                if changed.is_err() {
                    return Ok(());
                }
                let current = state.borrow_and_update().clone();
                printer.print(&output::state_text(&current, printer.color));
            }
            event = events.recv(), if args.events => match event {
                Ok(event) if event.match_id().is_none_or(|id| id == args.match_id) => {
                    printer.print(&printer.render(&event, |e| output::event_text(e, printer.color))?);
                }
                Ok(_) => {}
                Err(RecvError::Lagged(skipped)) => debug!(skipped, "Event receiver lagged"),
                Err(RecvError::Closed) => return Ok(()),
            },
        }
    }
}
