use std::time::Duration;

use anyhow::Result;
use chrono::Utc;
use colored::*;
use tokio::sync::mpsc;

use crate::provider::{CompletionError, TextCompletionClient};
use crate::session::GotchiSession;
use crate::status::format_tick_line;

/// Stat reconciliation cadence while a live session is open.
const STAT_TICK: Duration = Duration::from_secs(5);
/// Random message display cadence.
const MESSAGE_TICK: Duration = Duration::from_secs(45);

struct FetchDone {
    generation: u64,
    result: Result<String, CompletionError>,
}

/// Live session loop: two periodic timers plus a channel carrying results
/// of spawned flavor fetches. The tick loop never blocks on the network;
/// at most one fetch is in flight (enforced by the session's busy flag),
/// and ctrl-c tears the session down with a final persistence write.
pub async fn run_live(mut session: GotchiSession, client: TextCompletionClient) -> Result<()> {
    let persona = session.persona();
    println!(
        "{} (ctrl-c to stop)",
        format!("Live session with {} started", persona).cyan().bold()
    );

    let (tx, mut rx) = mpsc::unbounded_channel::<FetchDone>();
    let mut stat_tick = tokio::time::interval(STAT_TICK);
    let mut message_tick = tokio::time::interval(MESSAGE_TICK);
    // The first interval tick fires immediately; consume both so the loop
    // starts on a clean cadence.
    stat_tick.tick().await;
    message_tick.tick().await;

    spawn_fetch_if_wanted(&mut session, &client, &tx);

    loop {
        tokio::select! {
            _ = stat_tick.tick() => {
                let state = session.tick(Utc::now());
                println!("{}", format_tick_line(persona, &state));
                spawn_fetch_if_wanted(&mut session, &client, &tx);
            }
            _ = message_tick.tick() => {
                // Reconcile before drawing so the nap check and the mood
                // behind the line reflect the current instant, not the
                // last stat tick.
                let state = session.tick(Utc::now());
                if !state.is_napping {
                    let line = session.next_line();
                    println!("{} {}", persona.to_string().magenta().bold(), format!("「{}」", line).magenta());
                }
                spawn_fetch_if_wanted(&mut session, &client, &tx);
            }
            Some(done) = rx.recv() => {
                session.apply_flavor(done.generation, done.result);
            }
            _ = tokio::signal::ctrl_c() => {
                println!("\n{}", "Saving and shutting down...".cyan());
                session.teardown(Utc::now());
                break;
            }
        }
    }

    Ok(())
}

fn spawn_fetch_if_wanted(
    session: &mut GotchiSession,
    client: &TextCompletionClient,
    tx: &mpsc::UnboundedSender<FetchDone>,
) {
    if let Some(pending) = session.flavor_request() {
        let client = client.clone();
        let tx = tx.clone();
        tokio::spawn(async move {
            let result = client.complete(&pending.request).await;
            // The receiver may be gone if the loop already exited; the
            // response is simply dropped then.
            let _ = tx.send(FetchDone {
                generation: pending.generation,
                result,
            });
        });
    }
}
