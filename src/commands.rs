use std::str::FromStr;

use anyhow::Result;
use chrono::Utc;
use colored::*;

use crate::cli::Args;
use crate::config::Config;
use crate::mood::{Action, ActionOutcome};
use crate::persona::Persona;
use crate::provider::TextCompletionClient;
use crate::reconcile::StdDice;
use crate::runner;
use crate::session::GotchiSession;
use crate::status::print_render_state;
use crate::store::{FileKvStore, KvStore, StorageKey};

fn open_session(config: &Config, persona: Persona) -> GotchiSession {
    let user_name = config.user_name.clone();
    let store = Box::new(FileKvStore::new(config.data_dir.clone()));
    GotchiSession::initialize(
        persona,
        user_name,
        &config.storage_namespace,
        store,
        Box::new(StdDice),
        Utc::now(),
    )
}

/// Fetches one batch of flavor text inline for one-shot commands. Any
/// failure silently leaves the session on fallback lines.
async fn refresh_flavor(session: &mut GotchiSession, client: &TextCompletionClient) {
    if let Some(pending) = session.flavor_request() {
        let result = client.complete(&pending.request).await;
        session.apply_flavor(pending.generation, result);
    }
}

pub async fn handle_status(config: &Config, persona: Persona) -> Result<()> {
    let client = TextCompletionClient::new(&config.provider);
    let mut session = open_session(config, persona);

    refresh_flavor(&mut session, &client).await;
    let state = session.render();
    print_render_state(persona, &state);
    session.teardown(Utc::now());
    Ok(())
}

pub async fn handle_do(config: &Config, persona: Persona, action_name: &str) -> Result<()> {
    let action = Action::from_str(action_name)?;
    let client = TextCompletionClient::new(&config.provider);
    let mut session = open_session(config, persona);

    let outcome = session.perform_action(action, Utc::now());
    match outcome {
        ActionOutcome::Applied => {
            println!("{}", format!("{} ♡", action).green());
        }
        ActionOutcome::IncidentResolved => {
            println!(
                "{}",
                "All cleaned up! She seems very relieved.".green().bold()
            );
        }
        ActionOutcome::Blocked(reason) => {
            println!("{} {}", "Can't do that:".yellow(), reason);
        }
    }

    refresh_flavor(&mut session, &client).await;
    let state = session.render();
    print_render_state(persona, &state);
    session.teardown(Utc::now());
    Ok(())
}

pub async fn handle_run(config: &Config, persona: Persona) -> Result<()> {
    let client = TextCompletionClient::new(&config.provider);
    let session = open_session(config, persona);
    runner::run_live(session, client).await
}

pub fn handle_reset(config: &Config, persona: Persona) -> Result<()> {
    let store = FileKvStore::new(config.data_dir.clone());
    let key = StorageKey::new(&config.storage_namespace, persona);
    store.remove(&key)?;
    println!("{} {}", "Removed saved state for".cyan(), persona);
    Ok(())
}

pub fn resolve_persona(args: &Args) -> Result<Persona> {
    Persona::from_str(&args.persona)
}
