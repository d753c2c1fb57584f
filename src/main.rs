// main.rs
mod cli;
mod commands;
mod config;
mod flavor;
mod mood;
mod persona;
mod provider;
mod reconcile;
mod runner;
mod session;
mod snapshot;
mod stats;
mod status;
mod store;

use clap::Parser;
use cli::{Args, Commands};
use config::Config;

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let mut config = match Config::load(args.data_dir.clone()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Config error: {:#}", e);
            std::process::exit(1);
        }
    };
    if let Some(user) = &args.user {
        config.user_name = user.clone();
    }

    let persona = match commands::resolve_persona(&args) {
        Ok(persona) => persona,
        Err(e) => {
            eprintln!("❌ {}", e);
            std::process::exit(1);
        }
    };

    let result = match args.command {
        Commands::Status => commands::handle_status(&config, persona).await,
        Commands::Do { ref action } => commands::handle_do(&config, persona, action).await,
        Commands::Run => commands::handle_run(&config, persona).await,
        Commands::Reset => commands::handle_reset(&config, persona),
    };

    if let Err(e) = result {
        eprintln!("❌ {:#}", e);
        std::process::exit(1);
    }
}
