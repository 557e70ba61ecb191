//! # cms-admin
//!
//! Command-line front end for the content admin. Each invocation restores
//! the saved session, runs one view behind the session guard and writes the
//! session back.

mod cli;
mod commands;
mod logging;
mod render;
mod session_file;

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use auth_adapters::SupabaseAuth;
use clap::Parser;
use configs::Settings;
use services::{AppContext, ServiceError};
use storage_adapters::{BucketStore, Connection, RestRecordStore};

use crate::cli::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    // 1. Settings and logging
    let settings = Settings::load(&cli.config)
        .with_context(|| format!("loading settings from {}", cli.config.display()))?;
    logging::init(&settings.log);

    // 2. Backend connection and identity, with the last session restored
    let conn = Connection::new(&settings.backend.url, settings.backend.anon_key)?;
    let auth = Arc::new(SupabaseAuth::new(conn.clone()));
    if let Some(session) = session_file::load(&settings.session.file).await? {
        auth.restore(session);
    }

    // 3. Wire the services
    let app = AppContext::new(
        Arc::new(RestRecordStore::new(conn.clone())),
        Arc::new(BucketStore::new(conn)),
        auth.clone(),
    );

    let outcome = commands::dispatch(&app, cli.command).await;
    let code = match outcome {
        Ok(out) => {
            print!("{out}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            match err.downcast_ref::<ServiceError>() {
                Some(service) => eprintln!("{}", render::error(service)),
                None => eprintln!("error: {err:#}"),
            }
            ExitCode::FAILURE
        }
    };

    // 4. Persist whatever session the command left behind
    session_file::store(&settings.session.file, auth.session().as_ref()).await?;
    app.shutdown();

    Ok(code)
}
