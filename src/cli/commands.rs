//! Command execution.
//!
//! Runs a parsed [`Cli`] against the backend and writes results to a writer,
//! so the same code drives stdout in `main` and a buffer in tests.

use std::io::Write;
use std::ops::ControlFlow;

use zhicuoti_core::CoreError;

use crate::cli::parser::{Cli, Commands};
use crate::models::settings::AppConfig;
use crate::services::analysis::{AnalysisView, ViewOutcome};
use crate::state::AppState;
use crate::storage::config::ConfigService;
use crate::utils::error::{AppError, AppResult};

/// Load the effective configuration: file, then environment, then flags.
pub fn load_config(cli: &Cli) -> AppResult<AppConfig> {
    load_config_with(cli, |key| std::env::var(key).ok())
}

/// Like [`load_config`] with an explicit environment lookup. The merged
/// result is validated once, after every override is applied.
pub fn load_config_with<F>(cli: &Cli, env: F) -> AppResult<AppConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let service = match &cli.config {
        Some(path) => ConfigService::open(path)?,
        None => ConfigService::new()?,
    };
    let mut config = service.effective_config_with(env);
    if let Some(base_url) = &cli.base_url {
        config.base_url = base_url.clone();
    }
    if let Some(decode) = cli.decode {
        config.decode_mode = decode.into();
    }
    config.validate().map_err(AppError::config)?;
    Ok(config)
}

/// Execute a command with an already loaded configuration.
pub async fn execute<W>(cli: &Cli, config: AppConfig, out: &mut W) -> AppResult<()>
where
    W: Write + Send,
{
    if let Commands::Config = cli.command {
        writeln!(out, "{}", serde_json::to_string_pretty(&config)?)?;
        return Ok(());
    }

    let state = AppState::from_config(config)?;

    match &cli.command {
        Commands::Login { phone, password } => {
            let session = state.login(phone, password).await?;
            writeln!(out, "{}", session.token())?;
        }
        Commands::Me => {
            let session = state.resume(require_token(cli)?).await?;
            let user = session
                .user()
                .ok_or_else(|| CoreError::not_authenticated("token has no user"))?;
            writeln!(out, "{}", serde_json::to_string_pretty(user)?)?;
        }
        command => {
            let Some(target) = command.analysis_target() else {
                return Ok(());
            };
            let session = state.resume(require_token(cli)?).await?;
            let mut view = AnalysisView::new(target);
            stream_view(&state, &session, &mut view, out).await?;
        }
    }
    Ok(())
}

fn require_token(cli: &Cli) -> AppResult<&str> {
    cli.token.as_deref().ok_or_else(|| {
        CoreError::not_authenticated("pass --token or set ZHICUOTI_TOKEN (see `zhicuoti login`)")
            .into()
    })
}

/// Open `view` and write each increment to `out` as it arrives.
async fn stream_view<W>(
    state: &AppState,
    session: &zhicuoti_core::SessionContext,
    view: &mut AnalysisView,
    out: &mut W,
) -> AppResult<()>
where
    W: Write + Send,
{
    // A failed write (e.g. a closed pipe) stops reading the stream.
    let mut write_error: Option<std::io::Error> = None;
    let outcome = view
        .open_with(state.api(), session, |increment| {
            match out.write_all(increment.as_bytes()).and_then(|_| out.flush()) {
                Ok(()) => ControlFlow::Continue(()),
                Err(e) => {
                    write_error = Some(e);
                    ControlFlow::Break(())
                }
            }
        })
        .await?;

    if let Some(e) = write_error {
        return Err(e.into());
    }

    match outcome {
        ViewOutcome::Completed { .. } | ViewOutcome::Cached | ViewOutcome::Stopped { .. } => {
            writeln!(out)?;
            Ok(())
        }
        ViewOutcome::Unavailable { status } => {
            tracing::info!(status, "no analysis available");
            writeln!(out, "No analysis available (HTTP {})", status)?;
            Ok(())
        }
        ViewOutcome::MissingBody { notice } => Err(AppError::analysis(notice)),
        ViewOutcome::Failed { message } => {
            writeln!(out)?;
            Err(AppError::analysis(message))
        }
    }
}
