use std::sync::Arc;

use anyhow::{anyhow, Context};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use stockfolio_client::{ApiClient, ApiError, ClientConfig, PortfolioQueries, QueryCache};
use stockfolio_core::constants::{DASHBOARD_ROUTE, LOGIN_ROUTE};
use stockfolio_core::portfolio::allocation::allocation_by_symbol;
use stockfolio_core::portfolios::Portfolio;
use stockfolio_core::session::{AuthSession, Navigator};
use stockfolio_core::users::{LoginRequest, User};

use crate::config::Config;
use crate::navigator::TerminalNavigator;
use crate::render::render_dashboard;
use crate::secrets::FileSecretStore;

pub struct AppState {
    pub session: Arc<AuthSession>,
    pub navigator: Arc<TerminalNavigator>,
    pub queries: PortfolioQueries,
}

pub fn init_tracing() {
    let log_format = std::env::var("SF_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    // Logs go to stderr so the rendered dashboard on stdout stays clean
    if log_format.eq_ignore_ascii_case("json") {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_line_number(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

pub fn build_state(config: &Config) -> anyhow::Result<AppState> {
    let store = FileSecretStore::open(config.secret_file.clone(), config.secret_key.as_deref())
        .map_err(anyhow::Error::new)?;
    tracing::debug!(
        "Session file: {} (encrypted: {})",
        config.secret_file.display(),
        store.is_encrypted()
    );

    let session = Arc::new(AuthSession::new(Arc::new(store)));
    let restored = session.hydrate().context("Failed to load the saved session")?;
    if restored {
        tracing::info!("Restored saved session");
    }

    let navigator = Arc::new(TerminalNavigator::new(if restored {
        DASHBOARD_ROUTE
    } else {
        LOGIN_ROUTE
    }));

    let client_config = ClientConfig::new(&config.api_url).with_timeout(config.request_timeout);
    let api = ApiClient::new(&client_config, session.clone(), navigator.clone())?;
    let queries = PortfolioQueries::new(
        Arc::new(api),
        session.clone(),
        QueryCache::new(client_config.stale_times),
    );

    Ok(AppState {
        session,
        navigator,
        queries,
    })
}

/// Turns an API failure into a message fit for the terminal.
fn describe(err: ApiError) -> anyhow::Error {
    let payload = err.payload();
    let mut message = payload.message;
    for (field, problem) in &payload.field_errors {
        message.push_str(&format!("\n  {}: {}", field, problem));
    }
    if payload.retryable {
        message.push_str("\nThe backend may be unavailable; try again shortly.");
    }
    anyhow!(message)
}

async fn sign_in(state: &AppState, config: &Config) -> anyhow::Result<User> {
    let (Some(username), Some(password)) = (&config.username, &config.password) else {
        return Err(anyhow!(
            "Not signed in. Set SF_USERNAME and SF_PASSWORD to sign in."
        ));
    };

    let response = state
        .queries
        .login(&LoginRequest {
            username: username.clone(),
            password: password.clone(),
        })
        .await
        .map_err(describe)?;
    state.navigator.navigate(DASHBOARD_ROUTE);
    tracing::info!("Signed in as {}", response.user.display_name());
    Ok(response.user)
}

async fn current_user(state: &AppState, config: &Config) -> anyhow::Result<User> {
    if let Some(user) = state.session.current_user() {
        return Ok(user);
    }
    if state.session.is_authenticated() {
        // Token restored but the user record was missing or unreadable
        tracing::warn!("Saved session has no readable user record, signing out");
        state.queries.logout().map_err(describe)?;
        state.navigator.navigate(LOGIN_ROUTE);
        return sign_in(state, config)
            .await
            .map_err(|e| anyhow!("The saved user record could not be read. {}", e));
    }
    sign_in(state, config).await
}

/// Requested portfolio if listed, else the default, else the first one.
pub fn select_portfolio(
    portfolios: &[Portfolio],
    default: Option<Portfolio>,
    requested: Option<&str>,
) -> Option<Portfolio> {
    if let Some(id) = requested {
        if let Some(found) = portfolios.iter().find(|p| p.id == id) {
            return Some(found.clone());
        }
        tracing::warn!("Portfolio {} not found, showing the default portfolio", id);
    }
    default
        .or_else(|| portfolios.iter().find(|p| p.is_default).cloned())
        .or_else(|| portfolios.first().cloned())
}

async fn load_dashboard(
    state: &AppState,
    config: &Config,
    user: &User,
) -> Result<String, ApiError> {
    let queries = &state.queries;
    let (portfolios, default) = futures::try_join!(
        queries.portfolios(&user.id),
        queries.default_portfolio(&user.id)
    )?;

    let Some(portfolio) = select_portfolio(&portfolios, default, config.portfolio_id.as_deref())
    else {
        return Ok("No portfolios yet.\n".to_string());
    };

    let summary = queries
        .holdings_summary(&user.id, &portfolio.id, &config.sort)
        .await?;
    let allocation = allocation_by_symbol(&summary);
    Ok(render_dashboard(
        &portfolio,
        &portfolios,
        &summary,
        &allocation,
        &config.sort,
    ))
}

pub async fn run(state: &AppState, config: &Config) -> anyhow::Result<String> {
    let user = current_user(state, config).await?;
    match load_dashboard(state, config, &user).await {
        Ok(output) => Ok(output),
        // A saved token the backend no longer accepts; the session is already cleared
        Err(ApiError::Unauthorized(_)) if state.navigator.on_login_route() => {
            let user = sign_in(state, config).await?;
            load_dashboard(state, config, &user).await.map_err(describe)
        }
        Err(e) => Err(describe(e)),
    }
}
