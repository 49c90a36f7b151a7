//! Typed endpoints of the portfolio backend.
//!
//! [`PortfolioApi`] is the seam the query layer talks to; [`ApiClient`] is the
//! HTTP implementation over [`HttpClient`].

use async_trait::async_trait;
use log::{debug, info};
use std::sync::Arc;

use stockfolio_core::portfolio::holdings::{Holding, HoldingInput};
use stockfolio_core::portfolios::{Portfolio, PortfolioInput};
use stockfolio_core::securities::{Security, SecurityInput};
use stockfolio_core::session::{AuthSession, Navigator};
use stockfolio_core::transactions::{Transaction, TransactionInput};
use stockfolio_core::users::{AuthResponse, LoginRequest, RegisterRequest};

use crate::config::ClientConfig;
use crate::error::{ApiError, Result};
use crate::http::{HttpClient, RequestAuth};

/// Operations exposed by the portfolio backend.
#[async_trait]
pub trait PortfolioApi: Send + Sync {
    // Auth
    async fn login(&self, request: &LoginRequest) -> Result<AuthResponse>;
    async fn register(&self, request: &RegisterRequest) -> Result<AuthResponse>;

    // Portfolios
    async fn list_portfolios(&self, user_id: &str) -> Result<Vec<Portfolio>>;
    async fn get_portfolio(&self, user_id: &str, portfolio_id: &str) -> Result<Portfolio>;
    /// `None` when the user has no default portfolio.
    async fn get_default_portfolio(&self, user_id: &str) -> Result<Option<Portfolio>>;
    async fn create_portfolio(&self, user_id: &str, input: &PortfolioInput) -> Result<Portfolio>;
    async fn update_portfolio(
        &self,
        user_id: &str,
        portfolio_id: &str,
        input: &PortfolioInput,
    ) -> Result<Portfolio>;
    async fn delete_portfolio(&self, user_id: &str, portfolio_id: &str) -> Result<()>;

    // Holdings
    async fn list_holdings(&self, user_id: &str, portfolio_id: &str) -> Result<Vec<Holding>>;
    async fn get_holding(
        &self,
        user_id: &str,
        portfolio_id: &str,
        holding_id: &str,
    ) -> Result<Holding>;
    async fn create_holding(
        &self,
        user_id: &str,
        portfolio_id: &str,
        input: &HoldingInput,
    ) -> Result<Holding>;
    async fn update_holding(
        &self,
        user_id: &str,
        portfolio_id: &str,
        holding_id: &str,
        input: &HoldingInput,
    ) -> Result<Holding>;
    async fn delete_holding(
        &self,
        user_id: &str,
        portfolio_id: &str,
        holding_id: &str,
    ) -> Result<()>;

    // Transactions
    async fn list_transactions(
        &self,
        user_id: &str,
        portfolio_id: &str,
        holding_id: &str,
    ) -> Result<Vec<Transaction>>;
    async fn create_transaction(
        &self,
        user_id: &str,
        portfolio_id: &str,
        holding_id: &str,
        input: &TransactionInput,
    ) -> Result<Transaction>;
    async fn update_transaction(
        &self,
        user_id: &str,
        portfolio_id: &str,
        holding_id: &str,
        transaction_id: &str,
        input: &TransactionInput,
    ) -> Result<Transaction>;
    async fn delete_transaction(
        &self,
        user_id: &str,
        portfolio_id: &str,
        holding_id: &str,
        transaction_id: &str,
    ) -> Result<()>;

    // Securities
    async fn search_securities(&self, query: &str) -> Result<Vec<Security>>;
    async fn get_or_create_security(&self, input: &SecurityInput) -> Result<Security>;
}

/// HTTP client for the portfolio backend.
///
/// # Example
///
/// ```ignore
/// let api = ApiClient::new(&ClientConfig::new("http://localhost:8080/api"), session, navigator)?;
/// api.login(&LoginRequest { username, password }).await?;
/// let portfolios = api.list_portfolios(&user_id).await?;
/// ```
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: HttpClient,
}

impl ApiClient {
    pub fn new(
        config: &ClientConfig,
        session: Arc<AuthSession>,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self> {
        Ok(Self {
            http: HttpClient::new(config, session, navigator)?,
        })
    }

    async fn authenticate(&self, path: &str, body: &impl serde::Serialize) -> Result<AuthResponse> {
        let response: AuthResponse = self.http.post(path, body, RequestAuth::Anonymous).await?;
        self.http
            .session()
            .sign_in(&response.token, response.user.clone())?;
        Ok(response)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Paths
// ─────────────────────────────────────────────────────────────────────────────

fn seg(id: &str) -> String {
    urlencoding::encode(id).into_owned()
}

fn portfolios_path(user_id: &str) -> String {
    format!("/users/{}/portfolios", seg(user_id))
}

fn portfolio_path(user_id: &str, portfolio_id: &str) -> String {
    format!("{}/{}", portfolios_path(user_id), seg(portfolio_id))
}

fn holdings_path(user_id: &str, portfolio_id: &str) -> String {
    format!("{}/holdings", portfolio_path(user_id, portfolio_id))
}

fn holding_path(user_id: &str, portfolio_id: &str, holding_id: &str) -> String {
    format!(
        "{}/{}",
        holdings_path(user_id, portfolio_id),
        seg(holding_id)
    )
}

fn transactions_path(user_id: &str, portfolio_id: &str, holding_id: &str) -> String {
    format!(
        "{}/transactions",
        holding_path(user_id, portfolio_id, holding_id)
    )
}

fn transaction_path(
    user_id: &str,
    portfolio_id: &str,
    holding_id: &str,
    transaction_id: &str,
) -> String {
    format!(
        "{}/{}",
        transactions_path(user_id, portfolio_id, holding_id),
        seg(transaction_id)
    )
}

#[async_trait]
impl PortfolioApi for ApiClient {
    // ─────────────────────────────────────────────────────────────────────────
    // Auth Endpoints
    // ─────────────────────────────────────────────────────────────────────────

    async fn login(&self, request: &LoginRequest) -> Result<AuthResponse> {
        request.validate()?;
        let response = self.authenticate("/auth/login", request).await?;
        info!("[Api] Logged in as {}", response.user.username);
        Ok(response)
    }

    async fn register(&self, request: &RegisterRequest) -> Result<AuthResponse> {
        request.validate()?;
        let response = self.authenticate("/auth/register", request).await?;
        info!("[Api] Registered {}", response.user.username);
        Ok(response)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Portfolio Endpoints
    // ─────────────────────────────────────────────────────────────────────────

    async fn list_portfolios(&self, user_id: &str) -> Result<Vec<Portfolio>> {
        let portfolios: Vec<Portfolio> = self.http.get(&portfolios_path(user_id)).await?;
        debug!("[Api] Fetched {} portfolios", portfolios.len());
        Ok(portfolios)
    }

    async fn get_portfolio(&self, user_id: &str, portfolio_id: &str) -> Result<Portfolio> {
        self.http.get(&portfolio_path(user_id, portfolio_id)).await
    }

    async fn get_default_portfolio(&self, user_id: &str) -> Result<Option<Portfolio>> {
        let path = format!("{}/default", portfolios_path(user_id));
        match self.http.get::<Option<Portfolio>>(&path).await {
            Ok(portfolio) => Ok(portfolio),
            Err(ApiError::NotFound(_)) => {
                debug!("[Api] User {} has no default portfolio", user_id);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    async fn create_portfolio(&self, user_id: &str, input: &PortfolioInput) -> Result<Portfolio> {
        input.validate()?;
        self.http
            .post(&portfolios_path(user_id), input, RequestAuth::Bearer)
            .await
    }

    async fn update_portfolio(
        &self,
        user_id: &str,
        portfolio_id: &str,
        input: &PortfolioInput,
    ) -> Result<Portfolio> {
        input.validate()?;
        self.http
            .put(&portfolio_path(user_id, portfolio_id), input)
            .await
    }

    async fn delete_portfolio(&self, user_id: &str, portfolio_id: &str) -> Result<()> {
        self.http
            .delete(&portfolio_path(user_id, portfolio_id))
            .await
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Holding Endpoints
    // ─────────────────────────────────────────────────────────────────────────

    async fn list_holdings(&self, user_id: &str, portfolio_id: &str) -> Result<Vec<Holding>> {
        let holdings: Vec<Holding> = self
            .http
            .get(&holdings_path(user_id, portfolio_id))
            .await?;
        debug!(
            "[Api] Fetched {} holdings for portfolio {}",
            holdings.len(),
            portfolio_id
        );
        Ok(holdings)
    }

    async fn get_holding(
        &self,
        user_id: &str,
        portfolio_id: &str,
        holding_id: &str,
    ) -> Result<Holding> {
        self.http
            .get(&holding_path(user_id, portfolio_id, holding_id))
            .await
    }

    async fn create_holding(
        &self,
        user_id: &str,
        portfolio_id: &str,
        input: &HoldingInput,
    ) -> Result<Holding> {
        input.validate()?;
        self.http
            .post(
                &holdings_path(user_id, portfolio_id),
                input,
                RequestAuth::Bearer,
            )
            .await
    }

    async fn update_holding(
        &self,
        user_id: &str,
        portfolio_id: &str,
        holding_id: &str,
        input: &HoldingInput,
    ) -> Result<Holding> {
        input.validate()?;
        self.http
            .put(&holding_path(user_id, portfolio_id, holding_id), input)
            .await
    }

    async fn delete_holding(
        &self,
        user_id: &str,
        portfolio_id: &str,
        holding_id: &str,
    ) -> Result<()> {
        self.http
            .delete(&holding_path(user_id, portfolio_id, holding_id))
            .await
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Transaction Endpoints
    // ─────────────────────────────────────────────────────────────────────────

    async fn list_transactions(
        &self,
        user_id: &str,
        portfolio_id: &str,
        holding_id: &str,
    ) -> Result<Vec<Transaction>> {
        self.http
            .get(&transactions_path(user_id, portfolio_id, holding_id))
            .await
    }

    async fn create_transaction(
        &self,
        user_id: &str,
        portfolio_id: &str,
        holding_id: &str,
        input: &TransactionInput,
    ) -> Result<Transaction> {
        input.validate()?;
        self.http
            .post(
                &transactions_path(user_id, portfolio_id, holding_id),
                input,
                RequestAuth::Bearer,
            )
            .await
    }

    async fn update_transaction(
        &self,
        user_id: &str,
        portfolio_id: &str,
        holding_id: &str,
        transaction_id: &str,
        input: &TransactionInput,
    ) -> Result<Transaction> {
        input.validate()?;
        self.http
            .put(
                &transaction_path(user_id, portfolio_id, holding_id, transaction_id),
                input,
            )
            .await
    }

    async fn delete_transaction(
        &self,
        user_id: &str,
        portfolio_id: &str,
        holding_id: &str,
        transaction_id: &str,
    ) -> Result<()> {
        self.http
            .delete(&transaction_path(
                user_id,
                portfolio_id,
                holding_id,
                transaction_id,
            ))
            .await
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Security Endpoints
    // ─────────────────────────────────────────────────────────────────────────

    async fn search_securities(&self, query: &str) -> Result<Vec<Security>> {
        self.http
            .get_with_query("/securities/search", &[("query", query)])
            .await
    }

    async fn get_or_create_security(&self, input: &SecurityInput) -> Result<Security> {
        let input = input.clone().normalized()?;
        self.http
            .post("/securities/get-or-create", &input, RequestAuth::Bearer)
            .await
    }
}
