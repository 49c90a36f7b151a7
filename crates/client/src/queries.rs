//! Cached reads and invalidating writes over a [`PortfolioApi`].
//!
//! Reads go through the [`QueryCache`]; writes retry once on transient
//! failures and then invalidate every key whose data they change.

use log::{debug, info, warn};
use std::future::Future;
use std::sync::Arc;

use stockfolio_core::portfolio::holdings::{
    calculate_holdings, Holding, HoldingInput, HoldingsSummary,
};
use stockfolio_core::portfolio::sort::{sort_holdings, SortState};
use stockfolio_core::portfolios::{Portfolio, PortfolioInput};
use stockfolio_core::securities::{Security, SecurityInput};
use stockfolio_core::session::AuthSession;
use stockfolio_core::transactions::{Transaction, TransactionInput};
use stockfolio_core::users::{AuthResponse, LoginRequest, RegisterRequest};

use crate::cache::{QueryCache, QueryKey};
use crate::client::PortfolioApi;
use crate::error::Result;

/// Extra attempts made by a mutation after a transient failure.
pub const MUTATION_RETRIES: u32 = 1;

pub struct PortfolioQueries {
    api: Arc<dyn PortfolioApi>,
    session: Arc<AuthSession>,
    cache: QueryCache,
}

impl PortfolioQueries {
    pub fn new(api: Arc<dyn PortfolioApi>, session: Arc<AuthSession>, cache: QueryCache) -> Self {
        Self {
            api,
            session,
            cache,
        }
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    /// Runs a write, retrying transient failures.
    async fn mutate<T, F, Fut>(&self, label: &str, op: F) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt = 0;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() && attempt < MUTATION_RETRIES => {
                    attempt += 1;
                    warn!("[Queries] {} failed ({}), retrying", label, e);
                }
                Err(e) => return Err(e),
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Auth
    // ─────────────────────────────────────────────────────────────────────────

    /// Cached data belongs to the previous user, so it is dropped first.
    pub async fn login(&self, request: &LoginRequest) -> Result<AuthResponse> {
        self.cache.clear();
        self.api.login(request).await
    }

    pub async fn register(&self, request: &RegisterRequest) -> Result<AuthResponse> {
        self.cache.clear();
        self.api.register(request).await
    }

    pub fn logout(&self) -> Result<()> {
        self.cache.clear();
        self.session.sign_out()?;
        info!("[Queries] Signed out");
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Portfolios
    // ─────────────────────────────────────────────────────────────────────────

    pub async fn portfolios(&self, user_id: &str) -> Result<Vec<Portfolio>> {
        let key = QueryKey::Portfolios {
            user_id: user_id.to_string(),
        };
        self.cache
            .fetch(key, || self.api.list_portfolios(user_id))
            .await
    }

    pub async fn portfolio(&self, user_id: &str, portfolio_id: &str) -> Result<Portfolio> {
        let key = QueryKey::Portfolio {
            user_id: user_id.to_string(),
            portfolio_id: portfolio_id.to_string(),
        };
        self.cache
            .fetch(key, || self.api.get_portfolio(user_id, portfolio_id))
            .await
    }

    pub async fn default_portfolio(&self, user_id: &str) -> Result<Option<Portfolio>> {
        let key = QueryKey::DefaultPortfolio {
            user_id: user_id.to_string(),
        };
        self.cache
            .fetch(key, || self.api.get_default_portfolio(user_id))
            .await
    }

    fn invalidate_portfolio_lists(&self, user_id: &str) {
        self.cache.invalidate(&QueryKey::Portfolios {
            user_id: user_id.to_string(),
        });
        self.cache.invalidate(&QueryKey::DefaultPortfolio {
            user_id: user_id.to_string(),
        });
    }

    pub async fn create_portfolio(
        &self,
        user_id: &str,
        input: &PortfolioInput,
    ) -> Result<Portfolio> {
        let portfolio = self
            .mutate("create portfolio", || {
                self.api.create_portfolio(user_id, input)
            })
            .await?;
        self.invalidate_portfolio_lists(user_id);
        Ok(portfolio)
    }

    pub async fn update_portfolio(
        &self,
        user_id: &str,
        portfolio_id: &str,
        input: &PortfolioInput,
    ) -> Result<Portfolio> {
        let portfolio = self
            .mutate("update portfolio", || {
                self.api.update_portfolio(user_id, portfolio_id, input)
            })
            .await?;
        self.invalidate_portfolio_lists(user_id);
        self.cache.invalidate(&QueryKey::Portfolio {
            user_id: user_id.to_string(),
            portfolio_id: portfolio_id.to_string(),
        });
        Ok(portfolio)
    }

    pub async fn delete_portfolio(&self, user_id: &str, portfolio_id: &str) -> Result<()> {
        self.mutate("delete portfolio", || {
            self.api.delete_portfolio(user_id, portfolio_id)
        })
        .await?;
        self.invalidate_portfolio_lists(user_id);
        self.cache
            .invalidate_where(|key| key.belongs_to_portfolio(portfolio_id));
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Holdings
    // ─────────────────────────────────────────────────────────────────────────

    pub async fn holdings(&self, user_id: &str, portfolio_id: &str) -> Result<Vec<Holding>> {
        let key = QueryKey::Holdings {
            user_id: user_id.to_string(),
            portfolio_id: portfolio_id.to_string(),
        };
        self.cache
            .fetch(key, || self.api.list_holdings(user_id, portfolio_id))
            .await
    }

    /// Holdings with derived values, totals and weights.
    ///
    /// Derivation runs on every call so the values always match the raw
    /// records currently cached.
    pub async fn holdings_summary(
        &self,
        user_id: &str,
        portfolio_id: &str,
        sort: &SortState,
    ) -> Result<HoldingsSummary> {
        let holdings = self.holdings(user_id, portfolio_id).await?;
        let mut summary = calculate_holdings(&holdings);
        sort_holdings(&mut summary.holdings, sort);
        debug!(
            "[Queries] Derived {} holdings for portfolio {} sorted by {}",
            summary.holdings.len(),
            portfolio_id,
            sort
        );
        Ok(summary)
    }

    pub async fn holding(
        &self,
        user_id: &str,
        portfolio_id: &str,
        holding_id: &str,
    ) -> Result<Holding> {
        let key = QueryKey::Holding {
            user_id: user_id.to_string(),
            portfolio_id: portfolio_id.to_string(),
            holding_id: holding_id.to_string(),
        };
        self.cache
            .fetch(key, || self.api.get_holding(user_id, portfolio_id, holding_id))
            .await
    }

    fn invalidate_holding(&self, user_id: &str, portfolio_id: &str, holding_id: Option<&str>) {
        self.cache.invalidate(&QueryKey::Holdings {
            user_id: user_id.to_string(),
            portfolio_id: portfolio_id.to_string(),
        });
        if let Some(holding_id) = holding_id {
            self.cache
                .invalidate_where(|key| key.belongs_to_holding(holding_id));
        }
    }

    pub async fn create_holding(
        &self,
        user_id: &str,
        portfolio_id: &str,
        input: &HoldingInput,
    ) -> Result<Holding> {
        let holding = self
            .mutate("create holding", || {
                self.api.create_holding(user_id, portfolio_id, input)
            })
            .await?;
        self.invalidate_holding(user_id, portfolio_id, None);
        Ok(holding)
    }

    pub async fn update_holding(
        &self,
        user_id: &str,
        portfolio_id: &str,
        holding_id: &str,
        input: &HoldingInput,
    ) -> Result<Holding> {
        let holding = self
            .mutate("update holding", || {
                self.api
                    .update_holding(user_id, portfolio_id, holding_id, input)
            })
            .await?;
        self.invalidate_holding(user_id, portfolio_id, Some(holding_id));
        Ok(holding)
    }

    pub async fn delete_holding(
        &self,
        user_id: &str,
        portfolio_id: &str,
        holding_id: &str,
    ) -> Result<()> {
        self.mutate("delete holding", || {
            self.api.delete_holding(user_id, portfolio_id, holding_id)
        })
        .await?;
        self.invalidate_holding(user_id, portfolio_id, Some(holding_id));
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Transactions
    // ─────────────────────────────────────────────────────────────────────────

    pub async fn transactions(
        &self,
        user_id: &str,
        portfolio_id: &str,
        holding_id: &str,
    ) -> Result<Vec<Transaction>> {
        let key = QueryKey::Transactions {
            user_id: user_id.to_string(),
            portfolio_id: portfolio_id.to_string(),
            holding_id: holding_id.to_string(),
        };
        self.cache
            .fetch(key, || {
                self.api
                    .list_transactions(user_id, portfolio_id, holding_id)
            })
            .await
    }

    pub async fn create_transaction(
        &self,
        user_id: &str,
        portfolio_id: &str,
        holding_id: &str,
        input: &TransactionInput,
    ) -> Result<Transaction> {
        let transaction = self
            .mutate("create transaction", || {
                self.api
                    .create_transaction(user_id, portfolio_id, holding_id, input)
            })
            .await?;
        // Shares and average cost are recomputed by the backend
        self.invalidate_holding(user_id, portfolio_id, Some(holding_id));
        Ok(transaction)
    }

    pub async fn update_transaction(
        &self,
        user_id: &str,
        portfolio_id: &str,
        holding_id: &str,
        transaction_id: &str,
        input: &TransactionInput,
    ) -> Result<Transaction> {
        let transaction = self
            .mutate("update transaction", || {
                self.api.update_transaction(
                    user_id,
                    portfolio_id,
                    holding_id,
                    transaction_id,
                    input,
                )
            })
            .await?;
        self.invalidate_holding(user_id, portfolio_id, Some(holding_id));
        Ok(transaction)
    }

    pub async fn delete_transaction(
        &self,
        user_id: &str,
        portfolio_id: &str,
        holding_id: &str,
        transaction_id: &str,
    ) -> Result<()> {
        self.mutate("delete transaction", || {
            self.api
                .delete_transaction(user_id, portfolio_id, holding_id, transaction_id)
        })
        .await?;
        self.invalidate_holding(user_id, portfolio_id, Some(holding_id));
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Securities
    // ─────────────────────────────────────────────────────────────────────────

    /// Blank queries return no results without a request.
    pub async fn search_securities(&self, query: &str) -> Result<Vec<Security>> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }
        let key = QueryKey::SecuritySearch {
            query: query.to_lowercase(),
        };
        self.cache
            .fetch(key, || self.api.search_securities(query))
            .await
    }

    pub async fn get_or_create_security(&self, input: &SecurityInput) -> Result<Security> {
        let security = self
            .mutate("get or create security", || {
                self.api.get_or_create_security(input)
            })
            .await?;
        self.cache
            .invalidate_where(|key| matches!(key, QueryKey::SecuritySearch { .. }));
        Ok(security)
    }
}

impl std::fmt::Debug for PortfolioQueries {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PortfolioQueries")
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}
