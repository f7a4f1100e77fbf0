use crate::error::ApiError;
use crate::http::{build_client, join_url, send_json};
use crate::pagination::{collect_cursor_pages, CursorPage};
use crate::responses::{CursorPageResponse, RawBankTransaction, RawStatement};
use crate::retry::with_retry;
use crate::TransactionSource;
use async_trait::async_trait;
use configuration::{keys, CollectorSettings, CredentialsProvider, RetryConfig};
use core_types::{AccountStatement, BankTransaction};
use serde::de::DeserializeOwned;

/// Collector for the cash account on the banking platform.
#[derive(Clone)]
pub struct BankingClient {
    client: reqwest::Client,
    base_url: String,
    token: String,
    account_id: String,
    retry: RetryConfig,
}

impl BankingClient {
    /// Resolves the API token and cash account id up front.
    ///
    /// # Errors
    ///
    /// `ApiError::Config` if either credential is missing.
    pub fn new(settings: &CollectorSettings, credentials: &dyn CredentialsProvider) -> Result<Self, ApiError> {
        Ok(Self {
            client: build_client(settings)?,
            base_url: settings.banking_base_url.clone(),
            token: credentials.require(keys::BANKING_API_TOKEN)?,
            account_id: credentials.require(keys::BANKING_CASH_ACCOUNT_ID)?,
            retry: settings.retry.clone(),
        })
    }

    async fn list_page<T: DeserializeOwned>(&self, path: &str, cursor: Option<String>) -> Result<CursorPage<T>, ApiError> {
        let url = join_url(&self.base_url, path);
        tracing::debug!(path, cursor = cursor.as_deref().unwrap_or("-"), "Fetching banking page.");

        let page: CursorPageResponse<T> = with_retry(&self.retry, path, || {
            let mut request = self.client.get(&url).bearer_auth(&self.token);
            if let Some(cursor) = &cursor {
                request = request.query(&[("cursor", cursor)]);
            }
            send_json(request)
        })
        .await?;

        Ok(CursorPage {
            items: page.items,
            next_cursor: page.next_cursor,
        })
    }

    async fn list_all<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<T>, ApiError> {
        collect_cursor_pages(|cursor| self.list_page(path, cursor)).await
    }
}

#[async_trait]
impl TransactionSource for BankingClient {
    async fn fetch_transactions(&self) -> Result<Vec<BankTransaction>, ApiError> {
        let path = format!("transactions/cash/{}", self.account_id);
        let raw: Vec<RawBankTransaction> = self.list_all(&path).await?;
        tracing::info!(count = raw.len(), "Fetched bank transactions.");
        Ok(raw.into_iter().map(BankTransaction::from).collect())
    }

    async fn fetch_statements(&self) -> Result<Vec<AccountStatement>, ApiError> {
        let path = format!("accounts/cash/{}/statements", self.account_id);
        let raw: Vec<RawStatement> = self.list_all(&path).await?;
        tracing::info!(count = raw.len(), "Fetched account statements.");
        Ok(raw.into_iter().map(AccountStatement::from).collect())
    }
}
