use crate::error::ApiError;
use crate::http::{build_client, join_url, send_json};
use crate::pagination::collect_until_empty;
use crate::responses::{RawSubscription, SubscriptionListResponse};
use crate::retry::with_retry;
use crate::SubscriptionSource;
use async_trait::async_trait;
use configuration::{keys, CollectorSettings, CredentialsProvider, RetryConfig};
use core_types::Subscription;

/// Collector for subscriptions on the billing platform.
#[derive(Clone)]
pub struct BillingClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    page_size: u32,
    retry: RetryConfig,
}

impl BillingClient {
    pub fn new(settings: &CollectorSettings, credentials: &dyn CredentialsProvider) -> Result<Self, ApiError> {
        Ok(Self {
            client: build_client(settings)?,
            base_url: settings.billing_base_url.clone(),
            api_key: credentials.require(keys::BILLING_API_KEY)?,
            page_size: settings.page_size,
            retry: settings.retry.clone(),
        })
    }

    /// One page of subscriptions in every status, after `starting_after`.
    async fn list_page(&self, starting_after: Option<String>) -> Result<Vec<RawSubscription>, ApiError> {
        let url = join_url(&self.base_url, "subscriptions");
        let limit = self.page_size.to_string();
        tracing::debug!(starting_after = starting_after.as_deref().unwrap_or("-"), "Fetching subscription page.");

        let page: SubscriptionListResponse = with_retry(&self.retry, "subscriptions", || {
            let mut request = self
                .client
                .get(&url)
                .bearer_auth(&self.api_key)
                .query(&[("status", "all"), ("limit", limit.as_str())]);
            if let Some(id) = &starting_after {
                request = request.query(&[("starting_after", id)]);
            }
            send_json(request)
        })
        .await?;

        Ok(page.data)
    }
}

#[async_trait]
impl SubscriptionSource for BillingClient {
    async fn fetch_subscriptions(&self) -> Result<Vec<Subscription>, ApiError> {
        let raw = collect_until_empty(
            |starting_after| self.list_page(starting_after),
            |sub: &RawSubscription| sub.id.clone(),
        )
        .await?;
        tracing::info!(count = raw.len(), "Fetched subscriptions.");

        raw.into_iter().map(Subscription::try_from).collect()
    }
}
