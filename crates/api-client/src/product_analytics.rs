use crate::error::ApiError;
use crate::http::{build_client, join_url, send_json};
use crate::pagination::{collect_session_pages, SessionCursor, SessionPage};
use crate::responses::EngageResponse;
use crate::retry::with_retry;
use crate::ProfileSource;
use async_trait::async_trait;
use configuration::{keys, CollectorSettings, CredentialsProvider, RetryConfig};
use core_types::{MonthWindow, Profile};
use serde_json::{json, Value};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Which users a profile query selects within a window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileFilter {
    /// Users whose first ever event falls inside the window.
    FirstSeen,
    /// Users who performed at least one tracked event inside the window.
    AnyEvent,
}

impl ProfileFilter {
    /// The `filter_by_cohort` document for this filter over `window`.
    pub fn cohort_document(&self, window: &MonthWindow) -> Value {
        let from = window.start.format(DATE_FORMAT).to_string();
        let to = window.end.format(DATE_FORMAT).to_string();

        let group = match self {
            ProfileFilter::FirstSeen => json!({
                "type": "cohort_group",
                "event": { "resourceType": "cohort", "value": "$all_users", "label": "All Users" },
                "filters": [{
                    "resourceType": "user",
                    "propertyName": "$mp_first_event_time",
                    "propertyObjectKey": null,
                    "propertyDefaultType": "datetime",
                    "propertyType": "datetime",
                    "filterOperator": "between",
                    "filterValue": { "type": "between", "from": from, "to": to }
                }],
                "filtersOperator": "and",
                "behavioralFiltersOperator": "and",
                "groupingOperator": null,
                "property": null
            }),
            ProfileFilter::AnyEvent => json!({
                "type": "cohort_group",
                "event": { "resourceType": "events", "value": "$any_event", "label": "Any Event" },
                "filters": [],
                "behavioralFilters": [{
                    "event": "$any_event",
                    "operator": "greaterThanOrEqual",
                    "value": 1,
                    "timeRange": { "type": "between", "from": from, "to": to }
                }],
                "filtersOperator": "and",
                "behavioralFiltersOperator": "and",
                "groupingOperator": null,
                "property": null
            }),
        };

        json!({
            "raw_cohort": {
                "name": "",
                "id": null,
                "unsavedId": null,
                "groups": [group]
            }
        })
    }
}

/// Collector for user profiles on the product-analytics platform.
#[derive(Clone)]
pub struct ProductAnalyticsClient {
    client: reqwest::Client,
    base_url: String,
    username: String,
    password: String,
    project_id: String,
    retry: RetryConfig,
}

impl ProductAnalyticsClient {
    pub fn new(settings: &CollectorSettings, credentials: &dyn CredentialsProvider) -> Result<Self, ApiError> {
        Ok(Self {
            client: build_client(settings)?,
            base_url: settings.product_analytics_base_url.clone(),
            username: credentials.require(keys::ANALYTICS_USERNAME)?,
            password: credentials.require(keys::ANALYTICS_PASSWORD)?,
            project_id: credentials.require(keys::ANALYTICS_PROJECT_ID)?,
            retry: settings.retry.clone(),
        })
    }

    async fn query_page(&self, filter_json: &str, cursor: Option<SessionCursor>) -> Result<SessionPage<Profile>, ApiError> {
        let url = join_url(&self.base_url, "engage");

        let mut form: Vec<(&str, String)> = vec![
            ("output_properties", r#"["$email"]"#.to_string()),
            ("filter_by_cohort", filter_json.to_string()),
        ];
        if let Some(cursor) = &cursor {
            form.push(("session_id", cursor.session_id.clone()));
            form.push(("page", cursor.page.to_string()));
        }

        let response: EngageResponse = with_retry(&self.retry, "engage", || {
            let request = self
                .client
                .post(&url)
                .query(&[("project_id", self.project_id.as_str())])
                .basic_auth(&self.username, Some(&self.password))
                .header(reqwest::header::ACCEPT, "application/json")
                .form(&form);
            send_json(request)
        })
        .await?;

        tracing::debug!(
            page = response.page,
            total = response.total,
            received = response.results.len(),
            "Fetched profile page."
        );

        Ok(SessionPage {
            items: response.results.into_iter().map(Profile::from).collect(),
            total: response.total,
            page: response.page,
            session_id: response.session_id,
        })
    }

    /// All profiles matching `filter` over `window`.
    pub async fn query_profiles(&self, filter: ProfileFilter, window: &MonthWindow) -> Result<Vec<Profile>, ApiError> {
        let filter_json = filter.cohort_document(window).to_string();
        collect_session_pages(|cursor| self.query_page(&filter_json, cursor)).await
    }
}

#[async_trait]
impl ProfileSource for ProductAnalyticsClient {
    async fn first_seen(&self, window: &MonthWindow) -> Result<Vec<Profile>, ApiError> {
        self.query_profiles(ProfileFilter::FirstSeen, window).await
    }

    async fn active(&self, window: &MonthWindow) -> Result<Vec<Profile>, ApiError> {
        self.query_profiles(ProfileFilter::AnyEvent, window).await
    }
}
