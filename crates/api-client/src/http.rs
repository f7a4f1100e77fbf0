use crate::error::ApiError;
use configuration::CollectorSettings;
use reqwest::RequestBuilder;
use serde::de::DeserializeOwned;

pub(crate) fn build_client(settings: &CollectorSettings) -> Result<reqwest::Client, ApiError> {
    let client = reqwest::Client::builder()
        .timeout(settings.timeout)
        .user_agent(concat!("pulse/", env!("CARGO_PKG_VERSION")))
        .build()?;
    Ok(client)
}

pub(crate) fn join_url(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}

/// Sends the request and decodes a JSON body. Non-success statuses keep the
/// raw body so the caller can see what the platform complained about.
pub(crate) async fn send_json<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, ApiError> {
    let response = request.send().await?;
    let status = response.status();
    let text = response.text().await?;

    if status.is_success() {
        serde_json::from_str::<T>(&text).map_err(|e| {
            ApiError::Deserialization(format!("{e}. Original text: {}", truncate(&text, 512)))
        })
    } else {
        Err(ApiError::Status {
            status: status.as_u16(),
            body: truncate(&text, 2048).to_string(),
        })
    }
}

fn truncate(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_url_handles_slashes() {
        assert_eq!(join_url("https://a.io/v2/", "/transactions"), "https://a.io/v2/transactions");
        assert_eq!(join_url("https://a.io/v2", "transactions"), "https://a.io/v2/transactions");
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate("héllo", 2), "hé");
        assert_eq!(truncate("abc", 10), "abc");
    }
}
