//! Fetch-until-exhausted drivers for the three pagination styles the
//! collectors deal with. Pages are requested strictly one after another.

use crate::error::ApiError;
use std::future::Future;

/// A page from an API that hands back an opaque continuation cursor.
#[derive(Debug, Clone)]
pub struct CursorPage<T> {
    pub items: Vec<T>,
    pub next_cursor: Option<String>,
}

/// A page from an API that reports the total result count up front and pages
/// through a server-side session.
#[derive(Debug, Clone)]
pub struct SessionPage<T> {
    pub items: Vec<T>,
    pub total: usize,
    pub page: u32,
    pub session_id: String,
}

/// What to send to fetch the next page of a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionCursor {
    pub session_id: String,
    pub page: u32,
}

/// Follows `next_cursor` until the API stops returning one.
pub async fn collect_cursor_pages<T, F, Fut>(mut fetch: F) -> Result<Vec<T>, ApiError>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = Result<CursorPage<T>, ApiError>>,
{
    let mut items = Vec::new();
    let mut cursor: Option<String> = None;

    loop {
        let page = fetch(cursor.clone()).await?;
        items.extend(page.items);

        match page.next_cursor {
            Some(next) if cursor.as_deref() == Some(next.as_str()) => {
                return Err(ApiError::PaginationStalled(format!("cursor {next} repeated")));
            }
            Some(next) => cursor = Some(next),
            None => break,
        }
    }

    tracing::debug!(records = items.len(), "Cursor pagination exhausted.");
    Ok(items)
}

/// Requests pages until one comes back empty, passing the key of the last
/// record received as the `starting_after` cursor.
pub async fn collect_until_empty<T, F, Fut, K>(mut fetch: F, key: K) -> Result<Vec<T>, ApiError>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = Result<Vec<T>, ApiError>>,
    K: Fn(&T) -> String,
{
    let mut items: Vec<T> = Vec::new();
    let mut current = fetch(None).await?;

    while !current.is_empty() {
        items.extend(current);
        let starting_after = items.last().map(&key);
        current = fetch(starting_after).await?;
    }

    tracing::debug!(records = items.len(), "Empty page reached.");
    Ok(items)
}

/// Pages through a server-side session until at least `total` records have
/// been accumulated. The page number increments from the one the first
/// response reports, and the session id is reused throughout.
///
/// # Errors
///
/// `PaginationStalled` if a page comes back empty before `total` is reached.
pub async fn collect_session_pages<T, F, Fut>(mut fetch: F) -> Result<Vec<T>, ApiError>
where
    F: FnMut(Option<SessionCursor>) -> Fut,
    Fut: Future<Output = Result<SessionPage<T>, ApiError>>,
{
    let first = fetch(None).await?;
    let total = first.total;
    let session_id = first.session_id;
    let mut page = first.page;
    let mut items = first.items;

    while items.len() < total {
        page += 1;
        let next = fetch(Some(SessionCursor {
            session_id: session_id.clone(),
            page,
        }))
        .await?;

        if next.items.is_empty() {
            return Err(ApiError::PaginationStalled(format!(
                "page {page} of session {session_id} was empty with {}/{total} records",
                items.len()
            )));
        }
        items.extend(next.items);
    }

    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn session_pagination_stops_at_total() {
        let mut calls = Vec::new();
        let records = collect_session_pages(|cursor: Option<SessionCursor>| {
            calls.push(cursor.clone());
            let page = cursor.as_ref().map_or(0, |c| c.page);
            let start = page as usize * 10;
            let items: Vec<usize> = (start..(start + 10).min(25)).collect();
            async move {
                Ok(SessionPage {
                    items,
                    total: 25,
                    page,
                    session_id: "s-1".to_string(),
                })
            }
        })
        .await
        .unwrap();

        assert_eq!(records.len(), 25);
        assert_eq!(records, (0..25).collect::<Vec<_>>());
        assert_eq!(calls.len(), 3);
        assert_eq!(calls[0], None);
        assert_eq!(calls[2], Some(SessionCursor { session_id: "s-1".into(), page: 2 }));
    }

    #[tokio::test]
    async fn session_pagination_refuses_to_spin_on_empty_pages() {
        let result = collect_session_pages(|cursor: Option<SessionCursor>| {
            let items: Vec<u32> = if cursor.is_none() { vec![1, 2] } else { Vec::new() };
            async move {
                Ok(SessionPage { items, total: 5, page: 0, session_id: "s".into() })
            }
        })
        .await;

        assert!(matches!(result, Err(ApiError::PaginationStalled(_))));
    }

    #[tokio::test]
    async fn cursor_pagination_follows_until_null() {
        let mut seen = Vec::new();
        let records = collect_cursor_pages(|cursor: Option<String>| {
            seen.push(cursor.clone());
            let page = match cursor.as_deref() {
                None => CursorPage { items: vec!["a", "b"], next_cursor: Some("c1".to_string()) },
                Some("c1") => CursorPage { items: vec!["c"], next_cursor: Some("c2".to_string()) },
                _ => CursorPage { items: vec!["d"], next_cursor: None },
            };
            async move { Ok(page) }
        })
        .await
        .unwrap();

        assert_eq!(records, vec!["a", "b", "c", "d"]);
        assert_eq!(seen, vec![None, Some("c1".to_string()), Some("c2".to_string())]);
    }

    #[tokio::test]
    async fn cursor_pagination_detects_a_stuck_cursor() {
        let result = collect_cursor_pages(|_cursor: Option<String>| async {
            Ok(CursorPage { items: vec![1], next_cursor: Some("same".to_string()) })
        })
        .await;

        assert!(matches!(result, Err(ApiError::PaginationStalled(_))));
    }

    #[tokio::test]
    async fn until_empty_uses_last_id_as_cursor() {
        let mut cursors = Vec::new();
        let records = collect_until_empty(
            |starting_after: Option<String>| {
                cursors.push(starting_after.clone());
                let page: Vec<String> = match starting_after.as_deref() {
                    None => vec!["sub_1".into(), "sub_2".into()],
                    Some("sub_2") => vec!["sub_3".into()],
                    _ => Vec::new(),
                };
                async move { Ok(page) }
            },
            |id: &String| id.clone(),
        )
        .await
        .unwrap();

        assert_eq!(records, vec!["sub_1", "sub_2", "sub_3"]);
        assert_eq!(cursors, vec![None, Some("sub_2".to_string()), Some("sub_3".to_string())]);
    }
}
