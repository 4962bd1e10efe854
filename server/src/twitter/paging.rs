//! Cursored endpoints as lazy page streams.

use std::future::Future;

use futures_util::{Stream, StreamExt, pin_mut, stream};
use tracing::warn;

use super::backend::{Cursor, Page};
use super::error::TwitterResult;

/// Starting cursor and page size of a cursored endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PagedEndpoint {
    pub name: &'static str,
    pub start: Cursor,
    pub page_size: u32,
}

/// `friends/list`: first page at cursor 0, up to 200 users per page.
pub const FRIENDS: PagedEndpoint = PagedEndpoint {
    name: "friends",
    start: Cursor(0),
    page_size: 200,
};

/// `lists/members`: first page at cursor -1, up to 5000 users per page.
pub const LIST_MEMBERS: PagedEndpoint = PagedEndpoint {
    name: "list members",
    start: Cursor(-1),
    page_size: 5000,
};

enum Walk<F> {
    Next(Cursor, F),
    Done,
}

/// Stream the pages of `endpoint`, fetched lazily through `fetch`.
///
/// The stream ends after the last page or right after the first failed page.
/// Calling this again restarts from the endpoint's starting cursor.
pub fn pages<'a, T, F, Fut>(
    endpoint: PagedEndpoint,
    fetch: F,
) -> impl Stream<Item = TwitterResult<Vec<T>>> + 'a
where
    T: 'a,
    F: FnMut(Cursor, u32) -> Fut + 'a,
    Fut: Future<Output = TwitterResult<Page<T>>> + 'a,
{
    stream::unfold(Walk::Next(endpoint.start, fetch), move |walk| async move {
        let Walk::Next(cursor, mut fetch) = walk else {
            return None;
        };
        match fetch(cursor, endpoint.page_size).await {
            Ok(page) => {
                let next = match page.next {
                    Some(cursor) => Walk::Next(cursor, fetch),
                    None => Walk::Done,
                };
                Some((Ok(page.items), next))
            }
            Err(e) => Some((Err(e), Walk::Done)),
        }
    })
}

/// Items of a drained page stream. `complete` is false when a failed page cut
/// the walk short.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collected<T> {
    pub items: Vec<T>,
    pub complete: bool,
}

/// Drain a page stream, keeping everything fetched before a failure.
/// A failed page is logged and ends the walk.
pub async fn collect_partial<T>(
    endpoint: PagedEndpoint,
    pages: impl Stream<Item = TwitterResult<Vec<T>>>,
) -> Collected<T> {
    pin_mut!(pages);
    let mut items = Vec::new();
    let mut fetched = 0usize;
    while let Some(page) = pages.next().await {
        match page {
            Ok(mut page) => {
                fetched += 1;
                items.append(&mut page);
            }
            Err(e) => {
                warn!(
                    endpoint = endpoint.name,
                    pages = fetched,
                    items = items.len(),
                    error = %e,
                    "page fetch failed, keeping partial results"
                );
                return Collected {
                    items,
                    complete: false,
                };
            }
        }
    }
    Collected {
        items,
        complete: true,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::twitter::error::TwitterError;

    /// Serves `sizes.len()` pages of numbered items; `fail_at` makes that page
    /// index fail.
    fn scripted(
        sizes: Vec<usize>,
        fail_at: Option<usize>,
        seen: Arc<Mutex<Vec<(Cursor, u32)>>>,
    ) -> impl FnMut(Cursor, u32) -> std::future::Ready<TwitterResult<Page<usize>>> {
        move |cursor, count| {
            seen.lock().unwrap().push((cursor, count));
            let index = if cursor.0 <= 0 { 0 } else { cursor.0 as usize };
            if fail_at == Some(index) {
                return std::future::ready(Err(TwitterError::RemoteFetch {
                    status: Some(503),
                    message: "over capacity".into(),
                }));
            }
            let offset: usize = sizes[..index].iter().sum();
            let items = (offset..offset + sizes[index]).collect();
            let next = (index + 1 < sizes.len()).then(|| Cursor(index as i64 + 1));
            std::future::ready(Ok(Page { items, next }))
        }
    }

    #[tokio::test]
    async fn test_pages_walk_until_last() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let stream = pages(FRIENDS, scripted(vec![3, 3, 1], None, seen.clone()));
        let collected = collect_partial(FRIENDS, stream).await;
        assert_eq!(collected.items, (0..7).collect::<Vec<_>>());
        assert!(collected.complete);
        assert_eq!(
            *seen.lock().unwrap(),
            vec![(Cursor(0), 200), (Cursor(1), 200), (Cursor(2), 200)]
        );
    }

    #[tokio::test]
    async fn test_list_members_start_at_minus_one() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let stream = pages(LIST_MEMBERS, scripted(vec![2], None, seen.clone()));
        let collected = collect_partial(LIST_MEMBERS, stream).await;
        assert_eq!(collected.items, vec![0, 1]);
        assert_eq!(*seen.lock().unwrap(), vec![(Cursor(-1), 5000)]);
    }

    #[tokio::test]
    async fn test_failed_page_ends_stream() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let stream = pages(FRIENDS, scripted(vec![2, 2, 2], Some(1), seen.clone()));
        let collected: Vec<_> = stream.collect().await;
        assert_eq!(collected.len(), 2);
        assert!(collected[0].is_ok());
        assert!(collected[1].is_err());
        assert_eq!(seen.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_collect_partial_keeps_pages_before_failure() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let stream = pages(FRIENDS, scripted(vec![2, 2, 2], Some(2), seen));
        let collected = collect_partial(FRIENDS, stream).await;
        assert_eq!(collected.items, vec![0, 1, 2, 3]);
        assert!(!collected.complete);
    }

    #[tokio::test]
    async fn test_first_page_failure_yields_nothing() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let stream = pages(FRIENDS, scripted(vec![2], Some(0), seen));
        let collected = collect_partial(FRIENDS, stream).await;
        assert!(collected.items.is_empty());
        assert!(!collected.complete);
    }
}
