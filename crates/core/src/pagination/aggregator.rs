//! Pagination aggregator
//!
//! Follows `@attributes.next` cursors and concatenates each page's data
//! array. Errors never escape: whatever was collected before the failure is
//! kept, and the error is reported alongside it.

use lightspeed_domain::{RequestDescriptor, RetailError};
use serde_json::Value;
use tracing::{debug, warn};

use super::ports::PageSource;

/// Items gathered across pages.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageCollection {
    pub items: Vec<Value>,
    pub pages_fetched: usize,
    /// Error that stopped aggregation early, if any.
    pub interrupted: Option<RetailError>,
}

impl PageCollection {
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.interrupted.is_none()
    }

    #[must_use]
    pub fn into_items(self) -> Vec<Value> {
        self.items
    }
}

/// Fetch `initial` and every following page until the cursor runs out, a
/// page comes back empty, or `limit` items have been collected.
///
/// Query parameters only apply to the first request; later pages use the
/// server-supplied cursor URL as-is. A `limit` of zero means no cap.
pub async fn collect_all<S>(
    source: &S,
    initial: RequestDescriptor,
    limit: Option<usize>,
) -> PageCollection
where
    S: PageSource + ?Sized,
{
    let cap = limit.filter(|&cap| cap > 0);
    let mut collection = PageCollection::default();
    let mut request = initial;

    loop {
        let response = match source.fetch_page(&request).await {
            Ok(response) => response,
            Err(err) => {
                warn!(
                    error = %err,
                    pages_fetched = collection.pages_fetched,
                    collected = collection.items.len(),
                    "Pagination interrupted, keeping items collected so far"
                );
                collection.interrupted = Some(err);
                break;
            }
        };
        collection.pages_fetched += 1;

        let page = response.items();
        if page.is_empty() {
            break;
        }

        match cap {
            Some(cap) => {
                let room = cap.saturating_sub(collection.items.len());
                collection.items.extend(page.into_iter().take(room));
                if collection.items.len() >= cap {
                    debug!(cap, "Result cap reached");
                    break;
                }
            }
            None => collection.items.extend(page),
        }

        match response.next {
            Some(next) => request = request.follow(next),
            None => break,
        }
    }

    debug!(
        pages = collection.pages_fetched,
        items = collection.items.len(),
        "Pagination finished"
    );
    collection
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use lightspeed_domain::{ApiResponse, QueryParams, Result};
    use serde_json::json;

    use super::*;

    /// Serves a fixed list of pages keyed by full URL and records requests.
    struct StaticPages {
        pages: Vec<(String, Result<Value>)>,
        requested: Mutex<Vec<String>>,
    }

    impl StaticPages {
        fn new(pages: Vec<(&str, Result<Value>)>) -> Self {
            Self {
                pages: pages.into_iter().map(|(url, page)| (url.to_string(), page)).collect(),
                requested: Mutex::new(Vec::new()),
            }
        }

        fn requested(&self) -> Vec<String> {
            self.requested.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl PageSource for StaticPages {
        async fn fetch_page(&self, request: &RequestDescriptor) -> Result<ApiResponse> {
            let url = request.full_url();
            self.requested.lock().unwrap().push(url.clone());
            let (_, page) = self
                .pages
                .iter()
                .find(|(page_url, _)| *page_url == url)
                .ok_or_else(|| RetailError::http(404, url.clone(), "not found"))?;
            page.clone().map(ApiResponse::from_envelope)
        }
    }

    fn three_pages() -> StaticPages {
        StaticPages::new(vec![
            (
                "https://api.test/Item.json",
                Ok(json!({"@attributes": {"next": "https://api.test/p2"}, "Item": [{"id": "a"}, {"id": "b"}]})),
            ),
            (
                "https://api.test/p2",
                Ok(json!({"@attributes": {"next": "https://api.test/p3"}, "Item": [{"id": "c"}]})),
            ),
            ("https://api.test/p3", Ok(json!({"@attributes": {"next": null}, "Item": []}))),
        ])
    }

    #[tokio::test]
    async fn test_collects_all_pages_until_empty() {
        let source = three_pages();
        let collection =
            collect_all(&source, RequestDescriptor::get("https://api.test/Item.json"), None).await;

        assert_eq!(collection.items, vec![json!({"id": "a"}), json!({"id": "b"}), json!({"id": "c"})]);
        assert_eq!(collection.pages_fetched, 3);
        assert!(collection.is_complete());
    }

    #[tokio::test]
    async fn test_limit_stops_before_next_page() {
        let source = three_pages();
        let collection =
            collect_all(&source, RequestDescriptor::get("https://api.test/Item.json"), Some(2)).await;

        assert_eq!(collection.into_items(), vec![json!({"id": "a"}), json!({"id": "b"})]);
        assert!(!source.requested().contains(&"https://api.test/p3".to_string()));
    }

    #[tokio::test]
    async fn test_limit_truncates_page() {
        let source = three_pages();
        let collection =
            collect_all(&source, RequestDescriptor::get("https://api.test/Item.json"), Some(1)).await;

        assert_eq!(collection.items, vec![json!({"id": "a"})]);
        assert_eq!(source.requested().len(), 1);
    }

    #[tokio::test]
    async fn test_params_only_sent_on_first_page() {
        let source = StaticPages::new(vec![
            (
                "https://api.test/Item.json?limit=100",
                Ok(json!({"@attributes": {"next": "https://api.test/p2"}, "Item": [{"id": "a"}]})),
            ),
            ("https://api.test/p2", Ok(json!({"@attributes": {"next": ""}, "Item": {"id": "b"}}))),
        ]);
        let initial = RequestDescriptor::get("https://api.test/Item.json")
            .with_params(QueryParams::new().limit(100));

        let collection = collect_all(&source, initial, None).await;

        assert_eq!(collection.items, vec![json!({"id": "a"}), json!({"id": "b"})]);
        assert_eq!(
            source.requested(),
            vec!["https://api.test/Item.json?limit=100".to_string(), "https://api.test/p2".to_string()]
        );
    }

    #[tokio::test]
    async fn test_error_keeps_partial_results() {
        let source = StaticPages::new(vec![
            (
                "https://api.test/Item.json",
                Ok(json!({"@attributes": {"next": "https://api.test/p2"}, "Item": [{"id": "a"}]})),
            ),
            ("https://api.test/p2", Err(RetailError::http(500, "https://api.test/p2", "boom"))),
        ]);

        let collection =
            collect_all(&source, RequestDescriptor::get("https://api.test/Item.json"), None).await;

        assert_eq!(collection.items, vec![json!({"id": "a"})]);
        assert_eq!(collection.interrupted.as_ref().and_then(RetailError::status), Some(500));
        assert!(!collection.is_complete());
    }

    #[test]
    fn test_first_page_error_yields_empty_collection() {
        tokio_test::block_on(async {
            let source = StaticPages::new(vec![]);
            let initial = RequestDescriptor::get("https://api.test/Item.json");
            let collection = collect_all(&source, initial, None).await;

            assert!(collection.items.is_empty());
            assert_eq!(collection.pages_fetched, 0);
            assert!(collection.interrupted.is_some());
        });
    }
}
