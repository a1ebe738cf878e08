//! Continuation-token pagination
//!
//! List endpoints return one page at a time plus an optional cursor for the
//! next page. The sequence is finite and cannot be restarted; callers drain
//! it into a `Vec` with [`collect_pages`] before filtering.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::future::Future;

/// One page of a list response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    /// Missing when the page is empty
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_page_token: Option<String>,
}

impl<T> Page<T> {
    /// Final page
    pub fn last(items: Vec<T>) -> Self {
        Self {
            items,
            next_page_token: None,
        }
    }

    pub fn with_next(items: Vec<T>, token: impl Into<String>) -> Self {
        Self {
            items,
            next_page_token: Some(token.into()),
        }
    }

    fn next_token(&self) -> Option<&str> {
        self.next_page_token.as_deref().filter(|t| !t.is_empty())
    }
}

/// Follow continuation tokens until exhausted and return every item
///
/// `fetch` receives `None` for the first page and the previous page's token
/// afterwards.
pub async fn collect_pages<T, F, Fut>(mut fetch: F) -> Result<Vec<T>>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = Result<Page<T>>>,
{
    let mut items = Vec::new();
    let mut token: Option<String> = None;
    let mut pages = 0usize;

    loop {
        let page = fetch(token.take()).await?;
        pages += 1;
        token = page.next_token().map(str::to_string);
        items.extend(page.items);

        if token.is_none() {
            break;
        }
    }

    tracing::debug!("Collected {} items from {} pages", items.len(), pages);
    Ok(items)
}
