//! Cursor-driven pagination over remote sources
//!
//! A [`PageSource`] knows how to fetch one page for a query term. The
//! [`Paginator`] walks the continuation tokens lazily, one page at a time,
//! pausing between requests. Termination is the first of: no continuation
//! token, an empty page, or a failed request.

use std::time::Duration;

use async_trait::async_trait;
use futures::stream::{self, Stream, StreamExt};
use tracing::{debug, warn};

use crate::error::{FetchError, FetchFailure};

/// Default pause between consecutive page requests
pub const DEFAULT_PAGE_DELAY: Duration = Duration::from_millis(300);

/// One page of results plus the token for the next one
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Opaque continuation token; `None` on the last page
    pub next_token: Option<String>,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, next_token: Option<String>) -> Self {
        Self { items, next_token }
    }

    /// A page with no successor
    pub fn last(items: Vec<T>) -> Self {
        Self::new(items, None)
    }
}

/// A remote collection that can be read page by page
#[async_trait]
pub trait PageSource: Send + Sync {
    type Item: Send;

    /// Fetch the page identified by `token` (`None` for the first page)
    async fn fetch_page(
        &self,
        term: &str,
        token: Option<&str>,
    ) -> Result<Page<Self::Item>, FetchFailure>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Cursor {
    Start,
    Next(String),
    Done,
}

/// Lazy walk over the pages of one query term
pub struct Paginator<'a, S: PageSource + ?Sized> {
    source: &'a S,
    term: String,
    cursor: Cursor,
    pages: usize,
    delay: Duration,
}

impl<'a, S: PageSource + ?Sized> Paginator<'a, S> {
    pub fn new(source: &'a S, term: impl Into<String>) -> Self {
        Self {
            source,
            term: term.into(),
            cursor: Cursor::Start,
            pages: 0,
            delay: DEFAULT_PAGE_DELAY,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Pages requested so far, including a failed one
    pub fn pages(&self) -> usize {
        self.pages
    }

    /// Fetch the next page
    ///
    /// Returns `None` once the walk is over. After an error the walk is over:
    /// later pages are never requested because their token is unknown.
    pub async fn next_page(&mut self) -> Option<Result<Vec<S::Item>, FetchError>> {
        let token = match std::mem::replace(&mut self.cursor, Cursor::Done) {
            Cursor::Done => return None,
            Cursor::Start => None,
            Cursor::Next(token) => {
                if !self.delay.is_zero() {
                    tokio::time::sleep(self.delay).await;
                }
                Some(token)
            },
        };

        self.pages += 1;
        let page_number = self.pages;

        match self.source.fetch_page(&self.term, token.as_deref()).await {
            Ok(page) => {
                debug!(
                    term = %self.term,
                    page = page_number,
                    items = page.items.len(),
                    has_next = page.next_token.is_some(),
                    "Fetched page"
                );
                if page.items.is_empty() {
                    return None;
                }
                if let Some(next) = page.next_token.filter(|t| !t.is_empty()) {
                    self.cursor = Cursor::Next(next);
                }
                Some(Ok(page.items))
            },
            Err(cause) => Some(Err(FetchError {
                term: self.term.clone(),
                page: page_number,
                cause,
            })),
        }
    }

    /// Turn the walk into a stream of pages
    pub fn into_stream(self) -> impl Stream<Item = Result<Vec<S::Item>, FetchError>> + 'a
    where
        S::Item: 'a,
    {
        stream::unfold(self, |mut paginator| async move {
            paginator
                .next_page()
                .await
                .map(|page| (page, paginator))
        })
    }
}

/// Everything one term yielded before the walk ended
#[derive(Debug)]
pub struct Harvest<T> {
    pub items: Vec<T>,
    /// Pages that returned records
    pub pages: usize,
    /// The failure that cut the walk short, if any
    pub error: Option<FetchError>,
}

/// Drain every page for `term`, keeping what was gathered before any failure
pub async fn harvest<S>(source: &S, term: &str, delay: Duration) -> Harvest<S::Item>
where
    S: PageSource + ?Sized,
{
    let pages = Paginator::new(source, term).with_delay(delay).into_stream();
    let mut pages = std::pin::pin!(pages);

    let mut harvest = Harvest {
        items: Vec::new(),
        pages: 0,
        error: None,
    };

    while let Some(page) = pages.next().await {
        match page {
            Ok(items) => {
                harvest.pages += 1;
                harvest.items.extend(items);
            },
            Err(e) => {
                warn!(
                    term = %e.term,
                    page = e.page,
                    error = %e.cause,
                    kept = harvest.items.len(),
                    "Page fetch failed; keeping records gathered so far"
                );
                harvest.error = Some(e);
                break;
            },
        }
    }

    harvest
}
