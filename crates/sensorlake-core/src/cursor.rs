//! Segment pagination and the lazy cursor built on it.
//!
//! A [`Cursor`] is an explicit pull-based state machine:
//!
//! ```text
//!            buffers drained, token present
//!   Seeded ─────────────────────────────────▶ Fetching
//!     ▲                                          │
//!     └──────── new segment appended ────────────┤
//!                                                ▼
//!                      no token / no data ──▶ Exhausted (sticky)
//! ```
//!
//! Pages are fetched only when the buffered items run out and the caller
//! asks for more; there is no background prefetch. `next_item` and
//! `next_segment` are two views over the same buffers, so each exhaustion
//! triggers at most one fetch whichever view is used.

use std::collections::VecDeque;
use std::fmt::{Debug, Formatter};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{ClientError, Envelope, MultiStatus};

/// Opaque continuation issued by the service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContinuationToken(String);

impl ContinuationToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// One page of a sequence. `next` is absent on the final page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment<T> {
    #[serde(rename = "data")]
    pub items: Vec<T>,
    #[serde(rename = "next_page", default, skip_serializing_if = "Option::is_none")]
    pub next: Option<ContinuationToken>,
}

impl<T> Segment<T> {
    pub fn new(items: Vec<T>, next: Option<ContinuationToken>) -> Self {
        Self { items, next }
    }

    pub fn last(items: Vec<T>) -> Self {
        Self::new(items, None)
    }

    pub fn is_last(&self) -> bool {
        self.next.is_none()
    }
}

pub type FetchFuture<'a, T> =
    Pin<Box<dyn Future<Output = Result<Envelope<Segment<T>>, ClientError>> + Send + 'a>>;

/// Resolves a continuation token into the following page.
///
/// Shared by every cursor of a client, so implementations must tolerate
/// concurrent calls; each call is an independent request.
pub trait SegmentSource<T>: Send + Sync {
    fn fetch<'a>(&'a self, token: &'a ContinuationToken) -> FetchFuture<'a, T>;
}

/// Derived from the buffers and token, so it is always current.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorState {
    /// Buffered data or a continuation token remains.
    Seeded,
    /// A page request is in flight.
    Fetching,
    /// Nothing left to yield or fetch.
    Exhausted,
}

/// Marks a fetch as in flight until dropped, including when the fetching
/// future is abandoned mid-await.
struct InFlight<'a>(&'a mut bool);

impl<'a> InFlight<'a> {
    fn enter(flag: &'a mut bool) -> Self {
        *flag = true;
        Self(flag)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        *self.0 = false;
    }
}

/// Forward-only, non-restartable sequence over paged results.
pub struct Cursor<T> {
    current: std::vec::IntoIter<T>,
    current_next: Option<ContinuationToken>,
    queued: VecDeque<Segment<T>>,
    next: Option<ContinuationToken>,
    source: Option<Arc<dyn SegmentSource<T>>>,
    in_flight: bool,
    pages_fetched: usize,
    last_multi_status: Option<MultiStatus>,
}

impl<T> Cursor<T> {
    pub fn new(segment: Segment<T>, source: Option<Arc<dyn SegmentSource<T>>>) -> Self {
        Self::from_segments(vec![segment], source)
    }

    /// Seeds a cursor with already-fetched pages. The last page's token is
    /// the one used to continue.
    pub fn from_segments(
        segments: Vec<Segment<T>>,
        source: Option<Arc<dyn SegmentSource<T>>>,
    ) -> Self {
        let next = segments.last().and_then(|segment| segment.next.clone());

        Self {
            current: Vec::new().into_iter(),
            current_next: None,
            queued: segments.into(),
            next,
            source,
            in_flight: false,
            pages_fetched: 0,
            last_multi_status: None,
        }
    }

    /// A cursor over zero segments.
    pub fn empty() -> Self {
        Self::from_segments(Vec::new(), None)
    }

    pub fn state(&self) -> CursorState {
        if self.in_flight {
            CursorState::Fetching
        } else if self.current.len() == 0 && self.queued.is_empty() && self.next.is_none() {
            CursorState::Exhausted
        } else {
            CursorState::Seeded
        }
    }

    pub fn is_exhausted(&self) -> bool {
        self.state() == CursorState::Exhausted
    }

    /// Pages requested from the source so far (seed segments excluded).
    pub fn pages_fetched(&self) -> usize {
        self.pages_fetched
    }

    /// Item outcomes reported with the most recently fetched page, if any.
    pub fn last_multi_status(&self) -> Option<&MultiStatus> {
        self.last_multi_status.as_ref()
    }

    /// Items already buffered and not yet yielded.
    pub fn buffered_len(&self) -> usize {
        self.current.len()
            + self
                .queued
                .iter()
                .map(|segment| segment.items.len())
                .sum::<usize>()
    }

    pub async fn next_item(&mut self) -> Option<Result<T, ClientError>> {
        loop {
            if let Some(item) = self.current.next() {
                return Some(Ok(item));
            }

            if let Some(segment) = self.queued.pop_front() {
                self.current = segment.items.into_iter();
                self.current_next = segment.next;
                continue;
            }

            match self.advance().await {
                Ok(true) => continue,
                Ok(false) => return None,
                Err(error) => return Some(Err(error)),
            }
        }
    }

    /// Yields the rest of the current page, then whole pages.
    pub async fn next_segment(&mut self) -> Option<Result<Segment<T>, ClientError>> {
        loop {
            if self.current.len() > 0 {
                let items = self.current.by_ref().collect();
                return Some(Ok(Segment::new(items, self.current_next.clone())));
            }

            if let Some(segment) = self.queued.pop_front() {
                self.current_next = segment.next.clone();
                return Some(Ok(segment));
            }

            match self.advance().await {
                Ok(true) => continue,
                Ok(false) => return None,
                Err(error) => return Some(Err(error)),
            }
        }
    }

    /// Drains the cursor, stopping at the first error.
    pub async fn collect_all(mut self) -> Result<Vec<T>, ClientError> {
        let mut items = Vec::with_capacity(self.buffered_len());
        while let Some(item) = self.next_item().await {
            items.push(item?);
        }
        Ok(items)
    }

    /// Fetches one page. `Ok(false)` means the cursor is now exhausted.
    ///
    /// On error the token and buffers are left as they were, so a later call
    /// requests the same page again.
    async fn advance(&mut self) -> Result<bool, ClientError> {
        let Some(token) = self.next.clone() else {
            return Ok(false);
        };

        let Some(source) = self.source.clone() else {
            return Err(ClientError::DetachedCursor);
        };

        debug!(page = self.pages_fetched + 1, "fetching next cursor page");
        let fetched = {
            let _in_flight = InFlight::enter(&mut self.in_flight);
            source.fetch(&token).await
        };

        let envelope = match fetched {
            Ok(envelope) => envelope,
            Err(error) => {
                warn!(%error, "cursor page fetch failed");
                return Err(error);
            }
        };

        if envelope.is_failure() {
            warn!(
                status = envelope.status(),
                message = envelope.message(),
                "cursor page fetch returned failure"
            );
            return Err(ClientError::PageFetch {
                status: envelope.status(),
                message: envelope.message().to_owned(),
            });
        }

        if envelope.is_partial() {
            warn!(
                failed = envelope.failures().count(),
                "cursor page reported failed items"
            );
        }
        self.last_multi_status = envelope.multi_status().cloned();

        match envelope.into_value() {
            Some(segment) => {
                self.pages_fetched += 1;
                self.next = segment.next.clone();
                self.queued.push_back(segment);
                Ok(true)
            }
            None => {
                self.next = None;
                Ok(false)
            }
        }
    }
}

impl<T: Debug> Debug for Cursor<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cursor")
            .field("state", &self.state())
            .field("buffered", &self.buffered_len())
            .field("next", &self.next)
            .field("pages_fetched", &self.pages_fetched)
            .finish()
    }
}
