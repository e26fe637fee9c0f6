//! Module: executor::stream
//! Responsibility: lazy, single-pass paging over one table scan with OFFSET/LIMIT.
//! Does not own: translation or materialization.
//! Boundary: a page is fetched only when the consumer pulls past the
//! buffered items; nothing is prefetched.

use crate::{
    error::Error,
    query::RecordQuery,
    remote::{RemoteBase, RemoteRecord},
};
use std::{collections::VecDeque, sync::Arc};

///
/// StreamState
///

#[derive(Clone, Debug, Eq, PartialEq)]
enum StreamState {
    Start,
    Emitting { next_token: Option<String> },
    Done,
}

///
/// RecordStream
///
/// `START -> FETCHING_PAGE -> EMITTING_ITEMS -> (FETCHING_PAGE | DONE)`.
///
/// Skipped (offset) items count against nothing; emitted items count down
/// the limit, and the stream ends the moment it reaches zero, even mid-page.
/// A fetch error is yielded once and ends the stream.
///

pub struct RecordStream {
    base: Arc<dyn RemoteBase>,
    table: String,
    query: RecordQuery,
    page_size: u32,
    offset: u64,
    limit: u64,
    buffer: VecDeque<RemoteRecord>,
    state: StreamState,
    pages_fetched: usize,
}

impl RecordStream {
    #[must_use]
    pub fn new(
        base: Arc<dyn RemoteBase>,
        table: impl Into<String>,
        query: RecordQuery,
        page_size: u32,
        offset: u64,
        limit: u64,
    ) -> Self {
        Self {
            base,
            table: table.into(),
            query,
            page_size: page_size.max(1),
            offset,
            limit,
            buffer: VecDeque::new(),
            state: StreamState::Start,
            pages_fetched: 0,
        }
    }

    #[must_use]
    pub const fn pages_fetched(&self) -> usize {
        self.pages_fetched
    }

    #[must_use]
    pub const fn is_done(&self) -> bool {
        matches!(self.state, StreamState::Done)
    }

    #[must_use]
    pub fn query(&self) -> &RecordQuery {
        &self.query
    }

    fn finish(&mut self) {
        self.buffer.clear();
        self.state = StreamState::Done;
    }

    fn fetch(&mut self, page_token: &str) -> Result<(), Error> {
        let page = self
            .base
            .fetch_page(&self.table, &self.query, page_token, self.page_size)?;
        self.pages_fetched += 1;

        tracing::debug!(
            table = %self.table,
            page = self.pages_fetched,
            items = page.items.len(),
            has_more = page.has_more,
            "fetched page"
        );

        let next_token = page
            .next_token()
            .filter(|token| !token.is_empty())
            .map(str::to_string);
        self.buffer = page.items.into();
        self.state = StreamState::Emitting { next_token };

        Ok(())
    }
}

impl Iterator for RecordStream {
    type Item = Result<RemoteRecord, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.limit == 0 {
                self.finish();
                return None;
            }

            let token = match &mut self.state {
                StreamState::Done => return None,
                StreamState::Start => String::new(),
                StreamState::Emitting { next_token } => {
                    if let Some(record) = self.buffer.pop_front() {
                        if self.offset > 0 {
                            self.offset -= 1;
                            continue;
                        }
                        self.limit -= 1;
                        return Some(Ok(record));
                    }

                    match next_token.take() {
                        Some(token) => token,
                        None => {
                            self.finish();
                            return None;
                        }
                    }
                }
            };

            if let Err(err) = self.fetch(&token) {
                self.finish();
                return Some(Err(err));
            }
        }
    }
}

impl std::fmt::Debug for RecordStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordStream")
            .field("table", &self.table)
            .field("offset", &self.offset)
            .field("limit", &self.limit)
            .field("buffered", &self.buffer.len())
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}
