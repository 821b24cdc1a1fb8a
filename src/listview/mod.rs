pub mod fetch;

use log::{debug, warn};
use std::collections::HashMap;

use crate::error::ApiError;
use crate::models::Record;

pub use fetch::{FetchTicket, RecordSource, SharedListView, refresh, shared, spawn_refresh};

pub const DEFAULT_PAGE_SIZE: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn toggled(self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState {
    // Mounted, nothing requested yet
    Idle,
    Loading,
    Ready,
    // `stale` is true when earlier records are still being shown
    Failed { message: String, stale: bool },
}

// Pure stages. None of them touch their input.

/// Keep records where any searchable field contains `term`, ignoring case.
pub fn filter<'a, R: Record>(records: &'a [R], term: &str) -> Vec<&'a R> {
    if term.is_empty() {
        return records.iter().collect();
    }
    let needle = term.to_lowercase();
    records
        .iter()
        .filter(|r| {
            r.search_fields()
                .iter()
                .any(|f| f.to_lowercase().contains(&needle))
        })
        .collect()
}

/// Stable sort by `field`. Records with equal keys keep their input order in
/// both directions.
pub fn sort<'a, R: Record>(records: &[&'a R], field: R::Field, direction: SortDirection) -> Vec<&'a R> {
    let mut sorted = records.to_vec();
    // slice::sort_by is stable
    sorted.sort_by(|a, b| {
        let ord = a.sort_value(field).cmp(&b.sort_value(field));
        match direction {
            SortDirection::Ascending => ord,
            SortDirection::Descending => ord.reverse(),
        }
    });
    sorted
}

/// 1-based page slice. Out of range pages yield an empty result.
pub fn paginate<'a, R>(records: &[&'a R], page: usize, page_size: usize) -> Vec<&'a R> {
    if page == 0 || page_size == 0 {
        return Vec::new();
    }
    let start = match (page - 1).checked_mul(page_size) {
        Some(start) if start < records.len() => start,
        _ => return Vec::new(),
    };
    let end = start.saturating_add(page_size).min(records.len());
    records[start..end].to_vec()
}

pub fn total_pages(count: usize, page_size: usize) -> usize {
    if page_size == 0 {
        return 1;
    }
    count.div_ceil(page_size).max(1)
}

/// Controller state for one mounted list page.
///
/// `records` only changes when a fetch issued by this view completes and is
/// still the most recent one. Everything else here is UI state; the rows to
/// draw are derived from scratch by [`ListView::displayed`].
pub struct ListView<R: Record> {
    records: Vec<R>,
    search_term: String,
    sort_field: R::Field,
    sort_direction: SortDirection,
    current_page: usize,
    page_size: usize,
    revealed: HashMap<String, bool>,
    latest_seq: u64,
    mounted: bool,
    loaded_once: bool,
    load_state: LoadState,
}

impl<R: Record> ListView<R> {
    pub fn new(page_size: usize) -> Self {
        let (sort_field, sort_direction) = R::default_sort();
        Self {
            records: Vec::new(),
            search_term: String::new(),
            sort_field,
            sort_direction,
            current_page: 1,
            page_size: page_size.max(1),
            revealed: HashMap::new(),
            latest_seq: 0,
            mounted: true,
            loaded_once: false,
            load_state: LoadState::Idle,
        }
    }

    pub fn records(&self) -> &[R] {
        &self.records
    }

    pub fn search_term(&self) -> &str {
        &self.search_term
    }

    pub fn sort_field(&self) -> R::Field {
        self.sort_field
    }

    pub fn sort_direction(&self) -> SortDirection {
        self.sort_direction
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn load_state(&self) -> &LoadState {
        &self.load_state
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    pub fn set_search_term(&mut self, term: impl Into<String>) {
        self.search_term = term.into();
        self.current_page = 1;
    }

    // Same field flips direction, a new field starts ascending
    pub fn set_sort(&mut self, field: R::Field) {
        if field == self.sort_field {
            self.sort_direction = self.sort_direction.toggled();
        } else {
            self.sort_field = field;
            self.sort_direction = SortDirection::Ascending;
        }
    }

    pub fn set_page(&mut self, page: usize) {
        self.current_page = page.clamp(1, self.total_pages());
    }

    pub fn toggle_reveal(&mut self, id: &str) {
        let entry = self.revealed.entry(id.to_string()).or_insert(false);
        *entry = !*entry;
    }

    pub fn is_revealed(&self, id: &str) -> bool {
        self.revealed.get(id).copied().unwrap_or(false)
    }

    pub fn filtered(&self) -> Vec<&R> {
        filter(&self.records, &self.search_term)
    }

    pub fn total_pages(&self) -> usize {
        total_pages(self.filtered().len(), self.page_size)
    }

    /// The rows to draw: filter, sort, then page. Recomputed on every call.
    pub fn displayed(&self) -> Vec<&R> {
        let filtered = self.filtered();
        let sorted = sort(&filtered, self.sort_field, self.sort_direction);
        paginate(&sorted, self.current_page, self.page_size)
    }

    /// Start a fetch. Only the ticket from the most recent call will be
    /// accepted by [`ListView::finish_fetch`].
    pub fn begin_fetch(&mut self) -> FetchTicket {
        self.latest_seq += 1;
        self.load_state = LoadState::Loading;
        debug!("{}: issued fetch #{}", R::NOUN, self.latest_seq);
        FetchTicket::new(self.latest_seq)
    }

    /// Apply a fetch outcome. Returns false when the result was dropped
    /// because a newer fetch was issued or the view was unmounted.
    pub fn finish_fetch(&mut self, ticket: FetchTicket, outcome: Result<Vec<R>, ApiError>) -> bool {
        if !self.mounted {
            debug!("{}: view unmounted, dropping fetch #{}", R::NOUN, ticket.seq());
            return false;
        }
        if ticket.seq() != self.latest_seq {
            debug!(
                "{}: dropping stale fetch #{} (latest is #{})",
                R::NOUN,
                ticket.seq(),
                self.latest_seq
            );
            return false;
        }

        match outcome {
            Ok(records) => {
                debug!("{}: fetch #{} returned {} records", R::NOUN, ticket.seq(), records.len());
                self.records = records;
                self.loaded_once = true;
                self.load_state = LoadState::Ready;
                // A smaller result can leave the old page past the end
                self.current_page = self.current_page.clamp(1, self.total_pages());
            }
            Err(e) => {
                warn!("{}: fetch #{} failed: {}", R::NOUN, ticket.seq(), e);
                self.load_state = LoadState::Failed {
                    message: e.user_message(&format!("Failed to fetch {}", R::NOUN)),
                    stale: self.loaded_once,
                };
            }
        }
        true
    }

    // Tear down. In-flight fetches resolve into nothing after this.
    pub fn unmount(&mut self) {
        self.mounted = false;
        self.records.clear();
        self.revealed.clear();
    }
}
