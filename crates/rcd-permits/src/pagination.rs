//! Offset/limit paging shared by every list query.

use serde::Serialize;

pub const DEFAULT_PAGE_LIMIT: u32 = 20;
pub const MAX_PAGE_LIMIT: u32 = 100;

/// Window requested by a table view, always clamped to sane bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageRequest {
    pub offset: u32,
    pub limit: u32,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: DEFAULT_PAGE_LIMIT,
        }
    }
}

impl PageRequest {
    /// Clamp raw client values: negative offsets become 0 and the limit lands in `1..=MAX_PAGE_LIMIT`.
    pub fn new(offset: Option<i64>, limit: Option<i64>) -> Self {
        let offset = offset.unwrap_or(0).clamp(0, u32::MAX as i64) as u32;
        let limit = limit
            .unwrap_or(DEFAULT_PAGE_LIMIT as i64)
            .clamp(1, MAX_PAGE_LIMIT as i64) as u32;
        Self { offset, limit }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total_count: u64,
    pub offset: u32,
    pub limit: u32,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total_count: u64, request: PageRequest) -> Self {
        Self {
            items,
            total_count,
            offset: request.offset,
            limit: request.limit,
        }
    }

    pub fn page_count(&self) -> u64 {
        if self.total_count == 0 {
            return 0;
        }
        let limit = u64::from(self.limit.max(1));
        self.total_count.div_ceil(limit)
    }

    /// Zero-based index of the page this window starts on.
    pub fn page_index(&self) -> u64 {
        u64::from(self.offset) / u64::from(self.limit.max(1))
    }

    pub fn has_next_page(&self) -> bool {
        u64::from(self.offset) + (self.items.len() as u64) < self.total_count
    }

    pub fn has_previous_page(&self) -> bool {
        self.offset > 0
    }

    pub fn map<U, F>(self, f: F) -> Page<U>
    where
        F: FnMut(T) -> U,
    {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total_count: self.total_count,
            offset: self.offset,
            limit: self.limit,
        }
    }
}
