// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Zero-based page requests and page results.

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Page size used when the caller does not supply one.
pub const DEFAULT_ITEMS_PER_PAGE: u32 = 15;

/// A validated, zero-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page_index: u32,
    items_per_page: u32,
}

impl PageRequest {
    /// Validates raw pagination parameters.
    ///
    /// # Errors
    ///
    /// Returns an error if the index is negative or the size is not positive.
    pub fn new(page_index: i64, items_per_page: i64) -> Result<Self, DomainError> {
        let page_index: u32 = u32::try_from(page_index)
            .map_err(|_| DomainError::InvalidPageIndex { page_index })?;
        let size: u32 = u32::try_from(items_per_page)
            .ok()
            .filter(|size| *size > 0)
            .ok_or(DomainError::InvalidItemsPerPage { items_per_page })?;
        Ok(Self {
            page_index,
            items_per_page: size,
        })
    }

    /// Builds a request from optional parameters, applying the defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if a supplied value is out of range.
    pub fn from_optional(
        page_index: Option<i64>,
        items_per_page: Option<i64>,
    ) -> Result<Self, DomainError> {
        Self::new(
            page_index.unwrap_or(0),
            items_per_page.unwrap_or_else(|| i64::from(DEFAULT_ITEMS_PER_PAGE)),
        )
    }

    #[must_use]
    pub const fn page_index(&self) -> u32 {
        self.page_index
    }

    #[must_use]
    pub const fn items_per_page(&self) -> u32 {
        self.items_per_page
    }

    /// Number of items to skip.
    #[must_use]
    pub fn offset(&self) -> i64 {
        i64::from(self.page_index) * i64::from(self.items_per_page)
    }

    /// Maximum number of items to return.
    #[must_use]
    pub fn limit(&self) -> i64 {
        i64::from(self.items_per_page)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page_index: 0,
            items_per_page: DEFAULT_ITEMS_PER_PAGE,
        }
    }
}

/// One page of results together with the totals needed to navigate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page_number: u32,
    pub items_per_page: u32,
    pub total_results: u64,
    pub total_pages: u64,
}

impl<T> Page<T> {
    /// Wraps one page of items fetched for `request` out of `total_results`.
    #[must_use]
    pub fn new(items: Vec<T>, request: PageRequest, total_results: u64) -> Self {
        let per_page: u64 = u64::from(request.items_per_page());
        Self {
            items,
            page_number: request.page_index(),
            items_per_page: request.items_per_page(),
            total_results,
            total_pages: total_results.div_ceil(per_page),
        }
    }

    /// Paginates an in-memory list.
    #[must_use]
    pub fn from_vec(all: Vec<T>, request: PageRequest) -> Self {
        let total_results: u64 = u64::try_from(all.len()).unwrap_or(u64::MAX);
        let offset: usize = usize::try_from(request.offset()).unwrap_or(usize::MAX);
        let limit: usize = usize::try_from(request.items_per_page()).unwrap_or(usize::MAX);
        let items: Vec<T> = all.into_iter().skip(offset).take(limit).collect();
        Self::new(items, request, total_results)
    }

    /// Transforms the items while keeping the page metadata.
    #[must_use]
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page_number: self.page_number,
            items_per_page: self.items_per_page,
            total_results: self.total_results,
            total_pages: self.total_pages,
        }
    }
}
