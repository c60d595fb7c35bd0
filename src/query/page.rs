use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::core::{Result, StoreError};
use crate::query::sort::Sort;

/// Pagination request: 1-based page number, page size and sort keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "PageableFields")]
pub struct Pageable {
    size: usize,
    page: usize,
    sorts: Vec<Sort>,
}

/// Wire form of a `Pageable`, checked by `Pageable::new` on the way in.
#[derive(Deserialize)]
struct PageableFields {
    size: usize,
    page: usize,
    #[serde(default)]
    sorts: Vec<Sort>,
}

impl TryFrom<PageableFields> for Pageable {
    type Error = StoreError;

    fn try_from(fields: PageableFields) -> Result<Self> {
        Self::new(fields.size, fields.page, fields.sorts)
    }
}

impl Pageable {
    /// First page of `size` elements.
    pub fn of_size(size: usize) -> Result<Self> {
        Self::new(size, 1, Vec::new())
    }

    pub fn new(size: usize, page: usize, sorts: Vec<Sort>) -> Result<Self> {
        if size == 0 {
            return Err(StoreError::argument("Page size must be at least 1"));
        }
        if page == 0 {
            return Err(StoreError::argument("Page number is 1-based"));
        }
        Ok(Self { size, page, sorts })
    }

    pub fn page(mut self, page: usize) -> Result<Self> {
        if page == 0 {
            return Err(StoreError::argument("Page number is 1-based"));
        }
        self.page = page;
        Ok(self)
    }

    pub fn sort_by(mut self, sort: Sort) -> Self {
        self.sorts.push(sort);
        self
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn page_number(&self) -> usize {
        self.page
    }

    pub fn sorts(&self) -> &[Sort] {
        &self.sorts
    }

    /// Elements before this page: `size * (page - 1)`.
    pub fn skip(&self) -> usize {
        self.size.saturating_mul(self.page.saturating_sub(1))
    }

    /// Same size and sorts, one page further.
    pub fn next(&self) -> Self {
        Self {
            size: self.size,
            page: self.page.saturating_add(1),
            sorts: self.sorts.clone(),
        }
    }
}

/// One window of a larger ordered result.
///
/// The total number of matches is never computed, so `total_elements` and
/// `total_pages` are unsupported.
#[derive(Debug)]
pub struct Page<T> {
    content: Vec<Arc<T>>,
    pageable: Pageable,
}

impl<T> Page<T> {
    pub fn new(content: Vec<Arc<T>>, pageable: Pageable) -> Self {
        Self { content, pageable }
    }

    pub fn content(&self) -> &[Arc<T>] {
        &self.content
    }

    pub fn into_content(self) -> Vec<Arc<T>> {
        self.content
    }

    pub fn pageable(&self) -> &Pageable {
        &self.pageable
    }

    pub fn has_content(&self) -> bool {
        !self.content.is_empty()
    }

    pub fn number_of_elements(&self) -> usize {
        self.content.len()
    }

    pub fn next_pageable(&self) -> Pageable {
        self.pageable.next()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Arc<T>> {
        self.content.iter()
    }

    pub fn total_elements(&self) -> Result<u64> {
        Err(StoreError::unsupported("Page does not track total elements"))
    }

    pub fn total_pages(&self) -> Result<u64> {
        Err(StoreError::unsupported("Page does not track total pages"))
    }
}

impl<T> Clone for Page<T> {
    fn clone(&self) -> Self {
        Self {
            content: self.content.clone(),
            pageable: self.pageable.clone(),
        }
    }
}

impl<'a, T> IntoIterator for &'a Page<T> {
    type Item = &'a Arc<T>;
    type IntoIter = std::slice::Iter<'a, Arc<T>>;

    fn into_iter(self) -> Self::IntoIter {
        self.content.iter()
    }
}

impl<T> IntoIterator for Page<T> {
    type Item = Arc<T>;
    type IntoIter = std::vec::IntoIter<Arc<T>>;

    fn into_iter(self) -> Self::IntoIter {
        self.content.into_iter()
    }
}
