//! Pagination, selection and sort state for one table view.

use crate::constants::{DEFAULT_ROWS_PER_PAGE, DENSE_ROW_HEIGHT, REGULAR_ROW_HEIGHT};
use crate::query::Order;
use std::ops::Range;
use tracing::debug;

/// Per-view table state. Pages are 0-based.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableState {
    page: usize,
    rows_per_page: usize,
    selected: Vec<String>,
    dense: bool,
    order: Order,
    order_by: String,
}

impl Default for TableState {
    fn default() -> Self {
        Self::new(DEFAULT_ROWS_PER_PAGE)
    }
}

impl TableState {
    /// Fresh state on page 0, sorted ascending by `name`.
    pub fn new(rows_per_page: usize) -> Self {
        Self {
            page: 0,
            rows_per_page: rows_per_page.max(1),
            selected: Vec::new(),
            dense: false,
            order: Order::Asc,
            order_by: "name".to_string(),
        }
    }

    pub fn with_order(mut self, order_by: impl Into<String>, order: Order) -> Self {
        self.set_order(order_by, order);
        self
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn rows_per_page(&self) -> usize {
        self.rows_per_page
    }

    /// Selected ids in selection order.
    pub fn selected(&self) -> &[String] {
        &self.selected
    }

    pub fn dense(&self) -> bool {
        self.dense
    }

    pub fn order(&self) -> Order {
        self.order
    }

    pub fn order_by(&self) -> &str {
        &self.order_by
    }

    pub fn set_page(&mut self, page: usize) {
        self.page = page;
    }

    /// Change the page size; always returns to page 0.
    pub fn set_rows_per_page(&mut self, rows_per_page: usize) {
        self.rows_per_page = rows_per_page.max(1);
        self.page = 0;
    }

    /// Return to page 0, e.g. after a filter change.
    pub fn reset_page(&mut self) {
        self.page = 0;
    }

    pub fn set_dense(&mut self, dense: bool) {
        self.dense = dense;
    }

    pub fn set_order(&mut self, order_by: impl Into<String>, order: Order) {
        self.order_by = order_by.into();
        self.order = order;
    }

    /// Header click: ascending on a new column, toggled on the current one.
    pub fn sort_by(&mut self, field: &str) {
        if field.is_empty() {
            return;
        }
        let order = if self.order_by == field && self.order == Order::Asc {
            Order::Desc
        } else {
            Order::Asc
        };
        self.set_order(field, order);
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.selected.iter().any(|selected| selected == id)
    }

    /// Toggle `id` in the selection.
    pub fn select_row(&mut self, id: &str) {
        if let Some(pos) = self.selected.iter().position(|selected| selected == id) {
            self.selected.remove(pos);
        } else {
            self.selected.push(id.to_string());
        }
    }

    /// Header checkbox: select every id in `all_ids`, or clear.
    pub fn select_all<I, S>(&mut self, checked: bool, all_ids: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.selected = if checked {
            all_ids.into_iter().map(Into::into).collect()
        } else {
            Vec::new()
        };
    }

    pub fn clear_selection(&mut self) {
        self.selected.clear();
    }

    /// Drop deleted ids from the selection.
    pub fn prune_selection<S: AsRef<str>>(&mut self, removed_ids: &[S]) {
        self.selected
            .retain(|id| !removed_ids.iter().any(|removed| removed.as_ref() == id));
    }

    /// Move the page back after `removed_count` rows left the filtered collection.
    ///
    /// `page_len` is the number of rows the current page showed before the
    /// removal; `total_remaining` is the filtered count afterwards.
    pub fn recompute_page_after_removal(
        &mut self,
        removed_count: usize,
        page_len: usize,
        total_filtered: usize,
        total_remaining: usize,
    ) {
        if self.page == 0 || removed_count == 0 {
            return;
        }
        let before = self.page;
        if removed_count == page_len {
            self.page -= 1;
        } else if removed_count == total_filtered {
            self.page = 0;
        } else if removed_count > page_len {
            self.page = total_remaining
                .div_ceil(self.rows_per_page)
                .saturating_sub(1);
        }
        self.page = self.page.min(self.last_page(total_remaining));
        if self.page != before {
            debug!(from = before, to = self.page, removed_count, "page moved after removal");
        }
    }

    /// Prune the selection and settle the page after a delete.
    pub fn on_rows_removed<S: AsRef<str>>(
        &mut self,
        removed_ids: &[S],
        page_len: usize,
        total_filtered: usize,
    ) {
        let removed = removed_ids.len();
        self.prune_selection(removed_ids);
        self.recompute_page_after_removal(
            removed,
            page_len,
            total_filtered,
            total_filtered.saturating_sub(removed),
        );
    }

    /// Number of pages needed for `total` rows (at least 1).
    pub fn page_count(&self, total: usize) -> usize {
        total.div_ceil(self.rows_per_page).max(1)
    }

    fn last_page(&self, total: usize) -> usize {
        self.page_count(total) - 1
    }

    /// Index range of the current page within `total` rows.
    pub fn page_range(&self, total: usize) -> Range<usize> {
        let start = self.page.saturating_mul(self.rows_per_page).min(total);
        let end = start.saturating_add(self.rows_per_page).min(total);
        start..end
    }

    /// Rows shown on the current page.
    pub fn page_slice<'a, T>(&self, rows: &'a [T]) -> &'a [T] {
        &rows[self.page_range(rows.len())]
    }

    /// Filler rows keeping the last page's height stable.
    pub fn empty_rows(&self, total: usize) -> usize {
        if self.page == 0 {
            return 0;
        }
        (self.page + 1)
            .saturating_mul(self.rows_per_page)
            .saturating_sub(total)
    }

    pub fn row_height(&self) -> u32 {
        if self.dense {
            DENSE_ROW_HEIGHT
        } else {
            REGULAR_ROW_HEIGHT
        }
    }
}
