//! Sort and filter engine shared by the documents, members and groups views.
//!
//! [`apply_filter`] is pure: it borrows the cached records, orders them with a
//! stable comparator and applies the active [`FilterCriteria`].

mod compare;

#[cfg(test)]
mod tests;

pub use compare::FieldValue;

use crate::constants::ROLE_FILTER_ALL;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// Field accessors the engine needs from a listed record.
pub trait Filterable {
    fn record_id(&self) -> &str;

    fn record_name(&self) -> &str;

    /// Derived tag matched by the type filter.
    fn type_tag(&self) -> Option<String> {
        None
    }

    /// Timestamp matched by the date-range filter.
    fn timestamp(&self) -> Option<DateTime<Utc>> {
        None
    }

    /// Role or category matched by the role filter.
    fn role_tag(&self) -> Option<&str> {
        None
    }

    /// Sortable value for the column `field`.
    fn field(&self, field: &str) -> FieldValue<'_>;
}

/// Sort direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Order {
    #[default]
    Asc,
    Desc,
}

impl Order {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }

    /// The opposite direction.
    pub fn flipped(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }
}

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Order {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            other => Err(format!("unknown sort order '{}'", other)),
        }
    }
}

/// Active filters for one view.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterCriteria {
    /// Case-insensitive substring matched against the record name.
    pub name: String,
    /// Allowed type tags; empty means unconstrained.
    pub types: BTreeSet<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    /// Set by the date pickers when the entered range is invalid.
    pub date_error: bool,
    /// Exact role match; `None` or `"all"` disables it.
    pub role: Option<String>,
}

impl FilterCriteria {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.types = types
            .into_iter()
            .map(|tag| tag.into().to_ascii_lowercase())
            .collect();
        self
    }

    pub fn with_date_range(
        mut self,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> Self {
        self.start_date = start;
        self.end_date = end;
        self.date_error = matches!((start, end), (Some(start), Some(end)) if start > end);
        self
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }

    /// Add `tag` to the type filter, or remove it when already present.
    pub fn toggle_type(&mut self, tag: &str) {
        let tag = tag.to_ascii_lowercase();
        if !self.types.remove(&tag) {
            self.types.insert(tag);
        }
    }

    /// Reset every criterion.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Both bounds present, not flagged, and ordered.
    pub fn date_range_applies(&self) -> bool {
        match (self.start_date, self.end_date) {
            (Some(start), Some(end)) => !self.date_error && start <= end,
            _ => false,
        }
    }

    fn active_name(&self) -> Option<String> {
        let name = self.name.trim();
        (!name.is_empty()).then(|| name.to_lowercase())
    }

    fn active_role(&self) -> Option<&str> {
        self.role
            .as_deref()
            .map(str::trim)
            .filter(|role| !role.is_empty() && !role.eq_ignore_ascii_case(ROLE_FILTER_ALL))
    }

    /// Whether any criterion was entered, applied or not.
    pub fn is_filtered(&self) -> bool {
        self.active_name().is_some()
            || !self.types.is_empty()
            || self.start_date.is_some()
            || self.end_date.is_some()
            || self.active_role().is_some()
    }

    fn constrains(&self) -> bool {
        self.active_name().is_some()
            || !self.types.is_empty()
            || self.date_range_applies()
            || self.active_role().is_some()
    }
}

/// Display-ready result of [`apply_filter`].
#[derive(Debug)]
pub struct FilteredView<'a, R> {
    pub rows: Vec<&'a R>,
    /// Empty result caused by an active criterion.
    pub is_not_found: bool,
    /// Some criterion is set; drives the "clear filters" affordance.
    pub is_filtered: bool,
}

impl<'a, R: Filterable> FilteredView<'a, R> {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Ids of every filtered row, in display order.
    pub fn ids(&self) -> Vec<String> {
        self.rows
            .iter()
            .map(|row| row.record_id().to_string())
            .collect()
    }
}

/// Comparator over `order_by`; [`Order::Desc`] puts larger values first.
pub fn get_comparator<R: Filterable>(order: Order, order_by: &str) -> impl Fn(&R, &R) -> Ordering {
    let field = order_by.to_string();
    move |a: &R, b: &R| {
        let ordering = a.field(&field).compare(&b.field(&field));
        match order {
            Order::Asc => ordering,
            Order::Desc => ordering.reverse(),
        }
    }
}

/// Sort `records` stably with `comparator`, then apply `criteria`.
///
/// `None` records behave as an empty collection.
pub fn apply_filter<'a, R, F>(
    records: Option<&'a [R]>,
    comparator: F,
    criteria: &FilterCriteria,
) -> FilteredView<'a, R>
where
    R: Filterable,
    F: Fn(&R, &R) -> Ordering,
{
    let records = records.unwrap_or_default();
    let mut indexed: Vec<(usize, &'a R)> = records.iter().enumerate().collect();
    indexed.sort_by(|(left_idx, left), (right_idx, right)| {
        comparator(left, right).then_with(|| left_idx.cmp(right_idx))
    });
    let mut rows: Vec<&'a R> = indexed.into_iter().map(|(_, record)| record).collect();

    if let Some(needle) = criteria.active_name() {
        rows.retain(|record| record.record_name().to_lowercase().contains(&needle));
    }
    if !criteria.types.is_empty() {
        rows.retain(|record| {
            record
                .type_tag()
                .is_some_and(|tag| criteria.types.contains(&tag.to_ascii_lowercase()))
        });
    }
    if criteria.date_range_applies() {
        if let (Some(start), Some(end)) = (criteria.start_date, criteria.end_date) {
            let (start, end) = (start.timestamp_millis(), end.timestamp_millis());
            rows.retain(|record| {
                record
                    .timestamp()
                    .map(|ts| ts.timestamp_millis())
                    .is_some_and(|millis| start <= millis && millis <= end)
            });
        }
    }
    if let Some(role) = criteria.active_role() {
        rows.retain(|record| {
            record
                .role_tag()
                .is_some_and(|tag| tag.trim().eq_ignore_ascii_case(role))
        });
    }

    let is_not_found = rows.is_empty() && criteria.constrains();
    debug!(
        total = records.len(),
        shown = rows.len(),
        is_not_found,
        "applied filter"
    );
    FilteredView {
        rows,
        is_not_found,
        is_filtered: criteria.is_filtered(),
    }
}
