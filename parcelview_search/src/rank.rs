// Copyright 2025 the Parcelview Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Address rows and deterministic ranking.
//!
//! ## Ordering
//!
//! Candidates with a positive score are sorted by:
//! 1. score, descending;
//! 2. label, ascending (byte-wise);
//! 3. roll, ascending;
//! 4. latitude, ascending;
//! 5. longitude, ascending;
//! 6. normalized label, ascending.
//!
//! The order is total, so identical inputs produce identical output regardless of
//! the order rows were supplied in.

use alloc::string::String;
use alloc::vec::Vec;
use core::cmp::Ordering;

use crate::score::{normalize, score};

/// One entry of the address index.
#[derive(Clone, Debug, PartialEq)]
pub struct AddressRow {
    /// Display label, e.g. `"123 Main St"`.
    pub label: String,
    /// [`normalize`]d label, computed once.
    pub label_norm: String,
    /// Parcel join identifier.
    pub roll: String,
    /// Latitude of the address point.
    pub lat: f64,
    /// Longitude of the address point.
    pub lng: f64,
}

impl AddressRow {
    /// Build a row, normalizing the label.
    pub fn new(label: impl Into<String>, roll: impl Into<String>, lat: f64, lng: f64) -> Self {
        let label = label.into();
        Self {
            label_norm: normalize(&label),
            label,
            roll: roll.into(),
            lat,
            lng,
        }
    }
}

/// A scored candidate borrowed from the rows it was ranked from.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Ranked<'a> {
    /// The matching row.
    pub row: &'a AddressRow,
    /// Its score; always positive.
    pub score: f64,
}

fn order(a: &Ranked<'_>, b: &Ranked<'_>) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then_with(|| a.row.label.cmp(&b.row.label))
        .then_with(|| a.row.roll.cmp(&b.row.roll))
        .then_with(|| a.row.lat.total_cmp(&b.row.lat))
        .then_with(|| a.row.lng.total_cmp(&b.row.lng))
        .then_with(|| a.row.label_norm.cmp(&b.row.label_norm))
}

/// Rank `rows` against a free-text `query` and keep the best `limit`.
///
/// ```
/// use parcelview_search::{AddressRow, rank};
///
/// let rows = vec![
///     AddressRow::new("123 Main St", "R-1", 45.0, -73.0),
///     AddressRow::new("1234 Main St", "R-2", 45.1, -73.1),
/// ];
/// let out = rank("123 main st.", &rows, 5);
/// assert_eq!(out[0].row.roll, "R-1");
/// assert_eq!(out[0].score, 1000.0);
/// ```
pub fn rank<'a>(query: &str, rows: &'a [AddressRow], limit: usize) -> Vec<Ranked<'a>> {
    let q = normalize(query);
    let mut out: Vec<Ranked<'a>> = rows
        .iter()
        .filter_map(|row| {
            let s = score(&q, &row.label_norm);
            (s > 0.0).then_some(Ranked { row, score: s })
        })
        .collect();
    out.sort_by(order);
    out.truncate(limit);
    out
}

/// An owned, read-only collection of [`AddressRow`]s.
#[derive(Clone, Debug, Default)]
pub struct AddressIndex {
    rows: Vec<AddressRow>,
}

impl AddressIndex {
    /// Create an index from rows. Rows are not mutated afterwards.
    pub fn new(rows: impl IntoIterator<Item = AddressRow>) -> Self {
        Self {
            rows: rows.into_iter().collect(),
        }
    }

    /// All rows in insertion order.
    pub fn rows(&self) -> &[AddressRow] {
        &self.rows
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// True if the index holds no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// See [`rank`].
    pub fn rank(&self, query: &str, limit: usize) -> Vec<Ranked<'_>> {
        rank(query, &self.rows, limit)
    }

    /// The single best candidate, if any scores positive.
    pub fn best(&self, query: &str) -> Option<Ranked<'_>> {
        self.rank(query, 1).into_iter().next()
    }
}
