// Copyright 2025 the Parcelview Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Parcelview Search: a deterministic, `no_std` address ranker.
//!
//! ## Overview
//!
//! Free-text address queries are matched against an [`AddressIndex`] of
//! [`AddressRow`]s, each carrying the roll of the parcel it belongs to. The best
//! candidates feed parcel selection.
//!
//! - [`normalize`]: ASCII uppercase, periods and commas removed, whitespace collapsed.
//! - [`score`]: exact (1000) and prefix (800) matches dominate; otherwise token
//!   relationships are summed, plus a bonus when the whole query is a substring.
//! - [`rank`]: positive scores only, sorted with a total tie-break order, truncated.
//!
//! The scorer is intentionally not fuzzy. Ranking is a pure function of its input
//! set: the same rows and query always produce the same ordered output.
//!
//! ## Example
//!
//! ```
//! use parcelview_search::{AddressIndex, AddressRow};
//!
//! let index = AddressIndex::new([
//!     AddressRow::new("12 Rue Saint-Paul", "0042-17", 45.507, -73.553),
//!     AddressRow::new("120 Rue Saint-Paul", "0042-18", 45.508, -73.552),
//! ]);
//! let best = index.best("12 rue saint-paul").unwrap();
//! assert_eq!(best.row.roll, "0042-17");
//! ```
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

pub mod rank;
pub mod score;

pub use rank::{AddressIndex, AddressRow, Ranked, rank};
pub use score::{normalize, score};
