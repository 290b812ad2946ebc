//! # Genhoot Game Library
//!
//! This library provides the core logic for the Genhoot live trivia system:
//! the host-owned session state machine, answer correctness and scoring,
//! per-round answer aggregation, the host→players synchronization protocol,
//! session persistence/resumption, leaderboards, and game history records.
//!
//! Rendering, quiz authoring, authentication, and the concrete realtime
//! transport are external collaborators; this crate only defines the
//! interfaces they plug into.

#![cfg_attr(all(coverage_nightly, test), feature(coverage_attribute))]
#![deny(missing_docs)]
#![deny(rustdoc::missing_crate_level_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::too_many_arguments)]
#![allow(clippy::similar_names)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::ignored_unit_patterns)]
#![allow(clippy::struct_field_names)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::wildcard_imports)]
use derive_where::derive_where;
use itertools::Itertools;
use serde::Serialize;

pub mod constants;

pub mod answers;
pub mod game_pin;
pub mod history;
pub mod host;
pub mod leaderboard;
pub mod player;
pub mod quiz;
pub mod roster;
pub mod scoring;
pub mod session;
pub mod store;
pub mod sync;

/// A truncated vector that maintains the exact count while limiting displayed items
///
/// Used for views that show a limited number of entries while still reporting
/// the total, such as the "Top 5" leaderboard over a larger player roster.
#[derive(Debug, Clone, Serialize)]
#[derive_where(Default)]
pub struct TruncatedVec<T> {
    /// The exact total count of items
    exact_count: usize,
    /// The truncated list of items (up to the limit)
    items: Vec<T>,
}

impl<T: Clone> TruncatedVec<T> {
    /// Creates a new truncated vector from an iterator
    ///
    /// # Arguments
    ///
    /// * `list` - An iterator over items to include
    /// * `limit` - Maximum number of items to include in the truncated vector
    /// * `exact_count` - The exact total count of items (may be larger than limit)
    ///
    /// # Returns
    ///
    /// A new `TruncatedVec` containing up to `limit` items from the iterator
    pub fn new<I: Iterator<Item = T>>(list: I, limit: usize, exact_count: usize) -> Self {
        let items = list.take(limit).collect_vec();
        Self { exact_count, items }
    }

    /// Maps a function over the items in the truncated vector
    pub fn map<F, U>(self, f: F) -> TruncatedVec<U>
    where
        F: Fn(T) -> U,
    {
        TruncatedVec {
            exact_count: self.exact_count,
            items: self.items.into_iter().map(f).collect_vec(),
        }
    }

    /// Returns the exact count of items
    pub fn exact_count(&self) -> usize {
        self.exact_count
    }

    /// Returns the truncated items
    pub fn items(&self) -> &[T] {
        &self.items
    }
}
