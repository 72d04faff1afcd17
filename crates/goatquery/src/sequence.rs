//! Sequence providers.
//!
//! The pipeline never touches records directly. It hands compiled
//! predicates and sort descriptions to a [`Sequence`], which owns the
//! records and decides how to apply them. `Vec<T>` is the in-memory
//! provider; other providers (a lazily paged remote source, a database
//! cursor) implement the same trait.

use crate::filter::Predicate;
use crate::order_by::OrderBy;
use crate::schema::Entity;
use crate::search::SearchPredicate;

/// An ordered collection of records that accepts query steps.
pub trait Sequence: Sized {
    /// The record type.
    type Item: Entity;

    /// Keeps the records matching a compiled filter.
    fn filter(self, predicate: &Predicate) -> Self;

    /// Keeps the records matching a search predicate.
    fn search(self, predicate: &SearchPredicate<Self::Item>) -> Self;

    /// Returns the number of records.
    fn count(&self) -> usize;

    /// Sorts the records. The sort must be stable.
    fn order_by(self, order: &OrderBy) -> Self;

    /// Drops the first `n` records.
    fn skip(self, n: usize) -> Self;

    /// Keeps at most the first `n` records.
    fn take(self, n: usize) -> Self;
}

impl<T: Entity> Sequence for Vec<T> {
    type Item = T;

    fn filter(mut self, predicate: &Predicate) -> Self {
        self.retain(|item| predicate.matches(item));
        self
    }

    fn search(mut self, predicate: &SearchPredicate<T>) -> Self {
        self.retain(|item| predicate(item));
        self
    }

    fn count(&self) -> usize {
        self.len()
    }

    fn order_by(mut self, order: &OrderBy) -> Self {
        if !order.is_empty() {
            self.sort_by(|a, b| order.compare(a, b));
        }
        self
    }

    fn skip(mut self, n: usize) -> Self {
        let n = n.min(self.len());
        self.drain(..n);
        self
    }

    fn take(mut self, n: usize) -> Self {
        self.truncate(n);
        self
    }
}
