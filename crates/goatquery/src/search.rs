//! Free-text search hook.
//!
//! Search text has no grammar of its own. The caller supplies a
//! [`SearchBinder`] that turns the text into a predicate over its record
//! type, typically by matching a few well-known fields.

/// A caller-built test over one record.
pub type SearchPredicate<T> = Box<dyn Fn(&T) -> bool + Send + Sync>;

/// Turns search text into a predicate.
///
/// Returning `None` means the text could not be bound, which fails the query.
///
/// Closures with the matching signature implement this trait:
///
/// ```
/// use goatquery_rs::search::{SearchBinder, SearchPredicate};
///
/// struct User {
///     name: String,
/// }
///
/// let binder = |text: &str| -> Option<SearchPredicate<User>> {
///     let needle = text.to_lowercase();
///     Some(Box::new(move |user: &User| user.name.to_lowercase().contains(&needle)))
/// };
///
/// let predicate = binder.bind("jo").unwrap();
/// assert!(predicate(&User { name: "John".into() }));
/// ```
pub trait SearchBinder<T> {
    /// Builds a predicate for the given search text.
    fn bind(&self, text: &str) -> Option<SearchPredicate<T>>;
}

impl<T, F> SearchBinder<T> for F
where
    F: Fn(&str) -> Option<SearchPredicate<T>>,
{
    fn bind(&self, text: &str) -> Option<SearchPredicate<T>> {
        self(text)
    }
}
