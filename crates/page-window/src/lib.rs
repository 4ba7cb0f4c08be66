//! Synchronous page windowing over an in-memory collection.
//!
//! [`WindowedListPaginator`] holds a source collection, a page size and a
//! requested page. Every read derives the page count and the visible slice
//! from those three values, so replacing the source never leaves the
//! paginator pointing past the end: the page is clamped when it is read.

mod paginator;

pub use paginator::{PaginationWindow, WindowedListPaginator};
