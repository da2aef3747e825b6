//! Query engine for the photo album.
//!
//! Pure functions over a snapshot of the collection: no I/O, no hidden
//! state, and the input slice is never modified. The same snapshot and
//! [`Query`] always produce the same ordered result.
//!
//! - [`query`] -- filter predicates and sort keys, [`run`]
//! - [`facets`] -- scans that feed filter pickers (known tags, albums, years)

pub mod facets;
pub mod query;

pub use facets::{albums, known_tags, months, tag_counts, years};
pub use query::{matches, run, Query, SortKey, UnknownSortKey};
