//! Session gallery for the photo album.
//!
//! A [`GalleryStore`] is the in-memory, authoritative collection for one
//! session. It never performs I/O on its own apart from the initial ledger
//! load; persistence is always an explicit [`save_gallery`] call, usually
//! issued by a [`BatchOperation`] after it has mutated the collection.
//!
//! The [`SelectionState`] lives inside the gallery so removing a record also
//! drops its selection entry.

pub mod batch;
pub mod error;
pub mod selection;
pub mod store;
pub mod sync;

pub use batch::{BatchKind, BatchOperation, BatchReport, ItemFailure, TagEdit};
pub use error::{GalleryError, GalleryResult};
pub use selection::SelectionState;
pub use store::{GalleryStore, Snapshot};
pub use sync::{save_gallery, WritePolicy};
