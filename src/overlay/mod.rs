//! Decorative frame overlays: the selectable catalog and the image store.

mod catalog;
mod store;

pub use catalog::FrameCatalog;
pub use store::OverlayStore;
