//! Photobooth configuration.
//!
//! `BoothConfig` holds every tunable of a session (countdown length, output
//! size, overlays, download name). A process-wide copy lives behind a
//! `parking_lot::RwLock` so a UI layer can batch-update it in one call; a
//! `Photobooth` takes a validated snapshot when it is created.

pub mod booth;

pub use booth::{BoothConfig, BOOTH_CONFIG};
