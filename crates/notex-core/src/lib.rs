//! # notex-core
//!
//! Core types, traits, and live-update machinery for notex.
//!
//! - [`models`]: the note record and request types shared by server and client
//! - [`events`]: change events and the broadcast registry that fans them out
//! - [`service`]: the mutation API coupling persistence to notification
//! - [`store`]: client-side reconciliation of pushed events into a sorted list

pub mod defaults;
pub mod error;
pub mod events;
pub mod models;
pub mod service;
pub mod store;
pub mod traits;

// Re-export commonly used types at crate root
pub use error::{Error, Result};
pub use events::{BroadcastRegistry, ChangeEvent, DeliveryReport, SubscriberId, Subscription};
pub use models::*;
pub use service::{ChangeNotifier, NoteService};
pub use store::{apply_change, sort_by_latest, ClientStore};
pub use traits::*;
