//! Flash chip identification
//!
//! Every supported part is described by a [`FlashInfo`] entry in the static
//! [`FLASH_IDS`] table. [`find_by_id`] matches a read-ID response against it
//! in table order, so when two entries share a prefix the first one wins.

mod database;
mod features;
mod types;

pub use database::{find_by_id, find_by_name, FLASH_IDS};
pub use features::Features;
pub use types::*;
