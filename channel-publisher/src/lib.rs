//! Atomic channel publication state machine (SPEC_FULL.md §4.5).

mod delete;
mod error;
mod publish;

pub use delete::delete_entity;
pub use error::ChannelPublisherError;
pub use publish::publish;
