pub mod context;
pub mod error;
pub mod hash;
pub mod ident;

pub use context::{Principal, RegistryConfig, RegistryContext};
pub use error::ErrorKind;
pub use hash::{ContentHash, ContentHasher, HashParseError};
pub use ident::{BaseIdentifier, Channel, ChannelParseError, Identifier, IdentifierParseError};
