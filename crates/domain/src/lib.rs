//! Redzone Domain Layer
pub mod config;
pub mod errors;
pub mod mask;
pub mod record;
pub mod rrset;
pub mod store_keys;
pub mod zone;

pub use config::{CliOverrides, Config, ConfigError};
pub use errors::DomainError;
pub use mask::{Mask, MaskState};
pub use record::Record;
pub use rrset::{RRSetData, RRSetType};
pub use store_keys::{KeyLayout, KeyPart, KeyRole, KeyTarget};
pub use zone::{LocationMatch, LocationMatcher, MatchClass, ZoneConfig};
