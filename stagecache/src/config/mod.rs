//! Cache machine configuration.
//!
//! Tier limits and the spill location can be built in code with
//! [`CacheConfig`]'s `with_*` setters or loaded from an INI file:
//!
//! ```ini
//! [device]
//! limit = 4GB
//! threshold = 0.9
//!
//! [host]
//! limit = 16GB
//!
//! [disk]
//! limit = 100GB
//!
//! [spill]
//! directory = /var/tmp/stagecache
//! ```
//!
//! A tier whose `limit` is `none` is not tracked.

mod file;
mod parser;
mod settings;
mod size;

pub use file::ConfigError;
pub use settings::{
    CacheConfig, TierSettings, DEFAULT_DEVICE_LIMIT, DEFAULT_DISK_LIMIT, DEFAULT_HOST_LIMIT,
};
pub use size::{format_size, parse_size, SizeParseError};
