#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

pub mod config;
pub mod join;
pub mod options;
pub mod value;

pub use config::{ConfigError, RewriteConfig};
pub use join::FilesystemJoin;
pub use options::{Join, JoinFactory, PathsAtChar, ResolverOptions};
pub use value::ValueTransformer;
