//! Admin API resource models.
//!
//! Only the fields the CLI renders are modelled; everything is optional
//! except the resource `name`, which the API always returns.

pub mod account;
pub mod data_stream;
pub mod property;

pub use account::Account;
pub use data_stream::{
    AndroidAppStreamData, DataStream, IosAppStreamData, NewDataStream, WebStreamData,
};
pub use property::{NewProperty, Property};

/// Trailing ID segment of a resource name (`properties/123` -> `123`)
pub fn short_id(name: &str) -> &str {
    name.rsplit('/').next().unwrap_or(name)
}
