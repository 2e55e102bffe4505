//! Command handlers. Each handler validates its input, performs the remote
//! work through `CommandContext::call` and writes its rendering to `out`.

pub mod accounts;
pub mod config;
pub mod datastreams;
pub mod properties;
