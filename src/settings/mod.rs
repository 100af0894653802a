//! Configuration loading and resolution.
//!
//! `load` layers default files, explicit `--config` files, `VIZION__*`
//! environment variables and CLI flags, then validates the result into a
//! [`ResolvedConfig`].

mod loader;
mod raw;
mod resolved;
mod sources;

pub use loader::load;
pub use resolved::ResolvedConfig;
