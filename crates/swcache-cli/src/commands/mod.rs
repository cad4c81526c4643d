//! Command implementations for the swcache CLI
//!
//! Each lifecycle event and maintenance task lives in its own submodule.

mod activate;
mod clear;
mod fetch;
mod install;
mod message;
mod status;

pub use activate::execute as activate;
pub use clear::execute as clear_slots;
pub use fetch::execute as fetch;
pub use install::execute as install;
pub use message::execute as message;
pub use status::execute as show_status;
