pub mod args;
pub mod error;
pub mod naming;
pub mod secret;
