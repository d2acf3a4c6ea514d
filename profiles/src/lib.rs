pub mod active;
pub mod linker;
pub mod refresher;
pub mod sts;
