pub mod closure;
pub mod config;
pub mod cycles;
pub mod partitions;
pub mod source;
