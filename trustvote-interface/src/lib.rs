#![deny(missing_docs)]
#![doc = include_str!("../README.md")]

mod address;
mod election;
mod time;

pub mod services;

pub use address::*;
pub use election::*;
pub use time::*;
