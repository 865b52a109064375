//! This crate provides common funcionality shared by the reservoir crates

#![deny(unused_imports, unused_crate_dependencies)]
#![warn(missing_docs)]

mod activation;
mod rc_trait;
mod stack;

pub use activation::Activation;
pub use rc_trait::RCParams;
pub use stack::hstack;
