//! # types
//!
//! `types` is the module containing the network model and the boundary types of the crate

pub mod bus;
pub mod canframe;
pub mod errors;
pub mod message;
pub mod network;
pub mod node;
pub mod signal;
