//! Force-directed multilevel graph layout behind a stateless bridge.
//!
//! [`bridge::compute_layout`] turns a graph description and layout
//! parameters into one engine run; [`ffi`] exposes the same call over the
//! C ABI.

pub mod analysis;
pub mod bridge;
pub mod config;
pub mod core;
pub mod export;
pub mod ffi;
pub mod layout;
pub mod model;

pub use bridge::{BridgeError, LayoutResult, compute_layout, compute_layout_with};
pub use crate::core::defs::{EdgeSpec, GraphDescription, LayoutParams, LayoutQuality, NodeSize};
pub use model::{Edge, LayoutGraph, Node};
