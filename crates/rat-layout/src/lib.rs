//! Screen-space geometry and n-way splitting for a stack of pagers sharing the
//! same screen, generalised from a single-region layout module to arbitrary splits.

pub mod rect;
pub mod split;

pub use rect::Rect;
pub use split::{even_split, golden_split};
