//! Shipped [`Link`](crate::Link) implementations.

mod replay;

pub use replay::ReplayLink;
