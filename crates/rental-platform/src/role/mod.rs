//! Role aggregate: the fixed Customer/Staff/Admin set.

pub mod entity;

pub use entity::Role;
