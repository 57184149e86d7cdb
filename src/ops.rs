//! Operators over [`Observable`](crate::observable::Observable).

pub mod observe_on;
