//! Schema-object synthesis: descriptions, shared objects, the memoized
//! dynamic factory, the sink boundary and the two-phase binder.

pub mod builder;
pub mod factory;
pub mod objects;
pub mod shared;
pub mod sink;
