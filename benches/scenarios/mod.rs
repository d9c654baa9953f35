//! Real-world scenario benchmarks.
//!
//! These model a host driving an envelope node: many voices, note traffic
//! through the handle, and parameters being automated.

mod node;

pub use node::bench_node;
