//! Benchmarks for low-level primitives.

mod bus;
mod envelope;
mod ramp;

pub use bus::bench_bus;
pub use envelope::bench_envelope;
pub use ramp::bench_ramp;
