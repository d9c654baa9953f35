use std::sync::atomic::{fence, AtomicU64, Ordering};

/// A new target for one parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetRequest {
    pub value: f64,
    pub ramp_seconds: f64,
}

/// Single-writer, single-reader handoff for one parameter target.
///
/// The writer bumps `version` to an odd number, stores the payload, then
/// bumps it to the next even number (a seqlock). The reader only accepts a
/// payload when it saw the same even version before and after reading it. A
/// read that races a write is skipped and picked up on the next block, so the
/// reader never spins.
///
/// The slot also carries the value last published by the audio side, so the
/// control side can read parameters back without touching the bus.
#[derive(Debug)]
pub struct TargetSlot {
    version: AtomicU64,
    value: AtomicU64,
    ramp_seconds: AtomicU64,
    published: AtomicU64,
}

impl TargetSlot {
    pub fn new(initial: f64) -> Self {
        Self {
            version: AtomicU64::new(0),
            value: AtomicU64::new(initial.to_bits()),
            ramp_seconds: AtomicU64::new(0.0f64.to_bits()),
            published: AtomicU64::new(initial.to_bits()),
        }
    }

    /// Publish a new target. Must only be called from one thread.
    pub fn write(&self, request: TargetRequest) {
        let version = self.version.load(Ordering::Relaxed);
        self.version.store(version.wrapping_add(1), Ordering::Relaxed);
        fence(Ordering::Release);

        self.value.store(request.value.to_bits(), Ordering::Relaxed);
        self.ramp_seconds
            .store(request.ramp_seconds.to_bits(), Ordering::Relaxed);

        self.version.store(version.wrapping_add(2), Ordering::Release);
    }

    /// Read the target if it changed since `last_seen`.
    ///
    /// Returns `None` when nothing new was written or a write is in progress.
    pub fn read_if_newer(&self, last_seen: &mut u64) -> Option<TargetRequest> {
        let before = self.version.load(Ordering::Acquire);
        if before == *last_seen || before & 1 == 1 {
            return None;
        }

        let value = f64::from_bits(self.value.load(Ordering::Relaxed));
        let ramp_seconds = f64::from_bits(self.ramp_seconds.load(Ordering::Relaxed));

        fence(Ordering::Acquire);
        let after = self.version.load(Ordering::Relaxed);
        if before != after {
            return None;
        }

        *last_seen = before;
        Some(TargetRequest {
            value,
            ramp_seconds,
        })
    }

    /// Audio side: record the current (ramped) value for readback.
    #[inline]
    pub fn publish(&self, current: f64) {
        self.published.store(current.to_bits(), Ordering::Relaxed);
    }

    /// Control side: the value last published by the audio side.
    #[inline]
    pub fn published(&self) -> f64 {
        f64::from_bits(self.published.load(Ordering::Relaxed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{sync::Arc, thread};

    #[test]
    fn fresh_slot_has_nothing_to_read() {
        let slot = TargetSlot::new(0.5);
        let mut seen = 0;
        assert_eq!(slot.read_if_newer(&mut seen), None);
        assert_eq!(slot.published(), 0.5);
    }

    #[test]
    fn write_is_read_exactly_once() {
        let slot = TargetSlot::new(0.0);
        let mut seen = 0;

        slot.write(TargetRequest {
            value: 0.8,
            ramp_seconds: 0.01,
        });

        assert_eq!(
            slot.read_if_newer(&mut seen),
            Some(TargetRequest {
                value: 0.8,
                ramp_seconds: 0.01
            })
        );
        assert_eq!(slot.read_if_newer(&mut seen), None);
    }

    #[test]
    fn reader_sees_latest_of_several_writes() {
        let slot = TargetSlot::new(0.0);
        let mut seen = 0;

        for value in [0.1, 0.2, 0.3] {
            slot.write(TargetRequest {
                value,
                ramp_seconds: 0.0,
            });
        }

        let request = slot.read_if_newer(&mut seen).map(|r| r.value);
        assert_eq!(request, Some(0.3));
    }

    #[test]
    fn concurrent_reads_never_tear() {
        let slot = Arc::new(TargetSlot::new(0.0));
        let writer_slot = Arc::clone(&slot);

        // Every write keeps value == ramp_seconds, so a torn read would show
        // a mismatched pair.
        let writer = thread::spawn(move || {
            for i in 1..=20_000u32 {
                let v = f64::from(i);
                writer_slot.write(TargetRequest {
                    value: v,
                    ramp_seconds: v,
                });
            }
        });

        let mut seen = 0;
        let mut last = 0.0;
        while !writer.is_finished() {
            if let Some(request) = slot.read_if_newer(&mut seen) {
                assert_eq!(request.value, request.ramp_seconds);
                assert!(request.value >= last);
                last = request.value;
            }
        }
        writer.join().unwrap();

        // Drain the final write
        if let Some(request) = slot.read_if_newer(&mut seen) {
            last = request.value;
        }
        assert_eq!(last, 20_000.0);
    }
}
