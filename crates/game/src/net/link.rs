use std::cmp::Ordering;
use std::collections::BinaryHeap;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinkConditions {
    pub loss_percent: f32,
    pub min_latency_ms: u32,
    pub max_latency_ms: u32,
    pub jitter_ms: u32,
}

impl LinkConditions {
    pub fn ideal() -> Self {
        Self::default()
    }

    pub fn fixed_latency(latency_ms: u32) -> Self {
        Self {
            min_latency_ms: latency_ms,
            max_latency_ms: latency_ms,
            ..Default::default()
        }
    }

    fn should_drop(&self, rng: &mut StdRng) -> bool {
        if self.loss_percent <= 0.0 {
            return false;
        }
        rng.gen_range(0.0..100.0f32) < self.loss_percent
    }

    fn delay_ms(&self, rng: &mut StdRng) -> u32 {
        let base = self.min_latency_ms;
        let range = self.max_latency_ms.saturating_sub(self.min_latency_ms);
        let spread = if range > 0 { rng.gen_range(0..=range) } else { 0 };
        let jitter = if self.jitter_ms > 0 {
            rng.gen_range(0..=self.jitter_ms)
        } else {
            0
        };
        base + spread + jitter
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkStats {
    pub packets_sent: u64,
    pub packets_delivered: u64,
    pub packets_dropped: u64,
    pub bytes_sent: u64,
    pub bytes_delivered: u64,
}

#[derive(Debug)]
struct DelayedPacket {
    release_time: f64,
    order: u64,
    data: Vec<u8>,
}

impl PartialEq for DelayedPacket {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for DelayedPacket {}

impl PartialOrd for DelayedPacket {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for DelayedPacket {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed for a min-heap on release time.
        other
            .release_time
            .total_cmp(&self.release_time)
            .then_with(|| other.order.cmp(&self.order))
    }
}

/// One direction of a lossy, delayed link. Time is supplied by the caller in
/// seconds, so runs are reproducible for a given seed.
#[derive(Debug)]
pub struct LinkSimulator {
    conditions: LinkConditions,
    rng: StdRng,
    queue: BinaryHeap<DelayedPacket>,
    next_order: u64,
    stats: LinkStats,
}

impl LinkSimulator {
    pub fn new(conditions: LinkConditions, seed: u64) -> Self {
        Self {
            conditions,
            rng: StdRng::seed_from_u64(seed),
            queue: BinaryHeap::new(),
            next_order: 0,
            stats: LinkStats::default(),
        }
    }

    pub fn conditions(&self) -> &LinkConditions {
        &self.conditions
    }

    pub fn set_conditions(&mut self, conditions: LinkConditions) {
        self.conditions = conditions;
    }

    pub fn stats(&self) -> &LinkStats {
        &self.stats
    }

    pub fn in_flight(&self) -> usize {
        self.queue.len()
    }

    /// Queues `data` for delivery; returns false if the link dropped it.
    pub fn send(&mut self, now: f64, data: Vec<u8>) -> bool {
        self.stats.packets_sent += 1;
        self.stats.bytes_sent += data.len() as u64;

        if self.conditions.should_drop(&mut self.rng) {
            self.stats.packets_dropped += 1;
            log::trace!("link dropped {} byte packet", data.len());
            return false;
        }

        let delay = self.conditions.delay_ms(&mut self.rng) as f64 / 1000.0;
        self.queue.push(DelayedPacket {
            release_time: now + delay,
            order: self.next_order,
            data,
        });
        self.next_order += 1;
        true
    }

    /// Packets whose release time has passed, in release order.
    pub fn receive(&mut self, now: f64) -> Vec<Vec<u8>> {
        let mut packets = Vec::new();
        while self
            .queue
            .peek()
            .is_some_and(|delayed| delayed.release_time <= now)
        {
            if let Some(delayed) = self.queue.pop() {
                self.stats.packets_delivered += 1;
                self.stats.bytes_delivered += delayed.data.len() as u64;
                packets.push(delayed.data);
            }
        }
        packets
    }
}
