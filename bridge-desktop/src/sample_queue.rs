//! Bounded PCM sample queue shared between a decoder thread and the cpal
//! output callback.
//!
//! Unlike a classic overwrite ring, a full queue rejects new samples so the
//! producer can back off; live streams arrive in real time anyway.

use parking_lot::Mutex;
use std::collections::VecDeque;

pub(crate) struct SampleQueue {
    samples: Mutex<VecDeque<f32>>,
    capacity: usize,
}

impl SampleQueue {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            samples: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    /// Append as many samples as fit. Returns the number accepted.
    pub(crate) fn push(&self, samples: &[f32]) -> usize {
        let mut queue = self.samples.lock();
        let free = self.capacity.saturating_sub(queue.len());
        let accepted = free.min(samples.len());
        queue.extend(&samples[..accepted]);
        accepted
    }

    /// Fill `output` from the front of the queue, scaled by `gain`.
    ///
    /// Missing samples are written as silence. Returns the number of real
    /// samples copied.
    pub(crate) fn pop_into(&self, output: &mut [f32], gain: f32) -> usize {
        let mut queue = self.samples.lock();
        let available = queue.len().min(output.len());

        for (slot, sample) in output.iter_mut().zip(queue.drain(..available)) {
            *slot = sample * gain;
        }
        output[available..].fill(0.0);

        available
    }

    pub(crate) fn len(&self) -> usize {
        self.samples.lock().len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub(crate) fn capacity(&self) -> usize {
        self.capacity
    }
}
