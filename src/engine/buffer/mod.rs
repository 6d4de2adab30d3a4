use std::sync::Arc;
use ringbuf::{
    traits::{Consumer, Observer, Producer, Split},
    HeapRb,
    CachingProd,
    CachingCons,
};

// Lock-free SPSC transport between the sound feeder thread and the output
// callback.

/// Producer handle for the audio buffer. Used by the sound feeder.
pub struct AudioBufferProducer {
    inner: CachingProd<Arc<HeapRb<f32>>>,
}

/// Consumer handle for the audio buffer. Used by the output callback.
pub struct AudioBufferConsumer {
    inner: CachingCons<Arc<HeapRb<f32>>>,
}

impl AudioBufferProducer {
    /// Pushes a slice of samples into the buffer.
    /// Returns the number of samples successfully pushed.
    pub fn push_slice(&mut self, samples: &[f32]) -> usize {
        self.inner.push_slice(samples)
    }

    /// Returns the number of free spaces in the buffer.
    pub fn vacant_len(&self) -> usize {
        self.inner.vacant_len()
    }
}

impl AudioBufferConsumer {
    /// Pops a single sample from the buffer.
    /// Returns None if the buffer is empty.
    pub fn pop(&mut self) -> Option<f32> {
        self.inner.try_pop()
    }

    /// Drops everything currently queued.
    pub fn clear(&mut self) -> usize {
        self.inner.clear()
    }

    /// Returns the number of samples available in the buffer.
    pub fn occupied_len(&self) -> usize {
        self.inner.occupied_len()
    }
}

/// Creates a new audio buffer with the specified capacity.
/// Returns a (Producer, Consumer) pair.
pub fn create_audio_buffer(capacity: usize) -> (AudioBufferProducer, AudioBufferConsumer) {
    let rb = HeapRb::<f32>::new(capacity);
    let (prod, cons) = rb.split();
    (
        AudioBufferProducer { inner: prod },
        AudioBufferConsumer { inner: cons },
    )
}
