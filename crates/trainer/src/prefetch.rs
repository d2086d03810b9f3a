//! Background batch generation.

use std::sync::mpsc::{self, Receiver};
use std::thread::{self, JoinHandle};

use crate::error::{Result, TrainError};

/// Runs a batch generator on a worker thread, buffering up to `capacity`
/// items ahead of the consumer. Iterating a `Prefetch` yields the generator's
/// items in order; a panic in the generator is resumed on the consuming
/// thread.
pub struct Prefetch<T> {
    rx: Receiver<T>,
    producer: Option<JoinHandle<()>>,
}

impl<T: Send + 'static> Prefetch<T> {
    pub fn spawn<I>(generator: I, capacity: usize) -> Result<Self>
    where
        I: IntoIterator<Item = T>,
        I::IntoIter: Send + 'static,
    {
        if capacity == 0 {
            return Err(TrainError::invalid("capacity", "must be at least 1"));
        }

        let (tx, rx) = mpsc::sync_channel::<T>(capacity);
        let generator = generator.into_iter();
        let producer = thread::Builder::new()
            .name("batch-prefetch".to_string())
            .spawn(move || {
                for item in generator {
                    // Receiver dropped: consumer is done with us.
                    if tx.send(item).is_err() {
                        return;
                    }
                }
            })?;

        Ok(Self {
            rx,
            producer: Some(producer),
        })
    }
}

impl<T> Iterator for Prefetch<T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        match self.rx.recv() {
            Ok(item) => Some(item),
            Err(_) => {
                // Channel closed: the generator ended or the worker panicked.
                if let Some(handle) = self.producer.take() {
                    if let Err(payload) = handle.join() {
                        log::error!("batch prefetch thread panicked");
                        std::panic::resume_unwind(payload);
                    }
                }
                None
            }
        }
    }
}
