//! Inbound message queue
//!
//! Bridges backend delivery threads (MIDI driver callbacks) to the single
//! polling consumer that runs the router. Producers push under a mutex and
//! signal a condition variable once per push; the consumer polls either
//! non-blocking (the tick loop) or blocking.
//!
//! The queue is unbounded: a stalled consumer makes it grow without limit.

use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::trace;

use crate::midi::Message;

/// FIFO hand-off between transport callbacks and the router
pub struct InboundQueue {
    messages: Mutex<VecDeque<Message>>,
    available: Condvar,
    connected: AtomicBool,
}

impl InboundQueue {
    /// Create a queue for a transport that is already connected
    pub fn new() -> Self {
        Self::with_status(true)
    }

    /// Create a queue for a transport that failed to open
    pub fn disconnected() -> Self {
        Self::with_status(false)
    }

    fn with_status(connected: bool) -> Self {
        Self {
            messages: Mutex::new(VecDeque::new()),
            available: Condvar::new(),
            connected: AtomicBool::new(connected),
        }
    }

    /// Append a message and wake one waiting consumer
    pub fn push(&self, message: Message) {
        let mut messages = self.messages.lock();
        messages.push_back(message);
        trace!("Queued message ({} pending)", messages.len());
        drop(messages);
        self.available.notify_one();
    }

    /// Take the oldest message
    ///
    /// With `blocking` set, waits until a message arrives or the transport
    /// disconnects. A disconnected transport always yields `None` immediately.
    pub fn poll(&self, blocking: bool) -> Option<Message> {
        if !self.is_connected() {
            return None;
        }

        let mut messages = self.messages.lock();
        if blocking {
            while messages.is_empty() {
                // Checked under the lock so a concurrent disconnect() cannot slip between
                // this check and the wait
                if !self.is_connected() {
                    return None;
                }
                self.available.wait(&mut messages);
            }
        }
        messages.pop_front()
    }

    /// Whether the underlying transport is connected
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    /// Mark the transport closed and release every blocked consumer
    pub fn disconnect(&self) {
        self.connected.store(false, Ordering::Release);
        let _guard = self.messages.lock();
        self.available.notify_all();
    }

    pub fn len(&self) -> usize {
        self.messages.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.lock().is_empty()
    }
}

impl Default for InboundQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    fn note(n: u8) -> Message {
        Message::NoteOn {
            channel: 0,
            note: n,
            velocity: 100,
        }
    }

    #[test]
    fn test_fifo_order() {
        let queue = InboundQueue::new();
        for n in 0..10 {
            queue.push(note(n));
        }

        for n in 0..10 {
            assert_eq!(queue.poll(false), Some(note(n)));
        }
        assert_eq!(queue.poll(false), None);
    }

    #[test]
    fn test_non_blocking_poll_on_empty_queue() {
        let queue = InboundQueue::new();
        assert!(queue.poll(false).is_none());
        assert!(queue.is_empty());
    }

    #[test]
    fn test_disconnected_queue_never_blocks() {
        let queue = InboundQueue::disconnected();
        queue.push(note(1));

        assert_eq!(queue.len(), 1);
        assert!(queue.poll(true).is_none());
        assert!(queue.poll(false).is_none());
    }

    #[test]
    fn test_blocking_poll_wakes_on_push() {
        let queue = Arc::new(InboundQueue::new());
        let consumer = {
            let queue = queue.clone();
            thread::spawn(move || queue.poll(true))
        };

        thread::sleep(Duration::from_millis(50));
        queue.push(note(42));

        assert_eq!(consumer.join().unwrap(), Some(note(42)));
    }

    #[test]
    fn test_disconnect_releases_blocked_consumer() {
        let queue = Arc::new(InboundQueue::new());
        let consumer = {
            let queue = queue.clone();
            thread::spawn(move || queue.poll(true))
        };

        thread::sleep(Duration::from_millis(50));
        queue.disconnect();

        assert_eq!(consumer.join().unwrap(), None);
        assert!(!queue.is_connected());
    }

    #[test]
    fn test_order_preserved_across_producer_threads() {
        let queue = Arc::new(InboundQueue::new());
        let producers: Vec<_> = (0..4u8)
            .map(|channel| {
                let queue = queue.clone();
                thread::spawn(move || {
                    for n in 0..100u8 {
                        queue.push(Message::NoteOn {
                            channel,
                            note: n,
                            velocity: 1,
                        });
                    }
                })
            })
            .collect();
        for producer in producers {
            producer.join().unwrap();
        }

        // Per-producer order must survive interleaving
        let mut next = [0u8; 4];
        while let Some(Message::NoteOn { channel, note, .. }) = queue.poll(false) {
            assert_eq!(note, next[channel as usize]);
            next[channel as usize] += 1;
        }
        assert_eq!(next, [100; 4]);
    }
}
