//! Thread-safe FIFO with blocking pop.
//!
//! [`BlockingQueue`] is the hand-off point between the application and the
//! client's background workers. Producers never block; consumers park on a
//! condition variable until an item is available.
//!
//! # Example
//! ```rust
//! use mercury::queue::BlockingQueue;
//!
//! let queue = BlockingQueue::new();
//! queue.push("first");
//! queue.push("second");
//!
//! assert_eq!(queue.pop(), "first");
//! assert_eq!(queue.try_pop(), Some("second"));
//! assert!(queue.is_empty());
//! ```
use std::{
    collections::VecDeque,
    sync::{Condvar, Mutex, MutexGuard},
    time::{Duration, Instant},
};

#[derive(Debug)]
pub struct BlockingQueue<T> {
    items: Mutex<VecDeque<T>>,
    not_empty: Condvar,
}

impl<T> Default for BlockingQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> BlockingQueue<T> {
    pub fn new() -> Self {
        Self {
            items: Mutex::new(VecDeque::new()),
            not_empty: Condvar::new(),
        }
    }

    /// Append `item` to the tail and wake one waiting consumer.
    pub fn push(&self, item: T) {
        self.lock().push_back(item);
        self.not_empty.notify_one();
    }

    /// Remove the head item, blocking until one is available.
    pub fn pop(&self) -> T {
        let mut items = self.lock();
        loop {
            if let Some(item) = items.pop_front() {
                return item;
            }
            items = self
                .not_empty
                .wait(items)
                .unwrap_or_else(|poisoned| poisoned.into_inner());
        }
    }

    /// Like [`pop`](Self::pop), but gives up once `timeout` has elapsed with
    /// the queue still empty.
    pub fn pop_timeout(&self, timeout: Duration) -> Option<T> {
        let deadline = Instant::now() + timeout;
        let mut items = self.lock();
        loop {
            if let Some(item) = items.pop_front() {
                return Some(item);
            }

            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return None;
            }

            items = match self.not_empty.wait_timeout(items, remaining) {
                Ok((guard, _)) => guard,
                Err(poisoned) => poisoned.into_inner().0,
            };
        }
    }

    pub fn try_pop(&self) -> Option<T> {
        self.lock().pop_front()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    // Nothing panics while the deque is borrowed, so poisoning never leaves it
    // half-mutated.
    fn lock(&self) -> MutexGuard<'_, VecDeque<T>> {
        self.items
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use std::{
        collections::HashSet,
        sync::{
            Arc,
            atomic::{AtomicUsize, Ordering},
            mpsc,
        },
        thread,
    };

    use super::*;

    #[test]
    fn queue_pops_in_push_order() {
        let queue = BlockingQueue::new();
        for i in 0..100 {
            queue.push(i);
        }

        assert_eq!(queue.len(), 100);
        let popped = (0..100).map(|_| queue.pop()).collect::<Vec<_>>();
        assert_eq!(popped, (0..100).collect::<Vec<_>>());
        assert!(queue.is_empty());
    }

    #[test]
    fn queue_concurrent_producers_and_consumers() {
        const PRODUCERS: usize = 4;
        const CONSUMERS: usize = 3;
        const PER_PRODUCER: usize = 500;

        let queue = Arc::new(BlockingQueue::new());
        let total = PRODUCERS * PER_PRODUCER;
        let (tx, rx) = mpsc::channel();

        let consumers = (0..CONSUMERS)
            .map(|_| {
                let queue = Arc::clone(&queue);
                let tx = tx.clone();
                thread::spawn(move || {
                    // `usize::MAX` marks the end of the stream for one consumer.
                    loop {
                        let item: usize = queue.pop();
                        if item == usize::MAX {
                            break;
                        }
                        tx.send(item).unwrap();
                    }
                })
            })
            .collect::<Vec<_>>();
        drop(tx);

        let producers = (0..PRODUCERS)
            .map(|p| {
                let queue = Arc::clone(&queue);
                thread::spawn(move || {
                    for i in 0..PER_PRODUCER {
                        queue.push(p * PER_PRODUCER + i);
                    }
                })
            })
            .collect::<Vec<_>>();

        for producer in producers {
            producer.join().unwrap();
        }
        for _ in 0..CONSUMERS {
            queue.push(usize::MAX);
        }
        for consumer in consumers {
            consumer.join().unwrap();
        }

        let received = rx.iter().collect::<Vec<_>>();
        assert_eq!(received.len(), total);
        let unique = received.iter().copied().collect::<HashSet<_>>();
        assert_eq!(unique, (0..total).collect::<HashSet<_>>());
    }

    #[test]
    fn queue_pop_blocks_until_push() {
        let queue = Arc::new(BlockingQueue::new());
        let (tx, rx) = mpsc::channel();

        let consumer = {
            let queue = Arc::clone(&queue);
            thread::spawn(move || {
                let item: &str = queue.pop();
                tx.send(item).unwrap();
            })
        };

        assert!(rx.recv_timeout(Duration::from_millis(100)).is_err());

        queue.push("wake");
        assert_eq!(rx.recv_timeout(Duration::from_secs(5)).unwrap(), "wake");
        consumer.join().unwrap();
    }

    #[test]
    fn queue_pop_timeout_elapses_when_empty() {
        let queue: BlockingQueue<u8> = BlockingQueue::new();
        let start = Instant::now();

        assert_eq!(queue.pop_timeout(Duration::from_millis(50)), None);
        assert!(start.elapsed() >= Duration::from_millis(50));
    }

    #[test]
    fn queue_pop_timeout_returns_pushed_item() {
        let queue = Arc::new(BlockingQueue::new());

        let producer = {
            let queue = Arc::clone(&queue);
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(20));
                queue.push(7);
            })
        };

        assert_eq!(queue.pop_timeout(Duration::from_secs(5)), Some(7));
        producer.join().unwrap();
    }

    #[test]
    fn queue_drop_releases_remaining_items() {
        struct Tracked(Arc<AtomicUsize>);

        impl Drop for Tracked {
            fn drop(&mut self) {
                self.0.fetch_add(1, Ordering::SeqCst);
            }
        }

        let dropped = Arc::new(AtomicUsize::new(0));
        let queue = BlockingQueue::new();
        for _ in 0..5 {
            queue.push(Tracked(Arc::clone(&dropped)));
        }

        drop(queue.pop());
        assert_eq!(dropped.load(Ordering::SeqCst), 1);

        drop(queue);
        assert_eq!(dropped.load(Ordering::SeqCst), 5);
    }
}
