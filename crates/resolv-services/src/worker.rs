//! The generic single-threaded queue-loop worker described in the
//! concurrency model: a worker owns an inbound channel, drains it strictly
//! FIFO, and runs a handler per message. The harness is generic over the
//! message type so the same loop hosts the finder and the downloader
//! without duplicating the dequeue/dispatch boilerplate; sizing a pool of
//! workers for a service is the caller's decision (`WorkerPool::spawn`'s
//! `workers` argument), matching "typically one pool per service".

use std::future::Future;
use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;

/// A single queue-loop worker hosting one handler.
pub struct ServiceWorker<Msg> {
    sender: mpsc::Sender<Msg>,
    task: JoinHandle<()>,
}

impl<Msg: Send + 'static> ServiceWorker<Msg> {
    /// Spawn a worker with an inbound queue of `capacity` messages, running
    /// `handler` on each in strict arrival order.
    pub fn spawn<F, Fut>(capacity: usize, mut handler: F) -> Self
    where
        F: FnMut(Msg) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send,
    {
        let (sender, mut receiver) = mpsc::channel(capacity);
        let task = tokio::spawn(async move {
            while let Some(message) = receiver.recv().await {
                handler(message).await;
            }
        });
        Self { sender, task }
    }

    /// Post a message to this worker's queue. Causal ordering holds: two
    /// posts from the same caller are delivered in the order they were
    /// sent.
    pub async fn post(&self, message: Msg) -> Result<(), mpsc::error::SendError<Msg>> {
        self.sender.send(message).await
    }

    /// Stop accepting new messages and wait for in-flight and already
    /// queued handlers to finish running. Matches the "a service shuts
    /// down by refusing new messages; in-flight handlers run to
    /// completion" cancellation model — there is no hard-stop here.
    pub async fn shutdown(self) {
        drop(self.sender);
        let _ = self.task.await;
    }
}

/// A pool of `n` workers sharing one inbound queue, for the common case of
/// running several identical workers of a kind concurrently (e.g. several
/// downloader workers pulling from one queue of `FOUND` requirements).
pub struct WorkerPool<Msg> {
    sender: mpsc::Sender<Msg>,
    tasks: Vec<JoinHandle<()>>,
}

impl<Msg: Send + 'static> WorkerPool<Msg> {
    pub fn spawn<F, Fut>(workers: usize, capacity: usize, handler: F) -> Self
    where
        F: Fn(Msg) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send,
    {
        let (sender, receiver) = mpsc::channel(capacity);
        let receiver = Arc::new(Mutex::new(receiver));
        let handler = Arc::new(handler);

        let tasks = (0..workers.max(1))
            .map(|_| {
                let receiver = Arc::clone(&receiver);
                let handler = Arc::clone(&handler);
                tokio::spawn(async move {
                    loop {
                        let message = {
                            let mut receiver = receiver.lock().await;
                            receiver.recv().await
                        };
                        match message {
                            Some(message) => handler(message).await,
                            None => break,
                        }
                    }
                })
            })
            .collect();

        Self { sender, tasks }
    }

    pub async fn post(&self, message: Msg) -> Result<(), mpsc::error::SendError<Msg>> {
        self.sender.send(message).await
    }

    pub async fn shutdown(self) {
        drop(self.sender);
        for task in self.tasks {
            let _ = task.await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn worker_processes_messages_in_fifo_order() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let worker = {
            let seen = Arc::clone(&seen);
            ServiceWorker::spawn(8, move |message: usize| {
                let seen = Arc::clone(&seen);
                async move {
                    seen.lock().await.push(message);
                }
            })
        };

        for i in 0..5 {
            worker.post(i).await.unwrap();
        }
        worker.shutdown().await;

        assert_eq!(*seen.lock().await, vec![0, 1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn pool_processes_every_message_across_its_workers() {
        let count = Arc::new(AtomicUsize::new(0));
        let pool = {
            let count = Arc::clone(&count);
            WorkerPool::spawn(4, 16, move |_: usize| {
                let count = Arc::clone(&count);
                async move {
                    count.fetch_add(1, Ordering::SeqCst);
                }
            })
        };

        for i in 0..20 {
            pool.post(i).await.unwrap();
        }
        pool.shutdown().await;

        assert_eq!(count.load(Ordering::SeqCst), 20);
    }
}
