use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use dbt_error::{AdapterError, AdapterErrorKind, AdapterResult, AsyncAdapterResult};
use tokio::sync::mpsc;

use super::MAX_CONNECTIONS;

pub type NewConnectionFn<C> = Box<dyn Fn() -> AdapterResult<C> + Send + Sync>;
pub type MapFn<C, K, V> = Box<dyn Fn(&mut C, &K) -> AdapterResult<V> + Send + Sync>;
pub type ReduceFn<Acc, K, V> =
    Box<dyn FnMut(&mut Acc, K, AdapterResult<V>) -> AdapterResult<()> + Send>;

fn panic_error(payload: Box<dyn Any + Send>) -> AdapterError {
    let detail = payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic payload".to_string());
    AdapterError::new(
        AdapterErrorKind::Internal,
        format!("task panicked: {detail}"),
    )
}

/// A bounded pool of blocking workers that map keys to values over
/// per-worker connections, and fold every result into one accumulator.
///
/// Workers claim keys from a shared queue. Each worker opens its connection
/// on first use, and tries again on its next key if the open fails. Results
/// flow through a single channel to the reducer, which is the only code that
/// touches the accumulator.
pub struct MapReduce<C, K, V, Acc> {
    new_connection_f: NewConnectionFn<C>,
    map_f: MapFn<C, K, V>,
    reduce_f: ReduceFn<Acc, K, V>,
    max_workers: usize,
}

impl<C, K, V, Acc> MapReduce<C, K, V, Acc>
where
    C: 'static,
    K: Clone + Send + Sync + 'static,
    V: Send + 'static,
    Acc: Default + Send + 'static,
{
    /// `max_workers == 0` means [MAX_CONNECTIONS].
    pub fn new(
        new_connection_f: NewConnectionFn<C>,
        map_f: MapFn<C, K, V>,
        reduce_f: ReduceFn<Acc, K, V>,
        max_workers: usize,
    ) -> Self {
        let max_workers = if max_workers == 0 {
            MAX_CONNECTIONS
        } else {
            max_workers.min(MAX_CONNECTIONS)
        };
        Self {
            new_connection_f,
            map_f,
            reduce_f,
            max_workers,
        }
    }

    pub fn max_workers(&self) -> usize {
        self.max_workers
    }

    /// Map every key and reduce the results, in completion order.
    ///
    /// A map failure, including a panic inside the map function, is handed to
    /// the reducer like any other result; only an error returned by the
    /// reducer itself ends the run early.
    pub fn run(self, keys: Arc<Vec<K>>) -> AsyncAdapterResult<'static, Acc> {
        Box::pin(async move {
            let mut acc = Acc::default();
            let num_workers = self.max_workers.min(keys.len());
            if num_workers == 0 {
                return Ok(acc);
            }

            let next = Arc::new(AtomicUsize::new(0));
            let new_connection_f = Arc::new(self.new_connection_f);
            let map_f = Arc::new(self.map_f);
            let (tx, mut rx) = mpsc::unbounded_channel::<(usize, AdapterResult<V>)>();

            let mut workers = Vec::with_capacity(num_workers);
            for _ in 0..num_workers {
                let next = next.clone();
                let keys = keys.clone();
                let new_connection_f = new_connection_f.clone();
                let map_f = map_f.clone();
                let tx = tx.clone();
                workers.push(tokio::task::spawn_blocking(move || {
                    let mut conn: Option<C> = None;
                    loop {
                        let idx = next.fetch_add(1, Ordering::Relaxed);
                        let Some(key) = keys.get(idx) else {
                            break;
                        };
                        if conn.is_none() {
                            match new_connection_f() {
                                Ok(c) => conn = Some(c),
                                Err(e) => {
                                    if tx.send((idx, Err(e))).is_err() {
                                        break;
                                    }
                                    continue;
                                }
                            }
                        }
                        let Some(c) = conn.as_mut() else {
                            continue;
                        };
                        let res = match panic::catch_unwind(AssertUnwindSafe(|| map_f(c, key))) {
                            Ok(res) => res,
                            Err(payload) => {
                                // the connection may be mid-request; open a fresh one
                                conn = None;
                                Err(panic_error(payload))
                            }
                        };
                        // the reducer has stopped listening
                        if tx.send((idx, res)).is_err() {
                            break;
                        }
                    }
                }));
            }
            drop(tx);

            let mut reduce_f = self.reduce_f;
            while let Some((idx, res)) = rx.recv().await {
                reduce_f(&mut acc, keys[idx].clone(), res)?;
            }
            for worker in workers {
                worker.await?;
            }
            Ok(acc)
        })
    }
}
