//! Lifecycle management for digit workers
//!

use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};

use crate::memoize::{DigitProducer, Memoizer, MemoSpec, WorkerState};

/// Use a `Context` to create Number instances when you want to free the
/// resources used by those Numbers before the program ends. Closing a
/// Context frees the worker threads of every Number it created. Once a
/// Context is closed, it panics if used to create Numbers.
///
/// Prefer the methods of `Context` over the free standing factory
/// functions: the workers behind Numbers made with the free functions
/// belong to the process-global owner and only go away at process exit.
///
/// Dropping a `Context` closes it.
///
/// # Example
///
/// ```
/// use sqroot::Context;
///
/// let ctx = Context::new();
/// let n = ctx.sqrt(5);
/// assert_eq!(format!("{:.8}", n), "2.2360679");
/// ctx.close();
/// ```
pub struct Context {
    workers: Arc<WorkerState>,
    specs: Mutex<Vec<Arc<Memoizer>>>,
}

impl Context {
    pub fn new() -> Context {
        Context {
            workers: Arc::new(WorkerState::new()),
            specs: Mutex::new(Vec::new()),
        }
    }

    /// Closes this Context, freeing the workers of every Number it
    /// created. Mantissas already materialized stay readable but stop
    /// growing. Close is idempotent.
    pub fn close(&self) {
        let mut specs = self.lock_specs();
        self.workers.close();
        for spec in specs.iter() {
            // Forces each worker through one more chunk so it observes
            // the closed flag and terminates.
            spec.first_n(usize::MAX);
        }
        specs.clear();
    }

    /// The number of live worker threads behind Numbers this Context
    /// created. Returns 0 after `close`.
    pub fn num_workers(&self) -> i64 {
        self.workers.num_active()
    }

    /// Spawns a registered memoizer for `producer`.
    ///
    /// # Panics
    ///
    /// Panics if this Context is closed.
    pub(crate) fn new_memo_spec(&self, producer: DigitProducer) -> MemoSpec {
        let mut specs = self.lock_specs();
        if self.workers.closed() {
            panic!("Context closed");
        }
        let memo = Memoizer::spawn(producer, Arc::clone(&self.workers));
        specs.push(Arc::clone(&memo));
        MemoSpec::new(memo)
    }

    #[cfg(test)]
    pub(crate) fn num_specs(&self) -> usize {
        self.lock_specs().len()
    }

    fn lock_specs(&self) -> MutexGuard<'_, Vec<Arc<Memoizer>>> {
        self.specs.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for Context {
    fn default() -> Context {
        Context::new()
    }
}

impl Drop for Context {
    fn drop(&mut self) {
        self.close();
    }
}

/// Owner of every worker created through the free factory functions.
/// These workers are never drained; they live until process end.
pub(crate) fn global_workers() -> &'static Arc<WorkerState> {
    static GLOBAL: OnceLock<Arc<WorkerState>> = OnceLock::new();
    GLOBAL.get_or_init(|| Arc::new(WorkerState::new()))
}

/// Spawns an unregistered memoizer owned by the process-global owner.
pub(crate) fn global_memo_spec(producer: DigitProducer) -> MemoSpec {
    MemoSpec::new(Memoizer::spawn(producer, Arc::clone(global_workers())))
}

/// The number of live worker threads owned by the process-global owner,
/// i.e. behind Numbers created with the free factory functions. Since
/// those workers are never drained, this count can only be reduced by
/// their mantissas completing naturally.
pub fn num_workers() -> i64 {
    global_workers().num_active()
}

#[cfg(test)]
mod test {
    use std::thread;

    use crate::Context;

    #[test]
    fn close_drains_workers() {
        let ctx = Context::new();
        let n5 = ctx.sqrt(5);
        let n7 = ctx.sqrt(7);
        let n100489 = ctx.sqrt(100489);

        let reader = thread::spawn(move || n5.at(2_000_000));
        assert_eq!(n7.to_string(), "2.645751311064590");
        assert_eq!(n100489.to_string(), "317");

        // The exhausted mantissa's worker is gone; the other two live.
        assert_eq!(ctx.num_workers(), 2);

        ctx.close();

        assert_eq!(ctx.num_workers(), 0);
        assert_eq!(ctx.num_specs(), 0);
        reader.join().unwrap();

        // Idempotent.
        ctx.close();
        assert_eq!(ctx.num_workers(), 0);
    }

    #[test]
    fn exhausted_worker_exits_early() {
        let ctx = Context::new();
        let n5 = ctx.sqrt(5);
        let n7 = ctx.sqrt(7);
        let n100489 = ctx.sqrt(100489);

        assert_eq!(n5.at(0), Some(2));
        assert_eq!(n7.at(0), Some(2));
        // The finite mantissa exhausts its producer, so its worker is
        // already gone while the other two idle.
        assert_eq!(n100489.to_string(), "317");
        assert_eq!(ctx.num_workers(), 2);
        ctx.close();
        assert_eq!(ctx.num_workers(), 0);
    }

    #[test]
    #[should_panic(expected = "Context closed")]
    fn closed_context_rejects_factories() {
        let ctx = Context::new();
        ctx.close();
        ctx.sqrt(13);
    }

    #[test]
    fn drop_closes() {
        let n = {
            let ctx = Context::new();
            let n = ctx.sqrt(2);
            assert_eq!(n.at(0), Some(1));
            n
        };
        // The context was dropped, so the mantissa is frozen at the
        // digits already materialized (at least the first chunk).
        assert_eq!(n.at(0), Some(1));
        assert!(n.at(5_000_000).is_none());
    }
}
