//! Lazy shared cache of computed digits
//!
//! Every mantissa is backed by a [`Memoizer`]: a digit buffer that grows
//! monotonically as readers demand positions, fed by a single worker
//! thread that drives the digit producer. Readers steer production
//! through a growth target so the worker never runs unboundedly ahead
//! of demand, and all synchronization happens on one mutex with two
//! condition variables.

use std::cmp;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread;

/// Digits materialized per growth cycle.
pub(crate) const CHUNK_SIZE: usize = 100;

/// Bound on growth cycles, chosen so chunk * CHUNK_SIZE cannot overflow.
pub(crate) const MAX_CHUNKS: usize = usize::MAX / CHUNK_SIZE;

/// The digit stream driven by a memoizer worker. Exhaustion or any
/// yielded value above 9 ends the mantissa.
pub(crate) type DigitProducer = Box<dyn Iterator<Item = u8> + Send>;

/// Worker accounting shared between a memoizer family and its owner.
/// The closed flag is checked by each worker between chunks.
pub(crate) struct WorkerState {
    active: AtomicI64,
    closed: AtomicBool,
}

impl WorkerState {
    pub(crate) const fn new() -> WorkerState {
        WorkerState {
            active: AtomicI64::new(0),
            closed: AtomicBool::new(false),
        }
    }

    fn start(&self) {
        self.active.fetch_add(1, Ordering::SeqCst);
    }

    fn end(&self) {
        self.active.fetch_sub(1, Ordering::SeqCst);
    }

    pub(crate) fn num_active(&self) -> i64 {
        self.active.load(Ordering::SeqCst)
    }

    pub(crate) fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }

    pub(crate) fn closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

#[derive(Default)]
struct MemoState {
    data: Vec<u8>,
    max_length: usize,
    done: bool,
}

/// Thread-safe, index-addressable view over a digit producer.
///
/// The buffer only ever grows, and once `done` is published it is
/// frozen. Readers block in [`Memoizer::wait`] until the position they
/// need is materialized or the mantissa turns out to be shorter.
pub(crate) struct Memoizer {
    state: Mutex<MemoState>,
    must_grow: Condvar,
    update_available: Condvar,
}

impl Memoizer {
    /// Creates the memoizer and its worker thread. The worker idles
    /// until a reader raises the growth target and exits for good once
    /// the producer ends, the chunk budget is spent, or `workers` is
    /// closed.
    pub(crate) fn spawn(producer: DigitProducer, workers: Arc<WorkerState>) -> Arc<Memoizer> {
        let memo = Arc::new(Memoizer {
            state: Mutex::new(MemoState::default()),
            must_grow: Condvar::new(),
            update_available: Condvar::new(),
        });
        workers.start();
        let worker = Arc::clone(&memo);
        thread::spawn(move || worker.run(producer, workers));
        memo
    }

    /// The digit at `index`, or None when the mantissa is shorter.
    pub(crate) fn at(&self, index: usize) -> Option<u8> {
        let state = self.wait(index);
        state.data.get(index).copied()
    }

    /// Blocks until `n` digits are known or the mantissa is complete;
    /// returns the known prefix capped at `n` digits.
    pub(crate) fn first_n(&self, n: usize) -> Vec<u8> {
        if n == 0 {
            return Vec::new();
        }
        let state = self.wait(n - 1);
        state.data[..cmp::min(n, state.data.len())].to_vec()
    }

    /// Appends every digit known past `buf.len()` onto `buf`, blocking
    /// until at least one more digit exists. Returns false when the
    /// mantissa ends at `buf.len()`.
    pub(crate) fn fill(&self, buf: &mut Vec<u8>) -> bool {
        let state = self.wait(buf.len());
        if state.data.len() <= buf.len() {
            return false;
        }
        buf.extend_from_slice(&state.data[buf.len()..]);
        true
    }

    fn wait(&self, index: usize) -> MutexGuard<'_, MemoState> {
        let mut state = self.lock();
        if !state.done && state.max_length <= index {
            // min() guards the multiply against overflow when a caller
            // asks for a position near usize::MAX.
            let chunk_count = cmp::min(index / CHUNK_SIZE + 1, MAX_CHUNKS);
            state.max_length = CHUNK_SIZE * chunk_count;
            self.must_grow.notify_one();
        }
        while !state.done && state.data.len() <= index {
            state = self
                .update_available
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
        state
    }

    fn wait_to_grow(&self) {
        let mut state = self.lock();
        while state.data.len() >= state.max_length {
            state = self
                .must_grow
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    fn publish(&self, chunk: &[u8], done: bool) {
        let mut state = self.lock();
        state.data.extend_from_slice(chunk);
        state.done = done;
        self.update_available.notify_all();
    }

    fn lock(&self) -> MutexGuard<'_, MemoState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn run(&self, mut producer: DigitProducer, workers: Arc<WorkerState>) {
        for _ in 0..MAX_CHUNKS {
            self.wait_to_grow();
            let mut chunk = Vec::with_capacity(CHUNK_SIZE);
            while chunk.len() < CHUNK_SIZE {
                match producer.next() {
                    Some(digit) if digit <= 9 => chunk.push(digit),
                    // The producer ended the mantissa. Decrement the
                    // worker count before publishing so that a reader
                    // observing done also observes the exit.
                    _ => {
                        workers.end();
                        self.publish(&chunk, true);
                        return;
                    }
                }
            }
            if workers.closed() {
                workers.end();
                self.publish(&chunk, true);
                return;
            }
            self.publish(&chunk, false);
        }
        workers.end();
        self.publish(&[], true);
    }
}

/// A mantissa digit source: a memoizer plus an optional significance
/// cap. Caps flatten on construction, so the delegate is always the
/// memoizer itself and never another capped spec.
#[derive(Clone)]
pub(crate) struct MemoSpec {
    memo: Arc<Memoizer>,
    limit: Option<usize>,
}

impl PartialEq for MemoSpec {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.memo, &other.memo) && self.limit == other.limit
    }
}

impl MemoSpec {
    pub(crate) fn new(memo: Arc<Memoizer>) -> MemoSpec {
        MemoSpec { memo, limit: None }
    }

    /// Caps this spec at `limit` digits. A cap of zero leaves no digits
    /// at all, reported as None.
    pub(crate) fn with_limit(&self, limit: usize) -> Option<MemoSpec> {
        if limit == 0 {
            return None;
        }
        let limit = match self.limit {
            Some(existing) => cmp::min(existing, limit),
            None => limit,
        };
        Some(MemoSpec {
            memo: Arc::clone(&self.memo),
            limit: Some(limit),
        })
    }

    /// True when both specs share the memoizer and carry the same cap.
    pub(crate) fn same(&self, other: &MemoSpec) -> bool {
        Arc::ptr_eq(&self.memo, &other.memo) && self.limit == other.limit
    }

    pub(crate) fn at(&self, index: usize) -> Option<u8> {
        if let Some(limit) = self.limit {
            if index >= limit {
                // Still materialize up to the cap, as an in-range read
                // would have.
                self.memo.at(limit);
                return None;
            }
        }
        self.memo.at(index)
    }

    pub(crate) fn first_n(&self, n: usize) -> Vec<u8> {
        let n = match self.limit {
            Some(limit) => cmp::min(n, limit),
            None => n,
        };
        self.memo.first_n(n)
    }

    /// Iterator refill: appends newly known digits within the cap onto
    /// `buf`. Returns false when no digit follows `buf.len()`.
    pub(crate) fn fill(&self, buf: &mut Vec<u8>) -> bool {
        if let Some(limit) = self.limit {
            if buf.len() >= limit {
                return false;
            }
        }
        if !self.memo.fill(buf) {
            return false;
        }
        if let Some(limit) = self.limit {
            if buf.len() > limit {
                buf.truncate(limit);
            }
        }
        true
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn counting_producer(len: usize) -> DigitProducer {
        Box::new((0..len).map(|i| ((i + 1) % 10) as u8))
    }

    fn endless_producer() -> DigitProducer {
        Box::new((0..).map(|i| ((i + 1) % 10) as u8))
    }

    fn global() -> Arc<WorkerState> {
        Arc::new(WorkerState::new())
    }

    #[test]
    fn at_and_past_end() {
        let memo = Memoizer::spawn(counting_producer(3), global());
        assert_eq!(memo.at(0), Some(1));
        assert_eq!(memo.at(2), Some(3));
        assert_eq!(memo.at(3), None);
        assert_eq!(memo.at(usize::MAX), None);
    }

    #[test]
    fn growth_is_chunked() {
        let memo = Memoizer::spawn(endless_producer(), global());
        assert_eq!(memo.at(0), Some(1));
        // One read materializes exactly one chunk, and the worker then
        // parks until the target grows again.
        assert_eq!(memo.lock().data.len(), CHUNK_SIZE);
        assert_eq!(memo.at(250), Some(1));
        assert_eq!(memo.lock().data.len(), 3 * CHUNK_SIZE);
    }

    #[test]
    fn first_n_caps_at_mantissa_length() {
        let memo = Memoizer::spawn(counting_producer(5), global());
        assert_eq!(memo.first_n(0), Vec::<u8>::new());
        assert_eq!(memo.first_n(3), vec![1, 2, 3]);
        assert_eq!(memo.first_n(100), vec![1, 2, 3, 4, 5]);
        assert_eq!(memo.first_n(usize::MAX), vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn fill_is_incremental() {
        let memo = Memoizer::spawn(counting_producer(5), global());
        let mut buf = Vec::new();
        assert!(memo.fill(&mut buf));
        assert_eq!(buf, vec![1, 2, 3, 4, 5]);
        assert!(!memo.fill(&mut buf));
        assert_eq!(buf, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn out_of_range_digit_ends_mantissa() {
        let producer: DigitProducer = Box::new([5u8, 7, 10, 4].into_iter());
        let memo = Memoizer::spawn(producer, global());
        assert_eq!(memo.first_n(10), vec![5, 7]);
    }

    #[test]
    fn worker_exits_after_close() {
        let workers = global();
        let memo = Memoizer::spawn(endless_producer(), Arc::clone(&workers));
        assert_eq!(workers.num_active(), 1);
        workers.close();
        // The drain read forces one more chunk, after which the worker
        // observes the closed flag and publishes completion.
        let digits = memo.first_n(usize::MAX);
        assert_eq!(digits.len() % CHUNK_SIZE, 0);
        assert_eq!(workers.num_active(), 0);
    }

    #[test]
    fn spec_limits_flatten() {
        let memo = Memoizer::spawn(endless_producer(), global());
        let spec = MemoSpec::new(memo);
        let capped = spec.with_limit(10).unwrap();
        assert_eq!(capped.at(9), Some(0));
        assert_eq!(capped.at(10), None);
        assert_eq!(capped.first_n(usize::MAX).len(), 10);

        let tighter = capped.with_limit(4).unwrap();
        assert_eq!(tighter.first_n(usize::MAX), vec![1, 2, 3, 4]);
        let unchanged = capped.with_limit(25).unwrap();
        assert!(unchanged.same(&capped));
        assert!(capped.with_limit(0).is_none());
    }

    #[test]
    fn spec_fill_respects_limit() {
        let memo = Memoizer::spawn(endless_producer(), global());
        let spec = MemoSpec::new(memo).with_limit(3).unwrap();
        let mut buf = Vec::new();
        assert!(spec.fill(&mut buf));
        assert_eq!(buf, vec![1, 2, 3]);
        assert!(!spec.fill(&mut buf));
    }

    #[test]
    fn concurrent_readers_agree() {
        let memo = Memoizer::spawn(endless_producer(), global());
        let expected: Vec<u8> = (0..2000).map(|i| ((i + 1) % 10) as u8).collect();
        let mut handles = Vec::new();
        for reader in 0..8 {
            let memo = Arc::clone(&memo);
            handles.push(thread::spawn(move || {
                if reader % 2 == 0 {
                    (0..2000).map(|i| memo.at(i).unwrap()).collect::<Vec<u8>>()
                } else {
                    let mut digits: Vec<u8> =
                        (0..2000).rev().map(|i| memo.at(i).unwrap()).collect();
                    digits.reverse();
                    digits
                }
            }));
        }
        for handle in handles {
            assert_eq!(handle.join().unwrap(), expected);
        }
    }
}
