use std::collections::VecDeque;

use bytes::BytesMut;
use parking_lot::Mutex;
use tracing::debug;

/// One fixed-size receive buffer leased out of an [`IoBufferPool`].
///
/// Every lease is a region sliced from the pool's single contiguous
/// allocation. At any instant a buffer is either leased to exactly one
/// channel or sitting in the pool, never both; Rust move semantics make a
/// double lease unrepresentable.
#[derive(Debug)]
pub struct IoBufferLease {
    buf: BytesMut,
}

impl IoBufferLease {
    /// The full fixed-size region, for reading into.
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.buf[..]
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.buf[..]
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }
}

#[derive(Debug)]
struct PoolState {
    pooled: VecDeque<IoBufferLease>,
    closed: bool,
}

/// Pre-allocated pool of fixed-size I/O buffers.
///
/// `get` never blocks: when the pool is empty it returns `None` and the
/// caller decides whether to reject or defer the new connection. `close` is
/// terminal; afterwards returned leases are discarded instead of recycled so
/// the backing storage can be torn down.
#[derive(Debug)]
pub struct IoBufferPool {
    buffer_size: usize,
    pool_size: usize,
    state: Mutex<PoolState>,
}

impl IoBufferPool {
    pub fn new(pool_size: usize, buffer_size: usize) -> IoBufferPool {
        let mut slab = BytesMut::zeroed(pool_size * buffer_size);
        let mut pooled = VecDeque::with_capacity(pool_size);
        for _ in 0..pool_size {
            pooled.push_back(IoBufferLease {
                buf: slab.split_to(buffer_size),
            });
        }
        IoBufferPool {
            buffer_size,
            pool_size,
            state: Mutex::new(PoolState {
                pooled,
                closed: false,
            }),
        }
    }

    pub fn buffer_size(&self) -> usize {
        self.buffer_size
    }

    pub fn pool_size(&self) -> usize {
        self.pool_size
    }

    /// Leases a buffer, or `None` when the pool is exhausted.
    pub fn get(&self) -> Option<IoBufferLease> {
        self.state.lock().pooled.pop_front()
    }

    /// Returns a lease to the pool. After `close` the lease is dropped
    /// instead.
    pub fn add(&self, lease: IoBufferLease) {
        let mut state = self.state.lock();
        if state.closed {
            drop(lease);
            return;
        }
        state.pooled.push_back(lease);
    }

    /// Discards every pooled buffer and makes all future `add` calls
    /// discard as well.
    pub fn close(&self) {
        let mut state = self.state.lock();
        state.closed = true;
        let discarded = state.pooled.len();
        state.pooled.clear();
        debug!("io buffer pool closed, {} pooled buffers discarded", discarded);
    }

    /// Number of buffers currently pooled (not leased).
    pub fn available(&self) -> usize {
        self.state.lock().pooled.len()
    }
}
