use std::collections::VecDeque;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use parking_lot::Mutex;
use tokio::io::{AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::tcp::OwnedReadHalf;
use tokio::net::TcpStream;
use tokio::sync::{broadcast, Notify};
use tracing::{debug, trace, warn};

use crate::codec::{FrameDecoder, LengthBounds, Message};
use crate::network::{IoBufferLease, IoBufferPool};
use crate::Shutdown;

/// Callbacks a channel owner registers for the lifetime of one connection.
///
/// `on_message` fires once per decoded message, in stream arrival order.
/// The three terminal callbacks are mutually exclusive and fire at most once
/// per channel, guarded by a single atomic claim; an explicit `close` fires
/// none of them.
pub trait ChannelEvents: Send + Sync + 'static {
    fn on_message(&self, message: Bytes);

    /// Peer shut down its sending side cleanly (zero-length read).
    fn on_input_completed(&self) {}

    /// Transport failure during receive or send.
    fn on_network_error(&self) {}

    /// Malformed length prefix or out-of-bounds payload length.
    fn on_format_error(&self) {}
}

#[derive(Debug)]
struct SendQueue {
    queue: VecDeque<Message>,
    in_flight: bool,
}

struct ChannelShared {
    outbound: Mutex<SendQueue>,
    send_ready: Notify,
    /// Claimed by the first terminal path (EOF, network error, format
    /// error); losers stay silent so each terminal callback fires at most
    /// once even when completion races an explicit close.
    terminated: AtomicBool,
    closed: AtomicBool,
    pool: Arc<IoBufferPool>,
    events: Arc<dyn ChannelEvents>,
    notify_shutdown: broadcast::Sender<()>,
    peer: String,
}

impl ChannelShared {
    fn claim_termination(&self) -> bool {
        self.terminated
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    fn stop_tasks(&self) {
        self.closed.store(true, Ordering::Release);
        let _ = self.notify_shutdown.send(());
    }
}

/// One socket's framing state machine plus its serialized outbound queue.
///
/// `start` leases nothing itself: the caller obtains a buffer from the pool
/// (rejecting the connection if none is available) and hands it over. The
/// channel spawns a read task that drives the [`FrameDecoder`] and a write
/// task that drains the FIFO; the buffer goes back to the pool exactly once,
/// on whichever path ends the read task.
pub struct MessageChannel {
    shared: Arc<ChannelShared>,
}

impl MessageChannel {
    pub fn start(
        stream: TcpStream,
        lease: IoBufferLease,
        pool: Arc<IoBufferPool>,
        events: Arc<dyn ChannelEvents>,
        bounds: LengthBounds,
    ) -> MessageChannel {
        let peer = stream
            .peer_addr()
            .map(|addr| addr.to_string())
            .unwrap_or_else(|_| "unknown".to_string());
        let (reader, writer) = stream.into_split();
        let (notify_shutdown, _) = broadcast::channel(1);

        let shared = Arc::new(ChannelShared {
            outbound: Mutex::new(SendQueue {
                queue: VecDeque::new(),
                in_flight: false,
            }),
            send_ready: Notify::new(),
            terminated: AtomicBool::new(false),
            closed: AtomicBool::new(false),
            pool,
            events,
            notify_shutdown: notify_shutdown.clone(),
            peer,
        });

        let read_shutdown = Shutdown::new(notify_shutdown.subscribe());
        let write_shutdown = Shutdown::new(notify_shutdown.subscribe());
        tokio::spawn(read_loop(
            Arc::clone(&shared),
            reader,
            lease,
            FrameDecoder::new(bounds),
            read_shutdown,
        ));
        tokio::spawn(write_loop(Arc::clone(&shared), writer, write_shutdown));

        MessageChannel { shared }
    }

    /// Queues an outbound message. Order is preserved per channel; at most
    /// one send is in flight at a time. Messages sent after the channel has
    /// terminated are dropped.
    pub fn send(&self, message: Message) {
        if self.shared.closed.load(Ordering::Acquire) {
            trace!("{}: dropping message sent after close", self.shared.peer);
            return;
        }
        let mut outbound = self.shared.outbound.lock();
        outbound.queue.push_back(message);
        if !outbound.in_flight {
            outbound.in_flight = true;
            drop(outbound);
            self.shared.send_ready.notify_one();
        }
    }

    /// Stops both tasks and releases the leased buffer. Invokes no terminal
    /// callback; closing is the owner's own action.
    pub fn close(&self) {
        self.shared.stop_tasks();
    }

    pub fn is_closed(&self) -> bool {
        self.shared.closed.load(Ordering::Acquire)
    }
}

enum ReadEvent {
    Shutdown,
    Data(io::Result<usize>),
}

async fn read_loop(
    shared: Arc<ChannelShared>,
    mut reader: OwnedReadHalf,
    mut lease: IoBufferLease,
    mut decoder: FrameDecoder,
    mut shutdown: Shutdown,
) {
    loop {
        let event = tokio::select! {
            _ = shutdown.recv() => ReadEvent::Shutdown,
            res = reader.read(lease.as_mut_slice()) => ReadEvent::Data(res),
        };

        match event {
            ReadEvent::Shutdown => {
                shared.pool.add(lease);
                return;
            }
            ReadEvent::Data(Ok(0)) => {
                trace!("{}: input completed", shared.peer);
                shared.stop_tasks();
                shared.pool.add(lease);
                if shared.claim_termination() {
                    shared.events.on_input_completed();
                }
                return;
            }
            ReadEvent::Data(Ok(received)) => {
                let events = Arc::clone(&shared.events);
                let result = decoder.feed(&lease.as_slice()[..received], |message| {
                    events.on_message(message);
                });
                if let Err(e) = result {
                    warn!("{}: format error: {}", shared.peer, e);
                    shared.stop_tasks();
                    shared.pool.add(lease);
                    if shared.claim_termination() {
                        shared.events.on_format_error();
                    }
                    return;
                }
            }
            ReadEvent::Data(Err(e)) => {
                debug!("{}: receive failed: {}", shared.peer, e);
                shared.stop_tasks();
                shared.pool.add(lease);
                if shared.claim_termination() {
                    shared.events.on_network_error();
                }
                return;
            }
        }
    }
}

async fn write_loop<W: AsyncWrite + Unpin>(
    shared: Arc<ChannelShared>,
    mut writer: W,
    mut shutdown: Shutdown,
) {
    loop {
        let next = {
            let mut outbound = shared.outbound.lock();
            let message = outbound.queue.pop_front();
            if message.is_none() {
                outbound.in_flight = false;
            }
            message
        };

        let Some(mut message) = next else {
            tokio::select! {
                _ = shutdown.recv() => return,
                _ = shared.send_ready.notified() => continue,
            }
        };

        // resubmit until the cursor reaches the end of the frame
        while !message.is_flushed() {
            match writer.write(message.remaining()).await {
                Ok(0) => {
                    // a zero-byte write of a non-empty frame means the peer
                    // can no longer accept data
                    debug!("{}: send failed: write returned zero", shared.peer);
                    shared.stop_tasks();
                    if shared.claim_termination() {
                        shared.events.on_network_error();
                    }
                    return;
                }
                Ok(written) => message.advance(written),
                Err(e) => {
                    debug!("{}: send failed: {}", shared.peer, e);
                    shared.stop_tasks();
                    if shared.claim_termination() {
                        shared.events.on_network_error();
                    }
                    return;
                }
            }
        }
        trace!("{}: flushed {} byte frame", shared.peer, message.frame_len());
    }
}
