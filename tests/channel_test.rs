use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use rstest::{fixture, rstest};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;

use servkit::codec::{FrameDecoder, LengthBounds, MsgBuilder};
use servkit::network::{ChannelEvents, IoBufferPool, MessageChannel};
use servkit::setup_local_tracing;

#[fixture]
#[once]
fn setup() {
    setup_local_tracing().expect("failed to setup tracing");
}

#[derive(Debug, PartialEq)]
enum Event {
    Message(Bytes),
    InputCompleted,
    NetworkError,
    FormatError,
}

struct Collector {
    tx: mpsc::UnboundedSender<Event>,
}

impl ChannelEvents for Collector {
    fn on_message(&self, message: Bytes) {
        let _ = self.tx.send(Event::Message(message));
    }
    fn on_input_completed(&self) {
        let _ = self.tx.send(Event::InputCompleted);
    }
    fn on_network_error(&self) {
        let _ = self.tx.send(Event::NetworkError);
    }
    fn on_format_error(&self) {
        let _ = self.tx.send(Event::FormatError);
    }
}

async fn channel_pair(
    pool: &Arc<IoBufferPool>,
    bounds: LengthBounds,
) -> (MessageChannel, TcpStream, mpsc::UnboundedReceiver<Event>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let client = TcpStream::connect(addr).await.unwrap();
    let (server, _) = listener.accept().await.unwrap();

    let lease = pool.get().expect("pool exhausted");
    let (tx, rx) = mpsc::unbounded_channel();
    let channel = MessageChannel::start(
        server,
        lease,
        Arc::clone(pool),
        Arc::new(Collector { tx }),
        bounds,
    );
    (channel, client, rx)
}

async fn next_event(rx: &mut mpsc::UnboundedReceiver<Event>) -> Event {
    tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("timed out waiting for a channel event")
        .expect("event stream closed")
}

async fn wait_for_available(pool: &Arc<IoBufferPool>, expected: usize) {
    for _ in 0..200 {
        if pool.available() == expected {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!(
        "pool never returned to {} available buffers (now {})",
        expected,
        pool.available()
    );
}

#[rstest]
#[tokio::test]
async fn test_receive_across_chunk_boundaries(_setup: ()) {
    let pool = Arc::new(IoBufferPool::new(2, 1024));
    let (_channel, mut client, mut rx) = channel_pair(&pool, LengthBounds::default()).await;

    let mut stream = Vec::new();
    for payload in [&b"first"[..], b"second-msg", b"third"] {
        stream.extend_from_slice(MsgBuilder::prefixed(payload).unwrap().remaining());
    }

    // write in awkward chunks so frames straddle receive boundaries
    for chunk in stream.chunks(3) {
        client.write_all(chunk).await.unwrap();
        client.flush().await.unwrap();
        tokio::time::sleep(Duration::from_millis(2)).await;
    }

    assert_eq!(
        next_event(&mut rx).await,
        Event::Message(Bytes::from_static(b"first"))
    );
    assert_eq!(
        next_event(&mut rx).await,
        Event::Message(Bytes::from_static(b"second-msg"))
    );
    assert_eq!(
        next_event(&mut rx).await,
        Event::Message(Bytes::from_static(b"third"))
    );

    // orderly shutdown: completion callback, buffer back in the pool
    drop(client);
    assert_eq!(next_event(&mut rx).await, Event::InputCompleted);
    wait_for_available(&pool, 2).await;
}

#[rstest]
#[tokio::test]
async fn test_send_path_preserves_fifo_order(_setup: ()) {
    let pool = Arc::new(IoBufferPool::new(2, 1024));
    let (channel, mut client, _rx) = channel_pair(&pool, LengthBounds::default()).await;

    let payloads: Vec<Vec<u8>> = vec![
        b"queued-first".to_vec(),
        vec![0x42u8; 300], // extended length prefix
        b"queued-last".to_vec(),
    ];
    for payload in &payloads {
        channel.send(MsgBuilder::prefixed(payload).unwrap());
    }

    let mut decoder = FrameDecoder::new(LengthBounds { min: 1, max: 4096 });
    let mut received = Vec::new();
    let mut buf = [0u8; 64];
    while received.len() < payloads.len() {
        let n = tokio::time::timeout(Duration::from_secs(5), client.read(&mut buf))
            .await
            .expect("timed out reading")
            .unwrap();
        assert!(n > 0, "peer closed before all messages arrived");
        decoder.feed(&buf[..n], |m| received.push(m)).unwrap();
    }

    for (message, payload) in received.iter().zip(payloads.iter()) {
        assert_eq!(&message[..], &payload[..]);
    }
}

#[rstest]
#[tokio::test]
async fn test_control_frames_round_trip(_setup: ()) {
    let pool = Arc::new(IoBufferPool::new(1, 256));
    let (channel, mut client, _rx) = channel_pair(&pool, LengthBounds::default()).await;

    channel.send(MsgBuilder::control2(0x07, 0x01));
    channel.send(MsgBuilder::error1(0x02, 700));

    let mut wire = [0u8; 7];
    client.read_exact(&mut wire).await.unwrap();
    assert_eq!(wire, [2, 0x07, 0x01, 3, 0x02, 0x02, 0xbc]);
}

#[rstest]
#[tokio::test]
async fn test_format_error_closes_and_releases(_setup: ()) {
    let pool = Arc::new(IoBufferPool::new(1, 256));
    let (_channel, mut client, mut rx) = channel_pair(&pool, LengthBounds::default()).await;

    // 0x85: extension octet count of 5 is illegal
    client.write_all(&[0x85]).await.unwrap();
    client.flush().await.unwrap();

    assert_eq!(next_event(&mut rx).await, Event::FormatError);
    wait_for_available(&pool, 1).await;
}

#[rstest]
#[tokio::test]
async fn test_out_of_bounds_length_is_a_format_error(_setup: ()) {
    let pool = Arc::new(IoBufferPool::new(1, 256));
    let (_channel, mut client, mut rx) = channel_pair(&pool, LengthBounds::default()).await;

    // direct length 1 is below the default minimum of 2
    client.write_all(&[0x01, 0xaa]).await.unwrap();
    client.flush().await.unwrap();

    assert_eq!(next_event(&mut rx).await, Event::FormatError);
    wait_for_available(&pool, 1).await;
}

#[rstest]
#[tokio::test]
async fn test_connection_reset_reports_one_network_error(_setup: ()) {
    let pool = Arc::new(IoBufferPool::new(1, 256));
    let (_channel, client, mut rx) = channel_pair(&pool, LengthBounds::default()).await;

    // linger of zero makes the drop send an RST rather than an orderly FIN
    client.set_linger(Some(Duration::ZERO)).unwrap();
    drop(client);

    assert_eq!(next_event(&mut rx).await, Event::NetworkError);
    wait_for_available(&pool, 1).await;

    // the terminal callback fired exactly once
    assert!(rx.try_recv().is_err());
}

#[rstest]
#[tokio::test]
async fn test_explicit_close_fires_no_callback(_setup: ()) {
    let pool = Arc::new(IoBufferPool::new(1, 256));
    let (channel, _client, mut rx) = channel_pair(&pool, LengthBounds::default()).await;

    channel.close();
    wait_for_available(&pool, 1).await;
    assert!(channel.is_closed());

    // no terminal event was emitted for the owner's own close
    assert!(rx.try_recv().is_err());
}

#[rstest]
#[tokio::test]
async fn test_pool_exhaustion_rejects_connection(_setup: ()) {
    let pool = Arc::new(IoBufferPool::new(1, 256));
    let (_channel, _client, _rx) = channel_pair(&pool, LengthBounds::default()).await;

    // the only buffer is leased; the next accept must be rejected/deferred
    assert!(pool.get().is_none());
}
