use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;

use zenith_wire::error::Error;
use zenith_wire::{Endpoint, Link, LinkOptions, Listener, MessageStream};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
struct TestMessage {
    id: u32,
    data: String,
}

/// Bound TCP listener on an ephemeral port, plus the endpoint to dial it.
async fn bind_tcp() -> (Listener, Endpoint) {
    let listener = Listener::bind(&"127.0.0.1:0".parse().unwrap()).await.unwrap();
    let endpoint = listener.local_endpoint().unwrap();
    (listener, endpoint)
}

#[tokio::test]
async fn link_round_trips_one_frame() {
    let (listener, endpoint) = bind_tcp().await;

    tokio::spawn(async move {
        let mut link = listener.accept().await.unwrap();
        let frame = link.receive().await.unwrap();
        link.send(&frame).await.unwrap();
    });

    let mut link = Link::dial(&endpoint).await.unwrap();
    link.send(b"hello world").await.unwrap();
    assert_eq!(link.receive().await.unwrap(), b"hello world");
}

#[tokio::test]
async fn frame_boundaries_survive_consecutive_sends() {
    let (listener, endpoint) = bind_tcp().await;

    tokio::spawn(async move {
        let mut link = listener.accept().await.unwrap();
        for _ in 0..3 {
            let frame = link.receive().await.unwrap();
            link.send(&frame).await.unwrap();
        }
    });

    let mut link = Link::dial(&endpoint).await.unwrap();
    for frame in [b"first".to_vec(), b"second".to_vec(), b"third".to_vec()] {
        link.send(&frame).await.unwrap();
        assert_eq!(link.receive().await.unwrap(), frame);
    }
}

#[tokio::test]
async fn receive_timeout_fires() {
    let (listener, endpoint) = bind_tcp().await;

    // Server accepts and then goes silent
    tokio::spawn(async move {
        let _link = listener.accept().await.unwrap();
        tokio::time::sleep(Duration::from_secs(10)).await;
    });

    let options = LinkOptions::new().receive_timeout(Duration::from_millis(100));
    let mut link = Link::dial_with(&endpoint, options).await.unwrap();
    match link.receive().await.unwrap_err() {
        Error::Timeout { op } => assert_eq!(op, "receive"),
        e => panic!("Expected Timeout, got {:?}", e),
    }
}

#[tokio::test]
async fn oversized_frame_claim_is_rejected() {
    // Raw socket so the length prefix can lie about the payload size
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        stream.write_u32(u32::MAX).await.unwrap();
        tokio::time::sleep(Duration::from_secs(1)).await;
    });

    let mut link = Link::dial(&Endpoint::Tcp(addr)).await.unwrap();
    match link.receive().await.unwrap_err() {
        Error::FrameTooLarge { len, max } => {
            assert_eq!(len, u32::MAX as usize);
            assert!(len > max);
        }
        e => panic!("Expected FrameTooLarge, got {:?}", e),
    }
}

#[tokio::test]
async fn clean_eof_reports_connection_closed() {
    let (listener, endpoint) = bind_tcp().await;

    tokio::spawn(async move {
        let link = listener.accept().await.unwrap();
        drop(link);
    });

    let mut link = Link::dial(&endpoint).await.unwrap();

    // Give the server time to hang up
    tokio::time::sleep(Duration::from_millis(50)).await;

    match link.receive().await.unwrap_err() {
        Error::ConnectionClosed => {}
        e => panic!("Expected ConnectionClosed, got {:?}", e),
    }
}

#[tokio::test]
async fn message_stream_round_trips_typed_messages() {
    let (listener, endpoint) = bind_tcp().await;

    tokio::spawn(async move {
        let mut stream = MessageStream::new(listener.accept().await.unwrap());
        let message: TestMessage = stream.receive().await.unwrap();
        stream.send(&message).await.unwrap();
    });

    let expected = TestMessage {
        id: 42,
        data: "test data".to_string(),
    };
    let mut stream = MessageStream::connect(&endpoint).await.unwrap();
    stream.send(&expected).await.unwrap();
    let response: TestMessage = stream.receive().await.unwrap();

    assert_eq!(response, expected);
}

#[tokio::test]
async fn split_halves_operate_concurrently() {
    let (listener, endpoint) = bind_tcp().await;

    // Echo server
    tokio::spawn(async move {
        let mut link = listener.accept().await.unwrap();
        loop {
            let frame = match link.receive().await {
                Ok(frame) => frame,
                Err(_) => break,
            };
            if link.send(&frame).await.is_err() {
                break;
            }
        }
    });

    let (mut reader, mut writer) = Link::dial(&endpoint).await.unwrap().split();

    // Send from one task while receiving on another
    let sender = tokio::spawn(async move {
        for i in 0u32..10 {
            writer.send(&i.to_be_bytes()).await.unwrap();
        }
        writer
    });

    for i in 0u32..10 {
        assert_eq!(reader.receive().await.unwrap(), i.to_be_bytes());
    }

    sender.await.unwrap();
}

#[tokio::test]
async fn unix_links_carry_frames() {
    let endpoint: Endpoint = "unix:///tmp/zenith_test_unix_link.sock".parse().unwrap();
    let listener = Listener::bind(&endpoint).await.unwrap();

    tokio::spawn(async move {
        let mut link = listener.accept().await.unwrap();
        let frame = link.receive().await.unwrap();
        link.send(&frame).await.unwrap();
    });

    let mut link = Link::dial(&endpoint).await.unwrap();
    link.send(b"hello unix").await.unwrap();
    assert_eq!(link.receive().await.unwrap(), b"hello unix");
}

#[tokio::test]
async fn unix_listener_cleans_up_its_socket() {
    let endpoint: Endpoint = "unix:///tmp/zenith_test_unix_cleanup.sock".parse().unwrap();
    let path = std::path::Path::new("/tmp/zenith_test_unix_cleanup.sock");

    {
        let _listener = Listener::bind(&endpoint).await.unwrap();
        assert!(path.exists());
    }

    // Socket file is removed when the listener drops
    assert!(!path.exists());
}
