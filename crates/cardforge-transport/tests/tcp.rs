//! Integration tests for the framed TCP transport.

use cardforge_transport::{
    Connection, TcpConnection, TcpTransport, Transport, TransportError,
};
use tokio::io::AsyncWriteExt;

async fn bound_transport() -> (TcpTransport, String) {
    let transport = TcpTransport::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral port");
    let addr = transport.local_addr().expect("local addr").to_string();
    (transport, addr)
}

#[tokio::test]
async fn test_send_and_recv_round_trip() {
    let (mut transport, addr) = bound_transport().await;

    let server = tokio::spawn(async move {
        let conn = transport.accept().await.expect("accept");
        let msg = conn.recv().await.expect("recv").expect("frame");
        assert_eq!(msg, b"hello server");
        conn.send(b"hello client").await.expect("send");
    });

    let client = TcpConnection::connect(&addr).await.expect("connect");
    client.send(b"hello server").await.expect("send");
    let reply = client.recv().await.expect("recv").expect("frame");
    assert_eq!(reply, b"hello client");

    server.await.unwrap();
}

#[tokio::test]
async fn test_multiple_frames_arrive_in_order() {
    let (mut transport, addr) = bound_transport().await;

    let server = tokio::spawn(async move {
        let conn = transport.accept().await.expect("accept");
        for i in 0..10u8 {
            let msg = conn.recv().await.expect("recv").expect("frame");
            assert_eq!(msg, vec![i; 3]);
        }
    });

    let client = TcpConnection::connect(&addr).await.expect("connect");
    for i in 0..10u8 {
        client.send(&[i; 3]).await.expect("send");
    }

    server.await.unwrap();
}

#[tokio::test]
async fn test_compressed_frames_decode_transparently() {
    let (mut transport, addr) = bound_transport().await;
    let payload = vec![b'x'; 16 * 1024];
    let expected = payload.clone();

    let server = tokio::spawn(async move {
        let conn = transport.accept().await.expect("accept");
        let msg = conn.recv().await.expect("recv").expect("frame");
        assert_eq!(msg, expected);
    });

    let client = TcpConnection::connect(&addr).await.expect("connect");
    client.set_compression(true);
    client.send(&payload).await.expect("send");

    server.await.unwrap();
}

#[tokio::test]
async fn test_close_mid_frame_is_an_error() {
    let (mut transport, addr) = bound_transport().await;

    let server = tokio::spawn(async move {
        let conn = transport.accept().await.expect("accept");
        let result = conn.recv().await;
        assert!(matches!(result, Err(TransportError::ConnectionClosed(_))));
    });

    // A header announcing 16 payload bytes, then nothing.
    let mut raw = tokio::net::TcpStream::connect(&addr).await.expect("connect");
    raw.write_all(&[0, 0, 0, 16, 0]).await.expect("write header");
    raw.shutdown().await.expect("shutdown");
    drop(raw);

    server.await.unwrap();
}

#[tokio::test]
async fn test_clean_close_yields_none() {
    let (mut transport, addr) = bound_transport().await;

    let server = tokio::spawn(async move {
        let conn = transport.accept().await.expect("accept");
        assert!(conn.recv().await.expect("recv").is_none());
    });

    let client = TcpConnection::connect(&addr).await.expect("connect");
    client.close().await.expect("close");
    drop(client);

    server.await.unwrap();
}
