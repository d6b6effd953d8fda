//! Integration tests for the WebSocket transport over real sockets.

#[cfg(feature = "websocket")]
mod websocket {
    use std::sync::Arc;
    use std::time::Duration;

    use futures_util::{SinkExt, StreamExt};
    use gridsync_transport::{
        Connection, Transport, WebSocketConnection, WebSocketTransport, connect,
    };
    use tokio_tungstenite::tungstenite::Message;

    /// Binds on an OS-assigned port and returns the transport and its
    /// `host:port`.
    async fn bind_any() -> (WebSocketTransport, String) {
        let transport = WebSocketTransport::bind("127.0.0.1:0")
            .await
            .expect("should bind");
        let addr = transport.local_addr().expect("bound address").to_string();
        (transport, addr)
    }

    /// Accepts one connection on the server while `connect` dials it.
    async fn connected_pair() -> (WebSocketConnection, WebSocketConnection) {
        let (mut transport, addr) = bind_any().await;
        let server = tokio::spawn(async move { transport.accept().await.expect("should accept") });
        let client = connect(&addr).await.expect("client should connect");
        let server = server.await.expect("accept task");
        (server, client)
    }

    #[tokio::test]
    async fn test_send_and_receive_both_directions() {
        let (server, client) = connected_pair().await;
        assert_ne!(server.id(), client.id());

        server.send(b"from server").await.unwrap();
        assert_eq!(client.recv().await.unwrap().unwrap(), b"from server");

        client.send(b"from client").await.unwrap();
        assert_eq!(server.recv().await.unwrap().unwrap(), b"from client");
    }

    #[tokio::test]
    async fn test_send_is_not_blocked_by_pending_recv() {
        let (server, client) = connected_pair().await;
        let server = Arc::new(server);

        let reader = {
            let server = Arc::clone(&server);
            tokio::spawn(async move { server.recv().await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;

        // The reader task is parked inside recv(); send must still go out.
        tokio::time::timeout(Duration::from_secs(1), server.send(b"ping"))
            .await
            .expect("send should not wait for recv")
            .unwrap();
        assert_eq!(client.recv().await.unwrap().unwrap(), b"ping");

        client.send(b"pong").await.unwrap();
        let got = reader.await.unwrap().unwrap().unwrap();
        assert_eq!(got, b"pong");
    }

    #[tokio::test]
    async fn test_recv_returns_none_on_peer_close() {
        let (server, client) = connected_pair().await;
        client.close().await.unwrap();

        let result = server.recv().await.expect("recv should not error");
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_text_frames_are_delivered_as_bytes() {
        let (mut transport, addr) = bind_any().await;
        let server = tokio::spawn(async move { transport.accept().await.unwrap() });

        let (mut raw, _) = tokio_tungstenite::connect_async(format!("ws://{addr}"))
            .await
            .unwrap();
        let server = server.await.unwrap();

        raw.send(Message::Text("{\"hello\":1}".into())).await.unwrap();
        assert_eq!(server.recv().await.unwrap().unwrap(), b"{\"hello\":1}");

        server.send(b"bin").await.unwrap();
        let msg = raw.next().await.unwrap().unwrap();
        assert_eq!(msg.into_data().as_ref(), b"bin");
    }

    #[tokio::test]
    async fn test_connect_to_closed_port_fails() {
        let (transport, addr) = bind_any().await;
        drop(transport);

        let result = connect(&addr).await;
        assert!(result.is_err());
    }
}
