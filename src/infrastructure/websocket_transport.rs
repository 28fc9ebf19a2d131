// WebSocket transport for the vessel telemetry feed
use crate::application::telemetry_client::{
    ConnectionHandle, EventSink, Outbound, TelemetryEvent, TelemetryTransport,
};
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::Message};

#[derive(Debug, Clone, Default)]
pub struct WebSocketTransport;

impl TelemetryTransport for WebSocketTransport {
    fn open(&self, url: &str, events: EventSink) -> ConnectionHandle {
        let (tx, rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(run_connection(url.to_string(), events, rx));
        ConnectionHandle::new(tx, task)
    }
}

async fn run_connection(
    url: String,
    events: EventSink,
    mut outbound: mpsc::UnboundedReceiver<Outbound>,
) {
    let socket = match connect_async(url.as_str()).await {
        Ok((socket, _)) => socket,
        Err(e) => {
            events.emit(TelemetryEvent::Error(e.to_string())).await;
            events.emit(TelemetryEvent::Closed { clean: false }).await;
            return;
        }
    };
    events.emit(TelemetryEvent::Opened).await;

    let (mut sink, mut stream) = socket.split();
    let mut close_sent = false;
    let mut close_received = false;

    let clean = loop {
        tokio::select! {
            command = outbound.recv(), if !close_sent => match command {
                Some(Outbound::Text(text)) => {
                    if let Err(e) = sink.send(Message::Text(text)).await {
                        events.emit(TelemetryEvent::Error(e.to_string())).await;
                    }
                }
                Some(Outbound::Close) | None => {
                    close_sent = true;
                    if let Err(e) = sink.send(Message::Close(None)).await {
                        events.emit(TelemetryEvent::Error(e.to_string())).await;
                        break false;
                    }
                }
            },
            message = stream.next() => match message {
                Some(Ok(Message::Text(text))) => {
                    events.emit(TelemetryEvent::MessageReceived(text)).await;
                }
                Some(Ok(Message::Close(frame))) => {
                    tracing::debug!("Telemetry server sent close: {:?}", frame);
                    close_received = true;
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    events.emit(TelemetryEvent::Error(e.to_string())).await;
                    break false;
                }
                // The stream ends once the close handshake has been flushed
                None => break close_received,
            },
        }
    };

    events.emit(TelemetryEvent::Closed { clean }).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::map_sync::MapSynchronizer;
    use crate::application::telemetry_client::{
        ConnectionState, SessionCommand, TelemetryClient, TelemetrySession,
    };
    use crate::domain::geo::GeoPoint;
    use crate::infrastructure::config::{shared, ConsoleSettings};
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::net::TcpListener;

    const BATCH: &str = r#"[{"vessel_name":"v1","pose":{"latitude":1.24,"longitude":103.71,"elevation":0,"heading":90}}]"#;

    #[tokio::test]
    async fn test_feed_end_to_end() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let server = tokio::spawn(async move {
            let (tcp, _) = listener.accept().await.unwrap();
            let mut ws = tokio_tungstenite::accept_async(tcp).await.unwrap();

            let identity = match ws.next().await {
                Some(Ok(Message::Text(text))) => text,
                other => panic!("expected identity, got {:?}", other),
            };
            ws.send(Message::Text(BATCH.to_string())).await.unwrap();

            // Drain until the client's close handshake completes
            while let Some(Ok(_)) = ws.next().await {}
            identity
        });

        let mut settings = ConsoleSettings::default();
        settings.server.telemetry_port = port;
        let mut client = TelemetryClient::new(shared(settings), Arc::new(WebSocketTransport));
        let mut batches = client.subscribe_batches();

        assert!(client.connect().await);
        while batches.borrow().is_empty() {
            assert!(client.process_next().await);
        }
        assert_eq!(client.state(), ConnectionState::Open);
        assert!(batches.has_changed().unwrap());

        let latest = batches.borrow_and_update().clone();
        let mut map = MapSynchronizer::new(10.0);
        let markers = map.sync(&latest);
        assert_eq!(markers.len(), 1);
        assert_eq!(markers[0].position, GeoPoint::new(1.24, 103.71));
        assert_eq!(markers[0].icon.rotation_deg, 90.0);

        client.disconnect();
        while !matches!(client.state(), ConnectionState::Closed { .. }) {
            assert!(client.process_next().await);
        }
        assert_eq!(client.state(), ConnectionState::Closed { clean: true });

        let identity = server.await.unwrap();
        assert_eq!(identity, r#"{"instance":"lotusim"}"#);
    }

    #[tokio::test]
    async fn test_unreachable_server_closes_uncleanly() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let mut settings = ConsoleSettings::default();
        settings.server.telemetry_port = port;
        let mut client = TelemetryClient::new(shared(settings), Arc::new(WebSocketTransport));

        assert!(client.connect().await);
        while !matches!(client.state(), ConnectionState::Closed { .. }) {
            assert!(client.process_next().await);
        }
        assert_eq!(client.state(), ConnectionState::Closed { clean: false });
    }

    #[tokio::test]
    async fn test_dropping_session_closes_socket() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let (identified_tx, identified_rx) = tokio::sync::oneshot::channel();

        let server = tokio::spawn(async move {
            let (tcp, _) = listener.accept().await.unwrap();
            let mut ws = tokio_tungstenite::accept_async(tcp).await.unwrap();
            assert!(matches!(ws.next().await, Some(Ok(Message::Text(_)))));
            identified_tx.send(()).unwrap();

            // Ends once the client side of the socket is gone
            while let Some(Ok(_)) = ws.next().await {}
        });

        let mut settings = ConsoleSettings::default();
        settings.server.telemetry_port = port;
        let client = TelemetryClient::new(shared(settings), Arc::new(WebSocketTransport));
        let session = TelemetrySession::spawn(client);
        let mut state = session.subscribe_state();

        session.send(SessionCommand::Connect).await.unwrap();
        state.wait_for(|s| *s == ConnectionState::Open).await.unwrap();
        identified_rx.await.unwrap();

        drop(session);

        tokio::time::timeout(Duration::from_secs(5), server)
            .await
            .expect("server socket still open after the session was dropped")
            .unwrap();
    }
}
