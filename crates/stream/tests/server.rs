mod common;

use std::time::Duration;

use bytes::Bytes;
use common::{connect, echo, get, split};
use http::StatusCode;
use micro_stream::server::Server;
use tokio::net::TcpStream;
use tokio_util::sync::CancellationToken;

#[tokio::test]
async fn two_clients_ten_sequential_echoes() {
    let server = Server::builder().address("127.0.0.1:0").bind().await.unwrap();
    let address = server.local_addr().unwrap();
    let shutdown = CancellationToken::new();
    let serving = tokio::spawn(server.serve(shutdown.clone()));

    let clients = (0..2u8).map(|client_index| {
        tokio::spawn(async move {
            let (client, _connection) = connect(TcpStream::connect(address).await.unwrap()).await;
            for request_index in 0..10u8 {
                let body = Bytes::from(vec![b'a' + client_index * 10 + request_index; 1024]);
                let response = echo(&client, split(&body, 100)).await;
                assert_eq!(response.status, StatusCode::OK);
                assert_eq!(response.body, body);
            }
        })
    });

    for client in clients.collect::<Vec<_>>() {
        client.await.unwrap();
    }

    shutdown.cancel();
    tokio::time::timeout(Duration::from_secs(5), serving).await.unwrap().unwrap();
}

#[tokio::test]
async fn shutdown_waits_for_open_connections() {
    let server = Server::builder().address("127.0.0.1:0").bind().await.unwrap();
    let address = server.local_addr().unwrap();
    let shutdown = CancellationToken::new();
    let serving = tokio::spawn(server.serve(shutdown.clone()));

    let (client, connection) = connect(TcpStream::connect(address).await.unwrap()).await;
    let response = get(&client, "type=eq&body_part=ok&count=2").await;
    assert_eq!(response.body, Bytes::from_static(b"okok"));

    shutdown.cancel();
    tokio::time::timeout(Duration::from_secs(5), serving).await.unwrap().unwrap();
    drop(client);
    let _ = connection.await;

    TcpStream::connect(address).await.unwrap_err();
}
