//! Conformance tests for the client session over in-memory transports:
//! the full handshake against a real server loop, correlation edge cases
//! against scripted peers, and the pre-ready invocation gate.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;

use abyss_core::SurrealConfig;
use abyss_mcp::{
    ChannelTransport, JsonRpcRequest, JsonRpcResponse, McpClient, McpError, McpServer,
    McpTransport, RpcId, SessionState,
};
use abyss_store::SurrealClient;
use abyss_tool_runtime::tool::EchoTool;
use abyss_tool_runtime::ToolRegistry;

fn echo_server() -> McpServer {
    let mut registry = ToolRegistry::new();
    registry.register(EchoTool).unwrap();
    let store = Arc::new(SurrealClient::new(SurrealConfig::from_env()));
    McpServer::new(registry, store)
}

#[tokio::test]
async fn handshake_reaches_ready_and_invokes_a_tool() {
    let (client_side, mut server_side) = ChannelTransport::pair();
    let mut server = echo_server();
    tokio::spawn(async move { server.run(&mut server_side).await });

    let mut client = McpClient::new(client_side);
    assert_eq!(client.state(), SessionState::Unstarted);

    client.handshake().await.unwrap();
    assert_eq!(client.state(), SessionState::Ready);
    assert!(!client.catalog().is_empty());
    assert_eq!(client.catalog().names(), vec!["echo"]);

    let result = client
        .call_tool("echo", json!({"message": "ping"}))
        .await
        .unwrap();
    assert!(!result.is_error);
    assert_eq!(result.text_content(), "ping");
}

#[tokio::test]
async fn call_before_ready_fails_without_touching_the_transport() {
    // The peer end is dropped: any write would surface a transport error,
    // so getting NotReady proves the call never reached the wire.
    let (client_side, server_side) = ChannelTransport::pair();
    drop(server_side);

    let mut client = McpClient::new(client_side);
    let err = client.call_tool("echo", json!({})).await.unwrap_err();
    assert!(matches!(
        err,
        McpError::NotReady {
            state: SessionState::Unstarted
        }
    ));
}

#[tokio::test]
async fn silent_remote_yields_timeout_not_hang() {
    let (client_side, _peer) = ChannelTransport::pair();
    let mut client = McpClient::new(client_side);

    let err = client
        .call("ping", None, Duration::from_millis(200))
        .await
        .unwrap_err();
    assert!(matches!(err, McpError::Timeout { id: 1, .. }));
}

#[tokio::test]
async fn stream_closure_is_distinct_from_timeout() {
    let (client_side, mut peer) = ChannelTransport::pair();
    tokio::spawn(async move {
        let _ = peer.receive().await;
        drop(peer);
    });

    let mut client = McpClient::new(client_side);
    let err = client
        .call("ping", None, Duration::from_secs(5))
        .await
        .unwrap_err();
    assert!(matches!(err, McpError::StreamClosed { .. }));
}

#[tokio::test]
async fn late_responses_and_diagnostics_are_discarded() {
    let (client_side, mut peer) = ChannelTransport::pair();

    let peer_task = tokio::spawn(async move {
        // First request: stay silent so the call abandons id 1.
        let _req1 = peer.receive().await.unwrap().unwrap();

        // Second request: reply late to id 1, emit a diagnostic line, then
        // answer id 2.
        let req2 = peer.receive().await.unwrap().unwrap();
        let req2: JsonRpcRequest = serde_json::from_str(&req2).unwrap();
        let stale = JsonRpcResponse::success(RpcId::Number(1), json!("stale"));
        peer.send(&serde_json::to_string(&stale).unwrap())
            .await
            .unwrap();
        peer.send("[server] retrying upstream connection")
            .await
            .unwrap();
        let fresh = JsonRpcResponse::success(req2.id, json!("fresh"));
        peer.send(&serde_json::to_string(&fresh).unwrap())
            .await
            .unwrap();

        // Keep the channel open until the client is done reading.
        let _ = peer.receive().await;
    });

    let mut client = McpClient::new(client_side);

    let err = client
        .call("first", None, Duration::from_millis(200))
        .await
        .unwrap_err();
    assert!(matches!(err, McpError::Timeout { id: 1, .. }));

    let response = client
        .call("second", None, Duration::from_secs(5))
        .await
        .unwrap();
    assert_eq!(response.id, RpcId::Number(2));
    assert_eq!(response.outcome().unwrap(), json!("fresh"));

    drop(client);
    peer_task.await.unwrap();
}

#[tokio::test]
async fn error_response_to_initialize_fails_the_session() {
    let (client_side, mut peer) = ChannelTransport::pair();

    tokio::spawn(async move {
        let req = peer.receive().await.unwrap().unwrap();
        let req: JsonRpcRequest = serde_json::from_str(&req).unwrap();
        let resp = JsonRpcResponse::error(req.id, -32600, "unsupported protocol version");
        peer.send(&serde_json::to_string(&resp).unwrap())
            .await
            .unwrap();
        let _ = peer.receive().await;
    });

    let mut client = McpClient::new(client_side);
    let err = client.handshake().await.unwrap_err();
    assert!(matches!(
        err,
        McpError::Handshake {
            stage: "initialize",
            ..
        }
    ));
    assert_eq!(client.state(), SessionState::Failed);

    // Failed is terminal: tool calls stay rejected.
    let err = client.call_tool("echo", json!({})).await.unwrap_err();
    assert!(matches!(err, McpError::NotReady { .. }));
}

#[tokio::test]
async fn tools_list_without_result_fails_the_session() {
    let (client_side, mut peer) = ChannelTransport::pair();

    tokio::spawn(async move {
        // initialize → success
        let req = peer.receive().await.unwrap().unwrap();
        let req: JsonRpcRequest = serde_json::from_str(&req).unwrap();
        let resp = JsonRpcResponse::success(req.id, json!({"capabilities": {}}));
        peer.send(&serde_json::to_string(&resp).unwrap())
            .await
            .unwrap();

        // initialized notification, nothing to answer
        let _notif = peer.receive().await.unwrap().unwrap();

        // tools/list → a response with neither result nor error
        let req = peer.receive().await.unwrap().unwrap();
        let req: JsonRpcRequest = serde_json::from_str(&req).unwrap();
        let bare = serde_json::json!({"jsonrpc": "2.0", "id": req.id});
        peer.send(&bare.to_string()).await.unwrap();
        let _ = peer.receive().await;
    });

    let mut client = McpClient::new(client_side);
    let err = client.handshake().await.unwrap_err();
    assert!(matches!(
        err,
        McpError::Handshake {
            stage: "tools/list",
            ..
        }
    ));
    assert_eq!(client.state(), SessionState::Failed);
}

#[tokio::test]
async fn handshake_cannot_be_rerun_on_the_same_session() {
    let (client_side, mut server_side) = ChannelTransport::pair();
    let mut server = echo_server();
    tokio::spawn(async move { server.run(&mut server_side).await });

    let mut client = McpClient::new(client_side);
    client.handshake().await.unwrap();

    let err = client.handshake().await.unwrap_err();
    assert!(matches!(err, McpError::Handshake { .. }));
}
