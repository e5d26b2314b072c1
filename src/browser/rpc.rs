//! JSON-RPC plumbing for the Playwright server
//!
//! Requests and responses travel as one JSON document per line over the
//! server's stdin/stdout. A background task owns both pipes and routes each
//! response back to its caller by request id.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{ChildStdin, ChildStdout};
use tokio::sync::{mpsc, oneshot};
use tracing::{trace, warn};

use super::BrowserError;

/// JSON-RPC request
#[derive(Debug, Serialize)]
pub struct RpcRequest {
    pub jsonrpc: &'static str,
    pub id: u64,
    pub method: String,
    pub params: Value,
}

/// JSON-RPC response
#[derive(Debug, Deserialize)]
pub struct RpcResponse {
    #[allow(dead_code)]
    pub jsonrpc: String,
    pub id: u64,
    pub result: Option<Value>,
    pub error: Option<RpcError>,
}

/// JSON-RPC error
#[derive(Debug, Deserialize)]
pub struct RpcError {
    pub code: i32,
    pub message: String,
}

type Responder = oneshot::Sender<Result<Value, BrowserError>>;

/// Request sender type alias
pub type RequestSender = mpsc::Sender<(RpcRequest, Responder)>;

/// Request receiver type alias
pub type RequestReceiver = mpsc::Receiver<(RpcRequest, Responder)>;

static REQUEST_ID: AtomicU64 = AtomicU64::new(1);

/// Create a new RPC request with auto-incremented ID
pub fn new_request(method: &str, params: Value) -> RpcRequest {
    RpcRequest {
        jsonrpc: "2.0",
        id: REQUEST_ID.fetch_add(1, Ordering::SeqCst),
        method: method.to_string(),
        params,
    }
}

/// Send an RPC request and wait at most `deadline` for its response
pub async fn send_request(
    request_tx: &RequestSender,
    method: &str,
    params: Value,
    deadline: Duration,
) -> Result<Value, BrowserError> {
    let req = new_request(method, params);
    let (tx, rx) = oneshot::channel();

    request_tx
        .send((req, tx))
        .await
        .map_err(|_| BrowserError::Disconnected)?;

    match tokio::time::timeout(deadline, rx).await {
        Ok(response) => response.map_err(|_| BrowserError::Disconnected)?,
        Err(_) => Err(BrowserError::Timeout),
    }
}

/// Turn a raw response into the caller's result
pub fn into_result(response: RpcResponse) -> Result<Value, BrowserError> {
    match response.error {
        Some(err) => Err(BrowserError::ServerError(format!(
            "[{}] {}",
            err.code, err.message
        ))),
        None => Ok(response.result.unwrap_or(Value::Null)),
    }
}

/// Spawn the background communication task for JSON-RPC over stdin/stdout
pub fn spawn_communication_task(
    mut request_rx: RequestReceiver,
    stdin: ChildStdin,
    stdout: ChildStdout,
) {
    tokio::spawn(async move {
        let mut stdin = stdin;
        let mut reader = BufReader::new(stdout);
        let mut pending: HashMap<u64, Responder> = HashMap::new();
        let mut line = String::new();

        loop {
            tokio::select! {
                request = request_rx.recv() => {
                    match request {
                        Some((req, response_tx)) => {
                            let json = match serde_json::to_string(&req) {
                                Ok(json) => json + "\n",
                                Err(e) => {
                                    let _ = response_tx.send(Err(e.into()));
                                    continue;
                                }
                            };
                            trace!(id = req.id, method = %req.method, "rpc request");
                            if stdin.write_all(json.as_bytes()).await.is_err() {
                                let _ = response_tx.send(Err(BrowserError::Disconnected));
                                break;
                            }
                            pending.insert(req.id, response_tx);
                        }
                        None => break,
                    }
                }

                result = reader.read_line(&mut line) => {
                    match result {
                        Ok(0) => break,
                        Ok(_) => {
                            match serde_json::from_str::<RpcResponse>(&line) {
                                Ok(response) => {
                                    if let Some(tx) = pending.remove(&response.id) {
                                        let _ = tx.send(into_result(response));
                                    }
                                }
                                Err(e) => warn!("Ignoring malformed server line: {}", e),
                            }
                            line.clear();
                        }
                        Err(_) => break,
                    }
                }
            }
        }

        for (_, tx) in pending.drain() {
            let _ = tx.send(Err(BrowserError::Disconnected));
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_ids_increase() {
        let first = new_request("page.url", Value::Null);
        let second = new_request("page.url", Value::Null);
        assert!(second.id > first.id);
        assert_eq!(first.jsonrpc, "2.0");
    }

    #[test]
    fn test_into_result_error() {
        let response: RpcResponse = serde_json::from_str(
            r#"{"jsonrpc":"2.0","id":7,"error":{"code":-32000,"message":"boom"}}"#,
        )
        .unwrap();
        let err = into_result(response).unwrap_err();
        assert_eq!(err.to_string(), "Browser server error: [-32000] boom");
    }

    #[test]
    fn test_into_result_missing_result_is_null() {
        let response: RpcResponse =
            serde_json::from_str(r#"{"jsonrpc":"2.0","id":8}"#).unwrap();
        assert_eq!(into_result(response).unwrap(), Value::Null);
    }
}
