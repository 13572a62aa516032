//! A JSON-RPC node served over HTTP on a local port, answering each request
//! through a test-provided handler

use std::sync::{Arc, Mutex};

use http_body_util::{BodyExt, Full};
use hyper::{
    Error as HyperError, Request, Response,
    body::{Bytes, Incoming as IncomingBody},
    server::conn::http1::Builder as Http1Builder,
    service::service_fn,
};
use hyper_util::rt::{TokioIo, TokioTimer};
use serde_json::{Value, json};
use tokio::net::{TcpListener, TcpStream};
use url::Url;

/// The result of a handled call: a JSON result or a JSON-RPC error code and
/// message
pub type HandlerResult = Result<Value, (i64, String)>;
/// Answers a call given its method name and params
type Handler = Arc<dyn Fn(&str, &Value) -> HandlerResult + Send + Sync>;

/// A mock node listening on an ephemeral local port
pub struct MockNode {
    /// The URL the node is served at
    url: Url,
    /// The body of every request received, in order
    requests: Arc<Mutex<Vec<Value>>>,
}

impl MockNode {
    /// Bind a listener and serve the handler until the runtime shuts down
    pub async fn serve<F>(handler: F) -> Self
    where
        F: Fn(&str, &Value) -> HandlerResult + Send + Sync + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = Url::parse(&format!("http://{}", listener.local_addr().unwrap())).unwrap();

        let handler: Handler = Arc::new(handler);
        let requests = Arc::new(Mutex::new(Vec::new()));
        let requests_clone = requests.clone();
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let handler = handler.clone();
                let requests = requests_clone.clone();
                tokio::spawn(handle_stream(stream, handler, requests));
            }
        });

        Self { url, requests }
    }

    /// The URL the node is served at
    pub fn url(&self) -> Url {
        self.url.clone()
    }

    /// The body of every request received so far
    pub fn requests(&self) -> Vec<Value> {
        self.requests.lock().unwrap().clone()
    }
}

/// Serve the JSON-RPC calls on one connection
async fn handle_stream(stream: TcpStream, handler: Handler, requests: Arc<Mutex<Vec<Value>>>) {
    let service_fn = service_fn(move |req: Request<IncomingBody>| {
        let handler = handler.clone();
        let requests = requests.clone();
        async move {
            let body = req.into_body().collect().await?.to_bytes();
            let call: Value = serde_json::from_slice(&body).unwrap();
            requests.lock().unwrap().push(call.clone());

            let method = call["method"].as_str().unwrap_or_default();
            let reply = match handler(method, &call["params"]) {
                Ok(result) => json!({ "jsonrpc": "2.0", "id": call["id"], "result": result }),
                Err((code, message)) => json!({
                    "jsonrpc": "2.0",
                    "id": call["id"],
                    "error": { "code": code, "message": message },
                }),
            };

            let resp = Response::builder()
                .header("content-type", "application/json")
                .body(Full::new(Bytes::from(reply.to_string())))
                .unwrap();
            Ok::<_, HyperError>(resp)
        }
    });

    let stream_io = TokioIo::new(stream);
    let timer = TokioTimer::new();
    let _ = Http1Builder::new().timer(timer).serve_connection(stream_io, service_fn).await;
}

/// Find the first value stored under `key` anywhere in the given params,
/// whether the call encoded them by name or by position
pub fn find_param<'a>(params: &'a Value, key: &str) -> Option<&'a Value> {
    match params {
        Value::Object(map) => {
            map.get(key).or_else(|| map.values().find_map(|value| find_param(value, key)))
        },
        Value::Array(values) => values.iter().find_map(|value| find_param(value, key)),
        _ => None,
    }
}
