#![allow(dead_code)]

use std::io::Read;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use serde_json::{json, Value};
use tiny_http::{Response, Server, StatusCode};

use devnet_mint_adapters::{MintAdapterConfig, SolanaRpcAdapter};

pub type Calls = Arc<Mutex<Vec<(String, Value)>>>;

/// JSON-RPC server on an ephemeral port. `handler` maps (method, params,
/// call index for that method) to the `result` or an `error` object.
pub fn spawn_rpc_server<F>(handler: F) -> (String, Calls)
where
    F: Fn(&str, &Value, usize) -> Result<Value, Value> + Send + 'static,
{
    let server = Server::http("127.0.0.1:0").expect("start server");
    let addr = format!("http://{}", server.server_addr());
    let calls: Calls = Arc::new(Mutex::new(Vec::new()));
    let recorded = Arc::clone(&calls);

    thread::spawn(move || loop {
        let mut req = match server.recv_timeout(Duration::from_secs(10)) {
            Ok(Some(r)) => r,
            _ => break,
        };
        let mut body = String::new();
        let _ = req.as_reader().read_to_string(&mut body);
        let parsed: Value = serde_json::from_str(&body).unwrap_or(Value::Null);
        let method = parsed["method"].as_str().unwrap_or_default().to_owned();
        let params = parsed["params"].clone();

        let index = {
            let mut g = recorded.lock().expect("calls lock");
            let index = g.iter().filter(|(m, _)| *m == method).count();
            g.push((method.clone(), params.clone()));
            index
        };

        let payload = match handler(&method, &params, index) {
            Ok(result) => json!({"jsonrpc": "2.0", "id": parsed["id"], "result": result}),
            Err(error) => json!({"jsonrpc": "2.0", "id": parsed["id"], "error": error}),
        };
        let response = Response::from_string(payload.to_string()).with_status_code(StatusCode(200));
        let _ = req.respond(response);
    });

    (addr, calls)
}

pub fn http_adapter(url: String) -> SolanaRpcAdapter {
    SolanaRpcAdapter::with_config(MintAdapterConfig {
        rpc_url: Some(url),
        rpc_http_enabled: true,
        rpc_timeout_ms: 5_000,
        confirm_poll_interval_ms: 10,
        confirm_max_attempts: 5,
        ..MintAdapterConfig::default()
    })
}

pub fn methods(calls: &Calls) -> Vec<String> {
    calls
        .lock()
        .expect("calls lock")
        .iter()
        .map(|(m, _)| m.clone())
        .collect()
}
