use crate::config::MetronomeConfig;
use crate::errors::MetronomeError;
use reqwest::blocking::Client;
use reqwest::header::{CONNECTION, CONTENT_TYPE};
use serde_json::{json, Value};
use url::Url;

/// One JSON-RPC round trip to the metronome node.
///
/// Implementations return the whole reply object (`result`, `error`, `id`);
/// interpreting `error` is left to the caller.
pub trait RpcTransport: Send + Sync {
    fn call(&self, method: &str, params: &Value) -> Result<Value, MetronomeError>;
}

/// HTTP/1.1 JSON-RPC with basic auth, one connection per request
pub struct HttpTransport {
    client: Client,
    endpoint: Url,
    user: String,
    password: String,
}

impl HttpTransport {
    pub fn new(config: &MetronomeConfig) -> Result<Self, MetronomeError> {
        let client = Client::builder()
            .timeout(config.timeout())
            .connect_timeout(config.timeout())
            .build()
            .map_err(|e| MetronomeError::Connect(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: config.endpoint()?,
            user: config.user.clone(),
            password: config.password.clone(),
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

impl RpcTransport for HttpTransport {
    fn call(&self, method: &str, params: &Value) -> Result<Value, MetronomeError> {
        let body = format!("{}\n", request_object(method, params));

        let response = self
            .client
            .post(self.endpoint.clone())
            .header(CONNECTION, "close")
            .header(CONTENT_TYPE, "application/json")
            .basic_auth(&self.user, Some(&self.password))
            .body(body)
            .send()
            .map_err(|e| MetronomeError::Connect(e.to_string()))?;

        let status = response.status().as_u16();
        let body = response.text().map_err(|e| MetronomeError::Connect(e.to_string()))?;
        parse_reply(status, &body)
    }
}

/// JSON-RPC 1.0 request envelope; the id is always 1
pub fn request_object(method: &str, params: &Value) -> Value {
    json!({ "method": method, "params": params, "id": 1 })
}

/// Map an HTTP status and body to a reply object or a transport error.
///
/// 400, 404 and 500 carry JSON-RPC error bodies and are passed through.
pub fn parse_reply(status: u16, body: &str) -> Result<Value, MetronomeError> {
    match status {
        0 => return Err(MetronomeError::Connect("no HTTP status".to_string())),
        401 => return Err(MetronomeError::Unauthorized),
        400 | 404 | 500 => {}
        s if s >= 400 => return Err(MetronomeError::HttpStatus(s)),
        _ => {}
    }

    if body.is_empty() {
        return Err(MetronomeError::EmptyResponse);
    }

    let reply: Value = serde_json::from_str(body).map_err(|e| MetronomeError::InvalidReply(e.to_string()))?;
    match reply.as_object() {
        Some(obj) if !obj.is_empty() => Ok(reply),
        _ => Err(MetronomeError::InvalidReply("expected reply to have result, error and id properties".to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::thread::{self, JoinHandle};

    fn read_request(stream: &mut std::net::TcpStream) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];
        loop {
            let n = stream.read(&mut chunk).unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
            let text = String::from_utf8_lossy(&buf).to_string();
            if let Some(end) = text.find("\r\n\r\n") {
                let content_length = text[..end]
                    .lines()
                    .find_map(|l| {
                        let lower = l.to_ascii_lowercase();
                        lower.strip_prefix("content-length:").map(|v| v.trim().parse::<usize>().unwrap())
                    })
                    .unwrap_or(0);
                if buf.len() >= end + 4 + content_length {
                    break;
                }
            }
        }
        String::from_utf8_lossy(&buf).to_string()
    }

    fn serve_once(status_line: &str, body: &str) -> (MetronomeConfig, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let response = format!(
            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status_line,
            body.len(),
            body
        );
        let handle = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let request = read_request(&mut stream);
            stream.write_all(response.as_bytes()).unwrap();
            request
        });
        let config = MetronomeConfig {
            host: "127.0.0.1".to_string(),
            port,
            user: "user".to_string(),
            password: "pass".to_string(),
            timeout_secs: 5,
            ..Default::default()
        };
        (config, handle)
    }

    #[test]
    fn test_status_classification() {
        assert!(matches!(parse_reply(401, "{}"), Err(MetronomeError::Unauthorized)));
        assert!(matches!(parse_reply(403, "forbidden"), Err(MetronomeError::HttpStatus(403))));
        assert!(matches!(parse_reply(503, ""), Err(MetronomeError::HttpStatus(503))));
        assert!(matches!(parse_reply(200, ""), Err(MetronomeError::EmptyResponse)));
        assert!(matches!(parse_reply(200, "not json"), Err(MetronomeError::InvalidReply(_))));
        assert!(matches!(parse_reply(200, "{}"), Err(MetronomeError::InvalidReply(_))));

        let err_body = r#"{"result":null,"error":{"code":-5,"message":"Block not found"},"id":1}"#;
        assert!(parse_reply(404, err_body).is_ok());
        assert!(parse_reply(500, err_body).is_ok());
    }

    #[test]
    fn test_request_envelope() {
        let request = request_object("getblockheader", &json!(["00ff"]));
        assert_eq!(request["method"], "getblockheader");
        assert_eq!(request["params"][0], "00ff");
        assert_eq!(request["id"], 1);
    }

    #[test]
    fn test_http_round_trip_sends_basic_auth() {
        let (config, server) = serve_once("200 OK", r#"{"result":{"bestblockhash":"ab"},"error":null,"id":1}"#);
        let transport = HttpTransport::new(&config).unwrap();

        let reply = transport.call("getblockchaininfo", &json!([])).unwrap();
        assert_eq!(reply["result"]["bestblockhash"], "ab");

        let request = server.join().unwrap().to_ascii_lowercase();
        // base64("user:pass")
        assert!(request.contains("authorization: basic dxnlcjpwyxnz"));
        assert!(request.contains("\"method\":\"getblockchaininfo\""));
        assert!(request.starts_with("post / "));
    }

    #[test]
    fn test_http_unauthorized() {
        let (config, server) = serve_once("401 Unauthorized", "");
        let transport = HttpTransport::new(&config).unwrap();

        assert!(matches!(transport.call("getblockchaininfo", &json!([])), Err(MetronomeError::Unauthorized)));
        server.join().unwrap();
    }

    #[test]
    fn test_refused_connection_is_connect_error() {
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let config = MetronomeConfig { port, timeout_secs: 2, ..Default::default() };
        let transport = HttpTransport::new(&config).unwrap();

        assert!(matches!(transport.call("getblockchaininfo", &json!([])), Err(MetronomeError::Connect(_))));
    }
}
