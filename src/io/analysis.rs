use std::sync::mpsc::Sender;
use std::thread;
use std::time::Duration;

use serde::Deserialize;

use crate::model::analysis::AnalysisKind;
use crate::model::config::AnalysisConfig;

/// Prefix shown in front of every backend or transport failure.
pub const FAILURE_PREFIX: &str = "An error occurred while processing your request";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AnalysisError {
    /// Input was blank; nothing was sent.
    #[error("{}", .0.empty_input_message())]
    EmptyInput(AnalysisKind),
    /// Non-2xx reply, or a 2xx reply carrying `error`.
    #[error("{0}")]
    Server(String),
    #[error("{0}")]
    Transport(String),
    #[error("unexpected response: {0}")]
    Malformed(String),
}

impl AnalysisError {
    /// Text for the result panel and status line.
    pub fn failure_text(&self) -> String {
        match self {
            AnalysisError::EmptyInput(_) => self.to_string(),
            _ => format!("{}: {}", FAILURE_PREFIX, self),
        }
    }
}

/// One finished request, delivered back to the UI thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisReply {
    pub kind: AnalysisKind,
    pub outcome: Result<String, AnalysisError>,
}

#[derive(Debug, Deserialize)]
struct ReplyBody {
    #[serde(default)]
    result: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Blocking HTTP client for the analysis endpoints.
#[derive(Clone)]
pub struct AnalysisClient {
    agent: ureq::Agent,
    base_url: String,
    csrf_token: Option<String>,
}

impl AnalysisClient {
    pub fn new(config: &AnalysisConfig) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("prio/", env!("CARGO_PKG_VERSION")))
            .build();
        AnalysisClient {
            agent,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            csrf_token: config
                .csrf_token
                .clone()
                .filter(|t| !t.trim().is_empty()),
        }
    }

    pub fn url_for(&self, kind: AnalysisKind) -> String {
        format!("{}/api/{}/", self.base_url, kind.endpoint())
    }

    /// POST `{field: input}` and return the backend's `result` text.
    pub fn analyze(&self, kind: AnalysisKind, input: &str) -> Result<String, AnalysisError> {
        if input.trim().is_empty() {
            return Err(AnalysisError::EmptyInput(kind));
        }

        let url = self.url_for(kind);
        let mut request = self.agent.post(&url);
        if let Some(token) = &self.csrf_token {
            request = request
                .set("X-CSRFToken", token)
                .set("Cookie", &format!("csrftoken={}", token));
        }

        let mut body = serde_json::Map::new();
        body.insert(kind.field().to_string(), input.into());
        tracing::info!(%url, "analysis request");

        let outcome = match request.send_json(serde_json::Value::Object(body)) {
            Ok(response) => {
                let reply: ReplyBody = response
                    .into_json()
                    .map_err(|e| AnalysisError::Malformed(e.to_string()))?;
                match (reply.result, reply.error) {
                    (Some(result), _) => Ok(result),
                    (None, Some(error)) => Err(AnalysisError::Server(error)),
                    (None, None) => Err(AnalysisError::Malformed(
                        "missing \"result\" field".to_string(),
                    )),
                }
            }
            Err(ureq::Error::Status(code, response)) => {
                let message = response
                    .into_json::<ReplyBody>()
                    .ok()
                    .and_then(|r| r.error)
                    .unwrap_or_else(|| format!("HTTP {}", code));
                Err(AnalysisError::Server(message))
            }
            Err(ureq::Error::Transport(transport)) => {
                Err(AnalysisError::Transport(transport.to_string()))
            }
        };

        if let Err(e) = &outcome {
            tracing::warn!(%url, error = %e, "analysis failed");
        }
        outcome
    }

    /// Run `analyze` on a background thread; the reply arrives on `tx`.
    pub fn spawn(&self, kind: AnalysisKind, input: String, tx: Sender<AnalysisReply>) {
        let client = self.clone();
        thread::spawn(move || {
            let outcome = client.analyze(kind, &input);
            let _ = tx.send(AnalysisReply { kind, outcome });
        });
    }
}


#[cfg(test)]
mod tests {
    use super::test_server::serve_once;
    use super::*;
    use std::sync::mpsc;

    fn client(base_url: &str, token: Option<&str>) -> AnalysisClient {
        AnalysisClient::new(&AnalysisConfig {
            base_url: base_url.to_string(),
            csrf_token: token.map(String::from),
            timeout_secs: 5,
        })
    }

    #[test]
    fn test_url_for_each_kind() {
        let c = client("http://localhost:8000/", None);
        assert_eq!(
            c.url_for(AnalysisKind::YerkesDodson),
            "http://localhost:8000/api/yerkes-dodson/"
        );
        assert_eq!(
            c.url_for(AnalysisKind::Eisenhower),
            "http://localhost:8000/api/eisenhower/"
        );
    }

    #[test]
    fn test_empty_input_sends_nothing() {
        // Unroutable port: any request attempt would be a transport error
        let c = client("http://127.0.0.1:9", None);
        assert_eq!(
            c.analyze(AnalysisKind::Laborit, "  \n"),
            Err(AnalysisError::EmptyInput(AnalysisKind::Laborit))
        );
    }

    #[test]
    fn test_success_returns_result_verbatim() {
        let (url, server) = serve_once("200 OK", r#"{"result":"Quadrant 1: do it now\n"}"#);
        let c = client(&url, Some("tok123"));
        let result = c.analyze(AnalysisKind::Eisenhower, "Finish report").unwrap();
        assert_eq!(result, "Quadrant 1: do it now\n");

        let request = server.join().unwrap();
        assert!(request.starts_with("POST /api/eisenhower/ HTTP/1.1"));
        assert!(request.to_ascii_lowercase().contains("x-csrftoken: tok123"));
        assert!(request.contains("csrftoken=tok123"));
        assert!(request.contains(r#"{"task":"Finish report"}"#));
    }

    #[test]
    fn test_field_names_per_kind() {
        let (url, server) = serve_once("200 OK", r#"{"result":"ok"}"#);
        client(&url, None)
            .analyze(AnalysisKind::YerkesDodson, "9am: deep work")
            .unwrap();
        let request = server.join().unwrap();
        assert!(request.contains(r#"{"plan":"9am: deep work"}"#));
        assert!(!request.to_ascii_lowercase().contains("x-csrftoken"));
    }

    #[test]
    fn test_server_error_message() {
        let (url, server) = serve_once("400 Bad Request", r#"{"error":"bad input"}"#);
        let err = client(&url, None)
            .analyze(AnalysisKind::Laborit, "a, b")
            .unwrap_err();
        server.join().unwrap();
        assert_eq!(err, AnalysisError::Server("bad input".to_string()));
        assert_eq!(
            err.failure_text(),
            "An error occurred while processing your request: bad input"
        );
    }

    #[test]
    fn test_server_error_without_body() {
        let (url, server) = serve_once("500 Internal Server Error", "oops");
        let err = client(&url, None)
            .analyze(AnalysisKind::Laborit, "a")
            .unwrap_err();
        server.join().unwrap();
        assert_eq!(err, AnalysisError::Server("HTTP 500".to_string()));
    }

    #[test]
    fn test_ok_without_result_is_malformed() {
        let (url, server) = serve_once("200 OK", r#"{"something":"else"}"#);
        let err = client(&url, None)
            .analyze(AnalysisKind::Eisenhower, "x")
            .unwrap_err();
        server.join().unwrap();
        assert!(matches!(err, AnalysisError::Malformed(_)));
    }

    #[test]
    fn test_connection_refused_is_transport() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        drop(listener);
        let err = client(&url, None)
            .analyze(AnalysisKind::Eisenhower, "x")
            .unwrap_err();
        assert!(matches!(err, AnalysisError::Transport(_)));
        assert!(err.failure_text().starts_with(FAILURE_PREFIX));
    }

    #[test]
    fn test_spawn_delivers_reply() {
        let (url, server) = serve_once("200 OK", r#"{"result":"fine"}"#);
        let (tx, rx) = mpsc::channel();
        client(&url, None).spawn(AnalysisKind::Laborit, "a".to_string(), tx);
        let reply = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        server.join().unwrap();
        assert_eq!(reply.kind, AnalysisKind::Laborit);
        assert_eq!(reply.outcome, Ok("fine".to_string()));
    }
}
