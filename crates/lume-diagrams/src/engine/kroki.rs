//! Kroki HTTP engine.

use std::time::Duration;

use ureq::Agent;

use super::source::prepare_source;
use super::{DiagramEngine, DiagramRequest, EngineError};
use crate::consts::DEFAULT_TIMEOUT;

/// Create HTTP agent with the specified timeout.
fn create_agent(timeout: Duration) -> Agent {
    Agent::config_builder()
        .timeout_global(Some(timeout))
        .http_status_as_error(false)
        .build()
        .into()
}

/// Renders diagrams by posting their source to a Kroki server.
pub struct KrokiEngine {
    server_url: String,
    agent: Agent,
}

impl KrokiEngine {
    /// Create an engine for `server_url` (e.g. `https://kroki.io`).
    #[must_use]
    pub fn new(server_url: impl Into<String>) -> Self {
        Self {
            server_url: server_url.into().trim_end_matches('/').to_owned(),
            agent: create_agent(DEFAULT_TIMEOUT),
        }
    }

    /// Set HTTP timeout for Kroki requests.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.agent = create_agent(timeout);
        self
    }

    #[must_use]
    pub fn server_url(&self) -> &str {
        &self.server_url
    }
}

impl DiagramEngine for KrokiEngine {
    fn render(&self, request: &DiagramRequest) -> Result<String, EngineError> {
        let endpoint = request.language.kroki_endpoint();
        let url = format!("{}/{endpoint}/svg", self.server_url);
        let source = prepare_source(request);

        let response = self
            .agent
            .post(&url)
            .header("Content-Type", "text/plain")
            .send(source.as_bytes())
            .map_err(|e| EngineError::Http(e.to_string()))?;

        let status = response.status().as_u16();
        let mut body = response.into_body();

        if status >= 400 {
            let error_body = body
                .read_to_string()
                .unwrap_or_else(|_| String::from("(unable to read error body)"));
            return Err(EngineError::Http(format!("HTTP {status}: {error_body}")));
        }

        body.read_to_string()
            .map_err(|e| EngineError::Io(e.to_string()))
    }

    fn name(&self) -> &'static str {
        "kroki"
    }
}
