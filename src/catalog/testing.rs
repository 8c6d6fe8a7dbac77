//! In-memory transport for exercising the client and service without a network.

use serde_json::Value;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use super::client::{Transport, TransportResponse};
use super::error::TransportError;

/// One scripted reaction to a request.
#[derive(Debug, Clone)]
pub enum Step {
  Respond(TransportResponse),
  Fail(String),
  /// Never completes; the client's timeout fires instead
  Hang,
}

impl Step {
  pub fn ok(body: Value) -> Self {
    Step::Respond(TransportResponse {
      status: 200,
      body: body.to_string(),
    })
  }

  pub fn status(status: u16, body: &str) -> Self {
    Step::Respond(TransportResponse {
      status,
      body: body.to_string(),
    })
  }

  pub fn fail(message: &str) -> Self {
    Step::Fail(message.to_string())
  }
}

#[derive(Default)]
struct Script {
  steps: VecDeque<Step>,
  urls: Vec<String>,
  last_headers: Vec<(String, String)>,
}

/// Transport that replays a fixed script. Once the script runs out every
/// request hangs.
#[derive(Clone)]
pub struct ScriptedTransport {
  script: Arc<Mutex<Script>>,
}

impl ScriptedTransport {
  pub fn new(steps: Vec<Step>) -> Self {
    Self {
      script: Arc::new(Mutex::new(Script {
        steps: steps.into(),
        ..Default::default()
      })),
    }
  }

  pub fn calls(&self) -> usize {
    self.script.lock().unwrap().urls.len()
  }

  pub fn urls(&self) -> Vec<String> {
    self.script.lock().unwrap().urls.clone()
  }

  pub fn last_headers(&self) -> Vec<(String, String)> {
    self.script.lock().unwrap().last_headers.clone()
  }
}

impl Transport for ScriptedTransport {
  async fn get(
    &self,
    url: &str,
    headers: &[(String, String)],
  ) -> Result<TransportResponse, TransportError> {
    let step = {
      let mut script = self.script.lock().unwrap();
      script.urls.push(url.to_string());
      script.last_headers = headers.to_vec();
      script.steps.pop_front().unwrap_or(Step::Hang)
    };

    match step {
      Step::Respond(response) => Ok(response),
      Step::Fail(message) => Err(TransportError::Network(message)),
      Step::Hang => std::future::pending().await,
    }
  }
}
