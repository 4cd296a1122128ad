use async_trait::async_trait;
use serde_json::Value;
use std::fmt::Debug;

use crate::router::RequestDescriptor;

pub mod http;

pub use http::HttpTransport;

/// Sends a routed request and hands back the decoded JSON payload.
///
/// Any failure (network, non-success status, undecodable body) is an `Err`
/// whose display chain describes what happened.
#[async_trait]
pub trait Transport: Send + Sync + Debug {
    async fn send(&self, request: &RequestDescriptor) -> anyhow::Result<Value>;
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use anyhow::anyhow;
    use std::sync::Mutex;

    /// Records every request and answers with a canned payload or error.
    #[derive(Debug)]
    pub(crate) struct RecordingTransport {
        reply: Result<Value, String>,
        requests: Mutex<Vec<RequestDescriptor>>,
    }

    impl RecordingTransport {
        pub(crate) fn replying(payload: Value) -> Self {
            Self { reply: Ok(payload), requests: Mutex::new(Vec::new()) }
        }

        pub(crate) fn failing(message: &str) -> Self {
            Self { reply: Err(message.to_string()), requests: Mutex::new(Vec::new()) }
        }

        pub(crate) fn requests(&self) -> Vec<RequestDescriptor> {
            self.requests.lock().unwrap().clone()
        }

        pub(crate) fn last_request(&self) -> RequestDescriptor {
            self.requests().pop().expect("no request was sent")
        }
    }

    #[async_trait]
    impl Transport for RecordingTransport {
        async fn send(&self, request: &RequestDescriptor) -> anyhow::Result<Value> {
            self.requests.lock().unwrap().push(request.clone());
            self.reply.clone().map_err(|msg| anyhow!(msg))
        }
    }
}
