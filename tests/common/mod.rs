//! Shared test doubles: a scripted in-memory transport.

#![allow(dead_code)]

use async_trait::async_trait;
use remote_explorer::{Endpoint, ExplorerResult, Transport};
use serde_json::Value;
use std::fmt;
use std::sync::{Arc, Condvar, Mutex};
use std::time::Duration;

/// One-shot gate that holds scripted replies until opened.
#[derive(Debug, Default)]
pub struct Latch {
    open: Mutex<bool>,
    signal: Condvar,
}

impl Latch {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn open(&self) {
        *self.open.lock().unwrap() = true;
        self.signal.notify_all();
    }

    pub fn wait(&self) {
        let guard = self.open.lock().unwrap();
        let _guard = self.signal.wait_while(guard, |open| !*open).unwrap();
    }
}

/// Scripted reply to one request.
pub struct Reply {
    pub body: ExplorerResult<Value>,
    pub delay: Duration,
    pub latch: Option<Arc<Latch>>,
}

impl Reply {
    pub fn ok(body: Value) -> Self {
        Self {
            body: Ok(body),
            delay: Duration::ZERO,
            latch: None,
        }
    }

    pub fn err(err: remote_explorer::ExplorerError) -> Self {
        Self {
            body: Err(err),
            delay: Duration::ZERO,
            latch: None,
        }
    }

    pub fn held_by(mut self, latch: &Arc<Latch>) -> Self {
        self.latch = Some(Arc::clone(latch));
        self
    }

    pub fn after(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

type Responder = dyn Fn(Endpoint, &Value) -> Reply + Send + Sync;

/// In-memory transport answering from a closure and recording every request.
pub struct ScriptedTransport {
    responder: Box<Responder>,
    calls: Mutex<Vec<(Endpoint, Value)>>,
}

impl fmt::Debug for ScriptedTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScriptedTransport").finish_non_exhaustive()
    }
}

impl ScriptedTransport {
    pub fn new(responder: impl Fn(Endpoint, &Value) -> Reply + Send + Sync + 'static) -> Arc<Self> {
        Arc::new(Self {
            responder: Box::new(responder),
            calls: Mutex::new(Vec::new()),
        })
    }

    /// Always answers with the same body.
    pub fn fixed(body: Value) -> Arc<Self> {
        Self::new(move |_, _| Reply::ok(body.clone()))
    }

    pub fn calls(&self) -> Vec<(Endpoint, Value)> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, endpoint: Endpoint, body: &Value) -> Reply {
        self.calls.lock().unwrap().push((endpoint, body.clone()));
        (self.responder)(endpoint, body)
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    fn post_blocking(&self, endpoint: Endpoint, body: &Value) -> ExplorerResult<Value> {
        let reply = self.record(endpoint, body);
        if let Some(latch) = &reply.latch {
            latch.wait();
        }
        std::thread::sleep(reply.delay);
        reply.body
    }

    async fn post(&self, endpoint: Endpoint, body: &Value) -> ExplorerResult<Value> {
        let reply = self.record(endpoint, body);
        if let Some(latch) = reply.latch.clone() {
            tokio::task::spawn_blocking(move || latch.wait())
                .await
                .expect("latch wait panicked");
        }
        tokio::time::sleep(reply.delay).await;
        reply.body
    }
}

/// Successful move reply.
pub fn move_ok(moved: bool, alive: bool, message: &str) -> Value {
    serde_json::json!({ "success": true, "moved": moved, "alive": alive, "message": message })
}
