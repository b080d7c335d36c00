//! Test doubles for the transport layer

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use crate::error::TransportError;
use crate::transport::{HttpGet, HttpResponse, Sleep};

enum Script {
    Responses(VecDeque<HttpResponse>),
    ConnectionFailure,
}

struct Route {
    pattern: String,
    script: Script,
    calls: usize,
}

/// Scripted HTTP client.
///
/// Routes match when the requested URL contains the pattern; the first
/// registered match wins. Each request pops the next scripted response and
/// the last one repeats forever. Unmatched URLs answer 404.
#[derive(Default)]
pub struct ScriptedGet {
    routes: Mutex<Vec<Route>>,
    requests: Mutex<Vec<String>>,
}

impl ScriptedGet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(&self, pattern: &str, responses: Vec<HttpResponse>) {
        self.push(pattern, Script::Responses(responses.into()));
    }

    /// Shorthand for a route that always answers 200 with `body`
    pub fn json(&self, pattern: &str, body: impl Into<String>) {
        self.route(pattern, vec![HttpResponse::new(200, body)]);
    }

    /// Route that always fails at the connection level
    pub fn fail_route(&self, pattern: &str) {
        self.push(pattern, Script::ConnectionFailure);
    }

    fn push(&self, pattern: &str, script: Script) {
        self.routes.lock().unwrap().push(Route {
            pattern: pattern.to_string(),
            script,
            calls: 0,
        });
    }

    /// Number of requests served by the route registered under `pattern`
    pub fn calls(&self, pattern: &str) -> usize {
        self.routes
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.pattern == pattern)
            .map(|r| r.calls)
            .sum()
    }

    /// Every requested URL, in order
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

impl HttpGet for ScriptedGet {
    fn get(&self, url: &str) -> Result<HttpResponse, TransportError> {
        self.requests.lock().unwrap().push(url.to_string());
        let mut routes = self.routes.lock().unwrap();
        let Some(route) = routes.iter_mut().find(|r| url.contains(&r.pattern)) else {
            return Ok(HttpResponse::new(404, ""));
        };
        route.calls += 1;
        match &mut route.script {
            Script::ConnectionFailure => Err(TransportError::Http {
                status: None,
                message: "connection refused".to_string(),
            }),
            Script::Responses(queue) => {
                let resp = if queue.len() > 1 {
                    queue.pop_front()
                } else {
                    queue.front().cloned()
                };
                Ok(resp.unwrap_or_else(|| HttpResponse::new(404, "")))
            }
        }
    }
}

/// Sleeper that records requested durations instead of sleeping
#[derive(Default)]
pub struct RecordingSleep {
    slept: Mutex<Vec<Duration>>,
}

impl RecordingSleep {
    pub fn slept(&self) -> Vec<Duration> {
        self.slept.lock().unwrap().clone()
    }
}

impl Sleep for RecordingSleep {
    fn sleep(&self, duration: Duration) {
        self.slept.lock().unwrap().push(duration);
    }
}
