//! Scripted in-memory transport.
//!
//! Replies are queued per method and URL fragment and handed out in order.
//! Every request is recorded so callers can assert on what was sent.
//! Requests with no queued reply get a 404.

use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;

use super::http::{HttpTransport, TransportResponse};
use crate::error::HttpError;

/// HTTP method of a recorded or scripted request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// Bearer-authorized GET.
    Get,
    /// Form POST.
    PostForm,
    /// Bearer-authorized JSON POST.
    PostJson,
}

/// A request seen by the transport.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    /// Method used.
    pub method: Method,
    /// Full URL.
    pub url: String,
    /// Bearer token, for authorized requests.
    pub bearer: Option<String>,
    /// Form fields or JSON body.
    pub body: serde_json::Value,
}

#[derive(Debug, Clone)]
enum Reply {
    Response(TransportResponse),
    Failure(String),
}

#[derive(Debug)]
struct Route {
    method: Method,
    url_fragment: String,
    replies: VecDeque<Reply>,
}

/// Transport answering from queued replies.
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    routes: Mutex<Vec<Route>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl ScriptedTransport {
    /// Creates a transport with no scripted replies.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a response for requests whose URL contains `url_fragment`.
    pub fn push(&self, method: Method, url_fragment: &str, response: TransportResponse) {
        self.push_reply(method, url_fragment, Reply::Response(response));
    }

    /// Queues a connection failure for requests whose URL contains `url_fragment`.
    pub fn push_failure(&self, method: Method, url_fragment: &str, message: &str) {
        self.push_reply(method, url_fragment, Reply::Failure(message.to_string()));
    }

    fn push_reply(&self, method: Method, url_fragment: &str, reply: Reply) {
        let mut routes = self.routes.lock().unwrap_or_else(PoisonError::into_inner);
        match routes
            .iter_mut()
            .find(|r| r.method == method && r.url_fragment == url_fragment)
        {
            Some(route) => route.replies.push_back(reply),
            None => routes.push(Route {
                method,
                url_fragment: url_fragment.to_string(),
                replies: VecDeque::from([reply]),
            }),
        }
    }

    /// Returns every request seen so far.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Counts requests with `method` whose URL contains `url_fragment`.
    pub fn count(&self, method: Method, url_fragment: &str) -> usize {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|r| r.method == method && r.url.contains(url_fragment))
            .count()
    }

    fn answer(&self, request: RecordedRequest) -> Result<TransportResponse, HttpError> {
        let reply = {
            let mut routes = self.routes.lock().unwrap_or_else(PoisonError::into_inner);
            routes
                .iter_mut()
                .filter(|r| r.method == request.method && request.url.contains(&r.url_fragment))
                .find_map(|r| r.replies.pop_front())
        };

        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request);

        match reply {
            Some(Reply::Response(response)) => Ok(response),
            Some(Reply::Failure(message)) => Err(HttpError::Connection(message)),
            None => Ok(TransportResponse::new(404, "no scripted reply")),
        }
    }
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn get(&self, url: &str, bearer: &str) -> Result<TransportResponse, HttpError> {
        self.answer(RecordedRequest {
            method: Method::Get,
            url: url.to_string(),
            bearer: Some(bearer.to_string()),
            body: serde_json::Value::Null,
        })
    }

    async fn post_form(
        &self,
        url: &str,
        form: &[(&str, &str)],
    ) -> Result<TransportResponse, HttpError> {
        let fields: serde_json::Map<String, serde_json::Value> = form
            .iter()
            .map(|(k, v)| ((*k).to_string(), serde_json::Value::from(*v)))
            .collect();

        self.answer(RecordedRequest {
            method: Method::PostForm,
            url: url.to_string(),
            bearer: None,
            body: serde_json::Value::Object(fields),
        })
    }

    async fn post_json(
        &self,
        url: &str,
        bearer: &str,
        body: &serde_json::Value,
    ) -> Result<TransportResponse, HttpError> {
        self.answer(RecordedRequest {
            method: Method::PostJson,
            url: url.to_string(),
            bearer: Some(bearer.to_string()),
            body: body.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_replies_in_order_then_404() {
        let transport = ScriptedTransport::new();
        transport.push(Method::Get, "/values/", TransportResponse::new(429, ""));
        transport.push(Method::Get, "/values/", TransportResponse::new(200, "{}"));

        let url = "https://api/v4/spreadsheets/id/values/A1";
        assert_eq!(transport.get(url, "t").await.unwrap().status, 429);
        assert_eq!(transport.get(url, "t").await.unwrap().status, 200);
        assert_eq!(transport.get(url, "t").await.unwrap().status, 404);
        assert_eq!(transport.count(Method::Get, "/values/"), 3);
    }

    #[tokio::test]
    async fn test_failure_and_form_recording() {
        let transport = ScriptedTransport::new();
        transport.push_failure(Method::PostForm, "/token", "connection reset");

        let result = transport.post_form("https://oauth/token", &[("grant_type", "x")]).await;
        assert!(matches!(result, Err(HttpError::Connection(_))));

        let requests = transport.requests();
        assert_eq!(requests[0].body["grant_type"], "x");
        assert_eq!(requests[0].bearer, None);
    }
}
