use crate::client::{FetchFuture, JsonFetcher, QueryParams};
use crate::collectors::usage_collector::{FILESYSTEMS_ENDPOINT, FILE_SYSTEM_NAMES_PARAM};
use crate::error::ClientError;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Mutex;

/// One request observed by [`MockFetcher`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchCall {
    pub endpoint: String,
    pub params: Option<QueryParams>,
}

impl FetchCall {
    /// The file system this call was scoped to, if any
    pub fn file_system(&self) -> Option<&str> {
        self.params
            .as_ref()
            .and_then(|params| params.get(FILE_SYSTEM_NAMES_PARAM))
            .map(String::as_str)
    }
}

/// Canned reply for a route
#[derive(Debug, Clone)]
enum Reply {
    Body(Value),
    Status(u16),
}

/// Route key: endpoint plus the optional file system it is scoped to
type Route = (String, Option<String>);

/// In-memory [`JsonFetcher`] for tests and dry runs
///
/// Replies are looked up by endpoint and file system name first, then by
/// endpoint alone. Unknown routes answer with a 404. Every call is recorded
/// in order so tests can assert on the exact request sequence.
#[derive(Debug, Default)]
pub struct MockFetcher {
    routes: HashMap<Route, Reply>,
    calls: Mutex<Vec<FetchCall>>,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer the file system listing with the given names, in order
    pub fn with_filesystems(self, names: &[&str]) -> Self {
        let items: Vec<Value> = names.iter().map(|name| json!({ "name": name })).collect();
        let total = items.len();
        self.with_response(
            FILESYSTEMS_ENDPOINT,
            json!({ "items": items, "pagination_info": { "total_item_count": total } }),
        )
    }

    /// Answer every call to `endpoint` with `body`
    pub fn with_response(mut self, endpoint: &str, body: Value) -> Self {
        self.routes
            .insert((endpoint.to_string(), None), Reply::Body(body));
        self
    }

    /// Answer calls to `endpoint` scoped to `file_system` with `body`
    pub fn with_filesystem_response(
        mut self,
        endpoint: &str,
        file_system: &str,
        body: Value,
    ) -> Self {
        self.routes.insert(
            (endpoint.to_string(), Some(file_system.to_string())),
            Reply::Body(body),
        );
        self
    }

    /// Fail every call to `endpoint` with an HTTP status
    pub fn with_failure(mut self, endpoint: &str, status: u16) -> Self {
        self.routes
            .insert((endpoint.to_string(), None), Reply::Status(status));
        self
    }

    /// Fail calls to `endpoint` scoped to `file_system` with an HTTP status
    pub fn with_filesystem_failure(
        mut self,
        endpoint: &str,
        file_system: &str,
        status: u16,
    ) -> Self {
        self.routes.insert(
            (endpoint.to_string(), Some(file_system.to_string())),
            Reply::Status(status),
        );
        self
    }

    /// All calls observed so far, oldest first
    pub fn calls(&self) -> Vec<FetchCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Calls rendered as `endpoint` or `endpoint(file_system)`
    pub fn call_log(&self) -> Vec<String> {
        self.calls()
            .iter()
            .map(|call| match call.file_system() {
                Some(file_system) => format!("{}({})", call.endpoint, file_system),
                None => call.endpoint.clone(),
            })
            .collect()
    }

    /// Forget recorded calls; routes are kept
    pub fn reset(&self) {
        self.calls.lock().unwrap().clear();
    }

    fn reply_for(&self, call: &FetchCall) -> Result<Value, ClientError> {
        let scoped = (call.endpoint.clone(), call.file_system().map(str::to_string));
        let unscoped = (call.endpoint.clone(), None);

        match self.routes.get(&scoped).or_else(|| self.routes.get(&unscoped)) {
            Some(Reply::Body(body)) => Ok(body.clone()),
            Some(Reply::Status(status)) => Err(ClientError::Status {
                status: *status,
                body: format!("mock failure for {}", call.endpoint),
            }),
            None => Err(ClientError::Status {
                status: 404,
                body: format!("no mock route for {}", call.endpoint),
            }),
        }
    }
}

impl JsonFetcher for MockFetcher {
    fn fetch_json<'a>(
        &'a self,
        endpoint: &'a str,
        params: Option<&'a QueryParams>,
    ) -> FetchFuture<'a> {
        let call = FetchCall {
            endpoint: endpoint.to_string(),
            params: params.cloned(),
        };
        self.calls.lock().unwrap().push(call.clone());
        let reply = self.reply_for(&call);
        Box::pin(async move { reply })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scoped(file_system: &str) -> QueryParams {
        let mut params = QueryParams::new();
        params.insert(FILE_SYSTEM_NAMES_PARAM.to_string(), file_system.to_string());
        params
    }

    #[tokio::test]
    async fn test_scoped_route_wins_over_endpoint_route() {
        let fetcher = MockFetcher::new()
            .with_response("usage/users", json!({"which": "default"}))
            .with_filesystem_response("usage/users", "fs2", json!({"which": "fs2"}));

        let fs1 = fetcher
            .fetch_json("usage/users", Some(&scoped("fs1")))
            .await
            .unwrap();
        let fs2 = fetcher
            .fetch_json("usage/users", Some(&scoped("fs2")))
            .await
            .unwrap();

        assert_eq!(fs1["which"], "default");
        assert_eq!(fs2["which"], "fs2");
    }

    #[tokio::test]
    async fn test_failures_and_unknown_routes() {
        let fetcher = MockFetcher::new()
            .with_failure("file-systems", 503)
            .with_filesystem_failure("usage/groups", "fs1", 500);

        match fetcher.fetch_json("file-systems", None).await {
            Err(ClientError::Status { status, .. }) => assert_eq!(status, 503),
            other => panic!("Expected Status error, got {:?}", other),
        }

        match fetcher.fetch_json("usage/groups", Some(&scoped("fs1"))).await {
            Err(ClientError::Status { status, .. }) => assert_eq!(status, 500),
            other => panic!("Expected Status error, got {:?}", other),
        }

        match fetcher.fetch_json("usage/users", None).await {
            Err(ClientError::Status { status, .. }) => assert_eq!(status, 404),
            other => panic!("Expected Status error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_call_recording_and_reset() {
        let fetcher = MockFetcher::new().with_filesystems(&["a", "b"]);

        let listing = fetcher.fetch_json("file-systems", None).await.unwrap();
        assert_eq!(listing["items"][1]["name"], "b");
        assert_eq!(listing["pagination_info"]["total_item_count"], 2);

        let _ = fetcher.fetch_json("usage/groups", Some(&scoped("a"))).await;

        assert_eq!(fetcher.call_count(), 2);
        assert_eq!(fetcher.call_log(), vec!["file-systems", "usage/groups(a)"]);
        assert_eq!(fetcher.calls()[1].file_system(), Some("a"));
        assert_eq!(fetcher.calls()[0].file_system(), None);

        fetcher.reset();
        assert_eq!(fetcher.call_count(), 0);
    }
}
