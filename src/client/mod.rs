/// FlashBlade REST client and the JSON-fetch seam the collector depends on
pub mod flashblade;
pub mod mock;

pub use flashblade::FlashbladeClient;
pub use mock::{FetchCall, MockFetcher};

use crate::error::ClientError;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Query parameters appended to a GET request
pub type QueryParams = BTreeMap<String, String>;

/// Future returned by [`JsonFetcher::fetch_json`]
pub type FetchFuture<'a> = Pin<Box<dyn Future<Output = Result<Value, ClientError>> + Send + 'a>>;

/// Capability to perform an authenticated GET and return the decoded JSON body
///
/// Implemented by [`FlashbladeClient`] for real arrays and by [`MockFetcher`]
/// for tests. Authentication and timeouts live entirely behind this trait.
pub trait JsonFetcher: Send + Sync {
    fn fetch_json<'a>(
        &'a self,
        endpoint: &'a str,
        params: Option<&'a QueryParams>,
    ) -> FetchFuture<'a>;
}

impl<T: JsonFetcher + ?Sized> JsonFetcher for &T {
    fn fetch_json<'a>(
        &'a self,
        endpoint: &'a str,
        params: Option<&'a QueryParams>,
    ) -> FetchFuture<'a> {
        (**self).fetch_json(endpoint, params)
    }
}

impl<T: JsonFetcher + ?Sized> JsonFetcher for Arc<T> {
    fn fetch_json<'a>(
        &'a self,
        endpoint: &'a str,
        params: Option<&'a QueryParams>,
    ) -> FetchFuture<'a> {
        (**self).fetch_json(endpoint, params)
    }
}

/// Fetch `endpoint` and decode the body into `T`
///
/// # Errors
///
/// Returns whatever the fetcher returns, or `ClientError::Decode` when the
/// body does not match `T`.
pub async fn get_json<T, F>(
    fetcher: &F,
    endpoint: &str,
    params: Option<&QueryParams>,
) -> Result<T, ClientError>
where
    T: DeserializeOwned,
    F: JsonFetcher + ?Sized,
{
    let value = fetcher.fetch_json(endpoint, params).await?;
    Ok(serde_json::from_value(value)?)
}
