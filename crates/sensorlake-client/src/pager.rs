use std::marker::PhantomData;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;

use sensorlake_core::{ContinuationToken, FetchFuture, SegmentSource};

use crate::executor::Executor;
use crate::http_client::HttpMethod;

#[derive(Serialize)]
struct NextPage<'a> {
    next_page: &'a ContinuationToken,
}

/// Fetches follow-up pages by re-issuing the original route with the
/// continuation token as the whole request body.
pub struct ExecutorPager<T> {
    executor: Arc<Executor>,
    method: HttpMethod,
    path: String,
    _item: PhantomData<fn() -> T>,
}

impl<T> ExecutorPager<T> {
    pub fn new(executor: Arc<Executor>, method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            executor,
            method,
            path: path.into(),
            _item: PhantomData,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

impl<T> SegmentSource<T> for ExecutorPager<T>
where
    T: DeserializeOwned + Send + 'static,
{
    fn fetch<'a>(&'a self, token: &'a ContinuationToken) -> FetchFuture<'a, T> {
        Box::pin(async move {
            let body = NextPage { next_page: token };
            self.executor
                .execute(self.method, &self.path, Some(&body))
                .await
        })
    }
}
