//! Client facade over the executor.
//!
//! Every operation returns `Ok(Envelope)` for anything the service said,
//! including failures. `Err` is reserved for requests that could not be
//! built or responses that could not be decoded.

use std::collections::BTreeSet;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};

use sensorlake_core::{
    validate_range, ClientError, Cursor, DeleteSummary, Device, Envelope, Pipeline, Query, Row,
    Search, Segment, Selection, Selector, Timestamp, ValidationError, WritePoint, WriteSummary,
};

use crate::config::ClientConfig;
use crate::executor::Executor;
use crate::http_client::{HttpClient, HttpMethod, ReqwestHttpClient};
use crate::pager::ExecutorPager;

#[derive(Serialize)]
struct TimeWindow {
    start: Timestamp,
    stop: Timestamp,
}

#[derive(Debug, Clone)]
pub struct Client {
    executor: Arc<Executor>,
}

impl Client {
    /// Client backed by reqwest.
    pub fn new(config: ClientConfig) -> Self {
        let http = Arc::new(ReqwestHttpClient::new(&config.user_agent));
        Self::with_http_client(config, http)
    }

    pub fn with_http_client(config: ClientConfig, http: Arc<dyn HttpClient>) -> Self {
        Self {
            executor: Arc::new(Executor::new(config, http)),
        }
    }

    pub fn from_env() -> Result<Self, ValidationError> {
        ClientConfig::from_env().map(Self::new)
    }

    pub fn executor(&self) -> &Arc<Executor> {
        &self.executor
    }

    pub async fn create_device(&self, device: &Device) -> Result<Envelope<Device>, ClientError> {
        let path = self.executor.path(&["devices"]);
        self.executor
            .execute(HttpMethod::Post, &path, Some(device))
            .await
    }

    pub async fn get_device(&self, key: &str) -> Result<Envelope<Device>, ClientError> {
        require_key("device key", key)?;
        let path = self.executor.path(&["devices", key]);
        self.executor
            .execute::<(), _>(HttpMethod::Get, &path, None)
            .await
    }

    pub async fn update_device(&self, device: &Device) -> Result<Envelope<Device>, ClientError> {
        require_key("device key", &device.key)?;
        let path = self.executor.path(&["devices", &device.key]);
        self.executor
            .execute(HttpMethod::Put, &path, Some(device))
            .await
    }

    /// Devices matching `selection`, as a cursor that fetches further pages
    /// on demand.
    pub async fn list_devices(
        &self,
        selection: Selection,
    ) -> Result<Envelope<Cursor<Device>>, ClientError> {
        let query = Query::find(Search::devices(selection));
        self.paged(HttpMethod::Get, self.executor.path(&["devices", "query"]), &query)
            .await
    }

    pub async fn delete_device(&self, key: &str) -> Result<Envelope<()>, ClientError> {
        require_key("device key", key)?;
        let path = self.executor.path(&["devices", key]);
        self.executor
            .execute::<(), _>(HttpMethod::Delete, &path, None)
            .await
    }

    pub async fn delete_devices(
        &self,
        selection: Selection,
    ) -> Result<Envelope<DeleteSummary>, ClientError> {
        let query = Query::delete(Search::devices(selection));
        let path = self.executor.path(&["devices"]);
        self.executor
            .execute(HttpMethod::Delete, &path, Some(&query))
            .await
    }

    pub async fn delete_all_devices(&self) -> Result<Envelope<DeleteSummary>, ClientError> {
        info!("deleting every device");
        self.delete_devices(Selection::devices(Selector::all())).await
    }

    /// Submits a batch of points. The envelope's multi-status has one entry
    /// per submitted point, in submission order.
    pub async fn write_data(
        &self,
        points: Vec<WritePoint>,
    ) -> Result<Envelope<WriteSummary>, ClientError> {
        if points.is_empty() {
            return Err(ValidationError::EmptyBatch.into());
        }

        let submitted = points.len();
        let devices: BTreeSet<&str> = points.iter().map(|point| point.device.as_str()).collect();
        let search = Search::devices(Selection::devices(Selector::or(
            devices.into_iter().map(Selector::key),
        )));
        let query = Query::write(search, points);

        debug!(submitted, "writing data points");
        let path = self.executor.path(&["write"]);
        let envelope: Envelope<()> = self
            .executor
            .execute_batch(HttpMethod::Post, &path, &query, submitted)
            .await?;

        let rejected = envelope.failures().count();
        Ok(envelope.map(|()| WriteSummary {
            submitted,
            rejected,
        }))
    }

    /// Rows between `start` and `stop`. A reversed window is rejected before
    /// anything is sent.
    pub async fn read_data(
        &self,
        selection: Selection,
        start: Timestamp,
        stop: Timestamp,
        pipeline: Option<Pipeline>,
    ) -> Result<Envelope<Cursor<Row>>, ClientError> {
        let query = Query::read(Search::devices(selection), start, stop, pipeline)?;
        self.paged(HttpMethod::Get, self.executor.path(&["read"]), &query)
            .await
    }

    pub async fn delete_data_points(
        &self,
        device: &str,
        sensor: &str,
        start: Timestamp,
        stop: Timestamp,
    ) -> Result<Envelope<DeleteSummary>, ClientError> {
        require_key("device key", device)?;
        require_key("sensor key", sensor)?;
        validate_range(start, stop)?;

        let path = self
            .executor
            .path(&["devices", device, "sensors", sensor, "datapoints"]);
        self.executor
            .execute(HttpMethod::Delete, &path, Some(&TimeWindow { start, stop }))
            .await
    }

    async fn paged<T>(
        &self,
        method: HttpMethod,
        path: String,
        query: &Query,
    ) -> Result<Envelope<Cursor<T>>, ClientError>
    where
        T: serde::de::DeserializeOwned + Send + 'static,
    {
        let first: Envelope<Segment<T>> = self.executor.execute(method, &path, Some(query)).await?;
        let pager = ExecutorPager::new(Arc::clone(&self.executor), method, path);
        Ok(first.into_cursor(Arc::new(pager)))
    }
}

fn require_key(field: &'static str, key: &str) -> Result<(), ValidationError> {
    if key.trim().is_empty() {
        return Err(ValidationError::EmptyKey { field });
    }
    Ok(())
}
