//! NetworkSink - HTTP JSON upload of collected batches
//!
//! Each batch is posted once per configured sensor family, as a JSON array
//! of per-sample readings, to `<url><path>` (`/api/accelerometer`,
//! `/api/magnetometer`, optionally a gyroscope path). Any transport error or
//! non-2xx status fails the write so the sink handle counts it; nothing is
//! retried.

use std::collections::HashMap;
use std::time::Duration;

use contracts::{BatchSink, ContractError, ReadingBatch, Sample, SensorFamily};
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

pub const ACCELEROMETER_PATH: &str = "/api/accelerometer";
pub const MAGNETOMETER_PATH: &str = "/api/magnetometer";

const DEFAULT_TIMEOUT_MS: u64 = 5000;
const DEFAULT_TYPE_SENSOR: &str = "chair";
const DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";

/// Configuration for NetworkSink
#[derive(Debug, Clone, PartialEq)]
pub struct NetworkSinkConfig {
    /// Server base URL, e.g. `http://localhost:8080`
    pub url: Url,
    /// Family → absolute request path, posted in this order
    pub endpoints: Vec<(SensorFamily, String)>,
    /// `typeSensor` field of every reading
    pub type_sensor: String,
    pub timeout: Duration,
}

impl NetworkSinkConfig {
    /// Create config from params map.
    ///
    /// `url` is required; `accelerometer_path`, `magnetometer_path`,
    /// `gyroscope_path` (no default, gyro is not posted without it),
    /// `type_sensor` and `timeout_ms` are optional.
    pub fn from_params(params: &HashMap<String, String>) -> Result<Self, String> {
        let raw = params
            .get("url")
            .ok_or_else(|| "missing 'url' parameter".to_string())?;
        let url = Url::parse(raw).map_err(|e| format!("invalid url '{raw}': {e}"))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(format!("url '{raw}' must be http or https"));
        }

        let path = |key: &str, default: &str| {
            params
                .get(key)
                .cloned()
                .unwrap_or_else(|| default.to_string())
        };
        let mut endpoints = vec![
            (SensorFamily::Acc, path("accelerometer_path", ACCELEROMETER_PATH)),
            (SensorFamily::Mag, path("magnetometer_path", MAGNETOMETER_PATH)),
        ];
        if let Some(gyro) = params.get("gyroscope_path") {
            endpoints.push((SensorFamily::Gyro, gyro.clone()));
        }

        let timeout_ms = match params.get("timeout_ms") {
            Some(s) => s
                .parse()
                .map_err(|e| format!("invalid timeout_ms '{s}': {e}"))?,
            None => DEFAULT_TIMEOUT_MS,
        };

        Ok(Self {
            url,
            endpoints,
            type_sensor: params
                .get("type_sensor")
                .cloned()
                .unwrap_or_else(|| DEFAULT_TYPE_SENSOR.to_string()),
            timeout: Duration::from_millis(timeout_ms),
        })
    }
}

/// One sample of one sensor family as the server receives it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadingRecord {
    pub date_created: String,
    pub label: String,
    pub meta_info: String,
    pub people_id: String,
    pub type_sensor: String,
    pub ax: f64,
    pub ay: f64,
    pub az: f64,
    /// Magnetometer readings carry a zero linear part
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub lin_x: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub lin_y: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub lin_z: Option<f64>,
}

/// Sink that posts batches to an HTTP server
pub struct NetworkSink {
    name: String,
    config: NetworkSinkConfig,
    client: Option<Client>,
}

impl NetworkSink {
    /// # Errors
    /// `SinkConnection` if the HTTP client cannot be built.
    pub fn new(name: impl Into<String>, config: NetworkSinkConfig) -> Result<Self, ContractError> {
        let name = name.into();
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ContractError::SinkConnection {
                sink_name: name.clone(),
                message: e.to_string(),
            })?;

        debug!(sink = %name, url = %config.url, "NetworkSink ready");
        Ok(Self {
            name,
            config,
            client: Some(client),
        })
    }

    #[instrument(name = "network_sink_from_params", skip(name, params))]
    pub fn from_params(
        name: impl Into<String>,
        params: &HashMap<String, String>,
    ) -> Result<Self, ContractError> {
        let name = name.into();
        let config = NetworkSinkConfig::from_params(params)
            .map_err(|e| ContractError::sink_write(&name, e))?;
        Self::new(name, config)
    }

    pub fn config(&self) -> &NetworkSinkConfig {
        &self.config
    }

    /// Readings of `family`; samples missing one of its axes are left out.
    pub fn records(&self, batch: &ReadingBatch, family: SensorFamily) -> Vec<ReadingRecord> {
        let lin = (family == SensorFamily::Mag).then_some(0.0);
        batch
            .samples
            .iter()
            .filter_map(|sample| {
                let [ax, ay, az] = axes(sample, family)?;
                Some(ReadingRecord {
                    date_created: sample.timestamp.format(DATE_FORMAT).to_string(),
                    label: batch.label.clone(),
                    meta_info: batch.meta.clone(),
                    people_id: batch.person_id.clone(),
                    type_sensor: self.config.type_sensor.clone(),
                    ax,
                    ay,
                    az,
                    lin_x: lin,
                    lin_y: lin,
                    lin_z: lin,
                })
            })
            .collect()
    }

    async fn post(
        &self,
        client: &Client,
        path: &str,
        records: &[ReadingRecord],
    ) -> Result<(), String> {
        let url = self
            .config
            .url
            .join(path)
            .map_err(|e| format!("{path}: {e}"))?;
        let response = client
            .post(url.clone())
            .json(records)
            .send()
            .await
            .map_err(|e| format!("{url}: {e}"))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(format!("{url}: HTTP {status} {}", body.trim()));
        }
        debug!(sink = %self.name, %url, readings = records.len(), "Posted");
        Ok(())
    }
}

fn axes(sample: &Sample, family: SensorFamily) -> Option<[f64; 3]> {
    let [x, y, z] = family.channels();
    Some([
        *sample.values.get(&x)?,
        *sample.values.get(&y)?,
        *sample.values.get(&z)?,
    ])
}

impl BatchSink for NetworkSink {
    fn name(&self) -> &str {
        &self.name
    }

    /// Posts every family even if an earlier one failed; fails if any did.
    #[instrument(
        name = "network_sink_write",
        skip(self, batch),
        fields(sink = %self.name, batch_id = batch.batch_id)
    )]
    async fn write(&mut self, batch: &ReadingBatch) -> Result<(), ContractError> {
        let client = self
            .client
            .as_ref()
            .ok_or_else(|| ContractError::sink_write(&self.name, "sink closed"))?;

        let mut failures = Vec::new();
        for (family, path) in &self.config.endpoints {
            let records = self.records(batch, *family);
            if records.is_empty() {
                debug!(sink = %self.name, ?family, "No readings for family");
                continue;
            }
            if let Err(e) = self.post(client, path, &records).await {
                warn!(sink = %self.name, ?family, error = %e, "Upload failed");
                failures.push(e);
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(ContractError::sink_write(&self.name, failures.join("; ")))
        }
    }

    async fn flush(&mut self) -> Result<(), ContractError> {
        Ok(())
    }

    #[instrument(name = "network_sink_close", skip(self))]
    async fn close(&mut self) -> Result<(), ContractError> {
        self.client = None;
        debug!(sink = %self.name, "NetworkSink closed");
        Ok(())
    }
}
