//! Service health reporting.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Overall health of the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    /// Every dependency is healthy
    Healthy,

    /// Serving, but at least one dependency is unhealthy
    Degraded,

    /// The vector store cannot be queried
    Unhealthy,
}

/// Health of one dependency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceStatus {
    Healthy,
    Unhealthy,
    Error(String),
}

impl ServiceStatus {
    pub fn from_check(ok: bool) -> Self {
        if ok {
            ServiceStatus::Healthy
        } else {
            ServiceStatus::Unhealthy
        }
    }

    pub fn is_healthy(&self) -> bool {
        matches!(self, ServiceStatus::Healthy)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthReport {
    pub status: HealthStatus,
    pub checked_at: DateTime<Utc>,
    pub version: String,
    pub services: BTreeMap<String, ServiceStatus>,
}

impl HealthReport {
    /// Derive the overall status from per-service results.
    pub fn new(
        vector_store: ServiceStatus,
        generation: ServiceStatus,
        embedding: ServiceStatus,
    ) -> Self {
        let status = if matches!(vector_store, ServiceStatus::Error(_)) {
            HealthStatus::Unhealthy
        } else if vector_store.is_healthy() && generation.is_healthy() && embedding.is_healthy() {
            HealthStatus::Healthy
        } else {
            HealthStatus::Degraded
        };

        let services = BTreeMap::from([
            ("vector_store".to_string(), vector_store),
            ("generation".to_string(), generation),
            ("embedding".to_string(), embedding),
        ]);

        Self {
            status,
            checked_at: Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            services,
        }
    }
}
