use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tracing::{error, instrument, warn};

use crate::builder;
use crate::config::ReportAppConfig;
use crate::error::{ReportError, Result};
use crate::models::{CallContext, ReportInfo};
use crate::store::{DataStore, LocalDataStore};
use crate::validation::{validate_create_params, validate_extended_params};

/// Health report returned by [`ReportService::status`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceStatus {
    pub state: &'static str,
    pub message: String,
    pub version: &'static str,
}

/// Entry points for creating reports.
///
/// Holds no per-call state: the store is handed to the builder on every
/// call and all request data lives on the stack of that call.
#[derive(Clone)]
pub struct ReportService {
    store: Arc<dyn DataStore>,
    scratch: PathBuf,
}

impl ReportService {
    pub fn new(store: Arc<dyn DataStore>, scratch: impl Into<PathBuf>) -> Self {
        Self {
            store,
            scratch: scratch.into(),
        }
    }

    /// Build a service backed by a [`LocalDataStore`].
    pub async fn local(config: &ReportAppConfig) -> Result<(Self, Arc<LocalDataStore>)> {
        let store = Arc::new(LocalDataStore::new(&config.store).await?);
        let service = Self::new(store.clone(), config.scratch.dir.clone());
        Ok((service, store))
    }

    pub fn scratch(&self) -> &Path {
        &self.scratch
    }

    /// Save a simple report; links in the body must already be resolved.
    #[instrument(skip_all)]
    pub async fn create(&self, ctx: &CallContext, params: &Value) -> Result<Vec<ReportInfo>> {
        let params = validate_create_params(params).inspect_err(|e| {
            warn!(error = %e, "Rejected create params");
        })?;
        let info = builder::create_report(self.store.as_ref(), ctx, params).await?;
        Ok(vec![check_report_info("create", info)?])
    }

    /// Upload linked files and HTML, then save the report.
    #[instrument(skip_all)]
    pub async fn create_extended(
        &self,
        ctx: &CallContext,
        params: &Value,
    ) -> Result<Vec<ReportInfo>> {
        let params = validate_extended_params(params, &self.scratch).inspect_err(|e| {
            warn!(error = %e, "Rejected create_extended params");
        })?;
        let info = builder::create_extended_report(self.store.as_ref(), ctx, params).await?;
        Ok(vec![check_report_info("create_extended", info)?])
    }

    pub fn status(&self) -> ServiceStatus {
        ServiceStatus {
            state: "OK",
            message: String::new(),
            version: env!("CARGO_PKG_VERSION"),
        }
    }
}

fn check_report_info(method: &str, info: ReportInfo) -> Result<ReportInfo> {
    if info.reference.is_empty() || info.name.is_empty() {
        error!(method, ?info, "Report builder returned an incomplete ReportInfo");
        return Err(ReportError::Contract(format!(
            "method {method} returned a report without ref or name: {info:?}"
        )));
    }
    Ok(info)
}
