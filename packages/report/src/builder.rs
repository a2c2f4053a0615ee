use tracing::{info, instrument};
use uuid::Uuid;

use crate::error::{ReportError, Result};
use crate::files::resolve_files;
use crate::models::{
    CallContext, CreateExtendedParams, CreateParams, ReportInfo, ReportRecord, WorkspaceSelector,
};
use crate::store::{DataStore, SaveObject};

/// Type tag of persisted report objects.
pub const REPORT_TYPE: &str = "KBaseReport.Report";

/// `report_<uuid>`, or `<prefix>.report_<uuid>` when a prefix is given.
pub fn generate_report_name(prefix: Option<&str>) -> String {
    let name = format!("report_{}", Uuid::new_v4());
    match prefix {
        Some(prefix) => format!("{prefix}.{name}"),
        None => name,
    }
}

pub async fn resolve_workspace_id(
    store: &dyn DataStore,
    workspace: &WorkspaceSelector,
) -> Result<i64> {
    match workspace {
        WorkspaceSelector::Id(id) => Ok(*id),
        WorkspaceSelector::Name(name) => store
            .resolve_workspace_name(name)
            .await
            .map_err(|source| ReportError::WorkspaceLookup {
                workspace: name.clone(),
                source,
            }),
    }
}

/// Save a simple report.
#[instrument(skip_all, fields(workspace = %params.workspace))]
pub async fn create_report(
    store: &dyn DataStore,
    ctx: &CallContext,
    params: CreateParams,
) -> Result<ReportInfo> {
    let name = generate_report_name(params.prefix.as_deref());
    let workspace_id = resolve_workspace_id(store, &params.workspace).await?;
    let record = ReportRecord::from_body(params.report);

    save_report(store, ctx, workspace_id, name, &record).await
}

/// Upload the linked files, then save an extended report.
#[instrument(skip_all, fields(workspace = %params.workspace))]
pub async fn create_extended_report(
    store: &dyn DataStore,
    ctx: &CallContext,
    params: CreateExtendedParams,
) -> Result<ReportInfo> {
    let file_links = resolve_files(store, "file_links", &params.file_links, false).await?;
    let html_links = resolve_files(store, "html_links", &params.html_links, true).await?;

    let name = params
        .report_object_name
        .clone()
        .unwrap_or_else(|| generate_report_name(None));
    let workspace_id = resolve_workspace_id(store, &params.workspace).await?;
    let record = ReportRecord::extended(params, file_links, html_links);

    save_report(store, ctx, workspace_id, name, &record).await
}

async fn save_report(
    store: &dyn DataStore,
    ctx: &CallContext,
    workspace_id: i64,
    name: String,
    record: &ReportRecord,
) -> Result<ReportInfo> {
    let object = SaveObject {
        workspace_id,
        type_tag: REPORT_TYPE.to_string(),
        data: serde_json::to_value(record)?,
        name: name.clone(),
        meta: record.metadata(),
        hidden: true,
        provenance: ctx.provenance.clone(),
    };
    let saved = store
        .persist_object(object)
        .await
        .map_err(ReportError::Persistence)?;

    let reference = saved.reference();
    info!(
        workspace_id,
        reference = %reference,
        name = %name,
        file_links = record.file_links.len(),
        html_links = record.html_links.len(),
        "Report saved"
    );

    Ok(ReportInfo { reference, name })
}
