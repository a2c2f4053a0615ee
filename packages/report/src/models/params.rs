use std::fmt;

use serde_json::Value;

use super::file::FileSpec;
use super::report::{ReportBody, WorkspaceObjectRef};

/// The workspace a report is saved into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkspaceSelector {
    Name(String),
    Id(i64),
}

impl fmt::Display for WorkspaceSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name(name) => f.write_str(name),
            Self::Id(id) => write!(f, "{id}"),
        }
    }
}

/// Validated parameters for `create`.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateParams {
    pub workspace: WorkspaceSelector,
    pub report: ReportBody,
    /// Prepended to the generated report name as `<prefix>.report_<uuid>`.
    pub prefix: Option<String>,
}

/// Validated parameters for `create_extended`.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateExtendedParams {
    pub workspace: WorkspaceSelector,
    pub message: Option<String>,
    pub objects_created: Vec<WorkspaceObjectRef>,
    pub warnings: Vec<String>,
    pub html_links: Vec<FileSpec>,
    pub direct_html: Option<String>,
    pub direct_html_link_index: Option<i64>,
    pub file_links: Vec<FileSpec>,
    pub report_object_name: Option<String>,
    pub html_window_height: Option<f64>,
    pub summary_window_height: Option<f64>,
}

impl CreateExtendedParams {
    pub fn new(workspace: WorkspaceSelector) -> Self {
        Self {
            workspace,
            message: None,
            objects_created: Vec::new(),
            warnings: Vec::new(),
            html_links: Vec::new(),
            direct_html: None,
            direct_html_link_index: None,
            file_links: Vec::new(),
            report_object_name: None,
            html_window_height: None,
            summary_window_height: None,
        }
    }

}

/// Per-call context supplied by the hosting service.
#[derive(Debug, Clone, Default)]
pub struct CallContext {
    /// Provenance actions, stored with the report object unchanged.
    pub provenance: Vec<Value>,
}
