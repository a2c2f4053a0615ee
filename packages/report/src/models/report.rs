use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::file::LinkedFile;
use super::params::CreateExtendedParams;

/// A workspace object the reported app run created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkspaceObjectRef {
    /// `workspace/object/version` reference.
    #[serde(rename = "ref")]
    pub reference: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Report fields as supplied to `create`; anything left out takes the
/// [`ReportRecord`] default.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReportBody {
    pub text_message: Option<String>,
    pub warnings: Option<Vec<String>>,
    pub objects_created: Option<Vec<WorkspaceObjectRef>>,
    pub direct_html: Option<String>,
    pub direct_html_link_index: Option<i64>,
    pub file_links: Option<Vec<LinkedFile>>,
    pub html_links: Option<Vec<LinkedFile>>,
}

/// The payload persisted as the report object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportRecord {
    pub text_message: String,
    pub warnings: Vec<String>,
    pub objects_created: Vec<WorkspaceObjectRef>,
    pub file_links: Vec<LinkedFile>,
    pub html_links: Vec<LinkedFile>,
    pub direct_html: String,
    pub direct_html_link_index: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html_window_height: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary_window_height: Option<f64>,
}

impl ReportRecord {
    /// Overlay a simple report body on the defaults.
    pub fn from_body(body: ReportBody) -> Self {
        let defaults = Self::default();
        Self {
            text_message: body.text_message.unwrap_or(defaults.text_message),
            warnings: body.warnings.unwrap_or(defaults.warnings),
            objects_created: body.objects_created.unwrap_or(defaults.objects_created),
            file_links: body.file_links.unwrap_or(defaults.file_links),
            html_links: body.html_links.unwrap_or(defaults.html_links),
            direct_html: body.direct_html.unwrap_or(defaults.direct_html),
            direct_html_link_index: body
                .direct_html_link_index
                .unwrap_or(defaults.direct_html_link_index),
            html_window_height: None,
            summary_window_height: None,
        }
    }

    /// Build the record for an extended report from already-resolved links.
    pub fn extended(
        params: CreateExtendedParams,
        file_links: Vec<LinkedFile>,
        html_links: Vec<LinkedFile>,
    ) -> Self {
        Self {
            text_message: params.message.unwrap_or_default(),
            warnings: params.warnings,
            objects_created: params.objects_created,
            file_links,
            html_links,
            direct_html: params.direct_html.unwrap_or_default(),
            direct_html_link_index: params.direct_html_link_index.unwrap_or_default(),
            html_window_height: params.html_window_height,
            summary_window_height: params.summary_window_height,
        }
    }

    /// Searchable object metadata derived from the record.
    pub fn metadata(&self) -> BTreeMap<String, String> {
        BTreeMap::from([
            ("Warnings".to_string(), self.warnings.len().to_string()),
            (
                "Message Length".to_string(),
                self.text_message.chars().count().to_string(),
            ),
            (
                "Objects Created".to_string(),
                self.objects_created.len().to_string(),
            ),
            ("HTML Links".to_string(), self.html_links.len().to_string()),
            ("File Links".to_string(), self.file_links.len().to_string()),
        ])
    }
}

/// Reference to a saved report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportInfo {
    #[serde(rename = "ref")]
    pub reference: String,
    pub name: String,
}
