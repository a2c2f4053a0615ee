//! Request validation for `create` and `create_extended`.
//!
//! Each validator takes the raw JSON params and either returns the typed
//! params or the first violation found. Field names in errors are full
//! paths into the request, e.g. `report.objects_created[2].ref`.

use std::path::Path;

use serde_json::{Map, Value};
use thiserror::Error;
use url::Url;

use crate::models::{
    CreateExtendedParams, CreateParams, FileSource, FileSpec, LinkedFile, ReportBody,
    WorkspaceObjectRef, WorkspaceSelector,
};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("either `workspace_name` or `workspace_id` is required")]
    MissingWorkspace,

    #[error("only one of `workspace_name` ({name:?}) or `workspace_id` ({id}) may be given")]
    AmbiguousWorkspace { name: String, id: i64 },

    #[error("required key not provided: `{0}`")]
    MissingField(String),

    #[error("extra key not allowed: `{0}`")]
    UnknownField(String),

    #[error("`{field}` must be {expected}, got {value}")]
    WrongType {
        field: String,
        expected: &'static str,
        value: String,
    },

    #[error("`{0}` must not be empty")]
    EmptyString(String),

    #[error("`{field}` is not a valid URL ({value:?}): {reason}")]
    InvalidUrl {
        field: String,
        value: String,
        reason: String,
    },

    #[error("invalid file object `{field}`: either `path` or `blob_id` is required, got {value}")]
    MissingFileSource { field: String, value: String },

    #[error("invalid file object `{field}`: `path` and `blob_id` are mutually exclusive")]
    ConflictingFileSource { field: String },

    #[error("`{field}` does not exist: {path}")]
    PathNotFound { field: String, path: String },
}

type Result<T> = std::result::Result<T, ValidationError>;

const CREATE_KEYS: &[&str] = &["workspace_name", "workspace_id", "report", "prefix"];

const REPORT_KEYS: &[&str] = &[
    "text_message",
    "warnings",
    "objects_created",
    "direct_html",
    "direct_html_link_index",
    "file_links",
    "html_links",
];

const EXTENDED_KEYS: &[&str] = &[
    "workspace_name",
    "workspace_id",
    "message",
    "objects_created",
    "warnings",
    "html_links",
    "direct_html",
    "direct_html_link_index",
    "file_links",
    "report_object_name",
    "html_window_height",
    "summary_window_height",
];

// `shock_id` is the historical name of `blob_id`.
const FILE_KEYS: &[&str] = &["path", "blob_id", "shock_id", "name", "description", "label"];

const LINKED_FILE_KEYS: &[&str] = &["handle", "name", "description", "label", "URL", "url"];

const OBJECT_REF_KEYS: &[&str] = &["ref", "description"];

/// Validate the params of `create`.
pub fn validate_create_params(raw: &Value) -> Result<CreateParams> {
    let params = Fields::new(raw, "")?;
    let workspace = workspace_selector(&params)?;
    params.deny_unknown(CREATE_KEYS)?;

    let report = params.required("report", params.get("report"))?;
    let report = report_body(&Fields::new(report, "report")?)?;

    Ok(CreateParams {
        workspace,
        report,
        prefix: params.non_empty_string("prefix")?,
    })
}

/// Validate the params of `create_extended`.
///
/// File arrays are checked first, including that every local `path`
/// exists; relative paths are taken relative to `scratch`.
pub fn validate_extended_params(raw: &Value, scratch: &Path) -> Result<CreateExtendedParams> {
    let params = Fields::new(raw, "")?;
    let file_links = validate_file_array("file_links", params.get("file_links"), scratch)?;
    let html_links = validate_file_array("html_links", params.get("html_links"), scratch)?;
    let workspace = workspace_selector(&params)?;
    params.deny_unknown(EXTENDED_KEYS)?;

    Ok(CreateExtendedParams {
        workspace,
        message: params.string("message")?,
        objects_created: params
            .list("objects_created", object_ref)?
            .unwrap_or_default(),
        warnings: params.list("warnings", expect_string)?.unwrap_or_default(),
        html_links,
        direct_html: params.string("direct_html")?,
        direct_html_link_index: params.integer("direct_html_link_index")?,
        file_links,
        report_object_name: params.non_empty_string("report_object_name")?,
        html_window_height: params.number("html_window_height")?,
        summary_window_height: params.number("summary_window_height")?,
    })
}

/// Validate a list of file specs named `field`. A missing list is empty.
pub fn validate_file_array(
    field: &str,
    value: Option<&Value>,
    scratch: &Path,
) -> Result<Vec<FileSpec>> {
    let Some(value) = value.filter(|v| !v.is_null()) else {
        return Ok(Vec::new());
    };
    let items = value
        .as_array()
        .ok_or_else(|| wrong_type(field.to_string(), "a list", value))?;
    items
        .iter()
        .enumerate()
        .map(|(i, item)| file_spec(item, format!("{field}[{i}]"), scratch))
        .collect()
}

fn workspace_selector(params: &Fields<'_>) -> Result<WorkspaceSelector> {
    let name = params.non_empty_string("workspace_name")?;
    let id = params.integer("workspace_id")?;
    if let Some(id) = id.filter(|id| *id <= 0) {
        return Err(ValidationError::WrongType {
            field: "workspace_id".into(),
            expected: "a positive integer",
            value: id.to_string(),
        });
    }

    match (name, id) {
        (Some(name), None) => Ok(WorkspaceSelector::Name(name)),
        (None, Some(id)) => Ok(WorkspaceSelector::Id(id)),
        (None, None) => Err(ValidationError::MissingWorkspace),
        (Some(name), Some(id)) => Err(ValidationError::AmbiguousWorkspace { name, id }),
    }
}

fn report_body(report: &Fields<'_>) -> Result<ReportBody> {
    report.deny_unknown(REPORT_KEYS)?;
    Ok(ReportBody {
        text_message: report.string("text_message")?,
        warnings: report.list("warnings", expect_string)?,
        objects_created: report.list("objects_created", object_ref)?,
        direct_html: report.string("direct_html")?,
        direct_html_link_index: report.integer("direct_html_link_index")?,
        file_links: report.list("file_links", linked_file)?,
        html_links: report.list("html_links", linked_file)?,
    })
}

fn file_spec(value: &Value, field: String, scratch: &Path) -> Result<FileSpec> {
    let entry = Fields::new(value, field)?;
    entry.deny_unknown(FILE_KEYS)?;

    let path = entry.non_empty_string("path")?;
    let blob_id = match entry.non_empty_string("blob_id")? {
        Some(id) => Some(id),
        None => entry.non_empty_string("shock_id")?,
    };

    let source = match (path, blob_id) {
        (Some(path), None) => {
            let resolved = scratch.join(&path);
            if !(resolved.is_file() || resolved.is_dir()) {
                return Err(ValidationError::PathNotFound {
                    field: entry.field("path"),
                    path,
                });
            }
            FileSource::Local(resolved)
        }
        (None, Some(blob_id)) => FileSource::Stored(blob_id),
        (None, None) => {
            return Err(ValidationError::MissingFileSource {
                field: entry.path.clone(),
                value: value.to_string(),
            });
        }
        (Some(_), Some(_)) => {
            return Err(ValidationError::ConflictingFileSource {
                field: entry.path.clone(),
            });
        }
    };

    Ok(FileSpec {
        source,
        name: entry.non_empty_string("name")?,
        description: entry.string("description")?,
        label: entry.string("label")?,
    })
}

fn linked_file(value: &Value, field: String) -> Result<LinkedFile> {
    let entry = Fields::new(value, field)?;
    entry.deny_unknown(LINKED_FILE_KEYS)?;

    let handle = entry.required("handle", entry.non_empty_string("handle")?)?;
    let url = match entry.string("URL")? {
        Some(url) => Some(url),
        None => entry.string("url")?,
    };
    let url = entry.required("URL", url)?;
    if let Err(e) = Url::parse(&url) {
        return Err(ValidationError::InvalidUrl {
            field: entry.field("URL"),
            value: url,
            reason: e.to_string(),
        });
    }

    Ok(LinkedFile {
        handle,
        name: entry.string("name")?.unwrap_or_default(),
        description: entry.string("description")?.unwrap_or_default(),
        label: entry.string("label")?.unwrap_or_default(),
        url,
    })
}

fn object_ref(value: &Value, field: String) -> Result<WorkspaceObjectRef> {
    let entry = Fields::new(value, field)?;
    entry.deny_unknown(OBJECT_REF_KEYS)?;
    Ok(WorkspaceObjectRef {
        reference: entry.required("ref", entry.non_empty_string("ref")?)?,
        description: entry.string("description")?,
    })
}

fn expect_string(value: &Value, field: String) -> Result<String> {
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| wrong_type(field, "a string", value))
}

fn wrong_type(field: String, expected: &'static str, value: &Value) -> ValidationError {
    ValidationError::WrongType {
        field,
        expected,
        value: value.to_string(),
    }
}

/// A JSON object being validated, with its path inside the request.
///
/// `null` members are treated as absent.
struct Fields<'a> {
    map: &'a Map<String, Value>,
    path: String,
}

impl<'a> Fields<'a> {
    fn new(value: &'a Value, path: impl Into<String>) -> Result<Self> {
        let path = path.into();
        match value {
            Value::Object(map) => Ok(Self { map, path }),
            other => {
                let field = if path.is_empty() {
                    "params".to_string()
                } else {
                    path
                };
                Err(wrong_type(field, "an object", other))
            }
        }
    }

    fn field(&self, key: &str) -> String {
        if self.path.is_empty() {
            key.to_string()
        } else {
            format!("{}.{key}", self.path)
        }
    }

    fn get(&self, key: &str) -> Option<&'a Value> {
        self.map.get(key).filter(|v| !v.is_null())
    }

    fn required<T>(&self, key: &str, value: Option<T>) -> Result<T> {
        value.ok_or_else(|| ValidationError::MissingField(self.field(key)))
    }

    fn deny_unknown(&self, allowed: &[&str]) -> Result<()> {
        match self.map.keys().find(|k| !allowed.contains(&k.as_str())) {
            Some(key) => Err(ValidationError::UnknownField(self.field(key))),
            None => Ok(()),
        }
    }

    fn string(&self, key: &str) -> Result<Option<String>> {
        self.get(key)
            .map(|v| expect_string(v, self.field(key)))
            .transpose()
    }

    fn non_empty_string(&self, key: &str) -> Result<Option<String>> {
        match self.string(key)? {
            Some(s) if s.is_empty() => Err(ValidationError::EmptyString(self.field(key))),
            other => Ok(other),
        }
    }

    fn integer(&self, key: &str) -> Result<Option<i64>> {
        self.get(key)
            .map(|v| {
                v.as_i64()
                    .ok_or_else(|| wrong_type(self.field(key), "an integer", v))
            })
            .transpose()
    }

    fn number(&self, key: &str) -> Result<Option<f64>> {
        self.get(key)
            .map(|v| v.as_f64().ok_or_else(|| wrong_type(self.field(key), "a number", v)))
            .transpose()
    }

    fn list<T>(
        &self,
        key: &str,
        mut parse: impl FnMut(&'a Value, String) -> Result<T>,
    ) -> Result<Option<Vec<T>>> {
        let Some(value) = self.get(key) else {
            return Ok(None);
        };
        let field = self.field(key);
        let items = value
            .as_array()
            .ok_or_else(|| wrong_type(field.clone(), "a list", value))?;
        items
            .iter()
            .enumerate()
            .map(|(i, item)| parse(item, format!("{field}[{i}]")))
            .collect::<Result<Vec<_>>>()
            .map(Some)
    }
}
