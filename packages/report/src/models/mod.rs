pub mod file;
pub mod params;
pub mod report;

pub use file::{FileSource, FileSpec, LinkedFile};
pub use params::{CallContext, CreateExtendedParams, CreateParams, WorkspaceSelector};
pub use report::{ReportBody, ReportInfo, ReportRecord, WorkspaceObjectRef};
