use tracing::{debug, instrument};

use crate::error::{ReportError, Result};
use crate::models::{FileSource, FileSpec, LinkedFile};
use crate::store::{DataStore, Packing, StoreError, StoredFile};

/// Upload or claim every file in `files` and return their links, in order.
///
/// Local paths are zipped when `package` is set or when the path is a
/// directory. The first failing entry aborts the whole list.
#[instrument(skip(store, files), fields(count = files.len()))]
pub async fn resolve_files(
    store: &dyn DataStore,
    list: &'static str,
    files: &[FileSpec],
    package: bool,
) -> Result<Vec<LinkedFile>> {
    let mut linked = Vec::with_capacity(files.len());

    for (index, spec) in files.iter().enumerate() {
        let failed = |source: StoreError| ReportError::Resolution {
            list,
            index,
            target: spec.target(),
            source,
        };

        let StoredFile { blob_id, handle } = resolve_one(store, spec, package)
            .await
            .map_err(failed)?;
        let handle = handle.ok_or_else(|| failed(StoreError::MissingHandle(blob_id)))?;

        debug!(list, index, handle = %handle.id, blob_id = %handle.blob_id, "resolved file");
        linked.push(LinkedFile::from_handle(spec, &handle));
    }

    Ok(linked)
}

async fn resolve_one(
    store: &dyn DataStore,
    spec: &FileSpec,
    package: bool,
) -> std::result::Result<StoredFile, StoreError> {
    match &spec.source {
        FileSource::Local(path) => {
            let is_dir = tokio::fs::metadata(path).await?.is_dir();
            let pack = (package || is_dir).then_some(Packing::Zip);
            store.ingest_local_path(path, true, pack).await
        }
        FileSource::Stored(blob_id) => store.claim_existing_blob(blob_id, true).await,
    }
}
