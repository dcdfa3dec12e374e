use std::path::Path;

use tracing::info;

use almoner_core::keys;
use almoner_storage::error::StorageError;
use almoner_storage::store::{DocumentStore, Precondition};

use crate::error::SearchError;
use crate::index::PatientIndex;

const INDEX_CONTENT_TYPE: &str = "application/zstd";

/// Compress the committed index and upload it to the document store.
///
/// An index that was loaded or flushed before is written with `If-Match`
/// on its ETag; a brand-new one only if nothing is stored yet. Returns the
/// new ETag, which the index remembers for the next flush.
pub async fn flush(store: &dyn DocumentStore, index: &mut PatientIndex) -> Result<String, SearchError> {
    info!(key = keys::PATIENT_INDEX, "flushing patient index");

    let blob = compress_index_dir(index.dir())?;
    let precondition = match index.etag() {
        Some(etag) => Precondition::IfMatch(etag.to_string()),
        None => Precondition::IfAbsent,
    };

    let etag = store
        .put(keys::PATIENT_INDEX, blob, Some(INDEX_CONTENT_TYPE), precondition)
        .await
        .map_err(|e| match e {
            StorageError::PreconditionFailed { .. } => SearchError::ETagMismatch,
            other => SearchError::Storage(other),
        })?;

    info!(etag = %etag, "patient index flushed");
    index.set_etag(etag.clone());
    Ok(etag)
}

/// Compress an index directory into a tar.zst byte vector.
fn compress_index_dir(index_dir: &Path) -> Result<Vec<u8>, SearchError> {
    let mut buf = Vec::new();
    {
        let encoder = zstd::Encoder::new(&mut buf, 3)?;
        let mut tar_builder = tar::Builder::new(encoder);
        tar_builder.append_dir_all(".", index_dir)?;
        let encoder = tar_builder.into_inner()?;
        encoder.finish()?;
    }
    Ok(buf)
}
