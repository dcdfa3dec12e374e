use std::path::{Path, PathBuf};

use tantivy::{Index, IndexReader, IndexWriter, ReloadPolicy, TantivyDocument};
use tempfile::TempDir;
use tracing::info;

use almoner_core::keys;
use almoner_core::schema::build_schema;
use almoner_storage::error::StorageError;
use almoner_storage::store::DocumentStore;

use crate::error::SearchError;

/// Heap budget for the single indexing thread.
const WRITER_HEAP_BYTES: usize = 50_000_000;

/// The patient index, open for reading and writing.
///
/// The index lives in a working directory on local disk. It is either the
/// [`INDEX_SUBDIR`] of a caller-chosen path or a scratch directory removed
/// on drop.
pub struct PatientIndex {
    pub(crate) index: Index,
    pub(crate) writer: IndexWriter,
    pub(crate) reader: IndexReader,
    dir: PathBuf,
    etag: Option<String>,
    _scratch: Option<TempDir>,
}

impl PatientIndex {
    /// Create an empty index. With no `dir`, a scratch directory is used.
    pub fn create_empty(dir: Option<&Path>) -> Result<Self, SearchError> {
        let (dir, scratch) = working_dir(dir)?;
        let index = Index::create_in_dir(&dir, build_schema())?;
        info!(dir = %dir.display(), "created empty patient index");
        Self::open(index, dir, scratch, None)
    }

    /// Download the persisted index and unpack it into the working directory.
    pub async fn load(store: &dyn DocumentStore, dir: Option<&Path>) -> Result<Self, SearchError> {
        let object = store.get(keys::PATIENT_INDEX).await.map_err(|e| match e {
            StorageError::NotFound { .. } => SearchError::IndexNotFound,
            other => SearchError::Storage(other),
        })?;

        let (dir, scratch) = working_dir(dir)?;
        let decoder = zstd::Decoder::new(object.body.as_slice())?;
        let mut archive = tar::Archive::new(decoder);
        archive.unpack(&dir)?;

        let index =
            Index::open_in_dir(&dir).map_err(|e| SearchError::IndexCorrupted(e.to_string()))?;
        info!(dir = %dir.display(), etag = %object.etag, "patient index loaded");
        Self::open(index, dir, scratch, Some(object.etag))
    }

    pub async fn load_or_create(
        store: &dyn DocumentStore,
        dir: Option<&Path>,
    ) -> Result<Self, SearchError> {
        match Self::load(store, dir).await {
            Err(SearchError::IndexNotFound) => {
                info!("no persisted patient index, starting empty");
                Self::create_empty(dir)
            }
            other => other,
        }
    }

    fn open(
        index: Index,
        dir: PathBuf,
        scratch: Option<TempDir>,
        etag: Option<String>,
    ) -> Result<Self, SearchError> {
        let writer = index.writer_with_num_threads::<TantivyDocument>(1, WRITER_HEAP_BYTES)?;
        let reader = index
            .reader_builder()
            .reload_policy(ReloadPolicy::Manual)
            .try_into()?;
        Ok(Self {
            index,
            writer,
            reader,
            dir,
            etag,
            _scratch: scratch,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// ETag of the persisted copy this index was loaded from or last flushed to.
    pub fn etag(&self) -> Option<&str> {
        self.etag.as_deref()
    }

    pub(crate) fn set_etag(&mut self, etag: String) {
        self.etag = Some(etag);
    }

    /// Number of committed, searchable patients.
    pub fn num_docs(&self) -> u64 {
        self.reader.searcher().num_docs()
    }
}

/// Name of the subdirectory holding the index files under a caller-chosen
/// path. Only this subdirectory is ever cleared.
pub const INDEX_SUBDIR: &str = "patients-index";

/// Resolve the working directory. Under a caller-chosen path the index gets
/// its own subdirectory, emptied so stale segments never mix with a fresh
/// index; anything else under that path is left alone.
fn working_dir(dir: Option<&Path>) -> Result<(PathBuf, Option<TempDir>), SearchError> {
    match dir {
        Some(root) => {
            let dir = root.join(INDEX_SUBDIR);
            if dir.exists() {
                std::fs::remove_dir_all(&dir)?;
            }
            std::fs::create_dir_all(&dir)?;
            Ok((dir, None))
        }
        None => {
            let scratch = tempfile::Builder::new().prefix("almoner-index").tempdir()?;
            Ok((scratch.path().to_path_buf(), Some(scratch)))
        }
    }
}
