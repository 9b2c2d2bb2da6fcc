//! The cached, file-backed document store.
//!
//! Reads share a whole-workbook snapshot that lives for at most `ttl`.
//! Writes never touch that snapshot: they reload from disk, mutate, save
//! and then drop the snapshot so the next read sees the new file.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use gridtalk_engine::{
    AddedRow, CellResult, DeletedRow, FormulaResult, InputValue, RangeResult, SheetInfo, Workbook,
    WriteLimits,
};
use parking_lot::{Mutex, RwLock};
use tracing::{debug, info};

use crate::error::StoreError;
use crate::xlsx;

pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(5);

struct Snapshot {
    workbook: Arc<Workbook>,
    loaded_at: Instant,
}

pub struct DocumentStore {
    path: PathBuf,
    ttl: Duration,
    limits: WriteLimits,
    cache: RwLock<Option<Snapshot>>,
    /// Bumped by every invalidation. A load only installs its snapshot if
    /// no invalidation happened while it was reading the file.
    generation: AtomicU64,
    /// Serializes read-modify-write cycles within this process.
    writer: Mutex<()>,
}

impl DocumentStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ttl: DEFAULT_CACHE_TTL,
            limits: WriteLimits::default(),
            cache: RwLock::new(None),
            generation: AtomicU64::new(0),
            writer: Mutex::new(()),
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_limits(mut self, limits: WriteLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn limits(&self) -> &WriteLimits {
        &self.limits
    }

    /// Current snapshot, reloading when absent or older than the TTL.
    pub fn workbook(&self) -> Result<Arc<Workbook>, StoreError> {
        if let Some(snapshot) = self.cache.read().as_ref() {
            if snapshot.loaded_at.elapsed() < self.ttl {
                debug!("workbook cache hit");
                return Ok(Arc::clone(&snapshot.workbook));
            }
        }

        debug!(path = %self.path.display(), "workbook cache miss, loading");
        let generation = self.generation.load(Ordering::Acquire);
        let workbook = Arc::new(xlsx::load(&self.path)?);
        self.install(generation, Arc::clone(&workbook));
        Ok(workbook)
    }

    /// Cache `workbook`, loaded when the store was at `generation`. Returns
    /// false and leaves the cache empty if a write invalidated it since.
    fn install(&self, generation: u64, workbook: Arc<Workbook>) -> bool {
        let mut cache = self.cache.write();
        if self.generation.load(Ordering::Acquire) != generation {
            debug!("workbook changed during load, snapshot not cached");
            return false;
        }
        *cache = Some(Snapshot {
            workbook,
            loaded_at: Instant::now(),
        });
        true
    }

    pub fn invalidate(&self) {
        let mut cache = self.cache.write();
        self.generation.fetch_add(1, Ordering::AcqRel);
        *cache = None;
    }

    pub fn is_cached(&self) -> bool {
        self.cache
            .read()
            .as_ref()
            .is_some_and(|s| s.loaded_at.elapsed() < self.ttl)
    }

    pub fn list_sheets(&self) -> Result<Vec<SheetInfo>, StoreError> {
        Ok(self.workbook()?.list_sheets())
    }

    pub fn read_cell(&self, sheet: &str, reference: &str) -> Result<CellResult, StoreError> {
        Ok(self.workbook()?.read_cell(sheet, reference)?)
    }

    pub fn read_formula(&self, sheet: &str, reference: &str) -> Result<FormulaResult, StoreError> {
        Ok(self.workbook()?.read_formula(sheet, reference)?)
    }

    pub fn read_range(&self, sheet: &str, from: &str, to: &str) -> Result<RangeResult, StoreError> {
        Ok(self.workbook()?.read_range(sheet, from, to)?)
    }

    pub fn read_sheet(&self, sheet: &str) -> Result<RangeResult, StoreError> {
        Ok(self.workbook()?.read_sheet(sheet)?)
    }

    pub fn write_cell(
        &self,
        sheet: &str,
        reference: &str,
        value: InputValue,
    ) -> Result<CellResult, StoreError> {
        let limits = self.limits;
        let result = self.modify(|wb| wb.write_cell(sheet, reference, value, &limits))?;
        info!(sheet, cell = %result.cell, "cell updated");
        Ok(result)
    }

    pub fn delete_row(&self, sheet: &str, row: usize) -> Result<DeletedRow, StoreError> {
        let result = self.modify(|wb| wb.delete_row(sheet, row))?;
        info!(sheet, row, "row deleted");
        Ok(result)
    }

    pub fn add_row(
        &self,
        sheet: &str,
        row_index: usize,
        values: Vec<InputValue>,
    ) -> Result<AddedRow, StoreError> {
        let limits = self.limits;
        let result = self.modify(|wb| wb.add_row(sheet, row_index, values, &limits))?;
        info!(sheet, row = result.row_index, "row added");
        Ok(result)
    }

    /// Replace the file with `workbook` wholesale.
    pub fn replace(&self, workbook: &Workbook) -> Result<(), StoreError> {
        let _guard = self.writer.lock();
        xlsx::save(workbook, &self.path)?;
        self.invalidate();
        Ok(())
    }

    /// Fresh load, in-memory mutation, whole-file save. Nothing is written
    /// unless the mutation succeeds.
    fn modify<T, E>(&self, mutate: impl FnOnce(&mut Workbook) -> Result<T, E>) -> Result<T, StoreError>
    where
        StoreError: From<E>,
    {
        let _guard = self.writer.lock();
        let mut workbook = xlsx::load(&self.path)?;
        let out = mutate(&mut workbook)?;
        xlsx::save(&workbook, &self.path)?;
        self.invalidate();
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demo::demo_workbook;
    use gridtalk_engine::CellValue;

    #[test]
    fn test_load_overtaken_by_write_is_not_cached() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("example.xlsx");
        xlsx::save(&demo_workbook().unwrap(), &path).unwrap();
        let store = DocumentStore::new(&path);

        // A reader starts loading the old file...
        let generation = store.generation.load(Ordering::Acquire);
        let stale = Arc::new(xlsx::load(&path).unwrap());

        // ...a write lands before it finishes...
        store.write_cell("Users", "B2", InputValue::from("Farrukh")).unwrap();

        // ...and the late snapshot must not shadow the write.
        assert!(!store.install(generation, stale));
        assert!(!store.is_cached());
        assert_eq!(
            store.read_cell("Users", "B2").unwrap().value,
            CellValue::String("Farrukh".into())
        );
    }

    #[test]
    fn test_install_without_intervening_write() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("example.xlsx");
        xlsx::save(&demo_workbook().unwrap(), &path).unwrap();
        let store = DocumentStore::new(&path);

        let generation = store.generation.load(Ordering::Acquire);
        assert!(store.install(generation, Arc::new(xlsx::load(&path).unwrap())));
        assert!(store.is_cached());
    }
}
