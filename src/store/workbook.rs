//! Zip-of-CSV workbook: one `<sheet>.csv` archive entry per sheet, swapped
//! in atomically via a sibling temp file.

use super::{Sheet, TabularStore};
use crate::error::StoreError;
use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::{Path, PathBuf};
use tracing::debug;
use zip::write::{FileOptions, ZipWriter};
use zip::ZipArchive;

/// On-disk workbook, fully loaded at open.
pub struct CsvWorkbook {
    path: PathBuf,
    sheets: Vec<Sheet>,
    staged: Vec<Sheet>,
}

impl CsvWorkbook {
    /// Opens an existing workbook; [`StoreError::Missing`] when there is
    /// none.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        if !path.exists() {
            return Err(StoreError::Missing(path));
        }

        let file = File::open(&path)?;
        let mut archive = ZipArchive::new(BufReader::new(file))?;

        let mut sheets = Vec::with_capacity(archive.len());
        for index in 0..archive.len() {
            let mut entry = archive.by_index(index)?;
            let name = entry.name().trim_end_matches(".csv").to_string();

            let mut raw = String::new();
            entry.read_to_string(&mut raw)?;
            sheets.push(parse_sheet(name, &raw)?);
        }

        debug!("opened workbook {} with {} sheets", path.display(), sheets.len());
        Ok(Self { path, sheets, staged: Vec::new() })
    }

    /// Writes a complete workbook to `path`, replacing whatever is there.
    /// Used to seed new workbooks; the batch path goes through
    /// [`atomic_replace`](TabularStore::atomic_replace).
    pub fn write_to(path: impl AsRef<Path>, sheets: &[Sheet]) -> Result<(), StoreError> {
        let file = File::create(path.as_ref())?;
        let mut zip = ZipWriter::new(file);

        for sheet in sheets {
            zip.start_file::<_, ()>(format!("{}.csv", sheet.name), FileOptions::default())?;
            zip.write_all(render_sheet(sheet)?.as_slice())?;
        }

        zip.finish()?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TabularStore for CsvWorkbook {
    fn sheet_names(&self) -> Vec<String> {
        self.sheets.iter().map(|s| s.name.clone()).collect()
    }

    fn read_sheet(&self, name: &str) -> Result<Sheet, StoreError> {
        self.sheets
            .iter()
            .find(|s| s.name == name)
            .cloned()
            .ok_or_else(|| StoreError::UnknownSheet(name.to_string()))
    }

    fn stage_sheet(&mut self, sheet: Sheet) -> Result<(), StoreError> {
        self.staged.push(sheet);
        Ok(())
    }

    fn atomic_replace(&mut self) -> Result<(), StoreError> {
        let tmp = self.path.with_extension("tmp");
        Self::write_to(&tmp, &self.staged)?;

        match std::fs::rename(&tmp, &self.path) {
            Ok(()) => {
                debug!("replaced workbook {} ({} sheets)", self.path.display(), self.staged.len());
                self.sheets = std::mem::take(&mut self.staged);
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
                let _ = std::fs::remove_file(&tmp);
                Err(StoreError::Locked)
            }
            Err(e) => {
                let _ = std::fs::remove_file(&tmp);
                Err(e.into())
            }
        }
    }

    fn staged_len(&self) -> usize {
        self.staged.len()
    }
}

fn parse_sheet(name: String, raw: &str) -> Result<Sheet, StoreError> {
    let mut reader = csv::ReaderBuilder::new().has_headers(true).from_reader(raw.as_bytes());

    let columns: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    let mut sheet = Sheet::new(name, columns);

    for record in reader.records() {
        sheet.rows.push(record?.iter().map(str::to_string).collect());
    }

    Ok(sheet)
}

fn render_sheet(sheet: &Sheet) -> Result<Vec<u8>, StoreError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(&sheet.columns)?;
    for row in &sheet.rows {
        writer.write_record(row)?;
    }
    writer
        .into_inner()
        .map_err(|e| StoreError::Io(std::io::Error::other(e.to_string())))
}
