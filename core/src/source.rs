use rusqlite::{Connection, OpenFlags};
use serde::Deserialize;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::error::{Error, Result};

/// Supplies the raw corpus. Ordinals are positions in the returned vector.
pub trait DocumentSource {
    /// Identity that participates in the cache key.
    fn identity(&self) -> String;
    fn load(&self) -> Result<Vec<String>>;
}

#[derive(Debug, Deserialize)]
struct InputDoc {
    #[serde(alias = "content", alias = "text", alias = "publication_content")]
    body: String,
}

/// JSON / JSONL documents from a file or a directory tree, or a SQLite database.
///
/// A `.json` file may hold one object or an array of objects; a `.jsonl` file
/// holds one object per line. Directories are walked in file-name order. A
/// `.db`, `.sqlite` or `.sqlite3` file is read with [`SqliteSource`] defaults.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self { path: path.as_ref().to_path_buf() }
    }

    fn files(&self) -> Result<Vec<PathBuf>> {
        if self.path.is_file() {
            return Ok(vec![self.path.clone()]);
        }
        if !self.path.is_dir() {
            return Err(Error::Source(format!("{} does not exist", self.path.display())));
        }
        let mut files = Vec::new();
        for entry in WalkDir::new(&self.path).sort_by_file_name() {
            let entry = entry.map_err(|e| Error::Source(e.to_string()))?;
            let p = entry.path();
            if p.is_file() && matches!(extension(p), Some("json" | "jsonl")) {
                files.push(p.to_path_buf());
            }
        }
        Ok(files)
    }
}

fn extension(p: &Path) -> Option<&str> {
    p.extension().and_then(|s| s.to_str())
}

fn is_sqlite(p: &Path) -> bool {
    matches!(extension(p), Some("db" | "sqlite" | "sqlite3"))
}

impl DocumentSource for FileSource {
    fn identity(&self) -> String {
        self.path.to_string_lossy().into_owned()
    }

    fn load(&self) -> Result<Vec<String>> {
        if self.path.is_file() && is_sqlite(&self.path) {
            return SqliteSource::new(&self.path).load();
        }
        let mut docs = Vec::new();
        for file in self.files()? {
            if extension(&file) == Some("jsonl") {
                read_jsonl(&file, &mut docs)?;
            } else {
                read_json(&file, &mut docs)?;
            }
        }
        tracing::info!(source = %self.path.display(), num_docs = docs.len(), "loaded documents");
        Ok(docs)
    }
}

fn read_jsonl(file: &Path, docs: &mut Vec<String>) -> Result<()> {
    let reader = BufReader::new(File::open(file)?);
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let doc: InputDoc = serde_json::from_str(&line)?;
        docs.push(doc.body);
    }
    Ok(())
}

fn read_json(file: &Path, docs: &mut Vec<String>) -> Result<()> {
    let reader = BufReader::new(File::open(file)?);
    let json: serde_json::Value = serde_json::from_reader(reader)?;
    match json {
        serde_json::Value::Array(arr) => {
            for v in arr {
                let doc: InputDoc = serde_json::from_value(v)?;
                docs.push(doc.body);
            }
        }
        serde_json::Value::Object(_) => {
            let doc: InputDoc = serde_json::from_value(json)?;
            docs.push(doc.body);
        }
        _ => {
            return Err(Error::Source(format!(
                "{}: expected a JSON object or array",
                file.display()
            )))
        }
    }
    Ok(())
}

pub const DEFAULT_TABLE: &str = "ParsedData";
pub const DEFAULT_COLUMN: &str = "publication_content";

/// One text column of a SQLite table, read in rowid order.
///
/// NULL cells load as empty documents so later rows keep their ordinals.
#[derive(Debug, Clone)]
pub struct SqliteSource {
    path: PathBuf,
    table: String,
    column: String,
}

impl SqliteSource {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            table: DEFAULT_TABLE.to_string(),
            column: DEFAULT_COLUMN.to_string(),
        }
    }

    pub fn with_table(mut self, table: impl Into<String>, column: impl Into<String>) -> Self {
        self.table = table.into();
        self.column = column.into();
        self
    }
}

// Table and column names are spliced into the query text.
fn check_identifier(name: &str) -> Result<()> {
    let ok = !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if ok {
        Ok(())
    } else {
        Err(Error::Source(format!("invalid SQLite identifier: {name:?}")))
    }
}

impl DocumentSource for SqliteSource {
    fn identity(&self) -> String {
        self.path.to_string_lossy().into_owned()
    }

    fn load(&self) -> Result<Vec<String>> {
        check_identifier(&self.table)?;
        check_identifier(&self.column)?;
        if !self.path.is_file() {
            return Err(Error::Source(format!("{} does not exist", self.path.display())));
        }
        let conn = Connection::open_with_flags(&self.path, OpenFlags::SQLITE_OPEN_READ_ONLY)?;
        let sql = format!("SELECT {} FROM {} ORDER BY rowid", self.column, self.table);
        let mut stmt = conn.prepare(&sql)?;
        let docs = stmt
            .query_map([], |row| row.get::<_, Option<String>>(0))?
            .map(|r| r.map(Option::unwrap_or_default))
            .collect::<rusqlite::Result<Vec<String>>>()?;
        tracing::info!(source = %self.path.display(), table = %self.table, num_docs = docs.len(), "loaded documents");
        Ok(docs)
    }
}

/// In-memory corpus with a caller-chosen identity.
#[derive(Debug, Clone)]
pub struct MemorySource {
    identity: String,
    docs: Vec<String>,
}

impl MemorySource {
    pub fn new<I, S>(identity: impl Into<String>, docs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { identity: identity.into(), docs: docs.into_iter().map(Into::into).collect() }
    }
}

impl DocumentSource for MemorySource {
    fn identity(&self) -> String {
        self.identity.clone()
    }

    fn load(&self) -> Result<Vec<String>> {
        Ok(self.docs.clone())
    }
}
