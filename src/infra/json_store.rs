use std::io::ErrorKind;
use std::path::PathBuf;

use serde::Serialize;
use serde_json::Value;

use crate::domain::model::book::{Book, Record};
use crate::domain::model::catalog::Catalog;
use crate::domain::repository::{CatalogRepository, LoadOutcome};

#[derive(Debug, thiserror::Error)]
pub enum JsonStoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// JSONファイルによるCatalogRepository実装。
/// 1 Catalog = 1 JSONファイル（レコードの配列）。
pub struct JsonCatalogRepository {
    path: PathBuf,
}

impl JsonCatalogRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// ファイル内容を蔵書列として解釈する。失敗時は理由を返す。
    fn parse(content: &str) -> Result<Vec<Book>, String> {
        let value: Value = serde_json::from_str(content).map_err(|e| e.to_string())?;
        let Value::Array(records) = value else {
            return Err("top-level value is not an array".to_string());
        };
        let catalog = Catalog::from_records(&records).map_err(|e| e.to_string())?;
        Ok(catalog.books().to_vec())
    }
}

/// 4スペースインデントの pretty JSON。末尾に改行を付ける。
fn to_pretty_json<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, serde_json::Error> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut ser)?;
    buf.push(b'\n');
    Ok(buf)
}

impl CatalogRepository for JsonCatalogRepository {
    type Error = JsonStoreError;

    fn load(&self) -> Result<LoadOutcome, Self::Error> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(LoadOutcome::Missing),
            Err(e) if e.kind() == ErrorKind::InvalidData => {
                return Ok(LoadOutcome::Corrupt {
                    reason: format!("not valid UTF-8: {e}"),
                })
            }
            Err(e) => return Err(e.into()),
        };
        Ok(match Self::parse(&content) {
            Ok(books) => LoadOutcome::Loaded(books),
            Err(reason) => LoadOutcome::Corrupt { reason },
        })
    }

    fn save(&self, books: &[Book]) -> Result<(), Self::Error> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let records = books
            .iter()
            .map(Book::to_record)
            .collect::<Result<Vec<Record>, _>>()?;
        let content = to_pretty_json(&records)?;

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        std::fs::write(&tmp, &content)?;
        if let Err(e) = std::fs::rename(&tmp, &self.path) {
            // 書きかけの一時ファイルは残さない
            let _ = std::fs::remove_file(&tmp);
            return Err(e.into());
        }
        Ok(())
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}
