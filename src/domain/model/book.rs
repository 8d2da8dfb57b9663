use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::error::DomainError;

/// 永続化用の構造化レコード（フィールド名 → 値）。
pub type Record = Map<String, Value>;

/// 蔵書ID。Catalogが採番する正の整数。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u64", into = "u64")]
pub struct BookId(u64);

impl BookId {
    pub fn new(raw: u64) -> Option<Self> {
        (raw > 0).then_some(Self(raw))
    }

    pub fn get(&self) -> u64 {
        self.0
    }

    /// 次のID。u64 を使い切っていれば None。
    pub(crate) fn next(self) -> Option<Self> {
        self.0.checked_add(1).map(Self)
    }

    pub(crate) fn first() -> Self {
        Self(1)
    }
}

impl TryFrom<u64> for BookId {
    type Error = String;

    fn try_from(raw: u64) -> Result<Self, Self::Error> {
        Self::new(raw).ok_or_else(|| format!("book id must be positive, got {raw}"))
    }
}

impl From<BookId> for u64 {
    fn from(id: BookId) -> Self {
        id.0
    }
}

impl fmt::Display for BookId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 貸出状態。ファイル上のリテラルは既存の library.json と互換。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BookStatus {
    #[default]
    #[serde(rename = "в наличии")]
    Available,
    #[serde(rename = "выдана")]
    CheckedOut,
}

impl BookStatus {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Available => "available",
            Self::CheckedOut => "checked out",
        }
    }

    /// available ⇄ checked out
    pub fn toggled(&self) -> Self {
        match self {
            Self::Available => Self::CheckedOut,
            Self::CheckedOut => Self::Available,
        }
    }
}

impl fmt::Display for BookStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// 利用者入力の解釈。英語ラベルも受け付け、大文字小文字と前後の空白は無視する。
/// レコードの読み込みはこれを通らず、ファイル上のリテラルのみを受け付ける。
impl FromStr for BookStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        match normalized.as_str() {
            "available" | "в наличии" => Ok(Self::Available),
            "checked out" | "checked_out" | "выдана" => Ok(Self::CheckedOut),
            _ => Err(DomainError::InvalidStatus(s.to_string())),
        }
    }
}

/// 蔵書1冊。Catalogが所有し、Catalogを通じてのみ変更される。
/// フィールド順がそのままレコードのキー順になる。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Book {
    id: BookId,
    title: String,
    author: String,
    year: i32,
    status: BookStatus,
}

impl Book {
    pub(crate) fn new(id: BookId, title: String, author: String, year: i32) -> Self {
        Self {
            id,
            title,
            author,
            year,
            status: BookStatus::Available,
        }
    }

    pub fn id(&self) -> BookId {
        self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn author(&self) -> &str {
        &self.author
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn status(&self) -> BookStatus {
        self.status
    }

    pub(crate) fn set_status(&mut self, status: BookStatus) {
        self.status = status;
    }

    /// レコードへ変換する。キーは id, title, author, year, status の順。
    pub fn to_record(&self) -> Result<Record, serde_json::Error> {
        match serde_json::to_value(self)? {
            Value::Object(record) => Ok(record),
            other => Err(<serde_json::Error as serde::ser::Error>::custom(format!(
                "book serialized to a non-object: {other}"
            ))),
        }
    }

    /// レコードから復元する。キーの過不足・型違い・未知の状態は MalformedRecord。
    pub fn from_record(record: &Record) -> Result<Self, DomainError> {
        serde_json::from_value(Value::Object(record.clone()))
            .map_err(|e| DomainError::MalformedRecord(e.to_string()))
    }
}

impl fmt::Display for Book {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} ({}, {}) - {}",
            self.id, self.title, self.author, self.year, self.status
        )
    }
}
