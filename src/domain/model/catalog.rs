use std::collections::HashSet;

use serde_json::Value;

use super::book::{Book, BookId, BookStatus};
use crate::domain::error::DomainError;

/// 蔵書追加リクエスト
#[derive(Debug, Clone)]
pub struct NewBook {
    pub title: String,
    pub author: String,
    pub year: i32,
}

/// 検索条件（Noneのフィールドはワイルドカード）
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookQuery {
    pub title: Option<String>,
    pub author: Option<String>,
    pub year: Option<i32>,
}

impl BookQuery {
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    pub fn year(mut self, year: i32) -> Self {
        self.year = Some(year);
        self
    }

    pub fn is_empty(&self) -> bool {
        text_filter(&self.title).is_none()
            && text_filter(&self.author).is_none()
            && self.year.is_none()
    }

    /// 指定された全条件にマッチするか（AND）。
    pub fn matches(&self, book: &Book) -> bool {
        let title_ok = text_filter(&self.title)
            .map_or(true, |t| contains_ignore_case(book.title(), &t));
        let author_ok = text_filter(&self.author)
            .map_or(true, |a| contains_ignore_case(book.author(), &a));
        let year_ok = self.year.map_or(true, |y| book.year() == y);
        title_ok && author_ok && year_ok
    }
}

/// 空文字列のフィルタは未指定扱い。比較用に小文字化して返す。
fn text_filter(filter: &Option<String>) -> Option<String> {
    filter
        .as_deref()
        .filter(|s| !s.is_empty())
        .map(str::to_lowercase)
}

fn contains_ignore_case(haystack: &str, needle_lower: &str) -> bool {
    haystack.to_lowercase().contains(needle_lower)
}

/// 蔵書目録 — 集約ルート。挿入順を保持する。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    books: Vec<Book>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// 既存の蔵書列から構築する。IDの重複は拒否。
    pub fn from_books(books: Vec<Book>) -> Result<Self, DomainError> {
        let mut seen = HashSet::new();
        for book in &books {
            if !seen.insert(book.id()) {
                return Err(DomainError::DuplicateId(book.id()));
            }
        }
        Ok(Self { books })
    }

    /// レコード列から構築する。
    pub fn from_records(records: &[Value]) -> Result<Self, DomainError> {
        let books = records
            .iter()
            .map(|value| match value {
                Value::Object(record) => Book::from_record(record),
                other => Err(DomainError::MalformedRecord(format!(
                    "record is not an object: {other}"
                ))),
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::from_books(books)
    }

    pub fn books(&self) -> &[Book] {
        &self.books
    }

    pub fn get(&self, id: BookId) -> Option<&Book> {
        self.books.iter().find(|b| b.id() == id)
    }

    pub fn len(&self) -> usize {
        self.books.len()
    }

    pub fn is_empty(&self) -> bool {
        self.books.is_empty()
    }

    /// 1 + 既存IDの最大値。削除されたIDは最大値でない限り再利用されない。
    /// 最大値が u64::MAX なら IdSpaceExhausted。
    pub fn next_id(&self) -> Result<BookId, DomainError> {
        match self.books.iter().map(Book::id).max() {
            None => Ok(BookId::first()),
            Some(max) => max.next().ok_or(DomainError::IdSpaceExhausted(max)),
        }
    }

    /// 蔵書を追加する。title / author は前後の空白を除いて空であってはならない。
    pub fn add(&mut self, req: NewBook) -> Result<&Book, DomainError> {
        let title = req.title.trim();
        if title.is_empty() {
            return Err(DomainError::EmptyField("title"));
        }
        let author = req.author.trim();
        if author.is_empty() {
            return Err(DomainError::EmptyField("author"));
        }

        let id = self.next_id()?;
        let book = Book::new(id, title.to_string(), author.to_string(), req.year);
        self.books.push(book);
        Ok(&self.books[self.books.len() - 1])
    }

    /// IDで削除する。見つからなければ false。
    pub fn remove(&mut self, id: BookId) -> bool {
        match self.books.iter().position(|b| b.id() == id) {
            Some(pos) => {
                self.books.remove(pos);
                true
            }
            None => false,
        }
    }

    pub fn set_status(&mut self, id: BookId, status: BookStatus) -> bool {
        match self.books.iter_mut().find(|b| b.id() == id) {
            Some(book) => {
                book.set_status(status);
                true
            }
            None => false,
        }
    }

    /// 挿入順でマッチする蔵書を返す。
    pub fn find(&self, query: &BookQuery) -> Vec<&Book> {
        self.books.iter().filter(|b| query.matches(b)).collect()
    }
}
