//! Shared test harness for integration tests.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::path::PathBuf;

use library_catalog::application::service::CatalogService;
use library_catalog::domain::model::book::Book;
use library_catalog::domain::repository::{CatalogRepository, LoadOutcome};
use library_catalog::infra::json_store::JsonCatalogRepository;

// =============================================================================
// InMemoryRepo — テスト用リポジトリ
// =============================================================================

#[derive(Debug, thiserror::Error)]
#[error("in-memory store error")]
pub struct InMemoryError;

/// ファイルI/O不要のインメモリリポジトリ。save回数を記録する。
#[derive(Default)]
pub struct InMemoryRepo {
    stored: RefCell<Option<Vec<Book>>>,
    saves: Cell<usize>,
}

impl InMemoryRepo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn saves(&self) -> usize {
        self.saves.get()
    }

    pub fn stored(&self) -> Option<Vec<Book>> {
        self.stored.borrow().clone()
    }
}

impl CatalogRepository for InMemoryRepo {
    type Error = InMemoryError;

    fn load(&self) -> Result<LoadOutcome, Self::Error> {
        Ok(match self.stored.borrow().as_ref() {
            Some(books) => LoadOutcome::Loaded(books.clone()),
            None => LoadOutcome::Missing,
        })
    }

    fn save(&self, books: &[Book]) -> Result<(), Self::Error> {
        *self.stored.borrow_mut() = Some(books.to_vec());
        self.saves.set(self.saves.get() + 1);
        Ok(())
    }

    fn location(&self) -> String {
        "memory".to_string()
    }
}

// =============================================================================
// Fixtures
// =============================================================================

/// 空の目録を持つ CatalogService（インメモリ）。
pub fn memory_service() -> CatalogService<InMemoryRepo> {
    CatalogService::open(InMemoryRepo::new())
}

/// 一時ディレクトリ上のファイルを使う CatalogService。
pub struct FileFixture {
    pub dir: tempfile::TempDir,
}

impl FileFixture {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    pub fn path(&self) -> PathBuf {
        self.dir.path().join("library.json")
    }

    pub fn open(&self) -> CatalogService<JsonCatalogRepository> {
        CatalogService::open(JsonCatalogRepository::new(self.path()))
    }

    pub fn read(&self) -> String {
        std::fs::read_to_string(self.path()).unwrap()
    }
}

/// 標準的なテスト用目録:
/// ```text
/// 1: Dune (Frank Herbert, 1965)
/// 2: Foundation (Isaac Asimov, 1951)
/// 3: I, Robot (Isaac Asimov, 1950)
/// 4: Neuromancer (William Gibson, 1984)
/// ```
pub fn seed<R: CatalogRepository>(svc: &mut CatalogService<R>) {
    for (title, author, year) in [
        ("Dune", "Frank Herbert", 1965),
        ("Foundation", "Isaac Asimov", 1951),
        ("I, Robot", "Isaac Asimov", 1950),
        ("Neuromancer", "William Gibson", 1984),
    ] {
        svc.add(title, author, year).unwrap();
    }
}

pub fn ids(books: &[Book]) -> Vec<u64> {
    books.iter().map(|b| b.id().get()).collect()
}

// =============================================================================
// Assertion helpers
// =============================================================================

/// 結果がErrで、メッセージに指定文字列を含むことをassert。
pub fn assert_error_contains<T: std::fmt::Debug>(
    result: Result<T, impl std::fmt::Display>,
    expected: &str,
) {
    match result {
        Err(e) => {
            let msg = e.to_string();
            assert!(
                msg.contains(expected),
                "Expected error containing '{expected}', got: '{msg}'"
            );
        }
        Ok(v) => panic!("Expected error containing '{expected}', got Ok({v:?})"),
    }
}
