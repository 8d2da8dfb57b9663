use std::fmt;

use crate::domain::error::DomainError;
use crate::domain::model::book::{Book, BookId, BookStatus};
use crate::domain::model::catalog::{BookQuery, Catalog, NewBook};
use crate::domain::repository::{CatalogRepository, LoadOutcome};

use super::error::AppError;

/// 起動時 load で空の目録にフォールバックした理由。
/// ファイル欠落（初回起動）は警告にしない。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadWarning {
    /// ファイルは存在するが蔵書列として解釈できなかった
    Corrupt { location: String, reason: String },
    /// ファイルの読み込み自体に失敗した
    Unreadable { location: String, reason: String },
}

impl fmt::Display for LoadWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Corrupt { location, reason } => write!(
                f,
                "catalog file {location} is corrupt ({reason}); starting with an empty catalog"
            ),
            Self::Unreadable { location, reason } => write!(
                f,
                "catalog file {location} could not be read ({reason}); starting with an empty catalog"
            ),
        }
    }
}

/// 蔵書目録に対するユースケース。
/// メモリ上の Catalog を保持し、変更のたびにファイル全体を書き直す。
pub struct CatalogService<R: CatalogRepository> {
    repo: R,
    catalog: Catalog,
    load_warning: Option<LoadWarning>,
}

impl<R: CatalogRepository> CatalogService<R> {
    /// 保存先から読み込んで開く。読み込み失敗は空の目録として吸収する。
    pub fn open(repo: R) -> Self {
        let mut svc = Self {
            repo,
            catalog: Catalog::new(),
            load_warning: None,
        };
        svc.load();
        svc
    }

    /// 保存先から読み直す。失敗しても空の目録になるだけで、エラーは返さない。
    pub fn load(&mut self) {
        let location = self.repo.location();
        let (catalog, warning) = match self.repo.load() {
            Ok(LoadOutcome::Missing) => (Catalog::new(), None),
            Ok(LoadOutcome::Loaded(books)) => match Catalog::from_books(books) {
                Ok(catalog) => (catalog, None),
                Err(e) => (
                    Catalog::new(),
                    Some(LoadWarning::Corrupt {
                        location,
                        reason: e.to_string(),
                    }),
                ),
            },
            Ok(LoadOutcome::Corrupt { reason }) => {
                (Catalog::new(), Some(LoadWarning::Corrupt { location, reason }))
            }
            Err(e) => (
                Catalog::new(),
                Some(LoadWarning::Unreadable {
                    location,
                    reason: e.to_string(),
                }),
            ),
        };
        self.catalog = catalog;
        self.load_warning = warning;
    }

    pub fn load_warning(&self) -> Option<&LoadWarning> {
        self.load_warning.as_ref()
    }

    pub fn location(&self) -> String {
        self.repo.location()
    }

    /// 現在の目録をファイル全体に書き出す。
    pub fn save(&self) -> Result<(), AppError> {
        self.persist(&self.catalog)
    }

    /// 蔵書を追加して永続化する。IDは 1 + 既存最大値。
    pub fn add(&mut self, title: &str, author: &str, year: i32) -> Result<Book, AppError> {
        let req = NewBook {
            title: title.to_string(),
            author: author.to_string(),
            year,
        };
        self.commit(|catalog| catalog.add(req).cloned())
    }

    /// IDで削除する。見つからなければ I/O なしで false。
    pub fn delete(&mut self, id: BookId) -> Result<bool, AppError> {
        if self.catalog.get(id).is_none() {
            return Ok(false);
        }
        self.commit(|catalog| Ok(catalog.remove(id)))
    }

    /// 条件に合う蔵書のスナップショットを挿入順で返す。
    pub fn find(&self, query: &BookQuery) -> Vec<Book> {
        self.catalog.find(query).into_iter().cloned().collect()
    }

    /// 状態を変更する。見つからなければ I/O なしで false。
    pub fn update_status(&mut self, id: BookId, status: BookStatus) -> Result<bool, AppError> {
        if self.catalog.get(id).is_none() {
            return Ok(false);
        }
        self.commit(|catalog| Ok(catalog.set_status(id, status)))
    }

    /// 文字列の状態を解釈してから変更する。未知の値は InvalidStatus。
    pub fn update_status_str(&mut self, id: BookId, status: &str) -> Result<bool, AppError> {
        let status: BookStatus = status.parse()?;
        self.update_status(id, status)
    }

    /// 貸出 ⇄ 返却。変更後の状態を返す。
    pub fn toggle_status(&mut self, id: BookId) -> Result<Option<BookStatus>, AppError> {
        let Some(next) = self.catalog.get(id).map(|b| b.status().toggled()) else {
            return Ok(None);
        };
        self.update_status(id, next)?;
        Ok(Some(next))
    }

    pub fn list(&self) -> &[Book] {
        self.catalog.books()
    }

    pub fn get(&self, id: BookId) -> Option<&Book> {
        self.catalog.get(id)
    }

    // --- private ---

    /// 複製に変更を適用し、永続化に成功した場合のみ差し替える。
    /// 保存に失敗してもメモリ上の目録はファイルと一致したまま。
    fn commit<T>(
        &mut self,
        mutate: impl FnOnce(&mut Catalog) -> Result<T, DomainError>,
    ) -> Result<T, AppError> {
        let mut next = self.catalog.clone();
        let out = mutate(&mut next)?;
        self.persist(&next)?;
        self.catalog = next;
        Ok(out)
    }

    fn persist(&self, catalog: &Catalog) -> Result<(), AppError> {
        self.repo
            .save(catalog.books())
            .map_err(|e| AppError::Persistence(Box::new(e)))
    }
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};

    use super::*;

    #[derive(Debug, thiserror::Error)]
    #[error("disk full")]
    struct DiskFull;

    /// save 回数を数え、指定時に失敗するリポジトリ。
    #[derive(Default)]
    struct CountingRepo {
        initial: Option<LoadOutcome>,
        saved: RefCell<Vec<Book>>,
        saves: Cell<usize>,
        fail_saves: Cell<bool>,
    }

    impl CatalogRepository for CountingRepo {
        type Error = DiskFull;

        fn load(&self) -> Result<LoadOutcome, Self::Error> {
            Ok(self.initial.clone().unwrap_or(LoadOutcome::Missing))
        }

        fn save(&self, books: &[Book]) -> Result<(), Self::Error> {
            if self.fail_saves.get() {
                return Err(DiskFull);
            }
            self.saves.set(self.saves.get() + 1);
            *self.saved.borrow_mut() = books.to_vec();
            Ok(())
        }

        fn location(&self) -> String {
            "memory".to_string()
        }
    }

    #[test]
    fn open_missing_is_empty_without_warning() {
        let svc = CatalogService::open(CountingRepo::default());
        assert!(svc.list().is_empty());
        assert!(svc.load_warning().is_none());
    }

    #[test]
    fn open_corrupt_is_empty_with_warning() {
        let svc = CatalogService::open(CountingRepo {
            initial: Some(LoadOutcome::Corrupt {
                reason: "expected value".into(),
            }),
            ..Default::default()
        });
        assert!(svc.list().is_empty());
        let warning = svc.load_warning().unwrap();
        assert!(matches!(warning, LoadWarning::Corrupt { .. }));
        assert!(warning.to_string().contains("expected value"));
    }

    #[test]
    fn add_persists_each_time() {
        let mut svc = CatalogService::open(CountingRepo::default());
        let dune = svc.add("Dune", "Herbert", 1965).unwrap();
        assert_eq!(dune.id().get(), 1);
        assert_eq!(dune.status(), BookStatus::Available);
        svc.add("Foundation", "Asimov", 1951).unwrap();

        assert_eq!(svc.repo.saves.get(), 2);
        assert_eq!(svc.repo.saved.borrow().as_slice(), svc.list());
    }

    #[test]
    fn delete_and_status_on_missing_id_do_no_io() {
        let mut svc = CatalogService::open(CountingRepo::default());
        svc.add("Dune", "Herbert", 1965).unwrap();
        let missing = BookId::new(99).unwrap();

        assert!(!svc.delete(missing).unwrap());
        assert!(!svc.update_status(missing, BookStatus::CheckedOut).unwrap());
        assert_eq!(svc.toggle_status(missing).unwrap(), None);
        assert_eq!(svc.repo.saves.get(), 1);
    }

    #[test]
    fn failed_save_leaves_memory_unchanged() {
        let mut svc = CatalogService::open(CountingRepo::default());
        let dune = svc.add("Dune", "Herbert", 1965).unwrap();
        svc.repo.fail_saves.set(true);

        assert!(matches!(
            svc.add("Foundation", "Asimov", 1951),
            Err(AppError::Persistence(_))
        ));
        assert!(matches!(svc.delete(dune.id()), Err(AppError::Persistence(_))));
        assert!(matches!(
            svc.update_status(dune.id(), BookStatus::CheckedOut),
            Err(AppError::Persistence(_))
        ));

        assert_eq!(svc.list(), std::slice::from_ref(&dune));
        assert_eq!(svc.repo.saved.borrow().as_slice(), svc.list());
    }

    #[test]
    fn invalid_input_is_domain_error_without_io() {
        let mut svc = CatalogService::open(CountingRepo::default());
        let dune = svc.add("Dune", "Herbert", 1965).unwrap();

        assert!(matches!(
            svc.update_status_str(dune.id(), "lost"),
            Err(AppError::Domain(DomainError::InvalidStatus(_)))
        ));
        assert!(matches!(
            svc.add("", "Nobody", 2000),
            Err(AppError::Domain(DomainError::EmptyField("title")))
        ));
        assert_eq!(svc.repo.saves.get(), 1);
    }

    #[test]
    fn toggle_status_flips() {
        let mut svc = CatalogService::open(CountingRepo::default());
        let id = svc.add("Dune", "Herbert", 1965).unwrap().id();

        assert_eq!(svc.toggle_status(id).unwrap(), Some(BookStatus::CheckedOut));
        assert_eq!(svc.toggle_status(id).unwrap(), Some(BookStatus::Available));
        assert_eq!(svc.get(id).unwrap().status(), BookStatus::Available);
    }

    #[test]
    fn find_returns_snapshots() {
        let mut svc = CatalogService::open(CountingRepo::default());
        svc.add("Dune", "Herbert", 1965).unwrap();
        let found = svc.find(&BookQuery::default().title("dune"));
        let id = found[0].id();
        svc.update_status(id, BookStatus::CheckedOut).unwrap();

        assert_eq!(found[0].status(), BookStatus::Available);
        assert_eq!(svc.get(id).unwrap().status(), BookStatus::CheckedOut);
    }
}
