use super::model::book::Book;

/// load の結果。ファイル欠落と破損を区別する。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// 保存先が存在しない（初回起動）
    Missing,
    Loaded(Vec<Book>),
    /// 保存先は存在するが、蔵書列として解釈できない
    Corrupt { reason: String },
}

/// 永続化の抽象。Infra層が実装する。
pub trait CatalogRepository {
    type Error: std::error::Error + Send + Sync + 'static;

    fn load(&self) -> Result<LoadOutcome, Self::Error>;
    fn save(&self, books: &[Book]) -> Result<(), Self::Error>;

    /// 保存先の表示名（ログ・警告用）
    fn location(&self) -> String;
}
