use super::model::book::BookId;

#[derive(Debug, thiserror::Error)]
pub enum DomainError {
    #[error("malformed record: {0}")]
    MalformedRecord(String),

    #[error("invalid status: '{0}' (expected: available, checked out)")]
    InvalidStatus(String),

    #[error("{0} must not be empty")]
    EmptyField(&'static str),

    #[error("duplicate book id: {0}")]
    DuplicateId(BookId),

    #[error("no book id left after {0}")]
    IdSpaceExhausted(BookId),
}
