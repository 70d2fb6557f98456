use thiserror::Error;

#[derive(Error, Debug)]
pub enum RepositoryError {
    #[error("Repository backend error: {0}")]
    Generic(String),
}
