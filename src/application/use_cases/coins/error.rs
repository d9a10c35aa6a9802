#[derive(thiserror::Error, Debug)]
pub enum CoinsError {
    #[error("coin not found")]
    NotFound,
    #[error("coin already exists")]
    AlreadyExists,
    #[error("invalid coin name")]
    InvalidName,
    #[error("`from` must not be after `to`")]
    InvalidRange,
    #[error("coin repository failure")]
    Repository(#[source] anyhow::Error),
}

impl From<anyhow::Error> for CoinsError {
    fn from(err: anyhow::Error) -> Self {
        CoinsError::Repository(err)
    }
}
