/// Error types shared by the search crates.
///
/// These cover the infrastructure pieces (Redis) that sit beside the search core.
/// Application-specific errors live in each binary crate and wrap `CommonError`
/// via `#[from]`.

#[derive(Debug, thiserror::Error)]
pub enum CommonError {
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("redis unavailable, degrading gracefully")]
    RedisUnavailable,
}
