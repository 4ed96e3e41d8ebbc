use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    #[error("password hashing failed")]
    HashingFailure,
    #[error("malformed password hash")]
    MalformedHash,
    #[error("malformed token")]
    MalformedToken,
    #[error("token expired")]
    ExpiredToken,
    #[error("invalid issuer")]
    WrongIssuer,
    #[error("invalid subject")]
    InvalidSubject,
    #[error("secure random source unavailable")]
    RandomSourceFailure,
    #[error("no matching credential in authorization headers")]
    NoCredentialFound,
}
