#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("error: {0}")]
    Common(String),
    #[error("request api failed: {status}, code: {code}, message: {message}")]
    RequestAPIFailed {
        status: String,
        code: String,
        message: String,
    },
    #[error("reqwest error: {0}")]
    Reqwest(#[from] reqwest::Error),
}
