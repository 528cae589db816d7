use crate::credentials::CredentialsError;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("error: {0}")]
    Common(String),
    #[error("object not found: {0}")]
    NotFound(String),
    #[error("reqwest error: {0}")]
    Reqwest(#[from] reqwest::Error),
    #[error("response status is not success: {status}, code: {code}, message: {message}")]
    RequestAPIFailed {
        status: String,
        code: String,
        message: String,
    },
    #[error("io error: {0}")]
    IO(#[from] std::io::Error),
    #[error("credentials error: {0}")]
    Credentials(#[from] CredentialsError),
}

impl Error {
    pub fn is_not_found(&self) -> bool {
        match self {
            Error::NotFound(_) => true,
            Error::RequestAPIFailed { status, .. } => status.starts_with("404"),
            _ => false,
        }
    }
}

impl From<bos_wagon_common::Error> for Error {
    fn from(e: bos_wagon_common::Error) -> Self {
        use bos_wagon_common::Error as CommonError;

        match e {
            CommonError::Common(s) => Error::Common(s),
            CommonError::RequestAPIFailed {
                status,
                code,
                message,
            } => Error::RequestAPIFailed {
                status,
                code,
                message,
            },
            CommonError::Reqwest(e) => Error::Reqwest(e),
        }
    }
}
