use crate::bos;

/// wagon对外暴露的错误
///
/// 底层bos的错误都会带上bucket/key或者资源名再返回
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("authentication failed for endpoint {endpoint}: {source}")]
    Authentication {
        endpoint: String,
        #[source]
        source: bos::Error,
    },
    #[error("resource does not exist: {0}")]
    ResourceDoesNotExist(String),
    #[error("transfer failed: {message}")]
    TransferFailed {
        message: String,
        #[source]
        source: Option<bos::Error>,
    },
    #[error("invalid repository configuration: {0}")]
    Configuration(String),
    #[error("not connected to a repository")]
    NotConnected,
    #[error("listed key `{key}` is outside of prefix `{prefix}`")]
    ListingPrefixMismatch { prefix: String, key: String },
}

impl Error {
    pub(crate) fn transfer_failed(message: impl Into<String>, source: bos::Error) -> Self {
        Error::TransferFailed {
            message: message.into(),
            source: Some(source),
        }
    }
}
