//! Credentials and CredentialsProvider definitions.
//!
//! 构建[`bos::Client`](crate::bos::Client)的时候需要传入实现了`CredentialsProvider` trait的类型，
//! 每次请求签名前都会调用`load`获取AK/SK。
//!
//! # Example
//! ```no_run
//! use bos_wagon::bos;
//! use bos_wagon::credentials::{Credentials, StaticCredentialsProvider};
//! use std::sync::Arc;
//!
//! let creds = Credentials::try_new("ak", "sk").unwrap();
//! let client = bos::Client::builder()
//!     .credentials_provider(Arc::new(StaticCredentialsProvider::new(creds)))
//!     .endpoint("bj.bcebos.com")
//!     .bucket("my-bucket")
//!     .build();
//! ```

#[derive(Clone, Debug)]
pub struct Credentials {
    pub access_key_id: String,
    pub secret_access_key: String,
}

impl Credentials {
    /// AK或SK为空时返回错误
    pub fn try_new(
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
    ) -> Result<Self, CredentialsError> {
        let access_key_id = access_key_id.into();
        let secret_access_key = secret_access_key.into();
        if access_key_id.trim().is_empty() {
            return Err(CredentialsError::Missing("access key id"));
        }
        if secret_access_key.trim().is_empty() {
            return Err(CredentialsError::Missing("secret access key"));
        }
        Ok(Self {
            access_key_id,
            secret_access_key,
        })
    }
}

#[derive(thiserror::Error, Debug)]
pub enum CredentialsError {
    #[error("{0} is missing or empty")]
    Missing(&'static str),
}

#[async_trait::async_trait]
pub trait CredentialsProvider: Send + Sync {
    async fn load(&self) -> Result<Credentials, CredentialsError>;
}

/// 固定AK/SK，wagon连接时使用仓库配置里的username/password构造
pub struct StaticCredentialsProvider {
    creds: Credentials,
}

impl StaticCredentialsProvider {
    pub fn new(creds: Credentials) -> Self {
        Self { creds }
    }
}

#[async_trait::async_trait]
impl CredentialsProvider for StaticCredentialsProvider {
    async fn load(&self) -> Result<Credentials, CredentialsError> {
        Ok(self.creds.clone())
    }
}
