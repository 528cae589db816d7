//! 对象存储服务的抽象
//!
//! [`StorageRepo`](crate::repo::StorageRepo)只依赖[`ObjectStorage`]，
//! 真正的bos客户端和内存实现（[`MemoryStorage`](crate::memory::MemoryStorage)）都实现了这个trait。

use crate::bos;
use crate::bos::object::{ObjectMeta, PutObjectBody};
use crate::config::WagonConfig;
use crate::credentials::{Credentials, StaticCredentialsProvider};
use crate::wagon::AuthenticationInfo;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncRead;

pub type ObjectReader = Box<dyn AsyncRead + Send + Unpin>;
pub type UploadReader = Box<dyn AsyncRead + Send + Sync + Unpin>;

/// 一页list结果
#[derive(Debug, Default)]
pub struct ObjectPage {
    pub keys: Vec<String>,
    /// 下一页的marker，`None`表示已经是最后一页
    pub next_marker: Option<String>,
}

pub struct PutRequest {
    pub body: UploadReader,
    pub content_length: u64,
    /// base64编码的md5
    pub content_md5: Option<String>,
}

#[async_trait::async_trait]
pub trait ObjectStorage: Send + Sync {
    async fn put_object(&self, key: &str, request: PutRequest) -> Result<(), bos::Error>;

    async fn get_object(&self, key: &str) -> Result<ObjectReader, bos::Error>;

    /// key不存在时返回错误（一般为[`bos::Error::NotFound`]）
    async fn get_object_meta(&self, key: &str) -> Result<ObjectMeta, bos::Error>;

    async fn list_objects(
        &self,
        prefix: &str,
        marker: Option<&str>,
    ) -> Result<ObjectPage, bos::Error>;

    /// 断开连接时调用
    fn shutdown(&self) {}
}

/// 根据凭证和endpoint创建[`ObjectStorage`]
pub trait StorageConnector: Send + Sync {
    fn connect(
        &self,
        bucket: &str,
        auth: &AuthenticationInfo,
        endpoint: &str,
    ) -> Result<Box<dyn ObjectStorage>, bos::Error>;
}

// bos单页最多返回1000个key
const MAX_KEYS_LIMIT: u16 = 1000;

/// 连接真实的bos服务，username为AK，password为SK
pub struct BosConnector {
    page_size: u16,
    scheme: String,
    timeout: Option<Duration>,
}

impl BosConnector {
    pub fn new(config: &WagonConfig) -> Self {
        Self {
            page_size: config.list_page_size.clamp(1, MAX_KEYS_LIMIT),
            scheme: config.scheme.clone(),
            timeout: config.timeout_secs.map(Duration::from_secs),
        }
    }
}

impl StorageConnector for BosConnector {
    fn connect(
        &self,
        bucket: &str,
        auth: &AuthenticationInfo,
        endpoint: &str,
    ) -> Result<Box<dyn ObjectStorage>, bos::Error> {
        let creds = Credentials::try_new(
            auth.username.as_deref().unwrap_or_default(),
            auth.password.as_deref().unwrap_or_default(),
        )?;
        if endpoint.trim().is_empty() {
            return Err(bos::Error::Common("endpoint is empty".to_owned()));
        }
        let endpoint = if endpoint.contains("://") {
            endpoint.to_owned()
        } else {
            format!("{}://{}", self.scheme, endpoint)
        };

        let mut http_builder = reqwest::Client::builder();
        if let Some(timeout) = self.timeout {
            http_builder = http_builder.timeout(timeout);
        }
        let http_client = http_builder.build()?;

        let client = bos::Client::builder()
            .credentials_provider(Arc::new(StaticCredentialsProvider::new(creds)))
            .endpoint(endpoint)
            .bucket(bucket)
            .http_client(http_client)
            .build();
        // 检查拼出来的url是否合法
        client.request_url(None)?;

        tracing::info!(endpoint = %client.endpoint(), bucket, "connected to bos");
        Ok(Box::new(BosStorage {
            client,
            page_size: self.page_size,
        }))
    }
}

struct BosStorage {
    client: bos::Client,
    page_size: u16,
}

#[async_trait::async_trait]
impl ObjectStorage for BosStorage {
    async fn put_object(&self, key: &str, request: PutRequest) -> Result<(), bos::Error> {
        let body = PutObjectBody::Reader {
            reader: request.body,
            content_length: request.content_length,
        };
        self.client
            .put_object()
            .maybe_content_md5(request.content_md5.as_deref())
            .build()
            .send(key, body)
            .await?;
        Ok(())
    }

    async fn get_object(&self, key: &str) -> Result<ObjectReader, bos::Error> {
        let (reader, _) = self.client.get_object(key).await?;
        Ok(Box::new(reader))
    }

    async fn get_object_meta(&self, key: &str) -> Result<ObjectMeta, bos::Error> {
        self.client.head_object(key).await
    }

    async fn list_objects(
        &self,
        prefix: &str,
        marker: Option<&str>,
    ) -> Result<ObjectPage, bos::Error> {
        let prefix = (!prefix.is_empty()).then_some(prefix);
        let res = self
            .client
            .list_objects()
            .maybe_prefix(prefix)
            .maybe_marker(marker)
            .max_keys(self.page_size)
            .build()
            .send()
            .await?;

        let next_marker = res.continuation_marker().map(str::to_owned);
        Ok(ObjectPage {
            keys: res.contents.into_iter().map(|c| c.key).collect(),
            next_marker,
        })
    }

    fn shutdown(&self) {
        tracing::debug!(bucket = self.client.bucket(), "bos client released");
    }
}
