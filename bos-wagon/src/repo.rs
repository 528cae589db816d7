//! 一个bucket + base directory组成的仓库，所有操作都以资源路径为参数，
//! 内部通过[`key::resolve`](crate::key::resolve)转换成bos的key

use crate::bos;
use crate::bos::utils::compute_md5_from_file;
use crate::config::WagonConfig;
use crate::key;
use crate::progress::{Progress, ProgressReader, ProgressWriter};
use crate::storage::{ObjectStorage, PutRequest, StorageConnector};
use crate::wagon::{AuthenticationInfo, Error};
use std::path::Path;
use std::sync::Arc;
use time::OffsetDateTime;
use tokio::io::AsyncWriteExt;

pub struct StorageRepo {
    bucket: String,
    base_directory: String,
    max_list_pages: usize,
    strict_get: bool,
    storage: Option<Box<dyn ObjectStorage>>,
}

impl StorageRepo {
    pub fn new(
        bucket: impl Into<String>,
        base_directory: impl Into<String>,
        config: &WagonConfig,
    ) -> Self {
        Self {
            bucket: bucket.into(),
            base_directory: base_directory.into(),
            max_list_pages: config.max_list_pages.max(1),
            strict_get: config.strict_get,
            storage: None,
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn base_directory(&self) -> &str {
        &self.base_directory
    }

    pub fn is_connected(&self) -> bool {
        self.storage.is_some()
    }

    /// 资源路径对应的bos key
    pub fn resolve(&self, resource_name: &str) -> String {
        key::resolve(&self.base_directory, resource_name)
    }

    /// 创建存储客户端，已连接时会先释放旧的客户端
    pub fn connect(
        &mut self,
        connector: &dyn StorageConnector,
        auth: &AuthenticationInfo,
        endpoint: &str,
    ) -> Result<(), Error> {
        self.disconnect();
        let storage = connector
            .connect(&self.bucket, auth, endpoint)
            .map_err(|source| Error::Authentication {
                endpoint: endpoint.to_owned(),
                source,
            })?;
        self.storage = Some(storage);
        Ok(())
    }

    /// 可以重复调用，未连接时什么都不做
    pub fn disconnect(&mut self) {
        if let Some(storage) = self.storage.take() {
            storage.shutdown();
        }
    }

    fn storage(&self) -> Result<&dyn ObjectStorage, Error> {
        self.storage.as_deref().ok_or(Error::NotConnected)
    }

    /// 下载资源到`destination`
    ///
    /// 默认下载失败只记录日志，不返回错误；配置了`strict_get`时返回[`Error::TransferFailed`]
    pub async fn copy(
        &self,
        resource_name: &str,
        destination: &Path,
        progress: Arc<dyn Progress>,
    ) -> Result<(), Error> {
        let storage = self.storage()?;
        let key = self.resolve(resource_name);

        match self.download(storage, &key, destination, progress).await {
            Ok(n) => {
                tracing::debug!(bucket = %self.bucket, key, bytes = n, "downloaded");
                Ok(())
            }
            Err(e) => {
                tracing::warn!(
                    bucket = %self.bucket,
                    base_directory = %self.base_directory,
                    key,
                    error = %e,
                    "download failed"
                );
                if self.strict_get {
                    Err(Error::transfer_failed(
                        format!("failed to download `{}` from bucket `{}`", key, self.bucket),
                        e,
                    ))
                } else {
                    Ok(())
                }
            }
        }
    }

    async fn download(
        &self,
        storage: &dyn ObjectStorage,
        key: &str,
        destination: &Path,
        progress: Arc<dyn Progress>,
    ) -> Result<u64, bos::Error> {
        let mut reader = storage.get_object(key).await?;
        if let Some(parent) = destination.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let file = tokio::fs::File::create(destination).await?;
        let mut writer = ProgressWriter::new(file, progress);
        let copied = async {
            let n = tokio::io::copy(&mut reader, &mut writer).await?;
            writer.flush().await?;
            Ok::<_, std::io::Error>(n)
        }
        .await;

        // 不留下只写了一部分的文件
        if copied.is_err() {
            drop(writer);
            if let Err(e) = tokio::fs::remove_file(destination).await {
                tracing::warn!(
                    file = %destination.display(),
                    error = %e,
                    "failed to remove partial download"
                );
            }
        }
        Ok(copied?)
    }

    /// 上传本地文件，content-length为文件大小
    pub async fn put(
        &self,
        source: &Path,
        destination: &str,
        progress: Arc<dyn Progress>,
    ) -> Result<(), Error> {
        let storage = self.storage()?;
        let key = self.resolve(destination);

        let res = async {
            let content_length = tokio::fs::metadata(source).await?.len();
            let content_md5 = compute_md5_from_file(source).await?;
            let file = tokio::fs::File::open(source).await?;
            let request = PutRequest {
                body: Box::new(ProgressReader::new(file, progress)),
                content_length,
                content_md5: Some(content_md5),
            };
            storage.put_object(&key, request).await?;
            Ok::<_, bos::Error>(content_length)
        }
        .await;

        match res {
            Ok(n) => {
                tracing::info!(bucket = %self.bucket, key, bytes = n, "uploaded");
                Ok(())
            }
            Err(e) => {
                tracing::warn!(
                    bucket = %self.bucket,
                    base_directory = %self.base_directory,
                    key,
                    file = %source.display(),
                    error = %e,
                    "upload failed"
                );
                Err(Error::transfer_failed(
                    format!("failed to upload `{}` to `{}`", source.display(), key),
                    e,
                ))
            }
        }
    }

    /// 远程资源的最后修改时间是否晚于`since`
    pub async fn new_resource_available(
        &self,
        resource_name: &str,
        since: OffsetDateTime,
    ) -> Result<bool, Error> {
        let storage = self.storage()?;
        let key = self.resolve(resource_name);
        match storage.get_object_meta(&key).await {
            Ok(meta) => Ok(meta.last_modified > since),
            Err(e) => {
                tracing::warn!(bucket = %self.bucket, key, error = %e, "metadata probe failed");
                Err(Error::ResourceDoesNotExist(key))
            }
        }
    }

    /// 列出`path_prefix`下的所有key（完整的key，未裁剪前缀）
    pub async fn list(&self, path_prefix: &str) -> Result<Vec<String>, Error> {
        let storage = self.storage()?;
        let prefix = self.resolve(path_prefix);
        // 带上`/`，避免匹配到同名前缀的兄弟目录
        let query_prefix = if prefix.is_empty() {
            String::new()
        } else {
            format!("{}/", prefix)
        };

        let mut keys = Vec::new();
        let mut marker: Option<String> = None;
        for page in 1..=self.max_list_pages {
            let res = storage
                .list_objects(&query_prefix, marker.as_deref())
                .await
                .map_err(|e| {
                    tracing::warn!(bucket = %self.bucket, prefix, error = %e, "list failed");
                    Error::transfer_failed(format!("failed to list `{}`", prefix), e)
                })?;
            tracing::debug!(bucket = %self.bucket, prefix, page, count = res.keys.len(), "listed page");
            keys.extend(res.keys);

            match res.next_marker {
                Some(next) => marker = Some(next),
                None => return Ok(keys),
            }
        }

        Err(Error::TransferFailed {
            message: format!(
                "listing `{}` exceeded {} pages",
                prefix, self.max_list_pages
            ),
            source: None,
        })
    }

    /// 任何错误（包括未连接）都返回false
    pub async fn exists(&self, resource_name: &str) -> bool {
        let Ok(storage) = self.storage() else {
            return false;
        };
        let key = self.resolve(resource_name);
        match storage.get_object_meta(&key).await {
            Ok(_) => true,
            Err(e) => {
                if !e.is_not_found() {
                    tracing::debug!(bucket = %self.bucket, key, error = %e, "exists probe failed");
                }
                false
            }
        }
    }
}
