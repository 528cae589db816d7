//! 构建工具使用的传输接口
//!
//! [`BosWagon`]在每个[`StorageRepo`]操作前后通知监听器，并实现了目录的递归上传和带目录的文件列表。

mod error;
mod events;
mod repository;

pub use error::Error;
pub use events::{
    RequestType, Resource, SessionEvent, SessionEventType, SessionListener, SessionListeners,
    TransferEvent, TransferEventType, TransferListener, TransferListeners,
};
pub use repository::{AuthenticationInfo, Repository};

use crate::config::WagonConfig;
use crate::listing;
use crate::repo::StorageRepo;
use crate::storage::{BosConnector, StorageConnector};
use events::TransferProgress;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use time::OffsetDateTime;
use walkdir::WalkDir;

pub struct BosWagon {
    config: WagonConfig,
    connector: Box<dyn StorageConnector>,
    repository: Option<Repository>,
    repo: Option<StorageRepo>,
    transfer_listeners: TransferListeners,
    session_listeners: SessionListeners,
}

impl BosWagon {
    /// 连接真实的bos服务
    pub fn new(config: WagonConfig) -> Self {
        let connector = BosConnector::new(&config);
        Self::with_connector(config, connector)
    }

    pub fn with_connector(config: WagonConfig, connector: impl StorageConnector + 'static) -> Self {
        Self {
            config,
            connector: Box::new(connector),
            repository: None,
            repo: None,
            transfer_listeners: TransferListeners::default(),
            session_listeners: SessionListeners::default(),
        }
    }

    pub fn repository(&self) -> Option<&Repository> {
        self.repository.as_ref()
    }

    pub fn is_connected(&self) -> bool {
        self.repo.as_ref().is_some_and(StorageRepo::is_connected)
    }

    fn repo(&self) -> Result<&StorageRepo, Error> {
        self.repo.as_ref().ok_or(Error::NotConnected)
    }

    pub fn connect(
        &mut self,
        repository: Repository,
        auth: &AuthenticationInfo,
    ) -> Result<(), Error> {
        self.session_listeners.fire(SessionEventType::Opening);

        let (bucket, base_directory) = repository.bucket_and_base()?;
        if let Some(mut old) = self.repo.take() {
            old.disconnect();
        }
        self.repository = None;
        let mut repo = StorageRepo::new(bucket, base_directory, &self.config);
        repo.connect(self.connector.as_ref(), auth, repository.host())?;
        tracing::info!(
            repository = repository.id(),
            bucket = repo.bucket(),
            base_directory = repo.base_directory(),
            "repository connected"
        );
        self.repo = Some(repo);
        self.repository = Some(repository);

        self.session_listeners.fire(SessionEventType::LoggedIn);
        self.session_listeners.fire(SessionEventType::Opened);
        Ok(())
    }

    /// 无论是否连接过都会发出全部的断开事件
    pub fn disconnect(&mut self) {
        self.session_listeners.fire(SessionEventType::Disconnecting);
        if let Some(mut repo) = self.repo.take() {
            repo.disconnect();
        }
        self.session_listeners.fire(SessionEventType::LoggedOff);
        self.session_listeners.fire(SessionEventType::Disconnected);
    }

    fn progress(&self, resource: &Resource, request_type: RequestType) -> Arc<TransferProgress> {
        Arc::new(TransferProgress::new(
            resource.clone(),
            request_type,
            self.transfer_listeners.clone(),
        ))
    }

    /// 下载`resource_name`到`destination`
    pub async fn get(&self, resource_name: &str, destination: &Path) -> Result<(), Error> {
        let repo = self.repo()?;
        let mut resource = Resource::new(resource_name);
        self.transfer_listeners
            .fire_transfer_initiated(&resource, RequestType::Get);
        resource.stamp_from(destination).await;
        self.transfer_listeners
            .fire_transfer_started(&resource, RequestType::Get, destination);

        let progress = self.progress(&resource, RequestType::Get);
        match repo.copy(resource_name, destination, progress).await {
            Ok(()) => {
                self.transfer_listeners
                    .fire_transfer_completed(&resource, RequestType::Get);
                Ok(())
            }
            Err(e) => {
                self.transfer_listeners
                    .fire_transfer_error(&resource, RequestType::Get, &e);
                Err(e)
            }
        }
    }

    /// 远程资源比`since`新时才下载，返回是否下载了
    pub async fn get_if_newer(
        &self,
        resource_name: &str,
        destination: &Path,
        since: OffsetDateTime,
    ) -> Result<bool, Error> {
        if !self
            .repo()?
            .new_resource_available(resource_name, since)
            .await?
        {
            return Ok(false);
        }
        self.get(resource_name, destination).await?;
        Ok(true)
    }

    /// 上传`source`到`destination`
    pub async fn put(&self, source: &Path, destination: &str) -> Result<(), Error> {
        let repo = self.repo()?;
        let mut resource = Resource::new(destination);
        self.transfer_listeners
            .fire_transfer_initiated(&resource, RequestType::Put);
        resource.stamp_from(source).await;
        self.transfer_listeners
            .fire_transfer_started(&resource, RequestType::Put, source);

        let progress = self.progress(&resource, RequestType::Put);
        match repo.put(source, destination, progress).await {
            Ok(()) => {
                self.transfer_listeners
                    .fire_transfer_completed(&resource, RequestType::Put);
                Ok(())
            }
            Err(e) => {
                self.transfer_listeners
                    .fire_transfer_error(&resource, RequestType::Put, &e);
                Err(e)
            }
        }
    }

    /// 递归上传目录下的所有文件
    ///
    /// `destination_directory`为`.`或以`./`开头时，去掉开头的`.`，即上传到仓库根目录
    pub async fn put_directory(
        &self,
        source_directory: &Path,
        destination_directory: &str,
    ) -> Result<(), Error> {
        self.repo()?;
        let is_dir = tokio::fs::metadata(source_directory)
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false);
        if !is_dir {
            return Err(Error::ResourceDoesNotExist(format!(
                "source `{}` is not a directory",
                source_directory.display()
            )));
        }

        let target = normalize_target(destination_directory);
        for (file, relative) in list_files(source_directory)? {
            let destination = if target.is_empty() {
                relative
            } else {
                format!("{}/{}", target, relative)
            };
            self.put(&file, &destination).await?;
        }
        Ok(())
    }

    /// 列出目录下的所有文件和子目录（子目录以`/`结尾）
    pub async fn get_file_list(&self, destination_directory: &str) -> Result<Vec<String>, Error> {
        let repo = self.repo()?;
        let keys = repo.list(destination_directory).await?;
        let entries = listing::project(&repo.resolve(destination_directory), &keys)?;
        if entries.is_empty() {
            return Err(Error::ResourceDoesNotExist(format!(
                "`{}` has no entries in bucket `{}`",
                destination_directory,
                repo.bucket()
            )));
        }
        Ok(entries)
    }

    pub async fn resource_exists(&self, resource_name: &str) -> bool {
        match &self.repo {
            Some(repo) => repo.exists(resource_name).await,
            None => false,
        }
    }

    pub fn add_transfer_listener(&mut self, listener: Arc<dyn TransferListener>) {
        self.transfer_listeners.add(listener);
    }

    pub fn remove_transfer_listener(&mut self, listener: &Arc<dyn TransferListener>) {
        self.transfer_listeners.remove(listener);
    }

    pub fn has_transfer_listener(&self, listener: &Arc<dyn TransferListener>) -> bool {
        self.transfer_listeners.has(listener)
    }

    pub fn add_session_listener(&mut self, listener: Arc<dyn SessionListener>) {
        self.session_listeners.add(listener);
    }

    pub fn remove_session_listener(&mut self, listener: &Arc<dyn SessionListener>) {
        self.session_listeners.remove(listener);
    }

    pub fn has_session_listener(&self, listener: &Arc<dyn SessionListener>) -> bool {
        self.session_listeners.has(listener)
    }
}

fn normalize_target(destination_directory: &str) -> &str {
    if destination_directory == "." {
        ""
    } else if let Some(rest) = destination_directory.strip_prefix("./") {
        rest
    } else {
        destination_directory
    }
}

// 返回(文件路径, 用`/`连接的相对路径)，按文件名排序
fn list_files(root: &Path) -> Result<Vec<(PathBuf, String)>, Error> {
    let mut files = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.map_err(|e| Error::TransferFailed {
            message: format!("failed to walk `{}`: {}", root.display(), e),
            source: None,
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let Ok(relative) = entry.path().strip_prefix(root) else {
            continue;
        };
        let relative = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        files.push((entry.into_path(), relative));
    }
    Ok(files)
}
