//! 内存中的[`ObjectStorage`]实现，不需要网络，主要用于测试和离线使用
//!
//! list的行为和bos一致：key按字典序返回，每页最多`page_size`个。

use crate::bos;
use crate::bos::object::ObjectMeta;
use crate::storage::{ObjectPage, ObjectReader, ObjectStorage, PutRequest, StorageConnector};
use crate::wagon::AuthenticationInfo;
use bytes::Bytes;
use std::collections::BTreeMap;
use std::io::Cursor;
use std::sync::{Arc, RwLock};
use time::OffsetDateTime;
use tokio::io::AsyncReadExt;

#[derive(Clone)]
struct StoredObject {
    data: Bytes,
    last_modified: OffsetDateTime,
}

/// 可以clone，clone之后共享同一份数据
#[derive(Clone)]
pub struct MemoryStorage {
    objects: Arc<RwLock<BTreeMap<String, StoredObject>>>,
    page_size: usize,
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new(1000)
    }
}

impl MemoryStorage {
    pub fn new(page_size: usize) -> Self {
        Self {
            objects: Arc::new(RwLock::new(BTreeMap::new())),
            page_size: page_size.max(1),
        }
    }

    fn read(
        &self,
    ) -> Result<std::sync::RwLockReadGuard<'_, BTreeMap<String, StoredObject>>, bos::Error> {
        self.objects
            .read()
            .map_err(|_| bos::Error::Common("memory storage lock poisoned".to_owned()))
    }

    fn write(
        &self,
    ) -> Result<std::sync::RwLockWriteGuard<'_, BTreeMap<String, StoredObject>>, bos::Error> {
        self.objects
            .write()
            .map_err(|_| bos::Error::Common("memory storage lock poisoned".to_owned()))
    }

    /// 直接写入一个object，可以指定最后修改时间
    pub fn insert(
        &self,
        key: impl Into<String>,
        data: impl Into<Bytes>,
        last_modified: OffsetDateTime,
    ) -> Result<(), bos::Error> {
        self.write()?.insert(
            key.into(),
            StoredObject {
                data: data.into(),
                last_modified,
            },
        );
        Ok(())
    }

    pub fn object(&self, key: &str) -> Option<Bytes> {
        self.read().ok()?.get(key).map(|o| o.data.clone())
    }

    pub fn keys(&self) -> Vec<String> {
        self.read()
            .map(|m| m.keys().cloned().collect())
            .unwrap_or_default()
    }
}

#[async_trait::async_trait]
impl ObjectStorage for MemoryStorage {
    async fn put_object(&self, key: &str, mut request: PutRequest) -> Result<(), bos::Error> {
        let mut data = Vec::with_capacity(request.content_length as usize);
        request.body.read_to_end(&mut data).await?;
        if data.len() as u64 != request.content_length {
            return Err(bos::Error::Common(format!(
                "content-length mismatch: declared {}, read {}",
                request.content_length,
                data.len()
            )));
        }
        self.insert(key, data, OffsetDateTime::now_utc())
    }

    async fn get_object(&self, key: &str) -> Result<ObjectReader, bos::Error> {
        let data = self
            .object(key)
            .ok_or_else(|| bos::Error::NotFound(key.to_owned()))?;
        Ok(Box::new(Cursor::new(data)))
    }

    async fn get_object_meta(&self, key: &str) -> Result<ObjectMeta, bos::Error> {
        let objects = self.read()?;
        let object = objects
            .get(key)
            .ok_or_else(|| bos::Error::NotFound(key.to_owned()))?;
        Ok(ObjectMeta {
            content_length: object.data.len() as u64,
            last_modified: object.last_modified,
            e_tag: None,
            content_type: None,
        })
    }

    async fn list_objects(
        &self,
        prefix: &str,
        marker: Option<&str>,
    ) -> Result<ObjectPage, bos::Error> {
        let objects = self.read()?;
        // marker本身不包含在结果中
        let mut keys = objects
            .keys()
            .filter(|k| k.starts_with(prefix))
            .filter(|k| marker.is_none_or(|m| k.as_str() > m))
            .take(self.page_size + 1)
            .cloned()
            .collect::<Vec<_>>();

        let next_marker = if keys.len() > self.page_size {
            keys.truncate(self.page_size);
            keys.last().cloned()
        } else {
            None
        };
        Ok(ObjectPage { keys, next_marker })
    }
}

/// 每次connect都返回同一个[`MemoryStorage`]的句柄
#[derive(Clone, Default)]
pub struct MemoryConnector {
    storage: MemoryStorage,
}

impl MemoryConnector {
    pub fn new(storage: MemoryStorage) -> Self {
        Self { storage }
    }

    pub fn storage(&self) -> &MemoryStorage {
        &self.storage
    }
}

impl StorageConnector for MemoryConnector {
    fn connect(
        &self,
        _bucket: &str,
        auth: &AuthenticationInfo,
        _endpoint: &str,
    ) -> Result<Box<dyn ObjectStorage>, bos::Error> {
        // 和bos一样要求有AK/SK
        crate::credentials::Credentials::try_new(
            auth.username.as_deref().unwrap_or_default(),
            auth.password.as_deref().unwrap_or_default(),
        )?;
        Ok(Box::new(self.storage.clone()))
    }
}
