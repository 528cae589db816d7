//! 传输和会话事件，以及监听器的注册和通知
//!
//! 监听器按注册顺序同步调用，同一个监听器（按`Arc`指针判断）只会注册一次。

use crate::progress::Progress;
use crate::wagon::Error;
use std::path::Path;
use std::sync::Arc;
use time::OffsetDateTime;

/// 构建工具看到的资源
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    pub name: String,
    pub content_length: Option<u64>,
    pub last_modified: Option<OffsetDateTime>,
}

impl Resource {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content_length: None,
            last_modified: None,
        }
    }

    /// 用本地文件的大小和修改时间填充，文件不存在时保持不变
    pub async fn stamp_from(&mut self, local_file: &Path) {
        if let Ok(meta) = tokio::fs::metadata(local_file).await {
            self.content_length = Some(meta.len());
            self.last_modified = meta.modified().ok().map(OffsetDateTime::from);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestType {
    Get,
    Put,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferEventType {
    Initiated,
    Started,
    Progress,
    Completed,
    Error,
}

#[derive(Debug)]
pub struct TransferEvent<'a> {
    pub resource: &'a Resource,
    pub event_type: TransferEventType,
    pub request_type: RequestType,
    pub local_file: Option<&'a Path>,
    pub error: Option<&'a Error>,
}

/// 所有方法都有空的默认实现，按需覆盖
pub trait TransferListener: Send + Sync {
    fn transfer_initiated(&self, _event: &TransferEvent<'_>) {}
    fn transfer_started(&self, _event: &TransferEvent<'_>) {}
    fn transfer_progress(&self, _event: &TransferEvent<'_>, _buffer: &[u8]) {}
    fn transfer_completed(&self, _event: &TransferEvent<'_>) {}
    fn transfer_error(&self, _event: &TransferEvent<'_>) {}
}

#[derive(Clone, Default)]
pub struct TransferListeners {
    listeners: Vec<Arc<dyn TransferListener>>,
}

impl TransferListeners {
    pub fn add(&mut self, listener: Arc<dyn TransferListener>) {
        if !self.has(&listener) {
            self.listeners.push(listener);
        }
    }

    pub fn remove(&mut self, listener: &Arc<dyn TransferListener>) {
        self.listeners.retain(|l| !Arc::ptr_eq(l, listener));
    }

    pub fn has(&self, listener: &Arc<dyn TransferListener>) -> bool {
        self.listeners.iter().any(|l| Arc::ptr_eq(l, listener))
    }

    fn event<'a>(
        resource: &'a Resource,
        event_type: TransferEventType,
        request_type: RequestType,
    ) -> TransferEvent<'a> {
        TransferEvent {
            resource,
            event_type,
            request_type,
            local_file: None,
            error: None,
        }
    }

    pub fn fire_transfer_initiated(&self, resource: &Resource, request_type: RequestType) {
        let event = Self::event(resource, TransferEventType::Initiated, request_type);
        self.listeners
            .iter()
            .for_each(|l| l.transfer_initiated(&event));
    }

    pub fn fire_transfer_started(
        &self,
        resource: &Resource,
        request_type: RequestType,
        local_file: &Path,
    ) {
        let mut event = Self::event(resource, TransferEventType::Started, request_type);
        event.local_file = Some(local_file);
        self.listeners.iter().for_each(|l| l.transfer_started(&event));
    }

    pub fn fire_transfer_progress(
        &self,
        resource: &Resource,
        request_type: RequestType,
        buffer: &[u8],
    ) {
        let event = Self::event(resource, TransferEventType::Progress, request_type);
        self.listeners
            .iter()
            .for_each(|l| l.transfer_progress(&event, buffer));
    }

    pub fn fire_transfer_completed(&self, resource: &Resource, request_type: RequestType) {
        let event = Self::event(resource, TransferEventType::Completed, request_type);
        self.listeners
            .iter()
            .for_each(|l| l.transfer_completed(&event));
    }

    pub fn fire_transfer_error(&self, resource: &Resource, request_type: RequestType, error: &Error) {
        let mut event = Self::event(resource, TransferEventType::Error, request_type);
        event.error = Some(error);
        self.listeners.iter().for_each(|l| l.transfer_error(&event));
    }
}

/// 把传输进度转发给所有监听器
///
/// 持有监听器列表的快照，所以可以在上传的body流里使用
pub(crate) struct TransferProgress {
    resource: Resource,
    request_type: RequestType,
    listeners: TransferListeners,
}

impl TransferProgress {
    pub(crate) fn new(
        resource: Resource,
        request_type: RequestType,
        listeners: TransferListeners,
    ) -> Self {
        Self {
            resource,
            request_type,
            listeners,
        }
    }
}

impl Progress for TransferProgress {
    fn progress(&self, buffer: &[u8]) {
        self.listeners
            .fire_transfer_progress(&self.resource, self.request_type, buffer);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEventType {
    Opening,
    Opened,
    LoggedIn,
    Disconnecting,
    LoggedOff,
    Disconnected,
}

#[derive(Debug, Clone, Copy)]
pub struct SessionEvent {
    pub event_type: SessionEventType,
}

pub trait SessionListener: Send + Sync {
    fn session_opening(&self, _event: &SessionEvent) {}
    fn session_opened(&self, _event: &SessionEvent) {}
    fn session_logged_in(&self, _event: &SessionEvent) {}
    fn session_disconnecting(&self, _event: &SessionEvent) {}
    fn session_logged_off(&self, _event: &SessionEvent) {}
    fn session_disconnected(&self, _event: &SessionEvent) {}
}

#[derive(Clone, Default)]
pub struct SessionListeners {
    listeners: Vec<Arc<dyn SessionListener>>,
}

impl SessionListeners {
    pub fn add(&mut self, listener: Arc<dyn SessionListener>) {
        if !self.has(&listener) {
            self.listeners.push(listener);
        }
    }

    pub fn remove(&mut self, listener: &Arc<dyn SessionListener>) {
        self.listeners.retain(|l| !Arc::ptr_eq(l, listener));
    }

    pub fn has(&self, listener: &Arc<dyn SessionListener>) -> bool {
        self.listeners.iter().any(|l| Arc::ptr_eq(l, listener))
    }

    pub fn fire(&self, event_type: SessionEventType) {
        let event = SessionEvent { event_type };
        for l in &self.listeners {
            match event_type {
                SessionEventType::Opening => l.session_opening(&event),
                SessionEventType::Opened => l.session_opened(&event),
                SessionEventType::LoggedIn => l.session_logged_in(&event),
                SessionEventType::Disconnecting => l.session_disconnecting(&event),
                SessionEventType::LoggedOff => l.session_logged_off(&event),
                SessionEventType::Disconnected => l.session_disconnected(&event),
            }
        }
    }
}
