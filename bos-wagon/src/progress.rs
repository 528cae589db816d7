//! 读写流的包装，每读/写一块数据就通知一次[`Progress`]

use std::io;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll, ready};
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};

/// 传输进度回调，`buffer`为本次传输的数据
///
/// 只用于观察，不能修改传输的数据
pub trait Progress: Send + Sync {
    fn progress(&self, buffer: &[u8]);
}

impl<F> Progress for F
where
    F: Fn(&[u8]) + Send + Sync,
{
    fn progress(&self, buffer: &[u8]) {
        self(buffer)
    }
}

/// 上传时使用：从内部reader读出数据的同时通知进度
pub struct ProgressReader<R> {
    inner: R,
    progress: Arc<dyn Progress>,
}

impl<R> ProgressReader<R> {
    pub fn new(inner: R, progress: Arc<dyn Progress>) -> Self {
        Self { inner, progress }
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: AsyncRead + Unpin> AsyncRead for ProgressReader<R> {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        let before = buf.filled().len();
        ready!(Pin::new(&mut this.inner).poll_read(cx, buf))?;
        let chunk = &buf.filled()[before..];
        if !chunk.is_empty() {
            this.progress.progress(chunk);
        }
        Poll::Ready(Ok(()))
    }
}

/// 下载时使用：写入内部writer成功后通知进度
pub struct ProgressWriter<W> {
    inner: W,
    progress: Arc<dyn Progress>,
}

impl<W> ProgressWriter<W> {
    pub fn new(inner: W, progress: Arc<dyn Progress>) -> Self {
        Self { inner, progress }
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: AsyncWrite + Unpin> AsyncWrite for ProgressWriter<W> {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        let this = self.get_mut();
        let n = ready!(Pin::new(&mut this.inner).poll_write(cx, buf))?;
        if n > 0 {
            this.progress.progress(&buf[..n]);
        }
        Poll::Ready(Ok(n))
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().inner).poll_flush(cx)
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().inner).poll_shutdown(cx)
    }
}
