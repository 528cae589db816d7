//! Object基础操作
//!
//! [官方文档](https://cloud.baidu.com/doc/BOS/s/Ikc5nv3wc)

use crate::bos::Client;
use crate::bos::Error;
use crate::bos::sign::HTTPVerb;
use crate::bos::utils::{get_content_md5, get_request_header, into_error, validate_object_name};
use bon::Builder;
use bos_wagon_common::helper::parse_gmt;
use bytes::Bytes;
use reqwest::Body;
use reqwest::header::HeaderMap;
use std::collections::BTreeMap;
use std::pin::Pin;
use time::OffsetDateTime;
use tokio::io::AsyncRead;
use tokio_stream::{Stream, StreamExt};
use tokio_util::io::{ReaderStream, StreamReader};

// region:    --- put object
/// Header字段中：
/// - content_length：由程序自动添加
/// - content_md5：`PutObjectBody::Bytes`时自动计算，`Reader`时由调用者提供
#[derive(Builder)]
pub struct PutObject<'a> {
    #[builder(start_fn)]
    pub(crate) client: &'a Client,
    /// 对于MIME不会进行合法性检查
    content_type: Option<&'a str>,
    content_md5: Option<&'a str>,
    x_bce_storage_class: Option<&'a str>,
}

pub enum PutObjectBody {
    Bytes(Vec<u8>),
    /// 流式上传，`content_length`必须和reader实际读出的字节数一致
    Reader {
        reader: Box<dyn AsyncRead + Send + Sync + Unpin>,
        content_length: u64,
    },
}

#[derive(Debug)]
pub struct PutObjectResponseHeader {
    pub e_tag: Option<String>,
}

impl PutObject<'_> {
    pub async fn send(
        &self,
        object_name: &str,
        object: PutObjectBody,
    ) -> Result<PutObjectResponseHeader, Error> {
        validate_object_name(object_name)?;

        let client = self.client;
        let (canonical_uri, request_url) = client.request_url(Some(object_name))?;

        let mut req_header_map = BTreeMap::new();
        if let Some(s) = self.content_type {
            req_header_map.insert("content-type".to_owned(), s.to_owned());
        }
        if let Some(s) = self.x_bce_storage_class {
            req_header_map.insert("x-bce-storage-class".to_owned(), s.to_owned());
        }
        match &object {
            PutObjectBody::Bytes(bytes) => {
                req_header_map.insert("content-md5".to_owned(), get_content_md5(bytes));
                req_header_map.insert("content-length".to_owned(), bytes.len().to_string());
            }
            PutObjectBody::Reader { content_length, .. } => {
                if let Some(md5) = self.content_md5 {
                    req_header_map.insert("content-md5".to_owned(), md5.to_owned());
                }
                req_header_map.insert("content-length".to_owned(), content_length.to_string());
            }
        }

        let header_map = get_request_header(
            client,
            req_header_map,
            &canonical_uri,
            &request_url,
            HTTPVerb::Put,
        )
        .await?;

        let data = match object {
            PutObjectBody::Bytes(bytes) => Body::from(bytes),
            PutObjectBody::Reader { reader, .. } => Body::wrap_stream(ReaderStream::new(reader)),
        };

        let resp = client
            .http_client
            .put(request_url)
            .headers(header_map)
            .body(data)
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(into_error(resp, object_name).await);
        }

        let e_tag = resp
            .headers()
            .get("etag")
            .and_then(|v| v.to_str().ok())
            .map(|s| s.trim_matches('"').to_owned());
        Ok(PutObjectResponseHeader { e_tag })
    }
}
// endregion: --- put object

// region:    --- object meta
#[derive(Debug, Clone)]
pub struct ObjectMeta {
    pub content_length: u64,
    pub last_modified: OffsetDateTime,
    pub e_tag: Option<String>,
    pub content_type: Option<String>,
}

impl ObjectMeta {
    // `Content-Length`和`Last-Modified`必须存在，其它可选
    pub(crate) fn from_headers(header: &HeaderMap) -> Result<Self, Error> {
        fn get<'h>(header: &'h HeaderMap, name: &str) -> Option<&'h str> {
            header.get(name).and_then(|v| v.to_str().ok())
        }

        let content_length = get(header, "content-length")
            .and_then(|s| s.parse::<u64>().ok())
            .ok_or_else(|| Error::Common("missing or invalid Content-Length".to_owned()))?;
        let last_modified = get(header, "last-modified")
            .and_then(parse_gmt)
            .ok_or_else(|| Error::Common("missing or invalid Last-Modified".to_owned()))?;

        Ok(Self {
            content_length,
            last_modified,
            e_tag: get(header, "etag").map(|s| s.trim_matches('"').to_owned()),
            content_type: get(header, "content-type").map(str::to_owned),
        })
    }
}
// endregion: --- object meta

type BytesStream = Pin<Box<dyn Stream<Item = std::io::Result<Bytes>> + Send>>;

impl Client {
    pub fn put_object(&self) -> PutObjectBuilder<'_> {
        PutObject::builder(self)
    }

    async fn get_response(&self, object_name: &str) -> Result<reqwest::Response, Error> {
        validate_object_name(object_name)?;

        let (canonical_uri, request_url) = self.request_url(Some(object_name))?;
        let header_map = get_request_header(
            self,
            BTreeMap::new(),
            &canonical_uri,
            &request_url,
            HTTPVerb::Get,
        )
        .await?;

        let resp = self
            .http_client
            .get(request_url)
            .headers(header_map)
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(into_error(resp, object_name).await);
        }
        Ok(resp)
    }

    /// 返回object内容的reader，读取过程中的网络错误会以`std::io::Error`的形式返回
    pub async fn get_object(
        &self,
        object_name: &str,
    ) -> Result<(StreamReader<BytesStream, Bytes>, ObjectMeta), Error> {
        let resp = self.get_response(object_name).await?;
        let meta = ObjectMeta::from_headers(resp.headers())?;
        let stream: BytesStream = Box::pin(
            resp.bytes_stream()
                .map(|item| item.map_err(std::io::Error::other)),
        );
        Ok((StreamReader::new(stream), meta))
    }

    pub async fn get_object_bytes(&self, object_name: &str) -> Result<(Bytes, ObjectMeta), Error> {
        let resp = self.get_response(object_name).await?;
        let meta = ObjectMeta::from_headers(resp.headers())?;
        let data = resp.bytes().await?;
        Ok((data, meta))
    }

    /// object不存在时返回[`Error::NotFound`]
    pub async fn head_object(&self, object_name: &str) -> Result<ObjectMeta, Error> {
        validate_object_name(object_name)?;

        let (canonical_uri, request_url) = self.request_url(Some(object_name))?;
        let header_map = get_request_header(
            self,
            BTreeMap::new(),
            &canonical_uri,
            &request_url,
            HTTPVerb::Head,
        )
        .await?;

        let resp = self
            .http_client
            .head(request_url)
            .headers(header_map)
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(into_error(resp, object_name).await);
        }

        ObjectMeta::from_headers(resp.headers())
    }

    /// object不存在时返回[`Error::NotFound`]
    pub async fn delete_object(&self, object_name: &str) -> Result<(), Error> {
        validate_object_name(object_name)?;

        let (canonical_uri, request_url) = self.request_url(Some(object_name))?;
        let header_map = get_request_header(
            self,
            BTreeMap::new(),
            &canonical_uri,
            &request_url,
            HTTPVerb::Delete,
        )
        .await?;

        let resp = self
            .http_client
            .delete(request_url)
            .headers(header_map)
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(into_error(resp, object_name).await);
        }
        Ok(())
    }
}
