//! bos sdk
//!
//! 百度智能云对象存储BOS文档：<https://cloud.baidu.com/doc/BOS/index.html>
//!
//! 只实现了wagon需要用到的少量API：put/get/head/delete object，list objects。
//! 所有请求使用path-style的url：`https://{endpoint}/{bucket}/{object}`，签名放在`Authorization`请求头中。

pub mod bucket;
pub mod object;

mod error;
pub use error::Error;

pub(crate) mod sign;
pub(crate) mod utils;

use crate::credentials::CredentialsProvider;
use bon::bon;
use bos_wagon_common::helper::uri_encode;
use std::sync::Arc;
use url::Url;

pub struct Client {
    credentials_provider: Arc<dyn CredentialsProvider>,
    // 带scheme，不以`/`结尾，如：https://bj.bcebos.com
    endpoint: String,
    bucket: String,
    http_client: reqwest::Client,
}

/// 创建bos客户端
#[bon]
impl Client {
    /// - `endpoint`：<https://cloud.baidu.com/doc/BOS/s/xjwvyq9l4>，没有scheme时默认使用`https`
    /// - `http_client`：不传则使用默认配置的`reqwest::Client`
    #[builder(on(String, into))]
    pub fn new(
        credentials_provider: Arc<dyn CredentialsProvider>,
        endpoint: String,
        bucket: String,
        http_client: Option<reqwest::Client>,
    ) -> Self {
        let endpoint = if endpoint.contains("://") {
            endpoint.trim_end_matches('/').to_owned()
        } else {
            format!("https://{}", endpoint.trim_end_matches('/'))
        };
        Self {
            credentials_provider,
            endpoint,
            bucket,
            http_client: http_client.unwrap_or_default(),
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// 返回(CanonicalURI, 请求url)；`object_name`为`None`时为bucket级别的请求
    pub(crate) fn request_url(&self, object_name: Option<&str>) -> Result<(String, Url), Error> {
        let mut canonical_uri = format!("/{}", uri_encode(&self.bucket, false));
        if let Some(name) = object_name {
            canonical_uri.push('/');
            canonical_uri.push_str(&uri_encode(name, true));
        }
        let url = Url::parse(&format!("{}{}", self.endpoint, canonical_uri))
            .map_err(|e| Error::Common(format!("invalid request url: {}", e)))?;
        Ok((canonical_uri, url))
    }
}
