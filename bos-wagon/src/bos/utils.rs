use crate::bos::Client;
use crate::bos::Error;
use crate::bos::sign::{HTTPVerb, SignParams, sign};
use base64::{Engine, engine::general_purpose};
use bos_wagon_common::helper::{into_header_map, into_request_failed_error, iso8601_seconds};
use md5::{Digest, Md5};
use reqwest::header::HeaderMap;
use std::collections::BTreeMap;
use std::path::Path;
use tokio::io::AsyncReadExt;
use url::Url;

pub(crate) fn get_content_md5(bytes: &[u8]) -> String {
    let mut hasher = Md5::new();
    hasher.update(bytes);
    general_purpose::STANDARD.encode(hasher.finalize())
}

// 用 buffer 读文件并计算MD5
pub(crate) async fn compute_md5_from_file(path: &Path) -> Result<String, Error> {
    let mut file = tokio::fs::File::open(path).await?;
    let mut hasher = Md5::new();
    // 放到堆上并初始化
    let mut buf = vec![0u8; 64 * 1024]; // 64KB buffer

    loop {
        let n = file.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }

    Ok(general_purpose::STANDARD.encode(hasher.finalize()))
}

/// bos的object命名规则：<https://cloud.baidu.com/doc/BOS/s/Ok1rk3xsz>
pub(crate) fn validate_object_name(name: &str) -> Result<(), Error> {
    let len = name.len();
    if len == 0 {
        return Err(Error::Common("object_name cannot be empty".to_owned()));
    }
    if len > 1024 {
        return Err(Error::Common(
            "object_name is too long, max is 1024 bytes".to_owned(),
        ));
    }
    if name.starts_with('/') {
        return Err(Error::Common("object_name cannot start with '/'".to_owned()));
    }
    if name.bytes().any(|b| b == b'\r' || b == b'\n') {
        return Err(Error::Common(
            "object_name cannot contain control characters".to_owned(),
        ));
    }
    Ok(())
}

// 404统一转换为NotFound，方便上层区分"不存在"和其它失败
pub(crate) async fn into_error(resp: reqwest::Response, object_name: &str) -> Error {
    if resp.status() == reqwest::StatusCode::NOT_FOUND {
        return Error::NotFound(object_name.to_owned());
    }
    into_request_failed_error(resp).await.into()
}

/// 构建带签名的请求头
///
/// - `req_header_map`：api自身的请求头，key需要是小写
/// - `host`、`x-bce-date`和`authorization`自动添加
pub(crate) async fn get_request_header(
    client: &Client,
    mut req_header_map: BTreeMap<String, String>,
    canonical_uri: &str,
    request_url: &Url,
    http_verb: HTTPVerb,
) -> Result<HeaderMap, Error> {
    let creds = client.credentials_provider.load().await?;

    let host = match (request_url.host_str(), request_url.port()) {
        (Some(h), Some(p)) => format!("{}:{}", h, p),
        (Some(h), None) => h.to_owned(),
        (None, _) => return Err(Error::Common("request url has no host".to_owned())),
    };
    let now = time::OffsetDateTime::now_utc();
    req_header_map.insert("host".to_owned(), host);
    req_header_map.insert("x-bce-date".to_owned(), iso8601_seconds(&now)?);

    let query = request_url
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect::<BTreeMap<_, _>>();

    let authorization = sign(
        &creds.access_key_id,
        &creds.secret_access_key,
        SignParams {
            http_verb,
            canonical_uri,
            query: &query,
            headers: &req_header_map,
            date_time: &now,
        },
    )?;
    req_header_map.insert("authorization".to_owned(), authorization);
    // reqwest会根据url自动设置host
    req_header_map.remove("host");

    Ok(into_header_map(req_header_map)?)
}
