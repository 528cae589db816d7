use crate::Error;
use hmac::{Hmac, Mac};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::Deserialize;
use sha2::Sha256;
use std::collections::BTreeMap;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc2822;
use time::format_description::well_known::iso8601::{
    Config, EncodedConfig, Iso8601, TimePrecision,
};

// RFC 3986 unreserved: A-Z a-z 0-9 - . _ ~
const URI_UNRESERVED: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

const URI_UNRESERVED_WITH_SLASH: &AsciiSet = &URI_UNRESERVED.remove(b'/');

/// 按照RFC 3986编码，`keep_slash`为`true`时`/`不编码（用于path）
pub fn uri_encode(s: &str, keep_slash: bool) -> String {
    let set = if keep_slash {
        URI_UNRESERVED_WITH_SLASH
    } else {
        URI_UNRESERVED
    };
    utf8_percent_encode(s, set).to_string()
}

/// 输出格式: YYYY-MM-DDThh:mm:ssZ
///
/// eg: 2025-11-13T13:31:09Z
pub fn iso8601_seconds(date_time: &OffsetDateTime) -> Result<String, Error> {
    const ENCODED_CONFIG: EncodedConfig = Config::DEFAULT
        .set_time_precision(TimePrecision::Second {
            decimal_digits: None,
        })
        .encode();

    date_time
        .to_offset(time::UtcOffset::UTC)
        .format(&Iso8601::<ENCODED_CONFIG>)
        .map_err(|e| Error::Common(format!("format date time failed: {}", e)))
}

/// 解析http header中的时间，如`Last-Modified`
///
/// 输入格式: Day, DD Mon YYYY hh:mm:ss GMT
pub fn parse_gmt(s: &str) -> Option<OffsetDateTime> {
    // `GMT`换成数字时区再按Rfc2822解析
    let normalized = match s.trim().strip_suffix("GMT") {
        Some(rest) => format!("{}+0000", rest),
        None => s.trim().to_owned(),
    };
    OffsetDateTime::parse(&normalized, &Rfc2822).ok()
}

pub fn into_header_map(map: BTreeMap<String, String>) -> Result<HeaderMap, Error> {
    map.iter()
        .map(|(k, v)| {
            let name = HeaderName::from_bytes(k.as_bytes())
                .map_err(|e| Error::Common(format!("invalid header name {}: {}", k, e)))?;
            let value = HeaderValue::from_str(v)
                .map_err(|e| Error::Common(format!("invalid header value for {}: {}", k, e)))?;
            Ok((name, value))
        })
        .collect()
}

pub fn hmac_sha256_hex(secret: &[u8], str_to_sign: &str) -> String {
    type HmacSha256 = Hmac<Sha256>;
    // hmac接受任意长度的key，不会失败
    let mut mac = match HmacSha256::new_from_slice(secret) {
        Ok(mac) => mac,
        Err(_) => unreachable!("hmac accepts keys of any length"),
    };
    mac.update(str_to_sign.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

// bos错误响应体：{"code":"NoSuchKey","message":"...","requestId":"..."}
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody {
    code: String,
    message: String,
}

pub async fn into_request_failed_error(resp: reqwest::Response) -> Error {
    let status = resp.status();
    let body = resp.text().await;
    match body {
        Ok(text) => {
            // HEAD请求没有响应体，code和message留空
            let (code, message) = match serde_json::from_str::<ErrorBody>(&text) {
                Ok(b) => (b.code, b.message),
                Err(_) => (String::new(), text),
            };
            Error::RequestAPIFailed {
                status: status.to_string(),
                code,
                message,
            }
        }
        Err(e) => Error::Reqwest(e),
    }
}

pub async fn parse_json_response<T: serde::de::DeserializeOwned>(
    resp: reqwest::Response,
) -> Result<T, Error> {
    let status = resp.status();

    if !status.is_success() {
        return Err(into_request_failed_error(resp).await);
    }

    let text = resp.text().await?;
    let data = serde_json::from_str(&text)
        .map_err(|e| Error::Common(format!("JSON parse error: {}", e)))?;
    Ok(data)
}
