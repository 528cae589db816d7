use bos_wagon_common::helper::{hmac_sha256_hex, iso8601_seconds, uri_encode};
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use time::OffsetDateTime;
// 签名文档：https://cloud.baidu.com/doc/Reference/s/njwvz1yfu

// 签名有效期，单位秒
pub(crate) const EXPIRATION_IN_SECONDS: u32 = 1800;

pub(crate) enum HTTPVerb {
    Get,
    Put,
    Delete,
    Head,
}
impl Display for HTTPVerb {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            HTTPVerb::Get => write!(f, "GET"),
            HTTPVerb::Put => write!(f, "PUT"),
            HTTPVerb::Delete => write!(f, "DELETE"),
            HTTPVerb::Head => write!(f, "HEAD"),
        }
    }
}

// 默认参与签名的header：host，content-length，content-type，content-md5以及所有x-bce-*
fn should_sign(header_name: &str) -> bool {
    matches!(
        header_name,
        "host" | "content-length" | "content-type" | "content-md5"
    ) || header_name.starts_with("x-bce-")
}

// 返回(CanonicalHeaders, SignedHeaders)
// 传入的header名称要求已经是小写的，由调用者保证
fn get_canonical_headers(headers: &BTreeMap<String, String>) -> (String, String) {
    let mut canonical = Vec::new();
    let mut signed = Vec::new();
    for (k, v) in headers {
        let v = v.trim();
        if !should_sign(k) || v.is_empty() {
            continue;
        }
        canonical.push(format!("{}:{}", uri_encode(k, false), uri_encode(v, false)));
        signed.push(k.as_str());
    }
    canonical.sort();
    (canonical.join("\n"), signed.join(";"))
}

fn get_canonical_query_string(query: &BTreeMap<String, String>) -> String {
    let mut pairs = query
        .iter()
        .filter(|(k, _)| !k.eq_ignore_ascii_case("authorization"))
        .map(|(k, v)| format!("{}={}", uri_encode(k, false), uri_encode(v, false)))
        .collect::<Vec<_>>();
    pairs.sort();
    pairs.join("&")
}

fn get_canonical_request(
    http_verb: &HTTPVerb,
    canonical_uri: &str,
    query: &BTreeMap<String, String>,
    canonical_headers: &str,
) -> String {
    format!(
        "{}\n{}\n{}\n{}",
        http_verb,
        canonical_uri,
        get_canonical_query_string(query),
        canonical_headers
    )
}

pub(crate) struct SignParams<'a> {
    pub http_verb: HTTPVerb,
    // 已经编码过的path，如："/bucket/object"
    pub canonical_uri: &'a str,
    pub query: &'a BTreeMap<String, String>,
    pub headers: &'a BTreeMap<String, String>,
    pub date_time: &'a OffsetDateTime,
}

/// 生成`Authorization`头的值：
/// `bce-auth-v1/{accessKeyId}/{timestamp}/{expirationPeriodInSeconds}/{signedHeaders}/{signature}`
pub(crate) fn sign(
    access_key_id: &str,
    secret_access_key: &str,
    params: SignParams<'_>,
) -> Result<String, bos_wagon_common::Error> {
    let timestamp = iso8601_seconds(params.date_time)?;
    let auth_string_prefix = format!(
        "bce-auth-v1/{}/{}/{}",
        access_key_id, timestamp, EXPIRATION_IN_SECONDS
    );
    let signing_key = hmac_sha256_hex(secret_access_key.as_bytes(), &auth_string_prefix);

    let (canonical_headers, signed_headers) = get_canonical_headers(params.headers);
    let canonical_request = get_canonical_request(
        &params.http_verb,
        params.canonical_uri,
        params.query,
        &canonical_headers,
    );
    let signature = hmac_sha256_hex(signing_key.as_bytes(), &canonical_request);

    Ok(format!(
        "{}/{}/{}",
        auth_string_prefix, signed_headers, signature
    ))
}
