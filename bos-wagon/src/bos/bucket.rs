//! 只实现了ListObjects
//!
//! [API文档](https://cloud.baidu.com/doc/BOS/s/Ekc5rjmgp)

use super::Client;
use super::sign::HTTPVerb;
use super::utils::get_request_header;
use crate::bos::Error;
use bon::Builder;
use bos_wagon_common::helper::parse_json_response;
use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, serde_as};
use std::collections::{BTreeMap, HashMap};

// region:    --- list objects
#[serde_as]
#[serde_with::skip_serializing_none]
#[derive(Builder, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListObjects<'a> {
    #[builder(start_fn)]
    #[serde(skip_serializing)]
    pub(crate) client: &'a Client,
    delimiter: Option<&'a str>,
    marker: Option<&'a str>,
    /// 默认为1000，最大为1000
    #[serde_as(as = "Option<DisplayFromStr>")]
    max_keys: Option<u16>,
    prefix: Option<&'a str>,
}

/// 如果属性值为`None`，表示返回的json中没有该字段
#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ListObjectsResult {
    pub name: String,
    pub prefix: Option<String>,
    pub delimiter: Option<String>,
    pub marker: Option<String>,
    pub max_keys: Option<u32>,
    pub is_truncated: bool,
    pub next_marker: Option<String>,
    #[serde(default)]
    pub contents: Vec<Content>,
    #[serde(default)]
    pub common_prefixes: Vec<CommonPrefix>,
}

impl ListObjectsResult {
    /// 下一页请求使用的marker；没有下一页时返回`None`
    ///
    /// `isTruncated`为`true`但没有返回`nextMarker`时，使用本页最后一个key
    pub fn continuation_marker(&self) -> Option<&str> {
        if !self.is_truncated {
            return None;
        }
        self.next_marker
            .as_deref()
            .or_else(|| self.contents.last().map(|c| c.key.as_str()))
    }
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct CommonPrefix {
    pub prefix: String,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct Content {
    pub key: String,
    pub last_modified: String,
    pub e_tag: Option<String>,
    pub size: u64,
    pub storage_class: Option<String>,
    pub owner: Option<Owner>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct Owner {
    pub id: String,
    pub display_name: String,
}

impl ListObjects<'_> {
    pub async fn send(&self) -> Result<ListObjectsResult, Error> {
        // 构建url的query部分
        let query_map: HashMap<String, String> = serde_json::to_value(self)
            .and_then(serde_json::from_value)
            .map_err(|e| Error::Common(format!("serialize query failed: {}", e)))?;

        let client = self.client;
        let (canonical_uri, mut request_url) = client.request_url(None)?;
        {
            let mut pairs = request_url.query_pairs_mut();
            for (k, v) in query_map.iter() {
                pairs.append_pair(k, v);
            }
        }
        // 没有query的时候不能留下一个空的`?`
        if query_map.is_empty() {
            request_url.set_query(None);
        }

        let header = get_request_header(
            client,
            BTreeMap::new(),
            &canonical_uri,
            &request_url,
            HTTPVerb::Get,
        )
        .await?;

        let resp = client
            .http_client
            .get(request_url)
            .headers(header)
            .send()
            .await?;

        let res = parse_json_response(resp).await?;
        Ok(res)
    }
}
// endregion: --- list objects

impl Client {
    pub fn list_objects(&self) -> ListObjectsBuilder<'_> {
        ListObjects::builder(self)
    }
}
