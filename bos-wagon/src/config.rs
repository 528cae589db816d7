use bon::Builder;
use serde::Deserialize;

const DEFAULT_MAX_LIST_PAGES: usize = 10_000;
const DEFAULT_LIST_PAGE_SIZE: u16 = 1000;

fn default_max_list_pages() -> usize {
    DEFAULT_MAX_LIST_PAGES
}

fn default_list_page_size() -> u16 {
    DEFAULT_LIST_PAGE_SIZE
}

fn default_scheme() -> String {
    "https".to_owned()
}

/// wagon的配置，toml里没写的字段使用默认值
///
/// ```
/// use bos_wagon::config::WagonConfig;
///
/// let config = WagonConfig::from_toml_str("strict_get = true").unwrap();
/// assert!(config.strict_get);
/// assert_eq!(config.list_page_size, 1000);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Builder)]
pub struct WagonConfig {
    /// 一次list最多拉取的页数，超过后报错
    #[serde(default = "default_max_list_pages")]
    #[builder(default = DEFAULT_MAX_LIST_PAGES)]
    pub max_list_pages: usize,
    /// 每页的maxKeys，连接bos时限制在1..=1000
    #[serde(default = "default_list_page_size")]
    #[builder(default = DEFAULT_LIST_PAGE_SIZE)]
    pub list_page_size: u16,
    /// 下载失败时返回错误，默认只记录日志
    #[serde(default)]
    #[builder(default)]
    pub strict_get: bool,
    pub timeout_secs: Option<u64>,
    /// endpoint没有带scheme时使用
    #[serde(default = "default_scheme")]
    #[builder(default = default_scheme(), into)]
    pub scheme: String,
}

impl Default for WagonConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl WagonConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(s)
    }
}
