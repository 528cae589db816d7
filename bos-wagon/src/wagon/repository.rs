use crate::wagon::Error;
use percent_encoding::percent_decode_str;
use url::Url;

/// 构建工具配置的远程仓库，url形如`bos://<endpoint>/<bucket>/<base directory>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Repository {
    id: String,
    url: String,
    host: String,
    base_directory: String,
}

impl Repository {
    pub fn new(id: impl Into<String>, url: &str) -> Result<Self, Error> {
        let parsed =
            Url::parse(url).map_err(|e| Error::Configuration(format!("invalid url `{url}`: {e}")))?;
        let host = parsed
            .host_str()
            .ok_or_else(|| Error::Configuration(format!("url `{url}` has no endpoint host")))?;
        let host = match parsed.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_owned(),
        };

        let base_directory = percent_decode_str(parsed.path())
            .decode_utf8()
            .map_err(|e| Error::Configuration(format!("url `{url}` has an invalid path: {e}")))?
            .into_owned();

        Ok(Self {
            id: id.into(),
            url: url.to_owned(),
            host,
            base_directory,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// bos的endpoint
    pub fn host(&self) -> &str {
        &self.host
    }

    /// url解码后的path部分，即`/<bucket>/<base directory>`
    pub fn base_directory(&self) -> &str {
        &self.base_directory
    }

    /// 把path拆成`(bucket, base directory)`
    ///
    /// base directory可以有多级，但bucket和base directory都不能为空
    pub fn bucket_and_base(&self) -> Result<(String, String), Error> {
        let path = self.base_directory.trim_end_matches('/');
        let mut parts = path.splitn(3, '/');
        let (Some(""), Some(bucket), Some(base)) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(Error::Configuration(format!(
                "repository path `{}` must look like /<bucket>/<base directory>",
                self.base_directory
            )));
        };
        if bucket.is_empty() {
            return Err(Error::Configuration(format!(
                "repository path `{}` has an empty bucket",
                self.base_directory
            )));
        }
        if base.trim_matches('/').is_empty() {
            return Err(Error::Configuration(format!(
                "repository path `{}` has an empty base directory",
                self.base_directory
            )));
        }
        Ok((bucket.to_owned(), base.to_owned()))
    }
}

/// 认证信息：username为AK，password为SK
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthenticationInfo {
    pub username: Option<String>,
    pub password: Option<String>,
}

impl AuthenticationInfo {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: Some(username.into()),
            password: Some(password.into()),
        }
    }
}
