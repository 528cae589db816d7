//! 把bos返回的平铺key列表转换成带目录的文件列表
//!
//! bos没有真正的目录，构建工具却希望`get_file_list`能列出子目录，
//! 所以需要从key里推导出所有的中间目录（以`/`结尾）。

use crate::wagon::Error;
use std::collections::BTreeSet;

/// - `prefix`：已经resolve过的前缀（不带结尾的`/`），为空时不做裁剪
/// - `keys`：list的结果，每个key都必须以`prefix/`开头
///
/// 返回的列表先是所有去掉前缀后的条目（保持`keys`的顺序），然后是推导出的目录（字典序），不会重复。
pub fn project(prefix: &str, keys: &[String]) -> Result<Vec<String>, Error> {
    let mut entries = Vec::with_capacity(keys.len());
    let mut seen = BTreeSet::new();
    let mut folders = BTreeSet::new();

    for key in keys {
        let relative = strip(prefix, key)?;
        if relative.is_empty() {
            continue;
        }
        collect_folders(relative, &mut folders);
        if seen.insert(relative) {
            entries.push(relative.to_owned());
        }
    }

    entries.extend(
        folders
            .into_iter()
            .filter(|folder| !seen.contains(folder.as_str())),
    );
    Ok(entries)
}

fn strip<'a>(prefix: &str, key: &'a str) -> Result<&'a str, Error> {
    if prefix.is_empty() {
        return Ok(key);
    }
    key.strip_prefix(prefix)
        .and_then(|rest| rest.strip_prefix('/'))
        .ok_or_else(|| Error::ListingPrefixMismatch {
            prefix: prefix.to_owned(),
            key: key.to_owned(),
        })
}

// 从最后一个`/`开始往前，把每一级祖先目录都加进去："a/b/c.jar" -> "a/b/", "a/"
fn collect_folders(relative: &str, folders: &mut BTreeSet<String>) {
    let mut current = relative;
    while let Some(idx) = current.rfind('/') {
        current = &current[..idx];
        if current.is_empty() {
            break;
        }
        folders.insert(format!("{}/", current));
    }
}
