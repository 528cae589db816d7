/// 把仓库的base directory和资源路径拼成bos中的key
///
/// - 空的段和`.`段会被去掉，所以结果不会以`/`开头或结尾，也不会有连续的`/`
/// - `..`只回退同一个参数里的上一段，不会越过base directory
/// - 除此之外不做任何合法性检查，非法字符交给bos处理
///
/// ```
/// use bos_wagon::key::resolve;
///
/// assert_eq!(resolve("/repo/base", "a/b.jar"), "repo/base/a/b.jar");
/// assert_eq!(resolve("", "/a//b.jar"), "a/b.jar");
/// assert_eq!(resolve("/repo/base", "../b.jar"), "repo/base/b.jar");
/// ```
pub fn resolve(base_directory: &str, resource_path: &str) -> String {
    let mut segments = normalize(base_directory);
    segments.extend(normalize(resource_path));
    segments.join("/")
}

fn normalize(path: &str) -> Vec<&str> {
    let mut segments = Vec::new();
    for seg in path.split('/') {
        match seg {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            seg => segments.push(seg),
        }
    }
    segments
}
