use std::path::{Path, PathBuf};

use regex::Regex;

/// Build the module request substituted for a resolved reference.
///
/// The resolved path is made relative to `directory` and always uses forward slashes, since a
/// backslash is not legal inside the request string regardless of the platform that resolved it.
/// Relative inputs are taken relative to the current directory. Returns `None` when no relative
/// path exists between the two (e.g. different drive prefixes).
pub fn make_request_token(directory: &Path, resolved: &Path, query: &str) -> Option<String> {
    let relative = pathdiff::diff_paths(absolutize(resolved), absolutize(directory))?;
    let relative = relative.to_string_lossy().replace('\\', "/");
    Some(url_to_request(&format!("{relative}{query}")))
}

/// Anchor a path at the current directory, leaving absolute paths untouched.
pub(crate) fn absolutize(path: &Path) -> PathBuf {
    if path.as_os_str().is_empty() {
        return std::env::current_dir().unwrap_or_default();
    }
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

fn module_request_prefix() -> &'static Regex {
    use std::sync::OnceLock;

    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[^?]*~").expect("invalid module request regex"))
}

fn native_windows_path() -> &'static Regex {
    use std::sync::OnceLock;

    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[a-zA-Z]:\\").expect("invalid windows path regex"))
}

/// Encode a relative path (plus query) as a request the bundler resolves relative to the file.
///
/// Paths that do not already start with `./` or `../` are prefixed with `./`, and a `~` ahead
/// of the query marks the remainder as a module request.
pub fn url_to_request(url: &str) -> String {
    if url.is_empty() {
        return String::new();
    }

    let request = if native_windows_path().is_match(url)
        || url.starts_with("./")
        || url.starts_with("../")
    {
        url.to_string()
    } else {
        format!("./{url}")
    };

    module_request_prefix().replace(&request, "").into_owned()
}
