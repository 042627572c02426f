use std::path::Path;

use regex::Regex;

use crate::options::ResolverOptions;

/// How a decoded uri should be resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// Resolved against the candidate base paths at the reference's position.
    Relative,
    /// Root-relative or OS-absolute, resolved against the configured root.
    Absolute,
    /// Left untouched.
    Ignored,
}

fn non_request_patterns() -> &'static NonRequestPatterns {
    use std::sync::OnceLock;

    static PATTERNS: OnceLock<NonRequestPatterns> = OnceLock::new();
    PATTERNS.get_or_init(|| NonRequestPatterns {
        scheme: Regex::new(r"(?i)^[a-z][a-z0-9+.\-]*:").expect("invalid scheme regex"),
        windows_absolute: Regex::new(r"^[a-zA-Z]:[\\/]").expect("invalid windows path regex"),
        template: Regex::new(r"^[{}\[\]#*;,'§$%&(=?`´^°<>]").expect("invalid template regex"),
    })
}

struct NonRequestPatterns {
    scheme: Regex,
    windows_absolute: Regex,
    template: Regex,
}

/// Determine whether `uri` is a request for a local resource.
///
/// Scheme-qualified urls (`http:`, `data:`, `mailto:`), protocol-relative urls and template
/// placeholders never are. Root-relative paths only count when `allow_root_relative` is set.
pub fn is_url_request(uri: &str, allow_root_relative: bool) -> bool {
    let patterns = non_request_patterns();

    if patterns.scheme.is_match(uri) && !patterns.windows_absolute.is_match(uri) {
        return false;
    }
    if uri.starts_with("//") {
        return false;
    }
    if patterns.template.is_match(uri) {
        return false;
    }
    allow_root_relative || !uri.starts_with('/')
}

/// Absolute on the host platform, or root-relative in url terms.
pub fn is_absolute(uri: &str) -> bool {
    uri.starts_with('/') || Path::new(uri).is_absolute()
}

/// Classify a decoded uri.
pub fn classify(uri: &str, options: &ResolverOptions) -> Classification {
    if uri.trim().is_empty() || uri.starts_with('~') {
        return Classification::Ignored;
    }

    if !is_absolute(uri) {
        return if is_url_request(uri, false) {
            Classification::Relative
        } else {
            Classification::Ignored
        };
    }

    if options.effective_root().is_some() && is_url_request(uri, true) {
        Classification::Absolute
    } else {
        Classification::Ignored
    }
}
