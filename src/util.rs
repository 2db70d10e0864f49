/// Hub identifiers are short regional labels such as `us1`, `us2`, `ca3`,
/// `eu1`. The live set is owned by the server, so only the shape is
/// checked: lowercase ASCII alphanumeric, starting with a letter.
pub(crate) fn is_valid_hub(hub: &str) -> bool {
    let mut chars = hub.chars();
    match chars.next() {
        Some(c) if c.is_ascii_lowercase() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
}

pub(crate) fn hub_base_url(hub: &str) -> String {
    format!("https://{hub}.vena.io/api/public/v1")
}

pub(crate) fn urljoin(base: &str, path: &str) -> String {
    if path.starts_with("http://") || path.starts_with("https://") {
        return path.to_string();
    }
    let base = base.trim_end_matches('/');
    if path.starts_with('/') {
        format!("{base}{path}")
    } else {
        format!("{base}/{path}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hub_shape_validation() {
        assert!(is_valid_hub("us1"));
        assert!(is_valid_hub("ca3"));
        assert!(is_valid_hub("eu1"));
        assert!(is_valid_hub("us"));

        assert!(!is_valid_hub(""));
        assert!(!is_valid_hub("1us"));
        assert!(!is_valid_hub("US1"));
        assert!(!is_valid_hub("us1.evil.example"));
        assert!(!is_valid_hub("us1/path"));
    }

    #[test]
    fn base_url_derivation() {
        assert_eq!(hub_base_url("us1"), "https://us1.vena.io/api/public/v1");
    }

    #[test]
    fn urljoin_handles_absolute_and_relative() {
        assert_eq!(urljoin("https://a/b/", "c"), "https://a/b/c");
        assert_eq!(urljoin("https://a/b", "/c"), "https://a/b/c");
        assert_eq!(urljoin("https://a/b", "https://x/y"), "https://x/y");
    }
}
