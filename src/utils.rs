use url::form_urlencoded;
use url::percent_encoding::{utf8_percent_encode, EncodeSet, DEFAULT_ENCODE_SET};

///The characters to escape in a URL path. Slashes are kept as they are
///unless `slash` is set.
#[derive(Clone, Copy)]
struct PathEncodeSet {
    slash: bool,
}

impl EncodeSet for PathEncodeSet {
    fn contains(&self, byte: u8) -> bool {
        DEFAULT_ENCODE_SET.contains(byte) || byte == b'%' || byte == b'|' || (self.slash && byte == b'/')
    }
}

///Percent encode a single path segment, including any slashes.
pub fn quote_segment(source: &str) -> String {
    utf8_percent_encode(source, PathEncodeSet { slash: true }).collect()
}

///Percent encode a path, but keep the slashes.
pub fn quote_path(source: &str) -> String {
    utf8_percent_encode(source, PathEncodeSet { slash: false }).collect()
}

///Encode `key=value` pairs as a query string, without the leading `?`.
pub fn encode_query<'a, I: IntoIterator<Item = (&'a str, String)>>(pairs: I) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (key, value) in pairs {
        serializer.append_pair(key, &value);
    }
    serializer.finish()
}

///Make sure a script name starts and ends with a slash.
pub fn normalize_script_name(script_name: &str) -> String {
    let trimmed = script_name.trim_matches('/');
    if trimmed.is_empty() {
        "/".to_owned()
    } else {
        format!("/{}/", trimmed)
    }
}

///Remove an eventual port from a host.
pub fn strip_port(host: &str) -> &str {
    if host.ends_with(']') {
        return host;
    }

    match host.rfind(':') {
        Some(index) if host[index + 1..].bytes().all(|b| b.is_ascii_digit()) => &host[..index],
        _ => host
    }
}

#[cfg(test)]
mod test {
    use super::{quote_segment, quote_path, encode_query, normalize_script_name, strip_port};

    #[test]
    fn quoting() {
        assert_eq!(quote_segment("a b/c"), "a%20b%2Fc");
        assert_eq!(quote_path("a b/c"), "a%20b/c");
        assert_eq!(quote_path("100%"), "100%25");
        assert_eq!(quote_segment("päth"), "p%C3%A4th");
    }

    #[test]
    fn query_strings() {
        let query = encode_query(vec![("q", "a b".to_owned()), ("page", "2".to_owned())]);
        assert_eq!(query, "q=a+b&page=2");
    }

    #[test]
    fn script_names() {
        assert_eq!(normalize_script_name(""), "/");
        assert_eq!(normalize_script_name("/"), "/");
        assert_eq!(normalize_script_name("/app"), "/app/");
        assert_eq!(normalize_script_name("app/"), "/app/");
    }

    #[test]
    fn ports() {
        assert_eq!(strip_port("example.com:8080"), "example.com");
        assert_eq!(strip_port("example.com"), "example.com");
        assert_eq!(strip_port("[::1]"), "[::1]");
    }
}
