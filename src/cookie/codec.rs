//! Cookie header parsing and Set-Cookie rewriting.

use ::cookie::Cookie;
use std::borrow::Cow;
use std::collections::BTreeMap;

/// Decoded cookies for a single request, keyed by cookie name.
pub type CookieJar = BTreeMap<String, String>;

/// Attributes appended to every Set-Cookie line on a secure connection so
/// browsers accept the cookie in a cross-site context.
pub const CROSS_SITE_ATTRIBUTES: &str = "; SameSite=None; Secure";

/// Parse a raw `Cookie` header into a jar.
///
/// Segments are separated by a semicolon followed by whitespace. Each
/// `name=value` pair is split at the first `=`, percent-decoded and trimmed.
/// A segment without `=`, with `=` as its first character or with `=` as its
/// last character is skipped.
pub fn decode(header: &str) -> CookieJar {
    let mut jar = CookieJar::new();

    for segment in segments(header) {
        let Some(crack) = segment.find('=') else {
            continue;
        };
        if crack == 0 || crack == segment.len() - 1 {
            continue;
        }

        let name = percent_decode(&segment[..crack]);
        let value = percent_decode(&segment[crack + 1..]);
        jar.insert(name.trim().to_string(), value.trim().to_string());
    }

    jar
}

/// Prepare handler cookie lines for the `Set-Cookie` header.
///
/// Lines pass through untouched unless the inbound connection is secure.
pub fn encode(lines: &[String], secure: bool) -> Vec<String> {
    if !secure {
        return lines.to_vec();
    }
    lines
        .iter()
        .map(|line| format!("{line}{CROSS_SITE_ATTRIBUTES}"))
        .collect()
}

/// Parse a cookie string supplied as a request parameter (`a=1; b=2`).
///
/// Values are taken verbatim; only surrounding whitespace is removed.
pub fn parse_pairs(raw: &str) -> CookieJar {
    raw.split(';')
        .filter_map(|pair| {
            let (name, value) = pair.split_once('=')?;
            let name = name.trim();
            if name.is_empty() {
                return None;
            }
            Some((name.to_string(), value.trim().to_string()))
        })
        .collect()
}

/// Serialize a jar into an outbound `Cookie` header value.
pub fn to_header(jar: &CookieJar) -> String {
    jar.iter()
        .map(|(name, value)| {
            format!("{}={}", urlencoding::encode(name), urlencoding::encode(value))
        })
        .collect::<Vec<_>>()
        .join("; ")
}

/// Remove the `Domain` attribute from an upstream Set-Cookie line.
///
/// Lines without a `Domain` attribute, or that do not parse as a cookie, are
/// returned unchanged. Rewritten lines use the `cookie` crate's attribute order.
pub fn strip_domain(line: &str) -> String {
    match Cookie::parse(line) {
        Ok(mut parsed) if parsed.domain().is_some() => {
            parsed.unset_domain();
            parsed.to_string()
        }
        _ => line.to_string(),
    }
}

/// Split a header on `;` followed by whitespace, dropping trailing whitespace.
fn segments(header: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut start = 0;
    let bytes = header.as_bytes();
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b';' && bytes.get(i + 1).is_some_and(u8::is_ascii_whitespace) {
            out.push(&header[start..i]);
            i += 1;
            while bytes.get(i).is_some_and(u8::is_ascii_whitespace) {
                i += 1;
            }
            start = i;
        } else {
            i += 1;
        }
    }
    out.push(header[start..].trim_end());

    out
}

fn percent_decode(raw: &str) -> Cow<'_, str> {
    urlencoding::decode(raw).unwrap_or(Cow::Borrowed(raw))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_pairs() {
        let jar = decode("MUSIC_U=abc; __csrf=def; os=pc");
        assert_eq!(jar.len(), 3);
        assert_eq!(jar["MUSIC_U"], "abc");
        assert_eq!(jar["__csrf"], "def");
        assert_eq!(jar["os"], "pc");
    }

    #[test]
    fn test_decode_last_duplicate_wins() {
        let jar = decode("a=1; b=2; a=3");
        assert_eq!(jar["a"], "3");
        assert_eq!(jar["b"], "2");
    }

    #[test]
    fn test_decode_percent_encoded() {
        let jar = decode("na%20me=va%3Blue; x=%E4%BD%A0");
        assert_eq!(jar["na me"], "va;lue");
        assert_eq!(jar["x"], "你");
    }

    #[test]
    fn test_decode_skips_malformed() {
        let jar = decode("novalue; =leading; trailing=; ok=1");
        assert_eq!(jar.len(), 1);
        assert_eq!(jar["ok"], "1");
    }

    #[test]
    fn test_decode_trailing_whitespace_and_empty() {
        assert!(decode("").is_empty());
        assert!(decode("   ").is_empty());

        let jar = decode("a=1;   b=2   ");
        assert_eq!(jar["a"], "1");
        assert_eq!(jar["b"], "2");
    }

    #[test]
    fn test_decode_semicolon_without_space_is_not_a_separator() {
        let jar = decode("a=1;b=2");
        assert_eq!(jar.len(), 1);
        assert_eq!(jar["a"], "1;b=2");
    }

    #[test]
    fn test_decode_is_case_sensitive() {
        let jar = decode("Token=a; token=b");
        assert_eq!(jar["Token"], "a");
        assert_eq!(jar["token"], "b");
    }

    #[test]
    fn test_encode_plain_passthrough() {
        let lines = vec!["a=b; Path=/".to_string(), "c=d".to_string()];
        assert_eq!(encode(&lines, false), lines);
    }

    #[test]
    fn test_encode_secure_appends_once() {
        let lines = vec!["a=b; Path=/".to_string(), "c=d".to_string()];
        let encoded = encode(&lines, true);
        assert_eq!(encoded[0], "a=b; Path=/; SameSite=None; Secure");
        assert_eq!(encoded[1], "c=d; SameSite=None; Secure");
        assert!(encode(&[], true).is_empty());
    }

    #[test]
    fn test_parse_pairs() {
        let jar = parse_pairs("MUSIC_U=abc;__csrf=x; =bad; flag");
        assert_eq!(jar.len(), 2);
        assert_eq!(jar["MUSIC_U"], "abc");
        assert_eq!(jar["__csrf"], "x");
    }

    #[test]
    fn test_to_header() {
        let mut jar = CookieJar::new();
        jar.insert("a".into(), "1".into());
        jar.insert("b c".into(), "x;y".into());
        assert_eq!(to_header(&jar), "a=1; b%20c=x%3By");
        assert_eq!(decode(&to_header(&jar)), jar);
    }

    #[test]
    fn test_strip_domain() {
        assert_eq!(
            strip_domain("MUSIC_U=abc; Max-Age=100; Domain=.music.example.com; Path=/"),
            "MUSIC_U=abc; Path=/; Max-Age=100"
        );
        assert_eq!(strip_domain("a=b; Path=/; domain=.x.com"), "a=b; Path=/");
        assert_eq!(strip_domain("s=1; HttpOnly; Domain=x.com"), "s=1; HttpOnly");
        assert_eq!(strip_domain("a=b; Path=/"), "a=b; Path=/");
    }

    #[test]
    fn test_strip_domain_matches_attribute_names_only() {
        assert_eq!(strip_domain("a=domain=x; Path=/"), "a=domain=x; Path=/");
        assert_eq!(
            strip_domain("subdomain=1; Path=/; Domain=.x.com"),
            "subdomain=1; Path=/"
        );
        assert_eq!(strip_domain("=nameless; Domain=x.com"), "=nameless; Domain=x.com");
    }
}
