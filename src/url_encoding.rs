//! Percent-encoding for the pairs of query attribute containers.

use pct_str::{PctString, URIReserved, InvalidPctString, PctStr};

/// Encode a key or value of a query pair.
pub fn url_encode(s: &str) -> String {
    PctString::encode(s.chars(), URIReserved).to_string()
}

// Owns the offending input, as `InvalidPctString<&str>` would tie
// errors to the lifetime of the string being decoded.
#[derive(Debug, thiserror::Error)]
#[error("url decoding error: {0}")]
pub struct UrlDecodingError(Box<String>);

impl From<InvalidPctString<&str>> for UrlDecodingError {
    fn from(e: InvalidPctString<&str>) -> Self {
        Self(Box::new(e.to_string()))
    }
}

pub fn url_decode(s: &str) -> Result<String, UrlDecodingError> {
    Ok(PctStr::new(s)?.decode())
}

/// Split `a=1&b=x%20y` into decoded pairs; a leading `?` is
/// ignored, a part without `=` has an empty value.
pub fn parse_query(s: &str) -> Result<Vec<(String, String)>, UrlDecodingError> {
    let s = s.strip_prefix('?').unwrap_or(s);
    s.split('&')
        .filter(|part| ! part.is_empty())
        .map(|part| {
            let (k, v) = part.split_once('=').unwrap_or((part, ""));
            Ok((url_decode(k)?, url_decode(v)?))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn t_encode() {
        assert_eq!(url_encode("abc"), "abc");
        let e = url_encode("a&c=d");
        assert!(! e.contains('&'));
        assert!(! e.contains('='));
        assert_eq!(url_decode(&e).unwrap(), "a&c=d");
        assert!(url_decode("%zz").is_err());
    }

    #[test]
    fn t_parse_query() {
        let q = parse_query("?a=1&b=x%20y&flag").unwrap();
        assert_eq!(q, vec![("a".into(), "1".into()),
                           ("b".into(), "x y".into()),
                           ("flag".into(), "".into())]);
        assert!(parse_query("a=%zz").is_err());
    }
}
