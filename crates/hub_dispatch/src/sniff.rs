use std::sync::OnceLock;

use regex::Regex;

fn status_code_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"HTTP/1\.[01] (\d{3})").expect("static regex is valid"))
}

/// *Status-code hit* (§4.5 step 6): `R` contains an `HTTP/1.x NNN` status
/// line whose code is in `switch_status_codes`.
pub fn status_code_hit(buf: &[u8], switch_status_codes: &[u16]) -> bool {
    let text = String::from_utf8_lossy(buf);
    status_code_re()
        .captures(&text)
        .and_then(|caps| caps.get(1)?.as_str().parse::<u16>().ok())
        .is_some_and(|code| switch_status_codes.contains(&code))
}

/// *Keyword hit* (§4.5 step 6): any configured keyword appears as a UTF-8
/// byte substring of `R`.
pub fn keyword_hit(buf: &[u8], switch_keywords: &[String]) -> bool {
    let text = String::from_utf8_lossy(buf);
    switch_keywords.iter().any(|kw| text.contains(kw.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_code_hit_matches_configured_code() {
        let buf = b"HTTP/1.1 403 Forbidden\r\n\r\n";
        assert!(status_code_hit(buf, &[403, 429]));
        assert!(!status_code_hit(buf, &[500]));
    }

    #[test]
    fn status_code_hit_ignores_http10_with_unconfigured_code() {
        let buf = b"HTTP/1.0 500 Internal Server Error\r\n\r\n";
        assert!(!status_code_hit(buf, &[403, 429, 502, 503, 504]));
    }

    #[test]
    fn keyword_hit_matches_utf8_substring() {
        let buf = "<html>请完成验证码</html>".as_bytes();
        assert!(keyword_hit(buf, &["验证码".to_string()]));
        assert!(!keyword_hit(buf, &["CAPTCHA".to_string()]));
    }

    #[test]
    fn no_hit_on_plain_200() {
        let buf = b"HTTP/1.1 200 OK\r\nContent-Length: 2\r\n\r\nOK";
        assert!(!status_code_hit(buf, &[403, 429, 502, 503, 504]));
        assert!(!keyword_hit(
            buf,
            &["Forbidden".to_string(), "CAPTCHA".to_string()]
        ));
    }
}
