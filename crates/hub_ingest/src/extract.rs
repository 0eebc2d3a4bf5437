use std::collections::HashSet;

use regex::Regex;
use std::sync::OnceLock;

fn host_port_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\b(?:\d{1,3}\.){3}\d{1,3}:\d{1,5}\b").expect("static regex is valid")
    })
}

/// Scheme to prepend to a bare `host:port` token, inferred from the scrape
/// source's own URL (§4.3 step 3).
fn scheme_for_source(source_url: &str) -> &'static str {
    if source_url.contains("socks5") {
        "socks5://"
    } else {
        "http://"
    }
}

/// Extracts every `ddd.ddd.ddd.ddd:port` substring from `body`, deduplicated,
/// prefixed with the scheme inferred from `source_url`.
pub fn extract_upstreams(body: &str, source_url: &str) -> Vec<String> {
    let scheme = scheme_for_source(source_url);
    prefix_tokens(body, scheme)
}

/// Extracts every `ddd.ddd.ddd.ddd:port` substring from `text`, deduplicated,
/// prefixed with an explicitly chosen `scheme` (admin "import upstreams").
pub fn extract_with_scheme(text: &str, scheme: &str) -> Vec<String> {
    prefix_tokens(text, scheme)
}

fn prefix_tokens(body: &str, scheme: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for m in host_port_re().find_iter(body) {
        let token = m.as_str();
        if seen.insert(token) {
            out.push(format!("{scheme}{token}"));
        }
    }
    out
}
