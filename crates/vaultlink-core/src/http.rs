//! HTTP plumbing shared by the Vault and Consul clients

use std::time::Duration;

/// Build the user-agent string from crate version.
pub(crate) fn user_agent() -> String {
    format!("vaultlink/{}", env!("CARGO_PKG_VERSION"))
}

/// Build a pooled client with the given request timeout.
pub(crate) fn build_client(timeout_secs: u64) -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(user_agent())
        .timeout(Duration::from_secs(timeout_secs))
        .build()
}

/// Percent-encode a single URL path component.
pub(crate) fn percent_encode_component(input: &str) -> String {
    const HEX: &[u8; 16] = b"0123456789ABCDEF";
    let mut out = String::with_capacity(input.len());
    for b in input.bytes() {
        let safe = b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.' | b'~');
        if safe {
            out.push(b as char);
        } else {
            out.push('%');
            out.push(HEX[(b >> 4) as usize] as char);
            out.push(HEX[(b & 0x0F) as usize] as char);
        }
    }
    out
}

/// Percent-encode each segment of a slash-delimited path, dropping empty
/// segments from leading, trailing or doubled slashes.
pub(crate) fn encode_path(path: &str) -> String {
    path.split('/')
        .filter(|s| !s.is_empty())
        .map(percent_encode_component)
        .collect::<Vec<_>>()
        .join("/")
}
