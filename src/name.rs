//! Host-based image names.
//!
//! A host-based image name is `host/path[#fragment]`, where `host` is an
//! RFC 3986 IP literal, IPv4 address, or registered name. The fragment,
//! when present, selects a single entry from whatever the ref-engine finds
//! for `host/path`.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

const UNRESERVED_NO_HYPHEN: &str = "a-zA-Z0-9._~";
const SUB_DELIMS: &str = "!$&'()*+,;=";
const DEC_OCTET: &str = "([0-9]|[1-9][0-9]|1[0-9][0-9]|2[0-4][0-9]|25[0-5])";
const HEX_DIG: &str = "[0-9a-fA-F]";

static HOST_BASED_IMAGE_NAME: LazyLock<Regex> = LazyLock::new(|| {
    let pchar = format!("{UNRESERVED_NO_HYPHEN}%{SUB_DELIMS}:@-");
    let h16 = format!("{HEX_DIG}{{1,4}}");
    let ipv4 = format!(r"{DEC_OCTET}(\.{DEC_OCTET}){{3}}");
    let ls32 = format!("(({h16}:{h16})|{ipv4})");
    let ipv6 = [
        format!("(({h16}:){{6}}{ls32})"),
        format!("(::({h16}:){{5}}{ls32})"),
        format!("(({h16})?::({h16}:){{4}}{ls32})"),
        format!("((({h16}:){{0,1}}{h16})?::({h16}:){{3}}{ls32})"),
        format!("((({h16}:){{0,2}}{h16})?::({h16}:){{2}}{ls32})"),
        format!("((({h16}:){{0,3}}{h16})?::{h16}:{ls32})"),
        format!("((({h16}:){{0,4}}{h16})?::{ls32})"),
        format!("((({h16}:){{0,5}}{h16})?::{h16})"),
        format!("((({h16}:){{0,6}}{h16})?::)"),
    ]
    .join("|");
    let ipv_future = format!(r"v{HEX_DIG}+\.([{UNRESERVED_NO_HYPHEN}{SUB_DELIMS}:-])+");
    let ip_literal = format!(r"\[(({ipv6})|{ipv_future})\]");
    let reg_name = format!("[{UNRESERVED_NO_HYPHEN}%{SUB_DELIMS}-]*");
    let host = format!("({ip_literal}|{ipv4}|{reg_name})");
    let path = format!("[{pchar}]+(/[{pchar}]*)*");
    let fragment = format!("[/?{pchar}]*");

    Regex::new(&format!(
        "^(?P<host>{host})/(?P<path>{path})(#(?P<fragment>{fragment}))?$"
    ))
    .expect("host-based image name pattern is valid")
});

/// A parsed host-based image name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedName {
    pub host: String,
    pub path: String,
    /// Empty when the name carries no `#fragment`.
    pub fragment: String,
}

impl ParsedName {
    /// Template variables for URI Template expansion.
    pub fn variables(&self) -> HashMap<&'static str, &str> {
        HashMap::from([
            ("host", self.host.as_str()),
            ("path", self.path.as_str()),
            ("fragment", self.fragment.as_str()),
        ])
    }
}

/// Parse a host-based image name.
pub fn parse(name: &str) -> Result<ParsedName> {
    let captures = HOST_BASED_IMAGE_NAME
        .captures(name)
        .ok_or_else(|| Error::InvalidName(name.to_string()))?;

    let group = |key: &str| {
        captures
            .name(key)
            .map(|m| m.as_str().to_string())
            .unwrap_or_default()
    };

    Ok(ParsedName {
        host: group("host"),
        path: group("path"),
        fragment: group("fragment"),
    })
}
