//! Response body parsing
//!
//! Echo services answer in one of two plain-text shapes:
//!
//! ```text
//! 172.201.20.34
//! ```
//!
//! or `key=value` lines, one of which carries the address:
//!
//! ```text
//! fl=29f123
//! h=cloudflare.com
//! ip=172.201.20.34
//! ts=1718031234.512
//! ```
//!
//! A single-line body is validated like any other; it is never trusted just
//! because it is the only line.

use crate::error::ParseError;
use std::net::IpAddr;

/// Prefix marking the address line in `key=value` bodies
const IP_PREFIX: &str = "ip=";

/// Extract the first valid address from a response body
///
/// The body is lowercased and split on `\n`. Each line is trimmed, stripped
/// of a leading `ip=` and parsed; the first line that parses wins. The
/// returned address is in canonical form (see [`canonicalize`]), so its
/// `Display` is the canonical string.
pub fn parse(raw: &str) -> Result<IpAddr, ParseError> {
    let raw = raw.to_lowercase();

    raw.split('\n')
        .map(|line| {
            let line = line.trim();
            line.strip_prefix(IP_PREFIX).unwrap_or(line)
        })
        .find_map(|candidate| candidate.parse::<IpAddr>().ok())
        .map(canonicalize)
        .ok_or(ParseError::NoAddressFound)
}

/// Normalize an address to the form used for comparison and output
///
/// IPv4-mapped IPv6 addresses (`::ffff:a.b.c.d`) become plain IPv4. Anything
/// else is returned unchanged; `Display` already renders IPv6 compressed.
pub fn canonicalize(ip: IpAddr) -> IpAddr {
    ip.to_canonical()
}
