use std::collections::HashSet;

use crate::error::Error;

/// Parse a possibly compressed domain name starting at `start_pos`.
/// Returns the name without its trailing dot and the position right after the
/// name as it appears at `start_pos` (i.e. after the first pointer, if any).
///
/// See [RFC 1035, 4.1.4. Message compression](https://www.rfc-editor.org/rfc/inline-errata/rfc1035.html).
pub(crate) fn parse_domain(buf: &[u8], start_pos: usize) -> Result<(String, usize), Error> {
    let mut labels: Vec<&str> = vec![];
    let mut pos = start_pos;
    let mut end = None;
    let mut visited = HashSet::new();

    loop {
        let len = *buf
            .get(pos)
            .ok_or_else(|| Error::malformed("domain name runs past the end of the message"))?;

        // The two high bits tell a plain label (00) from a pointer (11).
        match len & 0xC0 {
            0x00 if len == 0 => {
                let end = end.unwrap_or(pos + 1);
                return Ok((labels.join("."), end));
            }
            0x00 => {
                let len = len as usize;
                let raw = buf
                    .get(pos + 1..pos + 1 + len)
                    .ok_or_else(|| Error::malformed("label is out of bound"))?;
                let label = std::str::from_utf8(raw)
                    .map_err(|_| Error::malformed("label contains invalid characters"))?;
                labels.push(label);
                pos += 1 + len;
            }
            0xC0 => {
                let low = *buf
                    .get(pos + 1)
                    .ok_or_else(|| Error::malformed("truncated compression pointer"))?;
                // 0x3FFF clears the two pointer bits.
                let offset = (u16::from_be_bytes([len, low]) & 0x3FFF) as usize;
                if !visited.insert(offset) {
                    return Err(Error::malformed("found recursive pointer"));
                }
                end.get_or_insert(pos + 2);
                pos = offset;
            }
            _ => return Err(Error::malformed(format!("unsupported label type {len:#04x}"))),
        }
    }
}

/// Validates whether a domain is eligible for query.
pub(crate) fn validate_domain(domain: &str) -> Result<(), Error> {
    // handle trailing dot of FQDN
    let domain = domain.trim_end_matches('.');

    if domain.is_empty() || domain.len() > 255 {
        return Err(Error::InvalidHostname);
    }

    for label in domain.split('.') {
        if label.is_empty() || label.len() > 63 {
            return Err(Error::InvalidHostname);
        }
        if label.starts_with('-') || label.ends_with('-') {
            return Err(Error::InvalidHostname);
        }
        if !label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            return Err(Error::InvalidHostname);
        }
    }

    Ok(())
}

/// Owner names compare case-insensitively, with or without the root dot.
pub(crate) fn same_name(a: &str, b: &str) -> bool {
    a.trim_end_matches('.')
        .eq_ignore_ascii_case(b.trim_end_matches('.'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_domain() {
        assert_eq!(validate_domain(""), Err(Error::InvalidHostname));
    }

    #[test]
    fn test_hyphen_domain() {
        assert_eq!(validate_domain("-"), Err(Error::InvalidHostname));
    }

    #[test]
    fn test_domain_starts_with_hyphen() {
        assert_eq!(validate_domain("-.google.com"), Err(Error::InvalidHostname));
    }

    #[test]
    fn test_domain_ends_with_hyphen() {
        assert_eq!(validate_domain("google.com-"), Err(Error::InvalidHostname));
    }

    #[test]
    fn test_domain_with_invalid_chars() {
        assert_eq!(
            validate_domain("www#google.com"),
            Err(Error::InvalidHostname)
        );
    }

    #[test]
    fn test_domain_with_invalid_label() {
        assert_eq!(validate_domain("..google.com"), Err(Error::InvalidHostname));
    }

    #[test]
    fn test_domain_with_trailing_dot() {
        assert!(validate_domain("google.com.").is_ok());
    }

    #[test]
    fn test_parse_plain_name() {
        let buf = b"\x07example\x03com\x00\xff";
        assert_eq!(
            parse_domain(buf, 0),
            Ok(("example.com".to_string(), 13))
        );
    }

    #[test]
    fn test_parse_root_name() {
        let buf = [0xAA, 0x00, 0x00, 0x06];
        assert_eq!(parse_domain(&buf, 1), Ok((String::new(), 2)));
    }

    #[test]
    fn test_parse_compressed_name() {
        // "example.com" at 0, then "www" + pointer to 0 at 13.
        let mut buf = b"\x07example\x03com\x00".to_vec();
        buf.extend_from_slice(b"\x03www\xC0\x00");

        assert_eq!(
            parse_domain(&buf, 13),
            Ok(("www.example.com".to_string(), 19))
        );
    }

    #[test]
    fn test_parse_pointer_loop() {
        let buf = [0xC0, 0x02, 0xC0, 0x00];
        assert!(matches!(
            parse_domain(&buf, 0),
            Err(Error::MalformedMessage(_))
        ));
    }

    #[test]
    fn test_parse_truncated_label() {
        let buf = b"\x07exam";
        assert!(matches!(
            parse_domain(buf, 0),
            Err(Error::MalformedMessage(_))
        ));
    }

    #[test]
    fn test_same_name_ignores_case_and_root_dot() {
        assert!(same_name("A.IANA-Servers.net.", "a.iana-servers.net"));
        assert!(!same_name("a.iana-servers.net", "b.iana-servers.net"));
    }
}
