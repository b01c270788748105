use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};

use crate::{utils, Error};

/// See [RFC 1035, 3.2.2. TYPE values](https://www.rfc-editor.org/rfc/inline-errata/rfc1035.html).
///
/// Only the types the resolver acts on get their own variant; everything else
/// is carried as `Unknown` so a response holding it still parses.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum RecordType {
    /// host address
    A,
    /// authoritative name server
    NS,
    /// the canonical name for an alias
    CNAME,
    /// marks the start of a zone of authority
    SOA,
    /// IPv6 address
    AAAA,
    Unknown(u16),
}

impl RecordType {
    pub fn to_u16(&self) -> u16 {
        match self {
            RecordType::A => 1,
            RecordType::NS => 2,
            RecordType::CNAME => 5,
            RecordType::SOA => 6,
            // RFC 3596: https://www.rfc-editor.org/rfc/rfc3596.html
            RecordType::AAAA => 28,
            RecordType::Unknown(value) => *value,
        }
    }
}

impl From<u16> for RecordType {
    fn from(value: u16) -> Self {
        match value {
            1 => RecordType::A,
            2 => RecordType::NS,
            5 => RecordType::CNAME,
            6 => RecordType::SOA,
            28 => RecordType::AAAA,
            _ => RecordType::Unknown(value),
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordType::A => f.write_str("A"),
            RecordType::NS => f.write_str("NS"),
            RecordType::CNAME => f.write_str("CNAME"),
            RecordType::SOA => f.write_str("SOA"),
            RecordType::AAAA => f.write_str("AAAA"),
            // RFC 3597 presentation format
            RecordType::Unknown(value) => write!(f, "TYPE{value}"),
        }
    }
}

/// See [RFC 1035, 3.2.4. CLASS values](https://www.rfc-editor.org/rfc/inline-errata/rfc1035.html).
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum RecordClass {
    /// The Internet. We probably only care about this.
    IN,
    /// The CHAOS class
    CH,
    /// Hesiod [Dyer 87]
    HS,
    Other(u16),
}

impl RecordClass {
    pub fn to_u16(&self) -> u16 {
        match self {
            RecordClass::IN => 1,
            RecordClass::CH => 3,
            RecordClass::HS => 4,
            RecordClass::Other(value) => *value,
        }
    }
}

impl From<u16> for RecordClass {
    fn from(value: u16) -> Self {
        match value {
            1 => RecordClass::IN,
            3 => RecordClass::CH,
            4 => RecordClass::HS,
            _ => RecordClass::Other(value),
        }
    }
}

impl fmt::Display for RecordClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordClass::IN => f.write_str("IN"),
            RecordClass::CH => f.write_str("CH"),
            RecordClass::HS => f.write_str("HS"),
            RecordClass::Other(value) => write!(f, "CLASS{value}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordData {
    CNAME(String),
    NS(String),
    A(Ipv4Addr),
    AAAA(Ipv6Addr),
    SOA(SoaRecord),
    Unknown(Vec<u8>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoaRecord {
    pub m_name: String,
    pub r_name: String,
    pub serial: u32,
    pub refresh: u32,
    pub retry: u32,
    pub expire: u32,
    pub minimum: u32,
}

impl RecordData {
    /// Parse the RDATA occupying `buf[start_pos..end_pos]`. Names inside it
    /// may point anywhere earlier in `buf`, so the whole message is passed.
    pub(crate) fn from_response(
        buf: &[u8],
        record_type: &RecordType,
        start_pos: usize,
        end_pos: usize,
    ) -> Result<RecordData, Error> {
        let rdata = buf
            .get(start_pos..end_pos)
            .ok_or_else(|| Error::malformed("RDATA is out of bound"))?;

        match record_type {
            RecordType::A => {
                let octets: [u8; 4] = rdata.try_into().map_err(|_| {
                    Error::malformed(format!("A record with {} bytes of RDATA", rdata.len()))
                })?;
                Ok(RecordData::A(Ipv4Addr::from(octets)))
            }
            RecordType::AAAA => {
                let octets: [u8; 16] = rdata.try_into().map_err(|_| {
                    Error::malformed(format!("AAAA record with {} bytes of RDATA", rdata.len()))
                })?;
                Ok(RecordData::AAAA(Ipv6Addr::from(octets)))
            }
            RecordType::CNAME => {
                let (domain, _) = utils::parse_domain(buf, start_pos)?;
                Ok(RecordData::CNAME(domain))
            }
            RecordType::NS => {
                let (domain, _) = utils::parse_domain(buf, start_pos)?;
                Ok(RecordData::NS(domain))
            }
            RecordType::SOA => Self::parse_soa(buf, start_pos, end_pos),
            RecordType::Unknown(_) => Ok(RecordData::Unknown(rdata.to_vec())),
        }
    }

    fn parse_soa(buf: &[u8], start_pos: usize, end_pos: usize) -> Result<RecordData, Error> {
        let (m_name, domain_end) = utils::parse_domain(buf, start_pos)?;
        let (r_name, domain_end) = utils::parse_domain(buf, domain_end)?;

        let counters = buf
            .get(domain_end..end_pos)
            .filter(|counters| counters.len() == 20)
            .ok_or_else(|| Error::malformed("SOA record has a short counter block"))?;
        let field = |i: usize| {
            u32::from_be_bytes([
                counters[i * 4],
                counters[i * 4 + 1],
                counters[i * 4 + 2],
                counters[i * 4 + 3],
            ])
        };

        Ok(RecordData::SOA(SoaRecord {
            m_name,
            r_name,
            serial: field(0),
            refresh: field(1),
            retry: field(2),
            expire: field(3),
            minimum: field(4),
        }))
    }
}

impl fmt::Display for RecordData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordData::CNAME(domain) | RecordData::NS(domain) => write!(f, "{domain}."),
            RecordData::A(ip) => write!(f, "{ip}"),
            RecordData::AAAA(ip) => write!(f, "{ip}"),
            RecordData::SOA(soa) => write!(
                f,
                "{}. {}. {} {} {} {} {}",
                soa.m_name,
                soa.r_name,
                soa.serial,
                soa.refresh,
                soa.retry,
                soa.expire,
                soa.minimum
            ),
            RecordData::Unknown(raw) => {
                write!(f, "\\# {}", raw.len())?;
                if !raw.is_empty() {
                    f.write_str(" ")?;
                    for byte in raw {
                        write!(f, "{byte:02x}")?;
                    }
                }
                Ok(())
            }
        }
    }
}

// 4.1.3. Resource record format
//
//                                     1  1  1  1  1  1
//       0  1  2  3  4  5  6  7  8  9  0  1  2  3  4  5
//     +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
//     /                      NAME                     /
//     +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
//     |                      TYPE                     |
//     +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
//     |                     CLASS                     |
//     +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
//     |                      TTL                      |
//     |                                               |
//     +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
//     |                   RDLENGTH                    |
//     +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--|
//     /                     RDATA                     /
//     +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
//
/// See [RFC 1035, section 4.1.3. Resource record format](https://www.rfc-editor.org/rfc/inline-errata/rfc1035.html).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRecord {
    /// `NAME`: the owner of this record, without the trailing dot.
    pub name: String,
    pub r_type: RecordType,
    pub r_class: RecordClass,
    /// `TTL`: seconds the record may be cached. Kept for display only, nothing here caches.
    pub ttl: u32,
    pub r_data: RecordData,
}

impl ResourceRecord {
    pub fn a(name: &str, ttl: u32, ip: Ipv4Addr) -> Self {
        Self::new_in(name, RecordType::A, ttl, RecordData::A(ip))
    }

    pub fn ns(name: &str, ttl: u32, target: &str) -> Self {
        Self::new_in(name, RecordType::NS, ttl, RecordData::NS(target.to_string()))
    }

    pub fn cname(name: &str, ttl: u32, target: &str) -> Self {
        Self::new_in(
            name,
            RecordType::CNAME,
            ttl,
            RecordData::CNAME(target.to_string()),
        )
    }

    fn new_in(name: &str, r_type: RecordType, ttl: u32, r_data: RecordData) -> Self {
        Self {
            name: name.trim_end_matches('.').to_string(),
            r_type,
            r_class: RecordClass::IN,
            ttl,
            r_data,
        }
    }

    /// Parse one record starting at `start_pos`.
    /// Returns the resource record and the position where it ends
    pub(crate) fn from_response(buf: &[u8], start_pos: usize) -> Result<(Self, usize), Error> {
        let (name, name_end) = utils::parse_domain(buf, start_pos)?;

        // TYPE, CLASS, TTL and RDLENGTH take 2 + 2 + 4 + 2 bytes.
        let fixed = buf
            .get(name_end..name_end + 10)
            .ok_or_else(|| Error::malformed("resource record is out of bound"))?;

        let r_type = RecordType::from(u16::from_be_bytes([fixed[0], fixed[1]]));
        let r_class = RecordClass::from(u16::from_be_bytes([fixed[2], fixed[3]]));
        let ttl = u32::from_be_bytes([fixed[4], fixed[5], fixed[6], fixed[7]]);
        let rd_length = u16::from_be_bytes([fixed[8], fixed[9]]) as usize;

        let rdata_start = name_end + 10;
        let rdata_end = rdata_start + rd_length;
        if buf.len() < rdata_end {
            return Err(Error::malformed(format!(
                "resource record doesn't contain enough space for RDATA, expect: {}, got: {}",
                rdata_end,
                buf.len()
            )));
        }

        let r_data = RecordData::from_response(buf, &r_type, rdata_start, rdata_end)?;

        let rr = Self {
            name,
            r_type,
            r_class,
            ttl,
            r_data,
        };

        Ok((rr, rdata_end))
    }

    pub fn ipv4_ip(&self) -> Option<Ipv4Addr> {
        match self.r_data {
            RecordData::A(ip) => Some(ip),
            _ => None,
        }
    }

    /// The name an NS or CNAME record points at.
    pub fn target(&self) -> Option<&str> {
        match &self.r_data {
            RecordData::NS(domain) | RecordData::CNAME(domain) => Some(domain),
            _ => None,
        }
    }
}

impl fmt::Display for ResourceRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}. {} {} {} {}",
            self.name, self.ttl, self.r_class, self.r_type, self.r_data
        )
    }
}
