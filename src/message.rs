use std::fmt;

use crate::{utils, Error, RecordClass, RecordType, ResourceRecord};

// Message format:
//
// +---------------------+
// |        Header       |
// +---------------------+
// |       Question      | the question for the name server
// +---------------------+
// |        Answer       | RRs answering the question
// +---------------------+
// |      Authority      | RRs pointing toward an authority
// +---------------------+
// |      Additional     | RRs holding additional information
// +---------------------+
//
/// See [RFC 1035, section 4.1. Format: MESSAGES](https://www.rfc-editor.org/rfc/inline-errata/rfc1035.html).
#[derive(Debug, Clone)]
pub struct Message {
    pub header: MessageHeader,
    pub question: MessageQuestion,
    pub answers: Vec<ResourceRecord>,
    pub authorities: Vec<ResourceRecord>,
    pub additionals: Vec<ResourceRecord>,
}

/// The three record sections of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Answer,
    Authority,
    Additional,
}

impl Message {
    pub fn new_query(domain: &str, record_type: &RecordType) -> Self {
        Self {
            header: MessageHeader::with_qd_count(1),
            question: MessageQuestion::with_domain(domain, record_type),
            // We don't need these fields for a query message.
            answers: vec![],
            authorities: vec![],
            additionals: vec![],
        }
    }

    /// Build byte array. This is only used for a standard query.
    pub fn to_query_bytes(&self) -> Vec<u8> {
        // We only need to include header and question sections.
        let mut payload = self.header.to_be_bytes();
        payload.extend_from_slice(&self.question.to_bytes());

        payload
    }

    pub fn section(&self, section: Section) -> &[ResourceRecord] {
        match section {
            Section::Answer => &self.answers,
            Section::Authority => &self.authorities,
            Section::Additional => &self.additionals,
        }
    }

    /// All records of `section` owned by `owner` with the given class and type,
    /// in the order the server sent them.
    pub fn extract_rrset(
        &self,
        section: Section,
        owner: &str,
        class: RecordClass,
        record_type: RecordType,
    ) -> Vec<&ResourceRecord> {
        self.section(section)
            .iter()
            .filter(|rr| rr.r_class == class && rr.r_type == record_type)
            .filter(|rr| utils::same_name(&rr.name, owner))
            .collect()
    }
}

impl Message {
    /// Parse a response and check that it belongs to `query`.
    pub(crate) fn with_response(buf: &[u8], query: &Self) -> Result<Self, Error> {
        let response = Self::from_bytes(buf)?;

        let matches = response.header.is_response()
            && MessageHeader::validate(&query.header, &response.header)
            && MessageQuestion::validate(&query.question, &response.question);
        if !matches {
            return Err(Error::MismatchedResponse);
        }

        Ok(response)
    }

    pub(crate) fn from_bytes(buf: &[u8]) -> Result<Self, Error> {
        // headers take fixed 12 bytes (or 96 bits = 16 bits * 6 fields)
        let header = buf
            .get(0..12)
            .ok_or_else(|| Error::malformed(format!("{} bytes is too short for a header", buf.len())))
            .and_then(MessageHeader::try_from)?;

        if header.qd_count != 1 {
            return Err(Error::malformed(format!(
                "expected exactly one question, got {}",
                header.qd_count
            )));
        }

        // question starts with 13th bytes but has variant length
        let (question, question_end) = MessageQuestion::from_response(buf, 12)?;

        let mut last_pos = question_end;
        let mut answers = Vec::with_capacity(header.an_count as usize);
        let mut authorities = Vec::with_capacity(header.ns_count as usize);
        let mut additionals = Vec::with_capacity(header.ar_count as usize);

        for (count, records) in [
            (header.an_count, &mut answers),
            (header.ns_count, &mut authorities),
            (header.ar_count, &mut additionals),
        ] {
            for _ in 0..count {
                let (resource_record, record_end) = ResourceRecord::from_response(buf, last_pos)?;
                records.push(resource_record);
                last_pos = record_end;
            }
        }

        Ok(Self {
            header,
            question,
            answers,
            authorities,
            additionals,
        })
    }
}

// The header contains the following fields:
//
//                                 1  1  1  1  1  1
//   0  1  2  3  4  5  6  7  8  9  0  1  2  3  4  5
// +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
// |                      ID                       |
// +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
// |QR|   Opcode  |AA|TC|RD|RA|   Z    |   RCODE   |
// +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
// |                    QDCOUNT                    |
// +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
// |                    ANCOUNT                    |
// +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
// |                    NSCOUNT                    |
// +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
// |                    ARCOUNT                    |
// +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
#[derive(Debug, Clone)]
pub struct MessageHeader {
    pub(crate) id: u16,
    pub(crate) flags: u16,
    pub(crate) qd_count: u16,
    pub(crate) an_count: u16,
    pub(crate) ns_count: u16,
    pub(crate) ar_count: u16,
}

impl MessageHeader {
    const QR: u16 = 0x8000;
    const TC: u16 = 0x0200;

    fn with_qd_count(qd_count: u16) -> Self {
        Self {
            id: rand::random(),
            // QR = 0 (query), OPCODE = 0 (standard query), RD = 0: we do the
            // recursion ourselves and ask every server non-recursively.
            flags: 0,
            qd_count,
            an_count: 0,
            ns_count: 0,
            ar_count: 0,
        }
    }

    pub fn id(&self) -> u16 {
        self.id
    }

    pub fn is_response(&self) -> bool {
        self.flags & Self::QR != 0
    }

    pub fn is_truncated(&self) -> bool {
        self.flags & Self::TC != 0
    }

    /// See [RFC 1035, 4.1.1. Header section format](https://www.rfc-editor.org/rfc/inline-errata/rfc1035.html).
    /// A non-zero RCODE (e.g. 3 = NXDOMAIN) is left for the resolver to interpret.
    pub fn rcode(&self) -> u16 {
        self.flags & 0x000F
    }

    fn to_be_bytes(&self) -> Vec<u8> {
        let mut header = Vec::with_capacity(12);
        for field in [
            self.id,
            self.flags,
            self.qd_count,
            self.an_count,
            self.ns_count,
            self.ar_count,
        ] {
            header.extend_from_slice(&field.to_be_bytes());
        }

        header
    }

    fn validate(question: &Self, response: &Self) -> bool {
        // an_count, ns_count and ar_count only exist on the response side.
        question.id == response.id && question.qd_count == response.qd_count
    }
}

impl TryFrom<&[u8]> for MessageHeader {
    type Error = Error;

    /// Six 16-bit fields, 12 bytes in total.
    fn try_from(header: &[u8]) -> Result<Self, Self::Error> {
        if header.len() != 12 {
            return Err(Error::malformed(format!(
                "can't parse response header with length: {}",
                header.len()
            )));
        }

        let field = |i: usize| u16::from_be_bytes([header[i * 2], header[i * 2 + 1]]);

        Ok(Self {
            id: field(0),
            flags: field(1),
            qd_count: field(2),
            an_count: field(3),
            ns_count: field(4),
            ar_count: field(5),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageQuestion {
    domain: String,
    q_type: RecordType,
    q_class: RecordClass,
}

impl MessageQuestion {
    fn with_domain(domain: &str, record_type: &RecordType) -> Self {
        Self {
            domain: domain.trim_end_matches('.').to_string(),
            q_type: *record_type,
            q_class: RecordClass::IN,
        }
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn q_type(&self) -> RecordType {
        self.q_type
    }

    /// Returns the Question and the position where it ends
    fn from_response(buf: &[u8], start_pos: usize) -> Result<(Self, usize), Error> {
        let (domain, qname_end_pos) = utils::parse_domain(buf, start_pos)?;

        // QNAME is followed by 2 bytes for QTYPE and 2 bytes for QCLASS
        let fixed = buf
            .get(qname_end_pos..qname_end_pos + 4)
            .ok_or_else(|| Error::malformed("question field is out of bound"))?;

        Ok((
            Self {
                domain,
                q_type: RecordType::from(u16::from_be_bytes([fixed[0], fixed[1]])),
                q_class: RecordClass::from(u16::from_be_bytes([fixed[2], fixed[3]])),
            },
            qname_end_pos + 4,
        ))
    }

    fn to_bytes(&self) -> Vec<u8> {
        //                               1  1  1  1  1  1
        // 0  1  2  3  4  5  6  7  8  9  0  1  2  3  4  5
        // +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
        // /                     QNAME                     /
        // +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
        // |                     QTYPE                     |
        // +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
        // |                     QCLASS                    |
        // +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
        let mut question = self.build_qname();
        question.extend_from_slice(&self.q_type.to_u16().to_be_bytes());
        question.extend_from_slice(&self.q_class.to_u16().to_be_bytes());

        question
    }

    /// "blog.wtcx.dev" becomes `4blog4wtcx3dev0`; the trailing zero is the root label.
    fn build_qname(&self) -> Vec<u8> {
        let mut qname = Vec::with_capacity(self.domain.len() + 2);

        for label in self.domain.split('.').filter(|label| !label.is_empty()) {
            qname.push(label.len() as u8);
            qname.extend_from_slice(label.as_bytes());
        }
        qname.push(0);

        qname
    }

    fn validate(query: &Self, response: &Self) -> bool {
        utils::same_name(&query.domain, &response.domain)
            && query.q_class == response.q_class
            && query.q_type == response.q_type
    }
}

impl fmt::Display for MessageQuestion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}. {} {}", self.domain, self.q_class, self.q_type)
    }
}

#[cfg(test)]
mod tests {
    use std::net::Ipv4Addr;

    use super::*;

    // www.example.com. A, answered by a CNAME to example.com and its address,
    // both using compression pointers back into the question.
    const ALIASED_RESPONSE: [u8; 63] = [
        0xBE, 0xEF, 0x81, 0x80, 0x00, 0x01, 0x00, 0x02, 0x00, 0x00, 0x00, 0x00, // header
        0x03, b'w', b'w', b'w', 0x07, b'e', b'x', b'a', b'm', b'p', b'l', b'e', 0x03, b'c', b'o',
        b'm', 0x00, 0x00, 0x01, 0x00, 0x01, // question
        0xC0, 0x0C, 0x00, 0x05, 0x00, 0x01, 0x00, 0x00, 0x0E, 0x10, 0x00, 0x02, 0xC0,
        0x10, // CNAME
        0xC0, 0x10, 0x00, 0x01, 0x00, 0x01, 0x00, 0x00, 0x01, 0x2C, 0x00, 0x04, 0x5D, 0xB8, 0xD8,
        0x22, // A
    ];

    fn query_with_id(domain: &str, id: u16) -> Message {
        let mut query = Message::new_query(domain, &RecordType::A);
        query.header.id = id;
        query
    }

    #[test]
    fn test_query_bytes() {
        let query = query_with_id("example.com.", 0x1234);

        assert_eq!(
            query.to_query_bytes(),
            vec![
                0x12, 0x34, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x07,
                b'e', b'x', b'a', b'm', b'p', b'l', b'e', 0x03, b'c', b'o', b'm', 0x00, 0x00,
                0x01, 0x00, 0x01,
            ]
        );
    }

    #[test]
    fn test_parse_aliased_response() {
        let query = query_with_id("www.example.com", 0xBEEF);
        let response = Message::with_response(&ALIASED_RESPONSE, &query).unwrap();

        assert_eq!(response.header.rcode(), 0);
        assert_eq!(response.question.to_string(), "www.example.com. IN A");
        assert_eq!(
            response.answers,
            vec![
                ResourceRecord::cname("www.example.com", 3600, "example.com"),
                ResourceRecord::a("example.com", 300, Ipv4Addr::new(93, 184, 216, 34)),
            ]
        );
        assert!(response.authorities.is_empty());
        assert!(response.additionals.is_empty());

        let cname = response.extract_rrset(
            Section::Answer,
            "WWW.example.com.",
            RecordClass::IN,
            RecordType::CNAME,
        );
        assert_eq!(cname, vec![&response.answers[0]]);
        assert!(response
            .extract_rrset(Section::Additional, "example.com", RecordClass::IN, RecordType::A)
            .is_empty());
    }

    #[test]
    fn test_mismatched_id_is_rejected() {
        let query = query_with_id("www.example.com", 0xCAFE);
        assert_eq!(
            Message::with_response(&ALIASED_RESPONSE, &query).unwrap_err(),
            Error::MismatchedResponse
        );
    }

    #[test]
    fn test_mismatched_question_is_rejected() {
        let query = query_with_id("ftp.example.com", 0xBEEF);
        assert_eq!(
            Message::with_response(&ALIASED_RESPONSE, &query).unwrap_err(),
            Error::MismatchedResponse
        );
    }

    #[test]
    fn test_nxdomain_is_not_an_error() {
        let mut buf = ALIASED_RESPONSE[..33].to_vec();
        // RCODE 3, no records
        buf[3] = 0x83;
        buf[7] = 0x00;
        let query = query_with_id("www.example.com", 0xBEEF);
        let response = Message::with_response(&buf, &query).unwrap();

        assert_eq!(response.header.rcode(), 3);
        assert!(response.answers.is_empty());
    }

    #[test]
    fn test_truncated_records_are_rejected() {
        let query = query_with_id("www.example.com", 0xBEEF);
        assert!(matches!(
            Message::with_response(&ALIASED_RESPONSE[..50], &query),
            Err(Error::MalformedMessage(_))
        ));
    }
}
