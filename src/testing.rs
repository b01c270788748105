//! Canned-response transport for resolver tests.

use std::cell::RefCell;
use std::collections::HashMap;
use std::io;
use std::net::Ipv4Addr;

use crate::message::{Message, MessageHeader};
use crate::transport::Transport;
use crate::{Error, RecordType, ResourceRecord};

enum Reply {
    Records {
        answers: Vec<ResourceRecord>,
        authorities: Vec<ResourceRecord>,
        additionals: Vec<ResourceRecord>,
    },
    Timeout,
}

/// Serves replies keyed by (server, name, type). Unknown keys get an empty
/// response, the way a lame server would answer.
#[derive(Default)]
pub(crate) struct StubTransport {
    replies: HashMap<(Ipv4Addr, String, RecordType), Reply>,
    calls: RefCell<Vec<(Ipv4Addr, String, RecordType)>>,
}

impl StubTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn reply(
        mut self,
        server: Ipv4Addr,
        name: &str,
        record_type: RecordType,
        answers: Vec<ResourceRecord>,
        authorities: Vec<ResourceRecord>,
        additionals: Vec<ResourceRecord>,
    ) -> Self {
        self.replies.insert(
            (server, name.to_string(), record_type),
            Reply::Records {
                answers,
                authorities,
                additionals,
            },
        );
        self
    }

    pub(crate) fn answer(self, server: Ipv4Addr, name: &str, answers: Vec<ResourceRecord>) -> Self {
        self.reply(server, name, RecordType::A, answers, vec![], vec![])
    }

    pub(crate) fn timeout(mut self, server: Ipv4Addr, name: &str, record_type: RecordType) -> Self {
        self.replies
            .insert((server, name.to_string(), record_type), Reply::Timeout);
        self
    }

    pub(crate) fn calls(&self) -> Vec<(Ipv4Addr, String, RecordType)> {
        self.calls.borrow().clone()
    }
}

impl Transport for StubTransport {
    fn send(&self, query: &Message, server: Ipv4Addr) -> Result<Message, Error> {
        let key = (
            server,
            query.question.domain().to_string(),
            query.question.q_type(),
        );
        self.calls.borrow_mut().push(key.clone());

        let (answers, authorities, additionals) = match self.replies.get(&key) {
            Some(Reply::Timeout) => {
                return Err(Error::NetworkError(io::Error::new(
                    io::ErrorKind::TimedOut,
                    "timed out",
                )))
            }
            Some(Reply::Records {
                answers,
                authorities,
                additionals,
            }) => (answers.clone(), authorities.clone(), additionals.clone()),
            None => (vec![], vec![], vec![]),
        };

        Ok(canned_response(query, answers, authorities, additionals))
    }
}

/// A response to `query` carrying the given sections.
pub(crate) fn canned_response(
    query: &Message,
    answers: Vec<ResourceRecord>,
    authorities: Vec<ResourceRecord>,
    additionals: Vec<ResourceRecord>,
) -> Message {
    Message {
        header: MessageHeader {
            id: query.header.id,
            flags: 0x8000,
            qd_count: 1,
            an_count: answers.len() as u16,
            ns_count: authorities.len() as u16,
            ar_count: additionals.len() as u16,
        },
        question: query.question.clone(),
        answers,
        authorities,
        additionals,
    }
}
