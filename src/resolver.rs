use std::collections::HashSet;
use std::net::Ipv4Addr;

use tracing::{debug, info, instrument, warn};

use crate::config::ResolverConfig;
use crate::message::{Message, Section};
use crate::record::*;
use crate::transport::{Transport, UdpTransport};
use crate::{utils, Unresolvable};

pub const ROOT_NAME_SERVERS_V4: [Ipv4Addr; 13] = [
    Ipv4Addr::new(198, 41, 0, 4),     // a.root-servers.net
    Ipv4Addr::new(170, 247, 170, 2),  // b.root-servers.net
    Ipv4Addr::new(192, 33, 4, 12),    // c.root-servers.net
    Ipv4Addr::new(199, 7, 91, 13),    // d.root-servers.net
    Ipv4Addr::new(192, 203, 230, 10), // e.root-servers.net
    Ipv4Addr::new(192, 5, 5, 241),    // f.root-servers.net
    Ipv4Addr::new(192, 112, 36, 4),   // g.root-servers.net
    Ipv4Addr::new(198, 97, 190, 53),  // h.root-servers.net
    Ipv4Addr::new(192, 36, 148, 17),  // i.root-servers.net
    Ipv4Addr::new(192, 58, 128, 30),  // j.root-servers.net
    Ipv4Addr::new(193, 0, 14, 129),   // k.root-servers.net
    Ipv4Addr::new(199, 7, 83, 42),    // l.root-servers.net
    Ipv4Addr::new(202, 12, 27, 33),   // m.root-servers.net
];

pub type Resolution = Result<Vec<ResourceRecord>, Unresolvable>;

/// Walks the DNS tree for A records, one blocking query at a time.
///
/// Every query is a single attempt. Nothing is cached between calls, so two
/// lookups of the same name against the same servers give the same records.
#[derive(Debug)]
pub struct Resolver<T = UdpTransport> {
    transport: T,
    config: ResolverConfig,
}

/// State of one top-level `resolve` call.
struct Walk {
    /// Where sub-resolutions of alias targets and name server names restart.
    anchor: Ipv4Addr,
    depth: usize,
    /// (name, server) pairs on the current recursion path.
    path: HashSet<(String, Ipv4Addr)>,
}

impl Walk {
    fn new(anchor: Ipv4Addr) -> Self {
        Self {
            anchor,
            depth: 0,
            path: HashSet::new(),
        }
    }
}

impl Resolver<UdpTransport> {
    pub fn new(config: ResolverConfig) -> Self {
        let transport = UdpTransport::new(config.timeout, config.port);
        Self::with_transport(transport, config)
    }
}

impl<T: Transport> Resolver<T> {
    pub fn with_transport(transport: T, config: ResolverConfig) -> Self {
        Self { transport, config }
    }

    /// Validate `domain`, pick a bootstrap server and resolve from there.
    pub fn lookup(&self, domain: &str) -> Resolution {
        utils::validate_domain(domain)
            .map_err(|_| Unresolvable::InvalidDomain(domain.to_string()))?;
        let domain = domain.trim_end_matches('.');

        let bootstrap = self.select_bootstrap(domain)?;
        let records = self.resolve(domain, bootstrap, bootstrap)?;

        info!(domain, records = records.len(), "resolved");
        Ok(records)
    }

    /// Ask each root server in turn for the NS records of `domain` and return
    /// the first glue address one of them offers.
    ///
    /// A root server that cannot be reached ends the whole bootstrap; only a
    /// root that answers without usable glue makes us move on to the next one.
    #[instrument(level = "debug", skip(self))]
    pub fn select_bootstrap(&self, domain: &str) -> Result<Ipv4Addr, Unresolvable> {
        for root in ROOT_NAME_SERVERS_V4 {
            let response = self.query(domain, RecordType::NS, root)?;

            match glue_address(&response) {
                Some(next_hop) => {
                    info!(%root, %next_hop, "bootstrap server selected");
                    return Ok(next_hop);
                }
                None => debug!(%root, "root server offered no glue"),
            }
        }

        Err(Unresolvable::BootstrapExhaustion {
            domain: domain.to_string(),
        })
    }

    /// Resolve `name` starting at `server`. Alias targets and name server
    /// names met on the way are resolved from `anchor`.
    #[instrument(level = "debug", skip(self))]
    pub fn resolve(&self, name: &str, server: Ipv4Addr, anchor: Ipv4Addr) -> Resolution {
        self.resolve_in(&mut Walk::new(anchor), name, server)
    }

    fn resolve_in(&self, walk: &mut Walk, name: &str, server: Ipv4Addr) -> Resolution {
        if walk.depth >= self.config.max_depth {
            return Err(Unresolvable::DepthExceeded {
                name: name.to_string(),
                limit: self.config.max_depth,
            });
        }

        let key = (name.trim_end_matches('.').to_ascii_lowercase(), server);
        if !walk.path.insert(key.clone()) {
            return Err(Unresolvable::LoopDetected {
                name: name.to_string(),
                server,
            });
        }

        walk.depth += 1;
        let outcome = self.step(walk, name, server);
        walk.depth -= 1;
        walk.path.remove(&key);

        outcome
    }

    /// One query, then branch on what came back: answer, glue, authority.
    fn step(&self, walk: &mut Walk, name: &str, server: Ipv4Addr) -> Resolution {
        let response = self.query(name, RecordType::A, server)?;

        if !response.answers.is_empty() {
            return self.follow_answer(walk, &response);
        }

        if let Some(glue) = glue_address(&response) {
            debug!(qname = name, %server, %glue, "following glue");
            return self.resolve_in(walk, name, glue);
        }
        if !response.additionals.is_empty() {
            debug!(qname = name, %server, "additional section has no address for its first owner");
        }

        if !response.authorities.is_empty() {
            return self.follow_authority(walk, name, server, &response);
        }

        debug!(qname = name, %server, "empty referral");
        Err(Unresolvable::EmptyReferral {
            name: name.to_string(),
            server,
        })
    }

    /// Keep the whole answer section and, when its first owner is an alias,
    /// append whatever its target resolves to from the anchor.
    fn follow_answer(&self, walk: &mut Walk, response: &Message) -> Resolution {
        let mut records = response.answers.clone();

        if let Some(alias) = alias_target(response) {
            debug!(alias, "chasing alias from the anchor");
            let anchor = walk.anchor;
            match self.resolve_in(walk, alias, anchor) {
                Ok(more) => records.extend(more),
                Err(err) if err.is_fatal() => return Err(err),
                Err(err) => debug!(alias, %err, "alias target unresolved, keeping the answer"),
            }
        }

        Ok(records)
    }

    /// Referral without glue: resolve the delegated name server from the
    /// anchor, then ask it for `name`.
    fn follow_authority(
        &self,
        walk: &mut Walk,
        name: &str,
        server: Ipv4Addr,
        response: &Message,
    ) -> Resolution {
        let Some(ns_name) = delegated_name_server(response) else {
            debug!(qname = name, %server, "authority section delegates nowhere");
            return fallback_answer(response).ok_or_else(|| Unresolvable::EmptyReferral {
                name: name.to_string(),
                server,
            });
        };

        debug!(qname = name, ns = ns_name, "resolving glueless name server from the anchor");
        let anchor = walk.anchor;
        let ns_address = match self.resolve_in(walk, ns_name, anchor) {
            Ok(records) => first_address(&records),
            Err(err) if err.is_fatal() => return Err(err),
            Err(err) => {
                debug!(ns = ns_name, %err, "name server unresolved");
                None
            }
        };

        match ns_address {
            Some(next_hop) => self.resolve_in(walk, name, next_hop),
            None => fallback_answer(response).ok_or_else(|| Unresolvable::SubResolutionFailure {
                name: ns_name.to_string(),
            }),
        }
    }

    fn query(
        &self,
        name: &str,
        record_type: RecordType,
        server: Ipv4Addr,
    ) -> Result<Message, Unresolvable> {
        debug!(qname = name, %record_type, %server, "query");
        let query = Message::new_query(name, &record_type);

        self.transport.send(&query, server).map_err(|err| {
            warn!(qname = name, %server, %err, "query failed");
            Unresolvable::transport(server, &err)
        })
    }
}

// Tie-break rules. Wherever a section may hold several candidates, the first
// record of the section decides: its owner is the entity we follow, and of
// that owner's matching records the first one is used.

fn first_owner(records: &[ResourceRecord]) -> Option<&str> {
    records.first().map(|rr| rr.name.as_str())
}

/// Address of the first Additional record's owner, from the Additional section.
fn glue_address(response: &Message) -> Option<Ipv4Addr> {
    let owner = first_owner(&response.additionals)?;
    response
        .extract_rrset(Section::Additional, owner, RecordClass::IN, RecordType::A)
        .first()?
        .ipv4_ip()
}

/// Name server named for the first Authority record's owner.
fn delegated_name_server(response: &Message) -> Option<&str> {
    let owner = first_owner(&response.authorities)?;
    response
        .extract_rrset(Section::Authority, owner, RecordClass::IN, RecordType::NS)
        .first()
        .copied()?
        .target()
}

/// CNAME target of the first Answer record's owner.
fn alias_target(response: &Message) -> Option<&str> {
    let owner = first_owner(&response.answers)?;
    response
        .extract_rrset(Section::Answer, owner, RecordClass::IN, RecordType::CNAME)
        .first()
        .copied()?
        .target()
}

/// The first record of a name server's resolution is its address; an alias
/// in that position leaves the name server unusable.
fn first_address(records: &[ResourceRecord]) -> Option<Ipv4Addr> {
    records.first()?.ipv4_ip()
}

fn fallback_answer(response: &Message) -> Option<Vec<ResourceRecord>> {
    response.answers.first().map(|rr| vec![rr.clone()])
}
