mod config;
mod error;
mod message;
mod record;
mod resolver;
mod transport;
mod utils;

#[cfg(test)]
mod testing;

pub use config::ResolverConfig;
pub use error::*;
pub use message::{Message, MessageHeader, MessageQuestion, Section};
pub use record::*;
pub use resolver::{Resolution, Resolver, ROOT_NAME_SERVERS_V4};
pub use transport::{Transport, UdpTransport};

/// Resolve the A records of `domain` from the root servers with default settings.
///
/// ```no_run
/// let records = rootwalk::lookup("example.com").unwrap();
/// for record in records {
///     println!("{record}");
/// }
/// ```
pub fn lookup(domain: &str) -> Resolution {
    Resolver::new(ResolverConfig::default()).lookup(domain)
}
