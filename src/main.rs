use std::io::{self, BufRead, Write};
use std::process::ExitCode;
use std::time::{Duration, Instant};

use chrono::Local;
use clap::{ArgAction, Parser};
use rootwalk::{Message, RecordType, ResolverConfig, Resolver, ResourceRecord};
use tracing::warn;

#[derive(Parser, Debug)]
#[command(
    name = "rootwalk",
    version,
    about = "Resolve a name by walking the DNS tree down from the root servers"
)]
struct Cli {
    /// Domain to resolve (asked for on stdin when omitted)
    domain: Option<String>,

    /// How long to wait for each reply, in milliseconds
    #[arg(long, env = "ROOTWALK_TIMEOUT_MS", default_value_t = 1000)]
    timeout_ms: u64,

    /// Nested lookups allowed before giving up
    #[arg(long, env = "ROOTWALK_MAX_DEPTH", default_value_t = ResolverConfig::DEFAULT_MAX_DEPTH)]
    max_depth: usize,

    /// Port every server is queried on
    #[arg(long, env = "ROOTWALK_PORT", default_value_t = ResolverConfig::DEFAULT_PORT)]
    port: u16,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, env = "ROOTWALK_LOG", default_value = "warn")]
    log_level: String,

    /// Increase verbosity (-v = debug, -vv = trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn resolver_config(&self) -> ResolverConfig {
        ResolverConfig {
            timeout: Duration::from_millis(self.timeout_ms),
            max_depth: self.max_depth,
            port: self.port,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => cli.log_level.as_str(),
        1 => "debug",
        _ => "trace",
    };
    let env_filter = tracing_subscriber::EnvFilter::try_new(level)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(io::stderr)
        .init();

    let domain = match cli.domain.clone() {
        Some(domain) => domain,
        None => match prompt_domain() {
            Ok(domain) => domain,
            Err(err) => {
                eprintln!("can't read a domain: {err}");
                return ExitCode::FAILURE;
            }
        },
    };
    let domain = domain.trim().trim_end_matches('.').to_string();

    let resolver = Resolver::new(cli.resolver_config());
    let when = Local::now().format("%m/%d/%Y %H:%M:%S");
    let started = Instant::now();
    let outcome = resolver.lookup(&domain);
    let elapsed = started.elapsed();

    println!("\nQUESTION SECTION:");
    println!("{}", Message::new_query(&domain, &RecordType::A).question);

    let resolved = match outcome {
        Ok(records) if !records.is_empty() => {
            print_answers(&domain, &records);
            true
        }
        Ok(_) => {
            println!("\nUnable to resolve {domain}");
            false
        }
        Err(err) => {
            warn!(%err, "resolution failed");
            println!("\nUnable to resolve {domain}");
            false
        }
    };

    println!("\nQuery time: {} msec", elapsed.as_millis());
    println!("WHEN: {when}");

    if resolved {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn prompt_domain() -> io::Result<String> {
    print!("Please enter a domain: ");
    io::stdout().flush()?;

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line)
}

/// The queried name paired with the final record's data, then the full chain.
fn print_answers(domain: &str, records: &[ResourceRecord]) {
    println!("\nANSWER SECTION:");
    if let Some(last) = records.last() {
        println!(
            "{domain}. {} {} {} {}",
            last.ttl, last.r_class, last.r_type, last.r_data
        );
    }
    for record in records {
        println!("{record}");
    }
}
