use anyhow::Context;
use clap::Parser;
use dns_resolver::{HickoryResolver, Resolver};
use logging::{DiagnosticFormat, LoggingConfig};
use std::net::IpAddr;

mod dkim_key;
mod dkim_signature;
mod dmarc;
mod logging;
mod report;
mod spf;

const NAMESERVER_ENV_VAR: &str = "MAILRANK_NAMESERVER";

/// Scores the email authentication posture of a domain
/// from its published SPF, DKIM and DMARC records.
///
/// Diagnostic logging is controlled by the MAILRANK_LOG
/// environment variable, using the tracing EnvFilter syntax.
#[derive(Debug, Parser)]
#[command(about, version)]
struct Opt {
    /// Nameserver to send DNS queries to. May be repeated.
    /// You may set MAILRANK_NAMESERVER in the environment to a
    /// comma separated list of addresses instead.
    /// If not specified, the system resolver configuration is used.
    #[arg(long = "nameserver")]
    nameservers: Vec<IpAddr>,

    /// How to format the diagnostic log written to stderr
    #[arg(long, value_enum, default_value = "full")]
    diag_format: DiagnosticFormat,

    #[command(subcommand)]
    cmd: SubCommand,
}

impl Opt {
    fn nameservers(&self) -> anyhow::Result<Vec<IpAddr>> {
        if !self.nameservers.is_empty() {
            return Ok(self.nameservers.clone());
        }

        let Ok(list) = std::env::var(NAMESERVER_ENV_VAR) else {
            return Ok(vec![]);
        };
        list.split(',')
            .map(str::trim)
            .filter(|addr| !addr.is_empty())
            .map(|addr| {
                addr.parse()
                    .with_context(|| format!("invalid address {addr:?} in {NAMESERVER_ENV_VAR}"))
            })
            .collect()
    }

    fn resolver(&self) -> anyhow::Result<HickoryResolver> {
        let nameservers = self.nameservers()?;
        if nameservers.is_empty() {
            Ok(HickoryResolver::from_system_conf()?)
        } else {
            tracing::debug!("using nameservers {nameservers:?}");
            Ok(HickoryResolver::with_nameservers(&nameservers))
        }
    }
}

#[derive(Debug, Parser)]
enum SubCommand {
    Spf(spf::SpfCommand),
    Dmarc(dmarc::DmarcCommand),
    DkimKey(dkim_key::DkimKeyCommand),
    DkimSignature(dkim_signature::DkimSignatureCommand),
    Report(report::ReportCommand),
}

impl SubCommand {
    async fn run(&self, resolver: &dyn Resolver) -> anyhow::Result<()> {
        match self {
            Self::Spf(cmd) => cmd.run(resolver).await,
            Self::Dmarc(cmd) => cmd.run(resolver).await,
            Self::DkimKey(cmd) => cmd.run(resolver).await,
            Self::DkimSignature(cmd) => cmd.run(resolver).await,
            Self::Report(cmd) => cmd.run(resolver).await,
        }
    }
}

/// Prints a two column table of field names and values
pub fn print_fields(fields: Vec<(&str, String)>) -> anyhow::Result<()> {
    let columns = [
        tabout::Column {
            name: "FIELD".to_string(),
            alignment: tabout::Alignment::Left,
        },
        tabout::Column {
            name: "VALUE".to_string(),
            alignment: tabout::Alignment::Left,
        },
    ];
    let rows: Vec<Vec<String>> = fields
        .into_iter()
        .map(|(name, value)| vec![name.to_string(), value])
        .collect();
    tabout::tabulate_output(&columns, &rows, &mut std::io::stdout())?;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let opts = Opt::parse();

    LoggingConfig {
        filter_env_var: "MAILRANK_LOG",
        default_filter: "mailrank=info,dns_resolver=info",
        diag_format: opts.diag_format,
    }
    .init()?;

    let resolver = opts.resolver()?;
    opts.cmd.run(&resolver).await
}
