use clap::Parser;
use dns_resolver::{Resolver, Status};
use futures::StreamExt;
use mailrank_dmarc::DmarcEvaluation;
use mailrank_spf::SpfEvaluation;
use serde::Serialize;
use tabout::{Alignment, Column};

#[derive(Debug, Parser)]
/// Scores the SPF, DMARC and DKIM records of a list of domains.
///
/// Domains are evaluated concurrently. A failure to evaluate
/// one record is shown alongside the others rather than
/// stopping the report.
pub struct ReportCommand {
    /// The domains to evaluate
    #[arg(required = true)]
    domains: Vec<String>,

    /// The IP address of the sending host, used by
    /// `a` and `mx` mechanisms that don't name a domain
    #[arg(long, default_value = "")]
    ip: String,

    /// DKIM selectors to look up for each domain. May be repeated.
    #[arg(long = "selector")]
    selectors: Vec<String>,

    /// How many domains to evaluate at the same time
    #[arg(long, default_value = "8")]
    concurrency: usize,

    /// Instead of showing the human readable tabulated output,
    /// return the underlying json data.
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Serialize)]
struct DomainReport {
    domain: String,
    spf: Option<SpfEvaluation>,
    dmarc: Option<DmarcEvaluation>,
    dkim: Vec<KeyScore>,
    errors: Vec<String>,
    /// Set when at least one failure was temporary
    retry: bool,
}

impl DomainReport {
    fn failed(&mut self, what: &str, status: Status, err: &dyn std::fmt::Display) {
        tracing::warn!("{}: {what}: {err:#}", self.domain);
        self.errors.push(format!("{what}: {err:#}"));
        if status == Status::Tempfail {
            self.retry = true;
        }
    }
}

#[derive(Debug, Serialize)]
struct KeyScore {
    selector: String,
    score: i64,
}

impl ReportCommand {
    pub async fn run(&self, resolver: &dyn Resolver) -> anyhow::Result<()> {
        let reports: Vec<DomainReport> = futures::stream::iter(&self.domains)
            .map(|domain| self.evaluate_domain(resolver, domain))
            .buffered(self.concurrency.max(1))
            .collect()
            .await;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&reports)?);
            return Ok(());
        }

        let columns = [
            Column {
                name: "DOMAIN".to_string(),
                alignment: Alignment::Left,
            },
            Column {
                name: "SPF".to_string(),
                alignment: Alignment::Right,
            },
            Column {
                name: "DMARC".to_string(),
                alignment: Alignment::Right,
            },
            Column {
                name: "DKIM".to_string(),
                alignment: Alignment::Left,
            },
            Column {
                name: "RETRY".to_string(),
                alignment: Alignment::Left,
            },
            Column {
                name: "ERRORS".to_string(),
                alignment: Alignment::Left,
            },
        ];
        let mut rows = vec![];
        for report in reports {
            rows.push(vec![
                report.domain,
                report
                    .spf
                    .map(|spf| format!("{:.2}", spf.score))
                    .unwrap_or_else(|| "-".to_string()),
                report
                    .dmarc
                    .map(|dmarc| dmarc.score.to_string())
                    .unwrap_or_else(|| "-".to_string()),
                report
                    .dkim
                    .iter()
                    .map(|key| format!("{}={}", key.selector, key.score))
                    .collect::<Vec<_>>()
                    .join(" "),
                String::from(if report.retry { "yes" } else { "" }),
                report.errors.join("; "),
            ]);
        }
        tabout::tabulate_output(&columns, &rows, &mut std::io::stdout())?;

        Ok(())
    }

    async fn evaluate_domain(&self, resolver: &dyn Resolver, domain: &str) -> DomainReport {
        let mut report = DomainReport {
            domain: domain.to_string(),
            spf: None,
            dmarc: None,
            dkim: vec![],
            errors: vec![],
            retry: false,
        };

        match mailrank_spf::evaluate(resolver, domain, &self.ip).await {
            Ok(spf) => report.spf = Some(spf),
            Err(err) => report.failed("spf", err.status(), &err),
        }

        match mailrank_dmarc::evaluate(resolver, domain).await {
            Ok(dmarc) => report.dmarc = Some(dmarc),
            Err(err) => report.failed("dmarc", err.status(), &err),
        }

        for selector in &self.selectors {
            let score = mailrank_dkim::retrieve_key_profile(resolver, domain, selector)
                .await
                .and_then(|profile| profile.score());
            match score {
                Ok(score) => report.dkim.push(KeyScore {
                    selector: selector.clone(),
                    score,
                }),
                Err(err) => report.failed(&format!("dkim {selector}"), err.status(), &err),
            }
        }

        tracing::info!("{domain}: evaluated");
        report
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use dns_resolver::TestResolver;

    fn command(domains: &[&str], selectors: &[&str]) -> ReportCommand {
        ReportCommand {
            domains: domains.iter().map(|d| d.to_string()).collect(),
            ip: "192.0.2.1".to_string(),
            selectors: selectors.iter().map(|s| s.to_string()).collect(),
            concurrency: 2,
            json: false,
        }
    }

    #[tokio::test]
    async fn failures_are_collected_per_domain() {
        let resolver = TestResolver::default()
            .with_txt("example.com", "v=spf1 a -all")
            .with_txt("_dmarc.example.com", "v=DMARC1; p=reject")
            .with_txt("mail._domainkey.example.com", "v=DKIM1; t=y; p=")
            .with_failure("_dmarc.broken.example.com");
        let cmd = command(&["example.com", "broken.example.com"], &["mail"]);

        let report = cmd.evaluate_domain(&resolver, "example.com").await;
        assert!(report.errors.is_empty(), "{:?}", report.errors);
        assert!(!report.retry);
        k9::assert_equal!(report.dmarc.map(|dmarc| dmarc.score), Some(2));
        assert!(report.spf.is_some());
        k9::assert_equal!(report.dkim.len(), 1);
        k9::assert_equal!(report.dkim[0].score, 0);

        let report = cmd.evaluate_domain(&resolver, "broken.example.com").await;
        assert!(report.spf.is_none());
        assert!(report.dmarc.is_none());
        assert!(report.dkim.is_empty());
        k9::assert_equal!(report.errors.len(), 3);
        // the DMARC lookup failure is temporary
        assert!(report.retry);
    }

    #[tokio::test]
    async fn missing_records_are_not_retried() {
        let resolver = TestResolver::default();
        let cmd = command(&["example.org"], &[]);

        let report = cmd.evaluate_domain(&resolver, "example.org").await;
        k9::assert_equal!(report.errors.len(), 2);
        assert!(!report.retry);
    }
}
