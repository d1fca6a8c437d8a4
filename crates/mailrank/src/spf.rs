use clap::Parser;
use dns_resolver::Resolver;
use mailrank_spf::{Qualifier, RangeSet, SpfEvaluation, SpfProfile};
use std::collections::BTreeMap;
use tabout::{Alignment, Column};

#[derive(Debug, Parser)]
/// Scores the SPF policy of a domain.
///
/// The policy is fetched from the TXT records of the domain,
/// unless it is supplied through --record.
pub struct SpfCommand {
    /// The domain whose policy should be scored
    domain: String,

    /// The IP address of the sending host, used by
    /// `a` and `mx` mechanisms that don't name a domain
    #[arg(long, default_value = "")]
    ip: String,

    /// Score this record text instead of the published record
    #[arg(long)]
    record: Option<String>,

    /// Instead of showing the human readable tabulated output,
    /// return the underlying json data.
    #[arg(long)]
    json: bool,
}

impl SpfCommand {
    pub async fn run(&self, resolver: &dyn Resolver) -> anyhow::Result<()> {
        let evaluation = match &self.record {
            Some(record) => {
                let profile = SpfProfile::parse(record, &self.domain, &self.ip, resolver).await?;
                let score = mailrank_spf::score_spf(&profile);
                SpfEvaluation { profile, score }
            }
            None => mailrank_spf::evaluate(resolver, &self.domain, &self.ip).await?,
        };

        if self.json {
            println!("{}", serde_json::to_string_pretty(&evaluation)?);
            return Ok(());
        }

        let profile = &evaluation.profile;
        let columns = [
            Column {
                name: "MECHANISM".to_string(),
                alignment: Alignment::Left,
            },
            Column {
                name: "QUALIFIER".to_string(),
                alignment: Alignment::Left,
            },
            Column {
                name: "VALUE".to_string(),
                alignment: Alignment::Left,
            },
        ];
        let mut rows = vec![];
        range_rows(&mut rows, "ip4", &profile.ip4);
        range_rows(&mut rows, "ip6", &profile.ip6);
        range_rows(&mut rows, "a", &profile.a);
        range_rows(&mut rows, "mx", &profile.mx);
        name_rows(&mut rows, "ptr", &profile.ptr);
        name_rows(&mut rows, "exists", &profile.exists);
        name_rows(&mut rows, "include", &profile.include);
        if let Some(all) = profile.all {
            rows.push(vec!["all".to_string(), all.to_string(), String::new()]);
        }

        println!("{}", profile.record);
        println!();
        tabout::tabulate_output(&columns, &rows, &mut std::io::stdout())?;
        println!();
        println!("score: {:.2}", evaluation.score);

        Ok(())
    }
}

fn range_rows(rows: &mut Vec<Vec<String>>, mechanism: &str, ranges: &RangeSet) {
    for qualifier in [
        Qualifier::Pass,
        Qualifier::Fail,
        Qualifier::SoftFail,
        Qualifier::Neutral,
    ] {
        for net in ranges.get(qualifier) {
            rows.push(vec![
                mechanism.to_string(),
                qualifier.to_string(),
                net.to_string(),
            ]);
        }
    }
}

fn name_rows(rows: &mut Vec<Vec<String>>, mechanism: &str, names: &BTreeMap<String, Qualifier>) {
    for (name, qualifier) in names {
        rows.push(vec![mechanism.to_string(), qualifier.to_string(), name.clone()]);
    }
}
