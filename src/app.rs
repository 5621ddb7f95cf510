use std::io::Write;
use std::path::PathBuf;

use human_bytes::human_bytes;
use tracing::{info, warn};

use crate::conf::Config;
use crate::error::{ImportError, Result};
use crate::es_client::{build_http_client, EsClient};
use crate::input::{default_index_name, InputProvider};
use crate::models::bulk::BulkSummary;
use crate::payload::PayloadBuilder;

#[derive(Debug, Clone)]
pub struct Target {
    pub csv_path: PathBuf,
    pub index_name: String,
    pub host: String,
}

#[derive(Debug)]
pub enum Outcome {
    Sent { response: String },
    Rejected { error: ImportError },
    SkippedEmpty,
    DryRun { records: usize },
}

/// All three values are gathered before anything is read or sent.
pub fn collect_target(provider: &mut dyn InputProvider, config: &Config) -> Result<Target> {
    let csv_path = provider.file_path()?;
    let index_default = default_index_name(config.get_index_prefix(), &csv_path);
    let index_name = provider.index_name(&index_default)?;
    let host = provider.host(config.get_default_host())?;

    info!(
        "Target csv_path={:?}, index={}, host={}",
        csv_path, index_name, host
    );
    Ok(Target {
        csv_path,
        index_name,
        host,
    })
}

pub async fn run(
    provider: &mut dyn InputProvider,
    config: &Config,
    dry_run: bool,
    out: &mut dyn Write,
) -> Result<Outcome> {
    let target = collect_target(provider, config)?;

    let body = PayloadBuilder::new(config.is_ascii_only()).build_from_path(&target.csv_path)?;
    info!(
        "Prepared {} records, body size {}",
        body.get_records(),
        human_bytes(body.len() as f64)
    );

    if dry_run {
        out.write_all(body.get_content().as_bytes())?;
        return Ok(Outcome::DryRun {
            records: body.get_records(),
        });
    }

    if body.is_empty() && config.is_skip_empty() {
        warn!("{:?} has no data rows, nothing sent", target.csv_path);
        return Ok(Outcome::SkippedEmpty);
    }

    let client = EsClient::new(
        &target.host,
        build_http_client(config.get_timeout_seconds())?,
    );
    match client.bulk(&target.index_name, body.into_content()).await {
        Ok(response) => {
            report_summary(&response);
            writeln!(out, "{}", response)?;
            Ok(Outcome::Sent { response })
        }
        Err(error @ ImportError::Submission { .. }) => {
            if let Some(body) = error.response_body() {
                writeln!(out, "{}", body)?;
            }
            writeln!(out, "{}", error)?;
            Ok(Outcome::Rejected { error })
        }
        Err(error) => Err(error),
    }
}

fn report_summary(response: &str) {
    let Some(summary) = BulkSummary::parse(response) else {
        return;
    };
    if summary.has_errors() {
        warn!(
            "Bulk finished with {} of {} items failed (took {} ms), first: {}",
            summary.get_failed(),
            summary.get_items(),
            summary.get_took(),
            summary.get_first_failure().map(String::as_str).unwrap_or("-")
        );
    } else {
        info!(
            "Bulk created {} items in {} ms",
            summary.get_items(),
            summary.get_took()
        );
    }
}
