use anyhow::{bail, Context, Result};
use tracing::debug;

use crate::client::retry::{with_retry, RetryObserver, RetryPolicy};
use crate::client::IssueSource;
use crate::config::AppConfig;
use crate::model::issue::Issue;
use crate::projector::project_record;
use crate::schema::guess::guess_schema;
use crate::schema::ColumnConfig;
use crate::sink::RowSink;

/// Sample size for the guess pass and the preview pass.
pub const GUESS_RECORDS_COUNT: u32 = 10;
pub const PREVIEW_RECORDS_COUNT: u32 = 10;

/// Drives the fetch -> flatten -> project flow. Both the guess pass and the
/// run pass go through the same source and retry policy.
pub struct Pipeline<'a> {
    source: &'a dyn IssueSource,
    policy: RetryPolicy,
    observer: &'a dyn RetryObserver,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        source: &'a dyn IssueSource,
        policy: RetryPolicy,
        observer: &'a dyn RetryObserver,
    ) -> Self {
        Self {
            source,
            policy,
            observer,
        }
    }

    async fn fetch_page(&self, offset: u32, limit: u32) -> Result<Vec<Issue>> {
        with_retry(&self.policy, self.observer, || {
            self.source.fetch_issues_page(offset, limit)
        })
        .await
        .context("Issue retrieval failed; check uri, credentials and retry settings")
    }

    /// Infer a column schema from a small sample of records.
    pub async fn guess(&self) -> Result<Vec<ColumnConfig>> {
        let issues = self.fetch_page(0, GUESS_RECORDS_COUNT).await?;
        Ok(guess_schema(&issues)?)
    }

    /// Project the first few records against a fixed schema.
    pub async fn preview(&self, columns: &[ColumnConfig], sink: &mut dyn RowSink) -> Result<usize> {
        let issues = self.fetch_page(0, PREVIEW_RECORDS_COUNT).await?;
        for issue in &issues {
            project_record(issue, columns, sink);
        }
        Ok(issues.len())
    }

    /// Full extraction: pages are fetched in offset order and each record is
    /// emitted before the next page is requested. A page shorter than
    /// `page_size` ends the loop.
    pub async fn run(
        &self,
        columns: &[ColumnConfig],
        page_size: u32,
        sink: &mut dyn RowSink,
    ) -> Result<usize> {
        let mut offset = 0u32;
        let mut total = 0usize;
        loop {
            let issues = self.fetch_page(offset, page_size).await?;
            for issue in &issues {
                project_record(issue, columns, sink);
            }
            total += issues.len();
            debug!(offset, fetched = issues.len(), total, "processed issues page");

            if (issues.len() as u32) < page_size {
                break;
            }
            offset += page_size;
        }
        Ok(total)
    }

    /// Columns for the run/preview passes: the declared list, or a fresh
    /// guess when `dynamic_schema` is set.
    pub async fn resolve_columns(&self, config: &AppConfig) -> Result<Vec<ColumnConfig>> {
        if config.dynamic_schema {
            return self.guess().await;
        }
        if config.columns.is_empty() {
            bail!("No columns declared; add [[columns]] entries or set dynamic_schema = true");
        }
        Ok(config.columns.clone())
    }
}
