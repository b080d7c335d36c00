//! Orchestrator: catalog first, then the dependent sources, one identifier
//! at a time, rows written as soon as they are merged.

use std::collections::HashMap;
use std::fs;

use anyhow::{Context, Result};
use indicatif::ProgressBar;
use steamstats_core::progress::short_label;
use steamstats_core::{
    AppId, MergedRecord, PartialRecord, ResultSet, SharedProgress, Transport, TsvSink,
    export_record, is_shutdown_requested,
};
use steamstats_sources::{CatalogSource, FetchPartial, LookupKey};

use crate::context::RunContext;
use crate::options::RunOptions;
use crate::summary::RunSummary;

/// Records and statistics of one run
#[derive(Debug)]
pub struct RunOutput {
    pub records: ResultSet,
    pub summary: RunSummary,
}

/// Drives the sources over an identifier list.
///
/// Account sources (achievements, playtime) are called for every catalogued
/// identifier; extra sources only when [`RunOptions::extra_data`] is set.
pub struct Runner {
    catalog: CatalogSource,
    account: Vec<Box<dyn FetchPartial>>,
    extras: Vec<Box<dyn FetchPartial>>,
    transport: Transport,
    options: RunOptions,
    progress: Option<SharedProgress>,
}

impl Runner {
    pub fn new(catalog: CatalogSource, transport: Transport, options: RunOptions) -> Self {
        Self {
            catalog,
            account: Vec::new(),
            extras: Vec::new(),
            transport,
            options,
            progress: None,
        }
    }

    pub fn with_account_source(mut self, source: Box<dyn FetchPartial>) -> Self {
        self.account.push(source);
        self
    }

    pub fn with_extra_source(mut self, source: Box<dyn FetchPartial>) -> Self {
        self.extras.push(source);
        self
    }

    pub fn with_progress(mut self, progress: SharedProgress) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn options(&self) -> &RunOptions {
        &self.options
    }

    /// Names of the sources a run will call, in call order
    pub fn source_names(&self) -> Vec<&'static str> {
        let mut names = vec![self.catalog.source()];
        names.extend(self.account.iter().map(|s| s.source()));
        if self.options.extra_data {
            names.extend(self.extras.iter().map(|s| s.source()));
        }
        names
    }

    pub fn run(&self, ctx: &RunContext, ids: &[AppId]) -> Result<RunOutput> {
        let mut summary = RunSummary::new(ids.len());
        let mut records = ResultSet::new();

        let mut sink = match &self.options.output_path {
            Some(path) => Some(
                TsvSink::open(path, self.options.flush_every)
                    .with_context(|| format!("Failed to open {}", path.display()))?,
            ),
            None => None,
        };
        if self.options.separate_export {
            fs::create_dir_all(&self.options.export_dir).with_context(|| {
                format!("Failed to create {}", self.options.export_dir.display())
            })?;
        }

        let batch_size = self.options.effective_batch_size();
        log::info!(
            "Fetching {} identifiers from {} (batch size {batch_size})",
            ids.len(),
            self.source_names().join(", ")
        );
        let pb = match &self.progress {
            Some(progress) => progress.identifier_bar(ids.len() as u64),
            None => ProgressBar::hidden(),
        };

        let mut first = true;
        'chunks: for chunk in ids.chunks(batch_size) {
            if is_shutdown_requested() {
                summary.interrupted = true;
                break;
            }
            let mut batched = if self.options.use_batch {
                self.catalog.store().get_items_batch(chunk)
            } else {
                HashMap::new()
            };

            for &appid in chunk {
                if is_shutdown_requested() {
                    summary.interrupted = true;
                    break 'chunks;
                }
                if !first {
                    self.transport.pause(self.options.pace);
                }
                first = false;
                pb.set_message(appid.to_string());

                if records.contains(appid) {
                    log::debug!("{appid}: already processed");
                    summary.duplicates += 1;
                    pb.inc(1);
                    continue;
                }

                match self.fetch_one(ctx, appid, batched.remove(&appid), &mut summary) {
                    Some(record) => {
                        if let Some(name) = record.name() {
                            pb.set_message(short_label(name, 40));
                        }
                        self.write(&record, sink.as_mut())?;
                        records.push(record);
                        summary.exported += 1;
                    }
                    None if is_shutdown_requested() => {
                        summary.interrupted = true;
                        break 'chunks;
                    }
                    None => summary.skipped += 1,
                }
                pb.inc(1);
            }
        }

        if let Some(sink) = sink {
            let path = sink.path().to_path_buf();
            let rows = sink
                .finish()
                .with_context(|| format!("Failed to flush {}", path.display()))?;
            log::info!("{rows} rows written to {}", path.display());
            summary.output_path = Some(path);
        }
        pb.finish_and_clear();
        summary.elapsed = ctx.elapsed();

        Ok(RunOutput { records, summary })
    }

    /// Catalog lookup, then every dependent source. `None` when the catalog
    /// has nothing for `appid` or a shutdown cut the lookups short.
    fn fetch_one(
        &self,
        ctx: &RunContext,
        appid: AppId,
        batched: Option<PartialRecord>,
        summary: &mut RunSummary,
    ) -> Option<MergedRecord> {
        let catalog = match batched {
            Some(record) => {
                summary.batch_hits += 1;
                Some(record)
            }
            None => self.catalog.fetch_partial(&LookupKey::new(appid, None)),
        };
        if is_shutdown_requested() {
            log::info!("{appid}: interrupted during catalog lookup, not exported");
            return None;
        }
        summary.record_source(self.catalog.source(), catalog.is_some());
        let Some(catalog) = catalog else {
            log::warn!("{appid}: no catalog data, skipped");
            return None;
        };

        let name = catalog.text("name").map(str::to_string);
        let key = LookupKey::new(appid, name.as_deref());
        let extras: &[Box<dyn FetchPartial>] = if self.options.extra_data {
            &self.extras
        } else {
            &[]
        };

        let mut partials = vec![catalog];
        // A half-filled record is never exported; the identifier stays pending.
        for source in self.account.iter().chain(extras) {
            let partial = source.fetch_partial(&key);
            if is_shutdown_requested() {
                log::info!("{appid}: interrupted during {}, not exported", source.source());
                return None;
            }
            summary.record_source(source.source(), partial.is_some());
            partials.extend(partial);
        }

        let record = MergedRecord::merge(appid, ctx.export_date(), ctx.export_time(), partials);
        log::debug!(
            "{appid}: {} ({} fields)",
            record.name().unwrap_or_default(),
            record.field_count()
        );
        Some(record)
    }

    fn write(&self, record: &MergedRecord, sink: Option<&mut TsvSink>) -> Result<()> {
        if let Some(sink) = sink {
            sink.write_record(record)
                .with_context(|| format!("Failed to write to {}", sink.path().display()))?;
        }
        if self.options.separate_export {
            export_record(&self.options.export_dir, record)
                .with_context(|| format!("Failed to export {}", record.appid))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use steamstats_core::RetryPolicy;
    use steamstats_core::testing::{RecordingSleep, ScriptedGet};
    use steamstats_sources::SteamStore;

    struct Named(&'static str);

    impl FetchPartial for Named {
        fn source(&self) -> &'static str {
            self.0
        }

        fn fetch_partial(&self, _key: &LookupKey<'_>) -> Option<PartialRecord> {
            None
        }
    }

    fn runner(options: RunOptions) -> Runner {
        let transport = Transport::with_parts(
            Arc::new(ScriptedGet::new()),
            Arc::new(RecordingSleep::default()),
            RetryPolicy::default(),
        );
        let catalog = CatalogSource::new(SteamStore::new(transport.clone()));
        Runner::new(catalog, transport, options)
            .with_account_source(Box::new(Named("achievements")))
            .with_extra_source(Box::new(Named("deals")))
    }

    #[test]
    fn extras_listed_only_when_enabled() {
        let r = runner(RunOptions::default());
        assert_eq!(r.source_names(), vec!["catalog", "achievements"]);
        let r = runner(RunOptions {
            extra_data: true,
            ..Default::default()
        });
        assert_eq!(r.source_names(), vec!["catalog", "achievements", "deals"]);
    }
}
