use std::{
    future::Future,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

use bytes::Bytes;
use dashmap::{mapref::entry::Entry, DashMap};
use futures::future::{BoxFuture, FutureExt, Shared};
use tracing::debug;

use crate::{
    data_model::{ReportPeriod, ReportType},
    error::ReportError,
};

pub type ReportKey = (ReportType, ReportPeriod);

type SharedReport = Shared<BoxFuture<'static, Result<Bytes, ReportError>>>;

/// Deduplicates concurrent report computations.
///
/// The first caller for a key installs its computation; callers arriving
/// while it runs await the same result instead of starting their own. The
/// entry is removed by the computation itself once it finishes. If every
/// caller drops its future first, the entry stays and the next caller for the
/// key resumes the unfinished computation.
#[derive(Default)]
pub struct InFlight {
    calls: Arc<DashMap<ReportKey, (u64, SharedReport)>>,
    next_generation: AtomicU64,
}

impl InFlight {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `compute` for `key` unless a computation for the same key is
    /// already running, in which case its result is awaited instead and
    /// `compute` is dropped without being polled.
    pub async fn run<F>(&self, key: ReportKey, compute: F) -> Result<Bytes, ReportError>
    where
        F: Future<Output = Result<Bytes, ReportError>> + Send + 'static,
    {
        let shared = match self.calls.entry(key) {
            Entry::Occupied(entry) => {
                debug!(
                    report_type = %key.0,
                    period = %key.1,
                    "joining in-flight report computation"
                );
                entry.get().1.clone()
            }
            Entry::Vacant(entry) => {
                let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
                let calls = self.calls.clone();
                let shared = async move {
                    let result = compute.await;
                    calls.remove_if(&key, |_, (entry_generation, _)| {
                        *entry_generation == generation
                    });
                    result
                }
                .boxed()
                .shared();
                entry.insert((generation, shared.clone()));
                shared
            }
        };
        shared.await
    }

    pub fn len(&self) -> usize {
        self.calls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }
}
