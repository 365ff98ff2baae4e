//! # Fetched
//! Outcome of a call that may have to substitute fabricated data.
//!
//! Upstream feeds and quote endpoints fail routinely. Instead of silently
//! swapping in mock records, every service call reports which of three
//! things happened:
//! - `Live`: the data came from the upstream.
//! - `Degraded`: some or all of it is fallback data; `reason` says why.
//! - `Failed`: nothing usable could be produced.

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "value", rename_all = "lowercase")]
pub enum Fetched<T> {
    Live(T),
    Degraded { data: T, reason: String },
    Failed(String),
}

impl<T> Fetched<T> {
    pub fn degraded(data: T, reason: impl Into<String>) -> Self {
        Fetched::Degraded {
            data,
            reason: reason.into(),
        }
    }

    pub fn is_live(&self) -> bool {
        matches!(self, Fetched::Live(_))
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, Fetched::Degraded { .. })
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            Fetched::Live(d) | Fetched::Degraded { data: d, .. } => Some(d),
            Fetched::Failed(_) => None,
        }
    }

    pub fn into_data(self) -> Option<T> {
        match self {
            Fetched::Live(d) | Fetched::Degraded { data: d, .. } => Some(d),
            Fetched::Failed(_) => None,
        }
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            Fetched::Live(_) => None,
            Fetched::Degraded { reason, .. } | Fetched::Failed(reason) => Some(reason),
        }
    }

    /// Transform the payload, keeping the live/degraded/failed status.
    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Fetched<U> {
        match self {
            Fetched::Live(d) => Fetched::Live(f(d)),
            Fetched::Degraded { data, reason } => Fetched::Degraded {
                data: f(data),
                reason,
            },
            Fetched::Failed(r) => Fetched::Failed(r),
        }
    }
}

impl<T> Fetched<Vec<T>> {
    /// Merge per-item outcomes of a fan-out.
    ///
    /// All live -> `Live`. Nothing usable -> `Failed` (unless the input is
    /// empty). Anything in between -> `Degraded` with a count of the
    /// non-live items.
    pub fn collect(parts: Vec<Fetched<T>>) -> Fetched<Vec<T>> {
        let total = parts.len();
        let mut data = Vec::with_capacity(total);
        let mut not_live = 0usize;
        let mut first_reason: Option<String> = None;

        for p in parts {
            match p {
                Fetched::Live(d) => data.push(d),
                Fetched::Degraded { data: d, reason } => {
                    not_live += 1;
                    first_reason.get_or_insert(reason);
                    data.push(d);
                }
                Fetched::Failed(reason) => {
                    not_live += 1;
                    first_reason.get_or_insert(reason);
                }
            }
        }

        if not_live == 0 {
            return Fetched::Live(data);
        }
        let first = first_reason.unwrap_or_default();
        if data.is_empty() {
            return Fetched::Failed(first);
        }
        Fetched::degraded(
            data,
            format!("{not_live} of {total} upstream calls did not return live data (first: {first})"),
        )
    }
}
