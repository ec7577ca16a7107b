// src/crawl/observe.rs
// =============================================================================
// What the crawler reports while it runs.
//
// Every visited page produces either one Edge per outgoing link, or a single
// NoneFound when it has no links. The crawler hands these to a sink; the sink
// decides whether to print them, collect them, or both.
//
// Line format (one observation per line):
//   [parent]---------------------->[child]
//   [url]----------------------> NONE FOUND
// =============================================================================

use std::fmt;
use std::sync::{Mutex, MutexGuard};

use serde::Serialize;

const ARROW: &str = "---------------------->";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Observation {
    /// `from` links to `to`; emitted before `to` is crawled
    Edge { from: String, to: String },
    /// `url` was fetched and has no outgoing links
    NoneFound { url: String },
}

impl Observation {
    pub fn edge(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self::Edge { from: from.into(), to: to.into() }
    }

    pub fn none_found(url: impl Into<String>) -> Self {
        Self::NoneFound { url: url.into() }
    }
}

impl fmt::Display for Observation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Observation::Edge { from, to } => write!(f, "[{}]{}[{}]", from, ARROW, to),
            Observation::NoneFound { url } => write!(f, "[{}]{} NONE FOUND", url, ARROW),
        }
    }
}

/// Receives observations from crawl branches, possibly from many threads.
pub trait ObservationSink: Send + Sync {
    fn emit(&self, observation: Observation);
}

/// Prints each observation to stdout as soon as it happens.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdoutSink;

impl ObservationSink for StdoutSink {
    fn emit(&self, observation: Observation) {
        println!("{}", observation);
    }
}

/// Keeps observations in emission order.
#[derive(Debug, Default)]
pub struct CollectingSink {
    seen: Mutex<Vec<Observation>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// A copy of everything emitted so far.
    pub fn observations(&self) -> Vec<Observation> {
        self.lock().clone()
    }

    /// Observations rendered as output lines.
    pub fn lines(&self) -> Vec<String> {
        self.lock().iter().map(ToString::to_string).collect()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Observation>> {
        self.seen.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl ObservationSink for CollectingSink {
    fn emit(&self, observation: Observation) {
        self.lock().push(observation);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edge_line_format() {
        let line = Observation::edge("https://golang.org/", "https://golang.org/pkg/").to_string();
        assert_eq!(
            line,
            "[https://golang.org/]---------------------->[https://golang.org/pkg/]"
        );
    }

    #[test]
    fn test_none_found_line_format() {
        let line = Observation::none_found("https://golang.org/cmd/").to_string();
        assert_eq!(line, "[https://golang.org/cmd/]----------------------> NONE FOUND");
    }

    #[test]
    fn test_json_shape() {
        let json = serde_json::to_value(Observation::edge("A", "B")).unwrap();
        assert_eq!(json["kind"], "edge");
        assert_eq!(json["from"], "A");
        assert_eq!(json["to"], "B");

        let json = serde_json::to_value(Observation::none_found("C")).unwrap();
        assert_eq!(json["kind"], "none_found");
        assert_eq!(json["url"], "C");
    }

    #[test]
    fn test_collecting_sink_keeps_order() {
        let sink = CollectingSink::new();
        sink.emit(Observation::edge("A", "B"));
        sink.emit(Observation::none_found("B"));

        assert_eq!(
            sink.observations(),
            vec![Observation::edge("A", "B"), Observation::none_found("B")]
        );
        assert_eq!(sink.lines().len(), 2);
    }
}
