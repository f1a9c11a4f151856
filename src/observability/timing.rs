//! Per-request phase timing.
//!
//! Records named phases of one request (cache read, upstream fetch, cache
//! write, total) and renders them as a `server-timing` response header value.

use std::collections::HashMap;
use std::time::Instant;

struct Measure {
    name: &'static str,
    duration_ms: f64,
}

/// Collects phase measurements for a single request.
///
/// Phases are opened with [`mark`](Self::mark) and closed with
/// [`measure`](Self::measure); instantaneous events (cache hit/miss) are
/// recorded with [`marker`](Self::marker) and rendered without a duration.
#[derive(Default)]
pub struct PhaseTimer {
    marks: HashMap<&'static str, Instant>,
    measures: Vec<Measure>,
}

impl PhaseTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start timing the named phase.
    pub fn mark(&mut self, name: &'static str) {
        self.marks.insert(name, Instant::now());
    }

    /// Close a phase opened with `mark` and record its duration.
    /// A measure without a prior mark is ignored.
    pub fn measure(&mut self, name: &'static str) {
        if let Some(start) = self.marks.get(name) {
            self.measures.push(Measure {
                name,
                duration_ms: start.elapsed().as_secs_f64() * 1000.0,
            });
        }
    }

    /// Record an instantaneous marker.
    pub fn marker(&mut self, name: &'static str) {
        self.measures.push(Measure {
            name,
            duration_ms: 0.0,
        });
    }

    /// Render all measures in recording order as a `server-timing` value:
    /// `name;dur=<ms>`, with the duration omitted when it rounds to zero.
    pub fn header_value(&self) -> String {
        self.measures
            .iter()
            .map(|m| {
                if m.duration_ms > 0.0 {
                    format!("{};dur={:.1}", m.name, m.duration_ms)
                } else {
                    m.name.to_string()
                }
            })
            .collect::<Vec<_>>()
            .join(",")
    }
}
