use std::collections::BTreeMap;

/// Metric key: the emitting module and a static metric name.
pub type MetricKey = (String, &'static str);

/// Deterministic counters, grouped by module.
///
/// Counts must not depend on wall-clock time or unordered iteration.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Metrics {
    counters: BTreeMap<MetricKey, u64>,
}

fn key(source: &str, name: &'static str) -> MetricKey {
    (source.to_string(), name)
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn counter(&self, source: &str, name: &'static str) -> u64 {
        self.counters.get(&key(source, name)).copied().unwrap_or(0)
    }

    pub fn inc_counter(&mut self, source: &str, name: &'static str, by: u64) {
        *self.counters.entry(key(source, name)).or_insert(0) += by;
    }
}

#[cfg(test)]
mod tests {
    use super::Metrics;

    #[test]
    fn counters_are_scoped_by_source() {
        let mut m = Metrics::new();
        m.inc_counter("wellbores", "filter_changes", 2);
        m.inc_counter("wellbores", "filter_changes", 1);
        m.inc_counter("fields", "filter_changes", 1);
        assert_eq!(m.counter("wellbores", "filter_changes"), 3);
        assert_eq!(m.counter("fields", "filter_changes"), 1);
        assert_eq!(m.counter("geojson", "filter_changes"), 0);
    }
}
