//! Prometheus metrics for answered questions

use prometheus::{Encoder, Histogram, HistogramOpts, IntCounterVec, Opts, Registry, TextEncoder};
use std::time::Duration;

pub struct Metrics {
    registry: Registry,
    questions: IntCounterVec,
    answer_seconds: Histogram,
}

impl Metrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let questions = IntCounterVec::new(
            Opts::new("nlq_questions_total", "Questions handled, by mode and outcome"),
            &["mode", "outcome"],
        )?;
        let answer_seconds = Histogram::with_opts(
            HistogramOpts::new("nlq_answer_seconds", "End-to-end answer latency")
                .buckets(vec![0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]),
        )?;

        registry.register(Box::new(questions.clone()))?;
        registry.register(Box::new(answer_seconds.clone()))?;

        Ok(Self {
            registry,
            questions,
            answer_seconds,
        })
    }

    /// Record one handled question; `outcome` is `ok` or an error kind tag
    pub fn observe(&self, mode: &str, outcome: &str, elapsed: Duration) {
        self.questions.with_label_values(&[mode, outcome]).inc();
        self.answer_seconds.observe(elapsed.as_secs_f64());
    }

    /// Text exposition format for `/metrics`
    pub fn render(&self) -> Result<String, prometheus::Error> {
        let mut buf = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buf)?;
        String::from_utf8(buf).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

impl std::fmt::Debug for Metrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Metrics").finish_non_exhaustive()
    }
}
