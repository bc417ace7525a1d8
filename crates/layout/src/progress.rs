#![forbid(unsafe_code)]

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Phase {
    Initializing,
    RegisteringNodes,
    RegisteringEdges,
    Solving,
    Extracting,
}

impl Phase {
    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Initializing => "initializing",
            Phase::RegisteringNodes => "registering_nodes",
            Phase::RegisteringEdges => "registering_edges",
            Phase::Solving => "solving",
            Phase::Extracting => "extracting",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Progress {
    /// In `[0, 1]`, never lower than the previous report of the same run.
    pub fraction: f64,
    pub phase: Phase,
    pub message: String,
}

/// Fractions reported at each phase boundary.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProgressSchedule {
    pub nodes_end: f64,
    pub edges_start: f64,
    pub edges_end: f64,
    pub solving: f64,
    pub extracting: f64,
    /// Report once per this many registered nodes or edges.
    pub report_every: usize,
}

impl Default for ProgressSchedule {
    fn default() -> Self {
        Self {
            nodes_end: 0.3,
            edges_start: 0.4,
            edges_end: 0.6,
            solving: 0.6,
            extracting: 0.9,
            report_every: 100,
        }
    }
}

impl ProgressSchedule {
    pub(crate) fn reports_at(&self, index: usize) -> bool {
        index % self.report_every.max(1) == 0
    }
}

/// Forwards progress to a sink, clamping fractions into `[0, 1]` and never
/// below the last value sent.
pub(crate) struct ProgressReporter<'a> {
    sink: &'a mut dyn FnMut(Progress),
    last: f64,
}

impl<'a> ProgressReporter<'a> {
    pub(crate) fn new(sink: &'a mut dyn FnMut(Progress)) -> Self {
        Self { sink, last: 0.0 }
    }

    pub(crate) fn report(&mut self, phase: Phase, fraction: f64, message: impl Into<String>) {
        let fraction = if fraction.is_nan() {
            self.last
        } else {
            fraction.clamp(0.0, 1.0).max(self.last)
        };
        self.last = fraction;
        (self.sink)(Progress {
            fraction,
            phase,
            message: message.into(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reporter_never_goes_backwards() {
        let mut seen = Vec::new();
        {
            let mut sink = |p: Progress| seen.push(p.fraction);
            let mut reporter = ProgressReporter::new(&mut sink);
            reporter.report(Phase::Initializing, 0.5, "a");
            reporter.report(Phase::RegisteringNodes, 0.2, "b");
            reporter.report(Phase::Solving, 7.0, "c");
            reporter.report(Phase::Extracting, f64::NAN, "d");
        }
        assert_eq!(seen, vec![0.5, 0.5, 1.0, 1.0]);
    }

    #[test]
    fn zero_interval_reports_every_item() {
        let schedule = ProgressSchedule {
            report_every: 0,
            ..ProgressSchedule::default()
        };
        assert!(schedule.reports_at(0));
        assert!(schedule.reports_at(7));
        assert!(ProgressSchedule::default().reports_at(200));
        assert!(!ProgressSchedule::default().reports_at(150));
    }
}
