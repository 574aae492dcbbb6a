//! Scripted reasoning client and recording backend

use relearn::analysis::{
    AnalysisBackend, AnalysisResult, Classifier, DirectBackend, FailureSignal, ReasoningClient,
    ReasoningError,
};
use relearn::config::AnalysisConfig;
use std::cell::RefCell;
use std::rc::Rc;

pub const DIVISION_NARRATIVE: &str = "safe_divide returns 0 when the divisor is zero, but the test \
expects None. The guard against ZeroDivisionError returns the wrong sentinel value.";

pub const DIVISION_RULE: &str = "### Division by Zero Handling\n\
- **Rule**: Return None from division helpers when the divisor is zero\n\
- **When**: Implementing arithmetic helpers that guard against ZeroDivisionError\n\
- **Why**: Callers and tests check for None, not a numeric sentinel";

/// Answers root-cause calls with `narrative` and rule calls with `rule`,
/// recording every system prompt it receives.
pub struct ScriptedReasoning {
    narrative: String,
    rule: String,
    systems: Rc<RefCell<Vec<String>>>,
}

impl ScriptedReasoning {
    pub fn new(narrative: &str, rule: &str) -> (Self, Rc<RefCell<Vec<String>>>) {
        let systems = Rc::new(RefCell::new(Vec::new()));
        (
            Self {
                narrative: narrative.to_string(),
                rule: rule.to_string(),
                systems: systems.clone(),
            },
            systems,
        )
    }
}

impl ReasoningClient for ScriptedReasoning {
    fn complete(&self, system: &str, user: &str, _max_tokens: u32) -> Result<String, ReasoningError> {
        self.systems.borrow_mut().push(system.to_string());
        if user.starts_with("Based on this root cause analysis") {
            Ok(self.rule.clone())
        } else {
            Ok(self.narrative.clone())
        }
    }
}

/// The real direct backend driven by a scripted client.
pub fn direct_backend(narrative: &str, rule: &str) -> (DirectBackend, Rc<RefCell<Vec<String>>>) {
    let (client, systems) = ScriptedReasoning::new(narrative, rule);
    let backend = DirectBackend::new(
        Some(Box::new(client)),
        None,
        Classifier::builtin(),
        &AnalysisConfig::default(),
    );
    (backend, systems)
}

/// Wraps a backend and keeps every signal it was asked to analyze.
pub struct RecordingBackend<B> {
    inner: B,
    signals: Rc<RefCell<Vec<FailureSignal>>>,
}

impl<B: AnalysisBackend> RecordingBackend<B> {
    pub fn new(inner: B) -> (Self, Rc<RefCell<Vec<FailureSignal>>>) {
        let signals = Rc::new(RefCell::new(Vec::new()));
        (
            Self {
                inner,
                signals: signals.clone(),
            },
            signals,
        )
    }
}

impl<B: AnalysisBackend> AnalysisBackend for RecordingBackend<B> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn analyze(&self, signal: &FailureSignal) -> AnalysisResult {
        self.signals.borrow_mut().push(signal.clone());
        self.inner.analyze(signal)
    }
}
