use thiserror::Error;

/// Failures of the analysis stages. Callers branch on the variant instead
/// of catching: insufficient data and degenerate input are expected
/// outcomes for short or flat windows, not bugs.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnalysisError {
    #[error("insufficient data: need {required} bars, have {actual}")]
    InsufficientData { required: usize, actual: usize },
    #[error("degenerate input: {0}")]
    DegenerateInput(String),
}

/// Reasons a risk plan is rejected by validation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RiskViolation {
    #[error("R:R ratio too low: {0:.1}")]
    RewardTooLow(f64),
    #[error("risk too high: {0}")]
    RiskTooWide(String),
    #[error("stop too tight: {0}")]
    StopTooTight(String),
}
