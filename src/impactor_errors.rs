use thiserror::Error;

#[derive(Error, Debug)]
pub enum ImpactorError {
    #[error("Invalid relative velocity: {0} km/s (must be > 0)")]
    InvalidVelocity(f64),

    #[error("Invalid number of trials: {0} (must be >= 1)")]
    InvalidTrialCount(usize),

    #[error("Non-finite value for {field}: {value}")]
    NonFiniteInput { field: &'static str, value: f64 },

    #[error("Invalid sampling sigma: {0} km (must be >= 0, i.e. a non-negative miss distance)")]
    InvalidSigma(f64),

    #[error("Gaussian sampling distribution rejected: {0:?}")]
    SamplingDistribution(rand_distr::NormalError),

    #[error("Invalid convergence trial sizes: {0}")]
    InvalidTrialSizes(String),

    #[error("Invalid simulation parameter: {0}")]
    InvalidParameter(String),

    #[error("Invalid value for record field {field}: {value:?}")]
    InvalidRecordField { field: &'static str, value: String },

    #[error("Time conversion error: {0}")]
    TimeError(String),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Unable to perform file operation: {0}")]
    IoError(#[from] std::io::Error),

    #[cfg(feature = "neows-download")]
    #[error("HTTP reqwest error: {0}")]
    ReqwestError(#[from] reqwest::Error),
}

impl From<rand_distr::NormalError> for ImpactorError {
    fn from(err: rand_distr::NormalError) -> Self {
        ImpactorError::SamplingDistribution(err)
    }
}

impl PartialEq for ImpactorError {
    fn eq(&self, other: &Self) -> bool {
        use ImpactorError::*;
        match (self, other) {
            (InvalidVelocity(a), InvalidVelocity(b)) => a.to_bits() == b.to_bits(),
            (InvalidTrialCount(a), InvalidTrialCount(b)) => a == b,
            (
                NonFiniteInput {
                    field: fa,
                    value: va,
                },
                NonFiniteInput {
                    field: fb,
                    value: vb,
                },
            ) => fa == fb && va.to_bits() == vb.to_bits(),
            (InvalidSigma(a), InvalidSigma(b)) => a.to_bits() == b.to_bits(),
            (SamplingDistribution(a), SamplingDistribution(b)) => a == b,
            (InvalidTrialSizes(a), InvalidTrialSizes(b)) => a == b,
            (InvalidParameter(a), InvalidParameter(b)) => a == b,
            (
                InvalidRecordField {
                    field: fa,
                    value: va,
                },
                InvalidRecordField {
                    field: fb,
                    value: vb,
                },
            ) => fa == fb && va == vb,
            (TimeError(a), TimeError(b)) => a == b,

            // Wrapped foreign errors are not comparable: same variant means equal
            (CsvError(_), CsvError(_)) => true,
            (JsonError(_), JsonError(_)) => true,
            (IoError(_), IoError(_)) => true,
            #[cfg(feature = "neows-download")]
            (ReqwestError(_), ReqwestError(_)) => true,

            _ => false,
        }
    }
}
