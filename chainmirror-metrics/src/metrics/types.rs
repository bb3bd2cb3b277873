use std::fmt;

// -----------------
// Outcome
// -----------------
const OUTCOME_SUCCESS: &str = "success";
const OUTCOME_REJECTED: &str = "rejected";
const OUTCOME_TIMEOUT: &str = "timeout";
const OUTCOME_ERROR: &str = "error";

/// How a single external read call settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    /// The remote contract answered with an application-level rejection
    Rejected,
    Timeout,
    /// Network or decoding failure
    Error,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Outcome {
    pub fn as_str(&self) -> &str {
        use Outcome::*;
        match self {
            Success => OUTCOME_SUCCESS,
            Rejected => OUTCOME_REJECTED,
            Timeout => OUTCOME_TIMEOUT,
            Error => OUTCOME_ERROR,
        }
    }

    pub fn from_success(success: bool) -> Self {
        if success {
            Outcome::Success
        } else {
            Outcome::Error
        }
    }
}

// -----------------
// CacheLookup
// -----------------
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheLookup {
    Hit,
    Miss,
    Expired,
}

impl CacheLookup {
    pub fn as_str(&self) -> &str {
        use CacheLookup::*;
        match self {
            Hit => "hit",
            Miss => "miss",
            Expired => "expired",
        }
    }
}

pub trait LabelValue {
    fn value(&self) -> &str;
}

impl LabelValue for Outcome {
    fn value(&self) -> &str {
        self.as_str()
    }
}

impl LabelValue for CacheLookup {
    fn value(&self) -> &str {
        self.as_str()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_labels() {
        assert_eq!(Outcome::from_success(true).to_string(), "success");
        assert_eq!(Outcome::from_success(false).value(), "error");
        assert_eq!(Outcome::Timeout.as_str(), "timeout");
        assert_eq!(CacheLookup::Expired.value(), "expired");
    }
}
