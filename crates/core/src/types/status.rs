//! Status vocabularies for the per-user case records.
//!
//! Records store their status as a raw string so a value outside the
//! vocabulary can still be read (and then repaired by reconciliation).
//! These enums are the authoritative membership test.

string_vocabulary! {
    /// Work permit workflow status.
    pub enum WorkPermitStatus("work permit status") {
        Preparation => "preparation",
        UnderReview => "under_review",
        Approved => "approved",
        Rejected => "rejected",
        Submitted => "submitted",
    }
}

impl Default for WorkPermitStatus {
    fn default() -> Self {
        Self::Preparation
    }
}

string_vocabulary! {
    /// Work visa workflow status.
    pub enum WorkVisaStatus("work visa status") {
        Preparation => "preparation",
        Applied => "applied",
        AwaitingDecision => "awaiting_decision",
        /// Requires both an interview date and time.
        InterviewScheduled => "interview_scheduled",
        Approved => "approved",
        Rejected => "rejected",
    }
}

impl Default for WorkVisaStatus {
    fn default() -> Self {
        Self::Preparation
    }
}

string_vocabulary! {
    /// Status of a contract document (company contract or job offer).
    pub enum ContractStatus("contract status") {
        Pending => "pending",
        Sent => "sent",
        Signed => "signed",
        Completed => "completed",
        Cancelled => "cancelled",
    }
}

impl Default for ContractStatus {
    fn default() -> Self {
        Self::Pending
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_strings_round_trip() {
        for status in WorkVisaStatus::ALL {
            assert_eq!(status.as_str().parse::<WorkVisaStatus>().unwrap(), *status);
        }
        for status in WorkPermitStatus::ALL {
            assert_eq!(status.to_string().parse::<WorkPermitStatus>().unwrap(), *status);
        }
    }

    #[test]
    fn test_membership_is_exact() {
        assert!(WorkVisaStatus::is_valid("interview_scheduled"));
        assert!(!WorkVisaStatus::is_valid("Interview_Scheduled"));
        assert!(!WorkVisaStatus::is_valid("under_review"));
        assert!(WorkPermitStatus::is_valid("under_review"));
        assert!(!ContractStatus::is_valid(""));
    }

    #[test]
    fn test_defaults() {
        assert_eq!(WorkPermitStatus::default(), WorkPermitStatus::Preparation);
        assert_eq!(WorkVisaStatus::default(), WorkVisaStatus::Preparation);
        assert_eq!(ContractStatus::default(), ContractStatus::Pending);
    }

    #[test]
    fn test_unknown_value_error() {
        let err = "bogus_status".parse::<ContractStatus>().unwrap_err();
        assert_eq!(err.to_string(), "unknown contract status value: \"bogus_status\"");
    }

    #[test]
    fn test_serde_uses_wire_string() {
        let json = serde_json::to_string(&WorkVisaStatus::AwaitingDecision).unwrap();
        assert_eq!(json, "\"awaiting_decision\"");
    }
}
