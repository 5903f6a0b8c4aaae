use crate::constants::{
    LINK_DETACH_KNOWN_ISSUE, LINK_PROVISION_UNKNOWN_ERROR, LINK_QUOTA_LIMIT, LINK_UNKNOWN_ERROR,
};
use std::fmt::{Display, Formatter};

/// The diagnostic category attached to a terminal failure.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum FailureTag {
    /// The cloud account ran out of quota for some resource.
    QuotaLimit,
    /// Nothing more specific is known about the failure.
    UnknownError,
    /// The failure matches a product defect that is already tracked.
    KnownIssue,
}

impl Display for FailureTag {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let tag = match self {
            FailureTag::QuotaLimit => "[quota limit]",
            FailureTag::UnknownError => "[unknown error]",
            FailureTag::KnownIssue => "[known issue]",
        };
        f.write_str(tag)
    }
}

/// A terminal failure reported by an evaluator, tagged with a category and a pointer to the
/// documented remediation.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Failure {
    pub tag: FailureTag,
    pub remediation: &'static str,
    pub reason: String,
    pub message: String,
}

impl Failure {
    /// A failure caused by the klusterlet never being removed from a detached cluster.
    pub fn known_issue<S1, S2>(reason: S1, message: S2) -> Self
    where
        S1: Into<String>,
        S2: Into<String>,
    {
        Self {
            tag: FailureTag::KnownIssue,
            remediation: LINK_DETACH_KNOWN_ISSUE,
            reason: reason.into(),
            message: message.into(),
        }
    }
}

impl Display for Failure {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Tag: {}, Possible Solution: {}, Reason: {}, Error message: {}",
            self.tag, self.remediation, self.reason, self.message
        )
    }
}

enum Matcher {
    ReasonEndsWith(&'static str),
    ReasonEquals(&'static str),
    MessageContains(&'static str),
}

impl Matcher {
    fn matches(&self, reason: &str, message: &str) -> bool {
        match self {
            Matcher::ReasonEndsWith(suffix) => reason.ends_with(suffix),
            Matcher::ReasonEquals(value) => reason == *value,
            Matcher::MessageContains(needle) => message.contains(needle),
        }
    }
}

struct Signature {
    matcher: Matcher,
    tag: FailureTag,
    remediation: &'static str,
}

/// Known failure signatures, checked in order. The first match wins.
const SIGNATURES: &[Signature] = &[
    Signature {
        matcher: Matcher::ReasonEndsWith("LimitExceeded"),
        tag: FailureTag::QuotaLimit,
        remediation: LINK_QUOTA_LIMIT,
    },
    Signature {
        matcher: Matcher::MessageContains("more than remaining quota"),
        tag: FailureTag::QuotaLimit,
        remediation: LINK_QUOTA_LIMIT,
    },
    Signature {
        matcher: Matcher::ReasonEquals("UnknownError"),
        tag: FailureTag::UnknownError,
        remediation: LINK_PROVISION_UNKNOWN_ERROR,
    },
];

/// Tag a terminal `reason`/`message` pair with a category and remediation link. Anything that
/// matches no known signature is an `UnknownError` pointing at the generic documentation.
pub fn classify<S1, S2>(reason: S1, message: S2) -> Failure
where
    S1: Into<String>,
    S2: Into<String>,
{
    let reason = reason.into();
    let message = message.into();
    let (tag, remediation) = SIGNATURES
        .iter()
        .find(|signature| signature.matcher.matches(&reason, &message))
        .map(|signature| (signature.tag, signature.remediation))
        .unwrap_or((FailureTag::UnknownError, LINK_UNKNOWN_ERROR));
    Failure {
        tag,
        remediation,
        reason,
        message,
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn quota_reason_suffix() {
        let failure = classify("VcpuLimitExceeded", "the vCPU limit was reached");
        assert_eq!(failure.tag, FailureTag::QuotaLimit);
        assert_eq!(failure.remediation, LINK_QUOTA_LIMIT);
    }

    #[test]
    fn quota_message() {
        let failure = classify(
            "InstallFailed",
            "Requested 8 cores which is more than remaining quota",
        );
        assert_eq!(failure.tag, FailureTag::QuotaLimit);
        assert_eq!(failure.remediation, LINK_QUOTA_LIMIT);
    }

    #[test]
    fn provision_unknown_error() {
        let failure = classify("UnknownError", "installer exited");
        assert_eq!(failure.tag, FailureTag::UnknownError);
        assert_eq!(failure.remediation, LINK_PROVISION_UNKNOWN_ERROR);
    }

    #[test]
    fn unrecognized() {
        let failure = classify("DNSNotReady", "zone not found");
        assert_eq!(failure.tag, FailureTag::UnknownError);
        assert_eq!(failure.remediation, LINK_UNKNOWN_ERROR);
    }

    #[test]
    fn limit_exceeded_must_be_a_suffix() {
        let failure = classify("LimitExceededRetry", "");
        assert_eq!(failure.tag, FailureTag::UnknownError);
        assert_eq!(failure.remediation, LINK_UNKNOWN_ERROR);
    }

    #[test]
    fn display() {
        let failure = classify("UnknownError", "boom");
        assert_eq!(
            failure.to_string(),
            format!(
                "Tag: [unknown error], Possible Solution: {}, Reason: UnknownError, Error message: boom",
                LINK_PROVISION_UNKNOWN_ERROR
            )
        );
        let failure = Failure::known_issue("KlusterletNotDeleted", "still there");
        assert!(failure.to_string().starts_with("Tag: [known issue]"));
    }
}
