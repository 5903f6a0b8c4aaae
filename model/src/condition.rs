use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// The status value of a [`Condition`].
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize, JsonSchema)]
pub enum ConditionStatus {
    True,
    False,
    Unknown,
}

impl Default for ConditionStatus {
    fn default() -> Self {
        Self::Unknown
    }
}

serde_plain::derive_display_from_serialize!(ConditionStatus);

/// A named status fact about a resource. Conditions are owned and written by the controller that
/// observes the resource; this crate only reads them.
#[derive(Debug, Default, Clone, Eq, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    #[serde(rename = "type")]
    pub type_: String,
    #[serde(default)]
    pub status: ConditionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_transition_time: Option<String>,
}

impl Condition {
    pub fn is_true(&self) -> bool {
        self.status == ConditionStatus::True
    }

    pub fn reason(&self) -> &str {
        self.reason.as_deref().unwrap_or_default()
    }

    pub fn message(&self) -> &str {
        self.message.as_deref().unwrap_or_default()
    }
}

impl Display for Condition {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}={}", self.type_, self.status)?;
        if let Some(reason) = &self.reason {
            write!(f, " ({})", reason)?;
        }
        Ok(())
    }
}

/// Typed access to the `status.conditions` of a resource.
pub trait HasConditions {
    /// All conditions currently reported. Empty when the resource has no status yet.
    fn conditions(&self) -> &[Condition];

    /// Find the condition of the given type.
    fn condition(&self, type_: &str) -> Option<&Condition> {
        self.conditions().iter().find(|c| c.type_ == type_)
    }

    /// `true` only when the condition is present and its status is `True`.
    fn is_condition_true(&self, type_: &str) -> bool {
        self.condition(type_)
            .map(Condition::is_true)
            .unwrap_or_default()
    }

    /// A short rendering of every condition, used when reporting the last seen state of a poll.
    fn describe_conditions(&self) -> String {
        if self.conditions().is_empty() {
            return "no conditions".to_string();
        }
        self.conditions()
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Implements `HasConditions` for a custom resource whose status type has a `conditions` field.
macro_rules! impl_has_conditions {
    ($crd:ty) => {
        impl $crate::HasConditions for $crd {
            fn conditions(&self) -> &[$crate::Condition] {
                self.status
                    .as_ref()
                    .map(|status| status.conditions.as_slice())
                    .unwrap_or_default()
            }
        }
    };
}

pub(crate) use impl_has_conditions;
