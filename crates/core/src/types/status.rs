//! Status enums for refunds and admin users.
//!
//! `RefundStatus` is the refund lifecycle. Transitions are only possible
//! through the methods on the enum, each of which names its legal source
//! state(s) and returns [`TransitionError`] for anything else:
//!
//! ```text
//! PendingReturn ──mark_received──> ProductReceived ──begin_refund──> ProcessingRefund ──complete──> Completed
//!       │                                │                                  │
//!       └────────────────────────────────┴──────────────reject──────────────┴──────────────────> Rejected
//! ```
//!
//! `Completed` and `Rejected` are terminal.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Refund request lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "refund_status", rename_all = "SCREAMING_SNAKE_CASE")
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RefundStatus {
    /// Customer has been told to ship the product back.
    #[default]
    PendingReturn,
    /// The warehouse has the product.
    ProductReceived,
    /// An admin is issuing the refund in the payment provider's dashboard.
    ProcessingRefund,
    /// Money returned; terminal.
    Completed,
    /// Refund denied; terminal.
    Rejected,
}

/// Attempted a status change that the lifecycle does not allow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("cannot move refund from {from} to {to}")]
pub struct TransitionError {
    /// Status the refund was in.
    pub from: RefundStatus,
    /// Status that was requested.
    pub to: RefundStatus,
}

impl RefundStatus {
    /// Every status, in lifecycle order.
    pub const ALL: [Self; 5] = [
        Self::PendingReturn,
        Self::ProductReceived,
        Self::ProcessingRefund,
        Self::Completed,
        Self::Rejected,
    ];

    /// Human-readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::PendingReturn => "Pending Return",
            Self::ProductReceived => "Product Received",
            Self::ProcessingRefund => "Processing Refund",
            Self::Completed => "Completed",
            Self::Rejected => "Rejected",
        }
    }

    /// Stored/wire value (`PENDING_RETURN`, ...).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PendingReturn => "PENDING_RETURN",
            Self::ProductReceived => "PRODUCT_RECEIVED",
            Self::ProcessingRefund => "PROCESSING_REFUND",
            Self::Completed => "COMPLETED",
            Self::Rejected => "REJECTED",
        }
    }

    /// Whether no further transitions are possible.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Rejected)
    }

    /// Whether the product is physically back, so its items may be restocked.
    #[must_use]
    pub const fn is_restockable(self) -> bool {
        matches!(
            self,
            Self::ProductReceived | Self::ProcessingRefund | Self::Completed
        )
    }

    /// `PendingReturn -> ProductReceived`.
    ///
    /// # Errors
    ///
    /// Returns `TransitionError` from any other status.
    pub const fn mark_received(self) -> Result<Self, TransitionError> {
        match self {
            Self::PendingReturn => Ok(Self::ProductReceived),
            from => Err(TransitionError {
                from,
                to: Self::ProductReceived,
            }),
        }
    }

    /// `ProductReceived -> ProcessingRefund`.
    ///
    /// # Errors
    ///
    /// Returns `TransitionError` from any other status.
    pub const fn begin_refund(self) -> Result<Self, TransitionError> {
        match self {
            Self::ProductReceived => Ok(Self::ProcessingRefund),
            from => Err(TransitionError {
                from,
                to: Self::ProcessingRefund,
            }),
        }
    }

    /// `ProcessingRefund -> Completed`.
    ///
    /// # Errors
    ///
    /// Returns `TransitionError` from any other status.
    pub const fn complete(self) -> Result<Self, TransitionError> {
        match self {
            Self::ProcessingRefund => Ok(Self::Completed),
            from => Err(TransitionError {
                from,
                to: Self::Completed,
            }),
        }
    }

    /// Any non-terminal status `-> Rejected`.
    ///
    /// # Errors
    ///
    /// Returns `TransitionError` from `Completed` or `Rejected`.
    pub const fn reject(self) -> Result<Self, TransitionError> {
        if self.is_terminal() {
            Err(TransitionError {
                from: self,
                to: Self::Rejected,
            })
        } else {
            Ok(Self::Rejected)
        }
    }

    /// Validate a direct status edit against the lifecycle.
    ///
    /// Staying in the same status is always allowed.
    ///
    /// # Errors
    ///
    /// Returns `TransitionError` if `target` is not reachable in one step.
    pub fn transition_to(self, target: Self) -> Result<Self, TransitionError> {
        if self == target {
            return Ok(self);
        }
        let next = match target {
            Self::ProductReceived => self.mark_received(),
            Self::ProcessingRefund => self.begin_refund(),
            Self::Completed => self.complete(),
            Self::Rejected => self.reject(),
            Self::PendingReturn => Err(TransitionError { from: self, to: target }),
        }?;
        Ok(next)
    }
}

impl fmt::Display for RefundStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RefundStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("invalid refund status: {s}"))
    }
}

/// Why the customer is returning the product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "refund_reason", rename_all = "SCREAMING_SNAKE_CASE")
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RefundReason {
    Damaged,
    Defective,
    WrongItem,
    NotAsDescribed,
    NoLongerNeeded,
    Other,
}

impl RefundReason {
    /// Every reason, in the order shown in filters and forms.
    pub const ALL: [Self; 6] = [
        Self::Damaged,
        Self::Defective,
        Self::WrongItem,
        Self::NotAsDescribed,
        Self::NoLongerNeeded,
        Self::Other,
    ];

    /// Human-readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Damaged => "Arrived damaged",
            Self::Defective => "Defective product",
            Self::WrongItem => "Wrong item sent",
            Self::NotAsDescribed => "Not as described",
            Self::NoLongerNeeded => "No longer needed",
            Self::Other => "Other",
        }
    }

    /// Stored/wire value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Damaged => "DAMAGED",
            Self::Defective => "DEFECTIVE",
            Self::WrongItem => "WRONG_ITEM",
            Self::NotAsDescribed => "NOT_AS_DESCRIBED",
            Self::NoLongerNeeded => "NO_LONGER_NEEDED",
            Self::Other => "OTHER",
        }
    }
}

impl fmt::Display for RefundReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RefundReason {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|reason| reason.as_str() == s)
            .ok_or_else(|| format!("invalid refund reason: {s}"))
    }
}

/// Admin role with different permission levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "admin_role", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum AdminRole {
    /// Everything, including creating other admins.
    SuperAdmin,
    /// Can run refund actions and edit refunds.
    Admin,
    /// Read-only access.
    Viewer,
}

impl AdminRole {
    /// Whether this role may change data (run actions, save forms).
    #[must_use]
    pub const fn can_write(self) -> bool {
        matches!(self, Self::SuperAdmin | Self::Admin)
    }
}

impl fmt::Display for AdminRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SuperAdmin => write!(f, "super_admin"),
            Self::Admin => write!(f, "admin"),
            Self::Viewer => write!(f, "viewer"),
        }
    }
}

impl std::str::FromStr for AdminRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "super_admin" => Ok(Self::SuperAdmin),
            "admin" => Ok(Self::Admin),
            "viewer" => Ok(Self::Viewer),
            _ => Err(format!("invalid admin role: {s}")),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    use RefundStatus::{Completed, PendingReturn, ProcessingRefund, ProductReceived, Rejected};

    #[test]
    fn test_happy_path() {
        let status = PendingReturn
            .mark_received()
            .and_then(RefundStatus::begin_refund)
            .and_then(RefundStatus::complete)
            .unwrap();
        assert_eq!(status, Completed);
        assert!(status.is_terminal());
    }

    #[test]
    fn test_mark_received_only_from_pending() {
        for from in [ProductReceived, ProcessingRefund, Completed, Rejected] {
            let err = from.mark_received().unwrap_err();
            assert_eq!(err.from, from);
            assert_eq!(err.to, ProductReceived);
        }
    }

    #[test]
    fn test_begin_refund_only_from_received() {
        for from in [PendingReturn, ProcessingRefund, Completed, Rejected] {
            assert!(from.begin_refund().is_err(), "{from:?}");
        }
    }

    #[test]
    fn test_complete_only_from_processing() {
        for from in [PendingReturn, ProductReceived, Completed, Rejected] {
            assert!(from.complete().is_err(), "{from:?}");
        }
    }

    #[test]
    fn test_reject_from_any_non_terminal() {
        for from in [PendingReturn, ProductReceived, ProcessingRefund] {
            assert_eq!(from.reject().unwrap(), Rejected);
        }
        assert!(Completed.reject().is_err());
        assert!(Rejected.reject().is_err());
    }

    #[test]
    fn test_restockable_states() {
        let restockable: Vec<_> = RefundStatus::ALL
            .into_iter()
            .filter(|s| s.is_restockable())
            .collect();
        assert_eq!(restockable, vec![ProductReceived, ProcessingRefund, Completed]);
    }

    #[test]
    fn test_transition_to() {
        assert_eq!(PendingReturn.transition_to(PendingReturn).unwrap(), PendingReturn);
        assert_eq!(
            PendingReturn.transition_to(ProductReceived).unwrap(),
            ProductReceived
        );
        assert!(PendingReturn.transition_to(Completed).is_err());
        assert!(ProductReceived.transition_to(PendingReturn).is_err());
        assert!(Completed.transition_to(Rejected).is_err());
    }

    #[test]
    fn test_transition_error_message() {
        let err = Completed.reject().unwrap_err();
        assert_eq!(err.to_string(), "cannot move refund from COMPLETED to REJECTED");
    }

    #[test]
    fn test_status_round_trips_through_str() {
        for status in RefundStatus::ALL {
            assert_eq!(status.as_str().parse::<RefundStatus>().unwrap(), status);
        }
        assert!("SHIPPED".parse::<RefundStatus>().is_err());
    }

    #[test]
    fn test_status_serde_matches_db_values() {
        let json = serde_json::to_string(&ProcessingRefund).unwrap();
        assert_eq!(json, "\"PROCESSING_REFUND\"");
    }

    #[test]
    fn test_reason_labels() {
        assert_eq!(RefundReason::WrongItem.label(), "Wrong item sent");
        assert_eq!(
            "NOT_AS_DESCRIBED".parse::<RefundReason>().unwrap(),
            RefundReason::NotAsDescribed
        );
    }

    #[test]
    fn test_admin_role_permissions() {
        assert!(AdminRole::SuperAdmin.can_write());
        assert!(AdminRole::Admin.can_write());
        assert!(!AdminRole::Viewer.can_write());
        assert_eq!("viewer".parse::<AdminRole>().unwrap(), AdminRole::Viewer);
    }
}
