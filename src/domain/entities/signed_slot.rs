use crate::errors::JwsError;

/// The decoded counterpart of one signed field in a response.
///
/// Each slot sits at the same position as the raw token it was decoded from,
/// so a failure never shifts the remaining entries of a list.
#[derive(Debug, Clone, PartialEq)]
pub enum SignedSlot<T> {
    /// The raw field was missing or empty, so nothing was decoded. This is not
    /// an error.
    Absent,
    /// The token verified against the trust anchors and its payload decoded.
    Verified(T),
    /// The token was present but could not be verified or decoded.
    Failed(JwsError),
}

impl<T> Default for SignedSlot<T> {
    fn default() -> Self {
        SignedSlot::Absent
    }
}

impl<T> SignedSlot<T> {
    pub fn value(&self) -> Option<&T> {
        match self {
            SignedSlot::Verified(value) => Some(value),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&JwsError> {
        match self {
            SignedSlot::Failed(error) => Some(error),
            _ => None,
        }
    }

    pub fn into_value(self) -> Option<T> {
        match self {
            SignedSlot::Verified(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, SignedSlot::Absent)
    }

    pub fn is_verified(&self) -> bool {
        matches!(self, SignedSlot::Verified(_))
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, SignedSlot::Failed(_))
    }
}
