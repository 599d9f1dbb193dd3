use std::fmt::Write as _;

use crate::errors::{AppStoreError, JwsError};

/// The payload shape a signed field is decoded into. The shape is fixed by the
/// field's name in the response, never by the token's content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignedFieldRole {
    Transaction,
    RenewalInfo,
    Notification,
}

impl SignedFieldRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignedFieldRole::Transaction => "transaction",
            SignedFieldRole::RenewalInfo => "renewal info",
            SignedFieldRole::Notification => "notification",
        }
    }
}

/// One signed field that failed, with enough context to find it again in the
/// response.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{field}{} ({}): {cause}", format_position(.position), .role.as_str())]
pub struct SignedItemError {
    /// JSON name of the field holding the token, e.g. `signedTransactions`.
    pub field: &'static str,
    pub role: SignedFieldRole,
    /// List indices leading to the token, outermost first. Empty for a field
    /// that is not inside any list.
    pub position: Vec<usize>,
    #[source]
    pub cause: JwsError,
}

fn format_position(position: &[usize]) -> String {
    position.iter().fold(String::new(), |mut out, index| {
        let _ = write!(out, "[{index}]");
        out
    })
}

/// Every per-item failure collected while decoding one response.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{} signed item(s) failed to decode: {}", .0.len(), join_errors(.0))]
pub struct SignedItemErrors(pub Vec<SignedItemError>);

fn join_errors(errors: &[SignedItemError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// A fully decoded response envelope together with any signed items inside it
/// that failed. The successfully decoded items remain usable either way.
#[derive(Debug)]
pub struct DecodeOutcome<T> {
    pub response: T,
    pub failures: Vec<SignedItemError>,
}

impl<T> DecodeOutcome<T> {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn error(&self) -> Option<SignedItemErrors> {
        if self.failures.is_empty() {
            None
        } else {
            Some(SignedItemErrors(self.failures.clone()))
        }
    }

    pub fn into_parts(self) -> (T, Option<SignedItemErrors>) {
        let error = (!self.failures.is_empty()).then(|| SignedItemErrors(self.failures));
        (self.response, error)
    }

    /// Strict view: any failed item fails the whole response.
    pub fn into_result(self) -> Result<T, AppStoreError> {
        match self.into_parts() {
            (response, None) => Ok(response),
            (_, Some(errors)) => Err(AppStoreError::SignedItems(errors)),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> DecodeOutcome<U> {
        DecodeOutcome {
            response: f(self.response),
            failures: self.failures,
        }
    }
}
