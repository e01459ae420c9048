//! Broadcast of built transactions and extraction of the network's
//! rejection message.

use bitcoin::{Transaction, Txid};
use tracing::{info, warn};

use ccw_core::client::NetworkClient;
use ccw_core::error::TransportError;

use crate::error::WalletError;

/// Terminal result of a broadcast the network answered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BroadcastOutcome {
    Accepted { txid: Txid },
    /// The node refused the transaction; `message` is its response body.
    Rejected { message: String },
}

impl BroadcastOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted { .. })
    }

    /// Rejection text, empty for an accepted transaction.
    pub fn error_message(&self) -> &str {
        match self {
            Self::Accepted { .. } => "",
            Self::Rejected { message } => message,
        }
    }
}

/// The response body of a failure that consists of exactly one HTTP error
/// response. Any other shape of failure yields `None`.
pub fn rejection_message(error: &TransportError) -> Option<&str> {
    match error {
        TransportError::Http { body, .. } => Some(body),
        TransportError::Aggregate(causes) => match causes.as_slice() {
            [TransportError::Http { body, .. }] => Some(body),
            _ => None,
        },
        _ => None,
    }
}

/// Submit `tx` through `client`.
///
/// A single HTTP error response becomes [`BroadcastOutcome::Rejected`];
/// every other transport failure is returned as
/// [`WalletError::UnrecoverableTransport`].
pub async fn broadcast(
    client: &dyn NetworkClient,
    tx: &Transaction,
) -> Result<BroadcastOutcome, WalletError> {
    match client.broadcast(tx).await {
        Ok(txid) => {
            info!(%txid, "transaction accepted");
            Ok(BroadcastOutcome::Accepted { txid })
        }
        Err(e) => match rejection_message(&e) {
            Some(message) => {
                warn!(txid = %tx.compute_txid(), %message, "transaction rejected");
                Ok(BroadcastOutcome::Rejected {
                    message: message.to_owned(),
                })
            }
            None => {
                warn!(txid = %tx.compute_txid(), error = %e, "broadcast failed");
                Err(WalletError::UnrecoverableTransport(e))
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn http(body: &str) -> TransportError {
        TransportError::Http {
            status: 400,
            body: body.into(),
        }
    }

    #[test]
    fn direct_http_error() {
        assert_eq!(rejection_message(&http("insufficient priority")), Some("insufficient priority"));
    }

    #[test]
    fn single_wrapped_http_error() {
        let e = TransportError::Aggregate(vec![http("insufficient priority")]);
        assert_eq!(rejection_message(&e), Some("insufficient priority"));
    }

    #[test]
    fn empty_body_is_still_a_rejection() {
        assert_eq!(rejection_message(&http("")), Some(""));
    }

    #[test]
    fn two_causes_have_no_message() {
        let e = TransportError::Aggregate(vec![http("a"), http("b")]);
        assert_eq!(rejection_message(&e), None);
    }

    #[test]
    fn non_http_causes_have_no_message() {
        assert_eq!(rejection_message(&TransportError::Io("reset".into())), None);
        let e = TransportError::Aggregate(vec![TransportError::Decode("bad json".into())]);
        assert_eq!(rejection_message(&e), None);
        assert_eq!(rejection_message(&TransportError::Aggregate(Vec::new())), None);
    }

    #[test]
    fn outcome_accessors() {
        let rejected = BroadcastOutcome::Rejected {
            message: "dust".into(),
        };
        assert!(!rejected.is_accepted());
        assert_eq!(rejected.error_message(), "dust");
    }
}
