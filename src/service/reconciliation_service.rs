// service/reconciliation_service.rs
//
// Inbound webhook handling for the payment gateway. Trust is established
// before anything else: the HMAC signature over the raw body is checked in
// constant time, and a bad or missing signature rejects the request without
// touching any state.
use hmac::{Hmac, Mac};
use sha2::Sha512;
use std::sync::Arc;
use subtle::ConstantTimeEq;
use uuid::Uuid;

use crate::{
    models::ledgermodel::LedgerEntry,
    service::{
        error::ServiceError,
        ledger_service::{LedgerService, ReconcileOutcome},
    },
};

#[derive(Debug, Clone, PartialEq)]
pub struct WebhookEvent {
    pub gateway_ref: String,
    pub status: String,
    pub amount: Option<i64>,
    pub user_id: Option<Uuid>,
}

#[derive(Debug, Clone)]
pub struct ReconciliationService {
    ledger_service: Arc<LedgerService>,
    webhook_secret: String,
}

impl ReconciliationService {
    pub fn new(ledger_service: Arc<LedgerService>, webhook_secret: String) -> Self {
        Self {
            ledger_service,
            webhook_secret,
        }
    }

    /// Processes one gateway callback. Returns the settled entry, or None
    /// when the event status is not one we act on (acknowledged so the
    /// gateway stops retrying).
    pub async fn handle_callback(
        &self,
        signature: Option<&str>,
        raw_body: &str,
    ) -> Result<Option<LedgerEntry>, ServiceError> {
        let signature = signature.ok_or(ServiceError::InvalidSignature)?;

        if !verify_webhook_signature(raw_body.as_bytes(), signature, self.webhook_secret.as_bytes())
        {
            tracing::warn!("Invalid gateway webhook signature received");
            return Err(ServiceError::InvalidSignature);
        }

        let event = parse_webhook_payload(raw_body)?;

        let outcome = match outcome_for_status(&event.status) {
            Some(outcome) => outcome,
            None => {
                tracing::info!(
                    "Unhandled gateway webhook status '{}' for reference {}",
                    event.status,
                    event.gateway_ref
                );
                return Ok(None);
            }
        };

        let entry = self
            .ledger_service
            .reconcile(&event.gateway_ref, outcome)
            .await?;

        // The entry recorded at initiation time is authoritative for the
        // amount; a differing gateway figure is logged for investigation.
        if let Some(reported) = event.amount {
            if reported != entry.amount {
                tracing::warn!(
                    "Gateway reported amount {} for reference {} but ledger entry has {}",
                    reported,
                    event.gateway_ref,
                    entry.amount
                );
            }
        }

        Ok(Some(entry))
    }
}

/// HMAC-SHA512 over the raw request body, hex-encoded, compared in
/// constant time.
pub fn verify_webhook_signature(payload: &[u8], signature: &str, secret: &[u8]) -> bool {
    let mut mac =
        Hmac::<Sha512>::new_from_slice(secret).expect("HMAC can take key of any size");
    mac.update(payload);

    let expected_signature = mac.finalize().into_bytes();
    let expected_signature_hex = hex::encode(expected_signature);

    ConstantTimeEq::ct_eq(signature.as_bytes(), expected_signature_hex.as_bytes()).into()
}

pub fn parse_webhook_payload(raw_body: &str) -> Result<WebhookEvent, ServiceError> {
    let body: serde_json::Value = serde_json::from_str(raw_body)
        .map_err(|e| ServiceError::MalformedPayload(e.to_string()))?;

    let gateway_ref = body["gatewayRef"]
        .as_str()
        .or_else(|| body["reference"].as_str())
        .ok_or_else(|| {
            ServiceError::MalformedPayload("Missing gateway reference in webhook payload".to_string())
        })?
        .to_string();

    let status = body["status"]
        .as_str()
        .ok_or_else(|| {
            ServiceError::MalformedPayload("Missing status in webhook payload".to_string())
        })?
        .to_string();

    let amount = body["amount"].as_i64();
    let user_id = body["userId"]
        .as_str()
        .and_then(|s| Uuid::parse_str(s).ok());

    Ok(WebhookEvent {
        gateway_ref,
        status,
        amount,
        user_id,
    })
}

pub fn outcome_for_status(status: &str) -> Option<ReconcileOutcome> {
    match status.to_ascii_lowercase().as_str() {
        "succeeded" | "success" | "successful" | "completed" => Some(ReconcileOutcome::Succeeded),
        "failed" | "failure" | "reversed" => Some(ReconcileOutcome::Failed),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hmac::{Hmac, Mac};
    use sha2::Sha512;

    const SECRET: &[u8] = b"test_webhook_secret";

    fn sign(payload: &str) -> String {
        let mut mac = Hmac::<Sha512>::new_from_slice(SECRET).unwrap();
        mac.update(payload.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    #[test]
    fn valid_signature_verifies() {
        let payload = r#"{"gatewayRef":"ref-1","status":"succeeded","amount":100}"#;
        let signature = sign(payload);
        assert!(verify_webhook_signature(
            payload.as_bytes(),
            &signature,
            SECRET
        ));
    }

    #[test]
    fn tampered_payload_fails_verification() {
        let payload = r#"{"gatewayRef":"ref-1","status":"succeeded","amount":100}"#;
        let signature = sign(payload);
        let tampered = r#"{"gatewayRef":"ref-1","status":"succeeded","amount":999}"#;
        assert!(!verify_webhook_signature(
            tampered.as_bytes(),
            &signature,
            SECRET
        ));
    }

    #[test]
    fn wrong_secret_fails_verification() {
        let payload = r#"{"gatewayRef":"ref-1","status":"failed"}"#;
        let signature = sign(payload);
        assert!(!verify_webhook_signature(
            payload.as_bytes(),
            &signature,
            b"another_secret"
        ));
    }

    #[test]
    fn garbage_signature_fails_verification() {
        let payload = r#"{"gatewayRef":"ref-1","status":"failed"}"#;
        assert!(!verify_webhook_signature(
            payload.as_bytes(),
            "not-a-hex-signature",
            SECRET
        ));
    }

    #[test]
    fn payload_parsing_accepts_both_reference_spellings() {
        let event =
            parse_webhook_payload(r#"{"gatewayRef":"ref-1","status":"succeeded","amount":250}"#)
                .unwrap();
        assert_eq!(event.gateway_ref, "ref-1");
        assert_eq!(event.status, "succeeded");
        assert_eq!(event.amount, Some(250));

        let event =
            parse_webhook_payload(r#"{"reference":"ref-2","status":"failed"}"#).unwrap();
        assert_eq!(event.gateway_ref, "ref-2");
        assert_eq!(event.amount, None);
        assert_eq!(event.user_id, None);
    }

    #[test]
    fn payload_user_id_is_parsed_when_present() {
        let user_id = Uuid::new_v4();
        let raw = format!(
            r#"{{"gatewayRef":"ref-3","status":"succeeded","userId":"{}"}}"#,
            user_id
        );
        let event = parse_webhook_payload(&raw).unwrap();
        assert_eq!(event.user_id, Some(user_id));
    }

    #[test]
    fn payload_missing_reference_is_rejected() {
        let err = parse_webhook_payload(r#"{"status":"succeeded"}"#).unwrap_err();
        assert!(matches!(err, ServiceError::MalformedPayload(_)));
    }

    #[test]
    fn payload_missing_status_is_rejected() {
        let err = parse_webhook_payload(r#"{"gatewayRef":"ref-1"}"#).unwrap_err();
        assert!(matches!(err, ServiceError::MalformedPayload(_)));
    }

    #[test]
    fn non_json_payload_is_rejected() {
        assert!(parse_webhook_payload("not json at all").is_err());
    }

    #[test]
    fn status_vocabulary_maps_to_outcomes() {
        assert_eq!(outcome_for_status("succeeded"), Some(ReconcileOutcome::Succeeded));
        assert_eq!(outcome_for_status("SUCCESS"), Some(ReconcileOutcome::Succeeded));
        assert_eq!(outcome_for_status("failed"), Some(ReconcileOutcome::Failed));
        assert_eq!(outcome_for_status("reversed"), Some(ReconcileOutcome::Failed));
        assert_eq!(outcome_for_status("processing"), None);
        assert_eq!(outcome_for_status(""), None);
    }
}
