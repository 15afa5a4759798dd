//! Payment gateway adapter.
//!
//! Signs outbound payment requests and verifies inbound callback
//! signatures. Both directions use SHA-512 over a pipe-joined field
//! string terminated by the merchant salt. The field order is a wire
//! contract with the gateway; changing it breaks verification on their
//! side with no local symptom.

use thiserror::Error;

use crate::models::{GatewayCallback, PaymentParams, TransactionStatus};
use shared::crypto::{constant_time_eq_hex, sha512_hex};

#[derive(Debug, Error)]
pub enum GatewayError {
    /// Merchant credentials are not configured. Callers surface this as
    /// a 503 rather than attempting the operation.
    #[error("payment gateway is not configured")]
    NotConfigured,
}

/// Merchant credentials and redirect URLs, injected at construction.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub merchant_key: String,
    pub merchant_salt: String,
    pub base_url: String,
    pub success_url: String,
    pub failure_url: String,
    pub cancel_url: String,
}

/// Outbound fields that participate in the request signature.
/// `amount` must already be the exact 2-decimal string that will be
/// sent on the wire.
#[derive(Debug, Clone)]
pub struct PaymentRequestFields {
    pub txn_id: String,
    pub amount: String,
    pub product_info: String,
    pub first_name: String,
    pub email: String,
    pub phone: String,
    pub udf1: String,
    pub udf2: String,
    pub udf3: String,
    pub udf4: String,
    pub udf5: String,
}

pub struct GatewayAdapter {
    config: Option<GatewayConfig>,
}

impl GatewayAdapter {
    pub fn new(config: Option<GatewayConfig>) -> Self {
        Self { config }
    }

    pub fn is_configured(&self) -> bool {
        self.config.is_some()
    }

    fn config(&self) -> Result<&GatewayConfig, GatewayError> {
        self.config.as_ref().ok_or(GatewayError::NotConfigured)
    }

    pub fn merchant_key(&self) -> Result<&str, GatewayError> {
        Ok(&self.config()?.merchant_key)
    }

    /// Redirect target for the signed form post.
    pub fn payment_url(&self) -> Result<String, GatewayError> {
        Ok(format!("{}/_payment", self.config()?.base_url))
    }

    /// Request signature:
    /// `key|txnid|amount|productinfo|firstname|email|udf1|..|udf5||||||salt`
    pub fn sign(&self, fields: &PaymentRequestFields) -> Result<String, GatewayError> {
        let config = self.config()?;
        let hash_string = format!(
            "{}|{}|{}|{}|{}|{}|{}|{}|{}|{}|{}||||||{}",
            config.merchant_key,
            fields.txn_id,
            fields.amount,
            fields.product_info,
            fields.first_name,
            fields.email,
            fields.udf1,
            fields.udf2,
            fields.udf3,
            fields.udf4,
            fields.udf5,
            config.merchant_salt,
        );
        Ok(sha512_hex(&hash_string))
    }

    /// Callback signature uses the reverse field order:
    /// `salt|status||||||udf5|..|udf1|email|firstname|productinfo|amount|txnid|key`
    pub fn verify(&self, callback: &GatewayCallback) -> Result<bool, GatewayError> {
        let config = self.config()?;
        let hash_string = format!(
            "{}|{}||||||{}|{}|{}|{}|{}|{}|{}|{}|{}|{}|{}",
            config.merchant_salt,
            callback.status,
            callback.udf5,
            callback.udf4,
            callback.udf3,
            callback.udf2,
            callback.udf1,
            callback.email,
            callback.firstname,
            callback.productinfo,
            callback.amount,
            callback.txnid,
            config.merchant_key,
        );
        let expected = sha512_hex(&hash_string);
        Ok(constant_time_eq_hex(&expected, &callback.hash))
    }

    /// Builds the full form-post parameter set including the signature.
    pub fn build_payment_params(
        &self,
        fields: &PaymentRequestFields,
    ) -> Result<PaymentParams, GatewayError> {
        let config = self.config()?;
        let hash = self.sign(fields)?;
        let mut params = PaymentParams::new();
        params.insert("key".to_string(), config.merchant_key.clone());
        params.insert("txnid".to_string(), fields.txn_id.clone());
        params.insert("amount".to_string(), fields.amount.clone());
        params.insert("productinfo".to_string(), fields.product_info.clone());
        params.insert("firstname".to_string(), fields.first_name.clone());
        params.insert("email".to_string(), fields.email.clone());
        params.insert("phone".to_string(), fields.phone.clone());
        params.insert("surl".to_string(), config.success_url.clone());
        params.insert("furl".to_string(), config.failure_url.clone());
        params.insert("curl".to_string(), config.cancel_url.clone());
        params.insert("udf1".to_string(), fields.udf1.clone());
        params.insert("udf2".to_string(), fields.udf2.clone());
        params.insert("hash".to_string(), hash);
        Ok(params)
    }

    /// Fixed translation of the gateway's free-text status vocabulary
    /// into the closed status enum. Unrecognized strings map to failed.
    pub fn map_status(raw: &str) -> TransactionStatus {
        match raw.to_lowercase().as_str() {
            "success" => TransactionStatus::Success,
            "pending" => TransactionStatus::Pending,
            "failed" | "failure" => TransactionStatus::Failed,
            "cancel" | "cancelled" | "usercancelled" => TransactionStatus::Cancelled,
            "timeout" => TransactionStatus::Timeout,
            "dropped" | "bounced" => TransactionStatus::Failed,
            _ => TransactionStatus::Failed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn adapter() -> GatewayAdapter {
        GatewayAdapter::new(Some(GatewayConfig {
            merchant_key: "gtKFFx".to_string(),
            merchant_salt: "eCwWELxi".to_string(),
            base_url: "https://test.payu.in".to_string(),
            success_url: "https://example.com/payment/success".to_string(),
            failure_url: "https://example.com/payment/failure".to_string(),
            cancel_url: "https://example.com/payment/cancel".to_string(),
        }))
    }

    fn fields() -> PaymentRequestFields {
        PaymentRequestFields {
            txn_id: "TXN1700000000000123456".to_string(),
            amount: "900.00".to_string(),
            product_info: "Algebra Basics".to_string(),
            first_name: "Asha".to_string(),
            email: "asha@example.com".to_string(),
            phone: "9876543210".to_string(),
            udf1: "user-1".to_string(),
            udf2: "course-1".to_string(),
            udf3: String::new(),
            udf4: String::new(),
            udf5: String::new(),
        }
    }

    fn callback_for(fields: &PaymentRequestFields, status: &str, salt: &str, key: &str) -> GatewayCallback {
        let hash_string = format!(
            "{}|{}||||||{}|{}|{}|{}|{}|{}|{}|{}|{}|{}|{}",
            salt,
            status,
            fields.udf5,
            fields.udf4,
            fields.udf3,
            fields.udf2,
            fields.udf1,
            fields.email,
            fields.first_name,
            fields.product_info,
            fields.amount,
            fields.txn_id,
            key,
        );
        GatewayCallback {
            txnid: fields.txn_id.clone(),
            status: status.to_string(),
            hash: shared::crypto::sha512_hex(&hash_string),
            amount: fields.amount.clone(),
            productinfo: fields.product_info.clone(),
            firstname: fields.first_name.clone(),
            email: fields.email.clone(),
            udf1: fields.udf1.clone(),
            udf2: fields.udf2.clone(),
            ..Default::default()
        }
    }

    #[test]
    fn test_sign_is_deterministic() {
        let adapter = adapter();
        let a = adapter.sign(&fields()).unwrap();
        let b = adapter.sign(&fields()).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 128);
    }

    #[test]
    fn test_verify_accepts_correctly_signed_callback() {
        let adapter = adapter();
        let callback = callback_for(&fields(), "success", "eCwWELxi", "gtKFFx");
        assert!(adapter.verify(&callback).unwrap());
    }

    #[test]
    fn test_verify_rejects_wrong_salt() {
        let adapter = adapter();
        let callback = callback_for(&fields(), "success", "eCwWELxj", "gtKFFx");
        assert!(!adapter.verify(&callback).unwrap());
    }

    #[test]
    fn test_verify_rejects_tampered_field() {
        let adapter = adapter();
        let mut callback = callback_for(&fields(), "success", "eCwWELxi", "gtKFFx");
        callback.amount = "0.01".to_string();
        assert!(!adapter.verify(&callback).unwrap());
    }

    #[test]
    fn test_verify_rejects_tampered_status() {
        let adapter = adapter();
        let mut callback = callback_for(&fields(), "failed", "eCwWELxi", "gtKFFx");
        callback.status = "success".to_string();
        assert!(!adapter.verify(&callback).unwrap());
    }

    #[test]
    fn test_unconfigured_adapter_fails_fast() {
        let adapter = GatewayAdapter::new(None);
        assert!(!adapter.is_configured());
        assert!(matches!(
            adapter.sign(&fields()),
            Err(GatewayError::NotConfigured)
        ));
        assert!(matches!(
            adapter.verify(&GatewayCallback::default()),
            Err(GatewayError::NotConfigured)
        ));
        assert!(matches!(adapter.payment_url(), Err(GatewayError::NotConfigured)));
    }

    #[test]
    fn test_status_mapping_is_fail_closed() {
        use TransactionStatus::*;
        assert_eq!(GatewayAdapter::map_status("success"), Success);
        assert_eq!(GatewayAdapter::map_status("SUCCESS"), Success);
        assert_eq!(GatewayAdapter::map_status("pending"), Pending);
        assert_eq!(GatewayAdapter::map_status("failure"), Failed);
        assert_eq!(GatewayAdapter::map_status("cancel"), Cancelled);
        assert_eq!(GatewayAdapter::map_status("userCancelled"), Cancelled);
        assert_eq!(GatewayAdapter::map_status("timeout"), Timeout);
        assert_eq!(GatewayAdapter::map_status("dropped"), Failed);
        assert_eq!(GatewayAdapter::map_status("bounced"), Failed);
        assert_eq!(GatewayAdapter::map_status("anything else"), Failed);
    }

    #[test]
    fn test_payment_params_include_signature_and_redirects() {
        let adapter = adapter();
        let params = adapter.build_payment_params(&fields()).unwrap();
        assert_eq!(params.get("key").unwrap(), "gtKFFx");
        assert_eq!(params.get("amount").unwrap(), "900.00");
        assert_eq!(params.get("surl").unwrap(), "https://example.com/payment/success");
        assert_eq!(params.get("hash").unwrap(), &adapter.sign(&fields()).unwrap());
        // The salt itself never leaves the adapter.
        assert!(params.values().all(|v| v != "eCwWELxi"));
    }

    #[test]
    fn test_payment_url() {
        assert_eq!(
            adapter().payment_url().unwrap(),
            "https://test.payu.in/_payment"
        );
    }
}
