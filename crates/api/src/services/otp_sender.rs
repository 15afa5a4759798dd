use async_trait::async_trait;
use domain::services::OtpSender;

/// Development OTP channel that writes the code to the log instead of
/// an SMS provider. Swap for a real sender in production deployments.
pub struct ConsoleOtpSender;

#[async_trait]
impl OtpSender for ConsoleOtpSender {
    async fn send(&self, mobile: &str, code: &str) -> bool {
        tracing::info!(mobile = %mask_mobile(mobile), code = %code, "OTP issued");
        true
    }
}

/// Keeps the last three digits for log correlation.
fn mask_mobile(mobile: &str) -> String {
    if mobile.len() <= 3 {
        return "*".repeat(mobile.len());
    }
    let visible = &mobile[mobile.len() - 3..];
    format!("{}{}", "*".repeat(mobile.len() - 3), visible)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_keeps_last_three_digits() {
        assert_eq!(mask_mobile("9876543210"), "*******210");
        assert_eq!(mask_mobile("91"), "**");
    }
}
