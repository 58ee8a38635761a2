//! VNPay merchant configuration loaded from environment variables.

/// Gateway credentials and endpoints.
///
/// Reads from environment variables:
/// - `VNP_TMN_CODE` — merchant code
/// - `VNP_HASH_SECRET` — shared HMAC signing secret
/// - `VNP_URL` — gateway payment endpoint (sandbox default)
/// - `VNP_RETURN_URL` — browser return target after payment
#[derive(Debug, Clone)]
pub struct VnpayConfig {
    pub tmn_code: String,
    pub hash_secret: String,
    pub base_url: String,
    pub return_url: String,
}

impl VnpayConfig {
    /// Loads configuration from environment variables, falling back to
    /// sandbox defaults for the endpoints.
    pub fn from_env() -> Self {
        Self {
            tmn_code: std::env::var("VNP_TMN_CODE").unwrap_or_default(),
            hash_secret: std::env::var("VNP_HASH_SECRET").unwrap_or_default(),
            base_url: std::env::var("VNP_URL").unwrap_or_else(|_| {
                "https://sandbox.vnpayment.vn/paymentv2/vpcpay.html".to_string()
            }),
            return_url: std::env::var("VNP_RETURN_URL")
                .unwrap_or_else(|_| "http://localhost:5173/payment/vnpay-return".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sandbox_defaults() {
        let config = VnpayConfig::from_env();
        assert!(config.base_url.contains("vnpayment.vn"));
        assert!(config.return_url.contains("vnpay-return"));
    }
}
