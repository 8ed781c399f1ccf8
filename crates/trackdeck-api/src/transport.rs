// ── HTTP transport configuration ──
//
// Shared builder for the underlying reqwest client: timeout and TLS
// verification policy. A transport-level timeout bounds every request,
// so a hung call can never hold a loading flag forever.

use std::time::Duration;

use reqwest::header::HeaderMap;

use crate::Error;

/// TLS certificate verification policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TlsMode {
    /// Verify certificates against the webpki roots (default).
    #[default]
    Verify,
    /// Accept any certificate. Development setups only.
    DangerAcceptInvalid,
}

/// Transport-level settings applied to every request.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub timeout: Duration,
    pub tls: TlsMode,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            tls: TlsMode::Verify,
        }
    }
}

impl TransportConfig {
    /// Build a `reqwest::Client` with the given default headers.
    pub fn build_client_with_headers(&self, headers: HeaderMap) -> Result<reqwest::Client, Error> {
        let builder = reqwest::Client::builder()
            .timeout(self.timeout)
            .default_headers(headers)
            .danger_accept_invalid_certs(matches!(self.tls, TlsMode::DangerAcceptInvalid));

        Ok(builder.build()?)
    }

    /// Build a `reqwest::Client` with no extra headers.
    pub fn build_client(&self) -> Result<reqwest::Client, Error> {
        self.build_client_with_headers(HeaderMap::new())
    }
}
