//! Client for the donation gateway functions.

use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DonationRequest {
    #[serde(rename = "userId")]
    pub user_id: String,
    /// Amount in ALGO.
    pub amount: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CertificateRequest {
    #[serde(rename = "userId")]
    pub user_id: String,
    #[serde(rename = "donationAmount")]
    pub donation_amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DonationResponse {
    pub success: bool,
    pub tx_hash: String,
    pub confirmed_round: u64,
    pub amount: f64,
    pub message: String,
    #[serde(default)]
    pub warning: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CertificateResponse {
    pub success: bool,
    pub asa_id: u64,
    pub tx_hash: String,
    pub asset_name: String,
    pub unit_name: String,
    pub metadata: String,
    pub message: String,
    #[serde(default)]
    pub warning: Option<String>,
}

/// Error envelope returned by the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayErrorBody {
    pub error: String,
    #[serde(rename = "txId", default)]
    pub tx_id: Option<String>,
}

#[derive(Debug, Error)]
pub enum SdkError {
    #[error("Gateway returned {status}: {}", .body.error)]
    Gateway { status: u16, body: GatewayErrorBody },

    #[error("Unexpected response ({status}): {text}")]
    Unexpected { status: u16, text: String },

    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

impl SdkError {
    /// HTTP status of a gateway-reported failure.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Gateway { status, .. } | Self::Unexpected { status, .. } => Some(*status),
            Self::Http(e) => e.status().map(|s| s.as_u16()),
        }
    }
}

pub struct DonationClient {
    client: Client,
    gateway_url: String,
    token: Option<String>,
}

impl DonationClient {
    pub fn new(gateway_url: &str) -> Self {
        Self {
            client: Client::new(),
            gateway_url: gateway_url.trim_end_matches('/').to_string(),
            token: None,
        }
    }

    /// Use a preconfigured HTTP client (proxies, timeouts).
    pub fn with_http_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    /// Send `Authorization: Bearer <token>` with every call.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Transfer `amount` ALGO to the charity on behalf of `user_id`.
    pub async fn send_donation(
        &self,
        user_id: &str,
        amount: f64,
    ) -> Result<DonationResponse, SdkError> {
        let req = DonationRequest {
            user_id: user_id.to_string(),
            amount,
        };
        let resp = self.post("sendDonation").json(&req).send().await?;
        decode(resp).await
    }

    /// Mint a certificate for a donation of `donation_amount` ALGO.
    pub async fn mint_certificate(
        &self,
        user_id: &str,
        donation_amount: f64,
    ) -> Result<CertificateResponse, SdkError> {
        let req = CertificateRequest {
            user_id: user_id.to_string(),
            donation_amount,
        };
        let resp = self.post("mintCertificate").json(&req).send().await?;
        decode(resp).await
    }

    /// Post an arbitrary body, for callers exercising validation.
    pub async fn post_raw(&self, function: &str, body: Vec<u8>) -> Result<Response, reqwest::Error> {
        self.post(function)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
    }

    fn post(&self, function: &str) -> reqwest::RequestBuilder {
        let builder = self
            .client
            .post(format!("{}/{}", self.gateway_url, function));
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }
}

async fn decode<T: serde::de::DeserializeOwned>(resp: Response) -> Result<T, SdkError> {
    let status = resp.status();
    let text = resp.text().await?;

    if status.is_success() {
        return serde_json::from_str(&text).map_err(|_| SdkError::Unexpected {
            status: status.as_u16(),
            text,
        });
    }

    match serde_json::from_str::<GatewayErrorBody>(&text) {
        Ok(body) => Err(SdkError::Gateway {
            status: status.as_u16(),
            body,
        }),
        Err(_) => Err(SdkError::Unexpected {
            status: status.as_u16(),
            text,
        }),
    }
}
