use {
    crate::domain::{
        error::PipelineError,
        id::InvoiceId,
        invoice::{Invoice, OpenInvoice},
        provider::InvoiceProvider,
    },
    serde::{Deserialize, Serialize, de::DeserializeOwned},
    std::{future::Future, pin::Pin, time::Duration},
};

pub const DEFAULT_BASE_URL: &str = "https://pay.crypt.bot/api";
const TOKEN_HEADER: &str = "Crypto-Pay-API-Token";

/// Button names Crypto Pay accepts for `paid_btn_name`.
pub const PAID_BUTTON_NAMES: [&str; 4] = ["viewItem", "openChannel", "openBot", "callback"];

/// Button shown to the payer once the invoice is paid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaidButton {
    pub name: String,
    pub url: String,
}

/// Client for the Crypto Pay API.
pub struct CryptoPayClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
    paid_button: Option<PaidButton>,
}

impl CryptoPayClient {
    pub fn new(
        base_url: impl Into<String>,
        token: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, PipelineError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PipelineError::Config(format!("http client: {e}")))?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
            paid_button: None,
        })
    }

    /// Attach a paid button to every invoice this client opens.
    pub fn with_paid_button(mut self, button: Option<PaidButton>) -> Self {
        self.paid_button = button;
        self
    }

    fn url(&self, method: &str) -> String {
        format!("{}/{method}", self.base_url)
    }

    async fn open_invoice_inner(&self, request: &OpenInvoice) -> Result<Invoice, PipelineError> {
        let body = CreateInvoiceBody {
            asset: request.asset.as_str(),
            amount: request.amount.to_string(),
            description: &request.description,
            payload: &request.payload,
            expires_in: request.expires_in_secs,
            allow_comments: true,
            paid_btn_name: self.paid_button.as_ref().map(|b| b.name.as_str()),
            paid_btn_url: self.paid_button.as_ref().map(|b| b.url.as_str()),
        };

        let response = self
            .http
            .post(self.url("createInvoice"))
            .header(TOKEN_HEADER, &self.token)
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;

        read_envelope::<Invoice>(response).await
    }

    async fn fetch_invoice_inner(&self, id: InvoiceId) -> Result<Invoice, PipelineError> {
        let response = self
            .http
            .get(self.url("getInvoices"))
            .header(TOKEN_HEADER, &self.token)
            .query(&[("invoice_ids", id.get().to_string())])
            .send()
            .await
            .map_err(transport_error)?;

        let page = read_envelope::<InvoicePage>(response).await?;
        page.items
            .into_iter()
            .find(|inv| inv.invoice_id == id)
            .ok_or_else(|| PipelineError::NotFound(format!("invoice {id} unknown to provider")))
    }
}

impl InvoiceProvider for CryptoPayClient {
    fn open_invoice(
        &self,
        request: &OpenInvoice,
    ) -> Pin<Box<dyn Future<Output = Result<Invoice, PipelineError>> + Send + '_>> {
        let request = request.clone();
        Box::pin(async move { self.open_invoice_inner(&request).await })
    }

    fn fetch_invoice(
        &self,
        id: InvoiceId,
    ) -> Pin<Box<dyn Future<Output = Result<Invoice, PipelineError>> + Send + '_>> {
        Box::pin(async move { self.fetch_invoice_inner(id).await })
    }
}

// ── Wire types ──────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct CreateInvoiceBody<'a> {
    asset: &'a str,
    amount: String,
    description: &'a str,
    payload: &'a str,
    expires_in: u32,
    allow_comments: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    paid_btn_name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    paid_btn_url: Option<&'a str>,
}

#[derive(Deserialize)]
struct InvoicePage {
    items: Vec<Invoice>,
}

#[derive(Deserialize)]
struct Envelope {
    ok: bool,
    #[serde(default)]
    result: Option<serde_json::Value>,
    #[serde(default)]
    error: Option<ApiErrorBody>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ApiErrorBody {
    Text(String),
    Object {
        #[serde(default)]
        code: Option<i64>,
        #[serde(default)]
        name: Option<String>,
        #[serde(default)]
        message: Option<String>,
    },
}

impl ApiErrorBody {
    fn into_message(self) -> String {
        match self {
            Self::Text(text) => text,
            Self::Object { message: Some(message), .. } => message,
            Self::Object { name: Some(name), .. } => name,
            Self::Object { code: Some(code), .. } => format!("error code {code}"),
            Self::Object { .. } => "unknown provider error".to_string(),
        }
    }
}

fn transport_error(e: reqwest::Error) -> PipelineError {
    if e.is_timeout() {
        PipelineError::Transport(format!("request timed out: {e}"))
    } else {
        PipelineError::Transport(e.to_string())
    }
}

/// Unwrap the `{ok, result | error}` envelope. The provider also answers
/// 4xx with an envelope, so the body is parsed regardless of HTTP status.
async fn read_envelope<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, PipelineError> {
    let status = response.status();
    let body = response.text().await.map_err(transport_error)?;

    let envelope: Envelope = match serde_json::from_str(&body) {
        Ok(envelope) => envelope,
        Err(_) if !status.is_success() => {
            return Err(PipelineError::Provider(format!("http status {status}")));
        }
        Err(e) => return Err(PipelineError::Decode(format!("malformed envelope: {e}"))),
    };

    if !envelope.ok {
        let message = envelope
            .error
            .map(ApiErrorBody::into_message)
            .unwrap_or_else(|| "unknown provider error".to_string());
        tracing::warn!(%status, error = %message, "provider rejected request");
        return Err(PipelineError::Provider(message));
    }

    let result = envelope
        .result
        .ok_or_else(|| PipelineError::Decode("envelope has ok=true but no result".into()))?;

    serde_json::from_value(result).map_err(|e| PipelineError::Decode(format!("result: {e}")))
}
