use rust_decimal_macros::dec;
use serde_json::json;
use std::time::Duration;
use topup_sync::adapters::cryptopay::{CryptoPayClient, PaidButton};
use topup_sync::domain::error::PipelineError;
use topup_sync::domain::id::InvoiceId;
use topup_sync::domain::invoice::{InvoiceStatus, OpenInvoice};
use topup_sync::domain::money::{Amount, Asset};
use topup_sync::domain::provider::InvoiceProvider;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TOKEN: &str = "12345:AAtest";

fn client(server: &MockServer) -> CryptoPayClient {
    CryptoPayClient::new(server.uri(), TOKEN, Duration::from_millis(500)).unwrap()
}

fn invoice_json(id: i64, status: &str) -> serde_json::Value {
    json!({
        "invoice_id": id,
        "hash": "IVabc",
        "status": status,
        "asset": "USDT",
        "amount": "10.5",
        "bot_invoice_url": "https://t.me/CryptoBot?start=IVabc",
        "description": "Balance top-up for user 7",
        "payload": "user_id:7",
        "created_at": "2024-03-01T12:00:00.000Z",
        "expiration_date": "2024-03-01T12:30:00.000Z"
    })
}

fn request() -> OpenInvoice {
    OpenInvoice {
        asset: Asset::Usdt,
        amount: Amount::new(dec!(10.5)).unwrap(),
        description: "Balance top-up for user 7".into(),
        payload: "user_id:7".into(),
        expires_in_secs: 1800,
    }
}

#[tokio::test]
async fn create_invoice_sends_token_and_parses_result() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/createInvoice"))
        .and(header("Crypto-Pay-API-Token", TOKEN))
        .and(body_json(json!({
            "asset": "USDT",
            "amount": "10.5",
            "description": "Balance top-up for user 7",
            "payload": "user_id:7",
            "expires_in": 1800,
            "allow_comments": true
        })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "ok": true, "result": invoice_json(501, "active") })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let invoice = client(&server).open_invoice(&request()).await.unwrap();

    assert_eq!(invoice.invoice_id.get(), 501);
    assert_eq!(invoice.status, InvoiceStatus::Active);
    assert_eq!(invoice.amount, dec!(10.5));
    assert_eq!(invoice.payment_url(), Some("https://t.me/CryptoBot?start=IVabc"));
}

#[tokio::test]
async fn paid_button_is_sent_when_configured() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/createInvoice"))
        .and(body_json(json!({
            "asset": "USDT",
            "amount": "10.5",
            "description": "Balance top-up for user 7",
            "payload": "user_id:7",
            "expires_in": 1800,
            "allow_comments": true,
            "paid_btn_name": "openBot",
            "paid_btn_url": "https://t.me/topup_bot"
        })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "ok": true, "result": invoice_json(502, "active") })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server).with_paid_button(Some(PaidButton {
        name: "openBot".into(),
        url: "https://t.me/topup_bot".into(),
    }));
    let invoice = client.open_invoice(&request()).await.unwrap();

    assert_eq!(invoice.invoice_id.get(), 502);
}

#[tokio::test]
async fn provider_error_message_is_passed_through() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/createInvoice"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "ok": false,
            "error": { "code": 400, "name": "AMOUNT_TOO_SMALL" }
        })))
        .mount(&server)
        .await;

    let err = client(&server).open_invoice(&request()).await.unwrap_err();

    assert!(matches!(err, PipelineError::Provider(ref msg) if msg == "AMOUNT_TOO_SMALL"));
}

#[tokio::test]
async fn non_json_error_page_is_provider_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503).set_body_string("<html>unavailable</html>"))
        .mount(&server)
        .await;

    let err = client(&server).open_invoice(&request()).await.unwrap_err();

    assert!(matches!(err, PipelineError::Provider(ref msg) if msg.contains("503")));
}

#[tokio::test]
async fn garbage_success_body_is_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let err = client(&server).open_invoice(&request()).await.unwrap_err();

    assert!(matches!(err, PipelineError::Decode(_)));
}

#[tokio::test]
async fn result_with_wrong_shape_is_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "ok": true, "result": { "invoice_id": "x" } })),
        )
        .mount(&server)
        .await;

    let err = client(&server).open_invoice(&request()).await.unwrap_err();

    assert!(matches!(err, PipelineError::Decode(_)));
}

#[tokio::test]
async fn slow_provider_times_out_as_transport_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/getInvoices"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "ok": true, "result": { "items": [invoice_json(7, "paid")] } }))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let err = client(&server)
        .fetch_invoice(InvoiceId::new(7).unwrap())
        .await
        .unwrap_err();

    assert!(matches!(err, PipelineError::Transport(_)));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn fetch_queries_by_invoice_id() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/getInvoices"))
        .and(header("Crypto-Pay-API-Token", TOKEN))
        .and(query_param("invoice_ids", "42"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ok": true,
            "result": { "items": [invoice_json(42, "paid")] }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let invoice = client(&server)
        .fetch_invoice(InvoiceId::new(42).unwrap())
        .await
        .unwrap();

    assert_eq!(invoice.status, InvoiceStatus::Paid);
}

#[tokio::test]
async fn unrecognised_status_maps_to_other() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/getInvoices"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ok": true,
            "result": { "items": [invoice_json(9, "refunded")] }
        })))
        .mount(&server)
        .await;

    let invoice = client(&server)
        .fetch_invoice(InvoiceId::new(9).unwrap())
        .await
        .unwrap();

    assert_eq!(invoice.status, InvoiceStatus::Other);
}

#[tokio::test]
async fn empty_page_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/getInvoices"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "ok": true, "result": { "items": [] } })),
        )
        .mount(&server)
        .await;

    let err = client(&server)
        .fetch_invoice(InvoiceId::new(13).unwrap())
        .await
        .unwrap_err();

    assert!(matches!(err, PipelineError::NotFound(_)));
}

#[tokio::test]
async fn unreachable_provider_is_transport_error() {
    // Nothing listens on the discard port.
    let client = CryptoPayClient::new("http://127.0.0.1:9", TOKEN, Duration::from_millis(500)).unwrap();

    let err = client
        .fetch_invoice(InvoiceId::new(1).unwrap())
        .await
        .unwrap_err();

    assert!(matches!(err, PipelineError::Transport(_)));
}
