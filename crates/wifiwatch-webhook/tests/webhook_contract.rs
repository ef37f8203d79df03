//! Contract Test: Webhook Delivery
//!
//! Runs the notifier against a local mock endpoint.
//!
//! Constraints verified:
//! - One POST per delivery, with the documented JSON shape
//! - The signature verifies against the timestamp sent with it
//! - Non-200 replies and non-zero reply codes are delivery failures
//! - Slow endpoints are cut off by the request timeout

use std::time::Duration;

use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};
use wifiwatch_core::{Error, NotificationKind, Notice, Notifier, NotifyConfig};
use wifiwatch_webhook::{WebhookMessage, WebhookNotifier, sign};

const HOOK_PATH: &str = "/open-apis/bot/v2/hook/test-token";

fn notifier_for(server: &MockServer, timeout_secs: u64) -> WebhookNotifier {
    let config = NotifyConfig {
        webhook_url: format!("{}{}", server.uri(), HOOK_PATH),
        webhook_secret: "s3cr3t".to_string(),
        request_timeout_secs: timeout_secs,
        ..NotifyConfig::default()
    };
    WebhookNotifier::new(&config).expect("client builds")
}

fn changed_notice() -> Notice {
    Notice::new(
        NotificationKind::AddressChanged,
        "Home",
        Some("192.168.1.5".parse().unwrap()),
        "192.168.1.9".parse().unwrap(),
    )
}

#[tokio::test]
async fn accepted_delivery_posts_signed_text_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(HOOK_PATH))
        .and(header("content-type", "application/json"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"code": 0, "msg": "success"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let notifier = notifier_for(&server, 10);
    notifier.deliver(&changed_notice()).await.expect("delivery succeeds");

    let requests = server.received_requests().await.expect("recording enabled");
    assert_eq!(requests.len(), 1);

    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(body["msg_type"], "text");
    assert!(body["timestamp"].is_i64());

    let message: WebhookMessage = serde_json::from_value(body).unwrap();
    assert_eq!(message.sign, sign(message.timestamp, "s3cr3t").unwrap());
    assert!(message.content.text.contains("192.168.1.5 → 192.168.1.9"));
    assert!(message.content.text.contains("网络：Home"));
}

#[tokio::test]
async fn empty_reply_body_still_counts_as_success() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let notifier = notifier_for(&server, 10);
    assert!(notifier.deliver(&changed_notice()).await.is_ok());
}

#[tokio::test]
async fn server_error_is_a_failed_delivery() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream unavailable"))
        .expect(1)
        .mount(&server)
        .await;

    let notifier = notifier_for(&server, 10);
    let err = notifier.deliver(&changed_notice()).await.unwrap_err();

    assert!(matches!(err, Error::Http(ref m) if m.contains("500")));
    assert!(!err.to_string().contains("test-token"), "URL must not leak");
}

#[tokio::test]
async fn non_200_success_status_is_a_failed_delivery() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let notifier = notifier_for(&server, 10);
    assert!(matches!(
        notifier.deliver(&changed_notice()).await,
        Err(Error::Http(_))
    ));
}

#[tokio::test]
async fn rejected_signature_is_a_failed_delivery() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "code": 19021,
            "msg": "sign match fail or timestamp is not within one hour from current time"
        })))
        .mount(&server)
        .await;

    let notifier = notifier_for(&server, 10);
    let err = notifier.deliver(&changed_notice()).await.unwrap_err();

    assert!(matches!(err, Error::Notification(ref m) if m.contains("19021")));
}

#[tokio::test]
async fn slow_endpoint_hits_request_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
        .mount(&server)
        .await;

    let notifier = notifier_for(&server, 1);
    let err = notifier.deliver(&changed_notice()).await.unwrap_err();

    assert!(matches!(err, Error::Http(_)));
    assert!(!err.to_string().contains("test-token"));
}
