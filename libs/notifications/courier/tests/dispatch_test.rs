//! End-to-end dispatch tests against mock provider APIs.

use courier::{
    CourierConfig, CourierError, CredentialResolver, CredentialRole, CredentialSet, Envelope,
    Mailer, Platform, ProviderEndpoints, ProviderEntry, ProviderTable, RequiredVar,
};
use serde_json::{json, Value};
use wiremock::matchers::{body_partial_json, body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Mailer whose SendGrid and SendinBlue endpoints point at `server`.
fn mailer_for(server: &MockServer) -> Mailer {
    Mailer::new(CourierConfig::new(
        ProviderTable::standard(),
        ProviderEndpoints {
            sendgrid: server.uri(),
            sendinblue: server.uri(),
        },
    ))
}

fn sendgrid_envelope() -> Envelope {
    Envelope::with_credentials(
        CredentialSet::new([
            ("SENDGRID_API_KEY", "SG.test-key"),
            ("SENDGRID_SENDER", "grid@example.com"),
        ]),
        Platform::SendGrid,
    )
    .to("Ann", "ann@example.com")
    .with_subject("Welcome")
    .with_text("Hello Ann")
}

fn sendinblue_envelope() -> Envelope {
    Envelope::with_credentials(
        CredentialSet::new([
            ("SENDINBLUE_API_KEY", "xkeysib-test"),
            ("SENDINBLUE_SENDER", "blue@example.com"),
        ]),
        Platform::SendinBlue,
    )
    .to("", "ann@example.com")
    .with_subject("Welcome")
    .with_text("Hello Ann")
    .with_html("<p>Hello <b>Ann</b></p>")
}

fn mailgun_envelope(base_url: &str) -> Envelope {
    Envelope::with_credentials(
        CredentialSet::new([
            ("MAILGUN_API_KEY", "key-test"),
            ("MAILGUN_BASE_URL", base_url),
        ]),
        Platform::Mailgun,
    )
    .to("", "ann@example.com")
    .from("Robot", "robot@mg.example.com")
    .with_subject("Welcome")
    .with_text("Hello Ann")
}

async fn request_json(server: &MockServer, index: usize) -> Value {
    let requests = server.received_requests().await.unwrap();
    serde_json::from_slice(&requests[index].body).unwrap()
}

mod sendgrid {
    use super::*;

    #[tokio::test]
    async fn test_accepted() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/mail/send"))
            .and(header("authorization", "Bearer SG.test-key"))
            .respond_with(ResponseTemplate::new(202).insert_header("X-Message-Id", "sg-123"))
            .expect(1)
            .mount(&server)
            .await;

        let sent = mailer_for(&server).send(&sendgrid_envelope()).await.unwrap();

        assert_eq!(sent.status, 202);
        assert!(sent.accepted);
        assert_eq!(sent.message_id.as_deref(), Some("sg-123"));
    }

    #[tokio::test]
    async fn test_payload_uses_fallback_html_and_seeded_sender() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/mail/send"))
            .respond_with(ResponseTemplate::new(202))
            .mount(&server)
            .await;

        mailer_for(&server).send(&sendgrid_envelope()).await.unwrap();

        let body = request_json(&server, 0).await;
        assert_eq!(body["from"]["email"], "grid@example.com");
        assert_eq!(body["personalizations"][0]["to"][0]["email"], "ann@example.com");
        assert_eq!(body["content"][0]["value"], "Hello Ann");
        assert_eq!(
            body["content"][1]["value"],
            "<html><pre>Hello Ann</pre></html>"
        );
    }

    #[tokio::test]
    async fn test_custom_table_credentials_authenticate_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/mail/send"))
            .and(header("authorization", "Bearer SG.alt-key"))
            .respond_with(ResponseTemplate::new(202))
            .expect(1)
            .mount(&server)
            .await;

        let resolver = CredentialResolver::new(ProviderTable::new(vec![ProviderEntry::new(
            Platform::SendGrid,
            vec![
                RequiredVar::new(CredentialRole::ApiKey, "ALT_SENDGRID_KEY"),
                RequiredVar::new(CredentialRole::Sender, "ALT_SENDGRID_FROM"),
            ],
        )]));
        let (credentials, platform) = resolver
            .resolve_with(|name| match name {
                "ALT_SENDGRID_KEY" => Some("SG.alt-key".to_string()),
                "ALT_SENDGRID_FROM" => Some("alt@example.com".to_string()),
                _ => None,
            })
            .unwrap();
        let envelope = Envelope::with_credentials_in(resolver.table(), credentials, platform)
            .to("", "ann@example.com")
            .with_subject("Welcome")
            .with_text("Hello Ann");

        // The mailer's table uses the standard variable names.
        let sent = mailer_for(&server).send(&envelope).await.unwrap();

        assert_eq!(sent.status, 202);
        let body = request_json(&server, 0).await;
        assert_eq!(body["from"]["email"], "alt@example.com");
    }

    #[tokio::test]
    async fn test_payload_fallback_html_is_sanitized() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/mail/send"))
            .respond_with(ResponseTemplate::new(202))
            .mount(&server)
            .await;

        let envelope = sendgrid_envelope().with_text("Hi <script>steal()</script>there");
        mailer_for(&server).send(&envelope).await.unwrap();

        let body = request_json(&server, 0).await;
        assert_eq!(body["content"][0]["value"], "Hi <script>steal()</script>there");
        assert_eq!(body["content"][1]["value"], "<html><pre>Hi there</pre></html>");
    }

    #[tokio::test]
    async fn test_payload_html_is_sanitized() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/mail/send"))
            .respond_with(ResponseTemplate::new(202))
            .mount(&server)
            .await;

        let envelope = sendgrid_envelope()
            .with_html(r#"<p onmouseover="steal()">Hi</p><script>steal()</script>"#);
        mailer_for(&server).send(&envelope).await.unwrap();

        let body = request_json(&server, 0).await;
        assert_eq!(body["content"][1]["value"], "<p>Hi</p>");
    }

    #[tokio::test]
    async fn test_other_success_status_is_accepted_with_warning() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/mail/send"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let sent = mailer_for(&server).send(&sendgrid_envelope()).await.unwrap();

        assert_eq!(sent.status, 200);
        assert!(!sent.accepted);
    }

    #[tokio::test]
    async fn test_server_error_is_returned() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/mail/send"))
            .respond_with(ResponseTemplate::new(500).set_body_string("internal error"))
            .expect(1)
            .mount(&server)
            .await;

        let err = mailer_for(&server)
            .send(&sendgrid_envelope())
            .await
            .unwrap_err();

        match err {
            CourierError::ProviderRejected {
                platform,
                status,
                body,
                ..
            } => {
                assert_eq!(platform, Platform::SendGrid);
                assert_eq!(status, 500);
                assert_eq!(body, "internal error");
            }
            other => panic!("expected ProviderRejected, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_missing_sender_makes_no_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(202))
            .expect(0)
            .mount(&server)
            .await;

        let envelope = Envelope::with_credentials(
            CredentialSet::new([("SENDGRID_API_KEY", "SG.test-key"), ("SENDGRID_SENDER", "")]),
            Platform::SendGrid,
        )
        .to("", "ann@example.com");

        let result = mailer_for(&server).send(&envelope).await;
        assert!(matches!(
            result,
            Err(CourierError::MissingSender(Platform::SendGrid))
        ));
    }

    #[tokio::test]
    async fn test_unreachable_provider_is_transport_error() {
        let mailer = Mailer::new(CourierConfig::new(
            ProviderTable::standard(),
            ProviderEndpoints {
                sendgrid: "http://127.0.0.1:9".to_string(),
                ..Default::default()
            },
        ));

        let err = mailer.send(&sendgrid_envelope()).await.unwrap_err();
        assert!(matches!(
            err,
            CourierError::ProviderTransport {
                platform: Platform::SendGrid,
                ..
            }
        ));
        assert!(err.is_provider_error());
    }
}

mod sendinblue {
    use super::*;

    async fn mount_account(server: &MockServer, status: u16) {
        Mock::given(method("GET"))
            .and(path("/account"))
            .and(header("api-key", "xkeysib-test"))
            .respond_with(ResponseTemplate::new(status).set_body_json(json!({
                "email": "owner@example.com"
            })))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_created() {
        let server = MockServer::start().await;
        mount_account(&server, 200).await;
        Mock::given(method("POST"))
            .and(path("/smtp/email"))
            .and(header("api-key", "xkeysib-test"))
            .and(body_partial_json(json!({
                "sender": { "email": "blue@example.com" },
                "to": [{ "email": "ann@example.com" }],
                "subject": "Welcome",
                "textContent": "Hello Ann"
            })))
            .respond_with(
                ResponseTemplate::new(201).set_body_json(json!({ "messageId": "<sib-1@relay>" })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let sent = mailer_for(&server)
            .send(&sendinblue_envelope())
            .await
            .unwrap();

        assert_eq!(sent.status, 201);
        assert_eq!(sent.message_id.as_deref(), Some("<sib-1@relay>"));
    }

    #[tokio::test]
    async fn test_html_is_not_transmitted() {
        let server = MockServer::start().await;
        mount_account(&server, 200).await;
        Mock::given(method("POST"))
            .and(path("/smtp/email"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "messageId": "m" })))
            .mount(&server)
            .await;

        mailer_for(&server)
            .send(&sendinblue_envelope())
            .await
            .unwrap();

        let requests = server.received_requests().await.unwrap();
        let send = requests
            .iter()
            .find(|r| r.url.path() == "/smtp/email")
            .unwrap();
        let body: Value = serde_json::from_slice(&send.body).unwrap();
        assert!(body.get("htmlContent").is_none());
    }

    #[tokio::test]
    async fn test_failed_account_lookup_does_not_block_send() {
        let server = MockServer::start().await;
        mount_account(&server, 401).await;
        Mock::given(method("POST"))
            .and(path("/smtp/email"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "messageId": "m" })))
            .expect(1)
            .mount(&server)
            .await;

        let sent = mailer_for(&server)
            .send(&sendinblue_envelope())
            .await
            .unwrap();
        assert_eq!(sent.status, 201);
    }

    #[tokio::test]
    async fn test_non_created_status_surfaces_message_id() {
        let server = MockServer::start().await;
        mount_account(&server, 200).await;
        Mock::given(method("POST"))
            .and(path("/smtp/email"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "messageId": "partial" })))
            .mount(&server)
            .await;

        let err = mailer_for(&server)
            .send(&sendinblue_envelope())
            .await
            .unwrap_err();

        match err {
            CourierError::ProviderRejected {
                platform,
                status,
                message_id,
                ..
            } => {
                assert_eq!(platform, Platform::SendinBlue);
                assert_eq!(status, 200);
                assert_eq!(message_id.as_deref(), Some("partial"));
            }
            other => panic!("expected ProviderRejected, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_bad_request_is_rejected() {
        let server = MockServer::start().await;
        mount_account(&server, 200).await;
        Mock::given(method("POST"))
            .and(path("/smtp/email"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "code": "invalid_parameter",
                "message": "sender is invalid"
            })))
            .mount(&server)
            .await;

        let err = mailer_for(&server)
            .send(&sendinblue_envelope())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            CourierError::ProviderRejected {
                status: 400,
                message_id: None,
                ..
            }
        ));
        assert!(err.to_string().contains("sender is invalid"));
    }
}

mod mailgun {
    use super::*;

    #[tokio::test]
    async fn test_sent() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v3/mg.example.com/messages"))
            .and(header("authorization", "Basic YXBpOmtleS10ZXN0"))
            .and(body_string_contains("subject=Welcome"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "<mg-1@mg.example.com>",
                "message": "Queued. Thank you."
            })))
            .expect(1)
            .mount(&server)
            .await;

        let base_url = format!("{}/v3/mg.example.com", server.uri());
        let sent = Mailer::default()
            .send(&mailgun_envelope(&base_url))
            .await
            .unwrap();

        assert_eq!(sent.message_id.as_deref(), Some("<mg-1@mg.example.com>"));
    }

    #[tokio::test]
    async fn test_html_is_sanitized_and_attached() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/messages"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "m" })))
            .mount(&server)
            .await;

        let envelope =
            mailgun_envelope(&server.uri()).with_html("<p>ok</p><script>alert(1)</script>");
        Mailer::default().send(&envelope).await.unwrap();

        let requests = server.received_requests().await.unwrap();
        let body = String::from_utf8(requests[0].body.clone()).unwrap();
        assert!(body.contains("html=%3Cp%3Eok%3C%2Fp%3E"));
        assert!(!body.contains("script"));
    }

    #[tokio::test]
    async fn test_unauthorized() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/messages"))
            .respond_with(ResponseTemplate::new(401).set_body_string("Forbidden"))
            .mount(&server)
            .await;

        let err = Mailer::default()
            .send(&mailgun_envelope(&server.uri()))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            CourierError::ProviderRejected {
                platform: Platform::Mailgun,
                status: 401,
                ..
            }
        ));
    }
}

#[tokio::test]
async fn test_empty_credentials_never_reach_the_network() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(202))
        .expect(0)
        .mount(&server)
        .await;

    let envelope = Envelope::with_credentials(CredentialSet::default(), Platform::SendGrid)
        .to("", "ann@example.com")
        .from("", "grid@example.com");

    let result = mailer_for(&server).send(&envelope).await;
    assert!(matches!(result, Err(CourierError::NoCredentialsSet)));
}
