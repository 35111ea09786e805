// ABOUTME: Notification transport seam and its email, SMS, and logging adapters
// ABOUTME: Twilio Messages API for SMS, a bearer-key JSON API for email, and a log-only stand-in

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Transport request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Provider rejected the message with HTTP {status}: {body}")]
    Rejected { status: u16, body: String },
}

#[async_trait]
pub trait NotificationTransport: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    async fn send(&self, destination: &str, subject: &str, body: &str) -> Result<(), TransportError>;
}

fn http_client(timeout: Duration) -> Result<reqwest::Client, TransportError> {
    Ok(reqwest::Client::builder()
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(5)))
        .build()?)
}

async fn check(response: reqwest::Response) -> Result<(), TransportError> {
    let status = response.status();
    if status.is_success() {
        return Ok(());
    }
    let body = response.text().await.unwrap_or_default();
    Err(TransportError::Rejected {
        status: status.as_u16(),
        body,
    })
}

/// Stand-in used when a channel has no credentials configured
#[derive(Debug, Clone)]
pub struct LogTransport {
    name: &'static str,
}

impl LogTransport {
    pub fn new(name: &'static str) -> Self {
        Self { name }
    }
}

#[async_trait]
impl NotificationTransport for LogTransport {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn send(&self, destination: &str, subject: &str, _body: &str) -> Result<(), TransportError> {
        info!(
            "[{} not configured] would notify {}: {}",
            self.name, destination, subject
        );
        Ok(())
    }
}

/// Twilio Messages API
pub struct TwilioSmsTransport {
    client: reqwest::Client,
    api_url: String,
    account_sid: String,
    auth_token: String,
    from_number: String,
}

impl TwilioSmsTransport {
    pub fn new(
        api_url: impl Into<String>,
        account_sid: impl Into<String>,
        auth_token: impl Into<String>,
        from_number: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, TransportError> {
        Ok(Self {
            client: http_client(timeout)?,
            api_url: api_url.into().trim_end_matches('/').to_string(),
            account_sid: account_sid.into(),
            auth_token: auth_token.into(),
            from_number: from_number.into(),
        })
    }
}

#[async_trait]
impl NotificationTransport for TwilioSmsTransport {
    fn name(&self) -> &'static str {
        "sms"
    }

    /// SMS has no subject line; only `body` is sent
    async fn send(&self, destination: &str, _subject: &str, body: &str) -> Result<(), TransportError> {
        let url = format!(
            "{}/Accounts/{}/Messages.json",
            self.api_url, self.account_sid
        );
        debug!("Sending SMS to {}", destination);

        let response = self
            .client
            .post(&url)
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(&[
                ("To", destination),
                ("From", self.from_number.as_str()),
                ("Body", body),
            ])
            .send()
            .await?;

        check(response).await
    }
}

#[derive(Serialize)]
struct EmailPayload<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    text: &'a str,
}

/// Transactional email API taking a JSON body and a bearer key
pub struct HttpEmailTransport {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    from_address: String,
}

impl HttpEmailTransport {
    pub fn new(
        api_url: impl Into<String>,
        api_key: impl Into<String>,
        from_address: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, TransportError> {
        Ok(Self {
            client: http_client(timeout)?,
            api_url: api_url.into(),
            api_key: api_key.into(),
            from_address: from_address.into(),
        })
    }
}

#[async_trait]
impl NotificationTransport for HttpEmailTransport {
    fn name(&self) -> &'static str {
        "email"
    }

    async fn send(&self, destination: &str, subject: &str, body: &str) -> Result<(), TransportError> {
        debug!("Sending email to {}", destination);

        let payload = EmailPayload {
            from: &self.from_address,
            to: [destination],
            subject,
            text: body,
        };

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await?;

        check(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, body_string_contains, header, header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_twilio_posts_form_with_basic_auth() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/Accounts/AC123/Messages.json"))
            .and(header_exists("authorization"))
            .and(body_string_contains("To=%2B15555550100"))
            .and(body_string_contains("From=%2B15555550199"))
            .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({"sid": "SM1"})))
            .expect(1)
            .mount(&server)
            .await;

        let sms = TwilioSmsTransport::new(
            server.uri(),
            "AC123",
            "secret",
            "+15555550199",
            Duration::from_secs(5),
        )
        .unwrap();

        sms.send("+15555550100", "ignored", "Your car is ready")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_email_posts_json_with_bearer_key() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/emails"))
            .and(header("authorization", "Bearer re_test"))
            .and(body_json(serde_json::json!({
                "from": "shop@example.com",
                "to": ["dana@example.com"],
                "subject": "Ready",
                "text": "Your car is ready"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"id": "e1"})))
            .expect(1)
            .mount(&server)
            .await;

        let email = HttpEmailTransport::new(
            format!("{}/emails", server.uri()),
            "re_test",
            "shop@example.com",
            Duration::from_secs(5),
        )
        .unwrap();

        email
            .send("dana@example.com", "Ready", "Your car is ready")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_rejection_carries_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_string("invalid number"))
            .mount(&server)
            .await;

        let sms = TwilioSmsTransport::new(
            server.uri(),
            "AC123",
            "secret",
            "+15555550199",
            Duration::from_secs(5),
        )
        .unwrap();

        let err = sms.send("not-a-number", "", "hi").await.unwrap_err();
        assert!(matches!(err, TransportError::Rejected { status: 400, .. }));
    }

    #[tokio::test]
    async fn test_log_transport_always_succeeds() {
        let transport = LogTransport::new("email");
        assert_eq!(transport.name(), "email");
        assert!(transport.send("dana@example.com", "Hi", "Body").await.is_ok());
    }
}
