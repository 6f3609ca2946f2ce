use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

use crate::config::AppConfig;
use crate::errors::WatchError;

pub const SUBJECT: &str = "FFIV Online Free Trial";
pub const TEXT_PART: &str = "FFIV Online Free Trial Sales Are Resuming!";

/// Delivers the "trial is back" message to a whole recipient list at once.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn broadcast(&self, recipients: &[String]) -> Result<(), WatchError>;
}

/// Mailjet Send API v3.1 client.
pub struct MailjetMailer {
    client: Client,
    send_url: String,
    public_key: String,
    private_key: String,
    from_email: String,
    from_name: String,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct SendRequest<'a> {
    messages: [Message<'a>; 1],
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct Message<'a> {
    from: Address<'a>,
    to: Vec<Address<'a>>,
    subject: &'a str,
    text_part: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct Address<'a> {
    email: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
}

impl MailjetMailer {
    pub fn new(cfg: &AppConfig) -> Result<Self, WatchError> {
        let client = Client::builder().timeout(cfg.fetch_timeout()).build()?;

        Ok(Self {
            client,
            send_url: format!("{}/v3.1/send", cfg.mail_jet_api_url.trim_end_matches('/')),
            public_key: cfg.mail_jet_public_key.clone(),
            private_key: cfg.mail_jet_private_key.clone(),
            from_email: cfg.mail_from_email.clone(),
            from_name: cfg.mail_from_name.clone(),
        })
    }
}

#[async_trait]
impl Mailer for MailjetMailer {
    async fn broadcast(&self, recipients: &[String]) -> Result<(), WatchError> {
        let payload = SendRequest {
            messages: [Message {
                from: Address {
                    email: &self.from_email,
                    name: Some(self.from_name.as_str()),
                },
                to: recipients
                    .iter()
                    .map(|email| Address {
                        email: email.as_str(),
                        name: None,
                    })
                    .collect(),
                subject: SUBJECT,
                text_part: TEXT_PART,
            }],
        };

        let res = self
            .client
            .post(&self.send_url)
            .basic_auth(&self.public_key, Some(&self.private_key))
            .json(&payload)
            .send()
            .await?;

        // Only the API status counts; per-recipient results are not inspected.
        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            return Err(WatchError::MailRejected {
                status: status.as_u16(),
                body,
            });
        }

        tracing::debug!("Mailjet accepted message for {} recipients", recipients.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::Environment;
    use mockito::Matcher;
    use serde_json::json;

    fn mailer_for(api_url: &str) -> MailjetMailer {
        let vars: config::Map<String, String> = [
            ("MAIL_JET_PUBLIC_KEY", "pub"),
            ("MAIL_JET_PRIVATE_KEY", "priv"),
            ("MAIL_JET_API_URL", api_url),
            ("MAIL_FROM_EMAIL", "alerts@trial.test"),
            ("MAIL_FROM_NAME", "Alerts"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        let cfg = AppConfig::load(Environment::default().source(Some(vars))).unwrap();
        MailjetMailer::new(&cfg).unwrap()
    }

    #[tokio::test]
    async fn sends_one_message_to_all_recipients() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v3.1/send")
            // base64("pub:priv")
            .match_header("authorization", "Basic cHViOnByaXY=")
            .match_body(Matcher::Json(json!({
                "Messages": [{
                    "From": { "Email": "alerts@trial.test", "Name": "Alerts" },
                    "To": [{ "Email": "a@x.com" }, { "Email": "b@x.com" }],
                    "Subject": "FFIV Online Free Trial",
                    "TextPart": "FFIV Online Free Trial Sales Are Resuming!",
                }]
            })))
            .with_status(200)
            .with_body(r#"{"Messages":[{"Status":"success"}]}"#)
            .expect(1)
            .create_async()
            .await;

        let mailer = mailer_for(&server.url());
        let recipients = vec!["a@x.com".to_string(), "b@x.com".to_string()];

        mailer.broadcast(&recipients).await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn trailing_slash_in_api_url_is_tolerated() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v3.1/send")
            .with_status(200)
            .create_async()
            .await;

        let mailer = mailer_for(&format!("{}/", server.url()));
        mailer.broadcast(&["a@x.com".to_string()]).await.unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn rejected_send_is_an_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/v3.1/send")
            .with_status(401)
            .with_body("API key authentication/authorization failure")
            .create_async()
            .await;

        let mailer = mailer_for(&server.url());
        let err = mailer
            .broadcast(&["a@x.com".to_string()])
            .await
            .unwrap_err();

        match err {
            WatchError::MailRejected { status, body } => {
                assert_eq!(status, 401);
                assert!(body.contains("authorization failure"));
            }
            e => panic!("expected MailRejected, got {e:?}"),
        }
    }
}
