use axum::{
    extract::{Query, State},
    http::{Method, StatusCode},
    routing::any,
    Router,
};

use crate::state::AppState;

/// `/subscribe` accepts every verb; 405 is only returned when an email is present.
pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/subscribe", any(handle_subscribe))
        .with_state(state)
}

//
// ─────────────────────────────────────────────────────────────
// POST   /subscribe?email=...   -> 201
// DELETE /subscribe?email=...   -> 204
// other  /subscribe?email=...   -> 405
// no (or empty) email           -> untouched, default 200
// ─────────────────────────────────────────────────────────────
//
async fn handle_subscribe(
    method: Method,
    State(state): State<AppState>,
    query: Option<Query<Vec<(String, String)>>>,
) -> StatusCode {
    let Some(email) = query.and_then(|Query(pairs)| first_email(pairs)) else {
        // Nothing to do and nothing written; the transport's default applies.
        return StatusCode::OK;
    };

    match method {
        Method::POST => {
            if state.registry.add(&email) {
                tracing::info!("Subscribed {}", email);
            }
            tracing::debug!("Mailing list: {:?}", state.registry.snapshot());
            StatusCode::CREATED
        }
        Method::DELETE => {
            if state.registry.remove(&email) {
                tracing::info!("Unsubscribed {}", email);
            }
            tracing::debug!("Mailing list: {:?}", state.registry.snapshot());
            StatusCode::NO_CONTENT
        }
        _ => StatusCode::METHOD_NOT_ALLOWED,
    }
}

/// First `email` value in the query string. Later repeats are ignored.
fn first_email(pairs: Vec<(String, String)>) -> Option<String> {
    pairs
        .into_iter()
        .find(|(key, _)| key == "email")
        .map(|(_, value)| value)
        .filter(|email| !email.is_empty())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use reqwest::{Client, Method};
    use tokio::net::TcpListener;

    use super::*;
    use crate::state::SubscriberRegistry;

    async fn spawn(registry: Arc<SubscriberRegistry>) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = routes(AppState::new(registry));

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        format!("http://{addr}/subscribe")
    }

    #[tokio::test]
    async fn post_adds_once_and_always_answers_created() {
        let registry = Arc::new(SubscriberRegistry::new());
        let url = spawn(registry.clone()).await;
        let client = Client::new();

        for _ in 0..2 {
            let res = client
                .post(&url)
                .query(&[("email", "foo@bar.com")])
                .send()
                .await
                .unwrap();
            assert_eq!(res.status(), StatusCode::CREATED);
            assert!(res.text().await.unwrap().is_empty());
        }

        assert_eq!(registry.snapshot(), vec!["foo@bar.com"]);
    }

    #[tokio::test]
    async fn repeated_email_uses_the_first_value() {
        let registry = Arc::new(SubscriberRegistry::new());
        let url = spawn(registry.clone()).await;

        let res = Client::new()
            .post(format!("{url}?email=a@x.com&email=b@x.com"))
            .send()
            .await
            .unwrap();

        assert_eq!(res.status(), StatusCode::CREATED);
        assert_eq!(registry.snapshot(), vec!["a@x.com"]);
    }

    #[test]
    fn first_email_skips_other_keys() {
        let pairs = vec![
            ("other".to_string(), "x@y.com".to_string()),
            ("email".to_string(), "a@x.com".to_string()),
            ("email".to_string(), "b@x.com".to_string()),
        ];
        assert_eq!(first_email(pairs), Some("a@x.com".to_string()));

        let empty_first = vec![
            ("email".to_string(), String::new()),
            ("email".to_string(), "b@x.com".to_string()),
        ];
        assert_eq!(first_email(empty_first), None);
    }

    #[tokio::test]
    async fn delete_removes_and_answers_no_content() {
        let registry = Arc::new(SubscriberRegistry::with_subscribers(["foo@bar.com", "x@y.com"]));
        let url = spawn(registry.clone()).await;
        let client = Client::new();

        let res = client
            .delete(&url)
            .query(&[("email", "foo@bar.com")])
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::NO_CONTENT);
        assert_eq!(registry.snapshot(), vec!["x@y.com"]);

        // Absent address: still 204, nothing changes.
        let res = client
            .delete(&url)
            .query(&[("email", "foo@bar.com")])
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::NO_CONTENT);
        assert_eq!(registry.snapshot(), vec!["x@y.com"]);
    }

    #[tokio::test]
    async fn other_verbs_with_email_are_not_allowed() {
        let registry = Arc::new(SubscriberRegistry::with_subscribers(["x@y.com"]));
        let url = spawn(registry.clone()).await;
        let client = Client::new();

        for method in [Method::PUT, Method::GET, Method::PATCH] {
            let res = client
                .request(method.clone(), &url)
                .query(&[("email", "foo@bar.com")])
                .send()
                .await
                .unwrap();
            assert_eq!(res.status(), StatusCode::METHOD_NOT_ALLOWED, "{method}");
        }

        assert_eq!(registry.snapshot(), vec!["x@y.com"]);
    }

    #[tokio::test]
    async fn missing_or_empty_email_is_ignored() {
        let registry = Arc::new(SubscriberRegistry::with_subscribers(["x@y.com"]));
        let url = spawn(registry.clone()).await;
        let client = Client::new();

        let requests = [
            client.post(&url),
            client.delete(&url),
            client.put(&url),
            client.post(&url).query(&[("email", "")]),
            client.delete(&url).query(&[("other", "x@y.com")]),
        ];

        for req in requests {
            let res = req.send().await.unwrap();
            assert_eq!(res.status(), StatusCode::OK);
            assert!(res.text().await.unwrap().is_empty());
        }

        assert_eq!(registry.snapshot(), vec!["x@y.com"]);
    }
}
