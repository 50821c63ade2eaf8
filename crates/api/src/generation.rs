//! Outbound generation trigger
//!
//! Notifies the external workflow engine that a submission is ready to
//! render. The call is fire-and-forget: the engine reports back through the
//! completion webhook, and a delivery failure here must not fail the
//! user-visible submission flow.

use serde::Serialize;
use uuid::Uuid;

use crate::store::Submission;

#[derive(Debug, Serialize)]
struct GenerationRequest<'a> {
    submission_id: Uuid,
    product_title: &'a str,
    user_prompt: &'a str,
    user_email: &'a str,
    template_style: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    image_base64: Option<&'a str>,
}

/// Client for the workflow engine's intake endpoint
#[derive(Clone)]
pub struct GenerationClient {
    http: reqwest::Client,
    webhook_url: Option<String>,
}

impl GenerationClient {
    pub fn new(http: reqwest::Client, webhook_url: Option<String>) -> Self {
        Self { http, webhook_url }
    }

    /// Post the full submission payload to the workflow engine.
    ///
    /// Transport errors and non-2xx responses are logged and swallowed.
    pub async fn notify_submission(&self, submission: &Submission) {
        let Some(url) = &self.webhook_url else {
            tracing::warn!(
                submission_id = %submission.id,
                "GENERATION_WEBHOOK_URL not set - submission will stay pending"
            );
            return;
        };

        let payload = GenerationRequest {
            submission_id: submission.id,
            product_title: &submission.product_title,
            user_prompt: &submission.user_prompt,
            user_email: &submission.user_email,
            template_style: &submission.template_style,
            image_base64: submission.image_base64.as_deref(),
        };

        match self.http.post(url).json(&payload).send().await {
            Ok(response) if response.status().is_success() => {
                tracing::info!(submission_id = %submission.id, "Generation triggered");
            }
            Ok(response) => {
                tracing::warn!(
                    submission_id = %submission.id,
                    status = %response.status(),
                    "Generation webhook returned non-success"
                );
            }
            Err(e) => {
                tracing::error!(
                    submission_id = %submission.id,
                    error = %e,
                    "Failed to reach generation webhook"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reelforge_shared::SubmissionStatus;
    use time::OffsetDateTime;

    fn submission() -> Submission {
        let now = OffsetDateTime::now_utc();
        Submission {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            product_title: "Desk Lamp".to_string(),
            user_prompt: "warm lighting".to_string(),
            user_email: "user@example.com".to_string(),
            template_style: "Lifestyle".to_string(),
            image_base64: Some("aGVsbG8=".to_string()),
            status: SubmissionStatus::Pending,
            video_url: None,
            error_message: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn posts_payload_to_configured_url() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/intake")
            .match_header("content-type", "application/json")
            .with_status(200)
            .create_async()
            .await;

        let client = GenerationClient::new(
            reqwest::Client::new(),
            Some(format!("{}/intake", server.url())),
        );
        client.notify_submission(&submission()).await;

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn server_error_is_swallowed() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/intake")
            .with_status(500)
            .create_async()
            .await;

        let client = GenerationClient::new(
            reqwest::Client::new(),
            Some(format!("{}/intake", server.url())),
        );
        // Must return normally despite the 500
        client.notify_submission(&submission()).await;

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn missing_url_is_a_no_op() {
        let client = GenerationClient::new(reqwest::Client::new(), None);
        client.notify_submission(&submission()).await;
    }
}
