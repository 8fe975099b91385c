//! Messages service HTTP client.

use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::time::Duration;

use super::error::{MessagesError, MessagesResult};
use crate::auth::SharedTokenSource;
use flowdesk_protocol::{MailboxMessage, OutgoingMessage, SendAck};

/// Client for the console's messages endpoints.
#[derive(Clone)]
pub struct MessagesClient {
    /// HTTP client.
    client: Client,
    /// Base URL of the messages service (e.g. "https://localhost:7016").
    base_url: String,
    /// Bearer credential source.
    token_source: SharedTokenSource,
}

impl MessagesClient {
    /// Create a new messages client.
    pub fn new(base_url: impl Into<String>, token_source: SharedTokenSource) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            base_url: base_url.into(),
            token_source,
        }
    }

    /// Submit a message. Requires a bearer token.
    ///
    /// The response body carries no guaranteed correlation to the eventual
    /// stream echo; the returned ack id, when present, is display-only.
    pub async fn send(&self, message: &OutgoingMessage) -> MessagesResult<SendAck> {
        let token = self
            .token_source
            .token()
            .ok_or(MessagesError::MissingToken)?;
        let url = format!("{}/api/Messages/send", self.base_url);
        let response = self
            .client
            .post(&url)
            .bearer_auth(token)
            .json(&message.to_wire())
            .send()
            .await?;

        let body = self.handle_response(response).await?;
        Ok(SendAck::from_value(&body))
    }

    /// List the inbox for an employee.
    pub async fn inbox(&self, employee_id: i64) -> MessagesResult<Vec<MailboxMessage>> {
        self.mailbox("inbox", employee_id).await
    }

    /// List the outbox for an employee.
    pub async fn outbox(&self, employee_id: i64) -> MessagesResult<Vec<MailboxMessage>> {
        self.mailbox("outbox", employee_id).await
    }

    /// Mark an inbox message read.
    pub async fn mark_read(&self, id: &str) -> MessagesResult<()> {
        let url = format!("{}/api/Messages/inbox/{}/read", self.base_url, id);
        let response = self.attach_token(self.client.put(&url)).send().await?;
        self.handle_response(response).await?;
        Ok(())
    }

    async fn mailbox(&self, box_name: &str, employee_id: i64) -> MessagesResult<Vec<MailboxMessage>> {
        let url = format!("{}/api/Messages/{}", self.base_url, box_name);
        let response = self
            .attach_token(self.client.get(&url))
            .query(&[("employeeId", employee_id)])
            .send()
            .await?;

        let body = self.handle_response(response).await?;
        // Some service builds wrap the list; anything that is not an array
        // lists as empty rather than failing the whole screen.
        let items = match body {
            Value::Array(items) => items,
            _ => Vec::new(),
        };
        Ok(items.into_iter().map(MailboxMessage::from_value).collect())
    }

    /// Attach the bearer token when one is available. Reads work without a
    /// credential; the service decides what an anonymous caller may see.
    fn attach_token(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.token_source.token() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn handle_response(&self, response: reqwest::Response) -> MessagesResult<Value> {
        let status = response.status();
        if status.is_success() {
            // Some endpoints answer with an empty body.
            let bytes = response.bytes().await?;
            if bytes.is_empty() {
                return Ok(Value::Null);
            }
            return serde_json::from_slice(&bytes)
                .map_err(|e| MessagesError::ParseError(e.to_string()));
        }

        if status == StatusCode::UNAUTHORIZED {
            return Err(MessagesError::Unauthorized);
        }

        let message = response.text().await.unwrap_or_default();
        Err(MessagesError::Api {
            status: status.as_u16(),
            message,
        })
    }
}
