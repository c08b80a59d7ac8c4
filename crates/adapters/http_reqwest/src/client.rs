//! reqwest implementation of the collaborator ports.

use reqwest::{Client, Response, StatusCode};
use serde_json::{Value, json};

use scenario_app::ports::{Collaborators, DeviceStateReader, DownstreamError, Notification};
use scenario_domain::event::Payload;

/// HTTP clients for the device registry, the notification service and
/// webhooks, sharing one connection pool.
#[derive(Debug, Clone)]
pub struct HttpCollaborators {
    client: Client,
    device_service_url: String,
    notification_url: String,
}

impl HttpCollaborators {
    /// Wrap an existing client. Base URLs must not end with `/`.
    #[must_use]
    pub fn new(client: Client, device_service_url: &str, notification_url: &str) -> Self {
        Self {
            client,
            device_service_url: device_service_url.to_string(),
            notification_url: notification_url.to_string(),
        }
    }

    pub(crate) fn command_url(&self, device_id: &str) -> String {
        format!("{}/devices/{device_id}/command", self.device_service_url)
    }

    fn status_url(&self, device_id: &str) -> String {
        format!("{}/devices/{device_id}/status", self.device_service_url)
    }

    fn notify_url(&self) -> String {
        format!("{}/notify", self.notification_url)
    }

    async fn post(&self, target: &str, url: &str, body: &Value) -> Result<(), DownstreamError> {
        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|err| transport(target, err))?;
        check_status(target, &response)?;
        tracing::debug!(collaborator = target, status = %response.status(), "collaborator call succeeded");
        Ok(())
    }
}

fn transport(target: &str, err: reqwest::Error) -> DownstreamError {
    DownstreamError::Transport {
        target: target.to_string(),
        source: Box::new(err),
    }
}

fn check_status(target: &str, response: &Response) -> Result<(), DownstreamError> {
    let status = response.status();
    if status.is_client_error() || status.is_server_error() {
        return Err(DownstreamError::Status {
            target: target.to_string(),
            status: status.as_u16(),
        });
    }
    Ok(())
}

impl Collaborators for HttpCollaborators {
    async fn send_device_command(
        &self,
        device_id: &str,
        command: &str,
        params: &Payload,
    ) -> Result<(), DownstreamError> {
        let body = json!({
            "command": command,
            "params": params,
        });
        self.post("device service", &self.command_url(device_id), &body)
            .await
    }

    async fn notify(&self, notification: Notification) -> Result<(), DownstreamError> {
        let body = json!({
            "owner_id": notification.owner_id,
            "type": "automation",
            "title": notification.title,
            "message": notification.message,
            "priority": notification.priority,
        });
        self.post("notification service", &self.notify_url(), &body)
            .await
    }

    async fn call_webhook(&self, url: &str, body: &Value) -> Result<(), DownstreamError> {
        self.post("webhook", url, body).await
    }
}

impl DeviceStateReader for HttpCollaborators {
    async fn device_status(&self, device_id: &str) -> Result<Option<Payload>, DownstreamError> {
        const TARGET: &str = "device service";
        let response = self
            .client
            .get(self.status_url(device_id))
            .send()
            .await
            .map_err(|err| transport(TARGET, err))?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        check_status(TARGET, &response)?;

        let status: Value = response.json().await.map_err(|err| DownstreamError::Decode {
            target: TARGET.to_string(),
            source: Box::new(err),
        })?;
        match status {
            Value::Object(map) => Ok(Some(map)),
            other => Err(DownstreamError::Decode {
                target: TARGET.to_string(),
                source: format!("expected a JSON object, got {other}").into(),
            }),
        }
    }
}
