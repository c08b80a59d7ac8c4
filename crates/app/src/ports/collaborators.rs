//! Collaborator ports — the outbound HTTP services actions talk to.
//!
//! The device registry receives device commands and answers device status
//! lookups; the notification service receives owner notifications; webhooks
//! go to arbitrary caller-supplied URLs.

use std::future::Future;
use std::sync::Arc;

use scenario_domain::event::Payload;
use serde_json::Value;

/// Failure of a call to a collaborator.
///
/// Never surfaced to API callers: dispatch runs after the triggering
/// request has been answered, so these are only logged and counted.
#[derive(Debug, thiserror::Error)]
pub enum DownstreamError {
    /// The request could not be sent or timed out.
    #[error("request to {target} failed")]
    Transport {
        target: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The collaborator answered with an error status.
    #[error("{target} answered with status {status}")]
    Status { target: String, status: u16 },

    /// The response body was not what we expected.
    #[error("unexpected response from {target}")]
    Decode {
        target: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A webhook action without a usable `params.url`.
    #[error("webhook url not specified")]
    MissingWebhookUrl,
}

/// Notification sent to the owner of a scenario.
///
/// Fields the action did not provide are `null`.
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub owner_id: String,
    pub title: Value,
    pub message: Value,
    pub priority: Value,
}

/// Side effects performed by actions.
pub trait Collaborators: Send + Sync {
    /// Ask the device registry to run `command` on `device_id`.
    fn send_device_command(
        &self,
        device_id: &str,
        command: &str,
        params: &Payload,
    ) -> impl Future<Output = Result<(), DownstreamError>> + Send;

    /// Hand a notification to the notification service.
    fn notify(
        &self,
        notification: Notification,
    ) -> impl Future<Output = Result<(), DownstreamError>> + Send;

    /// POST `body` to `url`.
    fn call_webhook(
        &self,
        url: &str,
        body: &Value,
    ) -> impl Future<Output = Result<(), DownstreamError>> + Send;
}

impl<T: Collaborators> Collaborators for Arc<T> {
    fn send_device_command(
        &self,
        device_id: &str,
        command: &str,
        params: &Payload,
    ) -> impl Future<Output = Result<(), DownstreamError>> + Send {
        (**self).send_device_command(device_id, command, params)
    }

    fn notify(
        &self,
        notification: Notification,
    ) -> impl Future<Output = Result<(), DownstreamError>> + Send {
        (**self).notify(notification)
    }

    fn call_webhook(
        &self,
        url: &str,
        body: &Value,
    ) -> impl Future<Output = Result<(), DownstreamError>> + Send {
        (**self).call_webhook(url, body)
    }
}

/// Read access to the live status of devices.
pub trait DeviceStateReader: Send + Sync {
    /// Current status document of `device_id`, or `None` if the registry
    /// does not know the device.
    fn device_status(
        &self,
        device_id: &str,
    ) -> impl Future<Output = Result<Option<Payload>, DownstreamError>> + Send;
}

impl<T: DeviceStateReader> DeviceStateReader for Arc<T> {
    fn device_status(
        &self,
        device_id: &str,
    ) -> impl Future<Output = Result<Option<Payload>, DownstreamError>> + Send {
        (**self).device_status(device_id)
    }
}
