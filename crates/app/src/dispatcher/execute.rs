//! Action execution — maps each [`ActionKind`] onto a collaborator call.

use std::future::Future;

use scenario_domain::event::Payload;
use scenario_domain::scenario::ActionKind;
use serde_json::Value;

use crate::ports::{Collaborators, DownstreamError, Notification};

/// What an action needs from its surroundings.
pub struct ExecutionContext<'a, C> {
    pub collaborators: &'a C,
    /// Owner of the scenario being dispatched; notifications go to them.
    pub owner_id: &'a str,
}

/// Something that performs a side effect through [`Collaborators`].
pub trait Execute {
    /// Perform the side effect once. No retries.
    fn execute<'a, C: Collaborators>(
        &'a self,
        ctx: ExecutionContext<'a, C>,
    ) -> impl Future<Output = Result<(), DownstreamError>> + Send;
}

impl Execute for ActionKind {
    fn execute<'a, C: Collaborators>(
        &'a self,
        ctx: ExecutionContext<'a, C>,
    ) -> impl Future<Output = Result<(), DownstreamError>> + Send {
        async move {
            match self {
                Self::DeviceCommand {
                    device_id,
                    command,
                    params,
                } => {
                    ctx.collaborators
                        .send_device_command(device_id, command, params)
                        .await
                }
                Self::Notification { params } => {
                    let notification = Notification {
                        owner_id: ctx.owner_id.to_string(),
                        title: param(params, "title"),
                        message: param(params, "message"),
                        priority: param(params, "priority"),
                    };
                    ctx.collaborators.notify(notification).await
                }
                Self::Webhook { params } => {
                    let url = params
                        .get("url")
                        .and_then(Value::as_str)
                        .filter(|url| !url.is_empty())
                        .ok_or(DownstreamError::MissingWebhookUrl)?;
                    let body = param(params, "body");
                    ctx.collaborators.call_webhook(url, &body).await
                }
            }
        }
    }
}

fn param(params: &Payload, key: &str) -> Value {
    params.get(key).cloned().unwrap_or(Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{Call, SpyCollaborators};
    use scenario_domain::scenario::Action;
    use serde_json::json;

    async fn run(kind: &ActionKind, spy: &SpyCollaborators) -> Result<(), DownstreamError> {
        kind.execute(ExecutionContext {
            collaborators: spy,
            owner_id: "u1",
        })
        .await
    }

    #[tokio::test]
    async fn should_send_device_command() {
        let spy = SpyCollaborators::default();
        run(&Action::device_command("d2", "turn_on").kind, &spy)
            .await
            .unwrap();
        assert_eq!(
            spy.calls(),
            [Call::Command {
                device_id: "d2".to_string(),
                command: "turn_on".to_string()
            }]
        );
    }

    #[tokio::test]
    async fn should_notify_scenario_owner() {
        let spy = SpyCollaborators::default();
        run(&Action::notification("Motion", "Hallway", "high").kind, &spy)
            .await
            .unwrap();
        assert_eq!(
            spy.calls(),
            [Call::Notify(Notification {
                owner_id: "u1".to_string(),
                title: json!("Motion"),
                message: json!("Hallway"),
                priority: json!("high"),
            })]
        );
    }

    #[tokio::test]
    async fn should_send_null_for_missing_notification_fields() {
        let spy = SpyCollaborators::default();
        let kind = ActionKind::Notification {
            params: Payload::new(),
        };
        run(&kind, &spy).await.unwrap();
        assert!(matches!(
            &spy.calls()[0],
            Call::Notify(n) if n.title.is_null() && n.priority.is_null()
        ));
    }

    #[tokio::test]
    async fn should_post_webhook_body() {
        let spy = SpyCollaborators::default();
        run(
            &Action::webhook("http://hooks.test/a", json!({"on": true})).kind,
            &spy,
        )
        .await
        .unwrap();
        assert_eq!(
            spy.calls(),
            [Call::Webhook {
                url: "http://hooks.test/a".to_string(),
                body: json!({"on": true})
            }]
        );
    }

    #[tokio::test]
    async fn should_fail_webhook_with_non_string_url() {
        let spy = SpyCollaborators::default();
        let mut params = Payload::new();
        params.insert("url".to_string(), json!(42));
        let result = run(&ActionKind::Webhook { params }, &spy).await;
        assert!(matches!(result, Err(DownstreamError::MissingWebhookUrl)));
        assert!(spy.calls().is_empty());
    }
}
