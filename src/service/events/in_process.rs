//! In-process event channel backed by tokio tasks.

use std::sync::{Arc, PoisonError, RwLock};

use tracing::{Instrument, error, info, instrument, warn};

use crate::base::types::{ReleaseEvent, Void};

use super::{EventChannel, GenericEventChannel, ReleaseHandler};

impl EventChannel {
    /// Creates an event channel that delivers to subscribers within this process.
    pub fn in_process() -> Self {
        Self::new(Arc::new(InProcessEventChannel::default()))
    }
}

/// Delivers each published payload to all subscribers on a spawned task.
#[derive(Default)]
pub struct InProcessEventChannel {
    subscribers: RwLock<Vec<Arc<dyn ReleaseHandler>>>,
}

impl InProcessEventChannel {
    /// Performs one delivery of `payload` and waits for every subscriber to finish.
    ///
    /// `publish` runs this on a background task. Calling it directly makes
    /// duplicate or reordered delivery easy to reproduce.
    #[instrument(skip_all)]
    pub async fn deliver(&self, payload: &str) -> Void {
        let subscribers = self.subscribers();
        deliver_to(&subscribers, payload).await
    }

    fn subscribers(&self) -> Vec<Arc<dyn ReleaseHandler>> {
        self.subscribers.read().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

impl GenericEventChannel for InProcessEventChannel {
    #[instrument(skip_all)]
    fn publish(&self, payload: String) -> Void {
        let subscribers = self.subscribers();

        if subscribers.is_empty() {
            warn!("Publishing release event with no subscribers.");
        }

        tokio::spawn(
            async move {
                // Log any errors.
                if let Err(err) = deliver_to(&subscribers, &payload).await {
                    error!("Error while delivering release event: {:#}", err);
                }
            }
            .in_current_span(),
        );

        Ok(())
    }

    fn subscribe(&self, handler: Arc<dyn ReleaseHandler>) {
        info!("Subscribing `{}` to release events ...", handler.name());
        self.subscribers.write().unwrap_or_else(PoisonError::into_inner).push(handler);
    }
}

/// Decodes the payload once and runs every subscriber concurrently.
///
/// A failing subscriber is logged and does not affect the others.
async fn deliver_to(subscribers: &[Arc<dyn ReleaseHandler>], payload: &str) -> Void {
    let release = ReleaseEvent::from_payload(payload)?;

    info!("Delivering release `{}` ({}) to {} subscriber(s) ...", release.title, release.tag, subscribers.len());

    let deliveries = subscribers.iter().map(|handler| {
        let release = &release;
        async move {
            if let Err(err) = handler.handle(release).await {
                error!("Subscriber `{}` failed to handle release `{}`: {:#}", handler.name(), release.tag, err);
            }
        }
    });

    futures::future::join_all(deliveries).await;

    Ok(())
}

// Tests.

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use tokio::sync::mpsc;

    use super::*;

    /// Records the tags of every release it sees.
    struct Recorder {
        name: String,
        seen: Mutex<Vec<String>>,
        fail: bool,
    }

    impl Recorder {
        fn new(name: &str, fail: bool) -> Arc<Self> {
            Arc::new(Self {
                name: name.to_string(),
                seen: Mutex::new(Vec::new()),
                fail,
            })
        }

        fn seen(&self) -> Vec<String> {
            self.seen.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ReleaseHandler for Recorder {
        fn name(&self) -> &str {
            &self.name
        }

        async fn handle(&self, release: &ReleaseEvent) -> Void {
            self.seen.lock().unwrap().push(release.tag.clone());

            if self.fail {
                return Err(anyhow::anyhow!("boom"));
            }

            Ok(())
        }
    }

    /// Forwards every release to a channel so a test can await it.
    struct Forwarder(mpsc::UnboundedSender<ReleaseEvent>);

    #[async_trait]
    impl ReleaseHandler for Forwarder {
        fn name(&self) -> &str {
            "forwarder"
        }

        async fn handle(&self, release: &ReleaseEvent) -> Void {
            self.0.send(release.clone())?;
            Ok(())
        }
    }

    fn payload(tag: &str) -> String {
        serde_json::json!({
            "action": "released",
            "repository": { "full_name": "acme/widget" },
            "release": {
                "name": format!("Widget {tag}"),
                "author": { "login": "alice" },
                "tag_name": tag,
                "body": "Notes",
                "html_url": "https://x/y",
            },
        })
        .to_string()
    }

    #[tokio::test]
    async fn delivers_to_every_subscriber() {
        let channel = InProcessEventChannel::default();
        let first = Recorder::new("first", false);
        let second = Recorder::new("second", false);

        channel.subscribe(first.clone());
        channel.subscribe(second.clone());

        channel.deliver(&payload("v1.0.0")).await.unwrap();

        assert_eq!(first.seen(), vec!["v1.0.0"]);
        assert_eq!(second.seen(), vec!["v1.0.0"]);
    }

    #[tokio::test]
    async fn duplicate_and_reordered_delivery_invokes_each_time() {
        let channel = InProcessEventChannel::default();
        let recorder = Recorder::new("recorder", false);

        channel.subscribe(recorder.clone());

        channel.deliver(&payload("v1.1.0")).await.unwrap();
        channel.deliver(&payload("v1.0.0")).await.unwrap();
        channel.deliver(&payload("v1.1.0")).await.unwrap();

        assert_eq!(recorder.seen(), vec!["v1.1.0", "v1.0.0", "v1.1.0"]);
    }

    #[tokio::test]
    async fn failing_subscriber_does_not_block_others() {
        let channel = InProcessEventChannel::default();
        let failing = Recorder::new("failing", true);
        let healthy = Recorder::new("healthy", false);

        channel.subscribe(failing.clone());
        channel.subscribe(healthy.clone());

        assert!(channel.deliver(&payload("v2.0.0")).await.is_ok());
        assert_eq!(failing.seen(), vec!["v2.0.0"]);
        assert_eq!(healthy.seen(), vec!["v2.0.0"]);
    }

    #[tokio::test]
    async fn undecodable_payload_reaches_no_subscriber() {
        let channel = InProcessEventChannel::default();
        let recorder = Recorder::new("recorder", false);

        channel.subscribe(recorder.clone());

        assert!(channel.deliver(r#"{"action":"released"}"#).await.is_err());
        assert!(recorder.seen().is_empty());
    }

    #[tokio::test]
    async fn publish_delivers_in_the_background() {
        let channel = EventChannel::in_process();
        let (tx, mut rx) = mpsc::unbounded_channel();

        channel.subscribe(Arc::new(Forwarder(tx)));
        channel.publish(payload("v0.3.0")).unwrap();

        let release = tokio::time::timeout(std::time::Duration::from_secs(5), rx.recv()).await.unwrap().unwrap();

        assert_eq!(release.tag, "v0.3.0");
        assert_eq!(release.author, "alice");
    }
}
