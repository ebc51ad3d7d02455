use crate::directory::InstanceDirectory;
use crate::events::EventRecord;
use crate::types::{DirectoryError, FeedError, Instance, LogFeed};
use crate::utils::{format_time, is_scheduled_pod, log_container};
use async_trait::async_trait;
use futures::io::AsyncBufReadExt;
use futures::stream::{StreamExt, TryStreamExt};
use k8s_openapi::api::core::v1::{Event, Pod};
use kube::api::{ListParams, LogParams};
use kube::{Api, Client, ResourceExt, config};
use std::sync::Arc;
use tracing::{info, trace};

/// Build a client for `context`, or for the current context when none is given.
pub async fn create_client(context: Option<&str>) -> anyhow::Result<Client> {
    let config = match context {
        Some(ctx) => config::Config::from_kubeconfig(&config::KubeConfigOptions {
            context: Some(ctx.to_string()),
            ..Default::default()
        })
        .await
        .map_err(|e| anyhow::anyhow!("Context '{}' not found in kubeconfig: {}", ctx, e))?,
        None => config::Config::infer().await?,
    };
    let client = Client::try_from(config)?;
    info!("Using context: {}", context.unwrap_or("current"));
    Ok(client)
}

/// Options applied to every log stream a [`PodDirectory`] opens.
#[derive(Debug, Clone, Default)]
pub struct StreamOptions {
    pub container: Option<String>,
    pub tail_lines: Option<i64>,
    pub timestamps: bool,
}

/// The scheduled pods of one namespace.
pub struct PodDirectory {
    api: Api<Pod>,
    namespace: String,
    selector: Option<String>,
    options: StreamOptions,
}

impl PodDirectory {
    pub fn new(
        client: Client,
        namespace: &str,
        selector: Option<String>,
        options: StreamOptions,
    ) -> Self {
        Self {
            api: Api::namespaced(client, namespace),
            namespace: namespace.to_string(),
            selector,
            options,
        }
    }
}

#[async_trait]
impl InstanceDirectory for PodDirectory {
    async fn list_instances(&self) -> Result<Vec<Arc<dyn Instance>>, DirectoryError> {
        let mut lp = ListParams::default();
        if let Some(selector) = &self.selector {
            lp = lp.labels(selector);
        }
        let pods = self.api.list(&lp).await?;

        let instances = pods
            .items
            .iter()
            .filter(|pod| is_scheduled_pod(pod))
            .map(|pod| {
                let instance = PodInstance {
                    api: self.api.clone(),
                    name: pod.name_any(),
                    namespace: self.namespace.clone(),
                    params: LogParams {
                        follow: true,
                        container: log_container(pod, self.options.container.as_deref()),
                        tail_lines: self.options.tail_lines,
                        timestamps: self.options.timestamps,
                        ..Default::default()
                    },
                };
                Arc::new(instance) as Arc<dyn Instance>
            })
            .collect::<Vec<_>>();
        trace!(
            "Found {} scheduled pod(s) in {}",
            instances.len(),
            self.namespace
        );
        Ok(instances)
    }
}

/// A pod whose log is followed through the API server.
pub struct PodInstance {
    api: Api<Pod>,
    name: String,
    namespace: String,
    params: LogParams,
}

#[async_trait]
impl Instance for PodInstance {
    fn name(&self) -> &str {
        &self.name
    }

    fn namespace(&self) -> &str {
        &self.namespace
    }

    async fn observe_log<'a>(&'a self) -> Result<LogFeed<'a>, FeedError> {
        if self.params.container.is_none() {
            return Err(FeedError::Unavailable(format!(
                "pod {} has no containers",
                self.name
            )));
        }
        let stream = self.api.log_stream(&self.name, &self.params).await?;
        Ok(stream.lines().map_err(FeedError::from).boxed())
    }
}

/// Events of `namespace`, flattened for the events dump.
pub async fn list_events(
    client: Client,
    namespace: &str,
) -> Result<Vec<EventRecord>, DirectoryError> {
    let api: Api<Event> = Api::namespaced(client, namespace);
    let events = api.list(&ListParams::default()).await?;

    Ok(events
        .items
        .into_iter()
        .map(|event| EventRecord {
            last_seen: event.last_timestamp.as_ref().map(format_time),
            first_seen: event.first_timestamp.as_ref().map(format_time),
            count: event.count,
            name: event.metadata.name.clone(),
            kind: event.involved_object.kind.clone(),
            sub_object: event.involved_object.field_path.clone(),
            event_type: event.type_.clone(),
            reason: event.reason.clone(),
            source: event.source.as_ref().and_then(|s| s.component.clone()),
            message: event.message.clone(),
        })
        .collect())
}
