//! AWS ECS task and container metadata.
//!
//! On ECS the agent injects `ECS_CONTAINER_METADATA_URI_V4` (platform 1.4+)
//! or `ECS_CONTAINER_METADATA_URI` (v3) into every container. The v4
//! endpoint serves the container's metadata at its root and the task's at
//! `/task`. Outside ECS neither variable is set and the detector contributes
//! nothing.

use std::time::Duration;

use opentelemetry::{KeyValue, StringValue, Value};
use opentelemetry_semantic_conventions::resource::{
    AWS_ECS_CLUSTER_ARN, AWS_ECS_CONTAINER_ARN, AWS_ECS_LAUNCHTYPE, AWS_ECS_TASK_ARN,
    AWS_ECS_TASK_FAMILY, AWS_ECS_TASK_REVISION, AWS_LOG_GROUP_NAMES, AWS_LOG_STREAM_NAMES,
    CLOUD_ACCOUNT_ID, CLOUD_AVAILABILITY_ZONE, CLOUD_PLATFORM, CLOUD_PROVIDER, CLOUD_REGION,
    CONTAINER_ID, CONTAINER_NAME,
};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::env::env_var_non_empty;
use crate::error::BoxError;

use super::Detector;

const METADATA_URI_V4: &str = "ECS_CONTAINER_METADATA_URI_V4";
const METADATA_URI_V3: &str = "ECS_CONTAINER_METADATA_URI";
const METADATA_TIMEOUT: Duration = Duration::from_secs(2);

/// Detects the ECS task and container this process runs in.
///
/// With the v4 metadata endpoint available the task ARN, family, revision,
/// cluster, launch type, availability zone, and CloudWatch log group are
/// reported. With only v3, just the cloud platform and container name are.
/// An unreachable or malformed endpoint is an error.
#[derive(Debug, Default, Clone, Copy)]
pub struct EcsDetector;

impl Detector for EcsDetector {
    fn name(&self) -> &str {
        "ecs"
    }

    fn detect(&self) -> Result<Vec<KeyValue>, BoxError> {
        let v4 = env_var_non_empty(METADATA_URI_V4);
        if v4.is_none() && env_var_non_empty(METADATA_URI_V3).is_none() {
            return Ok(Vec::new());
        }

        let mut attributes = vec![
            KeyValue::new(CLOUD_PROVIDER, "aws"),
            KeyValue::new(CLOUD_PLATFORM, "aws_ecs"),
        ];

        match v4 {
            Some(base) => {
                let (container, task) = fetch_metadata(base)?;
                attributes.extend(container.attributes());
                attributes.extend(task.attributes());
            }
            None => {
                if let Some(host_name) = sysinfo::System::host_name() {
                    attributes.push(KeyValue::new(CONTAINER_NAME, host_name));
                }
            }
        }

        Ok(attributes)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ContainerMetadata {
    docker_id: Option<String>,
    name: Option<String>,
    #[serde(rename = "ContainerARN")]
    container_arn: Option<String>,
    log_driver: Option<String>,
    log_options: Option<LogOptions>,
}

#[derive(Debug, Default, Deserialize)]
struct LogOptions {
    #[serde(rename = "awslogs-group")]
    group: Option<String>,
    #[serde(rename = "awslogs-stream")]
    stream: Option<String>,
}

impl ContainerMetadata {
    fn attributes(self) -> Vec<KeyValue> {
        let mut attributes = Vec::new();
        if let Some(name) = self.name {
            attributes.push(KeyValue::new(CONTAINER_NAME, name));
        }
        if let Some(id) = self.docker_id {
            attributes.push(KeyValue::new(CONTAINER_ID, id));
        }
        if let Some(arn) = self.container_arn {
            attributes.push(KeyValue::new(AWS_ECS_CONTAINER_ARN, arn));
        }

        if self.log_driver.as_deref() == Some("awslogs") {
            let options = self.log_options.unwrap_or_default();
            if let Some(group) = options.group {
                attributes.push(string_array(AWS_LOG_GROUP_NAMES, group));
            }
            if let Some(stream) = options.stream {
                attributes.push(string_array(AWS_LOG_STREAM_NAMES, stream));
            }
        }
        attributes
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct TaskMetadata {
    cluster: Option<String>,
    #[serde(rename = "TaskARN")]
    task_arn: Option<String>,
    family: Option<String>,
    revision: Option<String>,
    availability_zone: Option<String>,
    launch_type: Option<String>,
}

impl TaskMetadata {
    fn attributes(self) -> Vec<KeyValue> {
        let mut attributes = Vec::new();

        if let Some(arn) = self.task_arn.as_deref() {
            // arn:aws:ecs:<region>:<account>:task/<cluster>/<id>
            let mut parts = arn.split(':');
            if let (Some(region), Some(account)) = (parts.nth(3), parts.next()) {
                attributes.push(KeyValue::new(CLOUD_REGION, region.to_owned()));
                attributes.push(KeyValue::new(CLOUD_ACCOUNT_ID, account.to_owned()));
            }
        }
        if let Some(cluster) = self.cluster.as_deref() {
            if let Some(arn) = cluster_arn(cluster, self.task_arn.as_deref()) {
                attributes.push(KeyValue::new(AWS_ECS_CLUSTER_ARN, arn));
            }
        }
        if let Some(arn) = self.task_arn {
            attributes.push(KeyValue::new(AWS_ECS_TASK_ARN, arn));
        }
        if let Some(family) = self.family {
            attributes.push(KeyValue::new(AWS_ECS_TASK_FAMILY, family));
        }
        if let Some(revision) = self.revision {
            attributes.push(KeyValue::new(AWS_ECS_TASK_REVISION, revision));
        }
        if let Some(zone) = self.availability_zone {
            attributes.push(KeyValue::new(CLOUD_AVAILABILITY_ZONE, zone));
        }
        if let Some(launch_type) = self.launch_type {
            attributes.push(KeyValue::new(
                AWS_ECS_LAUNCHTYPE,
                launch_type.to_ascii_lowercase(),
            ));
        }
        attributes
    }
}

/// The task metadata reports either a full cluster ARN or a bare cluster
/// name. A bare name is qualified with the task ARN's prefix.
fn cluster_arn(cluster: &str, task_arn: Option<&str>) -> Option<String> {
    if cluster.starts_with("arn:") {
        return Some(cluster.to_owned());
    }
    let (prefix, _) = task_arn?.split_once(":task/")?;
    Some(format!("{prefix}:cluster/{cluster}"))
}

fn string_array(key: &'static str, value: String) -> KeyValue {
    KeyValue::new(key, Value::Array(vec![StringValue::from(value)].into()))
}

/// Fetch container and task metadata.
///
/// The blocking client runs on its own thread so this is safe to call from
/// inside an async runtime.
fn fetch_metadata(base: String) -> Result<(ContainerMetadata, TaskMetadata), BoxError> {
    std::thread::Builder::new()
        .name("obs-ecs-metadata".into())
        .spawn(move || -> Result<(ContainerMetadata, TaskMetadata), BoxError> {
            let client = reqwest::blocking::Client::builder()
                .timeout(METADATA_TIMEOUT)
                .build()?;
            let container = get_json(&client, &base)?;
            let task = get_json(&client, &format!("{}/task", base.trim_end_matches('/')))?;
            Ok((container, task))
        })?
        .join()
        .map_err(|_| "ECS metadata request panicked")?
}

fn get_json<T: DeserializeOwned>(
    client: &reqwest::blocking::Client,
    url: &str,
) -> Result<T, BoxError> {
    let body = client.get(url).send()?.error_for_status()?.text()?;
    Ok(serde_json::from_str(&body)?)
}
