//! Built-in resource detectors.
//!
//! Each detector describes one facet of the running process. A detector that
//! cannot reach its source at all returns an error; one whose source simply
//! does not apply (no container runtime, for instance) returns no attributes.

use std::fmt;
use std::io;

use opentelemetry::{Array, KeyValue, StringValue, Value};
use opentelemetry_sdk::resource::ResourceDetector;
use opentelemetry_semantic_conventions::resource::{
    CONTAINER_ID, HOST_ARCH, HOST_NAME, OS_TYPE, PROCESS_COMMAND_ARGS, PROCESS_EXECUTABLE_NAME,
    PROCESS_EXECUTABLE_PATH, PROCESS_PID,
};

use crate::error::BoxError;

use super::Detector;

const CGROUP_PATH: &str = "/proc/self/cgroup";
const CONTAINER_ID_LEN: usize = 64;

/// Detects `container.id` from the cgroup membership of the current process.
#[derive(Debug, Default, Clone, Copy)]
pub struct ContainerDetector;

impl Detector for ContainerDetector {
    fn name(&self) -> &str {
        "container"
    }

    fn detect(&self) -> Result<Vec<KeyValue>, BoxError> {
        let content = match std::fs::read_to_string(CGROUP_PATH) {
            Ok(content) => content,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };

        Ok(container_id_from_cgroup(&content)
            .map(|id| vec![KeyValue::new(CONTAINER_ID, id.to_owned())])
            .unwrap_or_default())
    }
}

/// Find a container id in `/proc/self/cgroup` content.
///
/// The id is the last path segment of a line, after any `-` or `:` prefix and
/// before any `.` suffix, e.g. `.../docker-<id>.scope` or `.../docker/<id>`.
fn container_id_from_cgroup(content: &str) -> Option<&str> {
    content.lines().find_map(|line| {
        let (_, segment) = line.trim().rsplit_once('/')?;
        let segment = segment
            .rsplit_once(['-', ':'])
            .map_or(segment, |(_, rest)| rest);
        let candidate = segment.split('.').next()?;
        is_container_id(candidate).then_some(candidate)
    })
}

fn is_container_id(candidate: &str) -> bool {
    candidate.len() == CONTAINER_ID_LEN
        && candidate
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
}

/// Detects the process id, executable, and command line.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessDetector;

impl Detector for ProcessDetector {
    fn name(&self) -> &str {
        "process"
    }

    fn detect(&self) -> Result<Vec<KeyValue>, BoxError> {
        let executable = std::env::current_exe()?;
        let executable_name = executable
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        let args: Vec<StringValue> = std::env::args_os()
            .map(|arg| StringValue::from(arg.to_string_lossy().into_owned()))
            .collect();

        Ok(vec![
            KeyValue::new(PROCESS_PID, i64::from(std::process::id())),
            KeyValue::new(PROCESS_EXECUTABLE_NAME, executable_name),
            KeyValue::new(
                PROCESS_EXECUTABLE_PATH,
                executable.to_string_lossy().into_owned(),
            ),
            KeyValue::new(PROCESS_COMMAND_ARGS, Value::Array(Array::String(args))),
        ])
    }
}

/// Detects the host name, CPU architecture, and operating system.
#[derive(Debug, Default, Clone, Copy)]
pub struct HostDetector;

impl Detector for HostDetector {
    fn name(&self) -> &str {
        "host"
    }

    fn detect(&self) -> Result<Vec<KeyValue>, BoxError> {
        let host_name = sysinfo::System::host_name()
            .filter(|name| !name.is_empty())
            .ok_or("host name is unavailable")?;

        Ok(vec![
            KeyValue::new(HOST_NAME, host_name),
            KeyValue::new(HOST_ARCH, host_arch(std::env::consts::ARCH)),
            KeyValue::new(OS_TYPE, os_type(std::env::consts::OS)),
        ])
    }
}

fn host_arch(arch: &'static str) -> &'static str {
    match arch {
        "x86_64" => "amd64",
        "aarch64" => "arm64",
        "arm" => "arm32",
        "powerpc" => "ppc32",
        "powerpc64" => "ppc64",
        other => other,
    }
}

fn os_type(os: &'static str) -> &'static str {
    match os {
        "macos" => "darwin",
        other => other,
    }
}

/// Adapts an SDK [`ResourceDetector`] to [`Detector`].
///
/// SDK detectors cannot fail, so neither can this.
pub struct SdkDetector<D> {
    name: &'static str,
    inner: D,
}

impl<D> SdkDetector<D> {
    pub fn new(name: &'static str, inner: D) -> Self {
        Self { name, inner }
    }
}

impl<D> fmt::Debug for SdkDetector<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SdkDetector")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl<D> Detector for SdkDetector<D>
where
    D: ResourceDetector + Send + Sync,
{
    fn name(&self) -> &str {
        self.name
    }

    fn detect(&self) -> Result<Vec<KeyValue>, BoxError> {
        Ok(self
            .inner
            .detect()
            .iter()
            .map(|(key, value)| KeyValue::new(key.clone(), value.clone()))
            .collect())
    }
}
