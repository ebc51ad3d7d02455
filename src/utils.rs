use k8s_openapi::api::core::v1::Pod;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::Time;

const LOG_SUFFIX: &str = ".log";

/// File name for an instance's log, keeping the name inside the log folder.
pub fn log_file_name(instance_name: &str) -> String {
    let safe: String = instance_name
        .chars()
        .map(|c| if c == '/' || c == '\\' { '_' } else { c })
        .collect();
    format!("{}{}", safe, LOG_SUFFIX)
}

/// A pod is worth streaming once it has left the Pending phase.
pub fn is_scheduled_pod(pod: &Pod) -> bool {
    let phase = pod.status.as_ref().and_then(|s| s.phase.as_deref());
    phase != Some("Pending")
}

/// Container whose log is followed: the explicit one, else the first in the spec.
pub fn log_container(pod: &Pod, explicit: Option<&str>) -> Option<String> {
    if let Some(name) = explicit {
        return Some(name.to_string());
    }
    pod.spec
        .as_ref()
        .and_then(|spec| spec.containers.first())
        .map(|c| c.name.clone())
}

/// Render an API timestamp the way the API server serialises it.
pub fn format_time(time: &Time) -> String {
    match serde_json::to_value(time) {
        Ok(serde_json::Value::String(s)) => s,
        Ok(other) => other.to_string(),
        Err(_) => String::new(),
    }
}
