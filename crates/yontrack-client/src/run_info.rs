use serde::Serialize;

/// Where and how a build or validation run was produced.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_uri: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trigger_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trigger_data: Option<String>,
    /// Duration in seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run_time: Option<u64>,
}

impl RunInfo {
    pub fn is_empty(&self) -> bool {
        *self == RunInfo::default()
    }

    /// `None` when no field is set, so that no run info is sent at all.
    pub fn into_option(self) -> Option<RunInfo> {
        if self.is_empty() { None } else { Some(self) }
    }
}
