use crate::error::ControlError;
use serde::Deserialize;
use std::fmt::{Display, Formatter};

pub const DEPLOY_VALIDATION_TEXT: &str = "Please select a namespace and enter an image to deploy.";
pub const CREATE_VALIDATION_TEXT: &str = "Please enter a namespace name.";

#[derive(Debug, Clone, Eq, PartialEq, Default, Deserialize)]
#[serde(from = "Option<String>")]
pub enum PodPhase {
    Pending,
    Running,
    Succeeded,
    Failed,
    #[default]
    Unknown,
    Other(String),
}

impl From<Option<String>> for PodPhase {
    fn from(value: Option<String>) -> Self {
        match value.as_deref().map(str::trim) {
            None | Some("") => Self::Unknown,
            Some("Pending") => Self::Pending,
            Some("Running") => Self::Running,
            Some("Succeeded") => Self::Succeeded,
            Some("Failed") => Self::Failed,
            Some("Unknown") => Self::Unknown,
            Some(other) => Self::Other(other.to_string()),
        }
    }
}

impl Display for PodPhase {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "Pending"),
            Self::Running => write!(f, "Running"),
            Self::Succeeded => write!(f, "Succeeded"),
            Self::Failed => write!(f, "Failed"),
            Self::Unknown => write!(f, "Unknown"),
            Self::Other(phase) => write!(f, "{phase}"),
        }
    }
}

#[derive(Debug, Clone, Eq, PartialEq, Default, Deserialize)]
pub struct ContainerStatus {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub state: Option<String>,
}

impl ContainerStatus {
    pub fn state_label(&self) -> &str {
        self.state
            .as_deref()
            .filter(|state| !state.trim().is_empty())
            .unwrap_or("unknown")
    }
}

#[derive(Debug, Clone, Eq, PartialEq, Default, Deserialize)]
pub struct PodStatus {
    #[serde(default)]
    pub pod_name: String,
    #[serde(default)]
    pub phase: PodPhase,
    #[serde(default)]
    pub containers: Vec<ContainerStatus>,
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub enum StatusReport {
    Pods(Vec<PodStatus>),
    Error(String),
    Empty,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct StatusReply {
    #[serde(default)]
    pods: Option<Vec<PodStatus>>,
    #[serde(default)]
    error: Option<String>,
}

impl From<StatusReply> for StatusReport {
    fn from(reply: StatusReply) -> Self {
        match (reply.pods, reply.error) {
            (Some(pods), _) => Self::Pods(pods),
            (None, Some(error)) => Self::Error(error),
            (None, None) => Self::Empty,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ActionReply {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

impl ActionReply {
    pub(crate) fn into_result(self) -> Result<String, ControlError> {
        match (self.message, self.error) {
            (Some(message), _) => Ok(message),
            (None, Some(error)) => Err(ControlError::Application(error)),
            (None, None) => Err(ControlError::transport("server returned no message")),
        }
    }
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct DeploymentRequest {
    namespace: String,
    image: String,
}

impl DeploymentRequest {
    /// Both values are kept exactly as entered; only an empty field is rejected.
    pub fn new(namespace: &str, image: &str) -> Result<Self, ControlError> {
        if namespace.is_empty() || image.is_empty() {
            return Err(ControlError::validation(DEPLOY_VALIDATION_TEXT));
        }

        Ok(Self {
            namespace: namespace.to_string(),
            image: image.to_string(),
        })
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn image(&self) -> &str {
        &self.image
    }
}

/// Known namespace identifiers offered for selection, in insertion order.
#[derive(Debug, Clone, Default)]
pub struct NamespaceCatalog {
    names: Vec<String>,
    selected: usize,
}

impl NamespaceCatalog {
    pub fn new(names: Vec<String>) -> Self {
        let mut catalog = Self::default();
        for name in names {
            catalog.insert(&name);
        }
        catalog
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn selected_index(&self) -> Option<usize> {
        (!self.names.is_empty()).then_some(self.selected)
    }

    /// Selected namespace, or an empty string when nothing is known yet.
    pub fn selected(&self) -> &str {
        self.names
            .get(self.selected)
            .map(String::as_str)
            .unwrap_or("")
    }

    /// Adds a namespace if it is new; returns whether the catalog changed.
    pub fn insert(&mut self, name: &str) -> bool {
        let name = name.trim();
        if name.is_empty() || self.names.iter().any(|known| known == name) {
            return false;
        }
        self.names.push(name.to_string());
        true
    }

    pub fn select(&mut self, name: &str) -> bool {
        match self.names.iter().position(|known| known == name.trim()) {
            Some(index) => {
                self.selected = index;
                true
            }
            None => false,
        }
    }

    pub fn move_selection(&mut self, delta: isize) {
        if self.names.is_empty() {
            self.selected = 0;
            return;
        }
        let max = self.names.len().saturating_sub(1) as isize;
        self.selected = (self.selected as isize + delta).clamp(0, max) as usize;
    }

    pub fn select_first(&mut self) {
        self.selected = 0;
    }

    pub fn select_last(&mut self) {
        self.selected = self.names.len().saturating_sub(1);
    }
}
