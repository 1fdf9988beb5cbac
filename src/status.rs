use chrono::{DateTime, Local};
use tracing::debug;

use crate::error::ControlError;
use crate::model::{PodPhase, PodStatus, StatusReport};

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ContainerEntry {
    pub name: String,
    pub image: String,
    pub status: String,
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct PodBlock {
    pub title: String,
    pub phase: PodPhase,
    pub containers: Vec<ContainerEntry>,
}

impl PodBlock {
    fn from_pod(pod: PodStatus) -> Self {
        Self {
            title: format!("Pod: {}", pod.pod_name),
            containers: pod
                .containers
                .into_iter()
                .map(|container| ContainerEntry {
                    status: container.state_label().to_string(),
                    name: container.name,
                    image: container.image,
                })
                .collect(),
            phase: pod.phase,
        }
    }

    pub fn phase_line(&self) -> String {
        format!("Phase: {}", self.phase)
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum LineKind {
    PodTitle,
    Phase,
    Heading,
    Container,
    Error,
    Blank,
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct StatusLine {
    pub kind: LineKind,
    pub text: String,
}

impl StatusLine {
    fn new(kind: LineKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }
}

/// Display region for workload status; every update replaces it entirely.
#[derive(Debug, Clone, Eq, PartialEq, Default)]
pub enum StatusRegion {
    #[default]
    Idle,
    Requesting {
        namespace: String,
    },
    Pods {
        namespace: String,
        blocks: Vec<PodBlock>,
        checked_at: DateTime<Local>,
    },
    Error {
        namespace: String,
        line: String,
        checked_at: DateTime<Local>,
    },
    Empty {
        namespace: String,
        checked_at: DateTime<Local>,
    },
}

impl StatusRegion {
    pub fn project(
        namespace: &str,
        result: Result<StatusReport, ControlError>,
        checked_at: DateTime<Local>,
    ) -> Self {
        let namespace = namespace.to_string();
        match result {
            Ok(StatusReport::Pods(pods)) => Self::Pods {
                namespace,
                blocks: pods.into_iter().map(PodBlock::from_pod).collect(),
                checked_at,
            },
            Ok(StatusReport::Error(error)) => Self::Error {
                namespace,
                line: format!("Error: {error}"),
                checked_at,
            },
            Ok(StatusReport::Empty) => Self::Empty {
                namespace,
                checked_at,
            },
            Err(error) => Self::Error {
                namespace,
                line: format!("Error: {}", error.user_text()),
                checked_at,
            },
        }
    }

    pub fn namespace(&self) -> Option<&str> {
        match self {
            Self::Idle => None,
            Self::Requesting { namespace }
            | Self::Pods { namespace, .. }
            | Self::Error { namespace, .. }
            | Self::Empty { namespace, .. } => Some(namespace),
        }
    }

    pub fn checked_at(&self) -> Option<DateTime<Local>> {
        match self {
            Self::Pods { checked_at, .. }
            | Self::Error { checked_at, .. }
            | Self::Empty { checked_at, .. } => Some(*checked_at),
            Self::Idle | Self::Requesting { .. } => None,
        }
    }

    pub fn is_requesting(&self) -> bool {
        matches!(self, Self::Requesting { .. })
    }

    pub fn pod_blocks(&self) -> &[PodBlock] {
        match self {
            Self::Pods { blocks, .. } => blocks,
            _ => &[],
        }
    }

    pub fn lines(&self) -> Vec<StatusLine> {
        match self {
            Self::Idle | Self::Requesting { .. } | Self::Empty { .. } => Vec::new(),
            Self::Error { line, .. } => vec![StatusLine::new(LineKind::Error, line.clone())],
            Self::Pods { blocks, .. } => {
                let mut lines = Vec::new();
                for (index, block) in blocks.iter().enumerate() {
                    if index > 0 {
                        lines.push(StatusLine::new(LineKind::Blank, ""));
                    }
                    lines.push(StatusLine::new(LineKind::PodTitle, block.title.clone()));
                    lines.push(StatusLine::new(LineKind::Phase, block.phase_line()));
                    lines.push(StatusLine::new(LineKind::Heading, "Containers:"));
                    for container in &block.containers {
                        lines.push(StatusLine::new(
                            LineKind::Container,
                            format!(
                                "  • Name: {}  Image: {}  Status: {}",
                                container.name, container.image, container.status
                            ),
                        ));
                    }
                }
                lines
            }
        }
    }
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct StatusTicket {
    pub generation: u64,
    pub namespace: String,
}

/// Issues status tickets and rejects replies overtaken by a newer request.
#[derive(Debug, Default)]
pub struct StatusTracker {
    latest: u64,
}

impl StatusTracker {
    pub fn begin(&mut self, namespace: &str) -> StatusTicket {
        self.latest = self.latest.wrapping_add(1);
        StatusTicket {
            generation: self.latest,
            namespace: namespace.to_string(),
        }
    }

    pub fn is_current(&self, ticket: &StatusTicket) -> bool {
        ticket.generation == self.latest
    }

    /// Projects the reply into a fresh region, or `None` when the ticket is stale.
    pub fn complete(
        &self,
        ticket: &StatusTicket,
        result: Result<StatusReport, ControlError>,
    ) -> Option<StatusRegion> {
        if !self.is_current(ticket) {
            debug!(
                "discarding stale status reply for '{}' (generation {} < {})",
                ticket.namespace, ticket.generation, self.latest
            );
            return None;
        }

        Some(StatusRegion::project(&ticket.namespace, result, Local::now()))
    }
}

#[cfg(test)]
mod tests {
    use super::{LineKind, StatusRegion, StatusTracker};
    use crate::error::ControlError;
    use crate::model::{ContainerStatus, PodPhase, PodStatus, StatusReport};
    use chrono::Local;

    fn pod(name: &str, containers: usize) -> PodStatus {
        PodStatus {
            pod_name: name.to_string(),
            phase: PodPhase::Running,
            containers: (0..containers)
                .map(|index| ContainerStatus {
                    name: format!("c{index}"),
                    image: format!("img:{index}"),
                    state: Some("Running".to_string()),
                })
                .collect(),
        }
    }

    #[test]
    fn single_pod_example_renders_expected_lines() {
        let report = StatusReport::Pods(vec![PodStatus {
            pod_name: "web-1".to_string(),
            phase: PodPhase::Running,
            containers: vec![ContainerStatus {
                name: "app".to_string(),
                image: "nginx:1.25".to_string(),
                state: Some("running".to_string()),
            }],
        }]);

        let region = StatusRegion::project("team-a", Ok(report), Local::now());
        let texts = region
            .lines()
            .into_iter()
            .map(|line| line.text)
            .collect::<Vec<_>>();
        assert_eq!(
            texts,
            vec![
                "Pod: web-1",
                "Phase: Running",
                "Containers:",
                "  • Name: app  Image: nginx:1.25  Status: running",
            ]
        );
    }

    #[test]
    fn pod_blocks_preserve_order_and_container_counts() {
        let pods = vec![pod("zeta", 2), pod("alpha", 0), pod("mid", 3)];
        let region = StatusRegion::project("ns", Ok(StatusReport::Pods(pods)), Local::now());

        let blocks = region.pod_blocks();
        assert_eq!(
            blocks.iter().map(|b| b.title.as_str()).collect::<Vec<_>>(),
            vec!["Pod: zeta", "Pod: alpha", "Pod: mid"]
        );
        assert_eq!(
            blocks.iter().map(|b| b.containers.len()).collect::<Vec<_>>(),
            vec![2, 0, 3]
        );

        let lines = region.lines();
        let titles = lines
            .iter()
            .filter(|line| line.kind == LineKind::PodTitle)
            .count();
        let containers = lines
            .iter()
            .filter(|line| line.kind == LineKind::Container)
            .count();
        assert_eq!((titles, containers), (3, 5));
    }

    #[test]
    fn zero_pods_render_nothing() {
        let region = StatusRegion::project("ns", Ok(StatusReport::Pods(Vec::new())), Local::now());
        assert!(region.lines().is_empty());
        assert!(region.pod_blocks().is_empty());
    }

    #[test]
    fn error_report_renders_single_error_line() {
        let region = StatusRegion::project(
            "ns",
            Ok(StatusReport::Error("namespace not found".to_string())),
            Local::now(),
        );
        let lines = region.lines();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].kind, LineKind::Error);
        assert_eq!(lines[0].text, "Error: namespace not found");
        assert!(region.pod_blocks().is_empty());
    }

    #[test]
    fn empty_report_leaves_region_empty() {
        let region = StatusRegion::project("ns", Ok(StatusReport::Empty), Local::now());
        assert!(region.lines().is_empty());
        assert_eq!(region.namespace(), Some("ns"));
    }

    #[test]
    fn transport_failure_renders_generic_error_line() {
        let region = StatusRegion::project(
            "ns",
            Err(ControlError::transport("connection refused")),
            Local::now(),
        );
        let lines = region.lines();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].text, "Error: Request failed: connection refused");
    }

    #[test]
    fn tracker_discards_overtaken_replies() {
        let mut tracker = StatusTracker::default();
        let first = tracker.begin("team-a");
        let second = tracker.begin("team-b");

        let latest = tracker
            .complete(&second, Ok(StatusReport::Pods(vec![pod("b-1", 1)])))
            .expect("latest ticket is applied");
        assert!(
            tracker
                .complete(&first, Ok(StatusReport::Pods(vec![pod("a-1", 1)])))
                .is_none()
        );

        assert_eq!(latest.namespace(), Some("team-b"));
        let titles = latest
            .pod_blocks()
            .iter()
            .map(|block| block.title.clone())
            .collect::<Vec<_>>();
        assert_eq!(titles, vec!["Pod: b-1"]);
    }

    #[test]
    fn tracker_accepts_each_ticket_until_superseded() {
        let mut tracker = StatusTracker::default();
        let ticket = tracker.begin("team-a");
        assert!(tracker.is_current(&ticket));

        let region = tracker
            .complete(&ticket, Ok(StatusReport::Error("gone".to_string())))
            .expect("current ticket");
        assert_eq!(region.lines().len(), 1);
        assert!(region.pod_blocks().is_empty());

        let newer = tracker.begin("team-a");
        assert!(!tracker.is_current(&ticket));
        assert!(tracker.is_current(&newer));
    }
}
