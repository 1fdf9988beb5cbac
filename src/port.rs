use crate::error::ControlError;
use crate::status::StatusRegion;

/// Rendering surface the control logic talks to.
pub trait UiPort {
    fn render_status(&mut self, region: &StatusRegion);
    fn show_message(&mut self, text: &str);
    fn show_blocking_notice(&mut self, text: &str);
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum ActionKind {
    CreateNamespace,
    DeployApp,
    DestroyNamespace,
}

impl ActionKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::CreateNamespace => "create namespace",
            Self::DeployApp => "deploy app",
            Self::DestroyNamespace => "destroy namespace",
        }
    }
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ActionReport {
    pub kind: ActionKind,
    /// Namespace the action targeted.
    pub namespace: String,
    pub outcome: Result<String, ControlError>,
}

impl ActionReport {
    pub fn text(&self) -> String {
        match &self.outcome {
            Ok(message) => message.clone(),
            Err(error) => error.user_text(),
        }
    }

    pub fn deliver(&self, ui: &mut impl UiPort) {
        let text = self.text();
        match self.kind {
            ActionKind::CreateNamespace => ui.show_message(&text),
            ActionKind::DeployApp | ActionKind::DestroyNamespace => {
                ui.show_blocking_notice(&text)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ActionKind, ActionReport, UiPort};
    use crate::error::ControlError;
    use crate::status::StatusRegion;

    #[derive(Default)]
    struct RecordingUi {
        messages: Vec<String>,
        notices: Vec<String>,
    }

    impl UiPort for RecordingUi {
        fn render_status(&mut self, _region: &StatusRegion) {}

        fn show_message(&mut self, text: &str) {
            self.messages.push(text.to_string());
        }

        fn show_blocking_notice(&mut self, text: &str) {
            self.notices.push(text.to_string());
        }
    }

    #[test]
    fn create_results_go_to_message_area() {
        let mut ui = RecordingUi::default();
        ActionReport {
            kind: ActionKind::CreateNamespace,
            namespace: "team-a".to_string(),
            outcome: Err(ControlError::Application("already exists".to_string())),
        }
        .deliver(&mut ui);

        assert_eq!(ui.messages, vec!["already exists"]);
        assert!(ui.notices.is_empty());
    }

    #[test]
    fn deploy_and_destroy_results_are_blocking_notices() {
        let mut ui = RecordingUi::default();
        for kind in [ActionKind::DeployApp, ActionKind::DestroyNamespace] {
            ActionReport {
                kind,
                namespace: "team-a".to_string(),
                outcome: Ok(format!("{} done", kind.label())),
            }
            .deliver(&mut ui);
        }

        assert!(ui.messages.is_empty());
        assert_eq!(
            ui.notices,
            vec!["deploy app done", "destroy namespace done"]
        );
    }
}
