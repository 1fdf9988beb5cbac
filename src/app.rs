use crate::error::ControlError;
use crate::input::Action;
use crate::model::{CREATE_VALIDATION_TEXT, DeploymentRequest, NamespaceCatalog, StatusReport};
use crate::port::{ActionKind, ActionReport, UiPort};
use crate::status::{StatusRegion, StatusTicket, StatusTracker};
use ratatui::text::Line;
use std::collections::VecDeque;
use tracing::info;

const COMMAND_NAMES: [&str; 8] = [
    "create ", "deploy", "destroy", "status", "ns ", "image ", "help", "quit",
];

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum InputMode {
    Normal,
    CreateNamespace,
    Image,
    Command,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppCommand {
    None,
    CreateNamespace { name: String },
    DeployApp(DeploymentRequest),
    DestroyNamespace { namespace: String },
    CheckStatus(StatusTicket),
}

pub struct App {
    running: bool,
    mode: InputMode,
    input: String,
    message: String,
    show_help: bool,
    pending_g: bool,
    completion_index: usize,
    pending_notices: VecDeque<String>,
    server: String,
    catalog: NamespaceCatalog,
    image: String,
    tracker: StatusTracker,
    status_region: StatusRegion,
    status_scroll: u16,
    status_view_width: u16,
    status_view_height: u16,
    in_flight: usize,
}

impl App {
    pub fn new(server: String, namespaces: Vec<String>, image: String) -> Self {
        Self {
            running: true,
            mode: InputMode::Normal,
            input: String::new(),
            message: "Ready".to_string(),
            show_help: false,
            pending_g: false,
            completion_index: 0,
            pending_notices: VecDeque::new(),
            server,
            catalog: NamespaceCatalog::new(namespaces),
            image,
            tracker: StatusTracker::default(),
            status_region: StatusRegion::Idle,
            status_scroll: 0,
            status_view_width: 80,
            status_view_height: 20,
            in_flight: 0,
        }
    }

    pub fn running(&self) -> bool {
        self.running
    }

    pub fn mode(&self) -> InputMode {
        self.mode
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn show_help(&self) -> bool {
        self.show_help
    }

    /// Oldest unacknowledged notice; later ones wait behind it.
    pub fn pending_notice(&self) -> Option<&str> {
        self.pending_notices.front().map(String::as_str)
    }

    pub fn pending_notice_count(&self) -> usize {
        self.pending_notices.len()
    }

    pub fn server(&self) -> &str {
        &self.server
    }

    pub fn namespaces(&self) -> &[String] {
        self.catalog.names()
    }

    pub fn selected_namespace(&self) -> &str {
        self.catalog.selected()
    }

    pub fn selected_namespace_index(&self) -> Option<usize> {
        self.catalog.selected_index()
    }

    pub fn image(&self) -> &str {
        &self.image
    }

    pub fn status_region(&self) -> &StatusRegion {
        &self.status_region
    }

    pub fn status_scroll(&self) -> u16 {
        self.status_scroll
    }

    pub fn busy(&self) -> bool {
        self.in_flight > 0
    }

    pub fn set_message(&mut self, message: impl Into<String>) {
        self.message = message.into();
    }

    pub fn set_status_viewport(&mut self, width: u16, height: u16) {
        self.status_view_width = width.max(1);
        self.status_view_height = height.max(1);
        self.status_scroll = self.status_scroll.min(self.status_max_scroll());
    }

    pub fn has_completion_mode(&self) -> bool {
        self.mode == InputMode::Command
    }

    pub fn completion_candidates(&self) -> Vec<String> {
        match self.mode {
            InputMode::Command => self.command_completions(),
            InputMode::Normal | InputMode::CreateNamespace | InputMode::Image => Vec::new(),
        }
    }

    pub fn completion_index(&self) -> usize {
        self.completion_index
    }

    pub fn apply_action(&mut self, action: Action) -> AppCommand {
        if !self.pending_notices.is_empty() {
            match action {
                Action::Dismiss
                | Action::CheckStatus
                | Action::SubmitInput
                | Action::CancelInput
                | Action::Quit => {
                    self.pending_notices.pop_front();
                }
                _ => {
                    self.message = "Press Enter to acknowledge the notice".to_string();
                }
            }
            return AppCommand::None;
        }

        if !matches!(action, Action::GPrefix) {
            self.pending_g = false;
        }

        if self.show_help && !matches!(action, Action::ToggleHelp) {
            self.show_help = false;
            if matches!(action, Action::Dismiss) {
                return AppCommand::None;
            }
        }

        match action {
            Action::Quit => {
                self.running = false;
                self.message = "Exit requested".to_string();
                AppCommand::None
            }
            Action::Down => {
                self.catalog.move_selection(1);
                AppCommand::None
            }
            Action::Up => {
                self.catalog.move_selection(-1);
                AppCommand::None
            }
            Action::Top => {
                self.catalog.select_first();
                AppCommand::None
            }
            Action::Bottom => {
                self.catalog.select_last();
                AppCommand::None
            }
            Action::GPrefix => {
                if self.pending_g {
                    self.pending_g = false;
                    self.catalog.select_first();
                } else {
                    self.pending_g = true;
                }
                AppCommand::None
            }
            Action::PageDown => {
                self.scroll_status(self.status_page_step() as isize);
                AppCommand::None
            }
            Action::PageUp => {
                self.scroll_status(-(self.status_page_step() as isize));
                AppCommand::None
            }
            Action::ToggleHelp => {
                self.show_help = !self.show_help;
                AppCommand::None
            }
            Action::StartCreate => {
                self.start_input(InputMode::CreateNamespace, String::new());
                self.message = "New namespace name (Enter to create, Esc to cancel)".to_string();
                AppCommand::None
            }
            Action::StartImageEdit => {
                self.start_input(InputMode::Image, self.image.clone());
                self.message = "Image reference (Enter to keep, Esc to cancel)".to_string();
                AppCommand::None
            }
            Action::StartCommand => {
                self.start_input(InputMode::Command, String::new());
                self.message = "Command mode (:help for commands)".to_string();
                AppCommand::None
            }
            Action::Deploy => self.request_deploy(),
            Action::Destroy => self.request_destroy(),
            Action::CheckStatus => self.request_status(),
            Action::Dismiss => AppCommand::None,
            Action::SubmitInput => self.submit_input(),
            Action::CompleteInput => {
                self.apply_completion();
                AppCommand::None
            }
            Action::NextSuggestion => {
                self.bump_completion(1);
                AppCommand::None
            }
            Action::PrevSuggestion => {
                self.bump_completion(-1);
                AppCommand::None
            }
            Action::CancelInput => {
                self.mode = InputMode::Normal;
                self.input.clear();
                self.completion_index = 0;
                self.message = "Input cancelled".to_string();
                AppCommand::None
            }
            Action::Backspace => {
                self.input.pop();
                self.completion_index = 0;
                AppCommand::None
            }
            Action::DeleteWord => {
                while self.input.ends_with(' ') {
                    self.input.pop();
                }
                while !self.input.ends_with(' ') && !self.input.is_empty() {
                    self.input.pop();
                }
                self.completion_index = 0;
                AppCommand::None
            }
            Action::InputChar(c) => {
                self.input.push(c);
                self.completion_index = 0;
                AppCommand::None
            }
        }
    }

    /// Applies the result of a finished create/deploy/destroy request.
    pub fn finish_action(&mut self, report: ActionReport) {
        self.in_flight = self.in_flight.saturating_sub(1);
        if report.kind == ActionKind::CreateNamespace
            && report.outcome.is_ok()
            && self.catalog.insert(&report.namespace)
        {
            info!("namespace '{}' added to the catalog", report.namespace);
            if self.catalog.names().len() == 1 {
                self.catalog.select_first();
            }
        }
        report.deliver(self);
    }

    /// Applies a status reply; replies overtaken by a newer request are dropped.
    pub fn finish_status(
        &mut self,
        ticket: &StatusTicket,
        result: Result<StatusReport, ControlError>,
    ) -> bool {
        self.in_flight = self.in_flight.saturating_sub(1);
        match self.tracker.complete(ticket, result) {
            Some(region) => {
                self.render_status(&region);
                true
            }
            None => false,
        }
    }

    fn request_create(&mut self, name: &str) -> AppCommand {
        if name.trim().is_empty() {
            self.show_message(CREATE_VALIDATION_TEXT);
            return AppCommand::None;
        }

        self.in_flight += 1;
        self.message = format!("Creating namespace '{name}'…");
        AppCommand::CreateNamespace {
            name: name.to_string(),
        }
    }

    fn request_deploy(&mut self) -> AppCommand {
        match DeploymentRequest::new(self.catalog.selected(), &self.image) {
            Ok(request) => {
                self.in_flight += 1;
                self.message = format!(
                    "Deploying {} to '{}'…",
                    request.image(),
                    request.namespace()
                );
                AppCommand::DeployApp(request)
            }
            Err(error) => {
                self.show_blocking_notice(&error.user_text());
                AppCommand::None
            }
        }
    }

    fn request_destroy(&mut self) -> AppCommand {
        let namespace = self.catalog.selected().to_string();
        if namespace.is_empty() {
            self.message = "No namespace selected".to_string();
            return AppCommand::None;
        }

        self.in_flight += 1;
        self.message = format!("Destroying namespace '{namespace}'…");
        AppCommand::DestroyNamespace { namespace }
    }

    fn request_status(&mut self) -> AppCommand {
        let namespace = self.catalog.selected().to_string();
        if namespace.is_empty() {
            self.message = "Select a namespace to check its status".to_string();
            return AppCommand::None;
        }

        let ticket = self.tracker.begin(&namespace);
        self.render_status(&StatusRegion::Requesting {
            namespace: namespace.clone(),
        });
        self.in_flight += 1;
        self.message = format!("Checking status of '{namespace}'…");
        AppCommand::CheckStatus(ticket)
    }

    fn start_input(&mut self, mode: InputMode, initial: String) {
        self.mode = mode;
        self.input = initial;
        self.completion_index = 0;
    }

    fn submit_input(&mut self) -> AppCommand {
        let value = std::mem::take(&mut self.input);
        let mode = self.mode;
        self.mode = InputMode::Normal;
        self.completion_index = 0;

        match mode {
            InputMode::Normal => AppCommand::None,
            InputMode::CreateNamespace => self.request_create(&value),
            InputMode::Image => {
                self.set_image(value);
                AppCommand::None
            }
            InputMode::Command => self.execute_command_line(&value),
        }
    }

    fn set_image(&mut self, image: String) {
        self.image = image;
        self.message = if self.image.is_empty() {
            "Image cleared".to_string()
        } else {
            format!("Image set to {}", self.image)
        };
    }

    fn execute_command_line(&mut self, line: &str) -> AppCommand {
        let normalized = normalize_mode_prefixed_input(line);
        if normalized.is_empty() {
            self.message = "No command entered".to_string();
            return AppCommand::None;
        }

        let (command, rest) = normalized
            .split_once(char::is_whitespace)
            .map(|(command, rest)| (command, rest.trim()))
            .unwrap_or((normalized.as_str(), ""));

        match command.to_ascii_lowercase().as_str() {
            "q" | "quit" | "exit" => {
                self.running = false;
                self.message = "Exit requested".to_string();
                AppCommand::None
            }
            "help" | "h" | "?" => {
                self.show_help = true;
                AppCommand::None
            }
            "create" | "new" | "mk" => self.request_create(rest),
            "deploy" | "dp" => {
                if !rest.is_empty() {
                    self.image = rest.to_string();
                }
                self.request_deploy()
            }
            "destroy" | "delete" | "rm" => {
                if !rest.is_empty() && !self.select_namespace(rest) {
                    return AppCommand::None;
                }
                self.request_destroy()
            }
            "status" | "st" | "check" => {
                if !rest.is_empty() && !self.select_namespace(rest) {
                    return AppCommand::None;
                }
                self.request_status()
            }
            "ns" | "namespace" => {
                if rest.is_empty() {
                    self.message = format!(
                        "Namespaces: {}",
                        format_catalog_preview(self.catalog.names(), 10)
                    );
                } else if self.select_namespace(rest) {
                    self.message = format!("Selected namespace '{rest}'");
                }
                AppCommand::None
            }
            "image" | "img" => {
                self.set_image(rest.to_string());
                AppCommand::None
            }
            other => {
                self.message = format!("Unknown command: {other}");
                AppCommand::None
            }
        }
    }

    fn select_namespace(&mut self, name: &str) -> bool {
        if self.catalog.select(name) {
            return true;
        }
        self.message = format!("Unknown namespace '{name}'");
        false
    }

    fn bump_completion(&mut self, direction: isize) {
        let completion_len = self.completion_candidates().len();
        if completion_len == 0 {
            self.completion_index = 0;
            return;
        }

        self.completion_index = (self.completion_index as isize + direction)
            .rem_euclid(completion_len as isize) as usize;
    }

    fn apply_completion(&mut self) {
        let completions = self.completion_candidates();
        if completions.is_empty() {
            return;
        }

        let index = self
            .completion_index
            .min(completions.len().saturating_sub(1));
        if let Some(choice) = completions.get(index) {
            self.input = choice.clone();
            self.completion_index = 0;
        }
    }

    fn command_completions(&self) -> Vec<String> {
        let query = normalize_mode_prefixed_input(&self.input);
        if let Some((command, _)) = query.split_once(' ')
            && matches!(command, "ns" | "status" | "destroy")
        {
            let candidates = self
                .catalog
                .names()
                .iter()
                .map(|name| format!("{command} {name}"))
                .collect::<Vec<_>>();
            return filter_completions(candidates, &query, 12);
        }

        let candidates = COMMAND_NAMES
            .iter()
            .map(|name| name.to_string())
            .collect::<Vec<_>>();
        filter_completions(candidates, &query, 12)
    }

    fn status_page_step(&self) -> u16 {
        self.status_view_height.saturating_div(2).max(1)
    }

    fn scroll_status(&mut self, delta: isize) {
        let max = self.status_max_scroll() as isize;
        let current = self.status_scroll as isize;
        self.status_scroll = (current + delta).clamp(0, max) as u16;
    }

    fn status_max_scroll(&self) -> u16 {
        let width = self.status_view_width.max(1) as usize;
        let height = self.status_view_height.max(1) as usize;
        let visual_lines = self
            .status_region
            .lines()
            .iter()
            .map(|line| Line::from(line.text.as_str()).width().div_ceil(width).max(1))
            .sum::<usize>();
        visual_lines.saturating_sub(height) as u16
    }
}

impl UiPort for App {
    fn render_status(&mut self, region: &StatusRegion) {
        self.status_region = region.clone();
        self.status_scroll = 0;
        match region {
            StatusRegion::Pods {
                namespace, blocks, ..
            } => {
                self.message = format!("Status of '{namespace}': {} pod(s)", blocks.len());
            }
            StatusRegion::Error { namespace, .. } => {
                self.message = format!("Status check failed for '{namespace}'");
            }
            StatusRegion::Empty { namespace, .. } => {
                self.message = format!("No status data returned for '{namespace}'");
            }
            StatusRegion::Idle | StatusRegion::Requesting { .. } => {}
        }
    }

    fn show_message(&mut self, text: &str) {
        self.set_message(text);
    }

    fn show_blocking_notice(&mut self, text: &str) {
        self.pending_notices.push_back(text.to_string());
    }
}

fn filter_completions(mut candidates: Vec<String>, input: &str, limit: usize) -> Vec<String> {
    candidates.sort();
    candidates.dedup();

    let query = input.to_ascii_lowercase();
    if !query.is_empty() {
        candidates = candidates
            .into_iter()
            .filter(|candidate| completion_matches(candidate, &query))
            .collect::<Vec<_>>();
    }

    candidates.truncate(limit);
    candidates
}

fn normalize_mode_prefixed_input(input: &str) -> String {
    let mut query = input.trim();
    while let Some(stripped) = query.strip_prefix(':') {
        query = stripped.trim_start();
    }
    query.to_string()
}

fn format_catalog_preview(values: &[String], limit: usize) -> String {
    if values.is_empty() {
        return "-".to_string();
    }

    let shown = values
        .iter()
        .take(limit)
        .cloned()
        .collect::<Vec<_>>()
        .join(", ");
    if values.len() > limit {
        format!("{shown}, +{}", values.len().saturating_sub(limit))
    } else {
        shown
    }
}

fn completion_matches(candidate: &str, query: &str) -> bool {
    let lower = candidate.to_ascii_lowercase();
    if lower.starts_with(query) {
        return true;
    }

    let words = lower
        .split(|ch: char| ch.is_ascii_whitespace() || matches!(ch, '/' | ':' | '-' | '.'))
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>();
    query
        .split_whitespace()
        .all(|token| words.iter().any(|word| word.starts_with(token)))
}
