//! Shared mocks for orchestrator integration tests

use async_trait::async_trait;
use guia::completion::{GenerativeBackend, RetryingCompletionClient};
use guia::config::{CompletionConfig, PromptConfig};
use guia::error::{CompletionError, ProjectApiError};
use guia::generator::SectionGuideGenerator;
use guia::orchestrator::ProjectOrchestrator;
use guia::project::{Project, ProjectService, SectionReport};
use std::sync::{Arc, Mutex};

/// Scripted completion backend: pops pre-seeded results in order and records
/// every prompt it sees.
pub struct ScriptedBackend {
    results: Mutex<Vec<Result<String, CompletionError>>>,
    pub prompts: Mutex<Vec<String>>,
}

impl ScriptedBackend {
    pub fn new(results: Vec<Result<String, CompletionError>>) -> Self {
        Self {
            results: Mutex::new(results),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Backend that answers every request with a canned success.
    pub fn always_ok() -> Self {
        Self::new(Vec::new())
    }

    pub fn call_count(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

#[async_trait]
impl GenerativeBackend for ScriptedBackend {
    async fn request(
        &self,
        _system_prompt: &str,
        user_prompt: &str,
    ) -> Result<String, CompletionError> {
        self.prompts.lock().unwrap().push(user_prompt.to_string());
        let mut results = self.results.lock().unwrap();
        if results.is_empty() {
            Ok("generated text".to_string())
        } else {
            results.remove(0)
        }
    }
}

/// Recording project service with configurable failure points
pub struct RecordingProjectService {
    pub project: Option<Project>,
    pub lock_ok: bool,
    /// Asset ids whose completion report fails
    pub failing_reports: Vec<String>,
    pub calls: Mutex<Vec<String>>,
    pub reports: Mutex<Vec<SectionReport>>,
}

impl RecordingProjectService {
    pub fn with_project(project: Project) -> Self {
        Self {
            project: Some(project),
            lock_ok: true,
            failing_reports: Vec::new(),
            calls: Mutex::new(Vec::new()),
            reports: Mutex::new(Vec::new()),
        }
    }

    pub fn missing() -> Self {
        Self {
            project: None,
            lock_ok: true,
            failing_reports: Vec::new(),
            calls: Mutex::new(Vec::new()),
            reports: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, operation: &str) -> usize {
        self.calls().iter().filter(|c| *c == operation).count()
    }

    pub fn reports(&self) -> Vec<SectionReport> {
        self.reports.lock().unwrap().clone()
    }
}

#[async_trait]
impl ProjectService for RecordingProjectService {
    async fn fetch_project(
        &self,
        project_id: &str,
        _token: &str,
    ) -> Result<Project, ProjectApiError> {
        self.calls.lock().unwrap().push("fetch".to_string());
        self.project
            .clone()
            .ok_or_else(|| ProjectApiError::NotFound(project_id.to_string()))
    }

    async fn set_guide_running(
        &self,
        _project_id: &str,
        _token: &str,
    ) -> Result<(), ProjectApiError> {
        self.calls.lock().unwrap().push("running-guide".to_string());
        if self.lock_ok {
            Ok(())
        } else {
            Err(ProjectApiError::RequestFailed {
                status: 500,
                body: "lock failed".to_string(),
            })
        }
    }

    async fn report_section(
        &self,
        report: &SectionReport,
        _token: &str,
    ) -> Result<(), ProjectApiError> {
        self.calls
            .lock()
            .unwrap()
            .push("guide-reference-completion".to_string());
        self.reports.lock().unwrap().push(report.clone());
        if self.failing_reports.contains(&report.asset_id) {
            Err(ProjectApiError::RequestFailed {
                status: 502,
                body: "report failed".to_string(),
            })
        } else {
            Ok(())
        }
    }

    async fn restore_project(
        &self,
        _project_id: &str,
        _asset_parent: &str,
        _token: &str,
    ) -> Result<(), ProjectApiError> {
        self.calls.lock().unwrap().push("restore".to_string());
        Ok(())
    }
}

/// Project record with all four context blocks populated
pub fn english_project() -> Project {
    Project {
        information: "info".to_string(),
        serializer_info: "serializers".to_string(),
        url_info: "urls".to_string(),
        view_info: "views".to_string(),
        lang: "English".to_string(),
        guide_running: false,
    }
}

/// Build an orchestrator over the given mocks, with retries collapsed to a
/// single attempt and a zero delay.
pub fn build_orchestrator(
    service: Arc<RecordingProjectService>,
    backend: Arc<ScriptedBackend>,
) -> ProjectOrchestrator {
    let completion = CompletionConfig {
        max_retries: 1,
        retry_delay_secs: 0,
        ..CompletionConfig::default()
    };
    let prompts = PromptConfig {
        resume_english: "Summarize:".to_string(),
        resume_spanish: "Resume:".to_string(),
        system_english: "You are a guide writer.".to_string(),
        system_spanish: "Eres un redactor de guias.".to_string(),
    };
    let client = RetryingCompletionClient::new(backend, &completion, &prompts);
    let generator = SectionGuideGenerator::new(client, &prompts);
    ProjectOrchestrator::new(service, generator)
}
