//! Guide Generation Orchestration
//!
//! Top-level state machine for one queued guide request:
//! fetch → guard → lock → summarize → generate sections → done.
//!
//! The only concurrency guard is the externally held `guide_running` flag;
//! the project service's answer to the lock attempt is authoritative. Every
//! abort path before section generation issues exactly one best-effort
//! restore. No explicit unlock exists: the project service clears
//! `guide_running` as a side effect of receiving the `isFinal` report.

use crate::generator::SectionGuideGenerator;
use crate::message::{decode_body, GuideRequest, QueueEvent};
use crate::project::{Project, ProjectService, SectionReport};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Terminal state of one queue-record run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// The record body could not be decoded; nothing was touched
    DecodeFailed,
    /// The project could not be fetched; state restored
    ProjectMissing,
    /// `guide_running` was already set; silently skipped, no restore
    AlreadyRunning,
    /// The lock flag could not be set; state restored
    LockFailed,
    /// A context summary failed; state restored, no sections generated
    ContextFailed,
    /// The section loop ran to the end
    Completed { sections: usize, succeeded: usize },
}

/// Drives guide generation for queued requests
pub struct ProjectOrchestrator {
    projects: Arc<dyn ProjectService>,
    generator: SectionGuideGenerator,
}

impl ProjectOrchestrator {
    pub fn new(projects: Arc<dyn ProjectService>, generator: SectionGuideGenerator) -> Self {
        Self {
            projects,
            generator,
        }
    }

    /// Process a batch of queue records sequentially in receipt order. One
    /// record's failure never prevents processing of the records after it.
    pub async fn process_event(&self, event: &QueueEvent) -> Vec<RunOutcome> {
        let mut outcomes = Vec::with_capacity(event.records.len());

        for record in &event.records {
            let outcome = match decode_body(&record.body) {
                Ok(request) => self.process_request(&request).await,
                Err(err) => {
                    // The project id may be unknown here, so no restore.
                    error!(error = %err, "failed to decode queue record");
                    RunOutcome::DecodeFailed
                }
            };
            outcomes.push(outcome);
        }

        outcomes
    }

    /// Run the full state machine for one decoded request.
    pub async fn process_request(&self, request: &GuideRequest) -> RunOutcome {
        let project = match self
            .projects
            .fetch_project(&request.project_id, &request.token)
            .await
        {
            Ok(project) => project,
            Err(err) => {
                // Guards against orphaned queued messages referencing a
                // deleted or cleaned project.
                warn!(project_id = %request.project_id, error = %err, "project unavailable");
                self.restore(request).await;
                return RunOutcome::ProjectMissing;
            }
        };

        // Concurrency fence. Restoring here would release state owned by the
        // in-flight run, so this path is a silent no-op.
        if project.guide_running {
            info!(project_id = %request.project_id, "guide already running, skipping");
            return RunOutcome::AlreadyRunning;
        }

        if let Err(err) = self
            .projects
            .set_guide_running(&request.project_id, &request.token)
            .await
        {
            warn!(project_id = %request.project_id, error = %err, "failed to set guide_running");
            self.restore(request).await;
            return RunOutcome::LockFailed;
        }

        let language = project.language();

        info!(project_id = %request.project_id, "summarizing project context");
        let general_prompt = match self.build_general_prompt(&project).await {
            Some(prompt) => prompt,
            None => {
                // Partial context is never used; an incomplete general prompt
                // would degrade every downstream section.
                self.restore(request).await;
                return RunOutcome::ContextFailed;
            }
        };

        let total = request.sections.len();
        let mut succeeded = 0;

        for (index, section) in request.sections.iter().enumerate() {
            let is_final = index + 1 == total;

            info!(section = %section.name, is_final, "generating section guide");
            let content = self
                .generator
                .generate(&general_prompt, &section.name, language)
                .await;
            let success = content.is_some();
            if success {
                succeeded += 1;
            }

            let report = SectionReport {
                project_id: request.project_id.clone(),
                asset_parent: request.asset_parent.clone(),
                asset_id: section.asset_id.clone(),
                content,
                success,
                is_final,
            };

            // Reporting is best-effort and never halts the section loop.
            if let Err(err) = self.projects.report_section(&report, &request.token).await {
                warn!(asset_id = %section.asset_id, error = %err, "section report failed");
            }
        }

        info!(
            project_id = %request.project_id,
            sections = total,
            succeeded,
            "guide run finished"
        );
        RunOutcome::Completed {
            sections: total,
            succeeded,
        }
    }

    /// Summarize the four context blocks in order and concatenate them into
    /// the general prompt shared by every section. Aborts on the first
    /// failed summary.
    async fn build_general_prompt(&self, project: &Project) -> Option<String> {
        let language = project.language();
        let blocks = [
            ("information", &project.information),
            ("serializers", &project.serializer_info),
            ("urls", &project.url_info),
            ("views", &project.view_info),
        ];

        let mut summaries = Vec::with_capacity(blocks.len());
        for (block, content) in blocks {
            summaries.push(self.generator.summarize(block, content, language).await?);
        }

        Some(summaries.join(" \n "))
    }

    async fn restore(&self, request: &GuideRequest) {
        if let Err(err) = self
            .projects
            .restore_project(&request.project_id, &request.asset_parent, &request.token)
            .await
        {
            warn!(project_id = %request.project_id, error = %err, "project restore failed");
        }
    }
}
