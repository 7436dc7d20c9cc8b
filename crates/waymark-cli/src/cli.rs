//! Command handlers.
//!
//! Each command resumes (or starts) a `WizardSession` over the SQLite
//! gateway, runs one session action and renders the result.

use std::sync::Arc;

use anyhow::{Context, Result};
use log::debug;
use waymark_core::{
    session::PublishOutcome, HydrationLoader, MarkdownRenderer, OperationStatus, PlanGateway,
    PlanId, PlanOverview, Progress, SqliteGateway, StepId, WizardSession, WizardSessionBuilder,
};

use crate::{
    args::{CreatePlanArgs, PausePlanArgs, PlanCommands, SetStepArgs, StepArgs, StepCommands},
    renderer::TerminalRenderer,
};

pub struct Cli {
    gateway: SqliteGateway,
    renderer: TerminalRenderer,
}

impl Cli {
    pub fn new(gateway: SqliteGateway, renderer: TerminalRenderer) -> Self {
        Self { gateway, renderer }
    }

    pub async fn handle_plan_command(&self, command: PlanCommands) -> Result<()> {
        match command {
            PlanCommands::Create(args) => self.create_plan(args).await,
            PlanCommands::Show(args) => self.show_plan(args.into()).await,
            PlanCommands::Publish(args) => self.publish_plan(args.into()).await,
            PlanCommands::Pause(args) => self.pause_plan(args).await,
            PlanCommands::Archive(args) => {
                let id: PlanId = args.into();
                let session = self.resume(id).await?;
                session
                    .archive()
                    .await
                    .with_context(|| format!("Failed to archive plan {id}"))?;
                self.renderer.render(
                    &OperationStatus::success(format!(
                        "Archived plan {id}. Use 'plan unarchive {id}' to edit it again."
                    ))
                    .to_string(),
                )
            }
            PlanCommands::Unarchive(args) => {
                let id: PlanId = args.into();
                let session = self.resume(id).await?;
                let status = session
                    .unarchive()
                    .await
                    .with_context(|| format!("Failed to unarchive plan {id}"))?;
                self.renderer.render(
                    &OperationStatus::success(format!("Plan {id} is back in {status}.")).to_string(),
                )
            }
        }
    }

    pub async fn handle_step_command(&self, command: StepCommands) -> Result<()> {
        match command {
            StepCommands::Show(args) => self.show_step(args).await,
            StepCommands::Set(args) => self.set_step(args).await,
        }
    }

    fn builder(&self) -> WizardSessionBuilder {
        WizardSessionBuilder::new(Arc::new(self.gateway.clone())).with_owner(self.gateway.owner())
    }

    async fn resume(&self, id: PlanId) -> Result<WizardSession> {
        self.builder()
            .resume(id)
            .await
            .with_context(|| format!("Failed to open plan {id}"))
    }

    async fn create_plan(&self, args: CreatePlanArgs) -> Result<()> {
        debug!("create_plan: {}", args.title);

        let session = self.builder().start();
        session.on_change(args.into())?;
        session.next().await.context("Failed to create plan")?;
        let id = session
            .identity()
            .context("Plan was not assigned an ID")?;

        let remote = self.gateway.fetch(id).await?;
        self.renderer.render_all([
            OperationStatus::success(format!("Created plan {id}.")).to_string(),
            PlanOverview::new(&remote, &session.progress()).to_string(),
        ])
    }

    async fn show_plan(&self, id: PlanId) -> Result<()> {
        debug!("show_plan: {id}");

        let remote = self
            .gateway
            .fetch(id)
            .await
            .with_context(|| format!("Failed to get plan {id}"))?;
        let state = HydrationLoader::seed(&remote)?;
        let progress = Progress::from_state(&state, StepId::FIRST);
        self.renderer
            .render(&PlanOverview::new(&remote, &progress).to_string())
    }

    async fn publish_plan(&self, id: PlanId) -> Result<()> {
        debug!("publish_plan: {id}");

        let session = self.resume(id).await?;
        let status = match session
            .publish()
            .await
            .with_context(|| format!("Failed to publish plan {id}"))?
        {
            PublishOutcome::Published(_) => OperationStatus::success(format!("Published plan {id}.")),
            PublishOutcome::AlreadyPublished => {
                OperationStatus::success(format!("Plan {id} is already published."))
            }
        };
        self.renderer.render(&status.to_string())
    }

    async fn pause_plan(&self, args: PausePlanArgs) -> Result<()> {
        let id = PlanId(args.id);
        debug!("pause_plan: {id} until {}", args.until);

        let session = self.resume(id).await?;
        session
            .pause(args.until)
            .await
            .with_context(|| format!("Failed to pause plan {id}"))?;
        self.renderer.render(
            &OperationStatus::success(format!("Paused plan {id} until {}.", args.until)).to_string(),
        )
    }

    async fn show_step(&self, args: StepArgs) -> Result<()> {
        debug!("show_step: {} {}", args.id, args.step.as_str());

        let session = self.resume(PlanId(args.id)).await?;
        self.renderer
            .render(&session.render(&MarkdownRenderer, args.step))
    }

    async fn set_step(&self, args: SetStepArgs) -> Result<()> {
        let id = PlanId(args.id);
        let step = args.step;
        debug!("set_step: {id} {}", step.as_str());

        let session = self.resume(id).await?;
        session.on_change(args.change())?;
        let outcome = session
            .save_step(step)
            .await
            .with_context(|| format!("Failed to save step {step} of plan {id}"))?;

        let message = if outcome.sync.was_sent() {
            format!("Saved step {step} of plan {id}.")
        } else {
            format!("Step {step} of plan {id} has no changes to save.")
        };
        self.renderer.render_all([
            OperationStatus::success(message).to_string(),
            session.render(&MarkdownRenderer, step),
        ])
    }
}
