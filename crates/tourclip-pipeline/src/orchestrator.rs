//! Pipeline orchestrator.
//!
//! Drives one run through the linear stage chain
//! `validated -> metadata_fetched -> images_selected -> prompts_generated ->
//! script_generated -> clips_generated -> audio_generated -> reported`.
//! The run record is checkpointed after every stage, so a run started with
//! an existing run ID continues after its last completed stage.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use tracing::{info, warn, Instrument};

use tourclip_media::{AssemblyPlan, FfmpegRunner};
use tourclip_models::{
    ClipArtifact, NarrationScript, RunId, RunRecord, RunStage, SelectedImageSet, TourId,
    VideoPlan,
};
use tourclip_storage::ArtifactStore;

use crate::clips::ClipGenerator;
use crate::config::{PipelineConfig, SkipStages};
use crate::error::{PipelineError, PipelineResult};
use crate::logging::RunLogger;
use crate::metrics;
use crate::narration::NarrationComposer;
use crate::prompts::PromptGenerator;
use crate::selector::ImageSelector;
use crate::services::{LanguageModel, SpeechSynthesizer, TourCatalog, VideoSynthesizer};
use crate::voice::NarrationSynthesizer;

/// External collaborators, built once at startup.
#[derive(Clone)]
pub struct Services {
    pub catalog: Arc<dyn TourCatalog>,
    pub model: Arc<dyn LanguageModel>,
    pub video: Arc<dyn VideoSynthesizer>,
    pub speech: Arc<dyn SpeechSynthesizer>,
    pub store: Arc<dyn ArtifactStore>,
}

/// One request to produce a video.
#[derive(Debug, Clone)]
pub struct RunRequest {
    pub tour_id: TourId,
    /// Resume this run instead of starting a new one
    pub run_id: Option<RunId>,
    /// Overrides the configured skip set
    pub skip: Option<SkipStages>,
    /// Narration language; the speech client default when `None`
    pub language: Option<String>,
}

impl RunRequest {
    pub fn new(tour_id: TourId) -> Self {
        Self {
            tour_id,
            run_id: None,
            skip: None,
            language: None,
        }
    }

    pub fn with_run_id(mut self, run_id: RunId) -> Self {
        self.run_id = Some(run_id);
        self
    }

    pub fn with_skip(mut self, skip: SkipStages) -> Self {
        self.skip = Some(skip);
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }
}

/// Summary of a finished run.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub run_id: RunId,
    pub tour_id: TourId,
    pub stage: RunStage,
    pub scenes: usize,
    pub script: Option<NarrationScript>,
    pub clip_paths: Vec<PathBuf>,
    pub failed_clip_indices: Vec<usize>,
    pub audio_path: Option<PathBuf>,
    pub plan_path: Option<PathBuf>,
    /// Shell lines that assemble the final video
    pub assembly_commands: Vec<String>,
    /// Assembled video, when assembly ran and succeeded
    pub final_video: Option<PathBuf>,
}

fn require<T>(value: &Option<T>, stage: RunStage) -> PipelineResult<&T> {
    value.as_ref().ok_or(PipelineError::MissingOutput(stage))
}

fn path_string(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// Holds a run ID for the lifetime of one `run` call.
struct RunClaim<'a> {
    active: &'a Mutex<HashSet<RunId>>,
    run_id: RunId,
}

impl Drop for RunClaim<'_> {
    fn drop(&mut self) {
        self.active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.run_id);
    }
}

/// Runs the pipeline against injected services.
pub struct Orchestrator {
    services: Services,
    config: PipelineConfig,
    selector: ImageSelector,
    prompts: PromptGenerator,
    narration: NarrationComposer,
    clips: ClipGenerator,
    voice: NarrationSynthesizer,
    ffmpeg: FfmpegRunner,
    /// Run IDs currently being driven by this orchestrator
    active_runs: Mutex<HashSet<RunId>>,
}

impl Orchestrator {
    pub fn new(services: Services, config: PipelineConfig) -> Self {
        Self {
            selector: ImageSelector::new(services.model.clone(), config.max_images),
            prompts: PromptGenerator::new(services.model.clone()),
            narration: NarrationComposer::new(services.model.clone()),
            clips: ClipGenerator::new(services.video.clone(), config.clip_timeout),
            voice: NarrationSynthesizer::new(services.speech.clone()),
            ffmpeg: FfmpegRunner::new(),
            active_runs: Mutex::new(HashSet::new()),
            services,
            config,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run (or resume) the pipeline for `request`.
    ///
    /// A request naming a run that is still in progress is rejected, so two
    /// callers never write into the same run directory.
    pub async fn run(&self, request: RunRequest) -> PipelineResult<RunReport> {
        let _claim = match &request.run_id {
            Some(run_id) => Some(self.claim(run_id)?),
            None => None,
        };

        let mut record = self.open_record(&request).await?;
        let logger = RunLogger::new(&record.run_id, &record.tour_id);
        let span = logger.create_span();

        self.drive(&mut record, &request, &logger)
            .instrument(span)
            .await
    }

    fn claim(&self, run_id: &RunId) -> PipelineResult<RunClaim<'_>> {
        let mut active = self
            .active_runs
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if !active.insert(run_id.clone()) {
            return Err(PipelineError::RunInProgress(run_id.clone()));
        }
        Ok(RunClaim {
            active: &self.active_runs,
            run_id: run_id.clone(),
        })
    }

    async fn open_record(&self, request: &RunRequest) -> PipelineResult<RunRecord> {
        let store = &self.services.store;

        let run_id = match &request.run_id {
            Some(run_id) => {
                store
                    .run_dir(run_id)
                    .map_err(|e| PipelineError::validation(e.to_string()))?;

                if let Some(record) = store.load_record(run_id).await? {
                    if record.tour_id != request.tour_id {
                        return Err(PipelineError::validation(format!(
                            "run {} belongs to tgid {}",
                            run_id, record.tour_id
                        )));
                    }
                    return Ok(record);
                }
                run_id.clone()
            }
            None => RunId::new(),
        };

        let record = RunRecord::new(run_id, request.tour_id.clone());
        store.save_record(&record).await?;
        Ok(record)
    }

    async fn drive(
        &self,
        record: &mut RunRecord,
        request: &RunRequest,
        logger: &RunLogger,
    ) -> PipelineResult<RunReport> {
        let skip = request.skip.unwrap_or(self.config.skip);
        let language = request.language.as_deref();

        if record.stage == RunStage::Validated {
            logger.log_start("pipeline");
        } else {
            logger.log_progress(&format!("resuming after {}", record.stage));
        }
        if !skip.is_empty() {
            logger.log_progress(&format!("skipping {:?}", skip));
        }

        let mut ran_any = false;
        while let Some(stage) = record.stage.next() {
            let started = Instant::now();
            ran_any = true;

            if let Err(e) = self.execute(stage, record, &skip, language, logger).await {
                logger.log_error(&format!("{} failed: {}", stage, e));
                record.fail(stage, e.to_string());
                if let Err(save_err) = self.services.store.save_record(record).await {
                    logger.log_warning(&format!("could not checkpoint failure: {}", save_err));
                }
                metrics::record_run_failed(stage.as_str());
                return Err(PipelineError::stage_failed(stage, e));
            }

            record.advance(stage);
            self.services.store.save_record(record).await?;
            metrics::record_stage_duration(stage.as_str(), started.elapsed().as_secs_f64());
        }

        if ran_any {
            metrics::record_run_completed();
        }
        let report = self.report(record);
        logger.log_completion(&format!(
            "{} scenes, {} clips, audio {}",
            report.scenes,
            report.clip_paths.len(),
            if report.audio_path.is_some() { "written" } else { "missing" }
        ));
        Ok(report)
    }

    async fn execute(
        &self,
        stage: RunStage,
        record: &mut RunRecord,
        skip: &SkipStages,
        language: Option<&str>,
        logger: &RunLogger,
    ) -> PipelineResult<()> {
        let store = &self.services.store;

        match stage {
            RunStage::Validated => {}

            RunStage::MetadataFetched => {
                let tour = self.services.catalog.fetch_tour(&record.tour_id).await?;
                logger.log_progress(&format!(
                    "fetched '{}' with {} images and {} reviewer images",
                    tour.name,
                    tour.images.len(),
                    tour.review_images.len()
                ));
                record.outputs.tour = Some(tour);
            }

            RunStage::ImagesSelected => {
                let tour = require(&record.outputs.tour, RunStage::MetadataFetched)?;
                let selected = if skip.selection {
                    SelectedImageSet::new(tour.images.iter().cloned(), self.config.max_images)
                } else {
                    self.selector.select(&tour.images, &tour.name).await
                };
                if selected.is_empty() && !skip.clips {
                    return Err(PipelineError::NoImages(record.tour_id.clone()));
                }
                logger.log_progress(&format!("selected {} images", selected.len()));
                record.outputs.selected = Some(selected);
            }

            RunStage::PromptsGenerated => {
                let tour = require(&record.outputs.tour, RunStage::MetadataFetched)?;
                let selected = require(&record.outputs.selected, RunStage::ImagesSelected)?;
                let prompts = if skip.prompts {
                    PromptGenerator::fallback_all(selected)
                } else {
                    self.prompts.generate(selected, &tour.name).await
                };
                let fallbacks = prompts.iter().filter(|p| p.is_fallback).count();
                logger.log_progress(&format!(
                    "{} scene prompts ({} fallback)",
                    prompts.len(),
                    fallbacks
                ));
                record.outputs.prompts = Some(prompts);
            }

            RunStage::ScriptGenerated => {
                let tour = require(&record.outputs.tour, RunStage::MetadataFetched)?;
                let prompts = require(&record.outputs.prompts, RunStage::PromptsGenerated)?;
                let script = match &self.config.script_override {
                    Some(text) => NarrationScript::new(text.trim()),
                    None => self.narration.compose(prompts).await,
                };

                let plan = VideoPlan::build(&tour.name, prompts, &script, self.services.video.model());
                let plan_path = store.write_plan(&record.run_id, &plan).await?;
                logger.log_progress(&format!(
                    "narration has {} words, plan at {}",
                    script.word_count(),
                    plan_path.display()
                ));
                record.outputs.plan_path = Some(path_string(&plan_path));
                record.outputs.script = Some(script);
            }

            RunStage::ClipsGenerated => {
                if skip.clips {
                    logger.log_progress("clip generation skipped");
                    return Ok(());
                }
                let prompts = require(&record.outputs.prompts, RunStage::PromptsGenerated)?;
                let batch = self
                    .clips
                    .generate(prompts, self.config.clip_failure_policy)
                    .await?;

                let mut artifacts = Vec::with_capacity(batch.clips.len());
                for clip in &batch.clips {
                    let path = store.write_clip(&record.run_id, clip).await?;
                    artifacts.push(ClipArtifact {
                        index: clip.index,
                        path: path_string(&path),
                    });
                }
                if !batch.failed.is_empty() {
                    logger.log_warning(&format!("clips failed at indices {:?}", batch.failed));
                }
                logger.log_progress(&format!("persisted {} clips", artifacts.len()));
                record.outputs.clips = artifacts;
                record.outputs.failed_clip_indices = batch.failed;
            }

            RunStage::AudioGenerated => {
                let script = require(&record.outputs.script, RunStage::ScriptGenerated)?;
                let audio = self.voice.synthesize(script, language).await?;
                let path = store.write_audio(&record.run_id, &audio).await?;
                logger.log_progress(&format!("audio written to {}", path.display()));
                record.outputs.audio_path = Some(path_string(&path));
            }

            RunStage::Reported => {
                record.outputs.final_video = self
                    .assemble(record, logger)
                    .await
                    .map(|path| path_string(&path));
            }
        }

        Ok(())
    }

    fn assembly_plan(&self, record: &RunRecord) -> Option<AssemblyPlan> {
        let audio = record.outputs.audio_path.as_ref()?;
        if record.outputs.clips.is_empty() {
            return None;
        }
        let dir = self.services.store.run_dir(&record.run_id).ok()?;

        let mut clips = record.outputs.clips.clone();
        clips.sort_by_key(|c| c.index);
        let clips = clips.into_iter().map(|c| PathBuf::from(c.path)).collect();

        Some(AssemblyPlan::new(dir, clips, audio))
    }

    /// Log the assembly commands and run them when enabled. Never fails the run.
    ///
    /// Returns the final video path when assembly ran and succeeded.
    async fn assemble(&self, record: &RunRecord, logger: &RunLogger) -> Option<PathBuf> {
        let Some(plan) = self.assembly_plan(record) else {
            logger.log_progress("nothing to assemble");
            return None;
        };

        for line in plan.shell_commands() {
            info!(run_id = %record.run_id, "Assembly command: {}", line);
        }

        if !self.config.assemble {
            return None;
        }

        match plan.execute(&self.ffmpeg).await {
            Ok(path) => {
                logger.log_progress(&format!("final video at {}", path.display()));
                Some(path)
            }
            Err(e) => {
                warn!(run_id = %record.run_id, "Assembly failed: {}", e);
                metrics::record_assembly_failure();
                None
            }
        }
    }

    fn report(&self, record: &RunRecord) -> RunReport {
        let plan = self.assembly_plan(record);
        let outputs = &record.outputs;

        RunReport {
            run_id: record.run_id.clone(),
            tour_id: record.tour_id.clone(),
            stage: record.stage,
            scenes: outputs.prompts.as_ref().map(Vec::len).unwrap_or(0),
            script: outputs.script.clone(),
            clip_paths: outputs.clips.iter().map(|c| PathBuf::from(&c.path)).collect(),
            failed_clip_indices: outputs.failed_clip_indices.clone(),
            audio_path: outputs.audio_path.as_ref().map(PathBuf::from),
            plan_path: outputs.plan_path.as_ref().map(PathBuf::from),
            assembly_commands: plan.as_ref().map(|p| p.shell_commands()).unwrap_or_default(),
            final_video: outputs.final_video.as_ref().map(PathBuf::from),
        }
    }
}
