//! Setup and update tasks.
//!
//! Both tasks are explicit state machines. Everything that can be checked
//! without touching the keyspace (configuration, schema parsing, path
//! resolution) happens before the first statement is executed. Statements
//! run strictly in order and the first failure halts the task; nothing is
//! retried or rolled back. During an update the recorded version advances
//! after each step, so an interrupted run resumes at the failed step.

use crate::error::{MigrateError, MigrateResult, Phase};
use crate::fs::SchemaFs;
use crate::resolver::{self, VersionStep};
use crate::store::VersionStore;
use ksm_core::{
    cql_utils, CreateKeyspaceConfig, KeyspaceName, SchemaManifest, SetupConfig, SetupTask,
    UpdateConfig, UpdateTask, Version, Versioning,
};
use ksm_db::SchemaClient;
use std::path::Path;

/// Update log description of the entry written by setup.
pub const INITIAL_VERSION_DESCRIPTION: &str = "initial version";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SetupState {
    Start,
    DropExisting,
    EnsureVersionTables,
    ApplyFullManifest,
    RecordInitialVersion,
    Done,
}

#[derive(Debug)]
enum UpdateState {
    Start,
    ReadCurrentVersion,
    ResolvePath(Version),
    ApplyEachStep(Version, Vec<VersionStep>),
    Done(UpdateReport),
}

impl UpdateState {
    fn name(&self) -> &'static str {
        match self {
            UpdateState::Start => "Start",
            UpdateState::ReadCurrentVersion => "ReadCurrentVersion",
            UpdateState::ResolvePath(_) => "ResolvePath",
            UpdateState::ApplyEachStep(..) => "ApplyEachStep",
            UpdateState::Done(_) => "Done",
        }
    }
}

/// Outcome of a successful setup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetupReport {
    pub keyspace: KeyspaceName,
    /// Tables and types removed by `overwrite`
    pub dropped: Vec<String>,
    pub statements_applied: usize,
    /// Recorded initial version; `None` with versioning disabled
    pub version: Option<Version>,
}

/// One step of an update, applied or (in a dry run) only listed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepSummary {
    pub from: Version,
    pub to: Version,
    pub statements: usize,
}

/// Outcome of a successful update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateReport {
    pub keyspace: KeyspaceName,
    pub from: Version,
    /// Version reached, or that would be reached in a dry run
    pub to: Version,
    pub steps: Vec<StepSummary>,
    pub dry_run: bool,
}

impl UpdateReport {
    /// Whether the keyspace was already at the target.
    pub fn is_noop(&self) -> bool {
        self.steps.is_empty()
    }
}

/// Runs setup and update tasks against one keyspace.
pub struct Migrator<'a> {
    client: &'a dyn SchemaClient,
    fs: &'a dyn SchemaFs,
}

impl<'a> Migrator<'a> {
    pub fn new(client: &'a dyn SchemaClient, fs: &'a dyn SchemaFs) -> Self {
        Self { client, fs }
    }

    /// Version store of the client's keyspace.
    pub fn store(&self) -> VersionStore<'a> {
        VersionStore::new(self.client)
    }

    fn check_keyspace(&self, keyspace: &KeyspaceName) -> MigrateResult<()> {
        if keyspace != self.client.keyspace() {
            return Err(MigrateError::Configuration(format!(
                "task targets keyspace '{}' but the client is bound to '{}'",
                keyspace,
                self.client.keyspace()
            )));
        }
        Ok(())
    }

    /// Read and parse a schema file through the filesystem collaborator.
    fn load_manifest(&self, path: &Path) -> MigrateResult<SchemaManifest> {
        let raw = self
            .fs
            .read_to_string(path)
            .map_err(|e| MigrateError::PathError {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;
        SchemaManifest::parse(&raw).map_err(|e| MigrateError::Parse {
            path: path.display().to_string(),
            source: e,
        })
    }

    /// Execute every statement of `manifest` in order.
    ///
    /// Returns the number of statements applied. The first failure stops the
    /// run with `PartialApplication`.
    async fn apply(&self, phase: &Phase, manifest: &SchemaManifest) -> MigrateResult<usize> {
        for (idx, statement) in manifest.iter().enumerate() {
            log::info!("{}", statement);
            if let Err(e) = self.client.exec(statement.as_str()).await {
                log::error!("Statement {} of {} failed: {}", idx + 1, phase, e);
                return Err(MigrateError::PartialApplication {
                    phase: phase.clone(),
                    last_succeeded: idx.checked_sub(1),
                    statement: statement.to_string(),
                    source: e,
                });
            }
        }
        Ok(manifest.len())
    }

    /// Validate and run a setup task.
    pub async fn setup(&self, config: &SetupConfig) -> MigrateResult<SetupReport> {
        let task = config.validate().map_err(MigrateError::from_config)?;
        self.run_setup(task).await
    }

    async fn run_setup(&self, task: SetupTask) -> MigrateResult<SetupReport> {
        self.check_keyspace(&task.keyspace)?;
        let manifest = match &task.schema_file {
            Some(path) => Some(self.load_manifest(path)?),
            None => None,
        };
        let versioned = matches!(task.versioning, Versioning::Enabled(_));
        let store = self.store();

        let mut report = SetupReport {
            keyspace: task.keyspace.clone(),
            dropped: Vec::new(),
            statements_applied: 0,
            version: None,
        };

        let after_drop = if versioned {
            SetupState::EnsureVersionTables
        } else {
            SetupState::ApplyFullManifest
        };

        let mut state = SetupState::Start;
        loop {
            log::debug!("setup {}: {:?}", task.keyspace, state);
            state = match state {
                SetupState::Start if task.overwrite => SetupState::DropExisting,
                SetupState::Start => after_drop,
                SetupState::DropExisting => {
                    report.dropped = store.drop_all().await?;
                    log::info!(
                        "Dropped {} object(s) from keyspace '{}'",
                        report.dropped.len(),
                        task.keyspace
                    );
                    after_drop
                }
                SetupState::EnsureVersionTables => {
                    store.initialize().await?;
                    match store.current_version().await {
                        Ok(existing) => {
                            return Err(MigrateError::Configuration(format!(
                                "keyspace '{}' is already set up at version {}; use overwrite to start over",
                                task.keyspace, existing
                            )));
                        }
                        Err(MigrateError::NotInitialized) => {}
                        Err(e) => return Err(e),
                    }
                    SetupState::ApplyFullManifest
                }
                SetupState::ApplyFullManifest => {
                    if let Some(manifest) = &manifest {
                        report.statements_applied = self.apply(&Phase::Setup, manifest).await?;
                    }
                    if versioned {
                        SetupState::RecordInitialVersion
                    } else {
                        SetupState::Done
                    }
                }
                SetupState::RecordInitialVersion => {
                    if let Versioning::Enabled(version) = &task.versioning {
                        let manifest_ref = manifest
                            .as_ref()
                            .map(|m| m.checksum().to_string())
                            .unwrap_or_default();
                        store
                            .record_version(
                                version,
                                version,
                                &manifest_ref,
                                INITIAL_VERSION_DESCRIPTION,
                            )
                            .await
                            .map_err(|e| MigrateError::VersionRecordFailed {
                                phase: Phase::Setup,
                                source: Box::new(e),
                            })?;
                        report.version = Some(version.clone());
                    }
                    SetupState::Done
                }
                SetupState::Done => break,
            };
        }

        log::info!(
            "Setup of keyspace '{}' complete: {} statement(s) applied{}",
            report.keyspace,
            report.statements_applied,
            report
                .version
                .as_ref()
                .map(|v| format!(", version {}", v))
                .unwrap_or_default()
        );
        Ok(report)
    }

    /// Validate and run an update task.
    pub async fn update(&self, config: &UpdateConfig) -> MigrateResult<UpdateReport> {
        let task = config.validate().map_err(MigrateError::from_config)?;
        self.run_update(task).await
    }

    /// Pick the target: the requested one, else the highest discovered
    /// version, falling back to `current` when there is nothing newer.
    fn resolve_path(&self, task: &UpdateTask, current: &Version) -> MigrateResult<Vec<VersionStep>> {
        let discovered = resolver::discover_steps(self.fs, &task.schema_dir)?;
        let target = match &task.target_version {
            Some(target) => target.clone(),
            None => match resolver::latest_version(&discovered) {
                Some(latest) if latest > current => latest.clone(),
                _ => {
                    log::info!("No version newer than {} in {}", current, task.schema_dir.display());
                    current.clone()
                }
            },
        };
        let plan = resolver::plan_path(&discovered, current, &target)?;
        resolver::load_steps(self.fs, plan)
    }

    async fn run_update(&self, task: UpdateTask) -> MigrateResult<UpdateReport> {
        self.check_keyspace(&task.keyspace)?;
        let store = self.store();

        let mut state = UpdateState::Start;
        loop {
            log::debug!("update {}: {}", task.keyspace, state.name());
            state = match state {
                UpdateState::Start => UpdateState::ReadCurrentVersion,
                UpdateState::ReadCurrentVersion => match store.current_version().await {
                    Ok(current) => UpdateState::ResolvePath(current),
                    Err(MigrateError::NotInitialized) => {
                        return Err(MigrateError::NotSetUp {
                            keyspace: task.keyspace.to_string(),
                        });
                    }
                    Err(e) => return Err(e),
                },
                UpdateState::ResolvePath(current) => {
                    let steps = self.resolve_path(&task, &current)?;
                    log::info!(
                        "Keyspace '{}' is at {}; {} step(s) to apply",
                        task.keyspace,
                        current,
                        steps.len()
                    );
                    UpdateState::ApplyEachStep(current, steps)
                }
                UpdateState::ApplyEachStep(current, steps) => {
                    let mut summaries = Vec::with_capacity(steps.len());
                    let mut reached = current.clone();
                    for step in &steps {
                        if task.dry_run {
                            self.preview_step(step);
                        } else {
                            self.apply_step(&store, step).await?;
                        }
                        summaries.push(StepSummary {
                            from: step.from.clone(),
                            to: step.to.clone(),
                            statements: step.manifest.len(),
                        });
                        reached = step.to.clone();
                    }
                    UpdateState::Done(UpdateReport {
                        keyspace: task.keyspace.clone(),
                        from: current,
                        to: reached,
                        steps: summaries,
                        dry_run: task.dry_run,
                    })
                }
                UpdateState::Done(report) => return Ok(report),
            };
        }
    }

    fn preview_step(&self, step: &VersionStep) {
        log::info!("[dry-run] step {} -> {} ({})", step.from, step.to, step.source.display());
        for statement in &step.manifest {
            log::info!("[dry-run] {}", statement);
        }
    }

    async fn apply_step(&self, store: &VersionStore<'_>, step: &VersionStep) -> MigrateResult<()> {
        let phase = Phase::Step {
            from: step.from.clone(),
            to: step.to.clone(),
        };
        log::info!("Applying {} from {}", phase, step.source.display());
        self.apply(&phase, &step.manifest).await?;
        store
            .record_version(
                &step.from,
                &step.to,
                step.manifest.checksum(),
                &step.description,
            )
            .await
            .map_err(|e| MigrateError::VersionRecordFailed {
                phase,
                source: Box::new(e),
            })?;
        log::info!("Keyspace '{}' now at {}", self.client.keyspace(), step.to);
        Ok(())
    }
}

/// Create a keyspace with `SimpleStrategy` replication if it does not exist.
///
/// `client` should be bound to a keyspace that already exists, such as
/// `system`.
pub async fn create_keyspace(
    client: &dyn SchemaClient,
    config: &CreateKeyspaceConfig,
) -> MigrateResult<KeyspaceName> {
    let (keyspace, replication_factor) = config.validate().map_err(MigrateError::from_config)?;
    let cql = cql_utils::create_keyspace(&keyspace, replication_factor);
    log::info!("{}", cql);
    client.exec(&cql).await.map_err(MigrateError::from_store)?;
    Ok(keyspace)
}

#[cfg(test)]
#[path = "orchestrator_test.rs"]
mod tests;
