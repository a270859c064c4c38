//! Request classification and the per-item walk.

mod file;
mod folder;
mod remove;
mod rename;
mod replicate;

use crate::Context;
use crate::conflict::OverwriteResolver;
use crate::error::{ErrorKind, Permission, Result};
use crate::job::{Job, ProgressLevel};
use crate::report::{Mode, Operation, Report};
use exn::ResultExt;
use grove_store::{EntityId, Path, StoreHandle, UniquifierHandle};
use std::collections::BTreeSet;
use tracing::instrument;

/// A batch of source paths and where they should go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub paths: Vec<Path>,
    /// A folder (bulk) or a (folder, leaf) pair (single). Unused by deletions.
    pub destination: Path,
    /// Ask before overwriting; otherwise colliding files are always kept.
    pub interactive: bool,
}

/// Move or rename the sources of `request`, reporting through `job`.
///
/// Item failures are collected in the returned [`Report`]; the outer error is
/// reserved for the store failing while the destination is classified. A
/// request fitting neither mode is a no-op with [`Mode::Ignored`].
#[instrument(skip_all, fields(store = ctx.store.name(), paths = request.paths.len(), destination = ?request.destination))]
pub async fn plan(ctx: &Context, job: &dyn Job, request: Request) -> Result<Report> {
    let mode = classify(ctx, &request).await?;
    Ok(run(ctx, job, Operation::Move, mode, &request).await)
}

/// Copy the sources of `request`, reporting through `job`.
///
/// A bulk copy duplicates every source into the destination folder, merging
/// into same-named folders and resolving same-named files like a move does.
/// A single copy duplicates one source under the destination's leaf name and
/// never merges or overwrites.
#[instrument(skip_all, fields(store = ctx.store.name(), paths = request.paths.len(), destination = ?request.destination))]
pub async fn copy(ctx: &Context, job: &dyn Job, request: Request) -> Result<Report> {
    let mode = classify(ctx, &request).await?;
    Ok(run(ctx, job, Operation::Copy, mode, &request).await)
}

/// Delete every path in `paths`, reporting through `job`.
///
/// A file path naming a folder only takes the file out of that folder; the
/// file itself is deleted once no other folder lists it. A folder is deleted
/// with everything below it, except what the current actor may not remove.
#[instrument(skip_all, fields(store = ctx.store.name(), paths = paths.len()))]
pub async fn delete(ctx: &Context, job: &dyn Job, paths: Vec<Path>) -> Result<Report> {
    let request = Request { paths, destination: Path::default(), interactive: false };
    Ok(run(ctx, job, Operation::Delete, Mode::Bulk, &request).await)
}

async fn run(ctx: &Context, job: &dyn Job, operation: Operation, mode: Mode, request: &Request) -> Report {
    let mut planner = Planner {
        store: &ctx.store,
        uniquifier: &ctx.uniquifier,
        job,
        resolver: OverwriteResolver::new(request.interactive),
        report: Report::start(operation, mode),
    };

    let level = ProgressLevel::push(job, request.paths.len());
    for path in &request.paths {
        if job.is_cancelled() {
            tracing::info!("Job cancelled; skipping remaining items");
            planner.report.cancelled = true;
            break;
        }
        let result = match (operation, mode, &request.destination) {
            (Operation::Delete, _, _) => planner.delete_item(path).await,
            (Operation::Move, Mode::Bulk, Path { folder: Some(destination), .. }) => {
                planner.move_item(path, destination).await
            },
            (Operation::Move, Mode::Single, destination) => planner.rename_item(path, destination).await,
            (Operation::Copy, Mode::Bulk, Path { folder: Some(destination), .. }) => {
                planner.copy_item(path, destination).await
            },
            (Operation::Copy, Mode::Single, destination) => planner.copy_item_as(path, destination).await,
            _ => Ok(()),
        };
        planner.settle(result);
        level.step();
    }
    drop(level);

    let report = planner.report.finish();
    tracing::info!(
        operation = %report.operation,
        mode = %report.mode,
        failures = report.failures.len(),
        warnings = report.warnings.len(),
        cancelled = report.cancelled,
        "Request finished"
    );
    report
}

async fn classify(ctx: &Context, request: &Request) -> Result<Mode> {
    let mode = match &request.destination {
        Path { folder: Some(folder), leaf: None } => {
            if ctx.store.folder(folder).await.or_raise(|| ErrorKind::Storage)?.is_some() {
                Mode::Bulk
            } else {
                Mode::Ignored
            }
        },
        Path { leaf: Some(_), .. } if request.paths.len() == 1 => Mode::Single,
        _ => Mode::Ignored,
    };
    if mode == Mode::Ignored {
        tracing::warn!("Request fits neither bulk nor single mode; ignoring");
    }
    Ok(mode)
}

/// State for one request.
pub(crate) struct Planner<'a> {
    store: &'a StoreHandle,
    uniquifier: &'a UniquifierHandle,
    job: &'a dyn Job,
    resolver: OverwriteResolver,
    report: Report,
}
impl Planner<'_> {
    async fn move_item(&mut self, path: &Path, destination: &EntityId) -> Result<()> {
        match path {
            Path { leaf: Some(file), folder } => self.move_file(file, folder.as_ref(), destination).await,
            Path { folder: Some(folder), leaf: None } => self.move_folder(folder, destination).await,
            Path { folder: None, leaf: None } => {
                tracing::warn!("Empty source path; skipping");
                Ok(())
            },
        }
    }

    async fn rename_item(&mut self, path: &Path, destination: &Path) -> Result<()> {
        let Some(desired) = &destination.leaf else {
            return Ok(());
        };
        match path {
            Path { leaf: Some(file), folder } => {
                self.rename_file(file, folder.as_ref(), destination.folder.as_ref(), desired).await
            },
            Path { folder: Some(folder), leaf: None } => {
                self.rename_folder(folder, destination.folder.as_ref(), desired).await
            },
            Path { folder: None, leaf: None } => {
                tracing::warn!("Empty source path; skipping");
                Ok(())
            },
        }
    }

    /// Record an item failure and carry on.
    fn settle(&mut self, result: Result<()>) {
        if let Err(err) = result {
            tracing::error!(error = ?err, "Item failed");
            self.report.failures.push(err);
        }
    }

    /// Fail with [`ErrorKind::PermissionDenied`] unless the store allows it.
    async fn require(&self, action: Permission, id: &EntityId) -> Result<()> {
        let allowed = match action {
            Permission::Edit => self.store.can_edit(id).await,
            Permission::Delete => self.store.can_delete(id).await,
        }
        .or_raise(|| ErrorKind::Storage)?;
        if !allowed {
            exn::bail!(ErrorKind::PermissionDenied { action, id: id.clone() });
        }
        Ok(())
    }

    /// `true` if `candidate` is `ancestor` or lies somewhere below it.
    ///
    /// Walks parent pointers up from `candidate`; a dangling parent ends the
    /// walk (not a descendant). Already-corrupt data with a parent loop also
    /// ends the walk instead of spinning forever.
    async fn is_descendant_or_self(&self, candidate: &EntityId, ancestor: &EntityId) -> Result<bool> {
        let mut seen = BTreeSet::new();
        let mut current = candidate.clone();
        loop {
            if &current == ancestor {
                return Ok(true);
            }
            if !seen.insert(current.clone()) {
                tracing::warn!(id = %current, "Parent loop found in folder hierarchy");
                return Ok(false);
            }
            match self.store.folder(&current).await.or_raise(|| ErrorKind::Storage)? {
                Some(folder) => match folder.parent {
                    Some(parent) => current = parent,
                    None => return Ok(false),
                },
                None => return Ok(false),
            }
        }
    }
}
