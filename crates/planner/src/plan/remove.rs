use crate::error::{ErrorKind, Permission, Result};
use crate::job::ProgressLevel;
use crate::plan::Planner;
use crate::plan::file::removal_permission;
use exn::ResultExt;
use futures::future::BoxFuture;
use grove_store::{EntityId, Path};

impl Planner<'_> {
    pub(super) async fn delete_item(&mut self, path: &Path) -> Result<()> {
        match path {
            Path { leaf: Some(file), folder } => self.delete_file(file, folder.as_ref()).await,
            Path { folder: Some(folder), leaf: None } => self.delete_folder(folder).await,
            Path { folder: None, leaf: None } => {
                tracing::warn!("Empty source path; skipping");
                Ok(())
            },
        }
    }

    /// Deletes a folder, its subfolders and the files only they list.
    ///
    /// Child failures are recorded and do not stop the walk. A folder that
    /// still has children afterwards is kept.
    fn delete_folder<'b>(&'b mut self, id: &'b EntityId) -> BoxFuture<'b, Result<()>> {
        Box::pin(async move {
            let Some(folder) = self.store.folder(id).await.or_raise(|| ErrorKind::Storage)? else {
                tracing::debug!(id = %id, "Folder no longer exists; skipping");
                return Ok(());
            };
            self.require(Permission::Delete, id).await?;
            let job = self.job;
            let level = ProgressLevel::push(job, folder.child_count() + 1);

            for child in &folder.child_folders {
                let result = self.delete_folder(child).await;
                self.settle(result);
                level.step();
            }
            for child in &folder.child_files {
                let result = self.delete_file(child, Some(id)).await;
                self.settle(result);
                level.step();
            }

            let result = self.remove_if_empty(id).await;
            if matches!(result, Ok(true)) {
                self.report.folders_deleted += 1;
            }
            self.settle(result.map(drop));
            level.step();
            Ok(())
        })
    }

    /// Takes a file out of `parent`, or deletes it outright without one.
    async fn delete_file(&mut self, id: &EntityId, parent: Option<&EntityId>) -> Result<()> {
        let Some(file) = self.store.file(id).await.or_raise(|| ErrorKind::Storage)? else {
            tracing::debug!(id = %id, "File no longer exists; skipping");
            return Ok(());
        };
        let Some(parent) = parent else {
            self.require(Permission::Delete, id).await?;
            self.store.delete(id).await.or_raise(|| ErrorKind::Storage)?;
            self.report.files_deleted += 1;
            return Ok(());
        };
        if !file.parents.contains(parent) {
            tracing::debug!(id = %id, parent = %parent, "File not listed in folder; skipping");
            return Ok(());
        }

        self.require(removal_permission(&file, parent), id).await?;
        if self.detach_or_delete(file, parent).await? {
            self.report.files_deleted += 1;
        } else {
            self.report.files_detached += 1;
        }
        Ok(())
    }
}
