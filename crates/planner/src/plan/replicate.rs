use crate::error::{ErrorKind, Permission, Result};
use crate::job::ProgressLevel;
use crate::plan::Planner;
use exn::ResultExt;
use futures::future::BoxFuture;
use grove_store::{EntityId, File, Folder, Path};

impl Planner<'_> {
    pub(super) async fn copy_item(&mut self, path: &Path, destination: &EntityId) -> Result<()> {
        match path {
            Path { leaf: Some(file), .. } => self.copy_file(file, destination).await,
            Path { folder: Some(folder), leaf: None } => self.copy_folder(folder, destination).await,
            Path { folder: None, leaf: None } => {
                tracing::warn!("Empty source path; skipping");
                Ok(())
            },
        }
    }

    pub(super) async fn copy_item_as(&mut self, path: &Path, destination: &Path) -> Result<()> {
        let Some(desired) = &destination.leaf else {
            return Ok(());
        };
        match path {
            Path { leaf: Some(file), folder } => {
                self.copy_file_as(file, folder.as_ref(), destination.folder.as_ref(), desired).await
            },
            Path { folder: Some(folder), leaf: None } => {
                self.copy_folder_as(folder, destination.folder.as_ref(), desired).await
            },
            Path { folder: None, leaf: None } => {
                tracing::warn!("Empty source path; skipping");
                Ok(())
            },
        }
    }

    /// Copies a folder and everything below it into `parent`, merging into a
    /// same-named folder already there.
    fn copy_folder<'b>(&'b mut self, id: &'b EntityId, parent: &'b EntityId) -> BoxFuture<'b, Result<()>> {
        Box::pin(async move {
            if self.is_descendant_or_self(parent, id).await? {
                exn::bail!(ErrorKind::Cycle(id.clone()));
            }
            let Some(folder) = self.store.folder(id).await.or_raise(|| ErrorKind::Storage)? else {
                tracing::debug!(id = %id, "Folder no longer exists; skipping");
                return Ok(());
            };
            if folder.parent.as_ref() == Some(parent) {
                tracing::debug!(id = %id, parent = %parent, "Folder already in destination; skipping");
                return Ok(());
            }
            let Some(destination) = self.store.folder(parent).await.or_raise(|| ErrorKind::Storage)? else {
                exn::bail!(ErrorKind::DestinationMissing(parent.clone()));
            };

            let target = match self.child_folder_named(&destination, &folder.name, None).await? {
                Some(existing) => {
                    tracing::info!(source = %id, destination = %existing, "Copying into existing folder");
                    self.report.folders_merged += 1;
                    existing
                },
                None => self.create_folder(parent.drive(), id.name(), &folder.name, Some(parent)).await?,
            };
            self.copy_children(&folder, &target).await
        })
    }

    /// Copies a folder under a new identifier. The parent stays the same
    /// unless `target_parent` names another one.
    async fn copy_folder_as(
        &mut self,
        id: &EntityId,
        target_parent: Option<&EntityId>,
        desired: &EntityId,
    ) -> Result<()> {
        let Some(folder) = self.store.folder(id).await.or_raise(|| ErrorKind::Storage)? else {
            tracing::debug!(id = %id, "Folder no longer exists; skipping");
            return Ok(());
        };
        let parent = target_parent.or(folder.parent.as_ref());
        if let Some(parent_id) = parent {
            let Some(destination) = self.store.folder(parent_id).await.or_raise(|| ErrorKind::Storage)? else {
                exn::bail!(ErrorKind::DestinationMissing(parent_id.clone()));
            };
            if self.is_descendant_or_self(parent_id, id).await? {
                exn::bail!(ErrorKind::Cycle(id.clone()));
            }
            if self.child_folder_named(&destination, desired.name(), None).await?.is_some() {
                exn::bail!(ErrorKind::NameCollision { name: desired.name().to_string(), parent: parent_id.clone() });
            }
        }

        let target = self.create_folder(desired.drive(), desired.name(), desired.name(), parent).await?;
        self.copy_children(&folder, &target).await
    }

    async fn copy_children(&mut self, source: &Folder, target: &EntityId) -> Result<()> {
        let job = self.job;
        let level = ProgressLevel::push(job, source.child_count());
        for child in &source.child_folders {
            let result = self.copy_folder(child, target).await;
            self.settle(result);
            level.step();
        }
        for child in &source.child_files {
            let result = self.copy_file(child, target).await;
            self.settle(result);
            level.step();
        }
        Ok(())
    }

    async fn create_folder(
        &mut self,
        drive: &str,
        desired: &str,
        name: &str,
        parent: Option<&EntityId>,
    ) -> Result<EntityId> {
        let id = self.uniquifier.generate(drive, desired).await.or_raise(|| ErrorKind::Storage)?;
        self.require(Permission::Edit, &id).await?;
        let folder = Folder::new(id.clone(), name, parent.cloned());
        self.store.save(folder.into()).await.or_raise(|| ErrorKind::Storage)?;
        self.report.folders_copied += 1;
        tracing::debug!(id = %id, "Folder created");
        Ok(id)
    }

    /// Copies a file into `parent`, resolving a collision with a same-named
    /// file there the way a move does.
    async fn copy_file(&mut self, id: &EntityId, parent: &EntityId) -> Result<()> {
        let Some(file) = self.store.file(id).await.or_raise(|| ErrorKind::Storage)? else {
            tracing::debug!(id = %id, "File no longer exists; skipping");
            return Ok(());
        };
        if file.parents.contains(parent) {
            tracing::debug!(id = %id, parent = %parent, "File already listed in destination; skipping");
            return Ok(());
        }
        let Some(destination) = self.store.folder(parent).await.or_raise(|| ErrorKind::Storage)? else {
            exn::bail!(ErrorKind::DestinationMissing(parent.clone()));
        };

        if let Some(existing) = self.child_file_named(&destination, &file.name, None).await?
            && !self.overwrite(&file, existing, parent).await?
        {
            tracing::debug!(id = %id, parent = %parent, "Keeping existing file; copy abandoned");
            return Ok(());
        }
        self.create_file(&file, parent.drive(), id.name(), &file.name, Some(parent)).await
    }

    /// Copies a file under a new identifier into `target_folder`, or next to
    /// the source when no target is given.
    async fn copy_file_as(
        &mut self,
        id: &EntityId,
        source_folder: Option<&EntityId>,
        target_folder: Option<&EntityId>,
        desired: &EntityId,
    ) -> Result<()> {
        let Some(file) = self.store.file(id).await.or_raise(|| ErrorKind::Storage)? else {
            tracing::debug!(id = %id, "File no longer exists; skipping");
            return Ok(());
        };
        let parent = target_folder.or(source_folder);
        if let Some(parent_id) = parent {
            let Some(destination) = self.store.folder(parent_id).await.or_raise(|| ErrorKind::Storage)? else {
                exn::bail!(ErrorKind::DestinationMissing(parent_id.clone()));
            };
            if self.child_file_named(&destination, desired.name(), None).await?.is_some() {
                exn::bail!(ErrorKind::NameCollision { name: desired.name().to_string(), parent: parent_id.clone() });
            }
        }
        self.create_file(&file, desired.drive(), desired.name(), desired.name(), parent).await
    }

    async fn create_file(
        &mut self,
        source: &File,
        drive: &str,
        desired: &str,
        name: &str,
        parent: Option<&EntityId>,
    ) -> Result<()> {
        let id = self.uniquifier.generate(drive, desired).await.or_raise(|| ErrorKind::Storage)?;
        self.require(Permission::Edit, &id).await?;
        let mut copy = File::new(id.clone(), name, source.content.clone());
        copy.parents.extend(parent.cloned());
        self.store.save(copy.into()).await.or_raise(|| ErrorKind::Storage)?;
        self.report.files_copied += 1;
        tracing::debug!(source = %source.id, id = %id, "File copied");
        Ok(())
    }
}
