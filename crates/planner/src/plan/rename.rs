use crate::error::{ErrorKind, Permission, Result};
use crate::plan::Planner;
use exn::ResultExt;
use grove_store::{EntityId, Folder};

impl Planner<'_> {
    /// Renames and/or relocates a folder. A missing `target_parent` keeps the
    /// current parent, and an unchanged identifier keeps the display name.
    ///
    /// Unlike a bulk move this never merges: a different folder already
    /// using the requested name in the target is a
    /// [`NameCollision`](ErrorKind::NameCollision).
    pub(super) async fn rename_folder(
        &mut self,
        id: &EntityId,
        target_parent: Option<&EntityId>,
        desired: &EntityId,
    ) -> Result<()> {
        let Some(mut folder) = self.store.folder(id).await.or_raise(|| ErrorKind::Storage)? else {
            tracing::debug!(id = %id, "Folder no longer exists; skipping");
            return Ok(());
        };
        self.require(Permission::Delete, id).await?;

        let new_parent = target_parent.or(folder.parent.as_ref()).cloned();
        let moves = new_parent != folder.parent;
        let renames = desired != id;
        if !moves && !renames {
            return Ok(());
        }
        // The display name only follows the identifier when that changes.
        let name = if renames { desired.name().to_string() } else { folder.name.clone() };

        if let Some(parent_id) = &new_parent {
            let Some(parent) = self.store.folder(parent_id).await.or_raise(|| ErrorKind::Storage)? else {
                exn::bail!(ErrorKind::DestinationMissing(parent_id.clone()));
            };
            if self.is_descendant_or_self(parent_id, id).await? {
                exn::bail!(ErrorKind::Cycle(id.clone()));
            }
            if self.child_folder_named(&parent, &name, Some(id)).await?.is_some() {
                exn::bail!(ErrorKind::NameCollision { name, parent: parent_id.clone() });
            }
        }

        if moves {
            self.require(Permission::Edit, id).await?;
            folder.parent = new_parent;
            self.store.save(folder.clone().into()).await.or_raise(|| ErrorKind::Storage)?;
            self.report.folders_moved += 1;
        }

        if renames {
            let renamed = self.assign_identifier(id, desired).await?;
            self.repoint_children(&folder, &renamed).await?;
            self.set_display_name(&renamed, &name).await?;
            self.report.items_renamed += 1;
        }
        Ok(())
    }

    /// Renames a file and, when `target_folder` differs from a known
    /// `source_folder`, moves it there first.
    ///
    /// The resulting name is checked against every folder the file will be
    /// listed in afterwards before anything is changed.
    pub(super) async fn rename_file(
        &mut self,
        id: &EntityId,
        source_folder: Option<&EntityId>,
        target_folder: Option<&EntityId>,
        desired: &EntityId,
    ) -> Result<()> {
        let Some(mut file) = self.store.file(id).await.or_raise(|| ErrorKind::Storage)? else {
            tracing::debug!(id = %id, "File no longer exists; skipping");
            return Ok(());
        };
        self.require(Permission::Delete, id).await?;

        let renames = desired != id;
        let name = if renames { desired.name().to_string() } else { file.name.clone() };
        // Without a known source folder there is nothing to move the file out of.
        let relocate_to = target_folder.filter(|target| source_folder.is_some_and(|source| source != *target));
        let mut parents = file.parents.clone();
        if let Some(target) = relocate_to {
            if self.store.folder(target).await.or_raise(|| ErrorKind::Storage)?.is_none() {
                exn::bail!(ErrorKind::DestinationMissing(target.clone()));
            }
            self.require(Permission::Edit, id).await?;
            if let Some(source) = source_folder {
                parents.remove(source);
            }
            parents.insert(target.clone());
        }
        if relocate_to.is_none() && !renames {
            return Ok(());
        }
        for parent_id in &parents {
            let Some(parent) = self.store.folder(parent_id).await.or_raise(|| ErrorKind::Storage)? else {
                continue;
            };
            if self.child_file_named(&parent, &name, Some(id)).await?.is_some() {
                exn::bail!(ErrorKind::NameCollision { name, parent: parent_id.clone() });
            }
        }

        if let Some(target) = relocate_to
            && file.reparent(source_folder, target)
        {
            self.store.save(file.into()).await.or_raise(|| ErrorKind::Storage)?;
            self.report.files_moved += 1;
        }

        if renames {
            let renamed = self.assign_identifier(id, desired).await?;
            self.set_display_name(&renamed, &name).await?;
            self.report.items_renamed += 1;
        }
        Ok(())
    }

    /// Moves the entity at `id` to a free identifier derived from `desired`.
    async fn assign_identifier(&self, id: &EntityId, desired: &EntityId) -> Result<EntityId> {
        let renamed =
            self.uniquifier.generate(desired.drive(), desired.name()).await.or_raise(|| ErrorKind::Storage)?;
        self.require(Permission::Edit, &renamed).await?;
        self.store.rename(id, &renamed).await.or_raise(|| ErrorKind::Storage)?;
        tracing::info!(from = %id, to = %renamed, "Identifier changed");
        Ok(renamed)
    }

    /// Points the direct children of a renamed folder at its new identifier.
    async fn repoint_children(&self, old: &Folder, renamed: &EntityId) -> Result<()> {
        for child in &old.child_folders {
            if let Some(mut folder) = self.store.folder(child).await.or_raise(|| ErrorKind::Storage)? {
                folder.parent = Some(renamed.clone());
                self.store.save(folder.into()).await.or_raise(|| ErrorKind::Storage)?;
            }
        }
        for child in &old.child_files {
            if let Some(mut file) = self.store.file(child).await.or_raise(|| ErrorKind::Storage)?
                && file.reparent(Some(&old.id), renamed)
            {
                self.store.save(file.into()).await.or_raise(|| ErrorKind::Storage)?;
            }
        }
        tracing::debug!(
            id = %renamed,
            folders = old.child_folders.len(),
            files = old.child_files.len(),
            "Children re-pointed"
        );
        Ok(())
    }

    async fn set_display_name(&self, id: &EntityId, name: &str) -> Result<()> {
        if let Some(mut folder) = self.store.folder(id).await.or_raise(|| ErrorKind::Storage)? {
            folder.name = name.to_string();
            return self.store.save(folder.into()).await.or_raise(|| ErrorKind::Storage);
        }
        if let Some(mut file) = self.store.file(id).await.or_raise(|| ErrorKind::Storage)? {
            file.name = name.to_string();
            return self.store.save(file.into()).await.or_raise(|| ErrorKind::Storage);
        }
        exn::bail!(ErrorKind::Storage)
    }
}
