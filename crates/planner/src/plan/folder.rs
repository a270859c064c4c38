use crate::error::{ErrorKind, Permission, Result};
use crate::job::ProgressLevel;
use crate::plan::Planner;
use exn::ResultExt;
use futures::future::BoxFuture;
use grove_store::{EntityId, Folder};

impl Planner<'_> {
    /// Moves a folder under `new_parent`, merging it into a same-named folder
    /// already there.
    ///
    /// Boxed because moving and merging recurse into each other.
    pub(super) fn move_folder<'b>(
        &'b mut self,
        id: &'b EntityId,
        new_parent: &'b EntityId,
    ) -> BoxFuture<'b, Result<()>> {
        Box::pin(async move {
            if self.is_descendant_or_self(new_parent, id).await? {
                exn::bail!(ErrorKind::Cycle(id.clone()));
            }
            let Some(mut folder) = self.store.folder(id).await.or_raise(|| ErrorKind::Storage)? else {
                tracing::debug!(id = %id, "Folder no longer exists; skipping");
                return Ok(());
            };
            if folder.parent.as_ref() == Some(new_parent) {
                return Ok(());
            }
            self.require(Permission::Edit, id).await?;
            let Some(destination) = self.store.folder(new_parent).await.or_raise(|| ErrorKind::Storage)? else {
                exn::bail!(ErrorKind::DestinationMissing(new_parent.clone()));
            };

            if let Some(existing) = self.child_folder_named(&destination, &folder.name, Some(id)).await? {
                return self.merge_folders(folder, existing).await;
            }

            folder.parent = Some(new_parent.clone());
            self.store.save(folder.into()).await.or_raise(|| ErrorKind::Storage)?;
            self.report.folders_moved += 1;
            tracing::debug!(id = %id, parent = %new_parent, "Folder moved");
            Ok(())
        })
    }

    /// Moves every child of `source` into `destination`, then deletes
    /// `source` if nothing is left in it.
    ///
    /// Child failures are recorded and do not stop the merge.
    fn merge_folders(&mut self, source: Folder, destination: EntityId) -> BoxFuture<'_, Result<()>> {
        Box::pin(async move {
            tracing::info!(source = %source.id, destination = %destination, "Merging folders");
            self.report.folders_merged += 1;
            let job = self.job;
            let level = ProgressLevel::push(job, source.child_count() + 1);

            for child in &source.child_folders {
                let result = self.move_folder(child, &destination).await;
                self.settle(result);
                level.step();
            }
            for child in &source.child_files {
                let result = self.move_file(child, Some(&source.id), &destination).await;
                self.settle(result);
                level.step();
            }

            let result = self.remove_if_empty(&source.id).await.map(drop);
            self.settle(result);
            level.step();
            Ok(())
        })
    }

    /// Deletes the folder at `id` once nothing is left in it. Returns `true`
    /// if it was deleted.
    pub(super) async fn remove_if_empty(&mut self, id: &EntityId) -> Result<bool> {
        let Some(folder) = self.store.folder(id).await.or_raise(|| ErrorKind::Storage)? else {
            return Ok(false);
        };
        if !folder.is_empty() {
            tracing::debug!(id = %id, remaining = folder.child_count(), "Folder not empty; keeping it");
            return Ok(false);
        }
        self.require(Permission::Delete, id).await?;
        self.store.delete(id).await.or_raise(|| ErrorKind::Storage)?;
        tracing::debug!(id = %id, "Deleted emptied folder");
        Ok(true)
    }

    /// A child folder of `parent`, other than `except`, with display name `name`.
    pub(super) async fn child_folder_named(
        &self,
        parent: &Folder,
        name: &str,
        except: Option<&EntityId>,
    ) -> Result<Option<EntityId>> {
        for child in parent.child_folders.iter().filter(|child| Some(*child) != except) {
            if let Some(sibling) = self.store.folder(child).await.or_raise(|| ErrorKind::Storage)?
                && sibling.name == name
            {
                return Ok(Some(sibling.id));
            }
        }
        Ok(None)
    }
}
