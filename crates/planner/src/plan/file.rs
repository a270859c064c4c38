use crate::conflict::Decision;
use crate::error::{ErrorKind, Permission, Result};
use crate::plan::Planner;
use exn::ResultExt;
use grove_store::{EntityId, File, Folder};

impl Planner<'_> {
    /// Swaps `old_parent` for `new_parent` in a file's parent set, resolving a
    /// collision with a same-named file in `new_parent` first.
    pub(super) async fn move_file(
        &mut self,
        id: &EntityId,
        old_parent: Option<&EntityId>,
        new_parent: &EntityId,
    ) -> Result<()> {
        let Some(mut file) = self.store.file(id).await.or_raise(|| ErrorKind::Storage)? else {
            tracing::debug!(id = %id, "File no longer exists; skipping");
            return Ok(());
        };
        if old_parent == Some(new_parent) {
            return Ok(());
        }
        self.require(Permission::Edit, id).await?;
        let Some(destination) = self.store.folder(new_parent).await.or_raise(|| ErrorKind::Storage)? else {
            exn::bail!(ErrorKind::DestinationMissing(new_parent.clone()));
        };

        if let Some(existing) = self.child_file_named(&destination, &file.name, Some(id)).await?
            && !self.overwrite(&file, existing, new_parent).await?
        {
            tracing::debug!(id = %id, parent = %new_parent, "Keeping existing file; move abandoned");
            return Ok(());
        }

        if file.reparent(old_parent, new_parent) {
            self.store.save(file.into()).await.or_raise(|| ErrorKind::Storage)?;
            self.report.files_moved += 1;
            tracing::debug!(id = %id, parent = %new_parent, "File moved");
        }
        Ok(())
    }

    /// Settles a collision between `file` and `existing` inside `parent`.
    /// Returns `true` once `existing` is out of the way.
    ///
    /// Only arbitrable if the current actor may edit `existing` (it lives
    /// elsewhere too and just loses this parent) or delete it (this was its
    /// only parent).
    pub(super) async fn overwrite(&mut self, file: &File, existing: File, parent: &EntityId) -> Result<bool> {
        self.require(removal_permission(&existing, parent), &existing.id).await?;

        match self.resolver.decide(self.job, &file.id, &existing.id).await {
            Decision::Overwrite => {},
            Decision::Keep => return Ok(false),
            Decision::NoAnswer => {
                tracing::warn!(id = %file.id, existing = %existing.id, "No overwrite answer; keeping existing file");
                self.report.warnings.push(exn::Exn::from(ErrorKind::Interrupted(file.id.clone())));
                return Ok(false);
            },
        }

        self.detach_or_delete(existing, parent).await?;
        self.report.files_overwritten += 1;
        Ok(true)
    }

    /// Takes `file` out of `parent`. A file still listed elsewhere only loses
    /// that parent; otherwise it is deleted. Returns `true` if it was deleted.
    ///
    /// Permissions are the caller's business, see [`removal_permission`].
    pub(super) async fn detach_or_delete(&self, mut file: File, parent: &EntityId) -> Result<bool> {
        if file.parents.iter().any(|other| other != parent) {
            file.parents.remove(parent);
            tracing::debug!(id = %file.id, parent = %parent, "Detaching file");
            self.store.save(file.into()).await.or_raise(|| ErrorKind::Storage)?;
            Ok(false)
        } else {
            tracing::debug!(id = %file.id, "Deleting file");
            self.store.delete(&file.id).await.or_raise(|| ErrorKind::Storage)?;
            Ok(true)
        }
    }

    /// A child file of `parent`, other than `except`, with display name `name`.
    pub(super) async fn child_file_named(
        &self,
        parent: &Folder,
        name: &str,
        except: Option<&EntityId>,
    ) -> Result<Option<File>> {
        for child in parent.child_files.iter().filter(|child| Some(*child) != except) {
            if let Some(sibling) = self.store.file(child).await.or_raise(|| ErrorKind::Storage)?
                && sibling.name == name
            {
                return Ok(Some(sibling));
            }
        }
        Ok(None)
    }
}

/// What taking `file` out of `parent` needs: edit if it stays listed
/// elsewhere, delete if `parent` is all it has.
pub(super) fn removal_permission(file: &File, parent: &EntityId) -> Permission {
    if file.parents.iter().any(|other| other != parent) { Permission::Edit } else { Permission::Delete }
}
