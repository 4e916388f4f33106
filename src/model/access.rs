use crate::{
    model::{
        ModelManager,
        entity::{Course, Purchase},
        error::{DatabaseError, DatabaseResult},
    },
    web::{AuthenticatedUser, UserRole},
};

/// Resources that belong to a user. Course content resolves to the owner of its course.
#[async_trait::async_trait]
pub trait HasOwner {
    type OwnerId: PartialEq + Send + Sync;
    async fn get_owner_id(
        &self,
        mm: &ModelManager,
        ctx: &AuthenticatedUser,
    ) -> DatabaseResult<Self::OwnerId>;
}

pub async fn check_access<T: HasOwner<OwnerId = O> + Sync, O: PartialEq + Send + Sync>(
    mm: &ModelManager,
    ctx: &AuthenticatedUser,
    resource: &T,
    expected: O,
) -> DatabaseResult<()> {
    // admin can get all resources
    if ctx.user_role() == UserRole::Admin {
        return Ok(());
    }

    let actual_owner = resource.get_owner_id(mm, ctx).await?;

    if actual_owner == expected {
        Ok(())
    } else {
        Err(DatabaseError::Forbidden)
    }
}

/// Whether `ctx` may consume paid content of `course`: admins, the owner and buyers.
pub async fn has_course_access(
    mm: &ModelManager,
    ctx: &AuthenticatedUser,
    course: &Course,
) -> DatabaseResult<bool> {
    if ctx.user_role() == UserRole::Admin || course.owner_id() == ctx.user_id() {
        return Ok(true);
    }

    Purchase::exists(mm, ctx.user_id(), course.id()).await
}
