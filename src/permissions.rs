//! Object-level permission rules.
//!
//! Every authenticated user may read anything. Writes are limited per object:
//! projects and comments by their owner, tasks by their creator, their
//! assignee, or a member of their project's team, user accounts by staff.
//! Staff pass every check.

use actix_web::http::Method;

use crate::auth::AuthenticatedUser;
use crate::error::AppError;
use crate::models::{Comment, Project, Task};

/// `GET`, `HEAD` and `OPTIONS` never modify anything.
pub fn is_safe_method(method: &Method) -> bool {
    matches!(*method, Method::GET | Method::HEAD | Method::OPTIONS)
}

/// A rule deciding whether `user` may perform `method` on `obj`.
pub trait ObjectPermission<T> {
    fn has_object_permission(&self, method: &Method, user: &AuthenticatedUser, obj: &T) -> bool;

    fn denied_message(&self) -> &'static str {
        "You do not have permission to perform this action"
    }
}

/// Objects with a single owning user.
pub trait Owned {
    fn owner_id(&self) -> Option<i32>;
}

impl Owned for Project {
    fn owner_id(&self) -> Option<i32> {
        self.created_by
    }
}

impl Owned for Comment {
    fn owner_id(&self) -> Option<i32> {
        Some(self.author_id)
    }
}

impl Owned for Task {
    fn owner_id(&self) -> Option<i32> {
        self.created_by
    }
}

/// Reads for everyone, writes for the owner.
pub struct IsOwnerOrReadOnly;

impl<T: Owned> ObjectPermission<T> for IsOwnerOrReadOnly {
    fn has_object_permission(&self, method: &Method, user: &AuthenticatedUser, obj: &T) -> bool {
        is_safe_method(method) || user.is_staff || obj.owner_id() == Some(user.id)
    }

    fn denied_message(&self) -> &'static str {
        "Only the owner may modify this object"
    }
}

/// Reads for everyone, writes for the task's creator, its assignee, or a
/// member of the team of the project the task belongs to.
///
/// Membership needs a database lookup, so the caller resolves it first.
pub struct IsAssigneeOrTeamMemberOrOwner {
    pub is_team_member: bool,
}

impl ObjectPermission<Task> for IsAssigneeOrTeamMemberOrOwner {
    fn has_object_permission(&self, method: &Method, user: &AuthenticatedUser, task: &Task) -> bool {
        is_safe_method(method)
            || user.is_staff
            || task.owner_id() == Some(user.id)
            || task.assigned_to == Some(user.id)
            || (task.project_id.is_some() && self.is_team_member)
    }

    fn denied_message(&self) -> &'static str {
        "Only the task's creator, assignee or project team may modify this task"
    }
}

/// Reads for everyone, writes for staff only. Applied to user accounts.
pub struct IsStaffOrReadOnly;

impl<T> ObjectPermission<T> for IsStaffOrReadOnly {
    fn has_object_permission(&self, method: &Method, user: &AuthenticatedUser, _obj: &T) -> bool {
        is_safe_method(method) || user.is_staff
    }

    fn denied_message(&self) -> &'static str {
        "Only staff may modify user accounts"
    }
}

/// Turns a failed check into `AppError::Forbidden`.
pub fn check_object_permission<T, P>(
    permission: &P,
    method: &Method,
    user: &AuthenticatedUser,
    obj: &T,
) -> Result<(), AppError>
where
    P: ObjectPermission<T>,
{
    if permission.has_object_permission(method, user, obj) {
        Ok(())
    } else {
        log::debug!("user {} denied {} on object", user.id, method);
        Err(AppError::Forbidden(permission.denied_message().into()))
    }
}
