use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    users::repo_types::{Role, User},
};

/// An administrator whose role was checked against the directory.
///
/// Only [`Admin::from_user`] builds one, so holding an `Admin` is proof the
/// check happened. Ledger transitions take it by reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Admin {
    id: Uuid,
}

impl Admin {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub(crate) fn from_user(user: &User) -> AppResult<Self> {
        if user.role != Role::Admin {
            return Err(AppError::Forbidden(
                "access denied: only admins may perform this operation".into(),
            ));
        }
        Ok(Self { id: user.id })
    }

    #[cfg(test)]
    pub(crate) fn for_tests(id: Uuid) -> Self {
        Self { id }
    }
}
