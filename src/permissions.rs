use crate::error::{ErrorKind, WorkflowError};

bitflags! {
    /// Permissions allow for a fine-grained control over what actions a given
    /// user can take.
    ///
    /// The bits are assigned by the host application's identity provider; the
    /// workflow only checks them, it never grants or revokes them.
    pub struct PermissionBits: i32 {
        /// Permission holder can approve and reject content submitted for
        /// moderation.
        const MODERATE_CONTENT = 0x00000001;
        /// Permission holder can delete content, including administrative
        /// cleanup of stale drafts.
        const DELETE_CONTENT = 0x00000002;
    }
}

impl PermissionBits {
    /// Get set of all elevated permissions.
    #[inline]
    pub fn elevated() -> PermissionBits {
        PermissionBits::all()
    }

    /// Get set of all (non-elevated) permissions.
    #[inline]
    pub fn normal() -> PermissionBits {
        PermissionBits::empty()
    }

    /// Verify that all required permissions are present.
    ///
    /// This is the same check as `self.contains(permissions)`, but returns
    /// a typed error.
    pub fn require(&self, permissions: PermissionBits)
    -> Result<(), RequirePermissionsError> {
        if self.contains(permissions) {
            Ok(())
        } else {
            Err(RequirePermissionsError(permissions - *self))
        }
    }
}

/// An authenticated user, as vouched for by the host application's identity
/// provider.
///
/// The workflow trusts the permission bits carried here the same way it
/// trusts the ID: authentication and role management are the host's problem.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Actor {
    pub id: i32,
    pub permissions: PermissionBits,
}

impl Actor {
    pub fn new(id: i32, permissions: PermissionBits) -> Actor {
        Actor { id, permissions }
    }

    /// Can this actor approve and reject submitted content?
    pub fn is_moderator(&self) -> bool {
        self.permissions.contains(PermissionBits::MODERATE_CONTENT)
    }
}

#[derive(Debug, Fail)]
#[fail(display = "Missing required permissions: {:?}", _0)]
pub struct RequirePermissionsError(PermissionBits);

impl WorkflowError for RequirePermissionsError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Forbidden
    }

    fn code(&self) -> Option<&str> {
        Some("user:insufficient-permissions")
    }
}

#[cfg(test)]
mod tests {
    use super::{Actor, PermissionBits};

    #[test]
    fn require_passes_when_bits_present() {
        PermissionBits::elevated()
            .require(PermissionBits::MODERATE_CONTENT)
            .unwrap();
    }

    #[test]
    fn require_fails_when_bits_missing() {
        assert!(PermissionBits::normal()
            .require(PermissionBits::MODERATE_CONTENT)
            .is_err());
        assert!(PermissionBits::MODERATE_CONTENT
            .require(PermissionBits::MODERATE_CONTENT | PermissionBits::DELETE_CONTENT)
            .is_err());
    }

    #[test]
    fn moderator_check_follows_bits() {
        assert!(Actor::new(1, PermissionBits::MODERATE_CONTENT).is_moderator());
        assert!(!Actor::new(1, PermissionBits::normal()).is_moderator());
    }
}
