//! Shared security primitives
//!
//! The reentrancy guard lives inside the vault. Access control does not:
//! the calling environment owns an [`AccessControl`] table and mints
//! [`Capability`] values that the vault's configuration entry points demand.

use bank_types::ids::HolderId;
use serde::{Deserialize, Serialize};
use std::cell::Cell;
use std::collections::HashMap;

/// Reentrancy guard preventing nested calls into protected functions.
///
/// An operation acquires the guard before its first state read and holds
/// the returned [`ReentrancyLock`] until it finishes. The lock releases the
/// guard on drop, so early returns through `?` cannot leave it set.
#[derive(Debug, Default)]
pub struct ReentrancyGuard {
    locked: Cell<bool>,
}

impl ReentrancyGuard {
    /// Create a new unlocked guard.
    pub fn new() -> Self {
        Self {
            locked: Cell::new(false),
        }
    }

    /// Acquire the guard. Returns `None` if already held (reentrancy attempt).
    pub fn acquire(&self) -> Option<ReentrancyLock<'_>> {
        if self.locked.replace(true) {
            return None;
        }
        Some(ReentrancyLock { guard: self })
    }

    /// Check if currently locked.
    pub fn is_locked(&self) -> bool {
        self.locked.get()
    }
}

/// Held for the duration of one protected operation.
#[derive(Debug)]
pub struct ReentrancyLock<'a> {
    guard: &'a ReentrancyGuard,
}

impl Drop for ReentrancyLock<'_> {
    fn drop(&mut self) {
        self.guard.locked.set(false);
    }
}

/// Administrative roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Oracle, price source and withdraw limit changes
    Admin,
    /// Pause and unpause only
    Pauser,
}

/// Proof that the environment authorized a caller for a role.
///
/// Only [`AccessControl::authorize`] can create one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Capability {
    holder: HolderId,
    role: Role,
}

impl Capability {
    pub fn holder(&self) -> HolderId {
        self.holder
    }

    pub fn role(&self) -> Role {
        self.role
    }

    /// Admins may do anything a pauser may.
    pub fn permits(&self, required: Role) -> bool {
        self.role == required || self.role == Role::Admin
    }
}

/// Role-based access control kept by the calling environment.
#[derive(Debug, Clone)]
pub struct AccessControl {
    roles: HashMap<HolderId, Role>,
    admin: HolderId,
}

impl AccessControl {
    /// Create access control with an initial admin.
    pub fn new(admin: HolderId) -> Self {
        let mut roles = HashMap::new();
        roles.insert(admin, Role::Admin);
        Self { roles, admin }
    }

    /// Check if a caller has the specified role.
    pub fn has_role(&self, caller: &HolderId, role: Role) -> bool {
        self.roles.get(caller).is_some_and(|r| *r == role)
    }

    pub fn is_admin(&self, caller: &HolderId) -> bool {
        self.has_role(caller, Role::Admin)
    }

    /// Mint a capability for `caller` acting in `role`.
    ///
    /// Returns `None` when the caller does not hold that role.
    pub fn authorize(&self, caller: &HolderId, role: Role) -> Option<Capability> {
        if !self.has_role(caller, role) {
            return None;
        }
        Some(Capability {
            holder: *caller,
            role,
        })
    }

    /// Assign a role to a target. Only admin can assign roles.
    pub fn grant_role(&mut self, admin_caller: &HolderId, target: HolderId, role: Role) -> bool {
        if !self.is_admin(admin_caller) {
            return false;
        }
        self.roles.insert(target, role);
        true
    }

    /// Remove a role from a target. Only admin can revoke.
    pub fn revoke_role(&mut self, admin_caller: &HolderId, target: &HolderId) -> bool {
        if !self.is_admin(admin_caller) {
            return false;
        }
        // Cannot revoke the primary admin
        if *target == self.admin {
            return false;
        }
        self.roles.remove(target);
        true
    }

    /// Transfer the primary admin seat.
    pub fn transfer_admin(&mut self, current_admin: &HolderId, new_admin: HolderId) -> bool {
        if *current_admin != self.admin {
            return false;
        }
        self.roles.remove(current_admin);
        self.roles.insert(new_admin, Role::Admin);
        self.admin = new_admin;
        true
    }

    pub fn admin(&self) -> HolderId {
        self.admin
    }
}
