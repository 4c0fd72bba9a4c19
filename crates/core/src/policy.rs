//! Authorization policy.
//!
//! Pure predicates over `(viewer, action, resource)`. The HTTP layer turns a
//! denial into 401 (anonymous viewer on an action that needs a signed-in
//! user) or 403 (signed-in viewer without permission).

use crate::error::CoreError;
use crate::prompt::Visibility;
use crate::roles::Role;
use crate::types::DbId;

// ---------------------------------------------------------------------------
// Viewer
// ---------------------------------------------------------------------------

/// The party a request is evaluated for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Viewer {
    Anonymous,
    User { id: DbId, role: Role },
}

impl Viewer {
    pub fn user(id: DbId, role: Role) -> Self {
        Self::User { id, role }
    }

    pub fn user_id(&self) -> Option<DbId> {
        match self {
            Self::Anonymous => None,
            Self::User { id, .. } => Some(*id),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::User { .. })
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Self::User { role: Role::Admin, .. })
    }

    fn owns(&self, owner_id: DbId) -> bool {
        self.user_id() == Some(owner_id)
    }
}

/// Outcome of a policy check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    /// The action needs a signed-in viewer.
    Unauthenticated,
    /// The viewer is signed in but not permitted.
    Deny,
}

impl Decision {
    pub fn is_allowed(self) -> bool {
        self == Self::Allow
    }

    /// Convert into a result, naming `what` in the error message.
    pub fn into_result(self, what: &str) -> Result<(), CoreError> {
        match self {
            Self::Allow => Ok(()),
            Self::Unauthenticated => Err(CoreError::Unauthorized(format!(
                "You must be signed in to {what}"
            ))),
            Self::Deny => Err(CoreError::Forbidden(format!(
                "You are not allowed to {what}"
            ))),
        }
    }
}

fn decide(viewer: &Viewer, allowed: bool) -> Decision {
    if allowed {
        Decision::Allow
    } else if viewer.is_authenticated() {
        Decision::Deny
    } else {
        Decision::Unauthenticated
    }
}

// ---------------------------------------------------------------------------
// Prompts
// ---------------------------------------------------------------------------

/// Actions on prompts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptAction {
    Index,
    Show,
    Create,
    Update,
    Destroy,
    ListVersions,
    RestoreVersion,
    Duplicate,
    IncrementUsage,
    ManageAttachments,
}

impl PromptAction {
    /// Verb phrase used in denial messages.
    pub fn describe(self) -> &'static str {
        match self {
            Self::Index => "list prompts",
            Self::Show => "view this prompt",
            Self::Create => "create prompts",
            Self::Update => "update this prompt",
            Self::Destroy => "delete this prompt",
            Self::ListVersions => "view this prompt's history",
            Self::RestoreVersion => "restore versions of this prompt",
            Self::Duplicate => "duplicate this prompt",
            Self::IncrementUsage => "use this prompt",
            Self::ManageAttachments => "change this prompt's attachments",
        }
    }
}

/// The parts of a prompt the policy looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PromptAccess {
    pub owner_id: DbId,
    pub visibility: Visibility,
}

fn can_show(viewer: &Viewer, prompt: &PromptAccess) -> bool {
    prompt.visibility == Visibility::Public || viewer.owns(prompt.owner_id) || viewer.is_admin()
}

fn can_modify(viewer: &Viewer, prompt: &PromptAccess) -> bool {
    viewer.is_authenticated() && (viewer.owns(prompt.owner_id) || viewer.is_admin())
}

/// Decide whether `viewer` may perform `action` on `prompt`.
///
/// `prompt` is `None` for collection actions (`Index`, `Create`).
pub fn authorize_prompt(
    viewer: &Viewer,
    action: PromptAction,
    prompt: Option<&PromptAccess>,
) -> Decision {
    let allowed = match (action, prompt) {
        (PromptAction::Index, _) => true,
        (PromptAction::Create, _) => viewer.is_authenticated(),
        (_, None) => false,
        (PromptAction::Show | PromptAction::ListVersions | PromptAction::IncrementUsage, Some(p)) => {
            can_show(viewer, p)
        }
        (PromptAction::Duplicate, Some(p)) => viewer.is_authenticated() && can_show(viewer, p),
        (
            PromptAction::Update
            | PromptAction::Destroy
            | PromptAction::RestoreVersion
            | PromptAction::ManageAttachments,
            Some(p),
        ) => can_modify(viewer, p),
    };
    decide(viewer, allowed)
}

/// Shorthand for [`authorize_prompt`] followed by [`Decision::into_result`].
pub fn ensure_prompt(
    viewer: &Viewer,
    action: PromptAction,
    prompt: Option<&PromptAccess>,
) -> Result<(), CoreError> {
    authorize_prompt(viewer, action, prompt).into_result(action.describe())
}

// ---------------------------------------------------------------------------
// Listing scope
// ---------------------------------------------------------------------------

/// Which prompts appear in a viewer's listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisibilityScope {
    /// Every prompt.
    All,
    /// Public and team prompts, plus everything owned by `user_id`.
    Member { user_id: DbId },
    /// Public prompts only.
    PublicOnly,
}

impl VisibilityScope {
    /// Whether a prompt falls inside this scope.
    pub fn includes(&self, prompt: &PromptAccess) -> bool {
        match self {
            Self::All => true,
            Self::Member { user_id } => {
                matches!(prompt.visibility, Visibility::Public | Visibility::Team)
                    || prompt.owner_id == *user_id
            }
            Self::PublicOnly => prompt.visibility == Visibility::Public,
        }
    }
}

/// Resolve the listing scope for `viewer`.
pub fn resolve_scope(viewer: &Viewer) -> VisibilityScope {
    match viewer {
        Viewer::User { role: Role::Admin, .. } => VisibilityScope::All,
        Viewer::User { id, .. } => VisibilityScope::Member { user_id: *id },
        Viewer::Anonymous => VisibilityScope::PublicOnly,
    }
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

/// Actions on user accounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserAction {
    Index,
    Show,
    Update,
    Destroy,
    ChangeRole,
}

impl UserAction {
    pub fn describe(self) -> &'static str {
        match self {
            Self::Index => "list users",
            Self::Show => "view this user",
            Self::Update => "update this user",
            Self::Destroy => "delete this user",
            Self::ChangeRole => "change user roles",
        }
    }
}

/// Decide whether `viewer` may perform `action` on the account `target_id`.
pub fn authorize_user(viewer: &Viewer, action: UserAction, target_id: Option<DbId>) -> Decision {
    let is_self = matches!((viewer.user_id(), target_id), (Some(a), Some(b)) if a == b);
    let allowed = match action {
        UserAction::Index | UserAction::ChangeRole => viewer.is_admin(),
        UserAction::Show | UserAction::Update | UserAction::Destroy => {
            viewer.is_authenticated() && (is_self || viewer.is_admin())
        }
    };
    decide(viewer, allowed)
}

pub fn ensure_user(
    viewer: &Viewer,
    action: UserAction,
    target_id: Option<DbId>,
) -> Result<(), CoreError> {
    authorize_user(viewer, action, target_id).into_result(action.describe())
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    const OWNER: DbId = 1;
    const OTHER: DbId = 2;
    const ADMIN: DbId = 3;

    fn owner() -> Viewer {
        Viewer::user(OWNER, Role::User)
    }

    fn other() -> Viewer {
        Viewer::user(OTHER, Role::User)
    }

    fn admin() -> Viewer {
        Viewer::user(ADMIN, Role::Admin)
    }

    fn prompt(visibility: Visibility) -> PromptAccess {
        PromptAccess {
            owner_id: OWNER,
            visibility,
        }
    }

    #[test]
    fn private_prompt_scope_membership() {
        let p = prompt(Visibility::Private);
        assert!(!resolve_scope(&Viewer::Anonymous).includes(&p));
        assert!(!resolve_scope(&other()).includes(&p));
        assert!(resolve_scope(&owner()).includes(&p));
        assert!(resolve_scope(&admin()).includes(&p));
    }

    #[test]
    fn public_prompt_visible_to_everyone() {
        let p = prompt(Visibility::Public);
        for viewer in [Viewer::Anonymous, owner(), other(), admin()] {
            assert!(resolve_scope(&viewer).includes(&p));
            assert!(authorize_prompt(&viewer, PromptAction::Show, Some(&p)).is_allowed());
        }
    }

    #[test]
    fn team_prompt_listed_for_members_but_not_showable() {
        let p = prompt(Visibility::Team);
        assert!(resolve_scope(&other()).includes(&p));
        assert!(!resolve_scope(&Viewer::Anonymous).includes(&p));
        assert_eq!(
            authorize_prompt(&other(), PromptAction::Show, Some(&p)),
            Decision::Deny
        );
    }

    #[test]
    fn show_private_denied_to_non_owner() {
        let p = prompt(Visibility::Private);
        assert_eq!(
            authorize_prompt(&other(), PromptAction::Show, Some(&p)),
            Decision::Deny
        );
        assert_eq!(
            authorize_prompt(&Viewer::Anonymous, PromptAction::Show, Some(&p)),
            Decision::Unauthenticated
        );
        assert!(authorize_prompt(&owner(), PromptAction::Show, Some(&p)).is_allowed());
        assert!(authorize_prompt(&admin(), PromptAction::Show, Some(&p)).is_allowed());
    }

    #[test]
    fn create_requires_authentication() {
        assert_eq!(
            authorize_prompt(&Viewer::Anonymous, PromptAction::Create, None),
            Decision::Unauthenticated
        );
        assert!(authorize_prompt(&other(), PromptAction::Create, None).is_allowed());
        assert!(authorize_prompt(&Viewer::Anonymous, PromptAction::Index, None).is_allowed());
    }

    #[test]
    fn update_and_destroy_require_owner_or_admin() {
        let p = prompt(Visibility::Public);
        for action in [
            PromptAction::Update,
            PromptAction::Destroy,
            PromptAction::RestoreVersion,
            PromptAction::ManageAttachments,
        ] {
            assert!(authorize_prompt(&owner(), action, Some(&p)).is_allowed());
            assert!(authorize_prompt(&admin(), action, Some(&p)).is_allowed());
            assert_eq!(authorize_prompt(&other(), action, Some(&p)), Decision::Deny);
            assert_eq!(
                authorize_prompt(&Viewer::Anonymous, action, Some(&p)),
                Decision::Unauthenticated
            );
        }
    }

    #[test]
    fn duplicate_requires_sign_in_and_visibility() {
        let public = prompt(Visibility::Public);
        let private = prompt(Visibility::Private);
        assert!(authorize_prompt(&other(), PromptAction::Duplicate, Some(&public)).is_allowed());
        assert_eq!(
            authorize_prompt(&other(), PromptAction::Duplicate, Some(&private)),
            Decision::Deny
        );
        assert_eq!(
            authorize_prompt(&Viewer::Anonymous, PromptAction::Duplicate, Some(&public)),
            Decision::Unauthenticated
        );
    }

    #[test]
    fn decision_maps_to_error_kinds() {
        let p = prompt(Visibility::Private);
        assert_matches!(
            ensure_prompt(&other(), PromptAction::Update, Some(&p)),
            Err(CoreError::Forbidden(_))
        );
        assert_matches!(
            ensure_prompt(&Viewer::Anonymous, PromptAction::Update, Some(&p)),
            Err(CoreError::Unauthorized(_))
        );
        assert_matches!(ensure_prompt(&owner(), PromptAction::Update, Some(&p)), Ok(()));
    }

    #[test]
    fn user_policy() {
        assert!(authorize_user(&admin(), UserAction::Index, None).is_allowed());
        assert_eq!(authorize_user(&other(), UserAction::Index, None), Decision::Deny);
        assert!(authorize_user(&other(), UserAction::Show, Some(OTHER)).is_allowed());
        assert_eq!(
            authorize_user(&other(), UserAction::Update, Some(OWNER)),
            Decision::Deny
        );
        assert!(authorize_user(&admin(), UserAction::Destroy, Some(OWNER)).is_allowed());
        assert_eq!(
            authorize_user(&other(), UserAction::ChangeRole, Some(OTHER)),
            Decision::Deny
        );
    }
}
