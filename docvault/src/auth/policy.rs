//! Authorization policy.
//!
//! Every permission decision goes through [`can`], a pure function over the
//! acting identity and the attempted action. Handlers never inspect roles
//! directly, so the full access matrix lives (and is tested) in one place.

use crate::api::models::documents::AccessLevel;
use crate::api::models::users::{AccountStatus, Identity, Role};
use crate::types::UserId;

/// An attempted operation, carrying the minimum context needed to decide it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    ReadDocument(AccessLevel),
    CreateDocument,
    UpdateDocument,
    DeleteDocument,
    ViewDocumentStats,
    CreateAnnotation { document_access: AccessLevel },
    ModifyAnnotation { author: UserId },
    ManageUsers,
    TriageFeedback,
    SubmitFeedback,
    ReadOwnProfile { user_id: UserId },
}

/// Decide whether `actor` may perform `action`.
///
/// `None` is an unauthenticated caller. A caller whose account is not active
/// is denied everything except reading their own profile, so a suspension or
/// a still-pending approval bites immediately even with a valid token.
pub fn can(actor: Option<&Identity>, action: &Action) -> bool {
    let Some(actor) = actor else {
        return matches!(action, Action::ReadDocument(AccessLevel::Public) | Action::SubmitFeedback);
    };

    if actor.status != AccountStatus::Active {
        return matches!(action, Action::ReadOwnProfile { user_id } if *user_id == actor.id);
    }

    match action {
        Action::ReadDocument(level) => role_allows(actor.role, *level),
        Action::CreateDocument | Action::UpdateDocument | Action::DeleteDocument | Action::ViewDocumentStats => {
            actor.role == Role::Archivist
        }
        Action::CreateAnnotation { document_access } => {
            matches!(actor.role, Role::Archivist | Role::Researcher) && role_allows(actor.role, *document_access)
        }
        Action::ModifyAnnotation { author } => *author == actor.id || actor.role == Role::Archivist,
        Action::ManageUsers | Action::TriageFeedback => actor.role == Role::Archivist,
        Action::SubmitFeedback => true,
        Action::ReadOwnProfile { user_id } => *user_id == actor.id,
    }
}

/// The access levels `actor` may read, for constraining listing queries.
///
/// Consistent with [`can`] on `ReadDocument`: a level is included exactly
/// when `can` would allow reading a document at that level.
pub fn readable_levels(actor: Option<&Identity>) -> Vec<AccessLevel> {
    [AccessLevel::Public, AccessLevel::Restricted, AccessLevel::Confidential]
        .into_iter()
        .filter(|level| can(actor, &Action::ReadDocument(*level)))
        .collect()
}

fn role_allows(role: Role, level: AccessLevel) -> bool {
    match role {
        Role::Archivist => true,
        Role::Researcher => matches!(level, AccessLevel::Public | AccessLevel::Restricted),
        Role::Public => level == AccessLevel::Public,
    }
}
