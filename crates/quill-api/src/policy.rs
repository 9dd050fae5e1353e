use uuid::Uuid;

use quill_types::api::Claims;
use quill_types::models::{CommentStatus, PostStatus, Role};

use crate::error::ApiError;

/// The identity performing an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Actor {
    Anonymous,
    Known { id: Uuid, role: Role },
}

impl Actor {
    pub fn from_claims(claims: Option<&Claims>) -> Self {
        match claims {
            Some(c) => Actor::Known {
                id: c.sub,
                role: c.role,
            },
            None => Actor::Anonymous,
        }
    }

    pub fn id(&self) -> Option<Uuid> {
        match self {
            Actor::Anonymous => None,
            Actor::Known { id, .. } => Some(*id),
        }
    }

    fn is_admin(&self) -> bool {
        matches!(
            self,
            Actor::Known {
                role: Role::Admin,
                ..
            }
        )
    }

    /// The first gate of every operation: `Forbidden` before any store
    /// mutation.
    pub fn require(&self, action: Action, resource: &Resource) -> Result<(), ApiError> {
        if authorize(self, action, resource) {
            Ok(())
        } else {
            Err(ApiError::Forbidden)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Read,
    Create,
    Update,
    Delete,
    /// Comment moderation-status transitions.
    Moderate,
}

/// The target of an operation, carrying the state the decision needs:
/// owner identity and current status, where known.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Post { status: Option<PostStatus> },
    Category,
    Comment {
        author_id: Option<Uuid>,
        status: Option<CommentStatus>,
    },
}

/// Pure decision function of (actor, action, resource state).
///
/// - Anonymous actors read published posts, approved comments, and
///   categories.
/// - Authenticated users additionally create comments and update/delete
///   their own.
/// - Admins are unrestricted, including post/category writes and comment
///   moderation.
pub fn authorize(actor: &Actor, action: Action, resource: &Resource) -> bool {
    if actor.is_admin() {
        return true;
    }

    match (action, resource) {
        (Action::Read, Resource::Post { status }) => *status == Some(PostStatus::Published),
        (Action::Read, Resource::Category) => true,
        (Action::Read, Resource::Comment { status, .. }) => {
            *status == Some(CommentStatus::Approved)
        }
        (Action::Create, Resource::Comment { .. }) => matches!(actor, Actor::Known { .. }),
        (Action::Update | Action::Delete, Resource::Comment { author_id, .. }) => {
            matches!(actor, Actor::Known { id, .. } if Some(*id) == *author_id)
        }
        // Post/category writes and moderation are admin-only.
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: Uuid) -> Actor {
        Actor::Known {
            id,
            role: Role::User,
        }
    }

    fn admin() -> Actor {
        Actor::Known {
            id: Uuid::new_v4(),
            role: Role::Admin,
        }
    }

    #[test]
    fn anonymous_reads_published_only() {
        let post = |status| Resource::Post { status: Some(status) };
        assert!(authorize(&Actor::Anonymous, Action::Read, &post(PostStatus::Published)));
        assert!(!authorize(&Actor::Anonymous, Action::Read, &post(PostStatus::Draft)));
        assert!(authorize(&Actor::Anonymous, Action::Read, &Resource::Category));
    }

    #[test]
    fn anonymous_cannot_create_posts() {
        let resource = Resource::Post { status: Some(PostStatus::Draft) };
        assert!(!authorize(&Actor::Anonymous, Action::Create, &resource));
        assert!(authorize(&admin(), Action::Create, &resource));
    }

    #[test]
    fn post_and_category_writes_are_admin_only() {
        let alice = user(Uuid::new_v4());
        for action in [Action::Create, Action::Update, Action::Delete] {
            assert!(!authorize(&alice, action, &Resource::Post { status: None }));
            assert!(!authorize(&alice, action, &Resource::Category));
            assert!(authorize(&admin(), action, &Resource::Post { status: None }));
            assert!(authorize(&admin(), action, &Resource::Category));
        }
    }

    #[test]
    fn users_touch_only_their_own_comments() {
        let alice_id = Uuid::new_v4();
        let alice = user(alice_id);
        let bob = user(Uuid::new_v4());
        let alices_comment = Resource::Comment {
            author_id: Some(alice_id),
            status: Some(CommentStatus::Approved),
        };

        assert!(authorize(&alice, Action::Delete, &alices_comment));
        assert!(authorize(&alice, Action::Update, &alices_comment));
        assert!(!authorize(&bob, Action::Delete, &alices_comment));
        assert!(!authorize(&Actor::Anonymous, Action::Delete, &alices_comment));
        assert!(authorize(&admin(), Action::Delete, &alices_comment));
    }

    #[test]
    fn any_authenticated_user_comments_anonymous_does_not() {
        let target = Resource::Comment {
            author_id: None,
            status: None,
        };
        assert!(authorize(&user(Uuid::new_v4()), Action::Create, &target));
        assert!(!authorize(&Actor::Anonymous, Action::Create, &target));
    }

    #[test]
    fn moderation_is_admin_only() {
        let alice_id = Uuid::new_v4();
        let own = Resource::Comment {
            author_id: Some(alice_id),
            status: Some(CommentStatus::Pending),
        };
        assert!(!authorize(&user(alice_id), Action::Moderate, &own));
        assert!(authorize(&admin(), Action::Moderate, &own));
    }

    #[test]
    fn non_approved_comments_hidden_from_non_admins() {
        let pending = Resource::Comment {
            author_id: Some(Uuid::new_v4()),
            status: Some(CommentStatus::Pending),
        };
        assert!(!authorize(&Actor::Anonymous, Action::Read, &pending));
        assert!(!authorize(&user(Uuid::new_v4()), Action::Read, &pending));
        assert!(authorize(&admin(), Action::Read, &pending));
    }
}
