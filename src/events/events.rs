use uuid::Uuid;

/// A notification addressed to a single user.
///
/// Values of this type are returned by workflow operations alongside their
/// result, and are expected to be handed to
/// [`Dispatcher::dispatch`](super::Dispatcher::dispatch) by the caller
/// after the operation has committed. They are never persisted here; storage
/// is the receiving channel's concern.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Notification {
    /// User this notification is addressed to.
    pub recipient: i32,
    #[serde(flatten)]
    pub event: Event,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Event {
    PostApproved(PostApproved),
    PostRejected(PostRejected),
    EditSuggested(EditSuggested),
    SuggestionApproved(SuggestionApproved),
    SuggestionRejected(SuggestionRejected),
    CommentPosted(CommentPosted),
    CommentReplied(CommentReplied),
    MessageReceived(MessageReceived),
}

/// A moderator approved the recipient's submission.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct PostApproved {
    /// Item that was published.
    pub item: Uuid,
}

/// A moderator sent the recipient's submission back for revision.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct PostRejected {
    pub item: Uuid,
    /// Reason given by the moderator.
    pub reason: String,
}

/// Someone proposed an edit to the recipient's published item.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct EditSuggested {
    pub item: Uuid,
    pub suggestion: i32,
}

/// The author accepted the recipient's edit suggestion.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct SuggestionApproved {
    pub item: Uuid,
    pub suggestion: i32,
}

/// The author declined the recipient's edit suggestion.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct SuggestionRejected {
    pub item: Uuid,
    pub suggestion: i32,
    /// Reason given by the author, possibly empty.
    pub reason: String,
}

/// Someone commented on the recipient's item.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct CommentPosted {
    pub item: Uuid,
    pub comment: i32,
}

/// Someone replied to the recipient's comment.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct CommentReplied {
    pub comment: i32,
    pub reply: i32,
}

/// Someone sent the recipient a private message.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct MessageReceived {
    pub sender: i32,
    pub message: i32,
}

impl Event {
    pub fn kind(&self) -> &'static str {
        match *self {
            Event::PostApproved(_) => "post-approved",
            Event::PostRejected(_) => "post-rejected",
            Event::EditSuggested(_) => "edit-suggested",
            Event::SuggestionApproved(_) => "suggestion-approved",
            Event::SuggestionRejected(_) => "suggestion-rejected",
            Event::CommentPosted(_) => "comment-posted",
            Event::CommentReplied(_) => "comment-replied",
            Event::MessageReceived(_) => "message-received",
        }
    }
}

impl_from! { for Event ;
    PostApproved => |e| Event::PostApproved(e),
    PostRejected => |e| Event::PostRejected(e),
    EditSuggested => |e| Event::EditSuggested(e),
    SuggestionApproved => |e| Event::SuggestionApproved(e),
    SuggestionRejected => |e| Event::SuggestionRejected(e),
    CommentPosted => |e| Event::CommentPosted(e),
    CommentReplied => |e| Event::CommentReplied(e),
    MessageReceived => |e| Event::MessageReceived(e),
}

impl Notification {
    pub fn post_approved(author: i32, item: Uuid) -> Notification {
        Notification {
            recipient: author,
            event: PostApproved { item }.into(),
        }
    }

    pub fn post_rejected(author: i32, item: Uuid, reason: &str) -> Notification {
        Notification {
            recipient: author,
            event: PostRejected { item, reason: reason.to_string() }.into(),
        }
    }

    /// Notify an item's author of a new edit suggestion.
    ///
    /// Suppressed when the author suggests an edit to their own item.
    /// Anonymous suggestions still notify the author.
    pub fn edit_suggested(
        author: i32,
        suggester: Option<i32>,
        item: Uuid,
        suggestion: i32,
    ) -> Option<Notification> {
        if suggester == Some(author) {
            return None;
        }

        Some(Notification {
            recipient: author,
            event: EditSuggested { item, suggestion }.into(),
        })
    }

    /// Notify a suggester their suggestion was accepted.
    ///
    /// Anonymous suggesters cannot be notified.
    pub fn suggestion_approved(
        suggester: Option<i32>,
        item: Uuid,
        suggestion: i32,
    ) -> Option<Notification> {
        suggester.map(|recipient| Notification {
            recipient,
            event: SuggestionApproved { item, suggestion }.into(),
        })
    }

    /// Notify a suggester their suggestion was declined.
    ///
    /// Anonymous suggesters cannot be notified.
    pub fn suggestion_rejected(
        suggester: Option<i32>,
        item: Uuid,
        suggestion: i32,
        reason: &str,
    ) -> Option<Notification> {
        suggester.map(|recipient| Notification {
            recipient,
            event: SuggestionRejected {
                item,
                suggestion,
                reason: reason.to_string(),
            }.into(),
        })
    }

    /// Notify an item's author of a new comment.
    ///
    /// Commenting on your own item produces no notification. Guests can
    /// comment, and their comments do notify the author.
    pub fn comment_posted(
        author: i32,
        commenter: Option<i32>,
        item: Uuid,
        comment: i32,
    ) -> Option<Notification> {
        if commenter == Some(author) {
            return None;
        }

        Some(Notification {
            recipient: author,
            event: CommentPosted { item, comment }.into(),
        })
    }

    /// Notify a comment's author of a reply.
    ///
    /// Guest comment authors cannot be notified, and replying to your own
    /// comment produces no notification.
    pub fn comment_replied(
        parent_author: Option<i32>,
        replier: Option<i32>,
        comment: i32,
        reply: i32,
    ) -> Option<Notification> {
        let recipient = parent_author?;

        if replier == Some(recipient) {
            return None;
        }

        Some(Notification {
            recipient,
            event: CommentReplied { comment, reply }.into(),
        })
    }

    pub fn message_received(
        recipient: i32,
        sender: i32,
        message: i32,
    ) -> Notification {
        Notification {
            recipient,
            event: MessageReceived { sender, message }.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::{Event, Notification};

    #[test]
    fn edit_suggestion_on_own_item_is_suppressed() {
        let item = Uuid::new_v4();

        assert!(Notification::edit_suggested(7, Some(7), item, 1).is_none());

        let notification = Notification::edit_suggested(7, Some(8), item, 1)
            .unwrap();
        assert_eq!(notification.recipient, 7);
        assert_eq!(notification.event.kind(), "edit-suggested");
    }

    #[test]
    fn anonymous_suggestions_notify_the_author_only() {
        let item = Uuid::new_v4();

        assert!(Notification::edit_suggested(7, None, item, 1).is_some());
        assert!(Notification::suggestion_approved(None, item, 1).is_none());
        assert!(Notification::suggestion_rejected(None, item, 1, "").is_none());
    }

    #[test]
    fn comment_notifications_follow_suppression_rules() {
        let item = Uuid::new_v4();

        assert!(Notification::comment_posted(7, Some(7), item, 1).is_none());
        assert!(Notification::comment_posted(7, None, item, 1).is_some());
        assert!(Notification::comment_posted(7, Some(8), item, 1).is_some());

        assert!(Notification::comment_replied(None, Some(8), 1, 2).is_none());
        assert!(Notification::comment_replied(Some(7), Some(7), 1, 2).is_none());
        assert_eq!(
            Notification::comment_replied(Some(7), None, 1, 2)
                .unwrap()
                .recipient,
            7,
        );
    }

    #[test]
    fn events_serialize_with_their_kind() {
        let notification = Notification::post_rejected(
            3, Uuid::nil(), "needs work");
        let value = serde_json::to_value(&notification).unwrap();

        assert_eq!(value["kind"], "post-rejected");
        assert_eq!(value["recipient"], 3);
        assert_eq!(value["reason"], "needs work");
        assert_eq!(notification.event.kind(), "post-rejected");
    }

    #[test]
    fn kind_strings_match_serialized_tags() {
        let item = Uuid::nil();
        let events: Vec<Event> = vec![
            Notification::post_approved(1, item).event,
            Notification::post_rejected(1, item, "r").event,
            Notification::edit_suggested(1, None, item, 2).unwrap().event,
            Notification::suggestion_approved(Some(2), item, 2).unwrap().event,
            Notification::suggestion_rejected(Some(2), item, 2, "r").unwrap().event,
            Notification::comment_posted(1, None, item, 3).unwrap().event,
            Notification::comment_replied(Some(1), None, 3, 4).unwrap().event,
            Notification::message_received(1, 2, 5).event,
        ];

        for event in events {
            let value = serde_json::to_value(&event).unwrap();
            assert_eq!(value["kind"], event.kind());
        }
    }
}
