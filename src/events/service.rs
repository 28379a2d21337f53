//! Best-effort fan-out of notifications to delivery channels.

use super::Notification;

/// A delivery channel for notifications.
///
/// Implemented by the host application: an in-app notification inbox, an
/// email formatter, a push gateway. The workflow core only decides whom to
/// notify and with what event; rendering and transport live behind this
/// trait.
pub trait Channel {
    /// Name of this channel, used in log messages.
    fn name(&self) -> &str;

    /// Deliver a single notification.
    fn deliver(&self, notification: &Notification) -> crate::Result<()>;
}

/// Fans notifications out to registered channels.
///
/// Delivery is best-effort: a failing channel is logged and skipped, and
/// can never affect the workflow transition that produced the event. Callers
/// dispatch only after their transaction has committed.
#[derive(Default)]
pub struct Dispatcher {
    channels: Vec<Box<dyn Channel>>,
}

impl Dispatcher {
    pub fn new() -> Dispatcher {
        Dispatcher { channels: Vec::new() }
    }

    /// Register a delivery channel.
    pub fn register<C>(&mut self, channel: C)
    where
        C: Channel + 'static,
    {
        self.channels.push(Box::new(channel));
    }

    /// Deliver a notification through every registered channel.
    pub fn dispatch(&self, notification: &Notification) {
        for channel in &self.channels {
            if let Err(err) = channel.deliver(notification) {
                error!(
                    "could not deliver {} notification to user {} via {}: {}",
                    notification.event.kind(),
                    notification.recipient,
                    channel.name(),
                    err,
                );
            }
        }
    }

    /// Deliver a batch of notifications, skipping suppressed ones.
    pub fn dispatch_all<I>(&self, notifications: I)
    where
        I: IntoIterator<Item = Notification>,
    {
        for notification in notifications {
            self.dispatch(&notification);
        }
    }
}

/// Channel which writes notifications to the log.
pub struct Logger;

impl Channel for Logger {
    fn name(&self) -> &str {
        "log"
    }

    fn deliver(&self, notification: &Notification) -> crate::Result<()> {
        info!(
            "notify user {}: {}",
            notification.recipient,
            serde_json::to_string(&notification.event)?,
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use failure::err_msg;
    use uuid::Uuid;

    use std::{cell::RefCell, rc::Rc};

    use super::{Channel, Dispatcher, Notification};

    struct Recorder {
        delivered: Rc<RefCell<Vec<String>>>,
    }

    impl Channel for Recorder {
        fn name(&self) -> &str {
            "recorder"
        }

        fn deliver(&self, notification: &Notification) -> crate::Result<()> {
            self.delivered.borrow_mut()
                .push(notification.event.kind().to_string());
            Ok(())
        }
    }

    struct Broken;

    impl Channel for Broken {
        fn name(&self) -> &str {
            "broken"
        }

        fn deliver(&self, _: &Notification) -> crate::Result<()> {
            Err(err_msg("mailbox on fire"))
        }
    }

    #[test]
    fn failing_channels_do_not_stop_delivery() {
        let delivered = Rc::new(RefCell::new(Vec::new()));

        let mut dispatcher = Dispatcher::new();
        dispatcher.register(Broken);
        dispatcher.register(Recorder { delivered: delivered.clone() });

        dispatcher.dispatch(&Notification::post_approved(1, Uuid::nil()));

        assert_eq!(*delivered.borrow(), ["post-approved"]);
    }

    #[test]
    fn dispatch_all_accepts_suppressed_notifications() {
        let delivered = Rc::new(RefCell::new(Vec::new()));

        let mut dispatcher = Dispatcher::new();
        dispatcher.register(Recorder { delivered: delivered.clone() });

        let item = Uuid::nil();
        dispatcher.dispatch_all(Notification::edit_suggested(
            7, Some(7), item, 1));
        dispatcher.dispatch_all(Notification::edit_suggested(
            7, Some(8), item, 1));

        assert_eq!(*delivered.borrow(), ["edit-suggested"]);
    }
}
