use crate::api::{Error, Notification, NotificationId, NotificationsApi};

/// The per-user notification list backing the bell dropdown.
///
/// Fetch replaces the whole list; push inserts at the front. The push channel
/// can deliver an entry the fetch already returned, so insertion dedups by id
/// and the unread count is always derived from the list rather than counted
/// incrementally.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct NotificationInbox {
    items: Vec<Notification>,
}

impl NotificationInbox {
    pub fn new() -> NotificationInbox {
        NotificationInbox { items: Vec::new() }
    }

    /// Newest first.
    pub fn items(&self) -> &[Notification] {
        &self.items
    }

    pub fn unread_count(&self) -> usize {
        self.items.iter().filter(|n| !n.is_read).count()
    }

    pub fn set_items(&mut self, items: Vec<Notification>) {
        self.items = items;
        self.dedup();
    }

    /// Apply one pushed notification.
    pub fn push(&mut self, n: Notification) {
        self.items.insert(0, n);
        self.dedup();
    }

    fn dedup(&mut self) {
        let mut seen = std::collections::HashSet::new();
        self.items.retain(|n| seen.insert(n.id));
    }

    fn set_read(&mut self, id: NotificationId) {
        if let Some(n) = self.items.iter_mut().find(|n| n.id == id) {
            n.is_read = true;
        }
    }

    /// Mark one notification read at the collaborator, then locally.
    pub async fn mark_read<A: NotificationsApi>(
        &mut self,
        api: &mut A,
        id: NotificationId,
    ) -> Result<(), Error> {
        api.mark_read(id).await?;
        self.set_read(id);
        Ok(())
    }

    /// Mark everything read at the collaborator, then locally.
    pub async fn mark_all_read<A: NotificationsApi>(&mut self, api: &mut A) -> Result<(), Error> {
        api.mark_all_read().await?;
        for n in &mut self.items {
            n.is_read = true;
        }
        Ok(())
    }

    /// Initial load: full fetch replacing any existing list.
    pub async fn load<A: NotificationsApi>(&mut self, api: &mut A) -> Result<(), Error> {
        let items = api.fetch_notifications().await?;
        self.set_items(items);
        Ok(())
    }
}
