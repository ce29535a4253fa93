use helpdesk_api::NotificationsApi;
use helpdesk_client::NotificationInbox;

#[tokio::test]
async fn pushed_notifications_land_in_the_inbox() {
    let (server, _ticket) = tests::server_with_ticket();
    let mut api = tests::api_as(&server, "viewer");

    let mut feed = api.join_user_room().await.expect("joining user room");
    let mut inbox = NotificationInbox::new();
    inbox.load(&mut api).await.expect("initial load");
    assert_eq!(inbox.items().len(), 0);

    server
        .lock()
        .await
        .push_notification("New reply on ticket #12", Some(String::from("/tickets/12")));

    let pushed = feed.recv().await.expect("notification pushed");
    inbox.push(pushed.clone());
    assert_eq!(inbox.items().len(), 1);
    assert_eq!(inbox.unread_count(), 1);

    // the next full fetch returns the same entry; the inbox must not double it
    inbox.load(&mut api).await.expect("reloading");
    assert_eq!(inbox.items().len(), 1);

    inbox.mark_read(&mut api, pushed.id).await.expect("marking read");
    assert_eq!(inbox.unread_count(), 0);

    // the read state survives a reload because the server was updated too
    inbox.load(&mut api).await.expect("reloading");
    assert_eq!(inbox.unread_count(), 0);
}

#[tokio::test]
async fn mark_all_read_clears_the_badge() {
    let (server, _ticket) = tests::server_with_ticket();
    let mut api = tests::api_as(&server, "viewer");

    {
        let mut s = server.lock().await;
        s.push_notification("one", None);
        s.push_notification("two", None);
        s.push_notification("three", None);
    }

    let mut inbox = NotificationInbox::new();
    inbox.load(&mut api).await.expect("loading");
    assert_eq!(inbox.unread_count(), 3);

    inbox.mark_all_read(&mut api).await.expect("marking all read");
    assert_eq!(inbox.unread_count(), 0);

    inbox.load(&mut api).await.expect("reloading");
    assert_eq!(inbox.unread_count(), 0);
}
