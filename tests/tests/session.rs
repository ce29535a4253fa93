use helpdesk_api::{
    CommentId, CommentNotice, CommentsApi, Error, FeedMessage, NewComment, TicketId, User, Uuid,
};
use helpdesk_client::{CommentNode, ThreadSession};

#[tokio::test]
async fn pushed_comment_is_reconciled_by_refetching() {
    let (server, ticket) = tests::server_with_ticket();
    let (root_a, _root_b, _reply) = {
        let mut s = server.lock().await;
        let a = s
            .seed_comment(ticket, User::stub("alice"), "printer is down", None)
            .expect("seeding");
        let b = s
            .seed_comment(ticket, User::stub("bob"), "same here", None)
            .expect("seeding");
        let r = s
            .seed_comment(ticket, User::stub("carol"), "which model?", Some(a))
            .expect("seeding");
        (a, b, r)
    };

    let mut session = ThreadSession::open(tests::api_as(&server, "viewer"), ticket)
        .await
        .expect("opening session");
    assert_eq!(session.thread().displayed_count(), 3);

    // another agent replies while the viewer has the thread open
    let mut agent = tests::api_as(&server, "agent");
    let created = agent
        .create_comment(ticket, NewComment::reply(root_a, "an HP-4", vec![]))
        .await
        .expect("creating reply");

    let msg = session.next_feed_message().await.expect("notice pushed");
    assert!(session.handle_feed(msg).await.expect("handling notice"));

    let forest = session.thread().forest();
    assert_eq!(CommentNode::total_count(forest), 4);
    let parent = CommentNode::find(forest, root_a).expect("root still displayed");
    assert!(parent.replies.iter().any(|r| r.id() == created.id));

    // the viewer's flat list matches the server's, nothing was applied twice
    assert_eq!(session.thread().comments().len(), 4);

    session.close().await.expect("closing session");
}

#[tokio::test]
async fn own_submission_and_its_push_notice_do_not_duplicate() {
    let (server, ticket) = tests::server_with_ticket();
    let root = {
        let mut s = server.lock().await;
        let root = s
            .seed_comment(ticket, User::stub("alice"), "printer is down", None)
            .expect("seeding");
        s.seed_comment(ticket, User::stub("bob"), "same here", None)
            .expect("seeding");
        s.seed_comment(ticket, User::stub("carol"), "restart it", None)
            .expect("seeding");
        root
    };

    let mut session = ThreadSession::open(tests::api_as(&server, "viewer"), ticket)
        .await
        .expect("opening session");
    assert_eq!(session.thread().displayed_count(), 3);

    // the session's own submission relays a notice back to its own feed
    session.thread_mut().start_reply(root);
    session
        .post_reply(root, "restarting did it", vec![])
        .await
        .expect("posting reply");
    assert_eq!(session.thread().displayed_count(), 4);

    // draining the self-triggered notice re-fetches but adds nothing
    assert!(session.pump_feed().await.expect("pumping feed"));
    assert_eq!(session.thread().displayed_count(), 4);

    let mut seen = std::collections::HashSet::new();
    for c in session.thread().comments() {
        assert!(seen.insert(c.id), "comment {:?} appears twice", c.id);
    }
    let parent = CommentNode::find(session.thread().forest(), root).expect("root displayed");
    assert_eq!(parent.replies.len(), 1);
    assert_eq!(parent.replies[0].comment.text, "restarting did it");

    session.close().await.expect("closing session");
}

#[tokio::test]
async fn duplicate_and_foreign_notices_are_harmless() {
    let (server, ticket) = tests::server_with_ticket();
    server
        .lock()
        .await
        .seed_comment(ticket, User::stub("alice"), "hello", None)
        .expect("seeding");

    let mut session = ThreadSession::open(tests::api_as(&server, "viewer"), ticket)
        .await
        .expect("opening session");

    // a notice for some other ticket is ignored
    let foreign = FeedMessage::NewComment(CommentNotice {
        ticket: TicketId(Uuid::new_v4()),
        comment: None,
    });
    assert!(!session.handle_feed(foreign).await.expect("handling"));
    assert_eq!(session.thread().displayed_count(), 1);

    // a duplicate notice for the viewed ticket only costs a redundant fetch
    let own = FeedMessage::NewComment(CommentNotice {
        ticket,
        comment: None,
    });
    assert!(session.handle_feed(own.clone()).await.expect("handling"));
    assert!(session.handle_feed(own).await.expect("handling"));
    assert_eq!(session.thread().displayed_count(), 1);

    session.close().await.expect("closing session");
}

#[tokio::test]
async fn session_joins_and_leaves_the_room_exactly_once() {
    let (server, ticket) = tests::server_with_ticket();
    assert_eq!(server.lock().await.test_room_members(ticket), 0);

    let session = ThreadSession::open(tests::api_as(&server, "viewer"), ticket)
        .await
        .expect("opening session");
    assert_eq!(server.lock().await.test_room_members(ticket), 1);

    session.close().await.expect("closing session");
    assert_eq!(server.lock().await.test_room_members(ticket), 0);
}

#[tokio::test]
async fn failed_mutations_leave_the_thread_untouched() {
    let (server, ticket) = tests::server_with_ticket();
    server
        .lock()
        .await
        .seed_comment(ticket, User::stub("alice"), "hello", None)
        .expect("seeding");

    let mut session = ThreadSession::open(tests::api_as(&server, "viewer"), ticket)
        .await
        .expect("opening session");
    let before = session.thread().comments().to_vec();

    let err = session
        .post_comment("   ", vec![])
        .await
        .expect_err("blank comment without attachments");
    assert_eq!(err, Error::EmptyComment);
    assert_eq!(session.thread().comments(), &before[..]);

    let ghost = CommentId(Uuid::new_v4());
    let err = session
        .post_reply(ghost, "hi", vec![])
        .await
        .expect_err("parent does not exist");
    assert_eq!(err, Error::UnknownComment(ghost.0));
    assert_eq!(session.thread().comments(), &before[..]);

    session.close().await.expect("closing session");
}

#[tokio::test]
async fn deleting_goes_through_the_server_then_refetches() {
    let (server, ticket) = tests::server_with_ticket();
    let (root, reply) = {
        let mut s = server.lock().await;
        let root = s
            .seed_comment(ticket, User::stub("alice"), "obsolete", None)
            .expect("seeding");
        let reply = s
            .seed_comment(ticket, User::stub("bob"), "agreed", Some(root))
            .expect("seeding");
        (root, reply)
    };

    let mut session = ThreadSession::open(tests::api_as(&server, "viewer"), ticket)
        .await
        .expect("opening session");
    assert_eq!(session.thread().displayed_count(), 2);

    session.delete_comment(root).await.expect("deleting");
    assert!(!session.thread().contains(root));
    assert!(!session.thread().contains(reply));
    assert_eq!(session.thread().displayed_count(), 0);

    session.close().await.expect("closing session");
}

#[tokio::test]
async fn editing_updates_the_thread_and_closes_the_form() {
    let (server, ticket) = tests::server_with_ticket();
    let root = server
        .lock()
        .await
        .seed_comment(ticket, User::stub("alice"), "typo herre", None)
        .expect("seeding");

    let mut session = ThreadSession::open(tests::api_as(&server, "alice"), ticket)
        .await
        .expect("opening session");
    session.thread_mut().start_edit(root);
    assert!(session.thread().is_editing(root));

    session
        .submit_edit(root, "typo here", vec![])
        .await
        .expect("editing");
    assert!(!session.thread().is_editing(root));
    let node = CommentNode::find(session.thread().forest(), root).expect("still displayed");
    assert_eq!(node.comment.text, "typo here");

    session.close().await.expect("closing session");
}

#[tokio::test]
async fn reply_form_closes_when_its_target_is_deleted_elsewhere() {
    let (server, ticket) = tests::server_with_ticket();
    let root = server
        .lock()
        .await
        .seed_comment(ticket, User::stub("alice"), "hello", None)
        .expect("seeding");

    let mut session = ThreadSession::open(tests::api_as(&server, "viewer"), ticket)
        .await
        .expect("opening session");
    session.thread_mut().start_reply(root);
    assert!(session.thread().is_replying_to(root));

    // another agent deletes the comment under the open form
    let mut agent = tests::api_as(&server, "agent");
    agent.delete_comment(root).await.expect("deleting");

    session.refresh().await.expect("refreshing");
    assert!(!session.thread().is_replying_to(root));
    assert!(!session.thread().contains(root));

    session.close().await.expect("closing session");
}
