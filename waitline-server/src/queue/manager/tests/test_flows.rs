use super::*;

// ========================================================================
// Notification delivery lifecycle
// ========================================================================

#[test]
fn test_delivery_sent_then_delivered_via_callback() {
    let manager = create_test_manager();
    let list = create_test_list(&manager);
    let entry = check_in_named(&manager, &list, "Alice");

    manager.call(BUSINESS, &entry.id, &[Channel::Sms]).unwrap();
    let sent = manager
        .mark_channel_sent(&entry.id, Channel::Sms, "msg-123")
        .unwrap();

    let delivery = sent.delivery(Channel::Sms).unwrap();
    assert_eq!(delivery.status, DeliveryStatus::Sent);
    assert_eq!(delivery.provider_message_id.as_deref(), Some("msg-123"));
    assert!(delivery.sent_at.is_some());

    manager.mark_delivered("msg-123").unwrap();
    let entry = manager.storage().get_entry(&entry.id).unwrap().unwrap();
    let delivery = entry.delivery(Channel::Sms).unwrap();
    assert_eq!(delivery.status, DeliveryStatus::Delivered);
    assert!(delivery.delivered_at.is_some());

    // Duplicate callback is a no-op
    manager.mark_delivered("msg-123").unwrap();
}

#[test]
fn test_delivery_callback_for_unknown_message_is_ignored() {
    let manager = create_test_manager();
    manager.mark_delivered("never-seen").unwrap();
}

#[test]
fn test_failed_channel_can_be_retried() {
    let manager = create_test_manager();
    let list = create_test_list(&manager);
    let entry = check_in_named(&manager, &list, "Alice");

    manager.call(BUSINESS, &entry.id, &[Channel::Whatsapp]).unwrap();
    let failed = manager
        .mark_channel_failed(&entry.id, Channel::Whatsapp, "gateway timeout")
        .unwrap();
    let delivery = failed.delivery(Channel::Whatsapp).unwrap();
    assert_eq!(delivery.status, DeliveryStatus::Failed);
    assert_eq!(delivery.error.as_deref(), Some("gateway timeout"));

    let reset = manager
        .reset_channel_for_retry(BUSINESS, &entry.id, Channel::Whatsapp)
        .unwrap();
    assert_eq!(
        reset.delivery(Channel::Whatsapp).unwrap().status,
        DeliveryStatus::Pending
    );

    // Retry succeeds this time; the error is cleared
    let sent = manager
        .mark_channel_sent(&entry.id, Channel::Whatsapp, "msg-retry-1")
        .unwrap();
    let delivery = sent.delivery(Channel::Whatsapp).unwrap();
    assert_eq!(delivery.status, DeliveryStatus::Sent);
    assert!(delivery.error.is_none());
}

#[test]
fn test_repeated_call_keeps_first_notified_at() {
    let manager = create_test_manager();
    let list = create_test_list(&manager);
    let entry = check_in_named(&manager, &list, "Alice");

    let first = manager.call(BUSINESS, &entry.id, &[Channel::Sms]).unwrap();
    // A second call is illegal (notified -> notified); notified_at survives
    // through the rest of the lifecycle instead
    let seated = manager.seat(BUSINESS, &entry.id).unwrap();
    assert_eq!(seated.notified_at, first.notified_at);
}

// ========================================================================
// Customer self-service
// ========================================================================

#[test]
fn test_cancel_by_token() {
    let manager = create_test_manager();
    let list = create_test_list(&manager);
    let entry = check_in_named(&manager, &list, "Alice");

    let cancelled = manager.cancel_by_token(&entry.token).unwrap();
    assert_eq!(cancelled.status, EntryStatus::Cancelled);

    // Cancelling again is a conflict, not a silent success
    let err = manager.cancel_by_token(&entry.token).unwrap_err();
    assert!(matches!(err, ManagerError::InvalidTransition { .. }));
}

#[test]
fn test_personal_view_tracks_position() {
    let manager = create_test_manager();
    let list = create_test_list(&manager);

    let a = check_in_named(&manager, &list, "Alice");
    let b = check_in_named(&manager, &list, "Bob");

    let view = manager.personal_view(&b.token).unwrap().unwrap();
    assert_eq!(view.ticket_number, 2);
    assert_eq!(view.queue_position, Some(2));

    manager.call(BUSINESS, &a.id, &[]).unwrap();
    manager.seat(BUSINESS, &a.id).unwrap();

    let view = manager.personal_view(&b.token).unwrap().unwrap();
    assert_eq!(view.queue_position, Some(1));

    assert!(manager.personal_view("bogus-token").unwrap().is_none());
}

// ========================================================================
// Public display and kiosk
// ========================================================================

#[test]
fn test_display_view_masks_names() {
    let manager = create_test_manager();
    let mut list = create_test_list(&manager);
    list = manager
        .update_list(
            BUSINESS,
            &list.id,
            WaitlistUpdate {
                display_options: Some(shared::models::DisplayOptions {
                    show_names: true,
                    show_party_size: true,
                    up_next_limit: 5,
                }),
                ..Default::default()
            },
        )
        .unwrap();

    let a = check_in_named(&manager, &list, "Alice Garcia");
    check_in_named(&manager, &list, "Bob");
    manager.call(BUSINESS, &a.id, &[]).unwrap();

    let view = manager.display_view(&list.display_token).unwrap().unwrap();
    let now_serving = view.now_serving.unwrap();
    assert_eq!(now_serving.ticket_number, 1);
    assert_eq!(now_serving.name.as_deref(), Some("Alice G."));
    assert_eq!(view.up_next.len(), 1);
    assert_eq!(view.up_next[0].ticket_number, 2);
}

#[test]
fn test_display_view_respects_disabled_flag() {
    let manager = create_test_manager();
    let list = create_test_list(&manager);

    manager
        .update_list(
            BUSINESS,
            &list.id,
            WaitlistUpdate {
                display_enabled: Some(false),
                ..Default::default()
            },
        )
        .unwrap();

    assert!(manager.display_view(&list.display_token).unwrap().is_none());
    assert!(manager.display_view("bogus").unwrap().is_none());
}

#[test]
fn test_kiosk_list_requires_kiosk_enabled() {
    let manager = create_test_manager();
    let list = create_test_list(&manager);

    assert!(manager.kiosk_list(&list.display_token).unwrap().is_some());

    manager
        .update_list(
            BUSINESS,
            &list.id,
            WaitlistUpdate {
                kiosk_enabled: Some(false),
                ..Default::default()
            },
        )
        .unwrap();
    assert!(manager.kiosk_list(&list.display_token).unwrap().is_none());
}

// ========================================================================
// Loyalty
// ========================================================================

#[test]
fn test_returning_customer_recognized_by_phone() {
    let manager = create_test_manager();
    let list = create_test_list(&manager);

    let first = manager
        .check_in(
            &list,
            CheckInInput {
                name: Some("Alice".to_string()),
                phone: Some("+34 600 999 888".to_string()),
                ..Default::default()
            },
        )
        .unwrap();
    assert_eq!(first.visits_count, 1);
    assert!(!first.is_returning);
    // Stored normalized
    assert_eq!(first.phone.as_deref(), Some("+34600999888"));

    manager.archive(BUSINESS, &first.id).unwrap();

    let second = manager
        .check_in(
            &list,
            CheckInInput {
                name: Some("Alice".to_string()),
                phone: Some("+34600999888".to_string()),
                ..Default::default()
            },
        )
        .unwrap();
    assert_eq!(second.visits_count, 2);
    assert!(second.is_returning);
}

// ========================================================================
// Change feed
// ========================================================================

#[test]
fn test_mutations_emit_change_feed_events() {
    let manager = create_test_manager();
    let list = create_test_list(&manager);
    let mut rx = manager.subscribe_changes();

    let entry = check_in_named(&manager, &list, "Alice");

    let change = rx.try_recv().unwrap();
    assert_eq!(change.list_id, list.id);
    assert_eq!(change.display_token, list.display_token);
    assert_eq!(change.entry_token.as_deref(), Some(entry.token.as_str()));

    manager.call(BUSINESS, &entry.id, &[]).unwrap();
    assert!(rx.try_recv().is_ok());
}
