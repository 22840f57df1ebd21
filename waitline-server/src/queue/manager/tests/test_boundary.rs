use super::*;

// ========================================================================
// Check-in validation
// ========================================================================

#[test]
fn test_check_in_requires_configured_fields() {
    let manager = create_test_manager();
    let list = create_test_list(&manager);

    let err = manager
        .check_in(
            &list,
            CheckInInput {
                name: Some("Alice".to_string()),
                phone: None,
                ..Default::default()
            },
        )
        .unwrap_err();
    assert!(matches!(err, ManagerError::Validation(_)));

    let err = manager
        .check_in(
            &list,
            CheckInInput {
                name: None,
                phone: Some("+34600111222".to_string()),
                ..Default::default()
            },
        )
        .unwrap_err();
    assert!(matches!(err, ManagerError::Validation(_)));
}

#[test]
fn test_check_in_rejects_malformed_phone() {
    let manager = create_test_manager();
    let list = create_test_list(&manager);

    for bad in ["12", "not a phone", "+340012345678901234"] {
        let err = manager
            .check_in(
                &list,
                CheckInInput {
                    name: Some("Alice".to_string()),
                    phone: Some(bad.to_string()),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert!(matches!(err, ManagerError::Validation(_)), "accepted {bad:?}");
    }
}

#[test]
fn test_check_in_rejects_unknown_seating_preference() {
    let manager = create_test_manager();
    let list = create_test_list(&manager);

    let err = manager
        .check_in(
            &list,
            CheckInInput {
                name: Some("Alice".to_string()),
                phone: Some("+34600111222".to_string()),
                seating_preference: Some("rooftop".to_string()),
                ..Default::default()
            },
        )
        .unwrap_err();
    assert!(matches!(err, ManagerError::Validation(_)));
}

#[test]
fn test_check_in_ignores_fields_the_list_does_not_collect() {
    let manager = create_test_manager();
    let mut list = create_test_list(&manager);
    list = manager
        .update_list(
            BUSINESS,
            &list.id,
            WaitlistUpdate {
                accepts_name: Some(false),
                accepts_phone: Some(false),
                ..Default::default()
            },
        )
        .unwrap();

    let entry = manager
        .check_in(
            &list,
            CheckInInput {
                name: Some("Alice".to_string()),
                phone: Some("+34600111222".to_string()),
                ..Default::default()
            },
        )
        .unwrap();
    assert!(entry.name.is_none());
    assert!(entry.phone.is_none());
    // No phone recorded means no loyalty history either
    assert_eq!(entry.visits_count, 0);
}

// ========================================================================
// Transition legality
// ========================================================================

#[test]
fn test_seat_requires_prior_call() {
    let manager = create_test_manager();
    let list = create_test_list(&manager);
    let entry = check_in_named(&manager, &list, "Alice");

    let err = manager.seat(BUSINESS, &entry.id).unwrap_err();
    assert!(matches!(
        err,
        ManagerError::InvalidTransition {
            from: EntryStatus::Waiting,
            ..
        }
    ));
}

#[test]
fn test_no_show_requires_notified() {
    let manager = create_test_manager();
    let list = create_test_list(&manager);
    let entry = check_in_named(&manager, &list, "Alice");

    // Waiting -> Archived is legal in general, but not as a no-show
    let err = manager.no_show(BUSINESS, &entry.id).unwrap_err();
    assert!(matches!(err, ManagerError::InvalidTransition { .. }));
}

#[test]
fn test_terminal_entries_reject_everything() {
    let manager = create_test_manager();
    let list = create_test_list(&manager);
    let entry = check_in_named(&manager, &list, "Alice");

    manager.call(BUSINESS, &entry.id, &[]).unwrap();
    manager.seat(BUSINESS, &entry.id).unwrap();

    assert!(manager.call(BUSINESS, &entry.id, &[]).is_err());
    assert!(manager.archive(BUSINESS, &entry.id).is_err());
    assert!(manager.cancel_by_token(&entry.token).is_err());
}

#[test]
fn test_edit_rejected_after_seated() {
    let manager = create_test_manager();
    let list = create_test_list(&manager);
    let entry = check_in_named(&manager, &list, "Alice");

    manager.call(BUSINESS, &entry.id, &[]).unwrap();
    manager.seat(BUSINESS, &entry.id).unwrap();

    let err = manager
        .update_entry(
            BUSINESS,
            &entry.id,
            EntryUpdate {
                party_size: Some(4),
                ..Default::default()
            },
        )
        .unwrap_err();
    assert!(matches!(
        err,
        ManagerError::InvalidTransition {
            from: EntryStatus::Seated,
            ..
        }
    ));
}

#[test]
fn test_edit_keeps_ticket_number() {
    let manager = create_test_manager();
    let list = create_test_list(&manager);
    check_in_named(&manager, &list, "Alice");
    let entry = check_in_named(&manager, &list, "Bob");

    let edited = manager
        .update_entry(
            BUSINESS,
            &entry.id,
            EntryUpdate {
                name: Some("Robert".to_string()),
                party_size: Some(6),
                ..Default::default()
            },
        )
        .unwrap();
    assert_eq!(edited.name.as_deref(), Some("Robert"));
    assert_eq!(edited.party_size, Some(6));
    assert_eq!(edited.ticket_number, entry.ticket_number);
    assert_eq!(edited.created_at, entry.created_at);
}

// ========================================================================
// Delivery-state conflicts
// ========================================================================

#[test]
fn test_retry_rejected_unless_failed() {
    let manager = create_test_manager();
    let list = create_test_list(&manager);
    let entry = check_in_named(&manager, &list, "Alice");
    manager.call(BUSINESS, &entry.id, &[Channel::Sms]).unwrap();

    // Still pending
    let err = manager
        .reset_channel_for_retry(BUSINESS, &entry.id, Channel::Sms)
        .unwrap_err();
    assert!(matches!(
        err,
        ManagerError::ChannelState {
            status: DeliveryStatus::Pending,
            ..
        }
    ));

    // Already handed off
    manager
        .mark_channel_sent(&entry.id, Channel::Sms, "msg-1")
        .unwrap();
    let err = manager
        .reset_channel_for_retry(BUSINESS, &entry.id, Channel::Sms)
        .unwrap_err();
    assert!(matches!(
        err,
        ManagerError::ChannelState {
            status: DeliveryStatus::Sent,
            ..
        }
    ));
}

#[test]
fn test_channel_ops_require_seeded_channel() {
    let manager = create_test_manager();
    let list = create_test_list(&manager);
    let entry = check_in_named(&manager, &list, "Alice");
    manager.call(BUSINESS, &entry.id, &[Channel::Sms]).unwrap();

    let err = manager
        .mark_channel_failed(&entry.id, Channel::Whatsapp, "boom")
        .unwrap_err();
    assert!(matches!(err, ManagerError::NotFound(_)));
}

// ========================================================================
// Tenant scoping
// ========================================================================

#[test]
fn test_other_business_sees_nothing() {
    let manager = create_test_manager();
    let list = create_test_list(&manager);
    let entry = check_in_named(&manager, &list, "Alice");

    assert!(matches!(
        manager.get_list("biz-2", &list.id).unwrap_err(),
        ManagerError::NotFound(_)
    ));
    assert!(matches!(
        manager.call("biz-2", &entry.id, &[]).unwrap_err(),
        ManagerError::NotFound(_)
    ));
    assert!(matches!(
        manager.clear_list("biz-2", &list.id).unwrap_err(),
        ManagerError::NotFound(_)
    ));
    assert!(manager.lists("biz-2").unwrap().is_empty());
}

#[test]
fn test_empty_list_name_rejected() {
    let manager = create_test_manager();
    let err = manager
        .create_list(
            BUSINESS,
            WaitlistCreate {
                location_id: "loc-1".to_string(),
                name: "   ".to_string(),
                list_type: ListType::EatIn,
                accepts_name: true,
                accepts_phone: true,
                accepts_email: false,
                seating_options: vec![],
                kiosk_enabled: false,
                display_enabled: false,
                display_options: None,
                average_wait_override: None,
            },
        )
        .unwrap_err();
    assert!(matches!(err, ManagerError::Validation(_)));
}
