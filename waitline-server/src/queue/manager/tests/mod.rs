use super::*;
use shared::models::ListType;

mod test_boundary;
mod test_flows;

fn create_test_manager() -> WaitlistManager {
    WaitlistManager::in_memory()
}

const BUSINESS: &str = "biz-1";

fn create_test_list(manager: &WaitlistManager) -> Waitlist {
    manager
        .create_list(
            BUSINESS,
            WaitlistCreate {
                location_id: "loc-1".to_string(),
                name: "Main Dining".to_string(),
                list_type: ListType::EatIn,
                accepts_name: true,
                accepts_phone: true,
                accepts_email: false,
                seating_options: vec!["booth".to_string(), "bar".to_string()],
                kiosk_enabled: true,
                display_enabled: true,
                display_options: None,
                average_wait_override: None,
            },
        )
        .unwrap()
}

fn check_in_named(manager: &WaitlistManager, list: &Waitlist, name: &str) -> WaitlistEntry {
    manager
        .check_in(
            list,
            CheckInInput {
                name: Some(name.to_string()),
                phone: Some("+34600111222".to_string()),
                party_size: Some(2),
                ..Default::default()
            },
        )
        .unwrap()
}
