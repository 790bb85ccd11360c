//! Embedded data tables
//!
//! `include_str!` puts the registered-user roster and the stadium layouts in
//! the binary, so a room can start with no data files next to it.

use once_cell::sync::Lazy;

use crate::users::RegisteredUser;

/// Default registered-user roster
pub const USERS_YAML: &str = include_str!("../../../../data/users.yaml");

pub const STADIUM_FUTSAL_1V1: &str = include_str!("../../../../data/stadiums/futsal_1v1.json");
pub const STADIUM_FUTSAL_2V2: &str = include_str!("../../../../data/stadiums/futsal_2v2.json");
pub const STADIUM_FUTSAL_5V5: &str = include_str!("../../../../data/stadiums/futsal_5v5.json");
pub const STADIUM_SNIPER: &str = include_str!("../../../../data/stadiums/sniper.json");
pub const STADIUM_TRAINING: &str = include_str!("../../../../data/stadiums/training.json");

static DEFAULT_USERS: Lazy<Vec<RegisteredUser>> = Lazy::new(|| {
    serde_yaml::from_str(USERS_YAML).unwrap_or_else(|e| {
        log::error!("Embedded user roster is invalid: {}", e);
        Vec::new()
    })
});

pub fn default_users() -> Vec<RegisteredUser> {
    DEFAULT_USERS.clone()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_roster_parses() {
        let users = default_users();
        assert!(users.len() >= 5);
        assert!(users.iter().all(|u| u.session_id.is_none()));
        assert!(users.iter().any(|u| u.super_admin));
    }

    #[test]
    fn test_embedded_stadiums_are_json() {
        for content in [
            STADIUM_FUTSAL_1V1,
            STADIUM_FUTSAL_2V2,
            STADIUM_FUTSAL_5V5,
            STADIUM_SNIPER,
            STADIUM_TRAINING,
        ] {
            let value: serde_json::Value = serde_json::from_str(content).unwrap();
            assert!(value["name"].is_string());
        }
    }
}
