use std::time::Duration;

use crate::session::DEFAULT_LOG_CAPACITY;

/// Pause between handshake writes.
pub const DEFAULT_STEP_DELAY: Duration = Duration::from_millis(300);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Gender {
    Female,
    Male,
}

impl Gender {
    pub fn code(&self) -> u8 {
        match self {
            Gender::Female => 0,
            Gender::Male => 1,
        }
    }
}

/// Wearer profile sent during the handshake.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UserProfile {
    pub gender: Gender,
    pub age: u8,
    pub height_cm: u8,
    pub weight_kg: u8,
    pub step_goal: u16,
}

impl UserProfile {
    /// `[gender, age, height, weight, goal_hi, goal_lo]`
    pub fn to_payload(&self) -> [u8; 6] {
        let [goal_hi, goal_lo] = self.step_goal.to_be_bytes();
        [
            self.gender.code(),
            self.age,
            self.height_cm,
            self.weight_kg,
            goal_hi,
            goal_lo,
        ]
    }
}

impl Default for UserProfile {
    fn default() -> Self {
        Self {
            gender: Gender::Male,
            age: 30,
            height_cm: 175,
            weight_kg: 70,
            step_goal: 10_000,
        }
    }
}

/// Settings for one [`Link`](crate::connection::Link).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LinkConfig {
    pub step_delay: Duration,
    pub log_capacity: usize,
    pub profile: UserProfile,
    pub language_code: u8,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            step_delay: DEFAULT_STEP_DELAY,
            log_capacity: DEFAULT_LOG_CAPACITY,
            profile: UserProfile::default(),
            language_code: 0x01,
        }
    }
}
