//! Client-side checks run before anything is sent to the backend

use regex::Regex;
use std::sync::OnceLock;

use crate::models::VideoUpload;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Please select a video file to simulate.")]
    MissingVideo,

    #[error("Please enter a valid phone number with country code (e.g., +1234567890).")]
    InvalidPhoneNumber(String),
}

fn phone_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^\+[0-9]{10,15}$").expect("phone pattern is valid"))
}

/// `+` followed by 10 to 15 digits
pub fn is_valid_phone_number(phone: &str) -> bool {
    phone_pattern().is_match(phone)
}

pub fn validate_phone_number(phone: &str) -> Result<(), ValidationError> {
    if is_valid_phone_number(phone) {
        Ok(())
    } else {
        Err(ValidationError::InvalidPhoneNumber(phone.to_string()))
    }
}

/// A live-simulation request that passed validation
#[derive(Debug, Clone)]
pub struct SimulationRequest {
    video: VideoUpload,
    phone_number: String,
}

impl SimulationRequest {
    /// File presence is checked before the phone number
    pub fn new(video: Option<VideoUpload>, phone_number: &str) -> Result<Self, ValidationError> {
        let video = video.ok_or(ValidationError::MissingVideo)?;
        validate_phone_number(phone_number)?;

        Ok(Self {
            video,
            phone_number: phone_number.to_string(),
        })
    }

    pub fn video(&self) -> &VideoUpload {
        &self.video
    }

    pub fn phone_number(&self) -> &str {
        &self.phone_number
    }

    pub fn into_parts(self) -> (VideoUpload, String) {
        (self.video, self.phone_number)
    }
}
