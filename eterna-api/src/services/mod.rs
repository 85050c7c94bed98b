pub mod analytics;
pub mod auth_service;
pub mod chat;
pub mod discovery;
pub mod matching;
pub mod moderation;
pub mod notification_service;
pub mod photos;
pub mod premium;
pub mod profile_service;
pub mod quota;
pub mod settings;
