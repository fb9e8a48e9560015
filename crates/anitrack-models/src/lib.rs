//! Core data models for Anitrack.
//!
//! This crate provides the fundamental data types shared by the stores,
//! the catalog client and the notification engine: subscribers,
//! subscriptions and catalog titles.

pub mod ids;
pub mod subscriber;
pub mod subscription;
pub mod title;

// Re-export main types
pub use ids::{ChatId, SubscriptionId, TelegramId, TitleId, UserId};
pub use subscriber::{NewSubscriber, Subscriber};
pub use subscription::Subscription;
pub use title::{ReleaseStatus, Title};
