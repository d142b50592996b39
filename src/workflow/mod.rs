//! Review workflow rules that sit between the HTTP handlers and the store.

pub mod caption;
pub mod draft;
pub mod feed;
pub mod gamification;
pub mod platform;
pub mod points;
pub mod wizard;
