//! User contact profiles.

pub mod model;

pub use model::ContactProfile;
