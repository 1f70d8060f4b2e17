//! # taskminder-messaging
//!
//! Outbound message delivery. The dispatcher depends only on the
//! [`MessagingGateway`] trait; [`WhatsAppClient`] implements it against the
//! WhatsApp Cloud (Graph) API.

pub mod error;
pub mod gateway;
pub mod message;
pub mod whatsapp;

pub use error::DeliveryError;
pub use gateway::MessagingGateway;
pub use message::TemplateMessage;
pub use whatsapp::WhatsAppClient;
