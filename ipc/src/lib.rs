// This crate centralizes the wire definitions shared by the chat widget and the chat proxy.

pub mod chat_request; // For widget <-> proxy communication over POST /api/chat
