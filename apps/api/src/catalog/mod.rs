//! Subject and faculty-preference management endpoints over the Domain Store.

pub mod handlers;
