//! Wire types shared between the flyjar server and its clients.

pub mod api;
