// Wire formats spoken with the remote services.

pub mod store;
