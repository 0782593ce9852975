pub mod client {
    pub mod api;
    pub mod bot;
    pub mod controller;
    pub mod poller;
    pub mod timer;
}

pub mod dto {
    pub mod champion_dto;
    pub mod draft_dto;
    pub mod sync_dto;
}

pub mod routes {
    pub mod draft;
}

pub mod services {
    pub mod champion_catalog;
    pub mod idempotency;
    pub mod session_store;
    pub mod turn_resolver;
}

pub use routes::draft::draft_router;
