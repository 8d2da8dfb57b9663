//! library-catalog
//!
//! Layers: domain (Book / Catalog) → infra (JSON file) → application
//! (CatalogService) → interface (menu, MCP, CLI).

pub mod domain {
    pub mod error;
    pub mod model {
        pub mod book;
        pub mod catalog;
    }
    pub mod repository;
}

pub mod infra {
    pub mod json_store;
}

pub mod application {
    pub mod error;
    pub mod service;
}

pub mod interface {
    pub mod cli;
    pub mod mcp;
    pub mod menu;
}
