pub mod allocator;
pub mod config;
pub mod controllers;
pub mod database;
pub mod error;
pub mod extract;
pub mod media;
pub mod middleware;
pub mod models;
pub mod pagination;
pub mod store;

use std::sync::Arc;

use allocator::SeatAllocator;
use store::{CatalogStore, ReservationLedger, SessionRegistry, UserDirectory};

// Shared state for the whole application.
#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<dyn CatalogStore>,
    pub sessions: Arc<dyn SessionRegistry>,
    pub ledger: Arc<dyn ReservationLedger>,
    pub users: Arc<dyn UserDirectory>,
    pub allocator: SeatAllocator,
    pub config: config::Config,
}

impl AppState {
    /// Wires one storage backend into shared state. The backend is a single
    /// value implementing all four store traits; each field gets its own
    /// handle onto it, so handlers only ever name the facet they need.
    pub fn new<S>(store: Arc<S>, config: config::Config) -> Arc<Self>
    where
        S: CatalogStore + SessionRegistry + ReservationLedger + UserDirectory + 'static,
    {
        let sessions: Arc<dyn SessionRegistry> = store.clone();
        let ledger: Arc<dyn ReservationLedger> = store.clone();
        let allocator = SeatAllocator::new(sessions.clone(), ledger.clone());
        Arc::new(Self {
            catalog: store.clone(),
            sessions,
            ledger,
            users: store,
            allocator,
            config,
        })
    }
}
