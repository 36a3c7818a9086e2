use std::sync::Arc;

use crate::application::ports::address_builder::AddressBuilder;
use crate::application::ports::book_repository::BookRepository;
use crate::application::ports::document_repository::DocumentRepository;
use crate::application::ports::history_repository::HistoryRepository;
use crate::application::ports::storage_port::StoragePort;
use crate::bootstrap::config::Config;

#[derive(Clone)]
pub struct AppContext {
    pub cfg: Config,
    services: Arc<AppServices>,
}

#[derive(Clone)]
pub struct AppServices {
    document_repo: Arc<dyn DocumentRepository>,
    book_repo: Arc<dyn BookRepository>,
    history_repo: Arc<dyn HistoryRepository>,
    storage_port: Arc<dyn StoragePort>,
    address_builder: Arc<dyn AddressBuilder>,
}

impl AppServices {
    pub fn new(
        document_repo: Arc<dyn DocumentRepository>,
        book_repo: Arc<dyn BookRepository>,
        history_repo: Arc<dyn HistoryRepository>,
        storage_port: Arc<dyn StoragePort>,
        address_builder: Arc<dyn AddressBuilder>,
    ) -> Self {
        Self {
            document_repo,
            book_repo,
            history_repo,
            storage_port,
            address_builder,
        }
    }
}

impl AppContext {
    pub fn new(cfg: Config, services: AppServices) -> Self {
        Self {
            cfg,
            services: Arc::new(services),
        }
    }

    pub fn document_repo(&self) -> Arc<dyn DocumentRepository> {
        self.services.document_repo.clone()
    }

    pub fn book_repo(&self) -> Arc<dyn BookRepository> {
        self.services.book_repo.clone()
    }

    pub fn history_repo(&self) -> Arc<dyn HistoryRepository> {
        self.services.history_repo.clone()
    }

    pub fn storage_port(&self) -> Arc<dyn StoragePort> {
        self.services.storage_port.clone()
    }

    pub fn address_builder(&self) -> Arc<dyn AddressBuilder> {
        self.services.address_builder.clone()
    }
}
