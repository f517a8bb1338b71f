//! Service container for dependency injection
//!
//! Wires up all services with their dependencies.

use std::sync::Arc;

use crate::application::services::{DispatchService, InputResolver, OutputService};
use crate::config::Settings;
use crate::infrastructure::eapi::HttpEapiConnector;
use crate::infrastructure::traits::{
    Console, EapiConnector, FileSystem, Prompter, RealFileSystem, StdinPrompter, StdoutConsole,
};

/// Container holding all application services.
pub struct ServiceContainer {
    /// Application settings
    pub settings: Arc<Settings>,

    /// Filesystem abstraction
    pub fs: Arc<dyn FileSystem>,

    /// Interactive input
    pub prompter: Arc<dyn Prompter>,

    /// Standard output sink
    pub console: Arc<dyn Console>,

    /// Opens switch sessions
    pub connector: Arc<dyn EapiConnector>,
}

impl ServiceContainer {
    /// Create a new service container with real implementations.
    pub fn new(settings: Settings) -> Self {
        let connector = Arc::new(HttpEapiConnector::new(settings.eapi.clone()));
        Self::with_deps(
            settings,
            Arc::new(RealFileSystem),
            Arc::new(StdinPrompter),
            Arc::new(StdoutConsole),
            connector,
        )
    }

    /// Create a service container with custom dependencies (for testing).
    pub fn with_deps(
        settings: Settings,
        fs: Arc<dyn FileSystem>,
        prompter: Arc<dyn Prompter>,
        console: Arc<dyn Console>,
        connector: Arc<dyn EapiConnector>,
    ) -> Self {
        let settings = Arc::new(settings);

        Self {
            settings,
            fs,
            prompter,
            console,
            connector,
        }
    }

    pub fn input_resolver(&self) -> InputResolver {
        InputResolver::new(self.fs.clone(), self.prompter.clone())
    }

    pub fn dispatch_service(&self) -> DispatchService {
        DispatchService::new(self.connector.clone())
    }

    pub fn output_service(&self) -> OutputService {
        OutputService::new(self.fs.clone(), self.console.clone())
    }
}
