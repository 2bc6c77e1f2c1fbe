//! Import options resolution

use crate::store::CurrentUserProvider;
use relimport_core::ImportOptions;
use tracing::debug;

/// Fills in whatever a caller left out of its import options
pub struct ImportOptionsResolver<U> {
    users: U,
    defaults: ImportOptions,
}

impl<U: CurrentUserProvider> ImportOptionsResolver<U> {
    pub fn new(users: U) -> Self {
        Self {
            users,
            defaults: ImportOptions::default(),
        }
    }

    /// Builder: options used when a caller passes none
    pub fn with_defaults(mut self, defaults: ImportOptions) -> Self {
        self.defaults = defaults;
        self
    }

    /// Return fully populated options; the session is only consulted when no
    /// user was given.
    pub fn resolve(&self, options: Option<ImportOptions>) -> ImportOptions {
        let mut options = options.unwrap_or_else(|| self.defaults.clone());

        if options.user.is_none() {
            options.user = self.users.current_user();
            debug!("Attributing import to session user {:?}", options.username());
        }

        options
    }
}
