// Registry module - authentication and listing against a remote registry
//
// Callers build a `Registry`, resolve its credentials (flags, password file or
// the credential store), validate it, and hand it to a lister obtained from the
// `Factory`. Each lister call authenticates every request it makes.

pub mod auth;
pub mod credentials;
pub mod error;
pub mod factory;
pub mod models;
mod pagination;
pub mod repositories;
pub mod tags;

#[cfg(test)]
mod test_support;

pub use auth::{get_token, set_auth, Endpoint};
pub use credentials::{
    credentials_from_reader, read_credentials, read_credentials_from, ResolvedCredentials,
};
pub use error::{RegistryError, Result};
pub use factory::{ClientOptions, Factory};
pub use models::{
    Registry, RegistryName, RegistryPassword, RegistryToken, RegistryUsername, Repository, Tag,
    HUB_NAME, HUB_URL,
};
pub use repositories::RepositoryLister;
pub use tags::TagLister;
