//! List the repositories and tags hosted on a remote container registry.
//!
//! ```rust,ignore
//! use docker_remote::{ClientOptions, Factory, Registry};
//!
//! let mut registry = Registry::new("registry.example.com", "", "");
//! registry.read_credentials_from_docker_config()?;
//! registry.validate()?;
//!
//! let factory = Factory::new(ClientOptions::default())?;
//! for repository in factory.repositories().list(&registry).await? {
//!     println!("{}", repository);
//! }
//! ```

pub mod registry;

pub use registry::{
    ClientOptions, Factory, Registry, RegistryError, RegistryName, RegistryPassword,
    RegistryUsername, Repository, Tag,
};
