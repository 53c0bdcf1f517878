pub mod config;
pub mod deploy;
pub mod error;
pub mod mirror;
pub mod sftp;

pub use config::{AuthMethod, DeployConfig};
pub use deploy::{deploy, mirror_and_disconnect};
pub use error::{Error, Result};
pub use mirror::{mirror, Transport};
pub use sftp::SshSession;
