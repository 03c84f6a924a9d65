//! Hand-off from onboarding to the client being licensed.

use crate::error::{LaunchError, LaunchResult};
use crate::session::UserId;
use async_trait::async_trait;
use std::path::PathBuf;
use tokio::process::Command;
use tracing::info;

/// Starts the licensed client with the credential a user supplied.
#[async_trait]
pub trait ClientLauncher: Send + Sync {
    async fn launch(&self, user: UserId, credential: String) -> LaunchResult<()>;
}

/// Spawns a program with the credential in an environment variable.
///
/// The child is not awaited.
#[derive(Debug, Clone)]
pub struct CommandLauncher {
    program: PathBuf,
    args: Vec<String>,
    credential_var: String,
}

impl CommandLauncher {
    pub fn new(program: impl Into<PathBuf>, credential_var: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            credential_var: credential_var.into(),
        }
    }

    #[must_use]
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }
}

#[async_trait]
impl ClientLauncher for CommandLauncher {
    async fn launch(&self, user: UserId, credential: String) -> LaunchResult<()> {
        if self.credential_var.is_empty() {
            return Err(LaunchError::Config("credential variable name is empty".to_string()));
        }

        let child = Command::new(&self.program)
            .args(&self.args)
            .env(&self.credential_var, credential)
            .kill_on_drop(false)
            .spawn()?;

        info!(
            "Launched {:?} for user {} (pid {:?})",
            self.program,
            user,
            child.id()
        );
        Ok(())
    }
}
