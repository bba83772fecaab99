use anyhow::Result;
use async_trait::async_trait;

use super::{CommandHandler, CommandResult};
use crate::manifest::{Manifest, ManifestError};

/// Handler for the `init` command
pub struct InitCommand {
    pub manifest: Manifest,
    pub force: bool,
}

impl InitCommand {
    pub fn new(manifest: Manifest, force: bool) -> Self {
        Self { manifest, force }
    }
}

#[async_trait(?Send)]
impl CommandHandler for InitCommand {
    async fn execute(&self) -> Result<CommandResult> {
        let path = self.manifest.path().display().to_string();

        match self.manifest.create_template(self.force) {
            Ok(()) => {
                println!("✅ Created {path}");
                println!("Add your packages (one per line), then run `reqinstall install`");
                Ok(CommandResult::Success(None))
            }
            Err(ManifestError::AlreadyExists(_)) => Ok(CommandResult::Error(format!(
                "{path} already exists (use --force to overwrite it)"
            ))),
            Err(e) => Err(e.into()),
        }
    }

    fn name(&self) -> &'static str {
        "init"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::MANIFEST_TEMPLATE;
    use std::fs;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_init_writes_template() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("requirements.txt");

        let result = InitCommand::new(Manifest::new(&path), false)
            .execute()
            .await
            .unwrap();

        assert_eq!(result, CommandResult::Success(None));
        assert_eq!(fs::read_to_string(&path).unwrap(), MANIFEST_TEMPLATE);
    }

    #[tokio::test]
    async fn test_init_keeps_existing_manifest_without_force() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("requirements.txt");
        fs::write(&path, "express\n").unwrap();

        let result = InitCommand::new(Manifest::new(&path), false)
            .execute()
            .await
            .unwrap();
        assert_eq!(result.exit_code(), 1);
        assert_eq!(fs::read_to_string(&path).unwrap(), "express\n");

        let result = InitCommand::new(Manifest::new(&path), true)
            .execute()
            .await
            .unwrap();
        assert_eq!(result.exit_code(), 0);
        assert_eq!(fs::read_to_string(&path).unwrap(), MANIFEST_TEMPLATE);
    }
}
