mod run;

use crate::options::CacheOptions;
use std::path::PathBuf;

/// Action enum representing each possible command
#[derive(Debug)]
pub enum Action {
    Get {
        options: CacheOptions,
        key: String,
        output: Option<PathBuf>,
    },
    Put {
        options: CacheOptions,
        key: String,
        input: Option<PathBuf>,
    },
    Delete {
        options: CacheOptions,
        key: String,
    },
}

impl Action {
    /// Execute the action
    ///
    /// # Errors
    ///
    /// Returns an error if the action fails to execute
    pub async fn execute(self) -> anyhow::Result<()> {
        run::execute(self).await
    }
}
