use super::Action;
use crate::{backend::StorageBackend, cache::Cache};
use anyhow::Context;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

/// Execute the action's business logic against a freshly built cache
pub async fn execute(action: Action) -> anyhow::Result<()> {
    match action {
        Action::Get {
            options,
            key,
            output,
        } => {
            let cache = Cache::from_options(&options).await?;
            let data = cache.get(&key).await?;

            if let Some(path) = output {
                tokio::fs::write(&path, &data)
                    .await
                    .with_context(|| format!("Failed to write {}", path.display()))?;
            } else {
                let mut stdout = tokio::io::stdout();
                stdout.write_all(&data).await?;
                stdout.flush().await?;
            }
        }

        Action::Put {
            options,
            key,
            input,
        } => {
            let data = match input {
                Some(path) => tokio::fs::read(&path)
                    .await
                    .with_context(|| format!("Failed to read {}", path.display()))?,
                None => {
                    let mut buffer = Vec::new();
                    tokio::io::stdin().read_to_end(&mut buffer).await?;
                    buffer
                }
            };

            let cache = Cache::from_options(&options).await?;
            cache.put(&key, &data).await?;
        }

        Action::Delete { options, key } => {
            let cache = Cache::from_options(&options).await?;
            cache.delete(&key).await?;
        }
    }

    Ok(())
}
