use async_trait::async_trait;
use ferrous_filters_application::ports::RuleStorage;
use ferrous_filters_domain::{DomainError, FilterId};
use std::io::ErrorKind;
use std::path::PathBuf;
use tracing::{debug, error, instrument};

/// One `{filter_id}.txt` per filter under a directory. Writes go to a
/// temporary file that is renamed over the target.
pub struct FileRuleStorage {
    dir: PathBuf,
}

impl FileRuleStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn rules_path(&self, filter_id: FilterId) -> PathBuf {
        self.dir.join(format!("{}.txt", filter_id))
    }
}

#[async_trait]
impl RuleStorage for FileRuleStorage {
    #[instrument(skip(self))]
    async fn read(&self, filter_id: FilterId) -> Result<Option<Vec<String>>, DomainError> {
        let path = self.rules_path(filter_id);
        match tokio::fs::read_to_string(&path).await {
            Ok(contents) => Ok(Some(
                contents.split_terminator('\n').map(str::to_string).collect(),
            )),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => {
                error!(error = %e, path = %path.display(), "Failed to read rules");
                Err(DomainError::StorageError(format!("{}: {}", path.display(), e)))
            }
        }
    }

    #[instrument(skip(self, rules), fields(rules = rules.len()))]
    async fn write(&self, filter_id: FilterId, rules: &[String]) -> Result<(), DomainError> {
        let storage_error = |e: std::io::Error| {
            error!(error = %e, filter_id, "Failed to write rules");
            DomainError::StorageError(format!("filter {}: {}", filter_id, e))
        };

        tokio::fs::create_dir_all(&self.dir).await.map_err(storage_error)?;

        let path = self.rules_path(filter_id);
        let tmp_path = self.dir.join(format!(".{}.txt.tmp", filter_id));
        // One `\n` per line, the last included.
        let mut contents = String::with_capacity(rules.iter().map(|r| r.len() + 1).sum());
        for rule in rules {
            contents.push_str(rule);
            contents.push('\n');
        }
        tokio::fs::write(&tmp_path, contents)
            .await
            .map_err(storage_error)?;
        tokio::fs::rename(&tmp_path, &path)
            .await
            .map_err(storage_error)?;

        debug!(path = %path.display(), "Rules written");
        Ok(())
    }
}
