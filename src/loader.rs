use crate::config::LoaderConfig;
use crate::error::LoadError;
use crate::models::{self, ModelHandle};

/// Loads the fare model named by a [`LoaderConfig`].
///
/// Holds no state besides the configuration: every [`load`](Self::load)
/// re-reads the artifact and hands back an independent handle.
#[derive(Clone, Debug)]
pub struct ArtifactLoader {
    config: LoaderConfig,
}

impl ArtifactLoader {
    pub fn new(config: LoaderConfig) -> Self {
        Self { config }
    }

    pub fn from_env() -> Self {
        Self::new(LoaderConfig::from_env())
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    pub fn load(&self) -> Result<ModelHandle, LoadError> {
        models::load_model(self.config.model_path())
    }
}

pub fn load_model(config: &LoaderConfig) -> Result<ModelHandle, LoadError> {
    ArtifactLoader::new(config.clone()).load()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn default_path_absent_is_not_found() {
        // Only meaningful where nothing is deployed at /app.
        if Path::new(crate::config::DEFAULT_MODEL_PATH).exists() {
            return;
        }
        let loader = ArtifactLoader::new(LoaderConfig::from_lookup(|_| None));
        match loader.load() {
            Err(LoadError::NotFound { path }) => {
                assert_eq!(path, Path::new("/app/model.pkl"));
            }
            other => panic!("expected NotFound, got {:?}", other),
        }
    }

    #[test]
    fn loader_keeps_the_resolved_config() {
        let config = LoaderConfig::new("/srv/models/fare.bin");
        let loader = ArtifactLoader::new(config.clone());
        assert_eq!(loader.config(), &config);
        assert_eq!(
            loader.config().model_path(),
            Path::new("/srv/models/fare.bin")
        );
    }

    #[test]
    fn directory_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_model(&LoaderConfig::new(dir.path())).unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }), "got {:?}", err);
    }
}
