//! Executable resolution: persisted preference, then registry, then prompt.

use std::path::PathBuf;
use std::sync::Arc;

use labhost_core::{
    EXECUTABLE_PATH_KEY, ExecutableRef, FilePrompt, FilePromptOptions, LabhostConfig,
    PreferenceStore, WindowHandle,
};
use tracing::{debug, info, warn};

use super::fs::{FsProvider, SystemFs};
use super::registry::candidate_environments;

/// Which tier produced a resolved executable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveSource {
    /// Previously saved in the preference store.
    Persisted,
    /// First matching environment in the registry file.
    Registry,
    /// Chosen (or cancelled) in the file prompt.
    Prompt,
}

/// Result of a resolution, with the tier that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolveOutcome {
    pub executable: ExecutableRef,
    pub source: ResolveSource,
}

/// Finds the notebook server executable.
///
/// Resolution order when not forced to prompt:
/// 1. Value saved in the preference store
/// 2. First registry environment containing `bin/<binary>`
/// 3. Interactive file prompt
///
/// The registry tier yields the environment root itself, not the binary
/// inside it. The supervisor expands a directory to `<root>/bin/<binary>` when
/// it launches.
///
/// Discovery failures are never surfaced as errors: a cancelled prompt
/// yields an empty [`ExecutableRef`] and store errors are logged and skipped.
pub struct ExecutableLocator {
    store: Arc<dyn PreferenceStore>,
    prompt: Arc<dyn FilePrompt>,
    fs: Arc<dyn FsProvider>,
    window: WindowHandle,
    registry_file: PathBuf,
    binary_name: String,
    home_dir: PathBuf,
}

impl ExecutableLocator {
    pub fn new(
        config: &LabhostConfig,
        store: Arc<dyn PreferenceStore>,
        prompt: Arc<dyn FilePrompt>,
        window: WindowHandle,
    ) -> Self {
        Self {
            store,
            prompt,
            fs: Arc::new(SystemFs),
            window,
            registry_file: config.registry_file.clone(),
            binary_name: config.binary_name.clone(),
            home_dir: config.home_dir.clone(),
        }
    }

    /// Replace the filesystem provider.
    #[must_use]
    pub fn with_fs(mut self, fs: Arc<dyn FsProvider>) -> Self {
        self.fs = fs;
        self
    }

    /// Resolve an executable reference.
    ///
    /// With `force_prompt` the persisted and registry tiers are skipped. With
    /// `persist` the result is saved whichever tier produced it, even when it
    /// is empty.
    pub async fn resolve(&self, force_prompt: bool, persist: bool) -> ExecutableRef {
        self.resolve_detailed(force_prompt, persist).await.executable
    }

    /// Like [`resolve`](Self::resolve), but also reports the tier used.
    pub async fn resolve_detailed(&self, force_prompt: bool, persist: bool) -> ResolveOutcome {
        let outcome = if force_prompt {
            self.ask().await
        } else if let Some(saved) = self.saved_executable() {
            ResolveOutcome {
                executable: saved,
                source: ResolveSource::Persisted,
            }
        } else if let Some(found) = self.registry_executable() {
            ResolveOutcome {
                executable: found,
                source: ResolveSource::Registry,
            }
        } else {
            self.ask().await
        };

        info!(
            executable = %outcome.executable,
            source = ?outcome.source,
            "Resolved notebook server executable"
        );

        if persist {
            self.save(&outcome.executable);
        }

        outcome
    }

    /// Environment roots from the registry that contain the server binary.
    pub fn candidates(&self) -> Vec<PathBuf> {
        candidate_environments(&self.registry_file, &self.binary_name, self.fs.as_ref())
    }

    fn saved_executable(&self) -> Option<ExecutableRef> {
        match self.store.get(EXECUTABLE_PATH_KEY) {
            Ok(Some(value)) => {
                let saved = ExecutableRef::new(value);
                if saved.is_empty() {
                    debug!("Ignoring empty saved executable path");
                    None
                } else {
                    Some(saved)
                }
            }
            Ok(None) => None,
            Err(e) => {
                warn!(error = %e, "Failed to read saved executable path");
                None
            }
        }
    }

    fn registry_executable(&self) -> Option<ExecutableRef> {
        self.candidates()
            .into_iter()
            .next()
            .map(ExecutableRef::from)
    }

    async fn ask(&self) -> ResolveOutcome {
        let options = FilePromptOptions::new(
            format!("Select a '{}' executable", self.binary_name),
            self.home_dir.clone(),
        );

        let executable = match self.prompt.prompt_for_file(&self.window, &options).await {
            Some(path) => ExecutableRef::from(path),
            None => {
                debug!("Executable prompt cancelled");
                ExecutableRef::empty()
            }
        };

        ResolveOutcome {
            executable,
            source: ResolveSource::Prompt,
        }
    }

    fn save(&self, executable: &ExecutableRef) {
        if let Err(e) = self.store.set(EXECUTABLE_PATH_KEY, executable.as_str()) {
            warn!(error = %e, "Failed to save executable path");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locator::fs::MockFs;
    use async_trait::async_trait;
    use labhost_core::{InMemoryPreferenceStore, PreferenceError};
    use mockall::mock;
    use std::path::Path;
    use std::sync::Mutex;

    const HOME: &str = "/home/ada";
    const REGISTRY: &str = "/home/ada/.conda/environments.txt";

    /// File prompt that answers from a script and records every call.
    #[derive(Default)]
    struct ScriptedFilePrompt {
        answer: Option<PathBuf>,
        calls: Mutex<Vec<FilePromptOptions>>,
    }

    impl ScriptedFilePrompt {
        fn answering(path: &str) -> Self {
            Self {
                answer: Some(PathBuf::from(path)),
                calls: Mutex::default(),
            }
        }

        fn cancelling() -> Self {
            Self::default()
        }

        fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl FilePrompt for ScriptedFilePrompt {
        async fn prompt_for_file(
            &self,
            _window: &WindowHandle,
            options: &FilePromptOptions,
        ) -> Option<PathBuf> {
            self.calls.lock().unwrap().push(options.clone());
            self.answer.clone()
        }
    }

    mock! {
        Store {}
        impl PreferenceStore for Store {
            fn get(&self, key: &str) -> Result<Option<String>, PreferenceError>;
            fn set(&self, key: &str, value: &str) -> Result<(), PreferenceError>;
        }
    }

    fn locator(
        store: Arc<dyn PreferenceStore>,
        prompt: Arc<ScriptedFilePrompt>,
        fs: MockFs,
    ) -> ExecutableLocator {
        let config = LabhostConfig::for_home(HOME).with_binary_name("jupyter-lab");
        ExecutableLocator::new(&config, store, prompt, WindowHandle::new("main"))
            .with_fs(Arc::new(fs))
    }

    fn saved(store: &InMemoryPreferenceStore) -> Option<String> {
        store.get(EXECUTABLE_PATH_KEY).unwrap()
    }

    #[tokio::test]
    async fn test_persisted_value_wins() {
        let store = Arc::new(
            InMemoryPreferenceStore::new().with_value(EXECUTABLE_PATH_KEY, "/saved/jupyter-lab"),
        );
        let prompt = Arc::new(ScriptedFilePrompt::answering("/picked/jupyter-lab"));
        let fs = MockFs::new()
            .with_file(REGISTRY, "/envs/a\n")
            .with_path("/envs/a/bin/jupyter-lab");

        let outcome = locator(store, prompt.clone(), fs)
            .resolve_detailed(false, false)
            .await;

        assert_eq!(outcome.executable.as_str(), "/saved/jupyter-lab");
        assert_eq!(outcome.source, ResolveSource::Persisted);
        assert_eq!(prompt.call_count(), 0);
    }

    #[tokio::test]
    async fn test_registry_returns_first_matching_entry() {
        let store = Arc::new(InMemoryPreferenceStore::new());
        let prompt = Arc::new(ScriptedFilePrompt::cancelling());
        let fs = MockFs::new()
            .with_file(REGISTRY, "/envs/a\n/envs/b\n/envs/c\n")
            .with_path("/envs/b/bin/jupyter-lab")
            .with_path("/envs/c/bin/jupyter-lab");

        let outcome = locator(store, prompt.clone(), fs)
            .resolve_detailed(false, false)
            .await;

        assert_eq!(outcome.source, ResolveSource::Registry);
        assert_eq!(outcome.executable.as_path(), Path::new("/envs/b"));
        assert_eq!(prompt.call_count(), 0);
    }

    #[tokio::test]
    async fn test_no_candidates_falls_through_to_prompt() {
        let store = Arc::new(InMemoryPreferenceStore::new());
        let prompt = Arc::new(ScriptedFilePrompt::answering("/picked/jupyter-lab"));
        let fs = MockFs::new().with_file(REGISTRY, "/envs/a\n/envs/b\n");

        let outcome = locator(store, prompt.clone(), fs)
            .resolve_detailed(false, false)
            .await;

        assert_eq!(outcome.source, ResolveSource::Prompt);
        assert_eq!(outcome.executable.as_str(), "/picked/jupyter-lab");

        let calls = prompt.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].message, "Select a 'jupyter-lab' executable");
        assert_eq!(calls[0].default_path, PathBuf::from(HOME));
    }

    #[tokio::test]
    async fn test_missing_registry_falls_through_to_prompt() {
        let store = Arc::new(InMemoryPreferenceStore::new());
        let prompt = Arc::new(ScriptedFilePrompt::answering("/picked/jupyter-lab"));

        let outcome = locator(store, prompt.clone(), MockFs::new())
            .resolve_detailed(false, false)
            .await;

        assert_eq!(outcome.source, ResolveSource::Prompt);
        assert_eq!(prompt.call_count(), 1);
    }

    #[tokio::test]
    async fn test_force_prompt_skips_other_tiers() {
        let store = Arc::new(
            InMemoryPreferenceStore::new().with_value(EXECUTABLE_PATH_KEY, "/saved/jupyter-lab"),
        );
        let prompt = Arc::new(ScriptedFilePrompt::answering("/picked/jupyter-lab"));

        let exe = locator(store.clone(), prompt.clone(), MockFs::new())
            .resolve(true, true)
            .await;

        assert_eq!(exe.as_str(), "/picked/jupyter-lab");
        assert_eq!(prompt.call_count(), 1);
        assert_eq!(saved(&store).as_deref(), Some("/picked/jupyter-lab"));
    }

    #[tokio::test]
    async fn test_cancelled_prompt_is_persisted_as_empty() {
        let store = Arc::new(InMemoryPreferenceStore::new());
        let prompt = Arc::new(ScriptedFilePrompt::cancelling());

        let exe = locator(store.clone(), prompt, MockFs::new())
            .resolve(false, true)
            .await;

        assert!(exe.is_empty());
        assert_eq!(saved(&store).as_deref(), Some(""));
    }

    #[tokio::test]
    async fn test_empty_saved_value_is_treated_as_absent() {
        let store = Arc::new(InMemoryPreferenceStore::new().with_value(EXECUTABLE_PATH_KEY, ""));
        let prompt = Arc::new(ScriptedFilePrompt::answering("/picked/jupyter-lab"));

        let outcome = locator(store, prompt, MockFs::new())
            .resolve_detailed(false, false)
            .await;

        assert_eq!(outcome.source, ResolveSource::Prompt);
    }

    #[tokio::test]
    async fn test_registry_result_is_persisted() {
        let store = Arc::new(InMemoryPreferenceStore::new());
        let prompt = Arc::new(ScriptedFilePrompt::cancelling());
        let fs = MockFs::new()
            .with_file(REGISTRY, "/envs/a\n")
            .with_path("/envs/a/bin/jupyter-lab");

        locator(store.clone(), prompt, fs).resolve(false, true).await;

        assert_eq!(saved(&store).as_deref(), Some("/envs/a/bin/jupyter-lab"));
    }

    #[tokio::test]
    async fn test_store_errors_are_absorbed() {
        let mut store = MockStore::new();
        store
            .expect_get()
            .returning(|_| Err(PreferenceError::Storage("disk gone".into())));
        store
            .expect_set()
            .times(1)
            .returning(|_, _| Err(PreferenceError::Storage("disk gone".into())));
        let prompt = Arc::new(ScriptedFilePrompt::answering("/picked/jupyter-lab"));

        let exe = locator(Arc::new(store), prompt, MockFs::new())
            .resolve(false, true)
            .await;

        assert_eq!(exe.as_str(), "/picked/jupyter-lab");
    }
}
