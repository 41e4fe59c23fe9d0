use tokio_util::sync::CancellationToken;

use crate::store::ConfigStore;
use crate::{
    AuthorizationRequest, AuthorizationUrlBuilder, ConfigField, ConnectionConfig, KeyValueStore,
    LoginError, LoginSimulator, MockUserProfile, Notifier, Preferences, Severity, SimulationRun,
    SimulatorConfig, Stage,
};

/// Interactive front end over the store, the URL builder and the simulator.
///
/// Holds the editable connection form and reports every user-visible outcome
/// to the notifier. Errors are both reported and returned.
pub struct LoginConsole<S: KeyValueStore, N: Notifier> {
    store: ConfigStore<S>,
    notifier: N,
    builder: AuthorizationUrlBuilder,
    simulator: LoginSimulator,
    config: ConnectionConfig,
    preferences: Preferences,
}

impl<S: KeyValueStore, N: Notifier> LoginConsole<S, N> {
    pub fn open(store: S, notifier: N) -> Self {
        Self::with_simulator_config(store, notifier, SimulatorConfig::default())
    }

    pub fn with_simulator_config(store: S, notifier: N, simulator: SimulatorConfig) -> Self {
        let store = ConfigStore::new(store);
        let stored = store.load();
        tracing::debug!(
            has_config = stored.config.is_some(),
            has_preferences = stored.preferences.is_some(),
            "loaded stored state"
        );

        Self {
            store,
            notifier,
            builder: AuthorizationUrlBuilder::new(),
            simulator: LoginSimulator::new(simulator),
            config: stored.config.unwrap_or_default(),
            preferences: stored.preferences.unwrap_or_default(),
        }
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    pub fn preferences(&self) -> &Preferences {
        &self.preferences
    }

    pub fn store(&self) -> &ConfigStore<S> {
        &self.store
    }

    /// Edits one form field, saving right away when auto-save is on.
    pub fn set_field(
        &mut self,
        field: ConfigField,
        value: impl Into<String>,
    ) -> Result<(), LoginError> {
        self.config.set(field, value);
        if self.preferences.auto_save {
            self.store
                .save_config(&self.config)
                .inspect_err(|err| self.report(err))?;
        }
        Ok(())
    }

    pub fn save_config(&self) -> Result<(), LoginError> {
        self.store
            .save_config(&self.config)
            .inspect_err(|err| self.report(err))?;
        self.notifier
            .notify("Configuration saved", Severity::Success);
        Ok(())
    }

    /// Removes the stored config and blanks the form. A failed removal leaves
    /// the form as it was.
    pub fn clear_config(&mut self) -> Result<(), LoginError> {
        self.store
            .clear_config()
            .inspect_err(|err| self.report(err))?;
        self.config = ConnectionConfig::default();
        self.notifier
            .notify("Configuration cleared", Severity::Success);
        Ok(())
    }

    pub fn save_preferences(&mut self, preferences: Preferences) -> Result<(), LoginError> {
        self.store
            .save_preferences(&preferences)
            .inspect_err(|err| self.report(err))?;
        self.preferences = preferences;
        self.notifier.notify("Settings saved", Severity::Success);
        Ok(())
    }

    pub fn authorization_url(&self) -> Result<AuthorizationRequest, LoginError> {
        let state = Some(self.config.state.as_str());
        let request = self
            .builder
            .build(&self.config.app_id, &self.config.redirect_uri, state)
            .inspect_err(|err| self.report(err))?;
        self.notifier
            .notify("Authorization URL generated", Severity::Success);
        Ok(request)
    }

    pub fn can_simulate(&self) -> bool {
        !self.config.app_id.trim().is_empty() && !self.config.app_secret.trim().is_empty()
    }

    /// Starts a run without driving it. Any earlier run is aborted.
    pub fn start_simulation(
        &mut self,
        cancel: &CancellationToken,
    ) -> Result<SimulationRun, LoginError> {
        let run = self
            .simulator
            .start(&self.config.app_id, &self.config.app_secret, cancel);
        run.inspect_err(|err| self.report(err))
    }

    /// Runs the whole mocked login, forwarding progress to the notifier.
    pub async fn simulate(
        &mut self,
        cancel: &CancellationToken,
    ) -> Result<MockUserProfile, LoginError> {
        let mut run = self.start_simulation(cancel)?;
        self.notifier.notify(Stage::Idle.message(), Severity::Info);

        while let Some(event) = run.next().await {
            let event = event.inspect_err(|err| self.report(err))?;
            match event.profile {
                Some(profile) => {
                    self.notifier.notify(&event.message, Severity::Success);
                    return Ok(profile);
                }
                None => self.notifier.notify(&event.message, Severity::Info),
            }
        }

        let err = LoginError::SimulationAborted {
            stage: run.stage().next().unwrap_or(Stage::Done),
        };
        self.report(&err);
        Err(err)
    }

    fn report(&self, err: &LoginError) {
        self.notifier.notify(&err.to_string(), Severity::Error);
    }
}
