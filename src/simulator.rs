use std::fmt;
use std::time::Duration;

use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::token::generate_mock_code;
use crate::{LoginError, MockUserProfile};

const DEFAULT_INITIAL_DELAY: Duration = Duration::from_millis(500);
const DEFAULT_STAGE_DELAY: Duration = Duration::from_millis(1000);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Idle,
    RequestingCode,
    ExchangingToken,
    FetchingProfile,
    Done,
}

impl Stage {
    pub fn next(self) -> Option<Stage> {
        match self {
            Stage::Idle => Some(Stage::RequestingCode),
            Stage::RequestingCode => Some(Stage::ExchangingToken),
            Stage::ExchangingToken => Some(Stage::FetchingProfile),
            Stage::FetchingProfile => Some(Stage::Done),
            Stage::Done => None,
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            Stage::Idle => "Starting simulated WeChat login...",
            Stage::RequestingCode => "Step 1: requesting authorization code...",
            Stage::ExchangingToken => "Step 2: exchanging authorization code for access_token...",
            Stage::FetchingProfile => "Step 3: fetching user info...",
            Stage::Done => "WeChat login succeeded",
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Stage::Idle => "idle",
            Stage::RequestingCode => "requesting_code",
            Stage::ExchangingToken => "exchanging_token",
            Stage::FetchingProfile => "fetching_profile",
            Stage::Done => "done",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageEvent {
    pub stage: Stage,
    pub message: String,
    /// Mock authorization code, set on the `ExchangingToken` event.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Set on the terminal `Done` event only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<MockUserProfile>,
}

impl StageEvent {
    fn new(stage: Stage) -> Self {
        Self {
            stage,
            message: stage.message().to_string(),
            code: None,
            profile: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimulatorConfig {
    pub initial_delay: Duration,
    pub stage_delay: Duration,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            initial_delay: DEFAULT_INITIAL_DELAY,
            stage_delay: DEFAULT_STAGE_DELAY,
        }
    }
}

impl SimulatorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    pub fn with_stage_delay(mut self, delay: Duration) -> Self {
        self.stage_delay = delay;
        self
    }

    /// Wall-clock length of an uninterrupted run.
    pub fn total_duration(&self) -> Duration {
        self.initial_delay + self.stage_delay * 3
    }
}

/// Runs the mocked code -> token -> profile exchange.
///
/// At most one run is live per simulator: starting a new one cancels the
/// previous run, which then ends with [`LoginError::SimulationAborted`].
#[derive(Debug, Default)]
pub struct LoginSimulator {
    config: SimulatorConfig,
    active: Option<CancellationToken>,
}

impl LoginSimulator {
    pub fn new(config: SimulatorConfig) -> Self {
        Self {
            config,
            active: None,
        }
    }

    pub fn config(&self) -> &SimulatorConfig {
        &self.config
    }

    /// Validates the credentials and returns the lazy stage sequence.
    ///
    /// Nothing happens until the run is polled. Cancelling `cancel` aborts
    /// this run without touching the caller's token.
    pub fn start(
        &mut self,
        app_id: &str,
        app_secret: &str,
        cancel: &CancellationToken,
    ) -> Result<SimulationRun, LoginError> {
        let mut missing = Vec::new();
        if app_id.trim().is_empty() {
            missing.push("appId");
        }
        if app_secret.trim().is_empty() {
            missing.push("appSecret");
        }
        if !missing.is_empty() {
            return Err(LoginError::missing(missing));
        }

        if let Some(previous) = self.active.take() {
            if !previous.is_cancelled() {
                tracing::debug!("cancelling in-flight simulation");
                previous.cancel();
            }
        }

        let token = cancel.child_token();
        self.active = Some(token.clone());
        tracing::debug!(app_id = app_id.trim(), "simulation started");

        Ok(SimulationRun {
            config: self.config,
            stage: Stage::Idle,
            cancel: token,
            aborted: false,
        })
    }

    /// Cancels the live run, if any.
    pub fn abort(&mut self) {
        if let Some(token) = self.active.take() {
            token.cancel();
        }
    }
}

#[derive(Debug)]
pub struct SimulationRun {
    config: SimulatorConfig,
    stage: Stage,
    cancel: CancellationToken,
    aborted: bool,
}

impl SimulationRun {
    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Waits out the next delay and yields the next stage.
    ///
    /// Returns `None` once `Done` has been yielded or after an abort error.
    pub async fn next(&mut self) -> Option<Result<StageEvent, LoginError>> {
        if self.aborted {
            return None;
        }
        let pending = self.stage.next()?;

        let delay = if self.stage == Stage::Idle {
            self.config.initial_delay
        } else {
            self.config.stage_delay
        };

        let cancelled = self.cancel.is_cancelled()
            || tokio::select! {
                biased;
                _ = self.cancel.cancelled() => true,
                _ = tokio::time::sleep(delay) => false,
            };
        if cancelled {
            self.aborted = true;
            tracing::debug!(stage = %pending, "simulation aborted");
            return Some(Err(LoginError::SimulationAborted { stage: pending }));
        }

        self.stage = pending;
        let mut event = StageEvent::new(pending);
        match pending {
            Stage::ExchangingToken => {
                event.code = Some(generate_mock_code(&mut rand::rng()));
            }
            Stage::Done => {
                let profile = MockUserProfile::generate(&mut rand::rng());
                tracing::info!(nickname = %profile.nickname, "simulated login complete");
                event.profile = Some(profile);
            }
            _ => {}
        }
        tracing::debug!(stage = %pending, "simulation stage reached");
        Some(Ok(event))
    }

    /// Drives the run to the end and returns the generated profile.
    pub async fn finish(mut self) -> Result<MockUserProfile, LoginError> {
        let mut profile = None;
        while let Some(event) = self.next().await {
            if let Some(generated) = event?.profile {
                profile = Some(generated);
            }
        }
        profile.ok_or(LoginError::SimulationAborted {
            stage: self.stage.next().unwrap_or(Stage::Done),
        })
    }
}

#[cfg(test)]
mod tests {
    use tokio::time::Instant;

    use super::*;

    async fn collect(run: &mut SimulationRun) -> Vec<Result<StageEvent, LoginError>> {
        let mut events = Vec::new();
        while let Some(event) = run.next().await {
            events.push(event);
        }
        events
    }

    #[test]
    fn default_total_is_three_and_a_half_seconds() {
        assert_eq!(
            SimulatorConfig::default().total_duration(),
            Duration::from_millis(3500)
        );
    }

    #[test]
    fn empty_credentials_fail_before_any_stage() {
        let mut simulator = LoginSimulator::default();
        let cancel = CancellationToken::new();

        let err = simulator.start("", "secret", &cancel).unwrap_err();
        assert!(matches!(err, LoginError::Validation { ref fields } if fields == &["appId"]));

        let err = simulator.start("wx123", "  ", &cancel).unwrap_err();
        assert!(matches!(err, LoginError::Validation { ref fields } if fields == &["appSecret"]));
        assert!(simulator.active.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn emits_four_stages_in_order() {
        let mut simulator = LoginSimulator::default();
        let cancel = CancellationToken::new();
        let started = Instant::now();

        let mut run = simulator.start("wx123", "s3cr3t", &cancel).unwrap();
        let events: Vec<StageEvent> = collect(&mut run)
            .await
            .into_iter()
            .collect::<Result<_, _>>()
            .unwrap();

        let stages: Vec<Stage> = events.iter().map(|event| event.stage).collect();
        assert_eq!(
            stages,
            vec![
                Stage::RequestingCode,
                Stage::ExchangingToken,
                Stage::FetchingProfile,
                Stage::Done,
            ]
        );
        assert!(started.elapsed() >= Duration::from_millis(3500));

        assert!(events[1].code.as_deref().unwrap().starts_with("mock_"));
        assert!(events[..3].iter().all(|event| event.profile.is_none()));

        let profile = events[3].profile.as_ref().unwrap();
        let suffix = profile.nickname.strip_prefix("WeChatUser_").unwrap();
        assert!(!suffix.is_empty() && suffix.chars().all(|c| c.is_ascii_digit()));
        let gender = profile.gender.to_string();
        assert!(gender == "male" || gender == "female");

        assert!(run.next().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn respects_configured_delays() {
        let config = SimulatorConfig::new()
            .with_initial_delay(Duration::from_millis(10))
            .with_stage_delay(Duration::from_millis(20));
        let mut simulator = LoginSimulator::new(config);
        let started = Instant::now();

        let run = simulator
            .start("wx123", "s3cr3t", &CancellationToken::new())
            .unwrap();
        run.finish().await.unwrap();

        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_millis(70));
        assert!(elapsed < Duration::from_millis(500));
    }

    #[tokio::test(start_paused = true)]
    async fn second_start_aborts_the_first_run() {
        let mut simulator = LoginSimulator::default();
        let cancel = CancellationToken::new();

        let mut first = simulator.start("wx123", "s3cr3t", &cancel).unwrap();
        let event = first.next().await.unwrap().unwrap();
        assert_eq!(event.stage, Stage::RequestingCode);

        let second = simulator.start("wx123", "s3cr3t", &cancel).unwrap();

        let err = first.next().await.unwrap().unwrap_err();
        assert!(matches!(
            err,
            LoginError::SimulationAborted {
                stage: Stage::ExchangingToken
            }
        ));
        assert!(first.next().await.is_none());
        assert_eq!(first.stage(), Stage::RequestingCode);

        assert!(!cancel.is_cancelled());
        let profile = second.finish().await.unwrap();
        assert!(profile.nickname.starts_with("WeChatUser_"));
    }

    #[tokio::test(start_paused = true)]
    async fn caller_cancellation_interrupts_a_pending_delay() {
        let mut simulator = LoginSimulator::default();
        let cancel = CancellationToken::new();
        let mut run = simulator.start("wx123", "s3cr3t", &cancel).unwrap();

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(700)).await;
            trigger.cancel();
        });

        let events = collect(&mut run).await;
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].as_ref().unwrap().stage, Stage::RequestingCode);
        assert!(matches!(
            events[1],
            Err(LoginError::SimulationAborted {
                stage: Stage::ExchangingToken
            })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn abort_before_polling_yields_no_profile() {
        let mut simulator = LoginSimulator::default();
        let run = simulator
            .start("wx123", "s3cr3t", &CancellationToken::new())
            .unwrap();
        simulator.abort();

        let err = run.finish().await.unwrap_err();
        assert!(matches!(
            err,
            LoginError::SimulationAborted {
                stage: Stage::RequestingCode
            }
        ));
    }
}
