// Keymirror Chord/Tap Translator
// Mirrors keys while the trigger is held; a quick tap of the trigger emits the tap key
//
// State machine:
//
//   Idle --trigger press--> TriggerHeld { used: false }
//   TriggerHeld --mirrored press--> TriggerHeld { used: true }
//   TriggerHeld --trigger release--> Idle
//                 (quick tap if elapsed < tap_timeout and !used)
//
// Active translations live outside that state machine. A key mirrored on
// press stays mirrored until its own release, whichever of the key and the
// trigger is released first.

use std::collections::HashMap;
use std::time::{Duration, SystemTime};

use crate::output::OutputError;
use crate::pipeline::{Handler, Next};
use crate::{Action, InputEvent, Key, KeyTable};

/// Default quick-tap window
pub const DEFAULT_TAP_TIMEOUT: Duration = Duration::from_millis(250);

/// Keys and timing used by the translator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslatorConfig {
    /// Key whose hold enables mirroring
    pub trigger_key: Key,
    /// Key emitted when the trigger is tapped
    pub tap_key: Key,
    /// Longest press that still counts as a tap
    pub tap_timeout: Duration,
}

impl Default for TranslatorConfig {
    fn default() -> Self {
        Self {
            trigger_key: Key::SPACE,
            tap_key: Key::SPACE,
            tap_timeout: DEFAULT_TAP_TIMEOUT,
        }
    }
}

/// Where the translator is in the trigger's press/release cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Trigger not held
    Idle,
    /// Trigger held; `used` once any key was mirrored during this hold
    TriggerHeld { used: bool },
}

/// Mutable translator state.
///
/// Invariants:
/// - `trigger_down_at` is `Some` only between a trigger press and its release.
/// - A key is in `active_translations` from the press that started mirroring
///   it until its matching release, independent of the trigger.
#[derive(Debug, Default, Clone)]
pub struct TranslatorState {
    trigger_down_at: Option<SystemTime>,
    used_since_trigger: bool,
    active_translations: HashMap<Key, Key>,
}

impl TranslatorState {
    pub fn phase(&self) -> Phase {
        match self.trigger_down_at {
            None => Phase::Idle,
            Some(_) => Phase::TriggerHeld {
                used: self.used_since_trigger,
            },
        }
    }

    pub fn is_trigger_held(&self) -> bool {
        self.trigger_down_at.is_some()
    }

    /// Output key for `key` if it is currently being mirrored.
    pub fn active(&self, key: Key) -> Option<Key> {
        self.active_translations.get(&key).copied()
    }

    pub fn active_count(&self) -> usize {
        self.active_translations.len()
    }
}

/// Pipeline stage implementing chord translation and quick-tap detection.
///
/// Elapsed time is measured between the kernel timestamps of the trigger's
/// press and release events, so processing delays do not shift the tap window.
#[derive(Debug)]
pub struct Translator {
    table: KeyTable,
    config: TranslatorConfig,
    state: TranslatorState,
}

impl Translator {
    pub fn new(table: KeyTable, config: TranslatorConfig) -> Self {
        Self {
            table,
            config,
            state: TranslatorState::default(),
        }
    }

    pub fn config(&self) -> &TranslatorConfig {
        &self.config
    }

    pub fn state(&self) -> &TranslatorState {
        &self.state
    }

    /// Start mirroring `key` if this press qualifies.
    fn begin_translation(&mut self, key: Key) {
        if key == self.config.trigger_key
            || !self.state.is_trigger_held()
            || self.state.active_translations.contains_key(&key)
        {
            return;
        }
        if let Some(mirrored) = self.table.get(key) {
            log::debug!("{} -> {}", key, mirrored);
            self.state.active_translations.insert(key, mirrored);
            self.state.used_since_trigger = true;
        }
    }

    fn handle_trigger(
        &mut self,
        event: InputEvent,
        action: Action,
        next: &mut Next<'_>,
    ) -> Result<(), OutputError> {
        match action {
            Action::Press => {
                if self.state.trigger_down_at.is_none() {
                    self.state.trigger_down_at = Some(event.timestamp());
                }
                self.state.used_since_trigger = false;
                Ok(())
            }
            Action::Repeat => Ok(()),
            Action::Release => {
                let Some(down_at) = self.state.trigger_down_at.take() else {
                    // Trigger was already down when we started listening.
                    log::trace!("Ignoring release of {} without a press", self.config.trigger_key);
                    return Ok(());
                };
                let elapsed = event
                    .timestamp()
                    .duration_since(down_at)
                    .unwrap_or(Duration::ZERO);

                if elapsed < self.config.tap_timeout && !self.state.used_since_trigger {
                    log::debug!(
                        "Quick tap of {} after {:?}, sending {}",
                        self.config.trigger_key,
                        elapsed,
                        self.config.tap_key
                    );
                    let tap_key = self.config.tap_key;
                    next.forward(InputEvent::key(event.timestamp(), tap_key, Action::Press))?;
                    next.forward(InputEvent::sync(event.timestamp()))?;
                    next.forward(event.with_code(tap_key))
                } else {
                    log::trace!(
                        "{} released after {:?} (used: {})",
                        self.config.trigger_key,
                        elapsed,
                        self.state.used_since_trigger
                    );
                    Ok(())
                }
            }
        }
    }
}

impl Handler for Translator {
    fn handle(&mut self, event: InputEvent, next: &mut Next<'_>) -> Result<(), OutputError> {
        let Some((key, action)) = event.as_key() else {
            return next.forward(event);
        };

        if action == Action::Press {
            self.begin_translation(key);
        }

        if let Some(mirrored) = self.state.active(key) {
            if action == Action::Release {
                self.state.active_translations.remove(&key);
            }
            return next.forward(event.with_code(mirrored));
        }

        if key == self.config.trigger_key {
            return self.handle_trigger(event, action, next);
        }

        next.forward(event)
    }
}
