// Keymirror Device Loop
// Feeds source events through the pipeline until the exit key is pressed

use super::{DeviceError, DeviceResult};
use crate::output::OutputError;
use crate::pipeline::{EventSink, Pipeline};
use crate::{Action, InputEvent, Key};

/// A blocking, ordered stream of input events.
pub trait EventSource {
    /// Block until the next event is available.
    fn next_event(&mut self) -> DeviceResult<InputEvent>;

    /// Discard everything currently buffered; returns how many events were dropped.
    fn drain(&mut self) -> DeviceResult<usize>;
}

/// Result type for the device loop
pub type LoopResult<T> = Result<T, LoopError>;

/// Errors that end the device loop
#[derive(Debug, thiserror::Error)]
pub enum LoopError {
    #[error(transparent)]
    Device(#[from] DeviceError),

    #[error(transparent)]
    Output(#[from] OutputError),
}

/// Run `source` through `pipeline` until `exit_key` is pressed.
///
/// The exit press itself still goes through the pipeline; after it the source
/// is drained so nothing queued behind it is replayed later. Returns the
/// number of events processed.
pub fn run_loop<S, K>(source: &mut S, pipeline: &mut Pipeline<K>, exit_key: Key) -> LoopResult<u64>
where
    S: EventSource + ?Sized,
    K: EventSink,
{
    let mut processed: u64 = 0;

    loop {
        let event = source.next_event()?;
        pipeline.process(event)?;
        processed += 1;

        if event.as_key() == Some((exit_key, Action::Press)) {
            let dropped = source.drain()?;
            log::info!(
                "Exit key {} pressed after {} events; discarded {} buffered events",
                exit_key,
                processed,
                dropped
            );
            return Ok(processed);
        }
    }
}
