// Keymirror Event Pipeline
// Ordered handler chain ending in an event sink

use crate::output::OutputError;
use crate::InputEvent;

/// Terminal stage of a pipeline: receives every forwarded event.
pub trait EventSink {
    fn emit(&mut self, event: InputEvent) -> Result<(), OutputError>;
}

/// Recording sink, handy for dry runs and tests.
impl EventSink for Vec<InputEvent> {
    fn emit(&mut self, event: InputEvent) -> Result<(), OutputError> {
        self.push(event);
        Ok(())
    }
}

/// A pipeline stage.
///
/// A handler sees each event once and decides what reaches the rest of the
/// chain: it may call [`Next::forward`] zero, one or several times, with the
/// original event or new ones.
pub trait Handler {
    fn handle(&mut self, event: InputEvent, next: &mut Next<'_>) -> Result<(), OutputError>;
}

/// The remainder of the chain after the current handler.
pub struct Next<'a> {
    handlers: &'a mut [Box<dyn Handler>],
    sink: &'a mut dyn EventSink,
}

impl<'a> Next<'a> {
    /// Chain with no further handlers, delivering straight to `sink`.
    ///
    /// Lets a single handler be driven outside a [`Pipeline`].
    pub fn to_sink(sink: &'a mut dyn EventSink) -> Self {
        Next {
            handlers: &mut [],
            sink,
        }
    }

    /// Pass `event` to the next handler, or to the sink if this is the last stage.
    pub fn forward(&mut self, event: InputEvent) -> Result<(), OutputError> {
        match self.handlers.split_first_mut() {
            Some((head, rest)) => {
                let mut next = Next {
                    handlers: rest,
                    sink: &mut *self.sink,
                };
                head.handle(event, &mut next)
            }
            None => self.sink.emit(event),
        }
    }
}

/// Handlers in declaration order followed by a sink.
pub struct Pipeline<S> {
    handlers: Vec<Box<dyn Handler>>,
    sink: S,
}

impl Pipeline<()> {
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::default()
    }
}

impl<S: EventSink> Pipeline<S> {
    /// Feed one raw event to the first handler.
    pub fn process(&mut self, event: InputEvent) -> Result<(), OutputError> {
        let mut head = Next {
            handlers: self.handlers.as_mut_slice(),
            sink: &mut self.sink,
        };
        head.forward(event)
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }
}

/// Collects handlers; the first one added sees raw events first.
#[derive(Default)]
pub struct PipelineBuilder {
    handlers: Vec<Box<dyn Handler>>,
}

impl PipelineBuilder {
    pub fn then<H: Handler + 'static>(mut self, handler: H) -> Self {
        self.handlers.push(Box::new(handler));
        self
    }

    /// Close the chain with its sink.
    pub fn sink<S: EventSink>(self, sink: S) -> Pipeline<S> {
        Pipeline {
            handlers: self.handlers,
            sink,
        }
    }
}

/// Pass-through stage that logs every event at trace level.
#[derive(Debug, Clone)]
pub struct EventLogger {
    stage: String,
}

impl EventLogger {
    pub fn new(stage: impl Into<String>) -> Self {
        Self {
            stage: stage.into(),
        }
    }
}

impl Handler for EventLogger {
    fn handle(&mut self, event: InputEvent, next: &mut Next<'_>) -> Result<(), OutputError> {
        log::trace!("[{}] {}", self.stage, event);
        next.forward(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Action, Key};
    use std::time::{Duration, UNIX_EPOCH};

    fn press(code: u16) -> InputEvent {
        InputEvent::key(UNIX_EPOCH + Duration::from_millis(1), Key::from(code), Action::Press)
    }

    /// Rewrites every code by adding a fixed offset.
    struct Offset(u16);

    impl Handler for Offset {
        fn handle(&mut self, event: InputEvent, next: &mut Next<'_>) -> Result<(), OutputError> {
            next.forward(event.with_code(Key::from(event.code() + self.0)))
        }
    }

    /// Forwards each event twice.
    struct Twice;

    impl Handler for Twice {
        fn handle(&mut self, event: InputEvent, next: &mut Next<'_>) -> Result<(), OutputError> {
            next.forward(event)?;
            next.forward(event)
        }
    }

    /// Swallows everything.
    struct Swallow;

    impl Handler for Swallow {
        fn handle(&mut self, _event: InputEvent, _next: &mut Next<'_>) -> Result<(), OutputError> {
            Ok(())
        }
    }

    struct BrokenSink;

    impl EventSink for BrokenSink {
        fn emit(&mut self, _event: InputEvent) -> Result<(), OutputError> {
            Err(OutputError::Write(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "device gone",
            )))
        }
    }

    #[test]
    fn test_empty_pipeline_goes_straight_to_sink() {
        let mut pipeline = Pipeline::builder().sink(Vec::<InputEvent>::new());
        pipeline.process(press(16)).unwrap();
        assert_eq!(pipeline.handler_count(), 0);
        assert_eq!(pipeline.sink(), &vec![press(16)]);
    }

    #[test]
    fn test_handlers_run_in_declaration_order() {
        /// Appends its tag as a decimal digit to the code.
        struct Tag(u16);
        impl Handler for Tag {
            fn handle(&mut self, event: InputEvent, next: &mut Next<'_>) -> Result<(), OutputError> {
                next.forward(event.with_code(Key::from(event.code() * 10 + self.0)))
            }
        }

        let mut pipeline = Pipeline::builder().then(Tag(1)).then(Tag(2)).sink(Vec::<InputEvent>::new());
        pipeline.process(press(0)).unwrap();
        assert_eq!(pipeline.sink()[0].code(), 12);
    }

    #[test]
    fn test_handler_may_forward_more_than_once() {
        let mut pipeline = Pipeline::builder().then(Twice).then(Offset(1)).sink(Vec::<InputEvent>::new());
        pipeline.process(press(10)).unwrap();

        let codes: Vec<u16> = pipeline.sink().iter().map(|e| e.code()).collect();
        assert_eq!(codes, vec![11, 11]);
    }

    #[test]
    fn test_offsets_compose() {
        let mut pipeline = Pipeline::builder()
            .then(Offset(1))
            .then(Offset(100))
            .sink(Vec::<InputEvent>::new());
        pipeline.process(press(10)).unwrap();
        assert_eq!(pipeline.into_sink()[0].code(), 111);
    }

    #[test]
    fn test_swallowing_handler_stops_the_chain() {
        let mut pipeline = Pipeline::builder()
            .then(Swallow)
            .then(Twice)
            .sink(Vec::<InputEvent>::new());
        pipeline.process(press(10)).unwrap();
        pipeline.process(press(11)).unwrap();
        assert!(pipeline.sink().is_empty());
    }

    #[test]
    fn test_handler_state_is_kept_between_events() {
        struct Counter(u16);
        impl Handler for Counter {
            fn handle(&mut self, event: InputEvent, next: &mut Next<'_>) -> Result<(), OutputError> {
                self.0 += 1;
                next.forward(event.with_code(Key::from(self.0)))
            }
        }

        let mut pipeline = Pipeline::builder().then(Counter(0)).sink(Vec::<InputEvent>::new());
        for _ in 0..3 {
            pipeline.process(press(99)).unwrap();
        }
        let codes: Vec<u16> = pipeline.sink().iter().map(|e| e.code()).collect();
        assert_eq!(codes, vec![1, 2, 3]);
    }

    #[test]
    fn test_next_to_sink_drives_a_single_handler() {
        let mut sink: Vec<InputEvent> = Vec::new();
        let mut handler = Twice;
        handler.handle(press(5), &mut Next::to_sink(&mut sink)).unwrap();
        assert_eq!(sink, vec![press(5), press(5)]);
    }

    #[test]
    fn test_sink_error_propagates() {
        let mut pipeline = Pipeline::builder()
            .then(EventLogger::new("test"))
            .then(Twice)
            .sink(BrokenSink);
        let err = pipeline.process(press(10)).unwrap_err();
        assert!(matches!(err, OutputError::Write(_)));
    }

    #[test]
    fn test_event_logger_is_transparent() {
        let mut pipeline = Pipeline::builder()
            .then(EventLogger::new("raw"))
            .sink(Vec::<InputEvent>::new());
        let sync = InputEvent::sync(UNIX_EPOCH);
        pipeline.process(press(30)).unwrap();
        pipeline.process(sync).unwrap();
        assert_eq!(pipeline.sink(), &vec![press(30), sync]);
    }
}
