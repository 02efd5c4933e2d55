//! Per-stream state.
//!
//! A [`StreamContext`] is created for every inbound request and owned by the
//! single task handling it. It records the handler state and the response
//! write offset, and is released when the stream completes or fails.

use tracing::{debug, error, warn};

use crate::protocol::{BodyChunk, Mode, StreamError};
use crate::transport::BodyWriter;

/// The states of a stream handler.
///
/// ```text
/// AwaitingRequest -> ParsingParameters -> Generating | Echoing -> Writing -> Completed
///                             any non terminal state -> Failed
/// ```
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum StreamState {
    AwaitingRequest,
    ParsingParameters,
    Generating,
    Echoing,
    Writing,
    Completed,
    Failed,
}

impl StreamState {
    #[inline]
    pub fn is_terminal(self) -> bool {
        matches!(self, StreamState::Completed | StreamState::Failed)
    }

    pub fn can_transition_to(self, next: StreamState) -> bool {
        match (self, next) {
            (Self::Completed | Self::Failed, _) => false,
            (_, Self::Failed)
            | (Self::AwaitingRequest, Self::ParsingParameters)
            | (Self::ParsingParameters, Self::Generating | Self::Echoing)
            | (Self::Generating | Self::Echoing, Self::Writing)
            | (Self::Writing, Self::Completed) => true,
            _ => false,
        }
    }
}

#[derive(Debug)]
pub struct StreamContext {
    id: u32,
    state: StreamState,
    mode: Option<Mode>,
    written: u64,
}

impl StreamContext {
    pub fn new(id: u32) -> Self {
        Self { id, state: StreamState::AwaitingRequest, mode: None, written: 0 }
    }

    #[inline]
    pub fn id(&self) -> u32 {
        self.id
    }

    #[inline]
    pub fn state(&self) -> StreamState {
        self.state
    }

    #[inline]
    pub fn mode(&self) -> Option<Mode> {
        self.mode
    }

    /// Bytes of response body written so far, also the offset of the next chunk
    #[inline]
    pub fn written(&self) -> u64 {
        self.written
    }

    pub fn transition(&mut self, next: StreamState) {
        debug_assert!(self.state.can_transition_to(next), "invalid stream transition {:?} -> {:?}", self.state, next);
        debug!(stream_id = self.id, from = ?self.state, to = ?next, "stream state transition");

        self.state = next;
        match next {
            StreamState::Generating => self.mode = Some(Mode::Generate),
            StreamState::Echoing => self.mode = Some(Mode::Echo),
            _ => {}
        }
    }

    /// Moves the stream to `Failed`, logging the cause.
    pub fn fail(&mut self, e: &StreamError) {
        if self.state.is_terminal() {
            return;
        }

        match e {
            StreamError::InvalidParameters { .. } | StreamError::BodyTooLarge { .. } => {
                warn!(stream_id = self.id, state = ?self.state, cause = %e, "reject stream");
            }
            _ => {
                error!(stream_id = self.id, state = ?self.state, written = self.written, cause = %e, "stream failed");
            }
        }
        self.transition(StreamState::Failed);
    }

    /// Writes one chunk of the response body.
    ///
    /// Chunks must be written in offset order, starting from 0.
    pub async fn write_chunk<W>(&mut self, writer: &mut W, chunk: BodyChunk) -> Result<(), StreamError>
    where
        W: BodyWriter + ?Sized,
    {
        debug_assert_eq!(chunk.offset(), self.written, "response chunk out of order");

        let next_offset = chunk.next_offset();
        writer.write_chunk(chunk.into_bytes()).await.map_err(|e| StreamError::write_failed(self.written, e))?;
        self.written = next_offset;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use super::*;
    use crate::protocol::{ParamError, ResponseHead};
    use crate::transport::Respond;
    use crate::transport::memory::MemoryRespond;

    #[test]
    fn transitions() {
        use StreamState::{AwaitingRequest, Completed, Echoing, Failed, Generating, ParsingParameters, Writing};

        assert!(AwaitingRequest.can_transition_to(ParsingParameters));
        assert!(ParsingParameters.can_transition_to(Generating));
        assert!(ParsingParameters.can_transition_to(Echoing));
        assert!(Echoing.can_transition_to(Writing));
        assert!(Writing.can_transition_to(Completed));
        assert!(Generating.can_transition_to(Failed));

        assert!(!AwaitingRequest.can_transition_to(Writing));
        assert!(!Generating.can_transition_to(Echoing));
        assert!(!Completed.can_transition_to(Failed));
        assert!(!Failed.can_transition_to(Completed));
    }

    #[test]
    fn mode_follows_state() {
        let mut context = StreamContext::new(3);
        assert_eq!(context.mode(), None);
        context.transition(StreamState::ParsingParameters);
        context.transition(StreamState::Echoing);
        assert_eq!(context.mode(), Some(Mode::Echo));
    }

    #[test]
    fn fail_once() {
        let mut context = StreamContext::new(1);
        context.fail(&StreamError::from(ParamError::MissingType));
        assert_eq!(context.state(), StreamState::Failed);

        context.fail(&StreamError::from(ParamError::MissingType));
        assert_eq!(context.state(), StreamState::Failed);
    }

    #[tokio::test]
    async fn write_chunk_advances_offset() {
        let (respond, probe) = MemoryRespond::new(1);
        let mut writer = respond.send_head(ResponseHead::new(()), false).unwrap();
        let mut context = StreamContext::new(1);

        context.write_chunk(&mut writer, BodyChunk::new(0, Bytes::from_static(b"abc"))).await.unwrap();
        context.write_chunk(&mut writer, BodyChunk::new(3, Bytes::from_static(b"de"))).await.unwrap();

        assert_eq!(context.written(), 5);
        assert_eq!(probe.body(), Bytes::from_static(b"abcde"));
    }

    #[tokio::test]
    async fn write_failure_reports_written_bytes() {
        let (respond, _probe) = MemoryRespond::new(1);
        let mut writer = respond.reset_after(1).send_head(ResponseHead::new(()), false).unwrap();
        let mut context = StreamContext::new(1);

        context.write_chunk(&mut writer, BodyChunk::new(0, Bytes::from_static(b"abc"))).await.unwrap();
        let error = context.write_chunk(&mut writer, BodyChunk::new(3, Bytes::from_static(b"de"))).await.unwrap_err();

        assert!(matches!(error, StreamError::WriteFailed { written: 3, .. }));
        assert_eq!(context.written(), 3);
    }
}
