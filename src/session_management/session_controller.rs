//! Per-connection session driver.
//!
//! A `SessionController` owns everything one connection needs and walks it
//! through `AwaitingHandshake → Streaming → Closing → Closed`. The transport is
//! abstracted as a stream of message payloads so the same controller runs
//! behind the WebSocket listener and inside tests.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures::{Stream, StreamExt};
use log::{debug, error, info, warn};
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;

use super::pipeline::FramePipeline;
use super::session::Session;
use super::session_log::{LogEntry, SessionLog};
use super::SessionState;
use crate::configuration::Config;
use crate::counting::CrossingCounts;
use crate::data_capture::{Annotator, EncoderFactory, Frame, SessionRecorder};
use crate::detection::TrackerFactory;
use crate::error_handling::types::{
    DecodeError, DetectorError, HandshakeError, SessionError, TransportError,
};
use crate::network::handshake::ClientMessage;
use crate::reporting::{ReportSink, SessionSummary};

const LINE_THICKNESS: u32 = 3;

/// Process-wide collaborators shared by every session.
#[derive(Clone)]
pub struct SessionContext {
    pub config: Arc<Config>,
    pub trackers: Arc<dyn TrackerFactory>,
    pub encoders: Arc<dyn EncoderFactory>,
    pub reporter: Arc<dyn ReportSink>,
    /// Bounds blocking-pool work across all sessions.
    pub workers: Arc<Semaphore>,
}

impl SessionContext {
    pub fn new(
        config: Arc<Config>,
        trackers: Arc<dyn TrackerFactory>,
        encoders: Arc<dyn EncoderFactory>,
        reporter: Arc<dyn ReportSink>,
    ) -> Self {
        let workers = Arc::new(Semaphore::new(config.detector.workers));
        Self {
            config,
            trackers,
            encoders,
            reporter,
            workers,
        }
    }
}

/// What a finished session leaves behind.
pub struct SessionReport {
    pub summary: SessionSummary,
    pub counts: CrossingCounts,
    pub frames_recorded: u64,
    /// Recording name, when the session got as far as streaming.
    pub recording: Option<String>,
    pub log_entries: usize,
    /// The detached backend submission.
    pub report_task: JoinHandle<()>,
}

pub struct SessionController {
    state: SessionState,
    session: Session,
    log: SessionLog,
    latest_frame: Option<Arc<Frame>>,
    pipeline: Option<FramePipeline>,
    ctx: SessionContext,
}

impl SessionController {
    pub fn new(ctx: SessionContext, client_addr: Option<std::net::SocketAddr>) -> Self {
        Self {
            state: SessionState::AwaitingHandshake,
            session: Session::new(client_addr),
            log: SessionLog::new(),
            latest_frame: None,
            pipeline: None,
            ctx,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Drives the session until the transport ends, then finalizes it.
    pub async fn run<S>(mut self, mut inbound: S) -> SessionReport
    where
        S: Stream<Item = Result<Vec<u8>, TransportError>> + Unpin,
    {
        info!(
            "[{}] Session opened for {}",
            self.session.id,
            self.session
                .client_addr
                .map(|a| a.to_string())
                .unwrap_or_else(|| "unknown peer".to_string())
        );

        match next_message(&mut inbound, self.idle_timeout_secs()).await {
            Ok(first) => match self.start(first).await {
                Ok(()) => {
                    self.transition(SessionState::Streaming);
                    self.stream(&mut inbound).await;
                }
                Err(e) => warn!("[{}] Handshake rejected: {}", self.session.id, e),
            },
            Err(e) => info!("[{}] Ended before handshake: {}", self.session.id, e),
        }

        self.transition(SessionState::Closing);
        self.finish().await
    }

    /// Accepts the handshake and builds the session's pipeline.
    async fn start(&mut self, message: Vec<u8>) -> Result<(), SessionError> {
        let parsed = ClientMessage::parse(&message).map_err(SessionError::from)?;
        // kept even when the handshake is rejected, for the submission
        self.session.identity = parsed.identity.clone();
        let handshake = parsed.into_handshake()?;

        let frame = decode_frame(&self.ctx, handshake.image_data)
            .await
            .map_err(HandshakeError::from)?;
        let tracker = self.ctx.trackers.create(self.session.id)?;

        let config = &self.ctx.config;
        let zone = config.line_zone();
        let annotator = config
            .recorder
            .annotate
            .then(|| Annotator::new(zone.start(), zone.end(), LINE_THICKNESS));
        let recorder = SessionRecorder::new(
            self.session.id,
            self.session.recording_name(),
            Arc::clone(&self.ctx.encoders),
        );

        debug!(
            "[{}] Using tracker `{}` for log {:?}",
            self.session.id,
            tracker.name(),
            self.session.identity.log_id
        );
        self.pipeline = Some(FramePipeline::new(
            self.session.id,
            tracker,
            zone,
            annotator,
            recorder,
        ));
        self.latest_frame = Some(Arc::new(frame));
        self.session.start_time = Some(Utc::now());
        info!(
            "[{}] Handshake accepted (log {:?}, box {:?})",
            self.session.id, self.session.identity.log_id, self.session.identity.box_id
        );
        Ok(())
    }

    async fn stream<S>(&mut self, inbound: &mut S)
    where
        S: Stream<Item = Result<Vec<u8>, TransportError>> + Unpin,
    {
        loop {
            let message = match next_message(inbound, self.idle_timeout_secs()).await {
                Ok(message) => message,
                Err(TransportError::Closed) => {
                    info!("[{}] Client disconnected", self.session.id);
                    return;
                }
                Err(e) => {
                    warn!("[{}] {}", self.session.id, e);
                    return;
                }
            };

            if !self.on_message(message).await {
                return;
            }
        }
    }

    /// Handles one streaming message. Returns `false` when the session can no
    /// longer process frames.
    async fn on_message(&mut self, message: Vec<u8>) -> bool {
        match ClientMessage::parse(&message) {
            Ok(parsed) => {
                if let Some(image_data) = parsed.image_data {
                    match decode_frame(&self.ctx, image_data).await {
                        Ok(frame) => self.latest_frame = Some(Arc::new(frame)),
                        Err(e) => {
                            warn!("[{}] Skipping message: {}", self.session.id, e);
                            return true;
                        }
                    }
                }
            }
            Err(e) => debug!("[{}] Plain trigger ({})", self.session.id, e),
        }

        self.process_latest().await
    }

    async fn process_latest(&mut self) -> bool {
        let (Some(frame), Some(mut pipeline)) = (self.latest_frame.clone(), self.pipeline.take())
        else {
            error!("[{}] No pipeline to process with", self.session.id);
            return false;
        };

        let job = run_blocking(&self.ctx.workers, move || {
            let outcome = pipeline.process(&frame);
            (pipeline, outcome)
        })
        .await;

        let (pipeline, outcome) = match job {
            Ok(done) => done,
            Err(e) => {
                error!("[{}] {}", self.session.id, e);
                return false;
            }
        };
        self.pipeline = Some(pipeline);

        match outcome {
            Ok(outcome) => {
                self.session.counts = outcome.counts;
                self.session.messages_processed += 1;
                self.log.append(LogEntry {
                    timestamp: Utc::now(),
                    current_in_count: outcome.counts.in_count,
                    labels: outcome.labels,
                });
            }
            Err(e) => warn!("[{}] Skipping message: {}", self.session.id, e),
        }
        true
    }

    /// Closes the recorder, compiles the log and hands the summary to the reporter.
    async fn finish(mut self) -> SessionReport {
        let end_time = Utc::now();
        self.session.end_time = Some(end_time);

        let (frames_recorded, recording) = match self.pipeline.take() {
            Some(mut pipeline) => {
                let closed = run_blocking(&self.ctx.workers, move || {
                    let result = pipeline.close_recorder();
                    let name = pipeline.recording_name().to_string();
                    (pipeline.frames_recorded(), name, result)
                })
                .await;
                match closed {
                    Ok((frames, name, Ok(()))) => (frames, Some(name)),
                    Ok((frames, name, Err(e))) => {
                        warn!("[{}] Recording `{}` not finalized: {}", self.session.id, name, e);
                        (frames, Some(name))
                    }
                    Err(e) => {
                        error!("[{}] {}", self.session.id, e);
                        (0, None)
                    }
                }
            }
            None => (0, None),
        };

        let identity = &self.session.identity;
        let summary = SessionSummary {
            log_id: identity.log_id.clone(),
            box_id: identity.box_id.clone(),
            item_type: identity.item_type.clone(),
            user_id: identity.user_id.clone(),
            total_count: 0,
            start_time: self.session.start_time.unwrap_or(self.session.connected_at),
            end_time,
            full_log_file: self.log.compile(),
        };

        let session_id = self.session.id;
        let submission = self.ctx.reporter.submit(summary.clone());
        let report_task = tokio::spawn(async move {
            match submission.await {
                Ok(()) => debug!("[{}] Session summary submitted", session_id),
                Err(e) => error!("[{}] Session summary not submitted: {}", session_id, e),
            }
        });

        self.transition(SessionState::Closed);
        info!(
            "[{}] Session closed: {} messages, in {}, out {}, {} frames recorded",
            session_id,
            self.session.messages_processed,
            self.session.counts.in_count,
            self.session.counts.out_count,
            frames_recorded
        );

        SessionReport {
            summary,
            counts: self.session.counts,
            frames_recorded,
            recording,
            log_entries: self.log.len(),
            report_task,
        }
    }

    fn idle_timeout_secs(&self) -> u64 {
        self.ctx.config.server.idle_timeout_secs
    }

    fn transition(&mut self, next: SessionState) {
        if self.state.can_advance_to(next) {
            debug!("[{}] {:?} -> {:?}", self.session.id, self.state, next);
            self.state = next;
        } else {
            warn!(
                "[{}] Ignoring transition {:?} -> {:?}",
                self.session.id, self.state, next
            );
        }
    }
}

/// Next payload from the transport. `idle_secs == 0` waits forever.
async fn next_message<S>(inbound: &mut S, idle_secs: u64) -> Result<Vec<u8>, TransportError>
where
    S: Stream<Item = Result<Vec<u8>, TransportError>> + Unpin,
{
    let next = if idle_secs == 0 {
        inbound.next().await
    } else {
        tokio::time::timeout(Duration::from_secs(idle_secs), inbound.next())
            .await
            .map_err(|_| TransportError::IdleTimeout)?
    };

    match next {
        Some(message) => message,
        None => Err(TransportError::Closed),
    }
}

/// Decodes a base64 frame and scales it to the recording resolution.
async fn decode_frame(ctx: &SessionContext, image_data: String) -> Result<Frame, DecodeError> {
    let (width, height) = (ctx.config.recorder.width, ctx.config.recorder.height);
    run_blocking(&ctx.workers, move || {
        Frame::decode_base64(&image_data).map(|frame| frame.normalized(width, height))
    })
    .await
    .map_err(|e| DecodeError::Image(e.to_string()))?
}

/// Runs `job` on the blocking pool once a worker permit is available.
async fn run_blocking<T, F>(workers: &Arc<Semaphore>, job: F) -> Result<T, DetectorError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    let permit = Arc::clone(workers)
        .acquire_owned()
        .await
        .map_err(|e| DetectorError::WorkerFailed(e.to_string()))?;

    tokio::task::spawn_blocking(move || {
        let _permit = permit;
        job()
    })
    .await
    .map_err(|e| DetectorError::WorkerFailed(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;
    use tokio_test::{assert_pending, assert_ready, task};

    type Inbound = Result<Vec<u8>, TransportError>;

    #[test]
    fn next_message_waits_forever_without_idle_timeout() {
        let mut inbound = stream::pending::<Inbound>();
        let mut next = task::spawn(next_message(&mut inbound, 0));
        assert_pending!(next.poll());
        assert_pending!(next.poll());
    }

    #[test]
    fn end_of_stream_is_closed() {
        let mut inbound = stream::empty::<Inbound>();
        let mut next = task::spawn(next_message(&mut inbound, 0));
        assert!(matches!(assert_ready!(next.poll()), Err(TransportError::Closed)));
    }

    #[tokio::test(start_paused = true)]
    async fn silent_client_hits_idle_timeout() {
        let mut inbound = stream::pending::<Inbound>();
        let result = next_message(&mut inbound, 30).await;
        assert!(matches!(result, Err(TransportError::IdleTimeout)));
    }

    #[tokio::test]
    async fn blocking_jobs_hold_a_worker_permit() {
        let workers = Arc::new(Semaphore::new(1));
        let seen = run_blocking(&workers, {
            let workers = workers.clone();
            move || workers.available_permits()
        })
        .await
        .unwrap();

        assert_eq!(seen, 0);
        assert_eq!(workers.available_permits(), 1);
    }
}
