#[cfg(test)]
mod tests {
    use crate::configuration::Config;
    use crate::counting::{BoundingBox, Detection};
    use crate::data_capture::frame::test_support::solid_base64;
    use crate::data_capture::{Frame, MjpegEncoderFactory};
    use crate::detection::{ObjectTracker, TrackerFactory};
    use crate::error_handling::types::{DetectorError, ReportingError, TransportError};
    use crate::reporting::{ReportSink, SessionSummary};
    use crate::session_management::{SessionContext, SessionController, SessionReport};
    use futures::future::BoxFuture;
    use futures::stream;
    use futures::FutureExt;
    use futures::StreamExt;
    use std::path::Path;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;
    use tempfile::TempDir;
    use uuid::Uuid;

    // Shades below this put the single tracked object under the line
    const BELOW: u8 = 30;
    const ABOVE: u8 = 220;
    // Anything in between makes the tracker fail
    const BROKEN: u8 = 128;

    /// Reads the object's position off the frame: dark frames put track 1
    /// below the line, bright frames above it.
    struct ShadeTracker;

    impl ObjectTracker for ShadeTracker {
        fn name(&self) -> &'static str {
            "shade"
        }

        fn track(&mut self, frame: &Frame) -> Result<Vec<Detection>, DetectorError> {
            let shade = frame.image().get_pixel(0, 0)[0];
            let y = if shade < 100 {
                90.0
            } else if shade > 150 {
                10.0
            } else {
                return Err(DetectorError::InferenceFailed("mid-grey".to_string()));
            };
            Ok(vec![Detection {
                track_id: Some(1),
                label: "person".to_string(),
                confidence: 0.9,
                bbox: BoundingBox::new(45.0, y - 5.0, 55.0, y + 5.0),
            }])
        }
    }

    struct ShadeTrackerFactory;

    impl TrackerFactory for ShadeTrackerFactory {
        fn create(&self, _session_id: Uuid) -> Result<Box<dyn ObjectTracker>, DetectorError> {
            Ok(Box::new(ShadeTracker))
        }
    }

    #[derive(Default)]
    struct MemorySink {
        summaries: Mutex<Vec<SessionSummary>>,
    }

    impl ReportSink for MemorySink {
        fn submit(&self, summary: SessionSummary) -> BoxFuture<'static, Result<(), ReportingError>> {
            self.summaries.lock().unwrap().push(summary);
            async { Ok(()) }.boxed()
        }
    }

    // Helper to build a context with a horizontal line at y = 50
    fn context(dir: &Path, idle_timeout_secs: u64) -> (SessionContext, Arc<MemorySink>) {
        let mut config = Config::default();
        config.server.idle_timeout_secs = idle_timeout_secs;
        config.line.start = [0.0, 50.0];
        config.line.end = [100.0, 50.0];
        config.recorder.output_dir = dir.to_path_buf();
        config.recorder.width = 100;
        config.recorder.height = 100;
        config.detector.workers = 2;

        let sink = Arc::new(MemorySink::default());
        let ctx = SessionContext::new(
            Arc::new(config),
            Arc::new(ShadeTrackerFactory),
            Arc::new(MjpegEncoderFactory::new(dir, 80)),
            sink.clone(),
        );
        (ctx, sink)
    }

    fn handshake(log_id: &str, shade: u8) -> Vec<u8> {
        format!(
            "LogId:{}\nBoxId:B1\nItemType:bottle\nUserId:U1\nImageData:{}",
            log_id,
            solid_base64(40, 40, shade)
        )
        .into_bytes()
    }

    fn frame(shade: u8) -> Vec<u8> {
        format!("ImageData:{}", solid_base64(40, 40, shade)).into_bytes()
    }

    fn trigger() -> Vec<u8> {
        b"next".to_vec()
    }

    async fn run_session(ctx: SessionContext, messages: Vec<Vec<u8>>) -> SessionReport {
        let inbound = stream::iter(messages.into_iter().map(Ok::<_, TransportError>));
        SessionController::new(ctx, None).run(inbound).await
    }

    #[tokio::test]
    async fn counts_one_in_and_one_out() {
        let _ = env_logger::builder().is_test(true).try_init();
        let dir = TempDir::new().unwrap();
        let (ctx, sink) = context(dir.path(), 0);

        let report = run_session(
            ctx,
            vec![
                handshake("L-ref", BELOW),
                frame(BELOW),
                frame(ABOVE),
                trigger(),
                trigger(),
                frame(BELOW),
            ],
        )
        .await;
        report.report_task.await.unwrap();

        assert_eq!(report.counts.in_count, 1);
        assert_eq!(report.counts.out_count, 1);
        assert_eq!(report.log_entries, 5);
        assert_eq!(report.frames_recorded, 5);

        let lines: Vec<&str> = report.summary.full_log_file.lines().collect();
        assert_eq!(lines.len(), 5);
        assert!(lines[0].contains("Current-Count: 0  ->  ['1 person 0.90']"));
        assert!(lines[1].contains("Current-Count: 1  ->"));
        assert!(lines[4].contains("Current-Count: 1  ->"));

        let summaries = sink.summaries.lock().unwrap();
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].log_id.as_deref(), Some("L-ref"));
        assert_eq!(summaries[0].box_id.as_deref(), Some("B1"));
        assert_eq!(summaries[0].total_count, 0);
        assert!(summaries[0].start_time <= summaries[0].end_time);
    }

    #[tokio::test]
    async fn recording_is_named_after_log_id() {
        let dir = TempDir::new().unwrap();
        let (ctx, _sink) = context(dir.path(), 0);

        let report = run_session(ctx, vec![handshake("rec-7", BELOW), trigger(), trigger()]).await;
        report.report_task.await.unwrap();

        let path = dir.path().join("rec-7.mjpeg");
        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(&bytes[..2], &[0xFF, 0xD8]);
        assert_eq!(report.frames_recorded, 2);
        assert_eq!(report.recording.as_deref(), Some("rec-7"));
    }

    #[tokio::test]
    async fn missing_image_still_reports_empty_log() {
        let dir = TempDir::new().unwrap();
        let (ctx, sink) = context(dir.path(), 0);

        let report = run_session(
            ctx,
            vec![
                b"LogId:L2\nBoxId:B\nItemType:x\nUserId:U".to_vec(),
                frame(BELOW),
                frame(ABOVE),
            ],
        )
        .await;
        report.report_task.await.unwrap();

        assert_eq!(report.log_entries, 0);
        assert_eq!(report.frames_recorded, 0);
        assert!(!dir.path().join("L2.mjpeg").exists());

        let summaries = sink.summaries.lock().unwrap();
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].log_id.as_deref(), Some("L2"));
        assert_eq!(summaries[0].full_log_file, "");
    }

    #[tokio::test]
    async fn stationary_object_never_crosses() {
        let dir = TempDir::new().unwrap();
        let (ctx, _sink) = context(dir.path(), 0);

        let mut messages = vec![handshake("still", ABOVE)];
        messages.extend((0..100).map(|_| trigger()));
        let report = run_session(ctx, messages).await;

        assert_eq!(report.counts.in_count, 0);
        assert_eq!(report.counts.out_count, 0);
        assert_eq!(report.log_entries, 100);
    }

    #[tokio::test]
    async fn undecodable_frame_is_skipped_and_previous_frame_kept() {
        let dir = TempDir::new().unwrap();
        let (ctx, _sink) = context(dir.path(), 0);

        let report = run_session(
            ctx,
            vec![
                handshake("L3", BELOW),
                b"ImageData:%%%not-base64%%%".to_vec(),
                trigger(),
            ],
        )
        .await;

        assert_eq!(report.log_entries, 1);
        assert_eq!(report.counts.in_count, 0);
        assert!(report.summary.full_log_file.contains("Current-Count: 0"));
    }

    #[tokio::test]
    async fn tracker_failure_skips_message() {
        let dir = TempDir::new().unwrap();
        let (ctx, _sink) = context(dir.path(), 0);

        let report = run_session(
            ctx,
            vec![
                handshake("L4", BELOW),
                frame(BELOW),
                frame(BROKEN),
                frame(ABOVE),
            ],
        )
        .await;

        assert_eq!(report.log_entries, 2);
        assert_eq!(report.counts.in_count, 1);
    }

    #[tokio::test]
    async fn non_text_message_is_a_trigger() {
        let dir = TempDir::new().unwrap();
        let (ctx, _sink) = context(dir.path(), 0);

        let report = run_session(ctx, vec![handshake("L5", ABOVE), vec![0xff, 0x00, 0xfe]]).await;

        assert_eq!(report.log_entries, 1);
    }

    #[tokio::test]
    async fn disconnect_before_handshake_reports_nothing_counted() {
        let dir = TempDir::new().unwrap();
        let (ctx, sink) = context(dir.path(), 0);

        let report = run_session(ctx, vec![]).await;
        report.report_task.await.unwrap();

        assert_eq!(report.log_entries, 0);
        let summaries = sink.summaries.lock().unwrap();
        assert_eq!(summaries.len(), 1);
        assert!(summaries[0].log_id.is_none());
        assert_eq!(summaries[0].full_log_file, "");
    }

    #[tokio::test]
    async fn receive_failure_closes_session() {
        let dir = TempDir::new().unwrap();
        let (ctx, sink) = context(dir.path(), 0);

        let inbound = stream::iter(vec![
            Ok(handshake("L6", BELOW)),
            Ok(trigger()),
            Err(TransportError::ReceiveFailed("reset".to_string())),
            Ok(trigger()),
        ]);
        let report = SessionController::new(ctx, None).run(inbound).await;
        report.report_task.await.unwrap();

        assert_eq!(report.log_entries, 1);
        assert_eq!(sink.summaries.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn idle_session_times_out() {
        let dir = TempDir::new().unwrap();
        let (ctx, sink) = context(dir.path(), 1);

        let inbound = stream::iter(vec![Ok::<_, TransportError>(handshake("L7", BELOW)), Ok(trigger())])
            .chain(stream::pending());
        let report = tokio::time::timeout(
            Duration::from_secs(10),
            SessionController::new(ctx, None).run(inbound),
        )
        .await
        .unwrap();
        report.report_task.await.unwrap();

        assert_eq!(report.log_entries, 1);
        assert_eq!(sink.summaries.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn concurrent_sessions_are_isolated() {
        let dir = TempDir::new().unwrap();
        let (ctx, sink) = context(dir.path(), 0);

        let going_in = run_session(
            ctx.clone(),
            vec![handshake("A", BELOW), frame(BELOW), frame(ABOVE), frame(ABOVE)],
        );
        let going_out = run_session(
            ctx,
            vec![handshake("B", ABOVE), frame(ABOVE), frame(BELOW)],
        );
        let (a, b) = tokio::join!(going_in, going_out);
        a.report_task.await.unwrap();
        b.report_task.await.unwrap();

        assert_eq!((a.counts.in_count, a.counts.out_count), (1, 0));
        assert_eq!((b.counts.in_count, b.counts.out_count), (0, 1));
        assert_eq!(a.log_entries, 3);
        assert_eq!(b.log_entries, 2);
        assert!(dir.path().join("A.mjpeg").exists());
        assert!(dir.path().join("B.mjpeg").exists());
        assert_eq!(sink.summaries.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn sessions_sharing_a_log_id_keep_separate_recordings() {
        let dir = TempDir::new().unwrap();
        let (ctx, _sink) = context(dir.path(), 0);

        let mut first = vec![handshake("dup", BELOW)];
        first.extend((0..20).map(|i| frame(if i % 2 == 0 { BELOW } else { ABOVE })));
        let mut second = vec![handshake("dup", ABOVE)];
        second.extend((0..20).map(|_| trigger()));

        let (a, b) = tokio::join!(run_session(ctx.clone(), first), run_session(ctx, second));
        assert_eq!(a.frames_recorded + b.frames_recorded, 40);
        assert_ne!(a.recording, b.recording);

        let mut frames_on_disk = 0;
        let mut files = 0;
        for entry in std::fs::read_dir(dir.path()).unwrap() {
            let path = entry.unwrap().path();
            let name = path.file_name().unwrap().to_string_lossy().to_string();
            assert!(name.starts_with("dup"), "{}", name);
            let bytes = std::fs::read(&path).unwrap();
            frames_on_disk += bytes.windows(3).filter(|w| *w == [0xFF, 0xD8, 0xFF]).count();
            files += 1;
        }
        assert_eq!(files, 2);
        assert_eq!(frames_on_disk, 40);
    }
}
