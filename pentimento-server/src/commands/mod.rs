//! Command dispatcher
//!
//! Reads one command per line, decodes it with the active codec and applies
//! it. Decode and resource errors become error records and the loop goes on;
//! an empty line, end of input or cancellation ends it. However it ends, the
//! dispatcher asks the scheduler to shut down.

mod action;

use futures::StreamExt;
use pentimento_protocol::{Action, CodecError, CommandCodec, Fields, Frame};
use pentimento_utils::{PentimentoError, Result};
use tokio::io::AsyncRead;
use tokio_util::codec::FramedRead;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::signals::{ShutdownCause, Trigger};
use crate::state::{SharedState, Tools};

pub use action::apply;

/// Dispatch commands read from `input` until it ends
pub async fn run<R>(
    input: R,
    shared: SharedState,
    tools: Tools,
    cancel: CancellationToken,
) -> Result<()>
where
    R: AsyncRead + Unpin + Send,
{
    let mut frames = FramedRead::new(input, CommandCodec::new(tools.codec.clone()));

    let result = loop {
        let frame = tokio::select! {
            _ = cancel.cancelled() => break Ok(()),
            frame = frames.next() => frame,
        };

        match frame {
            None | Some(Ok(Frame::End)) => {
                info!("End of command input");
                break Ok(());
            }
            Some(Ok(Frame::Command(fields))) => {
                if let Err(e) = execute(fields, &shared, &tools).await {
                    if e.is_fatal() {
                        break Err(e);
                    }
                    tools.reporter.report(&e);
                }
            }
            // Reading stdin failed; nothing more will arrive
            Some(Err(e)) => {
                tools.reporter.report(&PentimentoError::Io(e));
                break Ok(());
            }
        }
    };

    // A full queue or a stopped scheduler both mean shutdown is underway
    let _ = shared
        .triggers
        .try_send(Trigger::Shutdown(ShutdownCause::EndOfInput));

    result
}

async fn execute(
    fields: std::result::Result<Fields, CodecError>,
    shared: &SharedState,
    tools: &Tools,
) -> Result<()> {
    let fields = fields.map_err(PentimentoError::decode)?;
    let action = Action::decode(&fields).map_err(PentimentoError::decode)?;
    debug!(action = %action.kind(), "Applying action");
    apply(action, shared, tools).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::tests::write_png;
    use crate::loader::LoaderKind;
    use crate::reporter::{ErrorReporter, SharedBuffer};
    use crate::state::Offset;
    use crate::tmux::Multiplexer;
    use crate::windows::HeadlessDisplay;
    use pentimento_protocol::CodecKind;
    use std::sync::Arc;
    use tokio::io::AsyncWriteExt;
    use tokio::sync::mpsc;

    /// Multiplexer reporting no visible clients
    #[derive(Debug)]
    struct NoClients;

    impl Multiplexer for NoClients {
        fn is_used(&self) -> bool {
            false
        }

        fn session_id(&self) -> Result<String> {
            Err(PentimentoError::multiplexer("none"))
        }

        fn pane_offset(&self) -> Result<Offset> {
            Ok(Offset::default())
        }

        fn client_pids(&self) -> Result<Vec<u32>> {
            Ok(Vec::new())
        }

        fn register_hooks(&self, _pids: &[u32]) -> Result<()> {
            Ok(())
        }

        fn unregister_hooks(&self) -> Result<()> {
            Ok(())
        }
    }

    struct Harness {
        shared: SharedState,
        tools: Tools,
        errors: SharedBuffer,
        triggers: mpsc::Receiver<Trigger>,
    }

    fn harness(codec: CodecKind) -> Harness {
        let (tx, rx) = mpsc::channel(4);
        let shared = SharedState::new(
            Arc::new(HeadlessDisplay::new(800, 480)),
            Arc::new(NoClients),
            tx,
        );
        let errors = SharedBuffer::default();
        let tools = Tools {
            loader: LoaderKind::Synchronous.build(),
            codec: codec.build(),
            reporter: ErrorReporter::new(codec.build(), errors.clone()),
        };
        Harness {
            shared,
            tools,
            errors,
            triggers: rx,
        }
    }

    async fn dispatch(h: &Harness, input: impl Into<Vec<u8>>) -> Result<()> {
        run(
            std::io::Cursor::new(input.into()),
            h.shared.clone(),
            h.tools.clone(),
            CancellationToken::new(),
        )
        .await
    }

    #[tokio::test]
    async fn test_add_then_remove_without_windows() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_png(&dir, "img1.png", 8, 8);
        let h = harness(CodecKind::Json);

        let add = format!(
            "{{\"action\":\"add\",\"identifier\":\"img1\",\"path\":\"{}\",\"x\":0,\"y\":0}}\n",
            path.display()
        );
        dispatch(&h, add).await.unwrap();
        {
            let state = h.shared.state.lock();
            assert_eq!(state.view.identifiers(), vec!["img1"]);
            assert_eq!(state.registry.redraw_count(), 1);
        }

        dispatch(&h, "{\"action\":\"remove\",\"identifier\":\"img1\"}\n")
            .await
            .unwrap();
        let state = h.shared.state.lock();
        assert!(state.view.media.is_empty());
        assert_eq!(state.registry.redraw_count(), 2);
        assert!(h.errors.lines().is_empty());
    }

    #[tokio::test]
    async fn test_add_without_draw_does_not_redraw() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_png(&dir, "a.png", 2, 2);
        let h = harness(CodecKind::Simple);

        let line = format!(
            "action\tadd\tidentifier\ta\tpath\t{}\tdraw\tfalse\n",
            path.display()
        );
        dispatch(&h, line).await.unwrap();

        let state = h.shared.state.lock();
        assert_eq!(state.view.media.len(), 1);
        assert_eq!(state.registry.redraw_count(), 0);
    }

    #[tokio::test]
    async fn test_remove_absent_layer_does_not_redraw() {
        let h = harness(CodecKind::Json);
        dispatch(&h, "{\"action\":\"remove\",\"identifier\":\"ghost\"}\n")
            .await
            .unwrap();

        assert_eq!(h.shared.state.lock().registry.redraw_count(), 0);
        assert!(h.errors.lines().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_line_reports_once_and_continues() {
        let h = harness(CodecKind::Json);
        let input = "{not json\n{\"action\":\"query_windows\"}\n".to_string();

        dispatch(&h, input).await.unwrap();

        let lines = h.errors.lines();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("DecodeError"));
        assert_eq!(h.tools.reporter.reported(), 1);
    }

    #[tokio::test]
    async fn test_overlong_line_reported_and_skipped() {
        let h = harness(CodecKind::Json);
        let mut input = "x".repeat(pentimento_protocol::MAX_LINE_LENGTH + 1);
        input.push_str("\n{\"action\":\"remove\",\"identifier\":\"a\"}\n{\"action\":\"explode\"}\n");

        dispatch(&h, input).await.unwrap();

        let lines = h.errors.lines();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("exceeds"));
        assert!(lines[1].contains("explode"));
    }

    #[tokio::test]
    async fn test_invalid_utf8_line_reported_and_skipped() {
        let h = harness(CodecKind::Json);
        let mut input = b"{\"action\":\"remove\",\"identifier\":\"\xff\"}\n".to_vec();
        input.extend_from_slice(b"{\"action\":\"explode\"}\n");

        dispatch(&h, input).await.unwrap();

        let lines = h.errors.lines();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("DecodeError"));
        assert!(lines[0].contains("UTF-8"));
        assert!(lines[1].contains("explode"));
    }

    #[tokio::test]
    async fn test_unknown_action_is_decode_error() {
        let h = harness(CodecKind::Json);
        dispatch(&h, "{\"action\":\"explode\"}\n").await.unwrap();

        let lines = h.errors.lines();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("DecodeError"));
        assert!(lines[0].contains("explode"));
    }

    #[tokio::test]
    async fn test_missing_image_is_resource_error() {
        let h = harness(CodecKind::Json);
        let input = "{\"action\":\"add\",\"identifier\":\"a\",\"path\":\"/nonexistent.png\"}\n\
                     {\"action\":\"remove\",\"identifier\":\"a\"}\n"
            .to_string();

        dispatch(&h, input).await.unwrap();

        let lines = h.errors.lines();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("ResourceError"));
        assert!(h.shared.state.lock().view.media.is_empty());
    }

    #[tokio::test]
    async fn test_escaped_dollar_reaches_loader() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_png(&dir, "a$b.png", 2, 2);
        let h = harness(CodecKind::Json);

        let escaped = path.display().to_string().replace('$', "\\$");
        let line = format!(
            "{{\"action\":\"add\",\"identifier\":\"a\",\"path\":\"{}\"}}\n",
            escaped
        );
        dispatch(&h, line).await.unwrap();

        assert!(h.errors.lines().is_empty(), "{:?}", h.errors.lines());
        assert_eq!(h.shared.state.lock().view.media["a"].path, path);
    }

    #[tokio::test]
    async fn test_empty_line_stops_and_requests_shutdown() {
        let mut h = harness(CodecKind::Json);
        let input = "\n{\"action\":\"explode\"}\n".to_string();

        dispatch(&h, input).await.unwrap();

        assert!(h.errors.lines().is_empty());
        assert_eq!(
            h.triggers.try_recv().unwrap(),
            Trigger::Shutdown(ShutdownCause::EndOfInput)
        );
    }

    #[tokio::test]
    async fn test_cancellation_stops_dispatcher() {
        let mut h = harness(CodecKind::Json);
        let (reader, mut writer) = tokio::io::duplex(64);
        let cancel = CancellationToken::new();

        let task = tokio::spawn(run(reader, h.shared.clone(), h.tools.clone(), cancel.clone()));
        writer.write_all(b"{\"action\":\"query_windows\"}\n").await.unwrap();
        tokio::task::yield_now().await;

        cancel.cancel();
        task.await.unwrap().unwrap();
        assert!(h.triggers.try_recv().is_ok());
    }
}
