//! Sequential, timed delivery of input steps to a child's stdin.
//!
//! Exactly one delivery is in flight at a time; steps fire strictly in list
//! order. The ambient default delay is threaded through the loop as a plain
//! accumulator: a step carrying an explicit delay waits that long *and*
//! leaves the new value behind for every later step without one.
//!
//! A per-step sleep, once started, is not raced against process exit; if the
//! process is gone by the time the write happens, that write fails and is
//! captured as a delivery failure naming the input.

use std::io;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::sync::Notify;
use tokio::time::sleep;
use tracing::debug;

use crate::step::InputStep;

/// A failed write to the child's stdin, naming the input that did not land.
#[derive(Debug)]
pub(crate) struct DeliveryFailure {
    pub(crate) input: String,
    pub(crate) source: io::Error,
}

/// Deliver `steps` to `stdin`, one at a time, each gated by its effective
/// delay. Returns the writer on success so the pipe stays open until the
/// caller settles; an empty step list completes immediately.
///
/// When `start_gate` is set, the first wait does not begin until the gate is
/// notified (the deferred-start variant: don't race a prompt that has not
/// started listening yet).
pub(crate) async fn deliver<W>(
    steps: Vec<InputStep>,
    mut stdin: W,
    default_delay: Duration,
    start_gate: Option<Arc<Notify>>,
) -> Result<W, DeliveryFailure>
where
    W: tokio::io::AsyncWrite + Unpin,
{
    if steps.is_empty() {
        return Ok(stdin);
    }

    if let Some(gate) = start_gate {
        debug!("waiting for first output before delivering inputs");
        gate.notified().await;
    }

    let mut ambient = default_delay;
    for step in steps {
        let wait = match step.delay_before {
            Some(explicit) => {
                // Explicit delays persist as the new ambient default.
                ambient = explicit;
                explicit
            }
            None => ambient,
        };
        sleep(wait).await;
        debug!(input = %step.text.escape_debug(), wait_ms = wait.as_millis() as u64, "delivering input");
        if let Err(source) = write_step(&mut stdin, &step.text).await {
            return Err(DeliveryFailure {
                input: step.text,
                source,
            });
        }
    }

    Ok(stdin)
}

async fn write_step<W>(stdin: &mut W, text: &str) -> io::Result<()>
where
    W: tokio::io::AsyncWrite + Unpin,
{
    stdin.write_all(text.as_bytes()).await?;
    stdin.flush().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;
    use tokio::time::Instant;

    #[tokio::test(start_paused = true)]
    async fn test_empty_steps_complete_immediately() {
        let (writer, _reader) = tokio::io::duplex(64);
        let started = Instant::now();
        deliver(vec![], writer, Duration::from_secs(10), None)
            .await
            .expect("empty delivery");
        assert_eq!(started.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_steps_fire_in_order_after_default_delay() {
        let (writer, mut reader) = tokio::io::duplex(1024);
        let delivery = tokio::spawn(deliver(
            vec![InputStep::text("a"), InputStep::text("b")],
            writer,
            Duration::from_millis(400),
            None,
        ));
        let writer = delivery.await.expect("join").expect("delivery");
        drop(writer);

        let mut received = String::new();
        reader.read_to_string(&mut received).await.expect("read");
        assert_eq!(received, "ab");
    }

    #[tokio::test(start_paused = true)]
    async fn test_explicit_delay_persists_as_ambient_default() {
        let (writer, mut reader) = tokio::io::duplex(1024);
        let started = Instant::now();

        // a: 400ms default, b: explicit 3000ms, c: inherits 3000ms.
        let steps = vec![
            InputStep::text("a"),
            InputStep::timed("b", Duration::from_millis(3000)),
            InputStep::text("c"),
        ];
        let writer = deliver(steps, writer, Duration::from_millis(400), None)
            .await
            .expect("delivery");
        assert_eq!(started.elapsed(), Duration::from_millis(400 + 3000 + 3000));

        drop(writer);
        let mut received = String::new();
        reader.read_to_string(&mut received).await.expect("read");
        assert_eq!(received, "abc");
    }

    #[tokio::test(start_paused = true)]
    async fn test_closed_writer_surfaces_delivery_failure() {
        let (writer, reader) = tokio::io::duplex(64);
        drop(reader);

        let err = deliver(
            vec![InputStep::text("answer")],
            writer,
            Duration::from_millis(10),
            None,
        )
        .await
        .expect_err("write to closed pipe must fail");
        assert_eq!(err.input, "answer");
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_names_first_undelivered_input() {
        let (writer, reader) = tokio::io::duplex(64);
        drop(reader);

        let steps = vec![InputStep::text("first"), InputStep::text("second")];
        let err = deliver(steps, writer, Duration::from_millis(10), None)
            .await
            .expect_err("delivery must fail");
        assert_eq!(err.input, "first");
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_gate_defers_first_wait() {
        let (writer, mut reader) = tokio::io::duplex(1024);
        let gate = Arc::new(Notify::new());

        let delivery = tokio::spawn(deliver(
            vec![InputStep::text("late")],
            writer,
            Duration::from_millis(100),
            Some(gate.clone()),
        ));

        // Nothing may be written while the gate is closed, however long we wait.
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert!(!delivery.is_finished());

        gate.notify_one();
        let writer = delivery.await.expect("join").expect("delivery");
        drop(writer);

        let mut received = String::new();
        reader.read_to_string(&mut received).await.expect("read");
        assert_eq!(received, "late");
    }
}
