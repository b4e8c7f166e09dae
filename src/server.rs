//! Newline-delimited JSON boundary to the compositor.
//!
//! Each input line is one [`Event`]. Each output line is either a
//! [`Request`] (tagged with `request`) or a bar [`BroadcastEvent`] (tagged
//! with `event`).

use serde::Serialize;
use tokio::io::{self, AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, trace, warn};

use crate::actor::broadcast::{BroadcastEvent, BroadcastReceiver};
use crate::actor::reactor::{self, Event, RequestReceiver};

/// Forward parsed events to the reactor until the input closes. Lines that
/// do not parse are logged and skipped.
pub async fn read_events<R>(input: R, events_tx: reactor::Sender) -> io::Result<()>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = input.lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str::<Event>(line) {
            Ok(event) => {
                trace!(?event, "received");
                events_tx.send(event);
            }
            Err(e) => warn!("ignoring malformed event: {e}: {line}"),
        }
    }
    debug!("input closed");
    Ok(())
}

/// Write requests and broadcasts as they arrive. Returns once both channels
/// have closed, which happens when the reactor exits.
pub async fn write_output<W>(
    mut requests: RequestReceiver,
    mut broadcasts: BroadcastReceiver,
    mut output: W,
) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    loop {
        let line = tokio::select! {
            Some((_, request)) = requests.recv() => encode(&request),
            Some((_, event)) = broadcasts.recv() => encode::<BroadcastEvent>(&event),
            else => break,
        };
        let Some(mut line) = line else { continue };
        line.push('\n');
        output.write_all(line.as_bytes()).await?;
        output.flush().await?;
    }
    debug!("output closed");
    Ok(())
}

fn encode<T: Serialize + std::fmt::Debug>(value: &T) -> Option<String> {
    match serde_json::to_string(value) {
        Ok(line) => Some(line),
        Err(e) => {
            warn!(?value, "could not encode: {e}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::actor;
    use crate::actor::dispatcher::Action;
    use crate::actor::reactor::Request;
    use crate::model::{WindowId, WindowInfo};

    #[tokio::test]
    async fn events_are_parsed_line_by_line() {
        let input = concat!(
            r#"{"event":"window_mapped","id":7,"info":{"class":"term"}}"#,
            "\n",
            "not json\n",
            "\n",
            r#"{"event":"command","action":"next_layout"}"#,
            "\n",
        );
        let (tx, mut rx) = actor::channel();
        read_events(input.as_bytes(), tx).await.unwrap();

        let mut events = Vec::new();
        while let Ok((_, event)) = rx.try_recv() {
            events.push(event);
        }
        assert_eq!(events, vec![
            Event::WindowMapped {
                id: WindowId::new(7),
                info: WindowInfo {
                    class: Some("term".into()),
                    ..Default::default()
                },
            },
            Event::Command { action: Action::NextLayout },
        ]);
    }

    #[tokio::test]
    async fn internal_events_cannot_be_injected() {
        let (tx, mut rx) = actor::channel();
        read_events(r#"{"event":"work_completed"}"#.as_bytes(), tx).await.unwrap();
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn output_ends_when_the_reactor_is_gone() {
        let (requests_tx, requests_rx) = actor::channel();
        let (broadcast_tx, broadcast_rx) = actor::channel();
        requests_tx.send(Request::Hide { window: WindowId::new(3) });
        broadcast_tx.send(BroadcastEvent::ConfigReloaded);
        requests_tx.send(Request::Shutdown);
        drop((requests_tx, broadcast_tx));

        let mut out = Vec::new();
        write_output(requests_rx, broadcast_rx, &mut out).await.unwrap();
        let mut lines: Vec<String> =
            String::from_utf8(out).unwrap().lines().map(str::to_string).collect();
        lines.sort();
        assert_eq!(lines, vec![
            r#"{"event":"config_reloaded"}"#.to_string(),
            r#"{"request":"hide","window":3}"#.to_string(),
            r#"{"request":"shutdown"}"#.to_string(),
        ]);
    }
}
