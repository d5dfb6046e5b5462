//! SSE body → [`ChannelEvent`] conversion.
//!
//! The service frames every push as a server-sent event. The `data` field
//! is forwarded untouched for the controller to decode; an event named
//! `end` terminates the channel, as does an event named `error` or a broken
//! byte stream.

use distill_application::{ChannelEvent, PushChannel};
use distill_domain::session::stream::END_EVENT;
use eventsource_stream::{Event, EventStreamError, Eventsource};
use futures::{Stream, StreamExt, future};
use std::fmt::Display;

const ERROR_EVENT: &str = "error";

/// Wrap an SSE byte stream as a [`PushChannel`].
///
/// The channel yields nothing after its first terminal event.
pub fn push_channel<S, B, E>(bytes: S) -> PushChannel
where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: Display + Send + 'static,
{
    let events = bytes
        .eventsource()
        .map(to_channel_event)
        .scan(false, |finished, event| {
            if *finished {
                return future::ready(None);
            }
            *finished = matches!(event, ChannelEvent::End | ChannelEvent::Error(_));
            future::ready(Some(event))
        });
    PushChannel::new(events)
}

fn to_channel_event<E: Display>(item: Result<Event, EventStreamError<E>>) -> ChannelEvent {
    match item {
        Ok(event) => match event.event.as_str() {
            END_EVENT => ChannelEvent::End,
            ERROR_EVENT => ChannelEvent::Error(event.data),
            _ => ChannelEvent::Data(event.data),
        },
        Err(e) => ChannelEvent::Error(format!("SSE stream error: {e}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    fn chunks(parts: &[&'static str]) -> impl Stream<Item = Result<Bytes, std::io::Error>> + Send {
        futures::stream::iter(
            parts
                .iter()
                .copied()
                .map(|p| Ok(Bytes::from_static(p.as_bytes())))
                .collect::<Vec<_>>(),
        )
    }

    async fn collect(mut channel: PushChannel) -> Vec<ChannelEvent> {
        let mut events = Vec::new();
        while let Some(event) = channel.next_event().await {
            events.push(event);
        }
        events
    }

    #[tokio::test]
    async fn test_data_events_are_forwarded() {
        let channel = push_channel(chunks(&[
            "data: {\"token\": \"Hi\"}\n\n",
            "data: {\"token\": \" there\"}\n\ndata: {\"event\": \"end\"}\n\n",
        ]));

        assert_eq!(
            collect(channel).await,
            vec![
                ChannelEvent::Data(r#"{"token": "Hi"}"#.to_string()),
                ChannelEvent::Data(r#"{"token": " there"}"#.to_string()),
                ChannelEvent::Data(r#"{"event": "end"}"#.to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_event_split_across_chunks() {
        let channel = push_channel(chunks(&["data: {\"tok", "en\": \"ab\"}\n", "\n"]));
        assert_eq!(
            collect(channel).await,
            vec![ChannelEvent::Data(r#"{"token": "ab"}"#.to_string())]
        );
    }

    #[tokio::test]
    async fn test_named_end_event_terminates() {
        let channel = push_channel(chunks(&[
            "data: {\"token\": \"x\"}\n\n",
            "event: end\ndata: {}\n\n",
            "data: {\"token\": \"late\"}\n\n",
        ]));

        assert_eq!(
            collect(channel).await,
            vec![
                ChannelEvent::Data(r#"{"token": "x"}"#.to_string()),
                ChannelEvent::End,
            ]
        );
    }

    #[tokio::test]
    async fn test_error_event_terminates() {
        let channel = push_channel(chunks(&["event: error\ndata: job failed\n\n"]));
        assert_eq!(
            collect(channel).await,
            vec![ChannelEvent::Error("job failed".to_string())]
        );
    }

    #[tokio::test]
    async fn test_transport_error_becomes_error_event() {
        let body = futures::stream::iter(vec![
            Ok(Bytes::from_static(b"data: {\"token\": \"a\"}\n\n")),
            Err(std::io::Error::other("reset")),
        ]);
        let events = collect(push_channel(body)).await;
        assert_eq!(events.len(), 2);
        assert!(matches!(&events[1], ChannelEvent::Error(msg) if msg.contains("reset")));
    }
}
