use crate::connection::SubscriberId;
use axum::response::sse::Event;

/// A single server-sent event carrying only a `data` field.
///
/// Line breaks are stored as `\n` only. The event stream format treats a
/// bare `\r` as a line terminator, and axum refuses event data containing one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    data: String,
}

impl Frame {
    pub fn data(text: impl Into<String>) -> Self {
        let text = text.into();
        let data = if text.contains('\r') {
            text.replace("\r\n", "\n").replace('\r', "\n")
        } else {
            text
        };
        Self { data }
    }

    /// The first frame written to a freshly registered connection.
    pub fn handshake(subscriber_id: SubscriberId) -> Self {
        Self::data(format!(
            "Connection with SSE for subscriber {subscriber_id} has been established!"
        ))
    }

    pub fn text(&self) -> &str {
        &self.data
    }

    /// Wire form of the frame. Multi-line payloads become one `data:` line each.
    pub fn encode(&self) -> String {
        let mut encoded = String::with_capacity(self.data.len() + 8);
        for line in self.data.split('\n') {
            encoded.push_str("data: ");
            encoded.push_str(line);
            encoded.push('\n');
        }
        encoded.push('\n');
        encoded
    }

    pub fn to_event(&self) -> Event {
        Event::default().data(&self.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_produces_a_single_data_line() {
        assert_eq!(
            Frame::data("Order shipped").encode(),
            "data: Order shipped\n\n"
        );
    }

    #[test]
    fn encode_splits_multi_line_payloads() {
        assert_eq!(Frame::data("a\nb").encode(), "data: a\ndata: b\n\n");
    }

    #[test]
    fn carriage_returns_become_line_feeds() {
        let frame = Frame::data("Order\r\nshipped\rtoday");

        assert_eq!(frame.text(), "Order\nshipped\ntoday");
        assert_eq!(frame.encode(), "data: Order\ndata: shipped\ndata: today\n\n");
    }

    #[test]
    fn carriage_returns_are_accepted_by_the_event_encoder() {
        // Event::data panics on a raw `\r`.
        let _event = Frame::data("Order\r\nshipped").to_event();
    }

    #[test]
    fn handshake_names_the_subscriber() {
        let subscriber_id = SubscriberId::new_v4();

        assert_eq!(
            Frame::handshake(subscriber_id).encode(),
            format!(
                "data: Connection with SSE for subscriber {subscriber_id} has been established!\n\n"
            )
        );
    }
}
