//! Upload, download and keep-alive requests.

use pgrelay_protocol::constants::{
    DOWNLOAD_ENDPOINT, KEEP_ALIVE_ENDPOINT, RESPONSE_SENTINEL, UPLOAD_ENDPOINT, form,
};
use pgrelay_protocol::{ChannelType, PresenceSnapshot, WireRecord};
use tracing::{debug, trace};

use crate::cursor::SyncCursor;
use crate::error::SyncError;
use crate::transport::RelayTransport;

/// One chat line headed for the bulletin.
///
/// For guild chat `message` is already ciphertext.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMessage {
    pub name: String,
    pub channel: ChannelType,
    pub guild_name: String,
    pub message: String,
    pub hash: String,
}

/// Parsed download response.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DownloadBatch {
    /// Missing when the response carried no sentinel lines at all.
    pub snapshot: Option<PresenceSnapshot>,
    /// Records that decoded, in response order. Guild payloads are still encrypted.
    pub records: Vec<WireRecord>,
}

/// Session-bound client for the relay bulletin.
pub struct SyncClient {
    transport: Box<dyn RelayTransport>,
    session_id: String,
    cursor: SyncCursor,
}

impl SyncClient {
    pub fn new(transport: Box<dyn RelayTransport>, session_id: impl Into<String>) -> Self {
        Self {
            transport,
            session_id: session_id.into(),
            cursor: SyncCursor::new(),
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn cursor(&self) -> SyncCursor {
        self.cursor
    }

    /// Posts one chat line. Failures are logged and dropped.
    pub async fn upload(&self, msg: &OutgoingMessage) {
        let fields = [
            (form::SESSION_ID, self.session_id.clone()),
            (form::NAME, msg.name.clone()),
            (form::CHANNEL, msg.channel.wire_name().to_string()),
            (form::GUILD_NAME, msg.guild_name.clone()),
            (form::MESSAGE, msg.message.clone()),
            (form::HASH, msg.hash.clone()),
        ];
        match self.transport.post_form(UPLOAD_ENDPOINT, &fields).await {
            Ok(_) => trace!(channel = %msg.channel, "uploaded chat line"),
            Err(e) => debug!(channel = %msg.channel, error = %e, "upload dropped"),
        }
    }

    /// Signals liveness. Failures are logged and dropped.
    pub async fn keep_alive(&self) {
        let fields = [(form::SESSION_ID, self.session_id.clone())];
        if let Err(e) = self.transport.post_form(KEEP_ALIVE_ENDPOINT, &fields).await {
            debug!(error = %e, "keep-alive dropped");
        }
    }

    /// Fetches the snapshot and every record past the cursor.
    ///
    /// The cursor advances past every record whose index parsed, even if the
    /// rest of the line did not.
    pub async fn download(&mut self, guild_name: &str) -> Result<DownloadBatch, SyncError> {
        let fields = [
            (form::SESSION_ID, self.session_id.clone()),
            (form::GUILD_NAME, guild_name.to_string()),
            (form::CURSOR, self.cursor.value().to_string()),
        ];
        let body = self.transport.post_form(DOWNLOAD_ENDPOINT, &fields).await?;

        let batch = parse_response(&body, &mut self.cursor);
        if !batch.records.is_empty() {
            debug!(
                count = batch.records.len(),
                cursor = self.cursor.value(),
                "downloaded records"
            );
        }
        Ok(batch)
    }
}

/// Splits a download response into the snapshot and the record lines,
/// advancing `cursor` over every record index seen.
pub fn parse_response(body: &str, cursor: &mut SyncCursor) -> DownloadBatch {
    let mut lines = body
        .split('\n')
        .map(|line| line.trim_end_matches('\r'))
        .filter_map(|line| line.strip_prefix(RESPONSE_SENTINEL));

    let mut batch = DownloadBatch {
        snapshot: lines.next().map(PresenceSnapshot::parse),
        records: Vec::new(),
    };

    for line in lines {
        match WireRecord::index_of(line) {
            Ok(index) => cursor.observe(index),
            Err(e) => {
                debug!(error = %e, "skipping unindexed record line");
                continue;
            }
        }
        match WireRecord::decode(line) {
            Ok(record) => batch.records.push(record),
            Err(e) => debug!(error = %e, "dropping malformed record"),
        }
    }

    batch
}

#[cfg(test)]
mod tests {
    use std::future::Future;
    use std::pin::Pin;
    use std::sync::{Arc, Mutex};

    use chrono::{TimeZone, Utc};

    use super::*;

    type Requests = Arc<Mutex<Vec<(String, Vec<(&'static str, String)>)>>>;

    /// Records every request and answers from a queue.
    struct MockTransport {
        requests: Requests,
        responses: Mutex<Vec<Result<String, SyncError>>>,
    }

    impl MockTransport {
        fn new(responses: Vec<Result<String, SyncError>>) -> (Self, Requests) {
            let requests = Requests::default();
            let transport = Self {
                requests: Arc::clone(&requests),
                responses: Mutex::new(responses),
            };
            (transport, requests)
        }
    }

    impl RelayTransport for MockTransport {
        fn post_form<'a>(
            &'a self,
            endpoint: &'a str,
            form: &'a [(&'static str, String)],
        ) -> Pin<Box<dyn Future<Output = Result<String, SyncError>> + Send + 'a>> {
            self.requests
                .lock()
                .unwrap()
                .push((endpoint.to_string(), form.to_vec()));
            Box::pin(async move {
                let mut responses = self.responses.lock().unwrap();
                if responses.is_empty() {
                    Ok(String::new())
                } else {
                    responses.remove(0)
                }
            })
        }
    }

    #[test]
    fn parse_out_of_order_with_malformed_line() {
        let body = "*10/3/Alice=2\n\
                    *5/2024/3/15/18/0/0/Global/Alice:one\n\
                    *7/2024/3/15/18/0/2/Trade/Bob:two\n\
                    *not a record\n\
                    *6/2024/3/15/18/0/1/Help/Carol:three\n";
        let mut cursor = SyncCursor::new();
        let batch = parse_response(body, &mut cursor);

        assert_eq!(cursor.value(), 8);
        let indices: Vec<i64> = batch.records.iter().map(|r| r.index).collect();
        assert_eq!(indices, vec![5, 7, 6]);
        assert!(batch.snapshot.is_some());
    }

    #[test]
    fn malformed_record_with_index_still_advances() {
        let body = "*0/0/0/\n*12/2024/99/15/18/0/0/Global/Alice:bad date\n";
        let mut cursor = SyncCursor::new();
        let batch = parse_response(body, &mut cursor);
        assert!(batch.records.is_empty());
        assert_eq!(cursor.value(), 13);
    }

    #[test]
    fn unknown_channel_still_advances() {
        let body = "*0/0/0/\n*3/2024/3/15/18/0/0/combat/x\n";
        let mut cursor = SyncCursor::new();
        let batch = parse_response(body, &mut cursor);
        assert!(batch.records.is_empty());
        assert_eq!(cursor.value(), 4);
    }

    #[test]
    fn non_sentinel_lines_ignored() {
        let body = "\r\n<html>\r\n*1/2/3/Alice=1\r\ngarbage\r\n*4/2024/3/15/18/0/0/global/Alice:a/b\r\n";
        let mut cursor = SyncCursor::new();
        let batch = parse_response(body, &mut cursor);

        let snapshot = batch.snapshot.unwrap();
        assert_eq!(snapshot.registered, Some(1));
        assert_eq!(snapshot.guildmates, vec![("Alice".to_string(), 1)]);

        assert_eq!(batch.records.len(), 1);
        let record = &batch.records[0];
        assert_eq!(record.channel, ChannelType::Global);
        assert_eq!(record.payload, "Alice:a/b");
        assert_eq!(
            record.timestamp,
            Utc.with_ymd_and_hms(2024, 3, 15, 18, 0, 0).unwrap()
        );
    }

    #[test]
    fn empty_body_has_no_snapshot() {
        let mut cursor = SyncCursor::new();
        let batch = parse_response("", &mut cursor);
        assert_eq!(batch, DownloadBatch::default());
        assert!(cursor.is_unset());
    }

    #[tokio::test]
    async fn download_sends_cursor_and_advances() {
        let (transport, requests) = MockTransport::new(vec![
            Ok("*0/0/0/\n*4/2024/3/15/18/0/0/Global/Alice:hi\n".to_string()),
            Ok("*0/0/0/\n".to_string()),
        ]);
        let mut client = SyncClient::new(Box::new(transport), "sess");

        let batch = client.download("Knights").await.unwrap();
        assert_eq!(batch.records.len(), 1);
        client.download("Knights").await.unwrap();

        let requests = requests.lock().unwrap();
        assert_eq!(requests[0].0, DOWNLOAD_ENDPOINT);
        assert_eq!(
            requests[0].1,
            vec![
                ("id", "sess".to_string()),
                ("guildname", "Knights".to_string()),
                ("index", "-1".to_string()),
            ]
        );
        assert_eq!(requests[1].1[2], ("index", "5".to_string()));
    }

    #[tokio::test]
    async fn download_failure_keeps_cursor() {
        let (transport, _requests) = MockTransport::new(vec![Err(SyncError::Timeout)]);
        let mut client = SyncClient::new(Box::new(transport), "sess");

        assert!(client.download("").await.is_err());
        assert!(client.cursor().is_unset());
    }

    #[tokio::test]
    async fn upload_and_keep_alive_are_best_effort() {
        let (transport, requests) = MockTransport::new(vec![
            Err(SyncError::Status(500)),
            Err(SyncError::Timeout),
        ]);
        let client = SyncClient::new(Box::new(transport), "sess");

        client
            .upload(&OutgoingMessage {
                name: "Alice".into(),
                channel: ChannelType::Guild,
                guild_name: "Knights".into(),
                message: "ciphertext".into(),
                hash: "ABC".into(),
            })
            .await;
        client.keep_alive().await;

        let requests = requests.lock().unwrap();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].0, UPLOAD_ENDPOINT);
        assert_eq!(
            requests[0].1,
            vec![
                ("id", "sess".to_string()),
                ("name", "Alice".to_string()),
                ("channel", "Guild".to_string()),
                ("guildname", "Knights".to_string()),
                ("message", "ciphertext".to_string()),
                ("hash", "ABC".to_string()),
            ]
        );
        assert_eq!(requests[1], (KEEP_ALIVE_ENDPOINT.to_string(), vec![("id", "sess".to_string())]));
    }
}
