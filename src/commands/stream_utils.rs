use crate::{resp::RespValue, stream::StreamEntry};

/// `[[id, [field, value, ...]], ...]`
pub fn parse_stream_entries_to_resp(entries: &[StreamEntry]) -> RespValue {
    RespValue::Array(entries.iter().map(StreamEntry::to_resp).collect())
}

/// XREAD reply: one `[stream name, entries]` pair per stream that had entries.
pub fn parse_streams_to_resp(streams: &[(String, Vec<StreamEntry>)]) -> RespValue {
    RespValue::Array(
        streams
            .iter()
            .map(|(name, entries)| {
                RespValue::Array(vec![
                    RespValue::BulkString(name.clone()),
                    parse_stream_entries_to_resp(entries),
                ])
            })
            .collect(),
    )
}
