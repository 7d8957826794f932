//! [`Messenger`] adapter for the Telegram Bot API.
//!
//! The Bot API cannot read channel history, so recent documents are taken
//! from the public web preview (`https://t.me/s/<channel>`), paging backwards
//! with `?before=<id>` until the search window is filled.
//!
//! Downloading a channel document takes four calls:
//!
//! 1. `forwardMessage` into the staging chat (yields a `file_id`).
//! 2. `getFile` to obtain the file path.
//! 3. GET `<api>/file/bot<token>/<path>` streamed to disk.
//! 4. `deleteMessage` on the staging copy (best effort).
//!
//! Error messages name the API method, never the request URL, because the
//! URL embeds the bot token.

use std::fs::File;
use std::io::{BufWriter, Cursor, Read, Write};
use std::path::Path;
use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde_json::{json, Value};

use modrelay_core::{Credentials, MessageId, MessageRef, RunConfig};

use crate::error::{io_err, malformed, SourceError};
use crate::http::agent;
use crate::messenger::{ChannelDocument, Messenger};

pub const DEFAULT_API_BASE: &str = "https://api.telegram.org";
pub const DEFAULT_PREVIEW_BASE: &str = "https://t.me";

/// Telegram Bot API client.
pub struct BotApiMessenger {
    api: ureq::Agent,
    transfer: ureq::Agent,
    api_base: String,
    preview_base: String,
    token: String,
    staging_chat: String,
}

impl BotApiMessenger {
    pub fn new(config: &RunConfig, credentials: &Credentials) -> Self {
        Self {
            api: agent(config.resolve_timeout),
            transfer: agent(config.transfer_timeout),
            api_base: config
                .bot_api_base
                .as_deref()
                .unwrap_or(DEFAULT_API_BASE)
                .trim_end_matches('/')
                .to_string(),
            preview_base: DEFAULT_PREVIEW_BASE.to_string(),
            token: credentials.bot_token.clone(),
            staging_chat: config.staging_chat.clone(),
        }
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_base, self.token, method)
    }

    fn call(&self, method: &'static str, body: Value) -> Result<Value, SourceError> {
        let response = self.api.post(&self.method_url(method)).send_json(body);
        let envelope = read_envelope(method, response)?;
        unwrap_envelope(method, envelope)
    }

    fn preview_page(&self, channel: &str, before: Option<i64>) -> Result<String, SourceError> {
        let url = match before {
            Some(id) => format!("{}/s/{channel}?before={id}", self.preview_base),
            None => format!("{}/s/{channel}", self.preview_base),
        };
        let response = self.api.get(&url).call().map_err(|e| SourceError::Http {
            target: url.clone(),
            reason: transport_reason(e),
        })?;
        response.into_string().map_err(|e| SourceError::Http {
            target: url,
            reason: format!("reading body: {e}"),
        })
    }

    fn download_forwarded(&self, forwarded: &Value, dest: &Path) -> Result<u64, SourceError> {
        let file_id = forwarded
            .pointer("/document/file_id")
            .and_then(Value::as_str)
            .ok_or_else(|| malformed("forwardMessage", "forwarded message has no document"))?;

        let file = self.call("getFile", json!({ "file_id": file_id }))?;
        let file_path = file
            .get("file_path")
            .and_then(Value::as_str)
            .ok_or_else(|| malformed("getFile", "missing file_path"))?;

        let url = format!("{}/file/bot{}/{}", self.api_base, self.token, file_path);
        let response = self.transfer.get(&url).call().map_err(|e| SourceError::Http {
            target: "file download".into(),
            reason: transport_reason(e),
        })?;

        let out = File::create(dest).map_err(|e| io_err(dest, e))?;
        let mut writer = BufWriter::new(out);
        let written =
            std::io::copy(&mut response.into_reader(), &mut writer).map_err(|e| io_err(dest, e))?;
        writer.flush().map_err(|e| io_err(dest, e))?;
        Ok(written)
    }
}

impl Messenger for BotApiMessenger {
    fn recent_documents(
        &self,
        channel: &str,
        limit: usize,
    ) -> Result<Vec<ChannelDocument>, SourceError> {
        let channel = channel.trim_start_matches('@');
        let mut documents = Vec::new();
        let mut scanned = 0usize;
        let mut before: Option<i64> = None;

        while scanned < limit {
            let html = self.preview_page(channel, before)?;
            let posts: Vec<PreviewPost> = parse_preview(&html, channel)
                .into_iter()
                .filter(|p| before.map_or(true, |b| p.message_id < b))
                .collect();
            let Some(oldest) = posts.last().map(|p| p.message_id) else {
                break;
            };
            for post in posts {
                if scanned == limit {
                    break;
                }
                scanned += 1;
                if let Some(doc) = post.document {
                    documents.push(doc);
                }
            }
            before = Some(oldest);
        }

        tracing::debug!(channel, scanned, found = documents.len(), "scanned channel preview");
        Ok(documents)
    }

    fn download_document(&self, message: &MessageRef, dest: &Path) -> Result<u64, SourceError> {
        let forwarded = self.call(
            "forwardMessage",
            json!({
                "chat_id": chat_id_value(&self.staging_chat),
                "from_chat_id": chat_id_value(&message.channel),
                "message_id": message.message_id.0,
                "disable_notification": true,
            }),
        )?;

        let result = self.download_forwarded(&forwarded, dest);

        if let Some(staged) = forwarded.get("message_id").and_then(Value::as_i64) {
            if let Err(err) = self.delete_message(&self.staging_chat, MessageId(staged)) {
                tracing::warn!(error = %err, "could not remove staging copy");
            }
        }
        result
    }

    fn send_document(
        &self,
        chat: &str,
        path: &Path,
        caption: &str,
    ) -> Result<MessageId, SourceError> {
        let file = File::open(path).map_err(|e| io_err(path, e))?;
        let file_len = file.metadata().map_err(|e| io_err(path, e))?.len();
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "artifact".to_string());

        let boundary = format!(
            "modrelay-{:x}",
            Utc::now().timestamp_nanos_opt().unwrap_or_default()
        );
        let (head, tail) = multipart_parts(
            &boundary,
            &[
                ("chat_id", chat),
                ("caption", caption),
                ("parse_mode", "HTML"),
                ("disable_notification", "true"),
            ],
            ("document", &file_name),
        );

        // The artifact is streamed between the two in-memory parts.
        let content_length = head.len() as u64 + file_len + tail.len() as u64;
        let response = self
            .transfer
            .post(&self.method_url("sendDocument"))
            .set(
                "Content-Type",
                &format!("multipart/form-data; boundary={boundary}"),
            )
            .set("Content-Length", &content_length.to_string())
            .send(Cursor::new(head).chain(file).chain(Cursor::new(tail)));
        let envelope = read_envelope("sendDocument", response)?;
        let message = unwrap_envelope("sendDocument", envelope)?;
        message
            .get("message_id")
            .and_then(Value::as_i64)
            .map(MessageId)
            .ok_or_else(|| malformed("sendDocument", "missing message_id"))
    }

    fn delete_message(&self, chat: &str, id: MessageId) -> Result<(), SourceError> {
        self.call(
            "deleteMessage",
            json!({ "chat_id": chat_id_value(chat), "message_id": id.0 }),
        )?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Envelope handling
// ---------------------------------------------------------------------------

fn read_envelope(
    method: &'static str,
    response: Result<ureq::Response, ureq::Error>,
) -> Result<Value, SourceError> {
    match response {
        Ok(r) => r.into_json().map_err(|e| SourceError::Http {
            target: method.to_string(),
            reason: format!("reading body: {e}"),
        }),
        // Error statuses still carry the JSON envelope with a description.
        Err(ureq::Error::Status(code, r)) => Ok(r
            .into_json()
            .unwrap_or_else(|_| json!({ "ok": false, "description": format!("status {code}") }))),
        Err(e) => Err(SourceError::Http {
            target: method.to_string(),
            reason: transport_reason(e),
        }),
    }
}

fn unwrap_envelope(method: &'static str, envelope: Value) -> Result<Value, SourceError> {
    if envelope.get("ok").and_then(Value::as_bool) == Some(true) {
        return envelope
            .get("result")
            .cloned()
            .ok_or_else(|| malformed(method, "missing result"));
    }
    let description = envelope
        .get("description")
        .and_then(Value::as_str)
        .unwrap_or("no description")
        .to_string();
    Err(SourceError::Api {
        method,
        description,
    })
}

fn transport_reason(err: ureq::Error) -> String {
    match err {
        ureq::Error::Status(code, _) => format!("status {code}"),
        ureq::Error::Transport(t) => t.kind().to_string(),
    }
}

/// Numeric ids go as numbers, usernames as `@name`.
fn chat_id_value(chat: &str) -> Value {
    match chat.parse::<i64>() {
        Ok(id) => json!(id),
        Err(_) if chat.starts_with('@') => json!(chat),
        Err(_) => json!(format!("@{chat}")),
    }
}

// ---------------------------------------------------------------------------
// Multipart
// ---------------------------------------------------------------------------

/// Multipart framing around a single file part: everything before the file
/// bytes, and the closing boundary after them.
pub(crate) fn multipart_parts(
    boundary: &str,
    fields: &[(&str, &str)],
    file: (&str, &str),
) -> (Vec<u8>, Vec<u8>) {
    let mut head = Vec::new();
    for (name, value) in fields {
        head.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
        head.extend_from_slice(
            format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
        );
        head.extend_from_slice(value.as_bytes());
        head.extend_from_slice(b"\r\n");
    }
    let (field, file_name) = file;
    let file_name = file_name.replace(['"', '\r', '\n'], "_");
    head.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
    head.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\n\
             Content-Type: application/octet-stream\r\n\r\n"
        )
        .as_bytes(),
    );
    let tail = format!("\r\n--{boundary}--\r\n").into_bytes();
    (head, tail)
}

// ---------------------------------------------------------------------------
// Web preview parsing
// ---------------------------------------------------------------------------

/// One message block of the channel web preview.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PreviewPost {
    pub message_id: i64,
    pub document: Option<ChannelDocument>,
}

fn post_id_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"^[^/"]+/(\d+)""#).expect("static regex"))
}

fn document_title_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"class="tgme_widget_message_document_title[^"]*"[^>]*>([^<]*)<"#)
            .expect("static regex")
    })
}

fn time_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"<time datetime="([^"]+)""#).expect("static regex"))
}

/// Parse a preview page into posts, newest first.
pub(crate) fn parse_preview(html: &str, channel: &str) -> Vec<PreviewPost> {
    let mut posts: Vec<PreviewPost> = html
        .split("data-post=\"")
        .skip(1)
        .filter_map(|block| {
            let id: i64 = post_id_re().captures(block)?.get(1)?.as_str().parse().ok()?;
            let document = document_title_re()
                .captures(block)
                .and_then(|c| c.get(1))
                .map(|m| unescape_html(m.as_str().trim()))
                .filter(|name| !name.is_empty())
                .map(|file_name| ChannelDocument {
                    message: MessageRef {
                        channel: channel.to_string(),
                        message_id: MessageId(id),
                    },
                    file_name,
                    posted_at: time_re()
                        .captures(block)
                        .and_then(|c| c.get(1))
                        .and_then(|m| DateTime::parse_from_rfc3339(m.as_str()).ok())
                        .map(|dt| dt.with_timezone(&Utc)),
                });
            Some(PreviewPost {
                message_id: id,
                document,
            })
        })
        .collect();
    posts.sort_by(|a, b| b.message_id.cmp(&a.message_id));
    posts.dedup_by_key(|p| p.message_id);
    posts
}

fn unescape_html(raw: &str) -> String {
    raw.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}
