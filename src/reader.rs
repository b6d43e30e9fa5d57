//! RFID reader protocol engine.
//!
//! [`RfidReader`] exposes byte, hex, array and string oriented read/write
//! operations over a tag's linear memory, block lock and special-block
//! queries, ISO-15693 AFI/DSFID access, and a polling-driven tag
//! arrival/removal event pump. Block spanning and special-block skipping is
//! performed device-side; the engine builds the command, issues it through
//! the transport and decodes the JSON envelope into typed results.

use crate::error::{Result, RfidError};
use crate::events::{PumpState, TagEvent, parse_chunk};
use crate::options::RfidOptions;
use crate::status::{BlockRange, OperationStatus, TagResult, resolve_message};
use crate::taginfo::RfidTagInfo;
use crate::transport::HubTransport;
use futures_core::stream::Stream;
use log::{debug, info, warn};
use serde_json::Value;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, RwLock};
use tokio::sync::broadcast;

/// Payloads up to this size are written inline in the command URL; larger
/// ones switch to the bulk upload path.
const INLINE_WRITE_MAX: usize = 16;

type EventCallback = Box<dyn Fn(&TagEvent) + Send + Sync>;
type CallbackErrorSink = Box<dyn Fn(&str) + Send + Sync>;

/// Client for one RFID-capable module function on a hub.
///
/// Tag operations are self-contained round-trips and may be interleaved
/// freely. The event pump ([`handle_notification`](Self::handle_notification))
/// mutates shared bookkeeping and must be driven from a single task at a
/// time; external synchronization is required to pump one reader from
/// several tasks.
pub struct RfidReader<T: HubTransport> {
    transport: Arc<T>,
    function: String,
    pump: Arc<RwLock<PumpState>>,
    callback: Arc<RwLock<Option<EventCallback>>>,
    error_sink: Arc<RwLock<Option<CallbackErrorSink>>>,
    event_tx: broadcast::Sender<TagEvent>,
}

impl<T: HubTransport> Clone for RfidReader<T> {
    fn clone(&self) -> Self {
        Self {
            transport: self.transport.clone(),
            function: self.function.clone(),
            pump: self.pump.clone(),
            callback: self.callback.clone(),
            error_sink: self.error_sink.clone(),
            event_tx: self.event_tx.clone(),
        }
    }
}

impl<T: HubTransport> RfidReader<T> {
    /// Creates a reader bound to the given function name (e.g. `"rfid"`) on
    /// the transport.
    pub fn new(transport: Arc<T>, function: &str) -> Self {
        let (event_tx, _) = broadcast::channel(32);
        Self {
            transport,
            function: function.to_string(),
            pump: Arc::new(RwLock::new(PumpState::default())),
            callback: Arc::new(RwLock::new(None)),
            error_sink: Arc::new(RwLock::new(None)),
            event_tx,
        }
    }

    pub fn function(&self) -> &str {
        &self.function
    }

    // -------------------------------------------------------------------------
    // Internal state helpers
    // -------------------------------------------------------------------------

    fn with_pump<R>(&self, f: impl FnOnce(&PumpState) -> R) -> R {
        f(&self.pump.read().expect("Pump state lock poisoned"))
    }

    fn with_pump_mut<R>(&self, f: impl FnOnce(&mut PumpState) -> R) -> R {
        f(&mut self.pump.write().expect("Pump state lock poisoned"))
    }

    fn cmd_path(&self, query: &str) -> String {
        format!("/api/{}.json?{}", self.function, query)
    }

    /// Issues a tag command and returns the decoded envelope, converting
    /// both local failures and non-zero device codes into a status.
    async fn tag_command(&self, tag_id: &str, query: &str) -> TagResult<Value> {
        let body = match self.transport.request(&self.cmd_path(query)).await {
            Ok(b) => b,
            Err(e) => {
                warn!("Command failed for tag {}: {}", tag_id, e);
                return Err(OperationStatus::local(tag_id, &e));
            }
        };
        self.decode_envelope(tag_id, &body)
    }

    fn decode_envelope(&self, tag_id: &str, body: &[u8]) -> TagResult<Value> {
        let json: Value = serde_json::from_slice(body)
            .map_err(|e| OperationStatus::local(tag_id, &RfidError::from(e)))?;
        let err = match json.get("err").and_then(Value::as_i64) {
            Some(code) => code as i32,
            None => {
                let e = RfidError::Protocol("response envelope missing err".to_string());
                return Err(OperationStatus::local(tag_id, &e));
            }
        };
        if err != 0 {
            return Err(OperationStatus::from_device(
                tag_id,
                err,
                get_i32(&json, "blk"),
                get_i32(&json, "fab"),
                get_i32(&json, "lab"),
            ));
        }
        Ok(json)
    }

    fn res_hex<'a>(&self, json: &'a Value) -> &'a str {
        json.get("res").and_then(Value::as_str).unwrap_or("")
    }
}

// -------------------------------------------------------------------------
// Read operations
// -------------------------------------------------------------------------
impl<T: HubTransport> RfidReader<T> {
    /// Reads `n_bytes` bytes from the tag memory, starting at the first byte
    /// of `first_block`. The device spans blocks and skips special blocks as
    /// needed; enable raw access in `opts` to address special blocks
    /// directly.
    pub async fn tag_read_bin(
        &self,
        tag_id: &str,
        first_block: u32,
        n_bytes: u32,
        opts: &RfidOptions,
    ) -> TagResult<Vec<u8>> {
        if n_bytes == 0 {
            return Ok(Vec::new());
        }
        let query = format!(
            "a=read&t={}&b={}&n={}{}",
            tag_id,
            first_block,
            n_bytes,
            opts.to_query()
        );
        let json = self.tag_command(tag_id, &query).await?;
        hex::decode(self.res_hex(&json))
            .map_err(|e| OperationStatus::local(tag_id, &RfidError::from(e)))
    }

    /// Like [`tag_read_bin`](Self::tag_read_bin) but keeps the payload as
    /// the verbatim hex string from the device.
    pub async fn tag_read_hex(
        &self,
        tag_id: &str,
        first_block: u32,
        n_bytes: u32,
        opts: &RfidOptions,
    ) -> TagResult<String> {
        if n_bytes == 0 {
            return Ok(String::new());
        }
        let query = format!(
            "a=read&t={}&b={}&n={}{}",
            tag_id,
            first_block,
            n_bytes,
            opts.to_query()
        );
        let json = self.tag_command(tag_id, &query).await?;
        // Validate even though the string is returned verbatim.
        let res = self.res_hex(&json).to_string();
        hex::decode(&res).map_err(|e| OperationStatus::local(tag_id, &RfidError::from(e)))?;
        Ok(res)
    }

    /// Reads bytes as a list of integer values, for symmetry with the wire
    /// API's array form.
    pub async fn tag_read_array(
        &self,
        tag_id: &str,
        first_block: u32,
        n_bytes: u32,
        opts: &RfidOptions,
    ) -> TagResult<Vec<i32>> {
        let bytes = self.tag_read_bin(tag_id, first_block, n_bytes, opts).await?;
        Ok(bytes.iter().map(|&b| b as i32).collect())
    }

    /// Reads bytes as ISO-8859-1 text (one char per byte).
    pub async fn tag_read_str(
        &self,
        tag_id: &str,
        first_block: u32,
        n_chars: u32,
        opts: &RfidOptions,
    ) -> TagResult<String> {
        let bytes = self.tag_read_bin(tag_id, first_block, n_chars, opts).await?;
        Ok(bytes.iter().map(|&b| b as char).collect())
    }
}

// -------------------------------------------------------------------------
// Write operations
// -------------------------------------------------------------------------
impl<T: HubTransport> RfidReader<T> {
    /// Writes `data` to the tag memory starting at `first_block`. Payloads
    /// of up to 16 bytes go inline in the command URL; larger payloads use
    /// the bulk upload path. The device aligns the transfer to block
    /// boundaries and zero-pads the final partial block.
    ///
    /// Returns the block range actually affected when the device reports it
    /// (device-side padding can widen the requested range);
    /// [`BlockRange::NONE`] otherwise.
    pub async fn tag_write_bin(
        &self,
        tag_id: &str,
        first_block: u32,
        data: &[u8],
        opts: &RfidOptions,
    ) -> TagResult<BlockRange> {
        if data.is_empty() {
            return Ok(BlockRange::NONE);
        }
        let json = if data.len() <= INLINE_WRITE_MAX {
            let query = format!(
                "a=writ&t={}&b={}&w={}{}",
                tag_id,
                first_block,
                hex::encode(data),
                opts.to_query()
            );
            self.tag_command(tag_id, &query).await?
        } else {
            let target = format!(
                "Rfid:t={}&b={}&n={}{}",
                tag_id,
                first_block,
                data.len(),
                opts.to_query()
            );
            let body = match self.transport.upload(&target, data).await {
                Ok(b) => b,
                Err(e) => {
                    warn!("Upload failed for tag {}: {}", tag_id, e);
                    return Err(OperationStatus::local(tag_id, &e));
                }
            };
            self.decode_envelope(tag_id, &body)?
        };
        Ok(affected_range(&json))
    }

    /// Writes a hex string payload. The string must have even length and
    /// contain only hex digits.
    pub async fn tag_write_hex(
        &self,
        tag_id: &str,
        first_block: u32,
        hex_str: &str,
        opts: &RfidOptions,
    ) -> TagResult<BlockRange> {
        let data = hex::decode(hex_str).map_err(|e| {
            OperationStatus::local(
                tag_id,
                &RfidError::InvalidArgument(format!("invalid hex payload: {}", e)),
            )
        })?;
        self.tag_write_bin(tag_id, first_block, &data, opts).await
    }

    /// Writes a list of byte values (each must fit in 0..=255).
    pub async fn tag_write_array(
        &self,
        tag_id: &str,
        first_block: u32,
        values: &[i32],
        opts: &RfidOptions,
    ) -> TagResult<BlockRange> {
        let mut data = Vec::with_capacity(values.len());
        for &v in values {
            if !(0..=255).contains(&v) {
                return Err(OperationStatus::local(
                    tag_id,
                    &RfidError::InvalidArgument(format!("byte value out of range: {}", v)),
                ));
            }
            data.push(v as u8);
        }
        self.tag_write_bin(tag_id, first_block, &data, opts).await
    }

    /// Writes text as ISO-8859-1 (one byte per char; chars above U+00FF are
    /// rejected).
    pub async fn tag_write_str(
        &self,
        tag_id: &str,
        first_block: u32,
        text: &str,
        opts: &RfidOptions,
    ) -> TagResult<BlockRange> {
        let mut data = Vec::with_capacity(text.len());
        for c in text.chars() {
            let cp = c as u32;
            if cp > 0xFF {
                return Err(OperationStatus::local(
                    tag_id,
                    &RfidError::InvalidArgument(format!(
                        "char {:?} cannot be encoded as ISO-8859-1",
                        c
                    )),
                ));
            }
            data.push(cp as u8);
        }
        self.tag_write_bin(tag_id, first_block, &data, opts).await
    }
}

// -------------------------------------------------------------------------
// Lock and special-block operations
// -------------------------------------------------------------------------
impl<T: HubTransport> RfidReader<T> {
    /// Permanently locks `n_blocks` blocks starting at `first_block`.
    ///
    /// Locking is physically irreversible at the tag level. The engine never
    /// retries this command internally: after an ambiguous response a retry
    /// could double-lock or mis-attribute which blocks got locked. On
    /// failure, inspect the affected range of the status before deciding
    /// anything.
    pub async fn tag_lock_blocks(
        &self,
        tag_id: &str,
        first_block: u32,
        n_blocks: u32,
        opts: &RfidOptions,
    ) -> TagResult<BlockRange> {
        let query = format!(
            "a=lock&t={}&b={}&n={}{}",
            tag_id,
            first_block,
            n_blocks,
            opts.to_query()
        );
        let json = self.tag_command(tag_id, &query).await?;
        let mut range = affected_range(&json);
        if range == BlockRange::NONE && n_blocks > 0 {
            range = BlockRange::new(first_block as i32, (first_block + n_blocks - 1) as i32);
        }
        Ok(range)
    }

    /// Queries the lock state of `n_blocks` blocks starting at
    /// `first_block`; one boolean per block.
    pub async fn get_tag_lock_state(
        &self,
        tag_id: &str,
        first_block: u32,
        n_blocks: u32,
        opts: &RfidOptions,
    ) -> TagResult<Vec<bool>> {
        self.block_bitmap(tag_id, "chkl", first_block, n_blocks, opts)
            .await
    }

    /// Reports which of `n_blocks` blocks starting at `first_block` are
    /// special (configuration) blocks rather than user data.
    pub async fn get_tag_special_blocks(
        &self,
        tag_id: &str,
        first_block: u32,
        n_blocks: u32,
        opts: &RfidOptions,
    ) -> TagResult<Vec<bool>> {
        self.block_bitmap(tag_id, "chks", first_block, n_blocks, opts)
            .await
    }

    async fn block_bitmap(
        &self,
        tag_id: &str,
        action: &str,
        first_block: u32,
        n_blocks: u32,
        opts: &RfidOptions,
    ) -> TagResult<Vec<bool>> {
        if n_blocks == 0 {
            return Ok(Vec::new());
        }
        let query = format!(
            "a={}&t={}&b={}&n={}{}",
            action,
            tag_id,
            first_block,
            n_blocks,
            opts.to_query()
        );
        let json = self.tag_command(tag_id, &query).await?;
        decode_bitmap(self.res_hex(&json), n_blocks)
            .map_err(|e| OperationStatus::local(tag_id, &e))
    }
}

// -------------------------------------------------------------------------
// ISO-15693 AFI / DSFID
// -------------------------------------------------------------------------
impl<T: HubTransport> RfidReader<T> {
    /// Reads the Application Family Identifier byte (ISO 15693 only).
    pub async fn get_tag_afi(&self, tag_id: &str, opts: &RfidOptions) -> TagResult<u8> {
        self.read_special_byte(tag_id, 0, opts).await
    }

    /// Writes the Application Family Identifier byte (ISO 15693 only).
    pub async fn set_tag_afi(&self, tag_id: &str, afi: u8, opts: &RfidOptions) -> TagResult<()> {
        self.write_special_byte(tag_id, 0, afi, opts).await
    }

    /// Permanently locks the AFI byte to its current value (irreversible).
    pub async fn lock_tag_afi(&self, tag_id: &str, opts: &RfidOptions) -> TagResult<()> {
        self.lock_special_byte(tag_id, 0, opts).await
    }

    /// Reads the Data Storage Format Identifier byte (ISO 15693 only).
    pub async fn get_tag_dsfid(&self, tag_id: &str, opts: &RfidOptions) -> TagResult<u8> {
        self.read_special_byte(tag_id, 1, opts).await
    }

    /// Writes the Data Storage Format Identifier byte (ISO 15693 only).
    pub async fn set_tag_dsfid(&self, tag_id: &str, dsfid: u8, opts: &RfidOptions) -> TagResult<()> {
        self.write_special_byte(tag_id, 1, dsfid, opts).await
    }

    /// Permanently locks the DSFID byte to its current value (irreversible).
    pub async fn lock_tag_dsfid(&self, tag_id: &str, opts: &RfidOptions) -> TagResult<()> {
        self.lock_special_byte(tag_id, 1, opts).await
    }

    async fn read_special_byte(&self, tag_id: &str, bank: u8, opts: &RfidOptions) -> TagResult<u8> {
        let query = format!("a=rdsf&t={}&b={}{}", tag_id, bank, opts.to_query());
        let json = self.tag_command(tag_id, &query).await?;
        match res_scalar(&json) {
            Some(v @ 0..=255) => Ok(v as u8),
            _ => Err(OperationStatus::local(
                tag_id,
                &RfidError::Protocol("missing or out-of-range scalar result".to_string()),
            )),
        }
    }

    async fn write_special_byte(
        &self,
        tag_id: &str,
        bank: u8,
        value: u8,
        opts: &RfidOptions,
    ) -> TagResult<()> {
        let query = format!(
            "a=wrsf&t={}&b={}&v={}{}",
            tag_id,
            bank,
            value,
            opts.to_query()
        );
        self.tag_command(tag_id, &query).await.map(|_| ())
    }

    async fn lock_special_byte(&self, tag_id: &str, bank: u8, opts: &RfidOptions) -> TagResult<()> {
        let query = format!("a=lksf&t={}&b={}{}", tag_id, bank, opts.to_query());
        self.tag_command(tag_id, &query).await.map(|_| ())
    }
}

// -------------------------------------------------------------------------
// Tag presence enumeration
// -------------------------------------------------------------------------
impl<T: HubTransport> RfidReader<T> {
    /// Lists the identifiers of all tags currently seen by the reader.
    ///
    /// Best-effort: reflects the reader's live scan state, so a failure is
    /// reported as an empty list rather than a status.
    pub async fn get_tag_id_list(&self) -> Vec<String> {
        let body = match self.transport.request(&self.cmd_path("a=list")).await {
            Ok(b) => b,
            Err(e) => {
                warn!("Tag list query failed: {}", e);
                return Vec::new();
            }
        };
        let json: Value = match serde_json::from_slice(&body) {
            Ok(j) => j,
            Err(e) => {
                warn!("Tag list response is not valid JSON: {}", e);
                return Vec::new();
            }
        };
        json.get("list")
            .and_then(Value::as_array)
            .map(|arr| {
                arr.iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Queries type, memory size and block geometry for one tag. A tag that
    /// left the field mid-query surfaces as a recoverable status.
    pub async fn get_tag_info(&self, tag_id: &str) -> TagResult<RfidTagInfo> {
        let query = format!("a=info&t={}", tag_id);
        let json = self.tag_command(tag_id, &query).await?;
        let field = |name: &str| get_i32(&json, name).unwrap_or(0).max(0) as u32;
        Ok(RfidTagInfo::new(
            tag_id,
            get_i32(&json, "type").unwrap_or(0),
            field("size"),
            field("usable"),
            field("blksize"),
            field("fblk"),
            field("lblk"),
        ))
    }

    /// Resets the reader-side state and the local event-pump bookkeeping.
    pub async fn reset(&self) -> Result<()> {
        let body = self.transport.request(&self.cmd_path("a=reset")).await?;
        let json: Value = serde_json::from_slice(&body)?;
        let err = json.get("err").and_then(Value::as_i64).unwrap_or(0) as i32;
        if err != 0 {
            return Err(RfidError::Protocol(resolve_message(err, -1)));
        }
        self.with_pump_mut(|p| *p = PumpState::default());
        Ok(())
    }

    /// Number of tags currently detected (cached reader attribute).
    pub async fn get_tag_count(&self) -> Result<u32> {
        self.get_attr("tagCount").await
    }

    /// Presence polling frequency in Hz; 0 means the radio is off.
    pub async fn get_refresh_rate(&self) -> Result<u32> {
        self.get_attr("refreshRate").await
    }

    pub async fn set_refresh_rate(&self, hz: u32) -> Result<()> {
        let path = format!("/api/{}?refreshRate={}", self.function, hz);
        self.transport.request(&path).await.map(|_| ())
    }

    async fn get_attr(&self, name: &str) -> Result<u32> {
        let path = format!("/api/{}/{}", self.function, name);
        let body = self.transport.request(&path).await?;
        let text = String::from_utf8_lossy(&body);
        text.trim()
            .parse()
            .map_err(|_| RfidError::Protocol(format!("bad {} value: {:?}", name, text.trim())))
    }
}

// -------------------------------------------------------------------------
// Event notification pump
// -------------------------------------------------------------------------
impl<T: HubTransport> RfidReader<T> {
    /// Registers the tag arrival/removal callback. The next notification
    /// primes the pump from the full event log so that tags already in the
    /// field are accounted for before delta processing starts.
    pub fn register_event_callback<F>(&self, callback: F)
    where
        F: Fn(&TagEvent) + Send + Sync + 'static,
    {
        *self.callback.write().expect("Callback lock poisoned") = Some(Box::new(callback));
        self.with_pump_mut(|p| {
            p.first_invocation = true;
            p.event_stamp = 0.0;
        });
        debug!("Event callback registered for {}", self.function);
    }

    /// Removes the registered callback. Position bookkeeping keeps running.
    pub fn unregister_event_callback(&self) {
        *self.callback.write().expect("Callback lock poisoned") = None;
    }

    /// Installs a hook receiving a description of every callback panic.
    /// Without a sink, panics are logged at warn level. Either way the pump
    /// keeps going: one misbehaving callback never aborts event delivery.
    pub fn set_callback_error_sink<F>(&self, sink: F)
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        *self.error_sink.write().expect("Error sink lock poisoned") = Some(Box::new(sink));
    }

    /// Returns a stream of tag events, fed by the pump in parallel with the
    /// registered callback.
    pub fn events(&self) -> impl Stream<Item = TagEvent> + Send + 'static {
        let mut rx = self.event_tx.subscribe();
        async_stream::stream! {
            loop {
                match rx.recv().await {
                    Ok(ev) => yield ev,
                    Err(broadcast::error::RecvError::Closed) => break,
                    Err(broadcast::error::RecvError::Lagged(_)) => continue,
                }
            }
        }
    }

    /// Processes one "advertised value changed" notification carrying the
    /// reader's event-log write-position counter.
    ///
    /// Detects reader power cycles (counter moved backward by more than the
    /// wrap threshold), downloads the new portion of the event log and
    /// synthesizes per-tag callbacks. Must be driven externally, typically
    /// from the hub's notification channel or a periodic poll.
    pub async fn handle_notification(&self, advertised: &str) -> Result<()> {
        let counter: u32 = advertised.trim().parse().map_err(|_| {
            RfidError::Protocol(format!("bad advertised position counter: {:?}", advertised))
        })?;
        let power_cycled = self.with_pump_mut(|p| p.observe_counter(counter));
        if power_cycled {
            info!(
                "{}: reader power cycle detected, event continuity lost",
                self.function
            );
        }

        if self.callback.read().expect("Callback lock poisoned").is_none() {
            return Ok(());
        }

        let (first, last_pos) = self.with_pump(|p| (p.first_invocation, p.last_event_pos));
        if first {
            // Prime position state from the full log. The snapshot is not
            // turned into visible callbacks; delta processing starts from
            // the position marker it carries.
            let text = self.download_events(None).await?;
            let (events, pos) = parse_chunk(&text)?;
            self.with_pump_mut(|p| {
                p.last_event_pos = pos as i64;
                p.first_invocation = false;
            });
            debug!(
                "{}: event pump primed at position {} ({} records in snapshot)",
                self.function,
                pos,
                events.len()
            );
            return Ok(());
        }

        let text = self.download_events(Some(last_pos.max(0) as u64)).await?;
        let (events, new_pos) = parse_chunk(&text)?;
        let mut stamp = self.with_pump(|p| p.event_stamp);
        for ev in events {
            if ev.timestamp <= stamp {
                debug!("Dropping stale event at {} for {:?}", ev.timestamp, ev.tag_id);
                continue;
            }
            stamp = ev.timestamp;
            self.dispatch(&ev);
        }
        self.with_pump_mut(|p| {
            p.event_stamp = stamp;
            p.last_event_pos = new_pos as i64;
        });
        Ok(())
    }

    fn dispatch(&self, ev: &TagEvent) {
        let _ = self.event_tx.send(ev.clone());
        let guard = self.callback.read().expect("Callback lock poisoned");
        if let Some(cb) = guard.as_ref()
            && catch_unwind(AssertUnwindSafe(|| cb(ev))).is_err()
        {
            let msg = format!(
                "event callback panicked on {:?} event for tag {:?}",
                ev.kind, ev.tag_id
            );
            let sink = self.error_sink.read().expect("Error sink lock poisoned");
            match sink.as_ref() {
                Some(s) => s(&msg),
                None => warn!("{}", msg),
            }
        }
    }

    async fn download_events(&self, pos: Option<u64>) -> Result<String> {
        let path = match pos {
            None => format!("/{}/events.txt", self.function),
            Some(p) => format!("/{}/events.txt?pos={}", self.function, p),
        };
        let body = self.transport.request(&path).await?;
        String::from_utf8(body).map_err(|e| RfidError::DecodeError(e.to_string()))
    }
}

/// Extracts the 1-based affected-block range from a response envelope,
/// converted to 0-based; [`BlockRange::NONE`] when absent.
fn affected_range(json: &Value) -> BlockRange {
    BlockRange::new(
        get_i32(json, "fab").map_or(-1, |b| b - 1),
        get_i32(json, "lab").map_or(-1, |b| b - 1),
    )
}

fn get_i32(json: &Value, key: &str) -> Option<i32> {
    json.get(key).and_then(Value::as_i64).map(|v| v as i32)
}

fn res_scalar(json: &Value) -> Option<i64> {
    match json.get("res") {
        Some(Value::Number(n)) => n.as_i64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Unpacks a hex bitmap response (one bit per block, 8 per byte, LSB first)
/// into `n_blocks` booleans.
fn decode_bitmap(hex_str: &str, n_blocks: u32) -> Result<Vec<bool>> {
    let bytes = hex::decode(hex_str)?;
    let n = n_blocks as usize;
    if bytes.len() * 8 < n {
        return Err(RfidError::Protocol(format!(
            "bitmap too short: {} bits for {} blocks",
            bytes.len() * 8,
            n
        )));
    }
    Ok((0..n).map(|i| (bytes[i / 8] >> (i % 8)) & 1 == 1).collect())
}
