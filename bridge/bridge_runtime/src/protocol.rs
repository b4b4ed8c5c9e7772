use crate::element::Element;
use crate::error::{BridgeError, Result};
use crate::http_client::HttpResponse;
use crate::service::DataContext;
use crate::tree::TreeInsertionMode;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::io::{self, Read, Write};
use std::sync::mpsc::Receiver;

pub const BRIDGE_TO_HOST_CAP: usize = 4_194_304;
pub const HOST_TO_BRIDGE_CAP: usize = 1_048_576;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "t")]
pub enum BridgeEnvelope {
    #[serde(rename = "ready")]
    Ready { capabilities: Value },

    #[serde(rename = "result")]
    Result { id: u64, value: Option<String> },

    #[serde(rename = "error")]
    Error {
        id: Option<u64>,
        code: String,
        message: String,
    },

    #[serde(rename = "message")]
    Message { channel: String, payload: String },
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "t", rename_all_fields = "camelCase")]
pub enum HostEnvelope {
    #[serde(rename = "start")]
    Start { id: u64, params: StartParams },

    #[serde(rename = "createBeagleView")]
    CreateView { id: u64 },

    #[serde(rename = "httpClient.respond")]
    HttpRespond {
        id: u64,
        request_id: String,
        response: HttpResponse,
    },

    #[serde(rename = "call")]
    Call {
        id: u64,
        function_id: String,
        #[serde(default)]
        arguments: Option<Value>,
    },

    #[serde(rename = "callViewFunction")]
    CallViewFunction {
        id: u64,
        view_id: String,
        function_id: String,
        #[serde(default)]
        arguments: Value,
    },

    #[serde(rename = "promise.resolve")]
    ResolvePromise {
        id: u64,
        promise_id: String,
        #[serde(default)]
        value: Value,
    },

    #[serde(rename = "promise.reject")]
    RejectPromise {
        id: u64,
        promise_id: String,
        #[serde(default)]
        error: Value,
    },

    #[serde(rename = "render.getTreeContextHierarchy")]
    GetTreeContextHierarchy { id: u64, view_id: String },

    #[serde(rename = "render.getContextEvaluatedTemplate")]
    GetContextEvaluatedTemplate {
        id: u64,
        view_id: String,
        #[serde(default)]
        context: Vec<DataContext>,
        template_manager: Value,
    },

    #[serde(rename = "render.cloneTemplate")]
    CloneTemplate { id: u64, template: Element },

    #[serde(rename = "render.preProcessTemplateTree")]
    PreProcessTemplateTree { id: u64, tree: Element },

    #[serde(rename = "render.doTreeFullRender")]
    DoTreeFullRender {
        id: u64,
        view_id: String,
        anchor_id: String,
        #[serde(default)]
        children: Vec<Element>,
        #[serde(default)]
        mode: TreeInsertionMode,
    },
}

impl HostEnvelope {
    pub fn id(&self) -> u64 {
        match self {
            HostEnvelope::Start { id, .. }
            | HostEnvelope::CreateView { id }
            | HostEnvelope::HttpRespond { id, .. }
            | HostEnvelope::Call { id, .. }
            | HostEnvelope::CallViewFunction { id, .. }
            | HostEnvelope::ResolvePromise { id, .. }
            | HostEnvelope::RejectPromise { id, .. }
            | HostEnvelope::GetTreeContextHierarchy { id, .. }
            | HostEnvelope::GetContextEvaluatedTemplate { id, .. }
            | HostEnvelope::CloneTemplate { id, .. }
            | HostEnvelope::PreProcessTemplateTree { id, .. }
            | HostEnvelope::DoTreeFullRender { id, .. } => *id,
        }
    }
}

/// Parameters of the `start` command.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartParams {
    #[serde(default)]
    pub base_url: String,
    #[serde(default)]
    pub action_keys: Vec<String>,
    #[serde(default)]
    pub custom_operations: Vec<String>,
    #[serde(default)]
    pub enable_styling: bool,
    #[serde(default)]
    pub expanded_components_map: crate::policy::ExpansionPolicy,
    /// Remaining service options, handed to the UI library untouched.
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

pub fn ready_envelope() -> BridgeEnvelope {
    BridgeEnvelope::Ready {
        capabilities: serde_json::json!({
            "platform": crate::service::PLATFORM,
            "transport": "stdio-packet-4"
        }),
    }
}

pub fn result_envelope(id: u64, value: Option<String>) -> BridgeEnvelope {
    BridgeEnvelope::Result { id, value }
}

pub fn error_envelope(
    id: Option<u64>,
    code: impl Into<String>,
    message: impl Into<String>,
) -> BridgeEnvelope {
    BridgeEnvelope::Error {
        id,
        code: code.into(),
        message: message.into(),
    }
}

pub fn message_envelope(channel: impl Into<String>, payload: String) -> BridgeEnvelope {
    BridgeEnvelope::Message {
        channel: channel.into(),
        payload,
    }
}

pub fn writer_loop(rx: Receiver<BridgeEnvelope>) -> io::Result<()> {
    let stdout = io::stdout();
    let mut writer = stdout.lock();

    for envelope in rx {
        let payload = encode_bridge_envelope(&envelope)?;
        write_frame(&mut writer, &payload, BRIDGE_TO_HOST_CAP)?;
        writer.flush()?;
    }

    Ok(())
}

/// Reads host frames from stdin until EOF. A frame that fails to decode is
/// reported through `on_decode_error` and skipped; framing errors end the loop.
pub fn reader_loop<F, E>(on_envelope: F, on_decode_error: E) -> Result<()>
where
    F: FnMut(HostEnvelope),
    E: FnMut(serde_json::Error),
{
    let stdin = io::stdin();
    read_host_frames(&mut stdin.lock(), on_envelope, on_decode_error)
}

pub fn read_host_frames<R, F, E>(
    reader: &mut R,
    mut on_envelope: F,
    mut on_decode_error: E,
) -> Result<()>
where
    R: Read,
    F: FnMut(HostEnvelope),
    E: FnMut(serde_json::Error),
{
    loop {
        match read_frame(reader, HOST_TO_BRIDGE_CAP) {
            Ok(payload) => match decode_host_envelope(&payload) {
                Ok(envelope) => on_envelope(envelope),
                Err(err) => on_decode_error(err),
            },
            Err(err) if err.kind() == io::ErrorKind::UnexpectedEof => return Ok(()),
            Err(err) => return Err(BridgeError::Io(err)),
        }
    }
}

fn encode_bridge_envelope(envelope: &BridgeEnvelope) -> io::Result<Vec<u8>> {
    serde_json::to_vec(envelope).map_err(json_error)
}

fn decode_host_envelope(payload: &[u8]) -> serde_json::Result<HostEnvelope> {
    serde_json::from_slice(payload)
}

fn read_frame(reader: &mut impl Read, max_payload: usize) -> io::Result<Vec<u8>> {
    let mut len_buf = [0_u8; 4];
    reader.read_exact(&mut len_buf)?;

    let len = u32::from_be_bytes(len_buf) as usize;
    if len > max_payload {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("frame too large: {len} > {max_payload}"),
        ));
    }

    let mut payload = vec![0_u8; len];
    reader.read_exact(&mut payload)?;
    Ok(payload)
}

fn write_frame(writer: &mut impl Write, payload: &[u8], max_payload: usize) -> io::Result<()> {
    if payload.len() > max_payload {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("frame too large: {} > {}", payload.len(), max_payload),
        ));
    }

    let len = u32::try_from(payload.len())
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidData, "payload exceeds u32"))?;

    writer.write_all(&len.to_be_bytes())?;
    writer.write_all(payload)?;
    Ok(())
}

fn json_error(err: serde_json::Error) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, err)
}
