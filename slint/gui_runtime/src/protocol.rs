use std::io::{self, Read, Write};
use std::sync::mpsc::Receiver;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ProtocolError;
use crate::events::Event;
use crate::methods::Method;
use crate::registry::lock;
use crate::responses::Response;

/// Everything the server sends to the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ServerFrame {
    Response(Response),
    Event(Event),
}

/// The client-bound stream, shared by the dispatch thread (responses) and the
/// event writer thread. Holding the lock for a whole frame keeps frames
/// from interleaving.
pub type SharedWriter = Arc<Mutex<Box<dyn Write + Send>>>;

pub fn shared_writer(writer: impl Write + Send + 'static) -> SharedWriter {
    Arc::new(Mutex::new(Box::new(writer)))
}

/// Messages for the event writer thread.
#[derive(Debug)]
pub enum Outbound {
    Event(Event),
    /// Sent once at teardown, after every event that precedes it.
    Close,
}

pub fn writer_loop(
    rx: Receiver<Outbound>,
    writer: SharedWriter,
    max_payload: usize,
) -> Result<(), ProtocolError> {
    for outbound in rx {
        match outbound {
            Outbound::Event(event) => {
                write_server_frame(&writer, &ServerFrame::Event(event), max_payload)?;
            }
            Outbound::Close => break,
        }
    }

    Ok(())
}

pub fn write_server_frame(
    writer: &SharedWriter,
    frame: &ServerFrame,
    max_payload: usize,
) -> Result<(), ProtocolError> {
    let payload = serde_json::to_vec(frame).map_err(ProtocolError::Encode)?;

    let mut writer = lock(writer);
    write_frame(&mut *writer, &payload, max_payload)?;
    writer.flush()?;
    Ok(())
}

/// Decodes one request. `Ok(None)` is the empty request (`{}` or `null`),
/// which carries no method.
pub fn decode_method(payload: &[u8]) -> Result<Option<Method>, ProtocolError> {
    let value: Value = serde_json::from_slice(payload).map_err(ProtocolError::Decode)?;

    match &value {
        Value::Null => return Ok(None),
        Value::Object(map) if map.is_empty() => return Ok(None),
        _ => {}
    }

    serde_json::from_value(value)
        .map(Some)
        .map_err(ProtocolError::Decode)
}

pub fn encode_method(method: &Method) -> Result<Vec<u8>, ProtocolError> {
    serde_json::to_vec(method).map_err(ProtocolError::Encode)
}

pub fn read_frame(reader: &mut impl Read, max_payload: usize) -> io::Result<Vec<u8>> {
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

pub fn write_frame(writer: &mut impl Write, payload: &[u8], max_payload: usize) -> io::Result<()> {
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
