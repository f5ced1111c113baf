use bytecheck::CheckBytes;
use rkyv::{AlignedVec, Archive, Deserialize, Serialize};
use thiserror::Error;

/// 'AQ' in ASCII hex. Used to identify Udara Binary Protocol frames.
pub const UBP_MAGIC: u16 = 0x5141;

pub const PROTOCOL_VERSION: u8 = 1;

/// Opcode for classifying a batch of raw readings.
pub const OP_PREDICT: u8 = 1;

/// Opcode carried by every server reply.
pub const OP_PREDICT_REPLY: u8 = 2;

pub const HEADER_LEN: usize = 16;

/// Frames announcing more than this are rejected before allocation.
pub const MAX_PAYLOAD: u32 = 4 * 1024 * 1024;

/// Most readings a single `OP_PREDICT` frame can carry under `MAX_PAYLOAD`.
/// Each archived reading is 48 bytes; 64 bytes are left for the root.
pub const MAX_READINGS: usize = (MAX_PAYLOAD as usize - 64) / 48;

pub const STATUS_OK: u8 = 0;
pub const STATUS_INVALID_INPUT: u8 = 1;
pub const STATUS_INTERNAL: u8 = 2;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WireError {
    #[error("Frame too short for UBP header ({0} bytes)")]
    Truncated(usize),
    #[error("Invalid magic number 0x{0:04x}")]
    BadMagic(u16),
    #[error("Unsupported protocol version {0}")]
    BadVersion(u8),
    #[error("Payload of {0} bytes exceeds limit")]
    Oversize(u32),
    #[error("Payload failed validation: {0}")]
    Invalid(String),
    #[error("Payload encoding failed: {0}")]
    Encode(String),
}

/// The fixed header in front of every frame.
///
/// # Layout (little-endian, 16 bytes)
/// - `magic` (2 bytes): Must be `0x5141`.
/// - `version` (1 byte): Protocol version (currently 1).
/// - `opcode` (1 byte): `OP_PREDICT` or `OP_PREDICT_REPLY`.
/// - `payload_len` (4 bytes): Length of the archived payload that follows.
/// - `request_id` (8 bytes): Client-generated correlation ID, echoed in the reply.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    pub magic: u16,
    pub version: u8,
    pub opcode: u8,
    pub payload_len: u32,
    pub request_id: u64,
}

impl FrameHeader {
    pub fn new(opcode: u8, payload_len: u32, request_id: u64) -> Self {
        Self {
            magic: UBP_MAGIC,
            version: PROTOCOL_VERSION,
            opcode,
            payload_len,
            request_id,
        }
    }

    pub fn to_bytes(&self) -> [u8; HEADER_LEN] {
        let mut out = [0u8; HEADER_LEN];
        out[0..2].copy_from_slice(&self.magic.to_le_bytes());
        out[2] = self.version;
        out[3] = self.opcode;
        out[4..8].copy_from_slice(&self.payload_len.to_le_bytes());
        out[8..16].copy_from_slice(&self.request_id.to_le_bytes());
        out
    }

    /// Parses and validates a header.
    ///
    /// # Errors
    /// Short input, wrong magic or version, or a payload over `MAX_PAYLOAD`.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, WireError> {
        if bytes.len() < HEADER_LEN {
            return Err(WireError::Truncated(bytes.len()));
        }
        let magic = u16::from_le_bytes([bytes[0], bytes[1]]);
        if magic != UBP_MAGIC {
            return Err(WireError::BadMagic(magic));
        }
        if bytes[2] != PROTOCOL_VERSION {
            return Err(WireError::BadVersion(bytes[2]));
        }
        let payload_len = u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);
        if payload_len > MAX_PAYLOAD {
            return Err(WireError::Oversize(payload_len));
        }
        let mut id = [0u8; 8];
        id.copy_from_slice(&bytes[8..16]);

        Ok(Self {
            magic,
            version: bytes[2],
            opcode: bytes[3],
            payload_len,
            request_id: u64::from_le_bytes(id),
        })
    }
}

/// Raw (unscaled) readings, each `[PM10, PM2.5, SO2, CO, O3, NO2]`.
#[derive(Archive, Serialize, Deserialize, Debug, Clone, PartialEq)]
#[archive_attr(derive(CheckBytes, Debug))]
pub struct PredictRequest {
    pub readings: Vec<[f64; 6]>,
}

/// One label (0..=3) per reading on success, otherwise a status and message.
#[derive(Archive, Serialize, Deserialize, Debug, Clone, PartialEq)]
#[archive_attr(derive(CheckBytes, Debug))]
pub struct PredictReply {
    pub status: u8,
    pub labels: Vec<u8>,
    pub message: String,
}

impl PredictReply {
    pub fn ok(labels: Vec<u8>) -> Self {
        Self { status: STATUS_OK, labels, message: String::new() }
    }

    pub fn failure(status: u8, message: impl Into<String>) -> Self {
        Self { status, labels: Vec::new(), message: message.into() }
    }
}

fn frame(opcode: u8, request_id: u64, payload: &[u8]) -> Result<Vec<u8>, WireError> {
    let len = u32::try_from(payload.len()).map_err(|_| WireError::Oversize(u32::MAX))?;
    if len > MAX_PAYLOAD {
        return Err(WireError::Oversize(len));
    }
    let mut out = Vec::with_capacity(HEADER_LEN + payload.len());
    out.extend_from_slice(&FrameHeader::new(opcode, len, request_id).to_bytes());
    out.extend_from_slice(payload);
    Ok(out)
}

// Archived roots must be read from aligned memory; socket buffers are not.
fn aligned(payload: &[u8]) -> AlignedVec {
    let mut buf = AlignedVec::with_capacity(payload.len());
    buf.extend_from_slice(payload);
    buf
}

/// Serializes a full request frame (header + payload).
pub fn encode_request(request_id: u64, request: &PredictRequest) -> Result<Vec<u8>, WireError> {
    let bytes = rkyv::to_bytes::<_, 1024>(request).map_err(|e| WireError::Encode(format!("{:?}", e)))?;
    frame(OP_PREDICT, request_id, &bytes)
}

/// Serializes a full reply frame (header + payload).
pub fn encode_reply(request_id: u64, reply: &PredictReply) -> Result<Vec<u8>, WireError> {
    let bytes = rkyv::to_bytes::<_, 256>(reply).map_err(|e| WireError::Encode(format!("{:?}", e)))?;
    frame(OP_PREDICT_REPLY, request_id, &bytes)
}

/// Validates and deserializes a request payload (the bytes after the header).
pub fn decode_request(payload: &[u8]) -> Result<PredictRequest, WireError> {
    let buf = aligned(payload);
    let archived = rkyv::check_archived_root::<PredictRequest>(&buf[..])
        .map_err(|e| WireError::Invalid(format!("{:?}", e)))?;
    let request: PredictRequest = archived.deserialize(&mut rkyv::Infallible).unwrap_or_else(|e| match e {});
    Ok(request)
}

/// Validates and deserializes a reply payload (the bytes after the header).
pub fn decode_reply(payload: &[u8]) -> Result<PredictReply, WireError> {
    let buf = aligned(payload);
    let archived = rkyv::check_archived_root::<PredictReply>(&buf[..])
        .map_err(|e| WireError::Invalid(format!("{:?}", e)))?;
    let reply: PredictReply = archived.deserialize(&mut rkyv::Infallible).unwrap_or_else(|e| match e {});
    Ok(reply)
}
