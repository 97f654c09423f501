//! Carrier-script codec for data-carrying token outputs.

use thiserror::Error;

const OP_0: u8 = 0x00;
const OP_PUSHDATA1: u8 = 0x4c;
const OP_PUSHDATA2: u8 = 0x4d;
const OP_PUSHDATA4: u8 = 0x4e;
const OP_2DROP: u8 = 0x6d;
const OP_DROP: u8 = 0x75;
const OP_CHECKSIG: u8 = 0xac;

/// Errors raised while encoding or decoding carrier scripts.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScriptError {
    #[error("script truncated at byte {0}")]
    Truncated(usize),

    #[error("unexpected opcode {opcode:#04x} at byte {offset}")]
    UnexpectedOpcode { opcode: u8, offset: usize },

    #[error("push of {len} bytes exceeds the {remaining} remaining")]
    PushOverrun { len: usize, remaining: usize },

    #[error("field {0} is not present in the script")]
    MissingField(usize),

    #[error("{dropped} dropped stack items do not cover {fields} fields")]
    DropMismatch { dropped: usize, fields: usize },

    #[error("field of {0} bytes exceeds the push limit")]
    FieldTooLong(usize),
}

/// A decoded carrier script: the locking key plus the data fields it carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedScript {
    pub lock_key: Vec<u8>,
    pub fields: Vec<Vec<u8>>,
}

impl DecodedScript {
    /// Field at `index`, or a typed error when the script carries fewer.
    pub fn field(&self, index: usize) -> Result<&[u8], ScriptError> {
        self.fields
            .get(index)
            .map(Vec::as_slice)
            .ok_or(ScriptError::MissingField(index))
    }
}

/// Encodes data fields into locking scripts and back.
pub trait ScriptCodec: Send + Sync {
    fn encode(&self, lock_key: &[u8], fields: &[Vec<u8>]) -> Result<Vec<u8>, ScriptError>;
    fn decode(&self, script: &[u8]) -> Result<DecodedScript, ScriptError>;
}

/// The standard push-then-drop carrier script.
///
/// Layout: `<lock_key> OP_CHECKSIG <field 0> .. <field n-1>` followed by
/// enough `OP_2DROP`/`OP_DROP` opcodes to cover every field, so the data
/// never reaches the stack when the output is spent.
#[derive(Debug, Clone, Copy, Default)]
pub struct CarrierCodec;

impl CarrierCodec {
    fn push(out: &mut Vec<u8>, data: &[u8]) -> Result<(), ScriptError> {
        match data.len() {
            0 => out.push(OP_0),
            len @ 1..=75 => {
                out.push(len as u8);
                out.extend_from_slice(data);
            }
            len @ 76..=255 => {
                out.push(OP_PUSHDATA1);
                out.push(len as u8);
                out.extend_from_slice(data);
            }
            len @ 256..=65535 => {
                out.push(OP_PUSHDATA2);
                out.extend_from_slice(&(len as u16).to_le_bytes());
                out.extend_from_slice(data);
            }
            len if len <= u32::MAX as usize => {
                out.push(OP_PUSHDATA4);
                out.extend_from_slice(&(len as u32).to_le_bytes());
                out.extend_from_slice(data);
            }
            len => return Err(ScriptError::FieldTooLong(len)),
        }
        Ok(())
    }

    fn read_push<'a>(script: &'a [u8], offset: &mut usize) -> Result<&'a [u8], ScriptError> {
        let start = *offset;
        let op = *script.get(start).ok_or(ScriptError::Truncated(start))?;
        let (len, data_at) = match op {
            OP_0 => (0, start + 1),
            1..=75 => (op as usize, start + 1),
            OP_PUSHDATA1 => {
                let len = *script.get(start + 1).ok_or(ScriptError::Truncated(start + 1))?;
                (len as usize, start + 2)
            }
            OP_PUSHDATA2 => {
                let bytes = script
                    .get(start + 1..start + 3)
                    .ok_or(ScriptError::Truncated(start + 1))?;
                (u16::from_le_bytes([bytes[0], bytes[1]]) as usize, start + 3)
            }
            OP_PUSHDATA4 => {
                let bytes = script
                    .get(start + 1..start + 5)
                    .ok_or(ScriptError::Truncated(start + 1))?;
                (
                    u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as usize,
                    start + 5,
                )
            }
            other => {
                return Err(ScriptError::UnexpectedOpcode {
                    opcode: other,
                    offset: start,
                })
            }
        };
        let data = script
            .get(data_at..data_at + len)
            .ok_or(ScriptError::PushOverrun {
                len,
                remaining: script.len().saturating_sub(data_at),
            })?;
        *offset = data_at + len;
        Ok(data)
    }
}

impl ScriptCodec for CarrierCodec {
    fn encode(&self, lock_key: &[u8], fields: &[Vec<u8>]) -> Result<Vec<u8>, ScriptError> {
        let mut out = Vec::with_capacity(
            lock_key.len() + fields.iter().map(|f| f.len() + 5).sum::<usize>() + 8,
        );
        Self::push(&mut out, lock_key)?;
        out.push(OP_CHECKSIG);
        for field in fields {
            Self::push(&mut out, field)?;
        }
        let mut remaining = fields.len();
        while remaining >= 2 {
            out.push(OP_2DROP);
            remaining -= 2;
        }
        if remaining == 1 {
            out.push(OP_DROP);
        }
        Ok(out)
    }

    fn decode(&self, script: &[u8]) -> Result<DecodedScript, ScriptError> {
        let mut offset = 0;
        let lock_key = Self::read_push(script, &mut offset)?.to_vec();
        match script.get(offset) {
            Some(&OP_CHECKSIG) => offset += 1,
            Some(&op) => return Err(ScriptError::UnexpectedOpcode { opcode: op, offset }),
            None => return Err(ScriptError::Truncated(offset)),
        }

        let mut fields = Vec::new();
        while let Some(&op) = script.get(offset) {
            if op == OP_DROP || op == OP_2DROP {
                break;
            }
            fields.push(Self::read_push(script, &mut offset)?.to_vec());
        }

        let mut dropped = 0;
        while let Some(&op) = script.get(offset) {
            match op {
                OP_2DROP => dropped += 2,
                OP_DROP => dropped += 1,
                other => {
                    return Err(ScriptError::UnexpectedOpcode {
                        opcode: other,
                        offset,
                    })
                }
            }
            offset += 1;
        }
        if dropped != fields.len() {
            return Err(ScriptError::DropMismatch {
                dropped,
                fields: fields.len(),
            });
        }

        Ok(DecodedScript { lock_key, fields })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round_trip(fields: Vec<Vec<u8>>) {
        let codec = CarrierCodec;
        let script = codec.encode(b"02aabb", &fields).unwrap();
        let decoded = codec.decode(&script).unwrap();
        assert_eq!(decoded.lock_key, b"02aabb");
        assert_eq!(decoded.fields, fields);
    }

    #[test]
    fn round_trips_small_fields() {
        round_trip(vec![b"addr".to_vec(), b"ciphertext".to_vec()]);
        round_trip(vec![b"one".to_vec()]);
        round_trip(vec![b"a".to_vec(), b"b".to_vec(), b"c".to_vec()]);
        round_trip(vec![]);
    }

    #[test]
    fn round_trips_each_pushdata_width() {
        round_trip(vec![vec![0x42; 75], vec![0x42; 76]]);
        round_trip(vec![vec![0x42; 255], vec![0x42; 256]]);
        round_trip(vec![vec![0x42; 70_000]]);
    }

    #[test]
    fn round_trips_empty_field() {
        round_trip(vec![Vec::new(), b"data".to_vec()]);
    }

    #[test]
    fn wire_layout_is_stable() {
        let codec = CarrierCodec;
        let script = codec.encode(&[0x02], &[vec![0xaa], vec![0xbb]]).unwrap();
        assert_eq!(
            script,
            vec![0x01, 0x02, 0xac, 0x01, 0xaa, 0x01, 0xbb, 0x6d]
        );
    }

    #[test]
    fn rejects_truncated_script() {
        let codec = CarrierCodec;
        let mut script = codec
            .encode(b"key", &[b"payload".to_vec(), b"x".to_vec()])
            .unwrap();
        script.truncate(script.len() - 4);
        assert!(codec.decode(&script).is_err());
    }

    #[test]
    fn rejects_missing_checksig() {
        let codec = CarrierCodec;
        // <key> then a stray opcode instead of OP_CHECKSIG.
        let script = vec![0x01, 0x02, 0x51];
        match codec.decode(&script) {
            Err(ScriptError::UnexpectedOpcode { opcode: 0x51, .. }) => {}
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn rejects_uncovered_fields() {
        // <key> OP_CHECKSIG <field> with no trailing drop.
        let script = vec![0x01, 0x02, 0xac, 0x01, 0xaa];
        match CarrierCodec.decode(&script) {
            Err(ScriptError::DropMismatch {
                dropped: 0,
                fields: 1,
            }) => {}
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn field_accessor_reports_missing_index() {
        let codec = CarrierCodec;
        let script = codec.encode(b"key", &[b"only".to_vec()]).unwrap();
        let decoded = codec.decode(&script).unwrap();
        assert_eq!(decoded.field(0).unwrap(), b"only");
        assert_eq!(decoded.field(1), Err(ScriptError::MissingField(1)));
    }
}
