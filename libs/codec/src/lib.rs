//! FlatBuffers-кодек записи EPM.
//!
//! `encode` строит таблицу EPM и завершает буфер file identifier'ом `$EPM`;
//! `decode` проверяет identifier, затем верифицирует буфер и читает поля.
//! Префикс длины сюда не входит: его пишет фреймер.

pub mod schema;

use flatbuffers::{FlatBufferBuilder, WIPOffset};

use epm_api::{CodecError, EPM_FILE_ID, Record, RecordCodec};

use schema::{Epm, VT_DN, VT_EMAIL, VT_LEGAL_NAME, VT_TELEPHONE};

/// Смещение file identifier внутри payload: сразу за root uoffset.
pub const FILE_ID_OFFSET: usize = 4;

const FILE_ID_END: usize = FILE_ID_OFFSET + EPM_FILE_ID.len();

/// Кодек таблицы EPM. Stateless, один экземпляр на весь сервис.
#[derive(Debug, Clone, Copy, Default)]
pub struct EpmCodec;

impl EpmCodec {
    pub fn new() -> Self {
        Self
    }
}

impl RecordCodec for EpmCodec {
    fn encode(&self, record: &Record) -> Result<Vec<u8>, CodecError> {
        let capacity = 64
            + record.dn.len()
            + record.legal_name.len()
            + record.email.len()
            + record.telephone.len();
        let mut fbb = FlatBufferBuilder::with_capacity(capacity);

        let dn = fbb.create_string(&record.dn);
        let legal_name = fbb.create_string(&record.legal_name);
        let email = fbb.create_string(&record.email);
        let telephone = fbb.create_string(&record.telephone);

        let start = fbb.start_table();
        fbb.push_slot_always::<WIPOffset<_>>(VT_DN, dn);
        fbb.push_slot_always::<WIPOffset<_>>(VT_LEGAL_NAME, legal_name);
        fbb.push_slot_always::<WIPOffset<_>>(VT_EMAIL, email);
        fbb.push_slot_always::<WIPOffset<_>>(VT_TELEPHONE, telephone);
        let root = fbb.end_table(start);

        fbb.finish(root, Some(EPM_FILE_ID));
        Ok(fbb.finished_data().to_vec())
    }

    fn decode(&self, payload: &[u8]) -> Result<Record, CodecError> {
        check_file_identifier(payload)?;

        let epm = flatbuffers::root::<Epm>(payload).map_err(|e| CodecError::Invalid(e.to_string()))?;

        Ok(Record {
            dn: epm.dn().unwrap_or_default().to_string(),
            legal_name: epm.legal_name().unwrap_or_default().to_string(),
            email: epm.email().unwrap_or_default().to_string(),
            telephone: epm.telephone().unwrap_or_default().to_string(),
        })
    }

    fn file_identifier(&self) -> &'static str {
        EPM_FILE_ID
    }
}

/// File identifier payload'а, если payload достаточно длинный.
pub fn file_identifier(payload: &[u8]) -> Option<&[u8]> {
    payload.get(FILE_ID_OFFSET..FILE_ID_END)
}

fn check_file_identifier(payload: &[u8]) -> Result<(), CodecError> {
    let found = file_identifier(payload).ok_or(CodecError::TooShort {
        len: payload.len(),
        min: FILE_ID_END,
    })?;
    if found != EPM_FILE_ID.as_bytes() {
        return Err(CodecError::IdentifierMismatch {
            expected: EPM_FILE_ID,
            found: String::from_utf8_lossy(found).into_owned(),
        });
    }
    Ok(())
}
