use serde::{Deserialize, Serialize};

// ════════════════════════════════════════════════════════════════
//  Constants
// ════════════════════════════════════════════════════════════════

/// FlatBuffers file identifier таблицы EPM (4 байта).
pub const EPM_FILE_ID: &str = "$EPM";

/// Размер префикса длины фрейма (u32, little endian).
pub const LENGTH_PREFIX_LEN: usize = 4;

/// Количество записей, если клиент не указал своё.
pub const DEFAULT_COUNT: usize = 1000;

// ════════════════════════════════════════════════════════════════
//  Record
// ════════════════════════════════════════════════════════════════

/// Entity profile message: четыре строковых поля.
///
/// Не имеет идентичности кроме значений полей. Создаётся для кодирования,
/// после декодирования только наблюдается (лог, CLI) и отбрасывается.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Record {
    pub dn: String,
    pub legal_name: String,
    pub email: String,
    pub telephone: String,
}

impl Record {
    pub fn new(
        dn: impl Into<String>,
        legal_name: impl Into<String>,
        email: impl Into<String>,
        telephone: impl Into<String>,
    ) -> Self {
        Self {
            dn: dn.into(),
            legal_name: legal_name.into(),
            email: email.into(),
            telephone: telephone.into(),
        }
    }
}

impl std::fmt::Display for Record {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "DN: {}\nLEGAL NAME: {}\nEMAIL: {}\nTELEPHONE: {}",
            self.dn, self.legal_name, self.email, self.telephone
        )
    }
}
