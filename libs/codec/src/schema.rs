//! Таблица `EPM` (Entity Profile Message) в раскладке FlatBuffers.
//!
//! Слоты vtable совпадают с опубликованной схемой EPM; из неё используются
//! только четыре строковых поля, остальные слоты остаются пустыми.

use flatbuffers::{Follow, ForwardsUOffset, InvalidFlatbuffer, Table, VOffsetT, Verifiable, Verifier};

pub const VT_DN: VOffsetT = 4;
pub const VT_LEGAL_NAME: VOffsetT = 6;
pub const VT_EMAIL: VOffsetT = 26;
pub const VT_TELEPHONE: VOffsetT = 28;

#[derive(Copy, Clone, PartialEq)]
pub struct Epm<'a> {
    tab: Table<'a>,
}

impl<'a> Follow<'a> for Epm<'a> {
    type Inner = Epm<'a>;

    #[inline]
    unsafe fn follow(buf: &'a [u8], loc: usize) -> Self::Inner {
        Self { tab: unsafe { Table::new(buf, loc) } }
    }
}

impl<'a> Epm<'a> {
    // Safety (для всех аксессоров): Epm получен через верифицированный
    // `flatbuffers::root`, слот либо пуст, либо содержит валидную строку.

    #[inline]
    pub fn dn(&self) -> Option<&'a str> {
        unsafe { self.tab.get::<ForwardsUOffset<&str>>(VT_DN, None) }
    }

    #[inline]
    pub fn legal_name(&self) -> Option<&'a str> {
        unsafe { self.tab.get::<ForwardsUOffset<&str>>(VT_LEGAL_NAME, None) }
    }

    #[inline]
    pub fn email(&self) -> Option<&'a str> {
        unsafe { self.tab.get::<ForwardsUOffset<&str>>(VT_EMAIL, None) }
    }

    #[inline]
    pub fn telephone(&self) -> Option<&'a str> {
        unsafe { self.tab.get::<ForwardsUOffset<&str>>(VT_TELEPHONE, None) }
    }
}

impl Verifiable for Epm<'_> {
    #[inline]
    fn run_verifier(v: &mut Verifier, pos: usize) -> Result<(), InvalidFlatbuffer> {
        v.visit_table(pos)?
            .visit_field::<ForwardsUOffset<&str>>("DN", VT_DN, false)?
            .visit_field::<ForwardsUOffset<&str>>("LEGAL_NAME", VT_LEGAL_NAME, false)?
            .visit_field::<ForwardsUOffset<&str>>("EMAIL", VT_EMAIL, false)?
            .visit_field::<ForwardsUOffset<&str>>("TELEPHONE", VT_TELEPHONE, false)?
            .finish();
        Ok(())
    }
}
