pub mod filter;
pub mod member_id;
pub mod member_id_sequence;
pub mod registrant;
pub mod sector;
pub mod status;

pub use filter::{RegistrantFilter, StatusFilter};
pub use member_id::{IdKind, MemberId, SEQUENCE_WIDTH};
pub use member_id_sequence::MemberIdSequence;
pub use registrant::{NewRegistrant, Registrant};
pub use sector::{
    Sector, SectorCategory, SectorEntry, SectorTable, GENERIC_PREFIX, INCOMPLETE_PREFIX,
    NON_COMPLIANT_PREFIX,
};
pub use status::RegistrantStatus;
