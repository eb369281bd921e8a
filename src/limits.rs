//! Hard limits on request and inventory sizes. Exceeding one is a validation error.

pub const MAX_GUESTS_PER_QUERY: u32 = 200;
pub const MAX_ROOMS_PER_QUERY: u32 = 100;
pub const MAX_QUANTITY: u32 = 100;
pub const MAX_STAY_NIGHTS: u32 = 365;
pub const MAX_PAGE_SIZE: usize = 100;
pub const DEFAULT_PAGE_SIZE: usize = 20;
pub const MAX_ROOM_TYPES_PER_HOTEL: usize = 64;
pub const MAX_LABEL_LEN: usize = 128;
pub const MAX_CHILDREN_PER_RESERVATION: usize = 20;
/// Largest WAL frame replay will allocate for.
pub const MAX_FRAME_LEN: usize = 16 * 1024 * 1024;
