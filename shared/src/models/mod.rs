//! Data models shared between the server and clients

pub mod entry;
pub mod waitlist;

pub use entry::{
    Channel, ChannelDelivery, CheckInInput, DeliveryStatus, EntryStatus, EntryUpdate,
    WaitlistEntry,
};
pub use waitlist::{DisplayOptions, ListType, Waitlist, WaitlistCreate, WaitlistUpdate};
