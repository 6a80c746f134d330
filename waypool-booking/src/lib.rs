pub mod allocator;
pub mod capacity;

pub use allocator::{AllocationError, CapacityAllocator};
pub use capacity::{resolve_capacity, BookingConfig};
