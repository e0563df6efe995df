//! Entity identifiers.
//!
//! Everything here is an index into one of [`crate::fleet::ComputeFleet`]'s
//! arenas; relationships between hosts, VMs and cloudlets are stored as ids
//! rather than shared-ownership references, per the "cyclic references" note
//! in the design: a VM holds `host_id`, a cloudlet holds `vm_id`.

/// Identifier of a [`crate::host::Host`].
pub type HostId = u32;

/// Identifier of a [`crate::vm::Vm`], globally unique and monotonic within an episode.
pub type VmId = u32;

/// Identifier of a [`crate::cloudlet::Cloudlet`].
pub type CloudletId = u64;
