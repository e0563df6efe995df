//! Host, VM and cloudlet model with allocation policy and power model (component C2).

mod allocation;
mod cloudlet;
mod fleet;
mod host;
mod host_profile;
mod ids;
mod power_model;
mod vm;

pub use allocation::{AllocationPolicy, FirstFitAllocation};
pub use cloudlet::{Cloudlet, CloudletState};
pub use fleet::ComputeFleet;
pub use host::Host;
pub use host_profile::HostProfile;
pub use ids::{CloudletId, HostId, VmId};
pub use power_model::{LinearPowerModel, PowerModel};
pub use vm::{Vm, VmSize, VmState};
