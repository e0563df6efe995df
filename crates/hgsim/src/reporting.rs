//! Post-episode reporting (§6 "Results"). Computing the summary is core
//! work; writing it to disk is the thin, explicitly-external part, kept
//! separate so IO failures can never affect simulation state (§7
//! `PostEpisodeIOError`).

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::datacenter::Datacenter;
use crate::error::PostEpisodeIoError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CloudletRow {
    pub cloudlet_id: u64,
    pub arrival_time: f64,
    pub start_time: Option<f64>,
    pub finish_time: Option<f64>,
    pub wait_time: Option<f64>,
    pub cores_required: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VmRow {
    pub vm_id: u32,
    pub host_id: Option<u32>,
    pub cores: u32,
    pub final_state: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatacenterEnergySummary {
    pub datacenter_id: u32,
    pub green_wh: f64,
    pub brown_wh: f64,
    pub wasted_green_wh: f64,
    pub carbon_kg: f64,
    pub green_ratio: f64,
    pub cloudlets_received: u64,
    pub cloudlets_finished: u64,
}

/// One `(t, utilization)` sample from a host's history trail, labelled with
/// its owning datacenter so `hostN.csv` files can be written per host.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct HostUtilizationRow {
    pub datacenter_id: u32,
    pub host_id: u32,
    pub time: f64,
    pub utilization: f64,
}

/// Cumulative green/brown split and derived percentages for one datacenter,
/// the `green_energy_summary.csv` counterpart to [`DatacenterEnergySummary`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GreenEnergySummaryRow {
    pub datacenter_id: u32,
    pub green_wh: f64,
    pub brown_wh: f64,
    pub wasted_green_wh: f64,
    pub green_pct: f64,
    pub brown_pct: f64,
}

/// Full per-episode summary; `write_csv_reports` is the only part that
/// touches the filesystem.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpisodeReport {
    pub cloudlets: Vec<CloudletRow>,
    pub vms: Vec<VmRow>,
    pub energy: Vec<DatacenterEnergySummary>,
    pub host_utilization: Vec<HostUtilizationRow>,
    pub green_energy: Vec<GreenEnergySummaryRow>,
}

pub fn build_episode_report(datacenters: &[Datacenter]) -> EpisodeReport {
    let mut cloudlets = Vec::new();
    let mut vms = Vec::new();
    let mut energy = Vec::new();
    let mut host_utilization = Vec::new();
    let mut green_energy = Vec::new();

    for dc in datacenters {
        for cloudlet in dc.fleet.cloudlets() {
            cloudlets.push(CloudletRow {
                cloudlet_id: cloudlet.id,
                arrival_time: cloudlet.arrival_time,
                start_time: cloudlet.start_time,
                finish_time: cloudlet.finish_time,
                wait_time: cloudlet.wait_time(),
                cores_required: cloudlet.cores_required,
            });
        }
        for vm in dc.fleet.vms() {
            vms.push(VmRow {
                vm_id: vm.id,
                host_id: vm.host_id,
                cores: vm.cores,
                final_state: format!("{:?}", vm.state),
            });
        }
        for host in dc.fleet.hosts() {
            for &(time, utilization) in host.history() {
                host_utilization.push(HostUtilizationRow {
                    datacenter_id: dc.id,
                    host_id: host.id,
                    time,
                    utilization,
                });
            }
        }
        let totals = dc.energy.totals();
        let green_ratio = dc.energy.green_ratio();
        energy.push(DatacenterEnergySummary {
            datacenter_id: dc.id,
            green_wh: totals.green_wh,
            brown_wh: totals.brown_wh,
            wasted_green_wh: totals.wasted_green_wh,
            carbon_kg: totals.carbon_kg,
            green_ratio,
            cloudlets_received: dc.scheduler.cloudlets_received(),
            cloudlets_finished: dc.cloudlets_finished,
        });
        green_energy.push(GreenEnergySummaryRow {
            datacenter_id: dc.id,
            green_wh: totals.green_wh,
            brown_wh: totals.brown_wh,
            wasted_green_wh: totals.wasted_green_wh,
            green_pct: green_ratio * 100.0,
            brown_pct: (1.0 - green_ratio) * 100.0,
        });
    }

    EpisodeReport {
        cloudlets,
        vms,
        energy,
        host_utilization,
        green_energy,
    }
}

/// Writes `cloudlets.csv`, `vms.csv`, `energy_consumption.csv`,
/// `green_energy_summary.csv` and one `host<N>.csv` per `(datacenter, host)`
/// pair under `dir`. Failures are returned, not panicked on, so the caller
/// can log and move on per the non-fatal `PostEpisodeIOError` policy.
pub fn write_csv_reports(dir: &Path, report: &EpisodeReport) -> Result<(), PostEpisodeIoError> {
    std::fs::create_dir_all(dir).map_err(|source| PostEpisodeIoError::Io {
        path: dir.display().to_string(),
        source,
    })?;

    write_rows(&dir.join("cloudlets.csv"), &report.cloudlets)?;
    write_rows(&dir.join("vms.csv"), &report.vms)?;
    write_rows(&dir.join("energy_consumption.csv"), &report.energy)?;
    write_rows(&dir.join("green_energy_summary.csv"), &report.green_energy)?;

    let mut by_host: std::collections::BTreeMap<(u32, u32), Vec<HostUtilizationRow>> = std::collections::BTreeMap::new();
    for row in &report.host_utilization {
        by_host.entry((row.datacenter_id, row.host_id)).or_default().push(*row);
    }
    for ((dc_id, host_id), rows) in by_host {
        write_rows(&dir.join(format!("host{dc_id}_{host_id}.csv")), &rows)?;
    }
    Ok(())
}


fn write_rows<T: Serialize>(path: &Path, rows: &[T]) -> Result<(), PostEpisodeIoError> {
    let mut writer = csv::Writer::from_path(path).map_err(|source| PostEpisodeIoError::Io {
        path: path.display().to_string(),
        source: std::io::Error::new(std::io::ErrorKind::Other, source.to_string()),
    })?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush().map_err(|source| PostEpisodeIoError::Io {
        path: path.display().to_string(),
        source,
    })?;
    Ok(())
}
