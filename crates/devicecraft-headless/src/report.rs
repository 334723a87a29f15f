//! End-of-run summary, printed as text or JSON.

use devicecraft_core::engine::{Engine, StepSummary};
use devicecraft_core::event::{DeviceEvent, EventKind};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Default, Serialize)]
pub struct DeviceReport {
    pub device_type: String,
    pub position: [i32; 3],
    pub active: bool,
    pub valid: bool,
    pub radius: i32,
    pub countdown: u32,
    pub time_constant: u32,
    pub xp: u32,
    pub items: BTreeMap<String, u32>,
}

#[derive(Debug, Default, Serialize)]
pub struct RunReport {
    pub ticks: u64,
    pub acted: u64,
    pub wasted: u64,
    pub unloaded: u64,
    pub state_hash: u64,
    pub events: BTreeMap<String, u64>,
    pub devices: Vec<DeviceReport>,
}

fn kind_name(kind: EventKind) -> &'static str {
    match kind {
        EventKind::Activated => "activated",
        EventKind::Deactivated => "deactivated",
        EventKind::ValiditySampled => "validity_sampled",
        EventKind::ItemsCollected => "items_collected",
        EventKind::XpAbsorbed => "xp_absorbed",
        EventKind::LootProduced => "loot_produced",
        EventKind::CycleWasted => "cycle_wasted",
    }
}

impl RunReport {
    pub fn record_steps(&mut self, summary: StepSummary) {
        self.ticks += summary.steps;
        self.acted += summary.acted;
        self.wasted += summary.wasted;
        self.unloaded += summary.unloaded;
    }

    pub fn record_events(&mut self, events: &[DeviceEvent]) {
        for event in events {
            *self.events.entry(kind_name(event.kind()).to_string()).or_default() += 1;
        }
    }

    /// Snapshot the final state of every device.
    pub fn finish(&mut self, engine: &Engine) {
        self.state_hash = engine.state_hash();
        self.devices = engine
            .devices()
            .map(|(id, device)| {
                let mut items = BTreeMap::new();
                for stack in device.inventory().slots().iter().filter_map(|s| s.stack) {
                    let name = engine
                        .registry()
                        .item_name(stack.item_type)
                        .unwrap_or("unknown")
                        .to_string();
                    *items.entry(name).or_default() += stack.quantity;
                }
                let pos = device.position();
                DeviceReport {
                    device_type: engine
                        .device_type_of(id)
                        .map(|t| t.name.clone())
                        .unwrap_or_default(),
                    position: [pos.x, pos.y, pos.z],
                    active: device.is_active(),
                    valid: device.validity().is_valid(),
                    radius: device.radius(),
                    countdown: device.countdown(),
                    time_constant: engine.time_constant(id).unwrap_or(0),
                    xp: device.xp().stored(),
                    items,
                }
            })
            .collect();
    }

    pub fn print_text(&self) {
        println!(
            "ran {} ticks: {} actions, {} wasted cycles, {} unloaded, state hash {:016x}",
            self.ticks, self.acted, self.wasted, self.unloaded, self.state_hash
        );
        for (kind, count) in &self.events {
            println!("  {kind:<18} {count}");
        }
        for d in &self.devices {
            println!(
                "{} at {:?}: active={} valid={} radius={} countdown={}/{} xp={}",
                d.device_type,
                d.position,
                d.active,
                d.valid,
                d.radius,
                d.countdown,
                d.time_constant,
                d.xp
            );
            for (item, qty) in &d.items {
                println!("    {item} x{qty}");
            }
        }
    }
}
